use taskplan_core::{resolve, CalendarDate, RecurrenceError};

fn now(value: &str) -> CalendarDate {
    CalendarDate::parse_canonical(value).unwrap()
}

#[test]
fn leap_day_base_folds_to_march_first_in_non_leap_year() {
    let next = resolve(now("20250228"), "20240229", "y").unwrap();
    assert_eq!(next.to_string(), "20250301");
}

#[test]
fn leap_day_base_never_returns_now_itself() {
    let next = resolve(now("20250301"), "20240229", "y").unwrap();
    assert!(next > now("20250301"));
    assert_eq!(next.to_string(), "20260301");
}

#[test]
fn folded_leap_day_base_stays_on_march_first_across_leap_years() {
    let next = resolve(now("20270601"), "20240229", "y").unwrap();
    assert_eq!(next.to_string(), "20280301");
}

#[test]
fn last_representable_day_has_no_next_occurrence() {
    assert!(matches!(
        resolve(now("99991231"), "99991231", "d 1"),
        Err(RecurrenceError::DateOutOfRange(_))
    ));
}

#[test]
fn weekly_rule_lands_on_first_multiple_after_now() {
    let next = resolve(now("20240110"), "20240101", "d 7").unwrap();
    assert_eq!(next.to_string(), "20240115");
}

#[test]
fn classified_failures() {
    let reference = now("20240601");
    assert_eq!(
        resolve(reference, "20240101", "d 401"),
        Err(RecurrenceError::OffsetTooLarge(401))
    );
    assert_eq!(
        resolve(reference, "20240101", ""),
        Err(RecurrenceError::MissingRule)
    );
    assert_eq!(
        resolve(reference, "20240101", "w 1"),
        Err(RecurrenceError::InvalidRule("w 1".to_string()))
    );
    assert_eq!(
        resolve(reference, "20240101", "d abc"),
        Err(RecurrenceError::MalformedMode("d abc".to_string()))
    );
    assert_eq!(
        resolve(reference, "20240132", "d 1"),
        Err(RecurrenceError::MalformedBaseDate("20240132".to_string()))
    );
}

#[test]
fn resolver_is_callable_from_many_threads() {
    let handles: Vec<_> = (1..=8_u32)
        .map(|days| {
            std::thread::spawn(move || {
                resolve(now("20240301"), "20240101", &format!("d {days}")).unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap() > now("20240301"));
    }
}
