//! Source of "today" for task lifecycle decisions.
//!
//! Services receive a [`Clock`] explicitly so tests can pin the date.

use crate::date::CalendarDate;

/// Supplies the current calendar date.
pub trait Clock {
    fn today(&self) -> CalendarDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> CalendarDate {
        CalendarDate::today()
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub CalendarDate);

impl Clock for FixedClock {
    fn today(&self) -> CalendarDate {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> CalendarDate {
        (**self).today()
    }
}
