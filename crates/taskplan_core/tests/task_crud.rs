use rusqlite::Connection;
use taskplan_core::db::migrations::latest_version;
use taskplan_core::db::open_db_in_memory;
use taskplan_core::{
    CalendarDate, NewTask, RepoError, SearchQuery, SqliteTaskRepository, TaskListQuery,
    TaskRepository, TaskValidationError,
};

fn new_task(date: &str, title: &str, repeat: &str) -> NewTask {
    NewTask {
        date: CalendarDate::parse_canonical(date).unwrap(),
        title: title.to_string(),
        comment: String::new(),
        repeat: repeat.to_string(),
    }
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut input = new_task("20240301", "pay rent", "d 30");
    input.comment = "landlord account".to_string();
    let id = repo.create_task(&input).unwrap();

    let loaded = repo.get_task(id).unwrap().unwrap();
    assert_eq!(loaded, input.with_id(id));
}

#[test]
fn ids_are_assigned_in_increasing_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let first = repo.create_task(&new_task("20240301", "a", "")).unwrap();
    let second = repo.create_task(&new_task("20240301", "b", "")).unwrap();
    assert!(second > first);
}

#[test]
fn get_missing_task_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    assert!(repo.get_task(42).unwrap().is_none());
}

#[test]
fn update_replaces_all_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let id = repo.create_task(&new_task("20240301", "draft", "")).unwrap();

    let mut task = new_task("20240405", "final", "y").with_id(id);
    task.comment = "updated".to_string();
    repo.update_task(&task).unwrap();

    assert_eq!(repo.get_task(id).unwrap().unwrap(), task);
}

#[test]
fn update_and_delete_missing_task_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let ghost = new_task("20240301", "ghost", "").with_id(7);
    assert!(matches!(repo.update_task(&ghost), Err(RepoError::NotFound(7))));
    assert!(matches!(
        repo.update_task_date(7, ghost.date),
        Err(RepoError::NotFound(7))
    ));
    assert!(matches!(repo.delete_task(7), Err(RepoError::NotFound(7))));
}

#[test]
fn update_task_date_only_touches_date() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let id = repo.create_task(&new_task("20240301", "gym", "d 2")).unwrap();

    let next = CalendarDate::parse_canonical("20240303").unwrap();
    repo.update_task_date(id, next).unwrap();

    let loaded = repo.get_task(id).unwrap().unwrap();
    assert_eq!(loaded.date, next);
    assert_eq!(loaded.title, "gym");
    assert_eq!(loaded.repeat, "d 2");
}

#[test]
fn delete_removes_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let id = repo.create_task(&new_task("20240301", "once", "")).unwrap();

    repo.delete_task(id).unwrap();
    assert!(repo.get_task(id).unwrap().is_none());
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let err = repo.create_task(&new_task("20240301", "  ", "")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TaskValidationError::BlankTitle)
    ));

    let id = repo.create_task(&new_task("20240301", "ok", "")).unwrap();
    let bad = new_task("20240301", "ok", "w 1").with_id(id);
    assert!(matches!(
        repo.update_task(&bad),
        Err(RepoError::Validation(TaskValidationError::InvalidRepeat(_)))
    ));
}

#[test]
fn list_orders_by_date_then_id_and_applies_limit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let late = repo.create_task(&new_task("20240501", "late", "")).unwrap();
    let early_a = repo.create_task(&new_task("20240101", "early a", "")).unwrap();
    let early_b = repo.create_task(&new_task("20240101", "early b", "")).unwrap();

    let all = repo.list_tasks(&TaskListQuery::default()).unwrap();
    let ids: Vec<_> = all.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![early_a, early_b, late]);

    let limited = repo
        .list_tasks(&TaskListQuery {
            search: SearchQuery::All,
            limit: 2,
        })
        .unwrap();
    assert_eq!(limited.len(), 2);

    let none = repo
        .list_tasks(&TaskListQuery {
            search: SearchQuery::All,
            limit: 0,
        })
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn read_rejects_corrupted_date() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO scheduler (date, title) VALUES ('2024-01-01', 'bad');",
        [],
    )
    .unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let err = repo.list_tasks(&TaskListQuery::default()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("2024-01-01")));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteTaskRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_scheduler_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteTaskRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("scheduler"))
    ));
}

#[test]
fn repository_rejects_scheduler_table_missing_repeat_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE scheduler (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date CHAR(8) NOT NULL,
            title TEXT NOT NULL,
            comment TEXT NOT NULL DEFAULT ''
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteTaskRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "scheduler",
            column: "repeat"
        })
    ));
}
