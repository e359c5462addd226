//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and search APIs over the `scheduler` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Lists are ordered by `date ASC, id ASC`.

use crate::date::CalendarDate;
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::task::{NewTask, Task, TaskId, TaskValidationError};
use crate::search::query::{SearchQuery, LIKE_ESCAPE};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT id, date, title, comment, repeat FROM scheduler";
const REQUIRED_COLUMNS: [&str; 5] = ["id", "date", "title", "comment", "repeat"];

/// Default page size for task lists.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    NotFound(TaskId),
    InvalidData(String),
    /// Connection schema version does not match this binary.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "task repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "task repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "task repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing tasks.
#[derive(Debug, Clone)]
pub struct TaskListQuery {
    pub search: SearchQuery,
    pub limit: u32,
}

impl Default for TaskListQuery {
    fn default() -> Self {
        Self {
            search: SearchQuery::All,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// Repository interface for task CRUD operations.
pub trait TaskRepository {
    fn create_task(&self, task: &NewTask) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn update_task_date(&self, id: TaskId, date: CalendarDate) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Wraps a connection after checking its schema is current.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_task_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &NewTask) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO scheduler (date, title, comment, repeat) VALUES (?1, ?2, ?3, ?4);",
            params![
                task.date.to_canonical(),
                task.title.as_str(),
                task.comment.as_str(),
                task.repeat.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE scheduler
             SET date = ?1, title = ?2, comment = ?3, repeat = ?4
             WHERE id = ?5;",
            params![
                task.date.to_canonical(),
                task.title.as_str(),
                task.comment.as_str(),
                task.repeat.as_str(),
                task.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }
        Ok(())
    }

    fn update_task_date(&self, id: TaskId, date: CalendarDate) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE scheduler SET date = ?1 WHERE id = ?2;",
            params![date.to_canonical(), id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match &query.search {
            SearchQuery::All => {}
            SearchQuery::OnDate(date) => {
                sql.push_str(" AND date = ?");
                bind_values.push(Value::Text(date.to_canonical()));
            }
            SearchQuery::Text(_) => {
                let pattern = query.search.like_pattern().unwrap_or_default();
                sql.push_str(&format!(
                    " AND (title LIKE ? ESCAPE '{LIKE_ESCAPE}' OR comment LIKE ? ESCAPE '{LIKE_ESCAPE}')"
                ));
                bind_values.push(Value::Text(pattern.clone()));
                bind_values.push(Value::Text(pattern));
            }
        }

        sql.push_str(" ORDER BY date ASC, id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(query.limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM scheduler WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id: TaskId = row.get("id")?;
    let date_text: String = row.get("date")?;
    let date = CalendarDate::parse_canonical(&date_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{date_text}` in scheduler.date for task {id}"
        ))
    })?;

    let task = Task {
        id,
        date,
        title: row.get("title")?,
        comment: row.get("comment")?,
        repeat: row.get("repeat")?,
    };
    task.validate().map_err(|err| {
        RepoError::InvalidData(format!("task {id} failed validation: {err}"))
    })?;
    Ok(task)
}

fn ensure_task_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "scheduler")? {
        return Err(RepoError::MissingRequiredTable("scheduler"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "scheduler", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "scheduler",
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
