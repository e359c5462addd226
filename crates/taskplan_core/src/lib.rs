//! Core domain logic for taskplan.
//! Recurrence resolution, the task store and the task lifecycle live here.

pub mod clock;
pub mod config;
pub mod date;
pub mod db;
pub mod logging;
pub mod model;
pub mod recurrence;
pub mod repo;
pub mod search;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use date::{CalendarDate, DateParseError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::task::{NewTask, Task, TaskDraft, TaskId, TaskValidationError};
pub use recurrence::{resolve, RecurrenceError, RecurrenceRule, MAX_DAY_OFFSET};
pub use repo::task_repo::{
    RepoError, RepoResult, SqliteTaskRepository, TaskListQuery, TaskRepository,
    DEFAULT_LIST_LIMIT,
};
pub use search::query::SearchQuery;
pub use service::task_service::{CompletionOutcome, TaskService, TaskServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
