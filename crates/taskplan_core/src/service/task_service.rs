//! Task lifecycle service.
//!
//! # Responsibility
//! - Normalize client dates on create/update (default, snap, advance).
//! - Complete tasks: delete one-shot tasks, reschedule recurring ones.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - A stored recurring task whose date was advanced is strictly after today.
//! - A non-empty rule is validated before any write, even when the date
//!   needs no advancing.
//! - Service layer remains storage-agnostic.

use crate::clock::Clock;
use crate::date::{CalendarDate, DateParseError};
use crate::model::task::{
    parse_optional_rule, validate_title, NewTask, Task, TaskDraft, TaskId, TaskValidationError,
};
use crate::recurrence::{resolve, RecurrenceError};
use crate::repo::task_repo::{RepoError, TaskListQuery, TaskRepository, DEFAULT_LIST_LIMIT};
use crate::search::query::SearchQuery;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Supplied date is not `YYYYMMDD`.
    InvalidDate(DateParseError),
    /// Rule parsing or resolution failed.
    Recurrence(RecurrenceError),
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "task title must not be blank"),
            Self::InvalidDate(err) => write!(f, "{err}"),
            Self::Recurrence(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDate(err) => Some(err),
            Self::Recurrence(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TaskNotFound(id),
            RepoError::Validation(err) => err.into(),
            other => Self::Repo(other),
        }
    }
}

impl From<TaskValidationError> for TaskServiceError {
    fn from(value: TaskValidationError) -> Self {
        match value {
            TaskValidationError::BlankTitle => Self::InvalidTitle,
            TaskValidationError::InvalidRepeat(err) => Self::Recurrence(err),
        }
    }
}

impl From<RecurrenceError> for TaskServiceError {
    fn from(value: RecurrenceError) -> Self {
        Self::Recurrence(value)
    }
}

/// Result of completing a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// One-shot task removed.
    Deleted,
    /// Recurring task moved to its next date.
    Rescheduled(CalendarDate),
}

/// Task service facade over repository implementations.
pub struct TaskService<R: TaskRepository, C: Clock> {
    repo: R,
    clock: C,
    list_limit: u32,
}

impl<R: TaskRepository, C: Clock> TaskService<R, C> {
    /// Creates a service using the provided repository and clock.
    pub fn new(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Overrides the maximum number of tasks returned by [`Self::list_tasks`].
    pub fn with_list_limit(mut self, limit: u32) -> Self {
        self.list_limit = limit;
        self
    }

    /// Creates a task from client input and returns its storage id.
    pub fn create_task(&self, draft: &TaskDraft) -> Result<TaskId, TaskServiceError> {
        let new_task = self.normalize_draft(draft)?;
        let id = self.repo.create_task(&new_task)?;
        info!(
            "event=task_create module=service status=ok task_id={id} recurring={}",
            !new_task.repeat.is_empty()
        );
        Ok(id)
    }

    /// Replaces all fields of an existing task.
    pub fn update_task(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, TaskServiceError> {
        let task = self.normalize_draft(draft)?.with_id(id);
        self.repo.update_task(&task)?;
        info!("event=task_update module=service status=ok task_id={id}");
        Ok(task)
    }

    /// Gets one task by id.
    pub fn get_task(&self, id: TaskId) -> Result<Task, TaskServiceError> {
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    /// Deletes one task by id.
    pub fn delete_task(&self, id: TaskId) -> Result<(), TaskServiceError> {
        self.repo.delete_task(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    /// Marks a task done.
    ///
    /// One-shot tasks are deleted. Recurring tasks are advanced from their
    /// stored date to the first occurrence strictly after today.
    pub fn complete_task(&self, id: TaskId) -> Result<CompletionOutcome, TaskServiceError> {
        let task = self.get_task(id)?;
        if !task.is_recurring() {
            self.repo.delete_task(id)?;
            info!("event=task_complete module=service status=ok task_id={id} outcome=deleted");
            return Ok(CompletionOutcome::Deleted);
        }

        let today = self.clock.today();
        let next = resolve(today, &task.date.to_canonical(), &task.repeat).map_err(|err| {
            warn!(
                "event=task_complete module=service status=error task_id={id} error_code=resolve_failed error={err}"
            );
            TaskServiceError::Recurrence(err)
        })?;
        self.repo.update_task_date(id, next)?;
        info!(
            "event=task_complete module=service status=ok task_id={id} outcome=rescheduled next_date={next}"
        );
        Ok(CompletionOutcome::Rescheduled(next))
    }

    /// Lists tasks, optionally filtered by search text.
    ///
    /// See [`SearchQuery::parse`] for how the text is interpreted.
    pub fn list_tasks(&self, search: Option<&str>) -> Result<Vec<Task>, TaskServiceError> {
        let query = TaskListQuery {
            search: search.map(SearchQuery::parse).unwrap_or_default(),
            limit: self.list_limit,
        };
        Ok(self.repo.list_tasks(&query)?)
    }

    /// Computes the next date for a rule without touching storage.
    pub fn preview_next_date(
        &self,
        now: CalendarDate,
        date: &str,
        repeat: &str,
    ) -> Result<CalendarDate, RecurrenceError> {
        resolve(now, date, repeat)
    }

    fn normalize_draft(&self, draft: &TaskDraft) -> Result<NewTask, TaskServiceError> {
        validate_title(&draft.title)?;
        let date = normalize_date(&draft.date, &draft.repeat, self.clock.today())?;
        Ok(NewTask {
            date,
            title: draft.title.clone(),
            comment: draft.comment.clone(),
            repeat: draft.repeat.clone(),
        })
    }
}

/// Applies create/update date rules relative to `today`.
///
/// - empty date: today;
/// - today or later: unchanged;
/// - past, one-shot: today;
/// - past, recurring: first occurrence strictly after today.
pub fn normalize_date(
    raw_date: &str,
    repeat: &str,
    today: CalendarDate,
) -> Result<CalendarDate, TaskServiceError> {
    let rule = parse_optional_rule(repeat)?;
    if raw_date.is_empty() {
        return Ok(today);
    }

    let date = CalendarDate::parse_canonical(raw_date).map_err(TaskServiceError::InvalidDate)?;
    if date >= today {
        return Ok(date);
    }

    match rule {
        None => Ok(today),
        Some(rule) => Ok(rule.next_after(date, today)?),
    }
}
