//! Task record and draft types.
//!
//! # Invariants
//! - `title` is non-blank after trimming.
//! - `repeat` is either empty (one-shot) or a parseable recurrence rule.
//!
//! # See also
//! - `crate::recurrence` for the rule grammar.

use crate::date::CalendarDate;
use crate::recurrence::{RecurrenceError, RecurrenceRule};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned task identifier.
pub type TaskId = i64;

/// Validation failure for task records and drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty or whitespace only.
    BlankTitle,
    /// Non-empty `repeat` that is not a valid rule.
    InvalidRepeat(RecurrenceError),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::InvalidRepeat(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BlankTitle => None,
            Self::InvalidRepeat(err) => Some(err),
        }
    }
}

/// Scheduled task as persisted by the task store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Next scheduled date.
    pub date: CalendarDate,
    pub title: String,
    #[serde(default)]
    pub comment: String,
    /// Recurrence rule string; empty for one-shot tasks.
    #[serde(default)]
    pub repeat: String,
}

impl Task {
    /// Validates record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)?;
        self.rule()?;
        Ok(())
    }

    /// Returns whether this task is rescheduled instead of deleted on completion.
    pub fn is_recurring(&self) -> bool {
        !self.repeat.is_empty()
    }

    /// Parses the stored rule, `None` for one-shot tasks.
    pub fn rule(&self) -> Result<Option<RecurrenceRule>, TaskValidationError> {
        parse_optional_rule(&self.repeat)
    }
}

/// Normalized task fields ready for insertion; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub date: CalendarDate,
    pub title: String,
    pub comment: String,
    pub repeat: String,
}

impl NewTask {
    /// Validates the same invariants as [`Task::validate`].
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)?;
        parse_optional_rule(&self.repeat)?;
        Ok(())
    }

    /// Attaches a storage id.
    pub fn with_id(self, id: TaskId) -> Task {
        Task {
            id,
            date: self.date,
            title: self.title,
            comment: self.comment,
            repeat: self.repeat,
        }
    }
}

/// Client-supplied task fields for create and update.
///
/// `date` is raw input: empty means "today", otherwise `YYYYMMDD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDraft {
    pub date: String,
    pub title: String,
    pub comment: String,
    pub repeat: String,
}

impl TaskDraft {
    /// Convenience constructor with empty comment and rule.
    pub fn new(date: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the recurrence rule.
    pub fn with_repeat(mut self, repeat: impl Into<String>) -> Self {
        self.repeat = repeat.into();
        self
    }

    /// Sets the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

pub(crate) fn validate_title(title: &str) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::BlankTitle);
    }
    Ok(())
}

pub(crate) fn parse_optional_rule(
    repeat: &str,
) -> Result<Option<RecurrenceRule>, TaskValidationError> {
    if repeat.is_empty() {
        return Ok(None);
    }
    RecurrenceRule::parse(repeat)
        .map(Some)
        .map_err(TaskValidationError::InvalidRepeat)
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskDraft, TaskValidationError};
    use crate::date::CalendarDate;
    use crate::recurrence::{RecurrenceError, RecurrenceRule};

    fn task(title: &str, repeat: &str) -> Task {
        Task {
            id: 1,
            date: CalendarDate::from_ymd(2024, 1, 1).unwrap(),
            title: title.to_string(),
            comment: String::new(),
            repeat: repeat.to_string(),
        }
    }

    #[test]
    fn validate_rejects_blank_title() {
        assert_eq!(
            task("   ", "").validate(),
            Err(TaskValidationError::BlankTitle)
        );
    }

    #[test]
    fn validate_rejects_unknown_rule() {
        let err = task("water plants", "w 1").validate().unwrap_err();
        assert!(matches!(
            err,
            TaskValidationError::InvalidRepeat(RecurrenceError::InvalidRule(_))
        ));
    }

    #[test]
    fn rule_is_none_for_one_shot_tasks() {
        let one_shot = task("call bank", "");
        assert!(!one_shot.is_recurring());
        assert_eq!(one_shot.rule(), Ok(None));

        let weekly = task("standup notes", "d 7");
        assert!(weekly.is_recurring());
        assert_eq!(weekly.rule(), Ok(Some(RecurrenceRule::EveryNDays(7))));
    }

    #[test]
    fn draft_deserializes_with_missing_fields() {
        let draft: TaskDraft =
            serde_json::from_value(serde_json::json!({ "title": "read" })).unwrap();
        assert_eq!(draft, TaskDraft::new("", "read"));
    }
}
