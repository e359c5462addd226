//! Request layer for task scheduling calls.
//!
//! # Responsibility
//! - Validate raw string and JSON input from a transport.
//! - Invoke the task service and resolver.
//! - Shape results into status-coded JSON envelopes.
//!
//! # Invariants
//! - Handlers never panic; every failure becomes an `{"error": ...}` body.
//! - Client mistakes map to 400, unknown ids to 404, storage faults to 500.
//! - Task ids cross the boundary as decimal strings.

use log::warn;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use taskplan_core::{
    CalendarDate, Clock, CompletionOutcome, SqliteTaskRepository, Task, TaskDraft, TaskId,
    TaskService, TaskServiceError, DEFAULT_LIST_LIMIT,
};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Transport-neutral response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// JSON body; a bare string for `next_date` success.
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: STATUS_OK,
            body,
        }
    }

    fn empty() -> Self {
        Self::ok(json!({}))
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    /// Returns whether the status is below 400.
    pub fn is_success(&self) -> bool {
        self.status < STATUS_BAD_REQUEST
    }

    /// Returns the `error` message for failure envelopes.
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

/// Wire shape of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: String,
    pub date: String,
    pub title: String,
    pub comment: String,
    pub repeat: String,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            id: task.id.to_string(),
            date: task.date.to_canonical(),
            title: task.title,
            comment: task.comment,
            repeat: task.repeat,
        }
    }
}

#[derive(Debug, Serialize)]
struct TaskListBody {
    tasks: Vec<TaskView>,
}

#[derive(Debug, Deserialize)]
struct UpdateTaskRequest {
    #[serde(default)]
    id: String,
    #[serde(flatten)]
    draft: TaskDraft,
}

/// Request handlers bound to one SQLite connection and clock.
pub struct TaskApi<'conn, C: Clock> {
    conn: &'conn Connection,
    clock: C,
    list_limit: u32,
}

impl<'conn, C: Clock> TaskApi<'conn, C> {
    pub fn new(conn: &'conn Connection, clock: C) -> Self {
        Self {
            conn,
            clock,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Overrides the list page size.
    pub fn with_list_limit(mut self, limit: u32) -> Self {
        self.list_limit = limit;
        self
    }

    /// Previews the next date of `repeat` from `date`, strictly after `now`.
    ///
    /// `now` must be `YYYYMMDD`; nothing is written.
    pub fn next_date(&self, now: &str, date: &str, repeat: &str) -> ApiResponse {
        let now = match CalendarDate::parse_canonical(now) {
            Ok(now) => now,
            Err(err) => return ApiResponse::error(STATUS_BAD_REQUEST, err.to_string()),
        };
        self.with_service(|service| {
            let next = service.preview_next_date(now, date, repeat)?;
            Ok(ApiResponse::ok(Value::String(next.to_canonical())))
        })
    }

    /// Creates a task from a JSON body and returns `{"id": "<id>"}`.
    pub fn add_task(&self, body: &str) -> ApiResponse {
        let draft: TaskDraft = match parse_body(body) {
            Ok(draft) => draft,
            Err(response) => return response,
        };
        self.with_service(|service| {
            let id = service.create_task(&draft)?;
            Ok(ApiResponse::ok(json!({ "id": id.to_string() })))
        })
    }

    /// Replaces a task from a JSON body carrying its `id`.
    pub fn update_task(&self, body: &str) -> ApiResponse {
        let request: UpdateTaskRequest = match parse_body(body) {
            Ok(request) => request,
            Err(response) => return response,
        };
        let id = match parse_id(&request.id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        self.with_service(|service| {
            service.update_task(id, &request.draft)?;
            Ok(ApiResponse::empty())
        })
    }

    /// Returns one task.
    pub fn get_task(&self, id: &str) -> ApiResponse {
        let id = match parse_id(id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        self.with_service(|service| {
            let task = service.get_task(id)?;
            Ok(json_response(&TaskView::from(task)))
        })
    }

    /// Deletes one task.
    pub fn delete_task(&self, id: &str) -> ApiResponse {
        let id = match parse_id(id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        self.with_service(|service| {
            service.delete_task(id)?;
            Ok(ApiResponse::empty())
        })
    }

    /// Marks a task done: deletes one-shot tasks, reschedules recurring ones.
    pub fn complete_task(&self, id: &str) -> ApiResponse {
        let id = match parse_id(id) {
            Ok(id) => id,
            Err(response) => return response,
        };
        self.with_service(|service| {
            match service.complete_task(id)? {
                CompletionOutcome::Deleted => {}
                CompletionOutcome::Rescheduled(next) => {
                    log::debug!("event=api_done module=api task_id={id} next_date={next}");
                }
            }
            Ok(ApiResponse::empty())
        })
    }

    /// Lists tasks as `{"tasks": [...]}`, optionally filtered by search text.
    pub fn list_tasks(&self, search: Option<&str>) -> ApiResponse {
        self.with_service(|service| {
            let tasks = service
                .list_tasks(search)?
                .into_iter()
                .map(TaskView::from)
                .collect::<Vec<_>>();
            Ok(json_response(&TaskListBody { tasks }))
        })
    }

    fn with_service(
        &self,
        f: impl FnOnce(
            &TaskService<SqliteTaskRepository<'conn>, &C>,
        ) -> Result<ApiResponse, TaskServiceError>,
    ) -> ApiResponse {
        let repo = match SqliteTaskRepository::try_new(self.conn) {
            Ok(repo) => repo,
            Err(err) => {
                warn!("event=api_call module=api status=error error_code=repo_init_failed error={err}");
                return ApiResponse::error(STATUS_INTERNAL_ERROR, err.to_string());
            }
        };
        let service = TaskService::new(repo, &self.clock).with_list_limit(self.list_limit);
        f(&service).unwrap_or_else(error_response)
    }
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ApiResponse> {
    serde_json::from_str(body).map_err(|err| {
        ApiResponse::error(STATUS_BAD_REQUEST, format!("malformed JSON body: {err}"))
    })
}

fn parse_id(raw: &str) -> Result<TaskId, ApiResponse> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiResponse::error(
            STATUS_BAD_REQUEST,
            "task id is required",
        ));
    }
    trimmed
        .parse::<TaskId>()
        .map_err(|_| ApiResponse::error(STATUS_BAD_REQUEST, format!("invalid task id `{trimmed}`")))
}

fn json_response<T: Serialize>(value: &T) -> ApiResponse {
    match serde_json::to_value(value) {
        Ok(body) => ApiResponse::ok(body),
        Err(err) => {
            warn!("event=api_call module=api status=error error_code=serialize_failed error={err}");
            ApiResponse::error(
                STATUS_INTERNAL_ERROR,
                format!("failed to serialize response: {err}"),
            )
        }
    }
}

fn error_response(err: TaskServiceError) -> ApiResponse {
    let status = match &err {
        TaskServiceError::InvalidTitle
        | TaskServiceError::InvalidDate(_)
        | TaskServiceError::Recurrence(_) => STATUS_BAD_REQUEST,
        TaskServiceError::TaskNotFound(_) => STATUS_NOT_FOUND,
        TaskServiceError::Repo(_) => {
            warn!("event=api_call module=api status=error error_code=storage_failed error={err}");
            STATUS_INTERNAL_ERROR
        }
    };
    ApiResponse::error(status, err.to_string())
}
