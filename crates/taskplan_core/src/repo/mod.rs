//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the task store contract used by the service layer.
//! - Isolate SQLite query details from lifecycle orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Task::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod task_repo;
