//! Task domain model.
//!
//! # Responsibility
//! - Define the task record persisted by the task store.
//! - Define the client-supplied draft used by create/update flows.
//!
//! # Invariants
//! - A stored task always carries a valid `CalendarDate`.
//! - A stored task title is never blank.

pub mod task;
