//! Transport-facing request layer for taskplan.
//! Wraps the core service in status-coded JSON envelopes.

pub mod api;

pub use api::{
    ApiResponse, TaskApi, TaskView, STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR, STATUS_NOT_FOUND,
    STATUS_OK,
};
