//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and recurrence calls into task lifecycle APIs.
//! - Keep request/transport layers decoupled from storage details.

pub mod task_service;
