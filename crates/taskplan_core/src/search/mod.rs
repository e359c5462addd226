//! Task search query model.
//!
//! # Responsibility
//! - Classify raw search text into date or substring queries.
//! - Build escaped SQL `LIKE` patterns for substring search.
//!
//! Query execution lives in the task repository; this module stays free of
//! SQL connections.

pub mod query;
