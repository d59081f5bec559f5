//! Data models
//!
//! Shared between the floor engine and the backend adapter.
//! Field names follow the reservation backend's JSON, all IDs are `i64`.

pub mod dining_table;
pub mod floor_filter;
pub mod reservation;

// Re-exports
pub use dining_table::*;
pub use floor_filter::*;
pub use reservation::*;

use thiserror::Error;

/// Unknown status label
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} status: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
