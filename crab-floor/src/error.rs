//! Floor engine error types

use shared::ReservationStatus;
use std::fmt;
use thiserror::Error;

/// Adapter error type (transport / backend rejection)
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for adapter operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Which collection a fetch was loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Tables,
    Reservations,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Tables => write!(f, "tables"),
            Collection::Reservations => write!(f, "reservations"),
        }
    }
}

/// Engine error type
///
/// Recoverable by construction: the engine stays usable after any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FloorError {
    /// A collection failed to load; the previous snapshot is retained
    #[error("Failed to load {collection}: {message}")]
    FetchFailed {
        collection: Collection,
        message: String,
    },

    /// Table is not in the local view
    #[error("Table {0} not found")]
    UnknownTable(i64),

    /// A status change for this table has not resolved yet
    #[error("Table {0} already has a status change in progress")]
    TransitionInFlight(i64),

    /// Reservation is not in the local list
    #[error("Reservation {0} not found")]
    UnknownReservation(i64),

    /// A cancellation for this reservation has not resolved yet
    #[error("Reservation {0} already has a cancellation in progress")]
    CancellationInFlight(i64),

    /// Reservation is past the point where it can be cancelled
    #[error("Reservation {id} cannot be cancelled while {status}")]
    NotCancellable { id: i64, status: ReservationStatus },
}

impl FloorError {
    pub(crate) fn fetch(collection: Collection, err: &ClientError) -> Self {
        FloorError::FetchFailed {
            collection,
            message: err.to_string(),
        }
    }
}

/// Result type for engine operations
pub type FloorResult<T> = Result<T, FloorError>;
