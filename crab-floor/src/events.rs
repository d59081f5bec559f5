//! Events and notices for the presentation layer

use shared::TableStatus;

use crate::coordinator::TransitionOutcome;
use crate::error::Collection;

/// Broadcast to every [`FloorManager::subscribe`](crate::FloorManager::subscribe) receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloorEvent {
    /// A table fetch was applied
    TablesRefreshed { count: usize },
    /// A reservation fetch was applied
    ReservationsRefreshed { count: usize },
    /// A fetch failed; see [`FloorError::FetchFailed`](crate::FloorError::FetchFailed)
    FetchFailed { collection: Collection, message: String },
    /// A table status change finished
    Transition {
        table_id: i64,
        target: TableStatus,
        outcome: TransitionOutcome,
    },
    /// A reservation cancellation finished
    ReservationCancel {
        reservation_id: i64,
        outcome: TransitionOutcome,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// User-facing message (toast / alert)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
