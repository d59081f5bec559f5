//! Crab Floor - dining-floor table state engine
//!
//! Keeps a local view of the restaurant's tables in step with the
//! reservation backend: reservation conflicts for a date/hour window,
//! confirmed status changes with rollback, and periodic refresh that never
//! lets an older response overwrite a newer one.

pub mod api;
pub mod config;
pub mod conflict;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod floor;
pub mod http;
pub mod index;
pub mod logger;
pub mod reservations;
pub mod scheduler;
pub mod state;
pub mod store;

pub use api::FloorApi;
pub use config::FloorConfig;
pub use conflict::{
    AlwaysConfirm, ChannelGate, ConfirmGate, ConfirmRequest, ConflictPrompt, FnGate, NeverConfirm,
    has_conflict,
};
pub use coordinator::{TransitionCoordinator, TransitionOutcome};
pub use error::{ClientError, ClientResult, Collection, FloorError, FloorResult};
pub use events::{FloorEvent, Notice, NoticeLevel};
pub use floor::{FloorManager, TableAnnotation};
pub use http::HttpClient;
pub use index::{ReservationIndex, build_index};
pub use reservations::ReservationBook;
pub use scheduler::{RefreshHandle, RefreshReport, RefreshScheduler, RefreshStatus};
pub use store::{StatusCounts, TableSnapshot, TableStore};

// Re-export shared types for convenience
pub use shared::{
    DiningTable, FloorFilter, Reservation, ReservationQuery, ReservationStatus, TableQuery,
    TableStatus, table_code,
};
