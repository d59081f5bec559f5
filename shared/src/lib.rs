//! Shared types for the Crab floor engine
//!
//! Table, reservation and filter models used by the engine and its
//! backend adapters.

pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{
    DiningTable, FloorFilter, ParseStatusError, Reservation, ReservationQuery,
    ReservationStatus, TableQuery, TableStatus, table_code,
};
