//! Data fetch adapter interface

use async_trait::async_trait;
use shared::{DiningTable, Reservation, ReservationQuery, ReservationStatus, TableQuery, TableStatus};

use crate::ClientResult;

/// Backend operations the floor engine depends on
///
/// Implementations own the wire format and timeouts. The engine never
/// retries a call on its own.
#[async_trait]
pub trait FloorApi: Send + Sync {
    /// Load all tables, optionally annotated for a date/hour
    async fn fetch_tables(&self, query: TableQuery) -> ClientResult<Vec<DiningTable>>;

    /// Load reservations, optionally limited to a date and status
    async fn fetch_reservations(&self, query: ReservationQuery) -> ClientResult<Vec<Reservation>>;

    /// Change the status of one table
    async fn set_table_status(&self, table_id: i64, status: TableStatus) -> ClientResult<()>;

    /// Change the status of one reservation
    async fn set_reservation_status(
        &self,
        reservation_id: i64,
        status: ReservationStatus,
    ) -> ClientResult<()>;
}
