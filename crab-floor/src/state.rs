//! Shared floor state

use std::sync::Arc;

use shared::FloorFilter;
use tokio::sync::RwLock;

use crate::index::ReservationIndex;
use crate::store::TableStore;

/// Everything the floor view reads, behind one lock.
///
/// The lock is never held across an adapter call.
#[derive(Debug)]
pub struct FloorState {
    pub store: TableStore,
    pub index: ReservationIndex,
    /// Sequence number of the newest applied reservation fetch
    pub index_seq: u64,
    pub filter: FloorFilter,
}

impl FloorState {
    pub fn new(filter: FloorFilter) -> Self {
        Self {
            store: TableStore::new(),
            index: ReservationIndex::empty(),
            index_seq: 0,
            filter,
        }
    }

    /// Install a reservation index unless a newer one is already in place
    pub fn apply_index(&mut self, seq: u64, index: ReservationIndex) -> bool {
        if seq <= self.index_seq {
            tracing::debug!(seq, applied = self.index_seq, "Discarding stale reservation fetch");
            return false;
        }
        self.index = index;
        self.index_seq = seq;
        true
    }
}

pub type SharedState = Arc<RwLock<FloorState>>;
