//! Table state store
//!
//! Holds the last-known table collection. Written only by the refresh
//! scheduler (whole-collection replacement) and the transition coordinator
//! (optimistic status, snapshot restore).

use std::collections::{HashMap, HashSet};

use shared::{DiningTable, TableStatus};

/// Pre-transition copy of the table collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    tables: Vec<DiningTable>,
    version: u64,
}

impl TableSnapshot {
    pub fn tables(&self) -> &[DiningTable] {
        &self.tables
    }

    /// Store version the snapshot was taken at
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn status_of(&self, table_id: i64) -> Option<TableStatus> {
        self.tables.iter().find(|t| t.id == table_id).map(|t| t.status)
    }
}

/// Number of tables per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub available: usize,
    pub reserved: usize,
    pub occupied: usize,
    pub cleaning: usize,
}

impl StatusCounts {
    pub fn get(&self, status: TableStatus) -> usize {
        match status {
            TableStatus::Available => self.available,
            TableStatus::Reserved => self.reserved,
            TableStatus::Occupied => self.occupied,
            TableStatus::Cleaning => self.cleaning,
        }
    }

    pub fn total(&self) -> usize {
        self.available + self.reserved + self.occupied + self.cleaning
    }
}

#[derive(Debug, Default)]
pub struct TableStore {
    tables: Vec<DiningTable>,
    /// Bumped on every applied refresh
    version: u64,
    /// Sequence number of the newest applied fetch
    applied_seq: u64,
    /// Optimistic statuses of unresolved transitions
    pending: HashMap<i64, TableStatus>,
    /// Tables with a transition between conflict check and reconciliation
    in_flight: HashSet<i64>,
    /// Table whose status controls are open
    editing: Option<i64>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &[DiningTable] {
        &self.tables
    }

    pub fn get(&self, table_id: i64) -> Option<&DiningTable> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    /// Tables matching the status filter (None = all)
    pub fn visible(&self, status: Option<TableStatus>) -> Vec<DiningTable> {
        self.tables
            .iter()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect()
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for table in &self.tables {
            match table.status {
                TableStatus::Available => counts.available += 1,
                TableStatus::Reserved => counts.reserved += 1,
                TableStatus::Occupied => counts.occupied += 1,
                TableStatus::Cleaning => counts.cleaning += 1,
            }
        }
        counts
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            tables: self.tables.clone(),
            version: self.version,
        }
    }

    /// Replace the collection with a fetch result.
    ///
    /// Results older than the newest applied one are discarded. Pending
    /// optimistic statuses are laid back on top of fresh data.
    pub fn apply_refresh(&mut self, seq: u64, tables: Vec<DiningTable>) -> bool {
        if seq <= self.applied_seq {
            tracing::debug!(seq, applied = self.applied_seq, "Discarding stale table fetch");
            return false;
        }
        self.tables = tables;
        self.applied_seq = seq;
        self.version += 1;
        self.reapply_pending();
        true
    }

    // ========== Transition bookkeeping ==========

    /// Claim a table for a transition. `false` if one is already running.
    pub fn try_begin_transition(&mut self, table_id: i64) -> bool {
        self.in_flight.insert(table_id)
    }

    pub fn finish_transition(&mut self, table_id: i64) {
        self.in_flight.remove(&table_id);
        self.pending.remove(&table_id);
    }

    pub fn is_in_flight(&self, table_id: i64) -> bool {
        self.in_flight.contains(&table_id)
    }

    /// Show `status` before the backend confirms it
    pub fn apply_optimistic(&mut self, table_id: i64, status: TableStatus) {
        self.pending.insert(table_id, status);
        self.set_status(table_id, status);
    }

    /// Undo an optimistic update after the backend rejected it.
    ///
    /// Only this table goes back to its snapshot status; other tables may
    /// carry statuses confirmed since the snapshot was taken.
    pub fn rollback(&mut self, snapshot: &TableSnapshot, table_id: i64) {
        self.pending.remove(&table_id);
        if let Some(previous) = snapshot.status_of(table_id) {
            self.set_status(table_id, previous);
        }
    }

    /// Keep a confirmed status when the follow-up refresh failed.
    ///
    /// Fetches issued up to `issued_seq` may predate the change, so they
    /// are discarded when they resolve.
    pub fn retain_confirmed(&mut self, table_id: i64, status: TableStatus, issued_seq: u64) {
        if issued_seq > self.applied_seq {
            tracing::debug!(table_id, issued_seq, applied = self.applied_seq, "Discarding fetches older than confirmed status");
            self.applied_seq = issued_seq;
        }
        self.set_status(table_id, status);
    }

    /// Release a transition that was abandoned midway, restoring `revert`
    /// when the optimistic status was never confirmed
    pub fn abandon_transition(&mut self, table_id: i64, revert: Option<TableStatus>) {
        self.finish_transition(table_id);
        if let Some(previous) = revert {
            self.set_status(table_id, previous);
        }
    }

    // ========== Edit marker ==========

    /// Open the status controls of one table, closing any other
    pub fn begin_edit(&mut self, table_id: i64) {
        self.editing = Some(table_id);
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Close the marker if it belongs to this table
    pub fn clear_edit(&mut self, table_id: i64) {
        if self.editing == Some(table_id) {
            self.editing = None;
        }
    }

    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    fn set_status(&mut self, table_id: i64, status: TableStatus) {
        if let Some(table) = self.tables.iter_mut().find(|t| t.id == table_id) {
            table.status = status;
        }
    }

    fn reapply_pending(&mut self) {
        let pending: Vec<(i64, TableStatus)> = self.pending.iter().map(|(id, s)| (*id, *s)).collect();
        for (id, status) in pending {
            self.set_status(id, status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(id: i64, number: u32, status: TableStatus) -> DiningTable {
        DiningTable {
            id,
            number,
            capacity: 4,
            status,
        }
    }

    fn floor() -> Vec<DiningTable> {
        vec![
            table(1, 1, TableStatus::Available),
            table(2, 2, TableStatus::Reserved),
            table(3, 3, TableStatus::Occupied),
        ]
    }

    fn loaded() -> TableStore {
        let mut store = TableStore::new();
        assert!(store.apply_refresh(1, floor()));
        store
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut store = loaded();
        assert!(store.apply_refresh(3, vec![table(1, 1, TableStatus::Cleaning)]));
        assert!(!store.apply_refresh(2, floor()));
        assert_eq!(store.tables().len(), 1);
        assert_eq!(store.applied_seq(), 3);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_visible_and_counts() {
        let store = loaded();
        assert_eq!(store.visible(None).len(), 3);
        let occupied = store.visible(Some(TableStatus::Occupied));
        assert_eq!(occupied.len(), 1);
        assert_eq!(occupied[0].id, 3);

        let counts = store.status_counts();
        assert_eq!(counts.get(TableStatus::Available), 1);
        assert_eq!(counts.get(TableStatus::Cleaning), 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_rollback_restores_snapshot_exactly() {
        let mut store = loaded();
        let snapshot = store.snapshot();
        store.apply_optimistic(1, TableStatus::Occupied);
        assert_eq!(store.get(1).unwrap().status, TableStatus::Occupied);

        store.rollback(&snapshot, 1);
        assert_eq!(store.tables(), snapshot.tables());
    }

    #[test]
    fn test_rollback_after_newer_refresh_reverts_only_target() {
        let mut store = loaded();
        let snapshot = store.snapshot();
        store.apply_optimistic(1, TableStatus::Occupied);

        let mut fresh = floor();
        fresh[2].status = TableStatus::Cleaning;
        store.apply_refresh(2, fresh);
        // in-flight intent survives the refresh
        assert_eq!(store.get(1).unwrap().status, TableStatus::Occupied);

        store.rollback(&snapshot, 1);
        assert_eq!(store.get(1).unwrap().status, TableStatus::Available);
        assert_eq!(store.get(3).unwrap().status, TableStatus::Cleaning);
    }

    #[test]
    fn test_retain_confirmed_keeps_target() {
        let mut store = loaded();
        let snapshot = store.snapshot();
        store.apply_optimistic(2, TableStatus::Cleaning);
        store.retain_confirmed(2, TableStatus::Cleaning, 4);
        store.finish_transition(2);

        assert_eq!(store.get(2).unwrap().status, TableStatus::Cleaning);
        assert_eq!(store.get(1), snapshot.tables().iter().find(|t| t.id == 1));
        assert_eq!(store.get(3), snapshot.tables().iter().find(|t| t.id == 3));

        // fetches issued before the confirmation no longer apply
        assert!(!store.apply_refresh(3, floor()));
        assert_eq!(store.get(2).unwrap().status, TableStatus::Cleaning);
        assert!(store.apply_refresh(5, floor()));
        assert_eq!(store.get(2).unwrap().status, TableStatus::Reserved);
    }

    #[test]
    fn test_rollback_keeps_other_confirmed_statuses() {
        let mut store = loaded();
        let snapshot_1 = store.snapshot();
        store.apply_optimistic(1, TableStatus::Occupied);

        // table 3 confirmed while table 1 is still unresolved
        store.apply_optimistic(3, TableStatus::Cleaning);
        store.retain_confirmed(3, TableStatus::Cleaning, 1);
        store.finish_transition(3);

        store.rollback(&snapshot_1, 1);
        assert_eq!(store.get(1).unwrap().status, TableStatus::Available);
        assert_eq!(store.get(3).unwrap().status, TableStatus::Cleaning);
    }

    #[test]
    fn test_abandoned_transition_reverts_unconfirmed_status() {
        let mut store = loaded();
        assert!(store.try_begin_transition(1));
        store.apply_optimistic(1, TableStatus::Occupied);

        store.abandon_transition(1, Some(TableStatus::Available));
        assert!(!store.is_in_flight(1));
        assert_eq!(store.get(1).unwrap().status, TableStatus::Available);

        assert!(store.try_begin_transition(2));
        store.apply_optimistic(2, TableStatus::Cleaning);
        store.abandon_transition(2, None);
        assert_eq!(store.get(2).unwrap().status, TableStatus::Cleaning);
    }

    #[test]
    fn test_in_flight_is_exclusive() {
        let mut store = loaded();
        assert!(store.try_begin_transition(1));
        assert!(!store.try_begin_transition(1));
        assert!(store.try_begin_transition(2));
        store.finish_transition(1);
        assert!(!store.is_in_flight(1));
        assert!(store.try_begin_transition(1));
    }

    #[test]
    fn test_edit_marker() {
        let mut store = loaded();
        store.begin_edit(1);
        store.begin_edit(2);
        assert_eq!(store.editing(), Some(2));
        store.clear_edit(1);
        assert_eq!(store.editing(), Some(2));
        store.clear_edit(2);
        assert_eq!(store.editing(), None);
    }
}
