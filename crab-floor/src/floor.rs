//! Floor manager
//!
//! Composition root of the engine and the surface the presentation layer
//! talks to: filtered tables, reservation annotations, counters, the
//! refresh flag, transition outcomes and the event stream.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use shared::{DiningTable, FloorFilter, Reservation, TableStatus, models::today};
use tokio::sync::{RwLock, broadcast};

use crate::conflict::{self, ConfirmGate};
use crate::coordinator::{TransitionCoordinator, TransitionOutcome};
use crate::error::FloorResult;
use crate::events::FloorEvent;
use crate::scheduler::{RefreshHandle, RefreshReport, RefreshScheduler};
use crate::state::{FloorState, SharedState};
use crate::store::StatusCounts;
use crate::{FloorApi, FloorConfig};

const EVENT_CAPACITY: usize = 64;

/// One table together with its reservations for the selected window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAnnotation {
    pub table: DiningTable,
    pub code: String,
    /// Empty while the availability view is off
    pub reservations: Vec<Reservation>,
    /// Some reservation falls in the selected hour (any, without an hour)
    pub has_conflict: bool,
}

pub struct FloorManager {
    state: SharedState,
    scheduler: Arc<RefreshScheduler>,
    coordinator: TransitionCoordinator,
    events: broadcast::Sender<FloorEvent>,
    refresh_interval: Duration,
}

impl FloorManager {
    /// Engine for today's date with the configured availability view
    pub fn new(api: Arc<dyn FloorApi>, config: &FloorConfig) -> Self {
        let filter = FloorFilter::default().with_availability(config.show_availability);
        Self::with_filter(api, config, filter)
    }

    pub fn with_filter(api: Arc<dyn FloorApi>, config: &FloorConfig, filter: FloorFilter) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let state: SharedState = Arc::new(RwLock::new(FloorState::new(filter)));
        let scheduler = Arc::new(RefreshScheduler::new(
            Arc::clone(&api),
            Arc::clone(&state),
            events.clone(),
        ));
        let coordinator = TransitionCoordinator::new(
            api,
            Arc::clone(&state),
            Arc::clone(&scheduler),
            events.clone(),
        );

        Self {
            state,
            scheduler,
            coordinator,
            events,
            refresh_interval: config.refresh_interval,
        }
    }

    /// Load everything now and keep refreshing until the handle stops
    pub fn start(&self) -> RefreshHandle {
        self.scheduler.start(self.refresh_interval)
    }

    /// Manual refresh
    pub async fn refresh(&self) -> RefreshReport {
        self.scheduler.refresh_all().await
    }

    pub fn scheduler(&self) -> &Arc<RefreshScheduler> {
        &self.scheduler
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FloorEvent> {
        self.events.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        self.scheduler.is_refreshing()
    }

    // ========== Filters ==========

    pub async fn filter(&self) -> FloorFilter {
        self.state.read().await.filter.clone()
    }

    /// Replace the filter, refetching when date, hour or the availability
    /// view changed. `None` when no fetch was needed.
    pub async fn set_filter(&self, filter: FloorFilter) -> Option<RefreshReport> {
        let refetch = {
            let mut state = self.state.write().await;
            let refetch = filter.needs_refetch(&state.filter);
            state.filter = filter;
            refetch
        };
        if !refetch {
            return None;
        }
        tracing::debug!("Floor filter changed, refreshing");
        Some(self.scheduler.refresh_all().await)
    }

    pub async fn set_date(&self, date: NaiveDate) -> Option<RefreshReport> {
        let mut filter = self.filter().await;
        filter.date = date;
        self.set_filter(filter).await
    }

    pub async fn set_hour_prefix(&self, prefix: impl Into<String>) -> Option<RefreshReport> {
        let mut filter = self.filter().await;
        filter.hour_prefix = prefix.into();
        self.set_filter(filter).await
    }

    pub async fn set_show_availability(&self, enabled: bool) -> Option<RefreshReport> {
        let mut filter = self.filter().await;
        filter.show_availability = enabled;
        self.set_filter(filter).await
    }

    /// Local filter, never fetches
    pub async fn set_status_filter(&self, status: Option<TableStatus>) {
        self.state.write().await.filter.status = status;
    }

    /// Back to today without an hour
    pub async fn clear_time_filters(&self) -> Option<RefreshReport> {
        let mut filter = self.filter().await;
        filter.hour_prefix.clear();
        filter.date = today();
        self.set_filter(filter).await
    }

    // ========== Views ==========

    /// Every known table
    pub async fn tables(&self) -> Vec<DiningTable> {
        self.state.read().await.store.tables().to_vec()
    }

    /// Tables matching the status filter
    pub async fn visible_tables(&self) -> Vec<DiningTable> {
        let state = self.state.read().await;
        state.store.visible(state.filter.status)
    }

    /// Visible tables with their reservations for the selected window
    pub async fn annotations(&self) -> Vec<TableAnnotation> {
        let state = self.state.read().await;
        let filter = &state.filter;
        state
            .store
            .visible(filter.status)
            .into_iter()
            .map(|table| {
                let reservations = if filter.show_availability {
                    state.index.for_table(table.number).to_vec()
                } else {
                    Vec::new()
                };
                let has_conflict =
                    conflict::has_conflict(table.number, &reservations, &filter.hour_prefix);
                TableAnnotation {
                    code: table.code(),
                    table,
                    reservations,
                    has_conflict,
                }
            })
            .collect()
    }

    /// Per-status counters over all tables
    pub async fn status_counts(&self) -> StatusCounts {
        self.state.read().await.store.status_counts()
    }

    // ========== Editing ==========

    pub async fn begin_edit(&self, table_id: i64) {
        self.state.write().await.store.begin_edit(table_id);
    }

    pub async fn cancel_edit(&self) {
        self.state.write().await.store.cancel_edit();
    }

    pub async fn editing(&self) -> Option<i64> {
        self.state.read().await.store.editing()
    }

    /// Whether a status change for the table is unresolved
    pub async fn is_in_flight(&self, table_id: i64) -> bool {
        self.state.read().await.store.is_in_flight(table_id)
    }

    // ========== Transitions ==========

    /// Change one table's status; see [`TransitionCoordinator::transition`]
    pub async fn transition(
        &self,
        table_id: i64,
        target: TableStatus,
        gate: &dyn ConfirmGate,
    ) -> FloorResult<TransitionOutcome> {
        self.coordinator.transition(table_id, target, gate).await
    }
}
