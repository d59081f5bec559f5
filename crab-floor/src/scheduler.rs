//! Refresh scheduler
//!
//! Reloads the table collection and the reservation index on activation,
//! on a fixed period, and whenever the date/hour/availability filter
//! changes.
//!
//! Every fetch is tagged with a per-collection sequence number when it is
//! issued. A response is applied only if no newer one has been applied
//! yet, so the last issued request wins regardless of resolution order.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{Collection, FloorError, FloorResult};
use crate::events::FloorEvent;
use crate::index::ReservationIndex;
use crate::state::SharedState;
use crate::FloorApi;

/// What happened to a fetch result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    /// Result was installed
    Applied,
    /// A newer result was already installed; this one was dropped
    Superseded,
}

/// Result of a full refresh round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub tables: FloorResult<RefreshStatus>,
    /// `None` when the availability view is off and nothing was fetched
    pub reservations: Option<FloorResult<RefreshStatus>>,
}

impl RefreshReport {
    pub fn first_error(&self) -> Option<&FloorError> {
        self.tables
            .as_ref()
            .err()
            .or_else(|| self.reservations.as_ref().and_then(|r| r.as_ref().err()))
    }

    pub fn is_ok(&self) -> bool {
        self.first_error().is_none()
    }

    pub fn into_result(self) -> FloorResult<()> {
        match self.first_error() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Counts running fetches for the "refresh in progress" flag
struct InProgress<'a>(&'a AtomicUsize);

impl<'a> InProgress<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct RefreshScheduler {
    api: Arc<dyn FloorApi>,
    state: SharedState,
    tables_seq: AtomicU64,
    reservations_seq: AtomicU64,
    in_progress: AtomicUsize,
    events: broadcast::Sender<FloorEvent>,
}

impl RefreshScheduler {
    pub fn new(
        api: Arc<dyn FloorApi>,
        state: SharedState,
        events: broadcast::Sender<FloorEvent>,
    ) -> Self {
        Self {
            api,
            state,
            tables_seq: AtomicU64::new(0),
            reservations_seq: AtomicU64::new(0),
            in_progress: AtomicUsize::new(0),
            events,
        }
    }

    /// Whether any fetch is currently running
    pub fn is_refreshing(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst) > 0
    }

    /// Sequence number of the newest table fetch issued so far
    pub fn issued_tables_seq(&self) -> u64 {
        self.tables_seq.load(Ordering::SeqCst)
    }

    /// Reload tables. On failure the previous collection stays in place.
    pub async fn refresh_tables(&self) -> FloorResult<RefreshStatus> {
        let (seq, query) = {
            let state = self.state.read().await;
            let seq = self.tables_seq.fetch_add(1, Ordering::SeqCst) + 1;
            (seq, state.filter.table_query())
        };

        let result = {
            let _busy = InProgress::enter(&self.in_progress);
            self.api.fetch_tables(query).await
        };

        match result {
            Ok(tables) => {
                let count = tables.len();
                let applied = self.state.write().await.store.apply_refresh(seq, tables);
                if !applied {
                    return Ok(RefreshStatus::Superseded);
                }
                tracing::debug!(seq, count, "Tables refreshed");
                let _ = self.events.send(FloorEvent::TablesRefreshed { count });
                Ok(RefreshStatus::Applied)
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "Failed to load tables");
                Err(self.report_failure(Collection::Tables, &e))
            }
        }
    }

    /// Reload reservations for the active date.
    ///
    /// On failure the index is emptied: a stale reservation view is worse
    /// than none.
    pub async fn refresh_reservations(&self) -> FloorResult<RefreshStatus> {
        let (seq, filter) = {
            let state = self.state.read().await;
            let seq = self.reservations_seq.fetch_add(1, Ordering::SeqCst) + 1;
            (seq, state.filter.clone())
        };

        let result = {
            let _busy = InProgress::enter(&self.in_progress);
            self.api.fetch_reservations(filter.reservation_query()).await
        };

        match result {
            Ok(reservations) => {
                let index = ReservationIndex::build(&reservations, &filter);
                let count = index.len();
                let applied = self.state.write().await.apply_index(seq, index);
                if !applied {
                    return Ok(RefreshStatus::Superseded);
                }
                tracing::debug!(seq, count, date = %filter.date, "Reservations refreshed");
                let _ = self.events.send(FloorEvent::ReservationsRefreshed { count });
                Ok(RefreshStatus::Applied)
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "Failed to load reservations");
                self.state.write().await.apply_index(seq, ReservationIndex::empty());
                Err(self.report_failure(Collection::Reservations, &e))
            }
        }
    }

    /// Drop the reservation index, superseding any fetch still running
    pub async fn clear_reservations(&self) {
        let mut state = self.state.write().await;
        let seq = self.reservations_seq.fetch_add(1, Ordering::SeqCst) + 1;
        state.apply_index(seq, ReservationIndex::empty());
    }

    /// Reload tables, and reservations while the availability view is on
    pub async fn refresh_all(&self) -> RefreshReport {
        let show_availability = self.state.read().await.filter.show_availability;
        if !show_availability {
            self.clear_reservations().await;
            return RefreshReport {
                tables: self.refresh_tables().await,
                reservations: None,
            };
        }

        let (tables, reservations) =
            futures::join!(self.refresh_tables(), self.refresh_reservations());
        RefreshReport {
            tables,
            reservations: Some(reservations),
        }
    }

    /// Refresh now and then every `period` until the handle is stopped
    pub fn start(self: &Arc<Self>, period: Duration) -> RefreshHandle {
        let scheduler = Arc::clone(self);
        RefreshHandle::spawn("floor_refresh", period, move || {
            let scheduler = Arc::clone(&scheduler);
            async move {
                // failures are already logged and broadcast
                let _ = scheduler.refresh_all().await;
            }
        })
    }

    fn report_failure(&self, collection: Collection, err: &crate::ClientError) -> FloorError {
        let error = FloorError::fetch(collection, err);
        let _ = self.events.send(FloorEvent::FetchFailed {
            collection,
            message: err.to_string(),
        });
        error
    }
}

/// Owner of a periodic background task
///
/// The task stops when [`stop`](Self::stop) is called or the handle is
/// dropped.
pub struct RefreshHandle {
    name: &'static str,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Run `tick` immediately and then every `period`.
    ///
    /// Ticks never overlap; a slow tick delays the next one.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(task = %name, period_secs = period.as_secs_f64(), "Refresh task started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tick() => {}
                }
            }

            tracing::info!(task = %name, "Refresh task stopped");
        });

        Self {
            name,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the task and wait for it to exit
    pub async fn stop(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!(task = %self.name, error = %e, "Refresh task ended abnormally");
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
