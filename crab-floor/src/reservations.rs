//! Reservation book
//!
//! The reservation list with its status filter and the cancellation flow.
//! Cancellation follows the same contract as a table transition: one
//! remote call, then one refresh, with a stale-view warning if only the
//! refresh failed.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use shared::{Reservation, ReservationQuery, ReservationStatus};
use tokio::sync::{RwLock, broadcast};

use crate::coordinator::TransitionOutcome;
use crate::error::{Collection, FloorError, FloorResult};
use crate::events::FloorEvent;
use crate::scheduler::{RefreshHandle, RefreshStatus};
use crate::FloorApi;

#[derive(Debug, Default)]
struct BookState {
    reservations: Vec<Reservation>,
    status_filter: Option<ReservationStatus>,
    applied_seq: u64,
    cancelling: HashSet<i64>,
}

pub struct ReservationBook {
    api: Arc<dyn FloorApi>,
    state: RwLock<BookState>,
    seq: AtomicU64,
    events: broadcast::Sender<FloorEvent>,
}

impl ReservationBook {
    pub fn new(api: Arc<dyn FloorApi>, events: broadcast::Sender<FloorEvent>) -> Self {
        Self {
            api,
            state: RwLock::new(BookState::default()),
            seq: AtomicU64::new(0),
            events,
        }
    }

    /// Current list, as last loaded
    pub async fn reservations(&self) -> Vec<Reservation> {
        self.state.read().await.reservations.clone()
    }

    pub async fn status_filter(&self) -> Option<ReservationStatus> {
        self.state.read().await.status_filter
    }

    /// Change the status filter and reload
    pub async fn set_status_filter(
        &self,
        status: Option<ReservationStatus>,
    ) -> FloorResult<RefreshStatus> {
        self.state.write().await.status_filter = status;
        self.refresh().await
    }

    /// Reload the list. On failure the previous list stays in place.
    pub async fn refresh(&self) -> FloorResult<RefreshStatus> {
        let (seq, query) = {
            let state = self.state.read().await;
            let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
            let query = ReservationQuery {
                date: None,
                status: state.status_filter,
            };
            (seq, query)
        };

        match self.api.fetch_reservations(query).await {
            Ok(reservations) => {
                let count = reservations.len();
                let mut state = self.state.write().await;
                if seq <= state.applied_seq {
                    tracing::debug!(seq, applied = state.applied_seq, "Discarding stale reservation list");
                    return Ok(RefreshStatus::Superseded);
                }
                state.reservations = reservations;
                state.applied_seq = seq;
                drop(state);
                let _ = self.events.send(FloorEvent::ReservationsRefreshed { count });
                Ok(RefreshStatus::Applied)
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "Failed to load reservation list");
                let _ = self.events.send(FloorEvent::FetchFailed {
                    collection: Collection::Reservations,
                    message: e.to_string(),
                });
                Err(FloorError::fetch(Collection::Reservations, &e))
            }
        }
    }

    /// Cancel a pending reservation
    pub async fn cancel(&self, reservation_id: i64) -> FloorResult<TransitionOutcome> {
        {
            let mut state = self.state.write().await;
            let status = state
                .reservations
                .iter()
                .find(|r| r.id == reservation_id)
                .map(|r| r.status)
                .ok_or(FloorError::UnknownReservation(reservation_id))?;
            if !status.is_cancellable() {
                return Err(FloorError::NotCancellable {
                    id: reservation_id,
                    status,
                });
            }
            if !state.cancelling.insert(reservation_id) {
                return Err(FloorError::CancellationInFlight(reservation_id));
            }
        }

        let outcome = match self
            .api
            .set_reservation_status(reservation_id, ReservationStatus::Cancelled)
            .await
        {
            Err(e) => {
                tracing::error!(reservation_id, error = %e, "Failed to cancel reservation");
                TransitionOutcome::RemoteUpdateFailed {
                    message: e.to_string(),
                }
            }
            Ok(()) => match self.refresh().await {
                Ok(_) => {
                    tracing::info!(reservation_id, "Reservation cancelled");
                    TransitionOutcome::Success
                }
                Err(err) => {
                    let mut state = self.state.write().await;
                    if let Some(r) = state.reservations.iter_mut().find(|r| r.id == reservation_id) {
                        r.status = ReservationStatus::Cancelled;
                    }
                    TransitionOutcome::RefreshAfterUpdateFailed {
                        message: err.to_string(),
                    }
                }
            },
        };

        self.state.write().await.cancelling.remove(&reservation_id);
        let _ = self.events.send(FloorEvent::ReservationCancel {
            reservation_id,
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    /// Load now and then every `period`
    pub fn start(self: &Arc<Self>, period: Duration) -> RefreshHandle {
        let book = Arc::clone(self);
        RefreshHandle::spawn("reservation_refresh", period, move || {
            let book = Arc::clone(&book);
            async move {
                let _ = book.refresh().await;
            }
        })
    }
}
