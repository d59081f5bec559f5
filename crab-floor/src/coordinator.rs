//! Transition coordinator
//!
//! Runs one table status change end to end:
//!
//! 1. snapshot the collection and claim the table
//! 2. check reservations and ask the confirmation gate on conflict
//! 3. apply the status optimistically and call the backend once
//! 4. on rejection restore the table's previous status
//! 5. on success refresh; if that fails keep the confirmed status

use std::sync::Arc;

use shared::TableStatus;
use tokio::sync::broadcast;

use crate::conflict::{self, ConfirmGate};
use crate::error::{FloorError, FloorResult};
use crate::events::{FloorEvent, Notice};
use crate::scheduler::RefreshScheduler;
use crate::state::SharedState;
use crate::FloorApi;

/// How a status change ended
///
/// `Success` and `RefreshAfterUpdateFailed` are mutually exclusive: the
/// second one is a saved change with a stale view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Saved and the view is current
    Success,
    /// The user declined the reservation warning; nothing was sent
    ConflictDeclined,
    /// The backend rejected or never received the change; view rolled back.
    /// The table's edit marker stays set so the change can be retried.
    RemoteUpdateFailed { message: String },
    /// Saved, but the follow-up refresh failed
    RefreshAfterUpdateFailed { message: String },
}

impl TransitionOutcome {
    /// Whether the backend accepted the change
    pub fn is_saved(&self) -> bool {
        matches!(
            self,
            TransitionOutcome::Success | TransitionOutcome::RefreshAfterUpdateFailed { .. }
        )
    }

    /// Message for the user. A declined confirmation shows nothing.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            TransitionOutcome::Success => Some(Notice::success("Status updated")),
            TransitionOutcome::ConflictDeclined => None,
            TransitionOutcome::RemoteUpdateFailed { message } => {
                Some(Notice::error(format!("Update failed: {}", message)))
            }
            TransitionOutcome::RefreshAfterUpdateFailed { .. } => Some(Notice::warning(
                "Status saved, but the view could not be refreshed. Reload it manually.",
            )),
        }
    }
}

/// Releases the table claim if a transition future is dropped midway,
/// undoing an optimistic status the backend never confirmed
struct ClaimGuard {
    state: SharedState,
    table_id: i64,
    /// Status to restore while the optimistic one is unconfirmed
    revert: Option<TableStatus>,
    armed: bool,
}

impl ClaimGuard {
    fn new(state: SharedState, table_id: i64) -> Self {
        Self {
            state,
            table_id,
            revert: None,
            armed: true,
        }
    }

    fn set_revert(&mut self, previous: Option<TableStatus>) {
        self.revert = previous;
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let table_id = self.table_id;
        let revert = self.revert;
        tracing::warn!(table_id, reverted = revert.is_some(), "Transition abandoned, releasing table");
        if let Ok(mut state) = self.state.try_write() {
            state.store.abandon_transition(table_id, revert);
            return;
        }
        let state = Arc::clone(&self.state);
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                state.write().await.store.abandon_transition(table_id, revert);
            });
        }
    }
}

pub struct TransitionCoordinator {
    api: Arc<dyn FloorApi>,
    state: SharedState,
    scheduler: Arc<RefreshScheduler>,
    events: broadcast::Sender<FloorEvent>,
}

impl TransitionCoordinator {
    pub fn new(
        api: Arc<dyn FloorApi>,
        state: SharedState,
        scheduler: Arc<RefreshScheduler>,
        events: broadcast::Sender<FloorEvent>,
    ) -> Self {
        Self {
            api,
            state,
            scheduler,
            events,
        }
    }

    /// Change the status of one table.
    ///
    /// Errors only for caller mistakes (unknown table, change already in
    /// progress); every backend failure is folded into the outcome.
    #[tracing::instrument(name = "table_transition", skip(self, target, gate), fields(status = %target))]
    pub async fn transition(
        &self,
        table_id: i64,
        target: TableStatus,
        gate: &dyn ConfirmGate,
    ) -> FloorResult<TransitionOutcome> {
        let outcome = self.run(table_id, target, gate).await?;
        match &outcome {
            TransitionOutcome::Success => tracing::info!("Table status updated"),
            TransitionOutcome::ConflictDeclined => {
                tracing::info!("Status change declined at reservation warning")
            }
            TransitionOutcome::RemoteUpdateFailed { message } => {
                tracing::error!(error = %message, "Table status update failed, rolled back")
            }
            TransitionOutcome::RefreshAfterUpdateFailed { message } => {
                tracing::warn!(error = %message, "Table status saved but refresh failed")
            }
        }
        let _ = self.events.send(FloorEvent::Transition {
            table_id,
            target,
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    async fn run(
        &self,
        table_id: i64,
        target: TableStatus,
        gate: &dyn ConfirmGate,
    ) -> FloorResult<TransitionOutcome> {
        // 1. claim + snapshot + conflict check
        let (snapshot, prompt) = {
            let mut state = self.state.write().await;
            let table = state
                .store
                .get(table_id)
                .cloned()
                .ok_or(FloorError::UnknownTable(table_id))?;
            if !state.store.try_begin_transition(table_id) {
                return Err(FloorError::TransitionInFlight(table_id));
            }
            let prompt = conflict::evaluate(&table, target, &state.filter, &state.index);
            (state.store.snapshot(), prompt)
        };
        let mut claim = ClaimGuard::new(Arc::clone(&self.state), table_id);

        // 2. confirmation gate
        if let Some(prompt) = prompt {
            tracing::debug!(reservations = prompt.reservations.len(), window = %prompt.window(), "Asking for confirmation");
            if !gate.confirm(&prompt).await {
                let mut state = self.state.write().await;
                state.store.finish_transition(table_id);
                state.store.clear_edit(table_id);
                claim.disarm();
                return Ok(TransitionOutcome::ConflictDeclined);
            }
        }

        // 3. optimistic update + the single remote call
        self.state.write().await.store.apply_optimistic(table_id, target);
        claim.set_revert(snapshot.status_of(table_id));
        if let Err(e) = self.api.set_table_status(table_id, target).await {
            let mut state = self.state.write().await;
            state.store.rollback(&snapshot, table_id);
            state.store.finish_transition(table_id);
            claim.disarm();
            return Ok(TransitionOutcome::RemoteUpdateFailed {
                message: e.to_string(),
            });
        }

        claim.set_revert(None);

        // 4. reconcile; fetches issued before this point may predate the change
        let issued_seq = self.scheduler.issued_tables_seq();
        let report = self.scheduler.refresh_all().await;

        let mut state = self.state.write().await;
        if report.tables.is_err() {
            state.store.retain_confirmed(table_id, target, issued_seq);
        }
        state.store.finish_transition(table_id);
        // 5. close the edit controls
        state.store.clear_edit(table_id);
        claim.disarm();

        Ok(match report.first_error() {
            Some(err) => TransitionOutcome::RefreshAfterUpdateFailed {
                message: err.to_string(),
            },
            None => TransitionOutcome::Success,
        })
    }
}
