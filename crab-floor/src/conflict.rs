//! Conflict evaluation and the confirmation gate

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{DiningTable, FloorFilter, Reservation, TableStatus, table_code};
use tokio::sync::{mpsc, oneshot};

use crate::index::ReservationIndex;

/// Whether a table's reservations clash with the selected hour.
///
/// No reservations never conflict. Without an hour prefix any reservation
/// conflicts; with one, at least one reservation time must start with it.
pub fn has_conflict(table_number: u32, reservations_for_table: &[Reservation], hour_prefix: &str) -> bool {
    if reservations_for_table.is_empty() {
        return false;
    }
    let conflict = hour_prefix.is_empty()
        || reservations_for_table
            .iter()
            .any(|r| r.time_starts_with(hour_prefix));
    tracing::trace!(table = table_number, hour_prefix, conflict, "Evaluated reservation conflict");
    conflict
}

/// Check a proposed transition against the index.
///
/// Returns the prompt to show when confirmation is required.
pub fn evaluate(
    table: &DiningTable,
    target: TableStatus,
    filter: &FloorFilter,
    index: &ReservationIndex,
) -> Option<ConflictPrompt> {
    if !filter.show_availability || !target.needs_reservation_check() {
        return None;
    }
    let reservations = index.for_table(table.number);
    if !has_conflict(table.number, reservations, &filter.hour_prefix) {
        return None;
    }
    Some(ConflictPrompt {
        table_id: table.id,
        table_number: table.number,
        target,
        date: filter.date,
        hour_prefix: filter.hour_prefix.clone(),
        reservations: reservations.to_vec(),
    })
}

/// What the user is asked to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictPrompt {
    pub table_id: i64,
    pub table_number: u32,
    pub target: TableStatus,
    pub date: NaiveDate,
    pub hour_prefix: String,
    pub reservations: Vec<Reservation>,
}

impl ConflictPrompt {
    /// Human readable date/hour window, e.g. "2024-06-01 at 19"
    pub fn window(&self) -> String {
        if self.hour_prefix.is_empty() {
            self.date.format("%Y-%m-%d").to_string()
        } else {
            format!("{} at {}", self.date.format("%Y-%m-%d"), self.hour_prefix)
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Table {} has reservations for {}. Mark it as {} anyway?",
            table_code(self.table_number),
            self.window(),
            self.target
        )
    }
}

/// Asynchronous confirmation step injected into the coordinator
#[async_trait]
pub trait ConfirmGate: Send + Sync {
    /// `true` to go ahead with the transition
    async fn confirm(&self, prompt: &ConflictPrompt) -> bool;
}

/// Gate that accepts every prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

#[async_trait]
impl ConfirmGate for AlwaysConfirm {
    async fn confirm(&self, _prompt: &ConflictPrompt) -> bool {
        true
    }
}

/// Gate that declines every prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

#[async_trait]
impl ConfirmGate for NeverConfirm {
    async fn confirm(&self, _prompt: &ConflictPrompt) -> bool {
        false
    }
}

/// Gate backed by a synchronous closure
pub struct FnGate<F>(pub F);

#[async_trait]
impl<F> ConfirmGate for FnGate<F>
where
    F: Fn(&ConflictPrompt) -> bool + Send + Sync,
{
    async fn confirm(&self, prompt: &ConflictPrompt) -> bool {
        (self.0)(prompt)
    }
}

/// A pending question for the presentation layer
#[derive(Debug)]
pub struct ConfirmRequest {
    pub prompt: ConflictPrompt,
    reply: oneshot::Sender<bool>,
}

impl ConfirmRequest {
    pub fn answer(self, confirmed: bool) {
        // receiver gone means the transition was dropped
        let _ = self.reply.send(confirmed);
    }
}

/// Gate that forwards prompts over a channel and waits for the answer
///
/// A closed channel or a dropped request counts as declined.
#[derive(Debug, Clone)]
pub struct ChannelGate {
    tx: mpsc::Sender<ConfirmRequest>,
}

impl ChannelGate {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ConfirmRequest>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ConfirmGate for ChannelGate {
    async fn confirm(&self, prompt: &ConflictPrompt) -> bool {
        let (reply, answer) = oneshot::channel();
        let request = ConfirmRequest {
            prompt: prompt.clone(),
            reply,
        };
        if self.tx.send(request).await.is_err() {
            tracing::warn!(table_id = prompt.table_id, "Confirmation channel closed, declining");
            return false;
        }
        answer.await.unwrap_or(false)
    }
}
