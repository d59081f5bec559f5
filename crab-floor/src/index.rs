//! Reservation index
//!
//! Groups the reservations of the selected day by the table code they
//! refer to, so the floor view can annotate each table and the coordinator
//! can look up conflicts by table number.

use std::collections::HashMap;

use chrono::NaiveDate;
use shared::{FloorFilter, Reservation, table_code};

/// Group reservations by table code.
///
/// With a non-empty `hour_prefix`, reservations whose time of day does not
/// start with it are dropped. This is a literal string prefix: `"1"` keeps
/// both `"1:00"` and `"10:00"`.
pub fn build_index(reservations: &[Reservation], hour_prefix: &str) -> HashMap<String, Vec<Reservation>> {
    let mut index: HashMap<String, Vec<Reservation>> = HashMap::new();
    for reservation in reservations {
        if !hour_prefix.is_empty() && !reservation.time_starts_with(hour_prefix) {
            continue;
        }
        index
            .entry(reservation.table_code.clone())
            .or_default()
            .push(reservation.clone());
    }
    index
}

/// Read-only projection of the reservations for the active date/hour
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationIndex {
    date: Option<NaiveDate>,
    hour_prefix: String,
    by_code: HashMap<String, Vec<Reservation>>,
}

impl ReservationIndex {
    /// Index built for `filter`: only reservations on `filter.date`, then
    /// grouped by [`build_index`].
    pub fn build(reservations: &[Reservation], filter: &FloorFilter) -> Self {
        let same_day: Vec<Reservation> = reservations
            .iter()
            .filter(|r| r.date == filter.date)
            .cloned()
            .collect();

        Self {
            date: Some(filter.date),
            hour_prefix: filter.hour_prefix.clone(),
            by_code: build_index(&same_day, &filter.hour_prefix),
        }
    }

    /// Empty index
    pub fn empty() -> Self {
        Self::default()
    }

    /// Date the index was built for
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn hour_prefix(&self) -> &str {
        &self.hour_prefix
    }

    /// Reservations for a table number (empty when none)
    pub fn for_table(&self, number: u32) -> &[Reservation] {
        self.for_code(&table_code(number))
    }

    /// Reservations for a table code (empty when none)
    pub fn for_code(&self, code: &str) -> &[Reservation] {
        self.by_code.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of indexed reservations
    pub fn len(&self) -> usize {
        self.by_code.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
