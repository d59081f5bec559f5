//! Floor view filter and fetch queries

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{ReservationStatus, TableStatus};

/// Filter state of the floor view
///
/// Passed by value into fetch and evaluation operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorFilter {
    /// Day whose reservations are checked
    pub date: NaiveDate,
    /// Partial time of day, empty when unset
    pub hour_prefix: String,
    /// Availability view: check status changes against reservations
    pub show_availability: bool,
    /// Only show tables in this status (None = all)
    pub status: Option<TableStatus>,
}

impl FloorFilter {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            hour_prefix: String::new(),
            show_availability: true,
            status: None,
        }
    }

    pub fn with_hour_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.hour_prefix = prefix.into();
        self
    }

    pub fn with_availability(mut self, enabled: bool) -> Self {
        self.show_availability = enabled;
        self
    }

    pub fn with_status(mut self, status: Option<TableStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn has_hour_prefix(&self) -> bool {
        !self.hour_prefix.is_empty()
    }

    /// Whether switching from `other` to `self` requires refetching.
    ///
    /// The status filter is applied locally and never triggers a fetch.
    pub fn needs_refetch(&self, other: &FloorFilter) -> bool {
        self.date != other.date
            || self.hour_prefix != other.hour_prefix
            || self.show_availability != other.show_availability
    }

    /// Query for the table collection.
    ///
    /// Date and hour are only sent while the availability view is on.
    pub fn table_query(&self) -> TableQuery {
        if !self.show_availability {
            return TableQuery::default();
        }
        TableQuery {
            date: Some(self.date),
            hour: self.has_hour_prefix().then(|| self.hour_prefix.clone()),
        }
    }

    /// Query for the reservations of the selected day
    pub fn reservation_query(&self) -> ReservationQuery {
        ReservationQuery {
            date: Some(self.date),
            status: None,
        }
    }
}

impl Default for FloorFilter {
    fn default() -> Self {
        Self::new(today())
    }
}

/// Current local calendar day
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Table fetch parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableQuery {
    #[serde(rename = "fecha", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "hora", skip_serializing_if = "Option::is_none")]
    pub hour: Option<String>,
}

/// Reservation fetch parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationQuery {
    #[serde(rename = "fecha", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "estado", skip_serializing_if = "Option::is_none")]
    pub status: Option<ReservationStatus>,
}
