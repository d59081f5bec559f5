//! Reservation Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseStatusError;

/// Reservation status (预订状态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationStatus {
    #[serde(rename = "PENDIENTE", alias = "pendiente")]
    Pending,
    #[serde(rename = "ACTIVA", alias = "activa")]
    Active,
    #[serde(rename = "COMPLETADA", alias = "completada")]
    Completed,
    #[serde(rename = "CANCELADA", alias = "cancelada")]
    Cancelled,
}

impl ReservationStatus {
    /// Wire label (query parameter form)
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDIENTE",
            ReservationStatus::Active => "ACTIVA",
            ReservationStatus::Completed => "COMPLETADA",
            ReservationStatus::Cancelled => "CANCELADA",
        }
    }

    /// Only reservations still waiting for the guest can be cancelled
    pub fn is_cancellable(&self) -> bool {
        matches!(self, ReservationStatus::Pending)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Active => "active",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

impl FromStr for ReservationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "pendiente" => Ok(ReservationStatus::Pending),
            "active" | "activa" => Ok(ReservationStatus::Active),
            "completed" | "completada" => Ok(ReservationStatus::Completed),
            "cancelled" | "cancelada" => Ok(ReservationStatus::Cancelled),
            _ => Err(ParseStatusError::new("reservation", s)),
        }
    }
}

/// Reservation entity (预订)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    /// Formatted table code, e.g. "M03"
    #[serde(rename = "mesa")]
    pub table_code: String,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    /// Time of day as displayed ("19:00" or "19:00:00"), absent when unknown
    #[serde(rename = "hora", default)]
    pub time: Option<String>,
    #[serde(rename = "personas")]
    pub party_size: u32,
    #[serde(rename = "estado")]
    pub status: ReservationStatus,
}

impl Reservation {
    /// Literal prefix match of the time of day.
    ///
    /// `"1"` matches both `"1:00"` and `"10:00"`. A reservation without a
    /// time never matches.
    pub fn time_starts_with(&self, prefix: &str) -> bool {
        self.time
            .as_deref()
            .is_some_and(|time| time.starts_with(prefix))
    }

    /// `HH:MM` form of the time, seconds dropped
    pub fn display_time(&self) -> &str {
        match self.time.as_deref() {
            Some(time) => time.get(..5).unwrap_or(time),
            None => "",
        }
    }
}

/// Update reservation status payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStatusUpdate {
    #[serde(rename = "estado")]
    pub status: ReservationStatus,
}
