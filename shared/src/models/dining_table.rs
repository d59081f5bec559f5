//! Dining Table Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseStatusError;

/// Table status (桌台状态)
///
/// Wire values are the backend's lowercase Spanish labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableStatus {
    #[serde(rename = "disponible", alias = "DISPONIBLE")]
    Available,
    #[serde(rename = "reservada", alias = "RESERVADA")]
    Reserved,
    #[serde(rename = "ocupada", alias = "OCUPADA")]
    Occupied,
    #[serde(rename = "limpieza", alias = "LIMPIEZA")]
    Cleaning,
}

impl TableStatus {
    pub const ALL: [TableStatus; 4] = [
        TableStatus::Available,
        TableStatus::Reserved,
        TableStatus::Occupied,
        TableStatus::Cleaning,
    ];

    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "disponible",
            TableStatus::Reserved => "reservada",
            TableStatus::Occupied => "ocupada",
            TableStatus::Cleaning => "limpieza",
        }
    }

    /// Whether moving a table into this status must be checked against
    /// the reservations of the selected date/hour.
    pub fn needs_reservation_check(&self) -> bool {
        matches!(self, TableStatus::Available | TableStatus::Occupied)
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TableStatus::Available => "available",
            TableStatus::Reserved => "reserved",
            TableStatus::Occupied => "occupied",
            TableStatus::Cleaning => "cleaning",
        };
        f.write_str(label)
    }
}

impl FromStr for TableStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" | "disponible" => Ok(TableStatus::Available),
            "reserved" | "reservada" => Ok(TableStatus::Reserved),
            "occupied" | "ocupada" => Ok(TableStatus::Occupied),
            "cleaning" | "limpieza" => Ok(TableStatus::Cleaning),
            _ => Err(ParseStatusError::new("table", s)),
        }
    }
}

/// Dining table entity (桌台)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: i64,
    /// Display number
    #[serde(rename = "numero")]
    pub number: u32,
    #[serde(rename = "capacidad")]
    pub capacity: u32,
    #[serde(rename = "estado")]
    pub status: TableStatus,
}

impl DiningTable {
    /// Join key against [`Reservation::table_code`](super::Reservation)
    pub fn code(&self) -> String {
        table_code(self.number)
    }
}

/// Format a table number as the code reservations refer to it by.
///
/// `3` → `"M03"`. Numbers wider than two digits are not truncated.
pub fn table_code(number: u32) -> String {
    format!("M{:02}", number)
}

/// Update table status payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatusUpdate {
    #[serde(rename = "estado")]
    pub status: TableStatus,
}
