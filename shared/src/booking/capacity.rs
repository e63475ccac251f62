//! Per-slot capacity summary

use serde::{Deserialize, Serialize};

/// Capacity report for one slot, as returned by `check-availability`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub available: bool,
    pub current_reservations: u32,
    pub max_tables: u32,
    pub remaining_tables: u32,
}

impl SlotAvailability {
    /// Summarize `confirmed` reservations against `max_tables`.
    pub fn from_count(confirmed: u32, max_tables: u32) -> Self {
        Self {
            available: confirmed < max_tables,
            current_reservations: confirmed,
            max_tables,
            remaining_tables: max_tables.saturating_sub(confirmed),
        }
    }
}
