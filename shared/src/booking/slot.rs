//! Slot: the `(date, time)` key that scopes capacity and waitlist order

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    BadDate(String),
    #[error("invalid time '{0}', expected HH:MM")]
    BadTime(String),
    #[error("{0} is not a bookable date")]
    DateNotOffered(NaiveDate),
    #[error("{0} is not a bookable time")]
    TimeNotOffered(String),
}

/// A bookable `(date, time)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
}

impl Slot {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    /// Parse the wire form. Accepts `HH:MM` and `HH:MM:SS` times.
    pub fn parse(date: &str, time: &str) -> Result<Self, SlotError> {
        Ok(Self {
            date: parse_date(date)?,
            time: parse_time(time)?,
        })
    }

    /// Stable text key, used for slot-scoped locks and logs.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.date.format(DATE_FORMAT),
            self.time.format(TIME_FORMAT)
        )
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, SlotError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| SlotError::BadDate(raw.into()))
}

pub fn parse_time(raw: &str) -> Result<NaiveTime, SlotError> {
    let raw_trimmed = raw.trim();
    NaiveTime::parse_from_str(raw_trimmed, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw_trimmed, "%H:%M:%S"))
        .map_err(|_| SlotError::BadTime(raw.into()))
}

/// Serde adapter rendering `NaiveTime` as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&time.format(super::TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_form() {
        let slot = Slot::parse("2025-12-24", "18:30").unwrap();
        assert_eq!(slot.date, NaiveDate::from_ymd_opt(2025, 12, 24).unwrap());
        assert_eq!(slot.time, NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(slot.key(), "2025-12-24 18:30");
    }

    #[test]
    fn accepts_seconds_in_time() {
        let a = Slot::parse("2025-12-24", "18:30:00").unwrap();
        let b = Slot::parse("2025-12-24", "18:30").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Slot::parse("24/12/2025", "18:30"),
            Err(SlotError::BadDate(_))
        ));
        assert!(matches!(
            Slot::parse("2025-12-24", "6pm"),
            Err(SlotError::BadTime(_))
        ));
    }

    #[test]
    fn serializes_time_without_seconds() {
        let slot = Slot::parse("2025-12-24", "18:30").unwrap();
        let json = serde_json::to_value(slot).unwrap();
        assert_eq!(json["date"], "2025-12-24");
        assert_eq!(json["time"], "18:30");
    }
}
