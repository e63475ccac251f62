//! Reservation Model

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::UnknownStatus;
use crate::booking::Slot;
use crate::booking::slot::hhmm;

/// Reservation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus {
                kind: "reservation",
                value: other.to_string(),
            }),
        }
    }
}

/// Deposit state (deposits are settled by bank transfer outside the system)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Approved,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Approved => "approved",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "approved" => Ok(Self::Approved),
            other => Err(UnknownStatus {
                kind: "payment",
                value: other.to_string(),
            }),
        }
    }
}

/// Reservation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub name: String,
    /// Digits only
    pub phone: String,
    pub email: Option<String>,
    pub reservation_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub reservation_time: NaiveTime,
    pub guests: i32,
    pub special_requests: Option<String>,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Reservation {
    pub fn slot(&self) -> Slot {
        Slot::new(self.reservation_date, self.reservation_time)
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == ReservationStatus::Confirmed
    }
}

/// Validated input for a new reservation
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub slot: Slot,
    pub guests: i32,
    pub special_requests: Option<String>,
    pub payment_status: PaymentStatus,
}

impl NewReservation {
    /// Materialize as a confirmed reservation row.
    pub fn into_reservation(self, id: i64, now: i64) -> Reservation {
        Reservation {
            id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            reservation_date: self.slot.date,
            reservation_time: self.slot.time,
            guests: self.guests,
            special_requests: self.special_requests,
            status: ReservationStatus::Confirmed,
            payment_status: self.payment_status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Admin listing filter
#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub status: Option<ReservationStatus>,
}

impl ReservationFilter {
    pub fn matches(&self, r: &Reservation) -> bool {
        self.date.is_none_or(|d| r.reservation_date == d)
            && self.time.is_none_or(|t| r.reservation_time == t)
            && self.status.is_none_or(|s| r.status == s)
    }
}

/// Admin status/payment update
#[derive(Debug, Clone, Default)]
pub struct ReservationUpdate {
    pub status: Option<ReservationStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl ReservationUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none()
    }
}
