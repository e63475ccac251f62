//! Waitlist Model

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::UnknownStatus;
use crate::booking::Slot;
use crate::booking::queue;
use crate::booking::slot::hhmm;

/// Waitlist entry lifecycle
///
/// `waiting → notified → {converted | cancelled}`, plus `waiting → cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitlistStatus {
    Waiting,
    Notified,
    Converted,
    Cancelled,
}

impl WaitlistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Notified => "notified",
            Self::Converted => "converted",
            Self::Cancelled => "cancelled",
        }
    }

    /// Active entries block a second registration for the same phone and slot.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Waiting | Self::Notified)
    }

    /// Same-state moves are accepted as no-ops.
    pub fn can_transition_to(&self, next: WaitlistStatus) -> bool {
        use WaitlistStatus::*;
        *self == next
            || matches!(
                (*self, next),
                (Waiting, Notified) | (Waiting, Cancelled) | (Notified, Converted) | (Notified, Cancelled)
            )
    }
}

impl FromStr for WaitlistStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "notified" => Ok(Self::Notified),
            "converted" => Ok(Self::Converted),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus {
                kind: "waitlist",
                value: other.to_string(),
            }),
        }
    }
}

/// Waitlist entry entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitlistEntry {
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
    pub status: WaitlistStatus,
    /// Arrival number within the slot, 1-based
    pub position: i32,
    pub notified_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub created_at: i64,
}

impl WaitlistEntry {
    pub fn slot(&self) -> Slot {
        Slot::new(self.reservation_date, self.reservation_time)
    }

    /// Notified and past its acceptance deadline.
    pub fn is_lapsed(&self, now_ms: i64) -> bool {
        self.status == WaitlistStatus::Notified && queue::is_lapsed(self.expires_at, now_ms)
    }

    /// Promote to `notified` with an acceptance deadline.
    pub fn mark_notified(&mut self, now_ms: i64, expires_at: i64) {
        self.status = WaitlistStatus::Notified;
        self.notified_at = Some(now_ms);
        self.expires_at = Some(expires_at);
    }

    /// Phone an update moves this entry to while it stays active, if any.
    ///
    /// Such an update must not clash with another active entry for the
    /// same phone and slot.
    pub fn reassigned_phone<'a>(&self, update: &'a WaitlistUpdate) -> Option<&'a str> {
        let phone = update.phone.as_deref().filter(|p| *p != self.phone)?;
        update
            .status
            .unwrap_or(self.status)
            .is_active()
            .then_some(phone)
    }

    /// Apply an admin update. The caller has checked the status transition.
    ///
    /// A move into `notified` stamps `notified_at`/`expires_at`.
    pub fn apply_update(&mut self, update: &WaitlistUpdate, now_ms: i64, expires_at: i64) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(phone) = &update.phone {
            self.phone = phone.clone();
        }
        if let Some(email) = &update.email {
            self.email = Some(email.clone());
        }
        if let Some(guests) = update.guests {
            self.guests = guests;
        }
        if let Some(requests) = &update.special_requests {
            self.special_requests = Some(requests.clone());
        }
        if let Some(status) = update.status
            && status != self.status
        {
            if status == WaitlistStatus::Notified {
                self.mark_notified(now_ms, expires_at);
            } else {
                self.status = status;
            }
        }
    }
}

/// Validated input for a new waitlist entry
#[derive(Debug, Clone)]
pub struct NewWaitlistEntry {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub slot: Slot,
    pub guests: i32,
    pub special_requests: Option<String>,
}

impl NewWaitlistEntry {
    pub fn into_entry(self, id: i64, position: i32, now: i64) -> WaitlistEntry {
        WaitlistEntry {
            id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            reservation_date: self.slot.date,
            reservation_time: self.slot.time,
            guests: self.guests,
            special_requests: self.special_requests,
            status: WaitlistStatus::Waiting,
            position,
            notified_at: None,
            expires_at: None,
            created_at: now,
        }
    }
}

/// Waitlist listing filter
#[derive(Debug, Clone, Default)]
pub struct WaitlistFilter {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub status: Option<WaitlistStatus>,
    pub phone: Option<String>,
}

impl WaitlistFilter {
    pub fn for_slot(slot: Slot) -> Self {
        Self {
            date: Some(slot.date),
            time: Some(slot.time),
            ..Default::default()
        }
    }

    pub fn matches(&self, e: &WaitlistEntry) -> bool {
        self.date.is_none_or(|d| e.reservation_date == d)
            && self.time.is_none_or(|t| e.reservation_time == t)
            && self.status.is_none_or(|s| e.status == s)
            && self.phone.as_deref().is_none_or(|p| e.phone == p)
    }
}

/// Mutable waitlist fields. The slot is fixed once registered.
#[derive(Debug, Clone, Default)]
pub struct WaitlistUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub guests: Option<i32>,
    pub special_requests: Option<String>,
    pub status: Option<WaitlistStatus>,
}

impl WaitlistUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.guests.is_none()
            && self.special_requests.is_none()
            && self.status.is_none()
    }
}

/// Outcome of a waitlist registration
#[derive(Debug, Clone)]
pub enum Enqueued {
    /// Inserted with its position
    Added(WaitlistEntry),
    /// The phone already holds this active entry for the slot
    Duplicate(WaitlistEntry),
}

/// Outcome of one promotion pass over a slot
#[derive(Debug, Clone, Default)]
pub struct Promotion {
    /// Notified entries that lapsed and were cancelled first
    pub expired: u64,
    /// Head of the queue, now notified
    pub promoted: Option<WaitlistEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> WaitlistEntry {
        NewWaitlistEntry {
            name: "Lee".into(),
            phone: "01099998888".into(),
            email: Some("lee@example.com".into()),
            slot: Slot::parse("2025-12-24", "18:30").unwrap(),
            guests: 4,
            special_requests: None,
        }
        .into_entry(1, 1, 1_000)
    }

    #[test]
    fn reassigned_phone_only_for_active_moves() {
        let waiting = entry();
        let to_other = WaitlistUpdate {
            phone: Some("01011112222".into()),
            ..Default::default()
        };
        assert_eq!(waiting.reassigned_phone(&to_other), Some("01011112222"));

        let same_phone = WaitlistUpdate {
            phone: Some(waiting.phone.clone()),
            ..Default::default()
        };
        assert_eq!(waiting.reassigned_phone(&same_phone), None);

        let and_cancel = WaitlistUpdate {
            status: Some(WaitlistStatus::Cancelled),
            ..to_other.clone()
        };
        assert_eq!(waiting.reassigned_phone(&and_cancel), None);
    }

    #[test]
    fn transitions_follow_state_machine() {
        use WaitlistStatus::*;
        assert!(Waiting.can_transition_to(Notified));
        assert!(Waiting.can_transition_to(Cancelled));
        assert!(Notified.can_transition_to(Converted));
        assert!(Notified.can_transition_to(Cancelled));
        assert!(Converted.can_transition_to(Converted));

        assert!(!Waiting.can_transition_to(Converted));
        assert!(!Notified.can_transition_to(Waiting));
        assert!(!Cancelled.can_transition_to(Waiting));
        assert!(!Converted.can_transition_to(Cancelled));
    }

    #[test]
    fn active_states() {
        assert!(WaitlistStatus::Waiting.is_active());
        assert!(WaitlistStatus::Notified.is_active());
        assert!(!WaitlistStatus::Converted.is_active());
        assert!(!WaitlistStatus::Cancelled.is_active());
    }

    #[test]
    fn new_entry_waits_without_deadline() {
        let e = entry();
        assert_eq!(e.status, WaitlistStatus::Waiting);
        assert_eq!(e.position, 1);
        assert!(e.notified_at.is_none());
        assert!(e.expires_at.is_none());
        assert!(!e.is_lapsed(i64::MAX));
    }

    #[test]
    fn manual_notify_stamps_deadline() {
        let mut e = entry();
        let update = WaitlistUpdate {
            status: Some(WaitlistStatus::Notified),
            ..Default::default()
        };
        e.apply_update(&update, 5_000, 9_000);
        assert_eq!(e.status, WaitlistStatus::Notified);
        assert_eq!(e.notified_at, Some(5_000));
        assert_eq!(e.expires_at, Some(9_000));
        assert!(!e.is_lapsed(8_999));
        assert!(e.is_lapsed(9_000));
    }

    #[test]
    fn contact_update_keeps_status() {
        let mut e = entry();
        let update = WaitlistUpdate {
            name: Some("Park".into()),
            guests: Some(3),
            ..Default::default()
        };
        e.apply_update(&update, 5_000, 9_000);
        assert_eq!(e.name, "Park");
        assert_eq!(e.guests, 3);
        assert_eq!(e.status, WaitlistStatus::Waiting);
        assert!(e.notified_at.is_none());
    }

    #[test]
    fn filter_by_phone_and_status() {
        let e = entry();
        let filter = WaitlistFilter {
            phone: Some("01099998888".into()),
            status: Some(WaitlistStatus::Waiting),
            ..Default::default()
        };
        assert!(filter.matches(&e));
        let other = WaitlistFilter {
            phone: Some("0101111222".into()),
            ..Default::default()
        };
        assert!(!other.matches(&e));
    }
}
