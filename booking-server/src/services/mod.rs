//! Booking services
//!
//! `BookingService` owns the booking rules end to end: it validates request
//! bodies, asks the store for atomic composite writes, and turns outcomes
//! into `AppError`s with the flags the website relies on.

mod admin;
mod availability;
mod requests;
mod reservations;
mod stories;
mod waitlist;

use chrono::{DateTime, Utc};
use std::sync::Arc;

use shared::booking::{BookingPolicy, Slot};
use shared::error::{AppError, ErrorCode};

use crate::clock::Clock;
use crate::db::BookingStore;
use crate::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, present, require_fields, slot_error, validate_email,
    validate_guests, validate_optional_text, validate_phone, validate_required_text,
};

pub use requests::{
    AdminBookingRequest, BookingRequest, CancelRequest, IdRequest, ListQuery, LoginRequest,
    PhoneQuery, ReservationUpdateRequest, SlotQuery, StoryRequest, WaitlistUpdateRequest,
};
pub use reservations::{Cancellation, ReservationView};
pub use waitlist::WaitlistView;

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    policy: Arc<BookingPolicy>,
    clock: Arc<dyn Clock>,
}

/// Customer fields common to reservations and waitlist entries, validated
struct BookingFields {
    name: String,
    phone: String,
    email: Option<String>,
    slot: Slot,
    guests: i32,
    requests: Option<String>,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        policy: Arc<BookingPolicy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn BookingStore> {
        &self.store
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Both halves present and on the bookable calendar.
    fn require_slot(&self, date: &Option<String>, time: &Option<String>) -> Result<Slot, AppError> {
        require_fields(&[("date", present(date)), ("time", present(time))])?;
        self.policy
            .offered_slot(text(date), text(time))
            .map_err(slot_error)
    }

    fn validate_booking(&self, req: &BookingRequest) -> Result<BookingFields, AppError> {
        require_fields(&[
            ("name", present(&req.name)),
            ("phone", present(&req.phone)),
            ("date", present(&req.date)),
            ("time", present(&req.time)),
            ("guests", req.guests.is_some()),
        ])?;

        Ok(BookingFields {
            name: validate_required_text(text(&req.name), "name", MAX_NAME_LEN)?,
            phone: validate_phone(text(&req.phone))?,
            email: validate_email(req.email.as_deref())?,
            slot: self.require_slot(&req.date, &req.time)?,
            guests: validate_guests(req.guests.unwrap_or_default(), self.policy.min_guests)?,
            requests: validate_optional_text(req.requests.as_deref(), "requests", MAX_NOTE_LEN)?,
        })
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// Parse an optional filter field; blank means unset.
fn parse_filter<T, E: std::fmt::Display>(
    value: &Option<String>,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<Option<T>, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse)
        .transpose()
        .map_err(|e| AppError::with_message(ErrorCode::InvalidFormat, e.to_string()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db::MemoryStore;
    use chrono::TimeZone;

    /// Service over an empty in-memory store, clock pinned to 2025-12-01 12:00 UTC.
    pub fn service() -> (BookingService, Arc<FixedClock>) {
        service_with(BookingPolicy::default())
    }

    pub fn service_with(policy: BookingPolicy) -> (BookingService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 12, 1, 12, 0, 0).unwrap(),
        ));
        let service = BookingService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(policy),
            clock.clone(),
        );
        (service, clock)
    }

    pub fn booking(phone: &str) -> BookingRequest {
        BookingRequest {
            name: Some("Kim Minji".into()),
            phone: Some(phone.into()),
            email: Some("minji@example.com".into()),
            date: Some("2025-12-24".into()),
            time: Some("18:30".into()),
            guests: Some(2),
            requests: None,
        }
    }

    pub fn slot_query() -> SlotQuery {
        SlotQuery {
            date: Some("2025-12-24".into()),
            time: Some("18:30".into()),
        }
    }
}
