//! Storage layer
//!
//! `BookingStore` is the only way services touch persisted state. Every
//! read-decide-write sequence (capacity check then insert, position then
//! insert, sweep then promote) is one store call, so each backend can make
//! it atomic for its slot.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use shared::booking::{Slot, SlotAvailability};
use shared::models::{
    Admin, Enqueued, NewReservation, NewStory, NewWaitlistEntry, Promotion, Reservation,
    ReservationFilter, ReservationUpdate, Story, WaitlistEntry, WaitlistFilter, WaitlistStatus,
    WaitlistUpdate,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::BoxError;

pub type StoreResult<T> = Result<T, BoxError>;

/// Result of a capacity-guarded write
#[derive(Debug, Clone)]
pub enum Booked<T> {
    Done(T),
    /// The slot was already at capacity; nothing was written
    Full(SlotAvailability),
}

/// Result of a guarded waitlist update
#[derive(Debug, Clone)]
pub enum WaitlistChange {
    Updated(WaitlistEntry),
    /// The requested status is not reachable from the current one
    Rejected {
        from: WaitlistStatus,
        to: WaitlistStatus,
    },
    /// The new phone already holds this active entry in the slot
    Duplicate(WaitlistEntry),
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    // ── Reservations ────────────────────────────────────────────────

    /// Confirmed reservations in the slot.
    async fn count_confirmed(&self, slot: Slot) -> StoreResult<u32>;

    /// Insert as `confirmed` unless the slot already holds `max_tables`.
    async fn insert_reservation(
        &self,
        new: NewReservation,
        max_tables: u32,
        now: i64,
    ) -> StoreResult<Booked<Reservation>>;

    async fn find_reservation(&self, id: i64) -> StoreResult<Option<Reservation>>;

    /// All reservations for a phone, ordered by slot.
    async fn reservations_by_phone(&self, phone: &str) -> StoreResult<Vec<Reservation>>;

    async fn list_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>>;

    /// Flip a confirmed reservation to `cancelled`. `None` if it is not confirmed.
    async fn cancel_reservation(&self, id: i64, now: i64) -> StoreResult<Option<Reservation>>;

    /// Apply an admin update. Re-confirming a cancelled reservation is
    /// capacity-guarded like an insert. `None` if the id is unknown.
    async fn update_reservation(
        &self,
        id: i64,
        update: &ReservationUpdate,
        max_tables: u32,
        now: i64,
    ) -> StoreResult<Option<Booked<Reservation>>>;

    /// Hard delete, returning the removed row.
    async fn delete_reservation(&self, id: i64) -> StoreResult<Option<Reservation>>;

    // ── Waitlist ────────────────────────────────────────────────────

    /// Append to the slot queue unless the phone already holds an active entry.
    async fn enqueue_waitlist(&self, new: NewWaitlistEntry, now: i64) -> StoreResult<Enqueued>;

    /// Cancel lapsed `notified` entries in the slot, then notify the
    /// lowest-position `waiting` entry with `expires_at` as its deadline.
    async fn promote_next(&self, slot: Slot, now: i64, expires_at: i64) -> StoreResult<Promotion>;

    /// Cancel every lapsed `notified` entry across all slots.
    async fn expire_notified(&self, now: i64) -> StoreResult<u64>;

    async fn find_waitlist_entry(&self, id: i64) -> StoreResult<Option<WaitlistEntry>>;

    /// Entries matching the filter, ordered by slot then position.
    async fn list_waitlist(&self, filter: &WaitlistFilter) -> StoreResult<Vec<WaitlistEntry>>;

    /// Apply an admin update under the status state machine.
    /// `expires_at` is used when the update moves the entry to `notified`.
    async fn update_waitlist_entry(
        &self,
        id: i64,
        update: &WaitlistUpdate,
        now: i64,
        expires_at: i64,
    ) -> StoreResult<Option<WaitlistChange>>;

    async fn delete_waitlist_entry(&self, id: i64) -> StoreResult<bool>;

    /// Mark the phone's `notified` entry for the slot as `converted`.
    async fn convert_notified(&self, slot: Slot, phone: &str) -> StoreResult<Option<WaitlistEntry>>;

    // ── Admins ──────────────────────────────────────────────────────

    async fn find_admin(&self, username: &str) -> StoreResult<Option<Admin>>;

    /// Create the account or replace its password hash.
    async fn upsert_admin(&self, username: &str, password_hash: &str, now: i64)
    -> StoreResult<Admin>;

    // ── Stories ─────────────────────────────────────────────────────

    async fn insert_story(&self, new: NewStory, now: i64) -> StoreResult<Story>;

    /// Newest first.
    async fn list_stories(&self) -> StoreResult<Vec<Story>>;

    /// Connectivity probe for `/health`.
    async fn ping(&self) -> StoreResult<()>;
}
