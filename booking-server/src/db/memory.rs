//! In-memory backend
//!
//! One async mutex over the whole dataset, so every composite operation is
//! trivially atomic. Used by tests and by development runs without a
//! database.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use shared::booking::{Slot, SlotAvailability, queue};
use shared::models::{
    Admin, Enqueued, NewReservation, NewStory, NewWaitlistEntry, Promotion, Reservation,
    ReservationFilter, ReservationStatus, ReservationUpdate, Story, WaitlistEntry, WaitlistFilter,
    WaitlistStatus, WaitlistUpdate,
};
use shared::util::snowflake_id;

use super::{Booked, BookingStore, StoreResult, WaitlistChange};

#[derive(Default)]
struct Tables {
    reservations: BTreeMap<i64, Reservation>,
    waitlist: BTreeMap<i64, WaitlistEntry>,
    admins: BTreeMap<String, Admin>,
    stories: BTreeMap<i64, Story>,
}

impl Tables {
    fn count_confirmed(&self, slot: Slot) -> u32 {
        self.reservations
            .values()
            .filter(|r| r.is_confirmed() && r.slot() == slot)
            .count() as u32
    }

    fn waiting_positions(&self, slot: Slot) -> Vec<i32> {
        self.waitlist
            .values()
            .filter(|e| e.status == WaitlistStatus::Waiting && e.slot() == slot)
            .map(|e| e.position)
            .collect()
    }

    /// Snowflake ids are random in their low bits; retry on the rare clash.
    fn fresh_id<V>(map: &BTreeMap<i64, V>, now: i64) -> i64 {
        loop {
            let id = snowflake_id(now);
            if !map.contains_key(&id) {
                return id;
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn count_confirmed(&self, slot: Slot) -> StoreResult<u32> {
        Ok(self.tables.lock().await.count_confirmed(slot))
    }

    async fn insert_reservation(
        &self,
        new: NewReservation,
        max_tables: u32,
        now: i64,
    ) -> StoreResult<Booked<Reservation>> {
        let mut tables = self.tables.lock().await;
        let availability =
            SlotAvailability::from_count(tables.count_confirmed(new.slot), max_tables);
        if !availability.available {
            return Ok(Booked::Full(availability));
        }
        let id = Tables::fresh_id(&tables.reservations, now);
        let reservation = new.into_reservation(id, now);
        tables.reservations.insert(id, reservation.clone());
        Ok(Booked::Done(reservation))
    }

    async fn find_reservation(&self, id: i64) -> StoreResult<Option<Reservation>> {
        Ok(self.tables.lock().await.reservations.get(&id).cloned())
    }

    async fn reservations_by_phone(&self, phone: &str) -> StoreResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        let mut found: Vec<Reservation> = tables
            .reservations
            .values()
            .filter(|r| r.phone == phone)
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.slot(), r.created_at));
        Ok(found)
    }

    async fn list_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        let mut found: Vec<Reservation> = tables
            .reservations
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.slot(), r.created_at));
        Ok(found)
    }

    async fn cancel_reservation(&self, id: i64, now: i64) -> StoreResult<Option<Reservation>> {
        let mut tables = self.tables.lock().await;
        let Some(reservation) = tables.reservations.get_mut(&id).filter(|r| r.is_confirmed())
        else {
            return Ok(None);
        };
        reservation.status = ReservationStatus::Cancelled;
        reservation.updated_at = now;
        Ok(Some(reservation.clone()))
    }

    async fn update_reservation(
        &self,
        id: i64,
        update: &ReservationUpdate,
        max_tables: u32,
        now: i64,
    ) -> StoreResult<Option<Booked<Reservation>>> {
        let mut tables = self.tables.lock().await;
        let Some(current) = tables.reservations.get(&id).cloned() else {
            return Ok(None);
        };

        if update.status == Some(ReservationStatus::Confirmed) && !current.is_confirmed() {
            let availability =
                SlotAvailability::from_count(tables.count_confirmed(current.slot()), max_tables);
            if !availability.available {
                return Ok(Some(Booked::Full(availability)));
            }
        }

        let mut updated = current;
        if let Some(status) = update.status {
            updated.status = status;
        }
        if let Some(payment) = update.payment_status {
            updated.payment_status = payment;
        }
        updated.updated_at = now;
        tables.reservations.insert(id, updated.clone());
        Ok(Some(Booked::Done(updated)))
    }

    async fn delete_reservation(&self, id: i64) -> StoreResult<Option<Reservation>> {
        Ok(self.tables.lock().await.reservations.remove(&id))
    }

    async fn enqueue_waitlist(&self, new: NewWaitlistEntry, now: i64) -> StoreResult<Enqueued> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables
            .waitlist
            .values()
            .find(|e| e.slot() == new.slot && e.phone == new.phone && e.status.is_active())
        {
            return Ok(Enqueued::Duplicate(existing.clone()));
        }

        let position = queue::next_position(tables.waiting_positions(new.slot));
        let id = Tables::fresh_id(&tables.waitlist, now);
        let entry = new.into_entry(id, position, now);
        tables.waitlist.insert(id, entry.clone());
        Ok(Enqueued::Added(entry))
    }

    async fn promote_next(&self, slot: Slot, now: i64, expires_at: i64) -> StoreResult<Promotion> {
        let mut tables = self.tables.lock().await;

        let mut expired = 0;
        for entry in tables.waitlist.values_mut() {
            if entry.slot() == slot && entry.is_lapsed(now) {
                entry.status = WaitlistStatus::Cancelled;
                expired += 1;
            }
        }

        let head = tables
            .waitlist
            .values_mut()
            .filter(|e| e.slot() == slot && e.status == WaitlistStatus::Waiting)
            .min_by_key(|e| (e.position, e.created_at));

        let promoted = head.map(|entry| {
            entry.mark_notified(now, expires_at);
            entry.clone()
        });

        Ok(Promotion { expired, promoted })
    }

    async fn expire_notified(&self, now: i64) -> StoreResult<u64> {
        let mut tables = self.tables.lock().await;
        let mut expired = 0;
        for entry in tables.waitlist.values_mut() {
            if entry.is_lapsed(now) {
                entry.status = WaitlistStatus::Cancelled;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn find_waitlist_entry(&self, id: i64) -> StoreResult<Option<WaitlistEntry>> {
        Ok(self.tables.lock().await.waitlist.get(&id).cloned())
    }

    async fn list_waitlist(&self, filter: &WaitlistFilter) -> StoreResult<Vec<WaitlistEntry>> {
        let tables = self.tables.lock().await;
        let mut found: Vec<WaitlistEntry> = tables
            .waitlist
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        found.sort_by_key(|e| (e.slot(), e.position, e.created_at));
        Ok(found)
    }

    async fn update_waitlist_entry(
        &self,
        id: i64,
        update: &WaitlistUpdate,
        now: i64,
        expires_at: i64,
    ) -> StoreResult<Option<WaitlistChange>> {
        let mut tables = self.tables.lock().await;
        let Some(current) = tables.waitlist.get(&id) else {
            return Ok(None);
        };
        if let Some(to) = update.status
            && !current.status.can_transition_to(to)
        {
            return Ok(Some(WaitlistChange::Rejected {
                from: current.status,
                to,
            }));
        }
        if let Some(phone) = current.reassigned_phone(update) {
            let slot = current.slot();
            if let Some(clash) = tables
                .waitlist
                .values()
                .find(|e| e.id != id && e.slot() == slot && e.phone == phone && e.status.is_active())
            {
                return Ok(Some(WaitlistChange::Duplicate(clash.clone())));
            }
        }

        let Some(entry) = tables.waitlist.get_mut(&id) else {
            return Ok(None);
        };
        entry.apply_update(update, now, expires_at);
        Ok(Some(WaitlistChange::Updated(entry.clone())))
    }

    async fn delete_waitlist_entry(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.lock().await.waitlist.remove(&id).is_some())
    }

    async fn convert_notified(&self, slot: Slot, phone: &str) -> StoreResult<Option<WaitlistEntry>> {
        let mut tables = self.tables.lock().await;
        let entry = tables.waitlist.values_mut().find(|e| {
            e.slot() == slot && e.phone == phone && e.status == WaitlistStatus::Notified
        });
        Ok(entry.map(|e| {
            e.status = WaitlistStatus::Converted;
            e.clone()
        }))
    }

    async fn find_admin(&self, username: &str) -> StoreResult<Option<Admin>> {
        Ok(self.tables.lock().await.admins.get(username).cloned())
    }

    async fn upsert_admin(
        &self,
        username: &str,
        password_hash: &str,
        now: i64,
    ) -> StoreResult<Admin> {
        let mut tables = self.tables.lock().await;
        let admin = tables
            .admins
            .entry(username.to_string())
            .and_modify(|a| a.password_hash = password_hash.to_string())
            .or_insert_with(|| Admin {
                id: snowflake_id(now),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at: now,
            });
        Ok(admin.clone())
    }

    async fn insert_story(&self, new: NewStory, now: i64) -> StoreResult<Story> {
        let mut tables = self.tables.lock().await;
        let id = Tables::fresh_id(&tables.stories, now);
        let story = new.into_story(id, now);
        tables.stories.insert(id, story.clone());
        Ok(story)
    }

    async fn list_stories(&self) -> StoreResult<Vec<Story>> {
        let tables = self.tables.lock().await;
        let mut stories: Vec<Story> = tables.stories.values().cloned().collect();
        stories.sort_by_key(|s| std::cmp::Reverse((s.created_at, s.id)));
        Ok(stories)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
