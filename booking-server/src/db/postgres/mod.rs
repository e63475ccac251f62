//! PostgreSQL backend
//!
//! Composite operations run in one transaction that first takes a
//! transaction-scoped advisory lock on the slot key. Concurrent writers for
//! the same slot queue on that lock; other slots proceed in parallel.

mod admins;
mod reservations;
mod stories;
mod waitlist;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use shared::booking::Slot;
use shared::util::snowflake_id;
use shared::models::{
    Admin, Enqueued, NewReservation, NewStory, NewWaitlistEntry, Promotion, Reservation,
    ReservationFilter, ReservationUpdate, Story, WaitlistEntry, WaitlistFilter, WaitlistUpdate,
};

use super::{Booked, BookingStore, StoreResult, WaitlistChange};
use crate::BoxError;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and apply pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, BoxError> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Serialize writers on one slot until the surrounding transaction ends.
async fn lock_slot(conn: &mut PgConnection, slot: &Slot) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
        .bind(slot.key())
        .execute(conn)
        .await?;
    Ok(())
}

/// Snowflake draws per insert before a primary-key clash becomes an error.
const ID_ATTEMPTS: u32 = 4;

#[derive(Debug, thiserror::Error)]
#[error("no free id after {0} attempts")]
struct IdsExhausted(u32);

/// Replacement id after a primary-key clash. `attempt` counts draws so far.
fn redraw_id(now: i64, attempt: &mut u32) -> Result<i64, IdsExhausted> {
    if *attempt >= ID_ATTEMPTS {
        return Err(IdsExhausted(*attempt));
    }
    *attempt += 1;
    Ok(snowflake_id(now))
}

/// Unique violation on a table's primary key.
fn is_id_clash(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint().is_some_and(|c| c.ends_with("_pkey"))
        }
        _ => false,
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn count_confirmed(&self, slot: Slot) -> StoreResult<u32> {
        reservations::count_confirmed(&self.pool, &slot).await
    }

    async fn insert_reservation(
        &self,
        new: NewReservation,
        max_tables: u32,
        now: i64,
    ) -> StoreResult<Booked<Reservation>> {
        reservations::insert_within_capacity(&self.pool, new, max_tables, now).await
    }

    async fn find_reservation(&self, id: i64) -> StoreResult<Option<Reservation>> {
        reservations::find_by_id(&self.pool, id).await
    }

    async fn reservations_by_phone(&self, phone: &str) -> StoreResult<Vec<Reservation>> {
        reservations::list_by_phone(&self.pool, phone).await
    }

    async fn list_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        reservations::list(&self.pool, filter).await
    }

    async fn cancel_reservation(&self, id: i64, now: i64) -> StoreResult<Option<Reservation>> {
        reservations::cancel(&self.pool, id, now).await
    }

    async fn update_reservation(
        &self,
        id: i64,
        update: &ReservationUpdate,
        max_tables: u32,
        now: i64,
    ) -> StoreResult<Option<Booked<Reservation>>> {
        reservations::update(&self.pool, id, update, max_tables, now).await
    }

    async fn delete_reservation(&self, id: i64) -> StoreResult<Option<Reservation>> {
        reservations::delete(&self.pool, id).await
    }

    async fn enqueue_waitlist(&self, new: NewWaitlistEntry, now: i64) -> StoreResult<Enqueued> {
        waitlist::enqueue(&self.pool, new, now).await
    }

    async fn promote_next(&self, slot: Slot, now: i64, expires_at: i64) -> StoreResult<Promotion> {
        waitlist::promote_next(&self.pool, &slot, now, expires_at).await
    }

    async fn expire_notified(&self, now: i64) -> StoreResult<u64> {
        waitlist::expire_notified(&self.pool, now).await
    }

    async fn find_waitlist_entry(&self, id: i64) -> StoreResult<Option<WaitlistEntry>> {
        waitlist::find_by_id(&self.pool, id).await
    }

    async fn list_waitlist(&self, filter: &WaitlistFilter) -> StoreResult<Vec<WaitlistEntry>> {
        waitlist::list(&self.pool, filter).await
    }

    async fn update_waitlist_entry(
        &self,
        id: i64,
        update: &WaitlistUpdate,
        now: i64,
        expires_at: i64,
    ) -> StoreResult<Option<WaitlistChange>> {
        waitlist::update(&self.pool, id, update, now, expires_at).await
    }

    async fn delete_waitlist_entry(&self, id: i64) -> StoreResult<bool> {
        waitlist::delete(&self.pool, id).await
    }

    async fn convert_notified(&self, slot: Slot, phone: &str) -> StoreResult<Option<WaitlistEntry>> {
        waitlist::convert_notified(&self.pool, &slot, phone).await
    }

    async fn find_admin(&self, username: &str) -> StoreResult<Option<Admin>> {
        Ok(admins::find_by_username(&self.pool, username).await?)
    }

    async fn upsert_admin(
        &self,
        username: &str,
        password_hash: &str,
        now: i64,
    ) -> StoreResult<Admin> {
        admins::upsert(&self.pool, username, password_hash, now).await
    }

    async fn insert_story(&self, new: NewStory, now: i64) -> StoreResult<Story> {
        stories::insert(&self.pool, new, now).await
    }

    async fn list_stories(&self) -> StoreResult<Vec<Story>> {
        Ok(stories::list(&self.pool).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEC_2025: i64 = 1_764_590_400_000;

    #[test]
    fn redraw_gives_up_after_the_attempt_budget() {
        let mut attempt = 1;
        for _ in 1..ID_ATTEMPTS {
            let id = redraw_id(DEC_2025, &mut attempt).unwrap();
            assert!(id > 0);
        }
        assert_eq!(attempt, ID_ATTEMPTS);
        let err = redraw_id(DEC_2025, &mut attempt).unwrap_err();
        assert_eq!(err.to_string(), "no free id after 4 attempts");
        assert_eq!(attempt, ID_ATTEMPTS);
    }

    #[test]
    fn only_database_errors_count_as_id_clashes() {
        assert!(!is_id_clash(&sqlx::Error::RowNotFound));
        assert!(!is_id_clash(&sqlx::Error::PoolTimedOut));
    }
}
