//! waitlist table

use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgExecutor, PgPool};

use shared::booking::{Slot, queue};
use shared::models::{
    Enqueued, NewWaitlistEntry, Promotion, WaitlistEntry, WaitlistFilter, WaitlistUpdate,
};
use shared::util::snowflake_id;

use super::{lock_slot, redraw_id};
use crate::BoxError;
use crate::db::{StoreResult, WaitlistChange};

const COLUMNS: &str = "id, name, phone, email, reservation_date, reservation_time, guests,
    special_requests, status, position, notified_at, expires_at, created_at";

#[derive(sqlx::FromRow)]
struct WaitlistRow {
    id: i64,
    name: String,
    phone: String,
    email: Option<String>,
    reservation_date: NaiveDate,
    reservation_time: NaiveTime,
    guests: i32,
    special_requests: Option<String>,
    status: String,
    position: i32,
    notified_at: Option<i64>,
    expires_at: Option<i64>,
    created_at: i64,
}

impl TryFrom<WaitlistRow> for WaitlistEntry {
    type Error = BoxError;

    fn try_from(row: WaitlistRow) -> Result<Self, Self::Error> {
        Ok(WaitlistEntry {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            reservation_date: row.reservation_date,
            reservation_time: row.reservation_time,
            guests: row.guests,
            special_requests: row.special_requests,
            status: row.status.parse()?,
            position: row.position,
            notified_at: row.notified_at,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

fn convert_opt(row: Option<WaitlistRow>) -> StoreResult<Option<WaitlistEntry>> {
    row.map(WaitlistEntry::try_from).transpose()
}

/// Duplicate check, position and insert under the slot lock.
pub async fn enqueue(pool: &PgPool, new: NewWaitlistEntry, now: i64) -> StoreResult<Enqueued> {
    let mut tx = pool.begin().await?;
    lock_slot(&mut tx, &new.slot).await?;

    let existing = sqlx::query_as::<_, WaitlistRow>(&format!(
        "SELECT {COLUMNS} FROM waitlist
            WHERE reservation_date = $1 AND reservation_time = $2 AND phone = $3
              AND status IN ('waiting', 'notified')
            LIMIT 1"
    ))
    .bind(new.slot.date)
    .bind(new.slot.time)
    .bind(&new.phone)
    .fetch_optional(&mut *tx)
    .await?;
    if let Some(entry) = convert_opt(existing)? {
        tx.rollback().await?;
        return Ok(Enqueued::Duplicate(entry));
    }

    let waiting: Vec<i32> = sqlx::query_scalar(
        "SELECT position FROM waitlist
            WHERE reservation_date = $1 AND reservation_time = $2 AND status = 'waiting'",
    )
    .bind(new.slot.date)
    .bind(new.slot.time)
    .fetch_all(&mut *tx)
    .await?;
    let position = queue::next_position(waiting);

    let mut entry = new.into_entry(snowflake_id(now), position, now);
    let mut attempt = 1;
    while !insert_row(&mut *tx, &entry).await? {
        entry.id = redraw_id(now, &mut attempt)?;
    }

    tx.commit().await?;
    Ok(Enqueued::Added(entry))
}

/// False when the id is already taken.
async fn insert_row<'e>(conn: impl PgExecutor<'e>, entry: &WaitlistEntry) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO waitlist (id, name, phone, email, reservation_date, reservation_time,
            guests, special_requests, status, position, notified_at, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO NOTHING",
    )
    .bind(entry.id)
    .bind(&entry.name)
    .bind(&entry.phone)
    .bind(&entry.email)
    .bind(entry.reservation_date)
    .bind(entry.reservation_time)
    .bind(entry.guests)
    .bind(&entry.special_requests)
    .bind(entry.status.as_str())
    .bind(entry.position)
    .bind(entry.notified_at)
    .bind(entry.expires_at)
    .bind(entry.created_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Sweep the slot, then notify its head, under the slot lock.
pub async fn promote_next(
    pool: &PgPool,
    slot: &Slot,
    now: i64,
    expires_at: i64,
) -> StoreResult<Promotion> {
    let mut tx = pool.begin().await?;
    lock_slot(&mut tx, slot).await?;

    let expired = sqlx::query(
        "UPDATE waitlist SET status = 'cancelled'
            WHERE reservation_date = $1 AND reservation_time = $2
              AND status = 'notified' AND expires_at <= $3",
    )
    .bind(slot.date)
    .bind(slot.time)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let head = sqlx::query_as::<_, WaitlistRow>(&format!(
        "SELECT {COLUMNS} FROM waitlist
            WHERE reservation_date = $1 AND reservation_time = $2 AND status = 'waiting'
            ORDER BY position, created_at
            LIMIT 1
            FOR UPDATE"
    ))
    .bind(slot.date)
    .bind(slot.time)
    .fetch_optional(&mut *tx)
    .await?;

    let promoted = match convert_opt(head)? {
        Some(mut entry) => {
            entry.mark_notified(now, expires_at);
            sqlx::query(
                "UPDATE waitlist SET status = 'notified', notified_at = $2, expires_at = $3
                    WHERE id = $1",
            )
            .bind(entry.id)
            .bind(entry.notified_at)
            .bind(entry.expires_at)
            .execute(&mut *tx)
            .await?;
            Some(entry)
        }
        None => None,
    };

    tx.commit().await?;
    Ok(Promotion { expired, promoted })
}

pub async fn expire_notified(pool: &PgPool, now: i64) -> StoreResult<u64> {
    let result = sqlx::query(
        "UPDATE waitlist SET status = 'cancelled'
            WHERE status = 'notified' AND expires_at <= $1",
    )
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn find_by_id<'e>(
    conn: impl PgExecutor<'e>,
    id: i64,
) -> StoreResult<Option<WaitlistEntry>> {
    let row = sqlx::query_as::<_, WaitlistRow>(&format!(
        "SELECT {COLUMNS} FROM waitlist WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    convert_opt(row)
}

pub async fn list(pool: &PgPool, filter: &WaitlistFilter) -> StoreResult<Vec<WaitlistEntry>> {
    let rows = sqlx::query_as::<_, WaitlistRow>(&format!(
        "SELECT {COLUMNS} FROM waitlist
            WHERE ($1::date IS NULL OR reservation_date = $1)
              AND ($2::time IS NULL OR reservation_time = $2)
              AND ($3::text IS NULL OR status = $3)
              AND ($4::text IS NULL OR phone = $4)
            ORDER BY reservation_date, reservation_time, position, created_at"
    ))
    .bind(filter.date)
    .bind(filter.time)
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.phone.as_deref())
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(WaitlistEntry::try_from).collect()
}

/// Admin update under the slot lock and a row lock, guarded by the status
/// state machine and the one-active-entry-per-phone rule.
pub async fn update(
    pool: &PgPool,
    id: i64,
    update: &WaitlistUpdate,
    now: i64,
    expires_at: i64,
) -> StoreResult<Option<WaitlistChange>> {
    let mut tx = pool.begin().await?;

    // Slot first, so the lock order matches enqueue and promotion
    let slot: Option<(NaiveDate, NaiveTime)> = sqlx::query_as(
        "SELECT reservation_date, reservation_time FROM waitlist WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some((date, time)) = slot else {
        return Ok(None);
    };
    lock_slot(&mut tx, &Slot::new(date, time)).await?;

    let row = sqlx::query_as::<_, WaitlistRow>(&format!(
        "SELECT {COLUMNS} FROM waitlist WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(mut entry) = convert_opt(row)? else {
        return Ok(None);
    };

    if let Some(to) = update.status
        && !entry.status.can_transition_to(to)
    {
        tx.rollback().await?;
        return Ok(Some(WaitlistChange::Rejected {
            from: entry.status,
            to,
        }));
    }

    if let Some(phone) = entry.reassigned_phone(update) {
        let clash = sqlx::query_as::<_, WaitlistRow>(&format!(
            "SELECT {COLUMNS} FROM waitlist
                WHERE reservation_date = $1 AND reservation_time = $2 AND phone = $3
                  AND id <> $4 AND status IN ('waiting', 'notified')
                LIMIT 1"
        ))
        .bind(entry.reservation_date)
        .bind(entry.reservation_time)
        .bind(phone)
        .bind(entry.id)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(clash) = convert_opt(clash)? {
            tx.rollback().await?;
            return Ok(Some(WaitlistChange::Duplicate(clash)));
        }
    }

    entry.apply_update(update, now, expires_at);
    sqlx::query(
        "UPDATE waitlist SET name = $2, phone = $3, email = $4, guests = $5,
            special_requests = $6, status = $7, notified_at = $8, expires_at = $9
            WHERE id = $1",
    )
    .bind(entry.id)
    .bind(&entry.name)
    .bind(&entry.phone)
    .bind(&entry.email)
    .bind(entry.guests)
    .bind(&entry.special_requests)
    .bind(entry.status.as_str())
    .bind(entry.notified_at)
    .bind(entry.expires_at)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(Some(WaitlistChange::Updated(entry)))
}

pub async fn delete(pool: &PgPool, id: i64) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM waitlist WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn convert_notified(
    pool: &PgPool,
    slot: &Slot,
    phone: &str,
) -> StoreResult<Option<WaitlistEntry>> {
    let row = sqlx::query_as::<_, WaitlistRow>(&format!(
        "UPDATE waitlist SET status = 'converted'
            WHERE reservation_date = $1 AND reservation_time = $2 AND phone = $3
              AND status = 'notified'
            RETURNING {COLUMNS}"
    ))
    .bind(slot.date)
    .bind(slot.time)
    .bind(phone)
    .fetch_optional(pool)
    .await?;
    convert_opt(row)
}
