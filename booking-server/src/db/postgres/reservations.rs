//! reservations table

use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgExecutor, PgPool};

use shared::booking::{Slot, SlotAvailability};
use shared::models::{
    NewReservation, Reservation, ReservationFilter, ReservationStatus, ReservationUpdate,
};
use shared::util::snowflake_id;

use super::{lock_slot, redraw_id};
use crate::BoxError;
use crate::db::{Booked, StoreResult};

const COLUMNS: &str = "id, name, phone, email, reservation_date, reservation_time, guests,
    special_requests, status, payment_status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: i64,
    name: String,
    phone: String,
    email: Option<String>,
    reservation_date: NaiveDate,
    reservation_time: NaiveTime,
    guests: i32,
    special_requests: Option<String>,
    status: String,
    payment_status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = BoxError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Reservation {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            reservation_date: row.reservation_date,
            reservation_time: row.reservation_time,
            guests: row.guests,
            special_requests: row.special_requests,
            status: row.status.parse()?,
            payment_status: row.payment_status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn convert_all(rows: Vec<ReservationRow>) -> StoreResult<Vec<Reservation>> {
    rows.into_iter().map(Reservation::try_from).collect()
}

pub async fn count_confirmed<'e>(conn: impl PgExecutor<'e>, slot: &Slot) -> StoreResult<u32> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM reservations
            WHERE reservation_date = $1 AND reservation_time = $2 AND status = 'confirmed'",
    )
    .bind(slot.date)
    .bind(slot.time)
    .fetch_one(conn)
    .await?;
    Ok(u32::try_from(count)?)
}

/// False when the id is already taken.
async fn insert_row<'e>(conn: impl PgExecutor<'e>, r: &Reservation) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO reservations (id, name, phone, email, reservation_date, reservation_time,
            guests, special_requests, status, payment_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO NOTHING",
    )
    .bind(r.id)
    .bind(&r.name)
    .bind(&r.phone)
    .bind(&r.email)
    .bind(r.reservation_date)
    .bind(r.reservation_time)
    .bind(r.guests)
    .bind(&r.special_requests)
    .bind(r.status.as_str())
    .bind(r.payment_status.as_str())
    .bind(r.created_at)
    .bind(r.updated_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Count and insert under the slot lock.
pub async fn insert_within_capacity(
    pool: &PgPool,
    new: NewReservation,
    max_tables: u32,
    now: i64,
) -> StoreResult<Booked<Reservation>> {
    let mut tx = pool.begin().await?;
    lock_slot(&mut tx, &new.slot).await?;

    let availability =
        SlotAvailability::from_count(count_confirmed(&mut *tx, &new.slot).await?, max_tables);
    if !availability.available {
        tx.rollback().await?;
        return Ok(Booked::Full(availability));
    }

    let mut reservation = new.into_reservation(snowflake_id(now), now);
    let mut attempt = 1;
    while !insert_row(&mut *tx, &reservation).await? {
        reservation.id = redraw_id(now, &mut attempt)?;
    }
    tx.commit().await?;
    Ok(Booked::Done(reservation))
}

pub async fn find_by_id<'e>(conn: impl PgExecutor<'e>, id: i64) -> StoreResult<Option<Reservation>> {
    let row = sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {COLUMNS} FROM reservations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    row.map(Reservation::try_from).transpose()
}

pub async fn list_by_phone(pool: &PgPool, phone: &str) -> StoreResult<Vec<Reservation>> {
    let rows = sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {COLUMNS} FROM reservations
            WHERE phone = $1
            ORDER BY reservation_date, reservation_time, created_at"
    ))
    .bind(phone)
    .fetch_all(pool)
    .await?;
    convert_all(rows)
}

pub async fn list(pool: &PgPool, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
    let rows = sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {COLUMNS} FROM reservations
            WHERE ($1::date IS NULL OR reservation_date = $1)
              AND ($2::time IS NULL OR reservation_time = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY reservation_date, reservation_time, created_at"
    ))
    .bind(filter.date)
    .bind(filter.time)
    .bind(filter.status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;
    convert_all(rows)
}

pub async fn cancel(pool: &PgPool, id: i64, now: i64) -> StoreResult<Option<Reservation>> {
    let row = sqlx::query_as::<_, ReservationRow>(&format!(
        "UPDATE reservations SET status = 'cancelled', updated_at = $2
            WHERE id = $1 AND status = 'confirmed'
            RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(now)
    .fetch_optional(pool)
    .await?;
    row.map(Reservation::try_from).transpose()
}

/// Admin update; re-confirming counts capacity under the slot lock.
pub async fn update(
    pool: &PgPool,
    id: i64,
    update: &ReservationUpdate,
    max_tables: u32,
    now: i64,
) -> StoreResult<Option<Booked<Reservation>>> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(current) = row.map(Reservation::try_from).transpose()? else {
        return Ok(None);
    };

    if update.status == Some(ReservationStatus::Confirmed) && !current.is_confirmed() {
        let slot = current.slot();
        lock_slot(&mut tx, &slot).await?;
        let availability =
            SlotAvailability::from_count(count_confirmed(&mut *tx, &slot).await?, max_tables);
        if !availability.available {
            tx.rollback().await?;
            return Ok(Some(Booked::Full(availability)));
        }
    }

    let status = update.status.unwrap_or(current.status);
    let payment_status = update.payment_status.unwrap_or(current.payment_status);

    let row = sqlx::query_as::<_, ReservationRow>(&format!(
        "UPDATE reservations SET status = $2, payment_status = $3, updated_at = $4
            WHERE id = $1
            RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(status.as_str())
    .bind(payment_status.as_str())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(Some(Booked::Done(row.try_into()?)))
}

pub async fn delete(pool: &PgPool, id: i64) -> StoreResult<Option<Reservation>> {
    let row = sqlx::query_as::<_, ReservationRow>(&format!(
        "DELETE FROM reservations WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(Reservation::try_from).transpose()
}
