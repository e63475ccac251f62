//! admins table

use sqlx::PgPool;

use shared::models::Admin;
use shared::util::snowflake_id;

use super::{is_id_clash, redraw_id};
use crate::db::StoreResult;

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: i64,
    username: String,
    password_hash: String,
    created_at: i64,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Admin {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Admin>, sqlx::Error> {
    let row = sqlx::query_as::<_, AdminRow>(
        "SELECT id, username, password_hash, created_at FROM admins WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Admin::from))
}

/// The username is the conflict target, so an id clash surfaces as an error
/// and is retried with a fresh id.
pub async fn upsert(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
    now: i64,
) -> StoreResult<Admin> {
    let mut id = snowflake_id(now);
    let mut attempt = 1;
    loop {
        let row = sqlx::query_as::<_, AdminRow>(
            "INSERT INTO admins (id, username, password_hash, created_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (username) DO UPDATE SET password_hash = EXCLUDED.password_hash
                RETURNING id, username, password_hash, created_at",
        )
        .bind(id)
        .bind(username)
        .bind(password_hash)
        .bind(now)
        .fetch_one(pool)
        .await;
        match row {
            Ok(row) => return Ok(row.into()),
            Err(e) if is_id_clash(&e) => id = redraw_id(now, &mut attempt)?,
            Err(e) => return Err(e.into()),
        }
    }
}
