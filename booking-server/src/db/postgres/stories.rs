//! stories table

use sqlx::PgPool;

use shared::models::{NewStory, Story};
use shared::util::snowflake_id;

use super::redraw_id;
use crate::db::StoreResult;

#[derive(sqlx::FromRow)]
struct StoryRow {
    id: i64,
    name: String,
    email: Option<String>,
    content: String,
    created_at: i64,
}

impl From<StoryRow> for Story {
    fn from(row: StoryRow) -> Self {
        Story {
            id: row.id,
            name: row.name,
            email: row.email,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

pub async fn insert(pool: &PgPool, new: NewStory, now: i64) -> StoreResult<Story> {
    let mut story = new.into_story(snowflake_id(now), now);
    let mut attempt = 1;
    loop {
        let inserted = sqlx::query(
            "INSERT INTO stories (id, name, email, content, created_at) VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO NOTHING",
        )
        .bind(story.id)
        .bind(&story.name)
        .bind(&story.email)
        .bind(&story.content)
        .bind(story.created_at)
        .execute(pool)
        .await?;
        if inserted.rows_affected() == 1 {
            return Ok(story);
        }
        story.id = redraw_id(now, &mut attempt)?;
    }
}

pub async fn list(pool: &PgPool) -> Result<Vec<Story>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StoryRow>(
        "SELECT id, name, email, content, created_at FROM stories ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Story::from).collect())
}
