use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::platform::{platforms_as_db, platforms_from_db, Platform};
use crate::domain::post::{char_count, Post, PostStatus};
use crate::infra::db::Db;

/// Fields of a partial update. `None` leaves the stored value untouched;
/// `media_key: Some(None)` detaches media. Concurrent edits from two
/// sessions are last-write-wins.
#[derive(Debug, Default)]
pub struct UpdatePost {
    pub content: Option<String>,
    pub platforms: Option<Vec<Platform>>,
    pub scheduled_at: Option<OffsetDateTime>,
    pub media_key: Option<Option<String>>,
}

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

const POST_COLUMNS: &str = "id, user_id, content, platforms, status::text AS status, \
     scheduled_at, published_at, media_key, error_message, char_count, created_at, updated_at";

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Persists a submitted draft. The row starts at `scheduled`;
    /// `char_count` is captured from the content at write time.
    pub async fn create_post(
        &self,
        user_id: Uuid,
        content: String,
        platforms: Vec<Platform>,
        scheduled_at: OffsetDateTime,
        media_key: Option<String>,
    ) -> Result<Post> {
        let count = char_count(&content) as i32;
        let row = sqlx::query(&format!(
            "INSERT INTO posts (user_id, content, platforms, status, scheduled_at, media_key, char_count) \
             VALUES ($1, $2, $3, $4::post_status, $5, $6, $7) \
             RETURNING {}",
            POST_COLUMNS
        ))
        .bind(user_id)
        .bind(&content)
        .bind(platforms_as_db(&platforms))
        .bind(PostStatus::Scheduled.as_db())
        .bind(scheduled_at)
        .bind(media_key)
        .bind(count)
        .fetch_one(self.db.pool())
        .await?;

        post_from_row(&row)
    }

    pub async fn get_post(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE id = $1 AND user_id = $2",
            POST_COLUMNS
        ))
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(post_from_row).transpose()
    }

    /// Partial update: only supplied fields change. Returns None when the
    /// post does not exist or belongs to another user.
    pub async fn update_post(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        update: UpdatePost,
    ) -> Result<Option<Post>> {
        let new_count = update.content.as_deref().map(|c| char_count(c) as i32);
        let new_platforms = update.platforms.as_deref().map(platforms_as_db);

        let row = match update.media_key {
            Some(media_key) => {
                sqlx::query(&format!(
                    "UPDATE posts \
                     SET content = COALESCE($3, content), \
                         char_count = COALESCE($4, char_count), \
                         platforms = COALESCE($5, platforms), \
                         scheduled_at = COALESCE($6, scheduled_at), \
                         media_key = $7, \
                         updated_at = now() \
                     WHERE id = $1 AND user_id = $2 \
                     RETURNING {}",
                    POST_COLUMNS
                ))
                .bind(post_id)
                .bind(user_id)
                .bind(update.content)
                .bind(new_count)
                .bind(new_platforms)
                .bind(update.scheduled_at)
                .bind(media_key)
                .fetch_optional(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "UPDATE posts \
                     SET content = COALESCE($3, content), \
                         char_count = COALESCE($4, char_count), \
                         platforms = COALESCE($5, platforms), \
                         scheduled_at = COALESCE($6, scheduled_at), \
                         updated_at = now() \
                     WHERE id = $1 AND user_id = $2 \
                     RETURNING {}",
                    POST_COLUMNS
                ))
                .bind(post_id)
                .bind(user_id)
                .bind(update.content)
                .bind(new_count)
                .bind(new_platforms)
                .bind(update.scheduled_at)
                .fetch_optional(self.db.pool())
                .await?
            }
        };

        row.as_ref().map(post_from_row).transpose()
    }

    /// Owner-scoped delete. Returns whether a row was removed; callers treat
    /// a repeated delete of the same id as a no-op rather than an error.
    pub async fn delete_post(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All of a user's posts, most recently scheduled first.
    pub async fn list_posts(&self, user_id: Uuid) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE user_id = $1 \
             ORDER BY scheduled_at DESC, id DESC",
            POST_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    /// Posts scheduled within [from, to), feeding the calendar projection.
    pub async fn list_between(
        &self,
        user_id: Uuid,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts \
             WHERE user_id = $1 AND scheduled_at >= $2 AND scheduled_at < $3 \
             ORDER BY scheduled_at ASC, id ASC",
            POST_COLUMNS
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(post_from_row).collect()
    }
}

fn post_from_row(row: &PgRow) -> Result<Post> {
    let status: String = row.get("status");
    let status = PostStatus::from_db(&status)
        .ok_or_else(|| anyhow::anyhow!("unknown post status: {}", status))?;
    let platforms: Vec<String> = row.get("platforms");
    let platforms = platforms_from_db(&platforms)?;

    Ok(Post {
        id: row.get("id"),
        user_id: row.get("user_id"),
        content: row.get("content"),
        platforms,
        status,
        scheduled_at: row.get("scheduled_at"),
        published_at: row.get("published_at"),
        media_key: row.get("media_key"),
        media_url: None,
        error_message: row.get("error_message"),
        char_count: row.get("char_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
