use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::app::messages::message_from_row;
use crate::domain::engagement::{Like, LikeToggle};
use crate::domain::message::Message;
use crate::infra::db::{classify, Db};

#[derive(Clone)]
pub struct LikeService {
    db: Db,
}

impl LikeService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Records the like, or returns `None` when `user_id` already liked it.
    pub async fn like(&self, user_id: i64, message_id: i64) -> Result<Option<Like>> {
        let row = sqlx::query(
            "INSERT INTO likes (user_id, message_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, message_id) DO NOTHING \
             RETURNING id, user_id, message_id, created_at",
        )
        .bind(user_id)
        .bind(message_id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(classify)?;

        Ok(row.as_ref().map(like_from_row))
    }

    pub async fn unlike(&self, user_id: i64, message_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND message_id = $2")
            .bind(user_id)
            .bind(message_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes the like when present, otherwise adds it.
    pub async fn toggle(&self, user_id: i64, message_id: i64) -> Result<LikeToggle> {
        let mut tx = self.db.pool().begin().await?;

        let removed = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND message_id = $2")
            .bind(user_id)
            .bind(message_id)
            .execute(&mut *tx)
            .await?;

        let outcome = if removed.rows_affected() > 0 {
            LikeToggle::Unliked
        } else {
            sqlx::query(
                "INSERT INTO likes (user_id, message_id) VALUES ($1, $2) \
                 ON CONFLICT (user_id, message_id) DO NOTHING",
            )
            .bind(user_id)
            .bind(message_id)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
            LikeToggle::Liked
        };

        tx.commit().await?;

        Ok(outcome)
    }

    pub async fn is_liked(&self, user_id: i64, message_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM likes WHERE user_id = $1 AND message_id = $2)",
        )
        .bind(user_id)
        .bind(message_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(exists)
    }

    pub async fn count_for_message(&self, message_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE message_id = $1")
            .bind(message_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }

    pub async fn count_by_user(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }

    /// Messages `user_id` liked, most recently liked first.
    pub async fn liked_messages(&self, user_id: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT m.id, m.text, m.timestamp, m.user_id, \
                    u.username, u.image_url AS user_image_url \
             FROM likes l \
             JOIN messages m ON m.id = l.message_id \
             JOIN users u ON u.id = m.user_id \
             WHERE l.user_id = $1 \
             ORDER BY l.created_at DESC, l.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }
}

fn like_from_row(row: &PgRow) -> Like {
    Like {
        id: row.get("id"),
        user_id: row.get("user_id"),
        message_id: row.get("message_id"),
        created_at: row.get("created_at"),
    }
}
