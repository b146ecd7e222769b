use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::message::Message;
use crate::infra::db::{classify, Db};

pub const FEED_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct MessageService {
    db: Db,
}

impl MessageService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(&self, user_id: i64, text: &str) -> Result<Message> {
        let row = sqlx::query(
            "WITH inserted AS ( \
                 INSERT INTO messages (text, user_id) VALUES ($1, $2) \
                 RETURNING id, text, timestamp, user_id \
             ) \
             SELECT i.id, i.text, i.timestamp, i.user_id, \
                    u.username, u.image_url AS user_image_url \
             FROM inserted i JOIN users u ON u.id = i.user_id",
        )
        .bind(text)
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await
        .map_err(classify)?;

        Ok(message_from_row(&row))
    }

    pub async fn get(&self, message_id: i64) -> Result<Option<Message>> {
        let row = sqlx::query(
            "SELECT m.id, m.text, m.timestamp, m.user_id, \
                    u.username, u.image_url AS user_image_url \
             FROM messages m JOIN users u ON u.id = m.user_id \
             WHERE m.id = $1",
        )
        .bind(message_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(message_from_row))
    }

    /// Deletes the message only when `owner_id` wrote it.
    pub async fn delete(&self, message_id: i64, owner_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND user_id = $2")
            .bind(message_id)
            .bind(owner_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT m.id, m.text, m.timestamp, m.user_id, \
                    u.username, u.image_url AS user_image_url \
             FROM messages m JOIN users u ON u.id = m.user_id \
             WHERE m.user_id = $1 \
             ORDER BY m.timestamp DESC, m.id DESC \
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    /// Messages written by `viewer_id` or by anyone `viewer_id` follows.
    pub async fn home_feed(&self, viewer_id: i64, limit: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT m.id, m.text, m.timestamp, m.user_id, \
                    u.username, u.image_url AS user_image_url \
             FROM messages m JOIN users u ON u.id = m.user_id \
             WHERE m.user_id = $1 \
                OR m.user_id IN ( \
                    SELECT user_being_followed_id FROM follows WHERE user_following_id = $1 \
                ) \
             ORDER BY m.timestamp DESC, m.id DESC \
             LIMIT $2",
        )
        .bind(viewer_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    pub async fn count_by_user(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

pub(crate) fn message_from_row(row: &PgRow) -> Message {
    Message {
        id: row.get("id"),
        text: row.get("text"),
        timestamp: row.get("timestamp"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        user_image_url: row.get("user_image_url"),
    }
}
