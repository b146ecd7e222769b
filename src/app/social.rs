use anyhow::Result;
use sqlx::Row;
use time::OffsetDateTime;

use crate::app::users::user_from_row;
use crate::domain::social_graph::Follow;
use crate::domain::user::User;
use crate::infra::db::{classify, Db};

#[derive(Clone)]
pub struct SocialService {
    db: Db,
}

#[derive(Debug, Clone)]
pub struct SocialUserEdge {
    pub user: User,
    pub followed_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct RelationshipStatus {
    pub is_following: bool,
    pub is_followed_by: bool,
}

impl SocialService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Adds the edge `follower_id -> followee_id`. Returns `None` when the
    /// edge already existed or the two ids are the same user.
    pub async fn follow(&self, follower_id: i64, followee_id: i64) -> Result<Option<Follow>> {
        let row = sqlx::query(
            "INSERT INTO follows (user_being_followed_id, user_following_id) \
             SELECT $2, $1 \
             WHERE $1 <> $2 \
             ON CONFLICT DO NOTHING \
             RETURNING user_being_followed_id, user_following_id, created_at",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(classify)?;

        Ok(row.map(|row| Follow {
            user_being_followed_id: row.get("user_being_followed_id"),
            user_following_id: row.get("user_following_id"),
            created_at: row.get("created_at"),
        }))
    }

    pub async fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM follows \
             WHERE user_following_id = $1 AND user_being_followed_id = $2",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether `user_id` follows `other_id`.
    pub async fn is_following(&self, user_id: i64, other_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows \
             WHERE user_following_id = $1 AND user_being_followed_id = $2)",
        )
        .bind(user_id)
        .bind(other_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(exists)
    }

    /// Whether `other_id` follows `user_id`.
    pub async fn is_followed_by(&self, user_id: i64, other_id: i64) -> Result<bool> {
        self.is_following(other_id, user_id).await
    }

    pub async fn relationship_status(
        &self,
        viewer_id: i64,
        other_id: i64,
    ) -> Result<RelationshipStatus> {
        let row = sqlx::query(
            "SELECT \
                EXISTS (SELECT 1 FROM follows WHERE user_following_id = $1 AND user_being_followed_id = $2) AS is_following, \
                EXISTS (SELECT 1 FROM follows WHERE user_following_id = $2 AND user_being_followed_id = $1) AS is_followed_by",
        )
        .bind(viewer_id)
        .bind(other_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(RelationshipStatus {
            is_following: row.get("is_following"),
            is_followed_by: row.get("is_followed_by"),
        })
    }

    /// Users following `user_id`, most recent first.
    pub async fn list_followers(&self, user_id: i64) -> Result<Vec<SocialUserEdge>> {
        let rows = sqlx::query(
            "SELECT u.id, u.username, u.email, u.image_url, u.password, u.created_at, \
                    f.created_at AS followed_at \
             FROM follows f \
             JOIN users u ON u.id = f.user_following_id \
             WHERE f.user_being_followed_id = $1 \
             ORDER BY f.created_at DESC, u.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| SocialUserEdge {
                user: user_from_row(row),
                followed_at: row.get("followed_at"),
            })
            .collect())
    }

    /// Users `user_id` follows, most recent first.
    pub async fn list_following(&self, user_id: i64) -> Result<Vec<SocialUserEdge>> {
        let rows = sqlx::query(
            "SELECT u.id, u.username, u.email, u.image_url, u.password, u.created_at, \
                    f.created_at AS followed_at \
             FROM follows f \
             JOIN users u ON u.id = f.user_being_followed_id \
             WHERE f.user_following_id = $1 \
             ORDER BY f.created_at DESC, u.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| SocialUserEdge {
                user: user_from_row(row),
                followed_at: row.get("followed_at"),
            })
            .collect())
    }

    pub async fn follower_count(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE user_being_followed_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    pub async fn following_count(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE user_following_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }
}
