use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::user::{PublicUser, User, UserProfile};
use crate::infra::db::Db;

pub(crate) const USER_COLUMNS: &str = "id, username, email, image_url, password, created_at";

#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// All users ordered by id, or only those whose username contains
    /// `query` (case-insensitive) when it is non-empty.
    pub async fn list_users(&self, query: Option<&str>) -> Result<Vec<User>> {
        // Postgres text cannot hold NUL.
        let term = query
            .map(|term| term.replace('\0', ""))
            .filter(|term| !term.trim().is_empty());

        let rows = match term {
            Some(term) => {
                let pattern = format!("%{}%", escape_like_pattern(term.trim()));
                sqlx::query(&format!(
                    "SELECT {USER_COLUMNS} FROM users \
                     WHERE username ILIKE $1 ESCAPE '\\' \
                     ORDER BY id"
                ))
                .bind(pattern)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
                    .fetch_all(self.db.pool())
                    .await?
            }
        };

        Ok(rows.iter().map(user_from_row).collect())
    }

    pub async fn profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT u.id, u.username, u.image_url, u.created_at, \
                (SELECT COUNT(*) FROM messages m WHERE m.user_id = u.id) AS messages_count, \
                (SELECT COUNT(*) FROM follows f WHERE f.user_being_followed_id = u.id) AS followers_count, \
                (SELECT COUNT(*) FROM follows f WHERE f.user_following_id = u.id) AS following_count, \
                (SELECT COUNT(*) FROM likes l WHERE l.user_id = u.id) AS likes_count \
             FROM users u WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        let profile = row.map(|row| UserProfile {
            user: PublicUser {
                id: row.get("id"),
                username: row.get("username"),
                image_url: row.get("image_url"),
            },
            created_at: row.get("created_at"),
            messages_count: row.get("messages_count"),
            followers_count: row.get("followers_count"),
            following_count: row.get("following_count"),
            likes_count: row.get("likes_count"),
        });

        Ok(profile)
    }
}

pub(crate) fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        image_url: row.get("image_url"),
        password: row.get("password"),
        created_at: row.get("created_at"),
    }
}

fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like_pattern;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like_pattern("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(escape_like_pattern("test"), "test");
    }
}
