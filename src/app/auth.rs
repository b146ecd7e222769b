use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::Row;
use time::{Duration, OffsetDateTime};

use crate::app::users::{user_from_row, UserService, USER_COLUMNS};
use crate::domain::error::ModelError;
use crate::domain::user::{User, DEFAULT_IMAGE_URL};
use crate::infra::db::{classify, Db};

const SESSION_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: i64,
}

/// A freshly issued session. `token` is only ever handed to the client.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub user_id: i64,
    pub expires_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct AuthService {
    db: Db,
    session_ttl_hours: u64,
}

impl AuthService {
    pub fn new(db: Db, session_ttl_hours: u64) -> Self {
        Self {
            db,
            session_ttl_hours,
        }
    }

    /// Creates a user with a hashed password.
    ///
    /// A missing or empty password is rejected with
    /// [`ModelError::EmptyPassword`] before anything is written. A missing or
    /// duplicate username or email surfaces as [`ModelError::Integrity`]
    /// from the database.
    pub async fn signup(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<User> {
        let password = match password {
            Some(password) if !password.is_empty() => password,
            _ => return Err(ModelError::EmptyPassword.into()),
        };
        let password_hash = hash_password(password)?;
        let image_url = image_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_IMAGE_URL);

        let mut tx = self.db.pool().begin().await?;

        let row = sqlx::query(&format!(
            "INSERT INTO users (username, email, image_url, password) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(image_url)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        let user = user_from_row(&row);

        tx.commit().await.map_err(classify)?;

        Ok(user)
    }

    /// The user named `username` when `password` matches the stored hash.
    /// Unknown users and wrong passwords both yield `None`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let user = match UserService::new(self.db.clone())
            .get_by_username(username)
            .await?
        {
            Some(user) => user,
            None => return Ok(None),
        };

        match verify_password(password, &user.password) {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(err) => {
                tracing::warn!(error = ?err, user_id = user.id, "stored password hash is unreadable");
                Ok(None)
            }
        }
    }

    pub async fn create_session(&self, user_id: i64) -> Result<SessionToken> {
        let token = generate_token();
        let expires_at = session_expiry(OffsetDateTime::now_utc(), self.session_ttl_hours)?;

        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND expires_at <= now()")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, expires_at) \
             VALUES ($1, $2, $3)",
        )
        .bind(hash_token(&token))
        .bind(user_id)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SessionToken {
            token,
            user_id,
            expires_at,
        })
    }

    pub async fn resolve_session(&self, token: &str) -> Result<Option<AuthSession>> {
        let row = sqlx::query(
            "SELECT user_id FROM sessions \
             WHERE token_hash = $1 AND expires_at > now()",
        )
        .bind(hash_token(token))
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| AuthSession {
            user_id: row.get("user_id"),
        }))
    }

    pub async fn end_session(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_token(token))
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn session_expiry(now: OffsetDateTime, ttl_hours: u64) -> Result<OffsetDateTime> {
    i64::try_from(ttl_hours)
        .ok()
        .filter(|hours| *hours <= i64::MAX / 3600)
        .and_then(|hours| now.checked_add(Duration::hours(hours)))
        .ok_or_else(|| anyhow!("session ttl of {} hours is out of range", ttl_hours))
}

fn generate_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}
