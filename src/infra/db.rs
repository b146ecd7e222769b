use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::AppConfig;
use crate::domain::error::ModelError;

const NOT_NULL_VIOLATION: &str = "23502";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.db_idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.db_max_lifetime_seconds))
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Constraint that rejected a write, when `err` is a NOT NULL, UNIQUE or
/// foreign key violation. NOT NULL violations carry no constraint name, so
/// the column is reported instead.
pub fn integrity_violation(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    let code = db_err.code()?;
    match code.as_ref() {
        UNIQUE_VIOLATION | FOREIGN_KEY_VIOLATION => {
            Some(db_err.constraint().unwrap_or("unknown").to_string())
        }
        NOT_NULL_VIOLATION => {
            let column = db_err
                .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                .and_then(|pg| pg.column())
                .unwrap_or("unknown");
            Some(format!("{}_not_null", column))
        }
        _ => None,
    }
}

/// Wraps integrity violations in [`ModelError::Integrity`] so callers can
/// tell them apart from connection failures; other errors pass through.
pub fn classify(err: sqlx::Error) -> anyhow::Error {
    match integrity_violation(&err) {
        Some(constraint) => ModelError::Integrity {
            constraint,
            source: err,
        }
        .into(),
        None => err.into(),
    }
}
