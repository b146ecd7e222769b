use thiserror::Error;

/// Model-level failures callers are expected to tell apart.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("password must not be empty")]
    EmptyPassword,

    #[error("integrity violation: {constraint}")]
    Integrity {
        constraint: String,
        #[source]
        source: sqlx::Error,
    },
}

impl ModelError {
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::Integrity { constraint, .. } => Some(constraint),
            Self::EmptyPassword => None,
        }
    }
}
