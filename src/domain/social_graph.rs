use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Directed edge: `user_following_id` follows `user_being_followed_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub user_being_followed_id: i64,
    pub user_following_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
