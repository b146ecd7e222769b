use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub image_url: String,
    /// Argon2 PHC string, never serialized.
    #[serde(skip_serializing, default)]
    pub password: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub image_url: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            image_url: user.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: PublicUser,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub messages_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
    pub likes_count: i64,
}
