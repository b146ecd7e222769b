use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod flash;
mod handlers;
mod routes;

pub use auth::{AuthUser, SESSION_COOKIE};
pub use error::{AppError, ACCESS_UNAUTHORIZED};
pub use flash::FLASH_COOKIE;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .merge(routes::home())
        .merge(routes::auth())
        .merge(routes::users())
        .merge(routes::messages())
        .with_state(state)
}
