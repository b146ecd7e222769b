use axum::{routing::get, routing::post, Router};

use crate::AppState;
use crate::http::handlers;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn home() -> Router<AppState> {
    Router::new().route("/", get(handlers::home))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
}

pub fn users() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/:id", get(handlers::show_user))
        .route("/users/:id/following", get(handlers::list_following))
        .route("/users/:id/followers", get(handlers::list_followers))
        .route("/users/:id/likes", get(handlers::list_user_likes))
        .route("/users/:id/follow", post(handlers::follow_user))
        .route("/users/:id/unfollow", post(handlers::unfollow_user))
}

pub fn messages() -> Router<AppState> {
    Router::new()
        .route("/messages/new", post(handlers::create_message))
        .route("/messages/:id", get(handlers::show_message))
        .route("/messages/:id/delete", post(handlers::delete_message))
        .route("/messages/:id/like", post(handlers::toggle_like))
}
