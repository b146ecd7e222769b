use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::app::auth::AuthService;
use crate::app::likes::LikeService;
use crate::app::messages::{MessageService, FEED_LIMIT};
use crate::app::social::{SocialService, SocialUserEdge};
use crate::app::users::UserService;
use crate::domain::error::ModelError;
use crate::domain::message::{Message, MAX_MESSAGE_LEN};
use crate::domain::user::{PublicUser, User, UserProfile};
use crate::http::auth::{clear_session, session_cookie, SESSION_COOKIE};
use crate::http::{flash, AppError, AuthUser};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 128;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

#[derive(Serialize)]
pub struct HomeResponse {
    pub flash: Option<String>,
    pub user: Option<PublicUser>,
    pub messages: Vec<Message>,
}

pub async fn home(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<HomeResponse>), AppError> {
    let (jar, flash) = flash::take(jar);

    let Some(auth) = auth else {
        return Ok((
            jar,
            Json(HomeResponse {
                flash,
                user: None,
                messages: Vec::new(),
            }),
        ));
    };

    let user = UserService::new(state.db.clone())
        .get_user(auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to fetch current user");
            AppError::internal("failed to fetch current user")
        })?;

    let messages = MessageService::new(state.db.clone())
        .home_feed(auth.user_id, FEED_LIMIT)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to load home feed");
            AppError::internal("failed to load home feed")
        })?;

    Ok((
        jar,
        Json(HomeResponse {
            flash,
            user: user.map(PublicUser::from),
            messages,
        }),
    ))
}

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub image_url: Option<String>,
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SignupRequest>,
) -> Result<(CookieJar, Json<User>), AppError> {
    let username = payload.username.as_deref().map(str::trim).unwrap_or_default();
    if username.is_empty() {
        return Err(AppError::bad_request("username cannot be empty"));
    }
    let email = payload.email.as_deref().map(str::trim).unwrap_or_default();
    if !email.contains('@') {
        return Err(AppError::bad_request("email must be a valid address"));
    }
    let password = payload.password.as_deref().unwrap_or_default();
    let password_len = password.chars().count();
    if password_len < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at least 6 characters"));
    }
    if password_len > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let service = AuthService::new(state.db.clone(), state.session_ttl_hours);
    let user = service
        .signup(
            Some(username),
            Some(email),
            Some(password),
            payload.image_url.as_deref(),
        )
        .await
        .map_err(|err| {
            if let Some(ModelError::Integrity { constraint, .. }) = err.downcast_ref::<ModelError>() {
                if constraint.contains("users_username_key") {
                    return AppError::conflict("Username already taken");
                }
                if constraint.contains("users_email_key") {
                    return AppError::conflict("Email already taken");
                }
            }
            tracing::error!(error = ?err, "failed to create user");
            AppError::internal("failed to create user")
        })?;

    let session = service.create_session(user.id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = user.id, "failed to start session");
        AppError::internal("failed to start session")
    })?;

    tracing::info!(user_id = user.id, "user signed up");
    let jar = jar.add(session_cookie(&session, state.cookie_secure));
    Ok((jar, Json(user)))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<User>), AppError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("username and password are required"));
    }
    if payload.password.chars().count() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let service = AuthService::new(state.db.clone(), state.session_ttl_hours);
    let user = service
        .authenticate(payload.username.trim(), &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?
        .ok_or_else(|| AppError::unauthorized("Invalid credentials."))?;

    let session = service.create_session(user.id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = user.id, "failed to start session");
        AppError::internal("failed to start session")
    })?;

    let jar = jar.add(session_cookie(&session, state.cookie_secure));
    Ok((jar, Json(user)))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        let service = AuthService::new(state.db.clone(), state.session_ttl_hours);
        service.end_session(&token).await.map_err(|err| {
            tracing::error!(error = ?err, "failed to end session");
            AppError::internal("failed to logout")
        })?;
    }

    let jar = flash::set(clear_session(jar), "You have successfully logged out.");
    Ok((jar, Redirect::to("/")))
}

#[derive(Deserialize)]
pub struct UserSearchQuery {
    pub q: Option<String>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<ListResponse<PublicUser>>, AppError> {
    let service = UserService::new(state.db.clone());
    let users = service
        .list_users(query.q.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list users");
            AppError::internal("failed to list users")
        })?;

    Ok(Json(ListResponse {
        items: users.into_iter().map(PublicUser::from).collect(),
    }))
}

#[derive(Serialize)]
pub struct RelationshipResponse {
    pub is_following: bool,
    pub is_followed_by: bool,
}

#[derive(Serialize)]
pub struct UserPageResponse {
    pub user: UserProfile,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipResponse>,
}

pub async fn show_user(
    Path(id): Path<i64>,
    auth: Option<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<UserPageResponse>, AppError> {
    let profile = UserService::new(state.db.clone())
        .profile(id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = id, "failed to fetch user");
            AppError::internal("failed to fetch user")
        })?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let messages = MessageService::new(state.db.clone())
        .list_by_user(id, FEED_LIMIT)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = id, "failed to list user messages");
            AppError::internal("failed to list user messages")
        })?;

    let relationship = match auth {
        Some(auth) if auth.user_id != id => {
            let status = SocialService::new(state.db.clone())
                .relationship_status(auth.user_id, id)
                .await
                .map_err(|err| {
                    tracing::error!(error = ?err, viewer_id = auth.user_id, other_id = id, "failed to fetch relationship status");
                    AppError::internal("failed to fetch relationship status")
                })?;
            Some(RelationshipResponse {
                is_following: status.is_following,
                is_followed_by: status.is_followed_by,
            })
        }
        _ => None,
    };

    Ok(Json(UserPageResponse {
        user: profile,
        messages,
        relationship,
    }))
}

#[derive(Serialize)]
pub struct SocialUserItem {
    pub user: PublicUser,
    #[serde(with = "time::serde::rfc3339")]
    pub followed_at: OffsetDateTime,
}

impl From<SocialUserEdge> for SocialUserItem {
    fn from(edge: SocialUserEdge) -> Self {
        Self {
            user: edge.user.into(),
            followed_at: edge.followed_at,
        }
    }
}

async fn ensure_user_exists(state: &AppState, user_id: i64) -> Result<(), AppError> {
    let user = UserService::new(state.db.clone())
        .get_user(user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id, "failed to fetch user");
            AppError::internal("failed to fetch user")
        })?;

    match user {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("user not found")),
    }
}

pub async fn list_following(
    Path(id): Path<i64>,
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<SocialUserItem>>, AppError> {
    ensure_user_exists(&state, id).await?;

    let following = SocialService::new(state.db.clone())
        .list_following(id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = id, "failed to list following");
            AppError::internal("failed to list following")
        })?;

    Ok(Json(ListResponse {
        items: following.into_iter().map(SocialUserItem::from).collect(),
    }))
}

pub async fn list_followers(
    Path(id): Path<i64>,
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<SocialUserItem>>, AppError> {
    ensure_user_exists(&state, id).await?;

    let followers = SocialService::new(state.db.clone())
        .list_followers(id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = id, "failed to list followers");
            AppError::internal("failed to list followers")
        })?;

    Ok(Json(ListResponse {
        items: followers.into_iter().map(SocialUserItem::from).collect(),
    }))
}

pub async fn list_user_likes(
    Path(id): Path<i64>,
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<Message>>, AppError> {
    ensure_user_exists(&state, id).await?;

    let messages = LikeService::new(state.db.clone())
        .liked_messages(id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = id, "failed to list liked messages");
            AppError::internal("failed to list liked messages")
        })?;

    Ok(Json(ListResponse { items: messages }))
}

#[derive(Serialize)]
pub struct FollowResponse {
    pub followed: bool,
}

pub async fn follow_user(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<FollowResponse>, AppError> {
    if auth.user_id == id {
        return Err(AppError::bad_request("cannot follow yourself"));
    }
    ensure_user_exists(&state, id).await?;

    let service = SocialService::new(state.db.clone());
    let edge = service.follow(auth.user_id, id).await.map_err(|err| {
        tracing::error!(error = ?err, follower_id = auth.user_id, followee_id = id, "failed to follow user");
        AppError::internal("failed to follow user")
    })?;

    if edge.is_some() {
        tracing::info!(follower_id = auth.user_id, followee_id = id, "user followed");
    }
    Ok(Json(FollowResponse {
        followed: edge.is_some(),
    }))
}

#[derive(Serialize)]
pub struct UnfollowResponse {
    pub unfollowed: bool,
}

pub async fn unfollow_user(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UnfollowResponse>, AppError> {
    if auth.user_id == id {
        return Err(AppError::bad_request("cannot unfollow yourself"));
    }

    let service = SocialService::new(state.db.clone());
    let unfollowed = service.unfollow(auth.user_id, id).await.map_err(|err| {
        tracing::error!(error = ?err, follower_id = auth.user_id, followee_id = id, "failed to unfollow user");
        AppError::internal("failed to unfollow user")
    })?;

    Ok(Json(UnfollowResponse { unfollowed }))
}

#[derive(Deserialize)]
pub struct CreateMessageRequest {
    pub text: String,
}

pub async fn create_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateMessageRequest>,
) -> Result<Json<Message>, AppError> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::bad_request("text cannot be empty"));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::bad_request("text must be at most 140 characters"));
    }

    let message = MessageService::new(state.db.clone())
        .create(auth.user_id, text)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = auth.user_id, "failed to create message");
            AppError::internal("failed to create message")
        })?;

    Ok(Json(message))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: Message,
    pub likes_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
}

async fn find_message(state: &AppState, message_id: i64) -> Result<Message, AppError> {
    MessageService::new(state.db.clone())
        .get(message_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, message_id, "failed to fetch message");
            AppError::internal("failed to fetch message")
        })?
        .ok_or_else(|| AppError::not_found("message not found"))
}

pub async fn show_message(
    Path(id): Path<i64>,
    auth: Option<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let message = find_message(&state, id).await?;

    let likes = LikeService::new(state.db.clone());
    let likes_count = likes.count_for_message(id).await.map_err(|err| {
        tracing::error!(error = ?err, message_id = id, "failed to count likes");
        AppError::internal("failed to count likes")
    })?;

    let liked = match auth {
        Some(auth) => Some(likes.is_liked(auth.user_id, id).await.map_err(|err| {
            tracing::error!(error = ?err, message_id = id, "failed to check like");
            AppError::internal("failed to check like")
        })?),
        None => None,
    };

    Ok(Json(MessageResponse {
        message,
        likes_count,
        liked,
    }))
}

pub async fn delete_message(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let message = find_message(&state, id).await?;
    if message.user_id != auth.user_id {
        return Err(AppError::access_unauthorized());
    }

    let deleted = MessageService::new(state.db.clone())
        .delete(id, auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, message_id = id, user_id = auth.user_id, "failed to delete message");
            AppError::internal("failed to delete message")
        })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("message not found"))
    }
}

#[derive(Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: i64,
}

pub async fn toggle_like(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<LikeResponse>, AppError> {
    let message = find_message(&state, id).await?;
    if message.user_id == auth.user_id {
        return Err(AppError::forbidden("cannot like your own message"));
    }

    let service = LikeService::new(state.db.clone());
    let outcome = service.toggle(auth.user_id, id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = auth.user_id, message_id = id, "failed to toggle like");
        AppError::internal("failed to toggle like")
    })?;

    let likes_count = service.count_for_message(id).await.map_err(|err| {
        tracing::error!(error = ?err, message_id = id, "failed to count likes");
        AppError::internal("failed to count likes")
    })?;

    Ok(Json(LikeResponse {
        liked: outcome.is_liked(),
        likes_count,
    }))
}
