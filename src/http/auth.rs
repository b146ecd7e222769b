use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;

use crate::app::auth::{AuthService, SessionToken};
use crate::http::AppError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "warbler_session";

/// The caller resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(AppError::access_unauthorized)?;

        let service = AuthService::new(state.db.clone(), state.session_ttl_hours);
        let session = service.resolve_session(&token).await.map_err(|err| {
            tracing::error!(error = ?err, "failed to resolve session");
            AppError::internal("failed to authenticate")
        })?;

        let session = session.ok_or_else(AppError::access_unauthorized)?;
        Ok(AuthUser {
            user_id: session.user_id,
        })
    }
}

pub fn session_cookie(session: &SessionToken, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .expires(session.expires_at)
        .build()
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
