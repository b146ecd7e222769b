use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::Serialize;

use crate::http::flash;

pub const ACCESS_UNAUTHORIZED: &str = "Access unauthorized.";

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    redirect: Option<&'static str>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            redirect: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Missing session, or acting on something the caller does not own.
    /// Rendered as a redirect home with a flash message.
    pub fn access_unauthorized() -> Self {
        Self {
            status: StatusCode::SEE_OTHER,
            message: ACCESS_UNAUTHORIZED.to_string(),
            redirect: Some("/"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(location) = self.redirect {
            let jar = flash::set(CookieJar::new(), self.message);
            return (jar, Redirect::to(location)).into_response();
        }

        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn access_unauthorized_redirects_home_with_flash() {
        let response = AppError::access_unauthorized().into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(&format!("{}=", flash::FLASH_COOKIE)));
    }

    #[test]
    fn other_errors_are_json() {
        let response = AppError::not_found("message not found").into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}
