//! One-shot messages carried across a redirect in a cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;

pub const FLASH_COOKIE: &str = "warbler_flash";

pub fn set(jar: CookieJar, message: impl Into<String>) -> CookieJar {
    let cookie = Cookie::build((FLASH_COOKIE, message.into()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Reads the pending flash message and clears it.
pub fn take(jar: CookieJar) -> (CookieJar, Option<String>) {
    let message = jar
        .get(FLASH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|message| !message.is_empty());

    match message {
        Some(message) => {
            let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
            (jar, Some(message))
        }
        None => (jar, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_returns_and_clears_message() {
        let jar = set(CookieJar::new(), "Access unauthorized.");
        let (jar, message) = take(jar);

        assert_eq!(message.as_deref(), Some("Access unauthorized."));
        assert!(jar.get(FLASH_COOKIE).is_none());
    }

    #[test]
    fn take_without_flash_is_empty() {
        let (_, message) = take(CookieJar::new());
        assert!(message.is_none());
    }
}
