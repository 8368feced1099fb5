//! Session cookie handling.
//!
//! The cookie carries a signed token issued by the `AuthProvider`; nothing
//! about the session is kept server-side.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use pm_core::models::SessionUser;

use crate::AppState;

pub const SESSION_COOKIE: &str = "pm_session";

/// The logged-in user, if the request carries a valid session cookie.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<SessionUser>);

impl Viewer {
    pub fn username(&self) -> String {
        self.0
            .as_ref()
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.0.is_some()
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = cookie_value(&parts.headers, SESSION_COOKIE)
            .and_then(|token| state.auth.resolve_session(token));
        Ok(Viewer(user))
    }
}

/// Finds a cookie by name across all `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

pub fn cleared_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
