//! Login gate. Handlers that take a [`CurrentUser`] only run for requests
//! carrying a live session cookie.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Duration;
use tracing::{error, warn};

use crate::db::users;
use crate::error::AppError;
use crate::models::{Flash, User};
use crate::services::auth;
use crate::state::AppState;
use crate::views::html_500;

pub const SESSION_COOKIE: &str = "rollbook_session";

/// Request-scoped identity of the logged-in user.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl CurrentUser {
    pub fn username(&self) -> &str {
        &self.user.username
    }

    /// Queues a message for the next page this user sees. A failure here is
    /// logged and otherwise ignored so the surrounding redirect still happens.
    pub async fn flash(&self, state: &AppState, flash: Flash) {
        if let Err(e) = users::set_flash(&state.db, &self.token, &flash).await {
            warn!("could not store flash message: {}", e);
        }
    }

    pub async fn take_flash(&self, state: &AppState) -> Option<Flash> {
        match users::take_flash(&state.db, &self.token).await {
            Ok(flash) => flash,
            Err(e) => {
                warn!("could not read flash message: {}", e);
                None
            }
        }
    }
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(token: &str, ttl: Duration) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.num_seconds()
    ))
    .map_err(|e| AppError::Internal(format!("bad session cookie: {}", e)))
}

pub fn expired_cookie() -> HeaderValue {
    HeaderValue::from_static("rollbook_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

async fn current_user(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AppError> {
    let Some(token) = session_token(&parts.headers) else {
        return Ok(None);
    };
    Ok(auth::resolve_session(&state.db, &token)
        .await?
        .map(|user| CurrentUser { user, token }))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match current_user(parts, state).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(Redirect::to("/login").into_response()),
            Err(e) => {
                error!("session lookup failed: {}", e);
                Err(html_500())
            }
        }
    }
}

/// Same gate for the JSON API, which answers 401 instead of redirecting.
#[derive(Debug, Clone)]
pub struct ApiUser(pub CurrentUser);

impl FromRequestParts<AppState> for ApiUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        current_user(parts, state)
            .await?
            .map(ApiUser)
            .ok_or_else(|| AppError::Unauthorized("login required".to_string()))
    }
}

/// Resolves the session when there is one, without rejecting anonymous requests.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match current_user(parts, state).await {
            Ok(user) => Ok(MaybeUser(user)),
            Err(e) => {
                error!("session lookup failed: {}", e);
                Err(html_500())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_session_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; rollbook_session=abc-123; lang=en"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn missing_or_empty_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("rollbook_session="));
        assert_eq!(session_token(&headers), None);
    }
}
