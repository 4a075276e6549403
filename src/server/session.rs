use super::error::ApiError;
use super::state::ServerState;
use crate::media_store::GUEST_USER_ID;
use crate::user::{Account, SessionTokenValue};

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Session {
    pub account: Account,
    pub token: SessionTokenValue,
}

impl Session {
    pub fn user_id(&self) -> String {
        self.account.user_id()
    }
}

/// The identity listening data is recorded under. Requests without a valid
/// session act as the guest user.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
}

impl From<Option<Session>> for Identity {
    fn from(session: Option<Session>) -> Self {
        let user_id = session
            .as_ref()
            .map(Session::user_id)
            .unwrap_or_else(|| GUEST_USER_ID.to_owned());
        Identity { user_id }
    }
}

/// A session belonging to an admin account.
#[derive(Debug)]
pub struct AdminSession(pub Session);

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

pub enum SessionExtractionError {
    AuthenticationRequired,
    StorageUnavailable(anyhow::Error),
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> Response {
        match self {
            SessionExtractionError::AuthenticationRequired => {
                ApiError::Unauthorized("Authentication required".to_owned()).into_response()
            }
            SessionExtractionError::StorageUnavailable(cause) => {
                ApiError::StorageUnavailable(cause).into_response()
            }
        }
    }
}

fn extract_session_token_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(|s| s.to_string())
}

fn extract_session_token_from_headers(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(HEADER_SESSION_TOKEN_KEY)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .map(|v| match v.strip_prefix("Bearer ") {
            Some(token) => token.trim().to_owned(),
            None => v.trim().to_owned(),
        })
        .filter(|v| !v.is_empty())
}

/// Ok(None) means the request carries no token or an unknown one. A failed lookup is an
/// error, the request must not continue as the guest.
fn extract_session_from_request_parts(
    parts: &Parts,
    ctx: &ServerState,
) -> Result<Option<Session>, SessionExtractionError> {
    let token = match extract_session_token_from_cookies(parts)
        .or_else(|| extract_session_token_from_headers(parts))
    {
        None => {
            debug!("No token in cookies nor headers.");
            return Ok(None);
        }
        Some(x) => SessionTokenValue(x),
    };

    match ctx.media_store.get_session_account(&token) {
        Ok(Some(account)) => {
            debug!("Resolved session for account_id={}", account.id);
            Ok(Some(Session { account, token }))
        }
        Ok(None) => {
            debug!("Session token not found in database");
            Ok(None)
        }
        Err(err) => Err(SessionExtractionError::StorageUnavailable(
            err.context("Failed to resolve session token"),
        )),
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)?
            .ok_or(SessionExtractionError::AuthenticationRequired)
    }
}

impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx)
    }
}

impl FromRequestParts<ServerState> for Identity {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Identity::from(extract_session_from_request_parts(parts, ctx)?))
    }
}

impl FromRequestParts<ServerState> for AdminSession {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        match extract_session_from_request_parts(parts, ctx)? {
            Some(session) if session.account.is_admin() => Ok(AdminSession(session)),
            Some(session) => {
                debug!("Account {} is not an admin", session.account.username);
                Err(SessionExtractionError::AuthenticationRequired)
            }
            None => Err(SessionExtractionError::AuthenticationRequired),
        }
    }
}
