//! Request authentication.
//!
//! HTTP routes accept `Authorization: Bearer <token>` or the `session_token`
//! cookie. The websocket upgrade takes the token as a `token` query
//! parameter because browsers cannot set headers on upgrades.

use axum::extract::FromRef;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::services::identity::Identity;
use crate::state::AppState;

const COOKIE_NAME: &str = "session_token";

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated caller. Use as a handler parameter to require a token.
pub struct AuthUser {
    pub identity: Identity,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = request_token(parts) else {
            return Err(StatusCode::UNAUTHORIZED);
        };

        let app_state = AppState::from_ref(state);
        let identity = resolve_token(&app_state, &token).await?;
        Ok(Self { identity })
    }
}

/// Resolve `token` through the configured identity provider.
///
/// # Errors
///
/// `401` for an unknown token, `500` when the provider fails.
pub(crate) async fn resolve_token(state: &AppState, token: &str) -> Result<Identity, StatusCode> {
    match state.identity.resolve(token).await {
        Ok(Some(identity)) => Ok(identity),
        Ok(None) => Err(StatusCode::UNAUTHORIZED),
        Err(e) => {
            tracing::error!(error = %e, "auth: identity lookup failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn request_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer);
    if let Some(token) = bearer {
        return Some(token.to_owned());
    }

    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(COOKIE_NAME)
        .map(Cookie::value)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
