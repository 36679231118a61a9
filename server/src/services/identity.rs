//! Identity resolution for websocket upgrades and HTTP requests.
//!
//! ARCHITECTURE
//! ============
//! Session issuance lives elsewhere; this service only answers "whose token
//! is this". `PgSessionIdentity` looks tokens up in `sessions`. `DevIdentity`
//! treats the token itself as the user id so local runs and tests need no
//! database.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::frame::ErrorCode for IdentityError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "E_DATABASE",
        }
    }
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub display_name: String,
    /// Presence color assigned at sign-up, if any.
    pub color: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` for an unknown or expired token.
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, IdentityError>;
}

// =============================================================================
// DEV
// =============================================================================

pub struct DevIdentity;

#[async_trait]
impl IdentityProvider for DevIdentity {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, IdentityError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(Identity { user_id: token.to_owned(), display_name: token.to_owned(), color: None }))
    }
}

// =============================================================================
// SESSION
// =============================================================================

pub struct PgSessionIdentity {
    pool: PgPool,
}

impl PgSessionIdentity {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for PgSessionIdentity {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, IdentityError> {
        if token.is_empty() {
            return Ok(None);
        }
        let row = sqlx::query(
            r"SELECT u.id::text AS id, u.name, u.color
              FROM sessions s
              JOIN users u ON u.id = s.user_id
              WHERE s.token = $1 AND s.expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Identity { user_id: r.get("id"), display_name: r.get("name"), color: r.get("color") }))
    }
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
