//! Token service: issuance, verification and refresh of bearer tokens
//!
//! The service is stateless apart from its immutable configuration and is
//! meant to be built once at startup and shared between request handlers.
//! Verification failures are collapsed to `None` at the public surface; the
//! specific cause is only logged at debug level.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::core::auth::jwt::{Claims, ClaimsCodec, JwtError, TokenType};
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::TokenConfig;

/// Value of the `token_type` field in token responses
pub const BEARER_TOKEN_TYPE: &str = "bearer";

/// Token issuance and verification failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error("Invalid token type: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: TokenType,
        actual: TokenType,
    },

    #[error("Token has no subject")]
    MissingSubject,

    #[error("Token lifetime must be positive and within range")]
    InvalidLifetime,
}

/// Token pair (access + refresh)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived)
    pub access_token: String,
    /// Refresh token (long-lived)
    pub refresh_token: String,
    /// Access token expiration (Unix timestamp)
    pub access_expires_at: i64,
    /// Refresh token expiration (Unix timestamp)
    pub refresh_expires_at: i64,
    /// Token type (always "bearer")
    pub token_type: String,
}

/// Token service for issuing and checking access/refresh tokens
#[derive(Clone)]
pub struct TokenService {
    codec: ClaimsCodec,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a token service reading the system clock
    pub fn new(config: TokenConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a token service with an explicit clock
    pub fn with_clock(config: TokenConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec: ClaimsCodec::from_config(&config),
            access_lifetime: config.access_lifetime(),
            refresh_lifetime: config.refresh_lifetime(),
            clock,
        }
    }

    /// Issue an access token for `subject`
    ///
    /// Uses the configured access lifetime unless `lifetime` is given.
    pub fn issue_access(
        &self,
        subject: &str,
        lifetime: Option<Duration>,
    ) -> Result<String, TokenError> {
        let lifetime = lifetime.unwrap_or(self.access_lifetime);
        self.issue(subject, TokenType::Access, lifetime)
    }

    /// Issue a refresh token for `subject`
    ///
    /// Uses the configured refresh lifetime unless `lifetime` is given.
    pub fn issue_refresh(
        &self,
        subject: &str,
        lifetime: Option<Duration>,
    ) -> Result<String, TokenError> {
        let lifetime = lifetime.unwrap_or(self.refresh_lifetime);
        self.issue(subject, TokenType::Refresh, lifetime)
    }

    /// Issue an access and a refresh token from the same instant
    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair, TokenError> {
        let now = self.clock.now();

        let access = Claims::new(subject, TokenType::Access, now, self.access_lifetime)
            .ok_or(TokenError::InvalidLifetime)?;
        let refresh = Claims::new(subject, TokenType::Refresh, now, self.refresh_lifetime)
            .ok_or(TokenError::InvalidLifetime)?;

        Ok(TokenPair {
            access_token: self.codec.encode(&access)?,
            refresh_token: self.codec.encode(&refresh)?,
            access_expires_at: access.exp,
            refresh_expires_at: refresh.exp,
            token_type: BEARER_TOKEN_TYPE.to_string(),
        })
    }

    fn issue(
        &self,
        subject: &str,
        token_type: TokenType,
        lifetime: Duration,
    ) -> Result<String, TokenError> {
        if lifetime <= Duration::zero() {
            return Err(TokenError::InvalidLifetime);
        }

        let claims = Claims::new(subject, token_type, self.clock.now(), lifetime)
            .ok_or(TokenError::InvalidLifetime)?;
        Ok(self.codec.encode(&claims)?)
    }

    /// Verify `token` and return its claims if it is valid and of the expected type
    ///
    /// Any failure (malformed, bad signature, expired, wrong type) yields `None`.
    pub fn verify(&self, token: &str, expected: TokenType) -> Option<Claims> {
        match self.check(token, expected) {
            Ok(claims) => Some(claims),
            Err(err) => {
                tracing::debug!(reason = %err, expected = %expected, "Token rejected");
                None
            }
        }
    }

    /// Exchange a refresh token for a fresh access token
    ///
    /// The refresh token itself stays valid until it expires.
    pub fn refresh(&self, refresh_token: &str) -> Option<String> {
        let subject = match self.check_refresh(refresh_token) {
            Ok(subject) => subject,
            Err(err) => {
                tracing::debug!(reason = %err, "Refresh rejected");
                return None;
            }
        };

        match self.issue_access(&subject, None) {
            Ok(token) => Some(token),
            Err(err) => {
                tracing::error!(error = %err, "Failed to issue access token on refresh");
                None
            }
        }
    }

    /// Like [`TokenService::verify`], keeping the rejection reason
    pub(crate) fn check(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = self.codec.decode(token, self.clock.now())?;

        if claims.token_type != expected {
            return Err(TokenError::TypeMismatch {
                expected,
                actual: claims.token_type,
            });
        }

        Ok(claims)
    }

    /// Subject of a valid refresh token
    pub(crate) fn check_refresh(&self, refresh_token: &str) -> Result<String, TokenError> {
        let claims = self.check(refresh_token, TokenType::Refresh)?;

        if claims.sub.is_empty() {
            return Err(TokenError::MissingSubject);
        }

        Ok(claims.sub)
    }
}
