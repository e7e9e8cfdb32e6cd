//! Claims codec: JWT encoding and verification
//!
//! Tokens are compact JWS strings (`header.claims.signature`, base64url) signed
//! with a symmetric HMAC secret, so any standard verifier holding the same
//! secret can read them. Expiry is checked against a caller-supplied instant
//! rather than the library's own clock.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::core::config::TokenConfig;

/// Codec errors
///
/// `Malformed`, `SignatureInvalid` and `Expired` are the decode outcomes;
/// `EncodingError` only surfaces from [`ClaimsCodec::encode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JwtError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    SignatureInvalid,

    #[error("Token expired")]
    Expired,

    #[error("Token encoding failed: {0}")]
    EncodingError(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => JwtError::SignatureInvalid,
            _ => JwtError::Malformed,
        }
    }
}

/// Token type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username). Decodes as empty when absent.
    #[serde(default)]
    pub sub: String,
    /// Token type (access or refresh)
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Build claims expiring `lifetime` after `issued_at`
    ///
    /// Returns `None` when the expiry falls outside the representable range.
    pub fn new(
        subject: impl Into<String>,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Option<Self> {
        let expires_at = issued_at.checked_add_signed(lifetime)?;

        Some(Self {
            sub: subject.into(),
            token_type,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// Check if this is an access token
    pub fn is_access_token(&self) -> bool {
        self.token_type == TokenType::Access
    }

    /// Check if this is a refresh token
    pub fn is_refresh_token(&self) -> bool {
        self.token_type == TokenType::Refresh
    }

    /// Whether the token is expired at `now` (the boundary second counts as expired)
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

/// Signs and verifies claims with one secret and algorithm
#[derive(Clone)]
pub struct ClaimsCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl ClaimsCodec {
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        // Expiry is checked in `decode` against the injected instant
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.secret().as_bytes(), config.algorithm())
    }

    /// Sign `claims` into a compact token
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Verify the signature of `token`, parse its claims and reject it if
    /// `exp` is at or before `now`.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;

        if token_data.claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims)
    }
}
