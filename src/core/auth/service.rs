//! Authentication service
//!
//! Provides business logic for login, token refresh and resolving the caller
//! of a bearer token. Coordinates between the user repository, the password
//! verifier and the token service.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::auth::jwt::TokenType;
use crate::core::auth::password::PasswordVerifier;
use crate::core::auth::tokens::{BEARER_TOKEN_TYPE, TokenError, TokenPair, TokenService};
use crate::core::users::{User, UserRepository, UserRepositoryError};

/// Authentication service error types
///
/// Token problems of every kind surface as `InvalidToken`.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

/// Login request data
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Access token issued in exchange for a refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Authentication service
pub struct AuthService<R, P> {
    users: Arc<R>,
    passwords: P,
    tokens: TokenService,
}

impl<R, P> AuthService<R, P>
where
    R: UserRepository,
    P: PasswordVerifier,
{
    /// Create a new authentication service
    pub fn new(users: Arc<R>, passwords: P, tokens: TokenService) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Login an existing user and issue an access/refresh pair
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair, AuthError> {
        let user = self
            .users
            .get_by_subject(&request.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.passwords.verify(&request.password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(self.tokens.issue_pair(&user.username)?)
    }

    /// Refresh access token using refresh token
    pub fn refresh(&self, request: &RefreshRequest) -> Result<AccessTokenResponse, AuthError> {
        let access_token = self
            .tokens
            .refresh(&request.refresh_token)
            .ok_or(AuthError::InvalidToken)?;

        Ok(AccessTokenResponse {
            access_token,
            token_type: BEARER_TOKEN_TYPE.to_string(),
        })
    }

    /// Get current user from access token
    pub async fn current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = self
            .tokens
            .verify(access_token, TokenType::Access)
            .ok_or(AuthError::InvalidToken)?;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let user = self.users.get_by_subject(&claims.sub).await?;

        user.ok_or_else(|| {
            tracing::debug!("Token subject no longer resolves to a user");
            AuthError::InvalidToken
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::password::BcryptVerifier;
    use crate::core::clock::{Clock, FixedClock};
    use crate::core::config::TokenConfig;
    use crate::core::users::InMemoryUserRepository;
    use chrono::{DateTime, Duration};

    const T0: i64 = 1_700_000_000;

    struct Fixture {
        service: AuthService<InMemoryUserRepository, BcryptVerifier>,
        users: Arc<InMemoryUserRepository>,
        clock: Arc<FixedClock>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(DateTime::from_timestamp(T0, 0).unwrap()));
        let config =
            TokenConfig::new("service_test_secret", "HS256", Duration::minutes(30), Duration::days(7))
                .unwrap();
        let tokens = TokenService::with_clock(config, clock.clone());

        let verifier = BcryptVerifier::with_cost(4);
        let users = Arc::new(InMemoryUserRepository::new());
        users
            .insert(User::new("alice", verifier.hash("Password123").unwrap()))
            .unwrap();

        Fixture {
            service: AuthService::new(users.clone(), verifier, tokens),
            users,
            clock,
        }
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    // ========================================================================
    // Login Tests
    // ========================================================================

    #[tokio::test]
    async fn test_login_issues_pair() {
        let fx = fixture();

        let pair = fx
            .service
            .login(login_request("alice", "Password123"))
            .await
            .unwrap();

        let access = fx
            .service
            .tokens()
            .verify(&pair.access_token, TokenType::Access)
            .unwrap();
        let refresh = fx
            .service
            .tokens()
            .verify(&pair.refresh_token, TokenType::Refresh)
            .unwrap();

        assert_eq!(access.sub, "alice");
        assert_eq!(refresh.sub, "alice");
        assert_eq!(pair.token_type, "bearer");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let fx = fixture();

        let result = fx.service.login(login_request("alice", "wrong")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let fx = fixture();

        let result = fx.service.login(login_request("bob", "Password123")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    // ========================================================================
    // Refresh Tests
    // ========================================================================

    #[tokio::test]
    async fn test_refresh() {
        let fx = fixture();
        let pair = fx
            .service
            .login(login_request("alice", "Password123"))
            .await
            .unwrap();

        fx.clock.advance(Duration::hours(1));
        let response = fx
            .service
            .refresh(&RefreshRequest {
                refresh_token: pair.refresh_token,
            })
            .unwrap();

        let claims = fx
            .service
            .tokens()
            .verify(&response.access_token, TokenType::Access)
            .unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp, fx.clock.now().timestamp() + 30 * 60);
        assert_eq!(response.token_type, "bearer");
    }

    #[tokio::test]
    async fn test_refresh_with_access_token_fails() {
        let fx = fixture();
        let pair = fx
            .service
            .login(login_request("alice", "Password123"))
            .await
            .unwrap();

        let result = fx.service.refresh(&RefreshRequest {
            refresh_token: pair.access_token,
        });
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    // ========================================================================
    // Current User Tests
    // ========================================================================

    #[tokio::test]
    async fn test_current_user() {
        let fx = fixture();
        let pair = fx
            .service
            .login(login_request("alice", "Password123"))
            .await
            .unwrap();

        let user = fx.service.current_user(&pair.access_token).await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_current_user_rejects_refresh_token() {
        let fx = fixture();
        let pair = fx
            .service
            .login(login_request("alice", "Password123"))
            .await
            .unwrap();

        let result = fx.service.current_user(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_current_user_expired_token() {
        let fx = fixture();
        let pair = fx
            .service
            .login(login_request("alice", "Password123"))
            .await
            .unwrap();

        fx.clock.advance(Duration::minutes(30));
        let result = fx.service.current_user(&pair.access_token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_current_user_removed_user() {
        let fx = fixture();
        let pair = fx
            .service
            .login(login_request("alice", "Password123"))
            .await
            .unwrap();

        fx.users.remove("alice");
        let result = fx.service.current_user(&pair.access_token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    // ========================================================================
    // Error / Serialization Tests
    // ========================================================================

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            format!("{}", AuthError::InvalidCredentials),
            "Invalid credentials"
        );
        assert_eq!(
            format!("{}", AuthError::InvalidToken),
            "Invalid or expired token"
        );
    }

    #[test]
    fn test_auth_error_from_token_error_is_internal() {
        let err: AuthError = TokenError::InvalidLifetime.into();
        assert!(matches!(err, AuthError::InternalError(_)));
    }

    #[test]
    fn test_login_request_deserialization() {
        let json = r#"{
            "username": "alice",
            "password": "Password123"
        }"#;

        let request: LoginRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.username, "alice");
        assert_eq!(request.password, "Password123");
    }

    #[test]
    fn test_refresh_request_deserialization() {
        let json = r#"{
            "refresh_token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9..."
        }"#;

        let request: RefreshRequest = serde_json::from_str(json).unwrap();
        assert!(request.refresh_token.starts_with("eyJ"));
    }
}
