//! Authentication module
//!
//! This module provides authentication functionality including:
//! - JWT claims encoding and verification
//! - Access/refresh token issuance, verification and refresh
//! - Login and current-user flows over a user repository
//! - REST API endpoints for auth operations

#[cfg(feature = "server")]
pub mod api;
pub mod jwt;
pub mod password;
pub mod service;
pub mod tokens;

#[cfg(feature = "server")]
pub use api::{AuthApiState, CurrentUser, app_router, auth_api_router};
pub use jwt::{Claims, ClaimsCodec, JwtError, TokenType};
pub use password::{BcryptVerifier, PasswordError, PasswordVerifier};
pub use service::{AccessTokenResponse, AuthError, AuthService, LoginRequest, RefreshRequest};
pub use tokens::{BEARER_TOKEN_TYPE, TokenError, TokenPair, TokenService};
