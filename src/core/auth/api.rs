//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST {prefix}/auth/login - Login and get tokens
//! - POST {prefix}/auth/refresh - Exchange a refresh token for an access token
//! - GET {prefix}/auth/me - Get current user info
//! - GET /health - Liveness probe
//!
//! Every token failure maps to the same 401 response so callers cannot tell
//! an expired token from a forged one.

use std::sync::Arc;

use axum::{
    Json, RequestPartsExt, Router,
    extract::{FromRequestParts, State},
    http::{HeaderValue, Method, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::auth::password::PasswordVerifier;
use crate::core::auth::service::{
    AccessTokenResponse, AuthError, AuthService, LoginRequest, RefreshRequest,
};
use crate::core::auth::tokens::TokenPair;
use crate::core::config::ServerConfig;
use crate::core::users::{User, UserRepository, UserResponse};

/// Auth API state containing the auth service
pub struct AuthApiState<R, P> {
    pub auth_service: AuthService<R, P>,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Convert AuthError to API response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(ApiError::new(self.to_string(), "INVALID_CREDENTIALS")),
            )
                .into_response(),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(ApiError::new(self.to_string(), "INVALID_TOKEN")),
            )
                .into_response(),
            AuthError::InternalError(detail) => {
                tracing::error!("Auth request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiError::new("Internal error", "INTERNAL_ERROR")),
                )
                    .into_response()
            }
        }
    }
}

/// Caller resolved from a valid `Authorization: Bearer` access token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<R, P> FromRequestParts<Arc<AuthApiState<R, P>>> for CurrentUser
where
    R: UserRepository,
    P: PasswordVerifier,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AuthApiState<R, P>>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;

        let user = state.auth_service.current_user(bearer.token()).await?;
        Ok(Self(user))
    }
}

/// Create the auth API router
pub fn auth_api_router<R, P>(state: AuthApiState<R, P>) -> Router
where
    R: UserRepository,
    P: PasswordVerifier,
{
    let state = Arc::new(state);

    Router::new()
        .route("/auth/login", post(login_handler::<R, P>))
        .route("/auth/refresh", post(refresh_handler::<R, P>))
        .route("/auth/me", get(me_handler))
        .with_state(state)
}

/// Full application router: auth routes under `server.api_prefix`, health
/// probe, CORS and request tracing.
pub fn app_router<R, P>(state: AuthApiState<R, P>, server: &ServerConfig) -> Router
where
    R: UserRepository,
    P: PasswordVerifier,
{
    let auth = auth_api_router(state);

    let router = if server.api_prefix.is_empty() {
        Router::new().merge(auth)
    } else {
        Router::new().nest(&server.api_prefix, auth)
    };

    router
        .route("/health", get(health_handler))
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// POST /auth/login
/// Login and get access/refresh tokens
async fn login_handler<R, P>(
    State(state): State<Arc<AuthApiState<R, P>>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenPair>, AuthError>
where
    R: UserRepository,
    P: PasswordVerifier,
{
    tracing::info!("Login attempt for username: {}", request.username);

    let username = request.username.clone();
    let tokens = state.auth_service.login(request).await.inspect_err(|err| {
        if matches!(err, AuthError::InvalidCredentials) {
            tracing::info!("Login rejected for username: {}", username);
        }
    })?;

    tracing::info!("User logged in successfully: {}", username);

    Ok(Json(tokens))
}

/// POST /auth/refresh
/// Exchange a refresh token for a new access token
async fn refresh_handler<R, P>(
    State(state): State<Arc<AuthApiState<R, P>>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, AuthError>
where
    R: UserRepository,
    P: PasswordVerifier,
{
    tracing::debug!("Token refresh request");

    let response = state.auth_service.refresh(&request)?;

    Ok(Json(response))
}

/// GET /auth/me
/// Get current user info from access token
async fn me_handler(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

/// GET /health
async fn health_handler() -> &'static str {
    "ok"
}
