#[cfg(feature = "server")]
#[tokio::main]
async fn main() {
    use std::sync::Arc;

    use blog_auth::core::auth::{
        AuthApiState, AuthService, BcryptVerifier, TokenService, app_router,
    };
    use blog_auth::core::config::Config;
    use blog_auth::core::users::{InMemoryUserRepository, User};

    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing (honours RUST_LOG)
    tracing_subscriber::fmt::init();

    // Missing or invalid token settings are fatal
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: algorithm={:?}, access_lifetime={}m, refresh_lifetime={}d, prefix={}",
        config.token.algorithm(),
        config.token.access_lifetime().num_minutes(),
        config.token.refresh_lifetime().num_days(),
        config.server.api_prefix
    );

    let verifier = BcryptVerifier::new();
    let users = Arc::new(InMemoryUserRepository::new());

    if let Some((username, password)) = &config.server.bootstrap_user {
        let seeded = verifier
            .hash(password)
            .map_err(|e| e.to_string())
            .and_then(|hash| {
                users
                    .insert(User::new(username.clone(), hash))
                    .map_err(|e| e.to_string())
            });

        match seeded {
            Ok(()) => tracing::info!("Seeded bootstrap user: {}", username),
            Err(e) => {
                tracing::error!("Failed to seed bootstrap user: {}", e);
                std::process::exit(1);
            }
        }
    }

    let tokens = TokenService::new(config.token.clone());
    let state = AuthApiState {
        auth_service: AuthService::new(users, verifier, tokens),
    };
    let app = app_router(state, &config.server);

    let addr = config.server.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("listening on http://{}", addr);
    tracing::info!(
        "Auth API: http://{}{}/auth/{{login,refresh,me}}",
        addr,
        config.server.api_prefix
    );

    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "server"))]
pub fn main() {
    // no server without the `server` feature; the library is usable on its own
}
