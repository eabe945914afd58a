//! Local authentication server

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{DirectoryAuthenticator, UserDirectory};
use crate::config::ServerConfig;
use crate::error::Result;

use super::routes;

/// Application state shared across handlers
pub struct AppState {
    pub directory: Arc<UserDirectory>,
    pub authenticator: DirectoryAuthenticator,
}

impl AppState {
    pub fn new(directory: Arc<UserDirectory>, config: &ServerConfig) -> Self {
        let authenticator = DirectoryAuthenticator::new(
            directory.clone(),
            config.jwt_secret.as_bytes().to_vec(),
            config.token_ttl_secs,
        );
        Self {
            directory,
            authenticator,
        }
    }

    /// State over a fresh directory, seeded when the config asks for it
    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        let directory = if config.demo_accounts {
            UserDirectory::with_demo_accounts(config.bcrypt_cost).await?
        } else {
            UserDirectory::new(config.bcrypt_cost)
        };
        Ok(Self::new(Arc::new(directory), config))
    }
}

pub type SharedState = Arc<AppState>;

/// Run the authentication server
pub async fn run_server(config: ServerConfig, host: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::from_config(&config).await?);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    serve(listener, state).await
}

/// Serve on an already bound listener
pub async fn serve(listener: TcpListener, state: SharedState) -> Result<()> {
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/auth/login", post(routes::login))
        .route("/auth/signup", post(routes::signup))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
