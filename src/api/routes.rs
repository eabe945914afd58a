//! API route handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use super::server::SharedState;
use crate::auth::{Authenticator, LoginRequest, SignupRequest};
use crate::error::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// Health check

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

// Authentication routes

pub async fn login(
    State(state): State<SharedState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(credentials)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid login data");
    };

    match state.authenticator.authenticate(&credentials).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(Error::InvalidCredentials) => {
            tracing::info!("Rejected login for '{}'", credentials.username);
            error_response(StatusCode::UNAUTHORIZED, "Invalid credentials")
        }
        Err(e) => {
            tracing::error!("Login error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Authentication error")
        }
    }
}

pub async fn signup(
    State(state): State<SharedState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid signup data");
    };

    match state.directory.register(request).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(json!({ "message": "User created successfully", "userId": id })),
        )
            .into_response(),
        Err(e @ (Error::UserExists(_) | Error::InvalidRole(_))) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            tracing::error!("Signup error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
        }
    }
}
