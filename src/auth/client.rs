//! Authentication endpoint clients

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::directory::UserDirectory;
use crate::auth::jwt::create_token;
use crate::auth::models::{LoginRequest, LoginResponse};
use crate::error::{Error, Result};

/// Exchanges credentials for a token and identity
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &LoginRequest) -> Result<LoginResponse>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Talks to a remote `POST /auth/login` endpoint
#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    client: reqwest::Client,
    login_url: String,
    timeout: Duration,
}

impl HttpAuthenticator {
    /// `endpoint` is the server base URL, e.g. `http://localhost:8090`
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            login_url: format!("{}/auth/login", endpoint.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// A request that ran out of time is a login timeout, not a transport error
    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::LoginTimeout(self.timeout)
        } else {
            Error::Http(err)
        }
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn authenticate(&self, credentials: &LoginRequest) -> Result<LoginResponse> {
        tracing::debug!("POST {}", self.login_url);
        let response = self
            .client
            .post(&self.login_url)
            .json(credentials)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        match response.status() {
            status if status.is_success() => {
                let body = response.text().await.map_err(|e| self.transport_error(e))?;
                serde_json::from_str(&body).map_err(|e| Error::MalformedResponse(e.to_string()))
            }
            StatusCode::UNAUTHORIZED => Err(Error::InvalidCredentials),
            status => {
                let message = response
                    .json::<ErrorBody>()
                    .await
                    .map(|body| body.error)
                    .unwrap_or_else(|_| status.to_string());
                Err(Error::Other(format!("Login failed: {}", message)))
            }
        }
    }
}

/// Authenticates in-process against a [`UserDirectory`] and issues signed tokens
pub struct DirectoryAuthenticator {
    directory: Arc<UserDirectory>,
    secret: Vec<u8>,
    token_ttl_secs: i64,
}

impl DirectoryAuthenticator {
    pub fn new(directory: Arc<UserDirectory>, secret: impl Into<Vec<u8>>, token_ttl_secs: i64) -> Self {
        Self {
            directory,
            secret: secret.into(),
            token_ttl_secs,
        }
    }
}

#[async_trait]
impl Authenticator for DirectoryAuthenticator {
    async fn authenticate(&self, credentials: &LoginRequest) -> Result<LoginResponse> {
        let user = self
            .directory
            .verify(&credentials.username, &credentials.password)
            .await?;
        let token = create_token(&user, &self.secret, self.token_ttl_secs)?;
        Ok(LoginResponse { token, user })
    }
}
