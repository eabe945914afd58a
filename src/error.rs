//! Error types for CareHub

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found. Run 'carehub init' first.")]
    ConfigNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Login timed out after {0:?}")]
    LoginTimeout(std::time::Duration),

    #[error("Malformed authentication response: {0}")]
    MalformedResponse(String),

    #[error("{0} already exists")]
    UserExists(String),

    #[error("Unknown role: {0}")]
    InvalidRole(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error means the server rejected the credentials, as
    /// opposed to the login attempt failing for some other reason
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::InvalidCredentials)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
