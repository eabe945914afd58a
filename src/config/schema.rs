//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::models::{Role, RoleSet};
use crate::error::Result;
use crate::gate::{AccessPolicy, RouteTable};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Route table override; the built-in CareHub routes apply when empty
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Remote authentication endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8090".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl AuthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Where the session is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_dir")]
    pub dir: PathBuf,
}

fn default_session_dir() -> PathBuf {
    PathBuf::from("./.carehub/session")
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: default_session_dir(),
        }
    }
}

/// Local authentication server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Signing secret for issued tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Seed one account per role
    #[serde(default = "default_demo_accounts")]
    pub demo_accounts: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_jwt_secret() -> String {
    "carehub-secret-key-change-in-production".to_string()
}

fn default_token_ttl_secs() -> i64 {
    3600
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_demo_accounts() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            jwt_secret: default_jwt_secret(),
            token_ttl_secs: default_token_ttl_secs(),
            bcrypt_cost: default_bcrypt_cost(),
            demo_accounts: default_demo_accounts(),
        }
    }
}

/// A configured route and its access policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub path: String,

    /// Public routes carry no policy at all
    #[serde(default)]
    pub public: bool,

    /// Empty means any authenticated user
    #[serde(default)]
    pub roles: Vec<Role>,

    #[serde(default)]
    pub redirect: Option<String>,

    #[serde(default = "default_require_auth")]
    pub require_auth: bool,
}

fn default_require_auth() -> bool {
    true
}

impl RouteConfig {
    pub fn policy(&self) -> Option<AccessPolicy> {
        if self.public {
            return None;
        }
        Some(AccessPolicy {
            allowed_roles: RoleSet::from(self.roles.as_slice()),
            redirect_path: self.redirect.clone(),
            require_auth: self.require_auth,
        })
    }
}

impl Config {
    /// The configured route table, or the built-in one
    pub fn route_table(&self) -> Result<RouteTable> {
        if self.routes.is_empty() {
            Ok(RouteTable::carehub())
        } else {
            RouteTable::from_config(&self.routes)
        }
    }
}
