//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::Config;

pub const CONFIG_FILENAME: &str = "carehub.toml";

/// Load configuration from carehub.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load carehub.toml if present, otherwise the defaults
pub fn load_config_or_default() -> Result<Config> {
    match load_config() {
        Err(Error::ConfigNotFound) => {
            tracing::debug!("No {} found, using defaults", CONFIG_FILENAME);
            Ok(Config::default())
        }
        result => result,
    }
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::ConfigNotFound,
        _ => Error::Io(e),
    })?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Write configuration to a specific path
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
    fs::write(path, content)?;
    Ok(())
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<std::path::PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    // Constant pattern; a failure here is a bug in the codebase
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# CareHub Configuration

[auth]
endpoint = "${CAREHUB_AUTH_ENDPOINT:-http://localhost:8090}"
timeout_secs = 10

[session]
dir = "./.carehub/session"

# Local authentication server (carehub serve)
[server]
host = "127.0.0.1"
port = 8090
jwt_secret = "${CAREHUB_JWT_SECRET:-carehub-secret-key-change-in-production}"
token_ttl_secs = 3600
demo_accounts = true

# Routes default to the built-in CareHub table. Declaring any [[routes]]
# replaces it entirely.
#
# [[routes]]
# path = "/"
# public = true
#
# [[routes]]
# path = "/dashboard"            # any signed-in user
#
# [[routes]]
# path = "/patients"
# roles = ["admin", "superadmin", "doctor", "nurse", "intern"]
#
# [[routes]]
# path = "/settings"
# roles = ["admin", "superadmin"]
# redirect = "/dashboard"
"#
}
