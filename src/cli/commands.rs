//! CLI command implementations

use anyhow::Result;
use dialoguer::{Input, Password};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::api;
use crate::auth::{FileSessionStore, HttpAuthenticator, SessionManager};
use crate::cli::{error, format_decision, info, print_identity, print_route_table, success, warn, OutputFormat};
use crate::config::{self, loader::CONFIG_FILENAME, Config};
use crate::gate::{denial_notice, Decision, Gate};

/// Initialize a new carehub.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", CONFIG_FILENAME));
        return Ok(());
    }

    fs::write(config_path, config::loader::default_config_content())?;

    success(&format!("Created {}", CONFIG_FILENAME));
    info("Run 'carehub serve' for a local authentication server, then 'carehub login'");

    Ok(())
}

/// Sign in and persist the session
pub async fn login(username: Option<String>, password: Option<String>) -> Result<()> {
    let config = config::load_config_or_default()?;
    let manager = session_manager(&config).await?;

    let username = match username {
        Some(username) => username,
        None => Input::<String>::new().with_prompt("Username").interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };

    match manager.login(&username, &password).await {
        Ok(identity) => {
            success(&format!("Signed in as {} ({})", identity.name, identity.role));
            Ok(())
        }
        Err(e) => {
            error(&format!("Login failed: {}", e));
            Err(e.into())
        }
    }
}

/// Sign out
pub async fn logout() -> Result<()> {
    let config = config::load_config_or_default()?;
    let manager = session_manager(&config).await?;

    let was_signed_in = manager.is_authenticated().await;
    manager.logout().await;

    if was_signed_in {
        success("Signed out");
    } else {
        info("Not signed in");
    }
    Ok(())
}

/// Show the signed-in user
pub async fn whoami(format: OutputFormat) -> Result<()> {
    let config = config::load_config_or_default()?;
    let manager = session_manager(&config).await?;

    let Some(identity) = manager.current_identity().await else {
        info("Not signed in. Run 'carehub login'");
        return Ok(());
    };

    match format {
        OutputFormat::Table => print_identity(&identity),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&identity)?),
    }
    Ok(())
}

/// Decide access to a path
pub async fn check(path: &str, author: Option<u64>) -> Result<()> {
    let config = config::load_config_or_default()?;
    let gate = Gate::new(session_manager(&config).await?, config.route_table()?);

    let decision = match author {
        Some(author_id) => gate.check_blog_edit(path, author_id).await,
        None => gate.check_settled(path).await,
    };
    println!("{} {}", path, format_decision(&decision));

    if let Decision::RedirectTo(target) = &decision {
        if target.starts_with("/blogs/") {
            warn("You can only edit your own blogs");
        } else {
            let identity = gate.manager().current_identity().await;
            info(&denial_notice(identity.as_ref()));
        }
    }
    Ok(())
}

/// List routes with the decision for the signed-in user
pub async fn routes() -> Result<()> {
    let config = config::load_config_or_default()?;
    let manager = session_manager(&config).await?;
    let table = config.route_table()?;

    print_route_table(&table, &manager.state().await);
    Ok(())
}

/// Start the local authentication server
pub async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = config::load_config_or_default()?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting authentication server on {}:{}", host, port));
    api::run_server(config.server, &host, port).await?;
    Ok(())
}

/// Session manager over the configured store and endpoint, already restored
async fn session_manager(config: &Config) -> Result<SessionManager> {
    let store = Arc::new(FileSessionStore::new(&config.session.dir));
    let authenticator = Arc::new(HttpAuthenticator::new(
        &config.auth.endpoint,
        config.auth.timeout(),
    )?);

    let manager = SessionManager::new(store, authenticator).with_login_timeout(config.auth.timeout());
    manager.restore().await;
    Ok(manager)
}
