//! CLI interface for CareHub

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "carehub")]
#[command(version)]
#[command(about = "Session and role-based access control for CareHub", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new carehub.toml configuration file
    Init,

    /// Sign in and persist the session
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,

        /// Password (prompted when omitted)
        #[arg(short, long, env = "CAREHUB_PASSWORD")]
        password: Option<String>,
    },

    /// Sign out and clear the persisted session
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Decide access to a path for the signed-in user
    Check {
        /// URL path, e.g. /patients
        path: String,

        /// Author id of the blog post at this path, to apply the edit ownership rule
        #[arg(long)]
        author: Option<u64>,
    },

    /// List routes and what the signed-in user may open
    Routes,

    /// Start the local authentication server
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
