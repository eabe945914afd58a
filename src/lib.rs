//! CareHub - session and role-based access control
//!
//! This is the library interface for CareHub: a persisted session store, the
//! session manager that owns the signed-in identity, and the gate that decides
//! whether a route renders or redirects.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;

pub use auth::{Identity, Role, RoleSet, Session, SessionManager, SessionState};
pub use config::Config;
pub use error::Error;
pub use gate::{evaluate, AccessPolicy, Decision, Gate, RouteTable};
