//! Authentication and session management

pub mod client;
pub mod directory;
pub mod jwt;
pub mod models;
pub mod session;
pub mod store;

pub use client::{Authenticator, DirectoryAuthenticator, HttpAuthenticator};
pub use directory::UserDirectory;
pub use jwt::{create_token, is_token_expired, validate_token, Claims};
pub use models::{Identity, LoginRequest, LoginResponse, Role, RoleSet, Session, SignupRequest};
pub use session::{SessionManager, SessionState};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
