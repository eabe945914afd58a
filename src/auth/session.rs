//! Session management
//!
//! [`SessionManager`] is the single writer of the session state. Consumers get
//! snapshots through [`SessionManager::state`] or a [`watch`] receiver.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

use crate::auth::client::Authenticator;
use crate::auth::jwt::is_token_expired;
use crate::auth::models::{Identity, LoginRequest, RoleSet, Session};
use crate::auth::store::SessionStore;
use crate::error::{Error, Result};

/// Default time allowed for a login round-trip
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Authentication state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Persisted session not restored yet; no access decision can be made
    Initializing,
    Authenticated(Session),
    Anonymous,
}

impl SessionState {
    pub fn is_initializing(&self) -> bool {
        matches!(self, SessionState::Initializing)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(session) => Some(&session.identity),
            _ => None,
        }
    }

    /// True iff authenticated and the identity's role is in `roles`.
    /// An empty set matches nobody.
    pub fn has_role(&self, roles: &RoleSet) -> bool {
        self.identity()
            .map(|identity| roles.contains(identity.role))
            .unwrap_or(false)
    }
}

/// Owns the current session and keeps the session store in step with it
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    authenticator: Arc<dyn Authenticator>,
    state: Arc<RwLock<SessionState>>,
    changes: Arc<watch::Sender<SessionState>>,
    login_timeout: Duration,
}

impl SessionManager {
    /// Create a manager in the `Initializing` state. Call [`restore`](Self::restore)
    /// before making access decisions.
    pub fn new(store: Arc<dyn SessionStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        let (changes, _) = watch::channel(SessionState::Initializing);
        Self {
            store,
            authenticator,
            state: Arc::new(RwLock::new(SessionState::Initializing)),
            changes: Arc::new(changes),
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }

    /// Create a manager and restore any persisted session
    pub async fn restored(store: Arc<dyn SessionStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        let manager = Self::new(store, authenticator);
        manager.restore().await;
        manager
    }

    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    /// Settle out of `Initializing` using the persisted session, if any.
    ///
    /// Only the first call reads storage; later calls return the current state.
    pub async fn restore(&self) -> SessionState {
        let mut state = self.state.write().await;
        if !state.is_initializing() {
            return state.clone();
        }

        *state = match self.store.load() {
            Some(session) if is_token_expired(&session.token) => {
                tracing::info!("Stored session for {} has expired", session.identity.name);
                if let Err(e) = self.store.clear() {
                    tracing::warn!("Failed to clear expired session: {}", e);
                }
                SessionState::Anonymous
            }
            Some(session) => {
                tracing::info!(
                    "Restored session for {} ({})",
                    session.identity.name,
                    session.identity.role
                );
                SessionState::Authenticated(session)
            }
            None => {
                tracing::debug!("No stored session");
                SessionState::Anonymous
            }
        };

        self.publish(&state);
        state.clone()
    }

    /// Exchange credentials for a session.
    ///
    /// On failure the state and the store are left as they were. Overlapping
    /// logins commit in completion order, so the last one to finish wins.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity> {
        let credentials = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = tokio::time::timeout(
            self.login_timeout,
            self.authenticator.authenticate(&credentials),
        )
        .await
        .map_err(|_| Error::LoginTimeout(self.login_timeout))
        .and_then(|result| result)
        .and_then(Session::try_from);

        let session = match response {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Login failed for '{}': {}", username, e);
                return Err(e);
            }
        };

        let mut state = self.state.write().await;
        if let Err(e) = self.store.save(&session) {
            tracing::warn!("Failed to persist session for '{}': {}", username, e);
            self.rollback_store(&state);
            return Err(e);
        }

        let identity = session.identity.clone();
        *state = SessionState::Authenticated(session);
        self.publish(&state);

        tracing::info!("Logged in as {} ({})", identity.name, identity.role);
        Ok(identity)
    }

    /// End the session. Always succeeds, including when already anonymous.
    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear stored session: {}", e);
        }

        if let Some(identity) = state.identity() {
            tracing::info!("Logged out {}", identity.name);
        }
        *state = SessionState::Anonymous;
        self.publish(&state);
    }

    /// Log out if the current token has expired. Returns whether it had.
    pub async fn check_expiry(&self) -> bool {
        let expired = match &*self.state.read().await {
            SessionState::Authenticated(session) => is_token_expired(&session.token),
            _ => false,
        };
        if expired {
            tracing::info!("Session token expired");
            self.logout().await;
        }
        expired
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn current_identity(&self) -> Option<Identity> {
        self.state.read().await.identity().cloned()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_initializing()
    }

    pub async fn has_role(&self, roles: impl Into<RoleSet>) -> bool {
        self.state.read().await.has_role(&roles.into())
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.changes.subscribe()
    }

    /// Wait until the manager has left `Initializing`
    pub async fn settled(&self) -> SessionState {
        let mut changes = self.watch();
        let settled = changes
            .wait_for(|state| !state.is_initializing())
            .await
            .map(|state| state.clone());
        match settled {
            Ok(state) => state,
            // The sender lives as long as self, so this is unreachable in practice
            Err(_) => self.state().await,
        }
    }

    fn publish(&self, state: &SessionState) {
        self.changes.send_replace(state.clone());
    }

    /// Put the store back in line with `state` after a failed save
    fn rollback_store(&self, state: &SessionState) {
        let result = match state {
            SessionState::Authenticated(previous) => self.store.save(previous),
            _ => self.store.clear(),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to restore stored session: {}", e);
        }
    }
}
