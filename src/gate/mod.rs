//! Role-based authorization gate
//!
//! [`evaluate`] is a pure function of the session state and a resource's
//! policy. [`Gate`] couples it with a [`SessionManager`] and a [`RouteTable`]
//! so callers can ask about a URL path directly.

pub mod policy;
pub mod routes;

pub use policy::{AccessPolicy, DEFAULT_DENIAL_PATH, LOGIN_PATH};
pub use routes::{Route, RouteMatch, RouteTable};

use serde::Serialize;
use std::fmt;

use crate::auth::models::{Identity, Role};
use crate::auth::session::{SessionManager, SessionState};

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "path", rename_all = "snake_case")]
pub enum Decision {
    /// Session not restored yet; show a loading indicator
    Pending,
    Render,
    RedirectToLogin,
    /// Authenticated but not permitted
    RedirectTo(String),
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Pending => write!(f, "pending"),
            Decision::Render => write!(f, "render"),
            Decision::RedirectToLogin => write!(f, "redirect to {}", LOGIN_PATH),
            Decision::RedirectTo(path) => write!(f, "redirect to {}", path),
        }
    }
}

/// Decide access to a resource. First matching rule wins:
///
/// 1. still initializing: `Pending`
/// 2. no policy (public): `Render`
/// 3. authentication required but anonymous: `RedirectToLogin`
/// 4. non-empty role list without a matching role: `RedirectTo(denial path)`
/// 5. otherwise `Render`
pub fn evaluate(state: &SessionState, policy: Option<&AccessPolicy>) -> Decision {
    if state.is_initializing() {
        return Decision::Pending;
    }

    let Some(policy) = policy else {
        return Decision::Render;
    };

    if policy.require_auth && !state.is_authenticated() {
        return Decision::RedirectToLogin;
    }

    if !policy.allowed_roles.is_empty() && !state.has_role(&policy.allowed_roles) {
        return Decision::RedirectTo(policy.denial_path().to_string());
    }

    Decision::Render
}

/// Text of the access-denied page
pub fn denial_notice(identity: Option<&Identity>) -> String {
    let mut notice = String::from("Access Denied. Sorry, you don't have permission to access this page.");
    if let Some(identity) = identity {
        notice.push_str(&format!(" Your current role is: {}", identity.role));
    }
    notice
}

/// Route parameter naming the blog on blog pages
pub const BLOG_ID_PARAM: &str = "blogId";

/// Admins edit any blog; doctors only their own
pub fn can_edit_blog(identity: &Identity, author_id: u64) -> bool {
    match identity.role {
        Role::Admin | Role::Superadmin => true,
        Role::Doctor => identity.id == author_id,
        _ => false,
    }
}

/// Answers access questions for URL paths
#[derive(Clone)]
pub struct Gate {
    manager: SessionManager,
    routes: RouteTable,
}

impl Gate {
    pub fn new(manager: SessionManager, routes: RouteTable) -> Self {
        Self { manager, routes }
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide access to `path` against the current state.
    ///
    /// Paths with no route render; the router shows its own not-found page.
    pub async fn check(&self, path: &str) -> Decision {
        let state = self.manager.state().await;
        self.decide(&state, path)
    }

    /// Like [`check`](Self::check), but waits for session restore first so the
    /// answer is never `Pending`
    pub async fn check_settled(&self, path: &str) -> Decision {
        let state = self.manager.settled().await;
        self.decide(&state, path)
    }

    /// Decide access to a protected blog page for a post written by `author_id`.
    ///
    /// On top of the route's role check, a signed-in user who may not edit
    /// the post is sent to the post's public page instead.
    pub async fn check_blog_edit(&self, path: &str, author_id: u64) -> Decision {
        let state = self.manager.settled().await;
        let decision = self.decide(&state, path);
        if decision != Decision::Render {
            return decision;
        }

        let Some(identity) = state.identity() else {
            return decision;
        };
        let blog_id = self
            .routes
            .resolve(path)
            .filter(|matched| matched.route.policy().is_some())
            .and_then(|matched| matched.param(BLOG_ID_PARAM).map(str::to_string));

        match blog_id {
            Some(blog_id) if !can_edit_blog(identity, author_id) => {
                tracing::debug!("{} may not edit blog {} by {}", identity.name, blog_id, author_id);
                Decision::RedirectTo(format!("/blogs/{}", blog_id))
            }
            _ => decision,
        }
    }

    fn decide(&self, state: &SessionState, path: &str) -> Decision {
        let policy = self
            .routes
            .resolve(path)
            .and_then(|matched| matched.route.policy());
        let decision = evaluate(state, policy);
        tracing::debug!("{} -> {}", path, decision);
        decision
    }
}
