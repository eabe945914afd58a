//! Access policies attached to protected resources

use serde::{Deserialize, Serialize};

use crate::auth::models::RoleSet;

/// Where authenticated users without a permitted role are sent by default
pub const DEFAULT_DENIAL_PATH: &str = "/unauthorized";

/// Where anonymous users are sent
pub const LOGIN_PATH: &str = "/login";

/// Who may view a protected resource.
///
/// An empty role list admits any authenticated identity. A resource without
/// a policy is public, which is expressed as `Option::<AccessPolicy>::None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(default)]
    pub allowed_roles: RoleSet,

    #[serde(default)]
    pub redirect_path: Option<String>,

    #[serde(default = "default_require_auth")]
    pub require_auth: bool,
}

fn default_require_auth() -> bool {
    true
}

impl AccessPolicy {
    /// Any authenticated identity
    pub fn authenticated() -> Self {
        Self {
            allowed_roles: RoleSet::empty(),
            redirect_path: None,
            require_auth: true,
        }
    }

    /// Authenticated identities holding one of `roles`
    pub fn roles(roles: impl Into<RoleSet>) -> Self {
        Self {
            allowed_roles: roles.into(),
            ..Self::authenticated()
        }
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_path = Some(path.into());
        self
    }

    pub fn without_auth(mut self) -> Self {
        self.require_auth = false;
        self
    }

    /// Redirect target for authenticated-but-unauthorized access
    pub fn denial_path(&self) -> &str {
        self.redirect_path.as_deref().unwrap_or(DEFAULT_DENIAL_PATH)
    }
}
