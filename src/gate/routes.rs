//! Route table: URL path patterns and the policy guarding each

use std::collections::HashMap;

use crate::auth::models::Role;
use crate::config::RouteConfig;
use crate::error::{Error, Result};
use crate::gate::policy::AccessPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A path pattern such as `/blogs/edit/:blogId`
#[derive(Debug, Clone)]
pub struct Route {
    pattern: String,
    segments: Vec<Segment>,
    policy: Option<AccessPolicy>,
}

impl Route {
    pub fn new(pattern: &str, policy: Option<AccessPolicy>) -> Result<Self> {
        if !pattern.starts_with('/') {
            return Err(Error::Config(format!(
                "Route pattern must start with '/': {}",
                pattern
            )));
        }

        let segments = split_path(pattern)
            .map(|segment| match segment.strip_prefix(':') {
                Some("") => Err(Error::Config(format!(
                    "Empty parameter name in route: {}",
                    pattern
                ))),
                Some(name) => Ok(Segment::Param(name.to_string())),
                None => Ok(Segment::Literal(segment.to_string())),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            policy,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// `None` for public routes
    pub fn policy(&self) -> Option<&AccessPolicy> {
        self.policy.as_ref()
    }

    fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    fn capture(&self, parts: &[&str]) -> Option<HashMap<String, String>> {
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

/// A resolved route with its captured path parameters
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: HashMap<String, String>,
}

impl RouteMatch<'_> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Ordered set of routes
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a public route
    pub fn public(self, pattern: &str) -> Result<Self> {
        self.add(pattern, None)
    }

    /// Add a protected route
    pub fn protect(self, pattern: &str, policy: AccessPolicy) -> Result<Self> {
        self.add(pattern, Some(policy))
    }

    pub fn add(mut self, pattern: &str, policy: Option<AccessPolicy>) -> Result<Self> {
        if self.routes.iter().any(|r| r.pattern == pattern) {
            return Err(Error::Config(format!("Duplicate route: {}", pattern)));
        }
        self.routes.push(Route::new(pattern, policy)?);
        Ok(self)
    }

    /// The CareHub client's routes
    pub fn carehub() -> Self {
        use Role::*;

        let staff = [Admin, Superadmin, Doctor, Nurse, Intern];
        let authors = [Admin, Superadmin, Doctor];
        let analysts = [Admin, Doctor, Superadmin];
        let administrators = [Admin, Superadmin];

        let public = [
            "/",
            "/login",
            "/unauthorized",
            "/doctors",
            "/doctors/:doctorId",
            "/blogs",
            "/blogs/:blogId",
        ];
        let protected = [
            ("/dashboard", AccessPolicy::authenticated()),
            ("/appointments", AccessPolicy::authenticated()),
            ("/patients", AccessPolicy::roles(staff)),
            ("/blogs/new", AccessPolicy::roles(authors)),
            ("/blogs/edit/:blogId", AccessPolicy::roles(authors)),
            ("/analytics", AccessPolicy::roles(analysts)),
            ("/users", AccessPolicy::roles(administrators)),
            ("/settings", AccessPolicy::roles(administrators)),
        ];

        // Static patterns; a failure here is a bug in this table
        let routes = public
            .into_iter()
            .map(|pattern| (pattern, None))
            .chain(protected.into_iter().map(|(pattern, policy)| (pattern, Some(policy))))
            .map(|(pattern, policy)| Route::new(pattern, policy).expect("valid built-in route"))
            .collect();
        Self { routes }
    }

    /// Build a table from configured routes
    pub fn from_config(entries: &[RouteConfig]) -> Result<Self> {
        entries.iter().try_fold(Self::new(), |table, entry| {
            table.add(&entry.path, entry.policy())
        })
    }

    /// Find the route for `path`. Literal segments outrank parameters, so
    /// `/blogs/new` wins over `/blogs/:blogId`; ties go to the earlier route.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
        let parts: Vec<&str> = split_path(path).collect();

        let mut best: Option<RouteMatch<'_>> = None;
        for route in &self.routes {
            let Some(params) = route.capture(&parts) else {
                continue;
            };
            let better = best
                .as_ref()
                .map(|current| route.literal_count() > current.route.literal_count())
                .unwrap_or(true);
            if better {
                best = Some(RouteMatch { route, params });
            }
        }
        best
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
