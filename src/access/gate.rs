//! Route access rules.
//!
//! Every console view is a [`Route`] with a [`RouteRequirement`]. Access is
//! decided once per render by [`evaluate`].

use super::session::{Role, Session};
use chrono::{DateTime, Utc};
use std::fmt;

/// Views of the Customer Care console.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Profile,
    Dashboard,
    Tables,
    Table(String),
    Site(String),
    Tariffs,
    Reports,
}

/// What a user needs to open a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    /// Only employees may open the route.
    pub employee_only: bool,
    /// The user needs at least one of these roles. Empty means any role.
    pub required_roles: Vec<Role>,
}

/// Outcome of checking a session against a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    /// Not signed in, or the session expired.
    RedirectToLogin,
    /// Signed in as the wrong user class for an employee-only route.
    RedirectToProfile,
    /// Signed in but missing a role; shown inline instead of redirecting.
    Denied { message: String },
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }
}

impl Route {
    /// Navigation path of the view.
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Tables => "/tables".to_string(),
            Route::Table(name) => format!("/tables/{}", name),
            Route::Site(code) => format!("/sites/{}", code),
            Route::Tariffs => "/tariffs".to_string(),
            Route::Reports => "/reports".to_string(),
        }
    }

    pub fn requirement(&self) -> RouteRequirement {
        match self {
            Route::Login | Route::Profile => RouteRequirement::default(),
            Route::Dashboard | Route::Tables | Route::Table(_) | Route::Site(_) => {
                RouteRequirement {
                    employee_only: true,
                    required_roles: Vec::new(),
                }
            }
            Route::Tariffs => RouteRequirement {
                employee_only: true,
                required_roles: vec![Role::Admin, Role::Manager],
            },
            Route::Reports => RouteRequirement {
                employee_only: true,
                required_roles: vec![Role::Admin, Role::Manager, Role::Agent],
            },
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Decide whether `session` may open a route with `requirement`.
pub fn evaluate(
    session: Option<&Session>,
    requirement: &RouteRequirement,
    now: DateTime<Utc>,
) -> AccessDecision {
    let session = match session {
        Some(s) if !s.is_expired(now) => s,
        _ => return AccessDecision::RedirectToLogin,
    };

    if requirement.employee_only && !session.is_employee() {
        return AccessDecision::RedirectToProfile;
    }

    if !requirement.required_roles.is_empty() && !session.has_any_role(&requirement.required_roles)
    {
        let needed: Vec<String> = requirement
            .required_roles
            .iter()
            .map(|r| r.to_string())
            .collect();
        return AccessDecision::Denied {
            message: format!(
                "Access denied: this page requires one of the following roles: {}",
                needed.join(", ")
            ),
        };
    }

    AccessDecision::Granted
}

impl Session {
    /// Returns true if this session may open `route` at `now`.
    pub fn can(&self, route: &Route, now: DateTime<Utc>) -> bool {
        evaluate(Some(self), &route.requirement(), now).is_granted()
    }
}
