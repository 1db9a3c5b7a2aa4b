//! Signed-in user sessions.
//!
//! A session is created at sign-in and dropped at sign-out or when it
//! expires. It is passed explicitly to everything that needs it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a session cannot be started.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session lifetime must be at least 1 minute, got {minutes}")]
    NonPositiveTtl { minutes: i64 },

    #[error("Session lifetime of {minutes} minutes is out of range")]
    TtlOutOfRange { minutes: i64 },
}

/// Expiry time of a session started at `now` that lasts `ttl_minutes`.
pub fn expiry(now: DateTime<Utc>, ttl_minutes: i64) -> Result<DateTime<Utc>, SessionError> {
    if ttl_minutes <= 0 {
        return Err(SessionError::NonPositiveTtl {
            minutes: ttl_minutes,
        });
    }

    Duration::try_minutes(ttl_minutes)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or(SessionError::TtlOutOfRange {
            minutes: ttl_minutes,
        })
}

/// Account category. Employees and customers are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserClass {
    #[default]
    Employee,
    Customer,
}

impl fmt::Display for UserClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserClass::Employee => write!(f, "employee"),
            UserClass::Customer => write!(f, "customer"),
        }
    }
}

/// Permission roles held by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Viewer,
    Agent,
    Manager,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Viewer => write!(f, "viewer"),
            Role::Agent => write!(f, "agent"),
            Role::Manager => write!(f, "manager"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "agent" => Ok(Role::Agent),
            "manager" => Ok(Role::Manager),
            "admin" | "administrator" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.to_string()
    }
}

/// An authenticated user session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub user_class: UserClass,
    pub roles: Vec<Role>,
    /// Bearer token sent with API requests.
    pub token: Option<String>,
    pub signed_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Start a session that is valid for `ttl_minutes` from `now`.
    pub fn sign_in(
        username: impl Into<String>,
        user_class: UserClass,
        roles: Vec<Role>,
        token: Option<String>,
        now: DateTime<Utc>,
        ttl_minutes: i64,
    ) -> Result<Self, SessionError> {
        let expires_at = expiry(now, ttl_minutes)?;

        let mut roles = roles;
        roles.sort();
        roles.dedup();

        Ok(Self {
            username: username.into(),
            user_class,
            roles,
            token,
            signed_in_at: now,
            expires_at,
        })
    }

    /// End the session. The token is dropped with it.
    pub fn sign_out(self) {
        let held = Utc::now() - self.signed_in_at;
        tracing::debug!(
            "Signed out {} after {}s",
            self.username,
            held.num_seconds()
        );
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_employee(&self) -> bool {
        self.user_class == UserClass::Employee
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns true if the user holds at least one of `roles`.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }
}
