//! Newtype wrappers for type safety

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Route the app is sent to when authentication cannot be recovered
pub const DEFAULT_LOGIN_ROUTE: &str = "SocialLogin";

/// Name of a navigation route
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteName(String);

impl RouteName {
    /// Create a new route name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the route name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The login route (`SocialLogin`)
    #[must_use]
    pub fn login() -> Self {
        Self(DEFAULT_LOGIN_ROUTE.to_string())
    }
}

impl Default for RouteName {
    fn default() -> Self {
        Self::login()
    }
}

impl std::fmt::Display for RouteName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RouteName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for RouteName {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<str> for RouteName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for RouteName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RouteName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
