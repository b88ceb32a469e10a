//! Current-user seam over the hosted identity provider.
//!
//! Sign-in, sign-up and session handling live entirely in the provider.
//! Core only reads who is signed in, to stamp market ownership and to
//! greet the user.

use serde::{Deserialize, Serialize};

/// Fallback greeting name when the provider has no first name.
pub const DEFAULT_GREETING_NAME: &str = "there";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
}

impl CurrentUser {
    /// First name for greetings, or `there` when unknown or blank.
    pub fn greeting_name(&self) -> &str {
        self.first_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_GREETING_NAME)
    }
}

pub trait IdentityProvider {
    /// Returns the signed-in user, or `None` when signed out.
    fn current_user(&self) -> Option<CurrentUser>;
}

/// Provider that never has a signed-in user.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn current_user(&self) -> Option<CurrentUser> {
        None
    }
}

/// Provider with a fixed user, resolved once from configuration.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    user: CurrentUser,
}

impl StaticIdentity {
    pub fn new(user: CurrentUser) -> Self {
        Self { user }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<CurrentUser> {
        Some(self.user.clone())
    }
}

impl<I: IdentityProvider + ?Sized> IdentityProvider for Box<I> {
    fn current_user(&self) -> Option<CurrentUser> {
        (**self).current_user()
    }
}
