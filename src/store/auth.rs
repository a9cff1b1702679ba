// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Answers who, if anyone, is signed in
pub trait AuthProvider: Send + Sync {
    fn identity(&self) -> Option<Identity>;
}

/// A shared reference to an auth provider
pub type SharedAuth = Arc<dyn AuthProvider>;

/// A fixed identity, configured once at startup
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    identity: Option<Identity>,
}

impl StaticAuth {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            identity: Some(Identity::new(user_id)),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Signed in when `user_id` is present and not blank
    pub fn from_user(user_id: Option<&str>) -> Self {
        match user_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Self::signed_in(id),
            None => Self::signed_out(),
        }
    }

    pub fn shared(self) -> SharedAuth {
        Arc::new(self)
    }
}

impl AuthProvider for StaticAuth {
    fn identity(&self) -> Option<Identity> {
        self.identity.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_user_is_signed_out() {
        assert!(StaticAuth::from_user(Some("  ")).identity().is_none());
        assert!(StaticAuth::from_user(None).identity().is_none());
    }

    #[test]
    fn user_is_trimmed() {
        let auth = StaticAuth::from_user(Some(" alice "));
        assert_eq!(auth.identity(), Some(Identity::new("alice")));
    }
}
