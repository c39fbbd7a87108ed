//! Browser session handling for the OAuth2 authorization-code flow.
//!
//! Session lifecycle: `Anonymous -> LoginPending -> Authenticated`, back to
//! `Anonymous` on any authentication failure or logout.

pub mod authorization;
pub mod controller;
pub mod store;

pub use authorization::AuthorizationRequest;
pub use controller::{RedirectOutcome, RedirectParams, SessionController};
pub use store::{MemorySessionStore, SessionStore};

use serde::Serialize;
use std::fmt;

/// Session key for the single-use CSRF state of a pending login.
pub const OAUTH_STATE_KEY: &str = "oauth_state";
/// Session key for the access token of an authenticated session.
pub const ACCESS_TOKEN_KEY: &str = "jd_access_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Anonymous,
    LoginPending,
    Authenticated,
}

/// Point-in-time copy of the session values.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub access_token: Option<String>,
    pub oauth_state: Option<String>,
}

impl SessionSnapshot {
    pub fn auth_state(&self) -> AuthState {
        if self.access_token.is_some() {
            AuthState::Authenticated
        } else if self.oauth_state.is_some() {
            AuthState::LoginPending
        } else {
            AuthState::Anonymous
        }
    }
}

impl fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("oauth_state", &self.oauth_state.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_wins_over_pending_state() {
        let snapshot = SessionSnapshot {
            access_token: Some("tok".to_string()),
            oauth_state: Some("state".to_string()),
        };
        assert_eq!(snapshot.auth_state(), AuthState::Authenticated);
    }

    #[test]
    fn empty_session_is_anonymous() {
        assert_eq!(SessionSnapshot::default().auth_state(), AuthState::Anonymous);
    }

    #[test]
    fn debug_output_hides_values() {
        let snapshot = SessionSnapshot {
            access_token: Some("tok123".to_string()),
            oauth_state: None,
        };
        assert!(!format!("{snapshot:?}").contains("tok123"));
    }
}
