//! Sessions and Auth Events
//!
//! Shapes returned by the Supabase auth (GoTrue) endpoints.

use serde::{Deserialize, Serialize};

use super::todo::UserId;

/// Seconds before `expires_at` at which a session already counts as expired
pub const EXPIRY_MARGIN_SECS: i64 = 10;

/// Authenticated user as reported by the identity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }
}

/// Token bundle identifying an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds at issue time
    #[serde(default)]
    pub expires_in: i64,
    /// Unix timestamp (seconds) after which the access token is invalid
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Session for `user` that never expires; used by fakes and tests
    pub fn for_user(user: User) -> Self {
        Self {
            access_token: format!("token-{}", user.id),
            refresh_token: String::new(),
            token_type: default_token_type(),
            expires_in: 0,
            expires_at: None,
            user,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// Fill in `expires_at` from `expires_in` when the server omitted it
    pub fn with_expiry_from(mut self, now: i64) -> Self {
        if self.expires_at.is_none() && self.expires_in > 0 {
            self.expires_at = Some(now + self.expires_in);
        }
        self
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_within(now, EXPIRY_MARGIN_SECS)
    }

    pub fn expires_within(&self, now: i64, window_secs: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - window_secs <= now,
            None => false,
        }
    }
}

/// Auth state change notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

impl AuthEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthEvent::SignedIn => "SIGNED_IN",
            AuthEvent::SignedOut => "SIGNED_OUT",
            AuthEvent::TokenRefreshed => "TOKEN_REFRESHED",
        }
    }
}
