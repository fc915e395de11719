//! Session Manager
//!
//! Tracks who is signed in. Asks the identity service for an existing
//! session once, and follows every auth state change after that.
//!
//! ```text
//! Unknown --initial session--> Authenticated(user) | Unauthenticated
//! any     --auth event-------> Authenticated(user) | Unauthenticated
//! ```

use std::sync::{Arc, Mutex};

use crate::domain::{Session, User, UserId};
use crate::repository::{auth_callback, lock, IdentityService, Subscription};

/// Identity as seen by the UI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// The initial session request has not resolved yet
    #[default]
    Unknown,
    Authenticated(User),
    Unauthenticated,
}

impl AuthState {
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(session) => AuthState::Authenticated(session.user.clone()),
            None => AuthState::Unauthenticated,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user().map(|user| &user.id)
    }
}

type Observer = Arc<dyn Fn(&AuthState) + Send + Sync>;

struct Shared {
    state: Mutex<AuthState>,
    observer: Mutex<Option<Observer>>,
}

impl Shared {
    /// Store `next` and notify, optionally only while still `Unknown`
    fn transition(&self, next: AuthState, only_if_unknown: bool) {
        {
            let mut state = lock(&self.state);
            if only_if_unknown && *state != AuthState::Unknown {
                return;
            }
            if *state == next {
                return;
            }
            *state = next.clone();
        }
        tracing::debug!(user = ?next.user_id(), "auth state changed");
        let observer = lock(&self.observer).clone();
        if let Some(observer) = observer {
            observer(&next);
        }
    }
}

pub struct SessionManager {
    identity: Arc<dyn IdentityService>,
    shared: Arc<Shared>,
    subscription: Mutex<Option<Subscription>>,
}

impl SessionManager {
    /// Start listening for auth state changes.
    ///
    /// `observer` runs after every state change until [`shutdown`] is
    /// called or the manager is dropped. Call [`resolve_initial`] to ask
    /// for an existing session.
    ///
    /// [`shutdown`]: SessionManager::shutdown
    /// [`resolve_initial`]: SessionManager::resolve_initial
    pub fn new(
        identity: Arc<dyn IdentityService>,
        observer: impl Fn(&AuthState) + Send + Sync + 'static,
    ) -> Self {
        let observer: Observer = Arc::new(observer);
        let shared = Arc::new(Shared {
            state: Mutex::new(AuthState::Unknown),
            observer: Mutex::new(Some(observer)),
        });

        let listener = Arc::clone(&shared);
        let subscription = identity.on_auth_state_change(auth_callback(move |event, session| {
            tracing::info!(event = event.as_str(), "auth state change");
            listener.transition(AuthState::from_session(session), false);
        }));

        Self {
            identity,
            shared,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// Request the current session.
    ///
    /// A failure is logged and leaves the identity absent. An auth event that
    /// arrived while the request was in flight is newer and is kept.
    pub async fn resolve_initial(&self) {
        let next = match self.identity.get_session().await {
            Ok(session) => AuthState::from_session(session.as_ref()),
            Err(err) => {
                tracing::error!(error = %err, "failed to fetch current session");
                AuthState::Unauthenticated
            }
        };
        if !self.is_active() {
            return;
        }
        self.shared.transition(next, true);
    }

    pub fn state(&self) -> AuthState {
        lock(&self.shared.state).clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state().user().cloned()
    }

    /// Release the auth subscription and stop notifying the observer
    pub fn shutdown(&self) {
        lock(&self.shared.observer).take();
        if lock(&self.subscription).take().is_some() {
            tracing::debug!("auth subscription released");
        }
    }

    /// Whether the subscription is still held
    pub fn is_active(&self) -> bool {
        lock(&self.subscription).is_some()
    }
}
