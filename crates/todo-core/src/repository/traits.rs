//! Repository Layer - Core Traits
//!
//! Contracts consumed by the view-models. Futures are not required to be
//! `Send`: everything runs on the single browser thread.

use async_trait::async_trait;

use super::listeners::{AuthCallback, Subscription};
use crate::domain::{DomainResult, NewTodo, Session, Todo, TodoId, UserId};

/// Hosted identity service
#[async_trait(?Send)]
pub trait IdentityService: Send + Sync {
    /// Current session, if any
    async fn get_session(&self) -> DomainResult<Option<Session>>;

    /// Register a listener for auth state changes.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped or unsubscribed.
    fn on_auth_state_change(&self, callback: AuthCallback) -> Subscription;

    /// Terminate the current session
    async fn sign_out(&self) -> DomainResult<()>;
}

/// The remote `todos` table
#[async_trait(?Send)]
pub trait TodoRepository: Send + Sync {
    /// All rows where `user_id` equals `user_id`, newest first
    async fn list_for_user(&self, user_id: &UserId) -> DomainResult<Vec<Todo>>;

    /// Insert one row
    async fn insert(&self, todo: &NewTodo) -> DomainResult<()>;

    /// Set `is_complete` on the row with `id`
    async fn set_complete(&self, id: TodoId, is_complete: bool) -> DomainResult<()>;

    /// Delete the row with `id`
    async fn delete(&self, id: TodoId) -> DomainResult<()>;
}

/// Persistence for the serialized session (browser localStorage, memory)
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, value: &str) -> DomainResult<()>;
    fn remove(&self);
}
