//! Repository Layer
//!
//! Abstractions over the identity service and the `todos` row store, plus
//! the two implementations: Supabase over HTTP and an in-memory backend.

mod listeners;
mod memory;
pub mod supabase;
mod traits;


use std::sync::{Mutex, MutexGuard};

pub use listeners::{auth_callback, AuthCallback, AuthListeners, Subscription};
pub use memory::{MemoryIdentity, MemorySessionStore, MemoryTodoRepository, RepoOp};
pub use traits::{IdentityService, SessionStore, TodoRepository};

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
