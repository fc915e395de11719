//! Todo Core
//!
//! Client-side session tracking and task-list synchronization for a
//! Supabase-backed todo app. Platform neutral: the same code runs in the
//! browser (wasm32) and in native tests.
//!
//! Layered like the frontend expects:
//! - domain: entities, sessions and errors
//! - repository: identity / row-store abstractions and their backends
//! - session_manager / todo_list: the two view-models the UI binds to

pub mod config;
pub mod domain;
pub mod repository;
pub mod session_manager;
pub mod todo_list;

pub use config::SupabaseConfig;
pub use domain::{
    AuthEvent, DomainError, DomainResult, NewTodo, Session, Todo, TodoId, TodoUpdate, User, UserId,
};
pub use repository::{
    auth_callback, AuthCallback, AuthListeners, IdentityService, SessionStore, Subscription,
    TodoRepository,
};
pub use session_manager::{AuthState, SessionManager};
pub use todo_list::{TodoList, TodoListState};
