//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity. The view-models
//! in `todo-core` own the state; their observers mirror it here.

use leptos::prelude::*;
use reactive_stores::Store;
use todo_core::{AuthState, Todo, TodoListState};

/// Global application state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct AppState {
    /// Who is signed in, as reported by the session manager
    pub auth: AuthState,
    /// Last fetched tasks, newest first
    pub todos: Vec<Todo>,
    /// New-task input
    pub draft: String,
}

/// Type alias for the store
pub type AppStore = Store<AppState>;

/// Get the app store from context
pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

// ========================
// Store Helper Functions
// ========================

pub fn store_set_auth(store: &AppStore, auth: AuthState) {
    *store.auth().write() = auth;
}

/// Mirror the task list view-model
pub fn store_sync_list(store: &AppStore, list: &TodoListState) {
    if store.todos().with_untracked(|todos| *todos != list.todos) {
        *store.todos().write() = list.todos.clone();
    }
    if store.draft().get_untracked() != list.draft {
        *store.draft().write() = list.draft.clone();
    }
}
