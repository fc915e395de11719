//! Task List View-Model
//!
//! Holds the signed-in user's tasks and the new-task draft. Every mutation
//! is sent to the row store and followed by a full re-fetch; the local list
//! is never patched optimistically. Failures are logged and leave the local
//! state as it was.

use std::sync::{Arc, Mutex};

use crate::domain::{NewTodo, Todo, TodoId, UserId};
use crate::repository::{lock, IdentityService, TodoRepository};

/// What the list view renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoListState {
    /// Result of the last successful fetch, newest first
    pub todos: Vec<Todo>,
    /// Contents of the new-task input
    pub draft: String,
}

type Observer = Arc<dyn Fn(&TodoListState) + Send + Sync>;

pub struct TodoList {
    repo: Arc<dyn TodoRepository>,
    identity: Arc<dyn IdentityService>,
    user_id: UserId,
    state: Mutex<TodoListState>,
    observer: Mutex<Option<Observer>>,
}

impl TodoList {
    pub fn new(
        repo: Arc<dyn TodoRepository>,
        identity: Arc<dyn IdentityService>,
        user_id: UserId,
    ) -> Self {
        Self {
            repo,
            identity,
            user_id,
            state: Mutex::new(TodoListState::default()),
            observer: Mutex::new(None),
        }
    }

    /// Run `observer` after every state change
    pub fn with_observer(self, observer: impl Fn(&TodoListState) + Send + Sync + 'static) -> Self {
        let observer: Observer = Arc::new(observer);
        *lock(&self.observer) = Some(observer);
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn state(&self) -> TodoListState {
        lock(&self.state).clone()
    }

    pub fn todos(&self) -> Vec<Todo> {
        lock(&self.state).todos.clone()
    }

    pub fn draft(&self) -> String {
        lock(&self.state).draft.clone()
    }

    pub fn set_draft(&self, draft: impl Into<String>) {
        let draft = draft.into();
        self.update(|state| state.draft = draft);
    }

    /// Replace the list with the user's tasks, newest first
    pub async fn fetch_all(&self) {
        match self.repo.list_for_user(&self.user_id).await {
            Ok(todos) => {
                tracing::debug!(count = todos.len(), "todos fetched");
                self.update(|state| state.todos = todos);
            }
            Err(err) => tracing::error!(error = %err, "failed to fetch todos"),
        }
    }

    /// Insert a task; blank descriptions are ignored
    pub async fn add(&self, description: &str) {
        if description.trim().is_empty() {
            return;
        }
        let todo = NewTodo::new(description, self.user_id.clone());
        match self.repo.insert(&todo).await {
            Ok(()) => {
                self.update(|state| state.draft.clear());
                self.fetch_all().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to add todo"),
        }
    }

    /// Flip the completion flag from `is_complete`
    pub async fn toggle_complete(&self, id: TodoId, is_complete: bool) {
        match self.repo.set_complete(id, !is_complete).await {
            Ok(()) => self.fetch_all().await,
            Err(err) => tracing::error!(error = %err, todo_id = id, "failed to update todo"),
        }
    }

    pub async fn delete(&self, id: TodoId) {
        match self.repo.delete(id).await {
            Ok(()) => self.fetch_all().await,
            Err(err) => tracing::error!(error = %err, todo_id = id, "failed to delete todo"),
        }
    }

    /// End the session; the session manager picks up the sign-out event
    pub async fn logout(&self) {
        if let Err(err) = self.identity.sign_out().await {
            tracing::error!(error = %err, "failed to log out");
        }
    }

    /// Stop notifying the view. In-flight requests still complete.
    pub fn detach(&self) {
        lock(&self.observer).take();
    }

    fn update(&self, apply: impl FnOnce(&mut TodoListState)) {
        let snapshot = {
            let mut state = lock(&self.state);
            apply(&mut state);
            state.clone()
        };
        let observer = lock(&self.observer).clone();
        if let Some(observer) = observer {
            observer(&snapshot);
        }
    }
}
