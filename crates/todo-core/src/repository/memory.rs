//! In-Memory Backend
//!
//! Identity service, row store and session store that behave like the
//! remote ones (ids and timestamps assigned on insert, equality filters,
//! newest-first ordering) without any network. Failures can be injected
//! per operation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::listeners::{AuthCallback, AuthListeners, Subscription};
use super::lock;
use super::traits::{IdentityService, SessionStore, TodoRepository};
use crate::domain::{
    AuthEvent, DomainError, DomainResult, NewTodo, Session, Todo, TodoId, UserId,
};

/// First `created_at` handed out; each insert advances by one second
const EPOCH_SECS: i64 = 1_700_000_000;

// ========================
// Session Store
// ========================

#[derive(Default)]
pub struct MemorySessionStore {
    value: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<String> {
        lock(&self.value).clone()
    }

    fn save(&self, value: &str) -> DomainResult<()> {
        *lock(&self.value) = Some(value.to_string());
        Ok(())
    }

    fn remove(&self) {
        lock(&self.value).take();
    }
}

// ========================
// Identity
// ========================

/// Identity service whose sessions are set directly by the caller
#[derive(Default)]
pub struct MemoryIdentity {
    session: Mutex<Option<Session>>,
    listeners: AuthListeners,
    fail_get_session: AtomicBool,
    fail_sign_out: AtomicBool,
    sign_out_calls: AtomicUsize,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing session, as if restored from storage
    pub fn with_session(session: Session) -> Self {
        let identity = Self::default();
        *lock(&identity.session) = Some(session);
        identity
    }

    /// Store `session` and emit `SignedIn`
    pub fn sign_in(&self, session: Session) {
        *lock(&self.session) = Some(session.clone());
        self.listeners.emit(AuthEvent::SignedIn, Some(&session));
    }

    /// Emit `TokenRefreshed` with the current session
    pub fn refresh(&self) {
        let session = lock(&self.session).clone();
        self.listeners.emit(AuthEvent::TokenRefreshed, session.as_ref());
    }

    pub fn set_fail_get_session(&self, failing: bool) {
        self.fail_get_session.store(failing, Ordering::SeqCst);
    }

    pub fn set_fail_sign_out(&self, failing: bool) {
        self.fail_sign_out.store(failing, Ordering::SeqCst);
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[async_trait(?Send)]
impl IdentityService for MemoryIdentity {
    async fn get_session(&self) -> DomainResult<Option<Session>> {
        if self.fail_get_session.load(Ordering::SeqCst) {
            return Err(DomainError::Network("identity service unreachable".to_string()));
        }
        Ok(lock(&self.session).clone())
    }

    fn on_auth_state_change(&self, callback: AuthCallback) -> Subscription {
        self.listeners.subscribe(callback)
    }

    async fn sign_out(&self) -> DomainResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(DomainError::service(500, "sign out failed"));
        }
        lock(&self.session).take();
        self.listeners.emit(AuthEvent::SignedOut, None);
        Ok(())
    }
}

// ========================
// Row Store
// ========================

/// Operations of the row store, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepoOp {
    List,
    Insert,
    Update,
    Delete,
}

#[derive(Default)]
struct MemoryTable {
    rows: Vec<Todo>,
    next_id: TodoId,
    inserted: i64,
    calls: HashMap<RepoOp, usize>,
    failing: HashSet<RepoOp>,
}

impl MemoryTable {
    /// Count the call and fail it if injected
    fn begin(&mut self, op: RepoOp) -> DomainResult<()> {
        *self.calls.entry(op).or_default() += 1;
        if self.failing.contains(&op) {
            return Err(DomainError::Network(format!("{:?} failed", op)));
        }
        Ok(())
    }

    fn push(&mut self, task: &str, user_id: &UserId) -> TodoId {
        self.next_id += 1;
        let created_at = DateTime::<Utc>::from_timestamp(EPOCH_SECS + self.inserted, 0);
        self.inserted += 1;
        self.rows.push(Todo {
            id: self.next_id,
            task: task.to_string(),
            is_complete: false,
            user_id: user_id.clone(),
            created_at,
        });
        self.next_id
    }
}

/// `todos` table kept in memory
#[derive(Default)]
pub struct MemoryTodoRepository {
    table: Mutex<MemoryTable>,
}

impl MemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly, bypassing call counting and failure injection
    pub fn seed(&self, task: &str, user_id: &UserId) -> TodoId {
        lock(&self.table).push(task, user_id)
    }

    /// Make every subsequent `op` fail (or succeed again)
    pub fn set_failing(&self, op: RepoOp, failing: bool) {
        let mut table = lock(&self.table);
        if failing {
            table.failing.insert(op);
        } else {
            table.failing.remove(&op);
        }
    }

    /// Number of requests issued for `op`, failed ones included
    pub fn calls(&self, op: RepoOp) -> usize {
        lock(&self.table).calls.get(&op).copied().unwrap_or(0)
    }

    /// Every row regardless of owner
    pub fn rows(&self) -> Vec<Todo> {
        lock(&self.table).rows.clone()
    }
}

#[async_trait(?Send)]
impl TodoRepository for MemoryTodoRepository {
    async fn list_for_user(&self, user_id: &UserId) -> DomainResult<Vec<Todo>> {
        let mut table = lock(&self.table);
        table.begin(RepoOp::List)?;
        let mut todos: Vec<Todo> = table
            .rows
            .iter()
            .filter(|todo| &todo.user_id == user_id)
            .cloned()
            .collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(todos)
    }

    async fn insert(&self, todo: &NewTodo) -> DomainResult<()> {
        let mut table = lock(&self.table);
        table.begin(RepoOp::Insert)?;
        table.push(&todo.task, &todo.user_id);
        Ok(())
    }

    async fn set_complete(&self, id: TodoId, is_complete: bool) -> DomainResult<()> {
        let mut table = lock(&self.table);
        table.begin(RepoOp::Update)?;
        // Like an update filtered by equality: zero matching rows is not an error
        if let Some(todo) = table.rows.iter_mut().find(|todo| todo.id == id) {
            todo.is_complete = is_complete;
        }
        Ok(())
    }

    async fn delete(&self, id: TodoId) -> DomainResult<()> {
        let mut table = lock(&self.table);
        table.begin(RepoOp::Delete)?;
        table.rows.retain(|todo| todo.id != id);
        Ok(())
    }
}
