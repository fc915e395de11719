//! Supabase Client
//!
//! The initialized-once handle both view-models receive. Clones share the
//! HTTP client, the auth session and its listeners.

use std::sync::Arc;

use super::auth::SupabaseAuth;
use super::rest::Table;
use super::todos::SupabaseTodoRepository;
use crate::config::SupabaseConfig;
use crate::repository::{IdentityService, SessionStore, TodoRepository};

#[derive(Clone)]
pub struct SupabaseClient {
    config: Arc<SupabaseConfig>,
    http: reqwest::Client,
    auth: Arc<SupabaseAuth>,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig, store: Arc<dyn SessionStore>) -> Self {
        let config = Arc::new(config);
        let http = reqwest::Client::new();
        let auth = Arc::new(SupabaseAuth::new(http.clone(), Arc::clone(&config), store));
        Self { config, http, auth }
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    pub fn auth(&self) -> &Arc<SupabaseAuth> {
        &self.auth
    }

    /// The auth client as an [`IdentityService`]
    pub fn identity(&self) -> Arc<dyn IdentityService> {
        self.auth.clone()
    }

    /// Handle to a PostgREST table
    pub fn from(&self, table: &str) -> Table {
        Table::new(self.clone(), table)
    }

    /// The `todos` table as a [`TodoRepository`]
    pub fn todos(&self) -> Arc<dyn TodoRepository> {
        Arc::new(SupabaseTodoRepository::new(self.clone()))
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
