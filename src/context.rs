//! Application Context
//!
//! The initialized-once Supabase handle, provided via Leptos Context API.

use std::sync::Arc;

use leptos::prelude::*;
use todo_core::repository::supabase::{SupabaseAuth, SupabaseClient};
use todo_core::{IdentityService, TodoRepository};

/// Backend handles shared by every component
#[derive(Clone)]
pub struct AppContext {
    client: SupabaseClient,
}

impl AppContext {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Email/password and OAuth entry points
    pub fn auth(&self) -> Arc<SupabaseAuth> {
        Arc::clone(self.client.auth())
    }

    pub fn identity(&self) -> Arc<dyn IdentityService> {
        self.client.identity()
    }

    pub fn todos(&self) -> Arc<dyn TodoRepository> {
        self.client.todos()
    }
}

/// Get the app context
pub fn use_app_context() -> AppContext {
    expect_context::<AppContext>()
}
