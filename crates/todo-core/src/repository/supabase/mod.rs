//! Supabase Backend
//!
//! HTTP implementations of the repository traits:
//! - auth: GoTrue endpoints under `/auth/v1`
//! - rest: PostgREST query builder under `/rest/v1`
//! - todos: the `todos` table on top of the query builder

mod auth;
mod client;
mod response;
mod rest;
mod todos;

pub use auth::{OAuthProvider, SignUpOutcome, SupabaseAuth, AUTO_REFRESH_WINDOW_SECS};
pub use client::SupabaseClient;
pub use rest::{Query, Table};
pub use todos::{SupabaseTodoRepository, TODOS_TABLE};
