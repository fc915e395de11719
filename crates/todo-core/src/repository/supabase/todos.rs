//! `todos` table over PostgREST.

use async_trait::async_trait;

use super::client::SupabaseClient;
use crate::domain::{DomainResult, NewTodo, Todo, TodoId, TodoUpdate, UserId};
use crate::repository::TodoRepository;

pub const TODOS_TABLE: &str = "todos";

pub struct SupabaseTodoRepository {
    client: SupabaseClient,
}

impl SupabaseTodoRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait(?Send)]
impl TodoRepository for SupabaseTodoRepository {
    async fn list_for_user(&self, user_id: &UserId) -> DomainResult<Vec<Todo>> {
        self.client
            .from(TODOS_TABLE)
            .select("*")
            .eq("user_id", user_id)
            .order("created_at", false)
            .fetch()
            .await
    }

    async fn insert(&self, todo: &NewTodo) -> DomainResult<()> {
        self.client
            .from(TODOS_TABLE)
            .insert(std::slice::from_ref(todo))?
            .execute()
            .await
    }

    async fn set_complete(&self, id: TodoId, is_complete: bool) -> DomainResult<()> {
        self.client
            .from(TODOS_TABLE)
            .update(&TodoUpdate::completion(is_complete))?
            .eq("id", id)
            .execute()
            .await
    }

    async fn delete(&self, id: TodoId) -> DomainResult<()> {
        self.client.from(TODOS_TABLE).delete().eq("id", id).execute().await
    }
}
