//! Todo List View Component
//!
//! Binds a [`TodoList`] for the signed-in user to the store and renders it.

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use todo_core::{Todo, TodoList, TodoListState, UserId};

use super::{NewTodoForm, TodoRow};
use crate::context::use_app_context;
use crate::store::{store_sync_list, use_app_store, AppStateStoreFields};

#[component]
pub fn TodoListView(user_id: UserId, email: Option<String>) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();

    let list = Arc::new(
        TodoList::new(ctx.todos(), ctx.identity(), user_id)
            .with_observer(move |state: &TodoListState| store_sync_list(&store, state)),
    );
    // Drop whatever a previous user left in the store
    store_sync_list(&store, &list.state());

    // Load todos on mount
    {
        let list = Arc::clone(&list);
        Effect::new(move |_| {
            let list = Arc::clone(&list);
            spawn_local(async move { list.fetch_all().await });
        });
    }

    {
        let list = Arc::clone(&list);
        on_cleanup(move || list.detach());
    }

    let logout_list = Arc::clone(&list);
    let on_logout = move |_| {
        let list = Arc::clone(&logout_list);
        spawn_local(async move { list.logout().await });
    };

    let row_list = Arc::clone(&list);

    view! {
        <section class="todo-card">
            <header class="todo-header">
                <h1>"Todo List"</h1>
                <div class="account">
                    <span class="account-email">{email}</span>
                    <button class="logout-btn" on:click=on_logout>"Logout"</button>
                </div>
            </header>

            <NewTodoForm list=Arc::clone(&list) />

            <ul class="todo-items">
                <For
                    each=move || store.todos().get()
                    // Rows are immutable: re-render when a refetch changes them
                    key=|todo: &Todo| (todo.id, todo.is_complete, todo.task.clone())
                    children=move |todo: Todo| {
                        view! { <TodoRow todo=todo list=Arc::clone(&row_list) /> }
                    }
                />
            </ul>
            <Show when=move || store.todos().with(|todos| todos.is_empty())>
                <p class="empty-state">"Nothing to do yet."</p>
            </Show>
        </section>
    }
}
