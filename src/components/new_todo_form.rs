//! New Todo Form Component

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use todo_core::TodoList;

use crate::store::{use_app_store, AppStateStoreFields};

/// Input for adding a task; the draft lives in the list view-model
#[component]
pub fn NewTodoForm(list: Arc<TodoList>) -> impl IntoView {
    let store = use_app_store();

    let submit_list = Arc::clone(&list);
    let add_todo = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let list = Arc::clone(&submit_list);
        spawn_local(async move {
            let description = list.draft();
            list.add(&description).await;
        });
    };

    view! {
        <form class="new-todo-form" on:submit=add_todo>
            <input
                type="text"
                placeholder="What needs to be done?"
                prop:value=move || store.draft().get()
                on:input=move |ev| list.set_draft(event_target_value(&ev))
            />
            <button type="submit">"Add"</button>
        </form>
    }
}
