//! Todo Row Component
//!
//! One task: completion checkbox, text and delete button.

use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use todo_core::{Todo, TodoList};

use super::DeleteConfirmButton;

#[component]
pub fn TodoRow(todo: Todo, list: Arc<TodoList>) -> impl IntoView {
    let id = todo.id;
    let is_complete = todo.is_complete;

    let toggle_list = Arc::clone(&list);
    let on_toggle = move |ev: web_sys::Event| {
        // Show remote truth only; the refetch re-keys the row when the flag changes
        event_target::<web_sys::HtmlInputElement>(&ev).set_checked(is_complete);
        let list = Arc::clone(&toggle_list);
        spawn_local(async move { list.toggle_complete(id, is_complete).await });
    };

    let on_delete = Callback::new(move |_: ()| {
        let list = Arc::clone(&list);
        spawn_local(async move { list.delete(id).await });
    });

    view! {
        <li class=if is_complete { "todo-row completed" } else { "todo-row" }>
            <label class="todo-main">
                <input type="checkbox" prop:checked=is_complete on:change=on_toggle />
                <span class="todo-text">{todo.task}</span>
            </label>
            <DeleteConfirmButton on_confirm=on_delete />
        </li>
    }
}
