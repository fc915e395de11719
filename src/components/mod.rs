//! UI Components
//!
//! Reusable Leptos components.

mod auth_panel;
mod delete_confirm_button;
mod new_todo_form;
mod todo_list_view;
mod todo_row;

pub use auth_panel::AuthPanel;
pub use delete_confirm_button::DeleteConfirmButton;
pub use new_todo_form::NewTodoForm;
pub use todo_list_view::TodoListView;
pub use todo_row::TodoRow;
