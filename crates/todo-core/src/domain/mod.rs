//! Domain Layer
//!
//! Entities exchanged with the identity service and the `todos` table.
//! No I/O lives here.

mod error;
mod session;
mod todo;

pub use error::{DomainError, DomainResult};
pub use session::{AuthEvent, Session, User, EXPIRY_MARGIN_SECS};
pub use todo::{NewTodo, Todo, TodoId, TodoUpdate, UserId};
