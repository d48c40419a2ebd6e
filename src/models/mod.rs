pub mod todo;
pub mod user;

pub use todo::{SortOrder, Todo, TodoCategory, TodoInput, TodoQuery, TodoUpdate};
pub use user::{NewUser, PasswordChange, User, UserProfile};
