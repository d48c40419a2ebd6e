//!
//! # Persistence
//!
//! Storage is reached only through the [`UserRepository`] and [`TodoRepository`]
//! traits. Handlers receive them as `web::Data<dyn UserRepository>` /
//! `web::Data<dyn TodoRepository>` and pass the handle explicitly into every service
//! call, so the same code runs against [`postgres::PgStore`] in production and
//! [`memory::MemoryStore`] in tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::models::{NewUser, Todo, TodoQuery, TodoUpdate, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Which unique column rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
}

/// Errors reported by a storage backend.
#[derive(Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    Conflict(UniqueField),
    /// The backend could not complete the operation.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Conflict(UniqueField::Email) => write!(f, "Conflict: email already exists"),
            StoreError::Conflict(UniqueField::Username) => {
                write!(f, "Conflict: username already exists")
            }
            StoreError::Backend(msg) => write!(f, "Storage Error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// User lookups and writes needed by registration, login and the profile routes.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Inserts a user. A duplicate email or username yields `StoreError::Conflict`.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Replaces the stored hash. Returns `false` when no such user exists.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError>;
}

/// To-do storage. Every operation is scoped to the owning user.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Items owned by `owner` matching `query`, ordered by priority.
    async fn list(&self, owner: Uuid, query: &TodoQuery) -> Result<Vec<Todo>, StoreError>;

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<Todo>, StoreError>;

    async fn insert(&self, todo: Todo) -> Result<Todo, StoreError>;

    /// Applies a partial update. `None` when the item does not exist for `owner`.
    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TodoUpdate,
    ) -> Result<Option<Todo>, StoreError>;

    /// Returns `false` when the item does not exist for `owner`.
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError>;
}
