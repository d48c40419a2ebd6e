use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{StoreError, TodoRepository, UniqueField, UserRepository};
use crate::models::{NewUser, SortOrder, Todo, TodoQuery, TodoUpdate, User};

/// In-process store backing the test suite.
///
/// Uniqueness of email and username is checked under the same write lock as the
/// insert, so concurrent registrations cannot both succeed.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    todos: RwLock<HashMap<Uuid, Todo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = read(&self.users)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = read(&self.users)?;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = read(&self.users)?;
        Ok(users.get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(UniqueField::Username));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let mut users = write(&self.users)?;
        match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TodoRepository for MemoryStore {
    async fn list(&self, owner: Uuid, query: &TodoQuery) -> Result<Vec<Todo>, StoreError> {
        let todos = read(&self.todos)?;
        let mut found: Vec<Todo> = todos
            .values()
            .filter(|t| t.user_id == owner && t.matches(query))
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            let by_priority = match query.sort_order {
                SortOrder::Asc => a.priority.cmp(&b.priority),
                SortOrder::Desc => b.priority.cmp(&a.priority),
            };
            by_priority.then(a.created_at.cmp(&b.created_at))
        });
        Ok(found)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let todos = read(&self.todos)?;
        Ok(todos.get(&id).filter(|t| t.user_id == owner).cloned())
    }

    async fn insert(&self, todo: Todo) -> Result<Todo, StoreError> {
        let mut todos = write(&self.todos)?;
        todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TodoUpdate,
    ) -> Result<Option<Todo>, StoreError> {
        let mut todos = write(&self.todos)?;
        match todos.get_mut(&id).filter(|t| t.user_id == owner) {
            Some(todo) => {
                todo.apply(changes);
                Ok(Some(todo.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut todos = write(&self.todos)?;
        let owned = todos.get(&id).is_some_and(|t| t.user_id == owner);
        if owned {
            todos.remove(&id);
        }
        Ok(owned)
    }
}
