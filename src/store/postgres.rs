use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, TodoRepository, UniqueField, UserRepository};
use crate::models::{NewUser, SortOrder, Todo, TodoQuery, TodoUpdate, User};

const USER_COLUMNS: &str = "id, email, username, password_hash, created_at, updated_at";
const TODO_COLUMNS: &str =
    "id, user_id, title, description, category, priority, complete, deadline, created_at, updated_at";

/// Runs the embedded migrations in `./migrations` against `pool`.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Postgres-backed implementation of both repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Converts `sqlx::Error` into `StoreError`.
///
/// Violations of the `users_email_key` / `users_username_key` constraints become
/// `StoreError::Conflict`; everything else is a backend failure.
impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db_err) = &error {
            if db_err.is_unique_violation() {
                match db_err.constraint() {
                    Some(c) if c.contains("email") => {
                        return StoreError::Conflict(UniqueField::Email)
                    }
                    Some(c) if c.contains("username") => {
                        return StoreError::Conflict(UniqueField::Username)
                    }
                    _ => {}
                }
            }
        }
        StoreError::Backend(error.to_string())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, email, username, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl TodoRepository for PgStore {
    async fn list(&self, owner: Uuid, query: &TodoQuery) -> Result<Vec<Todo>, StoreError> {
        // Conditions for category and search are appended after the owner filter.
        let mut sql = format!("SELECT {} FROM todos WHERE user_id = $1", TODO_COLUMNS);
        let mut param_count = 2;

        if query.category.is_some() {
            sql.push_str(&format!(" AND category = ${}", param_count));
            param_count += 1;
        }
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if search.is_some() {
            sql.push_str(&format!(
                " AND (title ILIKE ${0} OR description ILIKE ${0})",
                param_count
            ));
        }

        sql.push_str(match query.sort_order {
            SortOrder::Asc => " ORDER BY priority ASC, created_at ASC",
            SortOrder::Desc => " ORDER BY priority DESC, created_at ASC",
        });

        let mut query_builder = sqlx::query_as::<_, Todo>(&sql).bind(owner);
        if let Some(category) = query.category {
            query_builder = query_builder.bind(category);
        }
        if let Some(search) = search {
            query_builder = query_builder.bind(format!("%{}%", search));
        }

        Ok(query_builder.fetch_all(&self.pool).await?)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let sql = format!(
            "SELECT {} FROM todos WHERE id = $1 AND user_id = $2",
            TODO_COLUMNS
        );
        let todo = sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    async fn insert(&self, todo: Todo) -> Result<Todo, StoreError> {
        let sql = format!(
            "INSERT INTO todos (id, user_id, title, description, category, priority, complete, deadline) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            TODO_COLUMNS
        );
        let created = sqlx::query_as::<_, Todo>(&sql)
            .bind(todo.id)
            .bind(todo.user_id)
            .bind(todo.title)
            .bind(todo.description)
            .bind(todo.category)
            .bind(todo.priority)
            .bind(todo.complete)
            .bind(todo.deadline)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TodoUpdate,
    ) -> Result<Option<Todo>, StoreError> {
        let sql = format!(
            "UPDATE todos SET \
             title = COALESCE($1, title), \
             description = COALESCE($2, description), \
             category = COALESCE($3, category), \
             priority = COALESCE($4, priority), \
             complete = COALESCE($5, complete), \
             deadline = COALESCE($6, deadline), \
             updated_at = now() \
             WHERE id = $7 AND user_id = $8 RETURNING {}",
            TODO_COLUMNS
        );
        let updated = sqlx::query_as::<_, Todo>(&sql)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.category)
            .bind(changes.priority)
            .bind(changes.complete)
            .bind(changes.deadline)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
