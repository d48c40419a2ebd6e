use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Category a to-do is filed under.
/// Corresponds to the `todo_category` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "todo_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TodoCategory {
    Work,
    Personal,
    Study,
    Fitness,
    Shopping,
    Health,
    Hobby,
    #[default]
    Other,
}

/// Ordering of the to-do list by priority.
///
/// Parsed leniently: `asc` in any case is ascending, every other value descending.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl From<String> for SortOrder {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

fn deadline_in_future(deadline: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *deadline < Utc::now() {
        let mut err = ValidationError::new("deadline_in_past");
        err.message = Some("Deadline must be in the future".into());
        return Err(err);
    }
    Ok(())
}

/// Input structure for creating a to-do.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TodoInput {
    /// Must be between 5 and 100 characters.
    #[validate(length(min = 5, max = 100))]
    pub title: String,

    /// Must be between 20 and 200 characters.
    #[validate(length(min = 20, max = 200))]
    pub description: String,

    #[serde(default)]
    pub category: TodoCategory,

    /// 1 (lowest) to 10 (highest).
    #[validate(range(min = 1, max = 10))]
    pub priority: i32,

    #[serde(default)]
    pub complete: bool,

    /// Optional deadline; rejected when it lies in the past.
    #[validate(custom = "deadline_in_future")]
    pub deadline: Option<DateTime<Utc>>,
}

/// Partial update for an existing to-do. Absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TodoUpdate {
    #[validate(length(min = 5, max = 100))]
    pub title: Option<String>,
    #[validate(length(min = 20, max = 200))]
    pub description: Option<String>,
    pub category: Option<TodoCategory>,
    #[validate(range(min = 1, max = 10))]
    pub priority: Option<i32>,
    pub complete: Option<bool>,
    #[validate(custom = "deadline_in_future")]
    pub deadline: Option<DateTime<Utc>>,
}

/// A to-do item as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: Uuid,
    /// Owner of the item.
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: TodoCategory,
    pub priority: i32,
    pub complete: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters accepted by `GET /api/todos`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TodoQuery {
    /// Only return items in this category.
    pub category: Option<TodoCategory>,
    /// Priority ordering, ascending when absent.
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Case-insensitive match against title or description.
    pub search: Option<String>,
}

impl Todo {
    /// Creates a new `Todo` owned by `user_id` with a fresh id and timestamps.
    pub fn new(input: TodoInput, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: input.title,
            description: input.description,
            category: input.category,
            priority: input.priority,
            complete: input.complete,
            deadline: input.deadline,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the fields present in `update` and bumps `updated_at`.
    pub fn apply(&mut self, update: TodoUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(complete) = update.complete {
            self.complete = complete;
        }
        if let Some(deadline) = update.deadline {
            self.deadline = Some(deadline);
        }
        self.updated_at = Utc::now();
    }

    /// Whether the item passes the category and search filters of `query`.
    pub fn matches(&self, query: &TodoQuery) -> bool {
        if let Some(category) = query.category {
            if self.category != category {
                return false;
            }
        }
        match query.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                self.title.to_lowercase().contains(&term)
                    || self.description.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}
