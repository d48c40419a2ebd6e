use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{Todo, TodoInput, TodoQuery, TodoUpdate},
    store::TodoRepository,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use log::info;
use uuid::Uuid;
use validator::Validate;

fn not_found() -> AppError {
    AppError::NotFound("Todo not found".into())
}

/// Retrieves the authenticated user's to-dos.
///
/// ## Query Parameters:
/// - `category` (optional): Only to-dos in this category (e.g. "work", "fitness").
/// - `sort_order` (optional): `asc` (default) or `desc`, ordering by priority.
/// - `search` (optional): Case-insensitive match against title and description.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Todo` objects.
/// - `401 Unauthorized`: Missing or invalid access token.
#[get("")]
pub async fn get_todos(
    todos: web::Data<dyn TodoRepository>,
    query_params: web::Query<TodoQuery>,
    current_user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let found = todos.list(current_user.0.user_id, &query_params).await?;
    Ok(HttpResponse::Ok().json(found))
}

/// Creates a to-do owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: The new `Todo`.
/// - `400 Bad Request`: Body is not valid JSON for `TodoInput`.
/// - `422 Unprocessable Entity`: Field validation failed (lengths, priority, past deadline).
#[post("")]
pub async fn create_todo(
    todos: web::Data<dyn TodoRepository>,
    todo_data: web::Json<TodoInput>,
    current_user: CurrentUser,
) -> Result<impl Responder, AppError> {
    todo_data.validate()?;

    let todo = Todo::new(todo_data.into_inner(), current_user.0.user_id);
    let created = todos.insert(todo).await?;
    info!("User {} created todo {}", created.user_id, created.id);

    Ok(HttpResponse::Created().json(created))
}

/// Retrieves one to-do. Someone else's to-do is reported as 404.
#[get("/{id}")]
pub async fn get_todo(
    todos: web::Data<dyn TodoRepository>,
    todo_id: web::Path<Uuid>,
    current_user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let todo = todos
        .get(current_user.0.user_id, todo_id.into_inner())
        .await?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(todo))
}

/// Partially updates a to-do. Only fields present in the body are changed.
///
/// ## Responses:
/// - `200 OK`: The updated `Todo`.
/// - `404 Not Found`: No such to-do for this user.
/// - `422 Unprocessable Entity`: A present field failed validation.
#[patch("/{id}")]
pub async fn update_todo(
    todos: web::Data<dyn TodoRepository>,
    todo_id: web::Path<Uuid>,
    changes: web::Json<TodoUpdate>,
    current_user: CurrentUser,
) -> Result<impl Responder, AppError> {
    changes.validate()?;

    let updated = todos
        .update(current_user.0.user_id, todo_id.into_inner(), changes.into_inner())
        .await?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/{id}")]
pub async fn delete_todo(
    todos: web::Data<dyn TodoRepository>,
    todo_id: web::Path<Uuid>,
    current_user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let id = todo_id.into_inner();
    if !todos.delete(current_user.0.user_id, id).await? {
        return Err(not_found());
    }

    info!("User {} deleted todo {}", current_user.0.user_id, id);
    Ok(HttpResponse::NoContent().finish())
}
