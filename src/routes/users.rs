use crate::{
    auth::{service, CurrentUser},
    error::AppError,
    models::{PasswordChange, UserProfile},
    store::UserRepository,
};
use actix_web::{get, put, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Returns the profile of the authenticated user.
///
/// The token is trusted for identity; a 404 here means the account was removed
/// after the token was issued.
#[get("/me")]
pub async fn me(
    users: web::Data<dyn UserRepository>,
    current_user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let user = users
        .find_by_id(current_user.0.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(UserProfile::from(&user)))
}

/// Changes the authenticated user's password.
///
/// ## Responses:
/// - `200 OK`: `{message}`.
/// - `400 Bad Request`: New password and confirmation differ.
/// - `401 Unauthorized`: Current password is wrong.
/// - `409 Conflict`: New password equals the current one.
#[put("/change-password")]
pub async fn change_password(
    users: web::Data<dyn UserRepository>,
    current_user: CurrentUser,
    change: web::Json<PasswordChange>,
) -> Result<impl Responder, AppError> {
    change.validate()?;

    service::change_password(users.get_ref(), current_user.0.user_id, &change).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Password changed successfully" })))
}
