use crate::{
    auth::{
        service, LoginRequest, RegisterRequest, RegisteredUser, TokenCodec, REFRESH_COOKIE_NAME,
    },
    error::AppError,
    store::UserRepository,
};
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates the account and returns its public fields. No token is issued; the
/// client logs in afterwards.
///
/// ## Responses:
/// - `201 Created`: `{id, email, username}`.
/// - `409 Conflict`: Email or username already in use.
/// - `422 Unprocessable Entity`: Field validation failed.
#[post("/register")]
pub async fn register(
    users: web::Data<dyn UserRepository>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = service::register(users.get_ref(), &register_data).await?;

    Ok(HttpResponse::Created().json(RegisteredUser::from(&user)))
}

/// Login user
///
/// Returns `{access_token, token_type}` and sets the refresh token as an HTTP-only
/// cookie. Unknown email and wrong password produce the same 401 response.
#[post("/login")]
pub async fn login(
    users: web::Data<dyn UserRepository>,
    codec: web::Data<TokenCodec>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let outcome =
        service::login(users.get_ref(), &codec, &login_data.email, &login_data.password).await?;

    Ok(HttpResponse::Ok()
        .cookie(outcome.refresh_cookie)
        .json(outcome.tokens))
}

/// Refresh access token
///
/// Reads the `refresh_token` cookie and returns a new access token for the same user.
#[post("/refresh")]
pub async fn refresh(
    req: HttpRequest,
    codec: web::Data<TokenCodec>,
) -> Result<impl Responder, AppError> {
    let cookie = req.cookie(REFRESH_COOKIE_NAME);
    let tokens = service::refresh(&codec, cookie.as_ref().map(|c| c.value()))?;

    Ok(HttpResponse::Ok().json(tokens))
}
