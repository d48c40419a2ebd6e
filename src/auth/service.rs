//! Credential lifecycle: registration, login, refresh and password change.
//!
//! Every operation takes the repository handle it needs as an argument. Password
//! hashing and verification run on the blocking pool via `web::block`.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::web;
use chrono::Duration;
use lazy_static::lazy_static;
use log::{info, warn};
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenCodec;
use crate::auth::{RegisterRequest, TokenResponse};
use crate::models::{NewUser, PasswordChange, User};
use crate::store::UserRepository;

/// Name of the HTTP-only cookie that carries the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

lazy_static! {
    // Verified against when the email is unknown so both failure paths cost the same.
    static ref DUMMY_HASH: Option<String> = hash_password("timing-equaliser-password").ok();
}

/// Result of a successful login: the JSON body plus the refresh cookie to set.
#[derive(Debug)]
pub struct LoginOutcome {
    pub tokens: TokenResponse,
    pub refresh_cookie: Cookie<'static>,
}

async fn hash_blocking(password: String) -> Result<String, AuthError> {
    web::block(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("Hashing task failed: {}", e)))?
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, AuthError> {
    web::block(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(format!("Verification task failed: {}", e)))
}

/// Builds the `Set-Cookie` directive for a refresh token valid for `ttl`.
pub fn refresh_cookie(token: String, ttl: Duration) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE_NAME, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(ttl.num_seconds()))
        .finish()
}

/// Checks an email/password pair.
///
/// An unknown email and a wrong password both yield `AuthenticationFailed`.
/// Storage faults are not collapsed into it and surface as `Internal`.
pub async fn authenticate(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    match users.find_by_email(email).await? {
        Some(user) => {
            if verify_blocking(password.to_string(), user.password_hash.clone()).await? {
                Ok(user)
            } else {
                warn!("Failed login attempt for user {}", user.id);
                Err(AuthError::AuthenticationFailed)
            }
        }
        None => {
            if let Some(dummy) = DUMMY_HASH.as_ref() {
                verify_blocking(password.to_string(), dummy.clone()).await?;
            }
            warn!("Failed login attempt for unknown email");
            Err(AuthError::AuthenticationFailed)
        }
    }
}

/// Authenticates and issues an access token plus a refresh cookie.
pub async fn login(
    users: &dyn UserRepository,
    codec: &TokenCodec,
    email: &str,
    password: &str,
) -> Result<LoginOutcome, AuthError> {
    let user = authenticate(users, email, password).await?;

    let access_token = codec.issue_access(&user.email, user.id, codec.access_ttl())?;
    let refresh_token = codec.issue_refresh(&user.email, user.id, codec.refresh_ttl())?;
    info!("User {} logged in", user.id);

    Ok(LoginOutcome {
        tokens: TokenResponse::bearer(access_token),
        refresh_cookie: refresh_cookie(refresh_token, codec.refresh_ttl()),
    })
}

/// Exchanges a refresh token for a new access token with the same subject.
///
/// The refresh token itself is not rotated.
pub fn refresh(codec: &TokenCodec, refresh_token: Option<&str>) -> Result<TokenResponse, AuthError> {
    let token = refresh_token
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let claims = codec.verify_refresh(token)?;
    let access_token = codec.issue_access(&claims.sub, claims.id, codec.access_ttl())?;
    info!("Issued refreshed access token for user {}", claims.id);

    Ok(TokenResponse::bearer(access_token))
}

/// Creates an account. Email is checked before username; the first collision wins.
pub async fn register(
    users: &dyn UserRepository,
    request: &RegisterRequest,
) -> Result<User, AuthError> {
    if users.find_by_email(&request.email).await?.is_some() {
        warn!("Registration rejected: email already registered");
        return Err(AuthError::DuplicateEmail);
    }
    if users.find_by_username(&request.username).await?.is_some() {
        warn!("Registration rejected: username {} already taken", request.username);
        return Err(AuthError::DuplicateUsername);
    }

    let password_hash = hash_blocking(request.password.clone()).await?;

    // A concurrent registration can still win the race; the store reports it as a conflict.
    let user = users
        .insert(NewUser {
            email: request.email.clone(),
            username: request.username.clone(),
            password_hash,
        })
        .await?;

    info!("Registered user {} ({})", user.id, user.username);
    Ok(user)
}

/// Replaces the password of `user_id` after checking the current one.
pub async fn change_password(
    users: &dyn UserRepository,
    user_id: Uuid,
    change: &PasswordChange,
) -> Result<(), AuthError> {
    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if !verify_blocking(change.current_password.clone(), user.password_hash.clone()).await? {
        warn!("Password change rejected for user {}: wrong current password", user.id);
        return Err(AuthError::InvalidCurrentPassword);
    }
    if change.new_password == change.current_password {
        return Err(AuthError::PasswordReused);
    }
    if change.new_password != change.new_password_confirm {
        return Err(AuthError::PasswordMismatch);
    }

    let password_hash = hash_blocking(change.new_password.clone()).await?;
    if !users.update_password(user.id, &password_hash).await? {
        return Err(AuthError::UserNotFound);
    }

    info!("Password changed for user {}", user.id);
    Ok(())
}
