//!
//! # Custom Error Handling
//!
//! This module defines `AppError`, the error type returned by every handler.
//!
//! `AppError` implements `actix_web::error::ResponseError`, turning application errors
//! into HTTP responses with a JSON body of the form `{"error": "<message>"}`. Server-side
//! failures are logged with their detail and reported to the client with a generic
//! message only.
//!
//! `From` implementations for `AuthError`, `StoreError`, `sqlx::Error` and
//! `validator::ValidationErrors` allow handlers to use the `?` operator throughout.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError},
    http::{header, StatusCode},
    HttpRequest, HttpResponse,
};
use log::error;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or is missing (HTTP 401).
    Unauthorized(String),
    /// Malformed or inconsistent request (HTTP 400).
    BadRequest(String),
    /// Resource not found, or not owned by the caller (HTTP 404).
    NotFound(String),
    /// The request collides with existing state (HTTP 409).
    Conflict(String),
    /// Unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Error originating from the storage layer (HTTP 500).
    DatabaseError(String),
    /// Failed input validation (HTTP 422).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        match self {
            AppError::Unauthorized(msg) => response
                .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                .json(json!({ "error": msg })),
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ValidationError(msg) => response.json(json!({ "error": msg })),
            AppError::InternalServerError(detail) | AppError::DatabaseError(detail) => {
                error!("{}", detail);
                response.json(json!({ "error": "Internal server error" }))
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        let message = error.to_string();
        match error {
            AuthError::AuthenticationFailed
            | AuthError::InvalidToken
            | AuthError::MissingToken
            | AuthError::InvalidCurrentPassword => AppError::Unauthorized(message),
            AuthError::DuplicateEmail | AuthError::DuplicateUsername | AuthError::PasswordReused => {
                AppError::Conflict(message)
            }
            AuthError::PasswordMismatch => AppError::BadRequest(message),
            AuthError::UserNotFound => AppError::NotFound(message),
            AuthError::Internal(detail) => AppError::InternalServerError(detail),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::Conflict(_) => AppError::from(AuthError::from(error)),
            StoreError::Backend(detail) => AppError::DatabaseError(detail),
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `AppError::NotFound`; everything else is a database error.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Error handler for `web::JsonConfig` so malformed bodies get the same JSON shape.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Error handler for `web::QueryConfig`.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Error handler for `web::PathConfig`; a malformed id is a bad request, not a 404.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}
