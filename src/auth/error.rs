use std::fmt;

use crate::store::{StoreError, UniqueField};

/// Outcomes of the credential and token operations.
///
/// Everything except `Internal` is an expected business result that the HTTP layer
/// translates directly into a 4xx response. `Internal` covers hashing, signing and
/// storage faults and is reported as a generic 500.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong password. The two are deliberately indistinguishable.
    AuthenticationFailed,
    DuplicateEmail,
    DuplicateUsername,
    /// Malformed, badly signed, expired or wrong-type token.
    InvalidToken,
    /// No token was presented.
    MissingToken,
    InvalidCurrentPassword,
    /// The requested new password equals the current one.
    PasswordReused,
    /// The new password and its confirmation differ.
    PasswordMismatch,
    UserNotFound,
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::AuthenticationFailed => write!(f, "Invalid email or password"),
            AuthError::DuplicateEmail => write!(f, "Email already registered"),
            AuthError::DuplicateUsername => write!(f, "Username already taken"),
            AuthError::InvalidToken => write!(f, "Invalid or expired token"),
            AuthError::MissingToken => write!(f, "Missing token"),
            AuthError::InvalidCurrentPassword => write!(f, "Invalid current password"),
            AuthError::PasswordReused => {
                write!(f, "New password cannot be the same as the old password")
            }
            AuthError::PasswordMismatch => {
                write!(f, "New password and confirmation do not match")
            }
            AuthError::UserNotFound => write!(f, "User not found"),
            AuthError::Internal(msg) => write!(f, "Internal auth error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// Unique-constraint conflicts keep their meaning; any other storage fault is internal.
impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> AuthError {
        match error {
            StoreError::Conflict(UniqueField::Email) => AuthError::DuplicateEmail,
            StoreError::Conflict(UniqueField::Username) => AuthError::DuplicateUsername,
            StoreError::Backend(msg) => AuthError::Internal(msg),
        }
    }
}
