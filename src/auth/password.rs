use argon2::password_hash::{Error as HashError, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use log::error;

use crate::auth::error::AuthError;

/// Hashes `password` with Argon2id and a fresh random salt.
///
/// The result is a PHC string (`$argon2id$v=19$...`) carrying algorithm, parameters,
/// salt and digest, so it can be stored as-is.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks `password` against a stored PHC hash.
///
/// Never returns an error: a malformed hash or a fault inside the verifier is logged
/// and treated as a failed verification.
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    let parsed = match PasswordHash::new(hashed_password) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Stored password hash could not be parsed: {}", e);
            return false;
        }
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => true,
        Err(HashError::Password) => false,
        Err(e) => {
            error!("Password verification failed: {}", e);
            false
        }
    }
}
