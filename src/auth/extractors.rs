use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::VerifiedIdentity;
use crate::error::AppError;

/// Extracts the authenticated caller from request extensions.
///
/// Only meaningful on routes wrapped by `AuthMiddleware`, which inserts the
/// [`VerifiedIdentity`]. Without it the extractor fails with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub VerifiedIdentity);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<VerifiedIdentity>().cloned() {
            Some(identity) => ready(Ok(CurrentUser(identity))),
            None => {
                let err = AppError::Unauthorized("Missing token".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
