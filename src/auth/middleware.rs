use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use log::error;

use crate::auth::error::AuthError;
use crate::auth::token::{TokenCodec, VerifiedIdentity};
use crate::error::AppError;

/// Resolves a bearer token into the caller's identity.
///
/// Pure token verification: storage is not consulted.
pub fn identify(codec: &TokenCodec, token: &str) -> Result<VerifiedIdentity, AuthError> {
    codec.verify_access(token).map(VerifiedIdentity::from)
}

/// Extracts the credentials of an `Authorization: Bearer <token>` header.
/// The scheme is matched case-insensitively.
fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Requires a valid access token on every request of the wrapped scope.
///
/// On success the [`VerifiedIdentity`] is stored in the request extensions for
/// [`crate::auth::CurrentUser`]. Otherwise the request is answered with 401 and never
/// reaches the handler. Needs `web::Data<TokenCodec>` registered on the app.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let outcome = match req.app_data::<web::Data<TokenCodec>>() {
            Some(codec) => match bearer_token(&req) {
                Some(token) => identify(codec, token).map_err(AppError::from),
                None => Err(AppError::from(AuthError::MissingToken)),
            },
            None => {
                error!("TokenCodec is not registered as app data");
                Err(AppError::InternalServerError("Token codec unavailable".into()))
            }
        };

        match outcome {
            Ok(identity) => {
                req.extensions_mut().insert(identity);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(app_err) => {
                let response = app_err.error_response();
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}
