#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use jsonwebtoken::Algorithm;
use serde_json::{json, Value};
use std::sync::Arc;
use todoforge::auth::TokenCodec;
use todoforge::config::AuthSettings;
use todoforge::error::{json_error_handler, path_error_handler, query_error_handler};
use todoforge::routes;
use todoforge::routes::health;
use todoforge::store::{MemoryStore, TodoRepository, UserRepository};

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        jwt_secret: TEST_SECRET.to_string(),
        algorithm: Algorithm::HS256,
        access_token_ttl_minutes: 15,
        refresh_token_ttl_days: 7,
    }
}

pub fn codec() -> TokenCodec {
    TokenCodec::new(&auth_settings())
}

/// Builds the full application over a fresh in-memory store.
pub async fn test_app() -> impl Service<
    Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    let store = Arc::new(MemoryStore::new());
    let users: Arc<dyn UserRepository> = store.clone();
    let todos: Arc<dyn TodoRepository> = store;

    test::init_service(
        App::new()
            .app_data(web::Data::from(users))
            .app_data(web::Data::from(todos))
            .app_data(web::Data::new(codec()))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .wrap(Logger::default())
            .service(health::health)
            .service(web::scope("/api").configure(routes::config)),
    )
    .await
}

pub async fn register<S, B>(app: &S, username: &str, email: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": username,
            "email": email,
            "password": password
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

/// Logs in and returns the access token and the raw refresh cookie value.
pub async fn login<S, B>(app: &S, email: &str, password: &str) -> Result<(String, String), String>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let refresh = resp
        .response()
        .cookies()
        .find(|c| c.name() == "refresh_token")
        .map(|c| c.value().to_string());
    let body = test::read_body(resp).await;

    if status != StatusCode::OK {
        return Err(format!(
            "Login failed. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    let json: Value = serde_json::from_slice(&body).map_err(|e| e.to_string())?;
    let access = json["access_token"]
        .as_str()
        .ok_or("login response has no access_token")?
        .to_string();
    Ok((access, refresh.ok_or("login response set no refresh cookie")?))
}

/// Registers and logs in a user, returning an access token.
pub async fn signed_in<S, B>(app: &S, username: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let email = format!("{}@example.com", username);
    let (status, body) = register(app, username, &email, "Password123!").await;
    assert_eq!(status, StatusCode::CREATED, "Registration failed: {}", body);
    login(app, &email, "Password123!").await.unwrap().0
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}
