mod common;

use actix_web::cookie::Cookie;
use actix_web::http::{header, StatusCode};
use actix_web::test;
use chrono::Duration;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use todoforge::auth::TokenCodec;
use todoforge::config::AuthSettings;
use uuid::Uuid;

use common::{bearer, codec, login, register, test_app};

#[actix_rt::test]
async fn test_register_login_and_refresh_flow() {
    let app = test_app().await;

    // 1. Register
    let (status, body) = register(&app, "alice", "alice@example.com", "Secret123!").await;
    assert_eq!(status, StatusCode::CREATED, "Registration failed. Body: {}", body);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["username"], "alice");
    assert!(body["id"].is_string());
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
    let user_id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    // 2. Login: access token in the body, refresh token only in the cookie
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "alice@example.com", "password": "Secret123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "refresh_token")
        .map(|c| c.into_owned())
        .expect("login must set the refresh_token cookie");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(actix_web::cookie::SameSite::Lax));
    assert_eq!(
        cookie.max_age(),
        Some(actix_web::cookie::time::Duration::seconds(7 * 86400))
    );

    let login_body: Value = test::read_body_json(resp).await;
    assert_eq!(login_body["token_type"], "bearer");
    assert!(login_body.get("refresh_token").is_none());
    let access_token = login_body["access_token"].as_str().unwrap().to_string();

    // 3. Protected call with the access token
    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&access_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let profile: Value = test::read_body_json(resp).await;
    assert_eq!(profile["id"], user_id.to_string());
    assert_eq!(profile["email"], "alice@example.com");
    assert!(profile.get("password_hash").is_none());

    // The header can be built straight from the response's own token_type
    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header((
            header::AUTHORIZATION,
            format!("{} {}", login_body["token_type"].as_str().unwrap(), access_token),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // 4. Refresh with the cookie: new access token for the same subject
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .cookie(Cookie::new("refresh_token", cookie.value().to_string()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let refreshed: Value = test::read_body_json(resp).await;
    assert_eq!(refreshed["token_type"], "bearer");

    let claims = codec()
        .verify_access(refreshed["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.sub, "alice@example.com");
    assert_eq!(claims.id, user_id);
}

#[actix_rt::test]
async fn test_duplicate_registration() {
    let app = test_app().await;

    let (status, _) = register(&app, "alice", "alice@example.com", "Secret123!").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = register(&app, "alice_two", "alice@example.com", "Secret123!").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "Email already registered" }));

    let (status, body) = register(&app, "alice", "other@example.com", "Secret123!").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "Username already taken" }));
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let app = test_app().await;

    let test_cases = vec![
        // Deserialization errors (expect 400 for missing fields)
        (
            json!({ "email": "test@example.com", "password": "Password123!" }),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({ "username": "testuser", "password": "Password123!" }),
            StatusCode::BAD_REQUEST,
        ),
        // Validation errors (expect 422)
        (
            json!({ "username": "tu", "email": "test@example.com", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            json!({ "username": "test user!", "email": "test@example.com", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            json!({ "username": "testuser", "email": "not-an-email", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            json!({ "username": "testuser", "email": "test@example.com", "password": "short" }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
    ];

    for (payload, expected_status) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            status, expected_status,
            "Payload {} gave unexpected body {}",
            payload, body
        );
        assert!(body["error"].is_string());
    }
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let app = test_app().await;
    register(&app, "alice", "alice@example.com", "Secret123!").await;

    let mut bodies = Vec::new();
    for (email, password) in [
        ("alice@example.com", "WrongPassword1"),
        ("nobody@example.com", "Secret123!"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.response().cookies().next().is_none());
        bodies.push(test::read_body(resp).await);
    }

    assert_eq!(bodies[0], bodies[1]);
}

#[actix_rt::test]
async fn test_refresh_rejections() {
    let app = test_app().await;
    register(&app, "alice", "alice@example.com", "Secret123!").await;
    let (access_token, _) = login(&app, "alice@example.com", "Secret123!").await.unwrap();

    // No cookie at all
    let req = test::TestRequest::post().uri("/api/auth/refresh").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // An access token is not a refresh token
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .cookie(Cookie::new("refresh_token", access_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Expired refresh token
    let expired = codec()
        .issue_refresh("alice@example.com", Uuid::new_v4(), Duration::seconds(-5))
        .unwrap();
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .cookie(Cookie::new("refresh_token", expired))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_protected_routes_reject_bad_tokens() {
    let app = test_app().await;
    register(&app, "alice", "alice@example.com", "Secret123!").await;
    let (_, refresh_token) = login(&app, "alice@example.com", "Secret123!").await.unwrap();

    let foreign = TokenCodec::new(&AuthSettings {
        jwt_secret: "a-different-secret".to_string(),
        ..common::auth_settings()
    })
    .issue_access("alice@example.com", Uuid::new_v4(), Duration::minutes(5))
    .unwrap();
    let expired = codec()
        .issue_access("alice@example.com", Uuid::new_v4(), Duration::minutes(-1))
        .unwrap();

    for token in [foreign, expired, refresh_token] {
        let req = test::TestRequest::get()
            .uri("/api/users/me")
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Invalid or expired token" }));
    }

    let req = test::TestRequest::get().uri("/api/users/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_change_password_flow() {
    let app = test_app().await;
    register(&app, "alice", "alice@example.com", "Secret123!").await;
    let (token, _) = login(&app, "alice@example.com", "Secret123!").await.unwrap();

    let cases = vec![
        (("WrongPass1", "NewSecret1!", "NewSecret1!"), StatusCode::UNAUTHORIZED),
        (("Secret123!", "Secret123!", "Secret123!"), StatusCode::CONFLICT),
        (("Secret123!", "NewSecret1!", "NewSecret2!"), StatusCode::BAD_REQUEST),
        (("Secret123!", "short", "short"), StatusCode::UNPROCESSABLE_ENTITY),
        (("Secret123!", "NewSecret1!", "NewSecret1!"), StatusCode::OK),
    ];
    for ((current, new, confirm), expected) in cases {
        let req = test::TestRequest::put()
            .uri("/api/users/change-password")
            .insert_header(bearer(&token))
            .set_json(json!({
                "current_password": current,
                "new_password": new,
                "new_password_confirm": confirm
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "change {} -> {}", current, new);
    }

    assert!(login(&app, "alice@example.com", "Secret123!").await.is_err());
    assert!(login(&app, "alice@example.com", "NewSecret1!").await.is_ok());
}
