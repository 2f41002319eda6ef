mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{seed_admin, seed_customer, seed_user, send, test_app, token_for};

#[tokio::test]
async fn test_register_login_me_flow() {
    let (app, _store) = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/user/register",
        None,
        Some(json!({"email": "amy@example.com", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "amy@example.com");
    assert_eq!(body["is_staff"], false);
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    let (status, tokens) = send(
        &app,
        "POST",
        "/user/login",
        None,
        Some(json!({"email": "amy@example.com", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access = tokens["access"].as_str().unwrap().to_string();
    assert!(tokens["refresh"].as_str().is_some());

    let (status, me) = send(&app, "GET", "/user/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "amy@example.com");
}

#[tokio::test]
async fn test_register_rejects_invalid_input() {
    let (app, _store) = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/user/register",
        None,
        Some(json!({"email": "not-an-email", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "email");

    let (status, body) = send(
        &app,
        "POST",
        "/user/register",
        None,
        Some(json!({"email": "amy@example.com", "password": "abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "password");
}

#[tokio::test]
async fn test_duplicate_registration_is_a_field_error() {
    let (app, _store) = test_app();

    let payload = json!({"email": "amy@example.com", "password": "s3cret"});
    let (status, _) = send(&app, "POST", "/user/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", "/user/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "email");
    assert_eq!(body["error"], "email is already in use");
}

#[tokio::test]
async fn test_login_with_bad_credentials() {
    let (app, store) = test_app();
    seed_user(&store, "amy@example.com", "s3cret", false).await;

    let (status, body) = send(
        &app,
        "POST",
        "/user/login",
        None,
        Some(json!({"email": "amy@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["error"],
        "No active account found with the given credentials."
    );

    let (status, _) = send(
        &app,
        "POST",
        "/user/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let (app, _store) = test_app();

    for uri in ["/flights", "/orders", "/airports", "/routes", "/user/me"] {
        let (status, body) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "expected 401 for {uri}");
        assert_eq!(body["error"], "Authentication credentials were not provided.");
    }

    let (status, body) = send(&app, "GET", "/flights", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is invalid or expired.");
}

#[tokio::test]
async fn test_refresh_token_does_not_grant_api_access() {
    let (app, store) = test_app();
    seed_user(&store, "amy@example.com", "s3cret", false).await;

    let (_, tokens) = send(
        &app,
        "POST",
        "/user/login",
        None,
        Some(json!({"email": "amy@example.com", "password": "s3cret"})),
    )
    .await;
    let refresh = tokens["refresh"].as_str().unwrap();

    let (status, body) = send(&app, "GET", "/flights", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token has wrong type.");
}

#[tokio::test]
async fn test_token_refresh_and_verify() {
    let (app, store) = test_app();
    seed_user(&store, "amy@example.com", "s3cret", false).await;

    let (_, tokens) = send(
        &app,
        "POST",
        "/user/login",
        None,
        Some(json!({"email": "amy@example.com", "password": "s3cret"})),
    )
    .await;
    let access = tokens["access"].as_str().unwrap().to_string();
    let refresh = tokens["refresh"].as_str().unwrap().to_string();

    // An access token cannot be used where a refresh token is expected.
    let (status, _) = send(
        &app,
        "POST",
        "/user/token/refresh",
        None,
        Some(json!({"refresh": access})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/user/token/refresh",
        None,
        Some(json!({"refresh": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["access"].as_str().unwrap().to_string();

    let (status, me) = send(&app, "GET", "/user/me", Some(&fresh), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "amy@example.com");

    let (status, _) = send(
        &app,
        "POST",
        "/user/token/verify",
        None,
        Some(json!({"token": fresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/user/token/verify",
        None,
        Some(json!({"token": "garbage"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_account_update() {
    let (app, store) = test_app();
    let id = seed_user(&store, "amy@example.com", "s3cret", false).await;
    let token = token_for(id, "amy@example.com", false);

    let (status, body) = send(
        &app,
        "PATCH",
        "/user/me",
        Some(&token),
        Some(json!({"email": "amy@flightdeck.io"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "amy@flightdeck.io");

    // Password was untouched, so logging in with it still works.
    let (status, _) = send(
        &app,
        "POST",
        "/user/login",
        None,
        Some(json!({"email": "amy@flightdeck.io", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "PUT",
        "/user/me",
        Some(&token),
        Some(json!({"email": "amy@flightdeck.io", "password": "n3w-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/user/login",
        None,
        Some(json!({"email": "amy@flightdeck.io", "password": "n3w-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_customer_cannot_touch_admin_surfaces() {
    let (app, store) = test_app();
    let token = seed_customer(&store).await;

    let cases = [
        ("POST", "/airports", Some(json!({"name": "CDG", "closest_big_city": "Paris"}))),
        ("POST", "/routes", Some(json!({"source": uuid::Uuid::new_v4(), "destination": uuid::Uuid::new_v4(), "distance": 100}))),
        ("POST", "/airplane_types", Some(json!({"name": "Jet"}))),
        ("GET", "/airplane_types", None),
        ("GET", "/crews", None),
        ("POST", "/crews", Some(json!({"first_name": "Amy", "last_name": "Johnson"}))),
        ("POST", "/flights", Some(json!({
            "route": uuid::Uuid::new_v4(),
            "airplane": uuid::Uuid::new_v4(),
            "departure_time": "2030-01-01T10:00:00Z",
            "arrival_time": "2030-01-01T12:00:00Z"
        }))),
    ];

    for (method, uri, body) in cases {
        let (status, json) = send(&app, method, uri, Some(&token), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "expected 403 for {method} {uri}");
        assert_eq!(
            json["error"],
            "You do not have permission to perform this action."
        );
    }

    // Reads on the customer-facing catalog are allowed.
    let (status, _) = send(&app, "GET", "/airports", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/airplanes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_can_read_admin_surfaces() {
    let (app, store) = test_app();
    let token = seed_admin(&store).await;

    let (status, body) = send(&app, "GET", "/crews", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (status, _) = send(&app, "GET", "/airplane_types", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}
