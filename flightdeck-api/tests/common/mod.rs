#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use flightdeck_api::middleware::auth::{issue_token, Claims, TOKEN_TYPE_ACCESS};
use flightdeck_api::{
    app,
    state::{AppState, AuthConfig},
};
use flightdeck_core::repository::{NewUser, UserRepository};
use flightdeck_core::users::hash_password;
use flightdeck_store::MemoryStore;

pub const TEST_SECRET: &str = "test-secret";

/// An app wired to a shared in-memory store, so tests can both drive the
/// HTTP surface and peek underneath it.
pub fn test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        users: store.clone(),
        airports: store.clone(),
        crews: store.clone(),
        fleet: store.clone(),
        routes: store.clone(),
        flights: store.clone(),
        orders: store.clone(),
        auth: AuthConfig {
            secret: TEST_SECRET.to_string(),
            access_token_minutes: 30,
            refresh_token_days: 7,
        },
    };
    (app(state), store)
}

/// Seed an account directly in the store and return its id.
pub async fn seed_user(store: &MemoryStore, email: &str, password: &str, is_staff: bool) -> Uuid {
    let user = store
        .create_user(NewUser {
            email: email.to_string(),
            password_hash: hash_password(password),
            is_staff,
        })
        .await
        .unwrap();
    user.id
}

/// Mint an access token without going through the login endpoint.
pub fn token_for(user_id: Uuid, email: &str, is_staff: bool) -> String {
    let role = if is_staff { "ADMIN" } else { "CUSTOMER" };
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        token_type: TOKEN_TYPE_ACCESS.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::minutes(30)).timestamp() as usize,
    };
    issue_token(&claims, TEST_SECRET).unwrap()
}

pub async fn seed_admin(store: &MemoryStore) -> String {
    let id = seed_user(store, "admin@flightdeck.io", "adminpass", true).await;
    token_for(id, "admin@flightdeck.io", true)
}

pub async fn seed_customer(store: &MemoryStore) -> String {
    let id = seed_user(store, "customer@flightdeck.io", "customerpass", false).await;
    token_for(id, "customer@flightdeck.io", false)
}

/// Fire one request at the app and decode the JSON body, if any.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

pub async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, Some(token), None).await
}

pub async fn post(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(token), Some(body)).await
}

pub struct SeededFlight {
    pub airport_paris: String,
    pub airport_berlin: String,
    pub route_id: String,
    pub airplane_id: String,
    pub flight_id: String,
    pub departure_time: String,
}

/// Drive the admin API to build one bookable flight: Paris -> Berlin on a
/// 60x8 airplane, departing in two days.
pub async fn seed_flight_graph(app: &Router, admin: &str) -> SeededFlight {
    let (status, paris) = post(
        app,
        "/airports",
        admin,
        serde_json::json!({"name": "Charles de Gaulle", "closest_big_city": "Paris"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, berlin) = post(
        app,
        "/airports",
        admin,
        serde_json::json!({"name": "Berlin Brandenburg", "closest_big_city": "Berlin"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, route) = post(
        app,
        "/routes",
        admin,
        serde_json::json!({"source": paris["id"], "destination": berlin["id"], "distance": 1050}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, airplane_type) = post(
        app,
        "/airplane_types",
        admin,
        serde_json::json!({"name": "Wide-body jet"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, airplane) = post(
        app,
        "/airplanes",
        admin,
        serde_json::json!({
            "name": "AB-101",
            "rows": 60,
            "seats_in_row": 8,
            "airplane_type": airplane_type["id"],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, crew) = post(
        app,
        "/crews",
        admin,
        serde_json::json!({"first_name": "Amy", "last_name": "Johnson"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let departure = chrono::Utc::now() + chrono::Duration::days(2);
    let arrival = departure + chrono::Duration::hours(3);
    let (status, flight) = post(
        app,
        "/flights",
        admin,
        serde_json::json!({
            "route": route["id"],
            "airplane": airplane["id"],
            "departure_time": departure.to_rfc3339(),
            "arrival_time": arrival.to_rfc3339(),
            "crew": [crew["id"]],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    SeededFlight {
        airport_paris: paris["id"].as_str().unwrap().to_string(),
        airport_berlin: berlin["id"].as_str().unwrap().to_string(),
        route_id: route["id"].as_str().unwrap().to_string(),
        airplane_id: airplane["id"].as_str().unwrap().to_string(),
        flight_id: flight["id"].as_str().unwrap().to_string(),
        departure_time: departure.to_rfc3339(),
    }
}
