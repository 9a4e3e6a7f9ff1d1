mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use movie_reservation::app;

use std::sync::Arc;

use movie_reservation::cache::MemoryChallengeStore;
use movie_reservation::store::MemoryStore;
use movie_reservation::AppState;

use common::{solve_captcha, test_config, test_state, ADMIN_ROLE_PASSWORD};

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    body: Value,
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply { status, cookie, body }
}

/// Fetches a challenge, answers it and returns the key now marked as passed.
async fn pass_captcha(app: &Router) -> String {
    let issued = send(app, Method::GET, "/api/captcha", None, None).await;
    assert_eq!(issued.status, StatusCode::OK);
    let key = issued.body["key"].as_str().unwrap().to_string();
    let answer = solve_captcha(issued.body["question"].as_str().unwrap()).unwrap();

    let verified = send(
        app,
        Method::POST,
        "/api/captcha",
        None,
        Some(json!({ "key": key, "answer": answer.to_string() })),
    )
    .await;
    assert_eq!(verified.body["success"], json!(true));
    key
}

async fn register(app: &Router, username: &str, role: &str) -> Reply {
    let key = pass_captcha(app).await;
    send(
        app,
        Method::POST,
        "/api/users/register",
        None,
        Some(json!({
            "username": username,
            "password": "correct horse",
            "role": role,
            "key": key,
            "admin_role_password": ADMIN_ROLE_PASSWORD,
        })),
    )
    .await
}

async fn login(app: &Router, username: &str) -> String {
    let reply = login_reply(app, username).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.cookie.unwrap().starts_with("jwt="));
    reply.body["token"].as_str().unwrap().to_string()
}

async fn login_reply(app: &Router, username: &str) -> Reply {
    let key = pass_captcha(app).await;
    send(
        app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "username": username, "password": "correct horse", "key": key })),
    )
    .await
}

async fn user_token(app: &Router, username: &str, role: &str) -> String {
    assert_eq!(register(app, username, role).await.status, StatusCode::CREATED);
    login(app, username).await
}

/// Movie, 2x3 hall and one showtime created through the admin API.
async fn seed_showtime(app: &Router, admin: &str) -> (i64, i64) {
    let movie = send(
        app,
        Method::POST,
        "/api/movies",
        Some(admin),
        Some(json!({ "title": "Arrival", "description": "Heptapods" })),
    )
    .await;
    assert_eq!(movie.status, StatusCode::CREATED);

    let hall = send(
        app,
        Method::POST,
        "/api/halls",
        Some(admin),
        Some(json!({ "name": "Hall A", "seat_count": 6, "rows": 2, "cols": 3 })),
    )
    .await;
    assert_eq!(hall.status, StatusCode::CREATED);

    let showtime = send(
        app,
        Method::POST,
        "/api/showtimes",
        Some(admin),
        Some(json!({
            "movie_id": movie.body["id"],
            "hall_id": hall.body["id"],
            "start_at": "2030-01-01T20:00:00Z",
        })),
    )
    .await;
    assert_eq!(showtime.status, StatusCode::CREATED);

    (
        hall.body["id"].as_i64().unwrap(),
        showtime.body["id"].as_i64().unwrap(),
    )
}

#[tokio::test]
async fn health_is_public() {
    let app = app(test_state());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_requires_a_passed_captcha() {
    let app = app(test_state());
    let reply = send(
        &app,
        Method::POST,
        "/api/users/register",
        None,
        Some(json!({ "username": "mallory", "password": "secret!!", "key": "made-up" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"]["code"], json!("UNAUTHORIZED"));
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = app(test_state());
    assert_eq!(register(&app, "dana", "user").await.status, StatusCode::CREATED);
    let again = register(&app, "dana", "user").await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["error"]["code"], json!("USER_EXISTS"));
}

#[tokio::test]
async fn admin_routes_check_the_role() {
    let app = app(test_state());
    let body = json!({ "title": "Heat", "description": "" });

    let anonymous = send(&app, Method::POST, "/api/movies", None, Some(body.clone())).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let user = user_token(&app, "viewer", "user").await;
    let forbidden = send(&app, Method::POST, "/api/movies", Some(&user), Some(body)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.body["error"]["code"], json!("FORBIDDEN"));
}

#[tokio::test]
async fn reservation_lifecycle_over_http() {
    let app = app(test_state());
    let admin = user_token(&app, "root", "admin").await;
    let (hall_id, showtime_id) = seed_showtime(&app, &admin).await;

    let seats = send(&app, Method::GET, &format!("/api/halls/{hall_id}/seats"), None, None).await;
    let seat_id = seats.body[0]["id"].as_i64().unwrap();
    assert_eq!(seats.body[0]["row"], json!(1));
    assert_eq!(seats.body[0]["col"], json!(1));

    let alice = user_token(&app, "alice", "user").await;
    let bob = user_token(&app, "bob", "user").await;
    let ticket = json!({ "showtime_id": showtime_id, "seat_id": seat_id });

    let reserved = send(&app, Method::POST, "/api/reservations", Some(&alice), Some(ticket.clone())).await;
    assert_eq!(reserved.status, StatusCode::CREATED);
    let reservation_id = reserved.body["id"].as_i64().unwrap();

    let taken = send(&app, Method::POST, "/api/reservations", Some(&bob), Some(ticket)).await;
    assert_eq!(taken.status, StatusCode::CONFLICT);
    assert_eq!(taken.body["error"]["code"], json!("SEAT_TAKEN"));

    let availability = send(
        &app,
        Method::GET,
        &format!("/api/showtimes/{showtime_id}/availability"),
        None,
        None,
    )
    .await;
    assert_eq!(availability.body["remaining_tickets"], json!(5));

    let map = send(&app, Method::GET, &format!("/api/showtimes/{showtime_id}/seats"), None, None).await;
    assert_eq!(map.body[0]["status"], json!("locked"));

    let mine = send(&app, Method::GET, "/api/reservations/me", Some(&alice), None).await;
    assert_eq!(mine.body.as_array().map(Vec::len), Some(1));

    let path = format!("/api/reservations/{reservation_id}");
    let not_owner = send(&app, Method::DELETE, &path, Some(&bob), None).await;
    assert_eq!(not_owner.status, StatusCode::FORBIDDEN);

    let cancelled = send(&app, Method::DELETE, &path, Some(&alice), None).await;
    assert_eq!(cancelled.status, StatusCode::NO_CONTENT);

    let availability = send(
        &app,
        Method::GET,
        &format!("/api/showtimes/{showtime_id}/availability"),
        None,
        None,
    )
    .await;
    assert_eq!(availability.body["remaining_tickets"], json!(6));
}

#[tokio::test]
async fn referenced_hall_cannot_be_deleted() {
    let app = app(test_state());
    let admin = user_token(&app, "root", "admin").await;
    let (hall_id, _) = seed_showtime(&app, &admin).await;

    let reply = send(&app, Method::DELETE, &format!("/api/halls/{hall_id}"), Some(&admin), None).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["error"]["code"], json!("RELATED_RESOURCE_EXISTS"));

    let bad_geometry = send(
        &app,
        Method::POST,
        "/api/halls",
        Some(&admin),
        Some(json!({ "name": "Hall B", "seat_count": 7, "rows": 2, "cols": 3 })),
    )
    .await;
    assert_eq!(bad_geometry.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_cookie_is_secure_in_production() {
    let mut config = test_config();
    config.app.environment = "production".into();
    let app = app(AppState::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryChallengeStore::new()),
    ));
    assert_eq!(register(&app, "erin", "user").await.status, StatusCode::CREATED);

    let reply = login_reply(&app, "erin").await;
    assert_eq!(reply.status, StatusCode::OK);
    let cookie = reply.cookie.unwrap();
    assert!(cookie.contains("Max-Age=3600"));
    assert!(cookie.ends_with("; Secure"));

    let plain = app_cookie_in_development().await;
    assert!(!plain.contains("Secure"));
}

async fn app_cookie_in_development() -> String {
    let app = app(test_state());
    assert_eq!(register(&app, "frank", "user").await.status, StatusCode::CREATED);
    login_reply(&app, "frank").await.cookie.unwrap()
}
