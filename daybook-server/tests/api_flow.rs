use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use daybook_server::{config::Settings, db::Database, router, state::AppState};

const ADA_DEEP_WORK: &str = "650e8400-e29b-41d4-a716-446655440001";
const GRACE_READING_GROUP: &str = "650e8400-e29b-41d4-a716-446655440003";
const GRACE: &str = "550e8400-e29b-41d4-a716-446655440002";
const LINUS: &str = "550e8400-e29b-41d4-a716-446655440003";
const LINUS_TO_ADA: &str = "750e8400-e29b-41d4-a716-446655440003";

fn app() -> Router {
    let db = Database::in_memory().expect("Failed to create test database");
    db.initialize().expect("Failed to initialize schema");
    db.seed_demo_data().expect("Failed to seed demo data");
    router(AppState::new(db, &Settings::default()))
}

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
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
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = call(app, Method::POST, "/auth/login", None, Some(json!({ "email": email }))).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["session_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_routes_require_bearer_token() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/posts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = call(&app, Method::GET, "/posts", Some("not-a-session"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validate_logout() {
    let app = app();
    let (status, body) = call(&app, Method::POST, "/auth/register", None, Some(json!({ "email": "new@daybook.dev" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user"]["username"].is_null());
    let token = body["session_token"].as_str().unwrap().to_string();

    let (status, _) = call(&app, Method::POST, "/auth/register", None, Some(json!({ "email": "NEW@daybook.dev" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(&app, Method::GET, "/auth/validate", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    let (status, _) = call(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, "/auth/validate", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_feed_scopes_and_like_fields() {
    let app = app();
    let token = login(&app, "grace@daybook.dev").await;

    let (status, body) = call(&app, Method::GET, "/posts?scope=friends", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let posts = body.as_array().unwrap();
    assert_eq!(posts.len(), 2);
    let deep_work = posts.iter().find(|p| p["id"] == ADA_DEEP_WORK).unwrap();
    assert_eq!(deep_work["likes_count"], 2);
    assert_eq!(deep_work["liked_by_user"], true);

    let (_, body) = call(&app, Method::GET, "/posts?scope=world&limit=3", Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, _) = call(&app, Method::GET, "/posts?scope=galaxy", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_like_and_unlike_are_idempotent() {
    let app = app();
    let token = login(&app, "linus@daybook.dev").await;
    let uri = format!("/posts/{}/like", GRACE_READING_GROUP);

    for _ in 0..2 {
        let (status, body) = call(&app, Method::POST, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["liked"], true);
    }
    let (_, post) = call(&app, Method::GET, &format!("/posts/{}", GRACE_READING_GROUP), Some(&token), None).await;
    assert_eq!(post["likes_count"], 2);

    for _ in 0..2 {
        let (status, body) = call(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["liked"], false);
    }
    let (_, body) = call(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(body["liked"], false);
}

#[tokio::test]
async fn test_post_lifecycle_and_ownership() {
    let app = app();
    let ada = login(&app, "ada@daybook.dev").await;
    let grace = login(&app, "grace@daybook.dev").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/posts",
        Some(&ada),
        Some(json!({ "content": "Tea with Babbage", "start_time": "16:00:00", "end_time": "17:00:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        "/posts",
        Some(&ada),
        Some(json!({ "content": "Backwards", "start_time": "17:00:00", "end_time": "16:00:00" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "end_time");

    let completed_uri = format!("/posts/{}/completed", id);
    let (status, _) = call(&app, Method::PUT, &completed_uri, Some(&grace), Some(json!({ "completed": true }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = call(&app, Method::PUT, &completed_uri, Some(&ada), Some(json!({ "completed": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], true);

    // Likes on the post do not block its deletion
    call(&app, Method::POST, &format!("/posts/{}/like", id), Some(&grace), None).await;
    let (status, _) = call(&app, Method::DELETE, &format!("/posts/{}", id), Some(&grace), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&app, Method::DELETE, &format!("/posts/{}", id), Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, &format!("/posts/{}", id), Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_follow_request_lifecycle() {
    let app = app();
    let ada = login(&app, "ada@daybook.dev").await;
    let linus = login(&app, "linus@daybook.dev").await;

    let (status, _) = call(&app, Method::POST, "/follows", Some(&linus), Some(json!({ "followee_id": LINUS }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&app, Method::GET, "/follows/incoming?status=pending", Some(&ada), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let status_uri = format!("/follows/{}/status", LINUS_TO_ADA);
    let (status, _) = call(&app, Method::PUT, &status_uri, Some(&linus), Some(json!({ "status": "accepted" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, Method::PUT, &status_uri, Some(&ada), Some(json!({ "status": "rejected" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");

    // Terminal states cannot move again
    let (status, _) = call(&app, Method::PUT, &status_uri, Some(&ada), Some(json!({ "status": "accepted" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Asking again after a rejection starts a fresh request
    let (status, body) = call(
        &app,
        Method::POST,
        "/follows",
        Some(&linus),
        Some(json!({ "followee_id": "550e8400-e29b-41d4-a716-446655440001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_ne!(body["id"], LINUS_TO_ADA);

    let (status, body) = call(&app, Method::DELETE, "/follows/550e8400-e29b-41d4-a716-446655440001", Some(&linus), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], true);
    let (_, body) = call(&app, Method::GET, "/follows/outgoing", Some(&linus), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_functions_use_envelope() {
    let app = app();
    let (_, body) = call(&app, Method::POST, "/auth/register", None, Some(json!({ "email": "fresh@daybook.dev" }))).await;
    let token = body["session_token"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::POST, "/functions/set-username", Some(&token), Some(json!({ "username": "GRACE" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("taken"));

    let (_, body) = call(&app, Method::POST, "/functions/set-username", Some(&token), Some(json!({ "username": "x" }))).await;
    assert_eq!(body["success"], false);

    let (status, body) = call(&app, Method::POST, "/functions/set-username", Some(&token), Some(json!({ "username": "fresh_face" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], "fresh_face");

    let (_, body) = call(&app, Method::GET, "/functions/search-users?q=GRA", Some(&token), None).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["id"], GRACE);

    let (status, body) = call(&app, Method::GET, "/functions/schedule?date=not-a-date", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = call(&app, Method::GET, "/functions/search-users?q=ada", None, None).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_schedule_crud_is_owner_scoped() {
    let app = app();
    let ada = login(&app, "ada@daybook.dev").await;
    let grace = login(&app, "grace@daybook.dev").await;

    let draft = json!({ "date": "2026-03-14", "start_time": "09:00:00", "end_time": "10:00:00", "text": "Standup" });
    let (_, body) = call(&app, Method::POST, "/functions/schedule", Some(&ada), Some(draft)).await;
    assert_eq!(body["success"], true);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = call(&app, Method::GET, "/functions/schedule?date=2026-03-14", Some(&grace), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let uri = format!("/functions/schedule/{}", id);
    let (status, body) = call(&app, Method::DELETE, &uri, Some(&grace), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let update = json!({ "date": "2026-03-14", "start_time": "11:00:00", "end_time": "10:00:00", "text": "Standup" });
    let (status, _) = call(&app, Method::PUT, &uri, Some(&ada), Some(update)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = call(&app, Method::DELETE, &uri, Some(&ada), None).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], id);
}

#[tokio::test]
async fn test_delete_account_removes_everything() {
    let app = app();
    let grace = login(&app, "grace@daybook.dev").await;

    let (status, body) = call(&app, Method::POST, "/functions/delete-account", Some(&grace), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], GRACE);

    // The session went with the account
    let (status, _) = call(&app, Method::GET, "/auth/validate", Some(&grace), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let ada = login(&app, "ada@daybook.dev").await;
    let (_, body) = call(&app, Method::GET, "/posts?scope=friends", Some(&ada), None).await;
    assert!(body.as_array().unwrap().is_empty());
    let (_, post) = call(&app, Method::GET, &format!("/posts/{}", ADA_DEEP_WORK), Some(&ada), None).await;
    assert_eq!(post["likes_count"], 1);
}
