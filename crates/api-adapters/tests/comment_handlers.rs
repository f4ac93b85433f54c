use api_adapters::{router, ApiMetrics, AppState};
use auth_adapters::{Argon2Hasher, JwtIssuer};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use domains::SystemClock;
use serde_json::{json, Value};
use services::{AuthService, CommentService, NotificationService};
use std::sync::Arc;
use std::time::Duration;
use storage_adapters::{
    InMemoryCommentCache, InMemoryCommentRepository, InMemoryNotificationRepository,
    InMemoryUserRepository, QueuedDispatcher,
};
use tower::ServiceExt;

fn app() -> Router {
    let clock = Arc::new(SystemClock);
    let users = Arc::new(InMemoryUserRepository::new());
    let notifications = Arc::new(InMemoryNotificationRepository::new());
    let (dispatcher, _worker) = QueuedDispatcher::spawn(notifications.clone(), clock.clone(), 64);

    let comments = CommentService::new(
        Arc::new(InMemoryCommentRepository::with_users(users.clone())),
        Arc::new(InMemoryCommentCache::new()),
        Arc::new(dispatcher),
        clock.clone(),
    );
    let auth = AuthService::new(
        users,
        Arc::new(Argon2Hasher::new()),
        Arc::new(JwtIssuer::new(b"handler-tests", chrono::Duration::hours(1))),
        clock,
    );

    router(AppState {
        comments: Arc::new(comments),
        notifications: Arc::new(NotificationService::new(notifications)),
        auth: Arc::new(auth),
        metrics: Arc::new(ApiMetrics::new()),
    })
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
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
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["access_token"].as_str().unwrap().to_string()
}

async fn post_comment(app: &Router, token: &str, content: &str, parent: Option<&str>) -> Value {
    let (status, body) = call(
        app,
        Method::POST,
        "/comments",
        Some(token),
        Some(json!({ "content": content, "parentId": parent })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn test_login_and_profile() {
    let app = app();
    register(&app, "alice").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::GET, "/auth/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert!(body.get("passwordHash").is_none());

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "nope-nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_comments_require_a_token() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/comments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "missing bearer token");

    let (status, _) = call(&app, Method::GET, "/comments", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reply_builds_tree_and_notifies_parent_author() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let root = post_comment(&app, &alice, "root", None).await;
    let root_id = root["id"].as_str().unwrap();
    assert_eq!(root["authorName"], "alice");
    assert_eq!(root["canEdit"], true);

    let reply = post_comment(&app, &bob, "reply", Some(root_id)).await;
    assert_eq!(reply["parent"]["id"], root_id);

    let (status, forest) = call(&app, Method::GET, "/comments", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let forest = forest.as_array().unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0]["replies"][0]["content"], "reply");
    assert_eq!(forest[0]["replies"][0]["isDeleted"], false);

    // Delivery happens on the background worker.
    let mut unread = Value::Null;
    for _ in 0..50 {
        (_, unread) = call(&app, Method::GET, "/notifications/unread-count", Some(&alice), None).await;
        if unread == json!(1) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(unread, json!(1));

    let (_, inbox) = call(&app, Method::GET, "/notifications", Some(&alice), None).await;
    assert_eq!(inbox[0]["message"], "bob replied to your comment");
    assert_eq!(inbox[0]["type"], "reply");
    let note_id = inbox[0]["id"].as_str().unwrap().to_string();

    let uri = format!("/notifications/{note_id}/read");
    let (status, _) = call(&app, Method::PATCH, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = call(&app, Method::PATCH, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isRead"], true);

    let (_, bob_unread) = call(&app, Method::GET, "/notifications/unread-count", Some(&bob), None).await;
    assert_eq!(bob_unread, json!(0));
}

#[tokio::test]
async fn test_lifecycle_errors_map_to_statuses() {
    let app = app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let root = post_comment(&app, &alice, "mine", None).await;
    let uri = format!("/comments/{}", root["id"].as_str().unwrap());

    let (status, body) = call(&app, Method::PATCH, &uri, Some(&bob), Some(json!({ "content": "x" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, body) = call(&app, Method::PATCH, &uri, Some(&alice), Some(json!({ "content": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = call(&app, Method::PATCH, &uri, Some(&alice), Some(json!({ "content": "edited" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "edited");

    let restore_uri = format!("{uri}/restore");
    let (status, body) = call(&app, Method::POST, &restore_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "comment is not deleted");

    let (status, body) = call(&app, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isDeleted"], true);
    assert_eq!(body["canRestore"], true);

    let (status, body) = call(&app, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "comment is already deleted");

    let (_, forest) = call(&app, Method::GET, "/comments", Some(&alice), None).await;
    assert_eq!(forest, json!([]));

    let (status, body) = call(&app, Method::POST, &restore_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isDeleted"], false);

    let missing = format!("/comments/{}", uuid::Uuid::now_v7());
    let (status, body) = call(&app, Method::GET, &missing, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_metrics_and_health() {
    let app = app();
    let alice = register(&app, "alice").await;
    post_comment(&app, &alice, "counted", None).await;

    let response = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec(),
    )
    .unwrap();
    assert!(text.contains("operation=\"Create\",outcome=\"Ok\""));

    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}
