//! # Tests for Handlers
//!
//! Router-level tests driving the full application against in-memory SQLite.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::crypto::CryptoKey;
use crate::publisher::{PlatformPublisher, PublishError, PublishRequest};
use crate::server::{AppState, create_app};

const TOKEN: &str = "test-operator-token";

struct StubPublisher {
    result: Result<String, PublishError>,
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl PlatformPublisher for StubPublisher {
    async fn publish(&self, _request: &PublishRequest) -> Result<String, PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.result.clone()
    }
}

async fn test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect sqlite");
    crate::db::run_migrations(&db).await.expect("migrations");
    db
}

async fn test_app(publisher: Option<Arc<dyn PlatformPublisher>>) -> Router {
    let config = AppConfig {
        operator_tokens: vec![TOKEN.to_string()],
        crypto_key: Some(vec![7u8; 32]),
        ..Default::default()
    };
    let state = AppState {
        config: Arc::new(config),
        db: test_db().await,
        crypto_key: CryptoKey::new(vec![7u8; 32]).expect("test crypto key"),
        publisher,
    };
    create_app(state)
}

fn stub(result: Result<String, PublishError>) -> Arc<StubPublisher> {
    slow_stub(result, Duration::ZERO)
}

fn slow_stub(result: Result<String, PublishError>, delay: Duration) -> Arc<StubPublisher> {
    Arc::new(StubPublisher {
        result,
        delay,
        calls: AtomicUsize::new(0),
    })
}

async fn send(app: &Router, method: &str, uri: &str, user: Option<i64>, body: Option<Value>) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", TOKEN));
    if let Some(user) = user {
        builder = builder.header("X-User-Id", user.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_account(app: &Router, user: i64, platform: &str) -> String {
    let response = send(
        app,
        "POST",
        "/social-accounts",
        Some(user),
        Some(json!({
            "platform": platform,
            "account_id": format!("acct-{}-{}", user, platform),
            "account_name": "Acme",
            "access_token": "platform-token"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["id"].as_str().unwrap().to_string()
}

async fn create_post(app: &Router, user: i64, account_id: &str) -> String {
    let response = send(
        app,
        "POST",
        "/posts",
        Some(user),
        Some(json!({
            "social_account_id": account_id,
            "content": "Launch day",
            "media_urls": ["https://cdn.example.com/launch.png"]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["status"], "draft");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn root_returns_service_info() {
    let app = test_app(None).await;
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["service"], "postpilot");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn healthz_reports_database() {
    let app = test_app(None).await;
    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["database"], "ok");
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let app = test_app(None).await;
    let response = app
        .oneshot(Request::builder().uri("/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/connect/{platform}"].is_object());
    assert!(body["paths"]["/posts/{id}/publish"].is_object());
    assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
}

#[tokio::test]
async fn protected_route_without_token_is_problem_json() {
    let app = test_app(None).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/posts")
                .header("X-User-Id", "7")
                .header("x-trace-id", "trace-abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    assert_eq!(response.headers().get("x-trace-id").unwrap(), "trace-abc");
    let body = json_body(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["trace_id"], "trace-abc");
}

#[tokio::test]
async fn connect_and_callback_round_trip() {
    let app = test_app(None).await;

    let response = send(
        &app,
        "POST",
        "/connect/linkedin",
        Some(7),
        Some(json!({ "auth_token": "pre-auth" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let state = body["state"].as_str().unwrap().to_string();
    assert_eq!(state.len(), 64);
    assert_eq!(body["platform"], "linkedin");

    let callback = format!("/oauth/callback/linkedin?state={}&code=auth-code", state);
    let response = app
        .clone()
        .oneshot(Request::builder().uri(&callback).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user_id"], 7);
    assert_eq!(body["platform"], "linkedin");
    assert_eq!(body["auth_token"], "pre-auth");
    assert_eq!(body["code"], "auth-code");

    // Replay must fail
    let response = app
        .oneshot(Request::builder().uri(&callback).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "INVALID_STATE");
}

#[tokio::test]
async fn connect_without_body_has_no_auth_token() {
    let app = test_app(None).await;

    let response = send(&app, "POST", "/connect/instagram", Some(3), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let state = json_body(response).await["state"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/oauth/callback/instagram?state={}&code=c", state))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await["auth_token"].is_null());
}

#[tokio::test]
async fn callback_platform_mismatch_consumes_state() {
    let app = test_app(None).await;

    let response = send(&app, "POST", "/connect/facebook", Some(5), None).await;
    let state = json_body(response).await["state"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/oauth/callback/linkedin?state={}&code=c", state))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "INVALID_STATE");
    assert_eq!(body["details"]["expected"], "facebook");

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/oauth/callback/facebook?state={}&code=c", state))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_with_provider_denial() {
    let app = test_app(None).await;

    let response = send(&app, "POST", "/connect/linkedin", Some(9), None).await;
    let state = json_body(response).await["state"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/oauth/callback/linkedin?state={}&error=access_denied",
                    state
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "OAUTH_DENIED");
    assert_eq!(body["details"]["error"], "access_denied");
}

#[tokio::test]
async fn callback_without_state_is_invalid() {
    let app = test_app(None).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/oauth/callback/linkedin?code=c")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "INVALID_STATE");
}

#[tokio::test]
async fn connect_rejects_unknown_platform() {
    let app = test_app(None).await;
    let response = send(&app, "POST", "/connect/myspace", Some(7), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn approve_then_publish_records_platform_id() {
    let publisher = stub(Ok("ext_123".to_string()));
    let app = test_app(Some(publisher.clone())).await;
    let account = create_account(&app, 7, "linkedin").await;
    let post = create_post(&app, 7, &account).await;

    let response = send(&app, "POST", &format!("/posts/{}/approve", post), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "approved");

    let response = send(&app, "POST", &format!("/posts/{}/publish", post), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "published");
    assert_eq!(body["platform_post_id"], "ext_123");
    assert!(body["published_at"].is_string());
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn publishing_a_draft_requires_immediate() {
    let publisher = stub(Ok("ext_9".to_string()));
    let app = test_app(Some(publisher.clone())).await;
    let account = create_account(&app, 7, "facebook").await;
    let post = create_post(&app, 7, &account).await;

    let response = send(&app, "POST", &format!("/posts/{}/publish", post), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["code"], "INVALID_TRANSITION");
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);

    let response = send(
        &app,
        "POST",
        &format!("/posts/{}/publish", post),
        Some(7),
        Some(json!({ "immediate": true })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "published");
}

#[tokio::test]
async fn failed_publish_keeps_status_and_records_error() {
    let publisher = stub(Err(PublishError::Rejected {
        status: 422,
        message: "duplicate content".to_string(),
    }));
    let app = test_app(Some(publisher)).await;
    let account = create_account(&app, 7, "linkedin").await;
    let post = create_post(&app, 7, &account).await;
    send(&app, "POST", &format!("/posts/{}/approve", post), Some(7), None).await;

    let response = send(&app, "POST", &format!("/posts/{}/publish", post), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["code"], "PUBLISH_FAILED");

    let response = send(&app, "GET", &format!("/posts/{}", post), Some(7), None).await;
    let body = json_body(response).await;
    assert_eq!(body["status"], "approved");
    assert!(
        body["last_error"]
            .as_str()
            .unwrap()
            .contains("duplicate content")
    );
    assert!(body["error_at"].is_string());
}

#[tokio::test]
async fn concurrent_publishes_reach_the_platform_once() {
    let publisher = slow_stub(Ok("ext_once".to_string()), Duration::from_millis(200));
    let app = test_app(Some(publisher.clone())).await;
    let account = create_account(&app, 7, "linkedin").await;
    let post = create_post(&app, 7, &account).await;
    send(&app, "POST", &format!("/posts/{}/approve", post), Some(7), None).await;

    let uri = format!("/posts/{}/publish", post);
    let (first, second) = tokio::join!(
        send(&app, "POST", &uri, Some(7), None),
        send(&app, "POST", &uri, Some(7), None)
    );

    let (winner, loser) = if first.status() == StatusCode::OK {
        (first, second)
    } else {
        (second, first)
    };
    assert_eq!(winner.status(), StatusCode::OK);
    assert_eq!(loser.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(loser).await["code"], "CONFLICT");
    assert_eq!(json_body(winner).await["platform_post_id"], "ext_once");
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reject_during_publish_is_a_conflict() {
    let publisher = slow_stub(Ok("ext_kept".to_string()), Duration::from_millis(300));
    let app = test_app(Some(publisher.clone())).await;
    let account = create_account(&app, 7, "linkedin").await;
    let post = create_post(&app, 7, &account).await;
    send(&app, "POST", &format!("/posts/{}/approve", post), Some(7), None).await;

    let publish_path = format!("/posts/{}/publish", post);
    let (published, rejected) = tokio::join!(
        send(&app, "POST", &publish_path, Some(7), None),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            send(&app, "POST", &format!("/posts/{}/reject", post), Some(7), None).await
        }
    );

    assert_eq!(rejected.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(rejected).await["code"], "CONFLICT");
    assert_eq!(published.status(), StatusCode::OK);

    let response = send(&app, "GET", &format!("/posts/{}", post), Some(7), None).await;
    let body = json_body(response).await;
    assert_eq!(body["status"], "published");
    assert_eq!(body["platform_post_id"], "ext_kept");
}

#[tokio::test]
async fn publish_without_gateway_is_unavailable() {
    let app = test_app(None).await;
    let account = create_account(&app, 7, "linkedin").await;
    let post = create_post(&app, 7, &account).await;
    send(&app, "POST", &format!("/posts/{}/approve", post), Some(7), None).await;

    let response = send(&app, "POST", &format!("/posts/{}/publish", post), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn rejected_post_cannot_be_approved() {
    let app = test_app(None).await;
    let account = create_account(&app, 7, "instagram").await;
    let post = create_post(&app, 7, &account).await;

    let response = send(&app, "POST", &format!("/posts/{}/reject", post), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "rejected");

    let response = send(&app, "POST", &format!("/posts/{}/approve", post), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["code"], "INVALID_TRANSITION");
    assert_eq!(body["details"]["current"], "rejected");
}

#[tokio::test]
async fn mark_published_requires_reason() {
    let app = test_app(None).await;
    let account = create_account(&app, 7, "linkedin").await;
    let post = create_post(&app, 7, &account).await;

    let response = send(
        &app,
        "POST",
        &format!("/posts/{}/mark-published", post),
        Some(7),
        Some(json!({ "reason": "  " })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        &format!("/posts/{}/mark-published", post),
        Some(7),
        Some(json!({ "reason": "posted manually from the app", "platform_post_id": "urn:li:1" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "published");
    assert_eq!(body["published_reason"], "posted manually from the app");
    assert_eq!(body["platform_post_id"], "urn:li:1");
}

#[tokio::test]
async fn schedule_accepts_past_and_clears() {
    let app = test_app(None).await;
    let account = create_account(&app, 7, "linkedin").await;
    let post = create_post(&app, 7, &account).await;

    let response = send(
        &app,
        "PUT",
        &format!("/posts/{}/schedule", post),
        Some(7),
        Some(json!({ "scheduled_at": "2020-01-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["scheduled_at"], "2020-01-01T00:00:00Z");
    assert_eq!(body["status"], "draft");

    let response = send(
        &app,
        "PUT",
        &format!("/posts/{}/schedule", post),
        Some(7),
        Some(json!({ "scheduled_at": null })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await["scheduled_at"].is_null());
}

#[tokio::test]
async fn posts_are_isolated_between_users() {
    let app = test_app(None).await;
    let account = create_account(&app, 7, "linkedin").await;
    let post = create_post(&app, 7, &account).await;

    let response = send(&app, "GET", &format!("/posts/{}", post), Some(8), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "POST", &format!("/posts/{}/approve", post), Some(8), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "GET", "/posts", Some(8), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["posts"], json!([]));

    // Another user cannot create posts on the account either
    let response = send(
        &app,
        "POST",
        "/posts",
        Some(8),
        Some(json!({ "social_account_id": account, "content": "hijack" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_posts_paginates_with_cursor() {
    let app = test_app(None).await;
    let account = create_account(&app, 7, "linkedin").await;
    let mut created = Vec::new();
    for _ in 0..3 {
        created.push(create_post(&app, 7, &account).await);
    }

    let response = send(&app, "GET", "/posts?limit=2", Some(7), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let first = json_body(response).await;
    assert_eq!(first["posts"].as_array().unwrap().len(), 2);
    let cursor = first["next_cursor"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "GET",
        &format!("/posts?limit=2&cursor={}", cursor.replace('+', "%2B").replace('/', "%2F").replace('=', "%3D")),
        Some(7),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let second = json_body(response).await;
    assert_eq!(second["posts"].as_array().unwrap().len(), 1);
    assert!(second["next_cursor"].is_null());

    let mut seen: Vec<String> = first["posts"]
        .as_array()
        .unwrap()
        .iter()
        .chain(second["posts"].as_array().unwrap())
        .map(|post| post["id"].as_str().unwrap().to_string())
        .collect();
    seen.sort();
    created.sort();
    assert_eq!(seen, created);
}

#[tokio::test]
async fn list_posts_filters_by_status_and_rejects_bad_cursor() {
    let app = test_app(None).await;
    let account = create_account(&app, 7, "linkedin").await;
    let approved = create_post(&app, 7, &account).await;
    create_post(&app, 7, &account).await;
    send(&app, "POST", &format!("/posts/{}/approve", approved), Some(7), None).await;

    let response = send(&app, "GET", "/posts?status=approved", Some(7), None).await;
    let body = json_body(response).await;
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["id"], approved.as_str());

    let response = send(&app, "GET", "/posts?cursor=not-a-cursor", Some(7), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/posts?limit=500", Some(7), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_post_validates_content() {
    let app = test_app(None).await;
    let account = create_account(&app, 7, "linkedin").await;

    let response = send(
        &app,
        "POST",
        "/posts",
        Some(7),
        Some(json!({ "social_account_id": account, "content": "   " })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "VALIDATION_FAILED");

    let response = send(&app, "POST", "/posts", Some(7), Some(json!({ "content": 4 }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_published_post_and_metrics() {
    let app = test_app(None).await;
    let account = create_account(&app, 7, "linkedin").await;
    let post = create_post(&app, 7, &account).await;
    send(
        &app,
        "POST",
        &format!("/posts/{}/mark-published", post),
        Some(7),
        Some(json!({ "reason": "published by hand" })),
    )
    .await;

    let response = send(
        &app,
        "PUT",
        &format!("/posts/{}/metrics", post),
        Some(7),
        Some(json!({ "likes": 10, "comments": 2, "shares": 1, "impressions": 400, "reach": 350 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", &format!("/posts/{}/metrics", post), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["impressions"], 400);

    let response = send(&app, "DELETE", &format!("/posts/{}", post), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &format!("/posts/{}", post), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_reject_negative_counts() {
    let app = test_app(None).await;
    let account = create_account(&app, 7, "linkedin").await;
    let post = create_post(&app, 7, &account).await;

    let response = send(
        &app,
        "PUT",
        &format!("/posts/{}/metrics", post),
        Some(7),
        Some(json!({ "likes": -1 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", &format!("/posts/{}/metrics", post), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn social_accounts_hide_tokens_and_cascade_on_delete() {
    let app = test_app(None).await;
    let account = create_account(&app, 7, "linkedin").await;
    let post = create_post(&app, 7, &account).await;

    let response = send(&app, "GET", "/social-accounts", Some(7), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let accounts = body["accounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["has_access_token"], true);
    assert!(accounts[0].get("access_token").is_none());

    // Duplicate link is a conflict
    let response = send(
        &app,
        "POST",
        "/social-accounts",
        Some(7),
        Some(json!({ "platform": "linkedin", "account_id": "acct-7-linkedin" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, "DELETE", &format!("/social-accounts/{}", account), Some(8), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "DELETE", &format!("/social-accounts/{}", account), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &format!("/posts/{}", post), Some(7), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
