use std::sync::Arc;

use async_trait::async_trait;
use authn_webhook::app::build_router;
use authn_webhook::services::directory::{DirectoryClient, DirectoryError, DirectoryRecord};
use authn_webhook::state::AppState;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

struct DirectoryEntry {
    username: &'static str,
    password: &'static str,
    groups: &'static [&'static str],
}

/// In-memory stand-in for the LDAP backend. Mirrors the production contract:
/// zero-or-one record, with an ambiguous match reported as no match.
struct StaticDirectory {
    entries: Vec<DirectoryEntry>,
}

#[async_trait]
impl DirectoryClient for StaticDirectory {
    async fn lookup(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<DirectoryRecord>, DirectoryError> {
        let matches: Vec<&DirectoryEntry> = self
            .entries
            .iter()
            .filter(|e| e.username == username && e.password == password)
            .collect();

        if matches.len() != 1 {
            return Ok(None);
        }

        Ok(Some(DirectoryRecord {
            dn: format!("cn={},dc=example,dc=com", username),
            groups: matches[0].groups.iter().map(|g| g.to_string()).collect(),
        }))
    }
}

struct UnreachableDirectory;

#[async_trait]
impl DirectoryClient for UnreachableDirectory {
    async fn lookup(
        &self,
        _username: &str,
        _password: &str,
    ) -> Result<Option<DirectoryRecord>, DirectoryError> {
        Err(DirectoryError::Unavailable(
            "connection refused".to_string(),
        ))
    }
}

fn router_with(directory: Arc<dyn DirectoryClient>) -> Router {
    build_router(AppState::new(directory))
}

fn sample_router() -> Router {
    router_with(Arc::new(StaticDirectory {
        entries: vec![
            DirectoryEntry {
                username: "alice",
                password: "s3cret",
                groups: &["eng", "oncall"],
            },
            DirectoryEntry {
                username: "carol",
                password: "pw",
                groups: &["eng"],
            },
            // Two entries answer to the same credentials.
            DirectoryEntry {
                username: "dave",
                password: "pw",
                groups: &["a"],
            },
            DirectoryEntry {
                username: "dave",
                password: "pw",
                groups: &["b"],
            },
        ],
    }))
}

async fn post_review(router: Router, body: String) -> (StatusCode, String) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/tokenreviews")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .expect("response");

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn review_body(token: &str) -> String {
    json!({
        "apiVersion": "authentication.k8s.io/v1",
        "kind": "TokenReview",
        "spec": {"token": token}
    })
    .to_string()
}

#[tokio::test]
async fn authenticates_matching_credentials() {
    let (status, body) = post_review(sample_router(), review_body("alice:s3cret")).await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        value.get("status").unwrap(),
        &json!({
            "authenticated": true,
            "user": {"username": "alice", "uid": "alice", "groups": ["eng", "oncall"]}
        })
    );

    // TypeMeta is echoed through.
    assert_eq!(
        value.get("apiVersion").and_then(Value::as_str),
        Some("authentication.k8s.io/v1")
    );
    assert_eq!(value.get("kind").and_then(Value::as_str), Some("TokenReview"));
}

#[tokio::test]
async fn token_never_appears_in_response() {
    let (_, body) = post_review(sample_router(), review_body("alice:s3cret")).await;

    let value: Value = serde_json::from_str(&body).unwrap();
    assert!(value.get("spec").is_none());
    assert!(!body.contains("s3cret"));
    assert!(!body.contains("alice:"));
}

#[tokio::test]
async fn wrong_password_is_unauthenticated() {
    let (status, body) = post_review(sample_router(), review_body("alice:wrong")).await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value.get("status").unwrap(), &json!({"authenticated": false}));
    assert!(!body.contains("wrong"));
}

#[tokio::test]
async fn unknown_user_is_unauthenticated() {
    let (status, body) = post_review(sample_router(), review_body("mallory:pw")).await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["status"]["authenticated"], json!(false));
    assert!(value["status"].get("user").is_none());
}

#[tokio::test]
async fn ambiguous_match_is_unauthenticated() {
    let (status, body) = post_review(sample_router(), review_body("dave:pw")).await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["status"]["authenticated"], json!(false));
}

#[tokio::test]
async fn token_without_separator_is_bad_request() {
    let (status, body) = post_review(sample_router(), review_body("bob")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["error"]["code"], json!("MALFORMED_TOKEN"));
}

#[tokio::test]
async fn undecodable_body_is_bad_request() {
    let (status, body) = post_review(sample_router(), "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["error"]["code"], json!("INVALID_REVIEW"));
}

#[tokio::test]
async fn directory_outage_is_answered_not_fatal() {
    let router = router_with(Arc::new(UnreachableDirectory));

    let (status, body) = post_review(router.clone(), review_body("alice:s3cret")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["error"]["code"], json!("DIRECTORY_UNAVAILABLE"));

    // The listener keeps serving after a backend failure.
    let health = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("health response");
    assert_eq!(health.status(), StatusCode::OK);

    let (status, _) = post_review(router, review_body("alice:s3cret")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn bad_request_does_not_poison_later_requests() {
    let router = sample_router();

    let (status, _) = post_review(router.clone(), review_body("bob")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_review(router, review_body("carol:pw")).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["status"]["authenticated"], json!(true));
}
