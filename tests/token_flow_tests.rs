//! Save / retrieve flow tests
//!
//! Exercises the token handlers through the full router with real RS256
//! bearer tokens, and checks resolve-then-create-or-put sequencing against a
//! recording secret store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use token_vault::auth::JwtVerifier;
use token_vault::config::AuthConfig;
use token_vault::secret::{
    InMemorySecretStore, SecretCreator, SecretError, SecretGetter, SecretId, SecretPutter,
    SecretResolver,
};
use token_vault::server::{AppState, create_router};
use token_vault::token::{SaveToken, Token, TokenRetriever, TokenSaver};

const SIGNING_KEY: &[u8] = include_bytes!("fixtures/signing_key.pem");
const PUBLIC_DER: &[u8] = include_bytes!("fixtures/signing_key.pub.der");

fn bearer(sub: &str) -> String {
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY).unwrap();
    let token =
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &json!({"sub": sub}), &key).unwrap();
    format!("Bearer {token}")
}

fn app_with_store<S>(store: Arc<S>) -> Router
where
    S: SecretResolver + SecretGetter + SecretPutter + SecretCreator + 'static,
{
    let state = Arc::new(AppState {
        saver: Arc::new(TokenSaver::from_store("test", store.clone())),
        retriever: Arc::new(TokenRetriever::from_store("test", store)),
    });
    let verifier = JwtVerifier::from_der(PUBLIC_DER, &AuthConfig::default()).unwrap();
    create_router(state, Arc::new(verifier), 64 * 1024)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn save_request(sub: &str, body: &str) -> Request<Body> {
    Request::put("/token/save")
        .header(header::AUTHORIZATION, bearer(sub))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn get_request(sub: &str) -> Request<Body> {
    Request::get("/token/get")
        .header(header::AUTHORIZATION, bearer(sub))
        .body(Body::empty())
        .unwrap()
}

const U1_BODY: &str = r#"{"user_id":"u1","access_token":"a","refresh_token":"r","expiry":"2030-01-01T00:00:00Z"}"#;

// ============================================================================
// Recording store
// ============================================================================

/// Secret store that records every call and delegates to an in-memory map.
#[derive(Default)]
struct RecordingStore {
    inner: InMemorySecretStore,
    calls: Mutex<Vec<String>>,
    fail_describe: bool,
}

impl RecordingStore {
    fn record(&self, op: &str, id: &SecretId) {
        self.calls.lock().unwrap().push(format!("{op} {id}"));
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretResolver for RecordingStore {
    async fn describe(&self, id: &SecretId) -> Result<(), SecretError> {
        self.record("describe", id);
        if self.fail_describe {
            return Err(SecretError::Upstream {
                id: id.to_string(),
                message: "throttled".to_string(),
            });
        }
        self.inner.describe(id).await
    }
}

#[async_trait]
impl SecretGetter for RecordingStore {
    async fn get(&self, id: &SecretId) -> Result<String, SecretError> {
        self.record("get", id);
        self.inner.get(id).await
    }
}

#[async_trait]
impl SecretPutter for RecordingStore {
    async fn put(&self, id: &SecretId, value: &str) -> Result<(), SecretError> {
        self.record("put", id);
        self.inner.put(id, value).await
    }
}

#[async_trait]
impl SecretCreator for RecordingStore {
    async fn create(&self, id: &SecretId, value: &str) -> Result<(), SecretError> {
        self.record("create", id);
        self.inner.create(id, value).await
    }
}

fn sample_token() -> Token {
    serde_json::from_str(r#"{"access_token":"a","refresh_token":"r","expiry":"2030-01-01T00:00:00Z"}"#)
        .unwrap()
}

// ============================================================================
// Sequencing
// ============================================================================

#[tokio::test]
async fn test_first_save_creates_secret() {
    // GIVEN: no secret for u1
    let store = Arc::new(RecordingStore::default());
    let saver = TokenSaver::from_store("test", store.clone());

    // WHEN: a token is saved
    saver.save_token("u1", &sample_token()).await.unwrap();

    // THEN: describe found nothing, so create ran and put did not
    assert_eq!(store.calls(), vec!["describe test/token/u1", "create test/token/u1"]);
}

#[tokio::test]
async fn test_second_save_puts_secret() {
    let store = Arc::new(RecordingStore::default());
    let saver = TokenSaver::from_store("test", store.clone());
    saver.save_token("u1", &sample_token()).await.unwrap();

    saver.save_token("u1", &sample_token()).await.unwrap();

    assert_eq!(
        store.calls(),
        vec![
            "describe test/token/u1",
            "create test/token/u1",
            "describe test/token/u1",
            "put test/token/u1",
        ]
    );
}

#[tokio::test]
async fn test_describe_failure_aborts_save() {
    // GIVEN: a store whose existence probe fails with a non-"not found" error
    let store = Arc::new(RecordingStore {
        fail_describe: true,
        ..RecordingStore::default()
    });
    let app = app_with_store(store.clone());

    // WHEN: a token is saved
    let (status, body) = send(&app, save_request("u1", U1_BODY)).await;

    // THEN: neither create nor put ran
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"Error": "Could not save token"}));
    assert_eq!(store.calls(), vec!["describe test/token/u1"]);
}

// ============================================================================
// Handlers
// ============================================================================

#[tokio::test]
async fn test_save_then_get_round_trip() {
    let app = app_with_store(Arc::new(InMemorySecretStore::new()));

    let (status, body) = send(&app, save_request("u1", U1_BODY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"Message": "Token saved successfully"}));

    let (status, body) = send(&app, get_request("u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "access_token": "a",
            "refresh_token": "r",
            "expiry": "2030-01-01T00:00:00Z"
        })
    );
}

#[tokio::test]
async fn test_expired_token_is_still_returned() {
    let app = app_with_store(Arc::new(InMemorySecretStore::new()));
    let body = r#"{"user_id":"u1","access_token":"old","refresh_token":"r","expiry":"2000-01-01T00:00:00Z"}"#;
    send(&app, save_request("u1", body)).await;

    let (status, body) = send(&app, get_request("u1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_token"], "old");
    assert_eq!(body["expiry"], "2000-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_users_do_not_see_each_other() {
    let app = app_with_store(Arc::new(InMemorySecretStore::new()));
    send(&app, save_request("u1", U1_BODY)).await;

    let (status, body) = send(&app, get_request("u2")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"Error": "Could not retrieve token"}));
}

#[tokio::test]
async fn test_save_for_other_user_is_unauthorized() {
    // GIVEN: a bearer token for u2
    let store = Arc::new(RecordingStore::default());
    let app = app_with_store(store.clone());

    // WHEN: it tries to save a token for u1
    let (status, body) = send(&app, save_request("u2", U1_BODY)).await;

    // THEN: rejected before the store is touched
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"Error": "Could not authenticate user"}));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let app = app_with_store(Arc::new(InMemorySecretStore::new()));
    let bodies = [
        "not json",
        r#"{"user_id":"u1","access_token":"a","refresh_token":"r"}"#,
        r#"{"user_id":"u1","access_token":"","refresh_token":"r","expiry":"2030-01-01T00:00:00Z"}"#,
        r#"{"user_id":"u1","access_token":"a","refresh_token":"r","expiry":"tomorrow"}"#,
    ];

    for body in bodies {
        let (status, json) = send(&app, save_request("u1", body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json, json!({"Error": "Could not save token"}));
    }
}

#[tokio::test]
async fn test_save_without_json_content_type_is_bad_request() {
    let app = app_with_store(Arc::new(InMemorySecretStore::new()));
    let request = Request::put("/token/save")
        .header(header::AUTHORIZATION, bearer("u1"))
        .body(Body::from(U1_BODY))
        .unwrap();

    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_reads_blob_written_by_other_clients() {
    // GIVEN: a stored blob with an extra token_type field
    let store = Arc::new(InMemorySecretStore::new());
    store
        .create(
            &SecretId::compose("test", "token", "u1"),
            r#"{"access_token":"a","token_type":"Bearer","refresh_token":"r","expiry":"2030-01-01T00:00:00Z"}"#,
        )
        .await
        .unwrap();
    let app = app_with_store(store);

    // WHEN: the user fetches it
    let (status, body) = send(&app, get_request("u1")).await;

    // THEN: only the three token fields come back
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "access_token": "a",
            "refresh_token": "r",
            "expiry": "2030-01-01T00:00:00Z"
        })
    );
}
