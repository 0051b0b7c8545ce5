//! Integration tests for the session gateway: bearer injection,
//! auth-response capture, and the refresh-and-retry recovery cycle.

use std::sync::{Arc, Mutex};

use console_auth::{CredentialStore, REFRESH_TOKEN_KEY, TOKEN_KEY};
use console_session::{Navigator, RequestDescriptor, Session, SessionError};
use mockito::{Matcher, Server};
use url::Url;

/// Navigator that records every requested redirect.
#[derive(Default)]
struct RecordingNavigator {
    current: Mutex<String>,
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn at(path: &str) -> Self {
        Self {
            current: Mutex::new(path.to_owned()),
            visited: Mutex::new(Vec::new()),
        }
    }

    fn visited(&self) -> Vec<String> {
        self.visited.lock().expect("navigator lock").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current.lock().expect("navigator lock").clone()
    }

    fn navigate(&self, path: &str) {
        self.visited.lock().expect("navigator lock").push(path.to_owned());
        *self.current.lock().expect("navigator lock") = path.to_owned();
    }
}

fn session_for(server: &Server, store: Arc<CredentialStore>) -> Session {
    let base = Url::parse(&server.url()).expect("valid server URL");
    Session::builder(base, store).build().expect("session builds")
}

fn session_with_navigator(
    server: &Server,
    store: Arc<CredentialStore>,
    navigator: Arc<RecordingNavigator>,
) -> Session {
    let base = Url::parse(&server.url()).expect("valid server URL");
    Session::builder(base, store)
        .with_navigator(navigator)
        .build()
        .expect("session builds")
}

#[tokio::test]
async fn bearer_header_attached_exactly_once() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/users/api/v1/me")
        .match_header("authorization", "Bearer T1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"u-1"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(CredentialStore::in_memory());
    store.set(TOKEN_KEY, "T1");
    let session = session_for(&server, Arc::clone(&store));

    //* When
    let response = session
        .request(RequestDescriptor::get("/users/api/v1/me"))
        .await
        .expect("request should succeed");

    //* Then
    mock.assert_async().await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.body()["id"], "u-1");
}

#[tokio::test]
async fn no_bearer_header_without_a_token() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/users/api/v1")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(CredentialStore::in_memory());
    let session = session_for(&server, store);

    //* When
    let result = session.request(RequestDescriptor::get("/users/api/v1")).await;

    //* Then
    mock.assert_async().await;
    assert!(result.is_ok(), "unauthenticated request should still go out");
}

#[tokio::test]
async fn no_bearer_header_for_excluded_urls() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/public/assets/logo")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(CredentialStore::in_memory());
    store.set(TOKEN_KEY, "T1");
    let base = Url::parse(&server.url()).expect("valid server URL");
    let session = Session::builder(base, store)
        .with_excluded_url("/public/assets")
        .build()
        .expect("session builds");

    //* When
    session
        .request(RequestDescriptor::get("/public/assets/logo"))
        .await
        .expect("request should succeed");

    //* Then
    mock.assert_async().await;
}

#[tokio::test]
async fn default_content_type_is_json_unless_overridden() {
    //* Given
    let mut server = Server::new_async().await;
    let default_mock = server
        .mock("GET", "/users/api/v1")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;
    let override_mock = server
        .mock("GET", "/users/api/v1/raw")
        .match_header("content-type", "text/plain")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(CredentialStore::in_memory());
    let session = session_for(&server, store);

    //* When
    session
        .request(RequestDescriptor::get("/users/api/v1"))
        .await
        .expect("request should succeed");
    session
        .request(
            RequestDescriptor::get("/users/api/v1/raw").with_header(
                console_session::header::CONTENT_TYPE,
                console_session::header::HeaderValue::from_static("text/plain"),
            ),
        )
        .await
        .expect("request should succeed");

    //* Then
    default_mock.assert_async().await;
    override_mock.assert_async().await;
}

#[tokio::test]
async fn auth_endpoint_response_persists_token_pair() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/auth/api/v1/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token":"T1","refresh_token":"R1","user":{"id":"u-1"}}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(CredentialStore::in_memory());
    let session = session_for(&server, Arc::clone(&store));

    //* When
    session
        .request(
            RequestDescriptor::post("/auth/api/v1/login")
                .with_body(serde_json::json!({"email": "a@b.com", "password": "pw"})),
        )
        .await
        .expect("login should succeed");

    //* Then
    mock.assert_async().await;
    assert_eq!(store.access_token().as_deref(), Some("T1"));
    assert_eq!(store.refresh_token().as_deref(), Some("R1"));
}

#[tokio::test]
async fn non_auth_response_persists_nothing() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/products/api/v1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token":"sneaky","refresh_token":"sneaky"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(CredentialStore::in_memory());
    let session = session_for(&server, Arc::clone(&store));

    //* When
    session
        .request(RequestDescriptor::get("/products/api/v1"))
        .await
        .expect("request should succeed");

    //* Then
    mock.assert_async().await;
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
}

#[tokio::test]
async fn refresh_success_retries_once_and_stores_new_pair() {
    //* Given
    let mut server = Server::new_async().await;

    // The original request carries the stale token and is rejected.
    let stale_mock = server
        .mock("GET", "/users/api/v1/me")
        .match_header("authorization", "Bearer T1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let refresh_mock = server
        .mock("POST", "/auth/api/v1/token/refresh")
        .match_body(Matcher::Json(serde_json::json!({
            "refresh_token": "R1",
            "token": "T1",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token":"T2","refresh_token":"R2"}"#)
        .expect(1)
        .create_async()
        .await;

    // The retried request carries the refreshed token and succeeds.
    let retried_mock = server
        .mock("GET", "/users/api/v1/me")
        .match_header("authorization", "Bearer T2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"u-1"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(CredentialStore::in_memory());
    store.set(TOKEN_KEY, "T1");
    store.set(REFRESH_TOKEN_KEY, "R1");
    let session = session_for(&server, Arc::clone(&store));

    //* When
    let response = session
        .request(RequestDescriptor::get("/users/api/v1/me"))
        .await
        .expect("retried request should succeed");

    //* Then
    stale_mock.assert_async().await;
    refresh_mock.assert_async().await;
    retried_mock.assert_async().await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.body()["id"], "u-1");
    assert_eq!(store.access_token().as_deref(), Some("T2"));
    assert_eq!(store.refresh_token().as_deref(), Some("R2"));
}

#[tokio::test]
async fn persistent_401_refreshes_and_retries_exactly_once() {
    //* Given
    let mut server = Server::new_async().await;

    let stale_mock = server
        .mock("GET", "/users/api/v1/me")
        .match_header("authorization", "Bearer T1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let refresh_mock = server
        .mock("POST", "/auth/api/v1/token/refresh")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token":"T2","refresh_token":"R2"}"#)
        .expect(1)
        .create_async()
        .await;

    // Even the refreshed token is rejected; the session must give up.
    let retried_mock = server
        .mock("GET", "/users/api/v1/me")
        .match_header("authorization", "Bearer T2")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(CredentialStore::in_memory());
    store.set(TOKEN_KEY, "T1");
    store.set(REFRESH_TOKEN_KEY, "R1");
    let session = session_for(&server, Arc::clone(&store));

    //* When
    let result = session
        .request(RequestDescriptor::get("/users/api/v1/me"))
        .await;

    //* Then
    stale_mock.assert_async().await;
    refresh_mock.assert_async().await;
    retried_mock.assert_async().await;
    let error = result.expect_err("second 401 should propagate");
    assert!(
        matches!(error, SessionError::Status { status: 401, .. }),
        "expected Status 401, got {error:?}"
    );
}

#[tokio::test]
async fn refresh_failure_clears_store_and_navigates_to_login() {
    //* Given
    let mut server = Server::new_async().await;

    let stale_mock = server
        .mock("GET", "/users/api/v1/me")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let refresh_mock = server
        .mock("POST", "/auth/api/v1/token/refresh")
        .with_status(401)
        .with_body(r#"{"message":"refresh token expired"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(CredentialStore::in_memory());
    store.set(TOKEN_KEY, "T1");
    store.set(REFRESH_TOKEN_KEY, "R1");
    let navigator = Arc::new(RecordingNavigator::at("/console/users"));
    let session = session_with_navigator(&server, Arc::clone(&store), Arc::clone(&navigator));

    //* When
    let result = session
        .request(RequestDescriptor::get("/users/api/v1/me"))
        .await;

    //* Then
    stale_mock.assert_async().await;
    refresh_mock.assert_async().await;
    let error = result.expect_err("refresh failure is terminal");
    assert!(
        matches!(error, SessionError::RefreshExhausted(_)),
        "expected RefreshExhausted, got {error:?}"
    );
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
    assert_eq!(navigator.visited(), vec!["/console/auth/login".to_owned()]);
}

#[tokio::test]
async fn refresh_failure_on_login_screen_does_not_navigate() {
    //* Given
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/auth/api/v1/login")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("POST", "/auth/api/v1/token/refresh")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(CredentialStore::in_memory());
    let navigator = Arc::new(RecordingNavigator::at("/console/auth/login"));
    let session = session_with_navigator(&server, Arc::clone(&store), Arc::clone(&navigator));

    //* When
    let result = session
        .request(
            RequestDescriptor::post("/auth/api/v1/login")
                .with_body(serde_json::json!({"email": "a@b.com", "password": "wrong"})),
        )
        .await;

    //* Then
    assert!(result.is_err());
    assert!(navigator.visited().is_empty(), "already on the login screen");
}

#[tokio::test]
async fn non_401_failure_never_triggers_refresh() {
    //* Given
    let mut server = Server::new_async().await;

    let not_found_mock = server
        .mock("GET", "/products/api/v1/missing")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"product not found"}"#)
        .expect(1)
        .create_async()
        .await;

    let refresh_mock = server
        .mock("POST", "/auth/api/v1/token/refresh")
        .expect(0)
        .create_async()
        .await;

    let store = Arc::new(CredentialStore::in_memory());
    store.set(TOKEN_KEY, "T1");
    let session = session_for(&server, store);

    //* When
    let result = session
        .request(RequestDescriptor::get("/products/api/v1/missing"))
        .await;

    //* Then
    not_found_mock.assert_async().await;
    refresh_mock.assert_async().await;
    let error = result.expect_err("404 should propagate unchanged");
    assert_eq!(error.status(), Some(404));
    assert_eq!(
        error.body().and_then(|b| b["message"].as_str()),
        Some("product not found")
    );
}

#[tokio::test]
async fn transport_failure_surfaces_as_transport_error() {
    //* Given
    // A port nothing listens on.
    let store = Arc::new(CredentialStore::in_memory());
    let base = Url::parse("http://127.0.0.1:9").expect("valid URL");
    let session = Session::builder(base, store).build().expect("session builds");

    //* When
    let result = session.request(RequestDescriptor::get("/users/api/v1")).await;

    //* Then
    let error = result.expect_err("connection should fail");
    assert!(
        matches!(error, SessionError::Transport { .. }),
        "expected Transport, got {error:?}"
    );
}

#[tokio::test]
async fn logout_clears_store_and_navigates() {
    //* Given
    let server = Server::new_async().await;
    let store = Arc::new(CredentialStore::in_memory());
    store.set(TOKEN_KEY, "T1");
    store.set(REFRESH_TOKEN_KEY, "R1");
    let navigator = Arc::new(RecordingNavigator::at("/console/profile"));
    let session = session_with_navigator(&server, Arc::clone(&store), Arc::clone(&navigator));

    //* When
    session.logout();

    //* Then
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
    assert_eq!(navigator.visited(), vec!["/console/auth/login".to_owned()]);
}

#[tokio::test]
async fn query_parameters_are_forwarded() {
    //* Given
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/users/api/v1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page_no".into(), "2".into()),
            Matcher::UrlEncoded("page_size".into(), "5".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"users":[],"total":0}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(CredentialStore::in_memory());
    let session = session_for(&server, store);

    //* When
    session
        .request(
            RequestDescriptor::get("/users/api/v1")
                .with_param("page_no", 2)
                .with_param("page_size", 5),
        )
        .await
        .expect("request should succeed");

    //* Then
    mock.assert_async().await;
}
