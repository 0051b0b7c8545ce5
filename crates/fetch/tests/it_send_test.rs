//! Integration tests for the fetch lifecycle against a mock server.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use console_auth::CredentialStore;
use console_fetch::{Fetch, Notifier};
use console_session::{RequestDescriptor, Session};
use mockito::Server;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
struct Payload {
    v: i64,
}

/// Notifier that records every surfaced message.
#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("notifier lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.messages.lock().expect("notifier lock").push(message.to_owned());
    }
}

fn session_for(server: &Server) -> Arc<Session> {
    let base = Url::parse(&server.url()).expect("valid server URL");
    let store = Arc::new(CredentialStore::in_memory());
    Arc::new(Session::builder(base, store).build().expect("session builds"))
}

#[tokio::test]
async fn send_transitions_loading_then_success() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/x")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"v":1}"#)
        .expect(1)
        .create_async()
        .await;

    let session = session_for(&server);
    let fetch: Arc<Fetch<Payload>> =
        Arc::new(Fetch::new(session).with_warmup(Duration::from_millis(100)));

    //* When
    let in_flight = {
        let fetch = Arc::clone(&fetch);
        tokio::spawn(async move { fetch.send(RequestDescriptor::get("/x")).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let mid_flight = fetch.snapshot();
    let resolved = in_flight.await.expect("send task completes");

    //* Then
    assert!(mid_flight.is_loading, "loading must be observable before resolution");
    assert!(!mid_flight.is_success);
    assert!(!mid_flight.is_failed);

    assert!(resolved.is_success);
    assert!(!resolved.is_loading);
    assert_eq!(resolved.status_code, Some(200));
    assert_eq!(resolved.data.as_ref().map(|p| p.v), Some(1));

    // The resolved value and the observable snapshot agree.
    let settled = fetch.snapshot();
    assert!(settled.is_success);
    assert_eq!(settled.data.map(|p| p.v), Some(1));
}

#[tokio::test]
async fn failure_surfaces_server_message_and_notifies() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/users/api/v1")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"code":1002,"message":"validation failed","details":[{"field":"email","message":"is required"}]}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let session = session_for(&server);
    let notifier = Arc::new(RecordingNotifier::default());
    let fetch: Fetch<Payload> =
        Fetch::new(session).with_notifier(Arc::clone(&notifier) as Arc<dyn Notifier>);

    //* When
    let resolved = fetch
        .send(
            RequestDescriptor::post("/users/api/v1")
                .with_body(serde_json::json!({"username": "ada"})),
        )
        .await;

    //* Then
    assert!(resolved.is_failed);
    assert!(!resolved.is_success);
    assert_eq!(resolved.status_code, Some(400));
    assert_eq!(resolved.message.as_deref(), Some("validation failed"));
    let error = resolved.error.expect("structured error body");
    assert_eq!(error.code, Some(1002));
    assert_eq!(error.details[0].field, "email");
    assert_eq!(notifier.messages(), vec!["validation failed".to_owned()]);
}

#[tokio::test]
async fn failure_without_body_message_uses_generic_message() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/x")
        .with_status(500)
        .with_body("")
        .expect(1)
        .create_async()
        .await;

    let session = session_for(&server);
    let notifier = Arc::new(RecordingNotifier::default());
    let fetch: Fetch<Payload> =
        Fetch::new(session).with_notifier(Arc::clone(&notifier) as Arc<dyn Notifier>);

    //* When
    let resolved = fetch.send(RequestDescriptor::get("/x")).await;

    //* Then
    assert!(resolved.is_failed);
    assert_eq!(resolved.message.as_deref(), Some("Something went wrong"));
    assert_eq!(notifier.messages(), vec!["Something went wrong".to_owned()]);
}

#[tokio::test]
async fn sequential_sends_reuse_the_same_state() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/first")
        .with_status(200)
        .with_body(r#"{"v":1}"#)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/second")
        .with_status(200)
        .with_body(r#"{"v":2}"#)
        .expect(1)
        .create_async()
        .await;

    let session = session_for(&server);
    let fetch: Fetch<Payload> = Fetch::new(session);

    //* When
    let first = fetch.send(RequestDescriptor::get("/first")).await;
    let second = fetch.send(RequestDescriptor::get("/second")).await;

    //* Then
    assert_eq!(first.data.map(|p| p.v), Some(1));
    assert_eq!(second.data.map(|p| p.v), Some(2));
    assert_eq!(fetch.snapshot().data.map(|p| p.v), Some(2), "last send wins");
}
