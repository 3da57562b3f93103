//! Resource actions against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives a notes resource
//! through `UreqTransport`. Each call registers success and error callbacks
//! that report into a channel, so the test observes exactly which one fired.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use mock_server::{Echo, Note};
use rest_resource::{
    ActionSpec, Actions, CallArg, Callback, HttpMethod, Outcome, ParamDefaults, Resource,
    RouteOptions, Service, ServiceDefaults, TransportError, UreqTransport,
};
use serde_json::json;
use uuid::Uuid;

fn start_server() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn service() -> Service {
    Service::new(ServiceDefaults::default(), Arc::new(UreqTransport::new()))
}

/// Call an action with trailing success/error callbacks and wait for it to settle.
fn call_and_wait(resource: &Resource, action: &str, mut args: Vec<CallArg>) -> (&'static str, Outcome) {
    let (tx, rx) = mpsc::channel();
    let tx_err = tx.clone();
    args.push(Callback::new(move |outcome| tx.send(("success", outcome)).unwrap()).into());
    args.push(Callback::new(move |outcome| tx_err.send(("error", outcome)).unwrap()).into());
    resource.call(action, args).unwrap();
    rx.recv_timeout(Duration::from_secs(10)).expect("request settled")
}

#[test]
fn notes_lifecycle() {
    let addr = start_server();
    let mut actions = Actions::new();
    actions.insert("update".to_string(), ActionSpec::new(HttpMethod::Put));
    let notes = service().resource(
        &format!("http://{addr}/notes/:id"),
        ParamDefaults::new().with("id", json!("@id")),
        actions,
        RouteOptions::default(),
    );

    // save: the body has no id, so the placeholder collapses to /notes
    let (which, outcome) = call_and_wait(
        &notes,
        "save",
        vec![json!({"author": "alice", "text": "first"}).into()],
    );
    assert_eq!(which, "success");
    let created: Note = outcome.unwrap().json().unwrap();
    assert_eq!(created.author, "alice");

    let (_, outcome) = call_and_wait(
        &notes,
        "save",
        vec![json!({"author": "bob", "text": "second"}).into()],
    );
    outcome.unwrap();

    // query: non-placeholder params become the query string
    let (which, outcome) = call_and_wait(&notes, "query", vec![json!({"author": "alice"}).into()]);
    assert_eq!(which, "success");
    let listed: Vec<Note> = outcome.unwrap().json().unwrap();
    assert_eq!(listed, vec![created.clone()]);

    // get by explicit id
    let (which, outcome) = call_and_wait(&notes, "get", vec![json!({"id": created.id}).into()]);
    assert_eq!(which, "success");
    let fetched: Note = outcome.unwrap().json().unwrap();
    assert_eq!(fetched, created);

    // update: id extracted from the body
    let mut changed = created.clone();
    changed.text = "edited".to_string();
    let (which, outcome) = call_and_wait(
        &notes,
        "update",
        vec![json!({}).into(), serde_json::to_value(&changed).unwrap().into()],
    );
    assert_eq!(which, "success");
    let updated: Note = outcome.unwrap().json().unwrap();
    assert_eq!(updated.text, "edited");

    // remove, then the note is gone
    let (which, outcome) = call_and_wait(&notes, "remove", vec![json!({"id": created.id}).into()]);
    assert_eq!(which, "success");
    assert_eq!(outcome.unwrap().status, 204);

    let (which, outcome) = call_and_wait(&notes, "get", vec![json!({"id": created.id}).into()]);
    assert_eq!(which, "error");
    assert!(matches!(outcome, Err(TransportError::Status { status: 404, .. })));
}

#[test]
fn unknown_note_reaches_error_callback() {
    let addr = start_server();
    let notes = service().resource(
        &format!("http://{addr}/notes/:id"),
        ParamDefaults::new(),
        Actions::new(),
        RouteOptions::default(),
    );

    let (which, outcome) = call_and_wait(&notes, "delete", vec![json!({"id": Uuid::nil()}).into()]);
    assert_eq!(which, "error");
    assert!(matches!(outcome, Err(TransportError::Status { status: 404, .. })));
}

#[test]
fn path_and_query_arrive_encoded() {
    let addr = start_server();
    let echo = service().resource(
        &format!("http://{addr}/echo/:dir/:file"),
        ParamDefaults::new().with("dir", json!("a b")),
        Actions::new(),
        RouteOptions::default(),
    );

    let (which, outcome) = call_and_wait(
        &echo,
        "get",
        vec![json!({"file": "me@x:1", "q": "x y", "filter": {"tag": "t"}}).into()],
    );
    assert_eq!(which, "success");
    let seen: Echo = outcome.unwrap().json().unwrap();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/echo/a%20b/me@x:1");
    assert_eq!(seen.query.as_deref(), Some("q=x%20y&filter%5Btag%5D=t"));
    assert!(seen.body.is_empty());
}

#[test]
fn body_is_sent_as_json_for_patch() {
    let addr = start_server();
    let mut actions = Actions::new();
    actions.insert("patch".to_string(), ActionSpec::new(HttpMethod::Patch));
    let echo = service().resource(
        &format!("http://{addr}/echo"),
        ParamDefaults::new(),
        actions,
        RouteOptions::default(),
    );

    let (which, outcome) = call_and_wait(&echo, "patch", vec![json!({"k": [1, 2]}).into()]);
    assert_eq!(which, "success");
    let seen: Echo = outcome.unwrap().json().unwrap();
    assert_eq!(seen.method, "PATCH");
    assert_eq!(seen.body, r#"{"k":[1,2]}"#);
}

#[test]
fn server_errors_reach_error_callback_with_body() {
    let addr = start_server();
    let status = service().resource(
        &format!("http://{addr}/status/:code"),
        ParamDefaults::new(),
        Actions::new(),
        RouteOptions::default(),
    );

    let (which, outcome) = call_and_wait(&status, "get", vec![json!({"code": 503}).into()]);
    assert_eq!(which, "error");
    assert_eq!(
        outcome.unwrap_err(),
        TransportError::Status {
            status: 503,
            body: "status 503".to_string()
        }
    );
}

#[test]
fn unreachable_host_reaches_error_callback() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let dead = service().resource(
        &format!("http://{addr}/nothing"),
        ParamDefaults::new(),
        Actions::new(),
        RouteOptions::default(),
    );

    let (which, outcome) = call_and_wait(&dead, "get", Vec::new());
    assert_eq!(which, "error");
    assert!(matches!(outcome, Err(TransportError::Io(_))));
}
