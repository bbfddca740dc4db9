//! Tests for the Supabase client against an in-process mock PostgREST server
//!
//! Tests cover:
//! - Request shape (method, filters, headers, JSON body) for each operation
//! - NULL <-> empty string mapping in both directions
//! - Error reporting for rejected requests and unreachable servers

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::any,
    Router,
};
use folio_common::config::RemoteConfig;
use folio_common::model::{Assignment, AssignmentPatch, NewAssignment};
use folio_server::remote::{RemoteError, RemoteSync, SupabaseClient};
use serde_json::{json, Value};

/// Request as seen by the mock server
#[derive(Debug, Clone)]
struct Captured {
    method: Method,
    query: String,
    apikey: Option<String>,
    authorization: Option<String>,
    prefer: Option<String>,
    body: Option<Value>,
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<Captured>>>,
    status: StatusCode,
    response: String,
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().unwrap().push(Captured {
        method,
        query: uri.query().unwrap_or_default().to_string(),
        apikey: header("apikey"),
        authorization: header("authorization"),
        prefer: header("prefer"),
        body: serde_json::from_str(&body).ok(),
    });

    (state.status, state.response.clone())
}

/// Start a mock server; returns the client and the captured request log
async fn start_mock(status: StatusCode, response: &str) -> (SupabaseClient, Arc<Mutex<Vec<Captured>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        requests: requests.clone(),
        status,
        response: response.to_string(),
    };

    let app = Router::new()
        .route("/rest/v1/assignments", any(record))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = SupabaseClient::new(&RemoteConfig {
        url: format!("http://{}", addr),
        anon_key: "anon-key".to_string(),
        table: "assignments".to_string(),
    })
    .unwrap();

    (client, requests)
}

fn only_request(requests: &Arc<Mutex<Vec<Captured>>>) -> Captured {
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1, "expected exactly one request");
    requests[0].clone()
}

#[tokio::test]
async fn test_pull_orders_newest_first_and_maps_nulls() {
    let rows = json!([
        {
            "id": 8,
            "created_at": "2025-03-01T12:00:00+00:00",
            "title": "Newest",
            "description": null,
            "section": "Section 2",
            "content": "<p>hi</p>",
            "youtube_url": null
        },
        {
            "id": 3,
            "created_at": "2025-02-01T12:00:00+00:00",
            "title": "Older",
            "description": "Has text",
            "section": "Section 1",
            "content": null,
            "youtube_url": "https://youtu.be/dQw4w9WgXcQ"
        }
    ]);
    let (client, requests) = start_mock(StatusCode::OK, &rows.to_string()).await;

    let pulled = client.pull().await.unwrap();

    assert_eq!(pulled.len(), 2);
    assert_eq!(pulled[0].id, 8);
    assert_eq!(pulled[0].description, "");
    assert_eq!(pulled[0].youtube_url, "");
    assert_eq!(pulled[0].content, "<p>hi</p>");
    assert_eq!(pulled[1].content, "");
    assert_eq!(pulled[1].youtube_url, "https://youtu.be/dQw4w9WgXcQ");
    assert!(pulled[1].created_at.is_some());

    let request = only_request(&requests);
    assert_eq!(request.method, Method::GET);
    assert!(request.query.contains("select=*") || request.query.contains("select=%2A"));
    assert!(request.query.contains("order=created_at.desc"));
    assert_eq!(request.apikey.as_deref(), Some("anon-key"));
    assert_eq!(request.authorization.as_deref(), Some("Bearer anon-key"));
}

#[tokio::test]
async fn test_push_create_sends_id_and_nulls() {
    let (client, requests) = start_mock(StatusCode::CREATED, "").await;
    let assignment = Assignment::from_new(5, NewAssignment::new("Servo", "Section 4"));

    client.push_create(&assignment).await.unwrap();

    let request = only_request(&requests);
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.prefer.as_deref(), Some("return=minimal"));
    let body = request.body.unwrap();
    assert_eq!(body["id"], 5);
    assert_eq!(body["title"], "Servo");
    assert_eq!(body["section"], "Section 4");
    assert!(body["content"].is_null());
    assert!(body["youtube_url"].is_null());
}

#[tokio::test]
async fn test_push_update_filters_by_id() {
    let (client, requests) = start_mock(StatusCode::NO_CONTENT, "").await;
    let patch = AssignmentPatch {
        section: Some("Section 9".to_string()),
        description: Some(String::new()),
        ..Default::default()
    };

    client.push_update(12, &patch).await.unwrap();

    let request = only_request(&requests);
    assert_eq!(request.method, Method::PATCH);
    assert_eq!(request.query, "id=eq.12");
    let body = request.body.unwrap();
    assert_eq!(body.as_object().unwrap().len(), 2);
    assert_eq!(body["section"], "Section 9");
    assert!(body["description"].is_null());
}

#[tokio::test]
async fn test_push_delete_filters_by_id() {
    let (client, requests) = start_mock(StatusCode::NO_CONTENT, "").await;

    client.push_delete(4).await.unwrap();

    let request = only_request(&requests);
    assert_eq!(request.method, Method::DELETE);
    assert_eq!(request.query, "id=eq.4");
}

#[tokio::test]
async fn test_rejected_request_reports_status() {
    let (client, _) = start_mock(StatusCode::CONFLICT, r#"{"message":"duplicate key"}"#).await;
    let assignment = Assignment::from_new(1, NewAssignment::new("Dup", "S"));

    match client.push_create(&assignment).await {
        Err(RemoteError::Api(status, body)) => {
            assert_eq!(status, 409);
            assert!(body.contains("duplicate key"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_pull_response_is_parse_error() {
    let (client, _) = start_mock(StatusCode::OK, r#"{"not":"an array"}"#).await;

    assert!(matches!(client.pull().await, Err(RemoteError::Parse(_))));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = SupabaseClient::new(&RemoteConfig {
        url: format!("http://{}", addr),
        anon_key: "anon-key".to_string(),
        table: "assignments".to_string(),
    })
    .unwrap();

    assert!(matches!(client.push_delete(1).await, Err(RemoteError::Network(_))));
}
