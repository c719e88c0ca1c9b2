//! Integration tests for notebook-client
//!
//! These tests run an in-process axum server that mimics the notebook
//! backend and drive the client against it over real HTTP.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, StreamExt};
use notebook_client::ask::{AskClient, AskOptions, TurnOutcome, GENERIC_ASK_ERROR};
use notebook_client::testing::{wait_for, TestServer};
use notebook_client::{ChatController, NotebookClient, NotebookClientError, Role};
use notebook_core::{CreateSessionRequest, SendMessageRequest, SEARCHING_INDICATOR_ID};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

// =============================================================================
// Helpers
// =============================================================================

fn sse(body: &'static str) -> Response {
    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from(body),
    )
        .into_response()
}

/// An event stream that sends `head` and then never finishes
fn sse_hanging(head: &'static str) -> Response {
    let body = stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from(head))])
        .chain(stream::pending());
    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(body),
    )
        .into_response()
}

fn ask_router(response: fn() -> Response) -> Router {
    Router::new().route("/api/search/ask", post(move || async move { response() }))
}

async fn ask_server(
    response: fn() -> Response,
    show_strategy: bool,
) -> (TestServer, Arc<AskClient<NotebookClient>>) {
    let server = TestServer::start(ask_router(response)).await.unwrap();
    let ask = Arc::new(AskClient::new(
        server.client.clone(),
        AskOptions {
            show_strategy,
            ..Default::default()
        },
    ));
    (server, ask)
}

fn roles(ask: &AskClient<NotebookClient>) -> Vec<Role> {
    ask.messages().iter().map(|m| m.role).collect()
}

fn session_json(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "notebook_id": "notebook:n1",
        "created": "2024-01-01T00:00:00Z",
        "updated": "2024-01-01T00:00:00Z"
    })
}

// =============================================================================
// Streaming Ask Tests
// =============================================================================

const STRATEGY_THEN_ANSWER: &str = concat!(
    "data: {\"type\":\"strategy\",\"data\":{\"reasoning\":\"r\",\"searches\":[{\"search\":\"a\",\"instructions\":\"i\"}]}}\n",
    "\n",
    "data: {\"type\":\"final_answer\",\"content\":\"Answer text\"}\n",
    "data: {\"type\":\"complete\"}\n",
);

#[tokio::test]
async fn test_ask_without_strategy_display() {
    let (_server, ask) = ask_server(|| sse(STRATEGY_THEN_ANSWER), false).await;

    ask.submit("What is X?").await;

    let messages = ask.messages();
    assert_eq!(roles(&ask), vec![Role::Human, Role::Ai]);
    assert_eq!(messages[0].content, "What is X?");
    assert_eq!(messages[1].content, "Answer text");
    assert_eq!(
        messages[1].strategy.as_ref().map(|p| p.summary()),
        Some("Searching: a".to_string())
    );
    assert!(!ask.is_busy());
    assert_eq!(ask.error(), None);
    assert_eq!(ask.last_outcome(), Some(TurnOutcome::Answered));
}

#[tokio::test]
async fn test_ask_with_strategy_display() {
    let (_server, ask) = ask_server(|| sse(STRATEGY_THEN_ANSWER), true).await;

    ask.submit("What is X?").await;

    assert_eq!(roles(&ask), vec![Role::Human, Role::Strategy, Role::Ai]);
    assert_eq!(ask.messages()[1].content, "Searching: a");
}

#[tokio::test]
async fn test_ask_trailing_record_without_newline() {
    let (_server, ask) = ask_server(
        || {
            sse(concat!(
                "data: {not json}\n",
                "event: ping\n",
                "data: {\"type\":\"final_answer\",\"content\":\"tail\"}"
            ))
        },
        false,
    )
    .await;

    ask.submit("q").await;

    assert_eq!(roles(&ask), vec![Role::Human, Role::Ai]);
    assert_eq!(ask.messages()[1].content, "tail");
}

#[tokio::test]
async fn test_ask_backend_error_event() {
    let (_server, ask) = ask_server(
        || sse("data: {\"type\":\"error\",\"content\":\"Rate limited\"}\n"),
        false,
    )
    .await;

    ask.submit("q").await;

    assert_eq!(ask.error().as_deref(), Some("Rate limited"));
    assert_eq!(roles(&ask), vec![Role::Human]);
    assert_eq!(ask.last_outcome(), Some(TurnOutcome::Errored));
}

#[tokio::test]
async fn test_ask_http_error_is_generic() {
    let (_server, ask) = ask_server(
        || (StatusCode::INTERNAL_SERVER_ERROR, "database exploded").into_response(),
        false,
    )
    .await;

    ask.submit("q").await;

    assert_eq!(ask.error().as_deref(), Some(GENERIC_ASK_ERROR));
    assert_eq!(roles(&ask), vec![Role::Human]);
    assert!(!ask.is_busy());
}

#[tokio::test]
async fn test_ask_stream_reports_status_and_body() {
    let server = TestServer::start(ask_router(|| {
        (StatusCode::SERVICE_UNAVAILABLE, "try later").into_response()
    }))
    .await
    .unwrap();

    let result = server
        .client
        .ask_stream("q", &CancellationToken::new())
        .await;
    match result {
        Err(notebook_client::StreamError::Server { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "try later");
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected an error"),
    }
}

#[tokio::test]
async fn test_cancel_mid_stream() {
    let (_server, ask) = ask_server(
        || sse_hanging("data: {\"type\":\"strategy\",\"data\":{\"searches\":[{\"search\":\"a\",\"instructions\":\"\"}]}}\n"),
        false,
    )
    .await;

    let task = tokio::spawn({
        let ask = ask.clone();
        async move { ask.submit("q").await }
    });

    let seen = wait_for(
        || {
            let ask = ask.clone();
            async move { ask.messages().iter().any(|m| m.id == SEARCHING_INDICATOR_ID) }
        },
        Duration::from_secs(5),
    )
    .await;
    assert!(seen, "searching indicator never appeared");

    ask.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("submit did not return after cancel")
        .unwrap();

    assert_eq!(roles(&ask), vec![Role::Human]);
    assert_eq!(ask.error(), None);
    assert!(!ask.is_busy());
    assert_eq!(ask.last_outcome(), Some(TurnOutcome::Cancelled));
}

// =============================================================================
// REST Tests
// =============================================================================

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let router = Router::new().route(
        "/api/notebooks",
        get(|headers: HeaderMap| async move {
            match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
                Some("Bearer secret") => Json(json!([])).into_response(),
                _ => (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Missing password"})))
                    .into_response(),
            }
        }),
    );

    let server = TestServer::start_with_token(router.clone(), "secret").await.unwrap();
    assert!(server.client.list_notebooks().await.unwrap().is_empty());

    let anonymous = TestServer::start(router).await.unwrap();
    match anonymous.client.list_notebooks().await {
        Err(NotebookClientError::Unauthorized(message)) => assert_eq!(message, "Missing password"),
        other => panic!("expected Unauthorized, got {:?}", other.map(|v| v.len())),
    }
}

#[tokio::test]
async fn test_ids_are_normalized() {
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let router = Router::new()
        .route(
            "/api/notebooks/{id}",
            get({
                let seen = seen.clone();
                move |Path(id): Path<String>| async move {
                    seen.lock().push(id.clone());
                    Json(json!({
                        "id": id,
                        "name": "Research",
                        "created": "2024-01-01T00:00:00Z",
                        "updated": "2024-01-01T00:00:00Z"
                    }))
                }
            }),
        )
        .route(
            "/api/sources",
            get({
                let seen = seen.clone();
                move |Query(query): Query<HashMap<String, String>>| async move {
                    seen.lock().push(query.get("notebook_id").cloned().unwrap_or_default());
                    Json(json!([]))
                }
            }),
        );
    let server = TestServer::start(router).await.unwrap();

    let notebook = server.client.get_notebook("n1").await.unwrap();
    assert_eq!(notebook.id, "notebook:n1");
    server.client.get_notebook("notebook:n2").await.unwrap();
    server.client.list_sources("n3").await.unwrap();

    assert_eq!(
        *seen.lock(),
        vec!["notebook:n1", "notebook:n2", "notebook:n3"]
    );
}

#[tokio::test]
async fn test_error_status_mapping() {
    let router = Router::new()
        .route(
            "/api/notebooks/{id}",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"detail": "Notebook not found"})),
                )
            }),
        )
        .route(
            "/api/notebooks",
            get(|| async { (StatusCode::BAD_REQUEST, "bad things") }),
        );
    let server = TestServer::start(router).await.unwrap();

    assert!(matches!(
        server.client.get_notebook("x").await,
        Err(NotebookClientError::NotFound(m)) if m == "Notebook not found"
    ));

    let err = server.client.list_notebooks().await.unwrap_err();
    assert_eq!(err.to_string(), "API Error (400): bad things");
}

#[tokio::test]
async fn test_send_chat_message_fills_defaults_and_translates_fields() {
    let received = Arc::new(Mutex::new(None::<Value>));
    let router = Router::new().route(
        "/api/chat/execute",
        post({
            let received = received.clone();
            move |Json(body): Json<Value>| async move {
                *received.lock() = Some(body.clone());
                Json(json!({
                    "session_id": body["session_id"],
                    "messages": [
                        {"id": "m1", "type": "human", "content": "hi"},
                        {
                            "id": "m2",
                            "type": "ai",
                            "content": "hello",
                            "is_web_enhanced": true,
                            "web_sources": [{"title": "Docs", "url": "https://example.com"}]
                        }
                    ]
                }))
            }
        }),
    );
    let server = TestServer::start(router).await.unwrap();

    let response = server
        .client
        .send_chat_message(&SendMessageRequest {
            session_id: "s1".into(),
            message: "hi".into(),
            context: Default::default(),
            model_override: None,
            notebook_id: Some("n1".into()),
            enable_web_search: None,
        })
        .await
        .unwrap();

    let body = received.lock().clone().unwrap();
    assert_eq!(body["session_id"], "chat_session:s1");
    assert_eq!(body["notebook_id"], "notebook:n1");
    assert_eq!(body["model_override"], notebook_core::DEFAULT_CHAT_MODEL_ID);
    assert_eq!(body["enable_web_search"], true);

    let ai = &response.messages[1];
    assert_eq!(ai.is_web_enhanced, Some(true));
    let value = serde_json::to_value(ai).unwrap();
    assert_eq!(value["isWebEnhanced"], true);
    assert_eq!(value["webSources"][0]["title"], "Docs");
}

#[tokio::test]
async fn test_chat_controller_end_to_end() {
    let sessions = Arc::new(Mutex::new(Vec::<Value>::new()));
    let router = Router::new()
        .route("/api/sources", get(|| async { Json(json!([])) }))
        .route("/api/notes", get(|| async { Json(json!([])) }))
        .route(
            "/api/chat/sessions",
            get({
                let sessions = sessions.clone();
                move || async move { Json(Value::Array(sessions.lock().clone())) }
            })
            .post({
                let sessions = sessions.clone();
                move |Json(req): Json<CreateSessionRequest>| async move {
                    let title = req.title.as_deref().unwrap_or("");
                    let created = session_json("chat_session:c1", title);
                    sessions.lock().insert(0, created.clone());
                    Json(created)
                }
            }),
        )
        .route(
            "/api/chat/execute",
            post(|Json(req): Json<Value>| async move {
                Json(json!({
                    "session_id": req["session_id"],
                    "messages": [
                        {"id": "m1", "type": "human", "content": req["message"]},
                        {"id": "m2", "type": "ai", "content": "pong"}
                    ]
                }))
            }),
        );
    let server = TestServer::start(router).await.unwrap();

    let mut chat =
        ChatController::new(server.client.clone(), "n1").with_welcome_message("Welcome!");
    chat.initialize().await;
    assert_eq!(chat.messages()[0].message.id, "welcome");

    chat.send_message("ping").await;

    assert_eq!(chat.error(), None);
    assert_eq!(chat.current_session().map(|s| s.title.as_str()), Some("ping"));
    let contents: Vec<_> = chat
        .messages()
        .iter()
        .map(|m| m.message.content.as_str())
        .collect();
    assert_eq!(contents, vec!["ping", "pong"]);
}

#[tokio::test]
async fn test_podcast_episodes() {
    let router = Router::new()
        .route(
            "/api/podcasts/episodes",
            get(|| async {
                Json(json!([{
                    "id": "episode:e1",
                    "name": "Weekly",
                    "episode_profile": {"id": "p1", "name": "Default"},
                    "speaker_profile": {"id": "s1", "name": "Duo"},
                    "audio_file": "/data/e1.mp3",
                    "job_status": "completed"
                }]))
            }),
        )
        .route(
            "/api/podcasts/episodes/{id}/audio",
            get(|Path(id): Path<String>| async move {
                assert_eq!(id, "episode:e1");
                Bytes::from_static(b"ID3")
            }),
        );
    let server = TestServer::start(router).await.unwrap();

    let episodes = server.client.list_podcast_episodes().await.unwrap();
    assert_eq!(episodes.len(), 1);
    assert!(episodes[0].is_playable());

    let audio = server.client.fetch_podcast_audio("e1").await.unwrap();
    assert_eq!(&audio[..], b"ID3");
}

#[tokio::test]
async fn test_source_insights() {
    let router = Router::new().route(
        "/api/sources/{id}/insights",
        get(|Path(id): Path<String>| async move {
            Json(json!([{
                "id": "source_insight:i1",
                "source_id": id,
                "insight_type": "Summary",
                "content": "Short version"
            }]))
        })
        .post(|Json(body): Json<Value>| async move {
            Json(json!({
                "id": "source_insight:i2",
                "insight_type": body["transformation_id"],
                "content": "Generated"
            }))
        }),
    );
    let server = TestServer::start(router).await.unwrap();

    let insights = server.client.list_source_insights("s1").await.unwrap();
    assert_eq!(insights[0].source_id.as_deref(), Some("source:s1"));

    let created = server
        .client
        .create_source_insight("s1", "transformation:t1")
        .await
        .unwrap();
    assert_eq!(created.insight_type, "transformation:t1");
}
