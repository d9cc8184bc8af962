//! Local stand-in for the Messages API, served by axum on an ephemeral port.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

use super::LlmClient;

#[derive(Debug, Clone)]
pub enum StubReply {
    /// A successful response whose first text block is this string.
    Text(String),
    /// A bare error status with an Anthropic-style error body.
    Status(u16),
}

#[derive(Default)]
struct StubState {
    /// The last reply repeats once the queue is down to one entry.
    replies: Mutex<VecDeque<StubReply>>,
    prompts: Mutex<Vec<String>>,
    hits: AtomicUsize,
}

pub struct Stub {
    pub client: LlmClient,
    state: Arc<StubState>,
}

impl Stub {
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// User prompts received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.state.prompts.lock().unwrap().clone()
    }
}

pub async fn spawn_stub(replies: Vec<StubReply>) -> Stub {
    let state = Arc::new(StubState {
        replies: Mutex::new(replies.into()),
        ..Default::default()
    });

    let app = Router::new()
        .route("/v1/messages", post(messages))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client =
        LlmClient::with_base_url("test-key".to_string(), format!("http://{addr}/v1/messages"))
            .unwrap();
    Stub { client, state }
}

async fn messages(
    State(state): State<Arc<StubState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let prompt = body["messages"][0]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    state.prompts.lock().unwrap().push(prompt);

    let reply = {
        let mut replies = state.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        }
    };

    match reply {
        Some(StubReply::Text(text)) => (
            StatusCode::OK,
            Json(json!({
                "content": [{"type": "text", "text": text}],
                "usage": {"input_tokens": 10, "output_tokens": 5}
            })),
        ),
        Some(StubReply::Status(code)) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(json!({"error": {"type": "stub_error", "message": format!("status {code}")}})),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": {"type": "stub_error", "message": "no reply queued"}})),
        ),
    }
}
