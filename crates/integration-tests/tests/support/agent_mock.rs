use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::Mutex;

/// In-memory stand-in for a LangGraph server: threads live in a vector and a
/// completed run appends the user turn plus an echoed assistant turn.
#[derive(Debug, Default)]
pub struct AgentMockState {
    pub threads: Vec<Value>,
    pub search_limits: Vec<u64>,
    pub thread_reads: Vec<String>,
    pub runs: Vec<(String, String)>,
}

pub struct MockAgentServer {
    pub base_url: String,
    pub state: Arc<Mutex<AgentMockState>>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockAgentServer {
    pub async fn start(threads: Vec<Value>) -> Self {
        let state = Arc::new(Mutex::new(AgentMockState {
            threads,
            ..AgentMockState::default()
        }));
        let app = Router::new()
            .route("/threads/search", post(search_threads))
            .route("/threads/{thread_id}", get(get_thread))
            .route("/threads/{thread_id}/runs/wait", post(run_wait))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("mock agent listener should bind");
        let bind_addr = listener
            .local_addr()
            .expect("mock agent listener local address should exist");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("mock agent server should run");
        });

        Self {
            base_url: format!("http://{bind_addr}"),
            state,
            handle,
        }
    }

    pub async fn search_count(&self) -> usize {
        self.state.lock().await.search_limits.len()
    }

    pub async fn thread_reads(&self, thread_id: &str) -> usize {
        self.state
            .lock()
            .await
            .thread_reads
            .iter()
            .filter(|read| *read == thread_id)
            .count()
    }
}

impl Drop for MockAgentServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn thread(thread_id: &str, created_at: &str, assistant_id: Option<&str>) -> Value {
    let metadata = match assistant_id {
        Some(assistant_id) => json!({ "assistant_id": assistant_id, "graph_id": "agent" }),
        None => json!({ "graph_id": "agent" }),
    };

    json!({
        "thread_id": thread_id,
        "created_at": created_at,
        "updated_at": created_at,
        "status": "idle",
        "metadata": metadata,
        "values": { "messages": [] },
    })
}

type MockReply = (StatusCode, Json<Value>);

fn not_found(thread_id: &str) -> MockReply {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("Thread with ID {thread_id} not found") })),
    )
}

async fn search_threads(
    State(state): State<Arc<Mutex<AgentMockState>>>,
    Json(query): Json<Value>,
) -> MockReply {
    let limit = query["limit"].as_u64().unwrap_or(10);
    let mut state = state.lock().await;
    state.search_limits.push(limit);

    let mut threads = state.threads.clone();
    threads.sort_by(|left, right| {
        let left = left["created_at"].as_str().unwrap_or_default();
        let right = right["created_at"].as_str().unwrap_or_default();
        right.cmp(left)
    });
    threads.truncate(limit as usize);

    (StatusCode::OK, Json(Value::Array(threads)))
}

async fn get_thread(
    State(state): State<Arc<Mutex<AgentMockState>>>,
    Path(thread_id): Path<String>,
) -> MockReply {
    let mut state = state.lock().await;
    state.thread_reads.push(thread_id.clone());

    match state
        .threads
        .iter()
        .find(|thread| thread["thread_id"] == thread_id.as_str())
    {
        Some(thread) => (StatusCode::OK, Json(thread.clone())),
        None => not_found(&thread_id),
    }
}

async fn run_wait(
    State(state): State<Arc<Mutex<AgentMockState>>>,
    Path(thread_id): Path<String>,
    Json(body): Json<Value>,
) -> MockReply {
    let assistant_id = body["assistant_id"].as_str().unwrap_or_default().to_string();
    let content = body["input"]["messages"][0]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    let mut state = state.lock().await;
    let Some(thread) = state
        .threads
        .iter_mut()
        .find(|thread| thread["thread_id"] == thread_id.as_str())
    else {
        return not_found(&thread_id);
    };

    let turn = thread["values"]["messages"]
        .as_array()
        .map_or(0, Vec::len);
    let new_messages = vec![
        json!({ "id": format!("msg-{turn}"), "type": "human", "content": content }),
        json!({
            "id": format!("msg-{}", turn + 1),
            "type": "ai",
            "content": [{ "type": "text", "text": format!("echo: {content}") }],
        }),
    ];
    if let Some(messages) = thread["values"]["messages"].as_array_mut() {
        messages.extend(new_messages.iter().cloned());
    }
    thread["metadata"]["assistant_id"] = Value::String(assistant_id.clone());
    let messages = thread["values"]["messages"].clone();
    state.runs.push((thread_id, assistant_id));

    (StatusCode::OK, Json(json!({ "messages": messages })))
}
