use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use shared::agent_directory::{RunInput, ThreadSearchQuery};
use shared::models::{SendMessageRequest, SendMessageResponse, ThreadDetail};
use tracing::info;

use super::AppState;
use super::errors::{
    bad_request_response, directory_error_response, directory_error_with_stack_response,
    invalid_body_response,
};

pub(super) async fn list_conversations(State(state): State<AppState>) -> Response {
    let query = ThreadSearchQuery::most_recent(state.conversation_list_limit);
    match state.directory.search_threads(query).await {
        Ok(threads) => (StatusCode::OK, Json(threads)).into_response(),
        Err(err) => directory_error_response("Failed to fetch conversations", &err),
    }
}

pub(super) async fn get_conversation(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Response {
    match state.directory.get_thread(&thread_id).await {
        Ok(thread) => (StatusCode::OK, Json(ThreadDetail { thread })).into_response(),
        Err(err) => directory_error_with_stack_response("Failed to fetch thread details", &err),
    }
}

pub(super) async fn send_message(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return invalid_body_response(&rejection),
    };
    let Some(message) = req.message.filter(|message| !message.trim().is_empty()) else {
        return bad_request_response("Message is required");
    };
    let Some(assistant_id) = req
        .assistant_id
        .map(|assistant_id| assistant_id.trim().to_string())
        .filter(|assistant_id| !assistant_id.is_empty())
    else {
        return bad_request_response("Assistant ID is required");
    };

    let output = match state
        .directory
        .run_and_wait(&thread_id, &assistant_id, RunInput::user_message(message))
        .await
    {
        Ok(output) => output,
        Err(err) => return directory_error_response("Failed to send message", &err),
    };

    let thread = match state.directory.get_thread(&thread_id).await {
        Ok(thread) => thread,
        Err(err) => return directory_error_response("Failed to send message", &err),
    };

    let messages = run_output_messages(output);
    info!(
        thread_id = %thread_id,
        assistant_id = %assistant_id,
        messages = messages.len(),
        "run completed"
    );

    (StatusCode::OK, Json(SendMessageResponse { thread, messages })).into_response()
}

fn run_output_messages(output: Value) -> Vec<Value> {
    match output {
        Value::Object(mut fields) => match fields.remove("messages") {
            Some(Value::Array(messages)) => messages,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
