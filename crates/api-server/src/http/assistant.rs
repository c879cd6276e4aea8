use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::agent_directory::ThreadSearchQuery;
use shared::models::AssistantIdentity;
use tracing::debug;

use super::AppState;
use super::errors::{directory_error_response, not_found_response};

/// The assistant is whichever one ran the most recently created thread.
pub(super) async fn get_assistant(State(state): State<AppState>) -> Response {
    let threads = match state
        .directory
        .search_threads(ThreadSearchQuery::most_recent(1))
        .await
    {
        Ok(threads) => threads,
        Err(err) => return directory_error_response("Failed to fetch assistants", &err),
    };

    let Some(thread) = threads.first() else {
        return not_found_response("No threads found");
    };
    let Some(assistant_id) = thread.assistant_id() else {
        debug!(thread_id = %thread.thread_id, "latest thread has no assistant id");
        return not_found_response("Assistant ID not found in thread");
    };

    (
        StatusCode::OK,
        Json(AssistantIdentity {
            assistant_id: assistant_id.to_string(),
        }),
    )
        .into_response()
}
