use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use shared::agent_directory::AgentDirectory;

mod assistant;
mod conversations;
mod errors;
mod health;

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn AgentDirectory>,
    pub conversation_list_limit: u32,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/api/assistant", get(assistant::get_assistant))
        .route(
            "/api/conversations",
            get(conversations::list_conversations),
        )
        .route(
            "/api/conversations/{thread_id}",
            get(conversations::get_conversation).post(conversations::send_message),
        )
        .with_state(app_state)
}
