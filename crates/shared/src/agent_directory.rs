use std::error::Error as _;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::AgentThread;

mod langgraph;

pub use langgraph::LangGraphDirectory;

pub type AgentDirectoryFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, AgentDirectoryError>> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadSortBy {
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadSearchQuery {
    pub limit: u32,
    pub offset: u32,
    pub sort_by: ThreadSortBy,
    pub sort_order: SortOrder,
}

impl ThreadSearchQuery {
    /// Most recently created threads first.
    pub fn most_recent(limit: u32) -> Self {
        Self {
            limit,
            offset: 0,
            sort_by: ThreadSortBy::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunInput {
    pub messages: Vec<RunInputMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunInputMessage {
    pub role: String,
    pub content: String,
}

impl RunInput {
    pub fn user_message(content: impl Into<String>) -> Self {
        Self {
            messages: vec![RunInputMessage {
                role: "user".to_string(),
                content: content.into(),
            }],
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentDirectoryError {
    #[error("agent directory request unavailable: {0}")]
    Unavailable(#[source] reqwest::Error),
    #[error("agent directory request failed: status={status} body={body}")]
    Upstream { status: u16, body: String },
    #[error("agent directory returned an invalid payload: {0}")]
    InvalidPayload(String),
}

impl AgentDirectoryError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::Unavailable(err) => err.status().map(|status| status.as_u16()),
            Self::InvalidPayload(_) => None,
        }
    }

    /// The error followed by its source chain, one entry per line. `None`
    /// when the error has no underlying cause.
    pub fn source_chain(&self) -> Option<String> {
        let mut lines = vec![self.to_string()];
        let mut source = self.source();
        while let Some(cause) = source {
            lines.push(cause.to_string());
            source = cause.source();
        }

        (lines.len() > 1).then(|| lines.join("\n"))
    }
}

/// The remote service that owns threads, runs and assistants.
pub trait AgentDirectory: Send + Sync {
    fn search_threads<'a>(
        &'a self,
        query: ThreadSearchQuery,
    ) -> AgentDirectoryFuture<'a, Vec<AgentThread>>;

    fn get_thread<'a>(&'a self, thread_id: &'a str) -> AgentDirectoryFuture<'a, AgentThread>;

    /// Runs `assistant_id` on the thread and resolves with the final state
    /// values once the run completes.
    fn run_and_wait<'a>(
        &'a self,
        thread_id: &'a str,
        assistant_id: &'a str,
        input: RunInput,
    ) -> AgentDirectoryFuture<'a, Value>;
}
