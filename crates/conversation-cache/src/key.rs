use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::models::{AgentThread, AssistantIdentity, ChartData, ThreadDetail};

pub(crate) type CachedValue = Arc<dyn Any + Send + Sync>;

/// Logical cache key. Each key maps to one endpoint and one payload type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Assistant,
    Conversations,
    Conversation(String),
    Chart {
        artifact_id: String,
        chart_type: String,
    },
}

impl ResourceKey {
    pub fn conversation(thread_id: impl Into<String>) -> Self {
        Self::Conversation(thread_id.into())
    }

    pub fn chart(artifact_id: impl Into<String>, chart_type: impl Into<String>) -> Self {
        Self::Chart {
            artifact_id: artifact_id.into(),
            chart_type: chart_type.into(),
        }
    }

    /// Path segments of the JSON endpoint serving this key.
    pub fn path_segments(&self) -> Vec<&str> {
        match self {
            Self::Assistant => vec!["api", "assistant"],
            Self::Conversations => vec!["api", "conversations"],
            Self::Conversation(thread_id) => vec!["api", "conversations", thread_id.as_str()],
            Self::Chart { chart_type, .. } => vec!["api", "charts", chart_type.as_str()],
        }
    }

    /// Query parameters of the endpoint serving this key.
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        match self {
            Self::Chart { artifact_id, .. } => vec![("id", artifact_id.as_str())],
            Self::Assistant | Self::Conversations | Self::Conversation(_) => Vec::new(),
        }
    }

    pub(crate) fn failure_message(&self) -> &'static str {
        match self {
            Self::Assistant => "Failed to fetch assistant",
            Self::Conversations => "Failed to fetch conversations",
            Self::Conversation(_) => "Failed to fetch thread details",
            Self::Chart { .. } => "Failed to fetch chart data",
        }
    }

    pub(crate) fn decode(&self, value: Value) -> Result<CachedValue, serde_json::Error> {
        match self {
            Self::Assistant => erase::<AssistantIdentity>(value),
            Self::Conversations => erase::<Vec<AgentThread>>(value),
            Self::Conversation(_) => erase::<ThreadDetail>(value),
            Self::Chart { .. } => erase::<ChartData>(value),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assistant => write!(f, "assistant"),
            Self::Conversations => write!(f, "conversations"),
            Self::Conversation(thread_id) => write!(f, "conversation:{thread_id}"),
            Self::Chart {
                artifact_id,
                chart_type,
            } => write!(f, "chart:{chart_type}:{artifact_id}"),
        }
    }
}

fn erase<T>(value: Value) -> Result<CachedValue, serde_json::Error>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    Ok(Arc::new(serde_json::from_value::<T>(value)?))
}
