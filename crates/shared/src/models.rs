use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A thread record as owned by the agent directory. Only the fields the
/// presentation layer reads are typed; everything else passes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentThread {
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentThread {
    pub fn assistant_id(&self) -> Option<&str> {
        self.metadata
            .get("assistant_id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|assistant_id| !assistant_id.is_empty())
    }
}

fn null_as_empty_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantIdentity {
    #[serde(rename = "assistantId")]
    pub assistant_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadDetail {
    pub thread: AgentThread,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "assistantId")]
    pub assistant_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub thread: AgentThread,
    pub messages: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub content: String,
}

/// Payload of a chart endpoint. `data` holds the series, usually as a JSON
/// encoded string; anything else the endpoint sends is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Error body returned by every proxy endpoint on a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            stack: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AgentThread, AssistantIdentity, ErrorResponse, ThreadDetail};

    #[test]
    fn agent_thread_keeps_unknown_fields() {
        let thread: AgentThread = serde_json::from_value(json!({
            "thread_id": "t-1",
            "created_at": "2026-10-01T12:00:00Z",
            "metadata": { "assistant_id": "abc", "graph_id": "agent" },
            "interrupts": {},
        }))
        .expect("thread should decode");

        assert_eq!(thread.assistant_id(), Some("abc"));
        assert!(thread.extra.contains_key("interrupts"));

        let encoded = serde_json::to_value(&thread).expect("thread should encode");
        assert_eq!(encoded["interrupts"], json!({}));
        assert_eq!(encoded["metadata"]["graph_id"], "agent");
    }

    #[test]
    fn agent_thread_tolerates_null_metadata_and_blank_assistant() {
        let thread: AgentThread =
            serde_json::from_value(json!({ "thread_id": "t-2", "metadata": null }))
                .expect("thread should decode");
        assert!(thread.metadata.is_empty());
        assert_eq!(thread.assistant_id(), None);

        let blank: AgentThread = serde_json::from_value(json!({
            "thread_id": "t-3",
            "metadata": { "assistant_id": "  " },
        }))
        .expect("thread should decode");
        assert_eq!(blank.assistant_id(), None);
    }

    #[test]
    fn wire_shapes_use_camel_case_assistant_id() {
        let identity = AssistantIdentity {
            assistant_id: "abc".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&identity).expect("identity should encode"),
            json!({ "assistantId": "abc" })
        );

        let detail: ThreadDetail =
            serde_json::from_value(json!({ "thread": { "thread_id": "t-9" } }))
                .expect("detail should decode");
        assert_eq!(detail.thread.thread_id, "t-9");
    }

    #[test]
    fn error_response_omits_empty_fields() {
        let body = ErrorResponse::new("No threads found");
        assert_eq!(
            serde_json::to_value(&body).expect("error should encode"),
            json!({ "error": "No threads found" })
        );
    }
}
