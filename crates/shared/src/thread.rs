//! Presentation helpers over raw agent threads: titles, relative dates and
//! the conversion of LangGraph message state into [`Message`]s.

use chrono::{DateTime, Datelike, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{AgentThread, ArtifactInfo, Message, MessageRole};

const TITLE_ID_PREFIX_CHARS: usize = 8;
const ARTIFACT_TOOL_NAME: &str = "artifacts";

/// Pulls display text out of a message `content` field, which may be a
/// string, a list of content blocks, or a single block.
pub fn extract_content(content: &Value) -> Option<String> {
    match content {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) => items.iter().find_map(|item| match item {
            Value::String(text) => Some(text.clone()),
            Value::Object(block) => block.get("text").and_then(Value::as_str).map(str::to_string),
            _ => None,
        }),
        Value::Object(block) => block.get("text").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

pub fn conversation_title(thread: &AgentThread) -> String {
    if let Some(title) = thread
        .metadata
        .get("title")
        .and_then(Value::as_str)
        .filter(|title| !title.trim().is_empty())
    {
        return title.to_string();
    }

    if let Some(first_content) = raw_messages(thread)
        .first()
        .and_then(|message| message.get("content"))
        .and_then(extract_content)
    {
        return first_content;
    }

    let prefix: String = thread.thread_id.chars().take(TITLE_ID_PREFIX_CHARS).collect();
    format!("Thread {prefix}")
}

/// Short human label for a thread timestamp relative to `now`.
pub fn format_relative_date(timestamp: &str, now: DateTime<Utc>) -> Option<String> {
    let date = DateTime::parse_from_rfc3339(timestamp.trim())
        .ok()?
        .with_timezone(&Utc);
    let elapsed = now.signed_duration_since(date);

    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return Some("Just now".to_string());
    }
    if minutes < 60 {
        return Some(format!("{minutes}m ago"));
    }

    let hours = elapsed.num_hours();
    if hours < 24 {
        return Some(format!("{hours}h ago"));
    }

    let days = elapsed.num_days();
    if days < 7 {
        return Some(format!("{days}d ago"));
    }

    if date.year() == now.year() {
        Some(date.format("%b %-d").to_string())
    } else {
        Some(date.format("%b %-d, %Y").to_string())
    }
}

/// Parses an artifact creation out of a serialized tool-use block.
pub fn parse_artifact(content: &str) -> Option<ArtifactInfo> {
    serde_json::from_str::<Value>(content)
        .ok()
        .as_ref()
        .and_then(artifact_from_value)
}

pub fn artifact_from_value(block: &Value) -> Option<ArtifactInfo> {
    if block.get("type").and_then(Value::as_str) != Some("tool_use")
        || block.get("name").and_then(Value::as_str) != Some(ARTIFACT_TOOL_NAME)
    {
        return None;
    }

    let input = block.get("input")?;
    if input.get("command").and_then(Value::as_str) != Some("create") {
        return None;
    }

    let non_empty = |key: &str| {
        input
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    Some(ArtifactInfo {
        id: non_empty("id")?,
        kind: non_empty("type")?,
        title: non_empty("title")?,
        content: input
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Chart renderer for an artifact. A `chart_type` field in the JSON content
/// wins; otherwise the type is read from the artifact kind, either after a
/// `chart/` prefix or as its last `/` segment.
pub fn chart_type(artifact: &ArtifactInfo) -> Option<String> {
    chart_type_from_content(&artifact.content).or_else(|| chart_type_from_kind(&artifact.kind))
}

fn chart_type_from_content(content: &str) -> Option<String> {
    if content.trim().is_empty() {
        return None;
    }

    serde_json::from_str::<Value>(content)
        .ok()?
        .get("chart_type")
        .and_then(Value::as_str)
        .filter(|chart_type| !chart_type.is_empty())
        .map(str::to_string)
}

fn chart_type_from_kind(kind: &str) -> Option<String> {
    let chart_type = match kind.strip_prefix("chart/") {
        Some(rest) => rest,
        None if kind.contains('/') => kind.rsplit('/').next()?,
        None => return None,
    };
    (!chart_type.is_empty()).then(|| chart_type.to_string())
}

/// User and assistant turns of a thread, in order. Tool and system messages
/// are skipped, as are turns with no displayable text or artifact.
pub fn thread_messages(thread: &AgentThread) -> Vec<Message> {
    raw_messages(thread)
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let role = message_role(raw)?;
            let content = raw.get("content").unwrap_or(&Value::Null);
            let artifact = match content {
                Value::String(text) => parse_artifact(text),
                Value::Array(blocks) => blocks.iter().find_map(artifact_from_value),
                _ => None,
            };
            let text = if artifact.is_some() && content.is_string() {
                String::new()
            } else {
                extract_content(content).unwrap_or_default()
            };

            if text.is_empty() && artifact.is_none() {
                return None;
            }

            let id = raw
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| fallback_message_id(&thread.thread_id, index));

            let timestamp = raw
                .get("timestamp")
                .and_then(Value::as_str)
                .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
                .map(|value| value.with_timezone(&Utc));

            Some(Message {
                id,
                role,
                content: text,
                timestamp,
                artifact,
            })
        })
        .collect()
}

fn raw_messages(thread: &AgentThread) -> &[Value] {
    thread
        .values
        .as_ref()
        .and_then(|values| values.get("messages"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn message_role(raw: &Value) -> Option<MessageRole> {
    let role = raw
        .get("role")
        .or_else(|| raw.get("type"))
        .and_then(Value::as_str)?;

    match role {
        "user" | "human" => Some(MessageRole::User),
        "assistant" | "ai" => Some(MessageRole::Assistant),
        _ => None,
    }
}

// Stable across refetches so re-rendered lists keep their keys.
fn fallback_message_id(thread_id: &str, index: usize) -> String {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("{thread_id}:{index}").as_bytes(),
    )
    .to_string()
}
