use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterruptDecision {
    Approve,
    Reject,
    Edit,
}

impl InterruptDecision {
    const ALL: [Self; 3] = [Self::Approve, Self::Reject, Self::Edit];

    fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Edit => "edit",
        }
    }
}

/// A human-in-the-loop pause raised by the agent before running a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptInfo {
    pub tool_name: String,
    pub args: Map<String, Value>,
    pub description: Option<String>,
    pub checkpoint_id: Option<String>,
    pub run_id: Option<String>,
    pub allowed_decisions: Vec<InterruptDecision>,
}

impl InterruptInfo {
    /// Reads the interrupt payload, accepting both snake_case and camelCase
    /// spellings. Returns `None` when there is no object payload.
    pub fn from_value(value: &Value) -> Option<Self> {
        let payload = value.as_object()?;

        let args = ["args", "arguments"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_object))
            .cloned()
            .unwrap_or_default();

        let allowed_decisions = match payload.get("allowed_decisions").and_then(Value::as_array) {
            Some(requested) => InterruptDecision::ALL
                .into_iter()
                .filter(|decision| {
                    requested
                        .iter()
                        .any(|item| item.as_str() == Some(decision.as_str()))
                })
                .collect(),
            None => InterruptDecision::ALL.to_vec(),
        };

        Some(Self {
            tool_name: first_text(payload, &["tool_name", "name"])
                .unwrap_or_else(|| "Unknown".to_string()),
            args,
            description: first_text(payload, &["description", "message"]),
            checkpoint_id: first_text(payload, &["checkpoint_id", "checkpointId"]),
            run_id: first_text(payload, &["run_id", "runId"]),
            allowed_decisions,
        })
    }

    /// Pretty-printed arguments, the starting point for an edit decision.
    pub fn editable_args(&self) -> String {
        serde_json::to_string_pretty(&self.args).unwrap_or_default()
    }

    pub fn allows(&self, decision: InterruptDecision) -> bool {
        self.allowed_decisions.contains(&decision)
    }
}

fn first_text(payload: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| {
            payload
                .get(*key)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
        })
        .map(str::to_string)
}
