use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::TurnError;

/// One tool call declared by a responder, in the order it should run.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannedCall {
    pub tool: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// The three-field structure every responder must produce.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponderOutput {
    #[serde(default)]
    pub thinking: String,
    #[serde(default)]
    pub function_calls: Vec<PlannedCall>,
    pub response: String,
}

impl PlannedCall {
    /// The place argument under whichever key the responder used.
    pub fn place(&self) -> Option<&str> {
        for key in ["place", "city"] {
            if let Some(value) = self.parameters.get(key).and_then(Value::as_str) {
                return Some(value);
            }
        }
        None
    }
}

/// Parse raw responder output into the required shape. Models occasionally
/// wrap JSON in a markdown code fence; that wrapper is tolerated, anything
/// else malformed is a turn-level failure.
pub fn parse_responder_output(raw: &str) -> Result<ResponderOutput, TurnError> {
    let body = strip_code_fence(raw);

    let output: ResponderOutput = serde_json::from_str(body)
        .map_err(|error| TurnError::malformed(format!("{error}: {}", preview(body))))?;

    if output.response.trim().is_empty() {
        return Err(TurnError::malformed("empty response field"));
    }

    Ok(output)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn preview(body: &str) -> String {
    body.chars().take(120).collect()
}
