// Chat endpoint request/response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for POST /chat
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Caller-supplied session identifier
    pub session_id: String,
    /// The user's message for this turn
    pub message: String,
}

/// The two outcomes of interpreting generated text.
///
/// The model is asked to emit a question/options JSON object during the
/// diagnostic interview phase; text that parses as JSON goes back under
/// `structured`, anything else verbatim under `reply`. Externally-tagged
/// serde serialization produces exactly those two wire shapes.
#[derive(Debug, Serialize, PartialEq)]
pub enum Reply {
    #[serde(rename = "structured")]
    Structured(Value),
    #[serde(rename = "reply")]
    Text(String),
}

impl Reply {
    /// Classify raw generated text. Never fails: unparseable text is the
    /// plain-text outcome, not an error.
    pub fn from_raw(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Reply::Structured(value),
            Err(_) => Reply::Text(raw.to_string()),
        }
    }
}
