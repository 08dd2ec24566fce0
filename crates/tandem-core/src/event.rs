//! Turn lifecycle events published to the UI layer.

use serde::{Deserialize, Serialize};

/// Lifecycle signals emitted while a turn is in flight.
///
/// Causal order per turn: `Thinking` always first, `Response` zero or more
/// times, then exactly one of `Complete` / `Error`. Field names follow the
/// frontend wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// The turn started and the assistant is working.
    Thinking {
        #[serde(rename = "convID")]
        conversation_id: String,
    },
    /// One incremental fragment of the assistant's answer.
    Response {
        #[serde(rename = "convID")]
        conversation_id: String,
        content: String,
    },
    /// The turn finished successfully. `has_content` is false when every
    /// delta was whitespace, letting the UI tell a truly empty answer from
    /// a stream of control chunks.
    Complete {
        #[serde(rename = "convID")]
        conversation_id: String,
        #[serde(rename = "hasContent")]
        has_content: bool,
    },
    /// The turn failed; no `Complete` follows.
    Error {
        #[serde(rename = "convID")]
        conversation_id: String,
        error: String,
    },
}

impl TurnEvent {
    /// The conversation this event belongs to.
    pub fn conversation_id(&self) -> &str {
        match self {
            TurnEvent::Thinking { conversation_id }
            | TurnEvent::Response {
                conversation_id, ..
            }
            | TurnEvent::Complete {
                conversation_id, ..
            }
            | TurnEvent::Error {
                conversation_id, ..
            } => conversation_id,
        }
    }
}
