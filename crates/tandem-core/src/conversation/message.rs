//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles, message content, and tool invocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The role of a message in a conversation.
///
/// Serialized as a plain lowercase string. Unknown role strings are not
/// rejected; they round-trip unchanged through [`Role::Other`] and it is up
/// to the consumer to interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System-generated message.
    System,
    /// Any role string this core does not recognize.
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Other(s) => s,
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "system" => Role::System,
            other => Role::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Role::from(s.as_str()))
    }
}

/// Completion state of a single tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Pending,
    Success,
    Failed,
}

/// A tool invocation recorded on a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier of this invocation
    pub id: String,
    /// Name of the invoked tool
    pub name: String,
    /// Structured input the tool was called with
    pub input: serde_json::Value,
    /// Textual output produced by the tool
    pub output: String,
    /// Current invocation status
    pub status: ToolStatus,
}

/// A single message in a conversation history.
///
/// Messages are immutable once appended, except for tool-call status
/// transitions that may still happen while the assistant content is
/// streaming. After the turn completes, all fields are frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier, time-derived
    pub id: String,
    /// The role of the message sender
    pub role: Role,
    /// The content of the message
    pub content: String,
    /// Timestamp when the message was created
    pub timestamp: DateTime<Utc>,
    /// Tool invocations made while producing this message
    #[serde(default, rename = "toolCalls", skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    /// Creates a new message with a fresh time-derived identifier.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_message_id(now),
            role,
            content: content.into(),
            timestamp: now,
            tool_calls: Vec::new(),
        }
    }

    /// Shorthand for a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Shorthand for an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Records a tool invocation on this message.
    pub fn add_tool_call(&mut self, tool_call: ToolCall) {
        self.tool_calls.push(tool_call);
    }
}

// The random tail keeps IDs unique when two messages land in the same
// millisecond.
fn generate_message_id(now: DateTime<Utc>) -> String {
    let suffix: String = uuid::Uuid::new_v4().simple().to_string()[..4].to_string();
    format!("msg-{}-{}", now.format("%Y%m%d%H%M%S%3f"), suffix)
}
