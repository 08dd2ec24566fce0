//! Conversation domain model.
//!
//! A conversation is the aggregate every other component manipulates: an
//! ordered, append-only sequence of messages plus the metadata the UI needs
//! to list and resume it.

use super::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A persisted multi-turn conversation.
///
/// Insertion order is conversation order; messages are never reordered.
/// `updated_at` is refreshed on every append and on whole-record edits,
/// so `updated_at >= created_at` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique conversation identifier
    pub id: String,
    /// Human-readable conversation title
    pub title: String,
    /// Associated project directory, if any
    #[serde(default)]
    pub project_path: Option<PathBuf>,
    /// Timestamp when the conversation was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the conversation was last updated
    pub updated_at: DateTime<Utc>,
    /// Ordered message history
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Creates a new empty conversation with a fresh identifier.
    pub fn new(title: impl Into<String>, project_path: Option<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_conversation_id(now),
            title: title.into(),
            project_path,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Appends a message and refreshes `updated_at`.
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Returns the most recently appended message, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

// Embedding the creation timestamp keeps IDs roughly sortable; the random
// suffix guarantees uniqueness without central coordination.
fn generate_conversation_id(now: DateTime<Utc>) -> String {
    let suffix: String = uuid::Uuid::new_v4().simple().to_string()[..6].to_string();
    format!("conv-{}-{}", now.format("%Y%m%d%H%M%S"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_conversation_is_empty_with_matching_timestamps() {
        let conv = Conversation::new("Untitled", None);
        assert!(conv.messages.is_empty());
        assert!(conv.id.starts_with("conv-"));
        assert_eq!(conv.created_at, conv.updated_at);
    }

    #[test]
    fn conversation_ids_are_unique() {
        let a = Conversation::new("a", None);
        let b = Conversation::new("b", None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn append_refreshes_updated_at_and_preserves_order() {
        let mut conv = Conversation::new("test", None);
        let created = conv.created_at;

        conv.append_message(Message::user("first"));
        conv.append_message(Message::assistant("second"));

        assert!(conv.updated_at >= created);
        assert_eq!(conv.messages[0].content, "first");
        assert_eq!(conv.messages[1].content, "second");
        assert_eq!(conv.last_message().unwrap().content, "second");
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let conv = Conversation::new("test", Some(PathBuf::from("/tmp/proj")));
        let json = serde_json::to_string(&conv).unwrap();
        assert!(json.contains("\"projectPath\""));
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"updatedAt\""));
    }

    #[test]
    fn round_trips_through_json() {
        let mut conv = Conversation::new("round trip", None);
        conv.append_message(Message::user("hello"));

        let json = serde_json::to_string(&conv).unwrap();
        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(conv, back);
    }
}
