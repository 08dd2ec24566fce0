//! Core domain layer for Tandem: the conversation data model, the error
//! taxonomy, and the traits the other crates plug into.

pub mod conversation;
pub mod error;
pub mod event;
pub mod transport;

// Re-export common error type
pub use conversation::{Conversation, ConversationStore, Message, Role, ToolCall, ToolStatus};
pub use error::{Result, TandemError};
pub use event::TurnEvent;
pub use transport::{AssistantTransport, DeltaSink};
