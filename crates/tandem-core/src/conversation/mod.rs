//! Conversation aggregate: model, messages, and the persistence seam.

pub mod message;
pub mod model;
pub mod store;

pub use message::{Message, Role, ToolCall, ToolStatus};
pub use model::Conversation;
pub use store::ConversationStore;
