//! Application layer for Tandem: turn orchestration, conversation CRUD,
//! and the UI event relay.

pub mod relay;
pub mod service;

pub use relay::EventRelay;
pub use service::ConversationService;
