//! Storage layer for Tandem: on-disk conversation persistence and path
//! resolution.

pub mod json_store;
pub mod paths;

pub use json_store::JsonConversationStore;
pub use paths::TandemPaths;
