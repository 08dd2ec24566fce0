//! Conversation store trait.
//!
//! Defines the interface for conversation persistence operations.

use super::model::Conversation;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract store for durable conversation records.
///
/// This trait decouples the orchestration logic from the specific storage
/// mechanism (JSON files, a database, a remote API). Implementations must
/// support safe concurrent access across different conversation ids without
/// cross-conversation blocking; within one id the orchestrator is the only
/// writer during a turn.
///
/// "Not found" and "I/O failure" are distinct error kinds
/// ([`TandemError::NotFound`](crate::TandemError::NotFound) vs
/// [`TandemError::Io`](crate::TandemError::Io)); implementations must not
/// collapse one into the other.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persists a conversation, overwriting any existing record with the
    /// same id.
    async fn save(&self, conversation: &Conversation) -> Result<()>;

    /// Loads a conversation by id.
    ///
    /// # Errors
    ///
    /// Returns [`TandemError::NotFound`](crate::TandemError::NotFound) when
    /// no record exists for the id.
    async fn load(&self, id: &str) -> Result<Conversation>;

    /// Deletes the persisted record for the given id.
    ///
    /// Deletion is advisory, best-effort cleanup; it does not need to be
    /// transactional with in-memory references.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Lists all stored conversations, in no guaranteed order.
    async fn list(&self) -> Result<Vec<Conversation>>;
}
