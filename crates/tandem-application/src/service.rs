//! Conversation use case layer.
//!
//! `ConversationService` is the only component that mutates and persists a
//! conversation as the result of a user-initiated send, and it also carries
//! the plain CRUD operations the shell exposes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tandem_core::transport::DeltaSink;
use tandem_core::{
    AssistantTransport, Conversation, ConversationStore, Message, Result, TandemError,
};
use tokio_util::sync::CancellationToken;

/// Orchestrates conversation persistence and assistant turns.
///
/// # Concurrency
///
/// Turns on different conversation ids are fully independent and may run in
/// parallel, each with its own assistant process. Callers must not invoke
/// [`send_turn`](Self::send_turn) concurrently for the *same* id: both calls
/// would load-mutate-save the same record with last-write-wins semantics.
/// Serializing per-id turns is a caller obligation, not enforced here.
pub struct ConversationService {
    store: Arc<dyn ConversationStore>,
    transport: Arc<dyn AssistantTransport>,
}

impl ConversationService {
    pub fn new(store: Arc<dyn ConversationStore>, transport: Arc<dyn AssistantTransport>) -> Self {
        Self { store, transport }
    }

    /// Creates and persists a new empty conversation.
    pub async fn create(
        &self,
        title: impl Into<String>,
        project_path: Option<PathBuf>,
    ) -> Result<Conversation> {
        let conversation = Conversation::new(title, project_path);
        self.store.save(&conversation).await?;
        tracing::info!(id = %conversation.id, title = %conversation.title, "created conversation");
        Ok(conversation)
    }

    /// Loads a conversation by id.
    pub async fn get(&self, id: &str) -> Result<Conversation> {
        self.store.load(id).await
    }

    /// Lists all stored conversations.
    pub async fn list(&self) -> Result<Vec<Conversation>> {
        self.store.list().await
    }

    /// Persists a whole-record edit (title, project path).
    pub async fn update(&self, conversation: &Conversation) -> Result<()> {
        self.store.save(conversation).await
    }

    /// Deletes the persisted record for a conversation.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(id).await
    }

    /// Returns the most recently updated conversation associated with the
    /// given project directory.
    ///
    /// # Errors
    ///
    /// [`TandemError::NotFound`] when no conversation references the path.
    pub async fn find_by_project_path(&self, project_path: &Path) -> Result<Conversation> {
        let conversations = self.store.list().await?;
        conversations
            .into_iter()
            .filter(|c| c.project_path.as_deref() == Some(project_path))
            .max_by_key(|c| c.updated_at)
            .ok_or_else(|| {
                TandemError::not_found("conversation", project_path.display().to_string())
            })
    }

    /// Drives one full turn: load, append and persist the user message,
    /// stream the assistant reply, then append and persist it.
    ///
    /// Every delta is appended to an internal buffer *and* forwarded to
    /// `on_delta` from the same invocation, so the live subscriber sees
    /// exactly the text that ends up in the assistant message, in order.
    ///
    /// The user message is persisted before the assistant is invoked, so it
    /// survives any transport failure. On failure no assistant message is
    /// appended or persisted; partial buffered text is discarded from
    /// durable state and the error is returned unchanged. There are no
    /// internal retries.
    pub async fn send_turn(
        &self,
        conversation_id: &str,
        user_text: &str,
        cancel: CancellationToken,
        on_delta: &DeltaSink<'_>,
    ) -> Result<Conversation> {
        let mut conversation = self.store.load(conversation_id).await?;

        conversation.append_message(Message::user(user_text));
        self.store.save(&conversation).await?;

        let buffer = Arc::new(Mutex::new(String::new()));
        let accumulate = buffer.clone();
        let sink = move |delta: &str| {
            accumulate.lock().unwrap().push_str(delta);
            on_delta(delta);
        };

        let project_dir = conversation.project_path.clone();
        self.transport
            .stream(
                &conversation.messages,
                project_dir.as_deref(),
                cancel,
                &sink,
            )
            .await
            .inspect_err(|e| {
                tracing::warn!(id = %conversation_id, error = %e, "assistant turn failed");
            })?;

        let content = buffer.lock().unwrap().clone();
        conversation.append_message(Message::assistant(content));
        self.store.save(&conversation).await?;

        tracing::info!(
            id = %conversation_id,
            messages = conversation.messages.len(),
            "assistant turn completed"
        );
        Ok(conversation)
    }
}
