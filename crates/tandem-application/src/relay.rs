//! Event relay between the turn orchestrator and the UI notification
//! surface.
//!
//! The relay republishes each delta and lifecycle signal on a broadcast
//! channel, annotated with the conversation id, without reordering or
//! batching anything.

use crate::service::ConversationService;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_core::{Conversation, Result, TurnEvent};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Publishes [`TurnEvent`]s for every turn driven through it.
///
/// Per turn the relay emits `Thinking`, then one `Response` per delta in
/// the exact order received, then exactly one of `Complete` / `Error`.
/// Absent or lagging subscribers never fail the turn.
pub struct EventRelay {
    service: Arc<ConversationService>,
    events: broadcast::Sender<TurnEvent>,
}

impl EventRelay {
    pub fn new(service: Arc<ConversationService>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { service, events }
    }

    /// Subscribes to the turn event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<TurnEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: TurnEvent) {
        // A send error only means there are no subscribers right now.
        let _ = self.events.send(event);
    }

    /// Sends one user message and publishes the turn's lifecycle as events.
    ///
    /// Returns the updated conversation on success. On failure the error is
    /// both published as an `Error` event and returned; the `Complete`
    /// signal is suppressed.
    pub async fn send_with_events(
        &self,
        conversation_id: &str,
        user_text: &str,
        cancel: CancellationToken,
    ) -> Result<Conversation> {
        tracing::info!(id = %conversation_id, "turn started");
        self.emit(TurnEvent::Thinking {
            conversation_id: conversation_id.to_string(),
        });

        let has_content = AtomicBool::new(false);
        let sink = |delta: &str| {
            if !delta.trim().is_empty() {
                has_content.store(true, Ordering::Relaxed);
            }
            self.emit(TurnEvent::Response {
                conversation_id: conversation_id.to_string(),
                content: delta.to_string(),
            });
        };

        match self
            .service
            .send_turn(conversation_id, user_text, cancel, &sink)
            .await
        {
            Ok(conversation) => {
                self.emit(TurnEvent::Complete {
                    conversation_id: conversation_id.to_string(),
                    has_content: has_content.load(Ordering::Relaxed),
                });
                Ok(conversation)
            }
            Err(e) => {
                self.emit(TurnEvent::Error {
                    conversation_id: conversation_id.to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }
}
