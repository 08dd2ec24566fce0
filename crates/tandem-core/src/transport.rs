//! Assistant transport trait.
//!
//! The transport owns one external assistant invocation per turn: it turns
//! a message history into a process call and yields the incrementally
//! generated answer as plain-text deltas.

use crate::conversation::Message;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Sink for incremental assistant text.
///
/// Called zero or many times per stream, in delta order, from the task
/// draining the assistant's output. It gates how fast that output is
/// drained, so it must not block for unbounded durations.
pub type DeltaSink<'a> = dyn Fn(&str) + Send + Sync + 'a;

/// One-shot streaming invocation of an external assistant.
///
/// A call is restartable (a failed turn can simply be retried by the
/// caller) but not resumable mid-stream.
#[async_trait]
pub trait AssistantTransport: Send + Sync {
    /// Streams one assistant reply for the given message history.
    ///
    /// # Arguments
    ///
    /// * `history` - Ordered prior messages; only role and content matter
    /// * `project_dir` - Working directory for the assistant process;
    ///   `None` runs in the process default directory
    /// * `cancel` - Sole cancellation mechanism for the call; cancelling it
    ///   terminates the spawned process and unblocks the stream
    /// * `on_delta` - Receives each text delta as soon as it is decoded
    ///
    /// # Errors
    ///
    /// Returns `Ok(())` only after the process exited with status 0 and its
    /// output was fully drained. Failures map to
    /// [`TandemError::ProcessSpawn`](crate::TandemError::ProcessSpawn),
    /// [`TandemError::ProcessExit`](crate::TandemError::ProcessExit) or
    /// [`TandemError::Cancelled`](crate::TandemError::Cancelled). Deltas
    /// already delivered before a failure are not retracted; the caller
    /// decides what to keep.
    async fn stream(
        &self,
        history: &[Message],
        project_dir: Option<&Path>,
        cancel: CancellationToken,
        on_delta: &DeltaSink<'_>,
    ) -> Result<()>;
}
