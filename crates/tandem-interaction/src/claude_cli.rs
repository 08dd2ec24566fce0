//! ClaudeCliTransport - streams assistant replies by spawning the Claude CLI.
//!
//! Each turn spawns `claude --print <rendered history> --output-format
//! stream-json --verbose --include-partial-messages` in the conversation's
//! project directory and decodes its stdout line by line.

use crate::protocol;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tandem_core::conversation::Role;
use tandem_core::transport::{AssistantTransport, DeltaSink};
use tandem_core::{Message, Result, TandemError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Model identifiers the CLI accepts via `--model`.
#[derive(Debug, Clone, Copy, Default)]
pub enum ClaudeModel {
    /// Balanced performance and speed
    #[default]
    Sonnet45,
    /// Previous generation balanced model
    Sonnet4,
    /// Most capable model
    Opus4,
}

impl ClaudeModel {
    fn as_str(&self) -> &str {
        match self {
            ClaudeModel::Sonnet45 => "claude-sonnet-4.5",
            ClaudeModel::Sonnet4 => "claude-sonnet-4",
            ClaudeModel::Opus4 => "claude-opus-4",
        }
    }
}

/// Streaming transport backed by the `claude` command-line tool.
///
/// One process is spawned per [`stream`](AssistantTransport::stream) call,
/// with inherited environment variables and stdin closed. Stdout carries the
/// protocol; stderr is diagnostic only and is drained to the debug log so
/// the child can never block on a full pipe.
pub struct ClaudeCliTransport {
    /// Path to the `claude` executable; bare name resolves via PATH
    binary: PathBuf,
    /// Model passed via `--model`, if any
    model: Option<ClaudeModel>,
    /// Capacity of the internal delta queue between the decode task and
    /// the subscriber
    queue_capacity: usize,
}

impl ClaudeCliTransport {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("claude"),
            model: None,
            queue_capacity: 256,
        }
    }

    /// Uses a specific executable instead of resolving `claude` from PATH.
    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = path.into();
        self
    }

    /// Selects the model to request from the CLI.
    pub fn with_model(mut self, model: ClaudeModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Checks whether the configured binary responds to `--version`.
    ///
    /// # Returns
    ///
    /// The trimmed version string reported by the CLI.
    ///
    /// # Errors
    ///
    /// [`TandemError::ProcessSpawn`] when the binary cannot be executed,
    /// [`TandemError::ProcessExit`] when it runs but reports failure.
    pub async fn probe_version(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| {
                TandemError::process_spawn(format!(
                    "failed to run {} --version: {e}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            return Err(TandemError::ProcessExit {
                code: output.status.code(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for ClaudeCliTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the message history into the single prompt argument the CLI
/// expects: one `Role: content` line per prior turn, terminated by an open
/// `Assistant:` marker. System and unrecognized roles are not part of the
/// rendered dialogue.
fn render_history(history: &[Message]) -> String {
    let mut prompt = String::new();
    for message in history {
        let label = match message.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
            _ => continue,
        };
        prompt.push_str(label);
        prompt.push_str(": ");
        prompt.push_str(&message.content);
        prompt.push('\n');
    }
    prompt.push_str("Assistant:");
    prompt
}

#[async_trait]
impl AssistantTransport for ClaudeCliTransport {
    async fn stream(
        &self,
        history: &[Message],
        project_dir: Option<&Path>,
        cancel: CancellationToken,
        on_delta: &DeltaSink<'_>,
    ) -> Result<()> {
        let prompt = render_history(history);

        let mut cmd = Command::new(&self.binary);
        cmd.arg("--print")
            .arg(&prompt)
            .arg("--output-format")
            .arg("stream-json")
            .arg("--verbose")
            .arg("--include-partial-messages")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(model) = self.model {
            cmd.arg("--model").arg(model.as_str());
        }
        if let Some(dir) = project_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            TandemError::process_spawn(format!("failed to start {}: {e}", self.binary.display()))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TandemError::internal("child stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TandemError::internal("child stderr was not captured"))?;

        // Decoded deltas go through a bounded queue so a slow subscriber
        // back-pressures here instead of stalling the stdout drain.
        let (delta_tx, mut delta_rx) = mpsc::channel::<String>(self.queue_capacity);

        let decode = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(text) = protocol::delta_text(&line) {
                    if delta_tx.send(text).await.is_err() {
                        break;
                    }
                }
            }
        });

        let drain_stderr = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!("assistant stderr: {line}");
            }
        });

        // Forward deltas until the decode task closes the queue, watching
        // for cancellation the whole time.
        loop {
            tokio::select! {
                maybe_delta = delta_rx.recv() => match maybe_delta {
                    Some(text) => on_delta(&text),
                    None => break,
                },
                _ = cancel.cancelled() => {
                    let _ = child.kill().await;
                    decode.abort();
                    drain_stderr.abort();
                    return Err(TandemError::Cancelled);
                }
            }
        }

        // Both drains must finish before the child is awaited, otherwise a
        // full pipe buffer can deadlock the exit.
        let _ = decode.await;
        let _ = drain_stderr.await;

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                return Err(TandemError::Cancelled);
            }
        };

        if status.success() {
            Ok(())
        } else {
            tracing::warn!(code = status.code(), "assistant process exited non-zero");
            Err(TandemError::ProcessExit {
                code: status.code(),
            })
        }
    }
}
