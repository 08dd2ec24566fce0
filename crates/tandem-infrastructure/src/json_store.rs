//! File-backed ConversationStore implementation.
//!
//! One pretty-printed JSON file per conversation, named `<id>.json`, under
//! a single directory. Writes are atomic (tmp file + rename) so a crash
//! mid-save never leaves a half-written record behind.

use crate::paths::TandemPaths;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tandem_core::{Conversation, ConversationStore, Result, TandemError};
use tokio::fs;

/// JSON-file conversation store.
///
/// Concurrent access across different conversation ids is safe: each id
/// maps to its own file and the atomic rename keeps readers from observing
/// partial writes. Within one id, callers serialize writes (one in-flight
/// turn per conversation).
pub struct JsonConversationStore {
    conversations_dir: PathBuf,
}

impl JsonConversationStore {
    /// Opens (and creates if needed) a store rooted at the given directory.
    pub async fn new(conversations_dir: impl Into<PathBuf>) -> Result<Self> {
        let conversations_dir = conversations_dir.into();
        fs::create_dir_all(&conversations_dir).await?;
        Ok(Self { conversations_dir })
    }

    /// Opens the store at the default location (`~/.tandem/conversations`).
    pub async fn default_location() -> Result<Self> {
        Self::new(TandemPaths::conversations_dir()?).await
    }

    fn record_path(&self, id: &str) -> Result<PathBuf> {
        // Generated ids never contain path separators; anything that does
        // cannot name a record in this store.
        if id.is_empty() || id.contains(['/', '\\']) {
            return Err(TandemError::not_found("conversation", id));
        }
        Ok(self.conversations_dir.join(format!("{id}.json")))
    }

    async fn read_record(&self, path: &Path) -> Result<Conversation> {
        let bytes = fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                let id = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                TandemError::not_found("conversation", id)
            } else {
                e.into()
            }
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ConversationStore for JsonConversationStore {
    async fn save(&self, conversation: &Conversation) -> Result<()> {
        let path = self.record_path(&conversation.id)?;
        let json = serde_json::to_vec_pretty(conversation)?;

        // Write to a sibling tmp file, then rename into place.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json).await?;
        fs::rename(&tmp, &path).await?;

        tracing::debug!(id = %conversation.id, "saved conversation");
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Conversation> {
        let path = self.record_path(id)?;
        self.read_record(&path).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.record_path(id)?;
        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TandemError::not_found("conversation", id)
            } else {
                e.into()
            }
        })
    }

    async fn list(&self) -> Result<Vec<Conversation>> {
        let mut entries = fs::read_dir(&self.conversations_dir).await?;
        let mut conversations = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_record(&path).await {
                Ok(conversation) => conversations.push(conversation),
                Err(e) => {
                    // An unreadable record must not hide the rest.
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable conversation record");
                }
            }
        }

        Ok(conversations)
    }
}
