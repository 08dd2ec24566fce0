//! Unified path management for Tandem data files.
//!
//! All durable state lives under a single base directory in the user's
//! home (`~/.tandem/` by default):
//!
//! ```text
//! ~/.tandem/
//! └── conversations/
//!     ├── conv-20250101120000-a1b2c3.json
//!     └── conv-20250102093000-d4e5f6.json
//! ```

use std::path::PathBuf;
use tandem_core::{Result, TandemError};

/// Directory name under the home directory holding all Tandem state.
const BASE_DIR_NAME: &str = ".tandem";

/// Path resolution for Tandem's on-disk layout.
pub struct TandemPaths;

impl TandemPaths {
    /// Returns the base data directory (`~/.tandem`).
    ///
    /// # Errors
    ///
    /// Fails when the home directory cannot be determined.
    pub fn base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(BASE_DIR_NAME))
            .ok_or_else(|| TandemError::internal("cannot determine home directory"))
    }

    /// Returns the conversations directory (`~/.tandem/conversations`).
    pub fn conversations_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("conversations"))
    }
}
