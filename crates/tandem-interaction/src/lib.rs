//! Assistant transport implementations.
//!
//! Currently a single backend: [`ClaudeCliTransport`], which drives the
//! Claude CLI in non-interactive streaming mode.

pub mod claude_cli;
pub mod protocol;

pub use claude_cli::{ClaudeCliTransport, ClaudeModel};
