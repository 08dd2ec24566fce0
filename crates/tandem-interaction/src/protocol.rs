//! Decoder for the assistant CLI's line-delimited JSON stream.
//!
//! One JSON object per stdout line. The only shape that carries output text
//! is a `stream_event` envelope holding a `content_block_delta` event:
//!
//! ```text
//! {"type":"stream_event","event":{"type":"content_block_delta","delta":{"text":"..."}}}
//! ```
//!
//! Everything else - blank lines, non-JSON lines, unknown envelope or event
//! kinds - is skipped without error. The protocol is forward-compatible by
//! design and new event kinds must not abort decoding.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    event: Option<StreamEvent>,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    text: Option<String>,
}

/// Extracts the text delta from one stdout line, if it carries one.
///
/// Returns `None` for every tolerated non-delta line; decoding never fails.
pub fn delta_text(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let envelope: Envelope = serde_json::from_str(line).ok()?;
    if envelope.kind != "stream_event" {
        return None;
    }

    let event = envelope.event?;
    if event.kind != "content_block_delta" {
        return None;
    }

    let text = event.delta?.text?;
    if text.is_empty() { None } else { Some(text) }
}
