//! JSON-lines message parser.
//!
//! Parses one line of caller input into an `Inbound` message and encodes
//! `Outbound` messages back into single lines.

use serde_json::Value;
use tracing::warn;

use super::messages::{Inbound, Outbound};

/// Errors from decoding or encoding a protocol line.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty line")]
    Empty,

    #[error("invalid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("message has no string \"type\" field")]
    MissingType,

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("malformed {kind} message: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decodes a single line into an `Inbound` message.
pub fn decode_message(line: &str) -> Result<Inbound, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }

    let value: Value = serde_json::from_str(trimmed).map_err(ProtocolError::Json)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?
        .to_string();
    if !Inbound::TYPES.contains(&kind.as_str()) {
        return Err(ProtocolError::UnknownType(kind));
    }
    serde_json::from_value(value).map_err(|source| ProtocolError::Malformed { kind, source })
}

/// Parses a single line of input into an `Inbound` message.
///
/// Returns `None` for empty lines, unknown types, and malformed messages.
/// Everything but an empty line is logged as a warning.
pub fn parse_message(line: &str) -> Option<Inbound> {
    match decode_message(line) {
        Ok(msg) => Some(msg),
        Err(ProtocolError::Empty) => None,
        Err(e) => {
            warn!("ignoring message: {e}");
            None
        }
    }
}

/// Encodes `msg` as one JSON line, without the trailing newline.
pub fn encode_message(msg: &Outbound) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(ProtocolError::Encode)
}
