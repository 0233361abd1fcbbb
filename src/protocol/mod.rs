//! Worker protocol.
//!
//! Message types for the start/cancel control channel and the
//! progress/solution/result stream, plus the JSON-lines codec the binary
//! speaks on stdio.

pub mod messages;
pub mod parser;

pub use messages::{Inbound, Outbound};
pub use parser::{decode_message, encode_message, parse_message, ProtocolError};
