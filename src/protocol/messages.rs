//! Messages crossing the host boundary.
//!
//! Both directions are internally tagged by `type` with snake_case names,
//! e.g. `{"type": "progress", "fraction": 0.5}`.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::search::{SearchConfig, SearchStatus, Solution};

/// Caller-to-worker messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    /// Start a search on `board`.
    Start { board: Board, config: SearchConfig },
    /// Cancel the running search, if any.
    Cancel,
}

impl Inbound {
    /// Wire names of every inbound message type.
    pub const TYPES: [&'static str; 2] = ["start", "cancel"];
}

/// Worker-to-caller messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// The worker is listening.
    Ready,
    Progress {
        fraction: f64,
    },
    NewSolution {
        solution: Solution,
    },
    /// Ends a run.
    Result {
        board: Board,
        status: SearchStatus,
        iterations: u64,
    },
    /// Ends a run that failed to start or failed while running. Also
    /// answers a `start` sent while busy; that rejection leaves the
    /// running search untouched, so its own `result` still follows.
    Error {
        message: String,
    },
}

impl Outbound {
    pub fn error(message: impl Into<String>) -> Self {
        Outbound::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_board;

    #[test]
    fn cancel_wire_shape() {
        let json = serde_json::to_string(&Inbound::Cancel).unwrap();
        assert_eq!(json, r#"{"type":"cancel"}"#);
    }

    #[test]
    fn start_round_trips() {
        let board = parse_board("g-a gSa tLa").unwrap();
        let config = SearchConfig::new(5, [crate::board::CityId::from("a")]);
        let msg = Inbound::Start { board, config };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.starts_with(r#"{"type":"start""#));
        let back: Inbound = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn outbound_tags() {
        let value = serde_json::to_value(Outbound::Progress { fraction: 0.25 }).unwrap();
        assert_eq!(value["type"], "progress");
        assert_eq!(value["fraction"], 0.25);

        let value = serde_json::to_value(Outbound::Result {
            board: Board::new(1, 1),
            status: SearchStatus::Cancelled,
            iterations: 3,
        })
        .unwrap();
        assert_eq!(value["type"], "result");
        assert_eq!(value["status"], "cancelled");

        let value = serde_json::to_value(Outbound::error("boom")).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "boom");
    }
}
