//! Placement search.
//!
//! Ranks the candidate tiles, then runs an anytime backtracking search over
//! them, streaming progress and improving solutions into an `EventSink`.

pub mod backtrack;
pub mod candidates;
pub mod config;
pub mod events;

pub use backtrack::{optimize, OptimizeError, SearchOutcome, SearchStatus};
pub use config::{SearchConfig, SearchTuning, DEFAULT_PROGRESS_DEPTH, DEFAULT_YIELD_INTERVAL};
pub use events::{
    CancelToken, EventSink, FnSink, HistoryEntry, SearchEvent, Solution, TileCoords,
};
