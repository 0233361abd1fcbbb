//! Market placement optimizer library.
//!
//! Exposes the board model, action catalog, scoring, search engine, host,
//! and protocol modules for use by integration tests and the binary entry
//! point.

pub mod actions;
pub mod board;
pub mod engine;
pub mod eval;
pub mod protocol;
pub mod search;
