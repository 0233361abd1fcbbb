//! Board evaluation.
//!
//! Scores a board by its market income, with a weighted building-level sum
//! as tie-break.

pub mod score;

pub use score::{evaluate, level, market_bonus, Score, MARKET_CAP, MAX_LEVEL};
