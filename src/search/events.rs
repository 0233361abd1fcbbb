//! Search events, solutions, and cancellation.
//!
//! The engine never calls back into caller code directly; it emits
//! `SearchEvent`s into an `EventSink`. Sinks exist for discarding events,
//! collecting them, forwarding them over a channel, and wrapping a closure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::actions::ActionId;
use crate::board::{Board, CityId};
use crate::eval::Score;

/// Shared cancellation flag for one search run.
///
/// Clones share the flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoords {
    pub x: u16,
    pub y: u16,
}

/// One applied action in a solution's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action_id: ActionId,
    pub tile_coords: TileCoords,
    pub city_id: Option<CityId>,
    pub cost: u32,
}

/// An improving assignment found by the search. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub score: i32,
    pub secondary_score: i32,
    /// Iteration counter value when the solution was found.
    pub iteration: u64,
    pub board: Board,
    /// Actions in the order they were applied.
    pub history: Vec<HistoryEntry>,
}

impl Solution {
    pub fn score_value(&self) -> Score {
        Score {
            primary: self.score,
            secondary: self.secondary_score,
        }
    }

    /// Total stars spent.
    pub fn total_cost(&self) -> u64 {
        self.history.iter().map(|h| h.cost as u64).sum()
    }

    /// Stars spent per bonus point gained over `baseline`, or None if the
    /// solution gains nothing.
    pub fn break_even(&self, baseline: Score) -> Option<f64> {
        let gained = self.score - baseline.primary;
        if gained <= 0 {
            return None;
        }
        Some(self.total_cost() as f64 / gained as f64)
    }
}

/// An event emitted while a search runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// Approximate fraction of the search explored, in `0.0..=1.0`.
    Progress(f64),
    NewSolution(Solution),
}

/// Receiver of search events.
pub trait EventSink {
    fn emit(&mut self, event: SearchEvent);

    /// Cooperative suspension point, called every `yield_interval` iterations.
    fn checkpoint(&mut self) {}
}

impl EventSink for () {
    fn emit(&mut self, _event: SearchEvent) {}
}

impl EventSink for Vec<SearchEvent> {
    fn emit(&mut self, event: SearchEvent) {
        self.push(event);
    }
}

impl EventSink for Sender<SearchEvent> {
    fn emit(&mut self, event: SearchEvent) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.send(event);
    }

    fn checkpoint(&mut self) {
        std::thread::yield_now();
    }
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn emit(&mut self, event: SearchEvent) {
        (**self).emit(event);
    }

    fn checkpoint(&mut self) {
        (**self).checkpoint();
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F: FnMut(SearchEvent)> EventSink for FnSink<F> {
    fn emit(&mut self, event: SearchEvent) {
        (self.0)(event);
    }
}
