//! Action catalog.
//!
//! Parameterized tile edits (place a building, clear or burn a forest, raze
//! a building), each gated by a capability flag and carrying a cost.

pub mod catalog;
pub mod effect;

pub use catalog::{Action, ActionId, Capability, Catalog, Effect, ALL_ACTIONS, ALL_CAPABILITIES};
pub use effect::{apply_action, ActionError, Undo};
