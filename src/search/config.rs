//! Per-run search configuration.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::actions::{Capability, ALL_CAPABILITIES};
use crate::board::CityId;

/// Default number of iterations between cooperative checkpoints.
pub const DEFAULT_YIELD_INTERVAL: u64 = 10_000;

/// Default depth (in candidates) down to which progress is reported.
pub const DEFAULT_PROGRESS_DEPTH: usize = 3;

/// Scheduling knobs that do not change what the search finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchTuning {
    /// Iterations between calls to the sink's checkpoint.
    pub yield_interval: u64,
    /// Nodes shallower than this report progress when a branch completes.
    pub progress_depth: usize,
}

impl Default for SearchTuning {
    fn default() -> Self {
        SearchTuning {
            yield_interval: DEFAULT_YIELD_INTERVAL,
            progress_depth: DEFAULT_PROGRESS_DEPTH,
        }
    }
}

/// What one search may do: which capabilities are on, how much it may
/// spend in total, and which cities take part.
///
/// Capabilities missing from `enabled_capabilities` count as disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub enabled_capabilities: BTreeMap<Capability, bool>,
    /// Global budget shared by every participating city.
    pub overall_budget: i64,
    pub participating_cities: BTreeSet<CityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<SearchTuning>,
}

impl SearchConfig {
    /// A config with every capability disabled.
    pub fn new(overall_budget: i64, cities: impl IntoIterator<Item = CityId>) -> Self {
        SearchConfig {
            enabled_capabilities: BTreeMap::new(),
            overall_budget,
            participating_cities: cities.into_iter().collect(),
            tuning: None,
        }
    }

    /// Enables one capability.
    pub fn enable(mut self, capability: Capability) -> Self {
        self.enabled_capabilities.insert(capability, true);
        self
    }

    /// Enables every capability.
    pub fn with_all_capabilities(mut self) -> Self {
        for capability in ALL_CAPABILITIES {
            self.enabled_capabilities.insert(capability, true);
        }
        self
    }

    pub fn with_tuning(mut self, tuning: SearchTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.enabled_capabilities
            .get(&capability)
            .copied()
            .unwrap_or(false)
    }
}
