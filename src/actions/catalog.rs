//! Action descriptors and the catalog.
//!
//! Every action is a variant of the closed `ActionId` enum. A descriptor
//! pairs an id with a cost and the capability that gates it; the catalog is
//! the read-only table of descriptors a search draws from.

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Building, Terrain};

/// A capability flag gating a family of actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Forestry,
    Farming,
    Mining,
    Mathematics,
    Construction,
    Smithery,
    Trade,
    Demolition,
}

pub const ALL_CAPABILITIES: [Capability; 8] = [
    Capability::Forestry,
    Capability::Farming,
    Capability::Mining,
    Capability::Mathematics,
    Capability::Construction,
    Capability::Smithery,
    Capability::Trade,
    Capability::Demolition,
];

/// What an action does to the tile it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Place a building on the tile.
    Place(Building),
    /// Replace the tile's terrain.
    SetTerrain(Terrain),
    /// Remove the tile's building.
    Remove,
}

/// Identifies one kind of action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    BuildLumberHut,
    BuildFarm,
    BuildMine,
    BuildSawmill,
    BuildWindmill,
    BuildForge,
    BuildMarket,
    ClearForest,
    BurnForest,
    Destroy,
}

pub const ALL_ACTIONS: [ActionId; 10] = [
    ActionId::BuildLumberHut,
    ActionId::BuildFarm,
    ActionId::BuildMine,
    ActionId::BuildSawmill,
    ActionId::BuildWindmill,
    ActionId::BuildForge,
    ActionId::BuildMarket,
    ActionId::ClearForest,
    ActionId::BurnForest,
    ActionId::Destroy,
];

impl ActionId {
    /// Returns the snake_case name used on the wire.
    pub const fn name(self) -> &'static str {
        match self {
            ActionId::BuildLumberHut => "build_lumber_hut",
            ActionId::BuildFarm => "build_farm",
            ActionId::BuildMine => "build_mine",
            ActionId::BuildSawmill => "build_sawmill",
            ActionId::BuildWindmill => "build_windmill",
            ActionId::BuildForge => "build_forge",
            ActionId::BuildMarket => "build_market",
            ActionId::ClearForest => "clear_forest",
            ActionId::BurnForest => "burn_forest",
            ActionId::Destroy => "destroy",
        }
    }

    pub const fn effect(self) -> Effect {
        match self {
            ActionId::BuildLumberHut => Effect::Place(Building::LumberHut),
            ActionId::BuildFarm => Effect::Place(Building::Farm),
            ActionId::BuildMine => Effect::Place(Building::Mine),
            ActionId::BuildSawmill => Effect::Place(Building::Sawmill),
            ActionId::BuildWindmill => Effect::Place(Building::Windmill),
            ActionId::BuildForge => Effect::Place(Building::Forge),
            ActionId::BuildMarket => Effect::Place(Building::Market),
            ActionId::ClearForest => Effect::SetTerrain(Terrain::Field),
            ActionId::BurnForest => Effect::SetTerrain(Terrain::Crop),
            ActionId::Destroy => Effect::Remove,
        }
    }

    /// The building this action places, if any.
    pub const fn places(self) -> Option<Building> {
        match self.effect() {
            Effect::Place(b) => Some(b),
            _ => None,
        }
    }

    /// Cost in stars in the standard catalog.
    pub const fn default_cost(self) -> u32 {
        match self {
            ActionId::BuildLumberHut => 3,
            ActionId::BuildFarm
            | ActionId::BuildMine
            | ActionId::BuildSawmill
            | ActionId::BuildWindmill
            | ActionId::BuildForge
            | ActionId::BuildMarket
            | ActionId::BurnForest => 5,
            ActionId::ClearForest | ActionId::Destroy => 0,
        }
    }

    /// Capability gating this action in the standard catalog.
    pub const fn default_capability(self) -> Capability {
        match self {
            ActionId::BuildLumberHut | ActionId::ClearForest | ActionId::BurnForest => {
                Capability::Forestry
            }
            ActionId::BuildFarm => Capability::Farming,
            ActionId::BuildMine => Capability::Mining,
            ActionId::BuildSawmill => Capability::Mathematics,
            ActionId::BuildWindmill => Capability::Construction,
            ActionId::BuildForge => Capability::Smithery,
            ActionId::BuildMarket => Capability::Trade,
            ActionId::Destroy => Capability::Demolition,
        }
    }

    /// Returns true if this action can target the tile at `index`.
    ///
    /// Only tile-local and neighborhood rules are checked here. Per-city
    /// uniqueness and the budget belong to the caller.
    pub fn is_feasible(self, board: &Board, index: usize) -> bool {
        let tile = board.tile_at(index);
        match self.effect() {
            Effect::Place(building) => {
                tile.city.is_some()
                    && tile.building.is_none()
                    && tile.terrain == building.site()
                    && building.feeder().map_or(true, |feeder| {
                        board
                            .neighbors(index)
                            .any(|n| board.tile_at(n).building == Some(feeder))
                    })
            }
            Effect::SetTerrain(_) => tile.terrain == Terrain::Forest && tile.building.is_none(),
            Effect::Remove => matches!(tile.building, Some(b) if b != Building::City),
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A catalog entry: an action with its cost and gating capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub cost: u32,
    pub capability: Capability,
}

impl Action {
    /// The standard descriptor for `id`.
    pub const fn standard(id: ActionId) -> Self {
        Action {
            id,
            cost: id.default_cost(),
            capability: id.default_capability(),
        }
    }

    pub fn is_feasible(&self, board: &Board, index: usize) -> bool {
        self.id.is_feasible(board, index)
    }
}

static STANDARD: LazyLock<Catalog> =
    LazyLock::new(|| Catalog::new(ALL_ACTIONS.iter().map(|&id| Action::standard(id)).collect()));

/// A fixed table of action descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    actions: Vec<Action>,
}

impl Catalog {
    /// Builds a catalog from descriptors. Later duplicates of an id are dropped.
    pub fn new(actions: Vec<Action>) -> Self {
        let mut deduped: Vec<Action> = Vec::with_capacity(actions.len());
        for action in actions {
            if !deduped.iter().any(|a| a.id == action.id) {
                deduped.push(action);
            }
        }
        Catalog { actions: deduped }
    }

    /// The process-wide standard catalog.
    pub fn standard() -> &'static Catalog {
        &STANDARD
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
