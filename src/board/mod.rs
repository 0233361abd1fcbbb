//! Board representation.
//!
//! Contains the tile and building types, the board grid, the 8-tile
//! neighborhood, city topology edits, a text notation, and a seeded
//! scenario generator.

pub mod adjacency;
pub mod city;
pub mod notation;
pub mod random;
pub mod state;
pub mod tile;

pub use adjacency::Neighbors;
pub use city::{extend_city, found_city};
pub use notation::{encode_board, parse_board, NotationError};
pub use state::{Board, GridError};
pub use tile::{Building, BuildingSet, CityId, Terrain, Tile, ALL_BUILDINGS};
