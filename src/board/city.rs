//! City topology edits.
//!
//! Cities are not stored separately: a city is the set of tiles sharing a
//! `CityId`. Both edits take a board by reference and return a new board,
//! leaving the input untouched.

use super::state::{Board, GridError};
use super::tile::{Building, CityId, Terrain};

/// Turns the tile at `(x, y)` into the center of `city` and claims every
/// unclaimed neighbor.
///
/// The center must be a buildable tile without a building. Feature terrain
/// under the center is cleared to a field.
pub fn found_city(board: &Board, x: u16, y: u16, city: &CityId) -> Result<Board, GridError> {
    if city.as_str().is_empty() {
        return Err(GridError::EmptyCityId);
    }
    let center = board.index_of(x, y).ok_or(GridError::OutOfBounds { x, y })?;
    let tile = board.tile_at(center);
    if tile.terrain == Terrain::Water {
        return Err(GridError::Unbuildable { x, y });
    }
    if tile.building.is_some() {
        return Err(GridError::Occupied { x, y });
    }

    let mut next = board.clone();
    {
        let center_tile = next.tile_at_mut(center);
        center_tile.terrain = Terrain::Field;
        center_tile.building = Some(Building::City);
        center_tile.city = Some(city.clone());
    }
    for n in board.neighbors(center) {
        let t = next.tile_at_mut(n);
        if t.city.is_none() {
            t.city = Some(city.clone());
        }
    }
    Ok(next)
}

/// Grows `city` by one ring: every unclaimed neighbor of a member tile joins.
///
/// Returns an unchanged copy when nothing is left to claim or the city has
/// no tiles.
pub fn extend_city(board: &Board, city: &CityId) -> Board {
    let mut claimed: Vec<usize> = board
        .city_tiles(city)
        .flat_map(|i| board.neighbors(i))
        .filter(|&n| board.tile_at(n).city.is_none())
        .collect();
    claimed.sort_unstable();
    claimed.dedup();

    let mut next = board.clone();
    for n in claimed {
        next.tile_at_mut(n).city = Some(city.clone());
    }
    next
}
