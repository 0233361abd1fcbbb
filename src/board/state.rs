//! Board state.
//!
//! A board owns every tile in row-major order. Tile `i` sits at
//! `(i % width, i / width)`; constructors and deserialization enforce this so
//! the rest of the crate can index tiles directly.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::adjacency::Neighbors;
use super::tile::{BuildingSet, CityId, Tile};

/// Errors from board construction and city topology edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("expected {expected} tiles for the board size, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },

    #[error("tile {index} has coordinates ({x}, {y}), which do not match its position")]
    MisplacedTile { index: usize, x: u16, y: u16 },

    #[error("tile ({x}, {y}) is outside the board")]
    OutOfBounds { x: u16, y: u16 },

    #[error("tile ({x}, {y}) cannot hold a city")]
    Unbuildable { x: u16, y: u16 },

    #[error("tile ({x}, {y}) already holds a building")]
    Occupied { x: u16, y: u16 },

    #[error("city id must not be empty")]
    EmptyCityId,
}

/// Wire shape of a board before validation.
#[derive(Deserialize)]
struct RawBoard {
    width: u16,
    height: u16,
    tiles: Vec<Tile>,
}

impl TryFrom<RawBoard> for Board {
    type Error = GridError;

    fn try_from(raw: RawBoard) -> Result<Self, Self::Error> {
        Board::from_tiles(raw.width, raw.height, raw.tiles)
    }
}

/// A rectangular grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBoard")]
pub struct Board {
    width: u16,
    height: u16,
    tiles: Vec<Tile>,
}

impl Board {
    /// Creates a board of bare, unclaimed fields.
    pub fn new(width: u16, height: u16) -> Self {
        let tiles = (0..height)
            .flat_map(|y| (0..width).map(move |x| Tile::field(x, y)))
            .collect();
        Board {
            width,
            height,
            tiles,
        }
    }

    /// Builds a board from row-major tiles, checking count and coordinates.
    pub fn from_tiles(width: u16, height: u16, tiles: Vec<Tile>) -> Result<Self, GridError> {
        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(GridError::TileCountMismatch {
                expected,
                actual: tiles.len(),
            });
        }
        for (index, tile) in tiles.iter().enumerate() {
            let x = (index % width as usize) as u16;
            let y = (index / width as usize) as u16;
            if tile.x != x || tile.y != y {
                return Err(GridError::MisplacedTile {
                    index,
                    x: tile.x,
                    y: tile.y,
                });
            }
        }
        Ok(Board {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Returns the row-major index of `(x, y)`, or None if out of bounds.
    pub fn index_of(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn tile(&self, x: u16, y: u16) -> Option<&Tile> {
        self.index_of(x, y).map(|i| &self.tiles[i])
    }

    /// Returns the tile at a row-major index. Panics if out of range.
    #[inline]
    pub fn tile_at(&self, index: usize) -> &Tile {
        &self.tiles[index]
    }

    #[inline]
    pub(crate) fn tile_at_mut(&mut self, index: usize) -> &mut Tile {
        &mut self.tiles[index]
    }

    /// Iterates the indices of the up to 8 tiles touching `index`.
    #[inline]
    pub fn neighbors(&self, index: usize) -> Neighbors {
        Neighbors::new(self.width, self.height, index)
    }

    /// Iterates the indices of every tile belonging to `city`.
    pub fn city_tiles<'a>(&'a self, city: &'a CityId) -> impl Iterator<Item = usize> + 'a {
        self.tiles
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.city.as_ref() == Some(city))
            .map(|(i, _)| i)
    }

    /// Returns every city id present on the board.
    pub fn city_ids(&self) -> BTreeSet<CityId> {
        self.tiles.iter().filter_map(|t| t.city.clone()).collect()
    }

    /// Returns the advanced building kinds already standing in `city`.
    pub fn advanced_in_city(&self, city: &CityId) -> BuildingSet {
        self.city_tiles(city)
            .filter_map(|i| self.tiles[i].building)
            .filter(|b| b.is_advanced())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tile::{Building, Terrain};

    #[test]
    fn new_board_is_all_fields() {
        let board = Board::new(3, 2);
        assert_eq!(board.len(), 6);
        assert!(board.tiles().iter().all(|t| t.is_empty() && t.city.is_none()));
        assert_eq!(board.tile(2, 1).map(|t| (t.x, t.y)), Some((2, 1)));
    }

    #[test]
    fn index_of_bounds() {
        let board = Board::new(3, 2);
        assert_eq!(board.index_of(0, 0), Some(0));
        assert_eq!(board.index_of(2, 1), Some(5));
        assert_eq!(board.index_of(3, 0), None);
        assert_eq!(board.index_of(0, 2), None);
    }

    #[test]
    fn from_tiles_rejects_bad_count() {
        let tiles = Board::new(2, 2).tiles().to_vec();
        let err = Board::from_tiles(3, 2, tiles).unwrap_err();
        assert_eq!(
            err,
            GridError::TileCountMismatch {
                expected: 6,
                actual: 4
            }
        );
    }

    #[test]
    fn from_tiles_rejects_misplaced_tile() {
        let mut tiles = Board::new(2, 2).tiles().to_vec();
        tiles.swap(0, 3);
        assert!(matches!(
            Board::from_tiles(2, 2, tiles),
            Err(GridError::MisplacedTile { index: 0, .. })
        ));
    }

    #[test]
    fn deserialize_validates_invariant() {
        let good = serde_json::to_string(&Board::new(2, 1)).unwrap();
        let parsed: Board = serde_json::from_str(&good).unwrap();
        assert_eq!(parsed, Board::new(2, 1));

        let bad = r#"{"width":2,"height":2,"tiles":[{"x":0,"y":0,"terrain":"field"}]}"#;
        assert!(serde_json::from_str::<Board>(bad).is_err());
    }

    #[test]
    fn city_queries() {
        let mut tiles = Board::new(3, 1).tiles().to_vec();
        tiles[0].city = Some(CityId::from("a"));
        tiles[1].city = Some(CityId::from("a"));
        tiles[1].building = Some(Building::Market);
        tiles[2].city = Some(CityId::from("b"));
        tiles[2].terrain = Terrain::Forest;
        tiles[2].building = Some(Building::LumberHut);
        let board = Board::from_tiles(3, 1, tiles).unwrap();

        let a = CityId::from("a");
        assert_eq!(board.city_tiles(&a).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(board.city_ids().len(), 2);
        assert!(board.advanced_in_city(&a).contains(Building::Market));
        assert!(board.advanced_in_city(&CityId::from("b")).is_empty());
    }
}
