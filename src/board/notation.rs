//! Compact text notation for boards.
//!
//! One line per row, tiles separated by whitespace. Each tile is a
//! three-character token `<terrain><building><city>`:
//!
//! - terrain: `g` field, `c` crop, `t` forest, `m` mountain, `w` water
//! - building: `-` none, `C` city, `L` lumber hut, `F` farm, `N` mine,
//!   `S` sawmill, `W` windmill, `G` forge, `M` market
//! - city: `.` unclaimed, otherwise a one-character city id
//!
//! Example: `g-a tLa cFb` is a three-tile row.

use super::state::{Board, GridError};
use super::tile::{Building, CityId, Terrain, Tile};

/// Errors that can occur while parsing board notation.
#[derive(Debug, thiserror::Error)]
pub enum NotationError {
    #[error("board notation has no rows")]
    Empty,

    #[error("row {row} has {actual} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid tile token '{0}'")]
    InvalidToken(String),

    #[error("board exceeds 65535 tiles per side")]
    TooLarge,

    #[error(transparent)]
    Grid(#[from] GridError),
}

fn parse_tile(token: &str, x: u16, y: u16) -> Result<Tile, NotationError> {
    let invalid = || NotationError::InvalidToken(token.to_string());
    let mut chars = token.chars();
    let (Some(t), Some(b), Some(c), None) = (chars.next(), chars.next(), chars.next(), chars.next())
    else {
        return Err(invalid());
    };

    let terrain = Terrain::from_notation_char(t).ok_or_else(invalid)?;
    let building = match b {
        '-' => None,
        other => Some(Building::from_notation_char(other).ok_or_else(invalid)?),
    };
    let city = match c {
        '.' => None,
        other if other.is_alphanumeric() => Some(CityId::new(other.to_string())),
        _ => return Err(invalid()),
    };

    Ok(Tile {
        x,
        y,
        terrain,
        building,
        city,
    })
}

/// Parses a board from its text notation.
pub fn parse_board(text: &str) -> Result<Board, NotationError> {
    let rows: Vec<Vec<&str>> = text
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>())
        .filter(|r| !r.is_empty())
        .collect();
    if rows.is_empty() {
        return Err(NotationError::Empty);
    }

    let width = rows[0].len();
    if width > u16::MAX as usize || rows.len() > u16::MAX as usize {
        return Err(NotationError::TooLarge);
    }

    let mut tiles = Vec::with_capacity(width * rows.len());
    for (y, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(NotationError::RaggedRow {
                row: y,
                expected: width,
                actual: row.len(),
            });
        }
        for (x, token) in row.iter().enumerate() {
            tiles.push(parse_tile(token, x as u16, y as u16)?);
        }
    }

    Ok(Board::from_tiles(width as u16, rows.len() as u16, tiles)?)
}

/// Encodes a board into text notation.
///
/// Only boards whose city ids are single characters round-trip; longer ids
/// are written as their first character.
pub fn encode_board(board: &Board) -> String {
    let mut out = String::with_capacity(board.len() * 4);
    for (i, tile) in board.tiles().iter().enumerate() {
        if i > 0 {
            out.push(if i % board.width() as usize == 0 { '\n' } else { ' ' });
        }
        out.push(tile.terrain.notation_char());
        out.push(tile.building.map_or('-', |b| b.notation_char()));
        out.push(
            tile.city
                .as_ref()
                .and_then(|c| c.as_str().chars().next())
                .unwrap_or('.'),
        );
    }
    out
}
