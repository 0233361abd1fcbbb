//! Market scoring.
//!
//! A contributor (sawmill, windmill, forge) has a level equal to the number
//! of adjacent feeder buildings, capped at `MAX_LEVEL`. A market earns the
//! sum of its adjacent contributors' levels, capped at `MARKET_CAP`.
//!
//! The primary score is the total market bonus. The secondary score weighs
//! every contributor level and market bonus and only breaks ties.
//!
//! Hot path: called at every search leaf. Runs in O(tiles * 8) plus 64
//! neighbor reads per market, with no heap allocation.

use std::ops::Sub;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Building};

/// Highest level a single contributor can reach.
pub const MAX_LEVEL: i32 = 8;

/// Highest bonus a single market can earn.
pub const MARKET_CAP: i32 = 8;

/// Weight of each contributor level in the secondary score.
pub const CONTRIBUTOR_WEIGHT: i32 = 2;

/// Weight of each market bonus point in the secondary score.
pub const MARKET_WEIGHT: i32 = 1;

/// Objective value of a board. Orders by `primary`, then `secondary`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Score {
    pub primary: i32,
    pub secondary: i32,
}

impl Sub for Score {
    type Output = Score;

    fn sub(self, rhs: Score) -> Score {
        Score {
            primary: self.primary - rhs.primary,
            secondary: self.secondary - rhs.secondary,
        }
    }
}

/// Level of the building at `index`: feeder count for contributors, 0 otherwise.
#[inline]
pub fn level(board: &Board, index: usize) -> i32 {
    let Some(feeder) = board.tile_at(index).building.and_then(Building::feeder) else {
        return 0;
    };
    let count = board
        .neighbors(index)
        .filter(|&n| board.tile_at(n).building == Some(feeder))
        .count() as i32;
    count.min(MAX_LEVEL)
}

/// Bonus earned by a market at `index`; 0 if the tile holds no market.
#[inline]
pub fn market_bonus(board: &Board, index: usize) -> i32 {
    if board.tile_at(index).building != Some(Building::Market) {
        return 0;
    }
    let total: i32 = board.neighbors(index).map(|n| level(board, n)).sum();
    total.min(MARKET_CAP)
}

/// Scores a board.
pub fn evaluate(board: &Board) -> Score {
    let mut score = Score::default();
    for (i, tile) in board.tiles().iter().enumerate() {
        match tile.building {
            Some(Building::Market) => {
                let bonus = market_bonus(board, i);
                score.primary += bonus;
                score.secondary += MARKET_WEIGHT * bonus;
            }
            Some(b) if b.is_contributor() => {
                score.secondary += CONTRIBUTOR_WEIGHT * level(board, i);
            }
            _ => {}
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_board;

    #[test]
    fn empty_board_scores_zero() {
        let board = parse_board("g-a g-a\ng-a g-a").unwrap();
        assert_eq!(evaluate(&board), Score::default());
    }

    #[test]
    fn contributor_level_counts_feeders() {
        let board = parse_board(
            "tLa tLa tLa
             tLa gSa cFa
             tLa tLa mNa",
        )
        .unwrap();
        assert_eq!(level(&board, 4), 6);
        assert_eq!(level(&board, 0), 0);
    }

    #[test]
    fn level_caps_at_max() {
        let board = parse_board(
            "tLa tLa tLa
             tLa gSa tLa
             tLa tLa tLa",
        )
        .unwrap();
        assert_eq!(level(&board, 4), MAX_LEVEL);
    }

    #[test]
    fn market_sums_adjacent_levels() {
        // Sawmill level 2, forge level 1, both next to the market.
        let board = parse_board(
            "tLa gSa gMa
             tLa g-a gGa
             g-a g-a mNa",
        )
        .unwrap();
        assert_eq!(market_bonus(&board, 2), 3);
        let score = evaluate(&board);
        assert_eq!(score.primary, 3);
        assert_eq!(score.secondary, CONTRIBUTOR_WEIGHT * 3 + MARKET_WEIGHT * 3);
    }

    #[test]
    fn market_bonus_caps() {
        let board = parse_board(
            "tLa tLa tLa tLa tLa
             tLa gSa gMa gGa mNa
             tLa tLa tLa mNa mNa",
        )
        .unwrap();
        // Sawmill level 7, forge level 3: total 10, capped.
        assert_eq!(level(&board, 6), 7);
        assert_eq!(level(&board, 8), 3);
        assert_eq!(market_bonus(&board, 7), MARKET_CAP);
    }

    #[test]
    fn secondary_breaks_ties_only() {
        let better = Score {
            primary: 2,
            secondary: 0,
        };
        let tied = Score {
            primary: 1,
            secondary: 50,
        };
        assert!(better > tied);
        assert!(
            Score {
                primary: 1,
                secondary: 3
            } > Score {
                primary: 1,
                secondary: 2
            }
        );
        assert_eq!(
            better - tied,
            Score {
                primary: 1,
                secondary: -50
            }
        );
    }
}
