//! Applying and undoing action effects.
//!
//! `Board::apply` validates before it writes, so a failed apply leaves the
//! board untouched. A successful apply returns the `Undo` record that
//! restores the tile exactly.

use crate::board::{Board, Building, Terrain};

use super::catalog::{ActionId, Effect};

/// Errors raised when an action cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("tile ({x}, {y}) is outside the board")]
    OutOfBounds { x: u16, y: u16 },

    #[error("{action} is not feasible at ({x}, {y})")]
    Infeasible { action: ActionId, x: u16, y: u16 },
}

/// The prior state of a tile touched by one effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "an undo record must be applied to restore the board"]
pub struct Undo {
    pub index: usize,
    terrain: Terrain,
    building: Option<Building>,
}

impl Board {
    /// Applies `action` to the tile at `index` in place.
    pub fn apply(&mut self, action: ActionId, index: usize) -> Result<Undo, ActionError> {
        if index >= self.len() {
            return Err(ActionError::OutOfBounds {
                x: (index % self.width().max(1) as usize) as u16,
                y: (index / self.width().max(1) as usize) as u16,
            });
        }
        if !action.is_feasible(self, index) {
            let tile = self.tile_at(index);
            return Err(ActionError::Infeasible {
                action,
                x: tile.x,
                y: tile.y,
            });
        }

        let tile = self.tile_at_mut(index);
        let undo = Undo {
            index,
            terrain: tile.terrain,
            building: tile.building,
        };
        match action.effect() {
            Effect::Place(building) => tile.building = Some(building),
            Effect::SetTerrain(terrain) => tile.terrain = terrain,
            Effect::Remove => tile.building = None,
        }
        Ok(undo)
    }

    /// Restores the tile recorded in `undo`.
    pub fn undo(&mut self, undo: Undo) {
        let tile = self.tile_at_mut(undo.index);
        tile.terrain = undo.terrain;
        tile.building = undo.building;
    }
}

/// Applies `action` at `(x, y)` and returns the edited copy of `board`.
pub fn apply_action(board: &Board, action: ActionId, x: u16, y: u16) -> Result<Board, ActionError> {
    let index = board.index_of(x, y).ok_or(ActionError::OutOfBounds { x, y })?;
    let mut next = board.clone();
    let _ = next.apply(action, index)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_board;

    #[test]
    fn apply_then_undo_restores_tile() {
        let original = parse_board("t-a g-a").unwrap();
        let mut board = original.clone();

        let undo = board.apply(ActionId::BurnForest, 0).unwrap();
        assert_eq!(board.tile_at(0).terrain, Terrain::Crop);
        board.undo(undo);
        assert_eq!(board, original);

        let undo = board.apply(ActionId::BuildMarket, 1).unwrap();
        assert_eq!(board.tile_at(1).building, Some(Building::Market));
        board.undo(undo);
        assert_eq!(board, original);
    }

    #[test]
    fn failed_apply_leaves_board_untouched() {
        let original = parse_board("gCa g-.").unwrap();
        let mut board = original.clone();
        assert_eq!(
            board.apply(ActionId::BuildMarket, 1),
            Err(ActionError::Infeasible {
                action: ActionId::BuildMarket,
                x: 1,
                y: 0
            })
        );
        assert!(matches!(
            board.apply(ActionId::BuildMarket, 7),
            Err(ActionError::OutOfBounds { .. })
        ));
        assert_eq!(board, original);
    }

    #[test]
    fn apply_action_is_pure() {
        let board = parse_board("t-a tLa").unwrap();
        let cleared = apply_action(&board, ActionId::ClearForest, 0, 0).unwrap();
        assert_eq!(cleared.tile_at(0).terrain, Terrain::Field);
        assert_eq!(board.tile_at(0).terrain, Terrain::Forest);

        let razed = apply_action(&board, ActionId::Destroy, 1, 0).unwrap();
        assert_eq!(razed.tile_at(1).building, None);
        assert!(apply_action(&board, ActionId::Destroy, 9, 9).is_err());
    }

    #[test]
    fn error_messages_name_the_action() {
        let err = ActionError::Infeasible {
            action: ActionId::BuildForge,
            x: 2,
            y: 3,
        };
        assert_eq!(err.to_string(), "build_forge is not feasible at (2, 3)");
    }
}
