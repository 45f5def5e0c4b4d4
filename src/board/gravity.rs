// Gravity / compaction. Tiles settle toward the highest row index of their column.
use crate::error::BoardError;

use super::{Board, Position};

/// One tile moving down its column during compaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fall {
    pub from_row: usize,
    pub to_row: usize,
    pub col: usize,
}

impl Fall {
    pub fn source(&self) -> Position {
        Position::new(self.from_row, self.col)
    }

    pub fn target(&self) -> Position {
        Position::new(self.to_row, self.col)
    }
}

/// Ordered fall descriptors produced by one gravity pass over a board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compaction {
    falls: Vec<Fall>,
}

impl Compaction {
    pub fn falls(&self) -> &[Fall] {
        &self.falls
    }

    pub fn is_empty(&self) -> bool {
        self.falls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.falls.len()
    }

    /// Move every recorded tile on `board`.
    ///
    /// Falls are replayed in recorded order on a copy which replaces `board` only if
    /// every step succeeds.
    pub fn apply<T: Copy>(&self, board: &mut Board<T>) -> Result<(), BoardError> {
        let mut next = board.clone();
        for fall in &self.falls {
            let value = next.get(fall.source())?.ok_or(BoardError::MissingTile {
                row: fall.from_row,
                col: fall.col,
            })?;
            next.set_value(fall.target(), value)?;
            next.set_empty(fall.source())?;
        }
        *board = next;
        Ok(())
    }
}

/// Work out how tiles fall into the gaps of `board` without touching it.
///
/// Each column is scanned bottom-up. Every empty row pulls down the nearest
/// occupied cell above it, and the scan resumes one row higher. A column with no
/// tile above its lowest gap is finished.
pub fn compute_falls<T: Copy>(board: &Board<T>) -> Compaction {
    let mut falls = Vec::new();
    for col in 0..board.cols() {
        let mut column = board.column(col);
        let mut target = column.len();
        while target > 0 {
            target -= 1;
            if column[target].is_some() {
                continue;
            }
            let Some(source) = (0..target).rev().find(|&row| column[row].is_some()) else {
                break;
            };
            column[target] = column[source].take();
            falls.push(Fall {
                from_row: source,
                to_row: target,
                col,
            });
        }
    }
    Compaction { falls }
}
