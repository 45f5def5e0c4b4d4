//! Board state engine.
//!
//! The board is a fixed `rows x cols` grid stored flat, row-major, where every cell
//! holds either a tile value or nothing. Row 0 is the top of the board; gravity
//! pulls tiles toward the highest row index.
//!
//! Child modules provide the three operations that drive a match cycle:
//! - `matching`: flood-fill connectivity query from a selected tile
//! - `gravity`: per-column fall descriptors and their atomic application
//! - `refill`: the palette and the policy that fills empty cells
use rand::Rng;

use crate::error::BoardError;

mod gravity;
mod matching;
mod refill;

pub use gravity::{Compaction, Fall, compute_falls};
pub use matching::{MatchSet, find_matching_tiles};
pub use refill::{Palette, refill, refill_with};

// --- Tiles / Positions ------------------------------------------------------

/// Opaque match category of a tile (its "color"). Renderers decide what it looks like.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileValue(pub u8);

/// Grid coordinate, 0-indexed from the top-left cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// 4-connected neighbors that do not underflow. Upper bounds are the caller's job.
    pub(crate) fn neighbors(self) -> impl Iterator<Item = Position> {
        let Position { row, col } = self;
        [
            row.checked_sub(1).map(|r| Position::new(r, col)),
            Some(Position::new(row + 1, col)),
            col.checked_sub(1).map(|c| Position::new(row, c)),
            Some(Position::new(row, col + 1)),
        ]
        .into_iter()
        .flatten()
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

// --- Board ------------------------------------------------------------------

/// Largest number of cells a board may hold.
pub const MAX_CELLS: usize = 1 << 20;

/// Cell count for a `rows x cols` grid, rejecting empty and oversized shapes.
fn cell_count(rows: usize, cols: usize) -> Result<usize, BoardError> {
    match rows.checked_mul(cols) {
        Some(n) if n > 0 && n <= MAX_CELLS => Ok(n),
        _ => Err(BoardError::InvalidDimensions { rows, cols }),
    }
}

/// Fixed-size grid of optional tiles. Dimensions never change after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board<T = TileValue> {
    rows: usize,
    cols: usize,
    cells: Vec<Option<T>>, // length = rows * cols
}

impl<T: Copy> Board<T> {
    /// Build a board by asking `f` for the content of every cell, top row first.
    pub fn from_fn(
        rows: usize,
        cols: usize,
        mut f: impl FnMut(Position) -> Option<T>,
    ) -> Result<Self, BoardError> {
        let mut cells = Vec::with_capacity(cell_count(rows, cols)?);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(f(Position::new(row, col)));
            }
        }
        Ok(Self { rows, cols, cells })
    }

    /// Build a board from explicit rows. All rows must share the first row's length.
    pub fn from_rows(rows: Vec<Vec<Option<T>>>) -> Result<Self, BoardError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(cell_count(height, width)?);
        for (row, line) in rows.into_iter().enumerate() {
            if line.len() != width {
                return Err(BoardError::RaggedRow {
                    row,
                    len: line.len(),
                    expected: width,
                });
            }
            cells.extend(line);
        }
        Ok(Self {
            rows: height,
            cols: width,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    fn index(&self, pos: Position) -> Result<usize, BoardError> {
        if self.contains(pos) {
            Ok(pos.row * self.cols + pos.col)
        } else {
            Err(BoardError::OutOfBounds {
                row: pos.row,
                col: pos.col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Cell content at `pos`; `Ok(None)` means the cell is empty.
    pub fn get(&self, pos: Position) -> Result<Option<T>, BoardError> {
        self.index(pos).map(|idx| self.cells[idx])
    }

    pub fn set_value(&mut self, pos: Position, value: T) -> Result<(), BoardError> {
        let idx = self.index(pos)?;
        self.cells[idx] = Some(value);
        Ok(())
    }

    pub fn set_empty(&mut self, pos: Position) -> Result<(), BoardError> {
        let idx = self.index(pos)?;
        self.cells[idx] = None;
        Ok(())
    }

    /// Empty every listed cell and return how many were occupied before.
    ///
    /// All positions are checked first, so an out-of-bounds entry leaves the board
    /// untouched. Clearing does not compact.
    pub fn clear<I>(&mut self, positions: I) -> Result<usize, BoardError>
    where
        I: IntoIterator<Item = Position>,
    {
        let indices = positions
            .into_iter()
            .map(|pos| self.index(pos))
            .collect::<Result<Vec<_>, _>>()?;
        let mut cleared = 0;
        for idx in indices {
            if self.cells[idx].take().is_some() {
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    /// Snapshot of one column, top row first.
    pub fn column(&self, col: usize) -> Vec<Option<T>> {
        if col >= self.cols {
            return Vec::new();
        }
        (0..self.rows)
            .map(|row| self.cells[row * self.cols + col])
            .collect()
    }

    /// All positions, row-major.
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<T> {
        let cols = self.cols;
        (0..self.rows * cols).map(move |idx| Position::new(idx / cols, idx % cols))
    }

    /// Every cell with its position, row-major, for in-place updates.
    pub(crate) fn cells_mut(&mut self) -> impl Iterator<Item = (Position, &mut Option<T>)> {
        let cols = self.cols;
        self.cells
            .iter_mut()
            .enumerate()
            .map(move |(idx, cell)| (Position::new(idx / cols, idx % cols), cell))
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.len() - self.filled_count()
    }
}

impl Board<TileValue> {
    /// Fill every cell with an independent uniform draw from `palette`.
    /// No check is made for matches already present on the new board.
    pub fn random<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        palette: &Palette,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        Self::from_fn(rows, cols, |_| Some(palette.draw(rng)))
    }
}
