// Refill policy: empty cells receive fresh, independent random tiles.
use rand::Rng;

use crate::error::BoardError;

use super::{Board, Position, TileValue};

/// The finite set of tile values `0..size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    size: u8,
}

impl Palette {
    pub fn new(size: u8) -> Result<Self, BoardError> {
        if size == 0 {
            return Err(BoardError::EmptyPalette);
        }
        Ok(Self { size })
    }

    /// Uniform draw in `0..size`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> TileValue {
        TileValue(rng.gen_range(0..self.size))
    }
}

/// Fill every empty cell with a palette draw. Returns the number of cells filled.
///
/// No attempt is made to avoid or resolve matches created by the new tiles.
pub fn refill<R: Rng + ?Sized>(board: &mut Board<TileValue>, palette: &Palette, rng: &mut R) -> usize {
    refill_with(board, |_| palette.draw(rng))
}

/// Fill every empty cell with whatever `f` produces for that position.
pub fn refill_with<T: Copy>(board: &mut Board<T>, mut f: impl FnMut(Position) -> T) -> usize {
    let mut filled = 0;
    for (pos, cell) in board.cells_mut() {
        if cell.is_none() {
            *cell = Some(f(pos));
            filled += 1;
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::{A, B, E};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_empty_palette_rejected() {
        assert_eq!(Palette::new(0).unwrap_err(), BoardError::EmptyPalette);
    }

    #[test]
    fn test_draws_stay_in_range_and_cover_palette() {
        let palette = Palette::new(5).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 5];
        for _ in 0..500 {
            let TileValue(v) = palette.draw(&mut rng);
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "palette not covered: {seen:?}");
    }

    #[test]
    fn test_refill_fills_only_empty_cells() {
        let mut board = Board::from_rows(vec![vec![E, A], vec![E, B], vec![A, E]]).unwrap();
        let palette = Palette::new(3).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let filled = refill(&mut board, &palette, &mut rng);
        assert_eq!(filled, 3);
        assert_eq!(board.empty_count(), 0);
        assert_eq!(board.get(Position::new(0, 1)), Ok(A));
        assert_eq!(board.get(Position::new(1, 1)), Ok(B));
        assert_eq!(board.get(Position::new(2, 0)), Ok(A));
    }

    #[test]
    fn test_refill_on_full_board_is_noop() {
        let mut board = Board::from_rows(vec![vec![A, B]]).unwrap();
        let before = board.clone();
        let palette = Palette::new(3).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(refill(&mut board, &palette, &mut rng), 0);
        assert_eq!(board, before);
    }

    #[test]
    fn test_refill_with_generic_tiles() {
        let mut board = Board::from_rows(vec![vec![None, Some('x')], vec![None, None]]).unwrap();
        let filled = refill_with(&mut board, |pos| if pos.row == 0 { 'a' } else { 'b' });
        assert_eq!(filled, 3);
        assert_eq!(board.column(0), vec![Some('a'), Some('b')]);
        assert_eq!(board.column(1), vec![Some('x'), Some('b')]);
    }
}
