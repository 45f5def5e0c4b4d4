// Flood-fill match detection.
use std::collections::HashSet;

use super::{Board, Position};

/// Cells that share the selected tile's value and are 4-connected to it.
/// Iteration order carries no meaning.
pub type MatchSet = HashSet<Position>;

/// Collect the maximal 4-connected group of cells holding the same value as `origin`.
///
/// Returns an empty set when `origin` is off the board or points at an empty cell.
/// Uses an explicit stack so large boards cannot exhaust the call stack.
pub fn find_matching_tiles<T: Copy + PartialEq>(origin: Position, board: &Board<T>) -> MatchSet {
    let mut found = MatchSet::new();
    let target = match board.get(origin) {
        Ok(Some(value)) => value,
        _ => return found,
    };

    let mut visited = vec![false; board.rows() * board.cols()];
    let mut stack = vec![origin];
    visited[origin.row * board.cols() + origin.col] = true;

    while let Some(pos) = stack.pop() {
        found.insert(pos);
        for next in pos.neighbors() {
            if !board.contains(next) {
                continue;
            }
            let idx = next.row * board.cols() + next.col;
            if visited[idx] {
                continue;
            }
            if board.get(next) == Ok(Some(target)) {
                visited[idx] = true;
                stack.push(next);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::{A, B, C, E};

    fn set(cells: &[(usize, usize)]) -> MatchSet {
        cells.iter().map(|&rc| Position::from(rc)).collect()
    }

    #[test]
    fn test_single_column_match() {
        let board = Board::from_rows(vec![vec![A], vec![A], vec![A]]).unwrap();
        let found = find_matching_tiles(Position::new(0, 0), &board);
        assert_eq!(found, set(&[(0, 0), (1, 0), (2, 0)]));
    }

    #[test]
    fn test_diagonal_cells_are_not_connected() {
        let board = Board::from_rows(vec![vec![A, B], vec![B, A]]).unwrap();
        let found = find_matching_tiles(Position::new(0, 0), &board);
        assert_eq!(found, set(&[(0, 0)]));
    }

    #[test]
    fn test_follows_winding_path_and_stops_at_other_values() {
        let board = Board::from_rows(vec![
            vec![A, A, B, C],
            vec![B, A, B, A],
            vec![A, A, A, A],
            vec![C, B, C, A],
        ])
        .unwrap();
        let found = find_matching_tiles(Position::new(0, 0), &board);
        assert_eq!(
            found,
            set(&[
                (0, 0),
                (0, 1),
                (1, 1),
                (2, 0),
                (2, 1),
                (2, 2),
                (2, 3),
                (1, 3),
                (3, 3),
            ])
        );
    }

    #[test]
    fn test_empty_cells_break_connectivity() {
        let board = Board::from_rows(vec![vec![A, E, A]]).unwrap();
        assert_eq!(find_matching_tiles(Position::new(0, 0), &board), set(&[(0, 0)]));
        assert!(find_matching_tiles(Position::new(0, 1), &board).is_empty());
    }

    #[test]
    fn test_out_of_bounds_origin_yields_empty_set() {
        let board = Board::from_rows(vec![vec![A, A], vec![A, A]]).unwrap();
        assert!(find_matching_tiles(Position::new(2, 0), &board).is_empty());
        assert!(find_matching_tiles(Position::new(0, 9), &board).is_empty());
        assert!(find_matching_tiles(Position::new(usize::MAX, usize::MAX), &board).is_empty());
    }

    #[test]
    fn test_large_uniform_board_does_not_overflow() {
        let board = Board::from_fn(300, 300, |_| A).unwrap();
        let found = find_matching_tiles(Position::new(150, 150), &board);
        assert_eq!(found.len(), 300 * 300);
    }
}
