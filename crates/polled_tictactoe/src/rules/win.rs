//! Win detection for square boards of any size.

use crate::{Board, Cell, Mark};
use tracing::instrument;

/// Every winning line on a board of `size`: all rows, all columns and both
/// diagonals, as `(x, y)` coordinates.
pub fn lines(size: usize) -> Vec<Vec<(usize, usize)>> {
    let mut lines = Vec::with_capacity(2 * size + 2);
    for y in 0..size {
        lines.push((0..size).map(|x| (x, y)).collect());
    }
    for x in 0..size {
        lines.push((0..size).map(|y| (x, y)).collect());
    }
    lines.push((0..size).map(|n| (n, n)).collect());
    lines.push((0..size).map(|n| (size - 1 - n, n)).collect());
    lines
}

/// Returns the mark that fills any complete line, or `None`.
///
/// Alternating turns make two different winning marks impossible, so the
/// first complete line found decides.
#[instrument(skip(board), fields(size = board.size()))]
pub fn check_winner(board: &Board) -> Option<Mark> {
    lines(board.size()).into_iter().find_map(|line| {
        let mut cells = line.into_iter().map(|(x, y)| board.get(x, y));
        match cells.next()? {
            Some(Cell::Occupied(mark)) => cells
                .all(|c| c == Some(Cell::Occupied(mark)))
                .then_some(mark),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(size: usize, marks: &[(usize, usize, Mark)]) -> Board {
        let mut board = Board::new(size);
        for &(x, y, mark) in marks {
            board.place(x, y, mark).unwrap();
        }
        board
    }

    #[test]
    fn test_no_winner_empty_board() {
        for size in 1..=5 {
            assert_eq!(check_winner(&Board::new(size)), None);
        }
    }

    #[test]
    fn test_winner_top_row() {
        let board = board_with(3, &[(0, 0, Mark::X), (1, 0, Mark::X), (2, 0, Mark::X)]);
        assert_eq!(check_winner(&board), Some(Mark::X));
    }

    #[test]
    fn test_winner_column() {
        let board = board_with(
            4,
            &[(2, 0, Mark::O), (2, 1, Mark::O), (2, 2, Mark::O), (2, 3, Mark::O)],
        );
        assert_eq!(check_winner(&board), Some(Mark::O));
    }

    #[test]
    fn test_winner_diagonal() {
        let board = board_with(3, &[(0, 0, Mark::O), (1, 1, Mark::O), (2, 2, Mark::O)]);
        assert_eq!(check_winner(&board), Some(Mark::O));
    }

    #[test]
    fn test_winner_anti_diagonal() {
        let board = board_with(
            5,
            &[
                (4, 0, Mark::X),
                (3, 1, Mark::X),
                (2, 2, Mark::X),
                (1, 3, Mark::X),
                (0, 4, Mark::X),
            ],
        );
        assert_eq!(check_winner(&board), Some(Mark::X));
    }

    #[test]
    fn test_no_winner_incomplete() {
        let board = board_with(3, &[(0, 0, Mark::X), (1, 0, Mark::X)]);
        assert_eq!(check_winner(&board), None);
    }

    #[test]
    fn test_mixed_line_is_not_a_win() {
        let board = board_with(3, &[(0, 0, Mark::X), (1, 0, Mark::O), (2, 0, Mark::X)]);
        assert_eq!(check_winner(&board), None);
    }

    #[test]
    fn test_single_cell_board_wins_immediately() {
        let board = board_with(1, &[(0, 0, Mark::O)]);
        assert_eq!(check_winner(&board), Some(Mark::O));
    }

    #[test]
    fn test_line_count() {
        assert_eq!(lines(3).len(), 8);
        assert_eq!(lines(5).len(), 12);
    }
}
