//! Square game board of configurable size.

use crate::error::MoveRejection;
use crate::rules;
use crate::types::{Cell, Mark};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// N×N board stored in row-major order. `x` is the column, `y` the row,
/// and `(0, 0)` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty board of `size`×`size` cells.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
        }
    }

    /// Side length of the board.
    pub fn size(&self) -> usize {
        self.size
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns the cell at `(x, y)`, or `None` when off the board.
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        if x < self.size && y < self.size {
            self.cells.get(y * self.size + x).copied()
        } else {
            None
        }
    }

    /// Places `mark` at `(x, y)`.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` when the position is off the board, `Occupied` when the
    /// cell already holds a mark. The board is untouched on error.
    #[instrument(skip(self), fields(size = self.size))]
    pub fn place(&mut self, x: usize, y: usize, mark: Mark) -> Result<(), MoveRejection> {
        match self.get(x, y) {
            None => Err(MoveRejection::OutOfBounds(x as i64, y as i64)),
            Some(Cell::Occupied(_)) => Err(MoveRejection::Occupied(x, y)),
            Some(Cell::Empty) => {
                self.cells[y * self.size + x] = Cell::Occupied(mark);
                debug!("Mark placed");
                Ok(())
            }
        }
    }

    /// Mark that completes a row, column or diagonal, if any.
    pub fn winner(&self) -> Option<Mark> {
        rules::check_winner(self)
    }

    /// True when no empty cell remains.
    pub fn is_full(&self) -> bool {
        rules::is_full(self)
    }

    /// Wire rendering: one string per row, `*` for empty, `x`/`o` for marks.
    pub fn rows(&self) -> Vec<String> {
        if self.size == 0 {
            return Vec::new();
        }
        self.cells
            .chunks(self.size)
            .map(|row| row.iter().map(|c| c.symbol()).collect())
            .collect()
    }
}
