//! Tonnetz lattice: integer grid cells mapped to pitch-class indices.
//!
//! One column step encodes a perfect fifth, a northeast diagonal step a
//! major third, a southeast diagonal step a minor third. Odd columns sit
//! half a row off once laid out, which the odd-column formula accounts for.

use std::collections::HashMap;

use thiserror::Error;

/// Integer grid coordinate, (row, col).
pub type CellCoord = (i32, i32);

/// Errors from lattice construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LatticeError {
    #[error("invalid lattice size {rows}x{cols}: rows and cols must be positive")]
    InvalidLatticeSize { rows: i32, cols: i32 },
}

/// Immutable pitch lattice. Built once at startup; rebuilding with the
/// same dimensions always yields the same mapping.
#[derive(Debug, Clone)]
pub struct Lattice {
    rows: i32,
    cols: i32,
    cells: HashMap<CellCoord, usize>,
}

impl Lattice {
    /// Build the lattice, placing pitch class 0 ("C") at the grid center
    /// `(rows/2, cols/2)`.
    pub fn build(rows: i32, cols: i32) -> Result<Self, LatticeError> {
        if rows <= 0 || cols <= 0 {
            return Err(LatticeError::InvalidLatticeSize { rows, cols });
        }

        let origin_row = rows / 2;
        let origin_col = cols / 2;
        let mut cells = HashMap::with_capacity((rows * cols) as usize);
        cells.insert((origin_row, origin_col), 0);

        for row in 0..rows {
            for col in 0..cols {
                if row == origin_row && col == origin_col {
                    continue;
                }

                let row_offset = row - origin_row;
                let col_offset = col - origin_col;

                let pitch_index = if col % 2 == 0 {
                    (7 * col_offset + 4 * row_offset).rem_euclid(12) as usize
                } else {
                    // Odd columns render half a row off; the fractional
                    // intermediate must be truncated to an integer before
                    // the final modulo, in exactly this order.
                    let raw = (7.0 * col_offset as f64 + 4.0 * (row_offset as f64 - 0.5))
                        .rem_euclid(12.0);
                    (raw as i64).rem_euclid(12) as usize
                };

                cells.insert((row, col), pitch_index);
            }
        }

        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    /// Grid center; always pitch class 0.
    pub fn origin(&self) -> CellCoord {
        (self.rows / 2, self.cols / 2)
    }

    /// Pitch-class index of a cell, if the coordinate is on the grid.
    pub fn pitch_index(&self, coord: CellCoord) -> Option<usize> {
        self.cells.get(&coord).copied()
    }

    /// Number of cells; `rows * cols`.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all cells in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, usize)> + '_ {
        self.cells.iter().map(|(&coord, &pitch)| (coord, pitch))
    }
}
