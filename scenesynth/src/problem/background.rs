//! Background occupancy facts.
//!
//! Every cell of a frame contributes to the bit matrix of its background
//! type, content cells included. Matrices are declared in the order their
//! type was first observed in the frame scan, then populated row-major
//! with 1-based coordinates.

use crate::classify::ClassificationMap;
use crate::error::SynthError;
use crate::segment::SegmentedFrame;
use indexmap::IndexMap;

/// Boolean occupancy grid for one background type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    rows: usize,
    cols: usize,
    bits: Vec<bool>,
}

impl BitMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        BitMatrix {
            rows,
            cols,
            bits: vec![false; rows * cols],
        }
    }

    pub fn set(&mut self, row: usize, col: usize) {
        self.bits[row * self.cols + col] = true;
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.bits[row * self.cols + col]
    }

    /// Set coordinates in row-major order.
    pub fn set_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let cols = self.cols;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .map(move |(i, _)| (i / cols, i % cols))
    }
}

/// Init facts describing the background of one frame: a `new-bit-matrix`
/// declaration per observed type, the grid dimensions, then one `set-index`
/// assignment per cell.
pub fn background_facts(
    frame: &SegmentedFrame,
    classes: &ClassificationMap,
) -> Result<Vec<String>, SynthError> {
    let grid = frame.grid();
    let mut matrices: IndexMap<String, BitMatrix> = IndexMap::new();
    for (row, col, cell) in frame.iter() {
        let record = classes.get(cell.signature).ok_or_else(|| {
            SynthError::Invalid(format!(
                "signature {} at frame {} cell ({},{}) was never classified",
                cell.signature,
                frame.index,
                row + 1,
                col + 1
            ))
        })?;
        matrices
            .entry(record.cell_type.clone())
            .or_insert_with(|| BitMatrix::new(grid.rows, grid.cols))
            .set(row, col);
    }

    let mut facts = Vec::new();
    for cell_type in matrices.keys() {
        facts.push(format!(
            "(= ({}) (new-bit-matrix false {} {}))",
            cell_type, grid.rows, grid.cols
        ));
    }
    facts.push(format!("(= (gridheight) {})", grid.rows));
    facts.push(format!("(= (gridwidth) {})", grid.cols));
    for (cell_type, matrix) in &matrices {
        for (row, col) in matrix.set_cells() {
            facts.push(format!(
                "(= ({}) (set-index {} true {} {}))",
                cell_type,
                cell_type,
                row + 1,
                col + 1
            ));
        }
    }
    Ok(facts)
}
