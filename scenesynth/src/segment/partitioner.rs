//! Stimulus loading and grid partitioning.
//!
//! Responsibilities:
//! - Decode every frame of a GIF stimulus to RGB.
//! - Split each frame into an R x C grid of cell samples, row-major.
//!
//! Partitioning is a pure function of the frame; all measurement lives in
//! `cell::sample_region`.

use crate::error::SynthError;
use crate::segment::cell::{sample_region, CellSample};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, RgbImage};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Grid geometry of a problem instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
}

impl GridSpec {
    pub fn new(rows: usize, cols: usize) -> Result<Self, SynthError> {
        if rows == 0 || cols == 0 {
            return Err(SynthError::Invalid(format!(
                "grid dimensions must be positive, got {}x{}",
                rows, cols
            )));
        }
        Ok(GridSpec { rows, cols })
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

/// One stimulus frame partitioned into cell samples, row-major.
#[derive(Debug, Clone)]
pub struct SegmentedFrame {
    pub index: usize,
    grid: GridSpec,
    cells: Vec<CellSample>,
}

impl SegmentedFrame {
    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellSample {
        &self.cells[row * self.grid.cols + col]
    }

    /// Cells in scan order with their (row, col) coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &CellSample)> {
        let cols = self.grid.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i / cols, i % cols, cell))
    }
}

/// Splits one decoded frame into grid cells.
///
/// Cell size is the frame size integer-divided by the grid size; remainder
/// pixels at the right and bottom edges are dropped.
pub fn segment_frame(
    frame: &RgbImage,
    grid: GridSpec,
    index: usize,
) -> Result<SegmentedFrame, SynthError> {
    let cell_width = frame.width() / grid.cols as u32;
    let cell_height = frame.height() / grid.rows as u32;
    if cell_width == 0 || cell_height == 0 {
        return Err(SynthError::Invalid(format!(
            "frame {}x{} is too small for a {}x{} grid",
            frame.width(),
            frame.height(),
            grid.rows,
            grid.cols
        )));
    }

    let mut cells = Vec::with_capacity(grid.cell_count());
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let x = col as u32 * cell_width;
            let y = row as u32 * cell_height;
            cells.push(sample_region(frame, x, y, cell_width, cell_height)?);
        }
    }

    Ok(SegmentedFrame { index, grid, cells })
}

/// Decodes every frame of a GIF stimulus and partitions each one.
pub fn load_stimulus(path: &Path, grid: GridSpec) -> Result<Vec<SegmentedFrame>, SynthError> {
    let file = File::open(path).map_err(|e| {
        SynthError::MissingArtifact(format!("stimulus {}: {}", path.display(), e))
    })?;
    let decoder = GifDecoder::new(BufReader::new(file))?;
    let frames = decoder.into_frames().collect_frames()?;
    if frames.is_empty() {
        return Err(SynthError::Invalid(format!(
            "stimulus {} has no frames",
            path.display()
        )));
    }

    let mut segmented = Vec::with_capacity(frames.len());
    for (index, frame) in frames.into_iter().enumerate() {
        let rgb: RgbImage = DynamicImage::ImageRgba8(frame.into_buffer()).to_rgb8();
        segmented.push(segment_frame(&rgb, grid, index)?);
    }
    debug!(
        "Segmented {} frames into {}x{} cells each",
        segmented.len(),
        grid.rows,
        grid.cols
    );
    Ok(segmented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    // Four 32x32 quadrants with distinct intensities.
    fn quad_frame() -> RgbImage {
        RgbImage::from_fn(64, 64, |x, y| match (x < 32, y < 32) {
            (true, true) => Rgb([10, 10, 10]),
            (false, true) => Rgb([60, 60, 60]),
            (true, false) => Rgb([110, 110, 110]),
            (false, false) => Rgb([210, 210, 210]),
        })
    }

    #[test]
    fn test_grid_spec_rejects_zero() {
        assert!(GridSpec::new(0, 2).is_err());
        assert!(GridSpec::new(2, 0).is_err());
        assert!(GridSpec::new(2, 2).is_ok());
    }

    #[test]
    fn test_segment_frame_row_major() {
        let grid = GridSpec::new(2, 2).unwrap();
        let segmented = segment_frame(&quad_frame(), grid, 0).unwrap();

        assert_eq!(segmented.cell(0, 0).signature.0, 10);
        assert_eq!(segmented.cell(0, 1).signature.0, 60);
        assert_eq!(segmented.cell(1, 0).signature.0, 110);
        assert_eq!(segmented.cell(1, 1).signature.0, 210);

        let coords: Vec<(usize, usize)> = segmented.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(coords, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_segment_frame_drops_remainder() {
        // 65 pixels over 2 columns leaves a 1px strip that no cell covers.
        let frame = RgbImage::from_pixel(65, 64, Rgb([50, 50, 50]));
        let grid = GridSpec::new(2, 2).unwrap();
        let segmented = segment_frame(&frame, grid, 0).unwrap();
        assert_eq!(segmented.iter().count(), 4);
        assert_eq!(segmented.cell(1, 1).signature.0, 50);
    }

    #[test]
    fn test_segment_frame_too_small() {
        let frame = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let grid = GridSpec::new(4, 4).unwrap();
        assert!(segment_frame(&frame, grid, 0).is_err());
    }
}
