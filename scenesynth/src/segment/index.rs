//! Cross-frame deduplication index.
//!
//! Groups every cell occurrence of a stimulus under its content signature so
//! classification happens at most once per distinct signature. Insertion
//! order is scan order (frames, then rows, then columns), which makes the
//! representative choice and all downstream iteration reproducible.

use crate::segment::cell::Signature;
use crate::segment::partitioner::SegmentedFrame;
use indexmap::IndexMap;

/// One grid location sharing a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub frame: usize,
    pub row: usize,
    pub col: usize,
}

/// Signature -> ordered occurrence list over every frame of a stimulus.
#[derive(Debug, Default)]
pub struct OccurrenceIndex {
    map: IndexMap<Signature, Vec<Occurrence>>,
}

impl OccurrenceIndex {
    pub fn build(frames: &[SegmentedFrame]) -> Self {
        let mut map: IndexMap<Signature, Vec<Occurrence>> = IndexMap::new();
        for frame in frames {
            for (row, col, cell) in frame.iter() {
                map.entry(cell.signature).or_default().push(Occurrence {
                    frame: frame.index,
                    row,
                    col,
                });
            }
        }
        OccurrenceIndex { map }
    }

    pub fn distinct_count(&self) -> usize {
        self.map.len()
    }

    pub fn total_occurrences(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    /// First occurrence in scan order. Its cell sample is the signature's
    /// representative for classification.
    pub fn representative(&self, signature: Signature) -> Option<Occurrence> {
        self.map.get(&signature).and_then(|v| v.first().copied())
    }

    /// Distinct signatures in first-appearance order.
    pub fn signatures(&self) -> impl Iterator<Item = Signature> + '_ {
        self.map.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::partitioner::{segment_frame, GridSpec};
    use image::{Rgb, RgbImage};

    fn quad_frame(values: [u8; 4]) -> RgbImage {
        RgbImage::from_fn(64, 64, |x, y| {
            let v = match (x < 32, y < 32) {
                (true, true) => values[0],
                (false, true) => values[1],
                (true, false) => values[2],
                (false, false) => values[3],
            };
            Rgb([v, v, v])
        })
    }

    fn segmented(values: [u8; 4], index: usize) -> SegmentedFrame {
        let grid = GridSpec::new(2, 2).unwrap();
        segment_frame(&quad_frame(values), grid, index).unwrap()
    }

    #[test]
    fn test_build_groups_repeats() {
        // The value 10 appears three times across both frames.
        let frames = vec![segmented([10, 60, 110, 210], 0), segmented([10, 60, 110, 10], 1)];
        let index = OccurrenceIndex::build(&frames);

        assert_eq!(index.distinct_count(), 4);
        assert_eq!(index.total_occurrences(), 8);
    }

    #[test]
    fn test_representative_is_first_in_scan_order() {
        let frames = vec![segmented([10, 60, 110, 210], 0), segmented([10, 60, 110, 10], 1)];
        let index = OccurrenceIndex::build(&frames);

        let rep = index.representative(Signature(10)).unwrap();
        assert_eq!((rep.frame, rep.row, rep.col), (0, 0, 0));

        assert!(index.representative(Signature(99)).is_none());
    }

    #[test]
    fn test_signatures_in_first_appearance_order() {
        let frames = vec![segmented([210, 60, 110, 10], 0)];
        let index = OccurrenceIndex::build(&frames);
        let sigs: Vec<u16> = index.signatures().map(|s| s.0).collect();
        assert_eq!(sigs, vec![210, 60, 110, 10]);
    }
}
