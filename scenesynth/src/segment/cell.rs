//! Per-cell sampling: canonical sample, content signature, variability.
//!
//! Every cell of every frame is reduced to a fixed-size canonical sample so
//! that signature and variability are computed identically regardless of the
//! source frame's resolution or grid geometry.

use crate::error::SynthError;
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::fmt;
use std::io::Cursor;

/// Side length cells are resized to before the interior crop.
pub const SAMPLE_SIZE: u32 = 100;
/// Pixels trimmed from each edge of the resized cell, suppressing bleed
/// from neighboring cells.
pub const SAMPLE_MARGIN: u32 = 3;
/// Cells whose variability does not exceed this are treated as visually
/// uniform and skip foreground classification.
pub const UNIFORMITY_THRESHOLD: f64 = 0.1;

/// Content signature of a cell: the ceiling of the mean intensity over every
/// pixel and channel of the canonical sample.
///
/// Cells with equal signatures are treated as identical content and share a
/// single classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(pub u16);

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One grid tile of one frame, reduced to what classification and assembly
/// need. The full-resolution pixels are not kept.
#[derive(Debug, Clone)]
pub struct CellSample {
    /// JPEG-encoded canonical sample, the payload sent to the classifier.
    pub jpeg: Vec<u8>,
    pub signature: Signature,
    /// Mean per-channel standard deviation over the canonical sample,
    /// rounded to two decimals.
    pub variability: f64,
}

impl CellSample {
    /// True when the cell shows no content worth a foreground call.
    pub fn is_uniform(&self) -> bool {
        self.variability <= UNIFORMITY_THRESHOLD
    }
}

/// Reduces one rectangular region of a frame to its canonical sample and
/// measurements.
pub(crate) fn sample_region(
    frame: &RgbImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<CellSample, SynthError> {
    let cell = imageops::crop_imm(frame, x, y, width, height).to_image();
    let resized = imageops::resize(&cell, SAMPLE_SIZE, SAMPLE_SIZE, FilterType::CatmullRom);
    let inner = SAMPLE_SIZE - 2 * SAMPLE_MARGIN;
    let sample = imageops::crop_imm(&resized, SAMPLE_MARGIN, SAMPLE_MARGIN, inner, inner).to_image();

    let (signature, variability) = measure(&sample);

    let mut jpeg = Vec::new();
    sample.write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)?;

    Ok(CellSample {
        jpeg,
        signature,
        variability,
    })
}

fn measure(sample: &RgbImage) -> (Signature, f64) {
    let pixels = (sample.width() * sample.height()) as f64;
    let mut sum = [0f64; 3];
    let mut sum_sq = [0f64; 3];
    for px in sample.pixels() {
        for c in 0..3 {
            let v = px.0[c] as f64;
            sum[c] += v;
            sum_sq[c] += v * v;
        }
    }

    let mean = (sum[0] + sum[1] + sum[2]) / (pixels * 3.0);
    let signature = Signature(mean.ceil() as u16);

    // Population standard deviation per channel, averaged across channels.
    let mut std_total = 0f64;
    for c in 0..3 {
        let channel_mean = sum[c] / pixels;
        let var = (sum_sq[c] / pixels - channel_mean * channel_mean).max(0.0);
        std_total += var.sqrt();
    }
    let variability = ((std_total / 3.0) * 100.0).round() / 100.0;

    (signature, variability)
}
