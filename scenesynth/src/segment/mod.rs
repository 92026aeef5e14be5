//! Stimulus segmentation: grid partitioning and content deduplication.
//!
//! This module turns a multi-frame GIF stimulus into measured cell samples
//! and groups visually identical cells under shared signatures, so the
//! classifier boundary is crossed at most once per distinct content.

pub mod cell;
pub mod index;
pub mod partitioner;

pub use cell::*;
pub use index::*;
pub use partitioner::*;
