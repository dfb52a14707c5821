//! Media processing for the story composer
//!
//! This crate provides the image optimizer used before a captured or picked
//! photo is shown for review: downscaling, JPEG re-encoding and the
//! compression metadata displayed on the preview.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod optimizer;

pub use optimizer::{MediaError, OptimizedImage, OptimizerOptions, StoryOptimizer};
