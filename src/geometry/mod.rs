//! Raster operations for device geometries.
//!
//! This module contains the transformations a planar device layout goes
//! through before and after a remote prediction call. Every operation takes
//! an `ndarray::Array2<f32>` raster with samples nominally in `[0, 1]`
//! (0 = cladding, 1 = core) and returns a new raster of the same kind.

pub mod filter;
pub mod morphology;
pub mod threshold;
pub mod transform;

pub use filter::{blur, gaussian_blur};
pub use morphology::{dilate, erode};
pub use threshold::{
    binarize, binarize_hard, binarize_monte_carlo, binarize_sem, normalize, ternarize,
};
pub use transform::{pad_multiple, rotate, trim};
