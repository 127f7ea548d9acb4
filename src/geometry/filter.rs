//! Gaussian filtering of device rasters.

use ndarray::Array2;

use crate::errors::{GeometryError, GeometryResult};

use super::threshold::normalize;

/// Apply a Gaussian blur and renormalize the result to `[0, 1]`.
///
/// Blurring is the cheap stand-in for the proximity effects of the
/// lithography process; a blurred-then-binarized design approximates the
/// rounding a prediction model reports at corners and narrow gaps.
pub fn blur(raster: &Array2<f32>, sigma: f32) -> GeometryResult<Array2<f32>> {
    if sigma <= 0.0 || !sigma.is_finite() {
        return Err(GeometryError::InvalidSigma { sigma });
    }
    if raster.is_empty() {
        return Err(GeometryError::EmptyRaster);
    }
    normalize(&gaussian_blur(raster, sigma))
}

/// Apply a Gaussian blur without renormalizing.
///
/// The kernel is separable and truncated at four standard deviations, with
/// samples past the raster edge taken from the nearest edge sample.
pub fn gaussian_blur(raster: &Array2<f32>, sigma: f32) -> Array2<f32> {
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() - 1) / 2;
    let (rows, cols) = raster.dim();

    // Horizontal pass, then vertical, over the intermediate buffer.
    let mut horizontal = Array2::<f32>::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let source = (c + k).saturating_sub(radius).min(cols - 1);
                acc += weight * raster[(r, source)];
            }
            horizontal[(r, c)] = acc;
        }
    }

    let mut out = Array2::<f32>::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let source = (r + k).saturating_sub(radius).min(rows - 1);
                acc += weight * horizontal[(source, c)];
            }
            out[(r, c)] = acc;
        }
    }
    out
}

/// Normalized 1D Gaussian kernel truncated at `ceil(4 * sigma)`.
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (4.0 * sigma).ceil().max(1.0) as usize;
    let mut kernel = Vec::with_capacity(2 * radius + 1);
    for offset in -(radius as isize)..=(radius as isize) {
        let x = offset as f32;
        kernel.push((-(x * x) / (2.0 * sigma * sigma)).exp());
    }
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}
