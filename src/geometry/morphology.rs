//! Grayscale morphology over square structuring elements.

use ndarray::Array2;

use crate::errors::{GeometryError, GeometryResult};

/// Erode the raster: each sample becomes the minimum over a
/// `kernel_size` x `kernel_size` window.
///
/// Erosion strips single-sample protrusions and opens narrow bridges, the
/// same features a fabrication run tends to under-etch.
pub fn erode(raster: &Array2<f32>, kernel_size: usize) -> GeometryResult<Array2<f32>> {
    rank_filter(raster, kernel_size, f32::min, f32::INFINITY)
}

/// Dilate the raster: each sample becomes the maximum over a
/// `kernel_size` x `kernel_size` window.
pub fn dilate(raster: &Array2<f32>, kernel_size: usize) -> GeometryResult<Array2<f32>> {
    rank_filter(raster, kernel_size, f32::max, f32::NEG_INFINITY)
}

/// Shared min/max filter. The window is anchored at `kernel_size / 2` and
/// clipped at the raster edge, so border samples see a smaller window
/// rather than a synthetic padding value.
fn rank_filter(
    raster: &Array2<f32>,
    kernel_size: usize,
    select: fn(f32, f32) -> f32,
    identity: f32,
) -> GeometryResult<Array2<f32>> {
    if kernel_size == 0 {
        return Err(GeometryError::InvalidKernelSize { size: kernel_size });
    }
    if raster.is_empty() {
        return Err(GeometryError::EmptyRaster);
    }

    let (rows, cols) = raster.dim();
    let anchor = kernel_size / 2;
    let mut out = Array2::<f32>::zeros((rows, cols));
    for r in 0..rows {
        let r0 = r.saturating_sub(anchor);
        let r1 = (r + kernel_size - anchor).min(rows);
        for c in 0..cols {
            let c0 = c.saturating_sub(anchor);
            let c1 = (c + kernel_size - anchor).min(cols);
            let mut acc = identity;
            for rr in r0..r1 {
                for cc in c0..c1 {
                    acc = select(acc, raster[(rr, cc)]);
                }
            }
            out[(r, c)] = acc;
        }
    }
    Ok(out)
}
