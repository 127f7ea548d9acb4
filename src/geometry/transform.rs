//! Cropping, padding, and rotation of device rasters.

use ndarray::Array2;

use crate::errors::{GeometryError, GeometryResult};

/// Crop the raster to the bounding box of its non-zero samples, keeping up
/// to `margin` rows and columns around it (clamped at the raster edge).
pub fn trim(raster: &Array2<f32>, margin: usize) -> GeometryResult<Array2<f32>> {
    let (rows, cols) = raster.dim();
    let mut row_min = rows;
    let mut row_max = 0usize;
    let mut col_min = cols;
    let mut col_max = 0usize;
    for ((r, c), &sample) in raster.indexed_iter() {
        if sample != 0.0 {
            row_min = row_min.min(r);
            row_max = row_max.max(r);
            col_min = col_min.min(c);
            col_max = col_max.max(c);
        }
    }
    if row_min > row_max {
        return Err(GeometryError::AllZeroRaster);
    }

    let r0 = row_min.saturating_sub(margin);
    let r1 = (row_max + margin + 1).min(rows);
    let c0 = col_min.saturating_sub(margin);
    let c1 = (col_max + margin + 1).min(cols);
    Ok(raster.slice(ndarray::s![r0..r1, c0..c1]).to_owned())
}

/// Rotate the raster about its center by `angle` degrees, positive values
/// rotating counter-clockwise.
///
/// The output keeps the input dimensions; samples swept outside the frame
/// are dropped and uncovered samples are 0. Sampling is bilinear, so a
/// binary raster needs re-binarization after a non-quarter-turn rotation.
pub fn rotate(raster: &Array2<f32>, angle: f32) -> GeometryResult<Array2<f32>> {
    if raster.is_empty() {
        return Err(GeometryError::EmptyRaster);
    }
    let (rows, cols) = raster.dim();
    let center_x = cols as f32 / 2.0;
    let center_y = rows as f32 / 2.0;
    let radians = angle.to_radians();
    let (sin, cos) = radians.sin_cos();

    let mut out = Array2::<f32>::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            // Inverse-map the output sample into the source frame. With y
            // pointing down, sampling the source rotated by +angle renders
            // the output rotated counter-clockwise on screen.
            let dx = c as f32 - center_x;
            let dy = r as f32 - center_y;
            let source_x = cos * dx - sin * dy + center_x;
            let source_y = sin * dx + cos * dy + center_y;
            out[(r, c)] = sample_bilinear(raster, source_x, source_y);
        }
    }
    Ok(out)
}

/// Zero-pad the raster so each dimension becomes a multiple of
/// `slice_length`, plus `slice_length * (pad_factor - 1)` extra samples per
/// axis, split symmetrically (the larger half leading).
///
/// Prediction models consume fixed-size tiles; this grows a raster to the
/// tile grid before slicing.
pub fn pad_multiple(
    raster: &Array2<f32>,
    slice_length: usize,
    pad_factor: usize,
) -> GeometryResult<Array2<f32>> {
    if slice_length == 0 {
        return Err(GeometryError::InvalidSliceLength { slice_length });
    }
    if pad_factor == 0 {
        return Err(GeometryError::InvalidPadFactor { pad_factor });
    }
    if raster.is_empty() {
        return Err(GeometryError::EmptyRaster);
    }

    let (rows, cols) = raster.dim();
    let (top, bottom) = split_padding(rows, slice_length, pad_factor);
    let (left, right) = split_padding(cols, slice_length, pad_factor);

    let mut out = Array2::<f32>::zeros((rows + top + bottom, cols + left + right));
    out.slice_mut(ndarray::s![top..top + rows, left..left + cols])
        .assign(raster);
    Ok(out)
}

/// Total padding for one axis, split into (leading, trailing).
fn split_padding(extent: usize, slice_length: usize, pad_factor: usize) -> (usize, usize) {
    let to_multiple = (slice_length - extent % slice_length) % slice_length;
    let extra = slice_length * (pad_factor - 1);
    let total = to_multiple + extra;
    (total - total / 2, total / 2)
}

fn sample_bilinear(raster: &Array2<f32>, x: f32, y: f32) -> f32 {
    let (rows, cols) = raster.dim();
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let mut acc = 0.0f32;
    for (dy, row_weight) in [(0, 1.0 - fy), (1, fy)] {
        for (dx, col_weight) in [(0, 1.0 - fx), (1, fx)] {
            let sx = x0 as isize + dx;
            let sy = y0 as isize + dy;
            if sx >= 0 && sy >= 0 && (sx as usize) < cols && (sy as usize) < rows {
                acc += row_weight * col_weight * raster[(sy as usize, sx as usize)];
            }
        }
    }
    acc
}
