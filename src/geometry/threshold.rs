//! Normalization and quantization of device rasters.

use ndarray::Array2;
use rand::Rng;

use crate::errors::{GeometryError, GeometryResult};

use super::filter::gaussian_blur;

/// Normalize the raster so its samples span `[0, 1]`.
///
/// A constant raster has no dynamic range to rescale and is rejected.
pub fn normalize(raster: &Array2<f32>) -> GeometryResult<Array2<f32>> {
    if raster.is_empty() {
        return Err(GeometryError::EmptyRaster);
    }
    let min = raster.iter().copied().fold(f32::INFINITY, f32::min);
    let max = raster.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max <= min {
        return Err(GeometryError::NoDynamicRange { value: min });
    }
    Ok(raster.mapv(|x| (x - min) / (max - min)))
}

/// Binarize the raster with a smoothed threshold projection.
///
/// The projection is
/// `(tanh(beta*eta) + tanh(beta*(x - eta))) / (tanh(beta*eta) + tanh(beta*(1 - eta)))`,
/// the standard relaxation used in topology optimization. A higher `beta`
/// sharpens the transition; `beta = f32::INFINITY` degenerates to the hard
/// threshold at `eta`.
pub fn binarize(raster: &Array2<f32>, eta: f32, beta: f32) -> Array2<f32> {
    if beta.is_infinite() {
        return binarize_hard(raster, eta);
    }
    let denom = (beta * eta).tanh() + (beta * (1.0 - eta)).tanh();
    raster.mapv(|x| ((beta * eta).tanh() + (beta * (x - eta)).tanh()) / denom)
}

/// Binarize the raster with a hard threshold at `eta`.
pub fn binarize_hard(raster: &Array2<f32>, eta: f32) -> Array2<f32> {
    raster.mapv(|x| if x < eta { 0.0 } else { 1.0 })
}

/// Binarize the raster against a spatially varying random threshold.
///
/// The threshold map is a base value drawn from a clamped normal
/// distribution around 0.5, perturbed by Gaussian-blurred per-sample noise.
/// Repeated calls simulate run-to-run variation of the fabrication process,
/// so regions where the prediction sits near 0.5 flip between calls.
pub fn binarize_monte_carlo(
    raster: &Array2<f32>,
    threshold_noise_std: f32,
    threshold_blur_std: f32,
) -> GeometryResult<Array2<f32>> {
    if raster.is_empty() {
        return Err(GeometryError::EmptyRaster);
    }
    let mut rng = rand::thread_rng();
    let base_threshold = sample_normal(&mut rng, 0.5, 0.25).clamp(0.4, 0.6);
    let noise =
        Array2::from_shape_fn(raster.raw_dim(), |_| {
            sample_normal(&mut rng, 0.0, threshold_noise_std)
        });
    let spatial_threshold = if threshold_blur_std > 0.0 {
        gaussian_blur(&noise, threshold_blur_std)
    } else {
        noise
    };
    let mut out = raster.clone();
    for (sample, threshold) in out.iter_mut().zip(spatial_threshold.iter()) {
        *sample = if *sample < base_threshold + threshold {
            0.0
        } else {
            1.0
        };
    }
    Ok(out)
}

/// Binarize a grayscale SEM image with Otsu's method.
///
/// Samples in `[0, 1]` are quantized to 256 bins and the threshold
/// maximizing the between-class variance is selected, which separates the
/// bimodal core/cladding intensity distribution of a typical SEM capture
/// without a hand-picked threshold.
pub fn binarize_sem(sem_raster: &Array2<f32>) -> GeometryResult<Array2<f32>> {
    if sem_raster.is_empty() {
        return Err(GeometryError::EmptyRaster);
    }

    let mut histogram = [0u64; 256];
    for &sample in sem_raster.iter() {
        histogram[quantize(sample)] += 1;
    }

    let total = sem_raster.len() as f64;
    let total_weighted: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut best_threshold = 0usize;
    let mut best_variance = -1.0f64;
    let mut background_count = 0.0f64;
    let mut background_weighted = 0.0f64;
    for (level, &count) in histogram.iter().enumerate() {
        background_count += count as f64;
        if background_count == 0.0 {
            continue;
        }
        let foreground_count = total - background_count;
        if foreground_count == 0.0 {
            break;
        }
        background_weighted += level as f64 * count as f64;
        let mean_background = background_weighted / background_count;
        let mean_foreground = (total_weighted - background_weighted) / foreground_count;
        let variance = background_count * foreground_count
            * (mean_background - mean_foreground)
            * (mean_background - mean_foreground);
        if variance > best_variance {
            best_variance = variance;
            best_threshold = level;
        }
    }

    Ok(sem_raster.mapv(|x| if quantize(x) > best_threshold { 1.0 } else { 0.0 }))
}

/// Ternarize the raster to {0, 0.5, 1} against two thresholds.
///
/// The middle level marks samples the model considers uncertain, which is
/// how partially etched regions show up in predictions.
pub fn ternarize(raster: &Array2<f32>, eta1: f32, eta2: f32) -> Array2<f32> {
    raster.mapv(|x| {
        if x < eta1 {
            0.0
        } else if x >= eta2 {
            1.0
        } else {
            0.5
        }
    })
}

fn quantize(sample: f32) -> usize {
    (sample.clamp(0.0, 1.0) * 255.0).round() as usize
}

/// Draw from N(mean, std) via the Box-Muller transform.
fn sample_normal<R: Rng>(rng: &mut R, mean: f32, std: f32) -> f32 {
    if std <= 0.0 {
        return mean;
    }
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen_range(0.0..1.0);
    let radius = (-2.0 * u1.ln()).sqrt();
    mean + std * radius * (2.0 * std::f32::consts::PI * u2).cos()
}
