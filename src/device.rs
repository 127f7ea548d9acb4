//! The planar geometry of a photonic device design.

use std::path::Path;

use log::warn;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::client::{ModelKind, PredictRequest, PredictionClient};
use crate::codec;
use crate::errors::{ClientResult, DeviceError, DeviceResult, ExportResult};
use crate::export::{gds, pgm};
use crate::geometry;
use crate::models::Model;

/// How one side of the buffer zone is filled.
///
/// `Constant` zero-fills, for isolated structures. `Edge` replicates the
/// boundary samples, for waveguides that continue past the frame into the
/// surrounding circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferMode {
    Constant,
    Edge,
}

/// The buffer zone added around a device raster at construction.
///
/// Prediction models need surrounding context to judge how a boundary
/// fabricates, so every device carries a buffer of `thickness` samples on
/// each side, filled per-side according to its [`BufferMode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferSpec {
    pub top: BufferMode,
    pub bottom: BufferMode,
    pub left: BufferMode,
    pub right: BufferMode,
    pub thickness: usize,
}

impl BufferSpec {
    pub const DEFAULT_THICKNESS: usize = 128;

    /// Uniform buffer with the same mode on all four sides.
    pub fn uniform(mode: BufferMode, thickness: usize) -> Self {
        Self {
            top: mode,
            bottom: mode,
            left: mode,
            right: mode,
            thickness,
        }
    }
}

impl Default for BufferSpec {
    fn default() -> Self {
        Self::uniform(BufferMode::Constant, Self::DEFAULT_THICKNESS)
    }
}

/// Options for a remote prediction call.
///
/// `binarize` overrides the per-call default (predictions stay grayscale,
/// corrections binarize); `service_url` overrides `$PREFAB_SERVICE_URL`.
#[derive(Debug, Clone, Default)]
pub struct PredictOptions {
    binarize: Option<bool>,
    service_url: Option<String>,
}

impl PredictOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binarize(mut self, binarize: bool) -> Self {
        self.binarize = Some(binarize);
        self
    }

    pub fn with_service_url(mut self, url: &str) -> Self {
        self.service_url = Some(url.to_string());
        self
    }

    pub(crate) fn binarize_or(&self, default: bool) -> bool {
        self.binarize.unwrap_or(default)
    }

    pub(crate) fn client(&self) -> PredictionClient {
        match &self.service_url {
            Some(url) => PredictionClient::new(url),
            None => PredictionClient::from_env(),
        }
    }
}

/// A photonic device design whose nanofabrication outcome is to be
/// predicted or corrected.
///
/// The raster is `f32` in `[0, 1]` (0 = cladding, 1 = core). Construction
/// applies the buffer padding once; every transformation returns a new
/// `Device` carrying the same [`BufferSpec`] without re-padding.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    raster: Array2<f32>,
    buffer: BufferSpec,
}

impl Device {
    /// Build a device from a design raster, applying the buffer padding.
    pub fn new(raster: Array2<f32>, buffer: BufferSpec) -> DeviceResult<Device> {
        if raster.is_empty() {
            return Err(DeviceError::EmptyRaster);
        }
        if buffer.thickness == 0 {
            return Err(DeviceError::InvalidBufferThickness);
        }
        if let Some(((row, col), _)) = raster
            .indexed_iter()
            .find(|(_, sample)| !sample.is_finite())
        {
            return Err(DeviceError::NonFiniteSample { row, col });
        }

        Ok(Device {
            raster: pad_buffer(&raster, &buffer),
            buffer,
        })
    }

    /// Build a device with the default buffer.
    pub fn from_raster(raster: Array2<f32>) -> DeviceResult<Device> {
        Self::new(raster, BufferSpec::default())
    }

    /// Load a device from an 8-bit grayscale PGM mask.
    pub fn from_pgm(path: &Path, buffer: BufferSpec) -> DeviceResult<Device> {
        Self::new(pgm::read_pgm(path)?, buffer)
    }

    /// Padded raster dimensions as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.raster.dim()
    }

    /// The padded raster, buffer included.
    pub fn raster(&self) -> &Array2<f32> {
        &self.raster
    }

    /// The buffer specification applied at construction.
    pub fn buffer_spec(&self) -> &BufferSpec {
        &self.buffer
    }

    /// True iff every sample is exactly 0 or 1.
    pub fn is_binary(&self) -> bool {
        self.raster.iter().all(|&x| x == 0.0 || x == 1.0)
    }

    /// The raster with `Edge`-mode buffers cropped away.
    ///
    /// `Constant` buffers are part of the design footprint and stay; an
    /// `Edge` buffer only existed to give the model context and is removed
    /// on export.
    pub fn to_raster(&self) -> Array2<f32> {
        let (rows, cols) = self.raster.dim();
        let thickness = self.buffer.thickness;
        let crop_top = crop_amount(self.buffer.top, thickness);
        let crop_bottom = crop_amount(self.buffer.bottom, thickness);
        let crop_left = crop_amount(self.buffer.left, thickness);
        let crop_right = crop_amount(self.buffer.right, thickness);
        self.raster
            .slice(ndarray::s![
                crop_top..rows - crop_bottom,
                crop_left..cols - crop_right
            ])
            .to_owned()
    }

    // ─── Geometry transforms ──────────────────────────────────

    /// Normalize the raster to span `[0, 1]`.
    pub fn normalize(&self) -> DeviceResult<Device> {
        Ok(self.derive(geometry::normalize(&self.raster)?))
    }

    /// Binarize with the smoothed threshold projection; `beta = INFINITY`
    /// is a hard threshold.
    pub fn binarize(&self, eta: f32, beta: f32) -> Device {
        self.derive(geometry::binarize(&self.raster, eta, beta))
    }

    /// Binarize with a hard threshold at `eta`.
    pub fn binarize_hard(&self, eta: f32) -> Device {
        self.derive(geometry::binarize_hard(&self.raster, eta))
    }

    /// Binarize against a spatially varying random threshold, simulating
    /// run-to-run fabrication variation.
    pub fn binarize_monte_carlo(
        &self,
        threshold_noise_std: f32,
        threshold_blur_std: f32,
    ) -> DeviceResult<Device> {
        Ok(self.derive(geometry::binarize_monte_carlo(
            &self.raster,
            threshold_noise_std,
            threshold_blur_std,
        )?))
    }

    /// Ternarize to {0, 0.5, 1} against two thresholds.
    pub fn ternarize(&self, eta1: f32, eta2: f32) -> Device {
        self.derive(geometry::ternarize(&self.raster, eta1, eta2))
    }

    /// Crop to the non-zero bounding box, keeping the buffer thickness as
    /// margin.
    pub fn trim(&self) -> DeviceResult<Device> {
        Ok(self.derive(geometry::trim(&self.raster, self.buffer.thickness)?))
    }

    /// Gaussian-blur and renormalize.
    pub fn blur(&self, sigma: f32) -> DeviceResult<Device> {
        Ok(self.derive(geometry::blur(&self.raster, sigma)?))
    }

    /// Rotate about the raster center, positive angles counter-clockwise.
    pub fn rotate(&self, angle: f32) -> DeviceResult<Device> {
        Ok(self.derive(geometry::rotate(&self.raster, angle)?))
    }

    /// Morphological erosion over a square structuring element.
    pub fn erode(&self, kernel_size: usize) -> DeviceResult<Device> {
        Ok(self.derive(geometry::erode(&self.raster, kernel_size)?))
    }

    /// Morphological dilation over a square structuring element.
    pub fn dilate(&self, kernel_size: usize) -> DeviceResult<Device> {
        Ok(self.derive(geometry::dilate(&self.raster, kernel_size)?))
    }

    // ─── Remote calls ─────────────────────────────────────────

    /// Predict the fabrication outcome of this design.
    ///
    /// Returns the model's grayscale outcome estimate unless the options
    /// ask for binarization.
    pub fn predict(&self, model: &Model, options: &PredictOptions) -> ClientResult<Device> {
        self.run_remote(model, ModelKind::Predictor, options.binarize_or(false), options)
    }

    /// Correct this design so its fabricated outcome matches the intent.
    ///
    /// Corrections feed back into layouts, so the result is binarized
    /// unless the options say otherwise.
    pub fn correct(&self, model: &Model, options: &PredictOptions) -> ClientResult<Device> {
        self.run_remote(model, ModelKind::Corrector, options.binarize_or(true), options)
    }

    /// Restyle this design as an SEM capture of the fabricated chip.
    pub fn semulate(&self, model: &Model, options: &PredictOptions) -> ClientResult<Device> {
        self.run_remote(model, ModelKind::SemStyle, options.binarize_or(false), options)
    }

    pub(crate) fn run_remote(
        &self,
        model: &Model,
        kind: ModelKind,
        binarize: bool,
        options: &PredictOptions,
    ) -> ClientResult<Device> {
        if !self.is_binary() {
            warn!("the device raster is not binary; prediction accuracy will be affected");
        }
        let request = PredictRequest {
            device_array: codec::encode_raster(&self.raster),
            model_name: model.name.clone(),
            model_tags: model.request_tags(),
            model_type: kind.wire_code().to_string(),
            binary: binarize,
        };
        let mut predicted = options.client().predict(&request)?;
        if binarize {
            predicted = geometry::binarize_hard(&predicted, 0.5);
        }
        Ok(self.derive(predicted))
    }

    // ─── Export ───────────────────────────────────────────────

    /// Write the device (edge buffers cropped) as a binary PGM image.
    pub fn to_pgm(&self, path: &Path) -> ExportResult<()> {
        pgm::write_pgm(&self.to_raster(), path)
    }

    /// Write the device (edge buffers cropped, hard-binarized) as a GDSII
    /// library with a single cell, 1 sample = 1 nm.
    pub fn to_gds(&self, path: &Path, cell_name: &str, layer: (i16, i16)) -> ExportResult<()> {
        let mask = geometry::binarize_hard(&self.to_raster(), 0.5);
        gds::write_gds(&mask, path, cell_name, layer)
    }

    /// New device with the same buffer spec and a transformed raster.
    fn derive(&self, raster: Array2<f32>) -> Device {
        Device {
            raster,
            buffer: self.buffer.clone(),
        }
    }
}

fn crop_amount(mode: BufferMode, thickness: usize) -> usize {
    match mode {
        BufferMode::Edge => thickness,
        BufferMode::Constant => 0,
    }
}

/// Pad the raster on all four sides per the buffer spec.
///
/// Sides are padded one after another (top, bottom, left, right), each
/// over the intermediate result, so an `Edge` side replicates into the
/// corner blocks the way the adjoining circuitry actually continues.
fn pad_buffer(raster: &Array2<f32>, buffer: &BufferSpec) -> Array2<f32> {
    let t = buffer.thickness;
    let padded = pad_rows(raster, t, 0, buffer.top);
    let padded = pad_rows(&padded, 0, t, buffer.bottom);
    let padded = pad_cols(&padded, t, 0, buffer.left);
    pad_cols(&padded, 0, t, buffer.right)
}

fn pad_rows(raster: &Array2<f32>, above: usize, below: usize, mode: BufferMode) -> Array2<f32> {
    let (rows, cols) = raster.dim();
    let mut out = Array2::<f32>::zeros((rows + above + below, cols));
    out.slice_mut(ndarray::s![above..above + rows, ..])
        .assign(raster);
    if mode == BufferMode::Edge {
        for r in 0..above {
            for c in 0..cols {
                out[(r, c)] = raster[(0, c)];
            }
        }
        for r in 0..below {
            for c in 0..cols {
                out[(above + rows + r, c)] = raster[(rows - 1, c)];
            }
        }
    }
    out
}

fn pad_cols(raster: &Array2<f32>, before: usize, after: usize, mode: BufferMode) -> Array2<f32> {
    let (rows, cols) = raster.dim();
    let mut out = Array2::<f32>::zeros((rows, cols + before + after));
    out.slice_mut(ndarray::s![.., before..before + cols])
        .assign(raster);
    if mode == BufferMode::Edge {
        for r in 0..rows {
            for c in 0..before {
                out[(r, c)] = raster[(r, 0)];
            }
            for c in 0..after {
                out[(r, before + cols + c)] = raster[(r, cols - 1)];
            }
        }
    }
    out
}
