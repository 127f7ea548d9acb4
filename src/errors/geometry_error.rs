//! Error types for raster geometry operations.

use thiserror::Error;

/// Errors that can occur while transforming a device raster.
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("The raster must contain at least one sample")]
    EmptyRaster,

    #[error("The raster has no dynamic range: every sample is {value}")]
    NoDynamicRange { value: f32 },

    #[error("The raster has no non-zero samples to trim around")]
    AllZeroRaster,

    #[error("The structuring element size must be at least 1, got {size}")]
    InvalidKernelSize { size: usize },

    #[error("The blur standard deviation must be positive, got {sigma}")]
    InvalidSigma { sigma: f32 },

    #[error("The slice length must be at least 1, got {slice_length}")]
    InvalidSliceLength { slice_length: usize },

    #[error("The pad factor must be at least 1, got {pad_factor}")]
    InvalidPadFactor { pad_factor: usize },
}
