//! Error types for device construction and transformation.

use thiserror::Error;

use super::{ExportError, GeometryError};

/// Errors that can occur while building or transforming a [`Device`](crate::Device).
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("The device raster must contain at least one sample")]
    EmptyRaster,

    #[error("The device raster contains a non-finite sample at ({row}, {col})")]
    NonFiniteSample { row: usize, col: usize },

    #[error("The buffer thickness must be greater than 0")]
    InvalidBufferThickness,

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Import(#[from] ExportError),
}
