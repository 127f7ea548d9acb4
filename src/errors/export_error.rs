//! Error types for raster import and export.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing device rasters on disk.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported image magic {magic:?}: expected P2 or P5")]
    UnsupportedMagic { magic: String },

    #[error("Malformed PGM image: {reason}")]
    MalformedImage { reason: String },

    #[error("Unsupported PGM sample depth: maxval {maxval} exceeds 255")]
    UnsupportedDepth { maxval: u32 },

    #[error("The raster has no samples to export")]
    EmptyRaster,

    #[error("A contour has {points} vertices, exceeding the GDSII record limit of {max}")]
    ContourTooComplex { points: usize, max: usize },

    #[error("The cell name must be non-empty ASCII")]
    InvalidCellName,
}
