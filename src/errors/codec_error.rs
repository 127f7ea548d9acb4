//! Error types for the raster wire codec.

use thiserror::Error;

/// Errors that can occur while encoding or decoding a raster for transport.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid base64 symbol {symbol:?} at position {position}")]
    InvalidBase64Symbol { symbol: char, position: usize },

    #[error("Invalid base64 length {length}: must be a multiple of 4")]
    InvalidBase64Length { length: usize },

    #[error("Invalid base64 padding")]
    InvalidBase64Padding,

    #[error("Encoded raster is truncated: expected at least 8 header bytes, got {length}")]
    TruncatedHeader { length: usize },

    #[error("Encoded raster payload size mismatch: expected {expected} bytes for a {rows}x{cols} raster, got {actual}")]
    PayloadSizeMismatch {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Encoded raster has a zero dimension: {rows}x{cols}")]
    ZeroDimension { rows: usize, cols: usize },
}
