//! Error types for the fabrication prediction client.
//!
//! This module contains specific error types used throughout the library,
//! avoiding generic error wrappers like `anyhow` or `Box<dyn Error>` for better
//! error handling and debugging.

mod batch_error;
mod client_error;
mod codec_error;
mod credentials_error;
mod device_error;
mod export_error;
mod geometry_error;
mod setup_error;

pub use batch_error::BatchError;
pub use client_error::ClientError;
pub use codec_error::CodecError;
pub use credentials_error::CredentialsError;
pub use device_error::DeviceError;
pub use export_error::ExportError;
pub use geometry_error::GeometryError;
pub use setup_error::SetupError;

/// Result type alias for raster geometry operations.
pub type GeometryResult<T> = std::result::Result<T, GeometryError>;

/// Result type alias for device construction and transformation.
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;

/// Result type alias for remote prediction calls.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Result type alias for batched prediction calls.
pub type BatchResult<T> = std::result::Result<T, BatchError>;

/// Result type alias for raster import and export.
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Result type alias for the account linking flow.
pub type SetupResult<T> = std::result::Result<T, SetupError>;
