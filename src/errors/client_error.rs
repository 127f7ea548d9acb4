//! Error types for remote prediction calls.

use thiserror::Error;

use super::{CodecError, CredentialsError};

/// Errors that can occur while submitting a device to the prediction service.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error("Invalid service URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTPS is not supported by the built-in transport; point $PREFAB_SERVICE_URL at an HTTP gateway (got '{url}')")]
    HttpsUnsupported { url: String },

    #[error("Cannot resolve service address '{addr}': {reason}")]
    Resolve { addr: String, reason: String },

    #[error("Cannot connect to the prediction service at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport failure while talking to the prediction service: {source}")]
    Transport {
        #[from]
        source: std::io::Error,
    },

    #[error("Service response exceeds the {limit} byte limit")]
    ResponseTooLarge { limit: usize },

    #[error("The prediction service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("The prediction service reported an error: {message}")]
    Service { message: String },

    #[error("Malformed service response: {source}")]
    MalformedResponse {
        #[from]
        source: serde_json::Error,
    },

    #[error("The service response contains no prediction payload")]
    MissingPrediction,

    #[error(transparent)]
    Codec(#[from] CodecError),
}
