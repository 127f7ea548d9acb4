//! Error types for the browser-based account linking flow.

use thiserror::Error;

use super::CredentialsError;

/// Errors that can occur while linking an account via `prefab setup`.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Cannot bind the local callback listener: {source}")]
    Bind {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read the login callback: {source}")]
    Callback {
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed login callback: {reason}")]
    MalformedCallback { reason: String },

    #[error("The login callback carries an unexpected state token")]
    StateMismatch,

    #[error("The login callback is missing the '{param}' parameter")]
    MissingParameter { param: &'static str },

    #[error("Timed out after {seconds}s waiting for the browser login to complete")]
    Timeout { seconds: u64 },

    #[error(transparent)]
    Credentials(#[from] CredentialsError),
}
