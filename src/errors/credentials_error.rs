//! Error types for access token storage.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or saving the account token file.
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("No token file found at '{}'. Run `prefab setup` to link your account", path.display())]
    NotLinked { path: PathBuf },

    #[error("Cannot determine the token file location (no $HOME and no $PREFAB_TOKEN_FILE)")]
    NoHomeDirectory,

    #[error("The token file '{}' is missing the '{key}' entry", path.display())]
    MissingKey { path: PathBuf, key: &'static str },

    #[error("Cannot access the token file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
