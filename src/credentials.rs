//! Access token storage for the prediction service.
//!
//! Tokens live in a small TOML file, `~/.prefab.toml` by default. The
//! service rotates the refresh token on use, so the file is rewritten
//! after calls that return a new pair.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::CredentialsError;

/// The access/refresh token pair identifying a linked account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
}

/// Resolve the token file location.
///
/// Uses `$PREFAB_TOKEN_FILE` if set, otherwise `~/.prefab.toml`.
pub fn token_file_path() -> Result<PathBuf, CredentialsError> {
    if let Ok(path) = std::env::var("PREFAB_TOKEN_FILE") {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    std::env::var("HOME")
        .ok()
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(".prefab.toml"))
        .ok_or(CredentialsError::NoHomeDirectory)
}

/// Load the token pair from the default location.
pub fn load() -> Result<TokenSet, CredentialsError> {
    load_from(&token_file_path()?)
}

/// Load the token pair from `path`.
///
/// Parsing is line-oriented (`key = "value"`); unknown keys and comments
/// are skipped, order does not matter, both tokens are required.
pub fn load_from(path: &Path) -> Result<TokenSet, CredentialsError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            return Err(CredentialsError::NotLinked { path: path.to_path_buf() });
        }
        Err(source) => {
            return Err(CredentialsError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mut access_token = None;
    let mut refresh_token = None;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"').to_string();
            match key.trim() {
                "access_token" => access_token = Some(value),
                "refresh_token" => refresh_token = Some(value),
                _ => {}
            }
        }
    }

    let access_token = access_token.ok_or(CredentialsError::MissingKey {
        path: path.to_path_buf(),
        key: "access_token",
    })?;
    let refresh_token = refresh_token.ok_or(CredentialsError::MissingKey {
        path: path.to_path_buf(),
        key: "refresh_token",
    })?;
    Ok(TokenSet {
        access_token,
        refresh_token,
    })
}

/// Write the token pair to the default location.
pub fn store(tokens: &TokenSet) -> Result<(), CredentialsError> {
    store_to(&token_file_path()?, tokens)
}

/// Write the token pair to `path`, replacing any previous contents.
pub fn store_to(path: &Path, tokens: &TokenSet) -> Result<(), CredentialsError> {
    let content = format!(
        "access_token = \"{}\"\nrefresh_token = \"{}\"\n",
        tokens.access_token, tokens.refresh_token
    );
    fs::write(path, content).map_err(|source| CredentialsError::Io {
        path: path.to_path_buf(),
        source,
    })
}
