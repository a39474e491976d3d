//! CLI error type.

use std::{io, path::PathBuf};

use huddle_core::ChatError;
use thiserror::Error;

/// Errors surfaced by the `huddle` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Terminal or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Config file is not valid TOML or has unexpected fields.
    #[error("invalid config {}: {source}", path.display())]
    Config {
        /// Config file path.
        path: PathBuf,
        /// Parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Backend request failed.
    #[error(transparent)]
    Chat(#[from] ChatError),
}
