//! Settings resolution.
//!
//! Precedence, highest first: command-line flags and their environment
//! variables, the TOML config file, built-in defaults.
//!
//! ```toml
//! api_url = "https://jobs.example.com"
//! timeout_secs = 10
//!
//! [chat]
//! variant = "full-page"
//! poll_interval_ms = 5000
//! restore_failed_input = true
//! ```

use std::{path::Path, time::Duration};

use huddle_app::{ChatConfig, SessionVariant};
use huddle_client::ClientConfig;
use serde::Deserialize;

use crate::CliError;

/// Contents of the config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Backend origin.
    pub api_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Bearer token.
    pub token: Option<String>,
    /// Session behavior.
    pub chat: Option<ChatConfig>,
}

impl FileConfig {
    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Io`] if the file cannot be read and
    /// [`CliError::Config`] if it is not a valid config.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|source| CliError::Config { path: path.to_path_buf(), source })
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Backend connection.
    pub client: ClientConfig,
    /// Bearer token. `None` runs signed out.
    pub token: Option<String>,
    /// Session behavior.
    pub chat: ChatConfig,
}

impl Settings {
    /// Merge flag values over the config file.
    ///
    /// Without a `[chat]` table the terminal runs as a full page: there is
    /// no widget highlight to rotate.
    pub fn resolve(file: FileConfig, api_url: Option<String>, token: Option<String>) -> Self {
        let mut client = api_url
            .or(file.api_url)
            .map_or_else(ClientConfig::default, ClientConfig::new);
        if let Some(secs) = file.timeout_secs {
            client.timeout = Duration::from_secs(secs);
        }

        Self {
            client,
            token: token.or(file.token),
            chat: file.chat.unwrap_or_else(|| ChatConfig::for_variant(SessionVariant::FullPage)),
        }
    }
}
