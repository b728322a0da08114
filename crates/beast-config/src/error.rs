//! Error types for settings loading and the document store.

use beast_common::BotError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating process settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading a settings file
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("Failed to parse TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file extension names no supported format
    #[error("Unsupported settings format: {0} (expected .toml, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {message}")]
    EnvParse {
        /// Variable name.
        var: String,
        /// Parser message.
        message: String,
    },

    /// Settings are structurally valid but unusable
    #[error("Invalid settings: {0}")]
    Validation(String),
}

/// Errors raised by [`crate::StoreHandle`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The writer task has stopped, so the operation never ran.
    #[error("configuration store is closed")]
    Closed,
}

impl From<StoreError> for BotError {
    fn from(err: StoreError) -> Self {
        Self::persistence(err.to_string())
    }
}
