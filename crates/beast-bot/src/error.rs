//! Application-wide error types using thiserror.

use beast_commands::RouterError;
use beast_common::LoggingError;
use beast_config::{ConfigError, StoreError};
use beast_i18n::I18nError;
use poise::serenity_prelude as serenity;

/// Errors that stop the bot from starting or keep it from running.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Settings could not be loaded or are invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The configuration store task is gone.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Message catalogue failed to load.
    #[error("Localization error: {0}")]
    I18n(#[from] I18nError),

    /// Two commands share a name.
    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    /// Logging could not be installed.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Discord/Serenity error.
    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),
}

/// Result type for the bot application.
pub type AppResult<T> = Result<T, AppError>;
