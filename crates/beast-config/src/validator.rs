//! Settings validation.

use crate::error::ConfigError;
use crate::settings::Settings;

/// Settings validator.
pub struct SettingsValidator;

impl SettingsValidator {
    /// Validate `settings`. The token is only required when the gateway is
    /// about to be started.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first problem found.
    pub fn validate(settings: &Settings, require_token: bool) -> Result<(), ConfigError> {
        if require_token && settings.discord.token.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Discord token cannot be empty (set DISCORD_TOKEN)".to_string(),
            ));
        }
        if settings.scheduler.interval_seconds == 0 {
            return Err(ConfigError::Validation(
                "scheduler.interval_seconds must be positive".to_string(),
            ));
        }
        if settings.rate_limiting.sweep_interval_seconds == 0 {
            return Err(ConfigError::Validation(
                "rate_limiting.sweep_interval_seconds must be positive".to_string(),
            ));
        }
        if settings.storage.data_file.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.data_file cannot be empty".to_string(),
            ));
        }
        if settings.locale.trim().is_empty() {
            return Err(ConfigError::Validation("locale cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_only_required_for_gateway() {
        let settings = Settings::default();
        assert!(SettingsValidator::validate(&settings, false).is_ok());
        assert!(SettingsValidator::validate(&settings, true).is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut settings = Settings::default();
        settings.scheduler.interval_seconds = 0;
        assert!(SettingsValidator::validate(&settings, false).is_err());
    }
}
