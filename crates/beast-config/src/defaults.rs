//! Default values for process settings.

use crate::settings::{
    DiscordSettings, ProviderCredentials, RateLimitingSettings, SchedulerSettings, Settings,
    StorageSettings,
};
use beast_common::LoggingConfig;
use std::collections::HashMap;
use std::path::PathBuf;

/// Locale used when none is configured.
pub const DEFAULT_LOCALE: &str = "de";

/// Document file used when none is configured.
pub const DEFAULT_DATA_FILE: &str = "guild-config.json";

impl Default for Settings {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            discord: DiscordSettings::default(),
            storage: StorageSettings::default(),
            scheduler: SchedulerSettings::default(),
            rate_limiting: RateLimitingSettings::default(),
            providers: ProviderCredentials::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner_id: None,
            client_id: None,
            registration_delay_ms: 750,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_seconds: 30,
            broadcast_delay_ms: 200,
        }
    }
}

impl Default for RateLimitingSettings {
    fn default() -> Self {
        Self {
            default_cooldown_seconds: 3,
            commands: HashMap::new(),
            sweep_interval_seconds: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Settings;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.locale, "de");
        assert_eq!(settings.scheduler.interval_seconds, 30);
        assert_eq!(settings.scheduler.broadcast_delay_ms, 200);
        assert_eq!(settings.rate_limiting.default_cooldown_seconds, 3);
        assert_eq!(settings.discord.registration_delay_ms, 750);
        assert_eq!(settings.storage.data_file.to_str(), Some("guild-config.json"));
    }
}
