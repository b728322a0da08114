//! Process settings: everything the bot needs before it can open the store.

use beast_common::{LoggingConfig, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main settings structure for Beast Bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Language code used for replies, e.g. `de` or `en`.
    pub locale: String,
    /// Gateway settings and the environment owner.
    pub discord: DiscordSettings,
    /// Location of the persisted document.
    pub storage: StorageSettings,
    /// Scheduled action polling.
    pub scheduler: SchedulerSettings,
    /// Cooldown windows.
    pub rate_limiting: RateLimitingSettings,
    /// Provider credentials supplied out of band.
    pub providers: ProviderCredentials,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Gateway settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    /// Bot token.
    pub token: String,
    /// Owner configured out of band; always counts as an owner.
    pub owner_id: Option<UserId>,
    /// Application id, informational only.
    pub client_id: Option<String>,
    /// Pause between per-guild command registrations.
    pub registration_delay_ms: u64,
}

/// Persisted document location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// JSON file holding the guild document.
    pub data_file: PathBuf,
}

/// Scheduler timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Seconds between two scans of the pending list.
    pub interval_seconds: u64,
    /// Pause between two broadcast sends.
    pub broadcast_delay_ms: u64,
}

/// Cooldown windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitingSettings {
    /// Window for rate limited commands without an override.
    pub default_cooldown_seconds: u64,
    /// Per-command overrides keyed by normalized command name.
    pub commands: HashMap<String, u64>,
    /// Seconds between sweeps of expired cooldown entries.
    pub sweep_interval_seconds: u64,
}

/// Provider credentials from the environment. These take precedence over
/// anything stored in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ProviderCredentials {
    pub openai_key: Option<String>,
    pub youtube_key: Option<String>,
    pub twitch_client_id: Option<String>,
    pub twitch_client_secret: Option<String>,
    pub elevenlabs_key: Option<String>,
    pub elevenlabs_voice_id: Option<String>,
    pub instagram_key: Option<String>,
    pub tiktok_key: Option<String>,
}

impl Settings {
    /// Cooldown window for `command` in seconds.
    #[must_use]
    pub fn cooldown_for(&self, command: &str) -> u64 {
        self.rate_limiting
            .commands
            .get(command)
            .copied()
            .unwrap_or(self.rate_limiting.default_cooldown_seconds)
    }
}
