//! Settings loading: file first, then environment overrides.

use crate::error::ConfigError;
use crate::settings::Settings;
use crate::validator::SettingsValidator;
use beast_common::UserId;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit settings file.
pub const CONFIG_PATH_VAR: &str = "BEAST_CONFIG";

/// Files looked up in the working directory when no path is given.
const DEFAULT_FILES: [&str; 3] = ["beast.toml", "beast.yaml", "beast.yml"];

/// Settings loader.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from `path` (or a default file when present), apply
    /// process environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, an override does not
    /// parse, or validation rejects the result.
    pub fn load(path: Option<&Path>, require_token: bool) -> Result<Settings, ConfigError> {
        Self::load_with(path, require_token, |var| std::env::var(var).ok())
    }

    /// Same as [`SettingsLoader::load`] with an injectable environment.
    ///
    /// # Errors
    ///
    /// See [`SettingsLoader::load`].
    pub fn load_with(
        path: Option<&Path>,
        require_token: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_PATH_VAR).map(PathBuf::from))
            .or_else(|| {
                DEFAULT_FILES
                    .iter()
                    .map(PathBuf::from)
                    .find(|candidate| candidate.exists())
            });

        let mut settings = match path {
            Some(path) => {
                info!(path = %path.display(), "Loading settings file");
                Self::load_from_file(&path)?
            }
            None => {
                debug!("No settings file found, using defaults");
                Settings::default()
            }
        };

        Self::apply_env_overrides(&mut settings, env)?;
        SettingsValidator::validate(&settings, require_token)?;
        Ok(settings)
    }

    /// Parse a settings file, choosing TOML or YAML by extension.
    ///
    /// # Errors
    ///
    /// Fails on read errors, parse errors and unknown extensions.
    pub fn load_from_file(path: &Path) -> Result<Settings, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Parse settings text in the format implied by `path`'s extension.
    ///
    /// # Errors
    ///
    /// Fails on parse errors and unknown extensions.
    pub fn parse(path: &Path, content: &str) -> Result<Settings, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Apply environment variable overrides. Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvParse`] when an identifier does not parse.
    pub fn apply_env_overrides(
        settings: &mut Settings,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        if let Some(token) = var("DISCORD_TOKEN") {
            settings.discord.token = token;
        }
        if let Some(owner) = var("OWNER_ID") {
            settings.discord.owner_id =
                Some(owner.parse::<UserId>().map_err(|e| ConfigError::EnvParse {
                    var: "OWNER_ID".to_string(),
                    message: e.to_string(),
                })?);
        }
        if let Some(client_id) = var("CLIENT_ID") {
            settings.discord.client_id = Some(client_id);
        }
        if let Some(data_file) = var("BEAST_DATA_FILE") {
            settings.storage.data_file = PathBuf::from(data_file);
        }
        if let Some(locale) = var("BEAST_LOCALE") {
            settings.locale = locale;
        }

        let providers = &mut settings.providers;
        for (name, slot) in [
            ("OPENAI_API_KEY", &mut providers.openai_key),
            ("YOUTUBE_API_KEY", &mut providers.youtube_key),
            ("TWITCH_CLIENT_ID", &mut providers.twitch_client_id),
            ("TWITCH_CLIENT_SECRET", &mut providers.twitch_client_secret),
            ("ELEVENLABS_API_KEY", &mut providers.elevenlabs_key),
            ("ELEVENLABS_VOICE_ID", &mut providers.elevenlabs_voice_id),
            ("INSTAGRAM_API_KEY", &mut providers.instagram_key),
            ("TIKTOK_API_KEY", &mut providers.tiktok_key),
        ] {
            if let Some(value) = var(name) {
                *slot = Some(value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_parse_by_extension() {
        let toml = "locale = \"en\"\n[scheduler]\ninterval_seconds = 5\n";
        let settings = SettingsLoader::parse(Path::new("a.toml"), toml).unwrap();
        assert_eq!(settings.locale, "en");
        assert_eq!(settings.scheduler.interval_seconds, 5);
        assert_eq!(settings.scheduler.broadcast_delay_ms, 200);

        let yaml = "locale: en\nrate_limiting:\n  commands:\n    8ball: 9\n";
        let settings = SettingsLoader::parse(Path::new("a.yml"), yaml).unwrap();
        assert_eq!(settings.cooldown_for("8ball"), 9);
        assert_eq!(settings.cooldown_for("ping"), 3);

        assert!(matches!(
            SettingsLoader::parse(Path::new("a.ini"), ""),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_env_overrides_win() {
        let mut settings = Settings::default();
        settings.discord.token = "from-file".to_string();
        SettingsLoader::apply_env_overrides(
            &mut settings,
            env(&[
                ("DISCORD_TOKEN", "from-env"),
                ("OWNER_ID", "42"),
                ("OPENAI_API_KEY", "sk-test"),
                ("YOUTUBE_API_KEY", "  "),
            ]),
        )
        .unwrap();
        assert_eq!(settings.discord.token, "from-env");
        assert_eq!(settings.discord.owner_id, Some(UserId(42)));
        assert_eq!(settings.providers.openai_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.providers.youtube_key, None);
    }

    #[test]
    fn test_bad_owner_id() {
        let mut settings = Settings::default();
        let err = SettingsLoader::apply_env_overrides(&mut settings, env(&[("OWNER_ID", "me")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParse { var, .. } if var == "OWNER_ID"));
    }
}
