//! File-backed load and save of the whole document.

use crate::document::ConfigDocument;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

/// Reads and writes the document file as a single unit.
///
/// Neither operation fails towards the caller: a missing or unreadable file
/// loads as an empty document and a failed save is logged.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; empty when the file does not exist yet or cannot be
    /// read or parsed.
    pub async fn load(&self) -> ConfigDocument {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => match ConfigDocument::from_json(&text) {
                Ok(doc) => doc,
                Err(err) => {
                    error!(path = %self.path.display(), error = %err, "Configuration file is not valid JSON; using empty document");
                    ConfigDocument::default()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No configuration file yet");
                ConfigDocument::default()
            }
            Err(err) => {
                error!(path = %self.path.display(), error = %err, "Failed to read configuration file; using empty document");
                ConfigDocument::default()
            }
        }
    }

    /// Normalize disabled lists in every scope, then write the document.
    /// Failures are logged; the in-memory document is left as mutated.
    pub async fn save(&self, doc: &mut ConfigDocument) {
        doc.normalize();
        if let Err(err) = self.try_save(doc).await {
            warn!(path = %self.path.display(), error = %err, "Failed to save configuration");
        }
    }

    /// Write the document atomically through a temporary file in the same
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns the I/O or serialization failure.
    pub async fn try_save(&self, doc: &ConfigDocument) -> io::Result<()> {
        let json = doc.to_json_pretty().map_err(io::Error::other)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, json.as_bytes()))
            .await
            .map_err(io::Error::other)?
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beast_common::{GuildId, Scope};

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load().await, ConfigDocument::default());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guild-config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(ConfigStore::new(path).load().await, ConfigDocument::default());
    }

    #[tokio::test]
    async fn test_save_normalizes_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("guild-config.json"));

        let mut doc = ConfigDocument::default();
        *doc.disabled_commands_mut(Scope::Guild(GuildId(5))) =
            vec!["/Ping".into(), "PING".into(), "ping".into()];
        store.save(&mut doc).await;
        assert_eq!(doc.disabled_commands(Scope::Guild(GuildId(5))), ["ping"]);

        let reloaded = store.load().await;
        assert_eq!(reloaded, doc);
    }

    #[tokio::test]
    async fn test_failed_save_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // The target path is a directory, so the rename fails.
        let store = ConfigStore::new(dir.path());
        let mut doc = ConfigDocument::default();
        doc.global.owner_only = true;
        store.save(&mut doc).await;
        assert!(store.try_save(&doc).await.is_err());
        assert!(doc.global.owner_only);
    }
}
