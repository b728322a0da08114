//! Single-writer access to the document.
//!
//! One task owns the [`ConfigStore`]. Every operation is queued to it and runs
//! as `load -> closure -> save` before the next one starts, so read-modify-write
//! sequences from concurrent handlers and the scheduler are serialized.

use crate::cache::DocumentCache;
use crate::document::ConfigDocument;
use crate::error::StoreError;
use crate::store::ConfigStore;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

const QUEUE_DEPTH: usize = 64;

type Job = Box<dyn FnOnce(&mut ConfigDocument) + Send>;

struct Request {
    job: Job,
    persist: bool,
}

/// Cloneable handle to the store task.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<Request>,
    cache: Arc<DocumentCache>,
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("closed", &self.tx.is_closed())
            .finish_non_exhaustive()
    }
}

impl StoreHandle {
    /// Load the document once, publish it and start the writer task. The task
    /// ends when the last handle is dropped.
    pub async fn start(store: ConfigStore) -> Self {
        let initial = store.load().await;
        let cache = Arc::new(DocumentCache::new(initial));
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        info!(path = %store.path().display(), "Configuration store started");
        tokio::spawn(run(store, Arc::clone(&cache), rx));
        Self { tx, cache }
    }

    /// Run `f` against a freshly loaded document and save the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Closed`] when the writer task is gone.
    pub async fn update<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        R: Send + 'static,
        F: FnOnce(&mut ConfigDocument) -> R + Send + 'static,
    {
        self.submit(f, true).await
    }

    /// Run `f` against a freshly loaded document without saving.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Closed`] when the writer task is gone.
    pub async fn read<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        R: Send + 'static,
        F: FnOnce(&ConfigDocument) -> R + Send + 'static,
    {
        self.submit(move |doc: &mut ConfigDocument| f(doc), false).await
    }

    /// The document as of the last completed operation.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ConfigDocument> {
        self.cache.get()
    }

    async fn submit<R, F>(&self, f: F, persist: bool) -> Result<R, StoreError>
    where
        R: Send + 'static,
        F: FnOnce(&mut ConfigDocument) -> R + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |doc| {
            let _ = reply_tx.send(f(doc));
        });
        self.tx
            .send(Request { job, persist })
            .await
            .map_err(|_| StoreError::Closed)?;
        reply_rx.await.map_err(|_| StoreError::Closed)
    }
}

async fn run(store: ConfigStore, cache: Arc<DocumentCache>, mut rx: mpsc::Receiver<Request>) {
    while let Some(Request { job, persist }) = rx.recv().await {
        let mut doc = store.load().await;
        job(&mut doc);
        if persist {
            store.save(&mut doc).await;
        }
        cache.update(doc);
    }
    debug!("Configuration store task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use beast_common::{GuildId, Scope};

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::start(ConfigStore::new(dir.path().join("doc.json"))).await;

        let mut tasks = Vec::new();
        for i in 0..20_u64 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .update(move |doc| {
                        doc.global.ticket_counter += 1;
                        doc.guild_mut(GuildId(i + 1)).website = Some(format!("https://{i}.example"));
                    })
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let reloaded = ConfigStore::new(dir.path().join("doc.json")).load().await;
        assert_eq!(reloaded.global.ticket_counter, 20);
        assert_eq!(reloaded.guilds.len(), 20);
        assert_eq!(store.snapshot().global.ticket_counter, 20);
    }

    #[tokio::test]
    async fn test_read_does_not_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let store = StoreHandle::start(ConfigStore::new(&path)).await;
        let prefix = store.read(|doc| doc.global.prefix.clone()).await.unwrap();
        assert_eq!(prefix, None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_update_returns_closure_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::start(ConfigStore::new(dir.path().join("doc.json"))).await;
        let disabled = store
            .update(|doc| {
                doc.disabled_commands_mut(Scope::Global).push("/Ping".into());
                doc.disabled_commands(Scope::Global).len()
            })
            .await
            .unwrap();
        assert_eq!(disabled, 1);
        assert_eq!(store.snapshot().disabled_commands(Scope::Global), ["ping"]);
    }
}
