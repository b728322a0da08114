//! Lock-free snapshots of the last committed document.

use crate::document::ConfigDocument;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Holds the document as of the last store operation, for readers that must
/// not wait on the writer task.
pub struct DocumentCache {
    document: ArcSwap<ConfigDocument>,
}

impl DocumentCache {
    /// Creates a cache holding `document`.
    #[must_use]
    pub fn new(document: ConfigDocument) -> Self {
        Self {
            document: ArcSwap::from_pointee(document),
        }
    }

    /// Gets the current document.
    #[must_use]
    pub fn get(&self) -> Arc<ConfigDocument> {
        self.document.load_full()
    }

    /// Replaces the document atomically.
    pub fn update(&self, document: ConfigDocument) {
        self.document.store(Arc::new(document));
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new(ConfigDocument::default())
    }
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache").finish_non_exhaustive()
    }
}
