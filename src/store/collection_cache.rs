use crate::document::Document;
use dashmap::DashMap;
use std::sync::Arc;

/// Per-collection in-memory mirror of the backing medium.
///
/// Entries are created lazily on first read and replaced synchronously with
/// every completed write, inside the same per-collection critical section as
/// the backing-medium write. Whenever an entry is present it is exactly the
/// content of the latest completed write; the mirror is never allowed to go
/// stale.
#[derive(Default)]
pub(crate) struct CollectionCache {
    entries: DashMap<String, Arc<Vec<Document>>>,
}

impl CollectionCache {
    pub(crate) fn new() -> Self {
        CollectionCache {
            entries: DashMap::new(),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<Vec<Document>>> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    /// Replaces the mirror entry for a collection with fresh content.
    pub(crate) fn put(&self, name: &str, docs: Arc<Vec<Document>>) {
        self.entries.insert(name.to_string(), docs);
    }

    /// Drops the mirror entry; the next read reloads from the backing medium.
    pub(crate) fn invalidate(&self, name: &str) {
        self.entries.remove(name);
    }

    pub(crate) fn clear(&self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
