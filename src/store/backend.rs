use crate::document::Document;
use crate::errors::DocketResult;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The durable backing medium underlying the [DocumentStore].
///
/// One durable key exists per collection name, holding the entire serialized
/// array of that collection's documents. Every mutating operation persists
/// the whole collection again; there are no delta writes.
///
/// `None` from [read_collection] means the collection has never been
/// written, which is an empty collection. An unreadable or corrupted entry
/// must fail with a `StorageError` instead, since "unreadable" is observably
/// different from "empty".
///
/// [DocumentStore]: crate::store::DocumentStore
/// [read_collection]: StorageBackend::read_collection
pub trait StorageBackend: Send + Sync {
    /// Reads the whole collection, or `None` when it has never been written.
    fn read_collection(&self, name: &str) -> DocketResult<Option<Vec<Document>>>;

    /// Replaces the whole collection with `docs`, atomically from the
    /// perspective of subsequent reads.
    fn write_collection(&self, name: &str, docs: &[Document]) -> DocketResult<()>;

    /// Removes the collection's durable key entirely.
    fn remove_collection(&self, name: &str) -> DocketResult<()>;

    /// Lists the names of all persisted collections.
    fn collection_names(&self) -> DocketResult<Vec<String>>;
}

/// In-memory backing medium.
///
/// Used for ephemeral databases and as a test double; it counts reads and
/// writes so tests can assert that the mirror cache keeps reads off the
/// backing medium.
#[derive(Default)]
pub struct MemoryBackend {
    collections: DashMap<String, Vec<Document>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            collections: DashMap::new(),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of collection reads served by this backend.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of collection writes persisted by this backend.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl StorageBackend for MemoryBackend {
    fn read_collection(&self, name: &str) -> DocketResult<Option<Vec<Document>>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.collections.get(name).map(|entry| entry.value().clone()))
    }

    fn write_collection(&self, name: &str, docs: &[Document]) -> DocketResult<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.collections.insert(name.to_string(), docs.to_vec());
        Ok(())
    }

    fn remove_collection(&self, name: &str) -> DocketResult<()> {
        self.collections.remove(name);
        Ok(())
    }

    fn collection_names(&self) -> DocketResult<Vec<String>> {
        Ok(self
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect())
    }
}
