use crate::cache::ResultCache;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::store::{DocumentStore, FileBackend, MemoryBackend, StorageBackend};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The Docket database handle.
///
/// `Docket` owns the [DocumentStore] and the [ResultCache] and is the only
/// thing callers construct: both caches live inside the handle with a plain
/// construction/teardown lifecycle, and consumers receive them by reference.
/// Clones share the same underlying state through an `Arc` inner.
///
/// # Examples
///
/// ```rust
/// use docket::{doc, Docket};
/// use docket::filter::Filter;
///
/// let db = Docket::builder().open()?;
/// db.store().insert_one("designs", doc! { name: "Skyline" })?;
/// let all = db.store().find("designs", &Filter::empty())?;
/// assert_eq!(all.len(), 1);
/// db.close()?;
/// # Ok::<(), docket::errors::DocketError>(())
/// ```
#[derive(Clone)]
pub struct Docket {
    inner: Arc<DocketInner>,
}

struct DocketInner {
    store: DocumentStore,
    result_cache: ResultCache,
    closed: AtomicBool,
}

impl Docket {
    /// Starts building a database handle.
    pub fn builder() -> DocketBuilder {
        DocketBuilder::new()
    }

    /// The document store behind this handle.
    pub fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    /// The result cache behind this handle.
    pub fn result_cache(&self) -> &ResultCache {
        &self.inner.result_cache
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Closes the handle: clears both cache tiers and marks the handle
    /// closed. All durable state stays on the backing medium. Closing twice
    /// is an `InvalidOperation`.
    pub fn close(&self) -> DocketResult<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            log::error!("Database handle closed twice");
            return Err(DocketError::new(
                "database handle is already closed",
                ErrorKind::InvalidOperation,
            ));
        }
        self.inner.store.clear_mirror();
        self.inner.result_cache.invalidate(None);
        log::info!("Database handle closed");
        Ok(())
    }
}

/// Builder for [Docket] handles.
///
/// With a base directory the store persists one JSON file per collection
/// under it; without one the store is ephemeral and in-memory.
#[derive(Default)]
pub struct DocketBuilder {
    base_dir: Option<PathBuf>,
}

impl DocketBuilder {
    pub fn new() -> Self {
        DocketBuilder { base_dir: None }
    }

    /// Persists collections under `base_dir`, creating it if needed.
    pub fn base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Opens the database handle.
    ///
    /// # Errors
    ///
    /// `StorageError` when the base directory cannot be created.
    pub fn open(self) -> DocketResult<Docket> {
        let backend: Arc<dyn StorageBackend> = match self.base_dir {
            Some(dir) => {
                log::info!("Opening file-backed store at {:?}", dir);
                Arc::new(FileBackend::open(dir)?)
            }
            None => {
                log::info!("Opening in-memory store");
                Arc::new(MemoryBackend::new())
            }
        };

        Ok(Docket {
            inner: Arc::new(DocketInner {
                store: DocumentStore::new(backend),
                result_cache: ResultCache::new(),
                closed: AtomicBool::new(false),
            }),
        })
    }
}
