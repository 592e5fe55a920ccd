pub mod backend;
mod codec;
mod collection_cache;
pub mod file_backend;

pub use backend::{MemoryBackend, StorageBackend};
pub use file_backend::FileBackend;

use crate::common::{epoch_millis_or_zero, LockRegistry, DOC_CREATED, DOC_ID, DOC_MODIFIED, OP_SET};
use crate::document::{Document, Value};
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::filter::Filter;
use crate::id::DocId;
use collection_cache::CollectionCache;
use std::sync::Arc;

/// The result of an `insert_one` operation.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertResult {
    /// The `_id` of the inserted document: the caller-supplied value when
    /// present, a freshly generated id otherwise.
    pub inserted_id: Value,
    pub acknowledged: bool,
}

/// The result of an `insert_many` operation.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertManyResult {
    pub inserted_count: usize,
    pub inserted_ids: Vec<Value>,
    pub acknowledged: bool,
}

/// The result of an `update_one` operation.
///
/// No match is not an error: it yields `matched_count == 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    pub matched_count: usize,
    pub modified_count: usize,
    pub acknowledged: bool,
}

/// The result of a `delete_one` operation.
///
/// No match is not an error: it yields `deleted_count == 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteResult {
    pub deleted_count: usize,
    pub acknowledged: bool,
}

/// A parsed update specification.
///
/// `$set` is the only supported operator; richer operators would be added
/// as new variants rather than ad hoc field copying.
#[derive(Debug, Clone)]
pub enum UpdateSpec {
    /// Merge the partial document into the matched document, field by field.
    Set(Document),
}

impl UpdateSpec {
    /// Parses an update document of the form `{$set: partial}`.
    ///
    /// # Errors
    ///
    /// `ValidationError` when the update document is empty, carries an
    /// operator other than `$set`, `$set` is not a document, or the partial
    /// tries to rewrite `_id`.
    pub fn parse(update: &Document) -> DocketResult<UpdateSpec> {
        if update.len() != 1 {
            log::error!("Update must carry exactly one operator: {:?}", update);
            return Err(DocketError::new(
                "update must carry exactly one $set operator",
                ErrorKind::ValidationError,
            ));
        }
        let (op, operand) = update.iter().next().ok_or_else(|| {
            DocketError::new("empty update document", ErrorKind::ValidationError)
        })?;
        if op != OP_SET {
            log::error!("Unsupported update operator: {}", op);
            return Err(DocketError::new(
                &format!("unsupported update operator: {}", op),
                ErrorKind::ValidationError,
            ));
        }
        match operand {
            Value::Document(partial) => {
                // identifiers are immutable post-insert
                if partial.contains_key(DOC_ID) {
                    log::error!("$set attempts to rewrite {}: {:?}", DOC_ID, partial);
                    return Err(DocketError::new(
                        &format!("{} cannot be modified by $set", DOC_ID),
                        ErrorKind::ValidationError,
                    ));
                }
                Ok(UpdateSpec::Set(partial.clone()))
            }
            other => {
                log::error!("$set operand is not a document: {}", other);
                Err(DocketError::new(
                    "$set requires a document operand",
                    ErrorKind::ValidationError,
                ))
            }
        }
    }
}

/// Persists named collections of documents and evaluates filters over them.
///
/// Each collection is an insertion-ordered sequence of documents mirrored by
/// an in-memory cache entry that is lazily filled on first read and
/// replaced on every completed write. The backing medium and the mirror
/// are never observably out of step: both are updated inside the same
/// per-collection write-lock critical section, and a failed write leaves
/// both untouched.
///
/// Reads on a collection run concurrently with each other; a mutating
/// operation holds that collection's write lock from the read-for-mutation
/// until the mirror has been replaced, so readers observe either the fully
/// pre-write or fully post-write state.
///
/// # Examples
///
/// ```rust
/// use docket::doc;
/// use docket::filter::Filter;
/// use docket::store::{DocumentStore, MemoryBackend};
/// use std::sync::Arc;
///
/// let store = DocumentStore::new(Arc::new(MemoryBackend::new()));
/// store.insert_one("designs", doc! { name: "Skyline", views: 120 })?;
/// let hits = store.find("designs", &Filter::parse(&doc! { views: { "$gte": 100 } })?)?;
/// assert_eq!(hits.len(), 1);
/// # Ok::<(), docket::errors::DocketError>(())
/// ```
pub struct DocumentStore {
    backend: Arc<dyn StorageBackend>,
    mirror: CollectionCache,
    locks: LockRegistry,
}

impl DocumentStore {
    /// Creates a store over the given backing medium.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        DocumentStore {
            backend,
            mirror: CollectionCache::new(),
            locks: LockRegistry::new(),
        }
    }

    /// Returns all documents matching the filter, in insertion order.
    ///
    /// The empty filter matches everything.
    pub fn find(&self, collection: &str, filter: &Filter) -> DocketResult<Vec<Document>> {
        let handle = self.locks.get_lock(collection);
        let _guard = handle.read();
        let docs = self.load_collection(collection)?;
        Ok(docs
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect())
    }

    /// Returns the first document matching the filter, in insertion order.
    pub fn find_one(&self, collection: &str, filter: &Filter) -> DocketResult<Option<Document>> {
        let handle = self.locks.get_lock(collection);
        let _guard = handle.read();
        let docs = self.load_collection(collection)?;
        Ok(docs.iter().find(|doc| filter.matches(doc)).cloned())
    }

    /// Counts documents matching the filter; `None` counts the whole
    /// collection.
    pub fn count_documents(
        &self,
        collection: &str,
        filter: Option<&Filter>,
    ) -> DocketResult<usize> {
        let handle = self.locks.get_lock(collection);
        let _guard = handle.read();
        let docs = self.load_collection(collection)?;
        match filter {
            None => Ok(docs.len()),
            Some(filter) => Ok(docs.iter().filter(|doc| filter.matches(doc)).count()),
        }
    }

    /// Inserts one document.
    ///
    /// Assigns an `_id` when absent, stamps `created_at` when absent, always
    /// stamps `updated_at`, and persists the collection synchronously before
    /// returning.
    pub fn insert_one(&self, collection: &str, doc: Document) -> DocketResult<InsertResult> {
        let handle = self.locks.get_lock(collection);
        let _guard = handle.write();

        let current = self.load_collection(collection)?;
        let mut docs: Vec<Document> = current.as_ref().clone();

        let mut doc = doc;
        let inserted_id = stamp_new_document(&mut doc)?;
        ensure_unique_id(collection, &docs, &inserted_id)?;
        docs.push(doc);

        self.commit(collection, docs)?;
        log::debug!("Inserted document {} into '{}'", inserted_id, collection);
        Ok(InsertResult {
            inserted_id,
            acknowledged: true,
        })
    }

    /// Inserts a batch of documents with a single persisted write.
    pub fn insert_many(
        &self,
        collection: &str,
        batch: Vec<Document>,
    ) -> DocketResult<InsertManyResult> {
        let handle = self.locks.get_lock(collection);
        let _guard = handle.write();

        let current = self.load_collection(collection)?;
        let mut docs: Vec<Document> = current.as_ref().clone();

        let mut inserted_ids = Vec::with_capacity(batch.len());
        for mut doc in batch {
            let id = stamp_new_document(&mut doc)?;
            // checked against the accumulating vector, so duplicates within
            // the batch are caught as well
            ensure_unique_id(collection, &docs, &id)?;
            inserted_ids.push(id);
            docs.push(doc);
        }

        self.commit(collection, docs)?;
        log::debug!(
            "Inserted {} documents into '{}'",
            inserted_ids.len(),
            collection
        );
        Ok(InsertManyResult {
            inserted_count: inserted_ids.len(),
            inserted_ids,
            acknowledged: true,
        })
    }

    /// Updates the first document (insertion order) matching the filter by
    /// merging the `$set` partial into it and refreshing `updated_at`.
    ///
    /// Single-match semantics: at most one document is touched. No match
    /// yields `matched_count == 0` without error and writes nothing.
    pub fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Document,
    ) -> DocketResult<UpdateResult> {
        let spec = UpdateSpec::parse(update)?;

        let handle = self.locks.get_lock(collection);
        let _guard = handle.write();

        let current = self.load_collection(collection)?;
        let position = current.iter().position(|doc| filter.matches(doc));

        let Some(position) = position else {
            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
                acknowledged: true,
            });
        };

        let mut docs: Vec<Document> = current.as_ref().clone();
        let UpdateSpec::Set(partial) = &spec;
        docs[position].merge(partial)?;
        docs[position].put(DOC_MODIFIED, epoch_millis_or_zero())?;

        self.commit(collection, docs)?;
        Ok(UpdateResult {
            matched_count: 1,
            modified_count: 1,
            acknowledged: true,
        })
    }

    /// Removes the first document (insertion order) matching the filter.
    ///
    /// No match yields `deleted_count == 0` without error and writes
    /// nothing.
    pub fn delete_one(&self, collection: &str, filter: &Filter) -> DocketResult<DeleteResult> {
        let handle = self.locks.get_lock(collection);
        let _guard = handle.write();

        let current = self.load_collection(collection)?;
        let position = current.iter().position(|doc| filter.matches(doc));

        let Some(position) = position else {
            return Ok(DeleteResult {
                deleted_count: 0,
                acknowledged: true,
            });
        };

        let mut docs: Vec<Document> = current.as_ref().clone();
        docs.remove(position);

        self.commit(collection, docs)?;
        Ok(DeleteResult {
            deleted_count: 1,
            acknowledged: true,
        })
    }

    /// Removes a collection and its mirror entry entirely.
    pub fn drop_collection(&self, collection: &str) -> DocketResult<()> {
        let handle = self.locks.get_lock(collection);
        let _guard = handle.write();
        self.backend.remove_collection(collection)?;
        self.mirror.invalidate(collection);
        Ok(())
    }

    /// Lists the names of all persisted collections.
    pub fn list_collections(&self) -> DocketResult<Vec<String>> {
        self.backend.collection_names()
    }

    /// Drops every mirror entry; used on database close.
    pub(crate) fn clear_mirror(&self) {
        self.mirror.clear();
    }

    /// Serves the collection from the mirror, loading from the backing
    /// medium on a miss. Caller must hold the collection's lock.
    fn load_collection(&self, collection: &str) -> DocketResult<Arc<Vec<Document>>> {
        if let Some(docs) = self.mirror.get(collection) {
            log::debug!("Mirror hit for collection '{}'", collection);
            return Ok(docs);
        }
        log::debug!("Mirror miss for collection '{}', loading", collection);
        let docs = Arc::new(self.backend.read_collection(collection)?.unwrap_or_default());
        self.mirror.put(collection, docs.clone());
        Ok(docs)
    }

    // Backing medium first, mirror second; a failed write leaves the mirror
    // untouched so both stay on the pre-write state.
    fn commit(&self, collection: &str, docs: Vec<Document>) -> DocketResult<()> {
        self.backend.write_collection(collection, &docs)?;
        self.mirror.put(collection, Arc::new(docs));
        Ok(())
    }
}

/// Identifiers are unique within a collection; a caller-supplied duplicate
/// fails the insert before anything is written.
fn ensure_unique_id(collection: &str, docs: &[Document], id: &Value) -> DocketResult<()> {
    if docs.iter().any(|existing| existing.id() == Some(id)) {
        log::error!("Duplicate {} {} in collection '{}'", DOC_ID, id, collection);
        return Err(DocketError::new(
            &format!("duplicate {} in collection '{}': {}", DOC_ID, collection, id),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

/// Assigns `_id` when absent and stamps timestamps; returns the `_id`.
fn stamp_new_document(doc: &mut Document) -> DocketResult<Value> {
    let id = match doc.id() {
        Some(existing) => existing.clone(),
        None => {
            let id: Value = DocId::new().into();
            doc.put(DOC_ID, id.clone())?;
            id
        }
    };
    let now = epoch_millis_or_zero();
    if doc.get(DOC_CREATED).is_none() {
        doc.put(DOC_CREATED, now)?;
    }
    doc.put(DOC_MODIFIED, now)?;
    Ok(id)
}
