//! Per-run identity cache
//!
//! One `SyncContext` lives for exactly one `save` call and is threaded
//! through the recursion as a parameter. Dropping it at the end of the
//! call is the unconditional cache clear: identity can never leak across
//! independent save calls, and independent calls on one synchronizer
//! cannot corrupt each other.

use std::collections::HashMap;
use std::sync::Arc;

use futures::lock::Mutex as AsyncMutex;
use parking_lot::Mutex;
use uuid::Uuid;

use scenedoc_core::{Collection, Document, DocumentId};

/// Cache key of one resolved document within a run.
///
/// Objects are keyed by (uuid, parent) because object identity in the
/// store is (kind, uuid, parent); geometries and materials are keyed by
/// uuid within their collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub collection: Collection,
    pub uuid: Uuid,
    pub parent: Option<DocumentId>,
}

impl CacheKey {
    /// Key for a geometry or material document
    pub fn resource(collection: Collection, uuid: Uuid) -> Self {
        Self {
            collection,
            uuid,
            parent: None,
        }
    }

    /// Key for an object document under a given parent
    pub fn object(uuid: Uuid, parent: Option<DocumentId>) -> Self {
        Self {
            collection: Collection::Objects,
            uuid,
            parent,
        }
    }
}

/// Identity cache for one synchronization run
#[derive(Default)]
pub struct SyncContext {
    entries: Mutex<HashMap<CacheKey, Document>>,
    locks: Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>,
}

impl SyncContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-known persisted document for a key, if resolved this run
    pub fn get(&self, key: &CacheKey) -> Option<Document> {
        self.entries.lock().get(key).cloned()
    }

    /// Record the result of a create/read/update for a key
    pub fn insert(&self, key: CacheKey, document: &Document) {
        self.entries.lock().insert(key, document.clone());
    }

    /// Per-key resolution lock. Holding it while resolving a key keeps
    /// concurrent siblings that share a uuid from racing past the cache
    /// and creating duplicate documents.
    pub fn key_lock(&self, key: &CacheKey) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .entry(*key)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
