//! In-memory document store
//!
//! Reference implementation of `DocumentStore` over hash maps. Query
//! evaluation is a linear filter; good enough for tests and for small
//! embedded deployments. Clones share the underlying maps.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use scenedoc_core::{Collection, Document, DocumentId, DocumentPatch, DocumentQuery, NewDocument};

use crate::{DocumentStore, StoreResult};

#[derive(Default)]
struct Collections {
    objects: HashMap<DocumentId, Document>,
    geometries: HashMap<DocumentId, Document>,
    materials: HashMap<DocumentId, Document>,
}

impl Collections {
    fn map(&self, collection: Collection) -> &HashMap<DocumentId, Document> {
        match collection {
            Collection::Objects => &self.objects,
            Collection::Geometries => &self.geometries,
            Collection::Materials => &self.materials,
        }
    }

    fn map_mut(&mut self, collection: Collection) -> &mut HashMap<DocumentId, Document> {
        match collection {
            Collection::Objects => &mut self.objects,
            Collection::Geometries => &mut self.geometries,
            Collection::Materials => &mut self.materials,
        }
    }
}

/// Thread-safe in-memory document store
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection
    pub fn len(&self, collection: Collection) -> usize {
        self.inner.read().map(collection).len()
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    /// Fetch a document by id without going through a query
    pub fn get(&self, collection: Collection, id: DocumentId) -> Option<Document> {
        self.inner.read().map(collection).get(&id).cloned()
    }
}

impl DocumentStore for MemoryStore {
    async fn find_one(
        &self,
        collection: Collection,
        query: &DocumentQuery,
    ) -> StoreResult<Option<Document>> {
        let inner = self.inner.read();
        Ok(inner
            .map(collection)
            .values()
            .find(|document| query.matches(document))
            .cloned())
    }

    async fn find_many(
        &self,
        collection: Collection,
        query: &DocumentQuery,
    ) -> StoreResult<Vec<Document>> {
        let inner = self.inner.read();
        Ok(inner
            .map(collection)
            .values()
            .filter(|document| query.matches(document))
            .cloned()
            .collect())
    }

    async fn create(&self, collection: Collection, new: NewDocument) -> StoreResult<Document> {
        let document = new.into_document(DocumentId::new());
        self.inner
            .write()
            .map_mut(collection)
            .insert(document.id, document.clone());
        Ok(document)
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
        patch: DocumentPatch,
    ) -> StoreResult<Option<Document>> {
        let mut inner = self.inner.write();
        Ok(inner.map_mut(collection).get_mut(&id).map(|document| {
            patch.apply(document);
            document.clone()
        }))
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> StoreResult<Option<Document>> {
        Ok(self.inner.write().map_mut(collection).remove(&id))
    }

    async fn delete_many(&self, collection: Collection, ids: &[DocumentId]) -> StoreResult<u64> {
        let mut inner = self.inner.write();
        let map = inner.map_mut(collection);
        let mut deleted = 0;
        for id in ids {
            if map.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
