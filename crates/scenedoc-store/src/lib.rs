//! Document store boundary
//!
//! `DocumentStore` is the seam between the synchronization core and any
//! concrete document database. Operations are keyed by logical collection;
//! documents carry a store-assigned `DocumentId` plus the caller-supplied
//! `uuid` identity, on which the store enforces no uniqueness.

use thiserror::Error;

use scenedoc_core::{Collection, Document, DocumentId, DocumentPatch, DocumentQuery, NewDocument};

pub mod memory;

pub use memory::MemoryStore;

/// Error type for store operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("backend failure: {0}")]
    Backend(String),

    #[error("serialization failure: {0}")]
    Serialization(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Asynchronous document database adapter
///
/// Every operation is a suspension point; the core issues them from a
/// single task with bounded fan-out and assumes no transaction boundary
/// across calls.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Find the first document matching the query, if any
    async fn find_one(
        &self,
        collection: Collection,
        query: &DocumentQuery,
    ) -> StoreResult<Option<Document>>;

    /// Find every document matching the query
    async fn find_many(
        &self,
        collection: Collection,
        query: &DocumentQuery,
    ) -> StoreResult<Vec<Document>>;

    /// Create a document under a store-assigned id
    async fn create(&self, collection: Collection, new: NewDocument) -> StoreResult<Document>;

    /// Apply a sparse patch; returns the updated document, or `None` if
    /// the id does not exist
    async fn update_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
        patch: DocumentPatch,
    ) -> StoreResult<Option<Document>>;

    /// Delete one document; returns it, or `None` if the id does not exist
    async fn delete_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> StoreResult<Option<Document>>;

    /// Delete a set of documents by id; returns the number actually removed
    async fn delete_many(&self, collection: Collection, ids: &[DocumentId]) -> StoreResult<u64>;
}

impl<T: DocumentStore> DocumentStore for &T {
    async fn find_one(
        &self,
        collection: Collection,
        query: &DocumentQuery,
    ) -> StoreResult<Option<Document>> {
        (**self).find_one(collection, query).await
    }

    async fn find_many(
        &self,
        collection: Collection,
        query: &DocumentQuery,
    ) -> StoreResult<Vec<Document>> {
        (**self).find_many(collection, query).await
    }

    async fn create(&self, collection: Collection, new: NewDocument) -> StoreResult<Document> {
        (**self).create(collection, new).await
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
        patch: DocumentPatch,
    ) -> StoreResult<Option<Document>> {
        (**self).update_by_id(collection, id, patch).await
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> StoreResult<Option<Document>> {
        (**self).delete_by_id(collection, id).await
    }

    async fn delete_many(&self, collection: Collection, ids: &[DocumentId]) -> StoreResult<u64> {
        (**self).delete_many(collection, ids).await
    }
}

impl<T: DocumentStore> DocumentStore for std::sync::Arc<T> {
    async fn find_one(
        &self,
        collection: Collection,
        query: &DocumentQuery,
    ) -> StoreResult<Option<Document>> {
        (**self).find_one(collection, query).await
    }

    async fn find_many(
        &self,
        collection: Collection,
        query: &DocumentQuery,
    ) -> StoreResult<Vec<Document>> {
        (**self).find_many(collection, query).await
    }

    async fn create(&self, collection: Collection, new: NewDocument) -> StoreResult<Document> {
        (**self).create(collection, new).await
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
        patch: DocumentPatch,
    ) -> StoreResult<Option<Document>> {
        (**self).update_by_id(collection, id, patch).await
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> StoreResult<Option<Document>> {
        (**self).delete_by_id(collection, id).await
    }

    async fn delete_many(&self, collection: Collection, ids: &[DocumentId]) -> StoreResult<u64> {
        (**self).delete_many(collection, ids).await
    }
}
