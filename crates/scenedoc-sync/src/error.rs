//! Error taxonomy of the synchronization core
//!
//! Only the conditions here abort a call. Malformed or incompatible nodes
//! are not errors: they are logged, skipped, and their siblings proceed.

use thiserror::Error;

use scenedoc_core::DocumentId;
use scenedoc_store::StoreError;

/// Error type for synchronization, reclamation and subtree operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// `save` was called with nothing to synchronize
    #[error("nothing to synchronize")]
    EmptyInput,

    /// A parent anchor was supplied but no such document exists.
    /// A synthetic parent is never created.
    #[error("parent document not found: {0}")]
    MissingParent(DocumentId),

    /// A bulk purge found a geometry or material referenced by an object
    /// outside the subtree being purged
    #[error("resource {0} is referenced outside the subtree")]
    SharedResource(DocumentId),

    /// A document store operation failed; the call aborts without rollback
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;
