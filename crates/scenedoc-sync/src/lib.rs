//! Scene-graph to document-store synchronization
//!
//! The synchronizer walks a caller-owned tree of scene nodes and mirrors
//! it into a typed document store under a merge strategy (`Add` never
//! removes database state, `Replace` also reclaims stale children). The
//! reclaimer deletes subtrees bottom-up with query-based reference
//! counting so shared geometries and materials survive until their last
//! referencing object is gone. The tree controller collects descendant id
//! sets and drives deletion over them.
//!
//! Concurrency model: single-task cooperative concurrency. Sibling nodes
//! are synchronized through a bounded fan-out on one event loop; every
//! store operation is a suspension point. There is no cross-call mutual
//! exclusion and no cancellation: callers must serialize synchronization
//! per scene or subtree, and a call runs to completion once started. A
//! store failure aborts the call without rolling back already-settled
//! writes; re-running an `Add` save with the same tree is idempotent.

pub mod context;
pub mod controller;
pub mod error;
pub mod reclaim;
pub mod synchronizer;

pub use context::{CacheKey, SyncContext};
pub use controller::{DescendantSet, PurgeReport, TreeController};
pub use error::{SyncError, SyncResult};
pub use reclaim::{ReclaimReport, Reclaimer};
pub use synchronizer::{DEFAULT_FAN_OUT, MergeStrategy, SaveOptions, Synchronizer};
