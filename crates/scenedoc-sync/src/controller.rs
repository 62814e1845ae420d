//! Object-tree controller
//!
//! Computes the full descendant id set of a persisted subtree and drives
//! deletion over it. The reference-counted reclaim is the canonical
//! deletion path; the bulk purge exists for fully-private subtrees only
//! and verifies that precondition before deleting anything.

use std::collections::HashSet;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, try_join_all};
use tracing::debug;

use scenedoc_core::{Collection, DocumentId, DocumentQuery};
use scenedoc_store::DocumentStore;

use crate::error::{SyncError, SyncResult};
use crate::reclaim::{ReclaimReport, Reclaimer};

/// Ids of everything reachable from a subtree root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescendantSet {
    pub objects: Vec<DocumentId>,
    pub geometries: Vec<DocumentId>,
    pub materials: Vec<DocumentId>,
}

impl DescendantSet {
    /// Fold another set into this one
    pub fn absorb(&mut self, other: DescendantSet) {
        self.objects.extend(other.objects);
        self.geometries.extend(other.geometries);
        self.materials.extend(other.materials);
    }

    /// Drop duplicate ids, preserving first-seen order
    pub fn dedup(&mut self) {
        dedup_ids(&mut self.objects);
        dedup_ids(&mut self.geometries);
        dedup_ids(&mut self.materials);
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.geometries.is_empty() && self.materials.is_empty()
    }

    pub fn total(&self) -> usize {
        self.objects.len() + self.geometries.len() + self.materials.len()
    }
}

fn dedup_ids(ids: &mut Vec<DocumentId>) {
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));
}

/// Counts of documents removed by a bulk purge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub objects: u64,
    pub geometries: u64,
    pub materials: u64,
}

/// Read-and-delete operations over persisted subtrees
pub struct TreeController<S> {
    store: S,
}

impl<S: DocumentStore> TreeController<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Collect every descendant object id below `root`, plus every
    /// distinct geometry and material id those descendants reference.
    ///
    /// With `recursive` false only the direct children are visited.
    /// Each level issues one children query and recurses into all
    /// children concurrently, merging after every branch settled.
    pub fn collect_descendants(
        &self,
        root: DocumentId,
        recursive: bool,
    ) -> LocalBoxFuture<'_, SyncResult<DescendantSet>> {
        async move {
            let query = DocumentQuery::new().parent(Some(root));
            let children = self.store.find_many(Collection::Objects, &query).await?;

            let mut set = DescendantSet::default();
            for child in &children {
                set.objects.push(child.id);
                if let Some(geometry) = child.geometry {
                    set.geometries.push(geometry);
                }
                set.materials.extend(child.material.iter().copied());
            }

            if recursive {
                let branches = try_join_all(
                    children
                        .iter()
                        .map(|child| self.collect_descendants(child.id, true)),
                )
                .await?;
                for branch in branches {
                    set.absorb(branch);
                }
            }

            set.dedup();
            Ok(set)
        }
        .boxed_local()
    }

    /// Delete the subtree rooted at `root` through the reference-counted
    /// reclaimer. Geometries and materials shared with objects outside
    /// the subtree survive. Deleting a missing root is a no-op.
    pub async fn delete_subtree(&self, root: DocumentId) -> SyncResult<ReclaimReport> {
        Reclaimer::new(&self.store).reclaim_by_id(root).await
    }

    /// Bulk-delete the subtree rooted at `root` with three delete-many
    /// calls, skipping per-document reference counting.
    ///
    /// Valid only for fully-private subtrees: if any collected geometry
    /// or material is referenced by an object outside the subtree, the
    /// purge fails with `SharedResource` before deleting anything.
    pub async fn purge_subtree(&self, root: DocumentId) -> SyncResult<PurgeReport> {
        let root_query = DocumentQuery::new().id(root);
        let Some(root_document) = self.store.find_one(Collection::Objects, &root_query).await?
        else {
            debug!("Nothing to purge: {} not found", root);
            return Ok(PurgeReport::default());
        };

        let mut set = self.collect_descendants(root, true).await?;
        set.objects.push(root_document.id);
        if let Some(geometry) = root_document.geometry {
            set.geometries.push(geometry);
        }
        set.materials.extend(root_document.material.iter().copied());
        set.dedup();

        self.ensure_private(&set).await?;

        let objects = self
            .store
            .delete_many(Collection::Objects, &set.objects)
            .await?;
        let geometries = self
            .store
            .delete_many(Collection::Geometries, &set.geometries)
            .await?;
        let materials = self
            .store
            .delete_many(Collection::Materials, &set.materials)
            .await?;
        debug!(
            "Purged subtree {}: {} objects, {} geometries, {} materials",
            root, objects, geometries, materials
        );
        Ok(PurgeReport {
            objects,
            geometries,
            materials,
        })
    }

    /// Verify that no geometry or material in the set is referenced by an
    /// object outside the set
    async fn ensure_private(&self, set: &DescendantSet) -> SyncResult<()> {
        let object_ids: HashSet<DocumentId> = set.objects.iter().copied().collect();

        for geometry in &set.geometries {
            let query = DocumentQuery::new().geometry(*geometry);
            let referencing = self.store.find_many(Collection::Objects, &query).await?;
            if referencing
                .iter()
                .any(|document| !object_ids.contains(&document.id))
            {
                return Err(SyncError::SharedResource(*geometry));
            }
        }
        for material in &set.materials {
            let query = DocumentQuery::new().material_contains(*material);
            let referencing = self.store.find_many(Collection::Objects, &query).await?;
            if referencing
                .iter()
                .any(|document| !object_ids.contains(&document.id))
            {
                return Err(SyncError::SharedResource(*material));
            }
        }
        Ok(())
    }
}
