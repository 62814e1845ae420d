//! Reference-counted orphan reclamation
//!
//! Removes a persisted object document and everything exclusively owned
//! by it, post-order: children first, then geometry and materials that
//! the reclaimed document is the last object to reference, then the
//! document itself. Reference counts are computed by live query against
//! the store, not by a maintained counter field.

use std::collections::HashSet;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use tracing::debug;

use scenedoc_core::{Collection, Document, DocumentId, DocumentQuery};
use scenedoc_store::DocumentStore;

use crate::error::SyncResult;

/// Counts of documents removed by a reclaim, for observability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclaimReport {
    pub objects: usize,
    pub geometries: usize,
    pub materials: usize,
}

impl ReclaimReport {
    /// Fold another report into this one
    pub fn absorb(&mut self, other: ReclaimReport) {
        self.objects += other.objects;
        self.geometries += other.geometries;
        self.materials += other.materials;
    }

    pub fn total(&self) -> usize {
        self.objects + self.geometries + self.materials
    }
}

/// Recursively reclaims subtrees with query-based reference counting
pub struct Reclaimer<S> {
    store: S,
}

impl<S: DocumentStore> Reclaimer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reclaim by id. Reclaiming an id that no longer exists is a no-op,
    /// which keeps retries of partially failed deletions safe.
    pub async fn reclaim_by_id(&self, id: DocumentId) -> SyncResult<ReclaimReport> {
        let query = DocumentQuery::new().id(id);
        match self.store.find_one(Collection::Objects, &query).await? {
            Some(document) => self.reclaim(&document).await,
            None => {
                debug!("Nothing to reclaim: {} not found", id);
                Ok(ReclaimReport::default())
            }
        }
    }

    /// Reclaim a previously persisted object document and everything
    /// exclusively owned by it.
    ///
    /// Children are reclaimed before their parent, and one after another:
    /// each child's deletion must be visible to the next child's
    /// reference-count queries, or two siblings sharing a geometry would
    /// each observe the other's reference and leak it.
    pub fn reclaim<'a>(&'a self, document: &'a Document) -> LocalBoxFuture<'a, SyncResult<ReclaimReport>> {
        async move {
            let mut report = ReclaimReport::default();

            let children_query = DocumentQuery::new().parent(Some(document.id));
            let children = self
                .store
                .find_many(Collection::Objects, &children_query)
                .await?;
            for child in &children {
                report.absorb(self.reclaim(child).await?);
            }

            if let Some(geometry) = document.geometry
                && self.is_last_reference(DocumentQuery::new().geometry(geometry)).await?
            {
                if self
                    .store
                    .delete_by_id(Collection::Geometries, geometry)
                    .await?
                    .is_some()
                {
                    debug!("Reclaimed geometry {}", geometry);
                    report.geometries += 1;
                }
            }

            let mut seen = HashSet::new();
            for material in &document.material {
                if !seen.insert(*material) {
                    continue;
                }
                if self
                    .is_last_reference(DocumentQuery::new().material_contains(*material))
                    .await?
                    && self
                        .store
                        .delete_by_id(Collection::Materials, *material)
                        .await?
                        .is_some()
                {
                    debug!("Reclaimed material {}", material);
                    report.materials += 1;
                }
            }

            if self
                .store
                .delete_by_id(Collection::Objects, document.id)
                .await?
                .is_some()
            {
                report.objects += 1;
            }
            debug!(
                "Reclaimed object {} (uuid {}): {} documents total",
                document.id,
                document.uuid,
                report.total()
            );
            Ok(report)
        }
        .boxed_local()
    }

    /// True when at most one object still references the resource.
    /// The document being reclaimed is expected to be that one reference;
    /// a count of zero means the link was already dangling.
    async fn is_last_reference(&self, query: DocumentQuery) -> SyncResult<bool> {
        let referencing = self.store.find_many(Collection::Objects, &query).await?;
        Ok(referencing.len() <= 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use pollster::block_on;
    use scenedoc_store::MemoryStore;
    use uuid::Uuid;

    use scenedoc_core::{
        GeometryData, GeometryKind, GeometryRef, MaterialKind, MaterialRef, NodeKind, SceneNode,
    };

    use crate::synchronizer::{SaveOptions, Synchronizer};

    fn triangle(uuid: Uuid) -> GeometryRef {
        GeometryRef::new(
            GeometryKind::BufferGeometry,
            GeometryData::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y]),
        )
        .with_uuid(uuid)
    }

    fn mesh(geometry: GeometryRef, material: MaterialRef) -> SceneNode {
        SceneNode::new(NodeKind::Mesh)
            .with_geometry(geometry)
            .with_material(material)
    }

    #[test]
    fn test_shared_geometry_survives_partial_delete() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());
        let reclaimer = Reclaimer::new(store.clone());

        let shared_geometry = Uuid::new_v4();
        let a = mesh(
            triangle(shared_geometry),
            MaterialRef::new(MaterialKind::MeshBasic),
        );
        let b = mesh(
            triangle(shared_geometry),
            MaterialRef::new(MaterialKind::MeshBasic),
        );

        let ids = block_on(synchronizer.save(&[a], &SaveOptions::new())).unwrap();
        let a_id = ids[0];
        let b_id = block_on(synchronizer.save(&[b], &SaveOptions::new())).unwrap()[0];

        assert_eq!(store.len(Collection::Geometries), 1);

        // Reclaiming "a" leaves the shared geometry and "b" untouched
        let report = block_on(reclaimer.reclaim_by_id(a_id)).unwrap();
        assert_eq!(report.objects, 1);
        assert_eq!(report.geometries, 0);
        assert_eq!(store.len(Collection::Geometries), 1);
        assert!(store.get(Collection::Objects, b_id).is_some());

        // Reclaiming the last referencing object deletes the geometry
        let report = block_on(reclaimer.reclaim_by_id(b_id)).unwrap();
        assert_eq!(report.geometries, 1);
        assert!(store.is_empty(Collection::Geometries));
        assert!(store.is_empty(Collection::Objects));
    }

    #[test]
    fn test_shared_material_survives_until_last_reference() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());
        let reclaimer = Reclaimer::new(store.clone());

        let shared_material = Uuid::new_v4();
        let material = || MaterialRef::new(MaterialKind::MeshPhong).with_uuid(shared_material);
        let a = mesh(triangle(Uuid::new_v4()), material());
        let b = mesh(triangle(Uuid::new_v4()), material());

        let ids = block_on(synchronizer.save(&[a, b], &SaveOptions::new())).unwrap();
        assert_eq!(store.len(Collection::Materials), 1);

        block_on(reclaimer.reclaim_by_id(ids[0])).unwrap();
        assert_eq!(store.len(Collection::Materials), 1);

        block_on(reclaimer.reclaim_by_id(ids[1])).unwrap();
        assert!(store.is_empty(Collection::Materials));
    }

    #[test]
    fn test_reclaim_is_post_order_over_subtree() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());
        let reclaimer = Reclaimer::new(store.clone());

        let tree = SceneNode::new(NodeKind::Group).with_child(
            SceneNode::new(NodeKind::Group)
                .with_child(mesh(
                    triangle(Uuid::new_v4()),
                    MaterialRef::new(MaterialKind::MeshBasic),
                ))
                .with_child(mesh(
                    triangle(Uuid::new_v4()),
                    MaterialRef::new(MaterialKind::MeshBasic),
                )),
        );

        let ids = block_on(synchronizer.save(&[tree], &SaveOptions::new())).unwrap();
        assert_eq!(store.len(Collection::Objects), 4);

        let report = block_on(reclaimer.reclaim_by_id(ids[0])).unwrap();
        assert_eq!(report.objects, 4);
        assert_eq!(report.geometries, 2);
        assert_eq!(report.materials, 2);
        assert!(store.is_empty(Collection::Objects));
        assert!(store.is_empty(Collection::Geometries));
        assert!(store.is_empty(Collection::Materials));
    }

    #[test]
    fn test_siblings_sharing_geometry_do_not_leak_it() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());
        let reclaimer = Reclaimer::new(store.clone());

        let shared_geometry = Uuid::new_v4();
        let tree = SceneNode::new(NodeKind::Group)
            .with_child(mesh(
                triangle(shared_geometry),
                MaterialRef::new(MaterialKind::MeshBasic),
            ))
            .with_child(mesh(
                triangle(shared_geometry),
                MaterialRef::new(MaterialKind::MeshBasic),
            ));

        let ids = block_on(synchronizer.save(&[tree], &SaveOptions::new())).unwrap();
        assert_eq!(store.len(Collection::Geometries), 1);

        // Both referencing siblings live in the reclaimed subtree; the
        // shared geometry must go with them.
        block_on(reclaimer.reclaim_by_id(ids[0])).unwrap();
        assert!(store.is_empty(Collection::Geometries));
        assert!(store.is_empty(Collection::Objects));
    }

    #[test]
    fn test_reclaim_missing_id_is_a_noop() {
        let store = MemoryStore::new();
        let reclaimer = Reclaimer::new(store);
        let report = block_on(reclaimer.reclaim_by_id(DocumentId::new())).unwrap();
        assert_eq!(report, ReclaimReport::default());
    }
}
