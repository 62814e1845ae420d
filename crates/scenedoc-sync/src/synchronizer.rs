//! Scene-graph synchronizer
//!
//! Walks a caller-owned tree of scene nodes and synchronizes it into the
//! document store under a merge strategy. Geometry and material documents
//! are resolved get-or-create by (kind, uuid); object documents are keyed
//! by (kind, uuid, parent), so re-parenting a node creates a new document
//! at the new location rather than moving the old one.

use std::collections::HashSet;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use scenedoc_core::{
    Collection, Document, DocumentId, DocumentPatch, DocumentQuery, GeometryRef, MaterialRef,
    NewDocument, SceneNode, SchemaRegistry,
};
use scenedoc_store::{DocumentStore, StoreError};

use crate::context::{CacheKey, SyncContext};
use crate::error::{SyncError, SyncResult};
use crate::reclaim::Reclaimer;

/// Default bound on concurrently in-flight sibling synchronizations
pub const DEFAULT_FAN_OUT: usize = 8;

/// Policy governing how a save merges into existing database state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MergeStrategy {
    /// Never removes existing children or references: new nodes are
    /// created, nodes matched by uuid are updated. Geometry and material
    /// references on an already-persisted object are left untouched.
    #[default]
    Add,
    /// After recursing, every existing database child absent (by uuid)
    /// from the incoming tree is reclaimed, and children/geometry/material
    /// are overwritten wholesale.
    Replace,
}

/// Options for a `save` call
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// Anchor the incoming nodes under an existing object document.
    /// The parent must already exist; it is never created implicitly.
    pub parent: Option<DocumentId>,
    pub merge: MergeStrategy,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parent(mut self, parent: DocumentId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn merge(mut self, merge: MergeStrategy) -> Self {
        self.merge = merge;
        self
    }
}

/// Synchronizes scene-graph trees into the document store.
///
/// Preconditions (not enforced): callers must serialize synchronization
/// per scene or subtree. Two concurrent `save` calls over overlapping
/// uuids, or a `save` racing a reclaim on overlapping documents, have
/// undefined outcome because reference counts are computed by live query.
/// There is no cancellation and no transaction boundary: a store failure
/// aborts the call but already-settled sibling writes stay in place.
/// Re-running an `Add` save with the same tree is idempotent.
pub struct Synchronizer<S> {
    store: S,
    registry: SchemaRegistry,
    fan_out: usize,
}

impl<S: DocumentStore> Synchronizer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            registry: SchemaRegistry::with_defaults(),
            fan_out: DEFAULT_FAN_OUT,
        }
    }

    /// Bound the number of sibling nodes synchronized concurrently
    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out.max(1);
        self
    }

    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Synchronize a batch of root nodes into the store.
    ///
    /// Returns the ids of the resulting top-level object documents.
    /// Fatal conditions: an empty batch (`EmptyInput`) and a missing
    /// parent anchor (`MissingParent`); both abort before any write.
    /// Malformed or material-incompatible nodes are logged and skipped
    /// without affecting their siblings.
    pub async fn save(
        &self,
        nodes: &[SceneNode],
        options: &SaveOptions,
    ) -> SyncResult<Vec<DocumentId>> {
        if nodes.is_empty() {
            return Err(SyncError::EmptyInput);
        }

        let parent = match options.parent {
            Some(id) => {
                let query = DocumentQuery::new().id(id);
                match self.store.find_one(Collection::Objects, &query).await? {
                    Some(document) => Some(document),
                    None => return Err(SyncError::MissingParent(id)),
                }
            }
            None => None,
        };

        // The identity cache lives exactly as long as this call; dropping
        // it on any exit path is the unconditional clear.
        let ctx = SyncContext::new();

        // Stale children go first under Replace, so a retained sibling's
        // shared geometry is still visible to the reference-counted
        // reclaim, and old and new children never coexist.
        if options.merge == MergeStrategy::Replace
            && let Some(parent) = &parent
        {
            self.reclaim_stale(parent.id, nodes).await?;
        }

        let parent_id = parent.as_ref().map(|document| document.id);
        let documents = self
            .sync_children(&ctx, nodes, parent_id, options.merge)
            .await?;
        let ids: Vec<DocumentId> = documents.iter().map(|document| document.id).collect();

        // Linking happens only after every child settled, so a partial
        // failure leaves the parent's children list at its prior value.
        if let Some(parent) = &parent {
            let children = match options.merge {
                MergeStrategy::Add => union_ids(&parent.children, &ids),
                MergeStrategy::Replace => ids.clone(),
            };
            self.store
                .update_by_id(
                    Collection::Objects,
                    parent.id,
                    DocumentPatch::new().children(children),
                )
                .await?
                .ok_or_else(|| vanished(parent.id))?;
        }

        debug!(
            "Synchronized {} root nodes into {} documents",
            nodes.len(),
            ids.len()
        );
        Ok(ids)
    }

    /// Synchronize a set of sibling nodes with bounded fan-out.
    /// Rejected nodes yield `None` and are filtered; store failures abort.
    async fn sync_children(
        &self,
        ctx: &SyncContext,
        nodes: &[SceneNode],
        parent: Option<DocumentId>,
        merge: MergeStrategy,
    ) -> SyncResult<Vec<Document>> {
        let results: Vec<Option<Document>> =
            stream::iter(nodes.iter().map(|node| self.sync_node(ctx, node, parent, merge)))
                .buffered(self.fan_out)
                .try_collect()
                .await?;
        Ok(results.into_iter().flatten().collect())
    }

    /// Synchronize one node and its subtree under the given parent.
    ///
    /// Returns `Ok(None)` when the node is rejected: a leaf whose geometry
    /// carries no vertex data, a material outside the node kind's
    /// compatibility set, or a payload the schema registry refuses.
    fn sync_node<'a>(
        &'a self,
        ctx: &'a SyncContext,
        node: &'a SceneNode,
        parent: Option<DocumentId>,
        merge: MergeStrategy,
    ) -> LocalBoxFuture<'a, SyncResult<Option<Document>>> {
        async move {
            if node.children.is_empty() && !node.has_renderable_geometry() {
                warn!(
                    "Rejected node {}: leaf geometry carries no position data",
                    node.uuid
                );
                return Ok(None);
            }
            for material in node.material.as_slice() {
                if !node.kind.accepts_material(material.kind) {
                    warn!(
                        "Rejected node {}: material {} not allowed on {}",
                        node.uuid, material.kind, node.kind
                    );
                    return Ok(None);
                }
                if !self
                    .registry
                    .validate(material.kind.as_str(), &material.attributes)
                {
                    warn!(
                        "Rejected node {}: attributes failed validation for {}",
                        node.uuid, material.kind
                    );
                    return Ok(None);
                }
            }
            if let Some(geometry) = &node.geometry
                && !self
                    .registry
                    .validate(geometry.kind.as_str(), &geometry.data.extra)
            {
                warn!(
                    "Rejected node {}: geometry parameters failed validation for {}",
                    node.uuid, geometry.kind
                );
                return Ok(None);
            }

            let geometry_id = match &node.geometry {
                Some(geometry) => Some(self.resolve_geometry(ctx, geometry).await?),
                None => None,
            };
            let mut material_ids = Vec::with_capacity(node.material.as_slice().len());
            for material in node.material.as_slice() {
                material_ids.push(self.resolve_material(ctx, material).await?);
            }

            let key = CacheKey::object(node.uuid, parent);
            let lock = ctx.key_lock(&key);
            let guard = lock.lock().await;
            let existing = match ctx.get(&key) {
                Some(document) => Some(document),
                None => {
                    let query = DocumentQuery::new()
                        .uuid(node.uuid)
                        .kind(node.kind.as_str())
                        .parent(parent);
                    self.store.find_one(Collection::Objects, &query).await?
                }
            };

            let document = match existing {
                Some(document) => {
                    ctx.insert(key, &document);
                    drop(guard);
                    self.update_existing(ctx, node, key, document, merge, geometry_id, material_ids)
                        .await?
                }
                None => {
                    // Two-phase create: the document is written with an
                    // empty children list, children recurse under its id,
                    // and the list is linked afterwards.
                    let new = NewDocument::new(node.uuid, node.kind.as_str())
                        .name(node.name.clone())
                        .parent(parent)
                        .geometry(geometry_id)
                        .material(material_ids);
                    let created = self.store.create(Collection::Objects, new).await?;
                    debug!(
                        "Created object document {} (uuid {}, kind {})",
                        created.id, created.uuid, node.kind
                    );
                    ctx.insert(key, &created);
                    drop(guard);

                    let children = self
                        .sync_children(ctx, &node.children, Some(created.id), merge)
                        .await?;
                    let child_ids: Vec<DocumentId> =
                        children.iter().map(|child| child.id).collect();
                    let linked = self
                        .store
                        .update_by_id(
                            Collection::Objects,
                            created.id,
                            DocumentPatch::new().children(child_ids),
                        )
                        .await?
                        .ok_or_else(|| vanished(created.id))?;
                    ctx.insert(key, &linked);
                    linked
                }
            };
            Ok(Some(document))
        }
        .boxed_local()
    }

    /// Merge a node into its already-persisted document
    #[allow(clippy::too_many_arguments)]
    async fn update_existing(
        &self,
        ctx: &SyncContext,
        node: &SceneNode,
        key: CacheKey,
        document: Document,
        merge: MergeStrategy,
        geometry_id: Option<DocumentId>,
        material_ids: Vec<DocumentId>,
    ) -> SyncResult<Document> {
        match merge {
            MergeStrategy::Add => {
                let children = self
                    .sync_children(ctx, &node.children, Some(document.id), merge)
                    .await?;
                let child_ids: Vec<DocumentId> = children.iter().map(|child| child.id).collect();
                let merged = union_ids(&document.children, &child_ids);
                if merged == document.children {
                    return Ok(document);
                }
                let updated = self
                    .store
                    .update_by_id(
                        Collection::Objects,
                        document.id,
                        DocumentPatch::new().children(merged),
                    )
                    .await?
                    .ok_or_else(|| vanished(document.id))?;
                ctx.insert(key, &updated);
                Ok(updated)
            }
            MergeStrategy::Replace => {
                self.reclaim_stale(document.id, &node.children).await?;
                let children = self
                    .sync_children(ctx, &node.children, Some(document.id), merge)
                    .await?;
                let child_ids: Vec<DocumentId> = children.iter().map(|child| child.id).collect();
                let updated = self
                    .store
                    .update_by_id(
                        Collection::Objects,
                        document.id,
                        DocumentPatch::new()
                            .name(node.name.clone())
                            .children(child_ids)
                            .geometry(geometry_id)
                            .material(material_ids),
                    )
                    .await?
                    .ok_or_else(|| vanished(document.id))?;
                ctx.insert(key, &updated);
                Ok(updated)
            }
        }
    }

    /// Reclaim every persisted child of `parent_id` whose uuid is absent
    /// from the incoming node set. Runs before the new children are
    /// written, and sequentially, so each reclaim's reference counts
    /// observe the previous one's deletions.
    async fn reclaim_stale(&self, parent_id: DocumentId, incoming: &[SceneNode]) -> SyncResult<()> {
        let query = DocumentQuery::new().parent(Some(parent_id));
        let existing = self.store.find_many(Collection::Objects, &query).await?;
        let keep: HashSet<Uuid> = incoming.iter().map(|node| node.uuid).collect();

        let reclaimer = Reclaimer::new(&self.store);
        for stale in existing.iter().filter(|document| !keep.contains(&document.uuid)) {
            debug!("Reclaiming stale child {} (uuid {})", stale.id, stale.uuid);
            reclaimer.reclaim(stale).await?;
        }
        Ok(())
    }

    /// Get-or-create the geometry document for a node, keyed by
    /// (kind, uuid). The per-key lock plus the identity cache keep a uuid
    /// from being resolved more than once per run.
    async fn resolve_geometry(
        &self,
        ctx: &SyncContext,
        geometry: &GeometryRef,
    ) -> SyncResult<DocumentId> {
        let key = CacheKey::resource(Collection::Geometries, geometry.uuid);
        let lock = ctx.key_lock(&key);
        let _guard = lock.lock().await;
        if let Some(document) = ctx.get(&key) {
            debug!("Identity cache hit for geometry {}", geometry.uuid);
            return Ok(document.id);
        }

        let payload = serde_json::to_value(&geometry.data)
            .map_err(|error| StoreError::Serialization(error.to_string()))?;
        let query = DocumentQuery::new()
            .uuid(geometry.uuid)
            .kind(geometry.kind.as_str());
        let document = match self.store.find_one(Collection::Geometries, &query).await? {
            Some(found) => self
                .store
                .update_by_id(
                    Collection::Geometries,
                    found.id,
                    DocumentPatch::new().data(payload),
                )
                .await?
                .ok_or_else(|| vanished(found.id))?,
            None => {
                self.store
                    .create(
                        Collection::Geometries,
                        NewDocument::new(geometry.uuid, geometry.kind.as_str()).data(payload),
                    )
                    .await?
            }
        };
        ctx.insert(key, &document);
        Ok(document.id)
    }

    /// Get-or-create a material document, keyed by (kind, uuid)
    async fn resolve_material(
        &self,
        ctx: &SyncContext,
        material: &MaterialRef,
    ) -> SyncResult<DocumentId> {
        let key = CacheKey::resource(Collection::Materials, material.uuid);
        let lock = ctx.key_lock(&key);
        let _guard = lock.lock().await;
        if let Some(document) = ctx.get(&key) {
            debug!("Identity cache hit for material {}", material.uuid);
            return Ok(document.id);
        }

        let query = DocumentQuery::new()
            .uuid(material.uuid)
            .kind(material.kind.as_str());
        let document = match self.store.find_one(Collection::Materials, &query).await? {
            Some(found) => self
                .store
                .update_by_id(
                    Collection::Materials,
                    found.id,
                    DocumentPatch::new().data(material.attributes.clone()),
                )
                .await?
                .ok_or_else(|| vanished(found.id))?,
            None => {
                self.store
                    .create(
                        Collection::Materials,
                        NewDocument::new(material.uuid, material.kind.as_str())
                            .data(material.attributes.clone()),
                    )
                    .await?
            }
        };
        ctx.insert(key, &document);
        Ok(document.id)
    }
}

/// Append the incoming ids that are not already present, preserving order
fn union_ids(existing: &[DocumentId], incoming: &[DocumentId]) -> Vec<DocumentId> {
    let mut merged = existing.to_vec();
    for id in incoming {
        if !merged.contains(id) {
            merged.push(*id);
        }
    }
    merged
}

/// A document read earlier in the call disappeared under a concurrent
/// writer; surfaces as a store failure (see the preconditions on
/// `Synchronizer`).
fn vanished(id: DocumentId) -> SyncError {
    SyncError::Store(StoreError::Backend(format!(
        "document {id} disappeared during update"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use pollster::block_on;
    use scenedoc_store::MemoryStore;
    use serde_json::json;

    use scenedoc_core::{
        GeometryData, GeometryKind, GeometryRef, MaterialKind, MaterialRef, NodeKind,
    };

    fn triangle(uuid: Uuid) -> GeometryRef {
        GeometryRef::new(
            GeometryKind::BufferGeometry,
            GeometryData::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y]),
        )
        .with_uuid(uuid)
    }

    fn basic_material(uuid: Uuid) -> MaterialRef {
        MaterialRef::new(MaterialKind::MeshBasic)
            .with_uuid(uuid)
            .with_attributes(json!({"color": 0xff0000}))
    }

    fn mesh(uuid: Uuid, geometry_uuid: Uuid, material_uuid: Uuid) -> SceneNode {
        SceneNode::new(NodeKind::Mesh)
            .with_uuid(uuid)
            .with_geometry(triangle(geometry_uuid))
            .with_material(basic_material(material_uuid))
    }

    fn find_by_uuid(store: &MemoryStore, collection: Collection, uuid: Uuid) -> Option<Document> {
        block_on(store.find_one(collection, &DocumentQuery::new().uuid(uuid))).unwrap()
    }

    #[test]
    fn test_basic_add_scenario() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());

        let (a, g1, m1) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let ids = block_on(synchronizer.save(&[mesh(a, g1, m1)], &SaveOptions::new())).unwrap();
        assert_eq!(ids.len(), 1);

        assert_eq!(store.len(Collection::Objects), 1);
        assert_eq!(store.len(Collection::Geometries), 1);
        assert_eq!(store.len(Collection::Materials), 1);

        let object = store.get(Collection::Objects, ids[0]).unwrap();
        let geometry = find_by_uuid(&store, Collection::Geometries, g1).unwrap();
        let material = find_by_uuid(&store, Collection::Materials, m1).unwrap();
        assert_eq!(object.uuid, a);
        assert_eq!(object.kind, "Mesh");
        assert_eq!(object.geometry, Some(geometry.id));
        assert_eq!(object.material, vec![material.id]);
        assert_eq!(object.parent, None);
        assert_eq!(material.data["color"], 0xff0000);
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());

        let node = mesh(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let first = block_on(synchronizer.save(&[node.clone()], &SaveOptions::new())).unwrap();
        let second = block_on(synchronizer.save(&[node], &SaveOptions::new())).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(Collection::Objects), 1);
        assert_eq!(store.len(Collection::Geometries), 1);
        assert_eq!(store.len(Collection::Materials), 1);
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let synchronizer = Synchronizer::new(MemoryStore::new());
        let result = block_on(synchronizer.save(&[], &SaveOptions::new()));
        assert_eq!(result, Err(SyncError::EmptyInput));
    }

    #[test]
    fn test_missing_parent_is_fatal_and_writes_nothing() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());

        let node = mesh(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let missing = DocumentId::new();
        let result =
            block_on(synchronizer.save(&[node], &SaveOptions::new().parent(missing)));
        assert_eq!(result, Err(SyncError::MissingParent(missing)));

        assert!(store.is_empty(Collection::Objects));
        assert!(store.is_empty(Collection::Geometries));
        assert!(store.is_empty(Collection::Materials));
    }

    #[test]
    fn test_rejected_leaf_does_not_abort_siblings() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());

        let malformed = SceneNode::new(NodeKind::Mesh)
            .with_geometry(GeometryRef::new(GeometryKind::BufferGeometry, GeometryData::default()));
        let nodes = vec![
            mesh(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()),
            malformed,
            mesh(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()),
        ];

        let ids = block_on(synchronizer.save(&nodes, &SaveOptions::new())).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(store.len(Collection::Objects), 2);
        // Nothing persisted for the malformed leaf
        assert_eq!(store.len(Collection::Geometries), 2);
    }

    #[test]
    fn test_incompatible_material_rejects_node() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());

        let line = SceneNode::new(NodeKind::Line)
            .with_geometry(triangle(Uuid::new_v4()))
            .with_material(MaterialRef::new(MaterialKind::MeshBasic));
        let ids = block_on(synchronizer.save(
            &[line, mesh(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())],
            &SaveOptions::new(),
        ))
        .unwrap();

        assert_eq!(ids.len(), 1);
        assert_eq!(store.len(Collection::Objects), 1);
    }

    #[test]
    fn test_invalid_material_attributes_reject_node() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());

        let node = SceneNode::new(NodeKind::Mesh)
            .with_geometry(triangle(Uuid::new_v4()))
            .with_material(
                MaterialRef::new(MaterialKind::MeshBasic)
                    .with_attributes(json!({"opacity": "half"})),
            );
        let ids = block_on(synchronizer.save(
            &[node, mesh(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())],
            &SaveOptions::new(),
        ))
        .unwrap();

        assert_eq!(ids.len(), 1);
        assert_eq!(store.len(Collection::Materials), 1);
    }

    #[test]
    fn test_nested_tree_linkage() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());

        let child_uuid = Uuid::new_v4();
        let tree = SceneNode::new(NodeKind::Group)
            .with_name("root")
            .with_child(mesh(child_uuid, Uuid::new_v4(), Uuid::new_v4()));

        let ids = block_on(synchronizer.save(&[tree], &SaveOptions::new())).unwrap();
        let group = store.get(Collection::Objects, ids[0]).unwrap();
        let child = find_by_uuid(&store, Collection::Objects, child_uuid).unwrap();

        assert_eq!(group.children, vec![child.id]);
        assert_eq!(child.parent, Some(group.id));
    }

    #[test]
    fn test_shared_geometry_not_duplicated_within_one_save() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());

        let shared = Uuid::new_v4();
        let nodes: Vec<SceneNode> = (0..4)
            .map(|_| mesh(Uuid::new_v4(), shared, Uuid::new_v4()))
            .collect();
        block_on(synchronizer.save(&nodes, &SaveOptions::new())).unwrap();

        assert_eq!(store.len(Collection::Geometries), 1);
        let geometry = find_by_uuid(&store, Collection::Geometries, shared).unwrap();
        for id in block_on(store.find_many(Collection::Objects, &DocumentQuery::new()))
            .unwrap()
            .iter()
            .map(|object| object.geometry)
        {
            assert_eq!(id, Some(geometry.id));
        }
    }

    #[test]
    fn test_replace_removes_stale_child() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());

        let (c1, g1, m1) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let (c2, g2, m2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let group = SceneNode::new(NodeKind::Group)
            .with_child(mesh(c1, g1, m1))
            .with_child(mesh(c2, g2, m2));
        let parent_id = block_on(synchronizer.save(&[group], &SaveOptions::new())).unwrap()[0];
        let c1_id = find_by_uuid(&store, Collection::Objects, c1).unwrap().id;

        let ids = block_on(synchronizer.save(
            &[mesh(c1, g1, m1).with_name("updated")],
            &SaveOptions::new()
                .parent(parent_id)
                .merge(MergeStrategy::Replace),
        ))
        .unwrap();

        assert_eq!(ids, vec![c1_id]);
        let parent = store.get(Collection::Objects, parent_id).unwrap();
        assert_eq!(parent.children, vec![c1_id]);

        // c2 and its exclusively owned resources are gone
        assert!(find_by_uuid(&store, Collection::Objects, c2).is_none());
        assert!(find_by_uuid(&store, Collection::Geometries, g2).is_none());
        assert!(find_by_uuid(&store, Collection::Materials, m2).is_none());
        assert_eq!(store.len(Collection::Geometries), 1);
    }

    #[test]
    fn test_replace_converges_to_second_tree() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());

        let parent_id = block_on(
            synchronizer.save(&[SceneNode::new(NodeKind::Group)], &SaveOptions::new()),
        )
        .unwrap()[0];

        let (keep, keep_geometry, keep_material) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let t1 = vec![
            mesh(keep, keep_geometry, keep_material),
            mesh(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()),
        ];
        let t2 = vec![
            mesh(keep, keep_geometry, keep_material),
            mesh(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()),
        ];

        let options = SaveOptions::new()
            .parent(parent_id)
            .merge(MergeStrategy::Replace);
        block_on(synchronizer.save(&t1, &options)).unwrap();
        let ids = block_on(synchronizer.save(&t2, &options)).unwrap();

        let parent = store.get(Collection::Objects, parent_id).unwrap();
        assert_eq!(parent.children, ids);
        assert_eq!(store.len(Collection::Objects), 3); // parent + two children
        assert_eq!(store.len(Collection::Geometries), 2);
        assert_eq!(store.len(Collection::Materials), 2);
    }

    #[test]
    fn test_add_does_not_overwrite_existing_references() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());

        let (a, g1) = (Uuid::new_v4(), Uuid::new_v4());
        let ids =
            block_on(synchronizer.save(&[mesh(a, g1, Uuid::new_v4())], &SaveOptions::new()))
                .unwrap();
        let original = store.get(Collection::Objects, ids[0]).unwrap();

        // Same node uuid, different geometry: Add leaves the reference alone
        block_on(synchronizer.save(
            &[mesh(a, Uuid::new_v4(), Uuid::new_v4())],
            &SaveOptions::new(),
        ))
        .unwrap();
        let after = store.get(Collection::Objects, ids[0]).unwrap();
        assert_eq!(after.geometry, original.geometry);
        assert_eq!(after.material, original.material);
    }

    #[test]
    fn test_reparent_creates_duplicate_document() {
        let store = MemoryStore::new();
        let synchronizer = Synchronizer::new(store.clone());

        let node = mesh(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        block_on(synchronizer.save(&[node.clone()], &SaveOptions::new())).unwrap();

        let parent_id = block_on(
            synchronizer.save(&[SceneNode::new(NodeKind::Group)], &SaveOptions::new()),
        )
        .unwrap()[0];
        block_on(synchronizer.save(&[node.clone()], &SaveOptions::new().parent(parent_id)))
            .unwrap();

        // Identity is (kind, uuid, parent): two documents now share the uuid
        let matches = block_on(store.find_many(
            Collection::Objects,
            &DocumentQuery::new().uuid(node.uuid),
        ))
        .unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_union_ids_preserves_order() {
        let (a, b, c) = (DocumentId::new(), DocumentId::new(), DocumentId::new());
        assert_eq!(union_ids(&[a, b], &[b, c]), vec![a, b, c]);
        assert_eq!(union_ids(&[], &[a]), vec![a]);
        assert_eq!(union_ids(&[a], &[]), vec![a]);
    }
}
