//! Transient scene-graph input model
//!
//! `SceneNode` trees are caller-owned and read-only to the synchronizer;
//! nothing here touches the store.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::kind::{GeometryKind, MaterialKind, NodeKind};

/// A node of the in-memory scene graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    /// Stable caller identity, preserved across saves
    pub uuid: Uuid,
    pub kind: NodeKind,
    pub name: String,
    /// Geometry owned by this node, if any
    pub geometry: Option<GeometryRef>,
    /// Zero, one or many materials
    pub material: MaterialSlot,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create an empty node of the given kind with a fresh uuid
    pub fn new(kind: NodeKind) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind,
            name: String::new(),
            geometry: None,
            material: MaterialSlot::None,
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_geometry(mut self, geometry: GeometryRef) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_material(mut self, material: MaterialRef) -> Self {
        self.material = MaterialSlot::Single(material);
        self
    }

    pub fn with_materials(mut self, materials: Vec<MaterialRef>) -> Self {
        self.material = MaterialSlot::Multiple(materials);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// A leaf node that declares a geometry but carries no vertex data
    /// is malformed and gets rejected during synchronization.
    pub fn has_renderable_geometry(&self) -> bool {
        match &self.geometry {
            Some(geometry) => !geometry.data.is_empty(),
            None => true,
        }
    }
}

/// Material attachment of a node, normalized to a slice before resolution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum MaterialSlot {
    #[default]
    None,
    Single(MaterialRef),
    Multiple(Vec<MaterialRef>),
}

impl MaterialSlot {
    /// Normalize to an array view (the store always sees material lists)
    pub fn as_slice(&self) -> &[MaterialRef] {
        match self {
            MaterialSlot::None => &[],
            MaterialSlot::Single(material) => std::slice::from_ref(material),
            MaterialSlot::Multiple(materials) => materials,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

/// Geometry carried by a scene node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryRef {
    pub uuid: Uuid,
    pub kind: GeometryKind,
    pub data: GeometryData,
}

impl GeometryRef {
    pub fn new(kind: GeometryKind, data: GeometryData) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind,
            data,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }
}

/// Vertex payload of a geometry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryData {
    /// Vertex positions; empty means the geometry is not renderable
    pub positions: Vec<Vec3>,
    /// Per-vertex normals (may be empty)
    pub normals: Vec<Vec3>,
    /// Texture coordinates (may be empty)
    pub uvs: Vec<Vec2>,
    /// Kind-specific parameters (radius, segment counts, ...)
    pub extra: Value,
}

impl GeometryData {
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            normals: Vec::new(),
            uvs: Vec::new(),
            extra: Value::Null,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Material carried by a scene node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRef {
    pub uuid: Uuid,
    pub kind: MaterialKind,
    /// Kind-specific attributes, validated against the schema registry
    pub attributes: Value,
}

impl MaterialRef {
    pub fn new(kind: MaterialKind) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind,
            attributes: Value::Null,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.attributes = attributes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_slot_normalization() {
        let slot = MaterialSlot::None;
        assert!(slot.as_slice().is_empty());

        let slot = MaterialSlot::Single(MaterialRef::new(MaterialKind::MeshBasic));
        assert_eq!(slot.as_slice().len(), 1);

        let slot = MaterialSlot::Multiple(vec![
            MaterialRef::new(MaterialKind::MeshBasic),
            MaterialRef::new(MaterialKind::MeshPhong),
        ]);
        assert_eq!(slot.as_slice().len(), 2);
    }

    #[test]
    fn test_empty_geometry_is_not_renderable() {
        let node = SceneNode::new(NodeKind::Mesh)
            .with_geometry(GeometryRef::new(GeometryKind::BufferGeometry, GeometryData::default()));
        assert!(!node.has_renderable_geometry());

        let node = SceneNode::new(NodeKind::Mesh).with_geometry(GeometryRef::new(
            GeometryKind::BufferGeometry,
            GeometryData::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y]),
        ));
        assert!(node.has_renderable_geometry());
    }

    #[test]
    fn test_group_without_geometry_is_renderable() {
        let node = SceneNode::new(NodeKind::Group);
        assert!(node.has_renderable_geometry());
    }
}
