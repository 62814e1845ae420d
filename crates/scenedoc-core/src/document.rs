//! Persisted document model
//!
//! The document store keeps three logical collections (objects, geometries,
//! materials) of flat documents linked by store-assigned ids. Queries are
//! conjunctive filters over the linkage fields; patches are sparse updates.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Store-assigned stable identifier of a persisted document
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Mint a fresh id (store side)
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Logical collection within the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Objects,
    Geometries,
    Materials,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Objects => "Objects3D",
            Collection::Geometries => "Geometries",
            Collection::Materials => "Materials",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted document
///
/// Geometry and material documents use only `id`, `uuid`, `kind`, `name`
/// and `data`; the linkage fields stay empty for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Caller identity copied from the scene node or sub-resource.
    /// The store enforces no uniqueness on this field.
    pub uuid: Uuid,
    /// Discriminator selecting the concrete shape within the collection
    pub kind: String,
    pub name: String,
    pub parent: Option<DocumentId>,
    pub children: Vec<DocumentId>,
    pub geometry: Option<DocumentId>,
    pub material: Vec<DocumentId>,
    /// Discriminator-specific payload
    pub data: Value,
}

/// Creation payload for a document (everything but the id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub uuid: Uuid,
    pub kind: String,
    pub name: String,
    pub parent: Option<DocumentId>,
    pub children: Vec<DocumentId>,
    pub geometry: Option<DocumentId>,
    pub material: Vec<DocumentId>,
    pub data: Value,
}

impl NewDocument {
    pub fn new(uuid: Uuid, kind: impl Into<String>) -> Self {
        Self {
            uuid,
            kind: kind.into(),
            name: String::new(),
            parent: None,
            children: Vec::new(),
            geometry: None,
            material: Vec::new(),
            data: Value::Null,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn parent(mut self, parent: Option<DocumentId>) -> Self {
        self.parent = parent;
        self
    }

    pub fn geometry(mut self, geometry: Option<DocumentId>) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn material(mut self, material: Vec<DocumentId>) -> Self {
        self.material = material;
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Materialize into a document under a store-assigned id
    pub fn into_document(self, id: DocumentId) -> Document {
        Document {
            id,
            uuid: self.uuid,
            kind: self.kind,
            name: self.name,
            parent: self.parent,
            children: self.children,
            geometry: self.geometry,
            material: self.material,
            data: self.data,
        }
    }
}

/// Sparse update applied to an existing document; unset fields are untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentPatch {
    pub name: Option<String>,
    /// `Some(None)` clears the parent link
    pub parent: Option<Option<DocumentId>>,
    pub children: Option<Vec<DocumentId>>,
    /// `Some(None)` clears the geometry link
    pub geometry: Option<Option<DocumentId>>,
    pub material: Option<Vec<DocumentId>>,
    pub data: Option<Value>,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn parent(mut self, parent: Option<DocumentId>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn children(mut self, children: Vec<DocumentId>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn geometry(mut self, geometry: Option<DocumentId>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn material(mut self, material: Vec<DocumentId>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Apply the patch in place
    pub fn apply(&self, document: &mut Document) {
        if let Some(name) = &self.name {
            document.name = name.clone();
        }
        if let Some(parent) = self.parent {
            document.parent = parent;
        }
        if let Some(children) = &self.children {
            document.children = children.clone();
        }
        if let Some(geometry) = self.geometry {
            document.geometry = geometry;
        }
        if let Some(material) = &self.material {
            document.material = material.clone();
        }
        if let Some(data) = &self.data {
            document.data = data.clone();
        }
    }
}

/// Conjunctive filter over documents; unset fields match anything
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentQuery {
    pub id: Option<DocumentId>,
    pub uuid: Option<Uuid>,
    pub kind: Option<String>,
    /// `Some(None)` matches root documents (parent is null)
    pub parent: Option<Option<DocumentId>>,
    pub geometry: Option<DocumentId>,
    /// Matches documents whose material list contains the id
    pub material_contains: Option<DocumentId>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: DocumentId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn parent(mut self, parent: Option<DocumentId>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn geometry(mut self, geometry: DocumentId) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn material_contains(mut self, material: DocumentId) -> Self {
        self.material_contains = Some(material);
        self
    }

    /// Evaluate the filter against a document
    pub fn matches(&self, document: &Document) -> bool {
        if let Some(id) = self.id
            && document.id != id
        {
            return false;
        }
        if let Some(uuid) = self.uuid
            && document.uuid != uuid
        {
            return false;
        }
        if let Some(kind) = &self.kind
            && document.kind != *kind
        {
            return false;
        }
        if let Some(parent) = self.parent
            && document.parent != parent
        {
            return false;
        }
        if let Some(geometry) = self.geometry
            && document.geometry != Some(geometry)
        {
            return false;
        }
        if let Some(material) = self.material_contains
            && !document.material.contains(&material)
        {
            return false;
        }
        true
    }
}
