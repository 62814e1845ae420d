//! Core data model for scenedoc: scene-graph nodes, persisted documents,
//! and the discriminator/schema machinery shared by the store and the
//! synchronizer.

pub mod document;
pub mod kind;
pub mod node;
pub mod registry;

pub use document::{
    Collection, Document, DocumentId, DocumentPatch, DocumentQuery, NewDocument,
};
pub use kind::{GeometryKind, MaterialKind, NodeKind};
pub use node::{GeometryData, GeometryRef, MaterialRef, MaterialSlot, SceneNode};
pub use registry::{AttributeDef, DocumentSchema, ScalarKind, SchemaRegistry};
