//! Schema registry
//!
//! Maps a discriminator string to the attribute shape of its document
//! payload. The synchronizer consumes this purely as an opaque
//! "validate payload of kind T" capability.

use std::collections::HashMap;

use serde_json::Value;

/// Scalar codec of a single document attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    F32,
    I32,
    Bool,
    Str,
    Vec2,
    Vec3,
    /// Hex integer or `[r, g, b]` triple
    Color,
    Quat,
    Mat4,
    /// Unchecked passthrough
    Json,
}

impl ScalarKind {
    /// Check a JSON value against this scalar shape
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ScalarKind::F32 => value.is_number(),
            ScalarKind::I32 => value.is_i64() || value.is_u64(),
            ScalarKind::Bool => value.is_boolean(),
            ScalarKind::Str => value.is_string(),
            ScalarKind::Vec2 => is_number_array(value, 2),
            ScalarKind::Vec3 => is_number_array(value, 3),
            ScalarKind::Color => value.is_u64() || is_number_array(value, 3),
            ScalarKind::Quat => is_number_array(value, 4),
            ScalarKind::Mat4 => is_number_array(value, 16),
            ScalarKind::Json => true,
        }
    }
}

fn is_number_array(value: &Value, len: usize) -> bool {
    match value.as_array() {
        Some(items) => items.len() == len && items.iter().all(Value::is_number),
        None => false,
    }
}

/// A named attribute within a document shape
#[derive(Debug, Clone)]
pub struct AttributeDef {
    pub name: &'static str,
    pub kind: ScalarKind,
}

impl AttributeDef {
    pub fn new(name: &'static str, kind: ScalarKind) -> Self {
        Self { name, kind }
    }
}

/// Document shape for one discriminator
#[derive(Debug, Clone, Default)]
pub struct DocumentSchema {
    pub attributes: Vec<AttributeDef>,
}

impl DocumentSchema {
    pub fn new(attributes: Vec<AttributeDef>) -> Self {
        Self { attributes }
    }

    /// Validate a payload object against the shape.
    ///
    /// Attributes not named in the schema pass through unchecked
    /// (open-world); named attributes must match their scalar kind.
    /// Null and non-object payloads are always accepted.
    pub fn validate(&self, payload: &Value) -> bool {
        let Some(object) = payload.as_object() else {
            return true;
        };
        for attribute in &self.attributes {
            if let Some(value) = object.get(attribute.name)
                && !attribute.kind.matches(value)
            {
                return false;
            }
        }
        true
    }
}

/// Registry of document shapes keyed by discriminator string
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, DocumentSchema>,
}

impl SchemaRegistry {
    /// An empty registry accepting every payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the built-in material and geometry shapes
    pub fn with_defaults() -> Self {
        use ScalarKind::*;

        let mut registry = Self::new();

        let common_material = vec![
            AttributeDef::new("color", Color),
            AttributeDef::new("opacity", F32),
            AttributeDef::new("transparent", Bool),
            AttributeDef::new("side", I32),
            AttributeDef::new("visible", Bool),
        ];
        for kind in [
            "MeshBasicMaterial",
            "MeshLambertMaterial",
            "LineBasicMaterial",
            "LineDashedMaterial",
            "SpriteMaterial",
        ] {
            registry.register(kind, DocumentSchema::new(common_material.clone()));
        }

        registry.register(
            "MeshPhongMaterial",
            DocumentSchema::new(
                common_material
                    .iter()
                    .cloned()
                    .chain([
                        AttributeDef::new("specular", Color),
                        AttributeDef::new("shininess", F32),
                    ])
                    .collect(),
            ),
        );
        registry.register(
            "MeshStandardMaterial",
            DocumentSchema::new(
                common_material
                    .iter()
                    .cloned()
                    .chain([
                        AttributeDef::new("roughness", F32),
                        AttributeDef::new("metalness", F32),
                    ])
                    .collect(),
            ),
        );
        registry.register(
            "PointsMaterial",
            DocumentSchema::new(
                common_material
                    .iter()
                    .cloned()
                    .chain([
                        AttributeDef::new("size", F32),
                        AttributeDef::new("sizeAttenuation", Bool),
                    ])
                    .collect(),
            ),
        );

        registry.register(
            "BoxGeometry",
            DocumentSchema::new(vec![
                AttributeDef::new("width", F32),
                AttributeDef::new("height", F32),
                AttributeDef::new("depth", F32),
            ]),
        );
        registry.register(
            "SphereGeometry",
            DocumentSchema::new(vec![
                AttributeDef::new("radius", F32),
                AttributeDef::new("widthSegments", I32),
                AttributeDef::new("heightSegments", I32),
            ]),
        );
        registry.register(
            "CylinderGeometry",
            DocumentSchema::new(vec![
                AttributeDef::new("radiusTop", F32),
                AttributeDef::new("radiusBottom", F32),
                AttributeDef::new("height", F32),
            ]),
        );

        registry
    }

    /// Register (or replace) the shape for a discriminator
    pub fn register(&mut self, kind: impl Into<String>, schema: DocumentSchema) {
        self.schemas.insert(kind.into(), schema);
    }

    pub fn get(&self, kind: &str) -> Option<&DocumentSchema> {
        self.schemas.get(kind)
    }

    /// Validate a payload for the given discriminator.
    /// Unregistered discriminators are accepted as-is.
    pub fn validate(&self, kind: &str, payload: &Value) -> bool {
        match self.schemas.get(kind) {
            Some(schema) => schema.validate(payload),
            None => true,
        }
    }
}
