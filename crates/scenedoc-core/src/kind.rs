//! Scene-graph discriminators
//!
//! Closed enums for the node, geometry and material type discriminators,
//! plus the material-compatibility table checked during synchronization.

use serde::{Deserialize, Serialize};

/// Kind of a scene-graph node (the document discriminator for objects)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Mesh,
    Group,
    Scene,
    Points,
    Line,
    LineSegments,
    LineLoop,
    Sprite,
    AmbientLight,
    DirectionalLight,
    PointLight,
    SpotLight,
}

/// Materials that may be attached to line-type nodes
const LINE_MATERIALS: &[MaterialKind] = &[MaterialKind::LineBasic, MaterialKind::LineDashed];

/// Materials that may be attached to point-cloud nodes
const POINT_MATERIALS: &[MaterialKind] = &[MaterialKind::Points, MaterialKind::Shader];

/// Materials that may be attached to sprite nodes
const SPRITE_MATERIALS: &[MaterialKind] = &[MaterialKind::Sprite];

impl NodeKind {
    /// Discriminator string stored in the document
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Mesh => "Mesh",
            NodeKind::Group => "Group",
            NodeKind::Scene => "Scene",
            NodeKind::Points => "Points",
            NodeKind::Line => "Line",
            NodeKind::LineSegments => "LineSegments",
            NodeKind::LineLoop => "LineLoop",
            NodeKind::Sprite => "Sprite",
            NodeKind::AmbientLight => "AmbientLight",
            NodeKind::DirectionalLight => "DirectionalLight",
            NodeKind::PointLight => "PointLight",
            NodeKind::SpotLight => "SpotLight",
        }
    }

    /// Material kinds this node kind accepts, or `None` for no restriction
    pub fn allowed_materials(&self) -> Option<&'static [MaterialKind]> {
        match self {
            NodeKind::Line | NodeKind::LineSegments | NodeKind::LineLoop => Some(LINE_MATERIALS),
            NodeKind::Points => Some(POINT_MATERIALS),
            NodeKind::Sprite => Some(SPRITE_MATERIALS),
            _ => None,
        }
    }

    /// Check a material against the compatibility table
    pub fn accepts_material(&self, material: MaterialKind) -> bool {
        match self.allowed_materials() {
            Some(allowed) => allowed.contains(&material),
            None => true,
        }
    }

    /// Whether nodes of this kind can carry a geometry at all
    pub fn carries_geometry(&self) -> bool {
        !matches!(
            self,
            NodeKind::Group
                | NodeKind::Scene
                | NodeKind::AmbientLight
                | NodeKind::DirectionalLight
                | NodeKind::PointLight
                | NodeKind::SpotLight
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a material document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    #[serde(rename = "MeshBasicMaterial")]
    MeshBasic,
    #[serde(rename = "MeshLambertMaterial")]
    MeshLambert,
    #[serde(rename = "MeshPhongMaterial")]
    MeshPhong,
    #[serde(rename = "MeshStandardMaterial")]
    MeshStandard,
    #[serde(rename = "MeshNormalMaterial")]
    MeshNormal,
    #[serde(rename = "MeshDepthMaterial")]
    MeshDepth,
    #[serde(rename = "LineBasicMaterial")]
    LineBasic,
    #[serde(rename = "LineDashedMaterial")]
    LineDashed,
    #[serde(rename = "PointsMaterial")]
    Points,
    #[serde(rename = "SpriteMaterial")]
    Sprite,
    #[serde(rename = "ShaderMaterial")]
    Shader,
}

impl MaterialKind {
    /// Discriminator string stored in the document
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialKind::MeshBasic => "MeshBasicMaterial",
            MaterialKind::MeshLambert => "MeshLambertMaterial",
            MaterialKind::MeshPhong => "MeshPhongMaterial",
            MaterialKind::MeshStandard => "MeshStandardMaterial",
            MaterialKind::MeshNormal => "MeshNormalMaterial",
            MaterialKind::MeshDepth => "MeshDepthMaterial",
            MaterialKind::LineBasic => "LineBasicMaterial",
            MaterialKind::LineDashed => "LineDashedMaterial",
            MaterialKind::Points => "PointsMaterial",
            MaterialKind::Sprite => "SpriteMaterial",
            MaterialKind::Shader => "ShaderMaterial",
        }
    }
}

impl std::fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a geometry document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    BufferGeometry,
    BoxGeometry,
    SphereGeometry,
    PlaneGeometry,
    CylinderGeometry,
    TorusGeometry,
}

impl GeometryKind {
    /// Discriminator string stored in the document
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::BufferGeometry => "BufferGeometry",
            GeometryKind::BoxGeometry => "BoxGeometry",
            GeometryKind::SphereGeometry => "SphereGeometry",
            GeometryKind::PlaneGeometry => "PlaneGeometry",
            GeometryKind::CylinderGeometry => "CylinderGeometry",
            GeometryKind::TorusGeometry => "TorusGeometry",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
