//! The host-side scene model.
//!
//! A scene is a list of named objects, each owning an indexed polygon mesh,
//! plus a scene-wide material list. Faces refer to materials by name.

use std::path::PathBuf;

use crate::geometry::{Triangle, Vector2, Vector3};
use crate::TriangleMesh;

pub type Color = [f32; 4];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub objects: Vec<Object>,
    pub materials: Vec<Material>,
}

impl Scene {
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    pub name: Option<String>,
    pub mesh: PolygonMesh,
}

/// An indexed polygon mesh.
///
/// Positions, normals and texture coordinates live in separate tables and
/// each face indexes into all three independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonMesh {
    pub vertices: Vec<Vector3>,
    pub normals: Vec<Vector3>,
    pub texcoords: Vec<Vector2>,
    pub faces: Vec<Face>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub vertices: Vec<u32>,
    pub normals: Vec<u32>,
    pub texcoords: Vec<u32>,
    /// Material tags, the first one wins. Empty means the default material.
    pub materials: Vec<String>,
    pub smoothing_group: u8,
}

impl Default for Face {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            materials: Vec::new(),
            smoothing_group: 1,
        }
    }
}

impl Face {
    pub fn material(&self) -> Option<&str> {
        self.materials.first().map(String::as_str)
    }
}

impl PolygonMesh {
    /// Every directed edge of every face, as vertex index pairs in winding
    /// order.
    pub fn half_edges(&self) -> Vec<(u32, u32)> {
        let mut edges = Vec::new();
        for face in &self.faces {
            let n = face.vertices.len();
            for i in 0..n {
                edges.push((face.vertices[i], face.vertices[(i + 1) % n]));
            }
        }
        edges
    }
}

impl TriangleMesh for PolygonMesh {
    /// Polygons are fanned around their first vertex. Faces with indices
    /// outside the vertex table are skipped.
    fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().flat_map(move |face| {
            let points: Option<Vec<Vector3>> = face
                .vertices
                .iter()
                .map(|&i| self.vertices.get(i as usize).copied())
                .collect();
            let points = points.unwrap_or_default();
            (1..points.len().saturating_sub(1))
                .map(move |i| Triangle {
                    p0: points[0],
                    p1: points[i],
                    p2: points[i + 1],
                })
                .collect::<Vec<_>>()
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub emission: Color,
    pub shininess: f32,
    pub maps: TextureMaps,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ambient: [0.2, 0.2, 0.2, 1.0],
            diffuse: [0.8, 0.8, 0.8, 1.0],
            specular: [0.0, 0.0, 0.0, 1.0],
            emission: [0.0, 0.0, 0.0, 1.0],
            shininess: 0.0,
            maps: TextureMaps::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureMaps {
    pub diffuse: Option<PathBuf>,
    pub alpha: Option<PathBuf>,
}
