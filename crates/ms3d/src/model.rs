//! The flat, file-level MS3D model.
//!
//! Everything is stored in global arrays and cross-referenced by index:
//! triangles index vertices, groups index triangles and materials, vertices
//! index joints. The binary and text codecs both produce and consume this
//! model.

use milkshake_mesh::{Vector2, Vector3};

use crate::error::{Error, Result};

pub const MAX_VERTICES: usize = 65534;
pub const MAX_TRIANGLES: usize = 65534;
pub const MAX_GROUPS: usize = 255;
pub const MAX_MATERIALS: usize = 128;
pub const MAX_JOINTS: usize = 128;

pub type Color = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Selected 1, hidden 2, second selection 4, dirty 8.
    pub flags: u8,
    pub position: Vector3,
    /// Joint index, -1 when unbound.
    pub bone: i8,
    /// Number of triangles using this vertex. Derived by
    /// [`Model::update_ref_counts`]; writers recompute it.
    pub ref_count: u8,
}

impl Vertex {
    pub fn new(position: Vector3) -> Self {
        Self {
            flags: 0,
            position,
            bone: -1,
            ref_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub flags: u16,
    pub vertices: [u16; 3],
    /// Per-corner normals. MS3D does not share normals between triangles.
    pub normals: [Vector3; 3],
    pub uvs: [Vector2; 3],
    /// 1 - 32.
    pub smoothing_group: u8,
    /// Owning group, back-filled from the group lists.
    pub group: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub flags: u8,
    pub name: String,
    pub triangles: Vec<u16>,
    /// Material index, -1 for none.
    pub material: i8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub emissive: Color,
    /// 0.0 - 128.0
    pub shininess: f32,
    /// 0.0 - 1.0
    pub transparency: f32,
    pub mode: i8,
    pub texture: String,
    pub alpha_map: String,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: [0.0; 4],
            diffuse: [0.0; 4],
            specular: [0.0; 4],
            emissive: [0.0; 4],
            shininess: 0.0,
            transparency: 1.0,
            mode: 0,
            texture: String::new(),
            alpha_map: String::new(),
        }
    }
}

/// A joint keyframe: a time in seconds and a rotation or position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub value: Vector3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub flags: u8,
    pub name: String,
    pub parent: String,
    pub rotation: Vector3,
    pub position: Vector3,
    pub rotation_keys: Vec<Keyframe>,
    pub position_keys: Vec<Keyframe>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub fps: f32,
    pub current_time: f32,
    pub total_frames: u32,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            fps: 24.0,
            current_time: 1.0,
            total_frames: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Index of the group, material or joint the comment belongs to.
    pub index: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comments {
    /// The top-level sub-version that introduced the comment block.
    pub sub_version: u32,
    pub groups: Vec<Comment>,
    pub materials: Vec<Comment>,
    pub joints: Vec<Comment>,
    pub model: Vec<Comment>,
}

impl Default for Comments {
    fn default() -> Self {
        Self {
            sub_version: 1,
            groups: Vec::new(),
            materials: Vec::new(),
            joints: Vec::new(),
            model: Vec::new(),
        }
    }
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
            && self.materials.is_empty()
            && self.joints.is_empty()
            && self.model.is_empty()
    }
}

/// Extra skinning data for one vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexExtra {
    /// Additional joint indices, -1 when unused.
    pub bones: [i8; 3],
    /// Weights as stored, in percent.
    pub weights: [u8; 3],
    /// Opaque values; the first exists since sub-version 2, the second since 3.
    pub extra: [u32; 2],
}

impl Default for VertexExtra {
    fn default() -> Self {
        Self {
            bones: [-1; 3],
            weights: [0; 3],
            extra: [0; 2],
        }
    }
}

impl VertexExtra {
    pub fn weight(&self, i: usize) -> f32 {
        f32::from(self.weights[i]) / 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VertexExtras {
    /// 1 - 3, selects how many opaque extra fields each entry carries.
    pub sub_version: u32,
    pub entries: Vec<VertexExtra>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointExtra {
    pub color: Vector3,
}

impl Default for JointExtra {
    fn default() -> Self {
        Self {
            color: Vector3::new(0.8, 0.8, 0.8),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelExtra {
    pub joint_size: f32,
    pub transparency_mode: u32,
    pub alpha_ref: f32,
}

impl Default for ModelExtra {
    fn default() -> Self {
        Self {
            joint_size: 0.01,
            transparency_mode: 0,
            alpha_ref: 1.0,
        }
    }
}

/// The optional versioned trailer sections.
///
/// Sections are ordered: a later section is only present when every earlier
/// one is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions {
    pub vertices: Option<VertexExtras>,
    pub joints: Option<Vec<JointExtra>>,
    pub model: Option<ModelExtra>,
}

impl Extensions {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_none() && self.joints.is_none() && self.model.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub groups: Vec<Group>,
    pub materials: Vec<Material>,
    pub animation: Animation,
    pub joints: Vec<Joint>,
    /// `None` when the file ended with a zero sub-version.
    pub comments: Option<Comments>,
    pub extensions: Extensions,
}

impl Model {
    pub fn vertex(&self, index: u16) -> Result<&Vertex> {
        self.vertices
            .get(usize::from(index))
            .ok_or_else(|| Error::out_of_range("vertex", index, self.vertices.len()))
    }

    pub fn triangle(&self, index: u16) -> Result<&Triangle> {
        self.triangles
            .get(usize::from(index))
            .ok_or_else(|| Error::out_of_range("triangle", index, self.triangles.len()))
    }

    /// Resolves a group's material index; -1 means no material.
    pub fn material(&self, index: i8) -> Result<Option<&Material>> {
        if index == -1 {
            return Ok(None);
        }
        usize::try_from(index)
            .ok()
            .and_then(|i| self.materials.get(i))
            .map(Some)
            .ok_or_else(|| Error::out_of_range("material", index, self.materials.len()))
    }

    /// Checks every cross reference in the model.
    pub fn validate(&self) -> Result<()> {
        for v in &self.vertices {
            if v.bone != -1
                && usize::try_from(v.bone).map_or(true, |b| b >= self.joints.len())
            {
                return Err(Error::out_of_range("joint", v.bone, self.joints.len()));
            }
        }
        for t in &self.triangles {
            for &v in &t.vertices {
                self.vertex(v)?;
            }
        }
        for g in &self.groups {
            for &t in &g.triangles {
                self.triangle(t)?;
            }
            self.material(g.material)?;
        }
        Ok(())
    }

    /// Counts how many triangles use each vertex, saturating at 255.
    pub fn ref_counts(&self) -> Result<Vec<u8>> {
        let mut counts = vec![0u8; self.vertices.len()];
        for t in &self.triangles {
            for &v in &t.vertices {
                let count = counts
                    .get_mut(usize::from(v))
                    .ok_or_else(|| Error::out_of_range("vertex", v, self.vertices.len()))?;
                *count = count.saturating_add(1);
            }
        }
        Ok(counts)
    }

    /// Each triangle's group index as given by the group lists. Triangles
    /// missing from every list keep their stored index.
    pub fn triangle_groups(&self) -> Result<Vec<u8>> {
        let mut groups: Vec<u8> = self.triangles.iter().map(|t| t.group).collect();
        for (g, group) in self.groups.iter().enumerate() {
            let g = u8::try_from(g).map_err(|_| Error::LimitExceeded {
                kind: "groups",
                count: self.groups.len(),
                max: MAX_GROUPS,
            })?;
            for &t in &group.triangles {
                *groups
                    .get_mut(usize::from(t))
                    .ok_or_else(|| Error::out_of_range("triangle", t, self.triangles.len()))? = g;
            }
        }
        Ok(groups)
    }

    /// Recomputes vertex reference counts and back-fills each triangle's
    /// group index from the group lists.
    pub fn update_ref_counts(&mut self) -> Result<()> {
        let counts = self.ref_counts()?;
        let groups = self.triangle_groups()?;
        for (vertex, count) in self.vertices.iter_mut().zip(counts) {
            vertex.ref_count = count;
        }
        for (triangle, group) in self.triangles.iter_mut().zip(groups) {
            triangle.group = group;
        }
        Ok(())
    }

    /// True when every triangle belongs to exactly one group.
    pub fn groups_partition_triangles(&self) -> bool {
        let mut seen = vec![false; self.triangles.len()];
        for &t in self.groups.iter().flat_map(|g| &g.triangles) {
            match seen.get_mut(usize::from(t)) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        seen.into_iter().all(|s| s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(vertices: [u16; 3]) -> Triangle {
        Triangle {
            flags: 0,
            vertices,
            normals: [Vector3::new(0.0, 0.0, 1.0); 3],
            uvs: [Vector2::new(0.0, 0.0); 3],
            smoothing_group: 1,
            group: 0,
        }
    }

    fn model() -> Model {
        Model {
            vertices: (0..4)
                .map(|i| Vertex::new(Vector3::new(i as f32, 0.0, 0.0)))
                .collect(),
            triangles: vec![triangle([0, 1, 2]), triangle([2, 1, 3])],
            groups: vec![
                Group {
                    flags: 0,
                    name: "a".into(),
                    triangles: vec![0],
                    material: -1,
                },
                Group {
                    flags: 0,
                    name: "b".into(),
                    triangles: vec![1],
                    material: -1,
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn ref_counts_follow_triangles() {
        let mut m = model();
        m.vertices[0].ref_count = 200;
        m.update_ref_counts().unwrap();
        let counts: Vec<u8> = m.vertices.iter().map(|v| v.ref_count).collect();
        assert_eq!(vec![1, 2, 2, 1], counts);
        assert_eq!(1, m.triangles[1].group);
    }

    #[test]
    fn partition() {
        let mut m = model();
        assert!(m.groups_partition_triangles());
        m.groups[1].triangles.push(0);
        assert!(!m.groups_partition_triangles());
        m.groups[1].triangles = vec![];
        assert!(!m.groups_partition_triangles());
    }

    #[test]
    fn dangling_indices_are_rejected() {
        let mut m = model();
        m.triangles[1].vertices[2] = 9;
        assert!(matches!(
            m.validate(),
            Err(Error::IndexOutOfRange { kind: "vertex", index: 9, len: 4 })
        ));

        let mut m = model();
        m.groups[0].material = 0;
        assert!(matches!(
            m.validate(),
            Err(Error::IndexOutOfRange { kind: "material", .. })
        ));

        let mut m = model();
        m.vertices[0].bone = 2;
        assert!(m.validate().is_err());
    }
}
