//! Conversion between the flat model and per-object meshes.
//!
//! The flat model stores one global vertex array and per-corner normals and
//! UVs on every triangle. A [`Mesh`] instead owns its vertices and normals and
//! indexes them locally, which is what both the text encoding and the host
//! scene expect.

use milkshake_mesh::{
    ordered2, ordered3, Object, OrderedVec2, OrderedVec3, Triangle as Facet, TriangleMesh,
    Vector2, Vector3, VertexIndex,
};

use crate::error::{Error, Result};
use crate::model::{Group, Model, Triangle, Vertex, MAX_GROUPS, MAX_TRIANGLES, MAX_VERTICES};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub flags: u8,
    pub position: Vector3,
    pub uv: Vector2,
    pub bone: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshFace {
    pub flags: u16,
    pub vertices: [u32; 3],
    pub normals: [u32; 3],
    pub smoothing_group: u8,
}

/// A locally indexed mesh, one per group.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub flags: u8,
    /// Material index, -1 for none.
    pub material: i8,
    pub vertices: Vec<MeshVertex>,
    pub normals: Vec<Vector3>,
    pub faces: Vec<MeshFace>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            name: String::new(),
            flags: 0,
            material: -1,
            vertices: Vec::new(),
            normals: Vec::new(),
            faces: Vec::new(),
        }
    }
}

impl TriangleMesh for Mesh {
    /// Faces that reference missing vertices are skipped.
    fn triangles(&self) -> impl Iterator<Item = Facet> + '_ {
        self.faces.iter().filter_map(move |f| {
            let p = |i: u32| self.vertices.get(i as usize).map(|v| v.position);
            Some(Facet {
                p0: p(f.vertices[0])?,
                p1: p(f.vertices[1])?,
                p2: p(f.vertices[2])?,
            })
        })
    }
}

/// Splits the flat model into one mesh per group.
///
/// Local vertices are numbered by first use and keyed by their global index,
/// so a vertex shared by several triangles keeps the UV of the first
/// triangle that used it. Normals are keyed by exact value.
pub fn expand(model: &Model) -> Result<Vec<Mesh>> {
    let mut meshes = Vec::with_capacity(model.groups.len());
    for group in &model.groups {
        let mut vertex_index = VertexIndex::<u16>::new();
        let mut normal_index = VertexIndex::<OrderedVec3>::new();
        let mut mesh = Mesh {
            name: group.name.clone(),
            flags: group.flags,
            material: group.material,
            ..Default::default()
        };

        for &t in &group.triangles {
            let triangle = model.triangle(t)?;
            let mut face = MeshFace {
                flags: triangle.flags,
                vertices: [0; 3],
                normals: [0; 3],
                smoothing_group: triangle.smoothing_group,
            };
            for corner in 0..3 {
                let global = triangle.vertices[corner];
                let (local, new) = vertex_index.insert_full(global);
                if new {
                    let v = model.vertex(global)?;
                    mesh.vertices.push(MeshVertex {
                        flags: v.flags,
                        position: v.position,
                        uv: triangle.uvs[corner],
                        bone: v.bone,
                    });
                }
                face.vertices[corner] = local;

                let normal = triangle.normals[corner];
                let (local, new) = normal_index.insert_full(ordered3(normal));
                if new {
                    mesh.normals.push(normal);
                }
                face.normals[corner] = local;
            }
            mesh.faces.push(face);
        }
        log::debug!(
            "group {:?}: {} vertices, {} normals, {} faces",
            mesh.name,
            mesh.vertices.len(),
            mesh.normals.len(),
            mesh.faces.len()
        );
        meshes.push(mesh);
    }
    Ok(meshes)
}

/// Builds the flat vertex, triangle and group arrays from a list of meshes.
///
/// Every mesh becomes one group and brings its own copy of its vertices.
/// Materials, joints and the rest of the returned model are left at their
/// defaults for the caller to fill in.
pub fn flatten(meshes: &[Mesh]) -> Result<Model> {
    if meshes.len() > MAX_GROUPS {
        return Err(Error::LimitExceeded {
            kind: "groups",
            count: meshes.len(),
            max: MAX_GROUPS,
        });
    }
    let mut model = Model::default();
    for mesh in meshes {
        let base = model.vertices.len();
        if base + mesh.vertices.len() > MAX_VERTICES {
            return Err(Error::LimitExceeded {
                kind: "vertices",
                count: base + mesh.vertices.len(),
                max: MAX_VERTICES,
            });
        }
        model.vertices.extend(mesh.vertices.iter().map(|v| Vertex {
            flags: v.flags,
            position: v.position,
            bone: v.bone,
            ref_count: 0,
        }));

        let mut group = Group {
            flags: mesh.flags,
            name: mesh.name.clone(),
            triangles: Vec::with_capacity(mesh.faces.len()),
            material: mesh.material,
        };
        for face in &mesh.faces {
            let corner = |i: usize| -> Result<(u16, Vector3, Vector2)> {
                let local = face.vertices[i];
                let v = mesh
                    .vertices
                    .get(local as usize)
                    .ok_or_else(|| Error::out_of_range("mesh vertex", local, mesh.vertices.len()))?;
                let n = face.normals[i];
                let normal = mesh
                    .normals
                    .get(n as usize)
                    .ok_or_else(|| Error::out_of_range("mesh normal", n, mesh.normals.len()))?;
                // Bounded by the MAX_VERTICES check above.
                Ok(((base + local as usize) as u16, *normal, v.uv))
            };
            let (c0, c1, c2) = (corner(0)?, corner(1)?, corner(2)?);

            if model.triangles.len() >= MAX_TRIANGLES {
                return Err(Error::LimitExceeded {
                    kind: "triangles",
                    count: model.triangles.len() + 1,
                    max: MAX_TRIANGLES,
                });
            }
            group.triangles.push(model.triangles.len() as u16);
            model.triangles.push(Triangle {
                flags: face.flags,
                vertices: [c0.0, c1.0, c2.0],
                normals: [c0.1, c1.1, c2.1],
                uvs: [c0.2, c1.2, c2.2],
                smoothing_group: face.smoothing_group,
                group: 0,
            });
        }
        model.groups.push(group);
    }
    model.update_ref_counts()?;
    Ok(model)
}

/// Key for merging host corners: exact position and texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CornerKey {
    position: OrderedVec3,
    texcoord: OrderedVec2,
}

struct Bucket {
    material: String,
    mesh: Mesh,
    corners: VertexIndex<CornerKey>,
}

/// Splits a host object into one mesh per material.
///
/// Faces pick the first of their material tags, or `default_material` when
/// they have none. Within a bucket, corners with the same position and
/// texture coordinate share a vertex. Each bucket carries a copy of the
/// object's normal table so face normal indices are kept as they are.
///
/// `material_index` maps a material name to its index in the output model.
pub fn partition<F>(object: &Object, default_material: &str, material_index: F) -> Result<Vec<Mesh>>
where
    F: Fn(&str) -> i8,
{
    let object_name = object.name.as_deref().unwrap_or("None");
    let source = &object.mesh;
    let malformed = |face: usize, message: String| Error::MalformedFace {
        object: object_name.to_string(),
        face,
        message,
    };

    let mut buckets: Vec<Bucket> = Vec::new();
    for (f, face) in source.faces.iter().enumerate() {
        if face.vertices.len() != 3 {
            return Err(malformed(
                f,
                format!("expected a triangle, found {} vertices", face.vertices.len()),
            ));
        }
        if face.normals.len() != 3 {
            return Err(malformed(
                f,
                format!("expected 3 normal indices, found {}", face.normals.len()),
            ));
        }

        let material = face.material().unwrap_or(default_material);
        let b = match buckets.iter().position(|b| b.material == material) {
            Some(b) => b,
            None => {
                buckets.push(Bucket {
                    material: material.to_string(),
                    mesh: Mesh {
                        name: format!("{object_name}_{material}"),
                        material: material_index(material),
                        normals: source.normals.clone(),
                        ..Default::default()
                    },
                    corners: VertexIndex::new(),
                });
                buckets.len() - 1
            }
        };
        let bucket = &mut buckets[b];

        let mut out = MeshFace {
            flags: 0,
            vertices: [0; 3],
            normals: [0; 3],
            smoothing_group: face.smoothing_group,
        };
        for i in 0..3 {
            let position = *source
                .vertices
                .get(face.vertices[i] as usize)
                .ok_or_else(|| malformed(f, format!("vertex index {} out of range", face.vertices[i])))?;
            let texcoord = match face.texcoords.get(i) {
                Some(&t) => *source
                    .texcoords
                    .get(t as usize)
                    .ok_or_else(|| malformed(f, format!("texcoord index {t} out of range")))?,
                None => Vector2::new(0.0, 0.0),
            };
            let normal = face.normals[i];
            if normal as usize >= source.normals.len() {
                return Err(malformed(f, format!("normal index {normal} out of range")));
            }

            let key = CornerKey {
                position: ordered3(position),
                texcoord: ordered2(texcoord),
            };
            let (index, new) = bucket.corners.insert_full(key);
            if new {
                bucket.mesh.vertices.push(MeshVertex {
                    flags: 0,
                    position,
                    uv: texcoord,
                    bone: -1,
                });
            }
            out.vertices[i] = index;
            out.normals[i] = normal;
        }
        bucket.mesh.faces.push(out);
    }
    Ok(buckets.into_iter().map(|b| b.mesh).collect())
}
