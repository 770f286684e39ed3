//! Import and export between the flat model and a host [`Scene`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use milkshake_mesh::{Face, Object, PolygonMesh, Scene, TextureMaps};

use crate::error::{Error, Result};
use crate::model::{Material, Model, MAX_MATERIALS};
use crate::reconcile::{expand, flatten, partition};
use crate::topology::group_by_topology;

pub const DEFAULT_MATERIAL: &str = "default";

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Directory texture paths are resolved against, usually the model's
    /// directory.
    pub texture_root: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Texture paths under this directory are stored relative to it.
    pub texture_root: Option<PathBuf>,
    /// Material used for faces without a material tag.
    pub default_material: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            texture_root: None,
            default_material: DEFAULT_MATERIAL.to_string(),
        }
    }
}

fn resolve(root: Option<&Path>, file: &str) -> Option<PathBuf> {
    if file.is_empty() {
        return None;
    }
    Some(match root {
        Some(root) => root.join(file),
        None => PathBuf::from(file),
    })
}

fn relative(root: Option<&Path>, file: Option<&PathBuf>) -> String {
    let Some(file) = file else {
        return String::new();
    };
    let file = root
        .and_then(|root| file.strip_prefix(root).ok())
        .unwrap_or(file);
    file.to_string_lossy().into_owned()
}

/// Converts a model into host objects.
///
/// Every group becomes a mesh, and meshes sharing an edge are merged into one
/// object named after the first of them. Faces are tagged with the name of
/// their group's material.
pub fn import_scene(model: &Model, options: &ImportOptions) -> Result<Scene> {
    let meshes = expand(model)?;
    let mut objects = Vec::new();
    for surface in group_by_topology(&meshes) {
        let first = &meshes[surface[0]];
        let name = if first.name.is_empty() {
            "None".to_string()
        } else {
            first.name.clone()
        };
        let mut target = PolygonMesh::default();
        for &m in &surface {
            let mesh = &meshes[m];
            let material = match model.material(mesh.material)? {
                Some(material) => material.name.clone(),
                None => DEFAULT_MATERIAL.to_string(),
            };
            let vertex_offset = target.vertices.len() as u32;
            let normal_offset = target.normals.len() as u32;
            for v in &mesh.vertices {
                target.vertices.push(v.position);
                target.texcoords.push(v.uv);
            }
            target.normals.extend_from_slice(&mesh.normals);
            for f in &mesh.faces {
                let vertices: Vec<u32> = f.vertices.iter().map(|v| v + vertex_offset).collect();
                target.faces.push(Face {
                    texcoords: vertices.clone(),
                    vertices,
                    normals: f.normals.iter().map(|n| n + normal_offset).collect(),
                    materials: vec![material.clone()],
                    smoothing_group: f.smoothing_group,
                });
            }
        }
        log::debug!(
            "object {name:?} from {} group(s), {} faces",
            surface.len(),
            target.faces.len()
        );
        objects.push(Object {
            name: Some(name),
            mesh: target,
        });
    }

    let root = options.texture_root.as_deref();
    let materials = model
        .materials
        .iter()
        .map(|m| milkshake_mesh::Material {
            name: m.name.clone(),
            ambient: m.ambient,
            diffuse: m.diffuse,
            specular: m.specular,
            emission: m.emissive,
            shininess: m.shininess,
            maps: TextureMaps {
                diffuse: resolve(root, &m.texture),
                alpha: resolve(root, &m.alpha_map),
            },
        })
        .collect();

    Ok(Scene { objects, materials })
}

/// Converts host objects into a model.
///
/// Each object is split by material into groups. Faces naming a material
/// that is not in the scene end up in a group without a material.
pub fn export_scene(scene: &Scene, options: &ExportOptions) -> Result<Model> {
    if scene.materials.len() > MAX_MATERIALS {
        return Err(Error::LimitExceeded {
            kind: "materials",
            count: scene.materials.len(),
            max: MAX_MATERIALS,
        });
    }
    let index_of: HashMap<&str, i8> = scene
        .materials
        .iter()
        .enumerate()
        .map(|(i, m)| (m.name.as_str(), i as i8))
        .collect();
    let material_index = |name: &str| match index_of.get(name) {
        Some(&i) => i,
        None => {
            log::warn!("material {name:?} is not defined, exporting without material");
            -1
        }
    };

    let mut meshes = Vec::new();
    for object in &scene.objects {
        meshes.extend(partition(object, &options.default_material, &material_index)?);
    }
    let mut model = flatten(&meshes)?;

    let root = options.texture_root.as_deref();
    model.materials = scene
        .materials
        .iter()
        .map(|m| Material {
            name: m.name.clone(),
            ambient: m.ambient,
            diffuse: m.diffuse,
            specular: m.specular,
            emissive: m.emission,
            shininess: m.shininess,
            transparency: 1.0,
            mode: 0,
            texture: relative(root, m.maps.diffuse.as_ref()),
            alpha_map: relative(root, m.maps.alpha.as_ref()),
        })
        .collect();
    model.validate()?;
    Ok(model)
}
