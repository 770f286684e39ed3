//! The MilkShape 3D ASCII encoding.
//!
//! ```text
//! // MilkShape 3D ASCII
//!
//! Frames: 30
//! Frame: 1
//!
//! Meshes: 1
//! "Box01" 0 0
//! 3                          // vertices: flags x y z u v bone
//! 0 0.000000 0.000000 0.000000 0.000000 0.000000 -1
//! ...
//! 1                          // normals: x y z
//! 0.000000 0.000000 1.000000
//! 1                          // triangles: flags v1 v2 v3 n1 n2 n3 smoothing
//! 0 0 1 2 0 0 0 1
//! ```
//!
//! The text encoding stores meshes with local indices, so reading goes
//! through [`flatten`](crate::reconcile::flatten) and writing through
//! [`expand`](crate::reconcile::expand).

use std::io::{BufRead, Write};

use milkshake_mesh::{Vector2, Vector3};

use crate::error::{Error, Result};
use crate::model::*;
use crate::reconcile::{expand, flatten, Mesh, MeshFace, MeshVertex};
use crate::tokenizer::{parse_section, strip_comment, Fields};

pub const HEADER: &str = "// MilkShape 3D ASCII";
const END_COMMENT: &str = "EndComment";

struct Line {
    number: usize,
    text: String,
}

impl Line {
    fn fields(&self) -> Fields<'_> {
        Fields::new(&self.text, self.number)
    }
}

struct LineReader<R> {
    inner: R,
    number: usize,
}

impl<R: BufRead> LineReader<R> {
    /// The next line exactly as stored, without its line terminator.
    fn raw(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        if self.inner.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        self.number += 1;
        let len = buf.trim_end_matches(['\r', '\n']).len();
        buf.truncate(len);
        Ok(Some(buf))
    }

    /// The next line with content once comments are stripped.
    fn next(&mut self) -> Result<Option<Line>> {
        while let Some(raw) = self.raw()? {
            let text = strip_comment(&raw).trim();
            if !text.is_empty() {
                return Ok(Some(Line {
                    number: self.number,
                    text: text.to_string(),
                }));
            }
        }
        Ok(None)
    }

    fn expect(&mut self, what: &str) -> Result<Line> {
        self.next()?.ok_or_else(|| {
            Error::malformed(
                self.number + 1,
                format!("expected {what}, found end of file"),
            )
        })
    }

    fn count(&mut self, what: &str) -> Result<usize> {
        let line = self.expect(what)?;
        let mut f = line.fields();
        f.int_as()
    }

    /// Comment text: raw lines up to the terminator, joined with newlines.
    fn comment_text(&mut self) -> Result<String> {
        let mut lines = Vec::new();
        loop {
            let Some(raw) = self.raw()? else {
                return Err(Error::malformed(
                    self.number + 1,
                    format!("expected {END_COMMENT}, found end of file"),
                ));
            };
            if raw.trim() == END_COMMENT {
                return Ok(lines.join("\n"));
            }
            lines.push(raw);
        }
    }

    fn header(&mut self) -> Result<()> {
        match self.raw()? {
            Some(line) if line.trim().eq_ignore_ascii_case(HEADER) => Ok(()),
            _ => Err(Error::InvalidFormat(format!(
                "text files must start with {HEADER:?}"
            ))),
        }
    }

    fn mesh(&mut self) -> Result<Mesh> {
        let line = self.expect("mesh header")?;
        let mut f = line.fields();
        let name = f.string()?;
        let flags = f.int_as()?;
        let material = f.int_as()?;

        let n = self.count("vertex count")?;
        let mut vertices = Vec::with_capacity(n.min(MAX_VERTICES));
        for _ in 0..n {
            let line = self.expect("vertex")?;
            let mut f = line.fields();
            vertices.push(MeshVertex {
                flags: f.int_as()?,
                position: Vector3::new(f.float()?, f.float()?, f.float()?),
                uv: Vector2::new(f.float()?, f.float()?),
                bone: f.int_as()?,
            });
        }

        let n = self.count("normal count")?;
        let mut normals = Vec::new();
        for _ in 0..n {
            let line = self.expect("normal")?;
            let mut f = line.fields();
            normals.push(Vector3::new(f.float()?, f.float()?, f.float()?));
        }

        let n = self.count("triangle count")?;
        let mut faces = Vec::with_capacity(n.min(MAX_TRIANGLES));
        for _ in 0..n {
            let line = self.expect("triangle")?;
            let mut f = line.fields();
            faces.push(MeshFace {
                flags: f.int_as()?,
                vertices: [f.int_as()?, f.int_as()?, f.int_as()?],
                normals: [f.int_as()?, f.int_as()?, f.int_as()?],
                smoothing_group: f.int_as()?,
            });
        }

        Ok(Mesh {
            name,
            flags,
            material,
            vertices,
            normals,
            faces,
        })
    }

    fn color(&mut self, what: &str) -> Result<Color> {
        let line = self.expect(what)?;
        let mut f = line.fields();
        Ok([f.float()?, f.float()?, f.float()?, f.float()?])
    }

    fn float(&mut self, what: &str) -> Result<f32> {
        self.expect(what)?.fields().float()
    }

    fn string(&mut self, what: &str) -> Result<String> {
        self.expect(what)?.fields().string()
    }

    fn material(&mut self) -> Result<Material> {
        Ok(Material {
            name: self.string("material name")?,
            ambient: self.color("ambient")?,
            diffuse: self.color("diffuse")?,
            specular: self.color("specular")?,
            emissive: self.color("emissive")?,
            shininess: self.float("shininess")?,
            transparency: self.float("transparency")?,
            mode: 0,
            texture: self.string("texture")?,
            alpha_map: self.string("alpha map")?,
        })
    }

    fn keyframes(&mut self, what: &str) -> Result<Vec<Keyframe>> {
        let n = self.count(what)?;
        let mut keys = Vec::new();
        for _ in 0..n {
            let line = self.expect(what)?;
            let mut f = line.fields();
            keys.push(Keyframe {
                time: f.float()?,
                value: Vector3::new(f.float()?, f.float()?, f.float()?),
            });
        }
        Ok(keys)
    }

    fn joint(&mut self) -> Result<Joint> {
        let name = self.string("bone name")?;
        let parent = self.string("bone parent")?;
        let line = self.expect("bone transform")?;
        let mut f = line.fields();
        let flags = f.int_as()?;
        let position = Vector3::new(f.float()?, f.float()?, f.float()?);
        let rotation = Vector3::new(f.float()?, f.float()?, f.float()?);
        let position_keys = self.keyframes("position key")?;
        let rotation_keys = self.keyframes("rotation key")?;
        Ok(Joint {
            flags,
            name,
            parent,
            rotation,
            position,
            rotation_keys,
            position_keys,
        })
    }

    fn indexed_comment(&mut self) -> Result<Comment> {
        let index = self.count("comment index")?;
        Ok(Comment {
            index: index as u32,
            text: self.comment_text()?,
        })
    }
}

/// Reads a complete text model.
///
/// Text files carry no extensions and no animation speed, so those take
/// their defaults.
pub fn read<R: BufRead>(r: R) -> Result<Model> {
    let mut r = LineReader {
        inner: r,
        number: 0,
    };
    r.header()?;

    let mut animation = Animation::default();
    let mut meshes = Vec::new();
    let mut materials = Vec::new();
    let mut joints = Vec::new();
    let mut comments = Comments::default();
    let mut skipping = false;

    while let Some(line) = r.next()? {
        let (name, count) = match parse_section(&line.text, line.number) {
            Ok(section) => section,
            // Lines inside an unknown section have no known shape.
            Err(_) if skipping => continue,
            Err(e) => return Err(e),
        };
        skipping = false;
        log::debug!("section {name}: {count}");
        match name.to_ascii_lowercase().as_str() {
            "frames" => animation.total_frames = count as u32,
            "frame" => animation.current_time = count as f32,
            "meshes" => {
                for _ in 0..count {
                    meshes.push(r.mesh()?);
                }
            }
            "materials" => {
                for _ in 0..count {
                    materials.push(r.material()?);
                }
            }
            "bones" => {
                for _ in 0..count {
                    joints.push(r.joint()?);
                }
            }
            "groupcomments" => {
                for _ in 0..count {
                    comments.groups.push(r.indexed_comment()?);
                }
            }
            "materialcomments" => {
                for _ in 0..count {
                    comments.materials.push(r.indexed_comment()?);
                }
            }
            "bonecomments" => {
                for _ in 0..count {
                    comments.joints.push(r.indexed_comment()?);
                }
            }
            "modelcomment" => {
                for _ in 0..count {
                    comments.model.push(Comment {
                        index: 0,
                        text: r.comment_text()?,
                    });
                }
            }
            _ => {
                log::warn!("skipping unknown section {name:?} at line {}", line.number);
                skipping = true;
            }
        }
    }

    let mut model = flatten(&meshes)?;
    model.materials = materials;
    model.joints = joints;
    model.animation = animation;
    if !comments.is_empty() {
        model.comments = Some(comments);
    }
    model.validate()?;
    Ok(model)
}

fn quoted(field: &'static str, s: &str) -> Result<String> {
    let reason = if s.contains('"') {
        "contains a quote"
    } else if s.contains(['\n', '\r']) {
        "contains a line break"
    } else if s.contains("//") {
        "contains a comment marker"
    } else {
        return Ok(format!("\"{s}\""));
    };
    Err(Error::InvalidString {
        field,
        value: s.to_string(),
        reason,
    })
}

fn write_color<W: Write>(w: &mut W, c: &Color) -> Result<()> {
    writeln!(w, "{:.6} {:.6} {:.6} {:.6}", c[0], c[1], c[2], c[3])?;
    Ok(())
}

fn write_mesh<W: Write>(w: &mut W, mesh: &Mesh) -> Result<()> {
    writeln!(
        w,
        "{} {} {}",
        quoted("mesh name", &mesh.name)?,
        mesh.flags,
        mesh.material
    )?;
    writeln!(w, "{}", mesh.vertices.len())?;
    for v in &mesh.vertices {
        writeln!(
            w,
            "{} {:.6} {:.6} {:.6} {:.6} {:.6} {}",
            v.flags, v.position.x, v.position.y, v.position.z, v.uv.x, v.uv.y, v.bone
        )?;
    }
    writeln!(w, "{}", mesh.normals.len())?;
    for n in &mesh.normals {
        writeln!(w, "{:.6} {:.6} {:.6}", n.x, n.y, n.z)?;
    }
    writeln!(w, "{}", mesh.faces.len())?;
    for f in &mesh.faces {
        writeln!(
            w,
            "{} {} {} {} {} {} {} {}",
            f.flags,
            f.vertices[0],
            f.vertices[1],
            f.vertices[2],
            f.normals[0],
            f.normals[1],
            f.normals[2],
            f.smoothing_group
        )?;
    }
    Ok(())
}

fn write_material<W: Write>(w: &mut W, m: &Material) -> Result<()> {
    writeln!(w, "{}", quoted("material name", &m.name)?)?;
    write_color(w, &m.ambient)?;
    write_color(w, &m.diffuse)?;
    write_color(w, &m.specular)?;
    write_color(w, &m.emissive)?;
    writeln!(w, "{:.6}", m.shininess)?;
    writeln!(w, "{:.6}", m.transparency)?;
    writeln!(w, "{}", quoted("texture", &m.texture)?)?;
    writeln!(w, "{}", quoted("alpha map", &m.alpha_map)?)?;
    Ok(())
}

fn write_keyframes<W: Write>(w: &mut W, keys: &[Keyframe]) -> Result<()> {
    writeln!(w, "{}", keys.len())?;
    for k in keys {
        writeln!(
            w,
            "{:.6} {:.6} {:.6} {:.6}",
            k.time, k.value.x, k.value.y, k.value.z
        )?;
    }
    Ok(())
}

fn write_joint<W: Write>(w: &mut W, j: &Joint) -> Result<()> {
    writeln!(w, "{}", quoted("bone name", &j.name)?)?;
    writeln!(w, "{}", quoted("bone parent", &j.parent)?)?;
    writeln!(
        w,
        "{} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6}",
        j.flags,
        j.position.x,
        j.position.y,
        j.position.z,
        j.rotation.x,
        j.rotation.y,
        j.rotation.z
    )?;
    write_keyframes(w, &j.position_keys)?;
    write_keyframes(w, &j.rotation_keys)
}

fn write_comment_text<W: Write>(w: &mut W, text: &str) -> Result<()> {
    if text.lines().any(|l| l.trim() == END_COMMENT) {
        return Err(Error::InvalidString {
            field: "comment",
            value: text.to_string(),
            reason: "contains the comment terminator",
        });
    }
    if !text.is_empty() {
        writeln!(w, "{text}")?;
    }
    writeln!(w, "{END_COMMENT}")?;
    Ok(())
}

fn write_comments<W: Write>(w: &mut W, section: &str, comments: &[Comment]) -> Result<()> {
    writeln!(w, "{section}: {}", comments.len())?;
    for c in comments {
        writeln!(w, "{}", c.index)?;
        write_comment_text(w, &c.text)?;
    }
    Ok(())
}

/// Writes a model in the text encoding.
///
/// Extensions and the animation speed have no text representation and are
/// dropped.
pub fn write<W: Write>(w: &mut W, model: &Model) -> Result<()> {
    if !model.extensions.is_empty() {
        log::warn!("text output drops the model's extension sections");
    }
    let meshes = expand(model)?;

    writeln!(w, "{HEADER}")?;
    writeln!(w)?;
    writeln!(w, "Frames: {}", model.animation.total_frames)?;
    writeln!(w, "Frame: {}", model.animation.current_time.round() as i64)?;
    writeln!(w)?;

    writeln!(w, "Meshes: {}", meshes.len())?;
    for mesh in &meshes {
        write_mesh(w, mesh)?;
    }
    writeln!(w)?;

    writeln!(w, "Materials: {}", model.materials.len())?;
    for m in &model.materials {
        write_material(w, m)?;
    }
    writeln!(w)?;

    writeln!(w, "Bones: {}", model.joints.len())?;
    for j in &model.joints {
        write_joint(w, j)?;
    }

    let empty = Comments::default();
    let comments = model.comments.as_ref().unwrap_or(&empty);
    write_comments(w, "GroupComments", &comments.groups)?;
    write_comments(w, "MaterialComments", &comments.materials)?;
    write_comments(w, "BoneComments", &comments.joints)?;
    writeln!(w, "ModelComment: {}", comments.model.len())?;
    for c in &comments.model {
        write_comment_text(w, &c.text)?;
    }
    Ok(())
}
