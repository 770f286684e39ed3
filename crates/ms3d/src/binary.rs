//! The binary `.ms3d` encoding.
//!
//! ```text
//! char[10]     "MS3D000000"
//! u32          version, always 4
//! u16          vertex count, then 15 byte vertex records
//! u16          triangle count, then 70 byte triangle records
//! u16          group count, then variable size group records
//! u16          material count, then 361 byte material records
//! f32 f32 u32  animation fps, current time, total frames
//! u16          joint count, then variable size joint records
//! u32          sub-version; 0 (or end of file) ends the model
//! ...          comments, then the vertex, joint and model extensions, each
//!              behind its own sub-version marker
//! ```
//!
//! All values are little endian.

use std::io::{ErrorKind, Read, Write};
use std::ops::RangeInclusive;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use milkshake_mesh::{Vector2, Vector3};

use crate::error::{Error, Result};
use crate::model::*;

pub const MAGIC: &[u8; 10] = b"MS3D000000";
pub const VERSION: u32 = 4;

const NAME_LEN: usize = 32;
const PATH_LEN: usize = 128;

pub const HEADER_SIZE: usize = 10 + 4;
pub const VERTEX_SIZE: usize = 1 + 3 * 4 + 1 + 1;
pub const TRIANGLE_SIZE: usize = 2 + 3 * 2 + 9 * 4 + 6 * 4 + 1 + 1;
pub const MATERIAL_SIZE: usize = NAME_LEN + 4 * 16 + 4 + 4 + 1 + 2 * PATH_LEN;

static_assertions::const_assert_eq!(VERTEX_SIZE, 15);
static_assertions::const_assert_eq!(TRIANGLE_SIZE, 70);
static_assertions::const_assert_eq!(MATERIAL_SIZE, 361);

const VERTEX_EXTRA_VERSIONS: RangeInclusive<u32> = 1..=3;
const JOINT_EXTRA_VERSIONS: RangeInclusive<u32> = 1..=1;
const MODEL_EXTRA_VERSIONS: RangeInclusive<u32> = 1..=1;

/// The result of probing a sub-version marker in front of an optional
/// section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// The stream ended before a full marker could be read.
    End,
    /// A marker outside the range this reader understands.
    Unsupported(u32),
    Supported(u32),
}

fn truncated(context: &'static str) -> impl Fn(std::io::Error) -> Error {
    move |e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            Error::TruncatedData { context }
        } else {
            Error::Io(e)
        }
    }
}

/// Fixed width strings are stored as latin-1, padded with zeros.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn encode_latin1(field: &'static str, s: &str) -> Result<Vec<u8>> {
    s.chars()
        .map(|c| {
            u8::try_from(c).map_err(|_| Error::InvalidString {
                field,
                value: s.to_string(),
                reason: "not representable as latin-1",
            })
        })
        .collect()
}

struct BinaryReader<R> {
    inner: R,
}

impl<R: Read> BinaryReader<R> {
    fn u8(&mut self, context: &'static str) -> Result<u8> {
        self.inner.read_u8().map_err(truncated(context))
    }

    fn i8(&mut self, context: &'static str) -> Result<i8> {
        self.inner.read_i8().map_err(truncated(context))
    }

    fn u16(&mut self, context: &'static str) -> Result<u16> {
        self.inner
            .read_u16::<LittleEndian>()
            .map_err(truncated(context))
    }

    fn u32(&mut self, context: &'static str) -> Result<u32> {
        self.inner
            .read_u32::<LittleEndian>()
            .map_err(truncated(context))
    }

    fn f32(&mut self, context: &'static str) -> Result<f32> {
        self.inner
            .read_f32::<LittleEndian>()
            .map_err(truncated(context))
    }

    fn vec3(&mut self, context: &'static str) -> Result<Vector3> {
        Ok(Vector3::new(
            self.f32(context)?,
            self.f32(context)?,
            self.f32(context)?,
        ))
    }

    fn color(&mut self, context: &'static str) -> Result<Color> {
        Ok([
            self.f32(context)?,
            self.f32(context)?,
            self.f32(context)?,
            self.f32(context)?,
        ])
    }

    fn bytes(&mut self, len: usize, context: &'static str) -> Result<Vec<u8>> {
        // Read through `take` so a bogus length cannot force a huge
        // allocation up front.
        let mut buf = Vec::new();
        (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(Error::TruncatedData { context });
        }
        Ok(buf)
    }

    fn padded_string(&mut self, len: usize, context: &'static str) -> Result<String> {
        let buf = self.bytes(len, context)?;
        let end = buf.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        Ok(decode_latin1(&buf[..end]))
    }

    /// Reads a u32 if four more bytes are available.
    ///
    /// Unlike the other readers, a short stream is not an error here.
    fn try_u32(&mut self) -> Result<Option<u32>> {
        let mut buf = [0u8; 4];
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok((filled == buf.len()).then(|| LittleEndian::read_u32(&buf)))
    }

    fn marker(&mut self, supported: RangeInclusive<u32>) -> Result<Marker> {
        Ok(match self.try_u32()? {
            None => Marker::End,
            Some(v) if supported.contains(&v) => Marker::Supported(v),
            Some(v) => Marker::Unsupported(v),
        })
    }

    fn header(&mut self) -> Result<()> {
        let mut magic = [0u8; 10];
        self.inner
            .read_exact(&mut magic)
            .map_err(|_| Error::InvalidFormat("missing MS3D000000 magic".into()))?;
        if &magic != MAGIC {
            return Err(Error::InvalidFormat("missing MS3D000000 magic".into()));
        }
        let version = self.u32("header")?;
        if version != VERSION {
            return Err(Error::InvalidFormat(format!(
                "unsupported version {version}, expected {VERSION}"
            )));
        }
        Ok(())
    }

    fn vertex(&mut self) -> Result<Vertex> {
        const CTX: &str = "vertex";
        Ok(Vertex {
            flags: self.u8(CTX)?,
            position: self.vec3(CTX)?,
            bone: self.i8(CTX)?,
            ref_count: self.u8(CTX)?,
        })
    }

    fn triangle(&mut self) -> Result<Triangle> {
        const CTX: &str = "triangle";
        let flags = self.u16(CTX)?;
        let vertices = [self.u16(CTX)?, self.u16(CTX)?, self.u16(CTX)?];
        let normals = [self.vec3(CTX)?, self.vec3(CTX)?, self.vec3(CTX)?];
        // All three u coordinates come before the three v coordinates.
        let u = [self.f32(CTX)?, self.f32(CTX)?, self.f32(CTX)?];
        let v = [self.f32(CTX)?, self.f32(CTX)?, self.f32(CTX)?];
        Ok(Triangle {
            flags,
            vertices,
            normals,
            uvs: [
                Vector2::new(u[0], v[0]),
                Vector2::new(u[1], v[1]),
                Vector2::new(u[2], v[2]),
            ],
            smoothing_group: self.u8(CTX)?,
            group: self.u8(CTX)?,
        })
    }

    fn group(&mut self) -> Result<Group> {
        const CTX: &str = "group";
        let flags = self.u8(CTX)?;
        let name = self.padded_string(NAME_LEN, CTX)?;
        let count = self.u16(CTX)?;
        let triangles = (0..count)
            .map(|_| self.u16(CTX))
            .collect::<Result<Vec<_>>>()?;
        Ok(Group {
            flags,
            name,
            triangles,
            material: self.i8(CTX)?,
        })
    }

    fn material(&mut self) -> Result<Material> {
        const CTX: &str = "material";
        Ok(Material {
            name: self.padded_string(NAME_LEN, CTX)?,
            ambient: self.color(CTX)?,
            diffuse: self.color(CTX)?,
            specular: self.color(CTX)?,
            emissive: self.color(CTX)?,
            shininess: self.f32(CTX)?,
            transparency: self.f32(CTX)?,
            mode: self.i8(CTX)?,
            texture: self.padded_string(PATH_LEN, CTX)?,
            alpha_map: self.padded_string(PATH_LEN, CTX)?,
        })
    }

    fn keyframe(&mut self) -> Result<Keyframe> {
        const CTX: &str = "keyframe";
        Ok(Keyframe {
            time: self.f32(CTX)?,
            value: self.vec3(CTX)?,
        })
    }

    fn joint(&mut self) -> Result<Joint> {
        const CTX: &str = "joint";
        let flags = self.u8(CTX)?;
        let name = self.padded_string(NAME_LEN, CTX)?;
        let parent = self.padded_string(NAME_LEN, CTX)?;
        let rotation = self.vec3(CTX)?;
        let position = self.vec3(CTX)?;
        let rotation_count = self.u16(CTX)?;
        let position_count = self.u16(CTX)?;
        let rotation_keys = (0..rotation_count)
            .map(|_| self.keyframe())
            .collect::<Result<Vec<_>>>()?;
        let position_keys = (0..position_count)
            .map(|_| self.keyframe())
            .collect::<Result<Vec<_>>>()?;
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

    fn comments(&mut self) -> Result<Vec<Comment>> {
        const CTX: &str = "comment";
        let count = self.u32(CTX)?;
        let mut comments = Vec::new();
        for _ in 0..count {
            let index = self.u32(CTX)?;
            let len = self.u32(CTX)? as usize;
            let text = decode_latin1(&self.bytes(len, CTX)?);
            comments.push(Comment { index, text });
        }
        Ok(comments)
    }

    fn vertex_extra(&mut self, sub_version: u32) -> Result<VertexExtra> {
        const CTX: &str = "vertex extra";
        let bones = [self.i8(CTX)?, self.i8(CTX)?, self.i8(CTX)?];
        let weights = [self.u8(CTX)?, self.u8(CTX)?, self.u8(CTX)?];
        let mut extra = [0u32; 2];
        if sub_version >= 2 {
            extra[0] = self.u32(CTX)?;
        }
        if sub_version >= 3 {
            extra[1] = self.u32(CTX)?;
        }
        Ok(VertexExtra {
            bones,
            weights,
            extra,
        })
    }

    /// Reads the extension sections.
    ///
    /// Each section is behind a marker; the first missing or unsupported
    /// marker ends the extensions, keeping whatever was read before it.
    fn extensions(&mut self, vertices: usize, joints: usize) -> Result<Extensions> {
        let mut ext = Extensions::default();

        let sub_version = match self.marker(VERTEX_EXTRA_VERSIONS)? {
            Marker::Supported(v) => v,
            marker => {
                skipped("vertex extra", marker);
                return Ok(ext);
            }
        };
        let entries = (0..vertices)
            .map(|_| self.vertex_extra(sub_version))
            .collect::<Result<Vec<_>>>()?;
        ext.vertices = Some(VertexExtras {
            sub_version,
            entries,
        });

        match self.marker(JOINT_EXTRA_VERSIONS)? {
            Marker::Supported(_) => {}
            marker => {
                skipped("joint extra", marker);
                return Ok(ext);
            }
        }
        let colors = (0..joints)
            .map(|_| -> Result<JointExtra> {
                Ok(JointExtra {
                    color: self.vec3("joint extra")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        ext.joints = Some(colors);

        match self.marker(MODEL_EXTRA_VERSIONS)? {
            Marker::Supported(_) => {}
            marker => {
                skipped("model extra", marker);
                return Ok(ext);
            }
        }
        const CTX: &str = "model extra";
        ext.model = Some(ModelExtra {
            joint_size: self.f32(CTX)?,
            transparency_mode: self.u32(CTX)?,
            alpha_ref: self.f32(CTX)?,
        });
        Ok(ext)
    }
}

fn skipped(section: &str, marker: Marker) {
    match marker {
        Marker::Unsupported(v) => {
            log::warn!("ignoring {section} section with unsupported sub-version {v}")
        }
        _ => log::debug!("no {section} section"),
    }
}

fn read_count<R: Read>(r: &mut BinaryReader<R>, kind: &'static str) -> Result<usize> {
    let count = usize::from(r.u16(kind)?);
    log::debug!("reading {count} {kind}");
    Ok(count)
}

/// Reads a complete binary model.
///
/// The returned model has been validated and its derived fields (reference
/// counts, triangle group indices) recomputed.
pub fn read<R: Read>(r: &mut R) -> Result<Model> {
    let mut r = BinaryReader { inner: r };
    r.header()?;

    let n = read_count(&mut r, "vertices")?;
    let vertices = (0..n).map(|_| r.vertex()).collect::<Result<Vec<_>>>()?;
    let n = read_count(&mut r, "triangles")?;
    let triangles = (0..n).map(|_| r.triangle()).collect::<Result<Vec<_>>>()?;
    let n = read_count(&mut r, "groups")?;
    let groups = (0..n).map(|_| r.group()).collect::<Result<Vec<_>>>()?;
    let n = read_count(&mut r, "materials")?;
    let materials = (0..n).map(|_| r.material()).collect::<Result<Vec<_>>>()?;

    let animation = Animation {
        fps: r.f32("animation")?,
        current_time: r.f32("animation")?,
        total_frames: r.u32("animation")?,
    };

    let n = read_count(&mut r, "joints")?;
    let joints = (0..n).map(|_| r.joint()).collect::<Result<Vec<_>>>()?;

    // Older writers stop right after the joints, which reads the same as a
    // zero sub-version.
    let (comments, extensions) = match r.try_u32()? {
        None | Some(0) => (None, Extensions::default()),
        Some(sub_version) => {
            let comments = Comments {
                sub_version,
                groups: r.comments()?,
                materials: r.comments()?,
                joints: r.comments()?,
                model: r.comments()?,
            };
            let extensions = r.extensions(vertices.len(), joints.len())?;
            (Some(comments), extensions)
        }
    };

    let mut model = Model {
        vertices,
        triangles,
        groups,
        materials,
        animation,
        joints,
        comments,
        extensions,
    };
    model.validate()?;
    model.update_ref_counts()?;
    Ok(model)
}

fn write_count<W: Write>(
    w: &mut W,
    kind: &'static str,
    count: usize,
    max: usize,
) -> Result<()> {
    if count > max {
        return Err(Error::LimitExceeded { kind, count, max });
    }
    log::debug!("writing {count} {kind}");
    w.write_u16::<LittleEndian>(count as u16)?;
    Ok(())
}

fn write_padded<W: Write>(w: &mut W, field: &'static str, s: &str, len: usize) -> Result<()> {
    let mut bytes = encode_latin1(field, s)?;
    if bytes.len() > len {
        return Err(Error::InvalidString {
            field,
            value: s.to_string(),
            reason: "too long",
        });
    }
    bytes.resize(len, 0);
    w.write_all(&bytes)?;
    Ok(())
}

fn write_vec3<W: Write>(w: &mut W, v: Vector3) -> Result<()> {
    w.write_f32::<LittleEndian>(v.x)?;
    w.write_f32::<LittleEndian>(v.y)?;
    w.write_f32::<LittleEndian>(v.z)?;
    Ok(())
}

fn write_color<W: Write>(w: &mut W, c: &Color) -> Result<()> {
    for channel in c {
        w.write_f32::<LittleEndian>(*channel)?;
    }
    Ok(())
}

fn write_keyframe<W: Write>(w: &mut W, k: &Keyframe) -> Result<()> {
    w.write_f32::<LittleEndian>(k.time)?;
    write_vec3(w, k.value)
}

fn write_comments<W: Write>(w: &mut W, comments: &[Comment]) -> Result<()> {
    w.write_u32::<LittleEndian>(comments.len() as u32)?;
    for c in comments {
        let text = encode_latin1("comment", &c.text)?;
        w.write_u32::<LittleEndian>(c.index)?;
        w.write_u32::<LittleEndian>(text.len() as u32)?;
        w.write_all(&text)?;
    }
    Ok(())
}

fn write_extensions<W: Write>(w: &mut W, model: &Model) -> Result<()> {
    let ext = &model.extensions;
    let Some(vertex_extras) = &ext.vertices else {
        if !ext.is_empty() {
            log::warn!("extensions dropped, they need the vertex extra section");
        }
        return Ok(());
    };
    let sub_version = vertex_extras.sub_version;
    if !VERTEX_EXTRA_VERSIONS.contains(&sub_version) {
        return Err(Error::InvalidFormat(format!(
            "cannot write vertex extra sub-version {sub_version}"
        )));
    }
    w.write_u32::<LittleEndian>(sub_version)?;
    for i in 0..model.vertices.len() {
        let e = vertex_extras.entries.get(i).copied().unwrap_or_default();
        for bone in e.bones {
            w.write_i8(bone)?;
        }
        w.write_all(&e.weights)?;
        if sub_version >= 2 {
            w.write_u32::<LittleEndian>(e.extra[0])?;
        }
        if sub_version >= 3 {
            w.write_u32::<LittleEndian>(e.extra[1])?;
        }
    }

    let Some(joint_extras) = &ext.joints else {
        if ext.model.is_some() {
            log::warn!("model extra dropped, it needs the joint extra section");
        }
        return Ok(());
    };
    w.write_u32::<LittleEndian>(1)?;
    for i in 0..model.joints.len() {
        let e = joint_extras.get(i).copied().unwrap_or_default();
        write_vec3(w, e.color)?;
    }

    let Some(model_extra) = ext.model else {
        return Ok(());
    };
    w.write_u32::<LittleEndian>(1)?;
    w.write_f32::<LittleEndian>(model_extra.joint_size)?;
    w.write_u32::<LittleEndian>(model_extra.transparency_mode)?;
    w.write_f32::<LittleEndian>(model_extra.alpha_ref)?;
    Ok(())
}

/// Writes a model in the binary encoding.
///
/// Reference counts and triangle group indices are recomputed rather than
/// taken from the vertices and triangles.
pub fn write<W: Write>(w: &mut W, model: &Model) -> Result<()> {
    let ref_counts = model.ref_counts()?;
    let triangle_groups = model.triangle_groups()?;

    w.write_all(MAGIC)?;
    w.write_u32::<LittleEndian>(VERSION)?;

    write_count(w, "vertices", model.vertices.len(), MAX_VERTICES)?;
    for (v, ref_count) in model.vertices.iter().zip(ref_counts) {
        w.write_u8(v.flags)?;
        write_vec3(w, v.position)?;
        w.write_i8(v.bone)?;
        w.write_u8(ref_count)?;
    }

    write_count(w, "triangles", model.triangles.len(), MAX_TRIANGLES)?;
    for (t, group) in model.triangles.iter().zip(triangle_groups) {
        w.write_u16::<LittleEndian>(t.flags)?;
        for v in t.vertices {
            w.write_u16::<LittleEndian>(v)?;
        }
        for n in t.normals {
            write_vec3(w, n)?;
        }
        for uv in t.uvs {
            w.write_f32::<LittleEndian>(uv.x)?;
        }
        for uv in t.uvs {
            w.write_f32::<LittleEndian>(uv.y)?;
        }
        w.write_u8(t.smoothing_group)?;
        w.write_u8(group)?;
    }

    write_count(w, "groups", model.groups.len(), MAX_GROUPS)?;
    for g in &model.groups {
        w.write_u8(g.flags)?;
        write_padded(w, "group name", &g.name, NAME_LEN)?;
        write_count(w, "group triangles", g.triangles.len(), MAX_TRIANGLES)?;
        for &t in &g.triangles {
            w.write_u16::<LittleEndian>(t)?;
        }
        w.write_i8(g.material)?;
    }

    write_count(w, "materials", model.materials.len(), MAX_MATERIALS)?;
    for m in &model.materials {
        write_padded(w, "material name", &m.name, NAME_LEN)?;
        write_color(w, &m.ambient)?;
        write_color(w, &m.diffuse)?;
        write_color(w, &m.specular)?;
        write_color(w, &m.emissive)?;
        w.write_f32::<LittleEndian>(m.shininess)?;
        w.write_f32::<LittleEndian>(m.transparency)?;
        w.write_i8(m.mode)?;
        write_padded(w, "texture", &m.texture, PATH_LEN)?;
        write_padded(w, "alpha map", &m.alpha_map, PATH_LEN)?;
    }

    w.write_f32::<LittleEndian>(model.animation.fps)?;
    w.write_f32::<LittleEndian>(model.animation.current_time)?;
    w.write_u32::<LittleEndian>(model.animation.total_frames)?;

    write_count(w, "joints", model.joints.len(), MAX_JOINTS)?;
    for j in &model.joints {
        w.write_u8(j.flags)?;
        write_padded(w, "joint name", &j.name, NAME_LEN)?;
        write_padded(w, "joint parent", &j.parent, NAME_LEN)?;
        write_vec3(w, j.rotation)?;
        write_vec3(w, j.position)?;
        write_count(w, "rotation keys", j.rotation_keys.len(), usize::from(u16::MAX))?;
        write_count(w, "position keys", j.position_keys.len(), usize::from(u16::MAX))?;
        for k in &j.rotation_keys {
            write_keyframe(w, k)?;
        }
        for k in &j.position_keys {
            write_keyframe(w, k)?;
        }
    }

    if model.comments.is_none() && model.extensions.is_empty() {
        w.write_u32::<LittleEndian>(0)?;
        return Ok(());
    }
    let empty = Comments::default();
    let comments = model.comments.as_ref().unwrap_or(&empty);
    w.write_u32::<LittleEndian>(comments.sub_version.max(1))?;
    write_comments(w, &comments.groups)?;
    write_comments(w, &comments.materials)?;
    write_comments(w, &comments.joints)?;
    write_comments(w, &comments.model)?;
    write_extensions(w, model)
}

/// Writes a model into a freshly allocated buffer.
pub fn to_bytes(model: &Model) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(
        HEADER_SIZE
            + model.vertices.len() * VERTEX_SIZE
            + model.triangles.len() * TRIANGLE_SIZE
            + model.materials.len() * MATERIAL_SIZE,
    );
    write(&mut buf, model)?;
    Ok(buf)
}
