//! Reading and writing MilkShape 3D models.
//!
//! Models are read into the flat [`Model`], which mirrors the file layout.
//! [`import_scene`] and [`export_scene`] reconcile that model with the
//! per-object host [`Scene`](milkshake_mesh::Scene).

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use milkshake_mesh::Scene;

pub mod binary;
mod error;
pub mod model;
pub mod reconcile;
mod scene;
pub mod text;
pub mod tokenizer;
pub mod topology;

pub use error::{Error, Result};
pub use model::Model;
pub use scene::{export_scene, import_scene, ExportOptions, ImportOptions, DEFAULT_MATERIAL};
pub use topology::{group_by_topology, TopologyMatcher};

/// The two encodings of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Binary,
    Text,
}

impl Format {
    /// Picks the encoding from the file name alone: names ending in `.txt`
    /// (any case) are text, everything else binary.
    pub fn from_path<P: AsRef<Path>>(p: P) -> Self {
        let name = p.as_ref().to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".txt") {
            Format::Text
        } else {
            Format::Binary
        }
    }
}

pub fn read_model<P: AsRef<Path>>(p: P) -> Result<Model> {
    let format = Format::from_path(&p);
    let mut r = BufReader::new(File::open(p)?);
    match format {
        Format::Binary => binary::read(&mut r),
        Format::Text => text::read(r),
    }
}

pub fn write_model<P: AsRef<Path>>(p: P, model: &Model) -> Result<()> {
    let format = Format::from_path(&p);
    let mut w = BufWriter::new(File::create(p)?);
    match format {
        Format::Binary => binary::write(&mut w, model)?,
        Format::Text => text::write(&mut w, model)?,
    }
    w.flush()?;
    Ok(())
}

pub fn parse_ms3d(data: &[u8]) -> Result<Model> {
    let mut c = std::io::Cursor::new(data);
    binary::read(&mut c)
}

pub fn parse_ms3d_text(data: &str) -> Result<Model> {
    text::read(data.as_bytes())
}

/// Reads a model file and converts it to a host scene, resolving textures
/// against the file's directory.
pub fn import_file<P: AsRef<Path>>(p: P) -> Result<Scene> {
    let model = read_model(&p)?;
    let options = ImportOptions {
        texture_root: p.as_ref().parent().map(Path::to_path_buf),
    };
    import_scene(&model, &options)
}

/// Converts a host scene and writes it, storing texture paths relative to
/// the file's directory.
pub fn export_file<P: AsRef<Path>>(p: P, scene: &Scene) -> Result<()> {
    let options = ExportOptions {
        texture_root: p.as_ref().parent().map(Path::to_path_buf),
        ..Default::default()
    };
    let model = export_scene(scene, &options)?;
    write_model(p, &model)
}

pub trait Ms3dReader: Read {
    fn read_ms3d(&mut self) -> Result<Model>;
}

impl<T: Read> Ms3dReader for T {
    fn read_ms3d(&mut self) -> Result<Model> {
        binary::read(self)
    }
}

pub trait Ms3dWriter: Write {
    fn write_ms3d(&mut self, model: &Model) -> Result<()>;
}

impl<T: Write> Ms3dWriter for T {
    fn write_ms3d(&mut self, model: &Model) -> Result<()> {
        binary::write(self, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_suffix() {
        assert_eq!(Format::Text, Format::from_path("model.txt"));
        assert_eq!(Format::Text, Format::from_path("MODEL.TXT"));
        assert_eq!(Format::Binary, Format::from_path("model.ms3d"));
        assert_eq!(Format::Binary, Format::from_path("model.txt.bak"));
        assert_eq!(Format::Binary, Format::from_path("model"));
        assert_eq!(Format::Text, Format::from_path(".txt"));
        assert_eq!(Format::Text, Format::from_path("models/.TXT"));
    }
}
