use std::fmt::Write;
use std::path::Path;

use anyhow::Context;
use milkshake_ms3d::{
    export_scene, import_scene, read_model, write_model, ExportOptions, ImportOptions, Model,
};

use crate::args::ConvertArgs;

/// Summarizes a model file.
pub fn info(path: &Path) -> anyhow::Result<String> {
    let model =
        read_model(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut out = String::new();
    summarize(&mut out, &model)?;
    Ok(out)
}

fn summarize<W: Write>(out: &mut W, model: &Model) -> std::fmt::Result {
    writeln!(out, "vertices:  {}", model.vertices.len())?;
    writeln!(out, "triangles: {}", model.triangles.len())?;
    writeln!(out, "groups:    {}", model.groups.len())?;
    for g in &model.groups {
        let material = match model.material(g.material) {
            Ok(Some(m)) => m.name.as_str(),
            _ => "-",
        };
        writeln!(
            out,
            "  {:?}: {} triangles, material {material}",
            g.name,
            g.triangles.len()
        )?;
    }
    writeln!(out, "materials: {}", model.materials.len())?;
    writeln!(out, "joints:    {}", model.joints.len())?;
    let a = &model.animation;
    writeln!(
        out,
        "animation: {} fps, frame {} of {}",
        a.fps, a.current_time, a.total_frames
    )?;
    if let Some(comments) = &model.comments {
        let count = comments.groups.len()
            + comments.materials.len()
            + comments.joints.len()
            + comments.model.len();
        writeln!(out, "comments:  {count}")?;
    }
    let e = &model.extensions;
    if let Some(vertices) = &e.vertices {
        writeln!(
            out,
            "vertex extras: {} (sub-version {})",
            vertices.entries.len(),
            vertices.sub_version
        )?;
    }
    if let Some(joints) = &e.joints {
        writeln!(out, "joint extras:  {}", joints.len())?;
    }
    if e.model.is_some() {
        writeln!(out, "model extras:  yes")?;
    }
    Ok(())
}

pub fn convert(args: &ConvertArgs) -> anyhow::Result<()> {
    let mut model = read_model(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    if args.reconcile {
        let scene = import_scene(
            &model,
            &ImportOptions {
                texture_root: args.input.parent().map(Path::to_path_buf),
            },
        )?;
        log::info!(
            "{} group(s) reconciled into {} object(s)",
            model.groups.len(),
            scene.objects.len()
        );
        let exported = export_scene(
            &scene,
            &ExportOptions {
                texture_root: args.output.parent().map(Path::to_path_buf),
                ..Default::default()
            },
        )?;
        model = Model {
            animation: model.animation,
            joints: model.joints,
            ..exported
        };
    }
    write_model(&args.output, &model)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    Ok(())
}
