use std::fs;

use milkshake_ms3d::{
    export_file, import_file, parse_ms3d, read_model, write_model, Error, Format,
};
use milkshake_test_data::{MS3D_QUAD, TXT_QUAD};
use tempfile::tempdir;

#[test]
fn binary_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("quad.ms3d");
    let model = parse_ms3d(MS3D_QUAD.bytes).unwrap();
    write_model(&path, &model).unwrap();
    assert_eq!(MS3D_QUAD.bytes, fs::read(&path).unwrap().as_slice());
    assert_eq!(model, read_model(&path).unwrap());
}

#[test]
fn suffix_picks_text() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("quad.TXT");
    assert_eq!(Format::Text, Format::from_path(&path));
    let model = parse_ms3d(MS3D_QUAD.bytes).unwrap();
    write_model(&path, &model).unwrap();
    assert_eq!(TXT_QUAD, fs::read_to_string(&path).unwrap());
    assert_eq!(2, read_model(&path).unwrap().groups.len());
}

#[test]
fn missing_file() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        read_model(dir.path().join("nope.ms3d")),
        Err(Error::Io(_))
    ));
}

#[test]
fn text_parsed_as_binary() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("quad.ms3d");
    fs::write(&path, TXT_QUAD).unwrap();
    assert!(matches!(read_model(&path), Err(Error::InvalidFormat(_))));
}

#[test]
fn scene_files_keep_textures_next_to_the_model() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("quad.ms3d");
    fs::write(&source, MS3D_QUAD.bytes).unwrap();

    let scene = import_file(&source).unwrap();
    assert_eq!(
        Some(dir.path().join("red.bmp")),
        scene.material("red").unwrap().maps.diffuse
    );

    let target = dir.path().join("copy.ms3d");
    export_file(&target, &scene).unwrap();
    let model = read_model(&target).unwrap();
    assert_eq!("red.bmp", model.materials[0].texture);
    assert_eq!("", model.materials[1].texture);
    assert_eq!("Red_red", model.groups[0].name);
    assert_eq!("Red_blue", model.groups[1].name);
}
