use float_eq::assert_float_eq;
use milkshake_mesh::{Vector2, Vector3};
use milkshake_ms3d::model::{Joint, Keyframe};
use milkshake_ms3d::tokenizer::{parse_fields, Field};
use milkshake_ms3d::{parse_ms3d, parse_ms3d_text, text, Error, Model};
use milkshake_test_data::{MS3D_QUAD, MS3D_SKINNED, TXT_QUAD, TXT_QUAD_COMMENTED};

fn to_text(model: &Model) -> String {
    let mut out = Vec::new();
    text::write(&mut out, model).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn binary_quad_as_text() {
    let model = parse_ms3d(MS3D_QUAD.bytes).unwrap();
    assert_eq!(TXT_QUAD, to_text(&model));
}

#[test]
fn text_quad_gives_one_group_per_mesh() {
    let model = parse_ms3d_text(TXT_QUAD).unwrap();
    // Each text mesh brings its own copy of the shared vertices.
    assert_eq!(6, model.vertices.len());
    assert_eq!(2, model.triangles.len());
    assert_eq!(vec![0], model.groups[0].triangles);
    assert_eq!(vec![1], model.groups[1].triangles);
    assert_eq!("blue", model.materials[1].name);
    assert_eq!("red.bmp", model.materials[0].texture);
    assert!(model.groups_partition_triangles());

    let counts: Vec<u8> = model.vertices.iter().map(|v| v.ref_count).collect();
    assert_eq!(vec![1; 6], counts);
}

#[test]
fn text_round_trip_is_stable() {
    let model = parse_ms3d_text(TXT_QUAD).unwrap();
    assert_eq!(TXT_QUAD, to_text(&model));
}

#[test]
fn commented_input() {
    let model = parse_ms3d_text(TXT_QUAD_COMMENTED).unwrap();
    assert_eq!(4, model.vertices.len());
    assert_eq!(2, model.triangles.len());
    assert_eq!("Quad", model.groups[0].name);
    assert_eq!(-1, model.groups[0].material);
    assert_eq!(10, model.animation.total_frames);
    assert_eq!(Vector2::new(1.0, 1.0), model.triangles[1].uvs[2]);
    assert_eq!(Vector3::new(0.0, 0.0, 1.0), model.triangles[1].normals[0]);
}

#[test]
fn bones_round_trip() {
    let mut model = parse_ms3d(MS3D_SKINNED.bytes).unwrap();
    model.joints.push(Joint {
        flags: 8,
        name: "tip".into(),
        parent: "root".into(),
        rotation: Vector3::new(0.1, 0.2, 0.3),
        position: Vector3::new(0.0, 1.0, 0.0),
        rotation_keys: vec![Keyframe {
            time: 0.5,
            value: Vector3::new(0.0, 0.0, 1.5),
        }],
        position_keys: vec![],
    });

    let back = parse_ms3d_text(&to_text(&model)).unwrap();
    assert_eq!(2, back.joints.len());
    let tip = &back.joints[1];
    assert_eq!("tip", tip.name);
    assert_eq!("root", tip.parent);
    assert_eq!(8, tip.flags);
    assert_float_eq!(0.3, tip.rotation.z, abs <= 1e-6);
    assert!(tip.position_keys.is_empty());
    assert_float_eq!(1.5, tip.rotation_keys[0].value.z, abs <= 1e-6);
    assert_eq!(2, back.joints[0].position_keys.len());
    assert_eq!(0, back.vertices[0].bone);

    let comments = back.comments.unwrap();
    assert_eq!("body group", comments.groups[0].text);
    assert_eq!("skinned quad", comments.model[0].text);
    assert!(back.extensions.is_empty());
}

#[test]
fn six_decimal_floats() {
    let mut model = parse_ms3d(MS3D_QUAD.bytes).unwrap();
    model.vertices[3].position.x = 1.0 / 3.0;
    let text = to_text(&model);
    assert!(text.contains("0 0.333333 1.000000 0.000000 1.000000 1.000000 -1"));
    let back = parse_ms3d_text(&text).unwrap();
    assert_float_eq!(1.0 / 3.0, back.vertices[5].position.x, abs <= 1e-6);
}

#[test]
fn literal_header_line() {
    assert_eq!(
        vec![Field::Str("MeshA".into()), Field::Int(0), Field::Int(0)],
        parse_fields("\"MeshA\" 0 0", "s i i", 1).unwrap()
    );
    assert!(matches!(
        parse_fields("\"MeshA\" 0", "s i i", 1),
        Err(Error::MalformedText { .. })
    ));
}

#[test]
fn missing_field_in_mesh_header() {
    let text = TXT_QUAD.replacen("\"Red\" 0 0", "\"Red\" 0", 1);
    match parse_ms3d_text(&text).unwrap_err() {
        Error::MalformedText { line, message } => {
            assert_eq!(7, line);
            assert_eq!("expected integer, found end of line", message);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn material_index_must_exist() {
    let text = TXT_QUAD.replacen("\"Blue\" 0 1", "\"Blue\" 0 5", 1);
    assert!(matches!(
        parse_ms3d_text(&text),
        Err(Error::IndexOutOfRange {
            kind: "material",
            ..
        })
    ));
}
