use milkshake_mesh::{Face, Object, PolygonMesh, Scene, Vector2, Vector3};
use milkshake_ms3d::model::{Group, Triangle, Vertex};
use milkshake_ms3d::reconcile::{expand, flatten, Mesh};
use milkshake_ms3d::{
    export_scene, import_scene, parse_ms3d, Error, ExportOptions, ImportOptions, Model,
    DEFAULT_MATERIAL,
};
use milkshake_test_data::{MS3D_QUAD, MS3D_SKINNED};

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

fn group(name: &str, triangles: Vec<u16>) -> Group {
    Group {
        flags: 0,
        name: name.into(),
        triangles,
        material: -1,
    }
}

/// Two triangles over four vertices, one per group, sharing the edge 1-2.
fn split_quad(corner: Vector3) -> Model {
    let mut model = Model::default();
    for p in [
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        corner,
    ] {
        model.vertices.push(Vertex::new(p));
    }
    model.triangles = vec![triangle([0, 1, 2]), triangle([2, 1, 3])];
    model.groups = vec![group("a", vec![0]), group("b", vec![1])];
    model
}

fn quad_object(materials: [&str; 2]) -> Object {
    let face = |vertices: Vec<u32>, material: &str| Face {
        texcoords: vertices.clone(),
        vertices,
        normals: vec![0, 0, 0],
        materials: vec![material.to_string()],
        smoothing_group: 1,
    };
    Object {
        name: Some("Quad".into()),
        mesh: PolygonMesh {
            vertices: vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::new(1.0, 1.0, 0.0),
            ],
            normals: vec![Vector3::new(0.0, 0.0, 1.0)],
            texcoords: vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(0.0, 1.0),
                Vector2::new(1.0, 1.0),
            ],
            faces: vec![
                face(vec![0, 1, 2], materials[0]),
                face(vec![2, 1, 3], materials[1]),
            ],
        },
    }
}

#[test]
fn import_merges_groups_sharing_an_edge() {
    let model = parse_ms3d(MS3D_QUAD.bytes).unwrap();
    let scene = import_scene(&model, &ImportOptions::default()).unwrap();

    assert_eq!(1, scene.objects.len());
    let object = &scene.objects[0];
    assert_eq!(Some("Red"), object.name.as_deref());
    assert_eq!(2, object.mesh.faces.len());
    assert_eq!(6, object.mesh.vertices.len());
    assert_eq!(vec!["red".to_string()], object.mesh.faces[0].materials);
    assert_eq!(vec!["blue".to_string()], object.mesh.faces[1].materials);
    assert_eq!(vec![3, 4, 5], object.mesh.faces[1].vertices);

    assert_eq!(2, scene.materials.len());
    let red = scene.material("red").unwrap();
    assert_eq!([1.0, 0.0, 0.0, 1.0], red.diffuse);
    assert_eq!(Some("red.bmp".into()), red.maps.diffuse);
    assert_eq!(None, red.maps.alpha);
}

#[test]
fn import_resolves_textures() {
    let model = parse_ms3d(MS3D_SKINNED.bytes).unwrap();
    let options = ImportOptions {
        texture_root: Some("/models".into()),
    };
    let scene = import_scene(&model, &options).unwrap();
    assert_eq!(
        Some("/models/skin.bmp".into()),
        scene.materials[0].maps.diffuse
    );
}

#[test]
fn one_ulp_keeps_meshes_apart() {
    let shared = split_quad(Vector3::new(1.0, 1.0, 0.0));
    let scene = import_scene(&shared, &ImportOptions::default()).unwrap();
    assert_eq!(1, scene.objects.len());

    // Shift vertex 2 of the second group by one ulp so the edges no longer
    // coincide exactly.
    let mut apart = shared.clone();
    let nudged = apart.vertices.len() as u16;
    let y = f32::from_bits(1.0f32.to_bits() + 1);
    apart.vertices.push(Vertex::new(Vector3::new(0.0, y, 0.0)));
    apart.triangles[1].vertices[0] = nudged;
    apart.update_ref_counts().unwrap();
    let scene = import_scene(&apart, &ImportOptions::default()).unwrap();
    assert_eq!(2, scene.objects.len());
    assert_eq!(Some("a"), scene.objects[0].name.as_deref());
    assert_eq!(Some("b"), scene.objects[1].name.as_deref());
}

#[test]
fn unnamed_group_imports_as_none() {
    let mut model = split_quad(Vector3::new(1.0, 1.0, 0.0));
    model.groups[0].name.clear();
    let scene = import_scene(&model, &ImportOptions::default()).unwrap();
    assert_eq!(Some("None"), scene.objects[0].name.as_deref());
    assert_eq!(
        vec![DEFAULT_MATERIAL.to_string()],
        scene.objects[0].mesh.faces[0].materials
    );
}

#[test]
fn export_splits_by_material() {
    let scene = Scene {
        objects: vec![quad_object(["red", "blue"])],
        materials: vec![
            milkshake_mesh::Material::new("red"),
            milkshake_mesh::Material::new("blue"),
        ],
    };
    let model = export_scene(&scene, &ExportOptions::default()).unwrap();

    assert_eq!(2, model.groups.len());
    assert_eq!("Quad_red", model.groups[0].name);
    assert_eq!(0, model.groups[0].material);
    assert_eq!("Quad_blue", model.groups[1].name);
    assert_eq!(1, model.groups[1].material);
    assert_eq!(6, model.vertices.len());
    assert_eq!(1.0, model.materials[0].transparency);
    assert!(model.groups_partition_triangles());

    // Importing the export brings the surface back together.
    let back = import_scene(&model, &ImportOptions::default()).unwrap();
    assert_eq!(1, back.objects.len());
    assert_eq!(Some("Quad_red"), back.objects[0].name.as_deref());
}

#[test]
fn export_shares_corners_within_a_material() {
    let scene = Scene {
        objects: vec![quad_object(["red", "red"])],
        materials: vec![milkshake_mesh::Material::new("red")],
    };
    let model = export_scene(&scene, &ExportOptions::default()).unwrap();
    assert_eq!(1, model.groups.len());
    assert_eq!(4, model.vertices.len());
    let counts: Vec<u8> = model.vertices.iter().map(|v| v.ref_count).collect();
    assert_eq!(vec![1, 2, 2, 1], counts);
}

#[test]
fn export_unknown_material_has_no_index() {
    let scene = Scene {
        objects: vec![quad_object(["red", "missing"])],
        materials: vec![milkshake_mesh::Material::new("red")],
    };
    let model = export_scene(&scene, &ExportOptions::default()).unwrap();
    assert_eq!(-1, model.groups[1].material);
}

#[test]
fn export_untagged_faces_use_the_default_material() {
    let mut object = quad_object(["a", "b"]);
    for face in &mut object.mesh.faces {
        face.materials.clear();
    }
    let scene = Scene {
        objects: vec![object],
        materials: vec![milkshake_mesh::Material::new(DEFAULT_MATERIAL)],
    };
    let model = export_scene(&scene, &ExportOptions::default()).unwrap();
    assert_eq!(1, model.groups.len());
    assert_eq!("Quad_default", model.groups[0].name);
    assert_eq!(0, model.groups[0].material);
}

#[test]
fn export_rejects_polygons() {
    let mut object = quad_object(["red", "red"]);
    object.mesh.faces[0].vertices.push(3);
    let scene = Scene {
        objects: vec![object],
        materials: vec![],
    };
    match export_scene(&scene, &ExportOptions::default()).unwrap_err() {
        Error::MalformedFace { object, face, .. } => {
            assert_eq!("Quad", object);
            assert_eq!(0, face);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn export_relative_textures() {
    let mut material = milkshake_mesh::Material::new("red");
    material.maps.diffuse = Some("/models/tex/red.bmp".into());
    let scene = Scene {
        objects: vec![quad_object(["red", "red"])],
        materials: vec![material],
    };
    let options = ExportOptions {
        texture_root: Some("/models".into()),
        ..Default::default()
    };
    let model = export_scene(&scene, &options).unwrap();
    assert_eq!("tex/red.bmp", model.materials[0].texture);
    assert_eq!("", model.materials[0].alpha_map);
}

#[test]
fn expand_then_flatten_keeps_triangles() {
    let model = parse_ms3d(MS3D_QUAD.bytes).unwrap();
    let meshes = expand(&model).unwrap();
    assert_eq!(3, meshes[1].vertices.len());
    assert_eq!([0, 1, 2], meshes[1].faces[0].vertices);

    let flat = flatten(&meshes).unwrap();
    assert_eq!(2, flat.triangles.len());
    assert_eq!([3, 4, 5], flat.triangles[1].vertices);
    assert_eq!(model.triangles[1].uvs, flat.triangles[1].uvs);
    assert_eq!(
        model.vertices[3].position,
        flat.vertices[flat.triangles[1].vertices[2] as usize].position
    );
}

#[test]
fn flatten_enforces_group_limit() {
    let meshes = vec![Mesh::default(); 256];
    assert!(matches!(
        flatten(&meshes),
        Err(Error::LimitExceeded { kind: "groups", .. })
    ));
}
