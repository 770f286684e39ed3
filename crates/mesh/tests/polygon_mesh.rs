use milkshake_mesh::{ordered3, Face, PolygonMesh, Triangle, TriangleMesh, Vector3, VertexIndex};

fn square() -> PolygonMesh {
    PolygonMesh {
        vertices: vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ],
        faces: vec![Face {
            vertices: vec![0, 1, 2, 3],
            ..Default::default()
        }],
        ..Default::default()
    }
}

#[test]
fn polygons_are_fanned() {
    let mesh = square();
    let x0 = Vector3::new(0.0, 0.0, 0.0);
    let x1 = Vector3::new(1.0, 0.0, 0.0);
    let x2 = Vector3::new(1.0, 1.0, 0.0);
    let x3 = Vector3::new(0.0, 1.0, 0.0);
    let mut triangles = mesh.triangles();
    assert_eq!(
        Some(Triangle {
            p0: x0,
            p1: x1,
            p2: x2
        }),
        triangles.next()
    );
    assert_eq!(
        Some(Triangle {
            p0: x0,
            p1: x2,
            p2: x3
        }),
        triangles.next()
    );
    assert_eq!(None, triangles.next());
}

#[test]
fn neighbours_see_shared_edges_reversed() {
    let mesh = square();
    let triangles: Vec<Triangle> = mesh.triangles().collect();
    let forward = triangles[0].edges();
    let reversed = triangles[1].reverse_edges();
    // The diagonal 0-2 is walked 2->0 by the first and 0->2 by the second.
    assert!(reversed.iter().any(|e| forward.contains(e)));
    assert_eq!(
        vec![(0, 1), (1, 2), (2, 3), (3, 0)],
        mesh.half_edges()
    );
}

#[test]
fn corners_dedup_by_position() {
    let mesh = square();
    let mut index = VertexIndex::new();
    let ids: Vec<u32> = mesh
        .triangles()
        .flat_map(|t| [t.p0, t.p1, t.p2])
        .map(|p| index.insert(ordered3(p)))
        .collect();
    assert_eq!(vec![0, 1, 2, 0, 2, 3], ids);
    assert_eq!(4, index.len());
}
