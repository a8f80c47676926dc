//! End-to-end checks on the canonical unit-square configuration.

use delaunay2d::prelude::*;

fn unit_square() -> TriangleMesh {
    TriangleMesh::from_points(&[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ])
    .unwrap()
}

#[test]
fn square_triangulates_into_two_triangles() {
    let mesh = unit_square();
    let counts = simplex_counts(&mesh);
    assert_eq!(counts.vertices, 4);
    assert_eq!(counts.edges, 5);
    assert_eq!(counts.triangles, 2);
    assert_eq!(counts.boundary_edges, 4);
    assert_eq!(mesh.euler_characteristic(), 1);
    assert!(mesh.is_valid());
}

#[test]
fn centroid_insertion_yields_four_triangles() {
    let mut mesh = unit_square();
    let outcome = mesh.insert_vertex(vertex!([0.5, 0.5]), false).unwrap();
    assert!(outcome.was_created());

    let counts = simplex_counts(&mesh);
    assert_eq!(counts.vertices, 5);
    assert_eq!(counts.edges, 8);
    assert_eq!(counts.triangles, 4);
    assert_eq!(mesh.euler_characteristic(), 1);
    assert!(mesh.is_valid());
}

#[test]
fn centroid_round_trip_restores_the_square() {
    let mut mesh = unit_square();
    mesh.insert_vertex(vertex!([0.5, 0.5]), false).unwrap();
    mesh.remove_vertex_fill(Point2::new(0.5, 0.5)).unwrap();

    let counts = simplex_counts(&mesh);
    assert_eq!(counts.vertices, 4);
    assert_eq!(counts.edges, 5);
    assert_eq!(counts.triangles, 2);
    assert!(mesh.is_valid());
}

#[test]
fn vertex_lookup_respects_tolerance() {
    let mesh = unit_square();
    assert!(mesh.find_vertex(Point2::new(1.0, 1.0)).is_some());
    assert!(mesh.find_vertex(Point2::new(0.5, 0.9)).is_none());

    let key = mesh.find_vertex(Point2::new(0.0, 1.0)).unwrap();
    assert_eq!(mesh.vertex(key).unwrap().parameter(), Point2::new(0.0, 1.0));
}

#[test]
fn mesh_survives_a_serde_round_trip() {
    let mut mesh = unit_square();
    mesh.insert_vertex(vertex!([0.3, 0.4, 0.7]), false).unwrap();

    let json = serde_json::to_string(&mesh).unwrap();
    let restored: TriangleMesh = serde_json::from_str(&json).unwrap();

    assert_eq!(simplex_counts(&restored), simplex_counts(&mesh));
    assert_eq!(restored.state(), mesh.state());
    assert!(restored.is_valid());
    // The restored mesh locates and evaluates like the original.
    let z0 = mesh.eval_z(0.3, 0.4, 1).unwrap();
    let z1 = restored.eval_z(0.3, 0.4, 1).unwrap();
    assert!((z0 - z1).abs() < 1e-12);
}

#[test]
fn degenerate_inputs_are_reported() {
    let mut collinear = TriangleMesh::new();
    for x in 0..5 {
        collinear
            .insert_vertex(vertex!([f64::from(x), 0.0]), false)
            .unwrap();
    }
    assert!(matches!(
        collinear.triangulate(),
        Err(MeshError::DegenerateGeometry { .. })
    ));

    let coincident = TriangleMesh::from_points(&[
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 2.0),
        Point3::new(1.0, 1.0, 4.0),
    ]);
    // Duplicate gathering collapses these into a single vertex.
    assert_eq!(coincident.unwrap().number_of_vertices(), 1);
}
