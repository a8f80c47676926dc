//! Longer incremental insertion sequences against the validation oracles.

use delaunay2d::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn frame() -> TriangleMesh {
    TriangleMesh::from_points(&[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(10.0, 0.0, 0.0),
        Point3::new(10.0, 10.0, 0.0),
        Point3::new(0.0, 10.0, 0.0),
    ])
    .unwrap()
}

#[test]
fn interior_insertions_grow_counts_by_the_split_deltas() {
    let mut mesh = frame();
    let mut rng = StdRng::seed_from_u64(42);

    for step in 0..50 {
        let x: f64 = rng.gen_range(0.5..9.5);
        let y: f64 = rng.gen_range(0.5..9.5);
        let before = simplex_counts(&mesh);

        let outcome = mesh
            .insert_vertex(vertex!([x, y, rng.gen_range(-1.0..1.0)]), false)
            .unwrap();
        assert!(outcome.was_created(), "step {step}");

        let after = simplex_counts(&mesh);
        assert_eq!(after.vertices, before.vertices + 1);
        // A triangle split adds (3 edges, 2 triangles); an interior edge
        // split the same; a boundary edge split (2, 1). Flips change
        // neither count.
        let de = after.edges - before.edges;
        let dt = after.triangles - before.triangles;
        assert!(
            (de, dt) == (3, 2) || (de, dt) == (2, 1),
            "step {step}: unexpected deltas ({de}, {dt})"
        );
        assert_eq!(mesh.euler_characteristic(), 1);
    }

    validate_topology(&mesh).unwrap();
    validate_delaunay(&mesh).unwrap();
    assert_eq!(mesh.boundary_edges().count(), 4);
}

#[test]
fn insertions_outside_the_hull_never_mutate() {
    let mut mesh = frame();
    let before = simplex_counts(&mesh);

    for (x, y) in [(-1.0, 5.0), (11.0, 5.0), (5.0, -0.5), (20.0, 20.0)] {
        let err = mesh.insert_vertex(vertex!([x, y]), false).unwrap_err();
        assert_eq!(err, MeshError::OutsideHull { x, y });
    }
    assert_eq!(simplex_counts(&mesh), before);
}

#[test]
fn mixed_insert_and_remove_sequence_stays_valid() {
    let mut mesh = frame();
    let mut rng = StdRng::seed_from_u64(7);

    let mut inserted: Vec<Point2> = Vec::new();
    for _ in 0..30 {
        let p = Point2::new(rng.gen_range(1.0..9.0), rng.gen_range(1.0..9.0));
        if mesh.insert_vertex(vertex!([p.x, p.y]), false).unwrap().was_created() {
            inserted.push(p);
        }
    }
    // Remove every third inserted vertex with re-fill.
    for p in inserted.iter().step_by(3) {
        match mesh.remove_vertex_fill(*p) {
            Ok(()) | Err(MeshError::DegenerateGeometry { .. }) => {}
            Err(e) => panic!("unexpected removal failure: {e}"),
        }
        validate_topology(&mesh).unwrap();
    }
}

#[test]
fn removing_every_vertex_empties_the_mesh() {
    let mut rng = StdRng::seed_from_u64(13);
    let points: Vec<Point3> = (0..20)
        .map(|_| Point3::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0), 0.0))
        .collect();
    let mut mesh = TriangleMesh::from_points(&points).unwrap();
    assert!(mesh.number_of_triangles() > 0);

    let positions: Vec<Point2> = mesh.vertices().map(|(_, v)| v.parameter()).collect();
    for p in positions {
        mesh.remove_vertex(p).unwrap();
        validate_topology(&mesh).unwrap();
    }

    assert_eq!(mesh.number_of_vertices(), 0);
    assert_eq!(mesh.number_of_edges(), 0);
    assert_eq!(mesh.number_of_triangles(), 0);
    assert!(mesh.is_punctured());
}

#[test]
fn gathered_duplicates_collapse_once_triangulated() {
    let mut mesh = TriangleMesh::new();
    for _ in 0..3 {
        for (x, y) in [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (2.0, 1.0)] {
            mesh.insert_vertex(vertex!([x, y]), false).unwrap();
        }
    }
    assert_eq!(mesh.number_of_vertices(), 5);

    mesh.triangulate().unwrap();
    assert_eq!(mesh.number_of_vertices(), 5);
    assert_eq!(mesh.euler_characteristic(), 1);
    validate_delaunay(&mesh).unwrap();
}
