//! The Euler characteristic `V − E + F = 1` as a regression oracle across
//! mutation sequences.

use delaunay2d::prelude::*;

fn grid_points(n: usize) -> Vec<Point3> {
    let mut points = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            // Slight shear keeps four-point cocircularities rare.
            let x = i as f64 + 0.05 * j as f64;
            let y = j as f64 + 0.03 * i as f64;
            points.push(Point3::new(x, y, (x * y).sin()));
        }
    }
    points
}

#[test]
fn euler_holds_after_bulk_triangulation() {
    for n in [2, 3, 5, 8] {
        let mesh = TriangleMesh::from_points(&grid_points(n)).unwrap();
        assert_eq!(mesh.euler_characteristic(), 1, "grid {n}x{n}");
        validate_topology(&mesh).unwrap();
        validate_delaunay(&mesh).unwrap();
    }
}

#[test]
fn euler_holds_across_incremental_insertions() {
    let mut mesh = TriangleMesh::from_points(&grid_points(4)).unwrap();
    let probes = [
        (0.4, 0.7),
        (1.3, 1.9),
        (2.2, 0.6),
        (0.9, 2.4),
        (1.7, 1.1),
    ];
    for (x, y) in probes {
        mesh.insert_vertex(vertex!([x, y]), false).unwrap();
        assert_eq!(mesh.euler_characteristic(), 1, "after ({x}, {y})");
        validate_topology(&mesh).unwrap();
        validate_delaunay(&mesh).unwrap();
    }
}

#[test]
fn euler_holds_across_fill_removals() {
    let mut mesh = TriangleMesh::from_points(&grid_points(4)).unwrap();

    // Interior vertices of the sheared 4x4 grid.
    let interior = [(1.0 + 0.05, 1.0 + 0.03), (2.0 + 0.1, 2.0 + 0.06)];
    for (x, y) in interior {
        mesh.remove_vertex_fill(Point2::new(x, y)).unwrap();
        assert_eq!(mesh.euler_characteristic(), 1, "after removing ({x}, {y})");
        validate_topology(&mesh).unwrap();
    }
}

#[test]
fn flips_never_move_the_characteristic() {
    let mut mesh = TriangleMesh::from_points(&grid_points(3)).unwrap();
    let interior: Vec<_> = mesh
        .edges()
        .filter(|(_, e)| !e.is_boundary())
        .map(|(k, _)| k)
        .collect();
    for e in interior {
        mesh.flip_edge(e); // some refuse; both outcomes must preserve chi
        assert_eq!(mesh.euler_characteristic(), 1);
        validate_topology(&mesh).unwrap();
    }
}
