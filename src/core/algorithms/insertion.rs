//! Incremental construction: bulk triangulation, single-vertex weaving, and
//! the split operators.
//!
//! The bulk build bootstraps from a synthetic triangle large enough to
//! contain every gathered vertex, weaves the real vertices in one by one
//! (split + local Delaunay repair), removes the synthetic corners again, and
//! repairs the boundary back to the convex hull by clipping the notches the
//! removal left behind.
//!
//! Both split operators reuse the existing element keys where they can: an
//! edge split keeps its edge key for the half on the first endpoint's side
//! and keeps each adjacent triangle key for the sub-triangle on that same
//! side, so handles held across an insertion stay valid.

use crate::core::algorithms::{flips, locate, removal};
use crate::core::bucket_grid::BucketGrid;
use crate::core::collections::{FastHashMap, SmallBuffer, VERTEX_DEGREE_INLINE};
use crate::core::mesh::{
    EdgeKey, InsertOutcome, MeshError, MeshState, TriangleKey, TriangleMesh, VertexKey,
};
use crate::core::vertex::Vertex;
use crate::geometry::point::{Point2, Point3};
use crate::geometry::predicates::{in_triangle_strict, orientation, Orientation};

/// Inserts `vertex` into the mesh; see
/// [`TriangleMesh::insert_vertex`](crate::core::mesh::TriangleMesh::insert_vertex).
pub(crate) fn insert_vertex(
    mesh: &mut TriangleMesh,
    vertex: Vertex,
    constrained: bool,
) -> Result<InsertOutcome, MeshError> {
    if !vertex.position().is_finite() {
        return Err(MeshError::DegenerateGeometry {
            message: "vertex position is not finite".into(),
        });
    }
    let p = vertex.parameter();

    // Position identity: re-inserting an existing parameter point updates
    // the stored vertex instead of growing the mesh.
    if let Some(existing) = mesh.find_vertex(p) {
        let old = mesh.vertices[existing].position();
        let slot = &mut mesh.vertices[existing];
        slot.set_position(Point3::new(old.x, old.y, vertex.position().z));
        if let Some(n) = vertex.stored_normal() {
            slot.set_normal(Some(n));
        }
        slot.set_constrained(constrained);
        return Ok(InsertOutcome::Updated(existing));
    }

    match mesh.state {
        MeshState::Gathering => {
            let mut vertex = vertex;
            vertex.set_constrained(constrained);
            Ok(InsertOutcome::Created(mesh.vertices.insert(vertex)))
        }
        MeshState::Triangulated => {
            // Locate before touching the arena so a rejected insertion
            // leaves no trace.
            let location = mesh.locate(p);
            if location == locate::PointLocation::OutsideHull {
                return Err(MeshError::OutsideHull { x: p.x, y: p.y });
            }
            let mut vertex = vertex;
            vertex.set_constrained(constrained);
            let key = mesh.vertices.insert(vertex);
            let seeds = match location {
                locate::PointLocation::Inside(t) => split_triangle(mesh, t, key),
                locate::PointLocation::OnEdge(e) => split_edge(mesh, e, key),
                locate::PointLocation::OutsideHull => unreachable!("checked above"),
            };
            flips::restore_delaunay(mesh, &seeds);
            Ok(InsertOutcome::Created(key))
        }
    }
}

/// Splits triangle `t` into three at interior vertex `v`.
///
/// `t` keeps its key as the sub-triangle over its first edge. Adds three
/// edges and two triangles; returns the original rim edges as Delaunay
/// repair seeds.
pub(crate) fn split_triangle(
    mesh: &mut TriangleMesh,
    t: TriangleKey,
    v: VertexKey,
) -> SmallBuffer<EdgeKey, 4> {
    let [a, b, c] = mesh.triangle_vertices(t);
    let [e0, e1, e2] = mesh.triangles[t].edges();

    let sa = mesh.create_edge(v, a);
    let sb = mesh.create_edge(v, b);
    let sc = mesh.create_edge(v, c);

    // t shrinks to (a, b, v); the other two rim edges move to new triangles.
    mesh.edges[e1].detach_triangle(t);
    mesh.edges[e2].detach_triangle(t);
    mesh.triangles[t].set_edges([e0, sb, sa]);
    mesh.edges[sa].attach_triangle(t);
    mesh.edges[sb].attach_triangle(t);
    mesh.adjust_triangle(t, false);

    mesh.create_triangle([e1, sc, sb]);
    mesh.create_triangle([e2, sa, sc]);

    let mut seeds = SmallBuffer::new();
    seeds.extend([e0, e1, e2]);
    seeds
}

/// Splits edge `e` at vertex `v`, splitting each adjacent triangle in two.
///
/// `e` keeps its key as the half toward its first endpoint. For an interior
/// edge this adds three edges and two triangles; on a boundary edge, two
/// edges and one triangle. Splitting a constrained edge leaves both halves
/// constrained and marks `v` constrained. Returns the rim edges of the
/// affected triangles as Delaunay repair seeds.
pub(crate) fn split_edge(
    mesh: &mut TriangleMesh,
    e: EdgeKey,
    v: VertexKey,
) -> SmallBuffer<EdgeKey, 4> {
    let [a, b] = mesh.edges[e].vertices();
    let was_constrained = mesh.edges[e].is_constrained();

    // Capture the per-triangle rim before the edge is rewired; the winding
    // helpers depend on the old endpoints.
    let mut fans: SmallBuffer<(TriangleKey, EdgeKey, EdgeKey), 2> = SmallBuffer::new();
    for t in mesh.edges[e].triangle_keys() {
        let c = mesh
            .opposite_vertex(t, e)
            .expect("split edge belongs to triangle");
        let rim = |x: VertexKey| {
            mesh.triangles[t]
                .edges()
                .into_iter()
                .find(|&k| k != e && mesh.edges[k].has_vertex(c) && mesh.edges[k].has_vertex(x))
                .expect("triangle rim edge")
        };
        fans.push((t, rim(a), rim(b)));
    }

    // e becomes (a, v); a fresh edge covers (v, b).
    mesh.vertices[b].detach_edge(e);
    mesh.edges[e].set_vertices(a, v);
    mesh.vertices[v].attach_edge(e);
    let e2 = mesh.create_edge(v, b);
    if was_constrained {
        mesh.edges[e2].set_constrained(true);
        mesh.vertices[v].set_constrained(true);
    }

    let mut seeds = SmallBuffer::new();
    for (t, ca, cb) in fans {
        let c = mesh.common_vertex(ca, cb).expect("rim edges share the apex");
        let spoke = mesh.create_edge(c, v);

        // t shrinks to (a, v, c); a new triangle covers (v, b, c).
        mesh.edges[cb].detach_triangle(t);
        mesh.triangles[t].set_edges([e, spoke, ca]);
        mesh.edges[spoke].attach_triangle(t);
        mesh.adjust_triangle(t, false);
        mesh.create_triangle([e2, cb, spoke]);

        seeds.push(ca);
        seeds.push(cb);
    }
    seeds
}

/// Builds the Delaunay triangulation of all gathered vertices; see
/// [`TriangleMesh::triangulate`](crate::core::mesh::TriangleMesh::triangulate).
pub(crate) fn triangulate(mesh: &mut TriangleMesh) -> Result<(), MeshError> {
    if mesh.vertices.len() < 3 {
        return Ok(());
    }
    clear_topology(mesh);

    let Some(bounds) = mesh.vertex_bounds() else {
        return Ok(());
    };
    let extent = bounds.extent();
    if !extent.is_finite() || extent <= 0.0 {
        return Err(MeshError::DegenerateGeometry {
            message: "vertex set has no planar extent".into(),
        });
    }
    mesh.eps = mesh.config.position_tolerance * extent;

    // The grid gets a small skirt so hull points never fall off it to
    // floating-point noise.
    let pad = extent * 5e-3;
    let mut grid_bounds = bounds;
    grid_bounds.min = Point2::new(bounds.min.x - pad, bounds.min.y - pad);
    grid_bounds.max = Point2::new(bounds.max.x + pad, bounds.max.y + pad);
    let depth = BucketGrid::depth_for(mesh.vertices.len(), mesh.config.max_grid_depth);
    mesh.grid = BucketGrid::new(grid_bounds, depth);

    // Synthetic bounding triangle, large enough that every gathered vertex
    // is strictly interior.
    let s = extent;
    let corners = [
        Point3::new(bounds.min.x - s, bounds.min.y - s, 0.0),
        Point3::new(bounds.max.x + 3.0 * s, bounds.min.y - s, 0.0),
        Point3::new(bounds.min.x - s, bounds.max.y + 3.0 * s, 0.0),
    ];
    let synthetic = corners.map(|p| mesh.vertices.insert(Vertex::new(p)));
    let ea = mesh.create_edge(synthetic[0], synthetic[1]);
    let eb = mesh.create_edge(synthetic[1], synthetic[2]);
    let ec = mesh.create_edge(synthetic[2], synthetic[0]);
    mesh.create_triangle([ea, eb, ec]);
    mesh.state = MeshState::Triangulated;

    let real: Vec<VertexKey> = mesh
        .vertices
        .keys()
        .filter(|k| !synthetic.contains(k))
        .collect();
    for v in real {
        if let Err(err) = weave(mesh, v) {
            abort_build(mesh, synthetic);
            return Err(err);
        }
    }

    for corner in synthetic {
        removal::remove_vertex(mesh, corner);
    }
    repair_hull(mesh);

    // One global repair pass: hull clipping can introduce locally
    // non-Delaunay diagonals.
    let interior: Vec<EdgeKey> = mesh
        .edges
        .iter()
        .filter(|(_, e)| !e.is_boundary())
        .map(|(k, _)| k)
        .collect();
    flips::restore_delaunay(mesh, &interior);

    if mesh.triangles.is_empty() {
        // Collinear input: every triangle touched a synthetic corner.
        abort_build(mesh, synthetic);
        return Err(MeshError::DegenerateGeometry {
            message: "gathered vertices are collinear".into(),
        });
    }
    mesh.punctured = false;
    Ok(())
}

/// Abandons a partial bulk build: drops all topology and any synthetic
/// corner vertices still present, returning the mesh to gathering so the
/// caller sees only the vertices it inserted.
fn abort_build(mesh: &mut TriangleMesh, synthetic: [VertexKey; 3]) {
    clear_topology(mesh);
    for corner in synthetic {
        mesh.vertices.remove(corner);
    }
    mesh.state = MeshState::Gathering;
}

/// Weaves one gathered vertex into the topology during the bulk build.
fn weave(mesh: &mut TriangleMesh, v: VertexKey) -> Result<(), MeshError> {
    let p = mesh.vertices[v].parameter();
    let seeds = match mesh.locate(p) {
        locate::PointLocation::Inside(t) => split_triangle(mesh, t, v),
        locate::PointLocation::OnEdge(e) => {
            // The scaled tolerance can reveal near-duplicates the gathering
            // tolerance missed; merge instead of creating a sliver.
            let [p0, p1] = mesh.edges[e].vertices();
            for existing in [p0, p1] {
                if mesh.vertices[existing].parameter().distance(&p) <= mesh.eps {
                    merge_into(mesh, v, existing);
                    return Ok(());
                }
            }
            split_edge(mesh, e, v)
        }
        locate::PointLocation::OutsideHull => {
            return Err(MeshError::DegenerateGeometry {
                message: format!("vertex ({}, {}) escaped the bounding triangle", p.x, p.y),
            });
        }
    };
    flips::restore_delaunay(mesh, &seeds);
    Ok(())
}

/// Folds an unwoven duplicate into the vertex already in the topology.
fn merge_into(mesh: &mut TriangleMesh, duplicate: VertexKey, survivor: VertexKey) {
    let Some(dup) = mesh.vertices.remove(duplicate) else {
        return;
    };
    let old = mesh.vertices[survivor].position();
    let slot = &mut mesh.vertices[survivor];
    slot.set_position(Point3::new(old.x, old.y, dup.position().z));
    if let Some(n) = dup.stored_normal() {
        slot.set_normal(Some(n));
    }
    if dup.is_constrained() {
        slot.set_constrained(true);
    }
}

/// Clips boundary notches until the boundary is the convex hull again.
///
/// Removing the synthetic corners leaves star-shaped cavities along the
/// boundary. An ear `(u, v, w)` over two adjacent boundary edges is clipped
/// when it is non-degenerate, lies in unfilled space (its chord midpoint is
/// outside the mesh) and contains no other vertex. Every clip fills area, so
/// the sweep terminates.
fn repair_hull(mesh: &mut TriangleMesh) {
    loop {
        let mut link: FastHashMap<VertexKey, SmallBuffer<EdgeKey, VERTEX_DEGREE_INLINE>> =
            FastHashMap::default();
        for (k, e) in mesh.edges.iter().filter(|(_, e)| e.is_boundary()) {
            for v in e.vertices() {
                link.entry(v).or_default().push(k);
            }
        }

        let mut clipped = false;
        'scan: for (&v, incident) in &link {
            if incident.len() != 2 {
                continue;
            }
            let (e0, e1) = (incident[0], incident[1]);
            let Some(u) = mesh.edges[e0].other_vertex(v) else {
                continue;
            };
            let Some(w) = mesh.edges[e1].other_vertex(v) else {
                continue;
            };
            if u == w {
                continue;
            }

            let pu = mesh.vertices[u].parameter();
            let pv = mesh.vertices[v].parameter();
            let pw = mesh.vertices[w].parameter();
            if orientation(pu, pv, pw, mesh.eps) == Orientation::DEGENERATE {
                continue;
            }
            let mid = Point2::new((pu.x + pw.x) / 2.0, (pu.y + pw.y) / 2.0);
            if mesh.locate(mid) != locate::PointLocation::OutsideHull {
                continue;
            }
            for (x, vx) in mesh.vertices.iter() {
                if x != u
                    && x != v
                    && x != w
                    && in_triangle_strict(pu, pv, pw, vx.parameter(), mesh.eps)
                {
                    continue 'scan;
                }
            }

            // A triangular hole may already have its chord as a boundary
            // edge; reuse it instead of duplicating.
            let existing = mesh.vertices[u]
                .edge_keys()
                .iter()
                .copied()
                .find(|&k| mesh.edges[k].has_vertex(w));
            let chord = match existing {
                Some(k) if mesh.edges[k].is_boundary() => k,
                Some(_) => continue,
                None => mesh.create_edge(u, w),
            };
            mesh.create_triangle([e0, e1, chord]);
            clipped = true;
            break;
        }

        if !clipped {
            return;
        }
    }
}

/// Drops all edges and triangles, keeping the vertices.
fn clear_topology(mesh: &mut TriangleMesh) {
    let edges: Vec<EdgeKey> = mesh.edges.keys().collect();
    for e in edges {
        mesh.remove_edge(e);
    }
    mesh.grid = BucketGrid::empty();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex;

    fn square() -> TriangleMesh {
        TriangleMesh::from_points(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn triangulate_needs_three_noncollinear_vertices() {
        let mut mesh = TriangleMesh::new();
        mesh.insert_vertex(vertex!([0.0, 0.0]), false).unwrap();
        mesh.insert_vertex(vertex!([1.0, 0.0]), false).unwrap();
        mesh.triangulate().unwrap();
        assert_eq!(mesh.state(), MeshState::Gathering);

        mesh.insert_vertex(vertex!([2.0, 0.0]), false).unwrap();
        let err = mesh.triangulate().unwrap_err();
        assert!(matches!(err, MeshError::DegenerateGeometry { .. }));
        assert_eq!(mesh.number_of_triangles(), 0);
        assert_eq!(mesh.number_of_edges(), 0);
        assert_eq!(mesh.state(), MeshState::Gathering);
        // The aborted build keeps only the gathered vertices; the synthetic
        // bounding corners are gone.
        assert_eq!(mesh.number_of_vertices(), 3);
    }

    #[test]
    fn unit_square_counts() {
        let mesh = square();
        assert_eq!(mesh.number_of_vertices(), 4);
        assert_eq!(mesh.number_of_edges(), 5);
        assert_eq!(mesh.number_of_triangles(), 2);
        assert_eq!(mesh.boundary_edges().count(), 4);
    }

    #[test]
    fn interior_insertion_splits_triangle() {
        let mut mesh = square();
        let outcome = mesh.insert_vertex(vertex!([0.25, 0.1, 1.0]), false).unwrap();
        assert!(outcome.was_created());
        assert_eq!(mesh.number_of_vertices(), 5);
        assert_eq!(mesh.number_of_edges(), 8);
        assert_eq!(mesh.number_of_triangles(), 4);
        assert_eq!(mesh.euler_characteristic(), 1);
    }

    #[test]
    fn centroid_insertion_splits_the_diagonal() {
        let mut mesh = square();
        // (0.5, 0.5) sits on the square's diagonal: an interior edge split.
        mesh.insert_vertex(vertex!([0.5, 0.5]), false).unwrap();
        assert_eq!(mesh.number_of_vertices(), 5);
        assert_eq!(mesh.number_of_edges(), 8);
        assert_eq!(mesh.number_of_triangles(), 4);
    }

    #[test]
    fn boundary_edge_split_counts() {
        let mut mesh = square();
        mesh.insert_vertex(vertex!([0.5, 0.0]), false).unwrap();
        assert_eq!(mesh.number_of_vertices(), 5);
        assert_eq!(mesh.number_of_edges(), 7);
        assert_eq!(mesh.number_of_triangles(), 3);
        assert_eq!(mesh.euler_characteristic(), 1);
    }

    #[test]
    fn outside_hull_is_rejected_without_side_effects() {
        let mut mesh = square();
        let err = mesh.insert_vertex(vertex!([3.0, 3.0]), false).unwrap_err();
        assert_eq!(err, MeshError::OutsideHull { x: 3.0, y: 3.0 });
        assert_eq!(mesh.number_of_vertices(), 4);
        assert_eq!(mesh.number_of_edges(), 5);
    }

    #[test]
    fn duplicate_insertion_updates_in_place() {
        let mut mesh = square();
        let outcome = mesh
            .insert_vertex(vertex!([1.0, 1.0, 7.0]), true)
            .unwrap();
        assert!(!outcome.was_created());
        assert_eq!(mesh.number_of_vertices(), 4);
        let v = mesh.vertex(outcome.key()).unwrap();
        assert_eq!(v.position().z, 7.0);
        assert!(v.is_constrained());
    }

    #[test]
    fn non_finite_positions_are_rejected() {
        let mut mesh = TriangleMesh::new();
        let err = mesh
            .insert_vertex(vertex!([f64::NAN, 0.0]), false)
            .unwrap_err();
        assert!(matches!(err, MeshError::DegenerateGeometry { .. }));
    }

    #[test]
    fn splitting_a_constrained_edge_constrains_both_halves() {
        let mut mesh = square();
        let boundary = mesh
            .boundary_edges()
            .next()
            .map(|(k, _)| k)
            .expect("square has boundary edges");
        mesh.edges[boundary].set_constrained(true);
        let [a, b] = mesh.edges[boundary].vertices();
        let pa = mesh.vertices[a].parameter();
        let pb = mesh.vertices[b].parameter();
        let mid = Point2::new((pa.x + pb.x) / 2.0, (pa.y + pb.y) / 2.0);

        let outcome = mesh
            .insert_vertex(vertex!([mid.x, mid.y]), false)
            .unwrap();
        let v = outcome.key();
        assert!(mesh.vertex(v).unwrap().is_constrained());
        let halves: Vec<_> = mesh
            .edges()
            .filter(|(_, e)| e.has_vertex(v) && (e.has_vertex(a) || e.has_vertex(b)))
            .collect();
        assert_eq!(halves.len(), 2);
        assert!(halves.iter().all(|(_, e)| e.is_constrained()));
    }

    #[test]
    fn retriangulation_rebuilds_from_scratch() {
        let mut mesh = square();
        mesh.insert_vertex(vertex!([0.3, 0.3]), false).unwrap();
        mesh.triangulate().unwrap();
        assert_eq!(mesh.number_of_vertices(), 5);
        assert_eq!(mesh.euler_characteristic(), 1);
        assert_eq!(mesh.boundary_edges().count(), 4);
    }
}
