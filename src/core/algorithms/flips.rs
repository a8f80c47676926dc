//! Edge flips and local Delaunay repair.
//!
//! A flip replaces the shared edge of two triangles with the opposite
//! diagonal of their quadrilateral. The edge and both triangle slots are
//! rewired in place, so no keys are invalidated and the simplex counts are
//! untouched. Repair is the iterative Lawson scheme: a work stack of
//! suspect edges, each tested with the in-circle predicate and flipped when
//! the opposite vertex invades the circumcircle, with the four surrounding
//! edges re-queued after every flip.

use crate::core::collections::SmallBuffer;
use crate::core::mesh::{EdgeKey, TriangleKey, TriangleMesh, VertexKey};
use crate::geometry::predicates::{in_circle, orientation, InCircle, Orientation};

/// The edge of triangle `t` whose endpoints are exactly `{a, b}`.
fn edge_between(
    mesh: &TriangleMesh,
    t: TriangleKey,
    a: VertexKey,
    b: VertexKey,
) -> Option<EdgeKey> {
    mesh.triangles[t]
        .edges()
        .into_iter()
        .find(|&e| mesh.edges[e].has_vertex(a) && mesh.edges[e].has_vertex(b))
}

/// Flips `e` to the opposite diagonal of its two adjacent triangles.
///
/// Refuses (returning `false`) when the edge is a boundary edge, is
/// constrained, or when the surrounding quadrilateral is not strictly
/// convex, which would produce an inverted or degenerate triangle.
pub(crate) fn flip_edge(mesh: &mut TriangleMesh, e: EdgeKey) -> bool {
    let Some(edge) = mesh.edges.get(e) else {
        return false;
    };
    if edge.is_constrained() {
        return false;
    }
    let [Some(t0), Some(t1)] = edge.triangles() else {
        return false;
    };
    let [u, v] = edge.vertices();
    let (Some(a), Some(b)) = (mesh.opposite_vertex(t0, e), mesh.opposite_vertex(t1, e)) else {
        return false;
    };

    // Strict convexity of the quadrilateral u-a-v-b around the new diagonal.
    let pa = mesh.vertices[a].parameter();
    let pb = mesh.vertices[b].parameter();
    let pu = mesh.vertices[u].parameter();
    let pv = mesh.vertices[v].parameter();
    let side_u = orientation(pa, pb, pu, mesh.eps);
    let side_v = orientation(pa, pb, pv, mesh.eps);
    let convex = matches!(
        (side_u, side_v),
        (Orientation::POSITIVE, Orientation::NEGATIVE)
            | (Orientation::NEGATIVE, Orientation::POSITIVE)
    );
    if !convex {
        return false;
    }

    let Some(a_u) = edge_between(mesh, t0, a, u) else {
        return false;
    };
    let Some(a_v) = edge_between(mesh, t0, a, v) else {
        return false;
    };
    let Some(b_u) = edge_between(mesh, t1, b, u) else {
        return false;
    };
    let Some(b_v) = edge_between(mesh, t1, b, v) else {
        return false;
    };

    // Rewire: t0 becomes (a, u, b), t1 becomes (a, v, b), e becomes (a, b).
    mesh.triangles[t0].set_edges([a_u, b_u, e]);
    mesh.triangles[t1].set_edges([a_v, b_v, e]);
    mesh.edges[b_u].replace_triangle(t1, t0);
    mesh.edges[a_v].replace_triangle(t0, t1);

    mesh.edges[e].set_vertices(a, b);
    mesh.vertices[u].detach_edge(e);
    mesh.vertices[v].detach_edge(e);
    mesh.vertices[a].attach_edge(e);
    mesh.vertices[b].attach_edge(e);

    // A flip can widen either triangle's bounding box.
    mesh.adjust_triangle(t0, true);
    mesh.adjust_triangle(t1, true);
    true
}

/// Whether `e` satisfies the local Delaunay criterion.
///
/// Boundary and constrained edges are Delaunay by definition. An interior
/// edge fails when the vertex opposite one adjacent triangle lies strictly
/// inside the circumcircle of the other; cocircular configurations pass.
pub(crate) fn edge_is_delaunay(mesh: &TriangleMesh, e: EdgeKey) -> bool {
    let Some(edge) = mesh.edges.get(e) else {
        return true;
    };
    if edge.is_constrained() {
        return true;
    }
    let [Some(t0), Some(t1)] = edge.triangles() else {
        return true;
    };
    let Some(d) = mesh.opposite_vertex(t1, e) else {
        return true;
    };
    let [a, b, c] = mesh.triangle_parameters(t0);
    in_circle(a, b, c, mesh.vertices[d].parameter()) != InCircle::INSIDE
}

/// Lawson repair: flips non-Delaunay edges reachable from `seeds` until the
/// neighborhood is locally Delaunay again.
///
/// Edges whose endpoints are both constrained become constrained themselves
/// on first visit instead of being flipped. The work loop carries a budget
/// proportional to the mesh size so floating-point near-cocircular cycles
/// cannot spin forever.
pub(crate) fn restore_delaunay(mesh: &mut TriangleMesh, seeds: &[EdgeKey]) {
    let mut stack: Vec<EdgeKey> = seeds.to_vec();
    let mut budget = 32 * mesh.edges.len() + 64;

    while let Some(e) = stack.pop() {
        if budget == 0 {
            debug_assert!(false, "delaunay repair budget exhausted");
            return;
        }
        budget -= 1;

        let Some(edge) = mesh.edges.get(e) else {
            continue;
        };
        if !edge.is_constrained() {
            let [p, q] = edge.vertices();
            if mesh.vertices[p].is_constrained() && mesh.vertices[q].is_constrained() {
                mesh.edges[e].set_constrained(true);
                continue;
            }
        }
        if edge_is_delaunay(mesh, e) {
            continue;
        }
        if !flip_edge(mesh, e) {
            continue;
        }
        // After the flip both triangles hold e plus two outer edges each;
        // those four outer edges are the new suspects.
        let mut requeue: SmallBuffer<EdgeKey, 4> = SmallBuffer::new();
        for t in mesh.edges[e].triangle_keys() {
            for outer in mesh.triangles[t].edges() {
                if outer != e && !requeue.contains(&outer) {
                    requeue.push(outer);
                }
            }
        }
        stack.extend(requeue);
    }
}
