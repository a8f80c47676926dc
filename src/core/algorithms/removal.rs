//! Vertex removal: plain cascading removal and removal with hole re-filling.
//!
//! Plain removal deletes the vertex's incident edges, which cascades away
//! the incident triangles and leaves a star-shaped hole. The filling variant
//! first captures the vertex's link polygon in cyclic order, removes the
//! vertex, then re-triangulates the polygon by ear clipping driven by a
//! priority queue: the fattest valid ear (largest minimum angle) is always
//! clipped first, which avoids the sliver chains a fixed-order sweep
//! produces. Ring edges survive the removal, so only chord edges and fill
//! triangles are created.

use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::core::mesh::{EdgeKey, MeshError, MeshState, TriangleMesh, VertexKey};
use crate::geometry::predicates::{in_triangle_strict, orientation, Orientation};

/// Removes `v` with all incident edges and triangles.
pub(crate) fn remove_vertex(mesh: &mut TriangleMesh, v: VertexKey) {
    let incident: Vec<EdgeKey> = mesh
        .vertices
        .get(v)
        .map(|vertex| vertex.edge_keys().to_vec())
        .unwrap_or_default();
    for e in incident {
        mesh.remove_edge(e);
    }
    mesh.vertices.remove(v);
}

/// Removes `v` and re-fills the hole; see
/// [`TriangleMesh::remove_vertex_fill`](crate::core::mesh::TriangleMesh::remove_vertex_fill).
pub(crate) fn remove_vertex_fill(mesh: &mut TriangleMesh, v: VertexKey) -> Result<(), MeshError> {
    let interior = mesh.vertices[v].degree() >= 3
        && mesh.vertices[v]
            .edge_keys()
            .iter()
            .all(|&e| !mesh.edges[e].is_boundary());
    if !interior {
        // A boundary vertex's link is an open chain, not a polygon.
        remove_vertex(mesh, v);
        mark_punctured(mesh);
        return Ok(());
    }
    let Some(mut ring) = link_ring(mesh, v) else {
        remove_vertex(mesh, v);
        mark_punctured(mesh);
        return Ok(());
    };
    if signed_area2(mesh, &ring) < 0.0 {
        ring.reverse();
    }
    remove_vertex(mesh, v);
    if let Err(err) = fill_polygon(mesh, ring) {
        mark_punctured(mesh);
        return Err(err);
    }
    Ok(())
}

/// Records that a removal left the patch with an unfilled hole, which
/// releases the Euler characteristic from the disk value.
fn mark_punctured(mesh: &mut TriangleMesh) {
    if mesh.state == MeshState::Triangulated {
        mesh.punctured = true;
    }
}

/// The link vertices of interior vertex `v`, in cyclic fan order, or `None`
/// when the fan does not close into a single loop.
fn link_ring(mesh: &TriangleMesh, v: VertexKey) -> Option<Vec<VertexKey>> {
    let spokes = mesh.vertices[v].edge_keys();
    let start = *spokes.first()?;
    let mut ring = Vec::with_capacity(spokes.len());

    let mut e = start;
    let mut t = mesh.edges[start].triangles()[0]?;
    loop {
        ring.push(mesh.edges[e].other_vertex(v)?);
        let next = mesh.triangles[t]
            .edges()
            .into_iter()
            .find(|&k| k != e && mesh.edges[k].has_vertex(v))?;
        if next == start {
            break;
        }
        t = mesh.edges[next].other_triangle(t)?;
        e = next;
    }
    (ring.len() == spokes.len()).then_some(ring)
}

/// Twice the signed area of the ring polygon.
fn signed_area2(mesh: &TriangleMesh, ring: &[VertexKey]) -> f64 {
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let p = mesh.vertices[ring[i]].parameter();
        let q = mesh.vertices[ring[(i + 1) % ring.len()]].parameter();
        sum += p.x * q.y - q.x * p.y;
    }
    sum
}

/// A candidate ear, ordered by quality (minimum corner angle).
type Ear = (OrderedFloat<f64>, VertexKey, VertexKey, VertexKey);

/// Triangulates the counter-clockwise ring polygon whose boundary edges
/// already exist in the mesh.
fn fill_polygon(mesh: &mut TriangleMesh, mut ring: Vec<VertexKey>) -> Result<(), MeshError> {
    while ring.len() > 3 {
        let mut heap: BinaryHeap<Ear> = (0..ring.len()).map(|i| ear_at(mesh, &ring, i)).collect();
        let mut progressed = false;

        while let Some((_, p, c, n)) = heap.pop() {
            let Some(i) = ring.iter().position(|&x| x == c) else {
                continue;
            };
            let len = ring.len();
            if ring[(i + len - 1) % len] != p || ring[(i + 1) % len] != n {
                continue; // stale entry from an earlier clip
            }
            if !valid_ear(mesh, &ring, p, c, n) {
                continue;
            }

            clip_ear(mesh, p, c, n)?;
            ring.remove(i);
            progressed = true;
            if ring.len() == 3 {
                break;
            }
            // The two neighbors of the clipped corner gained new ears.
            let len = ring.len();
            let ip = ring.iter().position(|&x| x == p).unwrap_or(0);
            heap.push(ear_at(mesh, &ring, ip));
            heap.push(ear_at(mesh, &ring, (ip + 1) % len));
        }

        if !progressed {
            // The vertex is gone; the hole stays open but the mesh around it
            // is intact.
            return Err(MeshError::DegenerateGeometry {
                message: "link polygon could not be re-triangulated".into(),
            });
        }
    }

    // The last triangle reuses the three remaining ring edges.
    let (a, b, c) = (ring[0], ring[1], ring[2]);
    let e0 = ring_edge(mesh, a, b)?;
    let e1 = ring_edge(mesh, b, c)?;
    let e2 = ring_edge(mesh, c, a)?;
    mesh.create_triangle([e0, e1, e2]);
    Ok(())
}

/// The candidate ear centered at ring position `i`.
fn ear_at(mesh: &TriangleMesh, ring: &[VertexKey], i: usize) -> Ear {
    let len = ring.len();
    let p = ring[(i + len - 1) % len];
    let c = ring[i];
    let n = ring[(i + 1) % len];
    (OrderedFloat(min_angle(mesh, p, c, n)), p, c, n)
}

/// The smallest corner angle of triangle `(p, c, n)`, in radians.
fn min_angle(mesh: &TriangleMesh, p: VertexKey, c: VertexKey, n: VertexKey) -> f64 {
    let pts = [p, c, n].map(|k| mesh.vertices[k].parameter());
    let mut min = f64::MAX;
    for i in 0..3 {
        let a = pts[i];
        let u = pts[(i + 1) % 3] - a;
        let w = pts[(i + 2) % 3] - a;
        let denom = u.length() * w.length();
        if denom <= 0.0 {
            return 0.0;
        }
        let angle = (u.dot(&w) / denom).clamp(-1.0, 1.0).acos();
        if angle < min {
            min = angle;
        }
    }
    min
}

/// Whether the ear `(p, c, n)` is convex toward the polygon interior and
/// contains no other ring vertex.
fn valid_ear(mesh: &TriangleMesh, ring: &[VertexKey], p: VertexKey, c: VertexKey, n: VertexKey) -> bool {
    let pp = mesh.vertices[p].parameter();
    let pc = mesh.vertices[c].parameter();
    let pn = mesh.vertices[n].parameter();
    if orientation(pp, pc, pn, mesh.eps) != Orientation::POSITIVE {
        return false;
    }
    ring.iter().all(|&x| {
        x == p
            || x == c
            || x == n
            || !in_triangle_strict(pp, pc, pn, mesh.vertices[x].parameter(), mesh.eps)
    })
}

/// Creates the chord and fill triangle for ear `(p, c, n)`.
fn clip_ear(
    mesh: &mut TriangleMesh,
    p: VertexKey,
    c: VertexKey,
    n: VertexKey,
) -> Result<(), MeshError> {
    let e0 = ring_edge(mesh, p, c)?;
    let e1 = ring_edge(mesh, c, n)?;
    let chord = mesh.create_edge(n, p);
    mesh.create_triangle([e0, e1, chord]);
    Ok(())
}

/// The existing edge between two ring vertices.
fn ring_edge(mesh: &TriangleMesh, a: VertexKey, b: VertexKey) -> Result<EdgeKey, MeshError> {
    mesh.vertices[a]
        .edge_keys()
        .iter()
        .copied()
        .find(|&e| mesh.edges[e].has_vertex(b))
        .ok_or_else(|| MeshError::DegenerateGeometry {
            message: "link polygon boundary edge is missing".into(),
        })
}
