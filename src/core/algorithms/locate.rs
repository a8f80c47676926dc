//! Point location: mapping a parameter-plane point to the mesh element
//! containing it.
//!
//! The bucket grid narrows the search to one cell's candidate list; each
//! candidate is then classified by three orientation tests against its edges.
//! Because every triangle registers itself in all cells its bounding box
//! overlaps, the containing triangle (if any) is always among the candidates
//! of the query point's cell.

use crate::core::mesh::{EdgeKey, TriangleKey, TriangleMesh};
use crate::geometry::point::Point2;
use crate::geometry::predicates::{orientation, Orientation};

/// Result of locating a point against the mesh topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointLocation {
    /// Strictly inside this triangle.
    Inside(TriangleKey),
    /// On this edge (within the mesh tolerance), including at its endpoints.
    OnEdge(EdgeKey),
    /// Outside every triangle of the mesh.
    OutsideHull,
}

/// Locates `p` against the current topology.
pub(crate) fn locate(mesh: &TriangleMesh, p: Point2) -> PointLocation {
    if mesh.triangles.is_empty() || !p.is_finite() {
        return PointLocation::OutsideHull;
    }
    let Some((i, j)) = mesh.grid.locate_cell(p) else {
        return PointLocation::OutsideHull;
    };
    for &t in mesh.grid.candidates(i, j) {
        if let Some(location) = classify(mesh, t, p) {
            return location;
        }
    }
    PointLocation::OutsideHull
}

/// Classifies `p` against a single triangle, or `None` when `p` lies outside
/// it.
///
/// Edge `i` of a triangle connects vertices `i` and `(i + 1) % 3`, so the
/// reference side for each edge test is the side of vertex `(i + 2) % 3`.
fn classify(mesh: &TriangleMesh, t: TriangleKey, p: Point2) -> Option<PointLocation> {
    let points = mesh.triangle_parameters(t);
    let edges = mesh.triangles[t].edges();
    let eps = mesh.eps;

    let mut on_edge: Option<EdgeKey> = None;
    for i in 0..3 {
        let a = points[i];
        let b = points[(i + 1) % 3];
        let c = points[(i + 2) % 3];

        let inner = orientation(a, b, c, eps);
        if inner == Orientation::DEGENERATE {
            // Sliver too thin to classify against; the grid will offer the
            // non-degenerate neighbor as another candidate.
            return None;
        }
        match orientation(a, b, p, eps) {
            Orientation::DEGENERATE => on_edge = Some(edges[i]),
            side if side == inner => {}
            _ => return None,
        }
    }
    Some(on_edge.map_or(PointLocation::Inside(t), PointLocation::OnEdge))
}
