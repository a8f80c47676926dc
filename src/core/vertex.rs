//! Mesh vertices.

use serde::{Deserialize, Serialize};

use crate::core::collections::{SmallBuffer, VERTEX_DEGREE_INLINE};
use crate::core::mesh::EdgeKey;
use crate::geometry::point::{Point2, Point3, Vector3};

/// A mesh vertex: a 3D position, an optional explicit normal, the incident
/// edge list, and a constraint flag.
///
/// Vertex identity is the `(x, y)` projection of the position: the mesh
/// never stores two vertices whose projections coincide within its
/// tolerance, and re-inserting an existing position updates the stored
/// normal and flag in place instead of creating a duplicate.
///
/// When no explicit normal has been supplied, consumers fall back to the
/// area-weighted average of the incident triangle normals (see
/// [`TriangleMesh::vertex_normal`](crate::core::mesh::TriangleMesh::vertex_normal)).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vertex {
    position: Point3,
    normal: Option<Vector3>,
    constrained: bool,
    /// Incident edges, unordered. Maintained by the mesh container.
    pub(crate) edges: SmallBuffer<EdgeKey, VERTEX_DEGREE_INLINE>,
    radius_min: f64,
    radius_max: f64,
}

impl Vertex {
    /// Creates a vertex at `position` with no explicit normal.
    #[must_use]
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            normal: None,
            constrained: false,
            edges: SmallBuffer::new(),
            radius_min: 0.0,
            radius_max: 0.0,
        }
    }

    /// Sets an explicit surface normal.
    #[must_use]
    pub fn with_normal(mut self, normal: Vector3) -> Self {
        self.normal = Some(normal);
        self
    }

    /// The 3D position.
    #[must_use]
    pub const fn position(&self) -> Point3 {
        self.position
    }

    /// The `(x, y)` projection used for identity and point location.
    #[must_use]
    pub const fn parameter(&self) -> Point2 {
        self.position.xy()
    }

    /// The explicitly stored normal, if any.
    #[must_use]
    pub const fn stored_normal(&self) -> Option<Vector3> {
        self.normal
    }

    /// Replaces the stored normal.
    pub fn set_normal(&mut self, normal: Option<Vector3>) {
        self.normal = normal;
    }

    /// Whether the vertex is constrained (pinned against Delaunay flips).
    #[must_use]
    pub const fn is_constrained(&self) -> bool {
        self.constrained
    }

    /// Marks or unmarks the vertex as constrained.
    pub fn set_constrained(&mut self, constrained: bool) {
        self.constrained = constrained;
    }

    /// Incident edges, in no particular order.
    #[must_use]
    pub fn edge_keys(&self) -> &[EdgeKey] {
        &self.edges
    }

    /// Number of incident edges (the vertex degree).
    #[must_use]
    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    /// Opaque radius scalars carried for external tiling consumers.
    #[must_use]
    pub const fn radius_bounds(&self) -> (f64, f64) {
        (self.radius_min, self.radius_max)
    }

    /// Stores the radius scalars carried for external tiling consumers.
    pub fn set_radius_bounds(&mut self, min: f64, max: f64) {
        self.radius_min = min;
        self.radius_max = max;
    }

    pub(crate) fn set_position(&mut self, position: Point3) {
        self.position = position;
    }

    pub(crate) fn attach_edge(&mut self, edge: EdgeKey) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    pub(crate) fn detach_edge(&mut self, edge: EdgeKey) {
        if let Some(idx) = self.edges.iter().position(|&e| e == edge) {
            self.edges.swap_remove(idx);
        }
    }
}

/// Convenience constructor for a vertex from coordinates.
///
/// ```
/// use delaunay2d::vertex;
///
/// let v = vertex!([1.0, 2.0, 3.0]);
/// assert_eq!(v.position().z, 3.0);
///
/// let flat = vertex!([1.0, 2.0]); // z defaults to 0
/// assert_eq!(flat.position().z, 0.0);
/// ```
#[macro_export]
macro_rules! vertex {
    ([$x:expr, $y:expr]) => {
        $crate::core::vertex::Vertex::new($crate::geometry::point::Point3::new($x, $y, 0.0))
    };
    ([$x:expr, $y:expr, $z:expr]) => {
        $crate::core::vertex::Vertex::new($crate::geometry::point::Point3::new($x, $y, $z))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_is_idempotent_and_detach_removes() {
        let mut v = Vertex::new(Point3::new(0.0, 0.0, 0.0));
        let mut arena = slotmap::SlotMap::<EdgeKey, ()>::with_key();
        let e = arena.insert(());

        v.attach_edge(e);
        v.attach_edge(e);
        assert_eq!(v.degree(), 1);

        v.detach_edge(e);
        assert_eq!(v.degree(), 0);
    }

    #[test]
    fn vertex_macro_builds_positions() {
        let v = vertex!([1.0, 2.0, 3.0]);
        assert_eq!(v.position(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(v.parameter(), Point2::new(1.0, 2.0));
        assert!(v.stored_normal().is_none());
    }
}
