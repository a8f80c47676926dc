//! Mesh edges.

use serde::{Deserialize, Serialize};

use crate::core::mesh::{TriangleKey, VertexKey};

/// An edge between two distinct vertices, referencing up to two adjacent
/// triangles.
///
/// The edge is a boundary edge when at least one triangle slot is empty.
/// When both slots are populated, each adjacent triangle lists this edge
/// among its three edges (validated by
/// [`validate_topology`](crate::core::validation::validate_topology)).
///
/// A constrained edge is exempt from Delaunay flipping. Edges between two
/// constrained vertices become constrained automatically during repair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    vertices: [VertexKey; 2],
    triangles: [Option<TriangleKey>; 2],
    constrained: bool,
}

impl Edge {
    pub(crate) fn new(first: VertexKey, last: VertexKey) -> Self {
        debug_assert_ne!(first, last, "edge endpoints must be distinct");
        Self {
            vertices: [first, last],
            triangles: [None, None],
            constrained: false,
        }
    }

    /// The ordered endpoint pair.
    #[must_use]
    pub const fn vertices(&self) -> [VertexKey; 2] {
        self.vertices
    }

    /// First endpoint.
    #[must_use]
    pub const fn first(&self) -> VertexKey {
        self.vertices[0]
    }

    /// Last endpoint.
    #[must_use]
    pub const fn last(&self) -> VertexKey {
        self.vertices[1]
    }

    /// The adjacent triangle slots; `None` marks a missing side.
    #[must_use]
    pub const fn triangles(&self) -> [Option<TriangleKey>; 2] {
        self.triangles
    }

    /// Adjacent triangles, skipping empty slots.
    pub fn triangle_keys(&self) -> impl Iterator<Item = TriangleKey> + '_ {
        self.triangles.iter().filter_map(|t| *t)
    }

    /// Whether the edge lies on the mesh boundary (fewer than two adjacent
    /// triangles).
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.triangles.iter().any(Option::is_none)
    }

    /// Whether the edge is constrained (exempt from flipping).
    #[must_use]
    pub const fn is_constrained(&self) -> bool {
        self.constrained
    }

    /// Marks or unmarks the edge as constrained.
    pub fn set_constrained(&mut self, constrained: bool) {
        self.constrained = constrained;
    }

    /// Whether `v` is one of the endpoints.
    #[must_use]
    pub fn has_vertex(&self, v: VertexKey) -> bool {
        self.vertices.contains(&v)
    }

    /// The endpoint opposite `v`, or `None` when `v` is not an endpoint.
    #[must_use]
    pub fn other_vertex(&self, v: VertexKey) -> Option<VertexKey> {
        if self.vertices[0] == v {
            Some(self.vertices[1])
        } else if self.vertices[1] == v {
            Some(self.vertices[0])
        } else {
            None
        }
    }

    /// The adjacent triangle other than `t`, if present.
    #[must_use]
    pub fn other_triangle(&self, t: TriangleKey) -> Option<TriangleKey> {
        self.triangles
            .iter()
            .filter_map(|slot| *slot)
            .find(|&other| other != t)
    }

    pub(crate) fn set_vertices(&mut self, first: VertexKey, last: VertexKey) {
        debug_assert_ne!(first, last, "edge endpoints must be distinct");
        self.vertices = [first, last];
    }

    /// Fills an empty triangle slot. Panics in debug builds when both slots
    /// are already taken; the mutation operators never over-attach.
    pub(crate) fn attach_triangle(&mut self, t: TriangleKey) {
        if let Some(slot) = self.triangles.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(t);
        } else {
            debug_assert!(false, "edge already has two adjacent triangles");
        }
    }

    pub(crate) fn detach_triangle(&mut self, t: TriangleKey) {
        for slot in &mut self.triangles {
            if *slot == Some(t) {
                *slot = None;
            }
        }
    }

    /// Rewires the slot holding `old` to reference `new`.
    pub(crate) fn replace_triangle(&mut self, old: TriangleKey, new: TriangleKey) {
        for slot in &mut self.triangles {
            if *slot == Some(old) {
                *slot = Some(new);
                return;
            }
        }
        debug_assert!(false, "replace_triangle: old triangle not adjacent");
    }
}
