//! Mesh triangles.

use serde::{Deserialize, Serialize};

use crate::core::mesh::EdgeKey;

/// An inclusive rectangle of bucket-grid cell indices.
///
/// Each triangle caches the cell range its parameter-plane bounding box
/// overlaps, so the spatial index can be updated by diffing spans instead of
/// re-deriving cells from world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpan {
    /// Minimum column.
    pub i0: u16,
    /// Minimum row.
    pub j0: u16,
    /// Maximum column (inclusive).
    pub i1: u16,
    /// Maximum row (inclusive).
    pub j1: u16,
}

impl GridSpan {
    /// Iterates all `(column, row)` cells the span covers.
    pub fn cells(self) -> impl Iterator<Item = (u16, u16)> {
        (self.j0..=self.j1).flat_map(move |j| (self.i0..=self.i1).map(move |i| (i, j)))
    }

    /// Whether the span covers cell `(i, j)`.
    #[must_use]
    pub const fn contains(self, i: u16, j: u16) -> bool {
        i >= self.i0 && i <= self.i1 && j >= self.j0 && j <= self.j1
    }
}

/// A triangle defined by exactly three edges in consistent winding:
/// consecutive edges share a vertex, so vertex `i` of the triangle is the
/// vertex shared by edges `(i + 2) % 3` and `i`.
///
/// The cached [`GridSpan`] tracks where the triangle is registered in the
/// bucket grid; it is updated through the mesh's `adjust` operation whenever
/// the triangle's geometry changes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Triangle {
    edges: [EdgeKey; 3],
    span: GridSpan,
}

impl Triangle {
    pub(crate) const fn new(edges: [EdgeKey; 3]) -> Self {
        Self {
            edges,
            span: GridSpan {
                i0: 0,
                j0: 0,
                i1: 0,
                j1: 0,
            },
        }
    }

    /// The three edges, in winding order.
    #[must_use]
    pub const fn edges(&self) -> [EdgeKey; 3] {
        self.edges
    }

    /// Whether `e` is one of the triangle's edges.
    #[must_use]
    pub fn has_edge(&self, e: EdgeKey) -> bool {
        self.edges.contains(&e)
    }

    /// The position of `e` within the edge triple.
    #[must_use]
    pub fn edge_index(&self, e: EdgeKey) -> Option<usize> {
        self.edges.iter().position(|&edge| edge == e)
    }

    /// The grid-cell range the triangle is currently registered in.
    #[must_use]
    pub const fn span(&self) -> GridSpan {
        self.span
    }

    pub(crate) fn set_edges(&mut self, edges: [EdgeKey; 3]) {
        self.edges = edges;
    }

    pub(crate) fn set_span(&mut self, span: GridSpan) {
        self.span = span;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn grid_span_cell_iteration() {
        let span = GridSpan {
            i0: 1,
            j0: 2,
            i1: 2,
            j1: 3,
        };
        let cells: Vec<_> = span.cells().collect();
        assert_eq!(cells, vec![(1, 2), (2, 2), (1, 3), (2, 3)]);
        assert!(span.contains(2, 3));
        assert!(!span.contains(0, 2));
    }

    #[test]
    fn edge_membership_queries() {
        let mut arena = SlotMap::<EdgeKey, ()>::with_key();
        let e0 = arena.insert(());
        let e1 = arena.insert(());
        let e2 = arena.insert(());
        let e3 = arena.insert(());

        let tri = Triangle::new([e0, e1, e2]);
        assert_eq!(tri.edge_index(e1), Some(1));
        assert!(tri.has_edge(e2));
        assert!(!tri.has_edge(e3));
    }
}
