//! The spatial bucket index: a uniform `2^d × 2^d` grid of per-cell
//! triangle lists over the mesh bounding box.
//!
//! Point location maps a query point to its grid cell by binary descent
//! over the knot arrays, then scans only that cell's candidate triangles.
//! Triangles register themselves in every cell their bounding box overlaps
//! (their [`GridSpan`]) and deregister by span diffing, so local mesh edits
//! touch only a handful of cells.
//!
//! Cells are growable vectors; there is no fixed per-cell capacity to
//! overflow.

use serde::{Deserialize, Serialize};

use crate::core::mesh::TriangleKey;
use crate::core::triangle::GridSpan;
use crate::geometry::point::{Point2, Rect};

/// The uniform bucket grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BucketGrid {
    depth: u8,
    bounds: Rect,
    /// Column knot lines, `2^depth + 1` ascending values spanning the bounds.
    u: Vec<f64>,
    /// Row knot lines, same layout as `u`.
    v: Vec<f64>,
    /// Row-major per-cell triangle lists, `2^depth * 2^depth` entries.
    cells: Vec<Vec<TriangleKey>>,
}

impl BucketGrid {
    /// Builds an empty grid of `2^depth × 2^depth` cells over `bounds`.
    #[must_use]
    pub fn new(bounds: Rect, depth: u8) -> Self {
        let side = 1usize << depth;
        let mut u = Vec::with_capacity(side + 1);
        let mut v = Vec::with_capacity(side + 1);
        for k in 0..=side {
            let t = k as f64 / side as f64;
            u.push(bounds.min.x + t * bounds.width());
            v.push(bounds.min.y + t * bounds.height());
        }
        Self {
            depth,
            bounds,
            u,
            v,
            cells: vec![Vec::new(); side * side],
        }
    }

    /// A placeholder 1-cell grid over the unit square, used before the first
    /// triangulation sizes the real grid.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(
            Rect {
                min: Point2::new(0.0, 0.0),
                max: Point2::new(1.0, 1.0),
            },
            0,
        )
    }

    /// Subdivision depth for a mesh of `vertex_count` vertices.
    ///
    /// `ceil(log4(V))` keeps the expected per-cell occupancy constant as the
    /// mesh grows; the cap bounds grid memory at `2^cap × 2^cap` cells.
    #[must_use]
    pub fn depth_for(vertex_count: usize, cap: u8) -> u8 {
        let mut depth: u8 = 1;
        let mut cells = 4usize;
        while cells < vertex_count && depth < cap {
            depth += 1;
            cells *= 4;
        }
        depth
    }

    /// The grid's side length in cells.
    #[must_use]
    pub fn side(&self) -> u16 {
        1u16 << self.depth
    }

    /// The covered bounds.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The cell containing `p`, or `None` when `p` is outside the grid.
    ///
    /// Descends the knot arrays by binary search; a point exactly on the
    /// maximum boundary lands in the last cell.
    #[must_use]
    pub fn locate_cell(&self, p: Point2) -> Option<(u16, u16)> {
        let i = Self::knot_interval(&self.u, p.x)?;
        let j = Self::knot_interval(&self.v, p.y)?;
        Some((i, j))
    }

    fn knot_interval(knots: &[f64], x: f64) -> Option<u16> {
        let last = knots.len() - 1;
        if x < knots[0] || x > knots[last] {
            return None;
        }
        let idx = knots.partition_point(|&k| k <= x);
        // partition_point is 0 only when x == knots[0] within fp noise.
        let cell = idx.saturating_sub(1).min(last - 1);
        Some(cell as u16)
    }

    /// The cell range covered by the bounding box `min..=max`, clamped to
    /// the grid.
    #[must_use]
    pub fn span_for(&self, min: Point2, max: Point2) -> GridSpan {
        let clamp = |knots: &[f64], x: f64| -> u16 {
            let last = knots.len() - 1;
            if x <= knots[0] {
                0
            } else if x >= knots[last] {
                (last - 1) as u16
            } else {
                Self::knot_interval(knots, x).unwrap_or(0)
            }
        };
        GridSpan {
            i0: clamp(&self.u, min.x),
            j0: clamp(&self.v, min.y),
            i1: clamp(&self.u, max.x),
            j1: clamp(&self.v, max.y),
        }
    }

    /// Registers `t` in every cell of `span`.
    pub fn insert(&mut self, t: TriangleKey, span: GridSpan) {
        for (i, j) in span.cells() {
            let cell = self.cell_mut(i, j);
            if !cell.contains(&t) {
                cell.push(t);
            }
        }
    }

    /// Deregisters `t` from every cell of `span`.
    pub fn remove(&mut self, t: TriangleKey, span: GridSpan) {
        for (i, j) in span.cells() {
            self.cell_mut(i, j).retain(|&k| k != t);
        }
    }

    /// Re-registers `t` after its span changed from `old` to `new`.
    ///
    /// Cells in `old` but not `new` are always vacated. Cells newly covered
    /// are only populated when `wider` is set: split operations can only
    /// shrink a triangle, so their adjustments skip the insertion scan,
    /// while flips pass `wider = true`.
    pub fn adjust(&mut self, t: TriangleKey, old: GridSpan, new: GridSpan, wider: bool) {
        for (i, j) in old.cells() {
            if !new.contains(i, j) {
                self.cell_mut(i, j).retain(|&k| k != t);
            }
        }
        if wider {
            for (i, j) in new.cells() {
                if !old.contains(i, j) {
                    let cell = self.cell_mut(i, j);
                    if !cell.contains(&t) {
                        cell.push(t);
                    }
                }
            }
        }
    }

    /// The candidate triangles registered in cell `(i, j)`.
    #[must_use]
    pub fn candidates(&self, i: u16, j: u16) -> &[TriangleKey] {
        &self.cells[usize::from(j) * usize::from(self.side()) + usize::from(i)]
    }

    fn cell_mut(&mut self, i: u16, j: u16) -> &mut Vec<TriangleKey> {
        let side = usize::from(self.side());
        &mut self.cells[usize::from(j) * side + usize::from(i)]
    }

    /// Drops all registrations, keeping the geometry.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn unit_grid(depth: u8) -> BucketGrid {
        BucketGrid::new(
            Rect {
                min: Point2::new(0.0, 0.0),
                max: Point2::new(1.0, 1.0),
            },
            depth,
        )
    }

    #[test]
    fn depth_formula_is_log4_clamped() {
        assert_eq!(BucketGrid::depth_for(0, 8), 1);
        assert_eq!(BucketGrid::depth_for(4, 8), 1);
        assert_eq!(BucketGrid::depth_for(5, 8), 2);
        assert_eq!(BucketGrid::depth_for(16, 8), 2);
        assert_eq!(BucketGrid::depth_for(17, 8), 3);
        assert_eq!(BucketGrid::depth_for(1_000_000, 8), 8);
    }

    #[test]
    fn locate_cell_handles_boundaries() {
        let grid = unit_grid(2); // 4x4
        assert_eq!(grid.locate_cell(Point2::new(0.0, 0.0)), Some((0, 0)));
        assert_eq!(grid.locate_cell(Point2::new(1.0, 1.0)), Some((3, 3)));
        assert_eq!(grid.locate_cell(Point2::new(0.6, 0.1)), Some((2, 0)));
        assert_eq!(grid.locate_cell(Point2::new(1.5, 0.5)), None);
        assert_eq!(grid.locate_cell(Point2::new(0.5, -0.1)), None);
    }

    #[test]
    fn insert_remove_and_adjust_maintain_cells() {
        let mut grid = unit_grid(2);
        let mut arena = SlotMap::<TriangleKey, ()>::with_key();
        let t = arena.insert(());

        let old = grid.span_for(Point2::new(0.0, 0.0), Point2::new(0.3, 0.3));
        grid.insert(t, old);
        assert!(grid.candidates(0, 0).contains(&t));
        assert!(grid.candidates(1, 1).contains(&t));

        // Shrinking adjustment vacates stale cells without re-inserting.
        let new = grid.span_for(Point2::new(0.0, 0.0), Point2::new(0.2, 0.2));
        grid.adjust(t, old, new, false);
        assert!(grid.candidates(0, 0).contains(&t));
        assert!(!grid.candidates(1, 1).contains(&t));

        // Widening adjustment registers the newly covered cells.
        let wide = grid.span_for(Point2::new(0.0, 0.0), Point2::new(0.6, 0.1));
        grid.adjust(t, new, wide, true);
        assert!(grid.candidates(2, 0).contains(&t));

        grid.remove(t, wide);
        assert!(grid.candidates(0, 0).is_empty());
        assert!(grid.candidates(2, 0).is_empty());
    }

    #[test]
    fn span_clamps_out_of_bounds_boxes() {
        let grid = unit_grid(1); // 2x2
        let span = grid.span_for(Point2::new(-5.0, -5.0), Point2::new(5.0, 0.4));
        assert_eq!(
            span,
            GridSpan {
                i0: 0,
                j0: 0,
                i1: 1,
                j1: 0
            }
        );
    }
}
