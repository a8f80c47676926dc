//! The triangle-mesh container.
//!
//! [`TriangleMesh`] exclusively owns three slotmap arenas (vertices, edges,
//! triangles) plus the bucket grid; every cross-reference between mesh
//! entities is a typed key into those arenas, so stale handles are caught by
//! the slotmap generation counters instead of dangling. All mutation flows
//! through the mesh: the algorithm modules receive `&mut TriangleMesh`
//! explicitly rather than reaching through any shared global state, which
//! lets independent meshes coexist (and makes the lifecycle machine-checkable).
//!
//! Deletion order is encoded in two cascade helpers: removing an edge first
//! removes its adjacent triangles, and removing a triangle detaches it from
//! its edges without touching them. Vertices are removed last, after their
//! incident edges are gone.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::core::algorithms::{flips, insertion, locate, removal};
use crate::core::bucket_grid::BucketGrid;
use crate::core::edge::Edge;
use crate::core::triangle::{GridSpan, Triangle};
use crate::core::vertex::Vertex;
use crate::geometry::interpolate::{cubic_height, linear_height, surface_normal};
use crate::geometry::point::{Point2, Point3, Rect, Vector3};
use crate::geometry::predicates::barycentric;

new_key_type! {
    /// Stable, generation-checked key for a vertex in the mesh arena.
    pub struct VertexKey;
}

new_key_type! {
    /// Stable, generation-checked key for an edge in the mesh arena.
    pub struct EdgeKey;
}

new_key_type! {
    /// Stable, generation-checked key for a triangle in the mesh arena.
    pub struct TriangleKey;
}

/// Errors surfaced by mesh mutation and query operations.
///
/// All of these are recoverable: a failed operation leaves the mesh in its
/// previous consistent state.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MeshError {
    /// A lookup or removal addressed a position with no vertex.
    #[error("no vertex at position ({x}, {y})")]
    VertexNotFound {
        /// Queried abscissa.
        x: f64,
        /// Queried ordinate.
        y: f64,
    },
    /// An insertion or weave addressed a position outside the convex hull.
    #[error("position ({x}, {y}) lies outside the triangulated hull")]
    OutsideHull {
        /// Queried abscissa.
        x: f64,
        /// Queried ordinate.
        y: f64,
    },
    /// A mutation would violate a constraint marking.
    #[error("constraint violation: {message}")]
    ConstraintViolation {
        /// Description of the violated constraint.
        message: String,
    },
    /// Input geometry too degenerate to operate on.
    #[error("degenerate geometry: {message}")]
    DegenerateGeometry {
        /// Description of the degeneracy.
        message: String,
    },
}

/// Construction state of the mesh.
///
/// Vertices inserted before the first [`TriangleMesh::triangulate`] call are
/// only gathered; topology exists once the mesh is `Triangulated`, after
/// which insertions weave incrementally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshState {
    /// Collecting vertices; no topology yet.
    #[default]
    Gathering,
    /// Topology built; insertions and removals are incremental.
    Triangulated,
}

/// Outcome of [`TriangleMesh::insert_vertex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new vertex was created.
    Created(VertexKey),
    /// A vertex already existed at the position; its height, normal and
    /// constraint flag were updated in place.
    Updated(VertexKey),
}

impl InsertOutcome {
    /// The affected vertex.
    #[must_use]
    pub const fn key(&self) -> VertexKey {
        match self {
            Self::Created(k) | Self::Updated(k) => *k,
        }
    }

    /// Whether a new vertex was created.
    #[must_use]
    pub const fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Tuning knobs for the mesh.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Relative position tolerance. Scaled by the padded bounding-box extent
    /// into the absolute epsilon used by duplicate detection, collinearity
    /// and convexity tests.
    pub position_tolerance: f64,
    /// Cap on the bucket-grid subdivision depth (grid is `2^d × 2^d` cells).
    pub max_grid_depth: u8,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            position_tolerance: 1e-9,
            max_grid_depth: 8,
        }
    }
}

/// An incrementally maintained planar Delaunay triangle mesh over a 2.5D
/// height field.
///
/// # Usage
///
/// ```
/// use delaunay2d::prelude::*;
///
/// let mut mesh = TriangleMesh::from_points(&[
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ])
/// .unwrap();
///
/// assert_eq!(mesh.number_of_vertices(), 4);
/// assert_eq!(mesh.number_of_edges(), 5);
/// assert_eq!(mesh.number_of_triangles(), 2);
///
/// let outcome = mesh
///     .insert_vertex(Vertex::new(Point3::new(0.5, 0.5, 1.0)), false)
///     .unwrap();
/// assert!(outcome.was_created());
/// assert_eq!(mesh.euler_characteristic(), 1);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub(crate) vertices: SlotMap<VertexKey, Vertex>,
    pub(crate) edges: SlotMap<EdgeKey, Edge>,
    pub(crate) triangles: SlotMap<TriangleKey, Triangle>,
    pub(crate) grid: BucketGrid,
    pub(crate) state: MeshState,
    pub(crate) config: MeshConfig,
    /// Absolute tolerance; derived from `config.position_tolerance` and the
    /// padded bounds at triangulation time.
    pub(crate) eps: f64,
    /// Set when a plain removal left an unfilled hole in the patch; cleared
    /// by the next full triangulation.
    pub(crate) punctured: bool,
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl TriangleMesh {
    /// Creates an empty mesh with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MeshConfig::default())
    }

    /// Creates an empty mesh with an explicit configuration.
    #[must_use]
    pub fn with_config(config: MeshConfig) -> Self {
        Self {
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            triangles: SlotMap::with_key(),
            grid: BucketGrid::empty(),
            state: MeshState::Gathering,
            config,
            eps: config.position_tolerance,
            punctured: false,
        }
    }

    /// Builds a triangulated mesh from a batch of positions.
    ///
    /// # Errors
    ///
    /// Propagates any [`MeshError`] from the bulk triangulation (degenerate
    /// input sets, internal weaving failures).
    pub fn from_points(points: &[Point3]) -> Result<Self, MeshError> {
        let mut mesh = Self::new();
        for &p in points {
            mesh.insert_vertex(Vertex::new(p), false)?;
        }
        mesh.triangulate()?;
        Ok(mesh)
    }

    // =========================================================================
    // MUTATION API
    // =========================================================================

    /// Builds a Delaunay triangulation of all gathered vertices.
    ///
    /// No-op when fewer than three vertices are present. Existing topology is
    /// discarded and rebuilt: the bounding box is padded by its own extent,
    /// a synthetic super-triangle bootstraps incremental insertion, every
    /// real vertex is woven in, the synthetic vertices are removed again, and
    /// the boundary is repaired to the convex hull.
    ///
    /// # Errors
    ///
    /// [`MeshError::DegenerateGeometry`] when the vertex set has no finite
    /// spread; internal weaving errors are propagated.
    pub fn triangulate(&mut self) -> Result<(), MeshError> {
        insertion::triangulate(self)
    }

    /// Inserts `vertex`, or updates the vertex already at its position.
    ///
    /// Before the first triangulation the vertex is only gathered. On a
    /// triangulated mesh the vertex is woven into the topology (edge or
    /// triangle split plus local Delaunay repair).
    ///
    /// # Errors
    ///
    /// [`MeshError::OutsideHull`] when inserting outside the triangulated
    /// hull; [`MeshError::DegenerateGeometry`] for non-finite positions.
    pub fn insert_vertex(
        &mut self,
        vertex: Vertex,
        constrained: bool,
    ) -> Result<InsertOutcome, MeshError> {
        insertion::insert_vertex(self, vertex, constrained)
    }

    /// Removes the vertex at `position`, cascading away its incident edges
    /// and triangles. The resulting hole is left untriangulated; use
    /// [`TriangleMesh::remove_vertex_fill`] to re-fill it. The mesh is marked
    /// [punctured](TriangleMesh::is_punctured) until the next full
    /// triangulation.
    ///
    /// # Errors
    ///
    /// [`MeshError::VertexNotFound`] when no vertex matches `position`;
    /// [`MeshError::ConstraintViolation`] for a constrained vertex.
    pub fn remove_vertex(&mut self, position: Point2) -> Result<(), MeshError> {
        let key = self
            .find_vertex(position)
            .ok_or(MeshError::VertexNotFound {
                x: position.x,
                y: position.y,
            })?;
        self.check_removable(key)?;
        removal::remove_vertex(self, key);
        if self.state == MeshState::Triangulated {
            self.punctured = true;
        }
        Ok(())
    }

    /// Removes the vertex at `position` and re-fills the hole by ear-clipping
    /// its link polygon.
    ///
    /// Boundary vertices fall back to plain removal (their link is not a
    /// closed polygon); the mesh is then marked
    /// [punctured](TriangleMesh::is_punctured), as after a refill failure.
    ///
    /// # Errors
    ///
    /// [`MeshError::VertexNotFound`] when no vertex matches `position`;
    /// [`MeshError::ConstraintViolation`] for a constrained vertex;
    /// [`MeshError::DegenerateGeometry`] when the link polygon cannot be
    /// triangulated.
    pub fn remove_vertex_fill(&mut self, position: Point2) -> Result<(), MeshError> {
        let key = self
            .find_vertex(position)
            .ok_or(MeshError::VertexNotFound {
                x: position.x,
                y: position.y,
            })?;
        self.check_removable(key)?;
        removal::remove_vertex_fill(self, key)
    }

    /// Constrained vertices are pinned: they refuse removal until unmarked.
    fn check_removable(&self, key: VertexKey) -> Result<(), MeshError> {
        if self.vertices[key].is_constrained() {
            let p = self.vertices[key].parameter();
            return Err(MeshError::ConstraintViolation {
                message: format!("vertex at ({}, {}) is constrained", p.x, p.y),
            });
        }
        Ok(())
    }

    /// Flips an interior, unconstrained edge to the opposite diagonal of its
    /// two adjacent triangles.
    ///
    /// Returns `false` (and leaves the mesh untouched) for boundary or
    /// constrained edges, or when the flip would create a degenerate
    /// triangle. A successful flip preserves the vertex, edge and triangle
    /// counts and the boundary.
    pub fn flip_edge(&mut self, edge: EdgeKey) -> bool {
        flips::flip_edge(self, edge)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Locates `p` against the current topology.
    #[must_use]
    pub fn locate(&self, p: Point2) -> locate::PointLocation {
        locate::locate(self, p)
    }

    /// Evaluates the height field at `(x, y)`.
    ///
    /// `degree == 1` blends the corner heights barycentrically; higher
    /// degrees evaluate the cubic Bézier-triangle patch built from the
    /// corner normals. Returns `None` outside the mesh.
    #[must_use]
    pub fn eval_z(&self, x: f64, y: f64, degree: u8) -> Option<f64> {
        let p = Point2::new(x, y);
        let triangle = match self.locate(p) {
            locate::PointLocation::Inside(t) => t,
            locate::PointLocation::OnEdge(e) => self.edges[e].triangle_keys().next()?,
            locate::PointLocation::OutsideHull => return None,
        };

        let keys = self.triangle_vertices(triangle);
        let corners = keys.map(|k| self.vertices[k].position());
        let weights = barycentric(p, corners[0].xy(), corners[1].xy(), corners[2].xy())?;

        if degree <= 1 {
            Some(linear_height(weights, corners.map(|c| c.z)))
        } else {
            let normals = keys.map(|k| self.vertex_normal(k));
            Some(cubic_height(weights, corners, normals))
        }
    }

    /// Evaluates the height field at `(x, y)` and returns the full surface
    /// point. Returns `None` outside the mesh.
    #[must_use]
    pub fn eval(&self, x: f64, y: f64, degree: u8) -> Option<Point3> {
        self.eval_z(x, y, degree).map(|z| Point3::new(x, y, z))
    }

    /// The vertex whose parameter-plane position matches `p` within the mesh
    /// tolerance.
    #[must_use]
    pub fn find_vertex(&self, p: Point2) -> Option<VertexKey> {
        let eps2 = self.eps * self.eps;
        self.vertices
            .iter()
            .find(|(_, v)| v.parameter().distance_squared(&p) <= eps2)
            .map(|(k, _)| k)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Number of vertices.
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn number_of_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Iterates vertices with their keys.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &Vertex)> {
        self.vertices.iter()
    }

    /// Iterates edges with their keys.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &Edge)> {
        self.edges.iter()
    }

    /// Iterates triangles with their keys.
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleKey, &Triangle)> {
        self.triangles.iter()
    }

    /// Iterates the boundary edges (one missing triangle slot).
    pub fn boundary_edges(&self) -> impl Iterator<Item = (EdgeKey, &Edge)> {
        self.edges.iter().filter(|(_, e)| e.is_boundary())
    }

    /// The vertex stored under `key`.
    #[must_use]
    pub fn vertex(&self, key: VertexKey) -> Option<&Vertex> {
        self.vertices.get(key)
    }

    /// The edge stored under `key`.
    #[must_use]
    pub fn edge(&self, key: EdgeKey) -> Option<&Edge> {
        self.edges.get(key)
    }

    /// The triangle stored under `key`.
    #[must_use]
    pub fn triangle(&self, key: TriangleKey) -> Option<&Triangle> {
        self.triangles.get(key)
    }

    /// The construction state.
    #[must_use]
    pub const fn state(&self) -> MeshState {
        self.state
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> MeshConfig {
        self.config
    }

    /// The absolute position tolerance currently in effect.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.eps
    }

    /// Whether a plain removal left an unfilled hole since the last full
    /// triangulation. A punctured patch is still structurally consistent,
    /// but its Euler characteristic is no longer pinned to 1.
    #[must_use]
    pub const fn is_punctured(&self) -> bool {
        self.punctured
    }

    /// The vertex triple of a triangle, in winding order: vertex `i` is
    /// shared by edges `(i + 2) % 3` and `i`.
    ///
    /// # Panics
    ///
    /// Panics when the triangle's edges do not pairwise share vertices; the
    /// mutation operators maintain that invariant.
    #[must_use]
    pub fn triangle_vertices(&self, t: TriangleKey) -> [VertexKey; 3] {
        let edges = self.triangles[t].edges();
        let v0 = self
            .common_vertex(edges[2], edges[0])
            .expect("edges 2 and 0 must share a vertex");
        let v1 = self
            .common_vertex(edges[0], edges[1])
            .expect("edges 0 and 1 must share a vertex");
        let v2 = self
            .common_vertex(edges[1], edges[2])
            .expect("edges 1 and 2 must share a vertex");
        [v0, v1, v2]
    }

    /// The parameter-plane corner points of a triangle, in winding order.
    #[must_use]
    pub fn triangle_parameters(&self, t: TriangleKey) -> [Point2; 3] {
        self.triangle_vertices(t)
            .map(|k| self.vertices[k].parameter())
    }

    /// The parameter-plane centroid of a triangle.
    #[must_use]
    pub fn triangle_centroid(&self, t: TriangleKey) -> Point2 {
        let [a, b, c] = self.triangle_parameters(t);
        Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
    }

    /// The vertex of triangle `t` not on edge `e`.
    #[must_use]
    pub fn opposite_vertex(&self, t: TriangleKey, e: EdgeKey) -> Option<VertexKey> {
        let edge = self.edges.get(e)?;
        self.triangle_vertices(t)
            .into_iter()
            .find(|&v| !edge.has_vertex(v))
    }

    /// The surface normal at a vertex: the explicitly stored normal when
    /// present, otherwise the area-weighted average of the incident triangle
    /// normals (computed lazily). Defaults to +z for an isolated vertex.
    #[must_use]
    pub fn vertex_normal(&self, v: VertexKey) -> Vector3 {
        if let Some(n) = self.vertices[v].stored_normal() {
            return n;
        }
        let mut sum = Vector3::default();
        let mut seen: crate::core::collections::SmallBuffer<TriangleKey, 8> =
            crate::core::collections::SmallBuffer::new();
        for &e in self.vertices[v].edge_keys() {
            for t in self.edges[e].triangle_keys() {
                if seen.contains(&t) {
                    continue;
                }
                seen.push(t);
                let [a, b, c] = self
                    .triangle_vertices(t)
                    .map(|k| self.vertices[k].position());
                sum = sum + surface_normal(a, b, c);
            }
        }
        sum.normalized().unwrap_or(Vector3::unit_z())
    }

    /// Euler characteristic `V − E + F` of the current topology.
    ///
    /// For any simply connected triangulated patch this is 1; it is the
    /// primary regression oracle after every mutation. A
    /// [punctured](TriangleMesh::is_punctured) patch may legally read 0
    /// (interior hole) or 2 (disconnection at a cut vertex).
    #[must_use]
    pub fn euler_characteristic(&self) -> i64 {
        self.number_of_vertices() as i64 - self.number_of_edges() as i64
            + self.number_of_triangles() as i64
    }

    // =========================================================================
    // INTERNAL TOPOLOGY PLUMBING
    // =========================================================================

    /// The vertex shared by two edges, if any.
    pub(crate) fn common_vertex(&self, a: EdgeKey, b: EdgeKey) -> Option<VertexKey> {
        let eb = &self.edges[b];
        self.edges[a]
            .vertices()
            .into_iter()
            .find(|&v| eb.has_vertex(v))
    }

    /// Creates an edge and registers it with both endpoints. The edge starts
    /// constrained when both endpoints are constrained.
    pub(crate) fn create_edge(&mut self, first: VertexKey, last: VertexKey) -> EdgeKey {
        let mut edge = Edge::new(first, last);
        if self.vertices[first].is_constrained() && self.vertices[last].is_constrained() {
            edge.set_constrained(true);
        }
        let key = self.edges.insert(edge);
        self.vertices[first].attach_edge(key);
        self.vertices[last].attach_edge(key);
        key
    }

    /// Creates a triangle over three edges, wires the edge back-references,
    /// and registers it in the grid.
    pub(crate) fn create_triangle(&mut self, edges: [EdgeKey; 3]) -> TriangleKey {
        let key = self.triangles.insert(Triangle::new(edges));
        for e in edges {
            self.edges[e].attach_triangle(key);
        }
        let span = self.compute_span(key);
        self.triangles[key].set_span(span);
        self.grid.insert(key, span);
        key
    }

    /// Removes a triangle: grid deregistration plus edge detachment. Edges
    /// are left in place (they may be shared with a neighbor).
    pub(crate) fn remove_triangle(&mut self, t: TriangleKey) {
        let Some(triangle) = self.triangles.remove(t) else {
            return;
        };
        self.grid.remove(t, triangle.span());
        for e in triangle.edges() {
            if let Some(edge) = self.edges.get_mut(e) {
                edge.detach_triangle(t);
            }
        }
    }

    /// Removes an edge, cascading to its adjacent triangles first, then
    /// detaching from both endpoint incident lists.
    pub(crate) fn remove_edge(&mut self, e: EdgeKey) {
        let Some(edge) = self.edges.get(e) else {
            return;
        };
        let adjacent: [Option<TriangleKey>; 2] = edge.triangles();
        for t in adjacent.into_iter().flatten() {
            self.remove_triangle(t);
        }
        let Some(edge) = self.edges.remove(e) else {
            return;
        };
        for v in edge.vertices() {
            if let Some(vertex) = self.vertices.get_mut(v) {
                vertex.detach_edge(e);
            }
        }
    }

    /// The grid span covered by a triangle's current geometry.
    pub(crate) fn compute_span(&self, t: TriangleKey) -> GridSpan {
        let [a, b, c] = self.triangle_parameters(t);
        let min = Point2::new(a.x.min(b.x).min(c.x), a.y.min(b.y).min(c.y));
        let max = Point2::new(a.x.max(b.x).max(c.x), a.y.max(b.y).max(c.y));
        self.grid.span_for(min, max)
    }

    /// Recomputes and re-registers a triangle's grid span after its geometry
    /// changed. `wider` must be set when the new span can extend beyond the
    /// old one (edge flips); splits only shrink.
    pub(crate) fn adjust_triangle(&mut self, t: TriangleKey, wider: bool) {
        let old = self.triangles[t].span();
        let new = self.compute_span(t);
        if old != new {
            self.grid.adjust(t, old, new, wider);
            self.triangles[t].set_span(new);
        }
    }

    /// The padded bounding rectangle of all current vertices.
    pub(crate) fn vertex_bounds(&self) -> Option<Rect> {
        Rect::bounding(self.vertices.values().map(Vertex::parameter))
    }
}
