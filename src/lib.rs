//! # delaunay2d
//!
//! An incrementally maintained planar Delaunay triangulation over a 2.5D
//! height field: vertices carry full 3D positions, topology and point
//! location operate on their `(x, y)` projection.
//!
//! # Features
//!
//! - Bulk Delaunay triangulation of a gathered point set, then incremental
//!   single-vertex insertion (edge/triangle split plus Lawson edge flips)
//!   and removal (cascading, or with priority-queue ear-clipping re-fill)
//! - Spatial bucket grid for O(1)-expected point location
//! - Height-field evaluation: barycentric-linear or cubic Bézier-triangle
//!   blending from vertex normals
//! - Constrained vertices and edges that are exempt from Delaunay flipping
//! - Arena-backed storage with generation-checked keys ([slotmap](https://docs.rs/slotmap))
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use delaunay2d::prelude::*;
//!
//! let mut mesh = TriangleMesh::from_points(&[
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.2),
//!     Point3::new(1.0, 1.0, 0.5),
//!     Point3::new(0.0, 1.0, 0.1),
//! ])
//! .unwrap();
//!
//! // The unit square triangulates into two triangles over five edges.
//! assert_eq!(mesh.number_of_vertices(), 4);
//! assert_eq!(mesh.number_of_edges(), 5);
//! assert_eq!(mesh.number_of_triangles(), 2);
//!
//! // Incremental insertion keeps the mesh Delaunay.
//! mesh.insert_vertex(vertex!([0.4, 0.6, 0.3]), false).unwrap();
//! assert_eq!(mesh.euler_characteristic(), 1);
//! assert!(mesh.is_valid());
//!
//! // The mesh is a height field over its hull.
//! let z = mesh.eval_z(0.5, 0.5, 1).unwrap();
//! assert!(z.is_finite());
//! assert!(mesh.eval_z(5.0, 5.0, 1).is_none());
//! ```
//!
//! # Invariants
//!
//! The mesh maintains a set of structural and geometric invariants, checked
//! by [`core::validation::validate_topology`] and
//! [`core::validation::validate_delaunay`]:
//!
//! - **Mutual references** – vertices list exactly their incident edges,
//!   edges list exactly their adjacent triangles, and vice versa.
//! - **Edge cycles** – the three edges of every triangle pairwise share the
//!   triangle's three distinct corners.
//! - **Euler characteristic** – every triangulated patch satisfies
//!   `V − E + F = 1`.
//! - **Delaunay property** – no vertex lies strictly inside the
//!   circumcircle of any triangle, except across constrained edges.

#![forbid(unsafe_code)]

/// Primary data structures and algorithms for building and maintaining the
/// triangle mesh.
pub mod core {
    /// Mesh maintenance algorithms: location, splits, flips, removal.
    pub mod algorithms {
        /// Edge flips and Lawson Delaunay repair
        pub mod flips;
        /// Bulk triangulation, incremental weaving, and the split operators
        pub mod insertion;
        /// Point location through the bucket grid
        pub mod locate;
        /// Vertex removal and hole re-filling
        pub mod removal;
    }
    /// The uniform bucket grid backing point location
    pub mod bucket_grid;
    /// Collection aliases tuned for mesh workloads
    pub mod collections;
    pub mod edge;
    pub mod mesh;
    pub mod triangle;
    /// Structural and geometric invariant checking
    pub mod validation;
    pub mod vertex;

    // Re-export the `core` modules.
    pub use edge::*;
    pub use mesh::*;
    pub use triangle::*;
    pub use validation::*;
    pub use vertex::*;
    // Note: collections module not re-exported here to avoid namespace
    // pollution; import via the prelude or crate::core::collections.
}

/// Geometric primitives, predicates, and height interpolation.
pub mod geometry {
    /// Linear and cubic height blending over a triangle
    pub mod interpolate;
    pub mod point;
    /// Orientation and in-circle predicates with adaptive tolerances
    pub mod predicates;

    pub use interpolate::*;
    pub use point::*;
    pub use predicates::*;
}

/// A prelude module that re-exports commonly used types and macros.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{
        algorithms::locate::PointLocation, edge::*, mesh::*, triangle::*, validation::*, vertex::*,
    };

    // Commonly used collection aliases
    pub use crate::core::collections::{FastHashMap, FastHashSet, SmallBuffer};

    // Re-export from geometry
    pub use crate::geometry::{interpolate::*, point::*, predicates::*};

    // Convenience macros
    pub use crate::vertex;
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::core::mesh::{MeshError, TriangleMesh};
    use crate::core::{edge::Edge, triangle::Triangle, vertex::Vertex};
    use crate::is_normal;

    #[test]
    fn normal_types() {
        assert!(is_normal::<TriangleMesh>());
        assert!(is_normal::<Vertex>());
        assert!(is_normal::<Edge>());
        assert!(is_normal::<Triangle>());
        assert!(is_normal::<MeshError>());
    }
}
