//! Structural and geometric validation.
//!
//! Two layers, separately invocable: [`validate_topology`] checks the arena
//! cross-references (every key resolves, every back-reference is mutual, the
//! Euler characteristic of a hole-free triangulated patch is 1), and
//! [`validate_delaunay`] checks the empty-circumcircle criterion on every
//! interior unconstrained edge. Tests run both after every mutation
//! sequence; they are cheap enough for debug assertions on small meshes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::algorithms::flips;
use crate::core::mesh::{MeshState, TriangleMesh};

/// Census of a mesh's simplices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplexCounts {
    /// Number of vertices.
    pub vertices: usize,
    /// Number of edges.
    pub edges: usize,
    /// Number of triangles.
    pub triangles: usize,
    /// Number of boundary edges.
    pub boundary_edges: usize,
}

/// Counts the mesh's simplices.
#[must_use]
pub fn simplex_counts(mesh: &TriangleMesh) -> SimplexCounts {
    SimplexCounts {
        vertices: mesh.number_of_vertices(),
        edges: mesh.number_of_edges(),
        triangles: mesh.number_of_triangles(),
        boundary_edges: mesh.boundary_edges().count(),
    }
}

/// A violated mesh invariant.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A stored key no longer resolves in its arena.
    #[error("dangling reference: {message}")]
    DanglingReference {
        /// Which reference dangles.
        message: String,
    },
    /// A back-reference is not mutual.
    #[error("inconsistent adjacency: {message}")]
    InconsistentAdjacency {
        /// Which adjacency is one-sided.
        message: String,
    },
    /// The Euler characteristic of a hole-free triangulated patch is not 1.
    #[error("euler characteristic is {found}, expected 1")]
    EulerViolation {
        /// The observed characteristic.
        found: i64,
    },
    /// An interior unconstrained edge fails the in-circle test.
    #[error("delaunay criterion violated: {message}")]
    DelaunayViolation {
        /// Which edge fails.
        message: String,
    },
}

/// Checks the structural invariants of the mesh.
///
/// # Errors
///
/// The first violated invariant found, as a [`ValidationError`].
pub fn validate_topology(mesh: &TriangleMesh) -> Result<(), ValidationError> {
    for (vk, vertex) in mesh.vertices() {
        for &e in vertex.edge_keys() {
            let edge = mesh.edge(e).ok_or_else(|| ValidationError::DanglingReference {
                message: format!("vertex {vk:?} lists a removed edge"),
            })?;
            if !edge.has_vertex(vk) {
                return Err(ValidationError::InconsistentAdjacency {
                    message: format!("vertex {vk:?} lists edge {e:?} which does not end in it"),
                });
            }
        }
    }

    for (ek, edge) in mesh.edges() {
        let [a, b] = edge.vertices();
        if a == b {
            return Err(ValidationError::InconsistentAdjacency {
                message: format!("edge {ek:?} has coincident endpoints"),
            });
        }
        for v in [a, b] {
            let vertex = mesh
                .vertex(v)
                .ok_or_else(|| ValidationError::DanglingReference {
                    message: format!("edge {ek:?} references a removed vertex"),
                })?;
            if !vertex.edge_keys().contains(&ek) {
                return Err(ValidationError::InconsistentAdjacency {
                    message: format!("edge {ek:?} missing from the incident list of {v:?}"),
                });
            }
        }
        let [t0, t1] = edge.triangles();
        if t0.is_some() && t0 == t1 {
            return Err(ValidationError::InconsistentAdjacency {
                message: format!("edge {ek:?} lists the same triangle twice"),
            });
        }
        for t in edge.triangle_keys() {
            let triangle = mesh
                .triangle(t)
                .ok_or_else(|| ValidationError::DanglingReference {
                    message: format!("edge {ek:?} references a removed triangle"),
                })?;
            if !triangle.has_edge(ek) {
                return Err(ValidationError::InconsistentAdjacency {
                    message: format!("edge {ek:?} lists triangle {t:?} which does not use it"),
                });
            }
        }
    }

    for (tk, triangle) in mesh.triangles() {
        for e in triangle.edges() {
            let edge = mesh.edge(e).ok_or_else(|| ValidationError::DanglingReference {
                message: format!("triangle {tk:?} references a removed edge"),
            })?;
            if !edge.triangle_keys().any(|t| t == tk) {
                return Err(ValidationError::InconsistentAdjacency {
                    message: format!("triangle {tk:?} missing from the slots of edge {e:?}"),
                });
            }
        }
        let [e0, e1, e2] = triangle.edges();
        let shared = [(e2, e0), (e0, e1), (e1, e2)].map(|(x, y)| mesh.common_vertex(x, y));
        if shared.iter().any(Option::is_none) {
            return Err(ValidationError::InconsistentAdjacency {
                message: format!("triangle {tk:?} edges do not form a cycle"),
            });
        }
        if shared[0] == shared[1] || shared[1] == shared[2] || shared[0] == shared[2] {
            return Err(ValidationError::InconsistentAdjacency {
                message: format!("triangle {tk:?} has coincident corners"),
            });
        }
    }

    // A punctured patch (plain removal left a hole open) legally reads 0 or
    // 2; only hole-free triangulated patches are pinned to 1.
    if mesh.state() == MeshState::Triangulated
        && mesh.number_of_triangles() > 0
        && !mesh.is_punctured()
    {
        let chi = mesh.euler_characteristic();
        if chi != 1 {
            return Err(ValidationError::EulerViolation { found: chi });
        }
    }
    Ok(())
}

/// Checks the Delaunay criterion on every interior unconstrained edge.
///
/// # Errors
///
/// [`ValidationError::DelaunayViolation`] naming the first failing edge.
pub fn validate_delaunay(mesh: &TriangleMesh) -> Result<(), ValidationError> {
    for (ek, edge) in mesh.edges() {
        if !flips::edge_is_delaunay(mesh, ek) {
            let [a, b] = edge.vertices();
            let pa = mesh.vertex(a).map(|v| v.parameter());
            let pb = mesh.vertex(b).map(|v| v.parameter());
            return Err(ValidationError::DelaunayViolation {
                message: format!("edge {ek:?} between {pa:?} and {pb:?}"),
            });
        }
    }
    Ok(())
}

impl TriangleMesh {
    /// Whether the mesh passes both topology and Delaunay validation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        validate_topology(self).is_ok() && validate_delaunay(self).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point3;

    fn square_with_center() -> TriangleMesh {
        TriangleMesh::from_points(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 0.5, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn fresh_triangulation_validates() {
        let mesh = square_with_center();
        validate_topology(&mesh).unwrap();
        validate_delaunay(&mesh).unwrap();
        assert!(mesh.is_valid());

        let counts = simplex_counts(&mesh);
        assert_eq!(counts.vertices, 5);
        assert_eq!(counts.edges, 8);
        assert_eq!(counts.triangles, 4);
        assert_eq!(counts.boundary_edges, 4);
    }

    #[test]
    fn planted_bad_diagonal_fails_delaunay_validation() {
        let mut mesh = TriangleMesh::from_points(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, -0.2, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(2.0, 0.2, 0.0),
        ])
        .unwrap();
        validate_delaunay(&mesh).unwrap();

        let diagonal = mesh
            .edges()
            .find(|(_, e)| !e.is_boundary())
            .map(|(k, _)| k)
            .unwrap();
        assert!(mesh.flip_edge(diagonal));
        assert!(validate_delaunay(&mesh).is_err());
        // Topology stays sound; only the geometric criterion fails.
        validate_topology(&mesh).unwrap();
    }

    #[test]
    fn empty_and_gathering_meshes_validate() {
        let mesh = TriangleMesh::new();
        validate_topology(&mesh).unwrap();
        validate_delaunay(&mesh).unwrap();
    }

    #[test]
    fn punctured_patch_validates_without_the_euler_oracle() {
        use crate::geometry::point::Point2;

        let mut mesh = TriangleMesh::from_points(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.3, 0.3, 0.0),
            Point3::new(0.7, 0.7, 0.0),
        ])
        .unwrap();
        assert!(!mesh.is_punctured());

        // Plain removal leaves the hole open; the patch is consistent but no
        // longer a disk.
        mesh.remove_vertex(Point2::new(0.3, 0.3)).unwrap();
        assert!(mesh.is_punctured());
        assert!(mesh.number_of_triangles() > 0);
        assert_ne!(mesh.euler_characteristic(), 1);
        validate_topology(&mesh).unwrap();
        assert!(mesh.is_valid());

        // Rebuilding closes the hole and re-arms the Euler oracle.
        mesh.triangulate().unwrap();
        assert!(!mesh.is_punctured());
        assert_eq!(mesh.euler_characteristic(), 1);
        assert!(mesh.is_valid());
    }
}
