//! Height interpolation over a single triangle.
//!
//! Two evaluation paths mirror the mesh's `eval` degrees: a barycentric
//! linear blend of corner heights (degree 1) and a cubic triangular Bézier
//! patch (degree > 1) whose edge control points are Hermite terms derived
//! from the corner normals, so the interpolated surface is tangent-plane
//! consistent at the corners.

use crate::geometry::point::{Point3, Vector3};

/// Barycentric-linear height blend.
#[inline]
#[must_use]
pub fn linear_height(weights: [f64; 3], heights: [f64; 3]) -> f64 {
    weights[0] * heights[0] + weights[1] * heights[1] + weights[2] * heights[2]
}

/// The (unnormalized) surface normal of triangle `(p0, p1, p2)`.
///
/// Counter-clockwise triangles in the parameter plane yield a +z component;
/// the magnitude is twice the triangle area, which makes summing these
/// vectors an area-weighted normal average.
#[must_use]
pub fn surface_normal(p0: Point3, p1: Point3, p2: Point3) -> Vector3 {
    (p1 - p0).cross(&(p2 - p0))
}

/// Height-field gradient `(dz/dx, dz/dy)` implied by a surface normal.
///
/// Returns `None` when the normal is (near-)horizontal, i.e. the surface is
/// locally vertical and has no height-field gradient.
fn normal_gradient(n: Vector3) -> Option<(f64, f64)> {
    // A well-formed height field has a normal with a clear z component.
    if n.z.abs() <= f64::EPSILON * (n.x.abs() + n.y.abs()).max(1.0) {
        return None;
    }
    Some((-n.x / n.z, -n.y / n.z))
}

/// Cubic Bézier-triangle height at barycentric `weights`.
///
/// Control net construction:
/// - corner coefficients are the corner heights;
/// - each edge coefficient is a cubic Hermite term: the corner height plus a
///   third of the directional derivative (from [`normal_gradient`]) along the
///   parameter-plane edge;
/// - the interior coefficient is the standard quadratic-precision choice
///   `E/4 − V/6` over the edge and corner coefficient sums.
///
/// A corner whose normal is horizontal degrades gracefully to a zero
/// gradient at that corner.
#[must_use]
pub fn cubic_height(weights: [f64; 3], corners: [Point3; 3], normals: [Vector3; 3]) -> f64 {
    let [w0, w1, w2] = weights;
    let [p0, p1, p2] = corners;

    let z = [p0.z, p1.z, p2.z];
    let grad: Vec<(f64, f64)> = normals
        .iter()
        .map(|&n| normal_gradient(n).unwrap_or((0.0, 0.0)))
        .collect();

    // Directional Hermite term from corner i toward corner j.
    let edge = |i: usize, j: usize| -> f64 {
        let (dx, dy) = (corners[j].x - corners[i].x, corners[j].y - corners[i].y);
        let (gx, gy) = grad[i];
        z[i] + (gx * dx + gy * dy) / 3.0
    };

    let b210 = edge(0, 1);
    let b120 = edge(1, 0);
    let b021 = edge(1, 2);
    let b012 = edge(2, 1);
    let b102 = edge(2, 0);
    let b201 = edge(0, 2);

    let e = b210 + b120 + b021 + b012 + b102 + b201;
    let v = z[0] + z[1] + z[2];
    let b111 = e / 4.0 - v / 6.0;

    z[0] * w0 * w0 * w0
        + z[1] * w1 * w1 * w1
        + z[2] * w2 * w2 * w2
        + 3.0 * b210 * w0 * w0 * w1
        + 3.0 * b201 * w0 * w0 * w2
        + 3.0 * b120 * w0 * w1 * w1
        + 3.0 * b021 * w1 * w1 * w2
        + 3.0 * b012 * w1 * w2 * w2
        + 3.0 * b102 * w0 * w2 * w2
        + 6.0 * b111 * w0 * w1 * w2
}
