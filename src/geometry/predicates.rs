//! Planar geometric predicates.
//!
//! The two predicates at the heart of the engine are the orientation test
//! (signed area of a vertex triple) and the in-circle test that drives
//! Lawson edge flipping. Both are evaluated as explicit determinants with
//! adaptive tolerances: the orientation test accepts a caller-supplied
//! distance tolerance (scaled by the edge length into an area tolerance),
//! while the in-circle test uses a static error bound derived from the
//! magnitude of its determinant terms.

use crate::geometry::point::Point2;

/// Position of a query point relative to a circumscribed circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InCircle {
    /// The point is outside the circle.
    OUTSIDE,
    /// The point is on the circle (within numerical tolerance).
    BOUNDARY,
    /// The point is strictly inside the circle.
    INSIDE,
}

impl std::fmt::Display for InCircle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OUTSIDE => write!(f, "OUTSIDE"),
            Self::BOUNDARY => write!(f, "BOUNDARY"),
            Self::INSIDE => write!(f, "INSIDE"),
        }
    }
}

/// Orientation of an ordered vertex triple in the parameter plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Clockwise (negative signed area).
    NEGATIVE,
    /// Collinear within tolerance.
    DEGENERATE,
    /// Counter-clockwise (positive signed area).
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Twice the signed area of triangle `(a, b, c)`.
///
/// Positive for a counter-clockwise triple.
#[inline]
#[must_use]
pub fn orient2d(a: Point2, b: Point2, c: Point2) -> f64 {
    (b - a).cross(&(c - a))
}

/// Whether `p` lies strictly inside triangle `(a, b, c)`, in either winding.
///
/// Points within `eps` of an edge count as not inside.
#[must_use]
pub fn in_triangle_strict(a: Point2, b: Point2, c: Point2, p: Point2, eps: f64) -> bool {
    let s0 = orientation(a, b, p, eps);
    let s1 = orientation(b, c, p, eps);
    let s2 = orientation(c, a, p, eps);
    s0 != Orientation::DEGENERATE && s0 == s1 && s1 == s2
}

/// Classifies the orientation of `(a, b, c)`.
///
/// `eps` is a distance tolerance: `c` counts as collinear with `a → b` when
/// it lies within `eps` of the supporting line. Internally the tolerance is
/// scaled by `|b - a|` so it compares against the cross-product area.
#[must_use]
pub fn orientation(a: Point2, b: Point2, c: Point2, eps: f64) -> Orientation {
    let det = orient2d(a, b, c);
    let tol = eps * (b - a).length();
    if det > tol {
        Orientation::POSITIVE
    } else if det < -tol {
        Orientation::NEGATIVE
    } else {
        Orientation::DEGENERATE
    }
}

/// Relative error bound for the in-circle determinant.
///
/// The determinant is a sum of six triple products; each product carries a
/// handful of ulps of rounding error, so a small multiple of machine epsilon
/// times the magnitude of the terms bounds the evaluation error.
const INCIRCLE_ERRBOUND: f64 = 32.0 * f64::EPSILON;

/// Tests whether `d` lies inside the circle through `a`, `b`, and `c`.
///
/// The result is independent of the orientation of `(a, b, c)`: the raw
/// determinant is normalized by the orientation sign, so a degenerate
/// (collinear) circle reports `BOUNDARY` for every query point.
#[must_use]
pub fn in_circle(a: Point2, b: Point2, c: Point2, d: Point2) -> InCircle {
    let adx = a.x - d.x;
    let ady = a.y - d.y;
    let bdx = b.x - d.x;
    let bdy = b.y - d.y;
    let cdx = c.x - d.x;
    let cdy = c.y - d.y;

    let ad2 = adx * adx + ady * ady;
    let bd2 = bdx * bdx + bdy * bdy;
    let cd2 = cdx * cdx + cdy * cdy;

    let bc = bdx * cdy - bdy * cdx;
    let ca = cdx * ady - cdy * adx;
    let ab = adx * bdy - ady * bdx;

    let det = ad2 * bc + bd2 * ca + cd2 * ab;
    let perm = ad2 * bc.abs() + bd2 * ca.abs() + cd2 * ab.abs();
    let tol = INCIRCLE_ERRBOUND * perm;

    // det > 0 means "inside" only for a counter-clockwise (a, b, c).
    let orient = orient2d(a, b, c);
    let signed = if orient < 0.0 { -det } else { det };

    if orient == 0.0 || signed.abs() <= tol {
        InCircle::BOUNDARY
    } else if signed > 0.0 {
        InCircle::INSIDE
    } else {
        InCircle::OUTSIDE
    }
}

/// Barycentric coordinates of `p` with respect to triangle `(a, b, c)`.
///
/// Returns `None` when the triangle is degenerate. The coordinates are
/// signed-area ratios and sum to 1; all three are non-negative exactly when
/// `p` lies inside or on the triangle.
#[must_use]
pub fn barycentric(p: Point2, a: Point2, b: Point2, c: Point2) -> Option<[f64; 3]> {
    let area = orient2d(a, b, c);
    if area == 0.0 || !area.is_finite() {
        return None;
    }
    let wa = orient2d(b, c, p) / area;
    let wb = orient2d(c, a, p) / area;
    let wc = orient2d(a, b, p) / area;
    Some([wa, wb, wc])
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn orientation_classifies_turns() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        assert_eq!(
            orientation(a, b, Point2::new(0.5, 1.0), EPS),
            Orientation::POSITIVE
        );
        assert_eq!(
            orientation(a, b, Point2::new(0.5, -1.0), EPS),
            Orientation::NEGATIVE
        );
        assert_eq!(
            orientation(a, b, Point2::new(2.0, 0.0), EPS),
            Orientation::DEGENERATE
        );
    }

    #[test]
    fn in_circle_unit_circle() {
        // Circle through three points of the unit circle.
        let a = Point2::new(1.0, 0.0);
        let b = Point2::new(0.0, 1.0);
        let c = Point2::new(-1.0, 0.0);
        assert_eq!(in_circle(a, b, c, Point2::new(0.0, 0.0)), InCircle::INSIDE);
        assert_eq!(in_circle(a, b, c, Point2::new(2.0, 2.0)), InCircle::OUTSIDE);
        assert_eq!(
            in_circle(a, b, c, Point2::new(0.0, -1.0)),
            InCircle::BOUNDARY
        );
    }

    #[test]
    fn in_circle_is_orientation_independent() {
        let a = Point2::new(1.0, 0.0);
        let b = Point2::new(0.0, 1.0);
        let c = Point2::new(-1.0, 0.0);
        let q = Point2::new(0.1, 0.1);
        assert_eq!(in_circle(a, b, c, q), in_circle(c, b, a, q));
    }

    #[test]
    fn barycentric_recovers_vertices_and_centroid() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.0, 1.0);

        let wa = barycentric(a, a, b, c).unwrap();
        assert!((wa[0] - 1.0).abs() < 1e-12);

        let centroid = Point2::new(1.0 / 3.0, 1.0 / 3.0);
        let w = barycentric(centroid, a, b, c).unwrap();
        for wi in w {
            assert!((wi - 1.0 / 3.0).abs() < 1e-12);
        }
        assert!((w[0] + w[1] + w[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn barycentric_rejects_degenerate_triangle() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 1.0);
        let c = Point2::new(2.0, 2.0);
        assert!(barycentric(Point2::new(0.5, 0.5), a, b, c).is_none());
    }
}
