//! Great-circle arc tests and intersection.
//!
//! Arcs are always the minor arc between their two endpoints.

use crate::{ArcError, SpherePoint, Tolerance, Vec3};

/// Planes closer to parallel than this are treated as the same great circle.
const PARALLEL_EPS: f64 = 1e-12;

/// Result of intersecting two great-circle arcs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcIntersection {
    /// Neither candidate point lies on both arcs.
    Disjoint,
    /// Exactly one candidate lies on both arcs.
    Crossing(SpherePoint),
    /// Both antipodal candidates lie on both arcs; the first is returned.
    ///
    /// Only reachable when the arcs are (nearly) half great circles.
    Ambiguous(SpherePoint),
}

/// Angle between two vectors in radians, in `[0, π]`.
///
/// Equivalent to `acos(u·v / |u||v|)` but keeps full precision for nearly
/// parallel vectors.
pub fn angle_between(u: &Vec3, v: &Vec3) -> f64 {
    u.cross(v).norm().atan2(u.dot(v))
}

/// Returns true iff `point` lies on the minor arc from `a` to `b`.
///
/// The two partial angles `a→point` and `point→b` must add up to the full
/// angle `a→b` within `eps` radians. Points on the great circle outside the
/// arc overshoot the sum and are rejected.
pub fn on_arc(point: &SpherePoint, a: &SpherePoint, b: &SpherePoint, eps: f64) -> bool {
    let via = angle_between(a.xyz(), point.xyz()) + angle_between(point.xyz(), b.xyz());
    let direct = angle_between(a.xyz(), b.xyz());
    (via - direct).abs() < eps
}

/// Unit normal of the great circle through `a` and `b`.
fn great_circle_normal(a: &SpherePoint, b: &SpherePoint) -> Result<Vec3, ArcError> {
    let n = a.xyz().cross(b.xyz());
    let norm = n.norm();
    if norm < PARALLEL_EPS {
        return Err(ArcError::UndefinedGreatCircle);
    }
    Ok(n / norm)
}

/// Intersect arc `a1→a2` with arc `b1→b2`.
///
/// The great-circle planes meet along `N1 × N2`; its two unit directions are
/// the candidate points, and each is kept only if it lies on both arcs
/// (with `tol.arc` slack).
///
/// Fails when the arcs share a great circle or when an arc's endpoints do
/// not determine one.
pub fn intersect(
    a1: &SpherePoint,
    a2: &SpherePoint,
    b1: &SpherePoint,
    b2: &SpherePoint,
    tol: &Tolerance,
) -> Result<ArcIntersection, ArcError> {
    let n1 = great_circle_normal(a1, a2)?;
    let n2 = great_circle_normal(b1, b2)?;

    let line = n1.cross(&n2);
    let norm = line.norm();
    if norm < PARALLEL_EPS {
        return Err(ArcError::CoincidentGreatCircles);
    }

    let i1 = SpherePoint { xyz: line / norm };
    let i2 = i1.antipode();

    let on_both = |p: &SpherePoint| on_arc(p, a1, a2, tol.arc) && on_arc(p, b1, b2, tol.arc);

    Ok(match (on_both(&i1), on_both(&i2)) {
        (true, false) => ArcIntersection::Crossing(i1),
        (false, true) => ArcIntersection::Crossing(i2),
        (true, true) => ArcIntersection::Ambiguous(i1),
        (false, false) => ArcIntersection::Disjoint,
    })
}

/// Angular distance from `p` to the great circle through `a` and `b`.
pub fn distance_to_great_circle(
    p: &SpherePoint,
    a: &SpherePoint,
    b: &SpherePoint,
) -> Result<f64, ArcError> {
    let n = great_circle_normal(a, b)?;
    Ok(p.xyz().dot(&n).abs().clamp(0.0, 1.0).asin())
}

/// Strict boundary test: `p` lies on arc `a→b` to within `tol.point`.
///
/// Unlike [`on_arc`] with the arc slack, the allowed distance does not grow
/// with the arc's length.
pub fn touches_arc(p: &SpherePoint, a: &SpherePoint, b: &SpherePoint, tol: &Tolerance) -> bool {
    match distance_to_great_circle(p, a, b) {
        // An off-circle distance d inflates the angle sum by at most 2d.
        Ok(d) => d < tol.point && on_arc(p, a, b, 2.0 * tol.point),
        Err(_) => tol.points_equal(p, a),
    }
}

/// Midpoint of the minor arc `a→b`, or `None` when `a` and `b` are antipodal.
pub fn midpoint(a: &SpherePoint, b: &SpherePoint) -> Option<SpherePoint> {
    SpherePoint::from_vector(a.xyz() + b.xyz())
}

/// Signed angle subtended by arc `a→b` as seen from `apex`.
///
/// Positive when the arc runs counter-clockwise around `apex` viewed from
/// outside the sphere. Summed over a ring this gives 2π times its winding
/// number around `apex`.
pub fn subtended_angle(apex: &SpherePoint, a: &SpherePoint, b: &SpherePoint) -> f64 {
    let q = apex.xyz();
    let (a, b) = (a.xyz(), b.xyz());
    let sin = q.dot(&a.cross(b));
    let cos = a.dot(b) - a.dot(q) * b.dot(q);
    sin.atan2(cos)
}

/// Signed geodesic turning angle at `v` when travelling `prev → v → next`.
///
/// Left turns (viewed from outside the sphere) are positive.
pub fn turning_angle(prev: &SpherePoint, v: &SpherePoint, next: &SpherePoint) -> f64 {
    let c = v.xyz();
    let heading_in = prev.xyz().cross(c).cross(c);
    let heading_out = c.cross(next.xyz()).cross(c);
    c.dot(&heading_in.cross(&heading_out))
        .atan2(heading_in.dot(&heading_out))
}
