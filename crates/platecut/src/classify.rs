//! Point classification against a ring.
//!
//! Each point is Inside, on the Boundary, or Outside of the ring. Boundary
//! is tested first and strictly (coincident with a vertex, or on an edge
//! within the point tolerance); the rest is decided by the ring's winding
//! number around the point.

use std::f64::consts::PI;

use platecut_arc::{subtended_angle, touches_arc, SpherePoint, Tolerance};

use crate::ring::{Polyline, Ring};

/// Where a point sits relative to a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Strictly inside the ring.
    Inside,
    /// On a vertex or edge of the ring.
    Boundary,
    /// Strictly outside the ring.
    Outside,
}

/// Where on the ring a boundary point sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryHit {
    /// Coincides with vertex `i`.
    Vertex(usize),
    /// Lies on edge `i`, between vertex `i` and vertex `i + 1`.
    Edge(usize),
}

/// A line vertex together with its location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexClass {
    /// The line vertex.
    pub point: SpherePoint,
    /// Its location against the ring.
    pub location: Location,
}

/// Classifies points against one ring.
///
/// The interior is the smaller of the two regions the ring bounds, so rings
/// of either orientation are accepted.
#[derive(Debug, Clone)]
pub struct RingLocator<'a> {
    vertices: &'a [SpherePoint],
    /// +1 when the interior is left of the ring's direction, -1 otherwise.
    interior_sign: f64,
    tol: Tolerance,
}

impl<'a> RingLocator<'a> {
    /// Prepare a locator for `ring`.
    pub fn new(ring: &'a Ring, tol: Tolerance) -> Self {
        let interior_sign = if ring.is_ccw() { 1.0 } else { -1.0 };
        Self {
            vertices: ring.vertices(),
            interior_sign,
            tol,
        }
    }

    /// The ring's distinct vertices.
    pub fn vertices(&self) -> &'a [SpherePoint] {
        self.vertices
    }

    /// Tolerances in use.
    pub fn tolerance(&self) -> &Tolerance {
        &self.tol
    }

    /// Find where `p` touches the ring, if it does.
    ///
    /// Vertices take precedence over edges, and the lowest index wins.
    pub fn boundary_hit(&self, p: &SpherePoint) -> Option<BoundaryHit> {
        if let Some(i) = self
            .vertices
            .iter()
            .position(|v| self.tol.points_equal(v, p))
        {
            return Some(BoundaryHit::Vertex(i));
        }
        let n = self.vertices.len();
        (0..n)
            .find(|&i| touches_arc(p, &self.vertices[i], &self.vertices[(i + 1) % n], &self.tol))
            .map(BoundaryHit::Edge)
    }

    /// Winding number of the ring around `p`, on the interior side.
    fn winding(&self, p: &SpherePoint) -> f64 {
        let n = self.vertices.len();
        let total: f64 = (0..n)
            .map(|i| subtended_angle(p, &self.vertices[i], &self.vertices[(i + 1) % n]))
            .sum();
        self.interior_sign * total / (2.0 * PI)
    }

    /// Classify a single point.
    pub fn locate(&self, p: &SpherePoint) -> Location {
        if self.boundary_hit(p).is_some() {
            Location::Boundary
        } else if self.winding(p) > 0.5 {
            Location::Inside
        } else {
            Location::Outside
        }
    }

    /// Classify every vertex of `line`.
    pub fn classify(&self, line: &Polyline) -> Vec<VertexClass> {
        line.points
            .iter()
            .map(|&point| VertexClass {
                point,
                location: self.locate(&point),
            })
            .collect()
    }
}

/// Classify `point` against `ring` with default tolerances.
pub fn locate(point: &SpherePoint, ring: &Ring) -> Location {
    RingLocator::new(ring, Tolerance::DEFAULT).locate(point)
}
