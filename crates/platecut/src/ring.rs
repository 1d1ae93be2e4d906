//! Ring and polyline types on the unit sphere.

use std::f64::consts::PI;

use platecut_arc::{turning_angle, LatLon, SpherePoint, Tolerance};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitError};

/// A closed spherical polygon (plate boundary).
///
/// Consecutive points are joined by minor great-circle arcs and the last
/// point joins back to the first. The first point may be repeated at the
/// end; [`Ring::vertices`] always yields the distinct cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    /// Vertices of the ring in order.
    pub points: Vec<SpherePoint>,
}

impl Ring {
    /// Create a new ring from points.
    pub fn new(points: Vec<SpherePoint>) -> Self {
        Self { points }
    }

    /// Create a ring from `(lat, lon)` pairs in degrees.
    pub fn from_lat_lon(coords: &[(f64, f64)]) -> Self {
        Self::new(
            coords
                .iter()
                .map(|&(lat, lon)| SpherePoint::from_lat_lon(lat, lon))
                .collect(),
        )
    }

    /// Points as latitude/longitude degrees.
    pub fn to_lat_lon(&self) -> Vec<LatLon> {
        self.points.iter().map(SpherePoint::to_lat_lon).collect()
    }

    /// Check if the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of stored points, including a repeated closing point.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the last point repeats the first.
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 2 && self.points.first() == self.points.last()
    }

    /// The distinct cycle of vertices, without a repeated closing point.
    pub fn vertices(&self) -> &[SpherePoint] {
        if self.is_closed() {
            &self.points[..self.points.len() - 1]
        } else {
            &self.points
        }
    }

    /// Copy of this ring with the first point repeated at the end.
    pub fn closed(&self) -> Ring {
        let mut ring = self.clone();
        if !ring.is_closed() {
            if let Some(&first) = ring.points.first() {
                ring.points.push(first);
            }
        }
        ring
    }

    /// Edges as `(index, start, end)`, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (usize, &SpherePoint, &SpherePoint)> {
        let verts = self.vertices();
        let n = verts.len();
        (0..n).map(move |i| (i, &verts[i], &verts[(i + 1) % n]))
    }

    /// Perimeter length in radians.
    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(_, a, b)| a.angle_to(b)).sum()
    }

    /// Sum of signed turning angles around the ring (left turns positive).
    pub fn turning_sum(&self) -> f64 {
        let verts = self.vertices();
        let n = verts.len();
        if n < 3 {
            return 0.0;
        }
        (0..n)
            .map(|i| turning_angle(&verts[(i + n - 1) % n], &verts[i], &verts[(i + 1) % n]))
            .sum()
    }

    /// Is the smaller of the two regions on the left of the ring?
    ///
    /// That is the counter-clockwise case when viewed from outside the sphere.
    pub fn is_ccw(&self) -> bool {
        self.turning_sum() >= 0.0
    }

    /// Enclosed area in steradians (multiply by R² for surface area).
    ///
    /// Uses Gauss-Bonnet on the region left of the ring and reports the
    /// smaller of the two regions the ring bounds.
    pub fn area(&self) -> f64 {
        if self.vertices().len() < 3 {
            return 0.0;
        }
        let left = 2.0 * PI - self.turning_sum();
        left.min(4.0 * PI - left)
    }

    /// Check the ring can be split.
    pub(crate) fn validate(&self, tol: &Tolerance) -> Result<()> {
        let verts = self.vertices();
        if verts.len() < 3 {
            return Err(SplitError::InvalidInput(format!(
                "ring needs at least 3 points, got {}",
                verts.len()
            )));
        }
        check_points("ring", verts, tol)?;
        if tol.points_equal(&verts[0], &verts[verts.len() - 1]) {
            return Err(SplitError::InvalidInput(format!(
                "ring repeats point 0 at index {}",
                verts.len() - 1
            )));
        }
        Ok(())
    }
}

/// An open spherical polyline (rift or subduction line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    /// Points along the line.
    pub points: Vec<SpherePoint>,
}

impl Polyline {
    /// Create a new polyline.
    pub fn new(points: Vec<SpherePoint>) -> Self {
        Self { points }
    }

    /// Create a polyline from `(lat, lon)` pairs in degrees.
    pub fn from_lat_lon(coords: &[(f64, f64)]) -> Self {
        Self::new(
            coords
                .iter()
                .map(|&(lat, lon)| SpherePoint::from_lat_lon(lat, lon))
                .collect(),
        )
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Starting point.
    pub fn start(&self) -> Option<&SpherePoint> {
        self.points.first()
    }

    /// Ending point.
    pub fn end(&self) -> Option<&SpherePoint> {
        self.points.last()
    }

    /// Consecutive point pairs.
    pub fn segments(&self) -> impl Iterator<Item = (&SpherePoint, &SpherePoint)> {
        self.points.windows(2).map(|w| (&w[0], &w[1]))
    }

    /// Total length in radians.
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.angle_to(b)).sum()
    }

    /// Check the line can be used as a cut.
    pub(crate) fn validate(&self, tol: &Tolerance) -> Result<()> {
        if self.points.len() < 2 {
            return Err(SplitError::InvalidInput(format!(
                "line needs at least 2 points, got {}",
                self.points.len()
            )));
        }
        check_points("line", &self.points, tol)
    }
}

/// Reject non-finite coordinates and zero-length steps.
fn check_points(what: &str, points: &[SpherePoint], tol: &Tolerance) -> Result<()> {
    if let Some(i) = points.iter().position(|p| !p.is_finite()) {
        return Err(SplitError::InvalidInput(format!(
            "{} point {} is not finite",
            what, i
        )));
    }
    for (i, w) in points.windows(2).enumerate() {
        if tol.points_equal(&w[0], &w[1]) {
            return Err(SplitError::InvalidInput(format!(
                "{} repeats point {} at index {}",
                what,
                i,
                i + 1
            )));
        }
    }
    Ok(())
}
