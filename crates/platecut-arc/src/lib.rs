#![warn(missing_docs)]

//! Spherical arc primitives for platecut.
//!
//! Thin wrappers around nalgebra providing the geometry every cut is built
//! from: points on the unit sphere, latitude/longitude conversion, the
//! on-arc test, great-circle arc intersection, and tolerance constants.
//!
//! # Example
//!
//! ```
//! use platecut_arc::{intersect, ArcIntersection, SpherePoint, Tolerance};
//!
//! // The equator from 0°E to 20°E and the 10°E meridian from 10°S to 10°N.
//! let equator = (SpherePoint::from_lat_lon(0.0, 0.0), SpherePoint::from_lat_lon(0.0, 20.0));
//! let meridian = (SpherePoint::from_lat_lon(-10.0, 10.0), SpherePoint::from_lat_lon(10.0, 10.0));
//!
//! let hit = intersect(&equator.0, &equator.1, &meridian.0, &meridian.1, &Tolerance::DEFAULT).unwrap();
//! let ArcIntersection::Crossing(p) = hit else { panic!("expected a crossing") };
//! assert!((p.to_lat_lon().lon - 10.0).abs() < 1e-9);
//! ```

mod arc;

pub use arc::{
    angle_between, distance_to_great_circle, intersect, midpoint, on_arc, subtended_angle,
    touches_arc, turning_angle, ArcIntersection,
};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// Errors from arc primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArcError {
    /// Both arcs lie on the same great circle, so their intersection is undefined.
    #[error("arcs lie on the same great circle")]
    CoincidentGreatCircles,

    /// An arc's endpoints coincide or are antipodal.
    #[error("arc endpoints do not define a unique great circle")]
    UndefinedGreatCircle,

    /// A zero-length or non-finite vector cannot be placed on the sphere.
    #[error("vector cannot be projected onto the unit sphere")]
    InvalidVector,
}

/// Geographic coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

impl LatLon {
    /// Create a coordinate pair.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A location on the unit sphere, stored as a unit vector.
///
/// Equality is exact. Use [`Tolerance::points_equal`] or [`SpherePoint::key`]
/// for points produced by intersection math. Deserialized vectors are
/// normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpherePoint")]
pub struct SpherePoint {
    xyz: Vec3,
}

/// Serialized form of a [`SpherePoint`], before normalization.
#[derive(Deserialize)]
struct RawSpherePoint {
    xyz: Vec3,
}

impl TryFrom<RawSpherePoint> for SpherePoint {
    type Error = ArcError;

    fn try_from(raw: RawSpherePoint) -> Result<Self, Self::Error> {
        SpherePoint::from_vector(raw.xyz).ok_or(ArcError::InvalidVector)
    }
}

impl SpherePoint {
    /// Point at latitude `lat` and longitude `lon`, both in degrees.
    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
        Self {
            xyz: Vec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat),
        }
    }

    /// Project a vector onto the sphere.
    ///
    /// Returns `None` for zero-length or non-finite vectors.
    pub fn from_vector(v: Vec3) -> Option<Self> {
        let norm = v.norm();
        if !norm.is_finite() || norm < 1e-15 {
            return None;
        }
        Some(Self { xyz: v / norm })
    }

    /// The unit vector.
    pub fn xyz(&self) -> &Vec3 {
        &self.xyz
    }

    /// Convert back to latitude/longitude degrees.
    pub fn to_lat_lon(&self) -> LatLon {
        let lat = self.xyz.z.clamp(-1.0, 1.0).asin();
        let lon = self.xyz.y.atan2(self.xyz.x);
        LatLon::new(lat.to_degrees(), lon.to_degrees())
    }

    /// The diametrically opposite point.
    pub fn antipode(&self) -> Self {
        Self { xyz: -self.xyz }
    }

    /// Great-circle distance to `other` in radians.
    pub fn angle_to(&self, other: &SpherePoint) -> f64 {
        angle_between(&self.xyz, &other.xyz)
    }

    /// True if every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.xyz.iter().all(|c| c.is_finite())
    }

    /// Quantized lookup key for this point.
    pub fn key(&self) -> PointKey {
        PointKey([
            (self.xyz.x * PointKey::SCALE).round() as i64,
            (self.xyz.y * PointKey::SCALE).round() as i64,
            (self.xyz.z * PointKey::SCALE).round() as i64,
        ])
    }
}

impl From<LatLon> for SpherePoint {
    fn from(ll: LatLon) -> Self {
        Self::from_lat_lon(ll.lat, ll.lon)
    }
}

/// Hashable identity of a point, quantized to 1e-9 of the unit radius.
///
/// Bit-identical points always share a key, which is what lookups of
/// crossings and chord ends rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey(pub [i64; 3]);

impl PointKey {
    const SCALE: f64 = 1e9;
}

/// Tolerance constants for spherical comparisons, all in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Allowed slack in the on-arc angle sum.
    pub arc: f64,
    /// Angular distance below which two points coincide, or a point sits on a
    /// great circle.
    pub point: f64,
}

impl Tolerance {
    /// Default tolerances (1e-3 rad arc slack, 1e-9 rad coincidence).
    pub const DEFAULT: Self = Self {
        arc: 1e-3,
        point: 1e-9,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &SpherePoint, b: &SpherePoint) -> bool {
        a.angle_to(b) < self.point
    }

    /// Copy with a different arc slack.
    pub fn with_arc(&self, arc: f64) -> Self {
        Self { arc, ..*self }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
