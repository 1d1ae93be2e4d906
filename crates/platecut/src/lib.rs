#![warn(missing_docs)]

//! Split spherical plate polygons along rift and subduction lines.
//!
//! A plate is a closed ring of points on the unit sphere; a rift is an open
//! polyline. Every stretch of the rift that runs through the plate becomes
//! a cut, and the plate comes back as the closed pieces between the cuts.
//!
//! # Example
//!
//! ```
//! use platecut::{split_with, Polyline, Ring, SplitSettings, SplitStatus};
//!
//! let plate = Ring::from_lat_lon(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
//! let rift = Polyline::from_lat_lon(&[(-5.0, 5.0), (15.0, 5.0)]);
//!
//! let outcome = split_with(&plate, &rift, &SplitSettings::default()).unwrap();
//! assert_eq!(outcome.status, SplitStatus::Split);
//! assert_eq!(outcome.rings.len(), 2);
//! ```

pub mod classify;
pub mod error;
pub mod ring;

mod crossing;
mod reassemble;

pub use classify::{locate, BoundaryHit, Location, RingLocator, VertexClass};
pub use error::{Result, SplitError};
pub use platecut_arc::{LatLon, SpherePoint, Tolerance};
pub use ring::{Polyline, Ring};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::crossing::{augment, plan_cuts, CutPlan, Planned};
use crate::reassemble::reassemble;

/// Splitting parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitSettings {
    /// Slack in the on-arc angle sum when intersecting arcs (radians).
    pub arc_tolerance: f64,
    /// Distance under which points coincide or sit on the boundary (radians).
    pub point_tolerance: f64,
    /// Factor applied to `arc_tolerance` when a crossing is missed and
    /// detection is retried. Values of 1 or less disable the retry.
    pub crossing_retry_factor: f64,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            arc_tolerance: Tolerance::DEFAULT.arc,
            point_tolerance: Tolerance::DEFAULT.point,
            crossing_retry_factor: 10.0,
        }
    }
}

impl SplitSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.arc_tolerance.is_finite() && self.arc_tolerance > 0.0) {
            return Err(SplitError::InvalidSettings(
                "arc_tolerance must be positive and finite".into(),
            ));
        }
        if !(self.point_tolerance.is_finite() && self.point_tolerance > 0.0) {
            return Err(SplitError::InvalidSettings(
                "point_tolerance must be positive and finite".into(),
            ));
        }
        if !self.crossing_retry_factor.is_finite() || self.crossing_retry_factor < 0.0 {
            return Err(SplitError::InvalidSettings(
                "crossing_retry_factor must be finite and non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Tolerances for the arc primitives.
    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            arc: self.arc_tolerance,
            point: self.point_tolerance,
        }
    }
}

/// What happened to the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitStatus {
    /// The line cut the ring into fragments.
    Split,
    /// No part of the line runs through the ring; returned unchanged.
    NoCrossing,
    /// A line endpoint lies strictly inside the ring; returned unchanged.
    AmbiguousEndpoint,
}

/// Result of splitting one ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitOutcome {
    /// Output rings. A split yields explicitly closed rings; otherwise this
    /// holds the input ring as given.
    pub rings: Vec<Ring>,
    /// Why the rings look the way they do.
    pub status: SplitStatus,
}

impl SplitOutcome {
    fn unchanged(ring: &Ring, status: SplitStatus) -> Self {
        Self {
            rings: vec![ring.clone()],
            status,
        }
    }

    /// True if the ring was actually cut.
    pub fn is_split(&self) -> bool {
        self.status == SplitStatus::Split
    }
}

/// Split `ring` along `line` with default settings.
///
/// Returns the fragments, or the ring itself when the line does not cut it.
pub fn split(ring: &[SpherePoint], line: &[SpherePoint]) -> Result<Vec<Ring>> {
    let ring = Ring::new(ring.to_vec());
    let line = Polyline::new(line.to_vec());
    split_with(&ring, &line, &SplitSettings::default()).map(|outcome| outcome.rings)
}

/// Split `ring` along `line`.
///
/// This is the main entry point. It:
/// 1. Validates settings, ring and line
/// 2. Classifies every line vertex against the ring
/// 3. Returns the ring unchanged if a line endpoint is strictly inside
/// 4. Finds the crossings and the cut chords between them
/// 5. Walks the ring with the crossings inserted and reassembles fragments
pub fn split_with(ring: &Ring, line: &Polyline, settings: &SplitSettings) -> Result<SplitOutcome> {
    settings.validate()?;
    let tol = settings.tolerance();
    ring.validate(&tol)?;
    line.validate(&tol)?;

    let locator = RingLocator::new(ring, tol);
    let classes = locator.classify(line);
    let inside = classes
        .iter()
        .filter(|c| c.location == Location::Inside)
        .count();
    debug!(
        ring_vertices = locator.vertices().len(),
        line_points = classes.len(),
        inside,
        "classified line"
    );

    let interior_end = [classes.first(), classes.last()]
        .into_iter()
        .flatten()
        .any(|c| c.location == Location::Inside);
    if interior_end {
        debug!("line ends inside the ring, leaving it unchanged");
        return Ok(SplitOutcome::unchanged(ring, SplitStatus::AmbiguousEndpoint));
    }

    let plan = plan_with_retry(
        &locator,
        &classes,
        *locator.tolerance(),
        settings.crossing_retry_factor,
    )?;
    if plan.chords.is_empty() {
        debug!("line does not cut the ring");
        return Ok(SplitOutcome::unchanged(ring, SplitStatus::NoCrossing));
    }

    let nodes = augment(locator.vertices(), &plan.crossings);
    let rings = reassemble(&nodes, &plan.chords)?;
    if rings.is_empty() {
        return Err(SplitError::DegenerateGeometry(
            "cut left no fragment with three distinct points".into(),
        ));
    }
    debug!(
        crossings = plan.crossings.len(),
        chords = plan.chords.len(),
        fragments = rings.len(),
        "split ring"
    );

    Ok(SplitOutcome {
        rings,
        status: SplitStatus::Split,
    })
}

/// Plan the cut, retrying once with a relaxed arc tolerance when an
/// inside-to-outside step shows no crossing.
fn plan_with_retry(
    locator: &RingLocator<'_>,
    classes: &[VertexClass],
    tol: Tolerance,
    retry_factor: f64,
) -> Result<CutPlan> {
    let segment = match plan_cuts(locator, classes, &tol)? {
        Planned::Cut(plan) => return Ok(plan),
        Planned::MissedCrossing { segment } => segment,
    };

    if retry_factor > 1.0 {
        let relaxed = tol.with_arc(tol.arc * retry_factor);
        warn!(
            segment,
            arc_tolerance = relaxed.arc,
            "no crossing on a segment leaving the ring, retrying with relaxed tolerance"
        );
        if let Planned::Cut(plan) = plan_cuts(locator, classes, &relaxed)? {
            return Ok(plan);
        }
    }

    Err(SplitError::DegenerateGeometry(format!(
        "line segment {} leaves the ring without crossing its boundary",
        segment
    )))
}

/// Split many independent ring/line pairs in parallel.
///
/// Results come back in input order, one per pair.
pub fn split_all(pairs: &[(Ring, Polyline)], settings: &SplitSettings) -> Vec<Result<SplitOutcome>> {
    pairs
        .par_iter()
        .map(|(ring, line)| split_with(ring, line, settings))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Ring {
        Ring::from_lat_lon(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)])
    }

    fn split_default(ring: &Ring, line: &Polyline) -> SplitOutcome {
        split_with(ring, line, &SplitSettings::default()).unwrap()
    }

    fn total_area(rings: &[Ring]) -> f64 {
        rings.iter().map(Ring::area).sum()
    }

    #[test]
    fn test_default_settings() {
        let settings = SplitSettings::default();
        assert_eq!(settings.arc_tolerance, 1e-3);
        assert_eq!(settings.point_tolerance, 1e-9);
        assert_eq!(settings.crossing_retry_factor, 10.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_settings() {
        let bad = [
            SplitSettings {
                arc_tolerance: 0.0,
                ..Default::default()
            },
            SplitSettings {
                point_tolerance: f64::NAN,
                ..Default::default()
            },
            SplitSettings {
                crossing_retry_factor: -1.0,
                ..Default::default()
            },
        ];
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (15.0, 5.0)]);
        for settings in bad {
            assert!(matches!(
                settings.validate(),
                Err(SplitError::InvalidSettings(_))
            ));
            let err = split_with(&square(), &line, &settings).unwrap_err();
            assert!(matches!(err, SplitError::InvalidSettings(_)));
        }
    }

    #[test]
    fn test_bisection() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (15.0, 5.0)]);
        let outcome = split_default(&ring, &line);

        assert!(outcome.is_split());
        assert_eq!(outcome.rings.len(), 2);
        for fragment in &outcome.rings {
            assert!(fragment.is_closed());
            assert_eq!(fragment.vertices().len(), 4);
        }
        assert_relative_eq!(total_area(&outcome.rings), ring.area(), max_relative = 1e-9);
    }

    #[test]
    fn test_no_crossing_is_identity() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(20.0, 20.0), (30.0, 30.0)]);
        let outcome = split_default(&ring, &line);

        assert_eq!(outcome.status, SplitStatus::NoCrossing);
        assert_eq!(outcome.rings, vec![ring]);
    }

    #[test]
    fn test_touch_from_outside_is_identity() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (0.0, 5.0), (-5.0, 8.0)]);
        let outcome = split_default(&ring, &line);
        assert_eq!(outcome.status, SplitStatus::NoCrossing);
        assert_eq!(outcome.rings, vec![ring]);
    }

    #[test]
    fn test_touching_endpoint() {
        let ring = square();
        // Starts on the southern edge and leaves through the northern one
        let line = Polyline::from_lat_lon(&[(0.0, 5.0), (15.0, 5.0)]);
        let outcome = split_default(&ring, &line);

        assert!(outcome.is_split());
        assert_eq!(outcome.rings.len(), 2);
        assert_relative_eq!(total_area(&outcome.rings), ring.area(), max_relative = 1e-9);
    }

    #[test]
    fn test_interior_endpoint_guard() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (5.0, 5.0)]);
        let outcome = split_default(&ring, &line);

        assert_eq!(outcome.status, SplitStatus::AmbiguousEndpoint);
        assert_eq!(outcome.rings, vec![ring.clone()]);

        let line = Polyline::from_lat_lon(&[(5.0, 5.0), (15.0, 5.0)]);
        let outcome = split_default(&ring, &line);
        assert_eq!(outcome.status, SplitStatus::AmbiguousEndpoint);
    }

    #[test]
    fn test_boundary_start_inside_end_is_guarded() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(0.0, 5.0), (5.0, 5.0)]);
        let outcome = split_default(&ring, &line);
        assert_eq!(outcome.status, SplitStatus::AmbiguousEndpoint);
        assert_eq!(outcome.rings.len(), 1);
    }

    #[test]
    fn test_two_crossings_on_one_edge() {
        let ring = square();
        // A notch entering and leaving through the southern edge
        let line = Polyline::from_lat_lon(&[(-5.0, 3.0), (5.0, 3.0), (5.0, 7.0), (-5.0, 7.0)]);
        let outcome = split_default(&ring, &line);

        assert!(outcome.is_split());
        let sizes: Vec<_> = outcome.rings.iter().map(|r| r.vertices().len()).collect();
        assert_eq!(sizes, vec![4, 8]);
        assert_relative_eq!(total_area(&outcome.rings), ring.area(), max_relative = 1e-9);
    }

    #[test]
    fn test_two_chords_make_three_fragments() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(-5.0, 3.0), (15.0, 3.0), (15.0, 6.0), (-5.0, 6.0)]);
        let outcome = split_default(&ring, &line);

        assert_eq!(outcome.rings.len(), 3);
        assert!(outcome.rings.iter().all(Ring::is_closed));
        assert_relative_eq!(total_area(&outcome.rings), ring.area(), max_relative = 1e-9);
    }

    #[test]
    fn test_fragments_use_only_known_points() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (3.0, 4.0), (6.0, 6.0), (15.0, 5.0)]);
        let outcome = split_default(&ring, &line);
        assert!(outcome.is_split());

        let locator = RingLocator::new(&ring, Tolerance::DEFAULT);
        for fragment in &outcome.rings {
            for p in fragment.vertices() {
                let known = ring.points.contains(p)
                    || line.points.contains(p)
                    || locator.locate(p) == Location::Boundary;
                assert!(known, "unexpected point {:?}", p.to_lat_lon());
            }
        }
    }

    #[test]
    fn test_ring_vertices_kept_in_order() {
        let ring = square();
        let lines = [
            // Notch through the southern edge
            Polyline::from_lat_lon(&[(-5.0, 3.0), (5.0, 3.0), (5.0, 7.0), (-5.0, 7.0)]),
            // Two parallel cuts
            Polyline::from_lat_lon(&[(-5.0, 3.0), (15.0, 3.0), (15.0, 6.0), (-5.0, 6.0)]),
        ];

        for line in &lines {
            let outcome = split_default(&ring, line);
            assert!(outcome.is_split());

            let mut seen = vec![false; ring.vertices().len()];
            for fragment in &outcome.rings {
                let indices: Vec<usize> = fragment
                    .vertices()
                    .iter()
                    .filter_map(|p| ring.vertices().iter().position(|v| v == p))
                    .collect();
                for &i in &indices {
                    seen[i] = true;
                }
                // Walked forward around the ring: at most one wrap-around
                let descents = (0..indices.len())
                    .filter(|&k| indices[(k + 1) % indices.len()] <= indices[k])
                    .count();
                assert!(
                    descents <= 1,
                    "ring vertices out of order: {:?}",
                    indices
                );
            }
            assert!(seen.iter().all(|&s| s), "ring vertex missing: {:?}", seen);
        }
    }

    #[test]
    fn test_orientation_does_not_matter() {
        let mut reversed = square();
        reversed.points.reverse();
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (15.0, 5.0)]);
        let outcome = split_default(&reversed, &line);

        assert_eq!(outcome.rings.len(), 2);
        assert_relative_eq!(total_area(&outcome.rings), reversed.area(), max_relative = 1e-9);
    }

    #[test]
    fn test_closed_input_ring() {
        let ring = square().closed();
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (15.0, 5.0)]);
        let outcome = split_default(&ring, &line);
        assert_eq!(outcome.rings.len(), 2);
    }

    #[test]
    fn test_deterministic() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(-5.0, 3.0), (15.0, 3.0), (15.0, 6.0), (-5.0, 6.0)]);
        let first = split_default(&ring, &line);
        let second = split_default(&ring, &line);
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_input() {
        let short = [SpherePoint::from_lat_lon(0.0, 0.0), SpherePoint::from_lat_lon(0.0, 10.0)];
        let line = [SpherePoint::from_lat_lon(-5.0, 5.0), SpherePoint::from_lat_lon(15.0, 5.0)];
        assert!(matches!(split(&short, &line), Err(SplitError::InvalidInput(_))));

        let ring = square();
        assert!(matches!(
            split(&ring.points, &line[..1]),
            Err(SplitError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_line_along_edge_is_degenerate() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(0.0, -5.0), (0.0, 15.0)]);
        let err = split_with(&ring, &line, &SplitSettings::default()).unwrap_err();
        assert!(matches!(err, SplitError::DegenerateGeometry(_)));
    }

    #[test]
    fn test_missed_crossing_fails_after_retry() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (5.0, 5.0), (15.0, 5.0)]);
        let tol = Tolerance::DEFAULT.with_arc(0.0);
        let locator = RingLocator::new(&ring, tol);
        let classes = locator.classify(&line);

        let err = plan_with_retry(&locator, &classes, tol, 10.0).unwrap_err();
        assert!(matches!(err, SplitError::DegenerateGeometry(_)));
    }

    #[test]
    fn test_split_slices() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (15.0, 5.0)]);
        let rings = split(&ring.points, &line.points).unwrap();
        assert_eq!(rings.len(), 2);
    }

    #[test]
    fn test_split_all_keeps_order() {
        let pairs = vec![
            (square(), Polyline::from_lat_lon(&[(-5.0, 5.0), (15.0, 5.0)])),
            (square(), Polyline::from_lat_lon(&[(20.0, 20.0), (30.0, 30.0)])),
            (square(), Polyline::from_lat_lon(&[(0.0, 0.0)])),
        ];
        let results = split_all(&pairs, &SplitSettings::default());

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().status, SplitStatus::Split);
        assert_eq!(results[1].as_ref().unwrap().status, SplitStatus::NoCrossing);
        assert!(results[2].is_err());
    }
}
