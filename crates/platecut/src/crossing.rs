//! Crossing detection and cut chords.
//!
//! The line is refined into *stations*: its own vertices interleaved with
//! every point where a segment crosses a ring edge, in line order. Each
//! span between consecutive stations is then either inside or outside the
//! ring, and maximal runs of inside spans become the cut chords. Chord
//! extremities are the crossings that get inserted into the ring.

use std::collections::HashSet;

use platecut_arc::{
    intersect, midpoint, touches_arc, ArcError, ArcIntersection, SpherePoint, Tolerance,
};
use tracing::trace;

use crate::classify::{BoundaryHit, Location, RingLocator, VertexClass};
use crate::error::{Result, SplitError};

/// Where a crossing lands on the ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RingPosition {
    /// Coincides with ring vertex `i`.
    Vertex(usize),
    /// On edge `edge`, `offset` radians from the edge's start vertex.
    Edge { edge: usize, offset: f64 },
}

impl RingPosition {
    /// Does this position lie on edge `edge` of an `n`-vertex ring?
    fn is_on_edge(&self, edge: usize, n: usize) -> bool {
        match *self {
            RingPosition::Vertex(k) => k == edge || k == (edge + 1) % n,
            RingPosition::Edge { edge: e, .. } => e == edge,
        }
    }
}

/// A boundary point that bounds a cut chord.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Crossing {
    pub point: SpherePoint,
    pub position: RingPosition,
}

/// A run of line points inside the ring between two boundary points.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CutChord {
    pub points: Vec<SpherePoint>,
}

/// Crossings and chords of one line against one ring.
#[derive(Debug, Clone, Default)]
pub(crate) struct CutPlan {
    pub crossings: Vec<Crossing>,
    pub chords: Vec<CutChord>,
}

/// Outcome of planning the cut.
#[derive(Debug, Clone)]
pub(crate) enum Planned {
    Cut(CutPlan),
    /// Segment `segment` goes from inside to outside but no edge crossing
    /// was found on it.
    MissedCrossing { segment: usize },
}

/// A point along the line: a line vertex or a computed crossing.
#[derive(Debug, Clone, Copy)]
struct Station {
    point: SpherePoint,
    location: Location,
    /// Set for every boundary station.
    on_ring: Option<RingPosition>,
    /// Index of the line segment this station starts a span on.
    segment: usize,
}

impl Station {
    fn touches_edge(&self, edge: usize, n: usize) -> bool {
        self.on_ring.is_some_and(|pos| pos.is_on_edge(edge, n))
    }
}

/// Find the crossings and chords of `classes` (the classified line) against
/// the ring behind `locator`, intersecting arcs with `tol`.
pub(crate) fn plan_cuts(
    locator: &RingLocator<'_>,
    classes: &[VertexClass],
    tol: &Tolerance,
) -> Result<Planned> {
    let stations = build_stations(locator, classes, tol)?;

    let mut chords: Vec<Vec<Station>> = Vec::new();
    let mut current: Vec<Station> = Vec::new();
    for pair in stations.windows(2) {
        let (s, t) = (&pair[0], &pair[1]);
        let inside = match (s.location, t.location) {
            (Location::Inside, Location::Outside) | (Location::Outside, Location::Inside) => {
                return Ok(Planned::MissedCrossing { segment: s.segment });
            }
            (Location::Outside, _) | (_, Location::Outside) => false,
            (Location::Inside, _) | (_, Location::Inside) => true,
            (Location::Boundary, Location::Boundary) => midpoint(&s.point, &t.point)
                .is_some_and(|m| locator.locate(&m) == Location::Inside),
        };
        if inside {
            if current.is_empty() {
                current.push(*s);
            }
            current.push(*t);
        } else if !current.is_empty() {
            chords.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chords.push(current);
    }

    let mut plan = CutPlan::default();
    let mut seen = HashSet::new();
    for chord in chords {
        for end in [&chord[0], &chord[chord.len() - 1]] {
            let Some(position) = end.on_ring else {
                return Err(SplitError::DegenerateGeometry(format!(
                    "cut chord ends inside the ring on line segment {}",
                    end.segment
                )));
            };
            if !seen.insert(end.point.key()) {
                return Err(SplitError::DegenerateGeometry(format!(
                    "boundary point on line segment {} bounds more than one cut chord",
                    end.segment
                )));
            }
            plan.crossings.push(Crossing {
                point: end.point,
                position,
            });
        }
        plan.chords.push(CutChord {
            points: chord.iter().map(|s| s.point).collect(),
        });
    }

    Ok(Planned::Cut(plan))
}

/// Turn a classified line vertex into a station, snapping boundary
/// vertices onto the ring vertex they coincide with.
fn vertex_station(locator: &RingLocator<'_>, class: &VertexClass, segment: usize) -> Station {
    let mut station = Station {
        point: class.point,
        location: class.location,
        on_ring: None,
        segment,
    };
    if class.location == Location::Boundary {
        let verts = locator.vertices();
        station.on_ring = match locator.boundary_hit(&class.point) {
            Some(BoundaryHit::Vertex(k)) => {
                station.point = verts[k];
                Some(RingPosition::Vertex(k))
            }
            Some(BoundaryHit::Edge(j)) => Some(RingPosition::Edge {
                edge: j,
                offset: verts[j].angle_to(&class.point),
            }),
            None => None,
        };
    }
    station
}

fn build_stations(
    locator: &RingLocator<'_>,
    classes: &[VertexClass],
    tol: &Tolerance,
) -> Result<Vec<Station>> {
    let mut stations = Vec::with_capacity(classes.len());
    let mut next = classes.first().map(|c| vertex_station(locator, c, 0));

    for i in 0..classes.len() {
        let Some(start) = next.take() else { break };
        stations.push(start);
        if let Some(class) = classes.get(i + 1) {
            let end = vertex_station(locator, class, i + 1);
            stations.extend(segment_crossings(locator, &start, &end, i, tol)?);
            next = Some(end);
        }
    }
    Ok(stations)
}

/// Crossings of segment `a→b` with the ring, ordered from `a`.
///
/// Edges through a boundary endpoint of the segment are skipped: the
/// segment can only meet their great circle at that endpoint.
fn segment_crossings(
    locator: &RingLocator<'_>,
    a: &Station,
    b: &Station,
    segment: usize,
    tol: &Tolerance,
) -> Result<Vec<Station>> {
    let verts = locator.vertices();
    let n = verts.len();

    let mut hits: Vec<(f64, Station)> = Vec::new();
    for j in 0..n {
        if a.touches_edge(j, n) || b.touches_edge(j, n) {
            continue;
        }
        let (v0, v1) = (&verts[j], &verts[(j + 1) % n]);
        let hit = match intersect(&a.point, &b.point, v0, v1, tol) {
            Err(ArcError::CoincidentGreatCircles) if !arcs_overlap(a, b, v0, v1, tol) => continue,
            other => other?,
        };
        let point = match hit {
            ArcIntersection::Disjoint => continue,
            ArcIntersection::Crossing(p) => p,
            ArcIntersection::Ambiguous(_) => {
                return Err(SplitError::DegenerateGeometry(format!(
                    "line segment {} meets ring edge {} at two antipodal points",
                    segment, j
                )));
            }
        };

        let (point, position) = if tol.points_equal(&point, v0) {
            (*v0, RingPosition::Vertex(j))
        } else if tol.points_equal(&point, v1) {
            (*v1, RingPosition::Vertex((j + 1) % n))
        } else {
            (
                point,
                RingPosition::Edge {
                    edge: j,
                    offset: v0.angle_to(&point),
                },
            )
        };
        trace!(segment, edge = j, ?position, "line crosses ring edge");

        hits.push((
            a.point.angle_to(&point),
            Station {
                point,
                location: Location::Boundary,
                on_ring: Some(position),
                segment,
            },
        ));
    }

    hits.sort_by(|x, y| x.0.total_cmp(&y.0));
    // A segment through a ring vertex reports it once per adjacent edge.
    hits.dedup_by(|later, earlier| tol.points_equal(&later.1.point, &earlier.1.point));

    Ok(hits.into_iter().map(|(_, s)| s).collect())
}

/// Do two arcs on the same great circle share any stretch?
fn arcs_overlap(
    a: &Station,
    b: &Station,
    v0: &SpherePoint,
    v1: &SpherePoint,
    tol: &Tolerance,
) -> bool {
    touches_arc(&a.point, v0, v1, tol)
        || touches_arc(&b.point, v0, v1, tol)
        || touches_arc(v0, &a.point, &b.point, tol)
        || touches_arc(v1, &a.point, &b.point, tol)
}

/// One ring point in the augmented traversal order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RingNode {
    pub point: SpherePoint,
    /// True when the point bounds a cut chord.
    pub crossing: bool,
}

/// Insert `crossings` into the ring `vertices`.
///
/// Crossings on the same edge are ordered by their distance from the edge's
/// start vertex; crossings at a vertex mark that vertex.
pub(crate) fn augment(vertices: &[SpherePoint], crossings: &[Crossing]) -> Vec<RingNode> {
    let n = vertices.len();
    let mut on_edge: Vec<Vec<(f64, SpherePoint)>> = vec![Vec::new(); n];
    let mut at_vertex = vec![false; n];

    for c in crossings {
        match c.position {
            RingPosition::Vertex(k) => at_vertex[k] = true,
            RingPosition::Edge { edge, offset } => on_edge[edge].push((offset, c.point)),
        }
    }

    let mut nodes = Vec::with_capacity(n + crossings.len());
    for (i, v) in vertices.iter().enumerate() {
        nodes.push(RingNode {
            point: *v,
            crossing: at_vertex[i],
        });
        on_edge[i].sort_by(|x, y| x.0.total_cmp(&y.0));
        nodes.extend(on_edge[i].iter().map(|&(_, point)| RingNode {
            point,
            crossing: true,
        }));
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::{Polyline, Ring};

    fn square() -> Ring {
        Ring::from_lat_lon(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)])
    }

    fn plan(ring: &Ring, line: &Polyline) -> Planned {
        let locator = RingLocator::new(ring, Tolerance::DEFAULT);
        let classes = locator.classify(line);
        plan_cuts(&locator, &classes, &Tolerance::DEFAULT).unwrap()
    }

    fn expect_cut(planned: Planned) -> CutPlan {
        match planned {
            Planned::Cut(plan) => plan,
            other => panic!("expected a cut, got {:?}", other),
        }
    }

    #[test]
    fn test_outside_segment_through_ring() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (15.0, 5.0)]);
        let plan = expect_cut(plan(&ring, &line));

        assert_eq!(plan.chords.len(), 1);
        assert_eq!(plan.chords[0].points.len(), 2);
        assert_eq!(plan.crossings.len(), 2);
        assert!(matches!(plan.crossings[0].position, RingPosition::Edge { edge: 0, .. }));
        assert!(matches!(plan.crossings[1].position, RingPosition::Edge { edge: 2, .. }));
        assert_eq!(plan.chords[0].points[0], plan.crossings[0].point);
    }

    #[test]
    fn test_chord_keeps_interior_vertices() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (3.0, 4.0), (6.0, 6.0), (15.0, 5.0)]);
        let plan = expect_cut(plan(&ring, &line));

        assert_eq!(plan.chords.len(), 1);
        let chord = &plan.chords[0].points;
        assert_eq!(chord.len(), 4);
        assert_eq!(chord[1], line.points[1]);
        assert_eq!(chord[2], line.points[2]);
    }

    #[test]
    fn test_outside_line_has_no_chords() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(20.0, 20.0), (30.0, 30.0)]);
        let plan = expect_cut(plan(&ring, &line));
        assert!(plan.chords.is_empty());
        assert!(plan.crossings.is_empty());
    }

    #[test]
    fn test_boundary_vertex_snaps_to_ring_vertex() {
        let ring = square();
        // Starts exactly on the (0, 0) corner and leaves through the top edge
        let line = Polyline::from_lat_lon(&[(0.0, 0.0), (15.0, 8.0)]);
        let plan = expect_cut(plan(&ring, &line));

        assert_eq!(plan.chords.len(), 1);
        assert_eq!(plan.crossings[0].position, RingPosition::Vertex(0));
        assert_eq!(plan.crossings[0].point, ring.points[0]);
    }

    #[test]
    fn test_segment_through_ring_vertex_deduplicated() {
        let ring = square();
        // Great circle through the (0, 0) and (10, 10) corners, extended past both
        let (a, b) = (ring.points[0].xyz(), ring.points[2].xyz());
        let line = Polyline::new(vec![
            SpherePoint::from_vector(a * 1.5 - b * 0.5).unwrap(),
            SpherePoint::from_vector(b * 1.5 - a * 0.5).unwrap(),
        ]);
        let plan = expect_cut(plan(&ring, &line));

        assert_eq!(plan.chords.len(), 1);
        assert_eq!(plan.chords[0].points.len(), 2);
        let positions: Vec<_> = plan.crossings.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![RingPosition::Vertex(0), RingPosition::Vertex(2)]);
    }

    #[test]
    fn test_touch_from_outside_is_not_a_chord() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (0.0, 5.0), (-5.0, 8.0)]);
        let plan = expect_cut(plan(&ring, &line));
        assert!(plan.chords.is_empty());
    }

    #[test]
    fn test_inside_to_outside_without_crossing_is_reported() {
        let ring = square();
        let line = Polyline::from_lat_lon(&[(-5.0, 5.0), (5.0, 5.0), (15.0, 5.0)]);
        // Zero arc slack rejects every crossing candidate
        let tol = Tolerance::DEFAULT.with_arc(0.0);
        let locator = RingLocator::new(&ring, tol);
        let classes = locator.classify(&line);

        let planned = plan_cuts(&locator, &classes, &tol).unwrap();
        assert!(matches!(planned, Planned::MissedCrossing { segment: 0 }));
    }

    #[test]
    fn test_augment_orders_crossings_on_edge() {
        let ring = square();
        let verts = ring.vertices();
        let far = SpherePoint::from_lat_lon(0.0, 7.0);
        let near = SpherePoint::from_lat_lon(0.0, 2.0);
        let crossings = [
            Crossing {
                point: far,
                position: RingPosition::Edge {
                    edge: 0,
                    offset: verts[0].angle_to(&far),
                },
            },
            Crossing {
                point: near,
                position: RingPosition::Edge {
                    edge: 0,
                    offset: verts[0].angle_to(&near),
                },
            },
            Crossing {
                point: verts[3],
                position: RingPosition::Vertex(3),
            },
        ];

        let nodes = augment(verts, &crossings);
        let points: Vec<_> = nodes.iter().map(|n| n.point).collect();
        assert_eq!(points, vec![verts[0], near, far, verts[1], verts[2], verts[3]]);
        let flags: Vec<_> = nodes.iter().map(|n| n.crossing).collect();
        assert_eq!(flags, vec![false, true, true, false, false, true]);
    }
}
