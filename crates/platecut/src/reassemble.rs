//! Fragment reassembly.
//!
//! Walks the augmented ring once. At every crossing the walk detours along
//! the cut chord that starts there, which closes the current fragment or
//! leaves it open at the far end of the chord. Open fragments are parked by
//! their tail point and resumed when the walk comes back to that point.

use std::collections::{HashMap, HashSet};

use platecut_arc::{PointKey, SpherePoint};
use slotmap::{new_key_type, SlotMap};
use tracing::trace;

use crate::crossing::{CutChord, RingNode};
use crate::error::{Result, SplitError};
use crate::ring::Ring;

new_key_type! {
    /// Handle to a fragment under assembly.
    pub(crate) struct FragmentId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FragmentState {
    Open,
    Finished,
}

#[derive(Debug, Clone)]
struct Fragment {
    points: Vec<SpherePoint>,
    state: FragmentState,
}

impl Fragment {
    fn new() -> Self {
        Self {
            points: Vec::new(),
            state: FragmentState::Open,
        }
    }

    /// Append `p` unless it repeats the current tail.
    fn push(&mut self, p: SpherePoint) {
        if self.points.last().map(SpherePoint::key) != Some(p.key()) {
            self.points.push(p);
        }
    }

    fn tail(&self) -> Option<PointKey> {
        self.points.last().map(SpherePoint::key)
    }

    fn is_closed(&self) -> bool {
        self.points.len() > 1 && self.points.first().map(SpherePoint::key) == self.tail()
    }

    fn distinct_points(&self) -> usize {
        self.points
            .iter()
            .map(SpherePoint::key)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Which end of a chord a crossing is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChordEnd {
    Start,
    End,
}

struct Assembler {
    fragments: SlotMap<FragmentId, Fragment>,
    /// Open fragments waiting to be resumed, by tail point.
    parked: HashMap<PointKey, FragmentId>,
    /// Closed fragments in the order they closed.
    finished: Vec<FragmentId>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            fragments: SlotMap::with_key(),
            parked: HashMap::new(),
            finished: Vec::new(),
        }
    }

    fn start(&mut self) -> FragmentId {
        self.fragments.insert(Fragment::new())
    }

    fn finish(&mut self, id: FragmentId) {
        if let Some(fragment) = self.fragments.get_mut(id) {
            fragment.state = FragmentState::Finished;
            self.finished.push(id);
        }
    }

    /// Close `id` if its ends meet, otherwise park it by its tail.
    fn close_or_park(&mut self, id: FragmentId) {
        let Some(fragment) = self.fragments.get(id) else {
            return;
        };
        if fragment.is_closed() {
            self.finish(id);
        } else if let Some(tail) = fragment.tail() {
            self.parked.insert(tail, id);
        }
    }

    /// Pick up the fragment parked at `at`, or start a new one there.
    fn resume(&mut self, at: SpherePoint) -> FragmentId {
        match self.parked.remove(&at.key()) {
            Some(id) => id,
            None => {
                let id = self.start();
                self.fragments[id].push(at);
                id
            }
        }
    }

    /// Finish everything still open, in creation order.
    fn finish_open(&mut self) {
        let open: Vec<FragmentId> = self
            .fragments
            .iter()
            .filter(|(_, f)| f.state == FragmentState::Open)
            .map(|(id, _)| id)
            .collect();
        for id in open {
            self.finish(id);
        }
        self.parked.clear();
    }

    fn into_rings(mut self) -> Vec<Ring> {
        let mut rings = Vec::with_capacity(self.finished.len());
        for id in self.finished {
            let Some(fragment) = self.fragments.remove(id) else {
                continue;
            };
            if fragment.distinct_points() < 3 {
                trace!(points = fragment.points.len(), "dropping degenerate fragment");
                continue;
            }
            rings.push(Ring::new(fragment.points).closed());
        }
        rings
    }
}

/// Rebuild the fragments of a ring cut along `chords`.
///
/// `nodes` is the ring with every chord extremity inserted and flagged.
/// Returned rings are explicitly closed.
pub(crate) fn reassemble(nodes: &[RingNode], chords: &[CutChord]) -> Result<Vec<Ring>> {
    let mut chord_at: HashMap<PointKey, (usize, ChordEnd)> = HashMap::new();
    for (i, chord) in chords.iter().enumerate() {
        if let (Some(first), Some(last)) = (chord.points.first(), chord.points.last()) {
            chord_at.insert(first.key(), (i, ChordEnd::Start));
            chord_at.insert(last.key(), (i, ChordEnd::End));
        }
    }

    let mut asm = Assembler::new();
    let mut consumed: HashSet<PointKey> = HashSet::new();
    let mut current: Option<FragmentId> = None;

    for node in nodes {
        let key = node.point.key();
        if node.crossing {
            let &(index, end) = chord_at.get(&key).ok_or_else(|| {
                SplitError::DegenerateGeometry("ring crossing has no cut chord".into())
            })?;
            let chord = &chords[index].points;
            let id = current.unwrap_or_else(|| asm.start());
            let fragment = &mut asm.fragments[id];
            match end {
                ChordEnd::Start => chord.iter().for_each(|&p| fragment.push(p)),
                ChordEnd::End => chord.iter().rev().for_each(|&p| fragment.push(p)),
            }
            consumed.extend(chord.iter().map(SpherePoint::key));
            trace!(chord = index, ?end, "detour along cut chord");

            asm.close_or_park(id);
            current = Some(asm.resume(node.point));
        } else if !consumed.contains(&key) {
            let id = *current.get_or_insert_with(|| asm.start());
            asm.fragments[id].push(node.point);
        }
    }

    if let Some(id) = current {
        asm.close_or_park(id);
    }
    asm.finish_open();
    Ok(asm.into_rings())
}
