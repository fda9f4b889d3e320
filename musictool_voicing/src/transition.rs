// Chord transition graph.
//
// From any voiced chord, a "transition" moves exactly one voice one step up
// or down inside a `NoteRange` (one step = next member of the range's note
// set, so with a scale range voices move diatonically). Repeating that from
// a start chord reaches a finite set of chords, because every note stays
// inside the range. `TransitionGraph` records that set as an adjacency map.
//
// The graph is closed: every chord appearing as a neighbour is itself a
// key. Edges are directed, although for the default options every move can
// be undone so the graph is effectively symmetric.
//
// Construction is an iterative depth-first walk with an explicit stack and
// a visited set. Output maps are `BTreeMap`/`BTreeSet` so iteration order
// does not depend on hashing.

use crate::{Result, SearchError};
use musictool_theory::{NoteRange, SpecificChord};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Which single-voice moves count as transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionOptions {
    /// Reject moves onto a note another voice already holds.
    pub same_length: bool,
    /// Reject results with the same pitch-class in two voices.
    pub unique_pitch_classes: bool,
}

impl Default for TransitionOptions {
    fn default() -> Self {
        TransitionOptions {
            same_length: true,
            unique_pitch_classes: false,
        }
    }
}

/// Every chord one single-voice step away from `chord`, in voice order,
/// down before up. Voices that would leave `range` are not moved.
pub fn chord_transitions(
    chord: &SpecificChord,
    range: &NoteRange,
    options: TransitionOptions,
) -> Vec<SpecificChord> {
    let mut out = Vec::new();
    for &note in chord.notes() {
        for steps in [-1, 1] {
            let Some(moved) = range.step(note, steps) else {
                continue;
            };
            let next = chord.replace(note, moved);
            if options.same_length && next.len() != chord.len() {
                continue;
            }
            if options.unique_pitch_classes && next.has_doubled_pitch_classes() {
                continue;
            }
            if !out.contains(&next) {
                out.push(next);
            }
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransitionGraph {
    edges: BTreeMap<SpecificChord, BTreeSet<SpecificChord>>,
}

impl TransitionGraph {
    /// Explore everything reachable from `start`. The start chord's root is
    /// dropped so it compares equal to the same notes reached by moves.
    pub fn build(
        start: &SpecificChord,
        range: &NoteRange,
        options: TransitionOptions,
    ) -> Result<Self> {
        if let Some(&note) = start.notes().iter().find(|&&n| !range.contains(n)) {
            return Err(SearchError::OutOfRange {
                note: note.to_string(),
                chord: start.to_string(),
            });
        }

        let start = start.without_root();
        let mut edges = BTreeMap::new();
        let mut visited = FxHashSet::default();
        visited.insert(start.clone());
        let mut stack = vec![start];

        while let Some(chord) = stack.pop() {
            let neighbors = chord_transitions(&chord, range, options);
            for next in &neighbors {
                if visited.insert(next.clone()) {
                    stack.push(next.clone());
                }
            }
            edges.insert(chord, neighbors.into_iter().collect());
        }

        let graph = TransitionGraph { edges };
        debug!(
            chords = graph.len(),
            edges = graph.edge_count(),
            "built transition graph"
        );
        Ok(graph)
    }

    /// Successors of `chord`, in ascending order. Empty for unknown chords.
    pub fn neighbors(&self, chord: &SpecificChord) -> Vec<SpecificChord> {
        self.edges
            .get(chord)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// `to` is one single-voice step from `from`.
    pub fn has_edge(&self, from: &SpecificChord, to: &SpecificChord) -> bool {
        self.edges.get(from).is_some_and(|next| next.contains(to))
    }

    pub fn contains(&self, chord: &SpecificChord) -> bool {
        self.edges.contains_key(chord)
    }

    /// Number of chords.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn chords(&self) -> impl Iterator<Item = &SpecificChord> {
        self.edges.keys()
    }

    pub fn edges(&self) -> &BTreeMap<SpecificChord, BTreeSet<SpecificChord>> {
        &self.edges
    }

    /// Every neighbour is also a key.
    pub fn is_closed(&self) -> bool {
        self.edges
            .values()
            .flatten()
            .all(|next| self.edges.contains_key(next))
    }
}
