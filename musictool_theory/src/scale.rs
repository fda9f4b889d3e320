// Named scales.
//
// A `Scale` is a root plus a `ScaleKind` (an interval pattern). The seven
// diatonic modes share one pattern rotated, so `Scale::modes` can walk them;
// harmonic/melodic minor and the pentatonics are included for chord
// material but have no named rotations here.
//
// Chords on each degree are built by stacking every other scale note
// (thirds in a heptatonic scale). Only stacks that name a known chord kind
// rooted on their own degree are returned.
//
// Used by the progression search (`musictool_voicing::search`) to pick the
// chord vocabulary and by `Progression::degrees` for roman numerals.

use crate::TheoryError;
use crate::chord::Chord;
use crate::note::Note;
use crate::noteset::NoteSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    Major,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Minor,
    Locrian,
    HarmonicMinor,
    MelodicMinor,
    PentatonicMajor,
    PentatonicMinor,
}

impl ScaleKind {
    pub const ALL: [ScaleKind; 11] = [
        ScaleKind::Major,
        ScaleKind::Dorian,
        ScaleKind::Phrygian,
        ScaleKind::Lydian,
        ScaleKind::Mixolydian,
        ScaleKind::Minor,
        ScaleKind::Locrian,
        ScaleKind::HarmonicMinor,
        ScaleKind::MelodicMinor,
        ScaleKind::PentatonicMajor,
        ScaleKind::PentatonicMinor,
    ];

    /// Semitones from the root to each degree.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleKind::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleKind::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleKind::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleKind::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleKind::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleKind::Minor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleKind::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            ScaleKind::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleKind::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            ScaleKind::PentatonicMajor => &[0, 2, 4, 7, 9],
            ScaleKind::PentatonicMinor => &[0, 3, 5, 7, 10],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleKind::Major => "major",
            ScaleKind::Dorian => "dorian",
            ScaleKind::Phrygian => "phrygian",
            ScaleKind::Lydian => "lydian",
            ScaleKind::Mixolydian => "mixolydian",
            ScaleKind::Minor => "minor",
            ScaleKind::Locrian => "locrian",
            ScaleKind::HarmonicMinor => "harmonic_minor",
            ScaleKind::MelodicMinor => "melodic_minor",
            ScaleKind::PentatonicMajor => "pentatonic_major",
            ScaleKind::PentatonicMinor => "pentatonic_minor",
        }
    }

    fn from_intervals(intervals: &[u8]) -> Option<ScaleKind> {
        ScaleKind::ALL
            .into_iter()
            .find(|k| k.intervals() == intervals)
    }
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScaleKind {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase().replace(['-', ' '], "_");
        match lower.as_str() {
            "ionian" => return Ok(ScaleKind::Major),
            "aeolian" | "natural_minor" => return Ok(ScaleKind::Minor),
            _ => {}
        }
        ScaleKind::ALL
            .into_iter()
            .find(|k| k.name() == lower)
            .ok_or_else(|| TheoryError::UnknownScale(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scale {
    pub root: Note,
    pub kind: ScaleKind,
}

impl Scale {
    pub fn new(root: Note, kind: ScaleKind) -> Self {
        Scale { root, kind }
    }

    pub fn noteset(self) -> NoteSet {
        let bits = self
            .kind
            .intervals()
            .iter()
            .fold(0u16, |acc, &iv| acc | (1 << (self.root + iv as i32).i()));
        NoteSet::from_bits(bits, Some(self.root))
    }

    /// Degrees in order, starting at the root.
    pub fn notes_ascending(self) -> Vec<Note> {
        self.kind
            .intervals()
            .iter()
            .map(|&iv| self.root + iv as i32)
            .collect()
    }

    /// Zero-based degree of `note`, if it belongs to the scale.
    pub fn degree_of(self, note: Note) -> Option<usize> {
        let interval = self.root.interval_to(note);
        self.kind.intervals().iter().position(|&iv| iv == interval)
    }

    /// Note at a zero-based degree; degrees wrap around.
    pub fn note_at_degree(self, degree: usize) -> Note {
        let intervals = self.kind.intervals();
        self.root + intervals[degree % intervals.len()] as i32
    }

    /// Chord of `size` notes stacked in thirds on `degree`, if it is a known
    /// chord rooted on that degree.
    pub fn chord_at_degree(self, degree: usize, size: usize) -> Option<Chord> {
        let root = self.note_at_degree(degree);
        let notes = (0..size).map(|k| self.note_at_degree(degree + 2 * k));
        let noteset = NoteSet::new(notes).ok()?.with_root(root).ok()?;
        Chord::identify(noteset).filter(|chord| chord.root == root)
    }

    pub fn triads(self) -> Vec<Chord> {
        (0..self.kind.intervals().len())
            .filter_map(|degree| self.chord_at_degree(degree, 3))
            .collect()
    }

    pub fn sevenths(self) -> Vec<Chord> {
        (0..self.kind.intervals().len())
            .filter_map(|degree| self.chord_at_degree(degree, 4))
            .collect()
    }

    /// Every rotation of this scale that is itself a named kind, starting
    /// with the scale itself.
    pub fn modes(self) -> Vec<Scale> {
        let noteset = self.noteset();
        self.notes_ascending()
            .into_iter()
            .filter_map(|root| {
                let intervals = noteset.with_root(root).ok()?.intervals();
                ScaleKind::from_intervals(&intervals).map(|kind| Scale::new(root, kind))
            })
            .collect()
    }

    /// Name a note set as a scale. A rooted set is only tried on its root;
    /// an unrooted one tries kinds in `ScaleKind::ALL` order, each on every
    /// member from C upward.
    pub fn identify(noteset: NoteSet) -> Option<Scale> {
        if let Some(root) = noteset.root() {
            return ScaleKind::from_intervals(&noteset.intervals())
                .map(|kind| Scale::new(root, kind));
        }
        for kind in ScaleKind::ALL {
            for root in noteset.notes() {
                let intervals = noteset.with_root(root).ok()?.intervals();
                if intervals == kind.intervals() {
                    return Some(Scale::new(root, kind));
                }
            }
        }
        None
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root, self.kind)
    }
}

impl FromStr for Scale {
    type Err = TheoryError;

    /// Parses `"<root> <kind>"`, e.g. `C major`, `D dorian`, `F# harmonic minor`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (root, kind) = s
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| TheoryError::UnknownScale(s.to_string()))?;
        Ok(Scale::new(root.parse()?, kind.trim().parse()?))
    }
}
