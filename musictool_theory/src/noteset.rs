// Sets of pitch-classes.
//
// `NoteSet` is the common currency of the theory model: scales and chords
// are named views of a note set, and `NoteRange` walks the octave lattice
// a note set induces. Membership is a 12-bit mask (bit i = pitch-class i),
// so sets are `Copy` and compare/hash cheaply.
//
// An optional root picks where "ascending" order starts and which note
// intervals are measured from. The root must be a member of the set.
//
// Stepping (`add_note`, `add_specific`) moves along the members of the set
// rather than along semitones: in C major, one step up from E is F and one
// step up from B4 is C5.

use crate::note::Note;
use crate::specific_note::SpecificNote;
use crate::{Result, TheoryError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ALL_BITS: u16 = (1 << 12) - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NoteSet {
    bits: u16,
    root: Option<Note>,
}

impl NoteSet {
    /// Build an unrooted set. Duplicates are ignored; an empty input is an
    /// error.
    pub fn new(notes: impl IntoIterator<Item = Note>) -> Result<Self> {
        let bits = notes.into_iter().fold(0u16, |acc, n| acc | (1 << n.i()));
        if bits == 0 {
            return Err(TheoryError::EmptyNoteSet);
        }
        Ok(NoteSet { bits, root: None })
    }

    /// Internal constructor for callers that already hold a non-empty mask
    /// and a root that is a member.
    pub(crate) fn from_bits(bits: u16, root: Option<Note>) -> Self {
        debug_assert!(bits & ALL_BITS != 0, "note set must not be empty");
        NoteSet {
            bits: bits & ALL_BITS,
            root,
        }
    }

    pub fn chromatic() -> Self {
        NoteSet {
            bits: ALL_BITS,
            root: None,
        }
    }

    /// Same set with `root` as its root.
    pub fn with_root(self, root: Note) -> Result<Self> {
        if !self.contains(root) {
            return Err(TheoryError::NotInSet {
                note: root.to_string(),
                noteset: self.to_string(),
            });
        }
        Ok(NoteSet {
            bits: self.bits,
            root: Some(root),
        })
    }

    pub fn without_root(self) -> Self {
        NoteSet {
            bits: self.bits,
            root: None,
        }
    }

    pub fn bits(self) -> u16 {
        self.bits
    }

    pub fn root(self) -> Option<Note> {
        self.root
    }

    pub fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    pub fn contains(self, note: Note) -> bool {
        self.bits & (1 << note.i()) != 0
    }

    /// Same pitch-classes, ignoring roots.
    pub fn same_notes(self, other: NoteSet) -> bool {
        self.bits == other.bits
    }

    pub fn is_subset_of(self, other: NoteSet) -> bool {
        self.bits & !other.bits == 0
    }

    /// Members in ascending order starting from the root (or from C when
    /// unrooted).
    pub fn notes(self) -> Vec<Note> {
        let start = self.root.map_or(0, Note::i);
        (0..12)
            .map(|offset| Note::new(start + offset))
            .filter(|&n| self.contains(n))
            .collect()
    }

    /// Semitones from the root (or from the lowest member above C when
    /// unrooted) to each member, ascending. The first entry is always 0.
    pub fn intervals(self) -> Vec<u8> {
        let notes = self.notes();
        let Some(&first) = notes.first() else {
            return Vec::new();
        };
        notes.iter().map(|&n| first.interval_to(n)).collect()
    }

    /// Every member moved by `semitones`, root included.
    pub fn transpose(self, semitones: i32) -> Self {
        let bits = self
            .notes()
            .into_iter()
            .fold(0u16, |acc, n| acc | (1 << (n + semitones).i()));
        NoteSet {
            bits,
            root: self.root.map(|r| r + semitones),
        }
    }

    /// Members sorted by pitch-class, C first. Stepping uses this order so it
    /// does not depend on the root.
    fn lattice(self) -> Vec<Note> {
        Note::ALL.into_iter().filter(|&n| self.contains(n)).collect()
    }

    fn lattice_index(self, note: Note) -> Result<usize> {
        self.lattice()
            .iter()
            .position(|&n| n == note)
            .ok_or_else(|| TheoryError::NotInSet {
                note: note.to_string(),
                noteset: self.to_string(),
            })
    }

    /// Move `steps` members up (positive) or down (negative) from `note`,
    /// wrapping around the octave.
    pub fn add_note(self, note: Note, steps: i32) -> Result<Note> {
        let lattice = self.lattice();
        let index = self.lattice_index(note)? as i32;
        let target = (index + steps).rem_euclid(lattice.len() as i32);
        Ok(lattice[target as usize])
    }

    /// Move `steps` members up or down from an absolute note, changing octave
    /// whenever the walk passes C.
    pub fn add_specific(self, note: SpecificNote, steps: i32) -> Result<SpecificNote> {
        let lattice = self.lattice();
        let len = lattice.len() as i32;
        let total = self.lattice_index(note.abstract_note)? as i32 + steps;
        let octave = note.octave as i32 + total.div_euclid(len);
        Ok(SpecificNote::new(
            lattice[total.rem_euclid(len) as usize],
            octave as i8,
        ))
    }

    /// Number of member steps from `a` up to `b` (negative when `b` is
    /// lower). Both notes must be members.
    pub fn steps_between(self, a: SpecificNote, b: SpecificNote) -> Result<i32> {
        let len = self.len() as i32;
        let position = |n: SpecificNote| -> Result<i32> {
            Ok(n.octave as i32 * len + self.lattice_index(n.abstract_note)? as i32)
        };
        Ok(position(b)? - position(a)?)
    }
}

impl fmt::Display for NoteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for note in self.notes() {
            write!(f, "{note}")?;
        }
        if let Some(root) = self.root {
            write!(f, "/{root}")?;
        }
        Ok(())
    }
}

impl FromStr for NoteSet {
    type Err = TheoryError;

    /// Parses canonical single-character names, optionally followed by
    /// `/root`: `CDEFGAB`, `CeG/C`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (notes, root) = match s.split_once('/') {
            Some((notes, root)) => (notes, Some(root)),
            None => (s, None),
        };
        let notes = notes
            .chars()
            .map(|c| c.to_string().parse::<Note>())
            .collect::<Result<Vec<Note>>>()?;
        let set = NoteSet::new(notes)?;
        match root {
            Some(root) => set.with_root(root.parse()?),
            None => Ok(set),
        }
    }
}

impl TryFrom<String> for NoteSet {
    type Error = TheoryError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<NoteSet> for String {
    fn from(set: NoteSet) -> String {
        set.to_string()
    }
}
