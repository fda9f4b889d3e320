// Voiced chords.
//
// A `SpecificChord` is a set of absolute notes, kept sorted and without
// duplicates, plus an optional root pitch-class. Position in the sorted
// list is the voice: index 0 is the bass, the last index the top voice.
// Voice-leading checks in `musictool_voicing` pair voices of consecutive
// chords by this index.
//
// Text form joins notes with `_` and appends `/root` when rooted:
// `C3_E3_G3/C`.

use crate::chord::Chord;
use crate::note::Note;
use crate::noteset::NoteSet;
use crate::specific_note::SpecificNote;
use crate::{Result, TheoryError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpecificChord {
    notes: Vec<SpecificNote>,
    root: Option<Note>,
}

impl SpecificChord {
    /// Build an unrooted chord. Notes are sorted and de-duplicated; an empty
    /// input is an error.
    pub fn new(notes: impl IntoIterator<Item = SpecificNote>) -> Result<Self> {
        let mut notes: Vec<SpecificNote> = notes.into_iter().collect();
        if notes.is_empty() {
            return Err(TheoryError::EmptyNoteSet);
        }
        notes.sort();
        notes.dedup();
        Ok(SpecificChord { notes, root: None })
    }

    /// Same notes with `root`; the root must be one of the chord's
    /// pitch-classes.
    pub fn with_root(self, root: Note) -> Result<Self> {
        if !self.notes.iter().any(|n| n.abstract_note == root) {
            return Err(TheoryError::NotInSet {
                note: root.to_string(),
                noteset: self.to_string(),
            });
        }
        Ok(SpecificChord {
            notes: self.notes,
            root: Some(root),
        })
    }

    pub fn without_root(&self) -> SpecificChord {
        SpecificChord {
            notes: self.notes.clone(),
            root: None,
        }
    }

    /// Notes from bass to top voice.
    pub fn notes(&self) -> &[SpecificNote] {
        &self.notes
    }

    pub fn root(&self) -> Option<Note> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn lowest(&self) -> SpecificNote {
        self.notes[0]
    }

    pub fn highest(&self) -> SpecificNote {
        self.notes[self.notes.len() - 1]
    }

    pub fn contains(&self, note: SpecificNote) -> bool {
        self.notes.binary_search(&note).is_ok()
    }

    /// Octave-independent content, carrying the root.
    pub fn pitch_classes(&self) -> NoteSet {
        let bits = self
            .notes
            .iter()
            .fold(0u16, |acc, n| acc | (1 << n.abstract_note.i()));
        NoteSet::from_bits(bits, self.root)
    }

    /// Abstract name of the chord, if its pitch-classes form a known kind.
    pub fn abstract_chord(&self) -> Option<Chord> {
        Chord::identify(self.pitch_classes())
    }

    /// Pitch-classes appearing in more than one voice.
    pub fn has_doubled_pitch_classes(&self) -> bool {
        self.pitch_classes().len() < self.notes.len()
    }

    pub fn transpose(&self, semitones: i16) -> SpecificChord {
        SpecificChord {
            notes: self.notes.iter().map(|&n| n + semitones).collect(),
            root: self.root.map(|r| r + semitones as i32),
        }
    }

    /// The chord with `old` swapped for `new`. The root is dropped because
    /// the moved voice may have been carrying it.
    pub fn replace(&self, old: SpecificNote, new: SpecificNote) -> SpecificChord {
        let mut notes: Vec<SpecificNote> = self
            .notes
            .iter()
            .map(|&n| if n == old { new } else { n })
            .collect();
        notes.sort();
        notes.dedup();
        SpecificChord { notes, root: None }
    }

    /// Total semitones moved when each voice goes to the voice with the same
    /// index in `other`. `None` when the voice counts differ.
    pub fn voices_distance(&self, other: &SpecificChord) -> Option<u32> {
        if self.len() != other.len() {
            return None;
        }
        Some(
            self.notes
                .iter()
                .zip(&other.notes)
                .map(|(&a, &b)| (b - a).unsigned_abs() as u32)
                .sum(),
        )
    }
}

impl fmt::Display for SpecificChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, note) in self.notes.iter().enumerate() {
            if i > 0 {
                f.write_str("_")?;
            }
            write!(f, "{note}")?;
        }
        if let Some(root) = self.root {
            write!(f, "/{root}")?;
        }
        Ok(())
    }
}

impl FromStr for SpecificChord {
    type Err = TheoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (notes, root) = match s.split_once('/') {
            Some((notes, root)) => (notes, Some(root)),
            None => (s, None),
        };
        let notes = notes
            .split('_')
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<SpecificNote>>>()?;
        let chord = SpecificChord::new(notes)?;
        match root {
            Some(root) => chord.with_root(root.parse()?),
            None => Ok(chord),
        }
    }
}

impl TryFrom<String> for SpecificChord {
    type Error = TheoryError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SpecificChord> for String {
    fn from(chord: SpecificChord) -> String {
        chord.to_string()
    }
}
