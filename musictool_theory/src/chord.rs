// Abstract chords.
//
// A `Chord` is a root pitch-class plus a `ChordKind`, the interval pattern
// above the root. Kinds are looked up by a 12-bit interval mask, so
// identification is a table scan over every member as candidate root.
//
// Some pitch-class sets have several readings (C6 = Am7, Csus2 = Gsus4,
// every dim7 is four chords). `Chord::identify` returns the first reading,
// trying a rooted set's own root first, then the other members in ascending
// order, and for each root the kinds in `ChordKind::ALL` order.

use crate::TheoryError;
use crate::note::Note;
use crate::noteset::NoteSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordKind {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
    Major6,
    Minor6,
    Dominant7,
    Major7,
    Minor7,
    HalfDiminished7,
    Diminished7,
    MinorMajor7,
}

impl ChordKind {
    pub const ALL: [ChordKind; 14] = [
        ChordKind::Major,
        ChordKind::Minor,
        ChordKind::Diminished,
        ChordKind::Augmented,
        ChordKind::Sus2,
        ChordKind::Sus4,
        ChordKind::Major6,
        ChordKind::Minor6,
        ChordKind::Dominant7,
        ChordKind::Major7,
        ChordKind::Minor7,
        ChordKind::HalfDiminished7,
        ChordKind::Diminished7,
        ChordKind::MinorMajor7,
    ];

    /// Semitones above the root, ascending, starting with 0.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordKind::Major => &[0, 4, 7],
            ChordKind::Minor => &[0, 3, 7],
            ChordKind::Diminished => &[0, 3, 6],
            ChordKind::Augmented => &[0, 4, 8],
            ChordKind::Sus2 => &[0, 2, 7],
            ChordKind::Sus4 => &[0, 5, 7],
            ChordKind::Major6 => &[0, 4, 7, 9],
            ChordKind::Minor6 => &[0, 3, 7, 9],
            ChordKind::Dominant7 => &[0, 4, 7, 10],
            ChordKind::Major7 => &[0, 4, 7, 11],
            ChordKind::Minor7 => &[0, 3, 7, 10],
            ChordKind::HalfDiminished7 => &[0, 3, 6, 10],
            ChordKind::Diminished7 => &[0, 3, 6, 9],
            ChordKind::MinorMajor7 => &[0, 3, 7, 11],
        }
    }

    /// Lead-sheet suffix written after the root.
    pub fn suffix(self) -> &'static str {
        match self {
            ChordKind::Major => "",
            ChordKind::Minor => "m",
            ChordKind::Diminished => "dim",
            ChordKind::Augmented => "aug",
            ChordKind::Sus2 => "sus2",
            ChordKind::Sus4 => "sus4",
            ChordKind::Major6 => "6",
            ChordKind::Minor6 => "m6",
            ChordKind::Dominant7 => "7",
            ChordKind::Major7 => "maj7",
            ChordKind::Minor7 => "m7",
            ChordKind::HalfDiminished7 => "m7b5",
            ChordKind::Diminished7 => "dim7",
            ChordKind::MinorMajor7 => "m(maj7)",
        }
    }

    fn mask(self) -> u16 {
        self.intervals().iter().fold(0u16, |acc, &iv| acc | (1 << iv))
    }

    /// Third above the root is minor (used for roman numeral case).
    pub fn is_minor_third(self) -> bool {
        self.intervals().contains(&3)
    }
}

/// A chord as pitch-classes: root plus kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Chord {
    pub root: Note,
    pub kind: ChordKind,
}

impl Chord {
    pub fn new(root: Note, kind: ChordKind) -> Self {
        Chord { root, kind }
    }

    /// Member pitch-classes, rooted.
    pub fn noteset(self) -> NoteSet {
        let bits = self
            .kind
            .intervals()
            .iter()
            .fold(0u16, |acc, &iv| acc | (1 << (self.root + iv as i32).i()));
        NoteSet::from_bits(bits, Some(self.root))
    }

    /// Members in ascending order from the root.
    pub fn notes(self) -> Vec<Note> {
        self.noteset().notes()
    }

    /// Name a set of pitch-classes, if it matches any known kind.
    pub fn identify(noteset: NoteSet) -> Option<Chord> {
        for root in noteset.notes() {
            let mask = noteset
                .notes()
                .into_iter()
                .fold(0u16, |acc, n| acc | (1 << root.interval_to(n)));
            if let Some(kind) = ChordKind::ALL.into_iter().find(|k| k.mask() == mask) {
                return Some(Chord { root, kind });
            }
        }
        None
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root, self.kind.suffix())
    }
}

impl FromStr for Chord {
    type Err = TheoryError;

    /// Parses a root (with optional `#`/`b`) followed by a suffix from
    /// `ChordKind::suffix`: `C`, `am`, `F#m7b5`, `Bbmaj7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || TheoryError::UnknownChord(s.to_string());

        let first_len = s.chars().next().map(char::len_utf8).ok_or_else(unknown)?;
        let suffix_start = s[first_len..]
            .find(|c: char| c != '#' && c != 'b')
            .map_or(s.len(), |i| i + first_len);

        let root: Note = s[..suffix_start].parse().map_err(|_| unknown())?;
        let suffix = &s[suffix_start..];
        let kind = ChordKind::ALL
            .into_iter()
            .find(|k| k.suffix() == suffix)
            .ok_or_else(unknown)?;
        Ok(Chord { root, kind })
    }
}
