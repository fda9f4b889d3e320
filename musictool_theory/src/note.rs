// Pitch-classes.
//
// A `Note` is one of the 12 chromatic pitch-classes with no octave. The
// canonical spelling is a single character from `CHROMATIC_NAMES`; lowercase
// letters are the black keys (`d` = C#/Db, `e` = D#/Eb, `f` = F#/Gb,
// `a` = G#/Ab, `b` = A#/Bb). Arithmetic wraps around the octave.

use crate::TheoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Canonical names indexed by pitch-class (0 = C).
pub const CHROMATIC_NAMES: [char; 12] = ['C', 'd', 'D', 'e', 'E', 'F', 'f', 'G', 'a', 'A', 'b', 'B'];

/// An octave-independent pitch-class, 0 (C) through 11 (B).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Note(u8);

impl Note {
    pub const ALL: [Note; 12] = [
        Note(0),
        Note(1),
        Note(2),
        Note(3),
        Note(4),
        Note(5),
        Note(6),
        Note(7),
        Note(8),
        Note(9),
        Note(10),
        Note(11),
    ];

    pub const fn new(i: u8) -> Self {
        Note(i % 12)
    }

    /// Pitch-class of an arbitrary (possibly negative) semitone count.
    pub fn from_semitones(semitones: i32) -> Self {
        Note(semitones.rem_euclid(12) as u8)
    }

    pub fn i(self) -> u8 {
        self.0
    }

    pub fn name(self) -> char {
        CHROMATIC_NAMES[self.0 as usize]
    }

    pub fn is_black_key(self) -> bool {
        self.name().is_ascii_lowercase()
    }

    /// Ascending distance in semitones (0-11) from `self` up to `other`.
    pub fn interval_to(self, other: Note) -> u8 {
        (other.0 + 12 - self.0) % 12
    }
}

impl Add<i32> for Note {
    type Output = Note;

    fn add(self, semitones: i32) -> Note {
        Note::from_semitones(self.0 as i32 + semitones)
    }
}

impl Sub<i32> for Note {
    type Output = Note;

    fn sub(self, semitones: i32) -> Note {
        Note::from_semitones(self.0 as i32 - semitones)
    }
}

/// `a - b` is the ascending interval from `b` up to `a`.
impl Sub<Note> for Note {
    type Output = u8;

    fn sub(self, other: Note) -> u8 {
        other.interval_to(self)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Note {
    type Err = TheoryError;

    /// Accepts canonical names (`C`, `d`, `f`) and a base letter followed by
    /// any number of `#` or `b` accidentals (`C#`, `Eb`, `Bbb`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let first = chars
            .next()
            .ok_or_else(|| TheoryError::UnknownNote(s.to_string()))?;
        let base = CHROMATIC_NAMES
            .iter()
            .position(|&c| c == first)
            .ok_or_else(|| TheoryError::UnknownNote(s.to_string()))?;

        let mut offset = 0i32;
        for accidental in chars {
            match accidental {
                '#' => offset += 1,
                'b' => offset -= 1,
                _ => return Err(TheoryError::UnknownNote(s.to_string())),
            }
        }
        Ok(Note::from_semitones(base as i32 + offset))
    }
}

impl TryFrom<String> for Note {
    type Error = TheoryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Note> for String {
    fn from(note: Note) -> String {
        note.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_and_accidentals() {
        assert_eq!("C".parse::<Note>().unwrap().i(), 0);
        assert_eq!("d".parse::<Note>().unwrap().i(), 1);
        assert_eq!("f".parse::<Note>().unwrap().i(), 6);
        assert_eq!("C#".parse::<Note>().unwrap().i(), 1);
        assert_eq!("Eb".parse::<Note>().unwrap().i(), 3);
        assert_eq!("Bb".parse::<Note>().unwrap(), "b".parse::<Note>().unwrap());
        assert_eq!("B#".parse::<Note>().unwrap().i(), 0);
        assert!("H".parse::<Note>().is_err());
        assert!("".parse::<Note>().is_err());
        assert!("C%".parse::<Note>().is_err());
    }

    #[test]
    fn test_arithmetic_wraps() {
        let a = Note::new(9);
        assert_eq!((a + 3).i(), 0);
        assert_eq!((Note::new(0) - 1).i(), 11);
        assert_eq!(Note::new(0) - Note::new(9), 3); // A up to C
        assert_eq!(Note::new(9) - Note::new(0), 9); // C up to A
        assert_eq!(Note::new(4).interval_to(Note::new(2)), 10);
    }

    #[test]
    fn test_display_round_trips_through_names() {
        for note in Note::ALL {
            assert_eq!(note.to_string().parse::<Note>().unwrap(), note);
        }
        assert!(Note::new(1).is_black_key());
        assert!(!Note::new(4).is_black_key());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Note::new(3)).unwrap();
        assert_eq!(json, "\"e\"");
        let back: Note = serde_json::from_str("\"F#\"").unwrap();
        assert_eq!(back.i(), 6);
    }
}
