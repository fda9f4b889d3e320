// Absolute pitches.
//
// A `SpecificNote` binds a pitch-class to an octave. Its `absolute_i` is
// `octave * 12 + pitch_class`, so C0 is 0 and C4 is 48; ordering and
// arithmetic go through that number. Octaves may be negative (`b-1`).

use crate::TheoryError;
use crate::note::Note;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// `absolute_i` of C-128 and B127.
const LOWEST: i16 = i8::MIN as i16 * 12;
const HIGHEST: i16 = i8::MAX as i16 * 12 + 11;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpecificNote {
    pub abstract_note: Note,
    pub octave: i8,
}

impl SpecificNote {
    pub fn new(abstract_note: Note, octave: i8) -> Self {
        SpecificNote {
            abstract_note,
            octave,
        }
    }

    /// Pitches outside the octaves an `i8` can hold clamp to the lowest or
    /// highest representable note.
    pub fn from_absolute_i(absolute_i: i16) -> Self {
        let absolute_i = absolute_i.clamp(LOWEST, HIGHEST);
        SpecificNote {
            abstract_note: Note::new(absolute_i.rem_euclid(12) as u8),
            octave: absolute_i.div_euclid(12) as i8,
        }
    }

    pub fn absolute_i(self) -> i16 {
        self.octave as i16 * 12 + self.abstract_note.i() as i16
    }
}

impl Ord for SpecificNote {
    fn cmp(&self, other: &Self) -> Ordering {
        self.absolute_i().cmp(&other.absolute_i())
    }
}

impl PartialOrd for SpecificNote {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add<i16> for SpecificNote {
    type Output = SpecificNote;

    fn add(self, semitones: i16) -> SpecificNote {
        SpecificNote::from_absolute_i(self.absolute_i().saturating_add(semitones))
    }
}

impl Sub<i16> for SpecificNote {
    type Output = SpecificNote;

    fn sub(self, semitones: i16) -> SpecificNote {
        SpecificNote::from_absolute_i(self.absolute_i().saturating_sub(semitones))
    }
}

/// Signed distance in semitones; positive when `self` is higher.
impl Sub<SpecificNote> for SpecificNote {
    type Output = i16;

    fn sub(self, other: SpecificNote) -> i16 {
        self.absolute_i() - other.absolute_i()
    }
}

impl fmt::Display for SpecificNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.abstract_note, self.octave)
    }
}

impl FromStr for SpecificNote {
    type Err = TheoryError;

    /// Parses `C4`, `f3`, `Eb5`, `b-1`: a note name, optional accidentals,
    /// then a signed octave number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TheoryError::InvalidSpecificNote(s.to_string());

        let first_len = s.chars().next().map(char::len_utf8).ok_or_else(invalid)?;
        let octave_start = s[first_len..]
            .find(|c: char| c != '#' && c != 'b')
            .map(|i| i + first_len)
            .ok_or_else(invalid)?;

        let abstract_note: Note = s[..octave_start].parse().map_err(|_| invalid())?;
        let octave: i8 = s[octave_start..].parse().map_err(|_| invalid())?;
        Ok(SpecificNote::new(abstract_note, octave))
    }
}

impl TryFrom<String> for SpecificNote {
    type Error = TheoryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SpecificNote> for String {
    fn from(note: SpecificNote) -> String {
        note.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sn(s: &str) -> SpecificNote {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(sn("C4").absolute_i(), 48);
        assert_eq!(sn("A4").absolute_i(), 57);
        assert_eq!(sn("f3").abstract_note.i(), 6);
        assert_eq!(sn("Eb5"), sn("e5"));
        assert_eq!(sn("b-1").octave, -1);
        assert_eq!(sn("b-1").absolute_i(), -2);
        assert!("C".parse::<SpecificNote>().is_err());
        assert!("X4".parse::<SpecificNote>().is_err());
        assert!("C4x".parse::<SpecificNote>().is_err());
    }

    #[test]
    fn test_ordering_follows_absolute_pitch() {
        assert!(sn("B3") < sn("C4"));
        assert!(sn("C4") < sn("d4"));
        let mut notes = vec![sn("G4"), sn("C5"), sn("E4")];
        notes.sort();
        assert_eq!(notes, vec![sn("E4"), sn("G4"), sn("C5")]);
    }

    #[test]
    fn test_arithmetic_crosses_octaves() {
        assert_eq!(sn("B3") + 1, sn("C4"));
        assert_eq!(sn("C4") - 1, sn("B3"));
        assert_eq!(sn("C5") - sn("G4"), 5);
        assert_eq!(sn("G4") - sn("C5"), -5);
        assert_eq!(SpecificNote::from_absolute_i(-1), sn("B-1"));
    }

    #[test]
    fn test_arithmetic_clamps_at_extreme_octaves() {
        let top = sn("B127");
        assert_eq!(top + 1, top);
        assert_eq!(top + i16::MAX, top);
        assert_eq!(sn("A127") + 5, top);
        let bottom = sn("C-128");
        assert_eq!(bottom - 1, bottom);
        assert_eq!(bottom - i16::MAX, bottom);
        assert_eq!(SpecificNote::from_absolute_i(i16::MIN), bottom);
        assert_eq!(top - bottom, HIGHEST - LOWEST);
    }

    #[test]
    fn test_display() {
        assert_eq!(sn("C#4").to_string(), "d4");
        assert_eq!(sn("b-1").to_string(), "b-1");
    }
}
