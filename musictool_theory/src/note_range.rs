// Bounded note ranges.
//
// A `NoteRange` is the stretch of a note set's octave lattice between two
// absolute notes, both ends inclusive. With the chromatic set it is every
// semitone from `start` to `stop`; with a scale it is every scale note in
// between. Indexing and stepping go through `NoteSet::add_specific`, so
// "one step up" always means the next member of the set.

use crate::noteset::NoteSet;
use crate::specific_note::SpecificNote;
use crate::{Result, TheoryError};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "NoteRangeFields")]
pub struct NoteRange {
    start: SpecificNote,
    stop: SpecificNote,
    noteset: NoteSet,
}

/// Unchecked wire form; deserializing goes through `NoteRange::new`.
#[derive(Deserialize)]
struct NoteRangeFields {
    start: SpecificNote,
    stop: SpecificNote,
    noteset: NoteSet,
}

impl TryFrom<NoteRangeFields> for NoteRange {
    type Error = TheoryError;

    fn try_from(f: NoteRangeFields) -> Result<Self> {
        NoteRange::new(f.start, f.stop, f.noteset)
    }
}

impl NoteRange {
    /// Both ends must be members of `noteset` and `start <= stop`.
    pub fn new(start: SpecificNote, stop: SpecificNote, noteset: NoteSet) -> Result<Self> {
        let invalid = |reason| TheoryError::InvalidRange {
            start: start.to_string(),
            stop: stop.to_string(),
            reason,
        };
        if start > stop {
            return Err(invalid("start is above stop"));
        }
        if !noteset.contains(start.abstract_note) || !noteset.contains(stop.abstract_note) {
            return Err(invalid("endpoint is not in the note set"));
        }
        Ok(NoteRange {
            start,
            stop,
            noteset,
        })
    }

    pub fn chromatic(start: SpecificNote, stop: SpecificNote) -> Result<Self> {
        NoteRange::new(start, stop, NoteSet::chromatic())
    }

    pub fn start(&self) -> SpecificNote {
        self.start
    }

    pub fn stop(&self) -> SpecificNote {
        self.stop
    }

    pub fn noteset(&self) -> NoteSet {
        self.noteset
    }

    pub fn contains(&self, note: SpecificNote) -> bool {
        self.start <= note && note <= self.stop && self.noteset.contains(note.abstract_note)
    }

    /// Number of notes in the range.
    pub fn len(&self) -> usize {
        self.noteset
            .steps_between(self.start, self.stop)
            .map_or(0, |steps| steps as usize + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `i`-th note from the bottom.
    pub fn get(&self, i: usize) -> Option<SpecificNote> {
        let steps = i32::try_from(i).ok()?;
        self.noteset
            .add_specific(self.start, steps)
            .ok()
            .filter(|&n| n <= self.stop)
    }

    pub fn iter(&self) -> impl Iterator<Item = SpecificNote> + use<> {
        let range = *self;
        (0..range.len()).filter_map(move |i| range.get(i))
    }

    /// Move `steps` notes up or down from `note`, or `None` if either end of
    /// the walk is outside the range.
    pub fn step(&self, note: SpecificNote, steps: i32) -> Option<SpecificNote> {
        if !self.contains(note) {
            return None;
        }
        self.noteset
            .add_specific(note, steps)
            .ok()
            .filter(|&n| self.contains(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sn(s: &str) -> SpecificNote {
        s.parse().unwrap()
    }

    #[test]
    fn test_validation() {
        let c_major: NoteSet = "CDEFGAB".parse().unwrap();
        assert!(NoteRange::new(sn("C4"), sn("C3"), c_major).is_err());
        assert!(NoteRange::new(sn("C4"), sn("f4"), c_major).is_err());
        assert!(NoteRange::new(sn("C4"), sn("C4"), c_major).is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let c_major: NoteSet = "CDEFGAB".parse().unwrap();
        let range = NoteRange::new(sn("C3"), sn("G4"), c_major).unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(serde_json::from_str::<NoteRange>(&json).unwrap(), range);

        let inverted = serde_json::json!({ "start": "C5", "stop": "C3", "noteset": "CDEFGAB" });
        assert!(serde_json::from_value::<NoteRange>(inverted).is_err());
        let outside = serde_json::json!({ "start": "C3", "stop": "f4", "noteset": "CDEFGAB" });
        assert!(serde_json::from_value::<NoteRange>(outside).is_err());
    }

    #[test]
    fn test_chromatic_range() {
        let range = NoteRange::chromatic(sn("C4"), sn("B4")).unwrap();
        assert_eq!(range.len(), 12);
        assert_eq!(range.get(0), Some(sn("C4")));
        assert_eq!(range.get(11), Some(sn("B4")));
        assert_eq!(range.get(12), None);
        assert!(range.contains(sn("f4")));
        assert!(!range.contains(sn("C5")));
    }

    #[test]
    fn test_scale_range_iterates_members() {
        let c_major: NoteSet = "CDEFGAB".parse().unwrap();
        let range = NoteRange::new(sn("A3"), sn("E4"), c_major).unwrap();
        let notes: Vec<String> = range.iter().map(|n| n.to_string()).collect();
        assert_eq!(notes, vec!["A3", "B3", "C4", "D4", "E4"]);
        assert_eq!(range.len(), 5);
        assert!(!range.contains(sn("d4")));
    }

    #[test]
    fn test_step_stays_in_range() {
        let c_major: NoteSet = "CDEFGAB".parse().unwrap();
        let range = NoteRange::new(sn("C4"), sn("C5"), c_major).unwrap();
        assert_eq!(range.step(sn("B4"), 1), Some(sn("C5")));
        assert_eq!(range.step(sn("C5"), 1), None);
        assert_eq!(range.step(sn("C4"), -1), None);
        assert_eq!(range.step(sn("E4"), -2), Some(sn("C4")));
        assert_eq!(range.step(sn("d4"), 1), None);
    }
}
