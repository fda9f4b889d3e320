// Chord progressions and their ranking.
//
// A progression is an ordered list of voiced chords. Its distance is the
// total number of semitones all voices move from each chord to the next
// (and from the last back to the first when the progression loops), which
// is the cost the search sorts by: smaller means smoother voice leading.

use musictool_theory::{Chord, ChordKind, Scale, SpecificChord};
use serde::{Deserialize, Serialize};
use std::fmt;

const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progression(pub Vec<SpecificChord>);

impl Progression {
    pub fn new(chords: Vec<SpecificChord>) -> Self {
        Progression(chords)
    }

    pub fn chords(&self) -> &[SpecificChord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total voice movement. Pairs with different voice counts contribute
    /// nothing.
    pub fn distance(&self, looped: bool) -> u32 {
        let steps: u32 = self
            .0
            .windows(2)
            .filter_map(|w| w[0].voices_distance(&w[1]))
            .sum();
        let wrap = match (looped, self.0.first(), self.0.last()) {
            (true, Some(first), Some(last)) if self.0.len() > 1 => {
                last.voices_distance(first).unwrap_or(0)
            }
            _ => 0,
        };
        steps + wrap
    }

    pub fn transpose(&self, semitones: i16) -> Progression {
        Progression(self.0.iter().map(|c| c.transpose(semitones)).collect())
    }

    /// Roman numeral of every chord relative to `scale`, `?` for chords that
    /// are unnamed or rooted outside the scale.
    pub fn degrees(&self, scale: Scale) -> Vec<String> {
        self.0
            .iter()
            .map(|chord| {
                chord
                    .abstract_chord()
                    .and_then(|c| roman_numeral(scale, c))
                    .unwrap_or_else(|| "?".to_string())
            })
            .collect()
    }
}

/// `ii`, `V7`, `vii°`, `IIImaj7`, `iiø7`... Upper case for a major third
/// above the root.
pub fn roman_numeral(scale: Scale, chord: Chord) -> Option<String> {
    let degree = scale.degree_of(chord.root)?;
    let numeral = NUMERALS.get(degree)?;
    let numeral = if chord.kind.is_minor_third() {
        numeral.to_lowercase()
    } else {
        numeral.to_string()
    };
    let suffix = match chord.kind {
        ChordKind::Major | ChordKind::Minor => "",
        ChordKind::Diminished => "°",
        ChordKind::Augmented => "+",
        ChordKind::Diminished7 => "°7",
        ChordKind::HalfDiminished7 => "ø7",
        ChordKind::Dominant7 | ChordKind::Minor7 => "7",
        ChordKind::Major7 | ChordKind::MinorMajor7 => "maj7",
        ChordKind::Major6 | ChordKind::Minor6 => "6",
        ChordKind::Sus2 => "sus2",
        ChordKind::Sus4 => "sus4",
    };
    Some(format!("{numeral}{suffix}"))
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " → ")?;
            }
            write!(f, "{chord}")?;
        }
        Ok(())
    }
}

/// A search result with its precomputed distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedProgression {
    pub progression: Progression,
    pub distance: u32,
}

impl RankedProgression {
    pub fn new(progression: Progression, looped: bool) -> Self {
        let distance = progression.distance(looped);
        RankedProgression {
            progression,
            distance,
        }
    }
}
