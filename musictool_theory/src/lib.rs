// Music theory model for the musictool workspace.
//
// Everything here is plain data plus light arithmetic: no search, no I/O.
// The voice-leading search in `musictool_voicing` is built on these types.
//
// Architecture:
// - note.rs: `Note`, one of the 12 octave-independent pitch-classes
// - specific_note.rs: `SpecificNote`, a pitch-class bound to an octave
// - noteset.rs: `NoteSet`, an (optionally rooted) set of pitch-classes with
//   stepwise movement inside the set
// - scale.rs: named scale kinds, `Scale`, diatonic triads and sevenths
// - chord.rs: named chord kinds, `Chord` and chord identification
// - specific_chord.rs: `SpecificChord`, a voiced chord of absolute notes
// - note_range.rs: `NoteRange`, a bounded stretch of a note set's lattice
// - rhythm.rs: one-bar rhythms, syncopation scoring and enumeration
//
// Notes are spelled with the single-character chromatic alphabet
// `C d D e E F f G a A b B`, where lowercase letters are the black keys.
// Parsing also accepts conventional `#`/`b` spellings.

pub mod chord;
pub mod note;
pub mod note_range;
pub mod noteset;
pub mod rhythm;
pub mod scale;
pub mod specific_chord;
pub mod specific_note;

pub use chord::{Chord, ChordKind};
pub use note::Note;
pub use note_range::NoteRange;
pub use noteset::NoteSet;
pub use rhythm::Rhythm;
pub use scale::{Scale, ScaleKind};
pub use specific_chord::SpecificChord;
pub use specific_note::SpecificNote;

/// Errors from parsing or constructing theory values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TheoryError {
    #[error("unknown note name '{0}'")]
    UnknownNote(String),
    #[error("invalid specific note '{0}'")]
    InvalidSpecificNote(String),
    #[error("unknown scale kind '{0}'")]
    UnknownScale(String),
    #[error("unknown chord '{0}'")]
    UnknownChord(String),
    #[error("note set is empty")]
    EmptyNoteSet,
    #[error("{note} is not in note set {noteset}")]
    NotInSet { note: String, noteset: String },
    #[error("invalid note range {start}..={stop}: {reason}")]
    InvalidRange {
        start: String,
        stop: String,
        reason: &'static str,
    },
    #[error("invalid rhythm: {0}")]
    InvalidRhythm(String),
    #[error(transparent)]
    Sequence(#[from] musictool_seq::SequenceError),
}

pub type Result<T> = std::result::Result<T, TheoryError>;
