// Voice-leading progression search.
//
// Finds chord progressions whose consecutive chords connect smoothly, then
// ranks them by how far the voices travel in total. The search itself is a
// `musictool_seq::SequenceBuilder`; this crate supplies the chords to pick
// from and the constraints between them.
//
// Architecture:
// - voice_leading.rs: pure voice-leading predicates (parallel and hidden
//   5ths/8ves, crossing, leaps, spacing) and the memoizing checker
// - transition.rs: single-voice step moves and the closed transition graph
//   reachable from a starting chord
// - progression.rs: `Progression`, total voice movement, roman numerals
// - config.rs: `SearchConfig`, the serde/JSON description of a search
// - search.rs: scale voicing enumeration and `ProgressionSearch`
// - main.rs: the `progressions` CLI
//
// Everything runs on the calling thread. The checker's memo table uses
// interior mutability so one checker can back every constraint closure of a
// search.

pub mod config;
pub mod progression;
pub mod search;
pub mod transition;
pub mod voice_leading;

pub use config::{ChordSize, SearchConfig};
pub use progression::{Progression, RankedProgression};
pub use search::{ProgressionSearch, scale_voicings};
pub use transition::{TransitionGraph, TransitionOptions, chord_transitions};
pub use voice_leading::{Violation, VoiceLeadingChecker, VoiceLeadingRules};

use musictool_seq::SequenceError;
use musictool_theory::TheoryError;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Theory(#[from] TheoryError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("chord {chord} has {note} outside the note range")]
    OutOfRange { note: String, chord: String },
}

pub type Result<T> = std::result::Result<T, SearchError>;
