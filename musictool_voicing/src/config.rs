// Search configuration.
//
// `SearchConfig` describes one progression search: which scale and chords
// to draw from, how the chords are voiced, how long progressions are, and
// which voice-leading rules apply. It is plain serde data so a search can
// be stored as JSON and loaded by the `progressions` CLI; every field has a
// default, so a config file only needs the fields it changes.
//
// `validate()` checks the cross-field conditions serde cannot express
// (range endpoints, positive lengths). `ProgressionSearch::new` calls it.

use crate::transition::TransitionOptions;
use crate::voice_leading::VoiceLeadingRules;
use crate::{Result, SearchError};
use musictool_theory::{Chord, Note, NoteRange, Scale, ScaleKind, SpecificNote};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which diatonic chords a search uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordSize {
    Triads,
    Sevenths,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub root: Note,
    pub scale: ScaleKind,
    pub chords: ChordSize,
    /// Notes per voicing.
    pub voices: usize,
    pub range_start: SpecificNote,
    pub range_stop: SpecificNote,
    /// Chords per progression.
    pub length: usize,
    /// First chord must be the tonic chord.
    pub start_on_tonic: bool,
    /// No chord root repeats within a progression.
    pub unique_chords: bool,
    /// Progressions are cycles: the last chord must lead back to the first.
    pub looped: bool,
    /// Stop after this many progressions; `None` enumerates everything.
    /// Results are ranked after the cut, so with a limit the best result is
    /// the best of the first `limit` found in search order (or shuffled
    /// order when `seed` is set), not necessarily the best overall.
    pub limit: Option<usize>,
    /// Shuffle candidates reproducibly so `limit` samples varied results.
    pub seed: Option<u64>,
    /// Graph searches move voices chromatically instead of within the scale.
    pub chromatic_graph: bool,
    pub rules: VoiceLeadingRules,
    pub transitions: TransitionOptions,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            root: Note::new(0),
            scale: ScaleKind::Major,
            chords: ChordSize::Triads,
            voices: 3,
            range_start: SpecificNote::new(Note::new(0), 3),
            range_stop: SpecificNote::new(Note::new(0), 5),
            length: 4,
            start_on_tonic: true,
            unique_chords: true,
            looped: true,
            limit: Some(10_000),
            seed: None,
            chromatic_graph: false,
            rules: VoiceLeadingRules::default(),
            transitions: TransitionOptions::default(),
        }
    }
}

impl SearchConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        SearchConfig::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.length == 0 {
            return Err(SearchError::Config("length must be at least 1".into()));
        }
        if self.voices == 0 {
            return Err(SearchError::Config("voices must be at least 1".into()));
        }
        if self.range_start > self.range_stop {
            return Err(SearchError::Config(format!(
                "range start {} is above range stop {}",
                self.range_start, self.range_stop
            )));
        }
        Ok(())
    }

    pub fn scale(&self) -> Scale {
        Scale::new(self.root, self.scale)
    }

    /// The diatonic chords of the configured scale and size.
    pub fn scale_chords(&self) -> Vec<Chord> {
        match self.chords {
            ChordSize::Triads => self.scale().triads(),
            ChordSize::Sevenths => self.scale().sevenths(),
        }
    }

    /// Voicing range: scale notes between the endpoints, widened outward to
    /// the nearest scale note when an endpoint is not in the scale.
    pub fn scale_range(&self) -> Result<NoteRange> {
        let noteset = self.scale().noteset();
        let fit = |mut note: SpecificNote, dir: i16| {
            while !noteset.contains(note.abstract_note) {
                note = note + dir;
            }
            note
        };
        let start = fit(self.range_start, -1);
        let stop = fit(self.range_stop, 1);
        Ok(NoteRange::new(start, stop, noteset)?)
    }

    /// Range the transition graph moves voices in.
    pub fn graph_range(&self) -> Result<NoteRange> {
        if self.chromatic_graph {
            Ok(NoteRange::chromatic(self.range_start, self.range_stop)?)
        } else {
            self.scale_range()
        }
    }
}
