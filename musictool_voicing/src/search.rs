// Progression search.
//
// Two ways to feed the sequence search with chords:
//
// - `ProgressionSearch::run` voices every diatonic chord of the configured
//   scale inside the configured range (`scale_voicings`) and lets every
//   position pick from that whole pool.
// - `ProgressionSearch::run_from_graph` starts from one voiced chord and
//   only offers, at each position, the chords one single-voice step away
//   from the previous one (`TransitionGraph`).
//
// Either way the same constraints are attached to the `SequenceBuilder`:
// the memoized voice-leading checker between neighbours (including the
// wraparound pair when looped), a tonic first chord, and no repeated chord
// root. Results are collected up to `limit`, then stably sorted by total
// voice movement so equal distances keep generation order.

use crate::Result;
use crate::config::SearchConfig;
use crate::progression::{Progression, RankedProgression};
use crate::transition::TransitionGraph;
use crate::voice_leading::VoiceLeadingChecker;
use musictool_seq::{Options, SequenceBuilder};
use musictool_theory::{Chord, Note, NoteRange, SpecificChord, SpecificNote};
use tracing::{debug, info, warn};

/// Every voicing of every chord in `chords`: `voices` distinct notes from
/// `range`, each note a chord tone, every chord tone present at least once.
/// Voicings carry their chord's root. Chords with more tones than `voices`
/// have no voicings.
pub fn scale_voicings(
    chords: &[Chord],
    range: &NoteRange,
    voices: usize,
    max_spacing: Option<u8>,
) -> Result<Vec<SpecificChord>> {
    let mut out = Vec::new();
    for &chord in chords {
        let tones = chord.noteset();
        let domain: Vec<SpecificNote> = range
            .iter()
            .filter(|n| tones.contains(n.abstract_note))
            .collect();

        let builder = SequenceBuilder::new(voices, Options::Fixed(domain))
            .pair_constraint(1, |low: &SpecificNote, high: &SpecificNote| low < high)
            .candidate_constraint(move |placed, &candidate| {
                // Prune once the open voices can no longer cover the
                // missing chord tones.
                let missing = tones
                    .notes()
                    .into_iter()
                    .filter(|&tone| {
                        candidate.abstract_note != tone
                            && placed.iter().all(|n| n.abstract_note != tone)
                    })
                    .count();
                missing <= voices - placed.len() - 1
            })
            .candidate_constraint(move |placed, &candidate| match (max_spacing, placed) {
                // Upper voices only: the bass may sit further below.
                (Some(max), [_, .., last]) => candidate - *last <= max as i16,
                _ => true,
            });

        let before = out.len();
        for notes in builder.sequences()? {
            out.push(SpecificChord::new(notes)?.with_root(chord.root)?);
        }
        debug!(%chord, voicings = out.len() - before, "voiced chord");
    }
    Ok(out)
}

/// Root used for tonic and uniqueness checks: the voicing's own root, or
/// the root of the chord its pitch-classes spell.
fn chord_root(chord: &SpecificChord) -> Option<Note> {
    chord
        .root()
        .or_else(|| chord.abstract_chord().map(|c| c.root))
}

/// Uniqueness key. Unnamed chords fall back to their pitch-class set so two
/// different unnamed chords never collide.
fn chord_identity(chord: &SpecificChord) -> (Option<Note>, u16) {
    match chord_root(chord) {
        Some(root) => (Some(root), 0),
        None => (None, chord.pitch_classes().bits()),
    }
}

pub struct ProgressionSearch {
    config: SearchConfig,
    checker: VoiceLeadingChecker,
}

impl ProgressionSearch {
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let checker = VoiceLeadingChecker::new(config.rules.clone());
        Ok(ProgressionSearch { config, checker })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn checker(&self) -> &VoiceLeadingChecker {
        &self.checker
    }

    /// The chord pool `run` chooses from.
    pub fn voicings(&self) -> Result<Vec<SpecificChord>> {
        scale_voicings(
            &self.config.scale_chords(),
            &self.config.scale_range()?,
            self.config.voices,
            self.config.rules.max_spacing,
        )
    }

    pub fn run(&self) -> Result<Vec<RankedProgression>> {
        let voicings = self.voicings()?;
        info!(
            scale = %self.config.scale(),
            voicings = voicings.len(),
            length = self.config.length,
            "searching progressions"
        );
        let builder = SequenceBuilder::new(self.config.length, Options::Fixed(voicings));
        let builder = if self.config.start_on_tonic {
            let tonic = self.config.root;
            builder.position_constraint(0, move |c| chord_root(c) == Some(tonic))
        } else {
            builder
        };
        self.collect(builder)
    }

    /// Progressions that begin at `start` and move one voice by one step per
    /// chord. `start` replaces the tonic requirement. When looped, the last
    /// chord must also lead back to `start` by a single step.
    pub fn run_from_graph(&self, start: &SpecificChord) -> Result<Vec<RankedProgression>> {
        let range = self.config.graph_range()?;
        let graph = &TransitionGraph::build(start, &range, self.config.transitions)?;
        info!(
            %start,
            chords = graph.len(),
            length = self.config.length,
            "searching progressions through transition graph"
        );
        let n = self.config.length;
        let options = Options::from_previous(vec![start.without_root()], |c| graph.neighbors(c));
        let builder = SequenceBuilder::new(n, options);
        let builder = if self.config.looped {
            builder.candidate_constraint(move |prefix, chord| {
                let closing = prefix.len() + 1 == n;
                !closing || prefix.first().is_none_or(|first| graph.has_edge(chord, first))
            })
        } else {
            builder
        };
        self.collect(builder)
    }

    fn collect<'a>(
        &'a self,
        builder: SequenceBuilder<'a, SpecificChord>,
    ) -> Result<Vec<RankedProgression>> {
        let config = &self.config;
        let checker = &self.checker;

        let mut builder = builder
            .pair_constraint(1, move |a, b| checker.allows(a, b))
            .looped(config.looped);
        if config.unique_chords {
            builder = builder.unique_by(chord_identity);
        }
        if let Some(seed) = config.seed {
            builder = builder.shuffled(seed);
        }

        let limit = config.limit.unwrap_or(usize::MAX);
        let mut ranked: Vec<RankedProgression> = builder
            .sequences()?
            .take(limit)
            .map(|chords| RankedProgression::new(Progression::new(chords), config.looped))
            .collect();
        ranked.sort_by_key(|r| r.distance);

        let stats = checker.stats();
        debug!(
            hits = stats.hits,
            misses = stats.misses,
            cached = checker.cached(),
            "voice-leading cache"
        );
        match ranked.first() {
            Some(best) => info!(
                found = ranked.len(),
                best = best.distance,
                truncated = ranked.len() == limit,
                "search finished"
            ),
            None => warn!("search found no progressions"),
        }
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChordSize;
    use crate::voice_leading::have_large_spacing;
    use musictool_theory::NoteSet;

    fn sc(s: &str) -> SpecificChord {
        s.parse().unwrap()
    }

    fn sn(s: &str) -> SpecificNote {
        s.parse().unwrap()
    }

    fn c_major_range(start: &str, stop: &str) -> NoteRange {
        let noteset: NoteSet = "CDEFGAB".parse().unwrap();
        NoteRange::new(sn(start), sn(stop), noteset).unwrap()
    }

    #[test]
    fn test_voicings_of_one_triad() {
        let c: Chord = "C".parse().unwrap();
        let voicings = scale_voicings(&[c], &c_major_range("C3", "C4"), 3, None).unwrap();
        assert_eq!(voicings, vec![sc("C3_E3_G3/C"), sc("E3_G3_C4/C")]);
    }

    #[test]
    fn test_voicings_cover_chord_tones() {
        let chords: Vec<Chord> = ["C", "Dm", "G7"].iter().map(|s| s.parse().unwrap()).collect();
        let voicings = scale_voicings(&chords, &c_major_range("C3", "C5"), 4, Some(12)).unwrap();
        assert!(!voicings.is_empty());
        for v in &voicings {
            assert_eq!(v.len(), 4);
            let chord = chords.iter().find(|c| Some(c.root) == v.root()).unwrap();
            assert!(v.pitch_classes().same_notes(chord.noteset()));
            assert!(!have_large_spacing(v, 12));
        }
    }

    #[test]
    fn test_too_few_voices() {
        let g7: Chord = "G7".parse().unwrap();
        let voicings = scale_voicings(&[g7], &c_major_range("C3", "C5"), 3, None).unwrap();
        assert!(voicings.is_empty());
    }

    #[test]
    fn test_chord_identity_uses_root_then_spelling() {
        assert_eq!(chord_identity(&sc("E3_G3_C4/C")), chord_identity(&sc("C3_E3_G3")));
        assert_ne!(chord_identity(&sc("C3_D3")), chord_identity(&sc("C3_F3")));
        assert_eq!(chord_identity(&sc("C3_D3")).0, None);
    }

    fn small_config() -> SearchConfig {
        SearchConfig {
            range_start: sn("C3"),
            range_stop: sn("G4"),
            limit: Some(200),
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_run_properties() {
        let search = ProgressionSearch::new(small_config()).unwrap();
        let results = search.run().unwrap();
        assert!(!results.is_empty());

        let fresh = VoiceLeadingChecker::new(search.config().rules.clone());
        for r in &results {
            let chords = r.progression.chords();
            assert_eq!(chords.len(), 4);
            assert_eq!(chords[0].root(), Some(search.config().root));
            for i in 0..chords.len() {
                let next = &chords[(i + 1) % chords.len()];
                assert!(fresh.allows(&chords[i], next), "{}", r.progression);
            }
            let mut roots: Vec<_> = chords.iter().map(|c| c.root()).collect();
            roots.sort();
            roots.dedup();
            assert_eq!(roots.len(), chords.len());
            assert_eq!(r.distance, r.progression.distance(true));
        }
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!(search.checker().stats().hits > 0);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let config = SearchConfig {
            seed: Some(42),
            limit: Some(20),
            ..small_config()
        };
        let a = ProgressionSearch::new(config.clone()).unwrap().run().unwrap();
        let b = ProgressionSearch::new(config).unwrap().run().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_run_from_graph_moves_one_voice() {
        let config = SearchConfig {
            length: 3,
            looped: false,
            chords: ChordSize::Triads,
            ..small_config()
        };
        let search = ProgressionSearch::new(config).unwrap();
        let start = sc("C3_E3_G3/C");
        let results = search.run_from_graph(&start).unwrap();
        assert!(!results.is_empty());
        for r in &results {
            let chords = r.progression.chords();
            assert_eq!(chords[0], start.without_root());
            for w in chords.windows(2) {
                let moved = w[0]
                    .notes()
                    .iter()
                    .zip(w[1].notes())
                    .filter(|(a, b)| a != b)
                    .count();
                assert_eq!(moved, 1);
            }
        }
    }

    #[test]
    fn test_looped_graph_search_closes_with_one_step() {
        let config = SearchConfig {
            unique_chords: false,
            limit: None,
            ..small_config()
        };
        assert!(config.looped);
        let search = ProgressionSearch::new(config.clone()).unwrap();
        let start = sc("C3_E3_G3");
        let results = search.run_from_graph(&start).unwrap();
        assert!(!results.is_empty());

        let graph =
            TransitionGraph::build(&start, &config.graph_range().unwrap(), config.transitions)
                .unwrap();
        for r in &results {
            let chords = r.progression.chords();
            let last = &chords[chords.len() - 1];
            assert!(graph.has_edge(last, &chords[0]), "{}", r.progression);
        }
        // Stepping away and straight back is the cheapest cycle.
        assert_eq!(results[0].distance, 4);
    }

    #[test]
    fn test_limit_keeps_first_found() {
        let unlimited = SearchConfig {
            length: 3,
            limit: None,
            ..small_config()
        };
        let limited = SearchConfig {
            limit: Some(10),
            ..unlimited.clone()
        };
        let all = ProgressionSearch::new(unlimited).unwrap().run().unwrap();
        let some = ProgressionSearch::new(limited).unwrap().run().unwrap();
        assert_eq!(some.len(), 10);
        assert!(all.len() > 10);
        assert!(some.iter().all(|r| all.contains(r)));
        assert!(some.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SearchConfig {
            voices: 0,
            ..SearchConfig::default()
        };
        assert!(ProgressionSearch::new(config).is_err());
    }
}
