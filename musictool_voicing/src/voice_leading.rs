// Voice-leading rules between consecutive chords.
//
// Every check is a pure predicate over two `SpecificChord`s. Voices are
// paired by position in the sorted note list (bass with bass, top with
// top), so chords with different voice counts cannot be compared and every
// predicate reports "no violation" for them.
//
// Checks:
// - Parallel 5ths/8ves: two voices form the interval in both chords while
//   moving in the same direction. Symmetric in argument order.
// - Hidden 5ths/8ves: the outer voices arrive at the interval by similar
//   motion from a different interval, with the top voice leaping. This
//   depends on direction, so swapping the chords changes the answer.
// - Voice crossing: a voice moves past where its neighbour just was.
// - Large leaps: a voice moves further than a limit.
// - Large spacing: adjacent upper voices further apart than a limit (a
//   property of the destination chord alone).
//
// `VoiceLeadingChecker` memoizes the combined verdict. Its key stores both
// chords as offsets from the lowest note of the first chord, so a
// progression and all of its transpositions share cache entries.
//
// Consumed by search.rs as the adjacency constraint of the sequence search.

use musictool_theory::{SpecificChord, SpecificNote};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};

/// Interval class of a perfect fifth.
pub const FIFTH: u8 = 7;
/// Interval class of a unison or any number of octaves.
pub const OCTAVE: u8 = 0;

/// Largest top-voice move (semitones) still counted as a step.
const STEP: i16 = 2;

/// Interval class (0-11) from `low` up to `high`.
fn interval_class(low: SpecificNote, high: SpecificNote) -> u8 {
    (high - low).rem_euclid(12) as u8
}

fn same_direction(a: i16, b: i16) -> bool {
    a != 0 && b != 0 && a.signum() == b.signum()
}

// ── Pairwise predicates ──

/// Two voices hold `interval` (mod 12) in both chords and move the same way.
pub fn parallel_interval(a: &SpecificChord, b: &SpecificChord, interval: u8) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let (from, to) = (a.notes(), b.notes());
    for i in 0..from.len() {
        let move_i = to[i] - from[i];
        for j in (i + 1)..from.len() {
            let move_j = to[j] - from[j];
            if !same_direction(move_i, move_j) {
                continue;
            }
            if interval_class(from[i], from[j]) == interval
                && interval_class(to[i], to[j]) == interval
            {
                return true;
            }
        }
    }
    false
}

pub fn have_parallel_fifths(a: &SpecificChord, b: &SpecificChord) -> bool {
    parallel_interval(a, b, FIFTH)
}

pub fn have_parallel_octaves(a: &SpecificChord, b: &SpecificChord) -> bool {
    parallel_interval(a, b, OCTAVE)
}

/// Outer voices reach `interval` by similar motion with a leap in the top
/// voice, coming from some other interval.
pub fn hidden_parallel(a: &SpecificChord, b: &SpecificChord, interval: u8) -> bool {
    if a.len() != b.len() || a.len() < 2 {
        return false;
    }
    let bass_move = b.lowest() - a.lowest();
    let top_move = b.highest() - a.highest();
    same_direction(bass_move, top_move)
        && top_move.abs() > STEP
        && interval_class(b.lowest(), b.highest()) == interval
        && interval_class(a.lowest(), a.highest()) != interval
}

pub fn have_hidden_fifths(a: &SpecificChord, b: &SpecificChord) -> bool {
    hidden_parallel(a, b, FIFTH)
}

pub fn have_hidden_octaves(a: &SpecificChord, b: &SpecificChord) -> bool {
    hidden_parallel(a, b, OCTAVE)
}

/// A voice in `b` is above the upper neighbour's note in `a`, or below the
/// lower neighbour's.
pub fn have_voice_crossing(a: &SpecificChord, b: &SpecificChord) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let (from, to) = (a.notes(), b.notes());
    (0..from.len().saturating_sub(1)).any(|i| to[i] > from[i + 1] || to[i + 1] < from[i])
}

pub fn have_large_leaps(a: &SpecificChord, b: &SpecificChord, max: u8) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.notes()
        .iter()
        .zip(b.notes())
        .any(|(&from, &to)| (to - from).unsigned_abs() > max as u16)
}

/// Adjacent voices above the bass more than `max` semitones apart. The
/// bass is free to sit further below.
pub fn have_large_spacing(chord: &SpecificChord, max: u8) -> bool {
    chord
        .notes()
        .get(1..)
        .unwrap_or_default()
        .windows(2)
        .any(|w| w[1] - w[0] > max as i16)
}

// ── Rule sets ──

/// Which voice-leading rules a search enforces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceLeadingRules {
    pub forbid_parallel_fifths: bool,
    pub forbid_parallel_octaves: bool,
    pub forbid_hidden_fifths: bool,
    pub forbid_hidden_octaves: bool,
    pub forbid_voice_crossing: bool,
    /// Largest allowed move of a single voice, in semitones.
    pub max_leap: Option<u8>,
    /// Largest allowed gap between adjacent upper voices, in semitones.
    pub max_spacing: Option<u8>,
}

impl Default for VoiceLeadingRules {
    fn default() -> Self {
        VoiceLeadingRules {
            forbid_parallel_fifths: true,
            forbid_parallel_octaves: true,
            forbid_hidden_fifths: true,
            forbid_hidden_octaves: true,
            forbid_voice_crossing: true,
            max_leap: Some(7),
            max_spacing: Some(12),
        }
    }
}

impl VoiceLeadingRules {
    /// No rule enforced.
    pub fn permissive() -> Self {
        VoiceLeadingRules {
            forbid_parallel_fifths: false,
            forbid_parallel_octaves: false,
            forbid_hidden_fifths: false,
            forbid_hidden_octaves: false,
            forbid_voice_crossing: false,
            max_leap: None,
            max_spacing: None,
        }
    }
}

/// A broken rule in the move from one chord to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    ParallelFifths,
    ParallelOctaves,
    HiddenFifths,
    HiddenOctaves,
    VoiceCrossing,
    LargeLeap,
    LargeSpacing,
}

/// Every rule in `rules` that the move `a -> b` breaks.
pub fn violations(a: &SpecificChord, b: &SpecificChord, rules: &VoiceLeadingRules) -> Vec<Violation> {
    let mut out = Vec::new();
    if rules.forbid_parallel_fifths && have_parallel_fifths(a, b) {
        out.push(Violation::ParallelFifths);
    }
    if rules.forbid_parallel_octaves && have_parallel_octaves(a, b) {
        out.push(Violation::ParallelOctaves);
    }
    if rules.forbid_hidden_fifths && have_hidden_fifths(a, b) {
        out.push(Violation::HiddenFifths);
    }
    if rules.forbid_hidden_octaves && have_hidden_octaves(a, b) {
        out.push(Violation::HiddenOctaves);
    }
    if rules.forbid_voice_crossing && have_voice_crossing(a, b) {
        out.push(Violation::VoiceCrossing);
    }
    if rules.max_leap.is_some_and(|max| have_large_leaps(a, b, max)) {
        out.push(Violation::LargeLeap);
    }
    if rules.max_spacing.is_some_and(|max| have_large_spacing(b, max)) {
        out.push(Violation::LargeSpacing);
    }
    out
}

// ── Memoized checker ──

/// A chord pair reduced to its shape: every note as semitones above the
/// lowest note of the first chord. Roots are ignored because no rule looks
/// at them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransitionKey {
    from: Vec<i16>,
    to: Vec<i16>,
}

impl TransitionKey {
    pub fn new(a: &SpecificChord, b: &SpecificChord) -> Self {
        let base = a.lowest();
        let offsets = |c: &SpecificChord| c.notes().iter().map(|&n| n - base).collect();
        TransitionKey {
            from: offsets(a),
            to: offsets(b),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Applies a `VoiceLeadingRules` set with a memo table keyed by
/// `TransitionKey`.
///
/// Interior mutability lets the checker sit behind the `Fn` closures of a
/// `SequenceBuilder`; it is meant for one search thread.
#[derive(Debug)]
pub struct VoiceLeadingChecker {
    rules: VoiceLeadingRules,
    cache: RefCell<FxHashMap<TransitionKey, bool>>,
    stats: Cell<CacheStats>,
}

impl VoiceLeadingChecker {
    pub fn new(rules: VoiceLeadingRules) -> Self {
        VoiceLeadingChecker {
            rules,
            cache: RefCell::new(FxHashMap::default()),
            stats: Cell::new(CacheStats::default()),
        }
    }

    pub fn rules(&self) -> &VoiceLeadingRules {
        &self.rules
    }

    /// True when `a -> b` breaks none of the rules.
    pub fn allows(&self, a: &SpecificChord, b: &SpecificChord) -> bool {
        let key = TransitionKey::new(a, b);
        let mut stats = self.stats.get();

        if let Some(&allowed) = self.cache.borrow().get(&key) {
            stats.hits += 1;
            self.stats.set(stats);
            return allowed;
        }

        let allowed = violations(a, b, &self.rules).is_empty();
        self.cache.borrow_mut().insert(key, allowed);
        stats.misses += 1;
        self.stats.set(stats);
        allowed
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.get()
    }

    /// Number of distinct chord-pair shapes evaluated so far.
    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }
}
