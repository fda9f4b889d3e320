// One-bar rhythms.
//
// A `Rhythm` is a bar divided into `bar_notes` equal positions (a power of
// two), each either a note onset or a rest. Text form uses `x` for notes and
// `.` for rests: `x..x..x.` is the 3-3-2 tresillo on an eighth-note grid.
//
// Syncopation is scored against a metrical hierarchy: the weight of a
// position is the number of trailing zero bits in its index (the downbeat
// gets the maximum, log2(bar_notes)). An onset followed by a rest on a
// stronger position is syncopated by the weight difference. The bar is
// cyclic, so the last position leads into the next downbeat.
//
// `Rhythm::all` enumerates rhythms with `musictool_seq::SequenceBuilder`.

use crate::{Result, TheoryError};
use musictool_seq::{Options, SequenceBuilder};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rhythm {
    notes: Vec<bool>,
}

fn check_bar_notes(bar_notes: usize) -> Result<()> {
    if bar_notes == 0 || !bar_notes.is_power_of_two() {
        return Err(TheoryError::InvalidRhythm(format!(
            "bar must have a power-of-two number of positions, got {bar_notes}"
        )));
    }
    Ok(())
}

impl Rhythm {
    pub fn new(notes: Vec<bool>) -> Result<Self> {
        check_bar_notes(notes.len())?;
        Ok(Rhythm { notes })
    }

    /// Every rhythm with exactly `n_notes` onsets in a bar of `bar_notes`
    /// positions, least syncopated first. With `allow_contiguous == false`
    /// no two onsets are adjacent, counting the wrap into the next bar.
    pub fn all(bar_notes: usize, n_notes: usize, allow_contiguous: bool) -> Result<Vec<Rhythm>> {
        check_bar_notes(bar_notes)?;

        let mut builder = SequenceBuilder::new(bar_notes, Options::Fixed(vec![false, true]))
            .candidate_constraint(move |prefix, &note| {
                let placed = prefix.iter().filter(|&&p| p).count() + usize::from(note);
                let remaining = bar_notes - prefix.len() - 1;
                placed <= n_notes && placed + remaining >= n_notes
            });
        if !allow_contiguous {
            builder = builder
                .pair_constraint(1, |&prev, &curr| !(prev && curr))
                .looped(true);
        }

        let mut rhythms: Vec<Rhythm> = builder
            .sequences()?
            .map(|notes| Rhythm { notes })
            .collect();
        rhythms.sort_by_key(Rhythm::syncopation);
        Ok(rhythms)
    }

    /// A uniformly random rhythm with `n_notes` onsets.
    pub fn random(bar_notes: usize, n_notes: usize, rng: &mut impl Rng) -> Result<Rhythm> {
        check_bar_notes(bar_notes)?;
        if n_notes > bar_notes {
            return Err(TheoryError::InvalidRhythm(format!(
                "{n_notes} notes do not fit in {bar_notes} positions"
            )));
        }
        let mut notes = vec![false; bar_notes];
        for i in rand::seq::index::sample(rng, bar_notes, n_notes) {
            notes[i] = true;
        }
        Ok(Rhythm { notes })
    }

    pub fn bar_notes(&self) -> usize {
        self.notes.len()
    }

    pub fn notes(&self) -> &[bool] {
        &self.notes
    }

    pub fn n_notes(&self) -> usize {
        self.notes.iter().filter(|&&n| n).count()
    }

    /// Two onsets on neighbouring positions, wrapping over the bar line.
    pub fn has_contiguous_notes(&self) -> bool {
        let len = self.notes.len();
        (0..len).any(|i| self.notes[i] && self.notes[(i + 1) % len])
    }

    fn metric_weight(&self, position: usize) -> u32 {
        if position == 0 {
            self.notes.len().trailing_zeros()
        } else {
            position.trailing_zeros()
        }
    }

    pub fn syncopation(&self) -> u32 {
        let len = self.notes.len();
        (0..len)
            .filter(|&i| self.notes[i] && !self.notes[(i + 1) % len])
            .map(|i| {
                let here = self.metric_weight(i);
                let next = self.metric_weight((i + 1) % len);
                next.saturating_sub(here)
            })
            .sum()
    }
}

impl fmt::Display for Rhythm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &note in &self.notes {
            f.write_str(if note { "x" } else { "." })?;
        }
        Ok(())
    }
}

impl FromStr for Rhythm {
    type Err = TheoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let notes = s
            .chars()
            .map(|c| match c {
                'x' => Ok(true),
                '.' => Ok(false),
                _ => Err(TheoryError::InvalidRhythm(format!("unexpected '{c}' in {s}"))),
            })
            .collect::<Result<Vec<bool>>>()?;
        Rhythm::new(notes)
    }
}

impl TryFrom<String> for Rhythm {
    type Error = TheoryError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rhythm> for String {
    fn from(rhythm: Rhythm) -> String {
        rhythm.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn r(s: &str) -> Rhythm {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(r("x..x..x.").n_notes(), 3);
        assert!("x..".parse::<Rhythm>().is_err());
        assert!("x.o.".parse::<Rhythm>().is_err());
        assert!("".parse::<Rhythm>().is_err());
    }

    #[test]
    fn test_syncopation() {
        assert_eq!(r("x...").syncopation(), 0);
        assert_eq!(r("x.x.").syncopation(), 0);
        assert_eq!(r(".x..").syncopation(), 1);
        assert_eq!(r("...x").syncopation(), 2);
        assert_eq!(r("x..x").syncopation(), 0);
        assert!(r("x..x..x.").syncopation() > r("x.x.x.x.").syncopation());
    }

    #[test]
    fn test_contiguous_wraps() {
        assert!(r("xx..").has_contiguous_notes());
        assert!(r("x..x").has_contiguous_notes());
        assert!(!r("x.x.").has_contiguous_notes());
    }

    #[test]
    fn test_all_counts_and_order() {
        // C(8, 3)
        let all = Rhythm::all(8, 3, true).unwrap();
        assert_eq!(all.len(), 56);
        assert!(all.iter().all(|r| r.n_notes() == 3));
        assert!(all.windows(2).all(|w| w[0].syncopation() <= w[1].syncopation()));

        let sparse = Rhythm::all(8, 3, false).unwrap();
        assert!(!sparse.is_empty());
        assert!(sparse.iter().all(|r| !r.has_contiguous_notes()));
        // Cyclic independent sets of size 3 in C8: 8/(8-3) * C(5, 3) = 16
        assert_eq!(sparse.len(), 16);
    }

    #[test]
    fn test_all_rejects_bad_bar() {
        assert!(Rhythm::all(6, 2, true).is_err());
        assert!(Rhythm::all(4, 5, true).unwrap().is_empty());
    }

    #[test]
    fn test_random_is_reproducible() {
        let mut a = StdRng::seed_from_u64(3);
        let mut b = StdRng::seed_from_u64(3);
        let ra = Rhythm::random(16, 5, &mut a).unwrap();
        let rb = Rhythm::random(16, 5, &mut b).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(ra.n_notes(), 5);
        assert!(Rhythm::random(4, 5, &mut a).is_err());
    }
}
