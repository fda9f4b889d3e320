// Constrained sequence generation by depth-first backtracking.
//
// `SequenceBuilder` describes a search space of fixed-length sequences:
// which options are available at each position, which pairs of elements may
// sit a given distance apart, which values are allowed at specific
// positions, and an optional global acceptance test that sees the whole
// prefix. `SequenceBuilder::sequences()` walks that space lazily and yields
// every sequence that satisfies all of the constraints.
//
// The walk uses an explicit stack of per-position candidate iterators rather
// than recursion, so a consumer can stop after the first few results without
// paying for the rest. A candidate is checked against the constraints the
// moment it is proposed, which prunes whole subtrees early. When the builder
// is looped, the sequence is treated as a cycle and the pairwise constraints
// are also checked across the wraparound once the last element is placed.
//
// Used by `musictool_theory` (rhythm enumeration) and `musictool_voicing`
// (chord progression search).

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

/// Errors raised when a builder describes an unusable search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("sequence length must be at least 1")]
    ZeroLength,
    #[error("prefix has {prefix} elements but sequences are only {n} long")]
    PrefixTooLong { prefix: usize, n: usize },
    #[error("expected {expected} per-step domains, got {got}")]
    DomainCount { expected: usize, got: usize },
    #[error("prefix element at position {position} violates a constraint")]
    InvalidPrefix { position: usize },
}

pub type Result<T> = std::result::Result<T, SequenceError>;

type PairFn<'a, T> = Box<dyn Fn(&T, &T) -> bool + 'a>;
type ItemFn<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;
type CandidateFn<'a, T> = Box<dyn Fn(&[T], &T) -> bool + 'a>;
type NextFn<'a, T> = Box<dyn Fn(&T) -> Vec<T> + 'a>;

/// Where the candidates for each position come from.
pub enum Options<'a, T> {
    /// The same options at every position.
    Fixed(Vec<T>),
    /// One domain per position. Must have exactly `n` entries.
    PerStep(Vec<Vec<T>>),
    /// `first` seeds position 0; every later position asks `next` for the
    /// successors of the element placed just before it.
    FromPrevious { first: Vec<T>, next: NextFn<'a, T> },
}

impl<'a, T> Options<'a, T> {
    pub fn from_previous(first: Vec<T>, next: impl Fn(&T) -> Vec<T> + 'a) -> Self {
        Options::FromPrevious {
            first,
            next: Box::new(next),
        }
    }
}

/// Description of a constrained sequence search.
///
/// Constraints are added with the consuming builder methods and the search is
/// started with [`SequenceBuilder::sequences`]:
///
/// ```
/// use musictool_seq::{Options, SequenceBuilder};
///
/// let builder = SequenceBuilder::new(3, Options::Fixed(vec![0, 1, 2]))
///     .pair_constraint(1, |prev, curr| prev != curr)
///     .looped(true);
/// let all: Vec<Vec<i32>> = builder.sequences().unwrap().collect();
/// assert_eq!(all.len(), 6);
/// ```
pub struct SequenceBuilder<'a, T> {
    n: usize,
    options: Options<'a, T>,
    /// Keyed by distance: `f(seq[i - distance], seq[i])`.
    pair_constraints: BTreeMap<usize, Vec<PairFn<'a, T>>>,
    position_constraints: BTreeMap<usize, Vec<ItemFn<'a, T>>>,
    candidate_constraints: Vec<CandidateFn<'a, T>>,
    /// Returns true when two elements share a uniqueness key.
    same_key: Option<PairFn<'a, T>>,
    looped: bool,
    prefix: Vec<T>,
    seed: Option<u64>,
}

impl<'a, T: Clone + 'a> SequenceBuilder<'a, T> {
    pub fn new(n: usize, options: Options<'a, T>) -> Self {
        SequenceBuilder {
            n,
            options,
            pair_constraints: BTreeMap::new(),
            position_constraints: BTreeMap::new(),
            candidate_constraints: Vec::new(),
            same_key: None,
            looped: false,
            prefix: Vec::new(),
            seed: None,
        }
    }

    /// Length of the generated sequences.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Require `f(previous, current)` for every pair of elements `distance`
    /// positions apart (`distance == 1` means adjacent).
    ///
    /// Panics if `distance` is zero.
    pub fn pair_constraint(mut self, distance: usize, f: impl Fn(&T, &T) -> bool + 'a) -> Self {
        assert!(distance >= 1, "pair_constraint: distance must be at least 1");
        self.pair_constraints
            .entry(distance)
            .or_default()
            .push(Box::new(f));
        self
    }

    /// Require `f(element)` for the element at `position`.
    pub fn position_constraint(mut self, position: usize, f: impl Fn(&T) -> bool + 'a) -> Self {
        self.position_constraints
            .entry(position)
            .or_default()
            .push(Box::new(f));
        self
    }

    /// Require `f(prefix, candidate)` for every candidate, where `prefix`
    /// holds everything placed before it.
    pub fn candidate_constraint(mut self, f: impl Fn(&[T], &T) -> bool + 'a) -> Self {
        self.candidate_constraints.push(Box::new(f));
        self
    }

    /// Forbid two elements with equal `key` in the same sequence.
    pub fn unique_by<K: PartialEq + 'a>(mut self, key: impl Fn(&T) -> K + 'a) -> Self {
        self.same_key = Some(Box::new(move |a, b| key(a) == key(b)));
        self
    }

    /// Forbid repeated elements.
    pub fn unique(self) -> Self
    where
        T: PartialEq,
    {
        self.unique_by(|x: &T| x.clone())
    }

    /// Treat sequences as cycles: the pairwise constraints must also hold
    /// across the end-to-start boundary.
    pub fn looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    /// Fix the first elements of every sequence.
    pub fn prefix(mut self, prefix: Vec<T>) -> Self {
        self.prefix = prefix;
        self
    }

    /// Shuffle every domain with an RNG seeded from `seed` before exploring
    /// it. The same seed always produces the same order.
    pub fn shuffled(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Start the search. Fails if the builder itself is inconsistent; an
    /// empty search space is not an error and simply yields nothing.
    pub fn sequences(&self) -> Result<Sequences<'_, 'a, T>> {
        if self.n == 0 {
            return Err(SequenceError::ZeroLength);
        }
        if self.prefix.len() > self.n {
            return Err(SequenceError::PrefixTooLong {
                prefix: self.prefix.len(),
                n: self.n,
            });
        }
        if let Options::PerStep(steps) = &self.options {
            if steps.len() != self.n {
                return Err(SequenceError::DomainCount {
                    expected: self.n,
                    got: steps.len(),
                });
            }
        }
        for position in 0..self.prefix.len() {
            if !self.accepts(&self.prefix[..position], &self.prefix[position]) {
                return Err(SequenceError::InvalidPrefix { position });
            }
        }

        let mut sequences = Sequences {
            builder: self,
            current: self.prefix.clone(),
            frames: Vec::new(),
            rng: self.seed.map(StdRng::seed_from_u64),
            finished: false,
        };
        if sequences.current.len() < self.n {
            let domain = sequences.next_domain();
            sequences.frames.push(domain);
        }
        Ok(sequences)
    }

    /// Can `candidate` be appended to `prefix`?
    fn accepts(&self, prefix: &[T], candidate: &T) -> bool {
        let position = prefix.len();

        if let Some(checks) = self.position_constraints.get(&position) {
            if !checks.iter().all(|f| f(candidate)) {
                return false;
            }
        }

        if let Some(same) = &self.same_key {
            if prefix.iter().any(|placed| same(placed, candidate)) {
                return false;
            }
        }

        for (&distance, checks) in &self.pair_constraints {
            if distance > position {
                break;
            }
            let previous = &prefix[position - distance];
            if !checks.iter().all(|f| f(previous, candidate)) {
                return false;
            }
        }

        self.candidate_constraints.iter().all(|f| f(prefix, candidate))
    }

    /// Wraparound check for a complete sequence.
    fn closes_loop(&self, sequence: &[T]) -> bool {
        if !self.looped {
            return true;
        }
        let n = sequence.len();
        self.pair_constraints
            .iter()
            .filter(|&(&distance, _)| distance < n)
            .all(|(&distance, checks)| {
                (0..distance).all(|i| {
                    let previous = &sequence[n - distance + i];
                    let current = &sequence[i];
                    checks.iter().all(|f| f(previous, current))
                })
            })
    }
}

/// Lazy iterator over every sequence a [`SequenceBuilder`] accepts.
///
/// `frames[d]` holds the untried candidates for position `prefix_len + d`;
/// `current` always holds the elements chosen for the positions below the
/// top frame.
pub struct Sequences<'b, 'a, T> {
    builder: &'b SequenceBuilder<'a, T>,
    current: Vec<T>,
    frames: Vec<std::vec::IntoIter<T>>,
    rng: Option<StdRng>,
    finished: bool,
}

impl<'a, T: Clone + 'a> Sequences<'_, 'a, T> {
    fn next_domain(&mut self) -> std::vec::IntoIter<T> {
        let position = self.current.len();
        let mut domain = match &self.builder.options {
            Options::Fixed(options) => options.clone(),
            Options::PerStep(steps) => steps[position].clone(),
            Options::FromPrevious { first, next } => match self.current.last() {
                Some(previous) => next(previous),
                None => first.clone(),
            },
        };
        if let Some(rng) = self.rng.as_mut() {
            domain.shuffle(rng);
        }
        domain.into_iter()
    }
}

impl<'a, T: Clone + 'a> Iterator for Sequences<'_, 'a, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        if self.finished {
            return None;
        }

        // The prefix already fills the whole sequence.
        if self.frames.is_empty() {
            self.finished = true;
            return self
                .builder
                .closes_loop(&self.current)
                .then(|| self.current.clone());
        }

        loop {
            let candidate = match self.frames.last_mut().and_then(|frame| frame.next()) {
                Some(candidate) => candidate,
                None => {
                    self.frames.pop();
                    if self.frames.is_empty() {
                        self.finished = true;
                        return None;
                    }
                    self.current.pop();
                    continue;
                }
            };

            if !self.builder.accepts(&self.current, &candidate) {
                continue;
            }
            self.current.push(candidate);

            if self.current.len() == self.builder.n {
                let closed = self.builder.closes_loop(&self.current);
                let complete = closed.then(|| self.current.clone());
                self.current.pop();
                if complete.is_some() {
                    return complete;
                }
            } else {
                let domain = self.next_domain();
                self.frames.push(domain);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<T: Clone>(builder: &SequenceBuilder<'_, T>) -> Vec<Vec<T>> {
        builder.sequences().unwrap().collect()
    }

    #[test]
    fn test_unconstrained_is_cartesian_product_in_order() {
        let builder = SequenceBuilder::new(3, Options::Fixed(vec![0, 1]));
        let all = collect(&builder);
        assert_eq!(all.len(), 8);
        assert_eq!(all[0], vec![0, 0, 0]);
        assert_eq!(all[1], vec![0, 0, 1]);
        assert_eq!(all[7], vec![1, 1, 1]);
    }

    #[test]
    fn test_adjacent_constraint_and_loop() {
        let open = SequenceBuilder::new(3, Options::Fixed(vec![0, 1, 2]))
            .pair_constraint(1, |a, b| a != b);
        // 3 * 2 * 2
        assert_eq!(collect(&open).len(), 12);

        let looped = SequenceBuilder::new(3, Options::Fixed(vec![0, 1, 2]))
            .pair_constraint(1, |a, b| a != b)
            .looped(true);
        let all = collect(&looped);
        assert_eq!(all.len(), 6);
        for seq in &all {
            assert_ne!(seq[2], seq[0], "wraparound pair violated in {seq:?}");
        }
    }

    #[test]
    fn test_distance_two_constraint() {
        let builder = SequenceBuilder::new(4, Options::Fixed(vec![0, 1]))
            .pair_constraint(2, |a, b| a != b);
        for seq in collect(&builder) {
            assert_ne!(seq[0], seq[2]);
            assert_ne!(seq[1], seq[3]);
        }
        assert_eq!(collect(&builder).len(), 4);
    }

    #[test]
    fn test_looped_distance_two_checks_both_wraparound_pairs() {
        let builder = SequenceBuilder::new(4, Options::Fixed(vec![0, 1, 2]))
            .pair_constraint(2, |a, b| a != b)
            .looped(true);
        for seq in collect(&builder) {
            assert_ne!(seq[2], seq[0]);
            assert_ne!(seq[3], seq[1]);
        }
    }

    #[test]
    fn test_unique_permutations() {
        let builder = SequenceBuilder::new(3, Options::Fixed(vec![1, 2, 3, 4])).unique();
        let all = collect(&builder);
        assert_eq!(all.len(), 24);
        for seq in &all {
            let mut sorted = seq.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), 3);
        }
    }

    #[test]
    fn test_unique_by_key() {
        // Key is parity: at most one even and one odd number.
        let builder = SequenceBuilder::new(2, Options::Fixed(vec![1, 2, 3, 4]))
            .unique_by(|x: &i32| x % 2);
        let all = collect(&builder);
        assert_eq!(all.len(), 8);
        assert!(all.iter().all(|s| s[0] % 2 != s[1] % 2));
    }

    #[test]
    fn test_position_constraint() {
        let builder = SequenceBuilder::new(2, Options::Fixed(vec![0, 1, 2]))
            .position_constraint(0, |x| *x == 2)
            .position_constraint(1, |x| *x != 2);
        assert_eq!(collect(&builder), vec![vec![2, 0], vec![2, 1]]);
    }

    #[test]
    fn test_candidate_constraint_sees_prefix() {
        let builder = SequenceBuilder::new(3, Options::Fixed(vec![0, 1, 2]))
            .candidate_constraint(|prefix, c| prefix.iter().sum::<i32>() + c <= 2);
        for seq in collect(&builder) {
            assert!(seq.iter().sum::<i32>() <= 2);
        }
        assert_eq!(collect(&builder).len(), 10);
    }

    #[test]
    fn test_per_step_domains() {
        let builder = SequenceBuilder::new(
            2,
            Options::PerStep(vec![vec!['a', 'b'], vec!['x']]),
        );
        assert_eq!(collect(&builder), vec![vec!['a', 'x'], vec!['b', 'x']]);
    }

    #[test]
    fn test_per_step_domain_count_mismatch() {
        let builder = SequenceBuilder::new(3, Options::PerStep(vec![vec![1], vec![2]]));
        assert_eq!(
            builder.sequences().err(),
            Some(SequenceError::DomainCount { expected: 3, got: 2 })
        );
    }

    #[test]
    fn test_from_previous_domain() {
        let builder = SequenceBuilder::new(
            3,
            Options::from_previous(vec![0], |x: &i32| vec![x + 1, x + 2]),
        );
        assert_eq!(
            collect(&builder),
            vec![vec![0, 1, 2], vec![0, 1, 3], vec![0, 2, 3], vec![0, 2, 4]]
        );
    }

    #[test]
    fn test_prefix() {
        let builder = SequenceBuilder::new(3, Options::Fixed(vec![0, 1]))
            .pair_constraint(1, |a, b| a != b)
            .prefix(vec![1]);
        assert_eq!(collect(&builder), vec![vec![1, 0, 1]]);
    }

    #[test]
    fn test_full_prefix_yields_itself_once() {
        let builder = SequenceBuilder::new(2, Options::Fixed(vec![0, 1])).prefix(vec![0, 1]);
        assert_eq!(collect(&builder), vec![vec![0, 1]]);

        let closed = SequenceBuilder::new(2, Options::Fixed(vec![0, 1]))
            .pair_constraint(1, |a, b| a < b)
            .looped(true)
            .prefix(vec![0, 1]);
        assert!(collect(&closed).is_empty());
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let builder = SequenceBuilder::new(3, Options::Fixed(vec![0, 1]))
            .pair_constraint(1, |a, b| a != b)
            .prefix(vec![1, 1]);
        assert_eq!(
            builder.sequences().err(),
            Some(SequenceError::InvalidPrefix { position: 1 })
        );
    }

    #[test]
    fn test_length_errors() {
        let empty = SequenceBuilder::new(0, Options::Fixed(vec![1]));
        assert_eq!(empty.sequences().err(), Some(SequenceError::ZeroLength));

        let long = SequenceBuilder::new(1, Options::Fixed(vec![1])).prefix(vec![1, 1]);
        assert_eq!(
            long.sequences().err(),
            Some(SequenceError::PrefixTooLong { prefix: 2, n: 1 })
        );
    }

    #[test]
    fn test_empty_domain_yields_nothing() {
        let builder: SequenceBuilder<'_, i32> = SequenceBuilder::new(2, Options::Fixed(vec![]));
        assert!(collect(&builder).is_empty());
    }

    #[test]
    fn test_shuffled_is_deterministic_and_complete() {
        let make = |seed| {
            SequenceBuilder::new(3, Options::Fixed(vec![0, 1, 2, 3]))
                .unique()
                .shuffled(seed)
        };
        let a = collect(&make(7));
        let b = collect(&make(7));
        assert_eq!(a, b);

        let mut shuffled = a.clone();
        shuffled.sort();
        let mut ordered = collect(&SequenceBuilder::new(3, Options::Fixed(vec![0, 1, 2, 3])).unique());
        ordered.sort();
        assert_eq!(shuffled, ordered);
    }

    #[test]
    fn test_lazy_take_does_not_exhaust() {
        let builder = SequenceBuilder::new(12, Options::Fixed((0..10).collect::<Vec<u32>>()));
        let first: Vec<Vec<u32>> = builder.sequences().unwrap().take(2).collect();
        assert_eq!(first[0], vec![0; 12]);
        assert_eq!(first[1][11], 1);
    }
}
