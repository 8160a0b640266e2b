//! Minimal-mismatch alignment of unordered arrays.
//!
//! Expected elements are visited in order. Each one is paired with one of
//! the still-available actual elements, or, when there are fewer actual
//! elements left than expected ones, left unmatched at a cost of one. The
//! search minimises the summed mismatch count and memoises sub-problems by
//! `(expected index, available actual set)`.

use super::combination::IndicesCombination;
use super::tracker::LargestKeyValue;
use crate::mismatch::Mismatch;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::trace;

/// Default largest actual array aligned ignoring order. The search grows
/// exponentially with the actual length; past roughly 18 elements a single
/// alignment takes seconds.
pub const DEFAULT_MAX_UNORDERED_ELEMENTS: usize = 16;

/// Cost of leaving an expected element without a partner.
const MISSING_COST: usize = 1;

/// The chosen pairing of expected to actual elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    /// `(expected index, actual index)` pairs, by expected index.
    pub pairs: Vec<(usize, usize)>,
    pub missing_expected: Vec<usize>,
    pub unmatched_actual: Vec<usize>,
    /// Mismatches of the chosen pairs, in pair order.
    pub mismatches: Vec<Mismatch>,
}

impl Alignment {
    /// Total cost of the alignment.
    pub fn cost(&self) -> usize {
        self.mismatches.len() + self.missing_expected.len() * MISSING_COST
    }
}

/// Per-call search state. Dropped when the alignment is returned.
struct AlignmentSolver<F> {
    expected_len: usize,
    actual_len: usize,
    compare: F,
    pair_cache: Vec<Option<Vec<Mismatch>>>,
    cost_cache: HashMap<(usize, u64), usize>,
}

impl<F> AlignmentSolver<F>
where
    F: FnMut(usize, usize) -> Vec<Mismatch>,
{
    fn pair_mismatches(&mut self, expected: usize, actual: usize) -> &[Mismatch] {
        let slot = expected * self.actual_len + actual;
        if self.pair_cache[slot].is_none() {
            let mismatches = (self.compare)(expected, actual);
            trace!(
                "Expected element {} vs actual element {}: {} mismatch(es)",
                expected,
                actual,
                mismatches.len()
            );
            self.pair_cache[slot] = Some(mismatches);
        }
        self.pair_cache[slot].as_deref().unwrap_or_default()
    }

    fn pair_cost(&mut self, expected: usize, actual: usize) -> usize {
        self.pair_mismatches(expected, actual).len()
    }

    fn may_skip(&self, expected: usize, available: IndicesCombination) -> bool {
        available.len() < self.expected_len - expected
    }

    fn min_cost(&mut self, expected: usize, available: IndicesCombination) -> usize {
        if expected == self.expected_len {
            return 0;
        }
        if let Some(&cost) = self.cost_cache.get(&(expected, available.bits())) {
            return cost;
        }

        let mut best = usize::MAX;
        if self.may_skip(expected, available) {
            best = MISSING_COST + self.min_cost(expected + 1, available);
        }
        for actual in available.indices() {
            if best == 0 {
                break;
            }
            let cost = self.pair_cost(expected, actual);
            if cost >= best {
                continue;
            }
            let total = cost + self.min_cost(expected + 1, available - actual);
            best = best.min(total);
        }

        self.cost_cache.insert((expected, available.bits()), best);
        best
    }

    fn solve(mut self) -> Alignment {
        let mut available = IndicesCombination::of(self.actual_len).unwrap_or_default();
        let mut alignment = Alignment::default();

        for expected in 0..self.expected_len {
            let mut best: LargestKeyValue<Reverse<usize>, Option<usize>> = LargestKeyValue::new();
            for actual in available.indices() {
                let total = self.pair_cost(expected, actual)
                    + self.min_cost(expected + 1, available - actual);
                best.use_if_larger(Reverse(total), Some(actual));
                if total == 0 {
                    break;
                }
            }
            if self.may_skip(expected, available) {
                let total = MISSING_COST + self.min_cost(expected + 1, available);
                best.use_if_larger(Reverse(total), None);
            }

            match best.into_inner() {
                Some((_, Some(actual))) => {
                    let mismatches = self.pair_mismatches(expected, actual).to_vec();
                    alignment.mismatches.extend(mismatches);
                    alignment.pairs.push((expected, actual));
                    available = available - actual;
                }
                _ => alignment.missing_expected.push(expected),
            }
        }

        alignment.unmatched_actual = available.indices().collect();
        trace!(
            "Aligned {} expected against {} actual element(s) with {} memoised state(s)",
            self.expected_len,
            self.actual_len,
            self.cost_cache.len()
        );
        alignment
    }
}

/// Align `expected_len` expected elements against `actual_len` actual ones.
///
/// `compare(e, a)` returns the mismatches of expected element `e` against
/// actual element `a`; it is called at most once per pair. Returns `None`
/// when `actual_len` exceeds [`super::MAX_COMBINATION_SIZE`].
pub fn align<F>(expected_len: usize, actual_len: usize, compare: F) -> Option<Alignment>
where
    F: FnMut(usize, usize) -> Vec<Mismatch>,
{
    IndicesCombination::of(actual_len)?;
    let solver = AlignmentSolver {
        expected_len,
        actual_len,
        compare,
        pair_cache: vec![None; expected_len * actual_len],
        cost_cache: HashMap::new(),
    };
    Some(solver.solve())
}
