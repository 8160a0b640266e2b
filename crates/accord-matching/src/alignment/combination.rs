//! Compact index subsets.

use std::ops::Sub;

/// Largest index set an [`IndicesCombination`] can encode.
pub const MAX_COMBINATION_SIZE: usize = 64;

/// A subset of `[0, n)` encoded as a 64-bit set.
///
/// Bit `i` set means index `i` is in the set. `0` is the empty set and
/// `2^n - 1` the full set of `n` indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IndicesCombination {
    bits: u64,
}

impl IndicesCombination {
    /// Full set `[0, n)`, or `None` when `n` exceeds [`MAX_COMBINATION_SIZE`].
    pub fn of(n: usize) -> Option<Self> {
        match n {
            0 => Some(IndicesCombination::empty()),
            MAX_COMBINATION_SIZE => Some(IndicesCombination { bits: u64::MAX }),
            n if n < MAX_COMBINATION_SIZE => Some(IndicesCombination {
                bits: (1u64 << n) - 1,
            }),
            _ => None,
        }
    }

    pub fn empty() -> Self {
        IndicesCombination { bits: 0 }
    }

    pub fn from_bits(bits: u64) -> Self {
        IndicesCombination { bits }
    }

    /// The encoded set; stable across equal sets, usable as a memo key.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn contains(&self, index: usize) -> bool {
        index < MAX_COMBINATION_SIZE && self.bits & (1u64 << index) != 0
    }

    /// The set without `index`. Removing an absent index is a no-op.
    pub fn remove(self, index: usize) -> Self {
        if index >= MAX_COMBINATION_SIZE {
            return self;
        }
        IndicesCombination {
            bits: self.bits & !(1u64 << index),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Members in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let mut remaining = self.bits;
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let index = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            Some(index)
        })
    }
}

impl Sub<usize> for IndicesCombination {
    type Output = IndicesCombination;

    fn sub(self, index: usize) -> Self::Output {
        self.remove(index)
    }
}
