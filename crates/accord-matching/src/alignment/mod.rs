//! Array alignment: index-set bitsets, the best-candidate tracker, the
//! memoised solver and list padding.

mod combination;
mod padding;
mod solver;
mod tracker;

pub use combination::{IndicesCombination, MAX_COMBINATION_SIZE};
pub use padding::pad_to;
pub use solver::{align, Alignment, DEFAULT_MAX_UNORDERED_ELEMENTS};
pub use tracker::LargestKeyValue;
