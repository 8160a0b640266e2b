//! Path expressions and concrete document paths.

mod doc_path;
mod expression;

pub use doc_path::{DocPath, PathSegment};
pub use expression::{PathExpression, PathToken, Specificity};
