//! Concrete paths into a document.
//!
//! A [`DocPath`] names one node visited during comparison (`$.items[2].id`).
//! Path expressions are matched against it; mismatches report it.

use serde::{Serialize, Serializer};
use std::fmt;

/// One step of a concrete path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Root,
    Field(String),
    Index(usize),
}

/// A concrete, fully-resolved location in a document.
///
/// Paths built from [`DocPath::root`] start with `$`. Paths built from
/// [`DocPath::key`] address a named entry (a header, a query parameter,
/// a metadata key) and have no root marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DocPath {
    segments: Vec<PathSegment>,
}

impl DocPath {
    pub fn root() -> Self {
        DocPath {
            segments: vec![PathSegment::Root],
        }
    }

    pub fn empty() -> Self {
        DocPath::default()
    }

    /// Path naming a single keyed entry.
    pub fn key(name: &str) -> Self {
        DocPath {
            segments: vec![PathSegment::Field(name.to_string())],
        }
    }

    pub fn join(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        DocPath { segments }
    }

    pub fn field(&self, name: &str) -> Self {
        self.join(PathSegment::Field(name.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.join(PathSegment::Index(index))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// First named segment, skipping the root marker.
    pub fn first_key(&self) -> Option<&str> {
        self.segments.iter().find_map(|segment| match segment {
            PathSegment::Field(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '#' | '@'))
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Root => write!(f, "$")?,
                PathSegment::Field(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Field(name) if is_plain_identifier(name) => write!(f, ".{}", name)?,
                PathSegment::Field(name) => write!(f, "['{}']", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl Serialize for DocPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
