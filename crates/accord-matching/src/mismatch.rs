//! Mismatch records produced by every comparison.

use crate::path::DocPath;
use serde::Serialize;
use std::fmt;

/// Which part of an interaction a mismatch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MismatchKind {
    Method,
    Path,
    Query,
    Header,
    Status,
    Body,
    BodyType,
    Metadata,
}

impl MismatchKind {
    pub fn name(&self) -> &'static str {
        match self {
            MismatchKind::Method => "method",
            MismatchKind::Path => "path",
            MismatchKind::Query => "query",
            MismatchKind::Header => "header",
            MismatchKind::Status => "status",
            MismatchKind::Body => "body",
            MismatchKind::BodyType => "body-type",
            MismatchKind::Metadata => "metadata",
        }
    }
}

/// One difference between expected and actual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub path: DocPath,
    pub expected: String,
    pub actual: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl Mismatch {
    pub fn new(
        kind: MismatchKind,
        path: DocPath,
        expected: impl Into<String>,
        actual: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Mismatch {
            kind,
            path,
            expected: expected.into(),
            actual: actual.into(),
            message: message.into(),
            diff: None,
        }
    }

    pub fn with_diff(mut self, diff: impl Into<String>) -> Self {
        self.diff = Some(diff.into());
        self
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "[{}] {}", self.kind.name(), self.message)
        } else {
            write!(f, "[{}] {}: {}", self.kind.name(), self.path, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path() {
        let mismatch = Mismatch::new(
            MismatchKind::Body,
            DocPath::root().field("a"),
            "'x'",
            "5",
            "Expected 5 (Integer) to be the same type as 'x' (String)",
        );
        assert_eq!(
            mismatch.to_string(),
            "[body] $.a: Expected 5 (Integer) to be the same type as 'x' (String)"
        );
    }

    #[test]
    fn test_serializes_path_as_string() {
        let mismatch = Mismatch::new(
            MismatchKind::BodyType,
            DocPath::root(),
            "application/json",
            "text/plain",
            "body type differs",
        )
        .with_diff("-a\n+b");
        let json = serde_json::to_value(&mismatch).unwrap();
        assert_eq!(json["path"], "$");
        assert_eq!(json["kind"], "body-type");
        assert_eq!(json["diff"], "-a\n+b");
    }
}
