//! Matching rule kinds.

use super::category::MatchingRuleCategory;
use crate::error::ParseError;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Numeric classification checked by [`MatchingRule::NumberType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Number,
    Integer,
    Decimal,
}

impl NumberKind {
    pub fn name(&self) -> &'static str {
        match self {
            NumberKind::Number => "number",
            NumberKind::Integer => "integer",
            NumberKind::Decimal => "decimal",
        }
    }
}

/// Which temporal value a [`MatchingRule::DateTime`] format describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    Time,
    DateTime,
}

impl TemporalKind {
    /// Format used when a rule does not declare one.
    pub fn default_format(&self) -> &'static str {
        match self {
            TemporalKind::Date => "yyyy-MM-dd",
            TemporalKind::Time => "HH:mm:ss",
            TemporalKind::DateTime => "yyyy-MM-dd'T'HH:mm:ss",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TemporalKind::Date => "date",
            TemporalKind::Time => "time",
            TemporalKind::DateTime => "timestamp",
        }
    }
}

/// HTTP status classes accepted by [`MatchingRule::StatusCode`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Information,
    Success,
    Redirect,
    ClientError,
    ServerError,
    NonError,
    Error,
    Codes(Vec<u16>),
}

impl StatusClass {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "info" | "information" => Some(StatusClass::Information),
            "success" => Some(StatusClass::Success),
            "redirect" => Some(StatusClass::Redirect),
            "clientError" | "client-error" => Some(StatusClass::ClientError),
            "serverError" | "server-error" => Some(StatusClass::ServerError),
            "nonError" | "non-error" => Some(StatusClass::NonError),
            "error" => Some(StatusClass::Error),
            _ => None,
        }
    }

    pub fn accepts(&self, status: u16) -> bool {
        match self {
            StatusClass::Information => (100..200).contains(&status),
            StatusClass::Success => (200..300).contains(&status),
            StatusClass::Redirect => (300..400).contains(&status),
            StatusClass::ClientError => (400..500).contains(&status),
            StatusClass::ServerError => (500..600).contains(&status),
            StatusClass::NonError => (100..400).contains(&status),
            StatusClass::Error => (400..600).contains(&status),
            StatusClass::Codes(codes) => codes.contains(&status),
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusClass::Information => write!(f, "an information status (1xx)"),
            StatusClass::Success => write!(f, "a success status (2xx)"),
            StatusClass::Redirect => write!(f, "a redirect status (3xx)"),
            StatusClass::ClientError => write!(f, "a client error status (4xx)"),
            StatusClass::ServerError => write!(f, "a server error status (5xx)"),
            StatusClass::NonError => write!(f, "a non-error status (1xx-3xx)"),
            StatusClass::Error => write!(f, "an error status (4xx-5xx)"),
            StatusClass::Codes(codes) => write!(f, "one of the status codes {:?}", codes),
        }
    }
}

/// A regex compiled once at load time.
///
/// The pattern must match the whole value, so it is compiled anchored.
/// Equality compares the source pattern.
#[derive(Debug, Clone)]
pub struct RegexRule {
    pattern: String,
    regex: Arc<Regex>,
}

impl RegexRule {
    pub fn new(pattern: &str) -> Result<Self, ParseError> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            ParseError::InvalidRegex {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(RegexRule {
            pattern: pattern.to_string(),
            regex: Arc::new(regex),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_full_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for RegexRule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

/// One template of an [`MatchingRule::ArrayContains`] rule.
///
/// `index` points into the expected array; `rules` are rooted at the
/// element (`$` is the element itself).
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayVariant {
    pub index: usize,
    pub rules: MatchingRuleCategory,
}

/// A single matching rule.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchingRule {
    Equality,
    Type,
    Regex(RegexRule),
    Include(String),
    NumberType(NumberKind),
    MinMaxLength {
        min: Option<usize>,
        max: Option<usize>,
    },
    DateTime {
        kind: TemporalKind,
        format: String,
    },
    EachKey(Vec<MatchingRule>),
    EachValue(Vec<MatchingRule>),
    ArrayContains(Vec<ArrayVariant>),
    Values,
    Null,
    Boolean,
    NotEmpty,
    Semver,
    EqualsIgnoreOrder {
        min: Option<usize>,
        max: Option<usize>,
    },
    StatusCode(StatusClass),
    /// A kind this engine does not implement. Always passes.
    Unknown(String),
}

impl MatchingRule {
    pub fn regex(pattern: &str) -> Result<Self, ParseError> {
        RegexRule::new(pattern).map(MatchingRule::Regex)
    }

    pub fn min(min: usize) -> Self {
        MatchingRule::MinMaxLength {
            min: Some(min),
            max: None,
        }
    }

    pub fn max(max: usize) -> Self {
        MatchingRule::MinMaxLength {
            min: None,
            max: Some(max),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MatchingRule::Equality => "equality",
            MatchingRule::Type => "type",
            MatchingRule::Regex(_) => "regex",
            MatchingRule::Include(_) => "include",
            MatchingRule::NumberType(kind) => kind.name(),
            MatchingRule::MinMaxLength { .. } => "min-max",
            MatchingRule::DateTime { kind, .. } => kind.name(),
            MatchingRule::EachKey(_) => "each-key",
            MatchingRule::EachValue(_) => "each-value",
            MatchingRule::ArrayContains(_) => "array-contains",
            MatchingRule::Values => "values",
            MatchingRule::Null => "null",
            MatchingRule::Boolean => "boolean",
            MatchingRule::NotEmpty => "not-empty",
            MatchingRule::Semver => "semver",
            MatchingRule::EqualsIgnoreOrder { .. } => "ignore-order",
            MatchingRule::StatusCode(_) => "status-code",
            MatchingRule::Unknown(name) => name,
        }
    }

    /// Rules that shape how a collection is walked rather than judging a
    /// single value. They only apply at the path they are declared on.
    pub fn is_collection_rule(&self) -> bool {
        matches!(
            self,
            MatchingRule::EachKey(_)
                | MatchingRule::EachValue(_)
                | MatchingRule::ArrayContains(_)
                | MatchingRule::Values
                | MatchingRule::EqualsIgnoreOrder { .. }
        )
    }

    /// Whether the rule still applies when inherited from an ancestor path.
    pub fn cascades(&self) -> bool {
        !self.is_collection_rule()
    }

    pub fn is_type_rule(&self) -> bool {
        matches!(
            self,
            MatchingRule::Type | MatchingRule::MinMaxLength { .. } | MatchingRule::NotEmpty
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_is_anchored() {
        let rule = RegexRule::new("\\d+").unwrap();
        assert!(rule.is_full_match("123"));
        assert!(!rule.is_full_match("a123"));
        assert!(!rule.is_full_match("123b"));
    }

    #[test]
    fn test_regex_alternation_is_anchored_as_a_whole() {
        let rule = RegexRule::new("red|green").unwrap();
        assert!(rule.is_full_match("green"));
        assert!(!rule.is_full_match("greenish"));
    }

    #[test]
    fn test_invalid_regex_is_parse_error() {
        let err = MatchingRule::regex("(").unwrap_err();
        assert!(matches!(err, ParseError::InvalidRegex { .. }));
    }

    #[test]
    fn test_regex_equality_by_pattern() {
        assert_eq!(
            MatchingRule::regex("a+").unwrap(),
            MatchingRule::regex("a+").unwrap()
        );
    }

    #[test]
    fn test_status_classes() {
        assert!(StatusClass::Success.accepts(204));
        assert!(!StatusClass::Success.accepts(301));
        assert!(StatusClass::NonError.accepts(302));
        assert!(StatusClass::Error.accepts(503));
        assert!(StatusClass::Codes(vec![200, 201]).accepts(201));
        assert_eq!(StatusClass::from_name("clientError"), Some(StatusClass::ClientError));
        assert_eq!(StatusClass::from_name("teapot"), None);
    }

    #[test]
    fn test_collection_rules_do_not_cascade() {
        assert!(!MatchingRule::Values.cascades());
        assert!(!MatchingRule::EachValue(vec![MatchingRule::Type]).cascades());
        assert!(MatchingRule::Type.cascades());
        assert!(MatchingRule::min(1).is_type_rule());
    }
}
