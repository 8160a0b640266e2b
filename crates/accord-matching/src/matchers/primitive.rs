//! Single-value matcher implementations.
//!
//! Each function returns the mismatches for one rule applied to one node;
//! an empty vector means the rule passed.

use super::temporal::parse_temporal;
use super::value::{is_collection, json_equals, length, shape, string_form, type_of, value_of};
use super::NodeContext;
use crate::mismatch::Mismatch;
use crate::rules::{NumberKind, RegexRule, StatusClass, TemporalKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static INTEGER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^-?\d+$").ok());
static DECIMAL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^-?\d+\.\d*$").ok());
static SEMVER: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    )
    .ok()
});

fn is_match(regex: &Lazy<Option<Regex>>, value: &str) -> bool {
    regex.as_ref().is_some_and(|regex| regex.is_match(value))
}

pub fn equality(node: &NodeContext<'_>, expected: &Value, actual: &Value) -> Vec<Mismatch> {
    if json_equals(expected, actual) {
        return Vec::new();
    }
    vec![node.mismatch(
        expected,
        actual,
        format!(
            "Expected {} ({}) to be equal to {} ({})",
            value_of(actual),
            type_of(actual),
            value_of(expected),
            type_of(expected)
        ),
    )]
}

pub fn same_type(node: &NodeContext<'_>, expected: &Value, actual: &Value) -> Vec<Mismatch> {
    if shape(expected) == shape(actual) {
        return Vec::new();
    }
    vec![node.mismatch(
        expected,
        actual,
        format!(
            "Expected {} ({}) to be the same type as {} ({})",
            value_of(actual),
            type_of(actual),
            value_of(expected),
            type_of(expected)
        ),
    )]
}

pub fn regex(node: &NodeContext<'_>, rule: &RegexRule, expected: &Value, actual: &Value) -> Vec<Mismatch> {
    if is_collection(actual) || rule.is_full_match(&string_form(actual)) {
        return Vec::new();
    }
    vec![node.mismatch(
        expected,
        actual,
        format!("Expected {} to match '{}'", value_of(actual), rule.pattern()),
    )]
}

pub fn include(node: &NodeContext<'_>, substring: &str, expected: &Value, actual: &Value) -> Vec<Mismatch> {
    if string_form(actual).contains(substring) {
        return Vec::new();
    }
    vec![node.mismatch(
        expected,
        actual,
        format!("Expected {} to include '{}'", value_of(actual), substring),
    )]
}

fn is_integer(node: &NodeContext<'_>, value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) if node.coerce_numbers => is_match(&INTEGER, s),
        _ => false,
    }
}

fn is_decimal(node: &NodeContext<'_>, value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_f64() || n.as_i64() == Some(0),
        Value::String(s) if node.coerce_numbers => s == "0" || is_match(&DECIMAL, s),
        _ => false,
    }
}

pub fn number(node: &NodeContext<'_>, kind: NumberKind, expected: &Value, actual: &Value) -> Vec<Mismatch> {
    if is_collection(actual) {
        return Vec::new();
    }
    let (passes, description) = match kind {
        NumberKind::Integer => (is_integer(node, actual), "an integer"),
        NumberKind::Decimal => (is_decimal(node, actual), "a decimal number"),
        NumberKind::Number => (
            is_integer(node, actual) || is_decimal(node, actual),
            "a number",
        ),
    };
    if passes {
        return Vec::new();
    }
    vec![node.mismatch(
        expected,
        actual,
        format!(
            "Expected {} ({}) to be {}",
            value_of(actual),
            type_of(actual),
            description
        ),
    )]
}

/// Size bounds on arrays, objects and strings, plus a type check.
pub fn min_max(
    node: &NodeContext<'_>,
    min: Option<usize>,
    max: Option<usize>,
    expected: &Value,
    actual: &Value,
) -> Vec<Mismatch> {
    let mut mismatches = same_type(node, expected, actual);
    if node.cascaded || !mismatches.is_empty() {
        return mismatches;
    }
    let Some(size) = length(actual) else {
        return mismatches;
    };
    if let Some(min) = min.filter(|min| size < *min) {
        mismatches.push(node.mismatch(
            expected,
            actual,
            format!(
                "Expected {} (size {}) to have minimum size of {}",
                value_of(actual),
                size,
                min
            ),
        ));
    }
    if let Some(max) = max.filter(|max| size > *max) {
        mismatches.push(node.mismatch(
            expected,
            actual,
            format!(
                "Expected {} (size {}) to have maximum size of {}",
                value_of(actual),
                size,
                max
            ),
        ));
    }
    mismatches
}

/// Length rule of an unordered array. Element pairing is done by the
/// alignment solver.
pub fn ignore_order_size(
    node: &NodeContext<'_>,
    min: Option<usize>,
    max: Option<usize>,
    expected: &Value,
    actual: &Value,
) -> Vec<Mismatch> {
    let (Value::Array(expected_items), Value::Array(actual_items)) = (expected, actual) else {
        return equality(node, expected, actual);
    };
    if min.is_none() && max.is_none() {
        if expected_items.len() == actual_items.len() {
            return Vec::new();
        }
        return vec![node.mismatch(
            expected,
            actual,
            format!(
                "Expected {} to have {} elements",
                value_of(actual),
                expected_items.len()
            ),
        )];
    }
    min_max(node, min, max, expected, actual)
}

pub fn temporal(
    node: &NodeContext<'_>,
    kind: TemporalKind,
    format: &str,
    expected: &Value,
    actual: &Value,
) -> Vec<Mismatch> {
    if is_collection(actual) {
        return Vec::new();
    }
    match parse_temporal(kind, format, &string_form(actual)) {
        Ok(()) => Vec::new(),
        Err(reason) => vec![node.mismatch(
            expected,
            actual,
            format!(
                "Expected {} to match a {} pattern of '{}': {}",
                value_of(actual),
                kind.name(),
                format,
                reason
            ),
        )],
    }
}

pub fn null(node: &NodeContext<'_>, expected: &Value, actual: &Value) -> Vec<Mismatch> {
    if actual.is_null() {
        return Vec::new();
    }
    vec![node.mismatch(
        expected,
        actual,
        format!(
            "Expected {} ({}) to be a null value",
            value_of(actual),
            type_of(actual)
        ),
    )]
}

pub fn boolean(node: &NodeContext<'_>, expected: &Value, actual: &Value) -> Vec<Mismatch> {
    let passes = match actual {
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => true,
        Value::String(s) => s == "true" || s == "false",
        _ => false,
    };
    if passes {
        return Vec::new();
    }
    vec![node.mismatch(
        expected,
        actual,
        format!(
            "Expected {} ({}) to match a boolean",
            value_of(actual),
            type_of(actual)
        ),
    )]
}

pub fn not_empty(node: &NodeContext<'_>, expected: &Value, actual: &Value) -> Vec<Mismatch> {
    let mut mismatches = same_type(node, expected, actual);
    let empty = actual.is_null() || length(actual) == Some(0);
    if empty {
        mismatches.push(node.mismatch(
            expected,
            actual,
            format!(
                "Expected {} ({}) to not be empty",
                value_of(actual),
                type_of(actual)
            ),
        ));
    }
    mismatches
}

pub fn semver(node: &NodeContext<'_>, expected: &Value, actual: &Value) -> Vec<Mismatch> {
    if is_collection(actual) || is_match(&SEMVER, &string_form(actual)) {
        return Vec::new();
    }
    vec![node.mismatch(
        expected,
        actual,
        format!("{} is not a valid semantic version", value_of(actual)),
    )]
}

pub fn status_code(
    node: &NodeContext<'_>,
    class: &StatusClass,
    expected: &Value,
    actual: &Value,
) -> Vec<Mismatch> {
    let status = actual.as_u64().and_then(|code| u16::try_from(code).ok());
    if status.is_some_and(|status| class.accepts(status)) {
        return Vec::new();
    }
    vec![node.mismatch(
        expected,
        actual,
        format!("Expected status code {} to be {}", value_of(actual), class),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mismatch::MismatchKind;
    use crate::path::DocPath;
    use serde_json::json;

    fn node(path: &DocPath) -> NodeContext<'_> {
        NodeContext::new(path, MismatchKind::Body)
    }

    #[test]
    fn test_equality_message() {
        let path = DocPath::root().field("a");
        let mismatches = equality(&node(&path), &json!("x"), &json!("y"));
        assert_eq!(mismatches.len(), 1);
        assert_eq!(
            mismatches[0].message,
            "Expected 'y' (String) to be equal to 'x' (String)"
        );
        assert_eq!(mismatches[0].path, path);
    }

    #[test]
    fn test_type_ignores_value() {
        let path = DocPath::root();
        assert!(same_type(&node(&path), &json!("x"), &json!("anything")).is_empty());
        assert!(same_type(&node(&path), &json!(1), &json!(2.5)).is_empty());
        assert_eq!(same_type(&node(&path), &json!("x"), &json!(5)).len(), 1);
    }

    #[test]
    fn test_regex_collections_pass() {
        let path = DocPath::root();
        let rule = RegexRule::new("\\d+").unwrap();
        assert!(regex(&node(&path), &rule, &json!("1"), &json!([1, "a"])).is_empty());
        assert!(regex(&node(&path), &rule, &json!("1"), &json!(42)).is_empty());
        let mismatches = regex(&node(&path), &rule, &json!("1"), &json!("abc"));
        assert_eq!(mismatches[0].message, "Expected 'abc' to match '\\d+'");
    }

    #[test]
    fn test_number_kinds() {
        let path = DocPath::root();
        let n = node(&path);
        assert!(number(&n, NumberKind::Integer, &json!(1), &json!(100)).is_empty());
        assert_eq!(number(&n, NumberKind::Integer, &json!(1), &json!(1.5)).len(), 1);
        assert!(number(&n, NumberKind::Decimal, &json!(1.0), &json!(2.25)).is_empty());
        assert_eq!(number(&n, NumberKind::Decimal, &json!(1.0), &json!(3)).len(), 1);
        assert!(number(&n, NumberKind::Number, &json!(1), &json!(2.5)).is_empty());
        assert_eq!(number(&n, NumberKind::Number, &json!(1), &json!("1")).len(), 1);
    }

    #[test]
    fn test_number_coercion() {
        let path = DocPath::root();
        let n = node(&path).with_coerce_numbers(true);
        assert!(number(&n, NumberKind::Integer, &json!(1), &json!("-12")).is_empty());
        assert!(number(&n, NumberKind::Decimal, &json!(1.0), &json!("1.50")).is_empty());
        assert_eq!(number(&n, NumberKind::Integer, &json!(1), &json!("1.5")).len(), 1);
    }

    #[test]
    fn test_min_max_bounds() {
        let path = DocPath::root();
        let n = node(&path);
        assert!(min_max(&n, Some(1), Some(3), &json!([1]), &json!([1, 2])).is_empty());
        let too_short = min_max(&n, Some(2), None, &json!([1]), &json!([1]));
        assert_eq!(
            too_short[0].message,
            "Expected [1] (size 1) to have minimum size of 2"
        );
        assert_eq!(min_max(&n, None, Some(1), &json!("a"), &json!("abc")).len(), 1);
    }

    #[test]
    fn test_min_max_cascaded_is_type_only() {
        let path = DocPath::root().index(0);
        let n = node(&path).with_cascaded(true);
        assert!(min_max(&n, Some(5), None, &json!([1]), &json!([1])).is_empty());
        assert_eq!(min_max(&n, Some(5), None, &json!([1]), &json!("x")).len(), 1);
    }

    #[test]
    fn test_ignore_order_size() {
        let path = DocPath::root();
        let n = node(&path);
        assert!(ignore_order_size(&n, None, None, &json!([1, 2]), &json!([2, 1])).is_empty());
        let mismatches = ignore_order_size(&n, None, None, &json!([1, 2]), &json!([1]));
        assert_eq!(mismatches[0].message, "Expected [1] to have 2 elements");
        assert!(ignore_order_size(&n, Some(1), None, &json!([1, 2]), &json!([1])).is_empty());
    }

    #[test]
    fn test_temporal_failure_is_mismatch() {
        let path = DocPath::root();
        let mismatches = temporal(
            &node(&path),
            TemporalKind::Date,
            "yyyy-MM-dd",
            &json!("2020-01-01"),
            &json!("01/01/2020"),
        );
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0]
            .message
            .starts_with("Expected '01/01/2020' to match a date pattern of 'yyyy-MM-dd'"));
    }

    #[test]
    fn test_null_boolean_semver() {
        let path = DocPath::root();
        let n = node(&path);
        assert!(null(&n, &json!(null), &json!(null)).is_empty());
        assert_eq!(null(&n, &json!(null), &json!(0)).len(), 1);
        assert!(boolean(&n, &json!(true), &json!("false")).is_empty());
        assert_eq!(boolean(&n, &json!(true), &json!(1)).len(), 1);
        assert!(semver(&n, &json!("1.0.0"), &json!("2.10.3-rc.1+build.5")).is_empty());
        assert_eq!(semver(&n, &json!("1.0.0"), &json!("1.0")).len(), 1);
    }

    #[test]
    fn test_not_empty() {
        let path = DocPath::root();
        let n = node(&path);
        assert!(not_empty(&n, &json!([1]), &json!([2, 3])).is_empty());
        assert_eq!(not_empty(&n, &json!([1]), &json!([])).len(), 1);
        assert_eq!(not_empty(&n, &json!("a"), &json!("")).len(), 1);
    }

    #[test]
    fn test_status_code() {
        let path = DocPath::empty();
        let n = NodeContext::new(&path, MismatchKind::Status);
        assert!(status_code(&n, &StatusClass::Success, &json!(200), &json!(201)).is_empty());
        let mismatches = status_code(&n, &StatusClass::Success, &json!(200), &json!(404));
        assert_eq!(
            mismatches[0].message,
            "Expected status code 404 to be a success status (2xx)"
        );
        assert_eq!(mismatches[0].kind, MismatchKind::Status);
    }
}
