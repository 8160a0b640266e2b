//! Matching of whole requests, responses and messages.
//!
//! Each part (method, path, query, headers, status, body, metadata) is
//! compared against the rules declared for its category. The feature
//! toggles are read once per call so a concurrent toggle change never
//! splits one verification across two configurations.

use crate::alignment::pad_to;
use crate::body::compare_documents;
use crate::config::MatchingConfig;
use crate::context::MatchingContext;
use crate::diff::{line_diff, render};
use crate::features::{self, FeatureSet};
use crate::interaction::{
    base_content_type, is_content_type_key, is_form_content_type, is_json_content_type,
    parse_query_string, Body, HttpRequest, HttpResponse, Message,
};
use crate::matchers::value::{json_equals, string_form, value_of};
use crate::matchers::{match_group, match_rules};
use crate::mismatch::{Mismatch, MismatchKind};
use crate::path::DocPath;
use crate::rules::{Category, MatchingRule, MatchingRuleCategory, MatchingRules};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

static ORIGIN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^https?://[^/]*").ok());

/// Mismatches found in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResult {
    pub category: Category,
    pub mismatches: Vec<Mismatch>,
}

/// Outcome of matching one interaction part.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchResult {
    results: Vec<CategoryResult>,
}

impl MatchResult {
    pub fn push(&mut self, category: Category, mismatches: Vec<Mismatch>) {
        self.results.push(CategoryResult {
            category,
            mismatches,
        });
    }

    pub fn all_matched(&self) -> bool {
        self.results.iter().all(|result| result.mismatches.is_empty())
    }

    pub fn results(&self) -> &[CategoryResult] {
        &self.results
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &Mismatch> {
        self.results.iter().flat_map(|result| result.mismatches.iter())
    }

    pub fn for_category(&self, category: Category) -> &[Mismatch] {
        self.results
            .iter()
            .find(|result| result.category == category)
            .map(|result| result.mismatches.as_slice())
            .unwrap_or_default()
    }

    pub fn mismatch_count(&self) -> usize {
        self.results.iter().map(|result| result.mismatches.len()).sum()
    }
}

/// Match an actual request against the expected one.
pub fn match_request(expected: &HttpRequest, actual: &HttpRequest, config: &MatchingConfig) -> MatchResult {
    debug!("Matching request {} {}", expected.method, expected.path);
    let features = features::snapshot();
    let allow_unexpected = config.allow_unexpected_keys_or(false);
    let rules = &expected.matching_rules;
    let mut result = MatchResult::default();

    result.push(
        Category::Method,
        match_method(&expected.method, &actual.method).into_iter().collect(),
    );

    let path_rules = rules.rules_for(Category::Path);
    let ctx = context(&path_rules, MismatchKind::Path, &features, config, allow_unexpected);
    result.push(Category::Path, match_path(&expected.path, &actual.path, &ctx));

    let query_rules = rules.rules_for(Category::Query);
    let ctx = context(&query_rules, MismatchKind::Query, &features, config, allow_unexpected);
    result.push(Category::Query, match_query(&expected.query, &actual.query, &ctx));

    let header_rules = rules.rules_for(Category::Header);
    let ctx = context(&header_rules, MismatchKind::Header, &features, config, allow_unexpected);
    result.push(Category::Header, match_headers(&expected.headers, &actual.headers, &ctx));

    let body_rules = rules.rules_for(Category::Body);
    let ctx = context(&body_rules, MismatchKind::Body, &features, config, allow_unexpected);
    result.push(
        Category::Body,
        match_body(
            &expected.body,
            &expected.content_type(),
            &actual.body,
            &actual.content_type(),
            &ctx,
        ),
    );

    result
}

/// Match an actual response against the expected one.
pub fn match_response(
    expected: &HttpResponse,
    actual: &HttpResponse,
    config: &MatchingConfig,
) -> MatchResult {
    debug!("Matching response with status {}", expected.status);
    let features = features::snapshot();
    let allow_unexpected = config.allow_unexpected_keys_or(true);
    let rules = &expected.matching_rules;
    let mut result = MatchResult::default();

    let status_rules = rules.rules_for(Category::Status);
    let ctx = context(&status_rules, MismatchKind::Status, &features, config, allow_unexpected);
    result.push(
        Category::Status,
        match_status(expected.status, actual.status, &ctx),
    );

    let header_rules = rules.rules_for(Category::Header);
    let ctx = context(&header_rules, MismatchKind::Header, &features, config, allow_unexpected);
    result.push(Category::Header, match_headers(&expected.headers, &actual.headers, &ctx));

    let body_rules = rules.rules_for(Category::Body);
    let ctx = context(&body_rules, MismatchKind::Body, &features, config, allow_unexpected);
    result.push(
        Category::Body,
        match_body(
            &expected.body,
            &expected.content_type(),
            &actual.body,
            &actual.content_type(),
            &ctx,
        ),
    );

    result
}

/// Match an actual message against the expected one.
pub fn match_message(expected: &Message, actual: &Message, config: &MatchingConfig) -> MatchResult {
    debug!("Matching message");
    let features = features::snapshot();
    let allow_unexpected = config.allow_unexpected_keys_or(true);
    let rules = &expected.matching_rules;
    let mut result = MatchResult::default();

    let content_rules = message_content_rules(rules);
    let ctx = context(&content_rules, MismatchKind::Body, &features, config, allow_unexpected);
    result.push(
        Category::Content,
        match_body(
            &expected.contents,
            &expected.content_type(),
            &actual.contents,
            &actual.content_type(),
            &ctx,
        ),
    );

    let metadata_rules = rules.rules_for(Category::Metadata);
    let ctx = context(&metadata_rules, MismatchKind::Metadata, &features, config, allow_unexpected);
    result.push(
        Category::Metadata,
        match_metadata(&expected.metadata, &actual.metadata, &ctx),
    );

    result
}

/// Message contents accept rules declared under either `content` or `body`.
fn message_content_rules(rules: &MatchingRules) -> MatchingRuleCategory {
    let content = rules.rules_for(Category::Content);
    match rules.category(Category::Body) {
        Some(body) => content.merge(body),
        None => content,
    }
}

fn context<'r>(
    rules: &'r MatchingRuleCategory,
    kind: MismatchKind,
    features: &Arc<FeatureSet>,
    config: &MatchingConfig,
    allow_unexpected_keys: bool,
) -> MatchingContext<'r> {
    MatchingContext::new(rules, kind)
        .with_features(Arc::clone(features))
        .with_allow_unexpected_keys(allow_unexpected_keys)
        .with_max_unordered_elements(config.max_unordered_elements)
}

pub fn match_method(expected: &str, actual: &str) -> Option<Mismatch> {
    if expected.eq_ignore_ascii_case(actual) {
        None
    } else {
        Some(Mismatch::new(
            MismatchKind::Method,
            DocPath::empty(),
            expected,
            actual,
            format!("Expected method {} but received {}", expected, actual),
        ))
    }
}

/// Compare request paths. Any scheme and host on the actual path are
/// ignored.
pub fn match_path(expected: &str, actual: &str, ctx: &MatchingContext<'_>) -> Vec<Mismatch> {
    let actual = match ORIGIN.as_ref() {
        Some(origin) => origin.replace(actual, ""),
        None => actual.into(),
    };
    let path = DocPath::empty();
    if let Some(group) = ctx.rules().select_best(&path) {
        debug!("Matcher defined for path");
        return match_group(
            &group,
            &ctx.node(&path),
            &Value::String(expected.to_string()),
            &Value::String(actual.to_string()),
        );
    }
    if expected == actual {
        Vec::new()
    } else {
        vec![Mismatch::new(
            MismatchKind::Path,
            path,
            expected,
            actual.to_string(),
            format!("Expected path '{}' but received '{}'", expected, actual),
        )]
    }
}

pub fn match_status(expected: u16, actual: u16, ctx: &MatchingContext<'_>) -> Vec<Mismatch> {
    let path = DocPath::empty();
    if let Some(group) = ctx.rules().select_best(&path) {
        debug!("Matcher defined for status");
        return match_group(
            &group,
            &ctx.node(&path),
            &Value::from(expected),
            &Value::from(actual),
        );
    }
    if expected == actual {
        Vec::new()
    } else {
        vec![Mismatch::new(
            MismatchKind::Status,
            path,
            expected.to_string(),
            actual.to_string(),
            format!("Expected status {} but was {}", expected, actual),
        )]
    }
}

/// Compare query parameters. Parameters missing from the actual request
/// and parameters it has but the expected one does not are both reported.
pub fn match_query(
    expected: &BTreeMap<String, Vec<String>>,
    actual: &BTreeMap<String, Vec<String>>,
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    for (name, expected_values) in expected {
        match actual.get(name) {
            Some(actual_values) => {
                mismatches.extend(compare_query_values(name, expected_values, actual_values, ctx))
            }
            None => mismatches.push(Mismatch::new(
                MismatchKind::Query,
                DocPath::key(name),
                expected_values.join(","),
                "",
                format!("Expected query parameter '{}' but was missing", name),
            )),
        }
    }
    for (name, actual_values) in actual {
        if !expected.contains_key(name) {
            mismatches.push(Mismatch::new(
                MismatchKind::Query,
                DocPath::key(name),
                "",
                actual_values.join(","),
                format!("Unexpected query parameter '{}' received", name),
            ));
        }
    }
    mismatches
}

fn compare_query_values(
    name: &str,
    expected: &[String],
    actual: &[String],
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let path = DocPath::key(name);
    let node = ctx.node(&path);

    if let Some(group) = ctx.rules().select_best(&path) {
        debug!("Matcher defined for query parameter '{}'", name);
        let expected_list = string_list(expected);
        let actual_list = string_list(actual);
        let mut mismatches = match_rules(
            group.rules().filter(is_length_rule),
            group.logic(),
            &node,
            &expected_list,
            &actual_list,
        );
        let Some(template) = expected.first() else {
            return mismatches;
        };
        for (index, value) in actual.iter().enumerate() {
            let expected_value = expected.get(index).unwrap_or(template);
            mismatches.extend(match_rules(
                group.rules().filter(|rule| !is_length_rule(rule)),
                group.logic(),
                &node,
                &Value::String(expected_value.clone()),
                &Value::String(value.clone()),
            ));
        }
        return mismatches;
    }

    if expected.is_empty() && !actual.is_empty() {
        return vec![Mismatch::new(
            MismatchKind::Query,
            path,
            "",
            actual.join(","),
            format!(
                "Expected an empty parameter list for '{}' but received {:?}",
                name, actual
            ),
        )];
    }

    let mut mismatches = Vec::new();
    if expected.len() != actual.len() {
        mismatches.push(Mismatch::new(
            MismatchKind::Query,
            path.clone(),
            expected.join(","),
            actual.join(","),
            format!(
                "Expected query parameter '{}' with {} values but received {} values",
                name,
                expected.len(),
                actual.len()
            ),
        ));
    }
    for (index, value) in expected.iter().enumerate() {
        match actual.get(index) {
            Some(received) if received == value => {}
            Some(received) => mismatches.push(Mismatch::new(
                MismatchKind::Query,
                path.clone(),
                value.as_str(),
                received.as_str(),
                format!(
                    "Expected '{}' but received '{}' for query parameter '{}'",
                    value, received, name
                ),
            )),
            None => mismatches.push(Mismatch::new(
                MismatchKind::Query,
                path.clone(),
                value.as_str(),
                "",
                format!(
                    "Expected query parameter '{}' with value '{}' but was missing",
                    name, value
                ),
            )),
        }
    }
    mismatches
}

/// Length rules judge the value list, the rest judge each value.
fn is_length_rule(rule: &&MatchingRule) -> bool {
    matches!(rule, MatchingRule::MinMaxLength { .. })
}

fn string_list(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}

/// Compare headers by case-insensitive name. Extra actual headers are
/// always accepted.
pub fn match_headers(
    expected: &BTreeMap<String, Vec<String>>,
    actual: &BTreeMap<String, Vec<String>>,
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    for (name, expected_values) in expected {
        let received = actual
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values);
        let Some(actual_values) = received else {
            mismatches.push(Mismatch::new(
                MismatchKind::Header,
                DocPath::key(name),
                expected_values.join(", "),
                "",
                format!("Expected a header '{}' but was missing", name),
            ));
            continue;
        };
        if !ctx.rules().matcher_defined(&DocPath::key(name)) {
            // Without rules a repeated header equals its comma-joined form.
            mismatches.extend(compare_header(
                name,
                &expected_values.join(", "),
                &actual_values.join(", "),
                ctx,
            ));
            continue;
        }
        let filler = expected_values.first().cloned().unwrap_or_default();
        let size = expected_values.len().max(actual_values.len());
        for (index, expected_value) in pad_to(expected_values, size, filler).iter().enumerate() {
            let actual_value = actual_values.get(index).map(String::as_str).unwrap_or("");
            mismatches.extend(compare_header(name, expected_value, actual_value, ctx));
        }
    }
    mismatches
}

fn compare_header(
    name: &str,
    expected: &str,
    actual: &str,
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    debug!("Comparing header '{}': '{}' to '{}'", name, actual, expected);
    let path = DocPath::key(name);
    if let Some(group) = ctx.rules().select_best(&path) {
        return match_group(
            &group,
            &ctx.node(&path),
            &Value::String(expected.to_string()),
            &Value::String(actual.to_string()),
        );
    }
    let matched = if name.eq_ignore_ascii_case("content-type") {
        content_types_match(expected, actual)
    } else {
        split_header_value(expected) == split_header_value(actual)
    };
    if matched {
        Vec::new()
    } else {
        vec![Mismatch::new(
            MismatchKind::Header,
            path,
            expected,
            actual,
            format!(
                "Expected header '{}' to have value '{}' but was '{}'",
                name, expected, actual
            ),
        )]
    }
}

fn split_header_value(value: &str) -> Vec<&str> {
    value.split(',').map(str::trim).collect()
}

/// Same media type, and every expected parameter present with the same
/// value. Extra actual parameters are accepted.
fn content_types_match(expected: &str, actual: &str) -> bool {
    if base_content_type(expected) != base_content_type(actual) {
        return false;
    }
    let actual_parameters = content_type_parameters(actual);
    content_type_parameters(expected)
        .iter()
        .all(|(name, value)| {
            actual_parameters
                .get(name)
                .is_some_and(|received| received.eq_ignore_ascii_case(value))
        })
}

fn content_type_parameters(value: &str) -> BTreeMap<String, String> {
    value
        .split(';')
        .skip(1)
        .filter_map(|parameter| {
            let (name, value) = parameter.split_once('=')?;
            Some((
                name.trim().to_ascii_lowercase(),
                value.trim().trim_matches('"').to_string(),
            ))
        })
        .collect()
}

/// Compare message metadata. A missing content type key is not reported;
/// the content type is checked through the contents instead.
pub fn match_metadata(
    expected: &BTreeMap<String, Value>,
    actual: &BTreeMap<String, Value>,
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    for (key, expected_value) in expected {
        let path = DocPath::key(key);
        match actual.get(key) {
            Some(actual_value) => {
                if let Some(group) = ctx.rules().select_best(&path) {
                    mismatches.extend(match_group(
                        &group,
                        &ctx.node(&path),
                        expected_value,
                        actual_value,
                    ));
                } else if !json_equals(expected_value, actual_value) {
                    mismatches.push(Mismatch::new(
                        MismatchKind::Metadata,
                        path,
                        value_of(expected_value),
                        value_of(actual_value),
                        format!(
                            "Expected metadata key '{}' to have value {} but was {}",
                            key,
                            value_of(expected_value),
                            value_of(actual_value)
                        ),
                    ));
                }
            }
            None if is_content_type_key(key) => {}
            None => mismatches.push(Mismatch::new(
                MismatchKind::Metadata,
                path,
                value_of(expected_value),
                "",
                format!("Expected metadata '{}' but was missing", key),
            )),
        }
    }
    mismatches
}

/// Compare bodies given their content types.
pub fn match_body(
    expected: &Body,
    expected_content_type: &str,
    actual: &Body,
    actual_content_type: &str,
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let expected_base = base_content_type(expected_content_type);
    let actual_base = base_content_type(actual_content_type);
    let root = DocPath::root();

    if expected_base != actual_base {
        if expected.is_empty() {
            return Vec::new();
        }
        debug!(
            "Body content types differ: expected {} but was {}",
            expected_base, actual_base
        );
        return vec![Mismatch::new(
            MismatchKind::BodyType,
            DocPath::empty(),
            expected_base.as_str(),
            actual_base.as_str(),
            format!(
                "Expected a body of '{}' but the actual content type was '{}'",
                expected_base, actual_base
            ),
        )];
    }

    match (expected, actual) {
        (Body::Missing, _) => Vec::new(),
        (Body::Null, Body::Present(received)) => vec![ctx.node(&root).mismatch(
            &Value::Null,
            received,
            format!("Expected an empty body but received {}", value_of(received)),
        )],
        (Body::Null, _) => Vec::new(),
        (Body::Present(wanted), Body::Missing | Body::Null) => vec![ctx.node(&root).mismatch(
            wanted,
            &Value::Null,
            format!("Expected body {} but was missing", value_of(wanted)),
        )],
        (Body::Present(wanted), Body::Present(received)) => {
            if is_json_content_type(expected_content_type) {
                let wanted = parse_json_text(wanted);
                let received = if matches!(wanted, Value::Object(_) | Value::Array(_)) {
                    parse_json_text(received)
                } else {
                    received.clone()
                };
                compare_documents(&wanted, &received, ctx)
            } else if is_form_content_type(expected_content_type) {
                compare_form(wanted, received, ctx)
            } else {
                compare_text(wanted, received, ctx)
            }
        }
    }
}

/// Compare `application/x-www-form-urlencoded` bodies parameter by
/// parameter. Rules are looked up at `$.<name>`, so parameter order does
/// not matter.
fn compare_form(expected: &Value, actual: &Value, ctx: &MatchingContext<'_>) -> Vec<Mismatch> {
    let expected_parameters = parse_query_string(&string_form(expected));
    let actual_parameters = parse_query_string(&string_form(actual));
    let mut mismatches = Vec::new();

    for (name, expected_values) in &expected_parameters {
        let path = DocPath::root().field(name);
        let Some(actual_values) = actual_parameters.get(name) else {
            mismatches.push(Mismatch::new(
                ctx.kind(),
                path,
                expected_values.join(","),
                "",
                format!("Expected form post parameter '{}' but was missing", name),
            ));
            continue;
        };
        let group = ctx.rules().select_best(&path);
        for (index, expected_value) in expected_values.iter().enumerate() {
            let Some(actual_value) = actual_values.get(index) else {
                mismatches.push(Mismatch::new(
                    ctx.kind(),
                    path.clone(),
                    expected_value.as_str(),
                    "",
                    format!(
                        "Expected form post parameter '{}'='{}' but was missing",
                        name, expected_value
                    ),
                ));
                continue;
            };
            match &group {
                Some(group) => {
                    debug!("Matcher defined for form post parameter '{}'[{}]", name, index);
                    mismatches.extend(match_group(
                        group,
                        &ctx.node(&path),
                        &Value::String(expected_value.clone()),
                        &Value::String(actual_value.clone()),
                    ));
                }
                None if expected_value != actual_value => mismatches.push(Mismatch::new(
                    ctx.kind(),
                    path.clone(),
                    expected_value.as_str(),
                    actual_value.as_str(),
                    format!(
                        "Expected form post parameter '{}'[{}] with value '{}' but was '{}'",
                        name, index, expected_value, actual_value
                    ),
                )),
                None => {}
            }
        }
    }

    if !ctx.allow_unexpected_keys() {
        for (name, values) in &actual_parameters {
            if !expected_parameters.contains_key(name) {
                mismatches.push(Mismatch::new(
                    ctx.kind(),
                    DocPath::root().field(name),
                    "",
                    values.join(","),
                    format!(
                        "Received unexpected form post parameter '{}'={:?}",
                        name, values
                    ),
                ));
            }
        }
    }
    mismatches
}

/// A JSON body given as text is compared by its parsed form.
fn parse_json_text(value: &Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(text).unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}

fn compare_text(expected: &Value, actual: &Value, ctx: &MatchingContext<'_>) -> Vec<Mismatch> {
    let root = DocPath::root();
    let node = ctx.node(&root);
    if let Some(group) = ctx.rules().select_best(&root) {
        debug!("Matcher defined for the body root");
        return match_group(&group, &node, expected, actual);
    }
    let expected_text = string_form(expected);
    let actual_text = string_form(actual);
    if expected_text == actual_text {
        return Vec::new();
    }
    vec![node
        .mismatch(
            expected,
            actual,
            format!(
                "Actual body '{}' is not equal to the expected body '{}'",
                actual_text, expected_text
            ),
        )
        .with_diff(render(&line_diff(&expected_text, &actual_text)))]
}
