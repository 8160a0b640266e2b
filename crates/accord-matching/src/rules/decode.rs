//! Decoding of the `matchingRules` JSON object.
//!
//! Accepts the category-keyed layout:
//!
//! ```json
//! {
//!   "body": { "$.items": { "matchers": [{ "match": "type", "min": 1 }], "combine": "AND" } },
//!   "header": { "Content-Type": { "matchers": [{ "match": "regex", "regex": "application/.*" }] } },
//!   "path": { "matchers": [{ "match": "regex", "regex": "/items/\\d+" }] }
//! }
//! ```
//!
//! and the older flat layout keyed by `$.body...`, `$.headers...`,
//! `$.query...` and `$.path`.

use super::category::{Category, KeyStyle, MatchingRuleCategory, RuleGroup, RuleLogic};
use super::matching_rules::MatchingRules;
use super::rule::{ArrayVariant, MatchingRule, NumberKind, StatusClass, TemporalKind};
use crate::error::ParseError;
use crate::matchers::temporal::to_chrono_format;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

impl MatchingRules {
    /// Decode a `matchingRules` JSON object.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        let object = value.as_object().ok_or_else(|| {
            ParseError::InvalidRules(format!("expected a JSON object, got {}", value))
        })?;

        let mut rules = MatchingRules::new();
        for (name, body) in object {
            if name.starts_with('$') {
                decode_flat_entry(name, body, &mut rules)?;
                continue;
            }
            match Category::from_name(name) {
                Some(category) => rules.add_category(decode_category(category, body)?),
                None => warn!("Ignoring unknown matching rule category '{}'", name),
            }
        }
        debug!(
            "Decoded matching rules for {} categor(ies)",
            rules.categories().count()
        );
        Ok(rules)
    }
}

/// Serde adapter for fields holding a `matchingRules` object.
pub fn deserialize_matching_rules<'de, D>(deserializer: D) -> Result<MatchingRules, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(MatchingRules::default());
    }
    MatchingRules::from_json(&value).map_err(serde::de::Error::custom)
}

fn flat_key(key: &str) -> Option<(Category, String)> {
    if let Some(rest) = key.strip_prefix("$.body") {
        return Some((Category::Body, format!("${}", rest)));
    }
    for prefix in ["$.headers.", "$.header."] {
        if let Some(name) = key.strip_prefix(prefix) {
            return Some((Category::Header, name.to_string()));
        }
    }
    if let Some(name) = key.strip_prefix("$.query.") {
        return Some((Category::Query, name.to_string()));
    }
    if key == "$.path" {
        return Some((Category::Path, String::new()));
    }
    None
}

fn decode_flat_entry(key: &str, body: &Value, rules: &mut MatchingRules) -> Result<(), ParseError> {
    match flat_key(key) {
        Some((category, key)) => rules
            .category_mut(category)
            .add_group(&key, decode_group(body)?),
        None => {
            warn!("Ignoring matching rule with unrecognised key '{}'", key);
            Ok(())
        }
    }
}

/// Decode the rules of one category.
pub fn decode_category(category: Category, value: &Value) -> Result<MatchingRuleCategory, ParseError> {
    let object = as_object(value, category.name())?;
    let mut rules = MatchingRuleCategory::new(category);

    let is_group = object.contains_key("matchers") || object.contains_key("match");
    if category.key_style() == KeyStyle::Whole && is_group {
        rules.add_group("", decode_group(value)?)?;
        return Ok(rules);
    }

    for (key, group) in object {
        rules.add_group(key, decode_group(group)?)?;
    }
    Ok(rules)
}

/// Decode `{ "matchers": [...], "combine": "AND|OR" }`, or a single bare
/// matcher definition.
pub fn decode_group(value: &Value) -> Result<RuleGroup, ParseError> {
    let object = as_object(value, "rule group")?;

    let logic = match object.get("combine") {
        None => RuleLogic::And,
        Some(Value::String(name)) => RuleLogic::from_name(name).ok_or_else(|| {
            ParseError::InvalidRules(format!("unknown combine logic '{}'", name))
        })?,
        Some(other) => {
            return Err(ParseError::InvalidRules(format!(
                "'combine' must be a string, got {}",
                other
            )))
        }
    };

    let rules = match object.get("matchers") {
        Some(Value::Array(items)) => items
            .iter()
            .map(decode_rule)
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(ParseError::InvalidRules(format!(
                "'matchers' must be an array, got {}",
                other
            )))
        }
        None => vec![decode_rule(value)?],
    };

    Ok(RuleGroup::new(rules, logic))
}

/// Decode one matcher definition.
pub fn decode_rule(value: &Value) -> Result<MatchingRule, ParseError> {
    let object = value.as_object().ok_or_else(|| {
        ParseError::InvalidMatcher(format!("expected a JSON object, got {}", value))
    })?;

    if let Some(name) = object.get("match") {
        let name = name.as_str().ok_or_else(|| {
            ParseError::InvalidMatcher(format!("'match' must be a string, got {}", name))
        })?;
        return create(name, object);
    }

    for legacy in ["regex", "min", "max", "timestamp", "time", "date"] {
        if object.contains_key(legacy) {
            return create(legacy, object);
        }
    }

    warn!(
        "Matcher definition {} has no 'match' attribute, defaulting to equality",
        value
    );
    Ok(MatchingRule::Equality)
}

fn create(name: &str, object: &Map<String, Value>) -> Result<MatchingRule, ParseError> {
    let rule = match name {
        "regex" => MatchingRule::regex(required_str(object, "regex", name)?)?,
        "equality" => MatchingRule::Equality,
        "null" => MatchingRule::Null,
        "include" => match object.get("value") {
            Some(Value::String(value)) => MatchingRule::Include(value.clone()),
            Some(other) => MatchingRule::Include(other.to_string()),
            None => return Err(missing(name, "value")),
        },
        "type" => {
            let min = optional_usize(object, "min")?;
            let max = optional_usize(object, "max")?;
            if min.is_none() && max.is_none() {
                MatchingRule::Type
            } else {
                MatchingRule::MinMaxLength { min, max }
            }
        }
        "number" => MatchingRule::NumberType(NumberKind::Number),
        "integer" => MatchingRule::NumberType(NumberKind::Integer),
        "decimal" => MatchingRule::NumberType(NumberKind::Decimal),
        "real" => {
            warn!("The 'real' matcher is deprecated, use 'decimal' instead");
            MatchingRule::NumberType(NumberKind::Decimal)
        }
        "min" => MatchingRule::MinMaxLength {
            min: Some(required_usize(object, "min", name)?),
            max: optional_usize(object, "max")?,
        },
        "max" => MatchingRule::MinMaxLength {
            min: optional_usize(object, "min")?,
            max: Some(required_usize(object, "max", name)?),
        },
        "timestamp" | "datetime" => temporal(TemporalKind::DateTime, object, &["timestamp", "datetime"])?,
        "time" => temporal(TemporalKind::Time, object, &["time"])?,
        "date" => temporal(TemporalKind::Date, object, &["date"])?,
        "values" => MatchingRule::Values,
        "ignore-order" | "equalsIgnoreOrder" => MatchingRule::EqualsIgnoreOrder {
            min: optional_usize(object, "min")?,
            max: optional_usize(object, "max")?,
        },
        "arrayContains" | "array-contains" => MatchingRule::ArrayContains(variants(object)?),
        "boolean" => MatchingRule::Boolean,
        "statusCode" | "status-code" => MatchingRule::StatusCode(status(object)?),
        "notEmpty" | "not-empty" => MatchingRule::NotEmpty,
        "semver" => MatchingRule::Semver,
        "eachKey" | "each-key" => MatchingRule::EachKey(nested_rules(object)?),
        "eachValue" | "each-value" => MatchingRule::EachValue(nested_rules(object)?),
        other => {
            warn!("Unsupported matcher '{}', it will always pass", other);
            MatchingRule::Unknown(other.to_string())
        }
    };

    if let MatchingRule::MinMaxLength {
        min: Some(min),
        max: Some(max),
    }
    | MatchingRule::EqualsIgnoreOrder {
        min: Some(min),
        max: Some(max),
    } = &rule
    {
        if min > max {
            return Err(ParseError::InvalidMatcher(format!(
                "'{}' matcher has min {} greater than max {}",
                name, min, max
            )));
        }
    }
    Ok(rule)
}

/// The pattern is checked here so a bad format fails at load time rather
/// than on every value.
fn temporal(
    kind: TemporalKind,
    object: &Map<String, Value>,
    legacy: &[&str],
) -> Result<MatchingRule, ParseError> {
    let format = std::iter::once("format")
        .chain(legacy.iter().copied())
        .find_map(|key| object.get(key).and_then(Value::as_str))
        .unwrap_or(kind.default_format());
    to_chrono_format(format)?;
    Ok(MatchingRule::DateTime {
        kind,
        format: format.to_string(),
    })
}

fn nested_rules(object: &Map<String, Value>) -> Result<Vec<MatchingRule>, ParseError> {
    match object.get("rules") {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(decode_rule).collect(),
        Some(other) => Err(ParseError::InvalidMatcher(format!(
            "'rules' must be an array, got {}",
            other
        ))),
    }
}

fn variants(object: &Map<String, Value>) -> Result<Vec<ArrayVariant>, ParseError> {
    let items = match object.get("variants") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ParseError::InvalidMatcher(format!(
                "'variants' must be an array, got {}",
                other
            )))
        }
        None => return Err(missing("arrayContains", "variants")),
    };

    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let variant = as_object(item, "arrayContains variant")?;
            let index = optional_usize(variant, "index")?.unwrap_or(position);
            let rules = match variant.get("rules") {
                Some(rules) => decode_category(Category::Body, rules)?,
                None => MatchingRuleCategory::new(Category::Body),
            };
            if variant.contains_key("generators") {
                debug!("Ignoring generators on arrayContains variant {}", index);
            }
            Ok(ArrayVariant { index, rules })
        })
        .collect()
}

fn status(object: &Map<String, Value>) -> Result<StatusClass, ParseError> {
    match object.get("status") {
        Some(Value::String(name)) => StatusClass::from_name(name).ok_or_else(|| {
            ParseError::InvalidMatcher(format!("unknown status class '{}'", name))
        }),
        Some(Value::Array(codes)) => codes
            .iter()
            .map(|code| {
                code.as_u64()
                    .and_then(|code| u16::try_from(code).ok())
                    .ok_or_else(|| {
                        ParseError::InvalidMatcher(format!("invalid status code {}", code))
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(StatusClass::Codes),
        Some(other) => Err(ParseError::InvalidMatcher(format!(
            "'status' must be a class name or a list of codes, got {}",
            other
        ))),
        None => Err(missing("statusCode", "status")),
    }
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, ParseError> {
    value.as_object().ok_or_else(|| {
        ParseError::InvalidRules(format!("{} must be a JSON object, got {}", what, value))
    })
}

fn missing(matcher: &str, attribute: &str) -> ParseError {
    ParseError::InvalidMatcher(format!(
        "'{}' matcher requires the '{}' attribute",
        matcher, attribute
    ))
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    matcher: &str,
) -> Result<&'a str, ParseError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(matcher, key))
}

fn optional_usize(object: &Map<String, Value>, key: &str) -> Result<Option<usize>, ParseError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                ParseError::InvalidMatcher(format!(
                    "'{}' must be a non-negative integer, got {}",
                    key, value
                ))
            }),
    }
}

fn required_usize(object: &Map<String, Value>, key: &str, matcher: &str) -> Result<usize, ParseError> {
    optional_usize(object, key)?.ok_or_else(|| missing(matcher, key))
}
