//! Validation of contract files and their matching rules.

use crate::types::{LintIssue, LintOptions, LintResult};
use accord_matching::rules::{decode_rule, Category, KeyStyle, MatchingRule, RuleLogic};
use accord_matching::{ParseError, PathExpression};
use serde_json::{Map, Value};
use std::path::Path;

/// Matcher names that are accepted but superseded.
const DEPRECATED_MATCHERS: [(&str, &str); 1] = [("real", "decimal")];

/// Validate a complete contract: its interactions and messages.
pub fn validate_contract(file: &Path, contract: &Value, result: &mut LintResult, options: &LintOptions) {
    let Some(object) = contract.as_object() else {
        result.add_issue(
            LintIssue::error("E003", "Contract must be a JSON object", file)
                .with_suggestion("Wrap the interactions in { \"interactions\": [...] }"),
        );
        return;
    };

    let interactions = object.get("interactions").and_then(Value::as_array);
    let messages = object.get("messages").and_then(Value::as_array);
    if interactions.is_none() && messages.is_none() {
        result.add_issue(
            LintIssue::error("E003", "Contract has no 'interactions' or 'messages'", file)
                .with_suggestion("Add an \"interactions\" or \"messages\" array"),
        );
        return;
    }

    for (idx, interaction) in interactions.into_iter().flatten().enumerate() {
        validate_interaction(file, interaction, &format!("interactions[{idx}]"), result, options);
    }
    for (idx, message) in messages.into_iter().flatten().enumerate() {
        validate_message(file, message, &format!("messages[{idx}]"), result, options);
    }
}

/// Validate one request/response interaction.
pub fn validate_interaction(
    file: &Path,
    interaction: &Value,
    location: &str,
    result: &mut LintResult,
    options: &LintOptions,
) {
    check_description(file, interaction, location, result);

    for part in ["request", "response"] {
        match interaction.get(part) {
            Some(value) if value.is_object() => {
                if let Some(rules) = value.get("matchingRules") {
                    validate_matching_rules(
                        file,
                        rules,
                        &format!("{location}.{part}.matchingRules"),
                        result,
                        options,
                    );
                }
            }
            Some(_) => result.add_issue(
                LintIssue::error("E004", format!("'{part}' must be an object"), file)
                    .with_location(format!("{location}.{part}")),
            ),
            None => result.add_issue(
                LintIssue::error("E004", format!("Interaction missing '{part}'"), file)
                    .with_location(location),
            ),
        }
    }
}

/// Validate one message.
pub fn validate_message(
    file: &Path,
    message: &Value,
    location: &str,
    result: &mut LintResult,
    options: &LintOptions,
) {
    check_description(file, message, location, result);

    if let Some(rules) = message.get("matchingRules") {
        validate_matching_rules(file, rules, &format!("{location}.matchingRules"), result, options);
    }
}

fn check_description(file: &Path, value: &Value, location: &str, result: &mut LintResult) {
    let described = value
        .get("description")
        .and_then(Value::as_str)
        .is_some_and(|description| !description.trim().is_empty());
    if !described {
        result.add_issue(
            LintIssue::warning("W001", "Missing description", file)
                .with_location(location)
                .with_suggestion("Describe the interaction so failures can be traced back to it"),
        );
    }
}

/// Validate a `matchingRules` object in either layout.
pub fn validate_matching_rules(
    file: &Path,
    rules: &Value,
    location: &str,
    result: &mut LintResult,
    options: &LintOptions,
) {
    let Some(categories) = rules.as_object() else {
        result.add_issue(
            LintIssue::error("E005", "'matchingRules' must be an object", file).with_location(location),
        );
        return;
    };

    for (name, body) in categories {
        let entry_location = format!("{location}.{name}");
        if name.starts_with('$') {
            if options.verbose {
                result.add_issue(
                    LintIssue::info("I001", format!("Legacy flat rule key '{name}'"), file)
                        .with_location(&entry_location)
                        .with_suggestion("Group rules by category (body, header, query, path)"),
                );
            }
            if let Some(body_path) = name.strip_prefix("$.body") {
                check_path_expression(file, &format!("${body_path}"), &entry_location, result);
            }
            validate_group(file, body, &entry_location, result);
            continue;
        }

        let Some(category) = Category::from_name(name) else {
            result.add_issue(
                LintIssue::warning("W002", format!("Unknown rule category '{name}'"), file)
                    .with_location(&entry_location)
                    .with_suggestion(format!(
                        "Use one of: {}",
                        Category::ALL.map(|c| c.name()).join(", ")
                    )),
            );
            continue;
        };

        validate_category(file, category, body, &entry_location, result);
    }
}

fn validate_category(file: &Path, category: Category, body: &Value, location: &str, result: &mut LintResult) {
    if category.key_style() == KeyStyle::Whole && body.get("matchers").is_some() {
        validate_group(file, body, location, result);
        return;
    }

    let Some(entries) = body.as_object() else {
        result.add_issue(
            LintIssue::error("E005", format!("Category '{}' must be an object", category.name()), file)
                .with_location(location),
        );
        return;
    };

    for (key, group) in entries {
        let group_location = format!("{location}.{key}");
        if category.key_style() == KeyStyle::Expression {
            check_path_expression(file, key, &group_location, result);
        }
        validate_group(file, group, &group_location, result);
    }
}

fn check_path_expression(file: &Path, key: &str, location: &str, result: &mut LintResult) {
    if let Err(e) = PathExpression::parse(key) {
        result.add_issue(
            LintIssue::error("E006", e.to_string(), file)
                .with_location(location)
                .with_suggestion("Use $.field, $['field name'], $.list[0], $.* or $.list[*]"),
        );
    }
}

/// Validate one rule group: a `matchers` array plus an optional `combine`.
pub fn validate_group(file: &Path, group: &Value, location: &str, result: &mut LintResult) {
    let Some(object) = group.as_object() else {
        result.add_issue(
            LintIssue::error("E007", "Rule group must be an object", file).with_location(location),
        );
        return;
    };

    if let Some(combine) = object.get("combine") {
        let valid = combine.as_str().and_then(RuleLogic::from_name).is_some();
        if !valid {
            result.add_issue(
                LintIssue::error("E008", format!("Invalid combine value {combine}"), file)
                    .with_location(format!("{location}.combine"))
                    .with_suggestion("Use \"AND\" or \"OR\""),
            );
        }
    }

    let matchers = match object.get("matchers") {
        Some(Value::Array(matchers)) => matchers,
        Some(_) => {
            result.add_issue(
                LintIssue::error("E007", "'matchers' must be an array", file)
                    .with_location(format!("{location}.matchers")),
            );
            return;
        }
        // A bare matcher definition in place of a group.
        None => {
            validate_matcher(file, group, location, result);
            return;
        }
    };

    if matchers.is_empty() {
        result.add_issue(
            LintIssue::error("E007", "Rule group has no matchers", file)
                .with_location(location)
                .with_suggestion("Add a matcher or remove the entry"),
        );
    }

    for (idx, matcher) in matchers.iter().enumerate() {
        validate_matcher(file, matcher, &format!("{location}.matchers[{idx}]"), result);
    }
}

/// Validate one matcher definition.
pub fn validate_matcher(file: &Path, matcher: &Value, location: &str, result: &mut LintResult) {
    if let Some(object) = matcher.as_object() {
        check_matcher_name(file, object, location, result);
    }

    match decode_rule(matcher) {
        Ok(rule) => check_rule(file, &rule, location, result),
        Err(ParseError::InvalidRegex { pattern, reason }) => result.add_issue(
            LintIssue::error("E009", format!("Invalid regex '{pattern}': {reason}"), file)
                .with_location(location)
                .with_suggestion("Check regex syntax"),
        ),
        Err(e) => result.add_issue(LintIssue::error("E010", e.to_string(), file).with_location(location)),
    }
}

fn check_matcher_name(file: &Path, object: &Map<String, Value>, location: &str, result: &mut LintResult) {
    let name = object.get("match").and_then(Value::as_str);
    if name.is_none() {
        let legacy = ["regex", "min", "max", "timestamp", "time", "date"]
            .iter()
            .any(|key| object.contains_key(*key));
        if !legacy {
            result.add_issue(
                LintIssue::warning("W003", "Matcher has no 'match' attribute, equality will be used", file)
                    .with_location(location)
                    .with_suggestion("Add \"match\": \"equality\" to make the intent explicit"),
            );
        }
        return;
    }

    for (deprecated, replacement) in DEPRECATED_MATCHERS {
        if name == Some(deprecated) {
            result.add_issue(
                LintIssue::warning("W004", format!("Matcher '{deprecated}' is deprecated"), file)
                    .with_location(location)
                    .with_suggestion(format!("Use '{replacement}' instead")),
            );
        }
    }
}

fn check_rule(file: &Path, rule: &MatchingRule, location: &str, result: &mut LintResult) {
    match rule {
        MatchingRule::Unknown(name) => result.add_issue(
            LintIssue::warning("W005", format!("Unknown matcher '{name}' will always pass"), file)
                .with_location(location),
        ),
        MatchingRule::EachKey(rules) | MatchingRule::EachValue(rules) => {
            for (idx, nested) in rules.iter().enumerate() {
                check_rule(file, nested, &format!("{location}.rules[{idx}]"), result);
            }
        }
        MatchingRule::ArrayContains(variants) => {
            for variant in variants {
                for (key, _, group) in variant.rules.entries() {
                    for (idx, nested) in group.rules().iter().enumerate() {
                        check_rule(
                            file,
                            nested,
                            &format!("{location}.variants[{}].{key}[{idx}]", variant.index),
                            result,
                        );
                    }
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lint(rules: Value) -> LintResult {
        let mut result = LintResult::new();
        validate_matching_rules(
            Path::new("contract.json"),
            &rules,
            "matchingRules",
            &mut result,
            &LintOptions::default(),
        );
        result
    }

    #[test]
    fn test_valid_rules_pass() {
        let result = lint(json!({
            "body": {
                "$.id": {"matchers": [{"match": "integer"}]},
                "$.items[*].name": {"matchers": [{"match": "type", "min": 1}], "combine": "AND"}
            },
            "header": {"Content-Type": {"matchers": [{"match": "regex", "regex": "application/json.*"}]}},
            "status": {"matchers": [{"match": "statusCode", "status": "success"}]}
        }));
        assert!(result.issues.is_empty(), "{:?}", result.issues);
    }

    #[test]
    fn test_invalid_path_and_regex() {
        let result = lint(json!({
            "body": {
                "$.a[": {"matchers": [{"match": "type"}]},
                "$.b": {"matchers": [{"match": "regex", "regex": "(unclosed"}]}
            }
        }));
        assert_eq!(result.codes(), vec!["E006", "E009"]);
    }

    #[test]
    fn test_empty_group_and_bad_combine() {
        let result = lint(json!({
            "body": {"$.a": {"matchers": [], "combine": "XOR"}}
        }));
        assert_eq!(result.codes(), vec!["E008", "E007"]);
    }

    #[test]
    fn test_min_greater_than_max() {
        let result = lint(json!({
            "body": {"$.a": {"matchers": [{"match": "type", "min": 5, "max": 2}]}}
        }));
        assert_eq!(result.codes(), vec!["E010"]);
        assert!(result.issues[0].message.contains("greater than max"));
    }

    #[test]
    fn test_unknown_and_deprecated_matchers() {
        let result = lint(json!({
            "body": {
                "$.a": {"matchers": [{"match": "fuzzy"}]},
                "$.b": {"matchers": [{"match": "real"}]},
                "$.c": {"matchers": [{"match": "eachValue", "rules": [{"match": "sparkly"}]}]}
            }
        }));
        assert_eq!(result.codes(), vec!["W005", "W004", "W005"]);
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn test_unknown_category_and_missing_match() {
        let result = lint(json!({
            "cookies": {},
            "body": {"$.a": {"matchers": [{"value": 1}]}}
        }));
        assert_eq!(result.codes(), vec!["W003", "W002"]);
    }

    #[test]
    fn test_unsupported_date_pattern() {
        let result = lint(json!({
            "body": {"$.when": {"matchers": [{"match": "date", "format": "yyyy-MM-dd'T"}]}}
        }));
        assert_eq!(result.codes(), vec!["E010"]);
        assert!(result.issues[0].message.contains("unterminated quote"));
    }

    #[test]
    fn test_contract_structure() {
        let mut result = LintResult::new();
        validate_contract(
            Path::new("contract.json"),
            &json!({"interactions": [{"request": {"method": "GET"}}]}),
            &mut result,
            &LintOptions::default(),
        );
        assert_eq!(result.codes(), vec!["W001", "E004"]);
    }

    #[test]
    fn test_legacy_layout_reported_when_verbose() {
        let mut result = LintResult::new();
        validate_matching_rules(
            Path::new("contract.json"),
            &json!({"$.body.id": {"match": "type"}}),
            "matchingRules",
            &mut result,
            &LintOptions { verbose: true },
        );
        assert_eq!(result.codes(), vec!["I001"]);
        assert!(result.is_valid());
    }
}
