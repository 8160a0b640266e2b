//! Structural comparison of JSON trees.
//!
//! Walks expected and actual together. At every node the rule resolver is
//! consulted: leaves are judged by the node matchers, maps and lists by
//! the collection rules declared on them (each-key, each-value, values,
//! ignore-order, array-contains) or by positional and key-set comparison
//! when none apply.

use crate::alignment::{align, pad_to};
use crate::context::MatchingContext;
use crate::diff::structural_diff;
use crate::matchers::value::{type_of, value_of};
use crate::matchers::{match_group, match_rules, primitive};
use crate::mismatch::Mismatch;
use crate::path::{DocPath, PathExpression, PathToken};
use crate::rules::{
    ArrayVariant, Category, MatchingRule, MatchingRuleCategory, ResolvedGroup, RuleGroup,
    RuleLogic,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Compare two documents from their roots.
pub fn compare_documents(expected: &Value, actual: &Value, ctx: &MatchingContext<'_>) -> Vec<Mismatch> {
    compare(&DocPath::root(), expected, actual, ctx)
}

/// Compare the nodes at `path`, recursing into collections.
pub fn compare(
    path: &DocPath,
    expected: &Value,
    actual: &Value,
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => compare_maps(path, expected, actual, e, a, ctx),
        (Value::Array(e), Value::Array(a)) => compare_lists(path, expected, actual, e, a, ctx),
        (Value::Object(_) | Value::Array(_), _) => {
            vec![ctx
                .node(path)
                .mismatch(
                    expected,
                    actual,
                    format!(
                        "Type mismatch: Expected {} {} but received {} {}",
                        collection_name(expected),
                        value_of(expected),
                        type_of(actual),
                        value_of(actual)
                    ),
                )
                .with_diff(structural_diff(expected, actual))]
        }
        _ => compare_values(path, expected, actual, ctx),
    }
}

fn collection_name(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "List",
        _ => "Map",
    }
}

fn compare_values(
    path: &DocPath,
    expected: &Value,
    actual: &Value,
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let node = ctx.node(path);
    match ctx.rules().select_best(path) {
        Some(group) => {
            debug!(
                "Comparing {} using rules declared at {}",
                path, group.expression
            );
            match_group(&group, &node, expected, actual)
        }
        None => {
            debug!("Comparing {} by equality", path);
            primitive::equality(&node, expected, actual)
        }
    }
}

/// Value rules of a group applied to a collection node. Equality is left
/// to the element-wise walk.
fn collection_node_rules(
    group: &ResolvedGroup<'_>,
    path: &DocPath,
    expected: &Value,
    actual: &Value,
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let rules: Vec<&MatchingRule> = group
        .rules()
        .filter(|rule| !matches!(rule, MatchingRule::Equality))
        .collect();
    if rules.is_empty() {
        return Vec::new();
    }
    let node = ctx.node(path).with_cascaded(group.cascaded);
    match_rules(rules, group.logic(), &node, expected, actual)
}

fn direct_group<'r>(ctx: &'r MatchingContext<'_>, path: &DocPath) -> Option<ResolvedGroup<'r>> {
    ctx.rules()
        .resolve(path)
        .into_iter()
        .find(|group| !group.cascaded)
}

fn compare_maps(
    path: &DocPath,
    expected: &Value,
    actual: &Value,
    e: &Map<String, Value>,
    a: &Map<String, Value>,
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    if let Some(group) = ctx.rules().select_best(path) {
        mismatches.extend(collection_node_rules(&group, path, expected, actual, ctx));
    }

    let direct = direct_group(ctx, path);
    let each_key = direct.and_then(|g| g.find(|r| matches!(r, MatchingRule::EachKey(_))));
    let each_value = direct.and_then(|g| g.find(|r| matches!(r, MatchingRule::EachValue(_))));
    let values = direct.is_some_and(|g| g.find(|r| matches!(r, MatchingRule::Values)).is_some())
        && ctx.values_matcher_enabled();
    let keys_are_free = each_key.is_some() || each_value.is_some() || values;

    if e.is_empty() && !a.is_empty() && !ctx.allow_unexpected_keys() && !keys_are_free {
        mismatches.push(
            ctx.node(path)
                .mismatch(
                    expected,
                    actual,
                    format!("Expected an empty Map but received {}", value_of(actual)),
                )
                .with_diff(structural_diff(expected, actual)),
        );
        return mismatches;
    }

    if let Some(MatchingRule::EachKey(rules)) = each_key {
        for key in a.keys() {
            let key_path = path.field(key);
            let key_value = Value::String(key.clone());
            let node = ctx.node(&key_path);
            mismatches.extend(match_rules(rules, RuleLogic::And, &node, &key_value, &key_value));
        }
    } else if !keys_are_free {
        mismatches.extend(match_keys(path, expected, actual, e, a, ctx));
    }

    if let Some(MatchingRule::EachValue(rules)) = each_value {
        let derived = ctx.with_rules_at(
            PathExpression::from(path).child(PathToken::Star),
            RuleGroup::new(rules.clone(), RuleLogic::And),
        );
        mismatches.extend(compare_entries_by_template(path, e, a, &derived));
    } else if values {
        debug!("Comparing map values at {} by type", path);
        let derived = ctx.with_rules_at(
            PathExpression::from(path).child(PathToken::Star),
            RuleGroup::single(MatchingRule::Type),
        );
        mismatches.extend(compare_entries_by_template(path, e, a, &derived));
    } else {
        for (key, expected_value) in e {
            if let Some(actual_value) = a.get(key) {
                mismatches.extend(compare(&path.field(key), expected_value, actual_value, ctx));
            }
        }
    }
    mismatches
}

/// Compare every actual entry against the expected entry with the same key,
/// or the first expected entry when the key was not in the example. With
/// no example at all, each value only has to satisfy the rules on its own.
fn compare_entries_by_template(
    path: &DocPath,
    e: &Map<String, Value>,
    a: &Map<String, Value>,
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let first = e.values().next();
    a.iter()
        .flat_map(|(key, actual_value)| {
            let template = e.get(key).or(first).unwrap_or(actual_value);
            compare(&path.field(key), template, actual_value, ctx)
        })
        .collect()
}

fn match_keys(
    path: &DocPath,
    expected: &Value,
    actual: &Value,
    e: &Map<String, Value>,
    a: &Map<String, Value>,
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let missing: Vec<&str> = e
        .keys()
        .filter(|key| !a.contains_key(*key))
        .map(String::as_str)
        .collect();

    let message = if ctx.allow_unexpected_keys() {
        if missing.is_empty() {
            return Vec::new();
        }
        format!(
            "Actual map is missing the following keys: {}",
            missing.join(", ")
        )
    } else {
        let unexpected = a.keys().any(|key| !e.contains_key(key));
        if missing.is_empty() && !unexpected {
            return Vec::new();
        }
        let mut expected_keys: Vec<&str> = e.keys().map(String::as_str).collect();
        let mut actual_keys: Vec<&str> = a.keys().map(String::as_str).collect();
        expected_keys.sort_unstable();
        actual_keys.sort_unstable();
        format!(
            "Expected a Map with keys [{}] but received one with keys [{}]",
            expected_keys.join(", "),
            actual_keys.join(", ")
        )
    };

    vec![ctx
        .node(path)
        .mismatch(expected, actual, message)
        .with_diff(structural_diff(expected, actual))]
}

fn compare_lists(
    path: &DocPath,
    expected: &Value,
    actual: &Value,
    e: &[Value],
    a: &[Value],
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let Some(group) = ctx.rules().select_best(path) else {
        return compare_lists_positionally(path, expected, actual, e, a, ctx);
    };

    let mut mismatches = collection_node_rules(&group, path, expected, actual, ctx);
    if e.is_empty() {
        return mismatches;
    }

    let direct = direct_group(ctx, path);
    let rule = |predicate: fn(&MatchingRule) -> bool| direct.and_then(|g| g.find(predicate));

    if let Some(MatchingRule::EqualsIgnoreOrder { min, max }) =
        rule(|r| matches!(r, MatchingRule::EqualsIgnoreOrder { .. }))
    {
        let bounded = min.is_some() || max.is_some();
        mismatches.extend(compare_unordered(path, e, a, bounded, ctx));
    } else if let Some(MatchingRule::ArrayContains(variants)) =
        rule(|r| matches!(r, MatchingRule::ArrayContains(_)))
    {
        mismatches.extend(compare_array_contains(path, e, a, variants, ctx));
    } else if let Some(MatchingRule::EachValue(rules)) =
        rule(|r| matches!(r, MatchingRule::EachValue(_)))
    {
        let derived = ctx.with_rules_at(
            PathExpression::from(path).child(PathToken::StarIndex),
            RuleGroup::new(rules.clone(), RuleLogic::And),
        );
        mismatches.extend(compare_padded(path, e, a, &derived));
    } else if rule(|r| matches!(r, MatchingRule::Values)).is_some() && ctx.values_matcher_enabled() {
        debug!("Comparing list elements at {} by type", path);
        let derived = ctx.with_rules_at(
            PathExpression::from(path).child(PathToken::StarIndex),
            RuleGroup::single(MatchingRule::Type),
        );
        mismatches.extend(compare_padded(path, e, a, &derived));
    } else {
        mismatches.extend(compare_padded(path, e, a, ctx));
    }
    mismatches
}

/// Compare each actual element against the expected element at the same
/// index, the expected list padded with its first element.
fn compare_padded(path: &DocPath, e: &[Value], a: &[Value], ctx: &MatchingContext<'_>) -> Vec<Mismatch> {
    let Some(first) = e.first() else {
        return Vec::new();
    };
    pad_to(e, a.len(), first.clone())
        .iter()
        .zip(a)
        .enumerate()
        .flat_map(|(index, (expected, actual))| compare(&path.index(index), expected, actual, ctx))
        .collect()
}

fn compare_lists_positionally(
    path: &DocPath,
    expected: &Value,
    actual: &Value,
    e: &[Value],
    a: &[Value],
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    if e.is_empty() && !a.is_empty() {
        return vec![ctx
            .node(path)
            .mismatch(
                expected,
                actual,
                format!("Expected an empty List but received {}", value_of(actual)),
            )
            .with_diff(structural_diff(expected, actual))];
    }

    let mut mismatches = Vec::new();
    for (index, expected_item) in e.iter().enumerate() {
        let item_path = path.index(index);
        match a.get(index) {
            Some(actual_item) => mismatches.extend(compare(&item_path, expected_item, actual_item, ctx)),
            None => mismatches.push(Mismatch::new(
                ctx.kind(),
                item_path,
                value_of(expected_item),
                "",
                format!("Expected {} but was missing", value_of(expected_item)),
            )),
        }
    }

    if e.len() != a.len() {
        mismatches.push(
            ctx.node(path)
                .mismatch(
                    expected,
                    actual,
                    format!(
                        "Expected a List with {} elements but received {} elements",
                        e.len(),
                        a.len()
                    ),
                )
                .with_diff(structural_diff(expected, actual)),
        );
    }
    mismatches
}

fn compare_unordered(
    path: &DocPath,
    e: &[Value],
    a: &[Value],
    bounded: bool,
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let limit = ctx.max_unordered_elements();
    let alignment = if a.len() <= limit {
        debug!(
            "Aligning {} expected against {} actual element(s) at {} ignoring order",
            e.len(),
            a.len(),
            path
        );
        align(e.len(), a.len(), |ei, ai| compare(&path.index(ai), &e[ei], &a[ai], ctx))
    } else {
        None
    };

    let Some(alignment) = alignment else {
        warn!(
            "List at {} has {} elements, more than the {} that can be aligned ignoring order; comparing by position",
            path,
            a.len(),
            limit
        );
        return e
            .iter()
            .zip(a)
            .enumerate()
            .flat_map(|(index, (expected, actual))| compare(&path.index(index), expected, actual, ctx))
            .collect();
    };

    let mut mismatches = alignment.mismatches;
    if bounded {
        for index in alignment.missing_expected {
            mismatches.push(Mismatch::new(
                ctx.kind(),
                path.clone(),
                value_of(&e[index]),
                "",
                format!(
                    "Expected element {} ({}) was not found in the actual list",
                    index,
                    value_of(&e[index])
                ),
            ));
        }
    }
    mismatches
}

fn compare_array_contains(
    path: &DocPath,
    e: &[Value],
    a: &[Value],
    variants: &[ArrayVariant],
    ctx: &MatchingContext<'_>,
) -> Vec<Mismatch> {
    let implicit: Vec<ArrayVariant>;
    let variants = if variants.is_empty() {
        implicit = (0..e.len())
            .map(|index| ArrayVariant {
                index,
                rules: MatchingRuleCategory::new(Category::Body),
            })
            .collect();
        &implicit
    } else {
        variants
    };

    let mut mismatches = Vec::new();
    for variant in variants.iter().filter(|v| v.index >= e.len()) {
        mismatches.push(Mismatch::new(
            ctx.kind(),
            path.clone(),
            "",
            "",
            format!(
                "Array contains variant {} refers to a missing expected element; the expected list has {} element(s)",
                variant.index,
                e.len()
            ),
        ));
    }

    for (index, item) in a.iter().enumerate() {
        let matched = variants
            .iter()
            .filter(|variant| variant.index < e.len())
            .any(|variant| {
                let variant_ctx = ctx.for_rules(&variant.rules);
                compare_documents(&e[variant.index], item, &variant_ctx).is_empty()
            });
        if !matched {
            mismatches.push(Mismatch::new(
                ctx.kind(),
                path.index(index),
                "",
                value_of(item),
                format!(
                    "Actual list item {} ({}) did not match any of the expected variants",
                    index,
                    value_of(item)
                ),
            ));
        }
    }
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Feature, FeatureSet};
    use crate::mismatch::MismatchKind;
    use crate::rules::NumberKind;
    use serde_json::json;
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn rules() -> MatchingRuleCategory {
        MatchingRuleCategory::new(Category::Body)
    }

    fn run(rules: &MatchingRuleCategory, expected: Value, actual: Value) -> Vec<Mismatch> {
        let ctx = MatchingContext::new(rules, MismatchKind::Body)
            .with_features(Arc::new(FeatureSet::default()));
        compare_documents(&expected, &actual, &ctx)
    }

    #[test]
    fn test_equal_documents() {
        let doc = json!({"a": 1, "b": [1, 2, {"c": "d"}]});
        assert!(run(&rules(), doc.clone(), doc).is_empty());
    }

    #[test]
    fn test_leaf_difference_reported_at_leaf() {
        let mismatches = run(&rules(), json!({"a": {"b": 1}}), json!({"a": {"b": 2}}));
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path.to_string(), "$.a.b");
    }

    #[test]
    fn test_unexpected_and_missing_keys() {
        let mismatches = run(&rules(), json!({"a": 1, "b": 2}), json!({"a": 1, "c": 3}));
        assert_eq!(mismatches.len(), 1);
        assert_eq!(
            mismatches[0].message,
            "Expected a Map with keys [a, b] but received one with keys [a, c]"
        );
        assert!(mismatches[0].diff.is_some());
    }

    #[test]
    fn test_allow_unexpected_keys_reports_only_missing() {
        let rules = rules();
        let ctx = MatchingContext::new(&rules, MismatchKind::Body).with_allow_unexpected_keys(true);
        let mismatches = compare_documents(&json!({"a": 1, "b": 2}), &json!({"a": 1, "c": 3}), &ctx);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(
            mismatches[0].message,
            "Actual map is missing the following keys: b"
        );
    }

    #[test]
    fn test_list_length_difference() {
        let mismatches = run(&rules(), json!([1, 2]), json!([1, 2, 3]));
        assert_eq!(mismatches.len(), 1);
        assert_eq!(
            mismatches[0].message,
            "Expected a List with 2 elements but received 3 elements"
        );
    }

    #[test]
    fn test_missing_list_element() {
        let mismatches = run(&rules(), json!([1, 2]), json!([1]));
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].path.to_string(), "$[1]");
        assert_eq!(mismatches[0].message, "Expected 2 but was missing");
    }

    #[test]
    fn test_collection_vs_scalar_is_type_mismatch() {
        let mismatches = run(&rules(), json!({"a": [1]}), json!({"a": "x"}));
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].message.starts_with("Type mismatch: Expected List [1]"));
    }

    #[test]
    fn test_collection_rule_does_not_hide_scalar_actual() {
        let rules = rules()
            .with_rule("$.list", MatchingRule::EachValue(vec![MatchingRule::Type]))
            .unwrap()
            .with_rule("$.events", MatchingRule::ArrayContains(Vec::new()))
            .unwrap()
            .with_rule("$.scores", MatchingRule::EachKey(vec![MatchingRule::Type]))
            .unwrap();
        let expected = json!({"list": [1, 2, 3], "events": [{"id": 1}], "scores": {"a": 1}});

        let mismatches = run(&rules, expected.clone(), json!({"list": "x", "events": 42, "scores": true}));
        let paths: Vec<String> = mismatches.iter().map(|m| m.path.to_string()).collect();
        assert_eq!(paths, vec!["$.events", "$.list", "$.scores"]);
        assert!(mismatches
            .iter()
            .all(|m| m.message.starts_with("Type mismatch: Expected")));

        let matching = json!({"list": [7], "events": [{"id": 1}], "scores": {"b": 2}});
        assert!(run(&rules, expected, matching).is_empty());
    }

    #[test]
    #[traced_test]
    fn test_unordered_falls_back_to_position_past_limit() {
        let rules = rules()
            .with_rule("$", MatchingRule::EqualsIgnoreOrder { min: None, max: None })
            .unwrap();
        let expected = json!([1, 2, 3]);
        let actual = json!([3, 1, 2]);

        let ctx = MatchingContext::new(&rules, MismatchKind::Body)
            .with_features(Arc::new(FeatureSet::default()))
            .with_max_unordered_elements(2);
        let mismatches = compare_documents(&expected, &actual, &ctx);
        let paths: Vec<String> = mismatches.iter().map(|m| m.path.to_string()).collect();
        assert_eq!(paths, vec!["$[0]", "$[1]", "$[2]"]);
        assert!(logs_contain("comparing by position"));

        let ctx = ctx.with_max_unordered_elements(3);
        assert!(compare_documents(&expected, &actual, &ctx).is_empty());
    }

    #[test]
    fn test_type_rule_cascades_into_list() {
        let rules = rules().with_rule("$.items", MatchingRule::min(1)).unwrap();
        let expected = json!({"items": [{"id": 1, "name": "a"}]});
        let actual = json!({"items": [{"id": 2, "name": "b"}, {"id": 3, "name": "c"}]});
        assert!(run(&rules, expected.clone(), actual).is_empty());

        let short = json!({"items": []});
        let mismatches = run(&rules, expected, short);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path.to_string(), "$.items");
    }

    #[test]
    fn test_padded_elements_checked_against_first() {
        let rules = rules().with_rule("$.items", MatchingRule::Type).unwrap();
        let mismatches = run(&rules, json!({"items": [1]}), json!({"items": [2, "x"]}));
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path.to_string(), "$.items[1]");
    }

    #[test]
    fn test_each_value_on_map() {
        let rules = rules()
            .with_rule(
                "$.scores",
                MatchingRule::EachValue(vec![MatchingRule::NumberType(NumberKind::Integer)]),
            )
            .unwrap();
        let expected = json!({"scores": {"alice": 1}});
        assert!(run(&rules, expected.clone(), json!({"scores": {"bob": 5, "carol": 7}})).is_empty());
        let mismatches = run(&rules, expected, json!({"scores": {"bob": 5.5}}));
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path.to_string(), "$.scores.bob");
    }

    #[test]
    fn test_each_key_on_map() {
        let rules = rules()
            .with_rule(
                "$.ids",
                MatchingRule::EachKey(vec![MatchingRule::regex("[a-z]+").unwrap()]),
            )
            .unwrap();
        let mismatches = run(&rules, json!({"ids": {"abc": 1}}), json!({"ids": {"abc": 1, "X9": 1}}));
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].message, "Expected 'X9' to match '[a-z]+'");
    }

    #[test]
    fn test_ignore_order_permutation() {
        let rules = rules()
            .with_rule("$", MatchingRule::EqualsIgnoreOrder { min: None, max: None })
            .unwrap();
        assert!(run(&rules, json!([1, 2, 3]), json!([3, 1, 2])).is_empty());
        let mismatches = run(&rules, json!([1, 2, 3]), json!([3, 9, 1]));
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path.to_string(), "$[1]");
    }

    #[test]
    fn test_ignore_order_length_rule() {
        let rules = rules()
            .with_rule("$", MatchingRule::EqualsIgnoreOrder { min: None, max: None })
            .unwrap();
        let mismatches = run(&rules, json!([1, 2]), json!([2, 1, 1]));
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].message, "Expected [2,1,1] to have 2 elements");
    }

    #[test]
    fn test_ignore_order_with_min_reports_missing() {
        let rules = rules()
            .with_rule("$", MatchingRule::EqualsIgnoreOrder { min: Some(1), max: None })
            .unwrap();
        assert!(run(&rules, json!([1]), json!([4, 1, 4])).is_empty());
        let mismatches = run(&rules, json!([1, 2]), json!([2]));
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].message.contains("was not found"));
    }

    #[test]
    fn test_array_contains() {
        let variant_rules = rules()
            .with_rule("$.id", MatchingRule::NumberType(NumberKind::Integer))
            .unwrap();
        let rule = MatchingRule::ArrayContains(vec![
            ArrayVariant { index: 0, rules: variant_rules },
            ArrayVariant { index: 1, rules: rules() },
        ]);
        let rules = rules().with_rule("$.events", rule).unwrap();
        let expected = json!({"events": [{"id": 1}, {"kind": "ping"}]});

        let actual = json!({"events": [{"kind": "ping"}, {"id": 42}, {"id": 7}]});
        assert!(run(&rules, expected.clone(), actual).is_empty());

        let actual = json!({"events": [{"id": 1}, {"kind": "pong"}]});
        let mismatches = run(&rules, expected, actual);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path.to_string(), "$.events[1]");
    }

    #[test]
    fn test_values_rule_requires_toggle() {
        let rules = rules().with_rule("$", MatchingRule::Values).unwrap();
        let expected = json!({"a": 1});
        let actual = json!({"b": 2, "c": 3});

        let off = MatchingContext::new(&rules, MismatchKind::Body)
            .with_features(Arc::new(FeatureSet::default()));
        assert!(!compare_documents(&expected, &actual, &off).is_empty());

        let on = MatchingContext::new(&rules, MismatchKind::Body).with_features(Arc::new(
            FeatureSet::default().with(Feature::UseValuesMatcher, true),
        ));
        assert!(compare_documents(&expected, &actual, &on).is_empty());
        assert_eq!(
            compare_documents(&expected, &json!({"b": "x"}), &on).len(),
            1
        );
    }
}
