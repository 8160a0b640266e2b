//! Node matchers.
//!
//! [`match_rule`] applies one rule to one node; [`match_rules`] combines a
//! group with AND/OR logic. Rules that steer collection traversal
//! (each-key, each-value, array-contains, values) are no-ops here and are
//! handled by the structural comparator in [`crate::body`].

pub mod primitive;
pub mod temporal;
pub mod value;

use crate::mismatch::{Mismatch, MismatchKind};
use crate::path::DocPath;
use crate::rules::{MatchingRule, ResolvedGroup, RuleLogic};
use serde_json::Value;
use tracing::{debug, warn};

/// Where a matcher is being applied.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'a> {
    pub path: &'a DocPath,
    pub kind: MismatchKind,
    /// The rule was inherited from an ancestor path.
    pub cascaded: bool,
    pub coerce_numbers: bool,
}

impl<'a> NodeContext<'a> {
    pub fn new(path: &'a DocPath, kind: MismatchKind) -> Self {
        NodeContext {
            path,
            kind,
            cascaded: false,
            coerce_numbers: false,
        }
    }

    pub fn with_cascaded(mut self, cascaded: bool) -> Self {
        self.cascaded = cascaded;
        self
    }

    pub fn with_coerce_numbers(mut self, coerce: bool) -> Self {
        self.coerce_numbers = coerce;
        self
    }

    pub fn mismatch(&self, expected: &Value, actual: &Value, message: String) -> Mismatch {
        Mismatch::new(
            self.kind,
            self.path.clone(),
            value::value_of(expected),
            value::value_of(actual),
            message,
        )
    }
}

/// Apply one rule to a node.
pub fn match_rule(
    rule: &MatchingRule,
    node: &NodeContext<'_>,
    expected: &Value,
    actual: &Value,
) -> Vec<Mismatch> {
    debug!(
        "Applying {} matcher at {} (cascaded: {})",
        rule.name(),
        node.path,
        node.cascaded
    );
    match rule {
        MatchingRule::Equality => primitive::equality(node, expected, actual),
        MatchingRule::Type => primitive::same_type(node, expected, actual),
        MatchingRule::Regex(regex) => primitive::regex(node, regex, expected, actual),
        MatchingRule::Include(substring) => primitive::include(node, substring, expected, actual),
        MatchingRule::NumberType(kind) => primitive::number(node, *kind, expected, actual),
        MatchingRule::MinMaxLength { min, max } => {
            primitive::min_max(node, *min, *max, expected, actual)
        }
        MatchingRule::DateTime { kind, format } => {
            primitive::temporal(node, *kind, format, expected, actual)
        }
        MatchingRule::EqualsIgnoreOrder { min, max } => {
            primitive::ignore_order_size(node, *min, *max, expected, actual)
        }
        MatchingRule::Null => primitive::null(node, expected, actual),
        MatchingRule::Boolean => primitive::boolean(node, expected, actual),
        MatchingRule::NotEmpty => primitive::not_empty(node, expected, actual),
        MatchingRule::Semver => primitive::semver(node, expected, actual),
        MatchingRule::StatusCode(class) => primitive::status_code(node, class, expected, actual),
        MatchingRule::EachKey(_)
        | MatchingRule::EachValue(_)
        | MatchingRule::ArrayContains(_)
        | MatchingRule::Values => Vec::new(),
        MatchingRule::Unknown(name) => {
            warn!(
                "Unsupported matcher '{}' at {}, treating it as passed",
                name, node.path
            );
            Vec::new()
        }
    }
}

/// Apply a set of rules with AND/OR logic.
///
/// AND reports every mismatch from every rule. OR passes when any rule
/// passes, and otherwise reports every rule's mismatches.
pub fn match_rules<'r>(
    rules: impl IntoIterator<Item = &'r MatchingRule>,
    logic: RuleLogic,
    node: &NodeContext<'_>,
    expected: &Value,
    actual: &Value,
) -> Vec<Mismatch> {
    match logic {
        RuleLogic::And => rules
            .into_iter()
            .flat_map(|rule| match_rule(rule, node, expected, actual))
            .collect(),
        RuleLogic::Or => {
            let mut mismatches = Vec::new();
            for rule in rules {
                let result = match_rule(rule, node, expected, actual);
                if result.is_empty() {
                    return Vec::new();
                }
                mismatches.extend(result);
            }
            mismatches
        }
    }
}

/// Apply a resolved group, honouring its cascade flag.
pub fn match_group(
    group: &ResolvedGroup<'_>,
    node: &NodeContext<'_>,
    expected: &Value,
    actual: &Value,
) -> Vec<Mismatch> {
    let node = node.with_cascaded(group.cascaded);
    match_rules(group.rules(), group.logic(), &node, expected, actual)
}
