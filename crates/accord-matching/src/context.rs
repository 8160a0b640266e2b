//! Per-call matching context.

use crate::alignment::{DEFAULT_MAX_UNORDERED_ELEMENTS, MAX_COMBINATION_SIZE};
use crate::features::{self, Feature, FeatureSet};
use crate::matchers::NodeContext;
use crate::mismatch::MismatchKind;
use crate::path::{DocPath, PathExpression};
use crate::rules::{MatchingRuleCategory, RuleGroup};
use std::borrow::Cow;
use std::sync::Arc;

/// Rules and switches in effect while comparing one interaction part.
///
/// Built once per call. Derived contexts (for each-value children or
/// array-contains variants) share the feature snapshot of their parent.
#[derive(Debug, Clone)]
pub struct MatchingContext<'a> {
    rules: Cow<'a, MatchingRuleCategory>,
    kind: MismatchKind,
    allow_unexpected_keys: bool,
    max_unordered_elements: usize,
    features: Arc<FeatureSet>,
}

impl<'a> MatchingContext<'a> {
    /// Context over `rules` with the current feature toggles.
    pub fn new(rules: &'a MatchingRuleCategory, kind: MismatchKind) -> Self {
        MatchingContext {
            rules: Cow::Borrowed(rules),
            kind,
            allow_unexpected_keys: false,
            max_unordered_elements: DEFAULT_MAX_UNORDERED_ELEMENTS,
            features: features::snapshot(),
        }
    }

    pub fn with_allow_unexpected_keys(mut self, allow: bool) -> Self {
        self.allow_unexpected_keys = allow;
        self
    }

    pub fn with_features(mut self, features: Arc<FeatureSet>) -> Self {
        self.features = features;
        self
    }

    /// Arrays with more actual elements than this are compared
    /// positionally under an unordered rule.
    pub fn with_max_unordered_elements(mut self, max: usize) -> Self {
        self.max_unordered_elements = max.min(MAX_COMBINATION_SIZE);
        self
    }

    pub fn rules(&self) -> &MatchingRuleCategory {
        &self.rules
    }

    pub fn kind(&self) -> MismatchKind {
        self.kind
    }

    pub fn allow_unexpected_keys(&self) -> bool {
        self.allow_unexpected_keys
    }

    pub fn max_unordered_elements(&self) -> usize {
        self.max_unordered_elements
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn values_matcher_enabled(&self) -> bool {
        self.features.is_set(Feature::UseValuesMatcher)
    }

    pub fn node<'p>(&self, path: &'p DocPath) -> NodeContext<'p> {
        NodeContext::new(path, self.kind)
            .with_coerce_numbers(self.features.is_set(Feature::CoerceNumbers))
    }

    /// Copy of this context with `group` added at `expression`.
    pub fn with_rules_at(&self, expression: PathExpression, group: RuleGroup) -> MatchingContext<'a> {
        MatchingContext {
            rules: Cow::Owned(self.rules.with_expression_group(expression, group)),
            kind: self.kind,
            allow_unexpected_keys: self.allow_unexpected_keys,
            max_unordered_elements: self.max_unordered_elements,
            features: Arc::clone(&self.features),
        }
    }

    /// Same switches over a different rule set.
    pub fn for_rules<'b>(&self, rules: &'b MatchingRuleCategory) -> MatchingContext<'b> {
        MatchingContext {
            rules: Cow::Borrowed(rules),
            kind: self.kind,
            allow_unexpected_keys: self.allow_unexpected_keys,
            max_unordered_elements: self.max_unordered_elements,
            features: Arc::clone(&self.features),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Category, MatchingRule};

    #[test]
    fn test_with_rules_at_leaves_parent_untouched() {
        let rules = MatchingRuleCategory::new(Category::Body);
        let ctx = MatchingContext::new(&rules, MismatchKind::Body);
        let expression = PathExpression::parse("$.a.*").unwrap();
        let derived = ctx.with_rules_at(expression, RuleGroup::single(MatchingRule::Type));
        assert!(ctx.rules().is_empty());
        assert_eq!(derived.rules().len(), 1);
    }

    #[test]
    fn test_node_carries_coercion_switch() {
        let rules = MatchingRuleCategory::new(Category::Body);
        let features = Arc::new(FeatureSet::default().with(Feature::CoerceNumbers, true));
        let ctx = MatchingContext::new(&rules, MismatchKind::Body).with_features(features);
        let path = DocPath::root();
        assert!(ctx.node(&path).coerce_numbers);
        assert!(!ctx.values_matcher_enabled());
    }

    #[test]
    fn test_default_unordered_limit() {
        let rules = MatchingRuleCategory::new(Category::Body);
        let ctx = MatchingContext::new(&rules, MismatchKind::Body);
        assert_eq!(ctx.max_unordered_elements(), DEFAULT_MAX_UNORDERED_ELEMENTS);
    }

    #[test]
    fn test_unordered_limit_is_capped() {
        let rules = MatchingRuleCategory::new(Category::Body);
        let ctx = MatchingContext::new(&rules, MismatchKind::Body).with_max_unordered_elements(500);
        assert_eq!(ctx.max_unordered_elements(), MAX_COMBINATION_SIZE);
    }
}
