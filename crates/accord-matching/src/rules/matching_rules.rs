//! The full rule set of one interaction part, keyed by category.

use super::category::{Category, MatchingRuleCategory};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchingRules {
    categories: BTreeMap<Category, MatchingRuleCategory>,
}

impl MatchingRules {
    pub fn new() -> Self {
        MatchingRules::default()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(MatchingRuleCategory::is_empty)
    }

    pub fn category(&self, category: Category) -> Option<&MatchingRuleCategory> {
        self.categories.get(&category)
    }

    /// Rules for `category`, or an empty category when none were declared.
    pub fn rules_for(&self, category: Category) -> MatchingRuleCategory {
        self.categories
            .get(&category)
            .cloned()
            .unwrap_or_else(|| MatchingRuleCategory::new(category))
    }

    pub fn category_mut(&mut self, category: Category) -> &mut MatchingRuleCategory {
        self.categories
            .entry(category)
            .or_insert_with(|| MatchingRuleCategory::new(category))
    }

    pub fn add_category(&mut self, rules: MatchingRuleCategory) {
        let category = rules.category();
        let merged = match self.categories.get(&category) {
            Some(existing) => existing.merge(&rules),
            None => rules,
        };
        self.categories.insert(category, merged);
    }

    pub fn categories(&self) -> impl Iterator<Item = &MatchingRuleCategory> {
        self.categories.values()
    }

    pub fn merge(&self, other: &MatchingRules) -> MatchingRules {
        let mut merged = self.clone();
        for rules in other.categories.values() {
            merged.add_category(rules.clone());
        }
        merged
    }
}
