//! Rule categories and rule resolution.
//!
//! A category holds the rules for one part of an interaction. Entries keep
//! their declaration order, which breaks ties between equally specific
//! expressions.

use super::rule::MatchingRule;
use crate::error::ParseError;
use crate::path::{DocPath, PathExpression, Specificity};
use serde::Serialize;
use tracing::trace;

/// The interaction part a set of rules applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Method,
    Path,
    Query,
    Header,
    Body,
    Status,
    Metadata,
    Content,
}

/// How entries of a category are keyed and looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStyle {
    /// Keys are path expressions matched against document paths.
    Expression,
    /// Keys are entry names (header, parameter, metadata key).
    Name { case_insensitive: bool },
    /// The category describes a single value; every entry applies.
    Whole,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Method,
        Category::Path,
        Category::Query,
        Category::Header,
        Category::Body,
        Category::Status,
        Category::Metadata,
        Category::Content,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Method => "method",
            Category::Path => "path",
            Category::Query => "query",
            Category::Header => "header",
            Category::Body => "body",
            Category::Status => "status",
            Category::Metadata => "metadata",
            Category::Content => "content",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "method" => Some(Category::Method),
            "path" => Some(Category::Path),
            "query" => Some(Category::Query),
            "header" | "headers" => Some(Category::Header),
            "body" => Some(Category::Body),
            "status" => Some(Category::Status),
            "metadata" => Some(Category::Metadata),
            "content" | "contents" => Some(Category::Content),
            _ => None,
        }
    }

    pub fn key_style(&self) -> KeyStyle {
        match self {
            Category::Body | Category::Content => KeyStyle::Expression,
            Category::Header => KeyStyle::Name {
                case_insensitive: true,
            },
            Category::Query | Category::Metadata => KeyStyle::Name {
                case_insensitive: false,
            },
            Category::Method | Category::Path | Category::Status => KeyStyle::Whole,
        }
    }
}

/// How the rules of a group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleLogic {
    /// Every rule must pass.
    #[default]
    And,
    /// At least one rule must pass.
    Or,
}

impl RuleLogic {
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("and") {
            Some(RuleLogic::And)
        } else if name.eq_ignore_ascii_case("or") {
            Some(RuleLogic::Or)
        } else {
            None
        }
    }
}

/// Rules attached to one key, with their combination logic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleGroup {
    rules: Vec<MatchingRule>,
    logic: RuleLogic,
}

impl RuleGroup {
    pub fn new(rules: Vec<MatchingRule>, logic: RuleLogic) -> Self {
        RuleGroup { rules, logic }
    }

    pub fn single(rule: MatchingRule) -> Self {
        RuleGroup::new(vec![rule], RuleLogic::And)
    }

    pub fn rules(&self) -> &[MatchingRule] {
        &self.rules
    }

    pub fn logic(&self) -> RuleLogic {
        self.logic
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RuleEntry {
    key: String,
    expression: PathExpression,
    group: RuleGroup,
}

/// A rule group that applies to a concrete path.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedGroup<'a> {
    pub expression: &'a PathExpression,
    pub group: &'a RuleGroup,
    /// Set when the group was declared on an ancestor of the path.
    pub cascaded: bool,
}

impl<'a> ResolvedGroup<'a> {
    /// Rules in effect at the path. Collection rules are dropped when the
    /// group is inherited from an ancestor.
    pub fn rules(&self) -> impl Iterator<Item = &'a MatchingRule> + 'a {
        let cascaded = self.cascaded;
        let group: &'a RuleGroup = self.group;
        group
            .rules()
            .iter()
            .filter(move |rule| !cascaded || rule.cascades())
    }

    pub fn logic(&self) -> RuleLogic {
        self.group.logic()
    }

    /// First rule in effect satisfying `predicate`.
    pub fn find(&self, predicate: impl Fn(&MatchingRule) -> bool) -> Option<&'a MatchingRule> {
        self.rules().find(|rule| predicate(rule))
    }
}

/// Mapping from keys to rule groups for one [`Category`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingRuleCategory {
    category: Category,
    entries: Vec<RuleEntry>,
}

impl MatchingRuleCategory {
    pub fn new(category: Category) -> Self {
        MatchingRuleCategory {
            category,
            entries: Vec::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Attach a group to `key`. A key that is already present gets the new
    /// rules appended to its group.
    pub fn add_group(&mut self, key: &str, group: RuleGroup) -> Result<(), ParseError> {
        if group.is_empty() {
            return Err(ParseError::InvalidRules(format!(
                "rule group for '{}' in category '{}' has no matchers",
                key,
                self.category.name()
            )));
        }
        let expression = match self.category.key_style() {
            KeyStyle::Expression => PathExpression::parse(key)?,
            KeyStyle::Name { .. } => PathExpression::key(key),
            KeyStyle::Whole => PathExpression::default(),
        };
        self.insert(key.to_string(), expression, group);
        Ok(())
    }

    pub fn add_rule(&mut self, key: &str, rule: MatchingRule) -> Result<(), ParseError> {
        self.add_group(key, RuleGroup::single(rule))
    }

    /// Builder form of [`add_rule`](Self::add_rule).
    pub fn with_rule(mut self, key: &str, rule: MatchingRule) -> Result<Self, ParseError> {
        self.add_rule(key, rule)?;
        Ok(self)
    }

    /// Copy of this category with `group` attached to `expression`.
    pub fn with_expression_group(&self, expression: PathExpression, group: RuleGroup) -> Self {
        let mut derived = self.clone();
        if !group.is_empty() {
            derived.insert(expression.to_string(), expression, group);
        }
        derived
    }

    fn insert(&mut self, key: String, expression: PathExpression, group: RuleGroup) {
        let style = self.category.key_style();
        let existing = self.entries.iter_mut().find(|entry| match style {
            KeyStyle::Expression => entry.expression == expression,
            KeyStyle::Name {
                case_insensitive: true,
            } => entry.key.eq_ignore_ascii_case(&key),
            KeyStyle::Name { .. } => entry.key == key,
            KeyStyle::Whole => true,
        });
        match existing {
            Some(entry) => entry.group.rules.extend(group.rules),
            None => self.entries.push(RuleEntry {
                key,
                expression,
                group,
            }),
        }
    }

    pub fn group(&self, key: &str) -> Option<&RuleGroup> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.group)
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PathExpression, &RuleGroup)> {
        self.entries
            .iter()
            .map(|entry| (entry.key.as_str(), &entry.expression, &entry.group))
    }

    /// Union of both categories. Keys defined in both get the rules of
    /// `self` followed by the rules of `other`.
    pub fn merge(&self, other: &MatchingRuleCategory) -> MatchingRuleCategory {
        let mut merged = self.clone();
        for entry in &other.entries {
            merged.insert(
                entry.key.clone(),
                entry.expression.clone(),
                entry.group.clone(),
            );
        }
        merged
    }

    /// Groups applying to `path`, most specific first.
    pub fn resolve(&self, path: &DocPath) -> Vec<ResolvedGroup<'_>> {
        let mut candidates: Vec<(Specificity, ResolvedGroup<'_>)> =
            match self.category.key_style() {
                KeyStyle::Expression => self
                    .entries
                    .iter()
                    .filter_map(|entry| {
                        let length = entry.expression.matched_length(path)?;
                        let cascaded = length < path.len();
                        if cascaded && !entry.group.rules.iter().any(MatchingRule::cascades) {
                            return None;
                        }
                        Some((
                            entry.expression.specificity(),
                            ResolvedGroup {
                                expression: &entry.expression,
                                group: &entry.group,
                                cascaded,
                            },
                        ))
                    })
                    .collect(),
                KeyStyle::Name { case_insensitive } => {
                    let Some(name) = path.first_key() else {
                        return Vec::new();
                    };
                    self.entries
                        .iter()
                        .filter(|entry| {
                            if case_insensitive {
                                entry.key.eq_ignore_ascii_case(name)
                            } else {
                                entry.key == name
                            }
                        })
                        .map(|entry| {
                            (
                                Specificity::default(),
                                ResolvedGroup {
                                    expression: &entry.expression,
                                    group: &entry.group,
                                    cascaded: false,
                                },
                            )
                        })
                        .collect()
                }
                KeyStyle::Whole => self
                    .entries
                    .iter()
                    .map(|entry| {
                        (
                            Specificity::default(),
                            ResolvedGroup {
                                expression: &entry.expression,
                                group: &entry.group,
                                cascaded: false,
                            },
                        )
                    })
                    .collect(),
            };

        // Stable: equal specificity keeps declaration order. `insert` keeps
        // one entry per expression or key, so no group appears twice.
        candidates.sort_by(|a, b| b.0.cmp(&a.0));

        trace!(
            "Resolved {} rule group(s) for {} in category {}",
            candidates.len(),
            path,
            self.category.name()
        );
        candidates.into_iter().map(|(_, group)| group).collect()
    }

    pub fn select_best(&self, path: &DocPath) -> Option<ResolvedGroup<'_>> {
        self.resolve(path).into_iter().next()
    }

    pub fn matcher_defined(&self, path: &DocPath) -> bool {
        !self.resolve(path).is_empty()
    }

    pub fn direct_matcher_defined(&self, path: &DocPath) -> bool {
        self.resolve(path).iter().any(|group| !group.cascaded)
    }

    pub fn type_matcher_defined(&self, path: &DocPath) -> bool {
        self.resolve(path)
            .iter()
            .any(|group| group.rules().any(MatchingRule::is_type_rule))
    }
}
