//! Matching rules, rule groups and categories.
//!
//! Rules are decoded and compiled once per loaded contract, then shared
//! read-only by every verification.

mod category;
mod decode;
mod matching_rules;
mod rule;

pub use category::{
    Category, KeyStyle, MatchingRuleCategory, ResolvedGroup, RuleGroup, RuleLogic,
};
pub use decode::{
    decode_category, decode_group, decode_rule, deserialize_matching_rules,
};
pub use matching_rules::MatchingRules;
pub use rule::{ArrayVariant, MatchingRule, NumberKind, RegexRule, StatusClass, TemporalKind};
