//! Contract verification matching engine.
//!
//! Compares actual requests, responses and messages against the expected
//! ones recorded in a contract, guided by the matching rules the contract
//! declares. The result is a list of [`Mismatch`] records, each pinned to
//! the document path where the difference was found.

// ===== Rule model =====
pub mod path;
pub mod rules;

// ===== Matching engine =====
pub mod alignment;
pub mod body;
pub mod context;
pub mod diff;
pub mod matchers;
pub mod matching;
pub mod mismatch;

// ===== Contract model and configuration =====
pub mod config;
pub mod error;
pub mod features;
pub mod interaction;

pub use config::MatchingConfig;
pub use context::MatchingContext;
pub use error::{ConfigError, FeatureError, ParseError};
pub use features::{Feature, FeatureSet};
pub use interaction::{Body, HttpRequest, HttpResponse, Message};
pub use matching::{match_message, match_request, match_response, CategoryResult, MatchResult};
pub use mismatch::{Mismatch, MismatchKind};
pub use path::{DocPath, PathExpression};
pub use rules::{Category, MatchingRule, MatchingRuleCategory, MatchingRules, RuleGroup, RuleLogic};
