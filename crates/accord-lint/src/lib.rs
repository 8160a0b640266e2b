//! Matching rule linter for Accord contracts.
//!
//! Checks the `matchingRules` sections of contract files before they are
//! used for verification: path expressions that do not parse, regexes that
//! do not compile, empty rule groups, contradictory bounds, and matcher
//! kinds the engine does not know.
//!
//! # Example
//!
//! ```no_run
//! use accord_lint::{lint_file, LintOptions};
//! use std::path::Path;
//!
//! let result = lint_file(Path::new("contracts/orders.json"), &LintOptions::default());
//! if result.has_errors() {
//!     eprintln!("Found {} errors", result.errors);
//! }
//! ```

mod types;
mod validator;

use std::path::Path;

pub use types::{LintIssue, LintOptions, LintResult, Severity};

pub use validator::{
    validate_contract, validate_group, validate_interaction, validate_matcher,
    validate_matching_rules, validate_message,
};

/// Lint a single contract file.
pub fn lint_file(path: &Path, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            result.add_issue(LintIssue::error("E001", format!("Failed to read file: {e}"), path));
            return result;
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            result.add_issue(
                LintIssue::error("E002", format!("Invalid JSON: {e}"), path)
                    .with_suggestion("Check for JSON syntax errors"),
            );
            return result;
        }
    };

    validate_contract(path, &value, &mut result, options);
    result
}

/// Lint every `.json` file in a directory (non-recursive), in name order.
pub fn lint_directory(path: &Path, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();

    let entries = match std::fs::read_dir(path) {
        Ok(e) => e,
        Err(e) => {
            result.add_issue(LintIssue::error(
                "E001",
                format!("Failed to read directory: {e}"),
                path,
            ));
            return result;
        }
    };

    let mut files: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|file| file.is_file() && file.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    for file in files {
        result.merge(lint_file(&file, options));
    }
    result
}

/// Lint a contract held in memory.
pub fn lint_json(json: &str, source_name: &str, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;

    let path = Path::new(source_name);
    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(value) => validate_contract(path, &value, &mut result, options),
        Err(e) => result.add_issue(LintIssue::error("E002", format!("Invalid JSON: {e}"), path)),
    }
    result
}

/// Lint an already parsed contract.
pub fn lint_value(value: &serde_json::Value, source_name: &str, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;
    validate_contract(Path::new(source_name), value, &mut result, options);
    result
}
