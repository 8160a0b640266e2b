//! Error types for the matching engine.
//!
//! Load-time problems (bad path expressions, regexes, matcher definitions)
//! surface as [`ParseError`]. A value that fails a rule is never an error;
//! it becomes a [`crate::Mismatch`].

use thiserror::Error;

/// Failure to decode or compile part of a rule set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Path expression \"{path}\" is invalid at index {index}: {reason}")]
    InvalidPath {
        path: String,
        index: usize,
        reason: String,
    },

    #[error("Invalid regular expression '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Invalid matcher definition: {0}")]
    InvalidMatcher(String),

    #[error("Invalid matching rules: {0}")]
    InvalidRules(String),
}

impl ParseError {
    pub(crate) fn path(path: &str, index: usize, reason: impl Into<String>) -> Self {
        ParseError::InvalidPath {
            path: path.to_string(),
            index,
            reason: reason.into(),
        }
    }
}

/// Feature toggle errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("Unknown feature toggle '{0}'")]
    Unknown(String),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_error_message() {
        let err = ParseError::path("$.a[", 4, "Unterminated brackets");
        assert_eq!(
            err.to_string(),
            "Path expression \"$.a[\" is invalid at index 4: Unterminated brackets"
        );
    }

    #[test]
    fn test_feature_error_converts_into_config_error() {
        let err: ConfigError = FeatureError::Unknown("nope".to_string()).into();
        assert_eq!(err.to_string(), "Unknown feature toggle 'nope'");
    }
}
