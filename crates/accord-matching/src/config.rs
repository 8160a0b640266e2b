//! Matching configuration.
//!
//! ```yaml
//! allow_unexpected_keys: true
//! max_unordered_elements: 32
//! features:
//!   matchers.useValuesMatcher: true
//! ```

use crate::alignment::{DEFAULT_MAX_UNORDERED_ELEMENTS, MAX_COMBINATION_SIZE};
use crate::error::ConfigError;
use crate::features::{self, Feature};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Accept keys in actual maps that the expected map does not declare.
    /// Unset means the per-part default: rejected in requests, accepted in
    /// responses and messages.
    pub allow_unexpected_keys: Option<bool>,

    /// Largest actual array aligned ignoring order; longer arrays are
    /// compared by position. At most 64.
    pub max_unordered_elements: usize,

    /// Feature toggle values by name.
    pub features: BTreeMap<String, bool>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        MatchingConfig {
            allow_unexpected_keys: None,
            max_unordered_elements: DEFAULT_MAX_UNORDERED_ELEMENTS,
            features: BTreeMap::new(),
        }
    }
}

impl MatchingConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: MatchingConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_unordered_elements == 0 || self.max_unordered_elements > MAX_COMBINATION_SIZE {
            return Err(ConfigError::Invalid(format!(
                "max_unordered_elements must be between 1 and {}, got {}",
                MAX_COMBINATION_SIZE, self.max_unordered_elements
            )));
        }
        for name in self.features.keys() {
            name.parse::<Feature>()?;
        }
        Ok(())
    }

    /// Apply `ACCORD_FEATURE_*` environment variables on top of the file.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        for feature in Feature::ALL {
            let Ok(raw) = std::env::var(feature.env_var()) else {
                continue;
            };
            let enabled = match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "{} must be true or false, got '{}'",
                        feature.env_var(),
                        raw
                    )))
                }
            };
            debug!("{} overrides {} to {}", feature.env_var(), feature, enabled);
            self.features.insert(feature.name().to_string(), enabled);
        }
        Ok(())
    }

    /// Replace the process-wide toggles with the configured ones.
    pub fn install_features(&self) -> Result<(), ConfigError> {
        features::install(&self.features)?;
        Ok(())
    }

    pub fn allow_unexpected_keys_or(&self, default: bool) -> bool {
        self.allow_unexpected_keys.unwrap_or(default)
    }
}
