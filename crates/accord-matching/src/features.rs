//! Process-wide feature toggles.
//!
//! The toggle set is copy-on-write: writers swap in a new map under an
//! exclusive lock, readers clone the current `Arc`. Matching takes one
//! [`snapshot`] at call start and never touches the lock again.

use crate::error::FeatureError;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// A named behaviour switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    /// Honour the `values` matcher when comparing maps and lists.
    UseValuesMatcher,
    /// Let number matchers accept numeric strings.
    CoerceNumbers,
}

impl Feature {
    pub const ALL: [Feature; 2] = [Feature::UseValuesMatcher, Feature::CoerceNumbers];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::UseValuesMatcher => "matchers.useValuesMatcher",
            Feature::CoerceNumbers => "matchers.coerceNumbers",
        }
    }

    pub fn default_value(&self) -> bool {
        false
    }

    /// Environment variable that overrides this toggle.
    pub fn env_var(&self) -> &'static str {
        match self {
            Feature::UseValuesMatcher => "ACCORD_FEATURE_USE_VALUES_MATCHER",
            Feature::CoerceNumbers => "ACCORD_FEATURE_COERCE_NUMBERS",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name() == s)
            .ok_or_else(|| FeatureError::Unknown(s.to_string()))
    }
}

/// An immutable view of every toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSet {
    values: BTreeMap<Feature, bool>,
}

impl Default for FeatureSet {
    fn default() -> Self {
        FeatureSet {
            values: Feature::ALL
                .into_iter()
                .map(|feature| (feature, feature.default_value()))
                .collect(),
        }
    }
}

impl FeatureSet {
    pub fn is_set(&self, feature: Feature) -> bool {
        self.values
            .get(&feature)
            .copied()
            .unwrap_or_else(|| feature.default_value())
    }

    pub fn with(mut self, feature: Feature, enabled: bool) -> Self {
        self.values.insert(feature, enabled);
        self
    }

    /// Toggles whose value differs from the default, by name.
    pub fn updated(&self) -> BTreeMap<String, bool> {
        self.values
            .iter()
            .filter(|(feature, enabled)| **enabled != feature.default_value())
            .map(|(feature, enabled)| (feature.name().to_string(), *enabled))
            .collect()
    }
}

static TOGGLES: Lazy<RwLock<Arc<FeatureSet>>> =
    Lazy::new(|| RwLock::new(Arc::new(FeatureSet::default())));

/// Current toggle values, detached from later writes.
pub fn snapshot() -> Arc<FeatureSet> {
    TOGGLES.read().clone()
}

pub fn set(feature: Feature, enabled: bool) {
    let mut toggles = TOGGLES.write();
    let updated = (**toggles).clone().with(feature, enabled);
    *toggles = Arc::new(updated);
    debug!("Feature toggle {} set to {}", feature, enabled);
}

pub fn set_by_name(name: &str, enabled: bool) -> Result<(), FeatureError> {
    let feature = name.parse::<Feature>()?;
    set(feature, enabled);
    Ok(())
}

pub fn is_set(feature: Feature) -> bool {
    TOGGLES.read().is_set(feature)
}

/// Restore every toggle to its default.
pub fn reset() {
    *TOGGLES.write() = Arc::new(FeatureSet::default());
    debug!("Feature toggles reset to defaults");
}

pub fn updated_toggles() -> BTreeMap<String, bool> {
    TOGGLES.read().updated()
}

/// Replace the whole toggle set from name/value pairs.
///
/// Every name is validated before anything is written, so an unknown name
/// leaves the current toggles untouched.
pub fn install(values: &BTreeMap<String, bool>) -> Result<(), FeatureError> {
    let mut next = FeatureSet::default();
    for (name, enabled) in values {
        next = next.with(name.parse::<Feature>()?, *enabled);
    }
    *TOGGLES.write() = Arc::new(next);
    Ok(())
}
