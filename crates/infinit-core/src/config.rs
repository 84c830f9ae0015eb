//! Resolution and deduplication configuration
//!
//! Loaded from a TOML file. Every field has a default so an empty file is a
//! valid configuration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolutionConfig {
    /// Minimum fuzzy score (0-100) for resolver tiers 3 and 4.
    pub min_fuzzy_score: u8,
    /// Minimum pairwise similarity (0-100) for movement merge grouping.
    pub merge_similarity: u8,
    /// Leading words stripped during name normalization, e.g. "hnuti".
    pub qualifier_words: Vec<String>,
    /// Canonical movement names installed by `seed_from_config`.
    pub known_movements: Vec<String>,
    /// Canonical name to list of known aliases.
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            min_fuzzy_score: 80,
            merge_similarity: 70,
            qualifier_words: Vec::new(),
            known_movements: Vec::new(),
            aliases: BTreeMap::new(),
        }
    }
}

impl ResolutionConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_fuzzy_score > 100 {
            return Err(ConfigError::Invalid(format!(
                "min_fuzzy_score must be at most 100, got {}",
                self.min_fuzzy_score
            )));
        }
        if self.merge_similarity > 100 {
            return Err(ConfigError::Invalid(format!(
                "merge_similarity must be at most 100, got {}",
                self.merge_similarity
            )));
        }
        for name in &self.known_movements {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "known_movements contains a blank name".to_string(),
                ));
            }
        }
        for (canonical, aliases) in &self.aliases {
            if canonical.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "aliases contains a blank canonical name".to_string(),
                ));
            }
            if aliases.iter().any(|a| a.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "aliases for '{}' contain a blank entry",
                    canonical
                )));
            }
        }
        Ok(())
    }
}
