//! Engine configuration file parsing.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Error type for configuration loading.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid engine configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How numeric values may be converted towards a narrower kind.
///
/// Numeric kinds are totally ordered `Int < Long < Float < Double`. Moving up
/// the order is always allowed; this policy governs moving down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrowingPolicy {
    /// Never narrow. `1.0` does not convert to an `Int`.
    Never,
    /// Narrow only when the value survives the round trip unchanged.
    Lossless,
    /// Narrow with `as`-cast semantics (truncation, saturation).
    Truncating,
}

impl Default for NarrowingPolicy {
    fn default() -> Self {
        NarrowingPolicy::Lossless
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Remember which resolver handled each AST node so repeated evaluation
    /// against same-shaped targets skips the chain scan.
    pub resolution_cache: bool,
    /// Numeric narrowing policy used by the standard type converter.
    pub narrowing: NarrowingPolicy,
}

impl EngineConfig {
    pub fn new() -> Self {
        EngineConfig {
            resolution_cache: true,
            narrowing: NarrowingPolicy::default(),
        }
    }

    pub fn with_resolution_cache(mut self, enabled: bool) -> Self {
        self.resolution_cache = enabled;
        self
    }

    pub fn with_narrowing(mut self, narrowing: NarrowingPolicy) -> Self {
        self.narrowing = narrowing;
        self
    }

    /// Load configuration from a JSON file.
    ///
    /// Expected format:
    /// ```json
    /// { "resolution_cache": true, "narrowing": "lossless" }
    /// ```
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON string. Missing keys keep their defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = EngineConfig::parse("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.resolution_cache);
        assert_eq!(config.narrowing, NarrowingPolicy::Lossless);
    }

    #[test]
    fn test_parse_full_config() {
        let config =
            EngineConfig::parse(r#"{ "resolution_cache": false, "narrowing": "truncating" }"#)
                .unwrap();
        assert!(!config.resolution_cache);
        assert_eq!(config.narrowing, NarrowingPolicy::Truncating);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = EngineConfig::parse(r#"{ "resolution_cash": false }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/exprkit.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
