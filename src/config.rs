//! Query configuration
//!
//! Settings for a query run, read from an optional JSON file and then
//! overridden by command line flags.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    /// How many cases to retrieve
    pub retrieve: usize,
    /// Whether to adapt the best match
    pub adapt: bool,
    /// Show per-field similarities next to each value
    pub verbose_results: bool,
    /// Per-field weight overrides
    pub weights: HashMap<String, f64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            retrieve: 2,
            adapt: true,
            verbose_results: false,
            weights: HashMap::new(),
        }
    }
}

impl QueryConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: QueryConfig = serde_json::from_slice(&data)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retrieve == 0 {
            bail!("retrieve must be at least 1");
        }
        Ok(())
    }
}

/// Parse a `KEY=VALUE` argument
pub fn parse_assignment(arg: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", arg))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", arg));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Parse a `KEY=WEIGHT` argument
pub fn parse_weight(arg: &str) -> std::result::Result<(String, f64), String> {
    let (key, value) = parse_assignment(arg)?;
    let weight = value
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", value))?;
    Ok((key, weight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = QueryConfig::default();
        assert_eq!(config.retrieve, 2);
        assert!(config.adapt);
        assert!(!config.verbose_results);
        assert!(config.weights.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"retrieve": 5, "weights": {"Price": 2.0}}"#).unwrap();
        let config = QueryConfig::load(file.path()).unwrap();
        assert_eq!(config.retrieve, 5);
        assert!(config.adapt);
        assert_eq!(config.weights.get("Price"), Some(&2.0));
    }

    #[test]
    fn test_rejects_unknown_keys_and_zero_retrieve() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"auto_run": true}"#).unwrap();
        assert!(QueryConfig::load(file.path()).is_err());

        std::fs::write(file.path(), r#"{"retrieve": 0}"#).unwrap();
        assert!(QueryConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("Region=Costa Blanca").unwrap(),
            ("Region".to_string(), "Costa Blanca".to_string())
        );
        assert_eq!(parse_assignment("Hotel=a=b").unwrap().1, "a=b");
        assert!(parse_assignment("Region").is_err());
        assert!(parse_assignment("=7").is_err());
    }

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("Price=2.5").unwrap(), ("Price".to_string(), 2.5));
        assert!(parse_weight("Price=heavy").is_err());
    }
}
