//! Configuration for the canonicalization pipeline and the evaluator.
//!
//! Tolerances and iteration caps live here instead of being scattered through
//! the rules, so the same values reach every pass of one compilation.
//!
//! ```
//! use qcanon_compile::CanonicalizationConfig;
//!
//! let config = CanonicalizationConfig::from_json(r#"{ "max_iter": 50 }"#).unwrap();
//! assert_eq!(config.max_iter, 50);
//! assert_eq!(config.tolerance, 1e-12);
//! ```

use serde::{Deserialize, Serialize};

/// Default iteration cap of every fixed-point pass.
pub const DEFAULT_MAX_ITER: usize = 1000;

/// Default magnitude under which a numeric coefficient counts as zero.
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Settings shared by the canonicalization passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalizationConfig {
    /// Iteration cap of every fixed-point pass.
    pub max_iter: usize,
    /// Coefficients with a smaller magnitude are dropped.
    pub tolerance: f64,
}

impl CanonicalizationConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fixed-point iteration cap.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    /// Set the zero tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.abs();
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for CanonicalizationConfig {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_MAX_ITER,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Settings of the math evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Variable allowed to stay free in textual output.
    pub time_symbol: String,
    /// Zero tolerance used while normalizing textual output.
    pub tolerance: f64,
}

impl EvaluatorConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time symbol.
    #[must_use]
    pub fn with_time_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.time_symbol = symbol.into();
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            time_symbol: "t".to_string(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CanonicalizationConfig::new();
        assert_eq!(config.max_iter, 1000);
        assert_eq!(EvaluatorConfig::new().time_symbol, "t");
    }

    #[test]
    fn test_builder_clamps() {
        let config = CanonicalizationConfig::new()
            .with_max_iter(0)
            .with_tolerance(-1e-9);
        assert_eq!(config.max_iter, 1);
        assert_eq!(config.tolerance, 1e-9);
    }

    #[test]
    fn test_from_json() {
        let config = EvaluatorConfig::from_json(r#"{ "time_symbol": "tau" }"#).unwrap();
        assert_eq!(config.time_symbol, "tau");
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
        assert!(CanonicalizationConfig::from_json("{ \"max_iter\": \"x\" }").is_err());
    }
}
