//! Verification configuration
//!
//! All fields have defaults, so a JSON file only needs the keys it changes:
//!
//! ```json
//! {
//!   "verbose": true,
//!   "solver": { "command": "cvc5", "args": ["--lang", "smt2", "--incremental"] }
//! }
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::symbolic::DEFAULT_MAX_CALL_DEPTH;
use crate::{Error, Result};

/// External solver settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Solver executable
    /// Default: `z3`
    pub command: String,

    /// Arguments putting the solver into interactive SMT-LIB2 mode
    pub args: Vec<String>,

    /// Per-query timeout in milliseconds; `None` means no limit
    pub query_timeout_ms: Option<u64>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            command: "z3".to_string(),
            args: vec!["-in".to_string(), "-smt2".to_string()],
            query_timeout_ms: Some(10_000),
        }
    }
}

/// Options for the verification pass
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VerificationOptions {
    /// Run verification at all; when false the pass forwards the program untouched
    /// Default: true
    pub enabled: bool,

    /// Emit the per-property report and summary line
    pub verbose: bool,

    /// Solver process settings
    pub solver: SolverOptions,

    /// Wall-clock budget per property in seconds; `None` means no limit
    pub property_timeout_secs: Option<u64>,

    /// Nested call bound for the reference evaluator
    pub max_call_depth: usize,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            verbose: false,
            solver: SolverOptions::default(),
            property_timeout_secs: Some(60),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl VerificationOptions {
    /// Parse options from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Failed to parse verification options: {}", e)))
    }

    /// Load options from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&contents)
    }

    /// Per-property budget as a [`Duration`]
    pub fn property_timeout(&self) -> Option<Duration> {
        self.property_timeout_secs.map(Duration::from_secs)
    }

    /// Options with verification switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = VerificationOptions::default();
        assert!(options.enabled);
        assert!(!options.verbose);
        assert_eq!(options.solver.command, "z3");
        assert_eq!(options.solver.args, vec!["-in", "-smt2"]);
        assert_eq!(options.property_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "verbose": true, "solver": { "query_timeout_ms": null } }"#;
        let options = VerificationOptions::from_json_str(json).unwrap();
        assert!(options.verbose);
        assert!(options.enabled);
        assert_eq!(options.solver.command, "z3");
        assert_eq!(options.solver.query_timeout_ms, None);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = VerificationOptions::from_json_str("{ verbose: yes }").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = VerificationOptions::from_json_file("/nonexistent/lawcheck.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
