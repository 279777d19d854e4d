//! Outcome of validating a config file.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::{format_diagnostics_with_context, has_errors, Diagnostic};

/// Diagnostics found in a config file, with the overall verdict.
///
/// Serializes as `{"valid": bool, "diagnostics": [...]}`; displays as the
/// diagnostics with source context followed by a one-line verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    #[serde(skip)]
    pub config: PathBuf,
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn new(config: impl Into<PathBuf>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            config: config.into(),
            valid: !has_errors(&diagnostics),
            diagnostics,
        }
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| !d.is_error())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.diagnostics.is_empty() {
            writeln!(f, "{}", format_diagnostics_with_context(&self.diagnostics))?;
            writeln!(f)?;
        }

        if !self.valid {
            writeln!(f, "Validation failed: {}", self.config.display())
        } else if self.has_warnings() {
            writeln!(f, "Validation passed with warnings: {}", self.config.display())
        } else {
            writeln!(f, "Configuration is valid: {}", self.config.display())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_report() {
        let report = ValidationReport::new("site.yml", vec![]);

        assert!(report.valid);
        assert_eq!(report.to_string(), "Configuration is valid: site.yml\n");
        assert_eq!(serde_json::to_string(&report).unwrap(), r#"{"valid":true}"#);
    }

    #[test]
    fn test_warnings_only_report() {
        let report = ValidationReport::new(
            "site.yml",
            vec![Diagnostic::warning("site.yml", 2, "step declares multiple directives")],
        );

        assert!(report.valid);
        assert!(report.has_warnings());
        assert!(report
            .to_string()
            .ends_with("Validation passed with warnings: site.yml\n"));
    }

    #[test]
    fn test_error_report() {
        let report = ValidationReport::new(
            "site.yml",
            vec![Diagnostic::error("site.yml", 3, "step has no action")],
        );

        assert!(!report.valid);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["valid"], serde_json::json!(false));
        assert_eq!(json["diagnostics"][0]["line"], serde_json::json!(3));
        assert!(report.to_string().contains("Validation failed: site.yml"));
    }
}
