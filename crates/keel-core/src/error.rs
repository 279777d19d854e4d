//! Error types for the plan compiler.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::Diagnostic;

/// Comprehensive error type for all compile operations.
///
/// Every variant is fatal to the current build; there is no partial
/// compilation.
#[derive(Error, Debug)]
pub enum PlanError {
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Malformed YAML in a config or variables file
    #[error("failed to parse YAML in '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    /// Schema or template validation produced at least one error diagnostic
    #[error("configuration validation failed:\n{formatted}")]
    Validation {
        diagnostics: Vec<Diagnostic>,
        formatted: String,
    },
    /// An include target is already on the active include stack
    #[error("include cycle detected: {path}\nChain: {chain}")]
    IncludeCycle { path: PathBuf, chain: String },
    /// An included file could not be read or validated
    #[error("failed to read included config {path:?}: {source}")]
    Include {
        path: PathBuf,
        #[source]
        source: Box<PlanError>,
    },
    /// A template failed to parse or render
    #[error("failed to render template {template:?}: {message}")]
    Template { template: String, message: String },
    /// An expression failed to parse or evaluate
    #[error("failed to evaluate expression {expression:?}: {message}")]
    Expression { expression: String, message: String },
    /// A with_items source did not resolve to a list
    #[error("with_items expression {expression:?} is not a list (got {found})")]
    NotAList {
        expression: String,
        found: &'static str,
    },
    /// The action cannot run on the target platform
    #[error(
        "action '{action}' is not supported on platform '{os}' (supported platforms: {supported:?})"
    )]
    UnsupportedPlatform {
        action: String,
        os: String,
        supported: Vec<String>,
    },
    /// A relative path could not be made absolute
    #[error("failed to resolve path '{path}': {source}")]
    PathResolution {
        path: String,
        source: std::io::Error,
    },
    /// A plan file extension is not one of the supported formats
    #[error("unsupported file format: {extension} (use .json, .yaml, or .yml)")]
    UnsupportedFormat { extension: String },
    /// JSON serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    /// YAML serialization errors
    #[error("Serialization error: {source}")]
    YamlOutput {
        #[from]
        source: serde_yaml::Error,
    },
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// An error annotated with what the compiler was doing at the time
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<PlanError>,
    },
}

/// Builder for creating file system errors.
pub struct FileSystemErrorBuilder {
    path: PathBuf,
}

impl FileSystemErrorBuilder {
    /// Create a new file system error builder for a path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: std::io::Error) -> PlanError {
        PlanError::FileSystem {
            path: self.path,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> PlanError {
        PlanError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl PlanError {
    /// Creates a builder for file system errors.
    pub fn file_system(path: impl AsRef<Path>) -> FileSystemErrorBuilder {
        FileSystemErrorBuilder::new(path)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Creates a template error from any error, flattening its source chain
    /// into the message so the root cause is not lost.
    pub fn template(template: impl Into<String>, err: &(dyn std::error::Error + 'static)) -> Self {
        PlanError::Template {
            template: template.into(),
            message: error_chain(err),
        }
    }

    /// Creates an expression error.
    pub fn expression(expression: impl Into<String>, message: impl Into<String>) -> Self {
        PlanError::Expression {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error, or any error it wraps, is an include cycle.
    pub fn is_include_cycle(&self) -> bool {
        match self {
            PlanError::IncludeCycle { .. } => true,
            PlanError::Include { source, .. } | PlanError::Context { source, .. } => {
                source.is_include_cycle()
            }
            _ => false,
        }
    }

    /// Returns true if this error, or any error it wraps, is a validation
    /// failure.
    pub fn is_validation(&self) -> bool {
        match self {
            PlanError::Validation { .. } => true,
            PlanError::Include { source, .. } | PlanError::Context { source, .. } => {
                source.is_validation()
            }
            _ => false,
        }
    }
}

/// Joins an error and all of its sources with `": "`.
pub(crate) fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Extension trait for Result to attach context to compile errors.
pub trait ResultExt<T> {
    /// Wrap the error with a context message.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display;

    /// Wrap the error with a lazily built context message.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display,
    {
        self.map_err(|e| PlanError::Context {
            context: context.to_string(),
            source: Box::new(e),
        })
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| PlanError::Context {
            context: f().to_string(),
            source: Box::new(e),
        })
    }
}

/// Result type alias for compile operations
pub type Result<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wraps_and_preserves_cycle_flag() {
        let err: Result<()> = Err(PlanError::IncludeCycle {
            path: PathBuf::from("/a.yml"),
            chain: "/root.yml:1 -> /a.yml:1".to_string(),
        });
        let wrapped = err.context("failed to expand include").unwrap_err();

        assert!(wrapped.is_include_cycle());
        let text = wrapped.to_string();
        assert!(text.starts_with("failed to expand include: include cycle detected"));
        assert!(text.contains("Chain: /root.yml:1 -> /a.yml:1"));
    }

    #[test]
    fn test_unsupported_platform_message() {
        let err = PlanError::UnsupportedPlatform {
            action: "service".to_string(),
            os: "windows".to_string(),
            supported: vec!["linux".to_string(), "darwin".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "action 'service' is not supported on platform 'windows' (supported platforms: [\"linux\", \"darwin\"])"
        );
    }

    #[test]
    fn test_invalid_input_builder() {
        let err = PlanError::invalid_input("config").with_reason("must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid input for field 'config': must not be empty"
        );
    }
}
