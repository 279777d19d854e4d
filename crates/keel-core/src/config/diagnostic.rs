//! Validation diagnostics and their formatting.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How serious a diagnostic is. Only errors stop compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A validation finding with its source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file_path: PathBuf,
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(file_path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            line,
            column: 1,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(file_path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(file_path, line, message)
        }
    }

    pub fn at_column(mut self, column: usize) -> Self {
        self.column = column;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Formats as `path/to/file.yml:line:col: message`, prefixing the message
/// with the severity for anything other than errors.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: ",
            self.file_path.display(),
            self.line,
            self.column
        )?;
        if self.severity == Severity::Warning {
            f.write_str("warning: ")?;
        }
        f.write_str(&self.message)
    }
}

/// Returns true if any diagnostic is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// One diagnostic per line.
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats diagnostics grouped by file, quoting the offending source line
/// and the name of the enclosing step when one can be found.
///
/// ```text
/// Error: /cfg/main.yml
///
///   Line 4: step has no action
///     - name: broken
///     (in step: broken)
///
/// Found 1 error(s)
/// ```
pub fn format_diagnostics_with_context(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }

    let mut groups: BTreeMap<&Path, Vec<&Diagnostic>> = BTreeMap::new();
    for diag in diagnostics {
        groups.entry(diag.file_path.as_path()).or_default().push(diag);
    }

    let mut out = String::new();
    for (path, diags) in groups {
        out.push_str(&format!("\nError: {}\n\n", path.display()));
        let lines = load_lines(path);

        for diag in diags {
            let prefix = match diag.severity {
                Severity::Error => "",
                Severity::Warning => "warning: ",
            };
            out.push_str(&format!("  Line {}: {}{}\n", diag.line, prefix, diag.message));

            if let Some(text) = diag.line.checked_sub(1).and_then(|i| lines.get(i)) {
                out.push_str(&format!("    {}\n", text.trim()));
                if let Some(name) = step_name_near(&lines, diag.line) {
                    out.push_str(&format!("    (in step: {name})\n"));
                }
            }
            out.push('\n');
        }
    }

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.len() - errors;
    if errors > 0 {
        out.push_str(&format!("Found {errors} error(s)"));
        if warnings > 0 {
            out.push_str(&format!(" and {warnings} warning(s)"));
        }
        out.push('\n');
    }

    out
}

fn load_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|source| source.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Looks for a `name:` key in the step block starting at `line` (1-based).
fn step_name_near(lines: &[String], line: usize) -> Option<String> {
    let start = line.checked_sub(1)?;
    for (offset, raw) in lines.iter().skip(start).take(10).enumerate() {
        let text = raw.trim();
        if offset > 0 && text.starts_with("- ") {
            break;
        }
        let text = text.strip_prefix("- ").unwrap_or(text);
        if let Some(value) = text.strip_prefix("name:") {
            let name = value.trim().trim_matches(|c| c == '"' || c == '\'');
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_display_format() {
        let err = Diagnostic::error("/cfg/a.yml", 3, "step has no action").at_column(5);
        let warn = Diagnostic::warning("/cfg/a.yml", 7, "ignored directive");

        assert_eq!(err.to_string(), "/cfg/a.yml:3:5: step has no action");
        assert_eq!(warn.to_string(), "/cfg/a.yml:7:1: warning: ignored directive");
    }

    #[test]
    fn test_has_errors_ignores_warnings() {
        let warn = Diagnostic::warning("a.yml", 1, "w");
        assert!(!has_errors(&[warn.clone()]));
        assert!(has_errors(&[warn, Diagnostic::error("a.yml", 1, "e")]));
    }

    #[test]
    fn test_format_with_context_quotes_line_and_step() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "- name: ok\n  shell: ls\n- name: broken\n  when: x\n"
        )
        .unwrap();

        let diags = vec![
            Diagnostic::error(file.path(), 3, "step has no action"),
            Diagnostic::warning(file.path(), 1, "something odd"),
        ];
        let out = format_diagnostics_with_context(&diags);

        assert!(out.contains(&format!("Error: {}", file.path().display())));
        assert!(out.contains("  Line 3: step has no action\n    - name: broken\n    (in step: broken)"));
        assert!(out.contains("  Line 1: warning: something odd"));
        assert!(out.contains("(in step: ok)"));
        assert!(out.trim_end().ends_with("Found 1 error(s) and 1 warning(s)"));
    }

    #[test]
    fn test_format_with_missing_file_still_lists_messages() {
        let diags = vec![Diagnostic::error("/no/such/file.yml", 2, "bad")];
        let out = format_diagnostics_with_context(&diags);

        assert!(out.contains("  Line 2: bad"));
        assert!(out.contains("Found 1 error(s)"));
    }
}
