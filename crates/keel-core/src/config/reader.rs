//! Reads config and variables files.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde_yaml::Value;

use super::location::{step_positions, StepPosition};
use super::validator::validate_step;
use super::Diagnostic;
use crate::error::{PlanError, Result};
use crate::models::Step;
use crate::vars::Variables;

/// A config file after parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedConfig {
    pub version: Option<String>,
    /// File-scoped variables from the `vars:` key
    pub vars: Variables,
    pub steps: Vec<Step>,
    /// Where each of `steps` starts in the file, index for index
    pub positions: Vec<StepPosition>,
}

/// Reads config files for the planner.
pub trait ConfigReader: Send + Sync {
    /// Parses and validates a config file.
    ///
    /// I/O failures are returned as errors. Everything wrong with the content
    /// is reported as diagnostics; steps that failed to decode are left out
    /// of the returned config.
    fn read_config_with_validation(&self, path: &Path) -> Result<(ParsedConfig, Vec<Diagnostic>)>;

    /// Reads a YAML mapping of variables.
    fn read_variables(&self, path: &Path) -> Result<Variables>;
}

const TOP_LEVEL_KEYS: [&str; 3] = ["version", "vars", "steps"];

/// Reads YAML config files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlConfigReader;

impl YamlConfigReader {
    pub fn new() -> Self {
        Self
    }

    /// Parses config `source` as if it had been read from `path`.
    pub fn parse_str(&self, path: &Path, source: &str) -> (ParsedConfig, Vec<Diagnostic>) {
        let mut config = ParsedConfig::default();
        let mut diagnostics = Vec::new();

        let document: Value = match serde_yaml::from_str(source) {
            Ok(document) => document,
            Err(e) => {
                let (line, column) = e
                    .location()
                    .map_or((1, 1), |loc| (loc.line(), loc.column()));
                diagnostics.push(
                    Diagnostic::error(path, line, format!("invalid YAML: {e}")).at_column(column),
                );
                return (config, diagnostics);
            }
        };

        let raw_steps = match document {
            Value::Null => Vec::new(),
            Value::Sequence(steps) => steps,
            Value::Mapping(mut root) => {
                for key in root.keys() {
                    let known = key.as_str().is_some_and(|k| TOP_LEVEL_KEYS.contains(&k));
                    if !known {
                        diagnostics.push(Diagnostic::error(
                            path,
                            1,
                            format!(
                                "unknown top-level key {} (expected one of: {})",
                                describe_key(key),
                                TOP_LEVEL_KEYS.join(", ")
                            ),
                        ));
                    }
                }

                match root.remove("version") {
                    None | Some(Value::Null) => {}
                    Some(Value::String(version)) => config.version = Some(version),
                    Some(Value::Number(version)) => config.version = Some(version.to_string()),
                    Some(_) => diagnostics.push(Diagnostic::error(
                        path,
                        1,
                        "'version' must be a string",
                    )),
                }

                match root.remove("vars") {
                    None | Some(Value::Null) => {}
                    Some(vars) => match serde_yaml::from_value::<Variables>(vars) {
                        Ok(vars) => config.vars = vars,
                        Err(e) => diagnostics.push(Diagnostic::error(
                            path,
                            1,
                            format!("'vars' must be a mapping: {e}"),
                        )),
                    },
                }

                match root.remove("steps") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Sequence(steps)) => steps,
                    Some(_) => {
                        diagnostics.push(Diagnostic::error(path, 1, "'steps' must be a list"));
                        Vec::new()
                    }
                }
            }
            _ => {
                diagnostics.push(Diagnostic::error(
                    path,
                    1,
                    "config must be a list of steps or a mapping with 'steps'",
                ));
                return (config, diagnostics);
            }
        };

        let positions = step_positions(source);
        for (index, raw) in raw_steps.into_iter().enumerate() {
            let position = positions.get(index).copied().unwrap_or_default();
            let line = position.line;
            let Value::Mapping(mapping) = &raw else {
                diagnostics.push(Diagnostic::error(
                    path,
                    line,
                    format!("step {} must be a mapping", index + 1),
                ));
                continue;
            };

            diagnostics.extend(validate_step(path, line, mapping));

            match serde_yaml::from_value::<Step>(raw) {
                Ok(step) => {
                    config.steps.push(step);
                    config.positions.push(position);
                }
                Err(e) => diagnostics.push(Diagnostic::error(path, line, e.to_string())),
            }
        }

        for diag in diagnostics.iter().filter(|d| !d.is_error()) {
            warn!("{diag}");
        }
        debug!(
            "parsed {} step(s) from {} with {} diagnostic(s)",
            config.steps.len(),
            path.display(),
            diagnostics.len()
        );

        (config, diagnostics)
    }
}

fn describe_key(key: &Value) -> String {
    match key {
        Value::String(key) => format!("'{key}'"),
        other => format!("{other:?}"),
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| PlanError::file_system(path).with_source(e))
}

impl ConfigReader for YamlConfigReader {
    fn read_config_with_validation(&self, path: &Path) -> Result<(ParsedConfig, Vec<Diagnostic>)> {
        let source = read_source(path)?;
        Ok(self.parse_str(path, &source))
    }

    fn read_variables(&self, path: &Path) -> Result<Variables> {
        let source = read_source(path)?;
        let value: Value = serde_yaml::from_str(&source).map_err(|source| PlanError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        if value.is_null() {
            return Ok(Variables::new());
        }
        serde_yaml::from_value(value).map_err(|source| PlanError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;
    use crate::config::has_errors;
    use crate::models::{Action, Directive};

    fn parse(source: &str) -> (ParsedConfig, Vec<Diagnostic>) {
        YamlConfigReader::new().parse_str(&PathBuf::from("/cfg/main.yml"), source)
    }

    #[test]
    fn test_bare_step_list() {
        let (config, diags) = parse("- name: a\n  shell: ls\n- print: done\n");

        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(config.steps.len(), 2);
        assert!(config.vars.is_empty());
        assert!(config.version.is_none());
    }

    #[test]
    fn test_positions_skip_steps_that_fail_to_decode() {
        let (config, diags) = parse("steps:\n  - print: a\n  - shel: typo\n  - print: b\n");

        assert!(has_errors(&diags));
        assert_eq!(config.steps.len(), 2);
        assert_eq!(
            config.positions,
            vec![StepPosition::new(2, 3), StepPosition::new(4, 3)]
        );
    }

    #[test]
    fn test_mapping_form() {
        let (config, diags) = parse(
            "version: \"1.0\"\nvars:\n  env: dev\nsteps:\n  - print: \"{{ env }}\"\n",
        );

        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(config.version.as_deref(), Some("1.0"));
        assert_eq!(config.vars.get("env"), Some(&json!("dev")));
        assert!(matches!(config.steps[0].action, Some(Action::Print(_))));
    }

    #[test]
    fn test_empty_file_is_empty_config() {
        let (config, diags) = parse("");
        assert!(diags.is_empty());
        assert!(config.steps.is_empty());
    }

    #[test]
    fn test_yaml_syntax_error_has_location() {
        let (_, diags) = parse("- name: a\n  shell: [unclosed\n");

        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.starts_with("invalid YAML"));
        assert!(diags[0].line >= 2);
    }

    #[test]
    fn test_step_errors_carry_step_line() {
        let (config, diags) = parse("- print: ok\n- name: broken\n  when: x\n- shell: ls\n  print: x\n");

        assert!(has_errors(&diags));
        assert_eq!(config.steps.len(), 1);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].line, 2);
        assert!(diags[0].message.contains("step has no action"));
        assert_eq!(diags[1].line, 4);
        assert!(diags[1].message.contains("multiple actions"));
    }

    #[test]
    fn test_unknown_top_level_key() {
        let (_, diags) = parse("stepz:\n  - print: a\n");
        assert!(diags[0].message.contains("unknown top-level key 'stepz'"));
    }

    #[test]
    fn test_non_mapping_step() {
        let (_, diags) = parse("- just a string\n");
        assert_eq!(diags[0].message, "step 1 must be a mapping");
    }

    #[test]
    fn test_directive_warning_keeps_step() {
        let (config, diags) = parse("- include: a.yml\n  vars:\n    x: 1\n");

        assert!(!has_errors(&diags));
        assert_eq!(diags.len(), 1);
        assert_eq!(
            config.steps[0].directive,
            Some(Directive::Include("a.yml".to_string()))
        );
    }

    #[test]
    fn test_read_variables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.yml");
        fs::write(&path, "region: eu\nports: [80, 443]\n").unwrap();

        let vars = YamlConfigReader::new().read_variables(&path).unwrap();
        assert_eq!(vars.get("region"), Some(&json!("eu")));
        assert_eq!(vars.get("ports"), Some(&json!([80, 443])));
    }

    #[test]
    fn test_read_variables_rejects_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.yml");
        fs::write(&path, "- a\n- b\n").unwrap();

        let err = YamlConfigReader::new().read_variables(&path).unwrap_err();
        assert!(matches!(err, PlanError::Yaml { .. }));
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = YamlConfigReader::new()
            .read_config_with_validation(Path::new("/no/such/config.yml"))
            .unwrap_err();
        assert!(matches!(err, PlanError::FileSystem { .. }));
    }
}
