//! Reading and writing plan files.
//!
//! The format is chosen by extension: `.json` is written pretty-printed,
//! `.yaml` and `.yml` as YAML. Both round-trip every plan field.

use std::fmt;
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{PlanError, Result};
use crate::models::Plan;

/// Serialization format of a plan file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Json,
    Yaml,
}

impl PlanFormat {
    /// Picks the format from the extension of `path`.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::UnsupportedFormat` for any extension other than
    /// `.json`, `.yaml` or `.yml`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Ok(PlanFormat::Json),
            "yaml" | "yml" => Ok(PlanFormat::Yaml),
            _ => Err(PlanError::UnsupportedFormat {
                extension: if extension.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{extension}")
                },
            }),
        }
    }

    /// Serializes `plan` in this format.
    pub fn serialize(self, plan: &Plan) -> Result<String> {
        match self {
            PlanFormat::Json => {
                let mut text = serde_json::to_string_pretty(plan)?;
                text.push('\n');
                Ok(text)
            }
            PlanFormat::Yaml => Ok(serde_yaml::to_string(plan)?),
        }
    }
}

impl fmt::Display for PlanFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanFormat::Json => f.write_str("json"),
            PlanFormat::Yaml => f.write_str("yaml"),
        }
    }
}

/// Writes `plan` to `path` in the format its extension names.
///
/// # Errors
///
/// Returns `PlanError::UnsupportedFormat` for an unknown extension and
/// `PlanError::FileSystem` if the file cannot be written.
pub fn save_plan_to_file(plan: &Plan, path: &Path) -> Result<()> {
    let format = PlanFormat::from_path(path)?;
    let text = format.serialize(plan)?;
    fs::write(path, text).map_err(|e| PlanError::file_system(path).with_source(e))?;
    debug!("saved {} plan with {} steps to {}", format, plan.steps.len(), path.display());
    Ok(())
}

/// Reads a plan written by [`save_plan_to_file`].
///
/// # Errors
///
/// Returns `PlanError::UnsupportedFormat` for an unknown extension,
/// `PlanError::FileSystem` if the file cannot be read, and a parse error if
/// the content is not a valid plan.
pub fn load_plan_from_file(path: &Path) -> Result<Plan> {
    let format = PlanFormat::from_path(path)?;
    let text = fs::read_to_string(path).map_err(|e| PlanError::file_system(path).with_source(e))?;
    let plan = match format {
        PlanFormat::Json => serde_json::from_str(&text)?,
        PlanFormat::Yaml => serde_yaml::from_str(&text).map_err(|source| PlanError::Yaml {
            path: path.to_path_buf(),
            source,
        })?,
    };
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{
        Action, ActionType, FileAction, LoopContext, LoopType, Origin, ShellAction, Step,
    };

    fn sample_plan() -> Plan {
        let mut plan = Plan::new("site.yml", vec!["web".to_string()]);
        plan.initial_vars.insert("os".to_string(), json!("linux"));
        plan.initial_vars.insert("cpu_cores".to_string(), json!(8));

        let mut shell = Step::with_action(Action::Shell(ShellAction {
            cmd: "apt-get install -y git".to_string(),
            ..ShellAction::default()
        }));
        shell.id = "step-0001".to_string();
        shell.name = "install git".to_string();
        shell.when = "os == \"linux\"".to_string();
        shell.tags = vec!["web".to_string()];
        shell.r#become = true;
        shell.action_type = Some(ActionType::Shell);
        shell.origin = Some(Origin {
            file: "/srv/roles/web.yml".to_string(),
            line: 1,
            column: 1,
            include_chain: vec!["/srv/site.yml:1".to_string()],
        });
        shell.loop_context = Some(LoopContext::new(
            LoopType::WithItems,
            json!("git"),
            0,
            2,
            "packages",
        ));

        let mut file = Step::with_action(Action::File(FileAction {
            path: "/etc/motd".to_string(),
            state: "file".to_string(),
            content: "hello\n".to_string(),
            ..FileAction::default()
        }));
        file.id = "step-0002".to_string();
        file.action_type = Some(ActionType::File);
        file.skipped = true;

        plan.steps = vec![shell, file];
        plan
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let plan = sample_plan();

        save_plan_to_file(&plan, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"version\": \"1.0\""));

        assert_eq!(load_plan_from_file(&path).unwrap(), plan);
    }

    #[test]
    fn test_yaml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let plan = sample_plan();

        for name in ["plan.yaml", "plan.yml"] {
            let path = dir.path().join(name);
            save_plan_to_file(&plan, &path).unwrap();
            assert_eq!(load_plan_from_file(&path).unwrap(), plan);
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_plan_to_file(&sample_plan(), &dir.path().join("plan.toml")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported file format: .toml (use .json, .yaml, or .yml)"
        );

        let err = load_plan_from_file(Path::new("plan")).unwrap_err();
        assert!(matches!(err, PlanError::UnsupportedFormat { .. }));
    }
}
