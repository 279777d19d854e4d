//! Core handler functions shared by every interface.
//!
//! Each handler runs one complete workflow and returns structured data; the
//! caller decides how to present it (markdown through [`crate::display`], or
//! JSON/YAML through serde).
//!
//! ```text
//! Interface → Params → Handler → Planner / ConfigReader / plan_file
//! ```
//!
//! ```rust,no_run
//! use keel_core::{handlers::handle_build_plan, params::BuildPlan, PlannerBuilder};
//!
//! # fn example() -> keel_core::Result<()> {
//! let params = BuildPlan {
//!     config: "site.yml".into(),
//!     tags: vec!["web".to_string()],
//!     ..BuildPlan::default()
//! };
//! let plan = handle_build_plan(&PlannerBuilder::new(), &params)?;
//! println!("{plan}");
//! # Ok(())
//! # }
//! ```

use log::debug;

use crate::{
    config::{ConfigReader, YamlConfigReader},
    display::ValidationReport,
    error::ResultExt,
    models::Plan,
    params::{BuildPlan, LoadPlan, ValidateConfig},
    plan_file::load_plan_from_file,
    vars::Variables,
    PlannerBuilder, Result,
};

/// Compiles the plan described by `params` with a planner wired by
/// `builder`.
///
/// # Errors
///
/// Returns an error if the variables file cannot be read or the plan fails
/// to compile. Validation failures are `PlanError::Validation`.
pub fn handle_build_plan(builder: &PlannerBuilder, params: &BuildPlan) -> Result<Plan> {
    let vars = match &params.vars_file {
        Some(path) => YamlConfigReader::new()
            .read_variables(path)
            .context("failed to read variables")?,
        None => Variables::new(),
    };
    debug!(
        "building plan for {} with {} caller variables",
        params.config.display(),
        vars.len()
    );

    let mut builder = builder.clone();
    if let Some(os) = &params.os {
        builder = builder.with_os(os.as_str());
    }
    builder
        .build()
        .build_plan(&params.config, &vars, &params.tags)
}

/// Validates a config file and reports every diagnostic.
///
/// An invalid config is not an error here; check
/// [`ValidationReport::valid`].
///
/// # Errors
///
/// Returns an error if the config or the variables file cannot be read, or
/// the variables file is not a YAML mapping.
pub fn handle_validate(params: &ValidateConfig) -> Result<ValidationReport> {
    let reader = YamlConfigReader::new();
    let (_, diagnostics) = reader
        .read_config_with_validation(&params.config)
        .context("failed to read config")?;
    if let Some(path) = &params.vars_file {
        reader
            .read_variables(path)
            .context("failed to read variables")?;
    }
    Ok(ValidationReport::new(&params.config, diagnostics))
}

/// Loads a plan saved with [`save_plan_to_file`](crate::plan_file::save_plan_to_file).
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a plan.
pub fn handle_load_plan(params: &LoadPlan) -> Result<Plan> {
    load_plan_from_file(&params.path).with_context(|| format!("failed to load plan {}", params.path.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::facts::Facts;
    use crate::plan_file::save_plan_to_file;

    fn builder() -> PlannerBuilder {
        PlannerBuilder::new().with_fact_collector(Facts::default())
    }

    #[test]
    fn test_build_plan_with_vars_file_and_tags() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("site.yml");
        let vars_file = dir.path().join("vars.yml");
        fs::write(
            &config,
            "vars:\n  env: dev\nsteps:\n  - shell: \"deploy {{ env }}\"\n    tags: [deploy]\n  - print: hi\n",
        )
        .unwrap();
        fs::write(&vars_file, "env: prod\n").unwrap();

        let plan = handle_build_plan(
            &builder(),
            &BuildPlan {
                config: config.clone(),
                vars_file: Some(vars_file),
                tags: vec!["deploy".to_string()],
                os: Some("linux".to_string()),
            },
        )
        .unwrap();

        assert_eq!(plan.initial_vars.get("env"), Some(&serde_json::json!("prod")));
        assert_eq!(plan.steps.len(), 2);
        assert!(!plan.steps[0].skipped);
        assert!(plan.steps[1].skipped);
    }

    #[test]
    fn test_build_plan_missing_vars_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("site.yml");
        fs::write(&config, "- print: hi\n").unwrap();

        let err = handle_build_plan(
            &builder(),
            &BuildPlan {
                config,
                vars_file: Some(dir.path().join("missing.yml")),
                ..BuildPlan::default()
            },
        )
        .unwrap_err();

        assert!(err.to_string().starts_with("failed to read variables"));
    }

    #[test]
    fn test_validate_reports_errors_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("site.yml");
        fs::write(&config, "- name: nothing to do\n").unwrap();

        let report = handle_validate(&ValidateConfig {
            config,
            vars_file: None,
        })
        .unwrap();

        assert!(!report.valid);
        assert!(report.diagnostics.iter().any(|d| d.is_error()));
    }

    #[test]
    fn test_validate_missing_config_is_error() {
        let err = handle_validate(&ValidateConfig {
            config: "/nonexistent/site.yml".into(),
            vars_file: None,
        })
        .unwrap_err();

        assert!(err.to_string().starts_with("failed to read config"));
    }

    #[test]
    fn test_load_saved_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.yaml");
        let plan = Plan::new("site.yml", vec![]);
        save_plan_to_file(&plan, &path).unwrap();

        let loaded = handle_load_plan(&LoadPlan { path }).unwrap();
        assert_eq!(loaded, plan);
    }
}
