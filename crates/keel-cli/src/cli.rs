//! Command-line argument types and command handlers.
//!
//! Each command has a clap `*Args` struct that converts into the matching
//! `keel_core::params` type, so the core never sees clap:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Handlers → Display / serde
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use keel_core::{
    facts::{FactCollector, SystemFactCollector},
    handle_build_plan, handle_load_plan, handle_validate,
    params::{parse_tags, BuildPlan, LoadPlan, ValidateConfig},
    plan_file::{save_plan_to_file, PlanFormat},
    PlanView, PlannerBuilder,
};
use log::info;
use serde::Serialize;

use crate::renderer::TerminalRenderer;

/// Output format for data written to stdout
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable markdown
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

/// Compile a config into a plan
///
/// Resolves includes, loops and variables and prints the flat plan. With
/// `--output` the plan is saved instead, in the format the file extension
/// names (.json, .yaml or .yml).
#[derive(Args)]
pub struct PlanArgs {
    /// Root config file
    #[arg(short, long)]
    pub config: PathBuf,
    /// YAML file of variables that override the config's own vars
    #[arg(short, long)]
    pub vars: Option<PathBuf>,
    /// Comma-separated tags; steps without a matching tag are marked skipped
    #[arg(short, long)]
    pub tags: Option<String>,
    /// Output format for stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Save the plan to this file instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Show where each step was defined and its include chain
    #[arg(long)]
    pub show_origins: bool,
    /// Check action platform support against this OS instead of the host's
    #[arg(long)]
    pub os: Option<String>,
}

impl From<&PlanArgs> for BuildPlan {
    fn from(val: &PlanArgs) -> Self {
        BuildPlan {
            config: val.config.clone(),
            vars_file: val.vars.clone(),
            tags: val.tags.as_deref().map(parse_tags).unwrap_or_default(),
            os: val.os.clone(),
        }
    }
}

/// Check a config without compiling it
#[derive(Args)]
pub struct ValidateArgs {
    /// Config file to check
    #[arg(short, long)]
    pub config: PathBuf,
    /// Variables file to check alongside the config
    #[arg(short, long)]
    pub vars: Option<PathBuf>,
    /// Output format for the report
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl From<&ValidateArgs> for ValidateConfig {
    fn from(val: &ValidateArgs) -> Self {
        ValidateConfig {
            config: val.config.clone(),
            vars_file: val.vars.clone(),
        }
    }
}

/// Show host facts
#[derive(Args)]
pub struct FactsArgs {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Display a saved plan file
#[derive(Args)]
pub struct ShowArgs {
    /// Plan file written by `keel plan --output`
    pub path: PathBuf,
    /// Show where each step was defined and its include chain
    #[arg(long)]
    pub show_origins: bool,
}

impl From<&ShowArgs> for LoadPlan {
    fn from(val: &ShowArgs) -> Self {
        LoadPlan {
            path: val.path.clone(),
        }
    }
}

/// Runs commands against a planner configuration and prints the results.
pub struct Cli {
    builder: PlannerBuilder,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(builder: PlannerBuilder, renderer: TerminalRenderer) -> Self {
        Self { builder, renderer }
    }

    pub fn handle_plan(&self, args: &PlanArgs) -> Result<()> {
        let plan = handle_build_plan(&self.builder, &args.into())
            .with_context(|| format!("Failed to build plan from {}", args.config.display()))?;

        if let Some(path) = &args.output {
            save_plan_to_file(&plan, path)
                .with_context(|| format!("Failed to save plan to {}", path.display()))?;
            info!("saved plan with {} steps", plan.steps.len());
            return self
                .renderer
                .render(&format!("Plan saved to {}\n", path.display()));
        }

        match args.format {
            OutputFormat::Text => self
                .renderer
                .render(&PlanView::new(&plan).with_origins(args.show_origins).to_string()),
            OutputFormat::Json => write_stdout(&PlanFormat::Json.serialize(&plan)?),
            OutputFormat::Yaml => write_stdout(&PlanFormat::Yaml.serialize(&plan)?),
        }
    }

    /// Prints the validation report and returns whether the config is valid.
    pub fn handle_validate(&self, args: &ValidateArgs) -> Result<bool> {
        let report = handle_validate(&args.into())
            .with_context(|| format!("Failed to validate {}", args.config.display()))?;

        match args.format {
            OutputFormat::Text => self.renderer.render(&report.to_string())?,
            format => print_data(&report, format)?,
        }
        Ok(report.valid)
    }

    pub fn handle_facts(&self, args: &FactsArgs) -> Result<()> {
        let facts = SystemFactCollector.collect();
        match args.format {
            OutputFormat::Text => self.renderer.render(&facts.to_string()),
            format => print_data(&facts, format),
        }
    }

    pub fn handle_show(&self, args: &ShowArgs) -> Result<()> {
        let plan = handle_load_plan(&args.into())?;
        self.renderer
            .render(&PlanView::new(&plan).with_origins(args.show_origins).to_string())
    }
}

fn print_data<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let text = match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        _ => format!("{}\n", serde_json::to_string_pretty(value)?),
    };
    write_stdout(&text)
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
