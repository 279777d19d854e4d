//! Parameter structures for keel operations.
//!
//! These structures carry a request from an interface layer (the CLI, or a
//! program embedding keel) into the [`handlers`](crate::handlers) without
//! pulling in any interface framework. Interface layers define their own
//! argument types with framework-specific derives and convert them:
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │  Core Params    │    │    Handlers     │
//! │  (clap derives) │───▶│ (serde derives) │───▶│ (plan, validate)│
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ```ignore
//! // In keel-cli
//! #[derive(Args)]
//! pub struct ValidateArgs {
//!     #[arg(short, long)]
//!     pub config: PathBuf,
//! }
//!
//! impl From<ValidateArgs> for ValidateConfig {
//!     fn from(args: ValidateArgs) -> Self {
//!         ValidateConfig { config: args.config, vars_file: None }
//!     }
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Parameters for compiling a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildPlan {
    /// Root config file
    pub config: PathBuf,
    /// YAML file of variables that override the config's own `vars:`
    #[serde(default)]
    pub vars_file: Option<PathBuf>,
    /// Tag filter; empty keeps every step active
    #[serde(default)]
    pub tags: Vec<String>,
    /// Target OS for platform checks, defaults to the running OS
    #[serde(default)]
    pub os: Option<String>,
}

/// Parameters for validating a config file without compiling it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateConfig {
    pub config: PathBuf,
    /// Variables file to check alongside the config
    #[serde(default)]
    pub vars_file: Option<PathBuf>,
}

/// Parameters for loading a previously saved plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadPlan {
    /// A `.json`, `.yaml` or `.yml` plan file
    pub path: PathBuf,
}

/// Splits a comma-separated tag list, dropping empty entries.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
