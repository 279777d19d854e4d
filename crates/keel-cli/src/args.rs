use clap::{Parser, Subcommand};

use crate::cli::{FactsArgs, PlanArgs, ShowArgs, ValidateArgs};

/// Compile declarative provisioning configs into flat execution plans
///
/// keel reads a YAML config, resolves includes, loops, variables and tag
/// filters, and prints the resulting plan or saves it for later execution.
/// Nothing on the host is changed.
#[derive(Parser)]
#[command(version, about, name = "keel")]
pub struct Args {
    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the keel CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Compile a config into a plan
    #[command(alias = "p")]
    Plan(PlanArgs),
    /// Check a config for schema and template errors without compiling it
    #[command(alias = "v")]
    Validate(ValidateArgs),
    /// Show the host facts available to configs
    Facts(FactsArgs),
    /// Display a saved plan file
    Show(ShowArgs),
}
