//! keel CLI application
//!
//! Command-line interface for compiling provisioning configs into plans.
//!
//! Exit status is 0 on success, 2 when the config fails validation and 1
//! for any other error.

mod args;
mod cli;
mod renderer;

use std::process::ExitCode;

use anyhow::Result;
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use keel_core::{PlanError, PlannerBuilder};
use log::{debug, info};
use renderer::TerminalRenderer;
use Commands::*;

const EXIT_INVALID_CONFIG: u8 = 2;

fn main() -> ExitCode {
    env_logger::init();

    let Args { no_color, command } = Args::parse();
    let cli = Cli::new(PlannerBuilder::new(), TerminalRenderer::new(!no_color));

    info!("keel started");

    match run(&cli, command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_INVALID_CONFIG),
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit_code_for(&err)
        }
    }
}

/// Runs `command`; `Ok(false)` means the config was checked and is invalid.
fn run(cli: &Cli, command: Commands) -> Result<bool> {
    match command {
        Plan(args) => cli.handle_plan(&args).map(|()| true),
        Validate(args) => cli.handle_validate(&args),
        Facts(args) => cli.handle_facts(&args).map(|()| true),
        Show(args) => cli.handle_show(&args).map(|()| true),
    }
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<PlanError>() {
        Some(plan_err) if plan_err.is_validation() => {
            debug!("exiting after validation failure");
            ExitCode::from(EXIT_INVALID_CONFIG)
        }
        _ => ExitCode::FAILURE,
    }
}
