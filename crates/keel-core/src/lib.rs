//! Core library for keel, a compiler for declarative provisioning configs.
//!
//! A config is a YAML list of steps. Besides concrete actions (`shell`,
//! `file`, `template`, `package`, ...) steps may use compile-time directives:
//! `include` splices in another file, `with_items` and `with_filetree`
//! repeat an action, and `vars`/`include_vars` set variables. The
//! [`Planner`] resolves all of them and produces a flat, fully templated
//! [`Plan`] that an executor can run without further expansion.
//!
//! # Architecture
//!
//! ```text
//!  config ──▶ config::YamlConfigReader ──▶ planner::Planner ──▶ Plan
//!                  (diagnostics)           │  template::Renderer
//!                                          │  expression::Evaluator
//!                                          │  filetree::FileTreeWalker
//!                                          │  facts::FactCollector
//!                                          │  actions::ActionRegistry
//!                                          ▼
//!                          plan_file (JSON/YAML) · display (markdown)
//! ```
//!
//! Every collaborator sits behind a trait and is injected through
//! [`PlannerBuilder`]; the defaults work against the local host.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use keel_core::{plan_file::save_plan_to_file, PlannerBuilder, Variables};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let plan = PlannerBuilder::new()
//!     .build()
//!     .build_plan(Path::new("site.yml"), &Variables::new(), &[])?;
//!
//! println!("{plan}");
//! save_plan_to_file(&plan, Path::new("plan.json"))?;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod config;
pub mod display;
pub mod error;
pub mod expression;
pub mod facts;
pub mod filetree;
pub mod handlers;
pub mod models;
pub mod params;
pub mod pathutil;
pub mod plan_file;
pub mod planner;
pub mod template;
pub mod vars;

// Re-export commonly used types
pub use config::{Diagnostic, Severity};
pub use display::{PlanView, ValidationReport};
pub use error::{PlanError, Result, ResultExt};
pub use facts::Facts;
pub use handlers::{handle_build_plan, handle_load_plan, handle_validate};
pub use models::{Action, ActionType, LoopContext, Origin, Plan, Step};
pub use params::{BuildPlan, LoadPlan, ValidateConfig};
pub use plan_file::{load_plan_from_file, save_plan_to_file};
pub use planner::{Planner, PlannerBuilder};
pub use vars::Variables;
