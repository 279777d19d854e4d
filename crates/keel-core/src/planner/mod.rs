//! Plan compilation.
//!
//! The [`Planner`] turns a root config file into a flat [`Plan`]. Every
//! compile-time construct is resolved along the way:
//!
//! ```text
//!  root config ──▶ read + validate ──▶ merge vars + facts
//!                                           │
//!                                           ▼
//!                                     expand_steps ◀──────────┐
//!                                           │                 │
//!          ┌──────────────┬─────────────────┼──────────┐      │
//!          ▼              ▼                 ▼          ▼      │
//!       include     with_items /      vars /        action    │
//!          │        with_filetree   include_vars       │      │
//!          │              │          (scope only)      ▼      │
//!          │              └────────────────────▶ compile_step │
//!          └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: wires collaborators into a [`Planner`]
//! - `include_stack`: the files currently being expanded, used for cycle
//!   detection and step origins
//! - `expand`: directive dispatch, includes, loops and plan-time variables
//! - `compile`: turns one concrete step into a plan step
//!
//! A planner carries per-build state (the step counter and include stack),
//! so [`Planner::build_plan`] consumes it. Keep a [`PlannerBuilder`] around
//! to compile more than once.
//!
//! # Usage Examples
//!
//! ```no_run
//! use std::path::Path;
//!
//! use keel_core::{PlannerBuilder, Variables};
//!
//! # fn example() -> keel_core::Result<()> {
//! let plan = PlannerBuilder::new()
//!     .build()
//!     .build_plan(Path::new("site.yml"), &Variables::new(), &["web".to_string()])?;
//!
//! for step in plan.active_steps() {
//!     println!("{} {}", step.id, step.label());
//! }
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

pub mod builder;
mod compile;
mod expand;
pub mod include_stack;


pub use builder::PlannerBuilder;
pub use expand::PlanTimeDecision;
pub use include_stack::{IncludeFrame, IncludeStack};

use crate::actions::ActionRegistry;
use crate::config::{format_diagnostics_with_context, has_errors, ConfigReader, ParsedConfig};
use crate::error::{PlanError, Result, ResultExt};
use crate::expression::Evaluator;
use crate::facts::FactCollector;
use crate::filetree::FileTreeWalker;
use crate::models::{Plan, Step};
use crate::pathutil::resolve_path;
use crate::template::Renderer;
use crate::vars::{merge_variables, Scope, Variables};

/// Compiles config files into plans.
pub struct Planner {
    renderer: Arc<dyn Renderer>,
    condition_evaluator: Arc<dyn Evaluator>,
    expression_evaluator: Arc<dyn Evaluator>,
    walker: Arc<dyn FileTreeWalker>,
    registry: ActionRegistry,
    facts: Arc<dyn FactCollector>,
    reader: Arc<dyn ConfigReader>,
    /// Target OS for platform checks
    os: String,
    step_counter: usize,
    include_stack: IncludeStack,
}

/// State threaded through one level of expansion.
pub(crate) struct ExpansionContext<'a> {
    pub(crate) scope: Scope,
    /// Directory relative paths resolve against: the directory of the file
    /// being expanded
    pub(crate) current_dir: PathBuf,
    pub(crate) tags: &'a [String],
}

impl<'a> ExpansionContext<'a> {
    pub(crate) fn new(scope: Scope, current_dir: PathBuf, tags: &'a [String]) -> Self {
        Self {
            scope,
            current_dir,
            tags,
        }
    }

    /// Context for an included file: same variables, new directory.
    pub(crate) fn for_include(&self, current_dir: PathBuf) -> Self {
        Self::new(self.scope.shared(), current_dir, self.tags)
    }

    /// Context for one loop iteration: a private copy of the variables with
    /// the loop variables on top.
    pub(crate) fn for_iteration(&self, loop_vars: Variables) -> Self {
        Self::new(
            self.scope.fork_with(loop_vars),
            self.current_dir.clone(),
            self.tags,
        )
    }

    pub(crate) fn render(&self, renderer: &dyn Renderer, template: &str) -> Result<String> {
        self.scope.with(|vars| renderer.render(template, vars))
    }
}

impl Planner {
    /// Compiles the config at `config_path` into a plan.
    ///
    /// `vars` override the config's own `vars:`; host facts fill in any name
    /// neither of them sets. With a non-empty `tags` filter, steps sharing no
    /// tag with it are kept in the plan but marked skipped.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::Validation` if the root config or an included
    /// file has error diagnostics, `PlanError::IncludeCycle` (possibly
    /// wrapped) if a file includes itself, and any rendering, evaluation,
    /// file system or platform error raised while compiling a step.
    pub fn build_plan(mut self, config_path: &Path, vars: &Variables, tags: &[String]) -> Result<Plan> {
        let root = resolve_path(config_path, ".").context("failed to resolve config path")?;
        info!("building plan from {}", root.display());

        let config = self.read_config(&root)?;

        let scope = Scope::new(merge_variables(&config.vars, vars));
        let injected = scope.extend_missing(self.facts.collect().to_map());
        debug!("injected {injected} host facts");

        let mut plan = Plan::new(config_path.display().to_string(), tags.to_vec());
        plan.initial_vars = scope.snapshot();

        let current_dir = root.parent().map(Path::to_path_buf).unwrap_or_default();
        self.include_stack.push(&root)?;
        let ctx = ExpansionContext::new(scope, current_dir, tags);
        self.expand_steps(&config.steps, &config.positions, &ctx, &mut plan.steps)?;
        self.include_stack.pop();

        info!(
            "compiled {} steps from {} ({} skipped by tags)",
            plan.steps.len(),
            plan.root_file,
            plan.skipped_count()
        );
        Ok(plan)
    }

    /// Expands and compiles `steps` as if they were declared in a file in
    /// `current_dir`, with `vars` as the only variables and no tag filter.
    ///
    /// Step IDs continue from whatever this planner has already compiled.
    /// Used to compile step lists that are not read from a config file,
    /// such as preset bodies.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Planner::build_plan`] does for steps.
    pub fn expand_steps_with_context(
        &mut self,
        steps: &[Step],
        vars: Variables,
        current_dir: &Path,
    ) -> Result<Vec<Step>> {
        let ctx = ExpansionContext::new(Scope::new(vars), current_dir.to_path_buf(), &[]);
        let mut compiled = Vec::new();
        self.expand_steps(steps, &[], &ctx, &mut compiled)?;
        Ok(compiled)
    }

    /// Reads `path` and fails if any diagnostic is an error.
    fn read_config(&self, path: &Path) -> Result<ParsedConfig> {
        let (config, diagnostics) = self
            .reader
            .read_config_with_validation(path)
            .context("failed to read config")?;

        if has_errors(&diagnostics) {
            let formatted = format_diagnostics_with_context(&diagnostics);
            return Err(PlanError::Validation {
                diagnostics,
                formatted,
            });
        }
        Ok(config)
    }
}
