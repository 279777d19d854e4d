//! Builder for creating and configuring Planner instances.

use std::fmt;
use std::sync::Arc;

use super::{IncludeStack, Planner};
use crate::actions::ActionRegistry;
use crate::config::{ConfigReader, YamlConfigReader};
use crate::expression::{ConditionEvaluator, Evaluator, ExpressionEvaluator};
use crate::facts::{current_os, FactCollector, SystemFactCollector};
use crate::filetree::{DirectoryWalker, FileTreeWalker};
use crate::pathutil::PathExpander;
use crate::template::{Renderer, TeraRenderer};

/// Builder for creating and configuring Planner instances.
///
/// Every collaborator has a default, so `PlannerBuilder::new().build()`
/// gives a planner for the local host. The builder is cheap to clone; clone
/// it to compile several plans with the same wiring.
#[derive(Clone)]
pub struct PlannerBuilder {
    renderer: Arc<dyn Renderer>,
    condition_evaluator: Arc<dyn Evaluator>,
    expression_evaluator: Arc<dyn Evaluator>,
    walker: Option<Arc<dyn FileTreeWalker>>,
    registry: ActionRegistry,
    facts: Arc<dyn FactCollector>,
    reader: Arc<dyn ConfigReader>,
    os: Option<String>,
}

impl PlannerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            renderer: Arc::new(TeraRenderer::new()),
            condition_evaluator: Arc::new(ConditionEvaluator),
            expression_evaluator: Arc::new(ExpressionEvaluator),
            walker: None,
            registry: ActionRegistry::builtin(),
            facts: Arc::new(SystemFactCollector),
            reader: Arc::new(YamlConfigReader::new()),
            os: None,
        }
    }

    /// Sets the template renderer.
    ///
    /// Unless a walker is set explicitly, the default walker expands paths
    /// with this renderer too.
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Sets the evaluator used for plan-time `when` checks.
    pub fn with_condition_evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        self.condition_evaluator = Arc::new(evaluator);
        self
    }

    /// Sets the evaluator used for `with_items` sources.
    pub fn with_expression_evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        self.expression_evaluator = Arc::new(evaluator);
        self
    }

    pub fn with_walker(mut self, walker: impl FileTreeWalker + 'static) -> Self {
        self.walker = Some(Arc::new(walker));
        self
    }

    /// Replaces the action registry used for platform checks.
    pub fn with_registry(mut self, registry: ActionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets where host facts come from. Pass a [`Facts`](crate::facts::Facts)
    /// value to compile with fixed facts.
    pub fn with_fact_collector(mut self, facts: impl FactCollector + 'static) -> Self {
        self.facts = Arc::new(facts);
        self
    }

    pub fn with_config_reader(mut self, reader: impl ConfigReader + 'static) -> Self {
        self.reader = Arc::new(reader);
        self
    }

    /// Checks platform support against `os` instead of the running OS.
    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    /// Builds a planner with a fresh step counter and include stack.
    pub fn build(self) -> Planner {
        let walker: Arc<dyn FileTreeWalker> = match self.walker {
            Some(walker) => walker,
            None => Arc::new(DirectoryWalker::new(PathExpander::new(Arc::clone(
                &self.renderer,
            )))),
        };
        Planner {
            renderer: self.renderer,
            condition_evaluator: self.condition_evaluator,
            expression_evaluator: self.expression_evaluator,
            walker,
            registry: self.registry,
            facts: self.facts,
            reader: self.reader,
            os: self.os.unwrap_or_else(|| current_os().to_string()),
            step_counter: 0,
            include_stack: IncludeStack::new(),
        }
    }
}

impl Default for PlannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PlannerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannerBuilder")
            .field("registry", &self.registry)
            .field("os", &self.os)
            .finish_non_exhaustive()
    }
}
