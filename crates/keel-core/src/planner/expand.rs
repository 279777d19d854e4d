//! Directive dispatch: includes, loops and plan-time variables.

use std::path::Path;

use log::debug;
use serde_json::Value;

use super::{ExpansionContext, Planner};
use crate::config::StepPosition;
use crate::error::{PlanError, Result, ResultExt};
use crate::expression::type_name;
use crate::models::{Directive, LoopContext, LoopType, Step};
use crate::pathutil::resolve_path;
use crate::vars::Variables;

/// Outcome of checking a `vars`/`include_vars` step's `when` at plan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTimeDecision {
    /// The condition evaluated to `false`
    Skip,
    /// No condition, or it evaluated to `true`
    Process,
    /// The condition could not be decided with the variables known at plan
    /// time
    Indeterminate,
}

impl PlanTimeDecision {
    /// Undecidable conditions are processed, so variables are never lost
    /// to a condition that would hold at run time.
    pub fn should_process(self) -> bool {
        self != PlanTimeDecision::Skip
    }
}

impl Planner {
    /// Expands `steps` in order, appending compiled steps to `out`.
    ///
    /// `positions` locate the steps in the file on top of the include
    /// stack; it is empty for steps that do not come from a file.
    pub(super) fn expand_steps(
        &mut self,
        steps: &[Step],
        positions: &[StepPosition],
        ctx: &ExpansionContext<'_>,
        out: &mut Vec<Step>,
    ) -> Result<()> {
        for (index, step) in steps.iter().enumerate() {
            if let Some(position) = positions.get(index) {
                self.include_stack.set_position(*position);
            }
            self.expand_step(step, ctx, out)?;
        }
        Ok(())
    }

    fn expand_step(
        &mut self,
        step: &Step,
        ctx: &ExpansionContext<'_>,
        out: &mut Vec<Step>,
    ) -> Result<()> {
        match &step.directive {
            Some(Directive::Include(path)) => self.expand_include(step, path, ctx, out),
            Some(Directive::WithItems(expression)) => {
                self.expand_with_items(step, expression, ctx, out)
            }
            Some(Directive::WithFileTree(path)) => self.expand_with_filetree(step, path, ctx, out),
            Some(Directive::Vars(vars)) => {
                if self.check_plan_time(step, ctx) {
                    self.apply_vars(vars, ctx)?;
                }
                Ok(())
            }
            Some(Directive::IncludeVars(path)) => {
                if self.check_plan_time(step, ctx) {
                    self.apply_include_vars(path, ctx)?;
                }
                Ok(())
            }
            None => {
                let compiled = self
                    .compile_step(step, ctx, None)
                    .with_context(|| format!("failed to compile step {:?}", step.label()))?;
                out.push(compiled);
                Ok(())
            }
        }
    }

    fn expand_include(
        &mut self,
        step: &Step,
        path: &str,
        ctx: &ExpansionContext<'_>,
        out: &mut Vec<Step>,
    ) -> Result<()> {
        let rendered = ctx
            .render(self.renderer.as_ref(), path)
            .context("failed to render include path")?;
        let include_path =
            resolve_path(rendered.trim(), &ctx.current_dir).context("failed to resolve include path")?;

        self.include_stack.push(&include_path)?;
        let start = out.len();
        let result = self.expand_included_file(&include_path, ctx, out);
        self.include_stack.pop();
        result?;

        if !step.when.trim().is_empty() {
            for compiled in &mut out[start..] {
                compiled.when = combine_conditions(&step.when, &compiled.when);
            }
        }
        debug!(
            "included {} ({} steps)",
            include_path.display(),
            out.len() - start
        );
        Ok(())
    }

    fn expand_included_file(
        &mut self,
        path: &Path,
        ctx: &ExpansionContext<'_>,
        out: &mut Vec<Step>,
    ) -> Result<()> {
        let config = self.read_config(path).map_err(|source| PlanError::Include {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let include_ctx = ctx.for_include(dir);
        self.expand_steps(&config.steps, &config.positions, &include_ctx, out)
    }

    fn expand_with_items(
        &mut self,
        step: &Step,
        expression: &str,
        ctx: &ExpansionContext<'_>,
        out: &mut Vec<Step>,
    ) -> Result<()> {
        let items = self.loop_items(expression, ctx)?;
        debug!("with_items {expression:?} yields {} items", items.len());

        let len = items.len();
        for (index, item) in items.into_iter().enumerate() {
            let loop_context = LoopContext::new(LoopType::WithItems, item, index, len, expression);
            self.compile_iteration(step, ctx, loop_context, out)?;
        }
        Ok(())
    }

    fn expand_with_filetree(
        &mut self,
        step: &Step,
        path: &str,
        ctx: &ExpansionContext<'_>,
        out: &mut Vec<Step>,
    ) -> Result<()> {
        let rendered = ctx
            .render(self.renderer.as_ref(), path)
            .context("failed to render with_filetree path")?;
        let mut entries = ctx
            .scope
            .with(|vars| self.walker.file_tree(&rendered, &ctx.current_dir, vars))
            .context("failed to walk file tree")?;
        entries.sort_by(|a, b| a.src.cmp(&b.src));
        debug!("with_filetree {path:?} yields {} entries", entries.len());

        let len = entries.len();
        for (index, entry) in entries.iter().enumerate() {
            let loop_context =
                LoopContext::new(LoopType::WithFileTree, serde_json::to_value(entry)?, index, len, path)
                    .with_depth(entry.depth());
            self.compile_iteration(step, ctx, loop_context, out)?;
        }
        Ok(())
    }

    fn compile_iteration(
        &mut self,
        step: &Step,
        ctx: &ExpansionContext<'_>,
        loop_context: LoopContext,
        out: &mut Vec<Step>,
    ) -> Result<()> {
        let index = loop_context.index;
        let iteration = ctx.for_iteration(loop_context.variables());
        let compiled = self
            .compile_step(step, &iteration, Some(loop_context))
            .with_context(|| format!("failed to compile step {:?} iteration {index}", step.label()))?;
        out.push(compiled);
        Ok(())
    }

    /// Resolves a `with_items` source to its list of items.
    ///
    /// The source is rendered, then the result is looked up as a variable
    /// name, then evaluated as an expression. A source that is a single
    /// `{{ ... }}` block holding a list is taken as is first, since
    /// rendering would flatten the list to text; any other value goes
    /// through rendering so `{{ name_var }}` can name the list.
    fn loop_items(&self, expression: &str, ctx: &ExpansionContext<'_>) -> Result<Vec<Value>> {
        if let Some(inner) = bare_expression(expression) {
            if let Ok(Value::Array(items)) = self.lookup_or_evaluate(inner, ctx) {
                return Ok(items);
            }
        }

        let rendered = ctx
            .render(self.renderer.as_ref(), expression)
            .context("failed to render with_items expression")?;
        let source = rendered.trim();
        let value = self
            .lookup_or_evaluate(source, ctx)
            .context("failed to evaluate with_items")?;
        into_list(source, value)
    }

    fn lookup_or_evaluate(&self, source: &str, ctx: &ExpansionContext<'_>) -> Result<Value> {
        if let Some(value) = ctx.scope.get(source) {
            return Ok(value);
        }
        ctx.scope
            .with(|vars| self.expression_evaluator.evaluate(source, vars))
    }

    fn check_plan_time(&self, step: &Step, ctx: &ExpansionContext<'_>) -> bool {
        let decision = self.plan_time_decision(&step.when, ctx);
        if !decision.should_process() {
            debug!("skipping {} at plan time: {:?} is false", step.label(), step.when);
        }
        decision.should_process()
    }

    /// Decides a `when` condition with the variables known so far.
    pub(crate) fn plan_time_decision(
        &self,
        when: &str,
        ctx: &ExpansionContext<'_>,
    ) -> PlanTimeDecision {
        if when.trim().is_empty() {
            return PlanTimeDecision::Process;
        }

        let rendered = match ctx.render(self.renderer.as_ref(), when) {
            Ok(rendered) => rendered,
            Err(e) => {
                debug!("cannot render condition {when:?} at plan time: {e}");
                return PlanTimeDecision::Indeterminate;
            }
        };
        match ctx
            .scope
            .with(|vars| self.condition_evaluator.evaluate(&rendered, vars))
        {
            Ok(Value::Bool(true)) => PlanTimeDecision::Process,
            Ok(Value::Bool(false)) => PlanTimeDecision::Skip,
            Ok(other) => {
                debug!(
                    "condition {when:?} is a {} at plan time, not a bool",
                    type_name(&other)
                );
                PlanTimeDecision::Indeterminate
            }
            Err(e) => {
                debug!("cannot evaluate condition {when:?} at plan time: {e}");
                PlanTimeDecision::Indeterminate
            }
        }
    }

    /// Writes inline variables into the current scope. String values are
    /// rendered first.
    fn apply_vars(&self, vars: &Variables, ctx: &ExpansionContext<'_>) -> Result<()> {
        for (key, value) in vars {
            let value = match value {
                Value::String(text) => Value::String(
                    ctx.render(self.renderer.as_ref(), text)
                        .with_context(|| format!("failed to render var {key:?}"))?,
                ),
                other => other.clone(),
            };
            ctx.scope.set(key.as_str(), value);
        }
        debug!("set {} variables", vars.len());
        Ok(())
    }

    fn apply_include_vars(&self, path: &str, ctx: &ExpansionContext<'_>) -> Result<()> {
        let rendered = ctx
            .render(self.renderer.as_ref(), path)
            .context("failed to render include_vars path")?;
        let vars_path =
            resolve_path(rendered.trim(), &ctx.current_dir).context("failed to resolve vars path")?;
        let vars = self
            .reader
            .read_variables(&vars_path)
            .with_context(|| format!("failed to read variables from {}", vars_path.display()))?;

        debug!("loaded {} variables from {}", vars.len(), vars_path.display());
        ctx.scope.extend(vars);
        Ok(())
    }
}

/// ANDs an include's condition onto a step's own condition.
fn combine_conditions(parent: &str, child: &str) -> String {
    if child.trim().is_empty() {
        parent.to_string()
    } else {
        format!("({parent}) && ({child})")
    }
}

/// Returns the inside of `text` if it is exactly one `{{ ... }}` block.
fn bare_expression(text: &str) -> Option<&str> {
    let inner = text.trim().strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim())
}

fn into_list(expression: &str, value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(PlanError::NotAList {
            expression: expression.to_string(),
            found: type_name(&other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_conditions() {
        assert_eq!(combine_conditions("os == 'linux'", ""), "os == 'linux'");
        assert_eq!(
            combine_conditions("os == 'linux'", "arch == 'amd64'"),
            "(os == 'linux') && (arch == 'amd64')"
        );
    }

    #[test]
    fn test_bare_expression() {
        assert_eq!(bare_expression("{{ packages }}"), Some("packages"));
        assert_eq!(bare_expression(" {{ a.b[0] }} "), Some("a.b[0]"));
        assert_eq!(bare_expression("packages"), None);
        assert_eq!(bare_expression("{{ a }}-{{ b }}"), None);
    }

    #[test]
    fn test_decision_processes_unless_skip() {
        assert!(PlanTimeDecision::Process.should_process());
        assert!(PlanTimeDecision::Indeterminate.should_process());
        assert!(!PlanTimeDecision::Skip.should_process());
    }
}
