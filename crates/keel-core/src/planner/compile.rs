//! Compilation of a single concrete step into a plan step.

use std::path::Path;

use super::{ExpansionContext, Planner};
use crate::error::{PlanError, Result, ResultExt};
use crate::models::{Action, LoopContext, Step};
use crate::pathutil::normalize_path;

impl Planner {
    /// Assigns the next ID, renders the compile-time fields and attaches the
    /// plan metadata.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::InvalidInput` if the step has no action, a
    /// rendering error if a templated field fails, and
    /// `PlanError::UnsupportedPlatform` if the action cannot run on the
    /// target OS.
    pub(super) fn compile_step(
        &mut self,
        step: &Step,
        ctx: &ExpansionContext<'_>,
        loop_context: Option<LoopContext>,
    ) -> Result<Step> {
        let Some(action) = &step.action else {
            return Err(PlanError::invalid_input("action")
                .with_reason(format!("step {:?} has nothing to compile", step.label())));
        };

        self.step_counter += 1;
        let id = format!("step-{:04}", self.step_counter);

        let mut compiled = step.clone();
        compiled.name = ctx
            .render(self.renderer.as_ref(), &step.name)
            .context("failed to render step name")?;
        compiled.skipped = should_skip_by_tags(&step.tags, ctx.tags);

        let action = self.render_action(action, ctx)?;
        let action_type = action.action_type();
        compiled.action = Some(action);
        compiled.directive = None;
        compiled.id = id;
        compiled.action_type = Some(action_type);
        compiled.origin = self.include_stack.origin();
        compiled.loop_context = loop_context;

        self.registry
            .check_platform(action_type.as_str(), &self.os)
            .with_context(|| format!("platform validation failed for step {:?}", compiled.name))?;

        Ok(compiled)
    }

    /// Returns a copy of `action` with its compile-time fields rendered and
    /// relative source paths made absolute against the current directory.
    fn render_action(&self, action: &Action, ctx: &ExpansionContext<'_>) -> Result<Action> {
        let render = |what: &str, text: &str| {
            ctx.render(self.renderer.as_ref(), text)
                .with_context(|| format!("failed to render {what}"))
        };
        let source = |what: &str, text: &str| -> Result<String> {
            let rendered = render(what, text)?;
            Ok(absolutize(&rendered, &ctx.current_dir))
        };

        let mut action = action.clone();
        match &mut action {
            Action::Shell(shell) => shell.cmd = render("shell command", &shell.cmd)?,
            Action::File(file) => {
                file.path = render("file path", &file.path)?;
                if !file.content.is_empty() {
                    file.content = render("file content", &file.content)?;
                }
                if !file.src.is_empty() {
                    file.src = source("file src", &file.src)?;
                }
            }
            Action::Template(template) => {
                template.src = source("template src", &template.src)?;
                template.dest = render("template dest", &template.dest)?;
            }
            Action::Copy(copy) => {
                copy.src = source("copy src", &copy.src)?;
                copy.dest = render("copy dest", &copy.dest)?;
            }
            Action::Unarchive(unarchive) => {
                unarchive.src = source("unarchive src", &unarchive.src)?;
                unarchive.dest = render("unarchive dest", &unarchive.dest)?;
            }
            Action::Service(service) => {
                if let Some(unit) = service.unit.as_mut() {
                    if !unit.src_template.is_empty() {
                        unit.src_template =
                            source("service unit src_template", &unit.src_template)?;
                    }
                }
                if let Some(dropin) = service.dropin.as_mut() {
                    if !dropin.src_template.is_empty() {
                        dropin.src_template =
                            source("service dropin src_template", &dropin.src_template)?;
                    }
                }
            }
            // Rendered by the executor with run-time variables.
            _ => {}
        }
        Ok(action)
    }
}

/// Joins a relative path onto `dir`. Absolute paths are returned as is.
fn absolutize(path: &str, dir: &Path) -> String {
    if Path::new(path).is_absolute() {
        return path.to_string();
    }
    normalize_path(&dir.join(path)).display().to_string()
}

/// Returns true if a step with `step_tags` is excluded by `filter`.
///
/// An empty filter excludes nothing. Otherwise a step needs at least one
/// tag in common with the filter.
pub(crate) fn should_skip_by_tags(step_tags: &[String], filter: &[String]) -> bool {
    if filter.is_empty() {
        return false;
    }
    !step_tags.iter().any(|tag| filter.contains(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn test_tag_filter() {
        assert!(!should_skip_by_tags(&[], &[]));
        assert!(!should_skip_by_tags(&tags(&["dev"]), &[]));
        assert!(should_skip_by_tags(&[], &tags(&["dev"])));
        assert!(should_skip_by_tags(&tags(&["prod"]), &tags(&["dev"])));
        assert!(!should_skip_by_tags(&tags(&["prod", "dev"]), &tags(&["dev", "test"])));
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(absolutize("x.j2", Path::new("/tmp")), "/tmp/x.j2");
        assert_eq!(absolutize("../shared/x.j2", Path::new("/srv/cfg")), "/srv/shared/x.j2");
        assert_eq!(absolutize("/etc/../x.j2", Path::new("/tmp")), "/etc/../x.j2");
    }
}
