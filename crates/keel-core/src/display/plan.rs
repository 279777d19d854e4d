//! Markdown rendering of compiled plans.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::models::{LoopContext, Origin, Plan, Step};

/// A plan formatted for reading, optionally with the source location of
/// every step.
///
/// # Examples
///
/// ```rust
/// use keel_core::{display::PlanView, Plan};
///
/// let plan = Plan::new("site.yml", vec![]);
/// let text = PlanView::new(&plan).with_origins(true).to_string();
/// assert!(text.starts_with("# Plan: site.yml"));
/// ```
pub struct PlanView<'a> {
    plan: &'a Plan,
    show_origins: bool,
}

impl<'a> PlanView<'a> {
    pub fn new(plan: &'a Plan) -> Self {
        Self {
            plan,
            show_origins: false,
        }
    }

    pub fn with_origins(mut self, show_origins: bool) -> Self {
        self.show_origins = show_origins;
        self
    }
}

impl fmt::Display for PlanView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.plan;
        writeln!(f, "# Plan: {}", plan.root_file)?;
        writeln!(f)?;
        writeln!(f, "- Generated: {}", LocalDateTime(&plan.generated_at))?;
        if !plan.tags.is_empty() {
            writeln!(f, "- Tags: {}", plan.tags.join(", "))?;
        }
        match plan.skipped_count() {
            0 => writeln!(f, "- Steps: {}", plan.steps.len())?,
            skipped => writeln!(f, "- Steps: {} ({skipped} skipped)", plan.steps.len())?,
        }

        if plan.steps.is_empty() {
            writeln!(f, "\nNo steps in this plan.")?;
            return Ok(());
        }

        for (position, step) in plan.steps.iter().enumerate() {
            writeln!(f)?;
            write_step(f, position + 1, step, self.show_origins)?;
        }
        Ok(())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        PlanView::new(self).fmt(f)
    }
}

fn write_step(f: &mut fmt::Formatter<'_>, position: usize, step: &Step, show_origins: bool) -> fmt::Result {
    writeln!(f, "## [{position}] {} ({})", step.label(), step.id)?;
    writeln!(f)?;

    let action = step
        .action_type
        .map_or("unknown", |action_type| action_type.as_str());
    writeln!(f, "- Action: {action}")?;
    if step.skipped {
        writeln!(f, "- Status: SKIPPED (tags)")?;
    }
    if !step.when.is_empty() {
        writeln!(f, "- When: `{}`", step.when)?;
    }
    if !step.tags.is_empty() {
        writeln!(f, "- Tags: {}", step.tags.join(", "))?;
    }
    if show_origins {
        if let Some(origin) = &step.origin {
            write_origin(f, origin)?;
        }
    }
    if let Some(loop_context) = &step.loop_context {
        write_loop(f, loop_context)?;
    }
    Ok(())
}

fn write_origin(f: &mut fmt::Formatter<'_>, origin: &Origin) -> fmt::Result {
    writeln!(f, "- Origin: {origin}")?;
    if !origin.include_chain.is_empty() {
        writeln!(f, "- Chain: {}", origin.include_chain.join(" -> "))?;
    }
    Ok(())
}

fn write_loop(f: &mut fmt::Formatter<'_>, loop_context: &LoopContext) -> fmt::Result {
    writeln!(
        f,
        "- Loop: {}[{}] (first={}, last={})",
        loop_context.loop_type, loop_context.index, loop_context.first, loop_context.last
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{Action, ActionType, LoopType, PrintAction};

    fn sample_plan() -> Plan {
        let mut step = Step::with_action(Action::Print(PrintAction {
            msg: "hello".to_string(),
        }));
        step.id = "step-0001".to_string();
        step.name = "greet".to_string();
        step.action_type = Some(ActionType::Print);
        step.tags = vec!["web".to_string()];
        step.origin = Some(Origin {
            file: "/srv/roles/web.yml".to_string(),
            line: 1,
            column: 1,
            include_chain: vec!["/srv/site.yml:1".to_string()],
        });
        step.loop_context = Some(LoopContext::new(LoopType::WithItems, json!("a"), 0, 2, "xs"));

        let mut skipped = step.clone();
        skipped.id = "step-0002".to_string();
        skipped.name = String::new();
        skipped.skipped = true;
        skipped.loop_context = None;

        let mut plan = Plan::new("site.yml", vec!["web".to_string()]);
        plan.steps = vec![step, skipped];
        plan
    }

    #[test]
    fn test_plan_view_without_origins() {
        let plan = sample_plan();
        let text = PlanView::new(&plan).to_string();

        assert!(text.contains("- Tags: web"));
        assert!(text.contains("- Steps: 2 (1 skipped)"));
        assert!(text.contains("## [1] greet (step-0001)"));
        assert!(text.contains("- Loop: with_items[0] (first=true, last=false)"));
        assert!(text.contains("## [2] print (step-0002)"));
        assert!(text.contains("- Status: SKIPPED (tags)"));
        assert!(!text.contains("Origin:"));
    }

    #[test]
    fn test_plan_view_with_origins() {
        let plan = sample_plan();
        let text = PlanView::new(&plan).with_origins(true).to_string();

        assert!(text.contains("- Origin: /srv/roles/web.yml:1:1"));
        assert!(text.contains("- Chain: /srv/site.yml:1"));
    }

    #[test]
    fn test_empty_plan() {
        let plan = Plan::new("empty.yml", vec![]);
        assert!(plan.to_string().contains("No steps in this plan."));
    }
}
