//! Position lookup for top-level steps.
//!
//! serde_yaml does not expose node positions, so step positions are
//! recovered by scanning the source for the sequence items of the step list.

/// 1-based line and column of the `-` that starts a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPosition {
    pub line: usize,
    pub column: usize,
}

impl StepPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for StepPosition {
    /// The top of the file.
    fn default() -> Self {
        Self::new(1, 1)
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#') || trimmed == "---"
}

fn is_item(trimmed: &str) -> bool {
    trimmed == "-" || trimmed.starts_with("- ")
}

/// Returns the position of each top-level step item, in order.
///
/// Handles a bare step list and a mapping with a block-style `steps:` key.
/// Flow-style sequences yield no positions.
pub(crate) fn step_positions(source: &str) -> Vec<StepPosition> {
    let mut positions = Vec::new();
    let mut in_steps = false;
    let mut item_indent: Option<usize> = None;
    let mut seen_content = false;

    for (index, line) in source.lines().enumerate() {
        if is_blank_or_comment(line) {
            continue;
        }
        let indent = indent_of(line);
        let trimmed = line.trim_start();

        if !seen_content {
            seen_content = true;
            if is_item(trimmed) {
                in_steps = true;
            }
        }

        if indent == 0 && !is_item(trimmed) {
            in_steps = trimmed
                .strip_prefix("steps:")
                .is_some_and(|rest| rest.trim().is_empty() || rest.trim().starts_with('#'));
            item_indent = None;
            continue;
        }

        if !in_steps || !is_item(trimmed) {
            continue;
        }

        match item_indent {
            None => {
                item_indent = Some(indent);
                positions.push(StepPosition::new(index + 1, indent + 1));
            }
            Some(expected) if expected == indent => {
                positions.push(StepPosition::new(index + 1, indent + 1));
            }
            Some(_) => {}
        }
    }

    positions
}
