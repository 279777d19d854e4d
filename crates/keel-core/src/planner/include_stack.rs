//! The stack of config files currently being expanded.

use std::path::{Path, PathBuf};

use crate::config::StepPosition;
use crate::error::{PlanError, Result};
use crate::models::Origin;

/// One file on the include stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeFrame {
    /// Absolute, normalized path of the file
    pub file_path: PathBuf,
    /// Position of the step being expanded in this file. For a parent
    /// frame that is the `include` step.
    pub line: usize,
    pub column: usize,
}

impl IncludeFrame {
    /// A frame pointing at the top of the file.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        let top = StepPosition::default();
        Self {
            file_path: file_path.into(),
            line: top.line,
            column: top.column,
        }
    }

    fn location(&self) -> String {
        format!("{}:{}", self.file_path.display(), self.line)
    }
}

/// Files being expanded, root first.
///
/// A file is "seen" exactly while it has a frame on the stack, so a file
/// may be included again once its previous expansion has finished.
#[derive(Debug, Clone, Default)]
pub struct IncludeStack {
    frames: Vec<IncludeFrame>,
}

impl IncludeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a frame for `path`.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::IncludeCycle` if `path` is already on the stack.
    pub fn push(&mut self, path: &Path) -> Result<()> {
        if self.contains(path) {
            return Err(PlanError::IncludeCycle {
                path: path.to_path_buf(),
                chain: self.format_chain(),
            });
        }
        self.frames.push(IncludeFrame::new(path));
        Ok(())
    }

    pub fn pop(&mut self) -> Option<IncludeFrame> {
        self.frames.pop()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.frames.iter().any(|frame| frame.file_path == path)
    }

    /// Records that the step at `position` of the top file is being
    /// expanded. Does nothing on an empty stack.
    pub fn set_position(&mut self, position: StepPosition) {
        if let Some(frame) = self.frames.last_mut() {
            frame.line = position.line;
            frame.column = position.column;
        }
    }

    /// Origin of a step declared in the file on top of the stack.
    pub fn origin(&self) -> Option<Origin> {
        let (current, parents) = self.frames.split_last()?;
        Some(Origin {
            file: current.file_path.display().to_string(),
            line: current.line,
            column: current.column,
            include_chain: parents.iter().map(IncludeFrame::location).collect(),
        })
    }

    /// `file:line` of every frame joined with ` -> `.
    pub fn format_chain(&self) -> String {
        self.frames
            .iter()
            .map(IncludeFrame::location)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_rejects_file_already_on_stack() {
        let mut stack = IncludeStack::new();
        stack.push(Path::new("/cfg/main.yml")).unwrap();
        stack.push(Path::new("/cfg/a.yml")).unwrap();

        let err = stack.push(Path::new("/cfg/main.yml")).unwrap_err();
        assert!(err.is_include_cycle());
        assert_eq!(
            err.to_string(),
            "include cycle detected: /cfg/main.yml\nChain: /cfg/main.yml:1 -> /cfg/a.yml:1"
        );
        assert_eq!(stack.pop().map(|frame| frame.file_path), Some(PathBuf::from("/cfg/a.yml")));
    }

    #[test]
    fn test_file_can_be_pushed_again_after_pop() {
        let mut stack = IncludeStack::new();
        stack.push(Path::new("/cfg/main.yml")).unwrap();
        stack.push(Path::new("/cfg/common.yml")).unwrap();
        stack.pop();

        assert!(!stack.contains(Path::new("/cfg/common.yml")));
        assert!(stack.push(Path::new("/cfg/common.yml")).is_ok());
    }

    #[test]
    fn test_origin_uses_top_frame_and_parent_chain() {
        let mut stack = IncludeStack::new();
        assert!(stack.origin().is_none());

        stack.push(Path::new("/cfg/main.yml")).unwrap();
        let root = stack.origin().unwrap();
        assert_eq!(root.file, "/cfg/main.yml");
        assert!(root.include_chain.is_empty());

        stack.push(Path::new("/cfg/roles/web.yml")).unwrap();
        let nested = stack.origin().unwrap();
        assert_eq!(nested.file, "/cfg/roles/web.yml");
        assert_eq!((nested.line, nested.column), (1, 1));
        assert_eq!(nested.include_chain, vec!["/cfg/main.yml:1".to_string()]);
    }

    #[test]
    fn test_positions_flow_into_origin_and_chain() {
        let mut stack = IncludeStack::new();
        stack.set_position(StepPosition::new(9, 9));

        stack.push(Path::new("/cfg/main.yml")).unwrap();
        stack.set_position(StepPosition::new(7, 3));
        stack.push(Path::new("/cfg/roles/web.yml")).unwrap();
        stack.set_position(StepPosition::new(4, 1));

        let origin = stack.origin().unwrap();
        assert_eq!((origin.line, origin.column), (4, 1));
        assert_eq!(origin.include_chain, vec!["/cfg/main.yml:7".to_string()]);

        let err = stack.push(Path::new("/cfg/main.yml")).unwrap_err();
        assert!(err
            .to_string()
            .ends_with("Chain: /cfg/main.yml:7 -> /cfg/roles/web.yml:4"));
    }
}
