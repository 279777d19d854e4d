//! Source locations and loop metadata attached to compiled steps.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a compiled step came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Absolute path of the file that declared the step
    pub file: String,

    pub line: usize,

    pub column: usize,

    /// `file:line` entries of the including files, root first. Excludes the
    /// step's own file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_chain: Vec<String>,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Kind of loop a step was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopType {
    WithItems,
    #[serde(rename = "with_filetree")]
    WithFileTree,
}

impl LoopType {
    pub fn as_str(self) -> &'static str {
        match self {
            LoopType::WithItems => "with_items",
            LoopType::WithFileTree => "with_filetree",
        }
    }
}

impl fmt::Display for LoopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-iteration metadata for a step produced by loop expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopContext {
    #[serde(rename = "type")]
    pub loop_type: LoopType,

    /// The iterated value. A file-tree entry for `with_filetree`.
    pub item: Value,

    pub index: usize,

    pub first: bool,

    pub last: bool,

    /// The loop source as written, before rendering
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub loop_expression: String,

    /// Directory depth of the entry, `with_filetree` only
    #[serde(default, skip_serializing_if = "is_zero")]
    pub depth: usize,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

impl LoopContext {
    /// Builds the context for iteration `index` of a loop over `len` items.
    pub fn new(
        loop_type: LoopType,
        item: Value,
        index: usize,
        len: usize,
        loop_expression: impl Into<String>,
    ) -> Self {
        Self {
            loop_type,
            item,
            index,
            first: index == 0,
            last: index + 1 == len,
            loop_expression: loop_expression.into(),
            depth: 0,
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Variables visible to the step while it is compiled.
    pub fn variables(&self) -> crate::vars::Variables {
        let mut vars = crate::vars::Variables::new();
        vars.insert("item".to_string(), self.item.clone());
        vars.insert("index".to_string(), Value::from(self.index));
        vars.insert("first".to_string(), Value::Bool(self.first));
        vars.insert("last".to_string(), Value::Bool(self.last));
        vars
    }
}
