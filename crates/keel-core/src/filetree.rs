//! Directory walking for `with_filetree` loops.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::pathutil::PathExpander;
use crate::vars::Variables;

/// One entry found while walking a directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreeItem {
    /// Full path of the entry
    pub src: String,
    /// Path relative to the walked root, with a leading `/`. Empty for the
    /// root itself.
    pub path: String,
    pub name: String,
    /// `file` or `directory`
    pub state: String,
    pub is_dir: bool,
}

impl FileTreeItem {
    /// Number of directories between the walked root and this entry.
    pub fn depth(&self) -> usize {
        let trimmed = self.path.trim_start_matches('/');
        if trimmed.is_empty() {
            0
        } else {
            trimmed.matches('/').count()
        }
    }
}

/// Lists the entries of a directory tree.
pub trait FileTreeWalker: Send + Sync {
    /// Expands `pattern` against `base_dir` and `vars`, then lists every
    /// entry below it, the root included. Order is unspecified.
    fn file_tree(&self, pattern: &str, base_dir: &Path, vars: &Variables)
        -> Result<Vec<FileTreeItem>>;
}

/// Walks the local file system.
#[derive(Clone)]
pub struct DirectoryWalker {
    expander: PathExpander,
}

impl DirectoryWalker {
    pub fn new(expander: PathExpander) -> Self {
        Self { expander }
    }
}

impl FileTreeWalker for DirectoryWalker {
    fn file_tree(
        &self,
        pattern: &str,
        base_dir: &Path,
        vars: &Variables,
    ) -> Result<Vec<FileTreeItem>> {
        let root = self.expander.expand(pattern, base_dir, vars)?;
        let metadata =
            fs::metadata(&root).map_err(|e| PlanError::file_system(&root).with_source(e))?;

        let mut items = Vec::new();
        visit(&root, &root, metadata.is_dir(), &mut items)?;
        Ok(items)
    }
}

fn visit(root: &Path, path: &Path, is_dir: bool, items: &mut Vec<FileTreeItem>) -> Result<()> {
    let relative = path
        .strip_prefix(root)
        .map(|rel| {
            if rel.as_os_str().is_empty() {
                String::new()
            } else {
                format!("/{}", rel.display())
            }
        })
        .unwrap_or_default();

    items.push(FileTreeItem {
        src: path.display().to_string(),
        path: relative,
        name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        state: if is_dir { "directory" } else { "file" }.to_string(),
        is_dir,
    });

    if !is_dir {
        return Ok(());
    }

    let entries = fs::read_dir(path).map_err(|e| PlanError::file_system(path).with_source(e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PlanError::file_system(path).with_source(e))?;
        let child = entry.path();
        let child_is_dir = entry
            .file_type()
            .map_err(|e| PlanError::file_system(&child).with_source(e))?
            .is_dir();
        visit(root, &child, child_is_dir, items)?;
    }
    Ok(())
}
