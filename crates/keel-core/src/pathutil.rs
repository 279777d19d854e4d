//! Path resolution helpers.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::error::{PlanError, Result};
use crate::template::Renderer;
use crate::vars::Variables;

/// Removes `.` components and folds `..` into its parent, without touching
/// the file system. Symlinks are not resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    normalized.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                );
                if normalized.components().next_back() == Some(Component::ParentDir) || at_root {
                    if !normalized.has_root() {
                        normalized.push("..");
                    }
                } else {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Resolves `path` against `base_dir` into a normalized absolute path.
///
/// Relative paths are joined to `base_dir` first. Absolute paths are only
/// normalized, so two spellings of the same file compare equal.
pub fn resolve_path(path: impl AsRef<Path>, base_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.as_ref().join(path)
    };
    let absolute = std::path::absolute(&joined).map_err(|source| PlanError::PathResolution {
        path: path.display().to_string(),
        source,
    })?;
    Ok(normalize_path(&absolute))
}

/// Expands user-supplied path templates.
#[derive(Clone)]
pub struct PathExpander {
    renderer: Arc<dyn Renderer>,
}

impl PathExpander {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }

    /// Renders `path`, trims it, expands a leading `~`, and makes it
    /// absolute against `current_dir`.
    pub fn expand(&self, path: &str, current_dir: &Path, vars: &Variables) -> Result<PathBuf> {
        let rendered = self.renderer.render(path, vars)?;
        let trimmed = rendered.trim();
        let expanded = if trimmed == "~" || trimmed.starts_with("~/") {
            match home_dir() {
                Some(home) => home.join(trimmed.trim_start_matches('~').trim_start_matches('/')),
                None => PathBuf::from(shellexpand::tilde(trimmed).as_ref()),
            }
        } else {
            PathBuf::from(trimmed)
        };
        resolve_path(expanded, current_dir)
    }
}

/// The current user's home directory.
pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}
