//! Action registry and platform-support metadata.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// Groups actions by their primary function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    Command,
    File,
    System,
    Data,
    Network,
    Output,
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionCategory::Command => "command",
            ActionCategory::File => "file",
            ActionCategory::System => "system",
            ActionCategory::Data => "data",
            ActionCategory::Network => "network",
            ActionCategory::Output => "output",
        };
        f.write_str(name)
    }
}

/// Describes an action handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMetadata {
    pub name: String,
    pub description: String,
    pub category: ActionCategory,
    /// Operating systems the action runs on. Empty means all of them.
    pub supported_platforms: Vec<String>,
    pub supports_dry_run: bool,
    pub supports_become: bool,
}

impl ActionMetadata {
    pub fn new(name: &str, description: &str, category: ActionCategory) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            category,
            supported_platforms: Vec::new(),
            supports_dry_run: true,
            supports_become: false,
        }
    }

    pub fn with_become(mut self) -> Self {
        self.supports_become = true;
        self
    }

    pub fn with_platforms(mut self, platforms: &[&str]) -> Self {
        self.supported_platforms = platforms.iter().map(|p| (*p).to_string()).collect();
        self
    }

    /// Returns true if the action can run on `os`.
    pub fn supports_platform(&self, os: &str) -> bool {
        self.supported_platforms.is_empty() || self.supported_platforms.iter().any(|p| p == os)
    }
}

/// A registered action. Execution lives outside the compiler; the planner only
/// reads metadata.
pub trait ActionHandler: Send + Sync {
    fn metadata(&self) -> ActionMetadata;
}

/// Handler carrying static metadata only.
#[derive(Debug, Clone)]
pub struct StaticAction {
    metadata: ActionMetadata,
}

impl StaticAction {
    pub fn new(metadata: ActionMetadata) -> Self {
        Self { metadata }
    }
}

impl ActionHandler for StaticAction {
    fn metadata(&self) -> ActionMetadata {
        self.metadata.clone()
    }
}

/// Maps action names to handlers.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: BTreeMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in action.
    pub fn builtin() -> Self {
        use ActionCategory::*;

        let mut registry = Self::new();
        for metadata in [
            ActionMetadata::new("shell", "Execute shell commands", Command).with_become(),
            ActionMetadata::new(
                "command",
                "Execute commands directly without shell interpolation",
                Command,
            )
            .with_become(),
            ActionMetadata::new("file", "Manage files, directories, links, and permissions", File)
                .with_become(),
            ActionMetadata::new(
                "template",
                "Render template files and write to destination",
                File,
            )
            .with_become(),
            ActionMetadata::new(
                "copy",
                "Copy files with checksum verification and atomic writes",
                File,
            )
            .with_become(),
            ActionMetadata::new(
                "unarchive",
                "Extract archive files (tar, tar.gz, zip) with path traversal protection",
                File,
            ),
            ActionMetadata::new(
                "download",
                "Download files from URLs with checksum verification",
                Network,
            )
            .with_become(),
            ActionMetadata::new(
                "package",
                "Manage system packages (install/remove/update)",
                System,
            )
            .with_become(),
            ActionMetadata::new(
                "service",
                "Manage services across platforms (systemd, launchd, Windows)",
                System,
            )
            .with_become(),
            ActionMetadata::new(
                "assert",
                "Verify conditions without changing system state",
                System,
            ),
            ActionMetadata::new("preset", "Execute a preset by expanding it into steps", System),
            ActionMetadata::new("print", "Display messages to the user", Output),
            ActionMetadata::new(
                "artifact_capture",
                "Capture file changes with enhanced metadata for LLM agents",
                System,
            ),
            ActionMetadata::new(
                "artifact_validate",
                "Validate artifacts against constraints (change budgets)",
                System,
            ),
            ActionMetadata::new("vars", "Set variables for use in subsequent steps", Data),
            ActionMetadata::new("include_vars", "Load variables from YAML files", Data),
            ActionMetadata::new(
                "include",
                "Load and execute steps from external YAML file",
                System,
            ),
        ] {
            registry.register(StaticAction::new(metadata));
        }
        registry
    }

    /// Registers a handler under its metadata name, replacing any previous
    /// handler with that name.
    pub fn register(&mut self, handler: impl ActionHandler + 'static) {
        let name = handler.metadata().name;
        self.handlers.insert(name, Arc::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<&dyn ActionHandler> {
        self.handlers.get(name).map(|handler| handler.as_ref())
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Fails if `action` is registered with a platform list that does not
    /// include `os`. Unregistered actions pass.
    pub fn check_platform(&self, action: &str, os: &str) -> Result<()> {
        let Some(handler) = self.get(action) else {
            return Ok(());
        };
        let metadata = handler.metadata();
        if metadata.supports_platform(os) {
            return Ok(());
        }
        Err(PlanError::UnsupportedPlatform {
            action: action.to_string(),
            os: os.to_string(),
            supported: metadata.supported_platforms,
        })
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
