use std::fs;
use std::path::PathBuf;

use keel_core::{Facts, PlannerBuilder};
use tempfile::TempDir;

/// A temporary directory of config files.
pub struct ConfigTree {
    pub dir: TempDir,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Writes `content` to `name` below the tree, creating parent
    /// directories.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Helper function to create a planner builder with fixed linux facts
pub fn linux_builder() -> PlannerBuilder {
    PlannerBuilder::new()
        .with_fact_collector(Facts {
            os: "linux".to_string(),
            arch: "amd64".to_string(),
            distribution: "debian".to_string(),
            package_manager: "apt".to_string(),
            cpu_cores: 4,
            ..Facts::default()
        })
        .with_os("linux")
}
