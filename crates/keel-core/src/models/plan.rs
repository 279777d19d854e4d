//! Plan model definition.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::Step;
use crate::vars::Variables;

/// Version written into every generated plan.
pub const PLAN_VERSION: &str = "1.0";

/// A compiled, flat and fully templated plan.
///
/// `steps` is in execution order. No further expansion is needed downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub version: String,

    /// Timestamp when the plan was generated (UTC)
    pub generated_at: Timestamp,

    /// Root config path as given by the caller
    pub root_file: String,

    pub steps: Vec<Step>,

    /// Variable snapshot at generation time, facts included
    #[serde(default, skip_serializing_if = "Variables::is_empty")]
    pub initial_vars: Variables,

    /// Tag filter applied while compiling
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Plan {
    /// Creates an empty plan for `root_file`.
    pub fn new(root_file: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            version: PLAN_VERSION.to_string(),
            generated_at: Timestamp::now(),
            root_file: root_file.into(),
            steps: Vec::new(),
            initial_vars: Variables::new(),
            tags,
        }
    }

    /// Returns the steps that were not excluded by the tag filter.
    pub fn active_steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|step| !step.skipped)
    }

    pub fn skipped_count(&self) -> usize {
        self.steps.iter().filter(|step| step.skipped).count()
    }
}
