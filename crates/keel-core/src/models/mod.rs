//! Data models for steps and plans.
//!
//! A [`Step`] is one declaration from a config file. The same type is used
//! on both sides of compilation: source steps carry a [`Directive`] and/or an
//! [`Action`], compiled steps carry an action plus plan metadata. Both
//! serialize to the same flat document shape, so a plan file reads like a
//! config file with `id`, `action_type`, `origin` and friends filled in.
//!
//! Display implementations for plans live in [`crate::display`].
//!
//! # Examples
//!
//! ```rust
//! use keel_core::models::{Action, ActionType, Step};
//!
//! let step: Step = serde_yaml::from_str("name: Greet\nshell: echo hi\n").unwrap();
//! assert_eq!(step.name, "Greet");
//! assert_eq!(
//!     step.action.as_ref().map(Action::action_type),
//!     Some(ActionType::Shell)
//! );
//! ```

mod action;
mod origin;
mod plan;
mod step;

pub use action::{
    Action, ActionType, ArtifactCaptureAction, ArtifactValidateAction, AssertAction,
    AssertCommand, AssertFile, AssertHttp, CommandAction, CopyAction, DownloadAction, FileAction,
    PackageAction, PresetInvocation, PrintAction, ServiceAction, ServiceDropin, ServiceUnit,
    ShellAction, TemplateAction, UnarchiveAction,
};
pub use origin::{LoopContext, LoopType, Origin};
pub use plan::{Plan, PLAN_VERSION};
pub use step::{Directive, Step};
