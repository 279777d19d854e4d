//! Config file reading and validation.
//!
//! A config file is either a bare list of steps or a mapping:
//!
//! ```yaml
//! version: "1.0"
//! vars:
//!   packages: [git, curl]
//! steps:
//!   - name: Install {{ item }}
//!     with_items: packages
//!     package:
//!       name: "{{ item }}"
//! ```
//!
//! Reading never fails on bad content; problems are reported as
//! [`Diagnostic`]s and it is up to the caller to decide whether errors abort.

mod diagnostic;
mod location;
mod reader;
mod validator;

pub use diagnostic::{
    format_diagnostics, format_diagnostics_with_context, has_errors, Diagnostic, Severity,
};
pub use location::StepPosition;
pub use reader::{ConfigReader, ParsedConfig, YamlConfigReader};
