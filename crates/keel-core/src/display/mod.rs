//! Display formatting for plans, validation results and facts.
//!
//! Everything here implements [`std::fmt::Display`] and produces markdown,
//! which the CLI renders to the terminal. Machine-readable output (JSON,
//! YAML) goes through serde instead.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Plan, Facts,   │    │ PlanView,       │    │    Markdown     │
//! │  Diagnostics    │───▶│ ValidationReport│───▶│ (terminal/file) │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! - [`plan`]: [`PlanView`], optionally with step origins
//! - [`validation`]: [`ValidationReport`]
//! - [`datetime`]: [`LocalDateTime`]
//! - `facts`: `Display` for [`Facts`](crate::facts::Facts)

pub mod datetime;
mod facts;
pub mod plan;
pub mod validation;

pub use datetime::LocalDateTime;
pub use plan::PlanView;
pub use validation::ValidationReport;
