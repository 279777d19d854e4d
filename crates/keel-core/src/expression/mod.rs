//! Expression evaluation for conditions and loop sources.
//!
//! Two evaluators share one grammar:
//!
//! - [`ConditionEvaluator`] handles literals, top-level variables,
//!   comparisons (`== != < <= > >= in`), logic (`&& || !` and the word forms
//!   `and or not`), arithmetic and parentheses. It is what the planner uses
//!   for best-effort `when` checks.
//! - [`ExpressionEvaluator`] additionally resolves dot paths
//!   (`parameters.items`), indexing (`items[0]`, `map["key"]`) and list
//!   literals (`[1, 2]`). It resolves `with_items` sources.

mod eval;
mod parser;

use serde_json::Value;

use crate::error::{PlanError, Result};
use crate::vars::Variables;

/// Evaluates an expression string against variables.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, expression: &str, vars: &Variables) -> Result<Value>;
}

/// Simple evaluator for conditions. Rejects member access, indexing and list
/// literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator;

/// Full evaluator with member access, indexing and list literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEvaluator;

fn evaluate_with(expression: &str, vars: &Variables, accessors: bool) -> Result<Value> {
    parser::Parser::parse(expression.trim(), accessors)
        .and_then(|expr| eval::eval(&expr, vars))
        .map_err(|message| PlanError::expression(expression, message))
}

impl Evaluator for ConditionEvaluator {
    fn evaluate(&self, expression: &str, vars: &Variables) -> Result<Value> {
        evaluate_with(expression, vars, false)
    }
}

impl Evaluator for ExpressionEvaluator {
    fn evaluate(&self, expression: &str, vars: &Variables) -> Result<Value> {
        evaluate_with(expression, vars, true)
    }
}

/// Short name of a value's type, as used in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
