//! Checks on raw step mappings that the typed decode cannot express.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use super::Diagnostic;
use crate::models::Directive;
use crate::template::check_syntax;

/// Fields rendered as templates at compile time, as `(key, nested key)`.
/// An empty nested key means the value itself is the template.
const TEMPLATED_FIELDS: &[(&str, &str)] = &[
    ("name", ""),
    ("when", ""),
    ("include", ""),
    ("include_vars", ""),
    ("with_items", ""),
    ("with_filetree", ""),
    ("shell", ""),
    ("shell", "cmd"),
    ("print", ""),
    ("print", "msg"),
    ("file", "path"),
    ("file", "content"),
    ("file", "src"),
    ("template", "src"),
    ("template", "dest"),
    ("copy", "src"),
    ("copy", "dest"),
    ("unarchive", "src"),
    ("unarchive", "dest"),
];

/// Validates one raw step mapping declared at `line` of `file`.
pub(crate) fn validate_step(file: &Path, line: usize, step: &Mapping) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let directives: Vec<&str> = Directive::KEYS
        .into_iter()
        .filter(|key| step.contains_key(*key))
        .collect();
    if let [used, ignored @ ..] = directives.as_slice() {
        if !ignored.is_empty() {
            diagnostics.push(Diagnostic::warning(
                file,
                line,
                format!(
                    "step declares multiple directives ({}); only '{}' is used",
                    directives.join(", "),
                    used
                ),
            ));
        }
    }

    for (key, nested) in TEMPLATED_FIELDS {
        let Some(value) = field(step, key, nested) else {
            continue;
        };
        if let Err(message) = check_syntax(value) {
            let location = if nested.is_empty() {
                (*key).to_string()
            } else {
                format!("{key}.{nested}")
            };
            diagnostics.push(Diagnostic::error(
                file,
                line,
                format!("invalid template syntax in '{location}': {message}"),
            ));
        }
    }

    diagnostics
}

fn field<'a>(step: &'a Mapping, key: &str, nested: &str) -> Option<&'a str> {
    let value = step.get(key)?;
    if nested.is_empty() {
        return value.as_str();
    }
    match value {
        Value::Mapping(inner) => inner.get(nested).and_then(Value::as_str),
        _ => None,
    }
}
