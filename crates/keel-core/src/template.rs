//! Template rendering against a variable scope.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tera::{Context, Tera};

use crate::error::{error_chain, PlanError, Result};
use crate::vars::Variables;

/// Renders string templates.
pub trait Renderer: Send + Sync {
    /// Renders `template` against `vars`. Undefined variables are errors.
    fn render(&self, template: &str, vars: &Variables) -> Result<String>;
}

/// Returns true if `text` contains template delimiters.
pub fn is_template(text: &str) -> bool {
    text.contains("{{") || text.contains("{%") || text.contains("{#")
}

/// Parses `template` without rendering it, returning the parser's message on
/// failure.
pub fn check_syntax(template: &str) -> std::result::Result<(), String> {
    if !is_template(template) {
        return Ok(());
    }
    Tera::default()
        .add_raw_template("__syntax_check", template)
        .map_err(|e| error_chain(&e))
}

/// Jinja-style renderer backed by tera.
///
/// Registers an `expanduser` filter that expands a leading `~`.
pub struct TeraRenderer {
    tera: Mutex<Tera>,
}

impl TeraRenderer {
    pub fn new() -> Self {
        let mut tera = Tera::default();
        tera.register_filter("expanduser", expanduser);
        Self {
            tera: Mutex::new(tera),
        }
    }
}

impl Default for TeraRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TeraRenderer {
    fn render(&self, template: &str, vars: &Variables) -> Result<String> {
        if !is_template(template) {
            return Ok(template.to_string());
        }

        let context =
            Context::from_serialize(vars).map_err(|e| PlanError::template(template, &e))?;
        let mut tera = self.tera.lock().map_err(|_| PlanError::Template {
            template: template.to_string(),
            message: "template engine lock poisoned".to_string(),
        })?;

        tera.render_str(template, &context)
            .map_err(|e| PlanError::template(template, &e))
    }
}

fn expanduser(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let path = tera::try_get_value!("expanduser", "value", String, value);
    Ok(Value::String(shellexpand::tilde(&path).into_owned()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn vars(value: Value) -> Variables {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_plain_text_passes_through() {
        let renderer = TeraRenderer::new();
        let out = renderer.render("echo $HOME && ls", &Variables::new()).unwrap();
        assert_eq!(out, "echo $HOME && ls");
    }

    #[test]
    fn test_renders_variables_and_paths() {
        let renderer = TeraRenderer::new();
        let scope = vars(json!({"pkg": "nginx", "item": {"path": "/etc/a.conf"}, "index": 2}));

        assert_eq!(
            renderer.render("install {{ pkg }}", &scope).unwrap(),
            "install nginx"
        );
        assert_eq!(
            renderer.render("{{ item.path }}#{{ index }}", &scope).unwrap(),
            "/etc/a.conf#2"
        );
    }

    #[test]
    fn test_control_flow() {
        let renderer = TeraRenderer::new();
        let scope = vars(json!({"debug": true}));
        let out = renderer
            .render("{% if debug %}-v{% else %}-q{% endif %}", &scope)
            .unwrap();
        assert_eq!(out, "-v");
    }

    #[test]
    fn test_undefined_variable_is_error() {
        let renderer = TeraRenderer::new();
        let err = renderer.render("{{ missing }}", &Variables::new()).unwrap_err();

        assert!(matches!(err, PlanError::Template { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_expanduser_filter() {
        let renderer = TeraRenderer::new();
        let scope = vars(json!({"dir": "/opt/app"}));
        assert_eq!(
            renderer.render("{{ dir | expanduser }}", &scope).unwrap(),
            "/opt/app"
        );

        let expanded = renderer
            .render("{{ '~/bin' | expanduser }}", &Variables::new())
            .unwrap();
        assert!(expanded.ends_with("/bin"));
    }

    #[test]
    fn test_check_syntax() {
        assert!(check_syntax("plain").is_ok());
        assert!(check_syntax("{{ a }} and {% if b %}x{% endif %}").is_ok());
        assert!(check_syntax("{{ a ").is_err());
        assert!(check_syntax("{% if a %}unterminated").is_err());
    }
}
