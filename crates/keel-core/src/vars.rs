//! Variable maps and the scope they live in during expansion.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

/// A variable map. Keys are kept in sorted order so snapshots serialize
/// deterministically.
pub type Variables = Map<String, Value>;

/// Returns a copy of `base` with every key of `overlay` written over it.
pub fn merge_variables(base: &Variables, overlay: &Variables) -> Variables {
    let mut merged = base.clone();
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Variable scope threaded through step expansion.
///
/// A scope is a handle onto a variable map. Two handles can either alias the
/// same map or own independent copies, and the choice is always made
/// explicitly:
///
/// - [`Scope::shared`] returns a handle onto the *same* map. Includes use it,
///   so a `vars:` step inside an included file is visible to the steps that
///   follow the include in the parent file.
/// - [`Scope::fork_with`] copies the map and writes an overlay on top. Loop
///   iterations use it, so `item` and friends never leak past the iteration.
///
/// `Scope` deliberately does not implement `Clone`, since it would be
/// ambiguous which of the two behaviours a clone should have.
pub struct Scope {
    vars: Rc<RefCell<Variables>>,
}

impl Scope {
    /// Creates a scope owning the given variables.
    pub fn new(vars: Variables) -> Self {
        Self {
            vars: Rc::new(RefCell::new(vars)),
        }
    }

    /// Returns a handle aliasing this scope's map.
    pub fn shared(&self) -> Self {
        Self {
            vars: Rc::clone(&self.vars),
        }
    }

    /// Returns an independent copy of this scope with `overlay` written on
    /// top. Overlay keys win on collision.
    pub fn fork_with(&self, overlay: Variables) -> Self {
        let mut vars = self.vars.borrow().clone();
        vars.extend(overlay);
        Self::new(vars)
    }

    /// Runs `f` with read access to the variables.
    pub fn with<R>(&self, f: impl FnOnce(&Variables) -> R) -> R {
        f(&self.vars.borrow())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.vars.borrow().get(key).cloned()
    }

    /// Sets a variable, overwriting any existing value.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(key.into(), value);
    }

    /// Writes every entry of `vars` into the scope, overwriting on collision.
    pub fn extend(&self, vars: Variables) {
        self.vars.borrow_mut().extend(vars);
    }

    /// Writes every entry of `vars` whose key is not already set.
    ///
    /// Returns the number of entries written.
    pub fn extend_missing(&self, vars: Variables) -> usize {
        let mut current = self.vars.borrow_mut();
        let mut written = 0;
        for (key, value) in vars {
            if !current.contains_key(&key) {
                current.insert(key, value);
                written += 1;
            }
        }
        written
    }

    /// Returns a copy of the current variables.
    pub fn snapshot(&self) -> Variables {
        self.vars.borrow().clone()
    }

    /// Returns true if both handles point at the same map.
    pub fn is_shared_with(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.vars, &other.vars)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("vars", &self.vars.borrow())
            .finish()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new(Variables::new())
    }
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
    fn test_shared_scope_sees_writes() {
        let parent = Scope::new(vars(json!({"env": "dev"})));
        let include = parent.shared();

        include.set("env", json!("prod"));
        include.set("region", json!("eu"));

        assert!(parent.is_shared_with(&include));
        assert_eq!(parent.get("env"), Some(json!("prod")));
        assert_eq!(parent.get("region"), Some(json!("eu")));
    }

    #[test]
    fn test_fork_does_not_leak() {
        let parent = Scope::new(vars(json!({"item": "outer", "keep": 1})));
        let iteration = parent.fork_with(vars(json!({"item": "inner", "index": 0})));

        assert_eq!(iteration.get("item"), Some(json!("inner")));
        assert_eq!(iteration.get("keep"), Some(json!(1)));

        iteration.set("scratch", json!(true));
        assert_eq!(parent.get("item"), Some(json!("outer")));
        assert!(parent.get("index").is_none());
        assert!(parent.get("scratch").is_none());
        assert!(!parent.is_shared_with(&iteration));
    }

    #[test]
    fn test_extend_missing_keeps_existing() {
        let scope = Scope::new(vars(json!({"os": "custom"})));
        let written = scope.extend_missing(vars(json!({"os": "linux", "arch": "amd64"})));

        assert_eq!(written, 1);
        assert_eq!(scope.get("os"), Some(json!("custom")));
        assert_eq!(scope.get("arch"), Some(json!("amd64")));
    }

    #[test]
    fn test_merge_variables_overlay_wins() {
        let base = vars(json!({"a": 1, "b": 2}));
        let overlay = vars(json!({"b": 3, "c": 4}));

        let merged = merge_variables(&base, &overlay);
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 3, "c": 4}));
    }
}
