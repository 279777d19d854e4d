//! Tree-walking evaluation of parsed expressions.

use std::cmp::Ordering;

use serde_json::Value;

use super::parser::{BinaryOp, Expr, UnaryOp};
use super::type_name;
use crate::vars::Variables;

pub(crate) fn eval(expr: &Expr, vars: &Variables) -> Result<Value, String> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Var(name) => vars
            .get(name)
            .cloned()
            .ok_or_else(|| format!("undefined variable '{name}'")),
        Expr::List(items) => items
            .iter()
            .map(|item| eval(item, vars))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Unary(op, operand) => {
            let value = eval(operand, vars)?;
            match op {
                UnaryOp::Not => match value {
                    Value::Bool(b) => Ok(Value::Bool(!b)),
                    other => Err(format!("'!' expects a bool, got {}", type_name(&other))),
                },
                UnaryOp::Neg => match value {
                    Value::Number(n) => Ok(match n.as_i64().and_then(i64::checked_neg) {
                        Some(i) => Value::from(i),
                        None => float_value(-n.as_f64().unwrap_or_default()),
                    }),
                    other => Err(format!("'-' expects a number, got {}", type_name(&other))),
                },
            }
        }
        Expr::Binary(BinaryOp::And, left, right) => {
            if !expect_bool(BinaryOp::And, eval(left, vars)?)? {
                return Ok(Value::Bool(false));
            }
            expect_bool(BinaryOp::And, eval(right, vars)?).map(Value::Bool)
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            if expect_bool(BinaryOp::Or, eval(left, vars)?)? {
                return Ok(Value::Bool(true));
            }
            expect_bool(BinaryOp::Or, eval(right, vars)?).map(Value::Bool)
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, vars)?;
            let right = eval(right, vars)?;
            binary(*op, &left, &right)
        }
        Expr::Member(target, field) => match eval(target, vars)? {
            Value::Object(map) => map
                .get(field)
                .cloned()
                .ok_or_else(|| format!("no field '{field}'")),
            other => Err(format!(
                "cannot access field '{field}' on {}",
                type_name(&other)
            )),
        },
        Expr::Index(target, index) => {
            let target = eval(target, vars)?;
            let index = eval(index, vars)?;
            match (&target, &index) {
                (Value::Array(items), Value::Number(n)) => n
                    .as_u64()
                    .and_then(|i| usize::try_from(i).ok())
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or_else(|| format!("index {n} out of range")),
                (Value::Object(map), Value::String(key)) => map
                    .get(key)
                    .cloned()
                    .ok_or_else(|| format!("no key '{key}'")),
                _ => Err(format!(
                    "cannot index {} with {}",
                    type_name(&target),
                    type_name(&index)
                )),
            }
        }
    }
}

fn expect_bool(op: BinaryOp, value: Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(format!(
            "'{}' expects bool operands, got {}",
            op.symbol(),
            type_name(&other)
        )),
    }
}

fn float_value(f: f64) -> Value {
    serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// Equality with numbers compared by value, so `1 == 1.0`.
fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Ordering, String> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    ordering.ok_or_else(|| {
        format!(
            "cannot compare {} {} {}",
            type_name(left),
            op.symbol(),
            type_name(right)
        )
    })
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, String> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(equal(left, right))),
        BinaryOp::Ne => Ok(Value::Bool(!equal(left, right))),
        BinaryOp::Lt => compare(op, left, right).map(|o| Value::Bool(o == Ordering::Less)),
        BinaryOp::Le => compare(op, left, right).map(|o| Value::Bool(o != Ordering::Greater)),
        BinaryOp::Gt => compare(op, left, right).map(|o| Value::Bool(o == Ordering::Greater)),
        BinaryOp::Ge => compare(op, left, right).map(|o| Value::Bool(o != Ordering::Less)),
        BinaryOp::In => contains(right, left),
        BinaryOp::Add => match (left, right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            (Value::Array(a), Value::Array(b)) => {
                Ok(Value::Array(a.iter().chain(b).cloned().collect()))
            }
            _ => arithmetic(op, left, right),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, left, right)
        }
        BinaryOp::And | BinaryOp::Or => {
            let result = expect_bool(op, left.clone())? && expect_bool(op, right.clone())?;
            Ok(Value::Bool(result))
        }
    }
}

fn contains(haystack: &Value, needle: &Value) -> Result<Value, String> {
    match (haystack, needle) {
        (Value::Array(items), _) => Ok(Value::Bool(items.iter().any(|item| equal(item, needle)))),
        (Value::String(text), Value::String(part)) => Ok(Value::Bool(text.contains(part.as_str()))),
        (Value::Object(map), Value::String(key)) => Ok(Value::Bool(map.contains_key(key))),
        _ => Err(format!(
            "cannot check {} in {}",
            type_name(needle),
            type_name(haystack)
        )),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, String> {
    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(format!(
            "'{}' expects numbers, got {} and {}",
            op.symbol(),
            type_name(left),
            type_name(right)
        ));
    };

    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if matches!(op, BinaryOp::Div | BinaryOp::Rem) && y == 0 {
            return Err("division by zero".to_string());
        }
        let exact = match op {
            BinaryOp::Add => x.checked_add(y),
            BinaryOp::Sub => x.checked_sub(y),
            BinaryOp::Mul => x.checked_mul(y),
            BinaryOp::Rem => x.checked_rem(y),
            BinaryOp::Div if x.checked_rem(y) == Some(0) => x.checked_div(y),
            _ => None,
        };
        if let Some(result) = exact {
            return Ok(Value::from(result));
        }
    }

    let (x, y) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div | BinaryOp::Rem if y == 0.0 => return Err("division by zero".to_string()),
        BinaryOp::Div => x / y,
        BinaryOp::Rem => x % y,
        _ => return Err(format!("'{}' is not an arithmetic operator", op.symbol())),
    };
    Ok(float_value(result))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::expression::parser::Parser;

    fn run(input: &str, vars: Value) -> Result<Value, String> {
        let vars = match vars {
            Value::Object(map) => map,
            _ => Variables::new(),
        };
        eval(&Parser::parse(input, true)?, &vars)
    }

    #[test]
    fn test_comparisons() {
        let vars = json!({"os": "linux", "cores": 8});
        assert_eq!(run("os == \"linux\"", vars.clone()), Ok(json!(true)));
        assert_eq!(run("cores >= 4 && cores < 16", vars.clone()), Ok(json!(true)));
        assert_eq!(run("cores == 8.0", vars.clone()), Ok(json!(true)));
        assert_eq!(run("os != 'linux' or cores > 100", vars), Ok(json!(false)));
    }

    #[test]
    fn test_short_circuit_skips_undefined() {
        assert_eq!(run("false && missing", json!({})), Ok(json!(false)));
        assert_eq!(run("true || missing", json!({})), Ok(json!(true)));
        assert!(run("true && missing", json!({})).is_err());
    }

    #[test]
    fn test_logic_requires_bools() {
        let err = run("1 && true", json!({})).unwrap_err();
        assert_eq!(err, "'&&' expects bool operands, got number");
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("1 + 2 * 3", json!({})), Ok(json!(7)));
        assert_eq!(run("7 % 4", json!({})), Ok(json!(3)));
        assert_eq!(run("6 / 3", json!({})), Ok(json!(2)));
        assert_eq!(run("7 / 2", json!({})), Ok(json!(3.5)));
        assert_eq!(run("-(2 - 5)", json!({})), Ok(json!(3)));
        assert_eq!(run("'a' + 'b'", json!({})), Ok(json!("ab")));
        assert_eq!(run("1 / 0", json!({})), Err("division by zero".to_string()));
    }

    #[test]
    fn test_integer_overflow_falls_back_to_float() {
        let vars = json!({"big": i64::MIN});
        assert_eq!(run("big / -1 == 0", vars.clone()), Ok(json!(false)));
        assert_eq!(run("big / -1 > 0", vars.clone()), Ok(json!(true)));
        assert_eq!(run("big % -1 == 0", vars.clone()), Ok(json!(true)));
        assert_eq!(run("big * -1 > 0", vars.clone()), Ok(json!(true)));
        assert_eq!(run("-big > 0", vars), Ok(json!(true)));
    }

    #[test]
    fn test_in_operator() {
        let vars = json!({"tags": ["web", "db"], "name": "nginx", "env": {"prod": 1}});
        assert_eq!(run("'db' in tags", vars.clone()), Ok(json!(true)));
        assert_eq!(run("'gin' in name", vars.clone()), Ok(json!(true)));
        assert_eq!(run("'prod' in env", vars.clone()), Ok(json!(true)));
        assert_eq!(run("3 in [1, 2, 3]", vars), Ok(json!(true)));
    }

    #[test]
    fn test_member_and_index() {
        let vars = json!({"parameters": {"items": ["a", "b"], "meta": {"k": "v"}}});
        assert_eq!(run("parameters.items", vars.clone()), Ok(json!(["a", "b"])));
        assert_eq!(run("parameters.items[1]", vars.clone()), Ok(json!("b")));
        assert_eq!(run("parameters[\"meta\"].k", vars.clone()), Ok(json!("v")));
        assert_eq!(
            run("parameters.items[5]", vars.clone()),
            Err("index 5 out of range".to_string())
        );
        assert_eq!(
            run("parameters.missing", vars),
            Err("no field 'missing'".to_string())
        );
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            run("env == 'dev'", json!({})),
            Err("undefined variable 'env'".to_string())
        );
    }

    #[test]
    fn test_incomparable_types() {
        let err = run("'a' < 1", json!({})).unwrap_err();
        assert_eq!(err, "cannot compare string < number");
    }
}
