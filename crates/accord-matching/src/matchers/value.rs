//! Helpers for describing and classifying JSON values.

use serde_json::{Number, Value};

/// Shape classes compared by the type matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

pub fn shape(value: &Value) -> Shape {
    match value {
        Value::Null => Shape::Null,
        Value::Bool(_) => Shape::Boolean,
        Value::Number(_) => Shape::Number,
        Value::String(_) => Shape::String,
        Value::Array(_) => Shape::Array,
        Value::Object(_) => Shape::Object,
    }
}

/// Rendering used in mismatch messages: strings quoted, the rest as JSON.
pub fn value_of(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}

pub fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(n) if n.is_f64() => "Decimal",
        Value::Number(_) => "Integer",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// String form used by string-oriented matchers.
pub fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn is_collection(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// Element, entry or character count.
pub fn length(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        Value::Object(entries) => Some(entries.len()),
        Value::String(s) => Some(s.chars().count()),
        _ => None,
    }
}

/// Deep equality where `1` and `1.0` are the same number.
pub fn json_equals(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| json_equals(x, y)))
        }
        _ => expected == actual,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_of_quotes_strings() {
        assert_eq!(value_of(&json!("a")), "'a'");
        assert_eq!(value_of(&json!(5)), "5");
        assert_eq!(value_of(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_type_of() {
        assert_eq!(type_of(&json!(1)), "Integer");
        assert_eq!(type_of(&json!(1.5)), "Decimal");
        assert_eq!(type_of(&json!(null)), "Null");
        assert_eq!(type_of(&json!({})), "Object");
    }

    #[test]
    fn test_json_equals_numbers_by_value() {
        assert!(json_equals(&json!(1), &json!(1.0)));
        assert!(json_equals(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));
        assert!(!json_equals(&json!(1), &json!("1")));
        assert!(!json_equals(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_length() {
        assert_eq!(length(&json!("héllo")), Some(5));
        assert_eq!(length(&json!([1, 2, 3])), Some(3));
        assert_eq!(length(&json!(true)), None);
    }
}
