//! Coercion and operator helpers.
//!
//! The expression grammar is a JavaScript subset, so every operator follows
//! JavaScript's coercion rules. This module is the single place those rules
//! are pinned down; the evaluation nodes only compose them.

use crate::error::ExpressionError;
use crate::types::JsValue;
use serde_json::Value;
use std::sync::Arc;

// ----------------------------------------------------------------- Type helpers

/// Returns true if a value is truthy (JS truthiness).
pub fn is_truthy(value: &JsValue) -> bool {
    match value {
        JsValue::Undefined => false,
        JsValue::Function(_) | JsValue::Object(_) => true,
        JsValue::Json(v) => match v {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        },
    }
}

/// The `typeof` string for a value: `null`, arrays and plain objects are
/// all `"object"`, like the JS operator.
pub fn type_of(value: &JsValue) -> &'static str {
    match value {
        JsValue::Undefined => "undefined",
        JsValue::Function(_) => "function",
        JsValue::Object(_) => "object",
        JsValue::Json(v) => match v {
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        },
    }
}

/// ToNumber. Unlike JSON, the result may be NaN (undefined, functions,
/// unparseable strings); arithmetic folds that back to `null` via
/// [`f64_to_value`].
pub fn to_number(value: &JsValue) -> f64 {
    match value {
        JsValue::Undefined | JsValue::Function(_) | JsValue::Object(_) => f64::NAN,
        JsValue::Json(v) => match v {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => parse_number(s),
            Value::Array(a) => parse_number(&json_array_to_str(a)),
            Value::Object(_) => f64::NAN,
        },
    }
}

fn parse_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // Rust accepts spellings like "inf" and "NaN" that JS rejects.
    if t.chars()
        .any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E'))
    {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// ToString.
pub fn to_str(value: &JsValue) -> String {
    match value {
        JsValue::Undefined => "undefined".to_string(),
        JsValue::Function(_) => "function () { [native code] }".to_string(),
        JsValue::Object(_) => "[object Object]".to_string(),
        JsValue::Json(v) => json_to_str(v),
    }
}

fn json_to_str(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_str(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => s.clone(),
        Value::Array(a) => json_array_to_str(a),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn json_array_to_str(a: &[Value]) -> String {
    // Array.prototype.toString: elements joined with ",", null/undefined
    // rendered as the empty string.
    a.iter()
        .map(|v| match v {
            Value::Null => String::new(),
            other => json_to_str(other),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Formats a number the way JS `String(n)` does for the common cases:
/// integral values print without a fractional part.
pub fn number_to_str(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// Converts an f64 back into a value. NaN/Infinity have no JSON number
/// representation and fold to `null` (matches JS JSON.stringify).
pub fn f64_to_value(n: f64) -> JsValue {
    match serde_json::Number::from_f64(n) {
        Some(num) => JsValue::Json(Value::Number(num)),
        None => JsValue::Json(Value::Null),
    }
}

/// Folds a value into plain JSON for embedding in array/object literals:
/// `undefined`, functions and namespaces have no JSON representation and
/// become `null`.
pub fn value_to_json(value: JsValue) -> Value {
    match value {
        JsValue::Undefined | JsValue::Function(_) | JsValue::Object(_) => Value::Null,
        JsValue::Json(v) => v,
    }
}

// ----------------------------------------------------------- Arithmetic helpers

pub fn add(a: &JsValue, b: &JsValue) -> JsValue {
    // JS `+`: string concatenation when either operand converts to a
    // string primitive (strings, arrays, objects, functions).
    if is_string_like(a) || is_string_like(b) {
        JsValue::Json(Value::String(format!("{}{}", to_str(a), to_str(b))))
    } else {
        f64_to_value(to_number(a) + to_number(b))
    }
}

fn is_string_like(value: &JsValue) -> bool {
    matches!(
        value,
        JsValue::Function(_)
            | JsValue::Object(_)
            | JsValue::Json(Value::String(_) | Value::Array(_) | Value::Object(_))
    )
}

pub fn subtract(a: &JsValue, b: &JsValue) -> JsValue {
    f64_to_value(to_number(a) - to_number(b))
}

pub fn multiply(a: &JsValue, b: &JsValue) -> JsValue {
    f64_to_value(to_number(a) * to_number(b))
}

pub fn divide(a: &JsValue, b: &JsValue) -> JsValue {
    // Division by zero yields ±Infinity in JS, which folds to null here.
    f64_to_value(to_number(a) / to_number(b))
}

pub fn modulo(a: &JsValue, b: &JsValue) -> JsValue {
    f64_to_value(to_number(a) % to_number(b))
}

// ----------------------------------------------------------- Comparison helpers

pub fn less(a: &JsValue, b: &JsValue) -> JsValue {
    JsValue::from(match (a, b) {
        (JsValue::Json(Value::String(x)), JsValue::Json(Value::String(y))) => x < y,
        _ => to_number(a) < to_number(b),
    })
}

pub fn less_eq(a: &JsValue, b: &JsValue) -> JsValue {
    JsValue::from(match (a, b) {
        (JsValue::Json(Value::String(x)), JsValue::Json(Value::String(y))) => x <= y,
        _ => to_number(a) <= to_number(b),
    })
}

pub fn greater(a: &JsValue, b: &JsValue) -> JsValue {
    JsValue::from(match (a, b) {
        (JsValue::Json(Value::String(x)), JsValue::Json(Value::String(y))) => x > y,
        _ => to_number(a) > to_number(b),
    })
}

pub fn greater_eq(a: &JsValue, b: &JsValue) -> JsValue {
    JsValue::from(match (a, b) {
        (JsValue::Json(Value::String(x)), JsValue::Json(Value::String(y))) => x >= y,
        _ => to_number(a) >= to_number(b),
    })
}

pub fn strict_eq(a: &JsValue, b: &JsValue) -> JsValue {
    JsValue::from(strict_equal(a, b))
}

pub fn strict_ne(a: &JsValue, b: &JsValue) -> JsValue {
    JsValue::from(!strict_equal(a, b))
}

/// Strict equality: no coercion, mismatched types are unequal. Data values
/// compare by deep value (clones sever JS reference identity), functions
/// and namespaces by identity.
pub fn strict_equal(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Json(x), JsValue::Json(y)) => deep_equal(x, y),
        (JsValue::Function(x), JsValue::Function(y)) => x.same(y),
        (JsValue::Object(x), JsValue::Object(y)) => Arc::ptr_eq(x, y),
        _ => false,
    }
}

/// Deep equality over JSON values. Numbers compare numerically so integer
/// and float representations of the same value are equal.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(arr_a), Value::Array(arr_b)) => {
            arr_a.len() == arr_b.len()
                && arr_a.iter().zip(arr_b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(obj_a), Value::Object(obj_b)) => {
            obj_a.len() == obj_b.len()
                && obj_a.iter().all(|(key, val_a)| {
                    obj_b.get(key).is_some_and(|val_b| deep_equal(val_a, val_b))
                })
        }
        _ => false,
    }
}

// ------------------------------------------------------------- Member helpers

/// Reads `container[key]`. A function member comes back bound to the
/// container so a subsequent call dispatches with it as the receiver.
pub fn get_member(container: &JsValue, key: &JsValue) -> Result<JsValue, ExpressionError> {
    let member = raw_member(container, key)?;
    Ok(match member {
        JsValue::Function(f) => JsValue::Function(f.bind(container)),
        other => other,
    })
}

fn raw_member(container: &JsValue, key: &JsValue) -> Result<JsValue, ExpressionError> {
    match container {
        JsValue::Undefined => Err(ExpressionError::NotContainer("undefined".to_string())),
        JsValue::Json(Value::Null) => Err(ExpressionError::NotContainer("null".to_string())),
        JsValue::Json(Value::String(s)) => Ok(string_member(s, key)),
        JsValue::Json(Value::Array(arr)) => Ok(array_member(arr, key)),
        JsValue::Json(Value::Object(obj)) => {
            let name = to_str(key);
            Ok(obj
                .get(&name)
                .map(|v| JsValue::Json(v.clone()))
                .unwrap_or(JsValue::Undefined))
        }
        JsValue::Object(ns) => {
            let name = to_str(key);
            Ok(ns.get(&name).cloned().unwrap_or(JsValue::Undefined))
        }
        JsValue::Json(_) | JsValue::Function(_) => Ok(JsValue::Undefined),
    }
}

fn string_member(s: &str, key: &JsValue) -> JsValue {
    if matches!(key, JsValue::Json(Value::String(k)) if k == "length") {
        return f64_to_value(s.chars().count() as f64);
    }
    if let Some(i) = member_index(key) {
        return s
            .chars()
            .nth(i)
            .map(|c| JsValue::Json(Value::String(c.to_string())))
            .unwrap_or(JsValue::Undefined);
    }
    JsValue::Undefined
}

fn array_member(arr: &[Value], key: &JsValue) -> JsValue {
    if matches!(key, JsValue::Json(Value::String(k)) if k == "length") {
        return f64_to_value(arr.len() as f64);
    }
    if let Some(i) = member_index(key) {
        return arr
            .get(i)
            .map(|v| JsValue::Json(v.clone()))
            .unwrap_or(JsValue::Undefined);
    }
    JsValue::Undefined
}

fn member_index(key: &JsValue) -> Option<usize> {
    match key {
        JsValue::Json(Value::Number(n)) => {
            let f = n.as_f64()?;
            (f >= 0.0 && f.fract() == 0.0).then_some(f as usize)
        }
        // JS array indices are property names, so "0" works too.
        JsValue::Json(Value::String(s)) => s.parse::<usize>().ok(),
        _ => None,
    }
}
