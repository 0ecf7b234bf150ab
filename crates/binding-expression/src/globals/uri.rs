//! URI encoding and template expansion.
//!
//! `encode_uri_component` follows the JS builtin of the same name;
//! `fill_uri_template` implements RFC 6570 simple string expansion (the
//! level-1 subset plus comma-separated variable lists), which is what the
//! `odata.fillUriTemplate` global delegates to.

use crate::error::ExpressionError;
use crate::types::JsValue;
use crate::util;
use serde_json::Value;

/// Percent-encodes everything outside the JS `encodeURIComponent`
/// unreserved set: `A–Z a–z 0–9 - _ . ! ~ * ' ( )`.
pub fn encode_uri_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Expands `{var}` expressions in `template` with values from `params`
/// (a JSON object or namespace). Undefined and null variables expand to
/// nothing, per RFC 6570.
pub fn fill_uri_template(template: &str, params: &JsValue) -> Result<String, ExpressionError> {
    let mut out = String::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            return Err(ExpressionError::Thrown(
                "Unterminated expression in URI template".to_string(),
            ));
        };
        let expression = &rest[open + 1..open + close];
        let mut expanded = Vec::new();
        for name in expression.split(',') {
            let value = lookup(params, name.trim());
            if !matches!(value, JsValue::Undefined | JsValue::Json(Value::Null)) {
                expanded.push(encode_template_value(&util::to_str(&value)));
            }
        }
        out.push_str(&expanded.join(","));
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn lookup(params: &JsValue, name: &str) -> JsValue {
    match params {
        JsValue::Json(Value::Object(map)) => map
            .get(name)
            .map(|v| JsValue::Json(v.clone()))
            .unwrap_or(JsValue::Undefined),
        JsValue::Object(ns) => ns.get(name).cloned().unwrap_or(JsValue::Undefined),
        _ => JsValue::Undefined,
    }
}

/// RFC 6570 simple expansion: everything outside the unreserved set
/// `A–Z a–z 0–9 - . _ ~` is percent-encoded.
fn encode_template_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
