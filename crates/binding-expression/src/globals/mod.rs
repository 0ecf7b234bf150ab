//! The default global scope for bare identifiers.
//!
//! Expressions have no variables (the only "variable" parts are embedded
//! bindings), so bare identifiers resolve against a small, fixed set of
//! globals: `encodeURIComponent`, the `Math` namespace, the `odata`
//! namespace and the `RegExp` constructor. Callers can substitute their own
//! map through the `globals` parameter of [`parse`](crate::parser::parse).

pub mod math;
pub mod odata;
pub mod uri;

use crate::error::ExpressionError;
use crate::types::{JsFunction, JsValue, Namespace};
use crate::util;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

/// The default globals map, built once and shared for the process lifetime.
pub fn default_globals() -> &'static Namespace {
    static GLOBALS: OnceLock<Namespace> = OnceLock::new();
    GLOBALS.get_or_init(|| {
        let mut globals = Namespace::new();
        globals.insert(
            "encodeURIComponent".to_string(),
            JsValue::Function(JsFunction::new(encode_uri_component)),
        );
        globals.insert(
            "Math".to_string(),
            JsValue::Object(Arc::new(math::namespace())),
        );
        globals.insert(
            "odata".to_string(),
            JsValue::Object(Arc::new(odata::namespace())),
        );
        globals.insert(
            "RegExp".to_string(),
            JsValue::Function(JsFunction::new(reg_exp)),
        );
        globals
    })
}

/// Positional argument access with JS call semantics: missing arguments
/// are `undefined`.
pub(crate) fn arg(args: &[JsValue], index: usize) -> &JsValue {
    args.get(index).unwrap_or(&JsValue::Undefined)
}

fn encode_uri_component(
    _receiver: Option<&JsValue>,
    args: &[JsValue],
) -> Result<JsValue, ExpressionError> {
    let s = util::to_str(arg(args, 0));
    Ok(JsValue::from(uri::encode_uri_component(&s)))
}

/// `RegExp(pattern, flags?)`: returns an object exposing `test`, `exec`,
/// `source` and `flags`, backed by a compiled [`regex::Regex`].
fn reg_exp(_receiver: Option<&JsValue>, args: &[JsValue]) -> Result<JsValue, ExpressionError> {
    let pattern = util::to_str(arg(args, 0));
    let flags = match arg(args, 1) {
        JsValue::Undefined => String::new(),
        other => util::to_str(other),
    };
    let regex = Arc::new(build_regex(&pattern, &flags)?);

    let mut ns = Namespace::new();
    ns.insert("source".to_string(), JsValue::from(pattern));
    ns.insert("flags".to_string(), JsValue::from(flags));

    let re = Arc::clone(&regex);
    ns.insert(
        "test".to_string(),
        JsValue::Function(JsFunction::new(move |_recv, args| {
            Ok(JsValue::from(re.is_match(&util::to_str(arg(args, 0)))))
        })),
    );

    let re = Arc::clone(&regex);
    ns.insert(
        "exec".to_string(),
        JsValue::Function(JsFunction::new(move |_recv, args| {
            let input = util::to_str(arg(args, 0));
            Ok(match re.captures(&input) {
                Some(caps) => {
                    let groups: Vec<Value> = caps
                        .iter()
                        .map(|group| {
                            group
                                .map(|m| Value::String(m.as_str().to_string()))
                                .unwrap_or(Value::Null)
                        })
                        .collect();
                    JsValue::Json(Value::Array(groups))
                }
                None => JsValue::Json(Value::Null),
            })
        })),
    );

    Ok(JsValue::Object(Arc::new(ns)))
}

fn build_regex(pattern: &str, flags: &str) -> Result<regex::Regex, ExpressionError> {
    let mut builder = regex::RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            // Matching here is stateless, so the global/sticky flags and
            // the unicode flag (always on) are accepted as no-ops.
            'g' | 'u' | 'y' => {}
            other => {
                return Err(ExpressionError::Thrown(format!(
                    "Invalid regular expression flag: {other}"
                )))
            }
        }
    }
    builder
        .build()
        .map_err(|e| ExpressionError::Thrown(format!("Invalid regular expression: {e}")))
}
