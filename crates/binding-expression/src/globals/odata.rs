//! The `odata` global namespace: URI template filling and OData V2 URI
//! literal formatting.

use crate::error::ExpressionError;
use crate::globals::{arg, uri};
use crate::types::{JsFunction, JsValue, Namespace};
use crate::util;
use serde_json::Value;

pub fn namespace() -> Namespace {
    let mut ns = Namespace::new();
    ns.insert(
        "fillUriTemplate".to_string(),
        JsValue::Function(JsFunction::new(fill_uri_template)),
    );
    ns.insert(
        "uriEncode".to_string(),
        JsValue::Function(JsFunction::new(uri_encode_fn)),
    );
    ns
}

fn fill_uri_template(
    _receiver: Option<&JsValue>,
    args: &[JsValue],
) -> Result<JsValue, ExpressionError> {
    let template = util::to_str(arg(args, 0));
    uri::fill_uri_template(&template, arg(args, 1)).map(JsValue::from)
}

fn uri_encode_fn(
    _receiver: Option<&JsValue>,
    args: &[JsValue],
) -> Result<JsValue, ExpressionError> {
    let edm_type = util::to_str(arg(args, 1));
    Ok(JsValue::from(uri_encode(arg(args, 0), &edm_type)))
}

/// Formats a value as an OData V2 URI literal for the given Edm type:
/// strings are quoted with doubled quotes, the numeric types carry their
/// literal suffix, Guids stay raw, and null formats as `null`.
pub fn uri_encode(value: &JsValue, edm_type: &str) -> String {
    if matches!(value, JsValue::Undefined | JsValue::Json(Value::Null)) {
        return "null".to_string();
    }
    let s = util::to_str(value);
    match edm_type {
        "Edm.String" => format!("'{}'", s.replace('\'', "''")),
        "Edm.Guid" => s,
        "Edm.Int64" => format!("{s}l"),
        "Edm.Decimal" => format!("{s}m"),
        "Edm.Double" => format!("{s}d"),
        "Edm.Single" => format!("{s}f"),
        "Edm.DateTime" => format!("datetime'{s}'"),
        "Edm.DateTimeOffset" => format!("datetimeoffset'{s}'"),
        "Edm.Time" => format!("time'{s}'"),
        "Edm.Binary" => format!("binary'{s}'"),
        _ => s,
    }
}
