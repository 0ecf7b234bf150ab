use crate::error::ExpressionError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The signature of a host-provided function value.
///
/// The first argument is the bound receiver (the container the function was
/// read from, when it was reached via member access), the second the
/// evaluated call arguments in order.
pub type NativeFn =
    dyn Fn(Option<&JsValue>, &[JsValue]) -> Result<JsValue, ExpressionError> + Send + Sync;

/// A host namespace object: a map whose members may themselves be functions
/// (e.g. the `Math` and `odata` globals).
pub type Namespace = HashMap<String, JsValue>;

/// Represents any value an expression can produce, including the
/// JavaScript-only values that have no JSON equivalent: `undefined`,
/// functions, and host namespace objects.
#[derive(Clone)]
pub enum JsValue {
    /// JavaScript `undefined`.
    Undefined,
    /// Any JSON-compatible value.
    Json(Value),
    /// A callable host function, possibly bound to a receiver.
    Function(JsFunction),
    /// A host namespace object.
    Object(Arc<Namespace>),
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Json(a), JsValue::Json(b)) => a == b,
            (JsValue::Function(a), JsValue::Function(b)) => a.same(b),
            (JsValue::Object(a), JsValue::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => f.write_str("undefined"),
            JsValue::Json(v) => fmt::Debug::fmt(v, f),
            JsValue::Function(_) => f.write_str("[function]"),
            JsValue::Object(_) => f.write_str("[namespace]"),
        }
    }
}

impl From<Value> for JsValue {
    fn from(v: Value) -> Self {
        JsValue::Json(v)
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Json(Value::Bool(b))
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        crate::util::f64_to_value(n)
    }
}

impl From<i64> for JsValue {
    fn from(n: i64) -> Self {
        JsValue::Json(Value::Number(serde_json::Number::from(n)))
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::Json(Value::String(s))
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::Json(Value::String(s.to_string()))
    }
}

/// A callable host function value.
///
/// Binding a receiver produces a new `JsFunction` sharing the same
/// underlying native function, so method-call semantics survive member
/// access without mutating the original.
#[derive(Clone)]
pub struct JsFunction {
    func: Arc<NativeFn>,
    receiver: Option<Arc<JsValue>>,
}

impl JsFunction {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Option<&JsValue>, &[JsValue]) -> Result<JsValue, ExpressionError>
            + Send
            + Sync
            + 'static,
    {
        JsFunction {
            func: Arc::new(func),
            receiver: None,
        }
    }

    /// Returns a copy of this function bound to `receiver`.
    pub fn bind(&self, receiver: &JsValue) -> JsFunction {
        JsFunction {
            func: Arc::clone(&self.func),
            receiver: Some(Arc::new(receiver.clone())),
        }
    }

    /// Invokes the function with the bound receiver, if any.
    pub fn call(&self, args: &[JsValue]) -> Result<JsValue, ExpressionError> {
        (self.func)(self.receiver.as_deref(), args)
    }

    pub fn receiver(&self) -> Option<&JsValue> {
        self.receiver.as_deref()
    }

    /// Identity comparison: same underlying native function.
    pub fn same(&self, other: &JsFunction) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsFunction")
    }
}
