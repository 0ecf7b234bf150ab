//! The `Math` global namespace.

use crate::error::ExpressionError;
use crate::globals::arg;
use crate::types::{JsFunction, JsValue, Namespace};
use crate::util;
use std::f64::consts;

pub fn namespace() -> Namespace {
    let mut ns = Namespace::new();

    ns.insert("E".to_string(), util::f64_to_value(consts::E));
    ns.insert("LN2".to_string(), util::f64_to_value(consts::LN_2));
    ns.insert("LN10".to_string(), util::f64_to_value(consts::LN_10));
    ns.insert("LOG2E".to_string(), util::f64_to_value(consts::LOG2_E));
    ns.insert("LOG10E".to_string(), util::f64_to_value(consts::LOG10_E));
    ns.insert("PI".to_string(), util::f64_to_value(consts::PI));
    ns.insert(
        "SQRT1_2".to_string(),
        util::f64_to_value(consts::FRAC_1_SQRT_2),
    );
    ns.insert("SQRT2".to_string(), util::f64_to_value(consts::SQRT_2));

    ns.insert("abs".to_string(), unary(f64::abs));
    ns.insert("ceil".to_string(), unary(f64::ceil));
    ns.insert("exp".to_string(), unary(f64::exp));
    ns.insert("floor".to_string(), unary(f64::floor));
    ns.insert("log".to_string(), unary(f64::ln));
    ns.insert("sqrt".to_string(), unary(f64::sqrt));
    // Math.round rounds halves toward +Infinity, unlike f64::round.
    ns.insert("round".to_string(), unary(|n| (n + 0.5).floor()));

    ns.insert(
        "pow".to_string(),
        JsValue::Function(JsFunction::new(|_recv, args| {
            let base = util::to_number(arg(args, 0));
            let exponent = util::to_number(arg(args, 1));
            Ok(util::f64_to_value(base.powf(exponent)))
        })),
    );
    ns.insert(
        "max".to_string(),
        JsValue::Function(JsFunction::new(|_recv, args| fold(args, f64::NEG_INFINITY, f64::max))),
    );
    ns.insert(
        "min".to_string(),
        JsValue::Function(JsFunction::new(|_recv, args| fold(args, f64::INFINITY, f64::min))),
    );
    ns.insert(
        "random".to_string(),
        JsValue::Function(JsFunction::new(|_recv, _args| {
            Ok(util::f64_to_value(rand::random::<f64>()))
        })),
    );

    ns
}

fn unary(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> JsValue {
    JsValue::Function(JsFunction::new(move |_recv, args| {
        Ok(util::f64_to_value(f(util::to_number(arg(args, 0)))))
    }))
}

fn fold(
    args: &[JsValue],
    start: f64,
    pick: impl Fn(f64, f64) -> f64,
) -> Result<JsValue, ExpressionError> {
    let mut best = start;
    for value in args {
        let n = util::to_number(value);
        if n.is_nan() {
            return Ok(util::f64_to_value(f64::NAN));
        }
        best = pick(best, n);
    }
    Ok(util::f64_to_value(best))
}
