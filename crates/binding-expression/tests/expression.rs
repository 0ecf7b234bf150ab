//! Integration tests for the expression parser and its compiled evaluators.

use binding_expression::{
    parse, ExpressionError, JsFunction, JsValue, Namespace, ParseOutcome, ResolvedBinding,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn no_bindings(_input: &str, _at: usize) -> Result<ResolvedBinding, ExpressionError> {
    Err(ExpressionError::Thrown(
        "unexpected embedded binding".to_string(),
    ))
}

/// Resolves `${name}` style bindings: consumes through the closing brace
/// and yields the values of `parts` in occurrence order.
fn sequence_resolver(
    parts: Vec<Value>,
) -> impl FnMut(&str, usize) -> Result<ResolvedBinding, ExpressionError> {
    let mut next = 0;
    move |input, at| {
        let close = at + input[at..].find('}').expect("unterminated binding") + 1;
        let result = JsValue::Json(parts[next].clone());
        next += 1;
        Ok(ResolvedBinding { result, at: close })
    }
}

fn check(expression: &str, expected: Value) {
    match parse(no_bindings, expression, None, None) {
        Ok(ParseOutcome::Constant { value, .. }) => {
            assert_eq!(value, JsValue::Json(expected), "expression: {expression}")
        }
        Ok(ParseOutcome::Expression { .. }) => {
            panic!("expected constant outcome for {expression}")
        }
        Err(e) => panic!("parse({expression}) failed: {e}"),
    }
}

fn check_with(expression: &str, globals: &Namespace, expected: Value) {
    match parse(no_bindings, expression, None, Some(globals)) {
        Ok(ParseOutcome::Constant { value, .. }) => {
            assert_eq!(value, JsValue::Json(expected), "expression: {expression}")
        }
        Ok(ParseOutcome::Expression { .. }) => {
            panic!("expected constant outcome for {expression}")
        }
        Err(e) => panic!("parse({expression}) failed: {e}"),
    }
}

fn check_err(expression: &str) -> ExpressionError {
    parse(no_bindings, expression, None, None)
        .err()
        .unwrap_or_else(|| panic!("expected error for {expression}"))
}

// ----------------------------------------------------------------- Literals

#[test]
fn test_literals() {
    check("1", json!(1.0));
    check("3.141", json!(3.141));
    check(".5", json!(0.5));
    check("1.25e2", json!(125.0));
    check("'foo'", json!("foo"));
    check("\"bar\"", json!("bar"));
    check("true", json!(true));
    check("false", json!(false));
    check("null", json!(null));
}

#[test]
fn test_array_literal() {
    check("[]", json!([]));
    check("['foo', 'bar']", json!(["foo", "bar"]));
    check("[1, [2, 3]]", json!([1.0, [2.0, 3.0]]));
}

#[test]
fn test_array_literal_with_holes() {
    // An empty slot is an undefined element, which folds to null in the
    // assembled JSON array.
    check("[1,,3]", json!([1.0, null, 3.0]));
    check("[,1]", json!([null, 1.0]));
}

#[test]
fn test_object_literal() {
    check("{}", json!({}));
    check("{foo: 'bar'}", json!({"foo": "bar"}));
    check("{foo: 1, 'key with spaces': 2}", json!({"foo": 1.0, "key with spaces": 2.0}));
    check("{a: {b: 1}}", json!({"a": {"b": 1.0}}));
}

// ---------------------------------------------------------------- Operators

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    check("1+2*3", json!(7.0));
    check("2*3+1", json!(7.0));
}

#[test]
fn test_grouping() {
    check("(1+2)*3", json!(9.0));
}

#[test]
fn test_left_associativity() {
    check("1-2-3", json!(-4.0));
    check("12/3/2", json!(2.0));
}

#[test]
fn test_arithmetic() {
    check("10/4", json!(2.5));
    check("7%2", json!(1.0));
    check("1.5*4", json!(6.0));
}

#[test]
fn test_division_by_zero_folds_to_null() {
    // 1/0 is Infinity, 0/0 is NaN; neither has a JSON representation.
    check("1/0", json!(null));
    check("0/0", json!(null));
}

#[test]
fn test_string_concatenation() {
    check("'a'+'b'", json!("ab"));
    check("'a'+1", json!("a1"));
    check("1+'a'", json!("1a"));
    check("'n: '+6.5", json!("n: 6.5"));
    check("'sum: '+(1+2)", json!("sum: 3"));
}

#[test]
fn test_numeric_coercion_in_addition() {
    check("1+null", json!(1.0));
    check("true+true", json!(2.0));
    check("1+undefinedName", json!(null)); // NaN folds to null
}

#[test]
fn test_unary_operators() {
    check("-3+5", json!(2.0));
    check("+'2'+1", json!(3.0));
    check("1+-2", json!(-1.0));
    check("2*-3", json!(-6.0));
    check("!true", json!(false));
    check("!0", json!(true));
    check("!''", json!(true));
    check("!!'x'", json!(true));
}

#[test]
fn test_typeof() {
    check("typeof 1", json!("number"));
    check("typeof 'a'", json!("string"));
    check("typeof true", json!("boolean"));
    check("typeof null", json!("object"));
    check("typeof [1]", json!("object"));
    check("typeof {}", json!("object"));
    check("typeof missingName", json!("undefined"));
    check("typeof -1", json!("number"));
}

#[test]
fn test_relational_operators() {
    check("1<2", json!(true));
    check("2<=2", json!(true));
    check("3>2", json!(true));
    check("2>=3", json!(false));
    check("'b'>'a'", json!(true));
    check("2<='2'", json!(true)); // numeric comparison when types mix
}

#[test]
fn test_strict_equality() {
    check("1===1", json!(true));
    check("1==='1'", json!(false));
    check("1!=='1'", json!(true));
    check("null===null", json!(true));
    check("'a'==='a'", json!(true));
    check("true!==1", json!(true));
}

#[test]
fn test_loose_equality_is_not_grammar() {
    let err = check_err("1=='1'");
    assert!(
        matches!(
            err,
            ExpressionError::UnexpectedToken(_) | ExpressionError::ExpectedToken(_)
        ),
        "got: {err}"
    );
}

// ------------------------------------------------------------ Short circuits

fn probe_globals(called: &Arc<AtomicBool>) -> Namespace {
    let flag = Arc::clone(called);
    let mut globals = Namespace::new();
    globals.insert(
        "X".to_string(),
        JsValue::Function(JsFunction::new(move |_recv, _args| {
            flag.store(true, Ordering::SeqCst);
            Ok(JsValue::Json(json!("called")))
        })),
    );
    globals
}

#[test]
fn test_and_short_circuits() {
    let called = Arc::new(AtomicBool::new(false));
    check_with("false && X()", &probe_globals(&called), json!(false));
    assert!(!called.load(Ordering::SeqCst), "X must not be invoked");
}

#[test]
fn test_or_short_circuits() {
    let called = Arc::new(AtomicBool::new(false));
    check_with("true || X()", &probe_globals(&called), json!(true));
    assert!(!called.load(Ordering::SeqCst), "X must not be invoked");
}

#[test]
fn test_logical_operators_return_operand_values() {
    check("1 && 2", json!(2.0));
    check("0 && 2", json!(0.0));
    check("'' || 'a'", json!("a"));
    check("'x' || 'y'", json!("x"));
}

#[test]
fn test_conditional() {
    check("true ? 1 : 2", json!(1.0));
    check("0 ? 1 : 2", json!(2.0));
    check("1<2 ? 'y' : 'n'", json!("y"));
}

#[test]
fn test_conditional_is_right_associative() {
    // Left-associative grouping would give 2 here.
    check("true?1:false?2:3", json!(1.0));
    check("false?1:true?2:3", json!(2.0));
    check("false?1:false?2:3", json!(3.0));
}

#[test]
fn test_conditional_evaluates_one_branch() {
    let called = Arc::new(AtomicBool::new(false));
    check_with("true ? 1 : X()", &probe_globals(&called), json!(1.0));
    assert!(!called.load(Ordering::SeqCst), "X must not be invoked");
}

// ------------------------------------------------------------ Member access

#[test]
fn test_member_access() {
    check("{foo: 'bar'}.foo", json!("bar"));
    check("{a: {b: 2}}.a.b", json!(2.0));
    check("{foo: 'bar'}.missing===missingName", json!(true)); // both undefined
}

#[test]
fn test_computed_member_access() {
    check("['foo', 'bar'][0]", json!("foo"));
    check("[1,2,3][1+1]", json!(3.0));
    check("{foo: 2}['foo']", json!(2.0));
    check("{a:[1,{b:2}]}.a[1].b", json!(2.0));
}

#[test]
fn test_length_member() {
    check("'abc'.length", json!(3.0));
    check("[1,2].length", json!(2.0));
}

#[test]
fn test_member_of_null_is_an_error() {
    let err = check_err("null.foo");
    assert!(matches!(err, ExpressionError::NotContainer(_)), "got: {err}");
}

#[test]
fn test_call_of_non_function_is_an_error() {
    let err = check_err("'a'()");
    assert!(matches!(err, ExpressionError::NotFunction(_)), "got: {err}");
}

#[test]
fn test_method_call_binds_receiver() {
    let mut object = Namespace::new();
    object.insert("v".to_string(), JsValue::Json(json!(42)));
    object.insert(
        "m".to_string(),
        JsValue::Function(JsFunction::new(|receiver, _args| {
            match receiver {
                Some(JsValue::Object(ns)) => {
                    Ok(ns.get("v").cloned().unwrap_or(JsValue::Undefined))
                }
                _ => Err(ExpressionError::Thrown("called without receiver".to_string())),
            }
        })),
    );
    let mut globals = Namespace::new();
    globals.insert("obj".to_string(), JsValue::Object(Arc::new(object)));

    check_with("obj.m()", &globals, json!(42));
    check_with("obj['m']()", &globals, json!(42));
}

// ---------------------------------------------------------- Embedded bindings

#[test]
fn test_binding_round_trip() {
    let outcome = parse(sequence_resolver(vec![json!(5)]), "${x}+1", None, None).unwrap();
    let ParseOutcome::Expression { result, at } = outcome else {
        panic!("expected expression outcome");
    };
    assert_eq!(at, 6);
    assert_eq!(result.parts, vec![JsValue::Json(json!(5))]);
    assert_eq!(
        result.format(&[json!(5).into()]).unwrap(),
        JsValue::Json(json!(6.0))
    );
    // Re-invoked later with a fresh part value, without re-parsing.
    assert_eq!(
        result.format(&[json!(10).into()]).unwrap(),
        JsValue::Json(json!(11.0))
    );
}

#[test]
fn test_parts_are_ordered_by_occurrence() {
    let outcome = parse(
        sequence_resolver(vec![json!(1), json!(2)]),
        "${a}-${b}",
        None,
        None,
    )
    .unwrap();
    let ParseOutcome::Expression { result, .. } = outcome else {
        panic!("expected expression outcome");
    };
    assert_eq!(result.parts, vec![JsValue::Json(json!(1)), JsValue::Json(json!(2))]);
    assert_eq!(
        result.format(&[json!(10).into(), json!(4).into()]).unwrap(),
        JsValue::Json(json!(6.0))
    );
}

#[test]
fn test_binding_inside_larger_construct() {
    let outcome = parse(
        sequence_resolver(vec![json!("world")]),
        "'hello '+${x}",
        None,
        None,
    )
    .unwrap();
    let ParseOutcome::Expression { result, .. } = outcome else {
        panic!("expected expression outcome");
    };
    assert_eq!(
        result.format(&[json!("world").into()]).unwrap(),
        JsValue::Json(json!("hello world"))
    );
}

#[test]
fn test_resolver_errors_propagate() {
    let resolve = |_input: &str, _at: usize| {
        Err(ExpressionError::Thrown("resolver refused".to_string()))
    };
    let err = parse(resolve, "${x}", None, None).unwrap_err();
    assert_eq!(err, ExpressionError::Thrown("resolver refused".to_string()));
}

#[test]
fn test_idempotent_parsing() {
    let first = parse(sequence_resolver(vec![json!(0)]), "${x}*2+1", None, None).unwrap();
    let second = parse(sequence_resolver(vec![json!(0)]), "${x}*2+1", None, None).unwrap();
    let (Some(a), Some(b)) = (first.expression(), second.expression()) else {
        panic!("expected expression outcomes");
    };
    for part in [json!(0), json!(3), json!(-1.5)] {
        assert_eq!(
            a.format(&[part.clone().into()]).unwrap(),
            b.format(&[part.into()]).unwrap()
        );
    }
}

// ------------------------------------------------------------------- Errors

#[test]
fn test_trailing_garbage() {
    let err = check_err("1 2");
    assert!(matches!(err, ExpressionError::TrailingInput(_)), "got: {err}");
    assert_eq!(err.position(), Some(3));
}

#[test]
fn test_unterminated_expression() {
    let err = check_err("1+");
    assert!(matches!(err, ExpressionError::ExpectedToken(_)), "got: {err}");
    assert!(err.to_string().contains("end of input"), "got: {err}");
    assert_eq!(err.position(), Some(3));
}

#[test]
fn test_unexpected_token() {
    let err = check_err("*5");
    assert!(matches!(err, ExpressionError::UnexpectedToken(_)), "got: {err}");
    assert_eq!(err.position(), Some(1));

    let err = check_err("()");
    assert!(matches!(err, ExpressionError::UnexpectedToken(_)), "got: {err}");
    assert_eq!(err.position(), Some(2));
}

#[test]
fn test_expected_token() {
    let err = check_err("(1+2");
    assert!(matches!(err, ExpressionError::ExpectedToken(_)), "got: {err}");
    assert!(err.to_string().contains("Expected )"), "got: {err}");

    let err = check_err("{foo 1}");
    assert!(matches!(err, ExpressionError::ExpectedToken(_)), "got: {err}");
    assert!(err.to_string().contains("Expected :"), "got: {err}");
}

#[test]
fn test_errors_carry_the_input_text() {
    let err = check_err("1 2");
    assert_eq!(err.input(), Some("1 2"));
}

// ------------------------------------------------------------ Start offsets

#[test]
fn test_embedded_parse_stops_short() {
    let outcome = parse(no_bindings, "1+2 rest", Some(0), None).unwrap();
    assert_eq!(outcome.constant(), Some(&JsValue::Json(json!(3.0))));
    assert_eq!(outcome.at(), 4);
}

#[test]
fn test_parse_from_start_offset() {
    let outcome = parse(no_bindings, "ignore 2*3", Some(7), None).unwrap();
    assert_eq!(outcome.constant(), Some(&JsValue::Json(json!(6.0))));
    assert_eq!(outcome.at(), 10);
}

#[test]
fn test_embedded_parse_stops_at_closing_brace() {
    let outcome = parse(no_bindings, "4>2} tail", Some(0), None).unwrap();
    assert_eq!(outcome.constant(), Some(&JsValue::Json(json!(true))));
    assert_eq!(outcome.at(), 3);
}

// ----------------------------------------------------------- Default globals

#[test]
fn test_encode_uri_component() {
    check("encodeURIComponent('a b')", json!("a%20b"));
    check("encodeURIComponent('a&b=c')", json!("a%26b%3Dc"));
}

#[test]
fn test_math_namespace() {
    check("Math.max(1,2,3)", json!(3.0));
    check("Math.min(1,-2,3)", json!(-2.0));
    check("Math.floor(1.7)", json!(1.0));
    check("Math.pow(2,10)", json!(1024.0));
    check("Math.PI", json!(std::f64::consts::PI));
    check("Math.round(2.5)", json!(3.0));
}

#[test]
fn test_odata_uri_encode() {
    check("odata.uriEncode('O\\'Brian','Edm.String')", json!("'O''Brian'"));
    check("odata.uriEncode(42,'Edm.Int64')", json!("42l"));
    check("odata.uriEncode(null,'Edm.String')", json!("null"));
}

#[test]
fn test_odata_fill_uri_template() {
    check(
        "odata.fillUriTemplate('http://h/{p}',{p:'a b'})",
        json!("http://h/a%20b"),
    );
    check(
        "odata.fillUriTemplate('x{missing}y',{})",
        json!("xy"),
    );
}

#[test]
fn test_reg_exp_global() {
    check("RegExp('^ab+c$').test('abbbc')", json!(true));
    check("RegExp('^ab+c$').test('ac')", json!(false));
    check("RegExp('abc','i').test('xABCy')", json!(true));
}

#[test]
fn test_typeof_globals() {
    check("typeof Math", json!("object"));
    check("typeof encodeURIComponent", json!("function"));
    check("typeof Math.max", json!("function"));
}

#[test]
fn test_unknown_identifier_is_undefined() {
    let outcome = parse(no_bindings, "missingName", None, None).unwrap();
    assert_eq!(outcome.constant(), Some(&JsValue::Undefined));
}
