//! The symbol table for top-down operator-precedence parsing.
//!
//! Every token kind maps to a [`Symbol`]: its left binding power plus a
//! prefix rule ("nud") and an infix rule ("led"). The table is a closed
//! match over the token-kind enum, so it is immutable by construction and
//! freely shared across parses. Kinds with no valid prefix or infix use
//! dispatch to the unexpected-token rule.
//!
//! The rule functions double as the evaluation-node builders: each returns
//! a boxed closure over the parts slice, composed from the closures of its
//! operands.

use crate::error::ExpressionError;
use crate::parser::{Node, Parser};
use crate::tokenizer::{Token, TokenKind};
use crate::types::JsValue;
use crate::util;
use serde_json::Value;

// Binding powers, highest to lowest. Unary +/- reuse the additive entry
// (prefix rule override only); ! and typeof keep their own level.
pub(crate) const LBP_MEMBER: i32 = 18;
pub(crate) const LBP_CALL: i32 = 17;
pub(crate) const LBP_UNARY: i32 = 15;
pub(crate) const LBP_MULTIPLICATIVE: i32 = 14;
pub(crate) const LBP_ADDITIVE: i32 = 13;
pub(crate) const LBP_RELATIONAL: i32 = 11;
pub(crate) const LBP_EQUALITY: i32 = 10;
pub(crate) const LBP_AND: i32 = 7;
pub(crate) const LBP_OR: i32 = 6;
pub(crate) const LBP_CONDITIONAL: i32 = 4;

pub(crate) type PrefixRule = fn(&mut Parser<'_>, &Token) -> Result<Node, ExpressionError>;
pub(crate) type InfixRule = fn(&mut Parser<'_>, &Token, Node) -> Result<Node, ExpressionError>;

pub(crate) struct Symbol {
    pub lbp: i32,
    pub nud: PrefixRule,
    pub led: InfixRule,
}

const SYM_CONSTANT: Symbol = Symbol { lbp: 0, nud: nud_constant, led: led_unexpected };
const SYM_IDENTIFIER: Symbol = Symbol { lbp: 0, nud: nud_identifier, led: led_unexpected };
const SYM_BINDING: Symbol = Symbol { lbp: 0, nud: nud_binding, led: led_unexpected };
const SYM_DOT: Symbol = Symbol { lbp: LBP_MEMBER, nud: nud_unexpected, led: led_dot };
const SYM_PAREN: Symbol = Symbol { lbp: LBP_CALL, nud: nud_grouping, led: led_call };
const SYM_BRACKET: Symbol = Symbol { lbp: LBP_MEMBER, nud: nud_array, led: led_computed };
const SYM_BRACE: Symbol = Symbol { lbp: 0, nud: nud_object, led: led_unexpected };
const SYM_NOT: Symbol = Symbol { lbp: LBP_UNARY, nud: nud_not, led: led_unexpected };
const SYM_TYPEOF: Symbol = Symbol { lbp: LBP_UNARY, nud: nud_typeof, led: led_unexpected };
const SYM_MULTIPLICATIVE: Symbol =
    Symbol { lbp: LBP_MULTIPLICATIVE, nud: nud_unexpected, led: led_infix };
const SYM_ADDITIVE: Symbol = Symbol { lbp: LBP_ADDITIVE, nud: nud_sign, led: led_infix };
const SYM_RELATIONAL: Symbol = Symbol { lbp: LBP_RELATIONAL, nud: nud_unexpected, led: led_infix };
const SYM_EQUALITY: Symbol = Symbol { lbp: LBP_EQUALITY, nud: nud_unexpected, led: led_infix };
const SYM_AND: Symbol = Symbol { lbp: LBP_AND, nud: nud_unexpected, led: led_lazy };
const SYM_OR: Symbol = Symbol { lbp: LBP_OR, nud: nud_unexpected, led: led_lazy };
const SYM_CONDITIONAL: Symbol =
    Symbol { lbp: LBP_CONDITIONAL, nud: nud_unexpected, led: led_conditional };
const SYM_DELIMITER: Symbol = Symbol { lbp: 0, nud: nud_unexpected, led: led_unexpected };
// "}" also terminates the end of our input (see the parser loop).
const SYM_BRACE_CLOSE: Symbol = Symbol { lbp: -1, nud: nud_unexpected, led: led_unexpected };

pub(crate) fn symbol(kind: &TokenKind) -> &'static Symbol {
    match kind {
        TokenKind::Constant(_) => &SYM_CONSTANT,
        TokenKind::Identifier(_) => &SYM_IDENTIFIER,
        TokenKind::Binding(_) => &SYM_BINDING,
        TokenKind::Typeof => &SYM_TYPEOF,
        TokenKind::Dot => &SYM_DOT,
        TokenKind::LeftParen => &SYM_PAREN,
        TokenKind::LeftBracket => &SYM_BRACKET,
        TokenKind::LeftBrace => &SYM_BRACE,
        TokenKind::Bang => &SYM_NOT,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => &SYM_MULTIPLICATIVE,
        TokenKind::Plus | TokenKind::Minus => &SYM_ADDITIVE,
        TokenKind::LessEq | TokenKind::Less | TokenKind::GreaterEq | TokenKind::Greater => {
            &SYM_RELATIONAL
        }
        TokenKind::StrictEq | TokenKind::StrictNotEq => &SYM_EQUALITY,
        TokenKind::And => &SYM_AND,
        TokenKind::Or => &SYM_OR,
        TokenKind::Question => &SYM_CONDITIONAL,
        TokenKind::RightBrace => &SYM_BRACE_CLOSE,
        TokenKind::RightParen | TokenKind::RightBracket | TokenKind::Comma | TokenKind::Colon => {
            &SYM_DELIMITER
        }
    }
}

// ------------------------------------------------------------- error rules

fn unexpected(parser: &Parser<'_>, token: &Token) -> ExpressionError {
    let text = token.text(parser.input());
    let name = token.kind.name();
    let message = if text != name {
        format!("Unexpected {name}: {text}")
    } else {
        format!("Unexpected {name}")
    };
    ExpressionError::unexpected_token(message, parser.input(), token.start + 1)
}

fn nud_unexpected(parser: &mut Parser<'_>, token: &Token) -> Result<Node, ExpressionError> {
    Err(unexpected(parser, token))
}

fn led_unexpected(
    parser: &mut Parser<'_>,
    token: &Token,
    _left: Node,
) -> Result<Node, ExpressionError> {
    Err(unexpected(parser, token))
}

// ------------------------------------------------------------ prefix rules

fn constant(value: JsValue) -> Node {
    Box::new(move |_parts| Ok(value.clone()))
}

fn nud_constant(parser: &mut Parser<'_>, token: &Token) -> Result<Node, ExpressionError> {
    let TokenKind::Constant(value) = &token.kind else {
        return Err(unexpected(parser, token));
    };
    Ok(constant(JsValue::Json(value.clone())))
}

fn nud_identifier(parser: &mut Parser<'_>, token: &Token) -> Result<Node, ExpressionError> {
    let TokenKind::Identifier(name) = &token.kind else {
        return Err(unexpected(parser, token));
    };
    // Globals resolve once at parse time, not per evaluation.
    Ok(constant(parser.global(name)))
}

fn nud_binding(parser: &mut Parser<'_>, token: &Token) -> Result<Node, ExpressionError> {
    let TokenKind::Binding(index) = token.kind else {
        return Err(unexpected(parser, token));
    };
    Ok(Box::new(move |parts| {
        Ok(parts.get(index).cloned().unwrap_or(JsValue::Undefined))
    }))
}

fn nud_grouping(parser: &mut Parser<'_>, _token: &Token) -> Result<Node, ExpressionError> {
    let node = parser.expression(0)?;
    parser.expect(&TokenKind::RightParen)?;
    Ok(node)
}

fn nud_array(parser: &mut Parser<'_>, _token: &Token) -> Result<Node, ExpressionError> {
    let mut elements: Vec<Node> = Vec::new();
    let mut first = true;
    while !parser.next_is(&TokenKind::RightBracket) {
        if first {
            first = false;
        } else {
            parser.expect(&TokenKind::Comma)?;
        }
        // An empty slot between commas is an undefined element.
        if parser.next_is(&TokenKind::Comma) {
            elements.push(constant(JsValue::Undefined));
        } else {
            elements.push(parser.expression(0)?);
        }
    }
    parser.expect(&TokenKind::RightBracket)?;
    Ok(Box::new(move |parts| {
        let mut values = Vec::with_capacity(elements.len());
        for element in &elements {
            values.push(util::value_to_json(element(parts)?));
        }
        Ok(JsValue::Json(Value::Array(values)))
    }))
}

fn nud_object(parser: &mut Parser<'_>, _token: &Token) -> Result<Node, ExpressionError> {
    let mut entries: Vec<(String, Node)> = Vec::new();
    let mut first = true;
    while !parser.next_is(&TokenKind::RightBrace) {
        if first {
            first = false;
        } else {
            parser.expect(&TokenKind::Comma)?;
        }
        // A key is a quoted-string constant or a bare identifier.
        let key = if let Some(TokenKind::Constant(Value::String(s))) = parser.current_kind() {
            let key = s.clone();
            parser.advance();
            key
        } else {
            parser.expect_identifier()?
        };
        parser.expect(&TokenKind::Colon)?;
        entries.push((key, parser.expression(0)?));
    }
    parser.expect(&TokenKind::RightBrace)?;
    Ok(Box::new(move |parts| {
        let mut map = serde_json::Map::new();
        for (key, node) in &entries {
            map.insert(key.clone(), util::value_to_json(node(parts)?));
        }
        Ok(JsValue::Json(Value::Object(map)))
    }))
}

fn nud_not(parser: &mut Parser<'_>, _token: &Token) -> Result<Node, ExpressionError> {
    let operand = parser.expression(LBP_UNARY)?;
    Ok(Box::new(move |parts| {
        Ok(JsValue::from(!util::is_truthy(&operand(parts)?)))
    }))
}

fn nud_typeof(parser: &mut Parser<'_>, _token: &Token) -> Result<Node, ExpressionError> {
    let operand = parser.expression(LBP_UNARY)?;
    Ok(Box::new(move |parts| {
        Ok(JsValue::from(util::type_of(&operand(parts)?)))
    }))
}

fn nud_sign(parser: &mut Parser<'_>, token: &Token) -> Result<Node, ExpressionError> {
    let negate = matches!(token.kind, TokenKind::Minus);
    let operand = parser.expression(LBP_ADDITIVE)?;
    Ok(Box::new(move |parts| {
        let n = util::to_number(&operand(parts)?);
        Ok(util::f64_to_value(if negate { -n } else { n }))
    }))
}

// ------------------------------------------------------------- infix rules

fn led_dot(parser: &mut Parser<'_>, _token: &Token, left: Node) -> Result<Node, ExpressionError> {
    let name = parser.expect_identifier()?;
    let key = JsValue::from(name);
    Ok(Box::new(move |parts| {
        util::get_member(&left(parts)?, &key)
    }))
}

fn led_computed(
    parser: &mut Parser<'_>,
    _token: &Token,
    left: Node,
) -> Result<Node, ExpressionError> {
    let key = parser.expression(0)?;
    parser.expect(&TokenKind::RightBracket)?;
    Ok(Box::new(move |parts| {
        let container = left(parts)?;
        let key = key(parts)?;
        util::get_member(&container, &key)
    }))
}

fn led_call(parser: &mut Parser<'_>, _token: &Token, left: Node) -> Result<Node, ExpressionError> {
    let mut arguments: Vec<Node> = Vec::new();
    let mut first = true;
    while !parser.next_is(&TokenKind::RightParen) {
        if first {
            first = false;
        } else {
            parser.expect(&TokenKind::Comma)?;
        }
        arguments.push(parser.expression(0)?);
    }
    parser.expect(&TokenKind::RightParen)?;
    Ok(Box::new(move |parts| {
        let callee = left(parts)?;
        let mut values = Vec::with_capacity(arguments.len());
        for argument in &arguments {
            values.push(argument(parts)?);
        }
        match callee {
            JsValue::Function(f) => f.call(&values),
            other => Err(ExpressionError::NotFunction(util::to_str(&other))),
        }
    }))
}

fn binary_op(kind: &TokenKind) -> fn(&JsValue, &JsValue) -> JsValue {
    match kind {
        TokenKind::Star => util::multiply,
        TokenKind::Slash => util::divide,
        TokenKind::Percent => util::modulo,
        TokenKind::Plus => util::add,
        TokenKind::Minus => util::subtract,
        TokenKind::LessEq => util::less_eq,
        TokenKind::Less => util::less,
        TokenKind::GreaterEq => util::greater_eq,
        TokenKind::Greater => util::greater,
        TokenKind::StrictEq => util::strict_eq,
        TokenKind::StrictNotEq => util::strict_ne,
        _ => |_, _| JsValue::Undefined,
    }
}

fn led_infix(parser: &mut Parser<'_>, token: &Token, left: Node) -> Result<Node, ExpressionError> {
    let op = binary_op(&token.kind);
    let right = parser.expression(symbol(&token.kind).lbp)?;
    Ok(Box::new(move |parts| {
        Ok(op(&left(parts)?, &right(parts)?))
    }))
}

fn led_lazy(parser: &mut Parser<'_>, token: &Token, left: Node) -> Result<Node, ExpressionError> {
    // Lazy evaluation is right associative: true || A || B never runs the
    // || for A and B.
    let evaluate_right_when = matches!(token.kind, TokenKind::And);
    let right = parser.expression(symbol(&token.kind).lbp - 1)?;
    Ok(Box::new(move |parts| {
        let left_value = left(parts)?;
        if util::is_truthy(&left_value) == evaluate_right_when {
            // The captured right node is the deferred computation; it runs
            // only on this path.
            right(parts)
        } else {
            Ok(left_value)
        }
    }))
}

fn led_conditional(
    parser: &mut Parser<'_>,
    _token: &Token,
    left: Node,
) -> Result<Node, ExpressionError> {
    let then_branch = parser.expression(LBP_CONDITIONAL - 1)?;
    parser.expect(&TokenKind::Colon)?;
    let else_branch = parser.expression(LBP_CONDITIONAL - 1)?;
    Ok(Box::new(move |parts| {
        if util::is_truthy(&left(parts)?) {
            then_branch(parts)
        } else {
            else_branch(parts)
        }
    }))
}
