//! The Pratt parser and the public `parse` entry point.
//!
//! `expression(rbp)` consumes one token, applies its prefix rule, then
//! keeps consuming infix operators while the next token binds tighter than
//! `rbp`. The result is a tree of evaluation-node closures; parsing and
//! evaluation share no state, so the compiled tree outlives the parse call
//! and can be re-run with fresh part values indefinitely.

use crate::error::ExpressionError;
use crate::globals::default_globals;
use crate::symbols::symbol;
use crate::tokenizer::{tokenize, ResolvedBinding, Token, TokenKind};
use crate::types::{JsValue, Namespace};
use std::fmt;

/// A compiled evaluation node: a pure function of the parts slice.
pub(crate) type Node =
    Box<dyn Fn(&[JsValue]) -> Result<JsValue, ExpressionError> + Send + Sync>;

pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    input: &'a str,
    next: usize,
    globals: &'a Namespace,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: &'a [Token], input: &'a str, globals: &'a Namespace) -> Self {
        Parser {
            tokens,
            input,
            next: 0,
            globals,
        }
    }

    pub(crate) fn input(&self) -> &'a str {
        self.input
    }

    pub(crate) fn global(&self, name: &str) -> JsValue {
        self.globals.get(name).cloned().unwrap_or(JsValue::Undefined)
    }

    /// The next token, without consuming it.
    pub(crate) fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.next)
    }

    pub(crate) fn current_kind(&self) -> Option<&'a TokenKind> {
        self.current().map(|t| &t.kind)
    }

    pub(crate) fn next_is(&self, kind: &TokenKind) -> bool {
        self.current_kind() == Some(kind)
    }

    /// Consumes and returns the next token, if any.
    pub(crate) fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.next);
        if token.is_some() {
            self.next += 1;
        }
        token
    }

    /// Consumes the next token, demanding the given kind.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Result<&'a Token, ExpressionError> {
        match self.tokens.get(self.next) {
            None => Err(self.expected_eof(expected.name())),
            Some(token) if &token.kind == expected => {
                self.next += 1;
                Ok(token)
            }
            Some(token) => Err(self.expected(expected.name(), token)),
        }
    }

    /// Consumes the next token, demanding an identifier, and returns its name.
    pub(crate) fn expect_identifier(&mut self) -> Result<String, ExpressionError> {
        match self.tokens.get(self.next) {
            None => Err(self.expected_eof("IDENTIFIER")),
            Some(token) => match &token.kind {
                TokenKind::Identifier(name) => {
                    let name = name.clone();
                    self.next += 1;
                    Ok(name)
                }
                _ => Err(self.expected("IDENTIFIER", token)),
            },
        }
    }

    fn expected(&self, expected: &str, actual: &Token) -> ExpressionError {
        ExpressionError::expected_token(
            format!(
                "Expected {expected} but instead saw {}",
                actual.text(self.input)
            ),
            self.input,
            Some(actual.start + 1),
        )
    }

    fn expected_eof(&self, expected: &str) -> ExpressionError {
        ExpressionError::expected_token(
            format!("Expected {expected} but instead saw end of input"),
            self.input,
            Some(self.end_position()),
        )
    }

    /// 1-based position just past the consumed input.
    fn end_position(&self) -> usize {
        self.tokens.last().map(|t| t.end + 1).unwrap_or(1)
    }

    /// Parses an expression starting at the current token, consuming infix
    /// operators while their left binding power exceeds `rbp`.
    pub(crate) fn expression(&mut self, rbp: i32) -> Result<Node, ExpressionError> {
        let Some(token) = self.advance() else {
            return Err(ExpressionError::expected_token(
                "Expected expression but instead saw end of input".to_string(),
                self.input,
                Some(self.end_position()),
            ));
        };
        let mut left = (symbol(&token.kind).nud)(self, token)?;

        loop {
            let Some(token) = self.tokens.get(self.next) else {
                break;
            };
            if symbol(&token.kind).lbp <= rbp {
                break;
            }
            self.next += 1;
            left = (symbol(&token.kind).led)(self, token, left)?;
        }

        Ok(left)
    }
}

/// A compiled expression that can be re-evaluated with fresh part values,
/// without re-parsing.
pub struct CompiledExpression {
    formatter: Node,
    /// The resolved binding values, in first-occurrence order. A later
    /// [`format`](CompiledExpression::format) call supplies fresh values
    /// aligned to this list.
    pub parts: Vec<JsValue>,
}

impl CompiledExpression {
    /// Evaluates the expression against the given part values.
    pub fn format(&self, parts: &[JsValue]) -> Result<JsValue, ExpressionError> {
        (self.formatter)(parts)
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("parts", &self.parts)
            .finish_non_exhaustive()
    }
}

/// The result of [`parse`].
#[derive(Debug)]
pub enum ParseOutcome {
    /// The expression referenced no embedded bindings and was evaluated on
    /// the spot.
    Constant { value: JsValue, at: usize },
    /// The expression references embedded bindings; `result` re-evaluates
    /// it whenever the part values change.
    Expression { result: CompiledExpression, at: usize },
}

impl ParseOutcome {
    /// Offset of the first character after the consumed expression.
    pub fn at(&self) -> usize {
        match self {
            ParseOutcome::Constant { at, .. } | ParseOutcome::Expression { at, .. } => *at,
        }
    }

    pub fn constant(&self) -> Option<&JsValue> {
        match self {
            ParseOutcome::Constant { value, .. } => Some(value),
            ParseOutcome::Expression { .. } => None,
        }
    }

    pub fn expression(&self) -> Option<&CompiledExpression> {
        match self {
            ParseOutcome::Expression { result, .. } => Some(result),
            ParseOutcome::Constant { .. } => None,
        }
    }
}

/// Parses an expression in `input`, resolving embedded bindings through
/// `resolve_binding`.
///
/// With `start: None` the complete string must form a single expression;
/// leftover non-whitespace content is an error. With `start: Some(i)`
/// parsing begins at `i`, may stop short, and the outcome's `at` reports
/// the offset after the last consumed character; this is how expressions
/// embedded inside larger strings are parsed.
///
/// Bare identifiers resolve against `globals`, or against the default
/// global scope (see [`default_globals`](crate::globals::default_globals))
/// when `None` is given.
pub fn parse<R>(
    resolve_binding: R,
    input: &str,
    start: Option<usize>,
    globals: Option<&Namespace>,
) -> Result<ParseOutcome, ExpressionError>
where
    R: FnMut(&str, usize) -> Result<ResolvedBinding, ExpressionError>,
{
    let tokenization = tokenize(resolve_binding, input, start.unwrap_or(0))?;
    let globals = match globals {
        Some(g) => g,
        None => default_globals(),
    };
    let mut parser = Parser::new(&tokenization.tokens, input, globals);

    let formatter = parser.expression(0)?;
    let stopped_at = parser.current().map(|t| t.start);

    if start.is_none() {
        // The whole string must have been consumed as one expression.
        if let Some(token_start) = stopped_at {
            return Err(ExpressionError::trailing_input(
                "Invalid token in expression".to_string(),
                input,
                token_start + 1,
            ));
        }
        if tokenization.at < input.len() {
            return Err(ExpressionError::unexpected_token(
                "Invalid token in expression".to_string(),
                input,
                tokenization.at + 1,
            ));
        }
    }

    let at = stopped_at.unwrap_or(tokenization.at);
    if tokenization.parts.is_empty() {
        Ok(ParseOutcome::Constant {
            value: formatter(&[])?,
            at,
        })
    } else {
        Ok(ParseOutcome::Expression {
            result: CompiledExpression {
                formatter,
                parts: tokenization.parts,
            },
            at,
        })
    }
}
