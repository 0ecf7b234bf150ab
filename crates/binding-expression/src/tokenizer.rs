//! Tokenization of expression strings.
//!
//! [`tokenize`] drives the [`Scanner`](crate::scanner::Scanner) plus a
//! fixed-token matcher to produce an ordered token sequence. Embedded
//! bindings (`${...}`) are resolved on the spot through the caller-supplied
//! resolver; the resolved values land in an ordered `parts` list and the
//! emitted BINDING token carries only its index into that list.

use crate::error::ExpressionError;
use crate::scanner::Scanner;
use crate::types::JsValue;
use serde_json::Value;

/// Token kinds. Literal payloads ride along in the kind itself.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A literal: number, quoted string, `true`, `false` or `null`.
    Constant(Value),
    /// A bare name, looked up in the globals map at parse time.
    Identifier(String),
    /// An embedded binding; the payload is its index into the parts list.
    Binding(usize),
    /// The `typeof` keyword.
    Typeof,
    Dot,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Colon,
    Comma,
    Question,
    Bang,
    StrictEq,
    StrictNotEq,
    And,
    Or,
    Star,
    Slash,
    Percent,
    Plus,
    Minus,
    LessEq,
    Less,
    GreaterEq,
    Greater,
}

impl TokenKind {
    /// The name used in error messages: the operator text itself, or the
    /// token class for payload-carrying kinds.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Constant(_) => "CONSTANT",
            TokenKind::Identifier(_) => "IDENTIFIER",
            TokenKind::Binding(_) => "BINDING",
            TokenKind::Typeof => "typeof",
            TokenKind::Dot => ".",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Question => "?",
            TokenKind::Bang => "!",
            TokenKind::StrictEq => "===",
            TokenKind::StrictNotEq => "!==",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::LessEq => "<=",
            TokenKind::Less => "<",
            TokenKind::GreaterEq => ">=",
            TokenKind::Greater => ">",
        }
    }
}

/// A token with its source span (byte offsets into the input).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// The source text this token was read from.
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start..self.end]
    }
}

/// What the external binding resolver returns: the resolved value and the
/// offset of the first character after the binding syntax it consumed.
#[derive(Debug, Clone)]
pub struct ResolvedBinding {
    pub result: JsValue,
    pub at: usize,
}

/// Tokenization result.
#[derive(Debug, Clone)]
pub struct Tokenization {
    pub tokens: Vec<Token>,
    /// Resolved binding values in first-occurrence order.
    pub parts: Vec<JsValue>,
    /// Offset after the last character the tokenizer consumed.
    pub at: usize,
}

// Fixed tokens. A token that is a prefix of another must come after it,
// e.g. "!" after "!==".
const FIXED_TOKENS: &[(&str, TokenKind)] = &[
    ("===", TokenKind::StrictEq),
    ("!==", TokenKind::StrictNotEq),
    ("!", TokenKind::Bang),
    ("||", TokenKind::Or),
    ("&&", TokenKind::And),
    (".", TokenKind::Dot),
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
    ("{", TokenKind::LeftBrace),
    ("}", TokenKind::RightBrace),
    (":", TokenKind::Colon),
    (",", TokenKind::Comma),
    ("?", TokenKind::Question),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("<=", TokenKind::LessEq),
    ("<", TokenKind::Less),
    (">=", TokenKind::GreaterEq),
    (">", TokenKind::Greater),
    ("[", TokenKind::LeftBracket),
    ("]", TokenKind::RightBracket),
];

/// Computes the tokens of the expression in `input` starting at `start`,
/// using `resolve_binding` to resolve embedded bindings.
///
/// Tokenization stops cleanly at the first unrecognized character: that is
/// the end of recognized input, not necessarily the end of the string.
pub fn tokenize<R>(
    mut resolve_binding: R,
    input: &str,
    start: usize,
) -> Result<Tokenization, ExpressionError>
where
    R: FnMut(&str, usize) -> Result<ResolvedBinding, ExpressionError>,
{
    let mut tokens = Vec::new();
    let mut parts: Vec<JsValue> = Vec::new();
    let mut scanner = Scanner::new(input);
    scanner.set_index(start);

    loop {
        scanner.white();
        let token_start = scanner.index();
        let Some(ch) = scanner.ch() else { break };

        let kind = if ch.is_ascii_alphabetic() {
            let word = scanner.word();
            match word.as_str() {
                "true" => TokenKind::Constant(Value::Bool(true)),
                "false" => TokenKind::Constant(Value::Bool(false)),
                "null" => TokenKind::Constant(Value::Null),
                "typeof" => TokenKind::Typeof,
                _ => TokenKind::Identifier(word),
            }
        } else if ch.is_ascii_digit()
            || (ch == '.' && scanner.peek_next().is_some_and(|c| c.is_ascii_digit()))
        {
            let number = scanner.number()?;
            let value = serde_json::Number::from_f64(number)
                .map(Value::Number)
                .unwrap_or(Value::Null);
            TokenKind::Constant(value)
        } else if ch == '\'' || ch == '"' {
            TokenKind::Constant(Value::String(scanner.string()?))
        } else if ch == '$' {
            // Binding marker: "$" must be followed by "{"; the resolver is
            // handed the offset of the brace and consumes the rest.
            match scanner.peek_next() {
                Some('{') => {}
                Some(other) => {
                    return Err(ExpressionError::lexical(
                        format!("Expected '{{' instead of '{other}'"),
                        input,
                        token_start + 2,
                    ));
                }
                None => {
                    return Err(ExpressionError::lexical(
                        "Expected '{' instead of end of input",
                        input,
                        token_start + 2,
                    ));
                }
            }
            let binding = resolve_binding(input, token_start + 1)?;
            let index = parts.len();
            parts.push(binding.result);
            scanner.set_index(binding.at);
            TokenKind::Binding(index)
        } else {
            let rest = &input[token_start..];
            match FIXED_TOKENS.iter().find(|(text, _)| rest.starts_with(text)) {
                Some((text, kind)) => {
                    scanner.set_index(token_start + text.len());
                    kind.clone()
                }
                // End of recognized input.
                None => break,
            }
        };

        tokens.push(Token {
            kind,
            start: token_start,
            end: scanner.index(),
        });
    }

    Ok(Tokenization {
        tokens,
        parts,
        at: scanner.index(),
    })
}
