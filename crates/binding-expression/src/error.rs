use std::fmt;
use thiserror::Error;

/// Position and source context attached to every syntax error.
///
/// `at` counts characters starting at 1, matching the positions reported in
/// tokenizer error messages; it is `None` when no position is known.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxDetails {
    pub message: String,
    pub at: Option<usize>,
    pub text: String,
}

impl SyntaxDetails {
    fn report(message: String, text: &str, at: Option<usize>) -> Self {
        let details = SyntaxDetails {
            message,
            at,
            text: text.to_string(),
        };
        tracing::error!(input = details.text.as_str(), "{details}");
        details
    }
}

impl fmt::Display for SyntaxDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.at {
            Some(at) => write!(f, "{} at position {}", self.message, at),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Malformed numeric or string literal.
    #[error("{0}")]
    Lexical(SyntaxDetails),

    /// A token with no valid rule in the position it appears.
    #[error("{0}")]
    UnexpectedToken(SyntaxDetails),

    /// A required token kind was missing or mismatched, including
    /// unexpected end of input.
    #[error("{0}")]
    ExpectedToken(SyntaxDetails),

    /// A whole-string parse left unconsumed, non-whitespace content.
    #[error("{0}")]
    TrailingInput(SyntaxDetails),

    /// Member access on `null` or `undefined`.
    #[error("Cannot read members of {0}")]
    NotContainer(String),

    /// The call target did not evaluate to a function.
    #[error("{0} is not a function")]
    NotFunction(String),

    /// Error raised by a host-provided function.
    #[error("{0}")]
    Thrown(String),
}

impl ExpressionError {
    pub(crate) fn lexical(message: impl Into<String>, text: &str, at: usize) -> Self {
        ExpressionError::Lexical(SyntaxDetails::report(message.into(), text, Some(at)))
    }

    pub(crate) fn unexpected_token(message: String, text: &str, at: usize) -> Self {
        ExpressionError::UnexpectedToken(SyntaxDetails::report(message, text, Some(at)))
    }

    pub(crate) fn expected_token(message: String, text: &str, at: Option<usize>) -> Self {
        ExpressionError::ExpectedToken(SyntaxDetails::report(message, text, at))
    }

    pub(crate) fn trailing_input(message: String, text: &str, at: usize) -> Self {
        ExpressionError::TrailingInput(SyntaxDetails::report(message, text, Some(at)))
    }

    /// The syntax details, for the parse-time error variants.
    pub fn details(&self) -> Option<&SyntaxDetails> {
        match self {
            ExpressionError::Lexical(d)
            | ExpressionError::UnexpectedToken(d)
            | ExpressionError::ExpectedToken(d)
            | ExpressionError::TrailingInput(d) => Some(d),
            _ => None,
        }
    }

    /// 1-based character position of a syntax error, when known.
    pub fn position(&self) -> Option<usize> {
        self.details().and_then(|d| d.at)
    }

    /// The input string a syntax error was raised for.
    pub fn input(&self) -> Option<&str> {
        self.details().map(|d| d.text.as_str())
    }
}
