//! Low-level character scanning.
//!
//! A [`Scanner`] is a movable cursor over the source string with primitives
//! for whitespace, words, numeric literals and quoted strings. Positions in
//! error messages count characters starting at 1. No other module touches
//! the input character by character.

use crate::error::ExpressionError;

pub struct Scanner<'src> {
    source: &'src str,
    index: usize,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Scanner { source, index: 0 }
    }

    /// Current byte offset into the source.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Moves the cursor to an absolute byte offset.
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// The character under the cursor, if any.
    pub fn ch(&self) -> Option<char> {
        self.char_at(self.index)
    }

    /// The character after the one under the cursor.
    pub fn peek_next(&self) -> Option<char> {
        let c = self.ch()?;
        self.char_at(self.index + c.len_utf8())
    }

    fn char_at(&self, index: usize) -> Option<char> {
        self.source.get(index..)?.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.ch()?;
        self.index += c.len_utf8();
        Some(c)
    }

    fn bump_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.ch().is_some_and(&predicate) {
            self.bump();
        }
    }

    /// Skips whitespace.
    pub fn white(&mut self) {
        self.bump_while(char::is_whitespace);
    }

    /// Reads a word: the caller has seen a letter under the cursor; the
    /// word continues over letters, digits and underscores.
    pub fn word(&mut self) -> String {
        let start = self.index;
        self.bump_while(|c| c.is_ascii_alphanumeric() || c == '_');
        self.source[start..self.index].to_string()
    }

    /// Reads a numeric literal (integer, decimal, exponent) starting at a
    /// digit or at a `.` followed by a digit.
    pub fn number(&mut self) -> Result<f64, ExpressionError> {
        let start = self.index;
        self.bump_while(|c| c.is_ascii_digit());
        if self.ch() == Some('.') {
            self.bump();
            self.bump_while(|c| c.is_ascii_digit());
        }
        if matches!(self.ch(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.ch(), Some('+' | '-')) {
                self.bump();
            }
            let exponent_start = self.index;
            self.bump_while(|c| c.is_ascii_digit());
            if self.index == exponent_start {
                return Err(self.fail("Bad number"));
            }
        }
        self.source[start..self.index]
            .parse::<f64>()
            .map_err(|_| self.fail("Bad number"))
    }

    /// Reads a quoted string (single or double quotes) with the usual
    /// escape sequences, `\uXXXX` and surrogate pairs included.
    pub fn string(&mut self) -> Result<String, ExpressionError> {
        let Some(quote) = self.bump() else {
            return Err(self.fail("Bad string"));
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.fail("Bad string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('b') => out.push('\u{0008}'),
                    Some('f') => out.push('\u{000C}'),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('u') => out.push(self.unicode_escape()?),
                    Some(c @ ('"' | '\'' | '\\' | '/')) => out.push(c),
                    _ => return Err(self.fail("Bad string")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn unicode_escape(&mut self) -> Result<char, ExpressionError> {
        let code = self.hex4()?;
        if (0xD800..=0xDBFF).contains(&code) {
            // High surrogate: a `\u`-escaped low surrogate must follow.
            if self.bump() != Some('\\') || self.bump() != Some('u') {
                return Err(self.fail("Bad string"));
            }
            let low = self.hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(self.fail("Bad string"));
            }
            let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
            char::from_u32(combined).ok_or_else(|| self.fail("Bad string"))
        } else {
            char::from_u32(code).ok_or_else(|| self.fail("Bad string"))
        }
    }

    fn hex4(&mut self) -> Result<u32, ExpressionError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let Some(digit) = self.bump().and_then(|c| c.to_digit(16)) else {
                return Err(self.fail("Bad string"));
            };
            code = code * 16 + digit;
        }
        Ok(code)
    }

    pub(crate) fn fail(&self, message: &str) -> ExpressionError {
        ExpressionError::lexical(message, self.source, self.index + 1)
    }
}
