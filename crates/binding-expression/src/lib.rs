//! Expression compiler for data-binding strings.
//!
//! # Overview
//!
//! This crate implements a small expression language, a JavaScript subset
//! with literals, operators, member/computed access, calls, the
//! conditional operator and array/object literals, whose only "variable"
//! parts are embedded bindings (`${...}` placeholders resolved by an
//! external callback). An input string is tokenized and parsed with
//! top-down operator-precedence (Pratt) rules into a compiled evaluator
//! that recomputes the expression's value whenever the resolved binding
//! values change, without re-parsing.
//!
//! # Example
//!
//! ```
//! use binding_expression::{parse, ExpressionError, JsValue, ParseOutcome, ResolvedBinding};
//! use serde_json::json;
//!
//! // Binding syntax here is `${name}`; the resolver consumes through `}`
//! // and reports the offset after it.
//! fn resolve(input: &str, at: usize) -> Result<ResolvedBinding, ExpressionError> {
//!     let close = at + input[at..].find('}').expect("unterminated binding") + 1;
//!     Ok(ResolvedBinding {
//!         result: JsValue::Json(json!(5)),
//!         at: close,
//!     })
//! }
//!
//! let outcome = parse(resolve, "${x}+1", None, None).unwrap();
//! let ParseOutcome::Expression { result, .. } = outcome else {
//!     unreachable!()
//! };
//! assert_eq!(result.parts, vec![JsValue::Json(json!(5))]);
//! assert_eq!(result.format(&[json!(5).into()]).unwrap(), JsValue::Json(json!(6.0)));
//! // Re-evaluate later with a fresh part value, no re-parse.
//! assert_eq!(result.format(&[json!(41).into()]).unwrap(), JsValue::Json(json!(42.0)));
//! ```

pub mod error;
pub mod globals;
pub mod parser;
pub mod scanner;
mod symbols;
pub mod tokenizer;
pub mod types;
pub mod util;

// Re-export the core public API
pub use error::{ExpressionError, SyntaxDetails};
pub use globals::default_globals;
pub use parser::{parse, CompiledExpression, ParseOutcome};
pub use tokenizer::{tokenize, ResolvedBinding, Token, TokenKind, Tokenization};
pub use types::{JsFunction, JsValue, Namespace};
