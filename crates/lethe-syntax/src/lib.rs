//! Lexer, parser and syntax tree for the Lethe configuration language.
//!
//! Lethe is a block-structured configuration language: files contain
//! `name = expression` attributes and `type "label" { ... }` blocks,
//! nesting arbitrarily. This crate provides the low-level pieces the
//! language-service engine (`lethe-decoder`) consumes:
//! position/range arithmetic, the literal value and type model, the
//! expression AST, the file/body tree, and an error-recovering parser
//! that never fails outright, because editors feed it half-typed
//! input on every keystroke.

// Conditional tracing macros
#[cfg(feature = "tracing")]
macro_rules! trace {
    ($($arg:tt)*) => { ::tracing::trace!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[allow(unused_imports)]
pub(crate) use trace;

mod ast;
mod lexer;
mod parser;
mod span;
mod value;

pub use ast::{
    Attribute, BinaryOp, Block, BlockLabel, Body, Expression, ExprKind, File, FileBody, ForExpr,
    ObjectItem, TravStep, TravStepKind, UnaryOp,
};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse, ParseError, ParseErrorKind};
pub use span::{innermost_containing, pos_at_byte, Pos, Range, Span};
pub use value::{Value, ValueType};

/// Whether `c` can appear in a Lethe identifier.
///
/// Identifiers cover attribute names, block types and keyword literals.
/// Dashes are allowed (but not leading) so provider-style names like
/// `edge-proxy` lex as one token.
pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Whether `c` can start a Lethe identifier.
pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}
