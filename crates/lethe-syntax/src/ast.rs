//! The Lethe syntax tree.
//!
//! Produced by [`crate::parse`] and consumed by the language-service
//! engine. The tree is tolerant by construction: attributes may lack
//! expressions, blocks may lack closing braces, and expressions may be
//! [`ExprKind::Missing`] or [`ExprKind::Invalid`] where recovery kicked
//! in. Every node carries a [`Range`] so positional queries stay
//! meaningful on partial input.

use crate::span::{Pos, Range};
use crate::value::Value;

/// A parsed file: the raw source plus its body.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub filename: String,
    pub source: String,
    pub body: FileBody,
}

impl File {
    /// The native body, if this file is in the native dialect.
    pub fn native_body(&self) -> Option<&Body> {
        match &self.body {
            FileBody::Native(body) => Some(body),
            _ => None,
        }
    }

    /// End-of-file position.
    pub fn end_pos(&self) -> Pos {
        match &self.body {
            FileBody::Native(body) => body.range.end,
            _ => crate::span::pos_at_byte(&self.source, self.source.len() as u32),
        }
    }
}

/// The body of a file.
///
/// Files may arrive in surface dialects other than native Lethe (for
/// instance a JSON rendering); the engine only interprets native
/// bodies and refuses the rest. `Empty` is the sentinel produced when
/// a file is registered without content.
#[derive(Debug, Clone, PartialEq)]
pub enum FileBody {
    Native(Body),
    Foreign { dialect: String },
    Empty,
}

/// An ordered collection of attributes and nested blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<Block>,
    /// For a file body: the whole file. For a block body: the region
    /// strictly between the braces.
    pub range: Range,
}

impl Body {
    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Whether an attribute of the given name is present.
    ///
    /// Attributes recovered without an expression still count: the
    /// user has committed to the name even if the value is half-typed.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }
}

/// A `name = expression` binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub name_range: Range,
    /// `None` when recovery dropped the right-hand side entirely;
    /// a [`ExprKind::Missing`] expression when `=` was typed but
    /// nothing follows.
    pub expr: Option<Expression>,
    pub range: Range,
}

/// A `type "label" ... { body }` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub block_type: String,
    pub type_range: Range,
    pub labels: Vec<BlockLabel>,
    pub open_brace_range: Range,
    /// `None` while the block is still being typed.
    pub close_brace_range: Option<Range>,
    pub body: Body,
    pub range: Range,
}

/// One positional label in a block header.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockLabel {
    pub value: String,
    /// The full label token, including quotes when present.
    pub range: Range,
    /// The label text without quotes; for `""` this is a zero-length
    /// range between the quotes.
    pub value_range: Range,
}

/// An expression with its source range.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExprKind,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A quoted string. `has_interpolation` is set when the string
    /// contains `${` template interpolation; such strings no longer
    /// fold to a literal value.
    String {
        value: String,
        has_interpolation: bool,
    },
    Number(f64),
    Bool(bool),
    Null,
    /// `<<DELIM ... DELIM` heredoc.
    Heredoc {
        delimiter: String,
        value: String,
        content_range: Range,
    },
    /// `[a, b, c]`
    Tuple(Vec<Expression>),
    /// `{ key = value, ... }`
    Object(Vec<ObjectItem>),
    /// `root.attr[0].other`. Also covers bare keywords, which parse
    /// as a single root step.
    Traversal(Vec<TravStep>),
    FunctionCall {
        name: String,
        name_range: Range,
        args: Vec<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    /// `cond ? then : otherwise`
    Conditional {
        cond: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
    ForExpr(Box<ForExpr>),
    Paren(Box<Expression>),
    /// `name =` with nothing after it; zero-length range.
    Missing,
    /// Recovered garbage the parser could not interpret.
    Invalid,
}

/// `[for x in coll : expr if cond]` / `{for k, v in coll : k => expr}`
#[derive(Debug, Clone, PartialEq)]
pub struct ForExpr {
    pub key_var: Option<String>,
    pub value_var: String,
    pub collection: Expression,
    pub key_expr: Option<Expression>,
    pub value_expr: Expression,
    pub cond: Option<Expression>,
}

/// One `key = value` entry in an object expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectItem {
    pub key: String,
    pub key_range: Range,
    pub value: Option<Expression>,
    pub range: Range,
}

/// One step of a traversal expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TravStep {
    pub kind: TravStepKind,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TravStepKind {
    /// The leading identifier.
    Root(String),
    /// `.name`
    Attr(String),
    /// `[index]`
    Index(Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl Expression {
    /// Fold a pure literal expression into a [`Value`].
    ///
    /// Interpolated strings, traversals, operations and recovered
    /// nodes do not fold; collections fold only when every element
    /// does.
    pub fn as_literal_value(&self) -> Option<Value> {
        match &self.kind {
            ExprKind::String {
                value,
                has_interpolation: false,
            } => Some(Value::String(value.clone())),
            ExprKind::Number(n) => Some(Value::Number(*n)),
            ExprKind::Bool(b) => Some(Value::Bool(*b)),
            ExprKind::Heredoc { value, .. } => Some(Value::String(value.clone())),
            ExprKind::Tuple(items) => items
                .iter()
                .map(Expression::as_literal_value)
                .collect::<Option<Vec<_>>>()
                .map(Value::Tuple),
            ExprKind::Object(items) => items
                .iter()
                .map(|item| {
                    item.value
                        .as_ref()
                        .and_then(Expression::as_literal_value)
                        .map(|v| (item.key.clone(), v))
                })
                .collect::<Option<_>>()
                .map(Value::Object),
            ExprKind::Paren(inner) => inner.as_literal_value(),
            _ => None,
        }
    }

    /// The keyword spelled by this expression, if it is a bare
    /// identifier (a traversal with a single root step).
    pub fn as_keyword(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Traversal(steps) => match steps.as_slice() {
                [TravStep {
                    kind: TravStepKind::Root(name),
                    ..
                }] => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// The traversal steps of this expression, if it is one.
    pub fn traversal(&self) -> Option<&[TravStep]> {
        match &self.kind {
            ExprKind::Traversal(steps) => Some(steps),
            _ => None,
        }
    }

    /// Whether this expression is a placeholder for absent input.
    pub fn is_missing(&self) -> bool {
        matches!(self.kind, ExprKind::Missing)
    }
}
