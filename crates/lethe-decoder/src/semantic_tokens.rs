//! Schema-aware semantic tokens.
//!
//! Tokens are emitted only for elements the schema recognizes: a block
//! type the schema does not know produces no token, which is exactly
//! the signal editors use to grey out unknown constructs.

use lethe_schema::{BodySchema, Constraint};
use lethe_syntax::{Body, ExprKind, Expression, Range, TravStepKind};

use crate::blocks::resolve_effective_body;
use crate::context::RequestContext;
use crate::error::Error;
use crate::walk::Walker;

/// Semantic token types the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TokenType {
    BlockType = 0,
    BlockLabel = 1,
    AttrName = 2,
    Bool = 3,
    Number = 4,
    String = 5,
    Keyword = 6,
    ReferenceStep = 7,
}

impl TokenType {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::BlockType => "type",
            TokenType::BlockLabel => "enumMember",
            TokenType::AttrName => "property",
            TokenType::Bool => "keyword",
            TokenType::Number => "number",
            TokenType::String => "string",
            TokenType::Keyword => "keyword",
            TokenType::ReferenceStep => "variable",
        }
    }
}

/// Token modifiers, used as bit positions in a flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TokenModifier {
    /// The name comes from a dependent body (or is a dep-key label).
    Dependent = 0,
    Deprecated = 1,
}

impl TokenModifier {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenModifier::Dependent => "defaultLibrary",
            TokenModifier::Deprecated => "deprecated",
        }
    }

    pub fn bit(self) -> u32 {
        1 << self as u32
    }
}

/// One emitted token.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticToken {
    pub range: Range,
    pub token_type: TokenType,
    /// Bitset of [`TokenModifier`] bits.
    pub modifiers: u32,
}

impl Walker<'_> {
    /// Collect tokens for one body, recursing through effective
    /// schemas. `dependent_attrs` marks names the current body got
    /// from a dependent schema.
    pub(crate) fn tokens_in_body(
        &self,
        req: &RequestContext,
        body: &Body,
        schema: &BodySchema,
        dependent_attrs: &std::collections::BTreeSet<String>,
        out: &mut Vec<SemanticToken>,
    ) -> Result<(), Error> {
        req.check()?;

        for attr in &body.attributes {
            let known = schema.attributes.get(&attr.name);
            let Some(attr_schema) = known.or(schema.any_attribute.as_deref()) else {
                continue;
            };
            let mut modifiers = 0;
            if dependent_attrs.contains(&attr.name) {
                modifiers |= TokenModifier::Dependent.bit();
            }
            if attr_schema.deprecated {
                modifiers |= TokenModifier::Deprecated.bit();
            }
            out.push(SemanticToken {
                range: attr.name_range.clone(),
                token_type: TokenType::AttrName,
                modifiers,
            });
            if let Some(expr) = attr.expr.as_ref() {
                expr_tokens(&attr_schema.constraint, expr, out);
            }
        }

        for block in &body.blocks {
            let Some(block_schema) = schema.blocks.get(&block.block_type) else {
                continue;
            };
            out.push(SemanticToken {
                range: block.type_range.clone(),
                token_type: TokenType::BlockType,
                modifiers: 0,
            });
            for (i, label) in block.labels.iter().enumerate() {
                let Some(label_schema) = block_schema.labels.get(i) else {
                    continue;
                };
                let modifiers = if label_schema.is_dep_key {
                    TokenModifier::Dependent.bit()
                } else {
                    0
                };
                out.push(SemanticToken {
                    range: label.range.clone(),
                    token_type: TokenType::BlockLabel,
                    modifiers,
                });
            }
            if let Some(effective) = resolve_effective_body(block, block_schema) {
                self.tokens_in_body(
                    req,
                    &block.body,
                    &effective.schema,
                    &effective.dependent_attrs,
                    out,
                )?;
            }
        }

        Ok(())
    }
}

/// Tokens for an expression under its constraint.
fn expr_tokens(constraint: &Constraint, expr: &Expression, out: &mut Vec<SemanticToken>) {
    match (&expr.kind, constraint) {
        (ExprKind::String { .. } | ExprKind::Heredoc { .. }, _) => {
            out.push(token(expr, TokenType::String));
        }
        (ExprKind::Number(_), _) => out.push(token(expr, TokenType::Number)),
        (ExprKind::Bool(_), _) => out.push(token(expr, TokenType::Bool)),
        (ExprKind::Traversal(_), Constraint::Keyword { keyword, .. }) => {
            if expr.as_keyword() == Some(keyword) {
                out.push(token(expr, TokenType::Keyword));
            }
        }
        (
            ExprKind::Traversal(steps),
            Constraint::Reference(_) | Constraint::AnyExpression { .. },
        ) => {
            for step in steps {
                if matches!(
                    step.kind,
                    TravStepKind::Root(_) | TravStepKind::Attr(_)
                ) {
                    out.push(SemanticToken {
                        range: step.range.clone(),
                        token_type: TokenType::ReferenceStep,
                        modifiers: 0,
                    });
                }
            }
        }
        (ExprKind::Tuple(items), _) => {
            for (i, item) in items.iter().enumerate() {
                let elem = match constraint {
                    Constraint::List(elem) | Constraint::Set(elem) => Some(&**elem),
                    Constraint::Tuple(elems) => elems.get(i),
                    _ => None,
                };
                if let Some(elem) = elem {
                    expr_tokens(elem, item, out);
                } else if let Constraint::LiteralType(_) = constraint {
                    // typed literal collections still highlight leaves
                    literal_leaf_tokens(item, out);
                }
            }
        }
        (ExprKind::Object(items), _) => {
            for item in items {
                let value_constraint = match constraint {
                    Constraint::Map(elem) => Some(&**elem),
                    Constraint::Object(obj) => {
                        obj.attributes.get(&item.key).map(|f| &f.constraint)
                    }
                    _ => None,
                };
                match (value_constraint, item.value.as_ref()) {
                    (Some(c), Some(value)) => expr_tokens(c, value, out),
                    (None, Some(value)) if matches!(constraint, Constraint::LiteralType(_)) => {
                        literal_leaf_tokens(value, out)
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

/// Highlight literal leaves without schema guidance (inside typed
/// literal collections).
fn literal_leaf_tokens(expr: &Expression, out: &mut Vec<SemanticToken>) {
    match &expr.kind {
        ExprKind::String { .. } | ExprKind::Heredoc { .. } => {
            out.push(token(expr, TokenType::String))
        }
        ExprKind::Number(_) => out.push(token(expr, TokenType::Number)),
        ExprKind::Bool(_) => out.push(token(expr, TokenType::Bool)),
        ExprKind::Tuple(items) => {
            for item in items {
                literal_leaf_tokens(item, out);
            }
        }
        ExprKind::Object(items) => {
            for item in items {
                if let Some(value) = &item.value {
                    literal_leaf_tokens(value, out);
                }
            }
        }
        _ => {}
    }
}

fn token(expr: &Expression, token_type: TokenType) -> SemanticToken {
    SemanticToken {
        range: expr.range.clone(),
        token_type,
        modifiers: 0,
    }
}
