//! Hover payloads for schema-known positions.

use lethe_schema::{AttributeSchema, BodySchema, Constraint};
use lethe_syntax::{Body, ExprKind, Expression, Pos, Range};

use crate::blocks::resolve_effective_body;
use crate::context::RequestContext;
use crate::error::Error;
use crate::reference::address_of_expr;
use crate::walk::{lookup_attr, Walker};

/// What the editor shows when hovering a position.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverData {
    /// Markdown content.
    pub content: String,
    /// The region the hover describes.
    pub range: Range,
}

impl Walker<'_> {
    /// Hover inside one body; recurses like completion but never
    /// offers anything in inter-statement whitespace.
    pub(crate) fn hover_in_body(
        &self,
        req: &RequestContext,
        body: &Body,
        schema: &BodySchema,
        pos: Pos,
    ) -> Result<Option<HoverData>, Error> {
        req.check()?;
        let req = &req.scoped_to(schema.extensions);

        for block in &body.blocks {
            if !block.range.contains_pos(pos) {
                continue;
            }
            let Some(block_schema) = schema.blocks.get(&block.block_type) else {
                return Err(Error::unknown_block_type(&block.block_type));
            };

            if block.type_range.contains_pos(pos) {
                let mut content = format!("**{}** _Block_", block.block_type);
                if let Some(description) = &block_schema.description {
                    content.push_str("\n\n");
                    content.push_str(description);
                }
                return Ok(Some(HoverData {
                    content,
                    range: block.type_range.clone(),
                }));
            }

            for (i, label) in block.labels.iter().enumerate() {
                if label.range.contains_pos(pos) {
                    let label_name = block_schema
                        .labels
                        .get(i)
                        .map(|l| l.name.as_str())
                        .unwrap_or("label");
                    return Ok(Some(HoverData {
                        content: format!("\"{}\" ({})", label.value, label_name),
                        range: label.range.clone(),
                    }));
                }
            }

            let inside_body = if block.close_brace_range.is_some() {
                block.body.range.contains_pos(pos)
            } else {
                block.body.range.contains_pos_inclusive(pos)
            };
            if inside_body {
                return match resolve_effective_body(block, block_schema) {
                    Some(effective) => {
                        self.hover_in_body(req, &block.body, &effective.schema, pos)
                    }
                    None => Ok(None),
                };
            }

            // Hovering a brace or header whitespace is not defined.
            return Err(Error::positional(
                self.filename,
                pos,
                format!("position outside of \"{}\" body", block.block_type),
            ));
        }

        for attr in &body.attributes {
            if !attr.range.contains_pos(pos) {
                continue;
            }
            let Some(attr_schema) = lookup_attr(schema, &attr.name, req.active_count) else {
                return Ok(None);
            };
            if attr.name_range.contains_pos_inclusive(pos) {
                return Ok(Some(HoverData {
                    content: attribute_hover_content(&attr.name, &attr_schema),
                    range: attr.range.clone(),
                }));
            }
            let Some(expr) = attr.expr.as_ref() else {
                return Ok(None);
            };
            if !expr.range.contains_pos_inclusive(pos) || expr.is_missing() {
                // Between `=` and the value: describe the attribute.
                return Ok(Some(HoverData {
                    content: attribute_hover_content(&attr.name, &attr_schema),
                    range: attr.range.clone(),
                }));
            }
            return Ok(Some(self.expr_hover(&attr_schema.constraint, expr, pos)));
        }

        Ok(None)
    }

    /// Hover for an expression under its constraint: the covered
    /// expression's range plus the constraint's self-description.
    fn expr_hover(&self, constraint: &Constraint, expr: &Expression, pos: Pos) -> HoverData {
        match (constraint, &expr.kind) {
            (Constraint::LiteralValue(value), _) => HoverData {
                content: format!("`{}`", value.to_source()),
                range: expr.range.clone(),
            },
            (Constraint::Keyword { keyword, .. }, _) => HoverData {
                content: format!("`{}`", keyword),
                range: expr.range.clone(),
            },
            (Constraint::Reference(_), _) => {
                let content = address_of_expr(expr)
                    .and_then(|address| self.path.reference_index.target_at(&address))
                    .map(|target| {
                        let type_name = target
                            .of_type
                            .as_ref()
                            .map(|t| format!(" _{}_", t.friendly_name()))
                            .unwrap_or_default();
                        format!("`{}`{}", target.address, type_name)
                    })
                    .unwrap_or_else(|| format!("_{}_", constraint.friendly_name()));
                HoverData {
                    content,
                    range: expr.range.clone(),
                }
            }
            (Constraint::Object(obj), ExprKind::Object(items)) => {
                for item in items {
                    if !item.range.contains_pos_inclusive(pos) {
                        continue;
                    }
                    if let (Some(field), Some(value)) =
                        (obj.attributes.get(&item.key), item.value.as_ref())
                        && value.range.contains_pos_inclusive(pos)
                    {
                        return self.expr_hover(&field.constraint, value, pos);
                    }
                    if let Some(field) = obj.attributes.get(&item.key) {
                        let schema = AttributeSchema {
                            constraint: field.constraint.clone(),
                            required: field.required,
                            ..Default::default()
                        };
                        return HoverData {
                            content: attribute_hover_content(&item.key, &schema),
                            range: item.range.clone(),
                        };
                    }
                }
                HoverData {
                    content: "_object_".to_string(),
                    range: expr.range.clone(),
                }
            }
            (Constraint::OneOf(cons), _) => {
                // Describe with the first variant that makes sense of
                // the expression, falling back to the joined name.
                for sub in cons {
                    if constraint_accepts_shape(sub, expr) {
                        return self.expr_hover(sub, expr, pos);
                    }
                }
                HoverData {
                    content: format!("_{}_", constraint.friendly_name()),
                    range: expr.range.clone(),
                }
            }
            _ => HoverData {
                content: format!("_{}_", constraint.friendly_name()),
                range: expr.range.clone(),
            },
        }
    }
}

fn attribute_hover_content(name: &str, schema: &AttributeSchema) -> String {
    let mut content = format!("**{}** _{}_", name, schema.detail());
    if let Some(description) = &schema.description {
        content.push_str("\n\n");
        content.push_str(description);
    }
    content
}

/// A shallow shape check used to pick a OneOf variant for hover.
fn constraint_accepts_shape(constraint: &Constraint, expr: &Expression) -> bool {
    match constraint {
        Constraint::Keyword { keyword, .. } => expr.as_keyword() == Some(keyword),
        Constraint::Reference(_) => address_of_expr(expr).is_some(),
        Constraint::LiteralValue(value) => {
            expr.as_literal_value().as_ref() == Some(value)
        }
        Constraint::LiteralType(t) => expr
            .as_literal_value()
            .is_some_and(|v| v.value_type().assignable_to(t)),
        Constraint::Object(_) | Constraint::Map(_) => {
            matches!(expr.kind, ExprKind::Object(_))
        }
        Constraint::List(_) | Constraint::Set(_) | Constraint::Tuple(_) => {
            matches!(expr.kind, ExprKind::Tuple(_))
        }
        _ => false,
    }
}
