//! The body walker: schema-directed descent from the file root to the
//! innermost node covering the cursor.
//!
//! The walker classifies the position (block header, label, block
//! interior, attribute name, attribute expression, inter-statement
//! whitespace) and either answers there or recurses one body deeper
//! through the block's effective schema.

use tracing::trace;

use lethe_schema::{AttributeSchema, BodySchema, Constraint};
use lethe_syntax::{Block, Body, File, Pos, Range, ValueType};

use crate::blocks::{label_value_candidates, resolve_effective_body};
use crate::candidates::{Candidate, Candidates};
use crate::context::RequestContext;
use crate::error::Error;
use crate::PathContext;

/// Shared state for one positional query against one file.
pub(crate) struct Walker<'a> {
    pub path: &'a PathContext,
    pub filename: &'a str,
    pub file: &'a File,
}

impl<'a> Walker<'a> {
    pub fn new(path: &'a PathContext, filename: &'a str, file: &'a File) -> Self {
        Self {
            path,
            filename,
            file,
        }
    }

    /// Completion inside one body. `schema` is this body's effective
    /// schema; recursion resolves the next level down.
    pub fn complete_in_body(
        &self,
        req: &RequestContext,
        body: &Body,
        schema: &BodySchema,
        pos: Pos,
    ) -> Result<Candidates, Error> {
        req.check()?;
        let req = &req.scoped_to(schema.extensions);

        for block in &body.blocks {
            if !block.range.contains_pos(pos) {
                continue;
            }
            trace!(block_type = %block.block_type, %pos, "descending into block");
            let Some(block_schema) = schema.blocks.get(&block.block_type) else {
                return Err(Error::unknown_block_type(&block.block_type));
            };

            // On the type identifier of an existing block: offer block
            // types, replacing the whole block.
            if block.type_range.contains_pos(pos) {
                return self.block_type_candidates(req, schema, block.range.clone());
            }

            for (i, label) in block.labels.iter().enumerate() {
                if label.range.contains_pos(pos) {
                    return Ok(label_value_candidates(block_schema, i, label));
                }
            }

            if self.pos_within_block_body(block, pos) {
                return match resolve_effective_body(block, block_schema) {
                    Some(effective) => {
                        self.complete_in_body(req, &block.body, &effective.schema, pos)
                    }
                    None => Ok(Candidates::none()),
                };
            }

            // Header whitespace or one of the braces.
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
            if attr.name_range.contains_pos_inclusive(pos) {
                // Completing the name itself: same candidates as a new
                // attribute, but the edit replaces the whole statement.
                return self.body_candidates(req, schema, body, Some(attr.range.clone()), pos);
            }
            let Some(attr_schema) = lookup_attr(schema, &attr.name, req.active_count) else {
                return Ok(Candidates::none());
            };
            return self.expr_candidates(req, &attr_schema.constraint, attr.expr.as_ref(), pos);
        }

        // Inter-statement whitespace: a new attribute or block here.
        self.body_candidates(req, schema, body, None, pos)
    }

    /// Whether `pos` sits strictly inside the block's body: after the
    /// opening brace and before the closing one. While the closing
    /// brace is missing, the end of the parsed body counts as inside.
    fn pos_within_block_body(&self, block: &Block, pos: Pos) -> bool {
        if block.close_brace_range.is_some() {
            block.body.range.contains_pos(pos)
        } else {
            block.body.range.contains_pos_inclusive(pos)
        }
    }

    /// "New attribute or block" candidates for a body: every schema
    /// attribute not already present, the `any_attribute` fallback,
    /// the `count` extension, and every block type.
    pub(crate) fn body_candidates(
        &self,
        req: &RequestContext,
        schema: &BodySchema,
        body: &Body,
        override_range: Option<Range>,
        pos: Pos,
    ) -> Result<Candidates, Error> {
        let prefix_range = self.prefix_edit_range(pos);
        let prefix = self.range_text(&prefix_range).to_string();
        let edit_range = override_range.unwrap_or(prefix_range);
        let mut list = Vec::new();

        for (name, attr_schema) in &schema.attributes {
            req.check()?;
            if body.has_attribute(name) {
                continue;
            }
            list.push(Candidate::attribute(
                name,
                attr_schema,
                edit_range.clone(),
                req.prefill_required_fields,
            ));
        }

        // Fallback for bodies accepting arbitrary names: offered under
        // the conventional placeholder label when no concrete
        // attribute applies.
        if schema.attributes.is_empty()
            && let Some(any) = &schema.any_attribute
        {
            list.push(Candidate::attribute(
                "name",
                any,
                edit_range.clone(),
                req.prefill_required_fields,
            ));
        }

        if req.active_count
            && !body.has_attribute("count")
            && !schema.attributes.contains_key("count")
        {
            list.push(Candidate::attribute(
                "count",
                &count_attribute_schema(),
                edit_range.clone(),
                req.prefill_required_fields,
            ));
        }

        for (block_type, block_schema) in &schema.blocks {
            req.check()?;
            list.push(Candidate::block(block_type, block_schema, edit_range.clone()));
        }

        // A half-typed name narrows the offer to matching labels.
        if !prefix.is_empty() {
            list.retain(|c| c.label.starts_with(&prefix));
        }

        Ok(Candidates::complete(list))
    }

    /// The source text covered by a range.
    fn range_text(&self, range: &Range) -> &str {
        let start = clamp_to_boundary(&self.file.source, range.start.byte);
        let end = clamp_to_boundary(&self.file.source, range.end.byte);
        &self.file.source[start..end]
    }

    /// Block candidates replacing `edit_range` (the whole block when
    /// the cursor sits on an existing type identifier).
    pub(crate) fn block_type_candidates(
        &self,
        req: &RequestContext,
        schema: &BodySchema,
        edit_range: Range,
    ) -> Result<Candidates, Error> {
        let mut list = Vec::new();
        for (block_type, block_schema) in &schema.blocks {
            req.check()?;
            list.push(Candidate::block(block_type, block_schema, edit_range.clone()));
        }
        Ok(Candidates::complete(list))
    }

    /// The edit range for a fresh insertion at `pos`: the identifier
    /// prefix ending at the cursor when there is one (recovered from
    /// raw bytes, since a half-typed name is not in the tree), else a
    /// zero-length range at the cursor.
    pub(crate) fn prefix_edit_range(&self, pos: Pos) -> Range {
        let source = &self.file.source;
        let byte = clamp_to_boundary(source, pos.byte);
        let prefix_len = source[..byte]
            .bytes()
            .rev()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
            .count() as u32;
        if prefix_len == 0 {
            return Range::zero(self.filename, pos);
        }
        let start = Pos {
            line: pos.line,
            column: pos.column - prefix_len,
            byte: pos.byte - prefix_len,
        };
        Range::new(self.filename, start, pos)
    }
}

/// Clamp a byte offset into `source` to the nearest preceding char
/// boundary, so a cursor parked mid-codepoint cannot panic a slice.
fn clamp_to_boundary(source: &str, byte: u32) -> usize {
    let mut byte = (byte as usize).min(source.len());
    while byte > 0 && !source.is_char_boundary(byte) {
        byte -= 1;
    }
    byte
}

/// The schema governing an attribute name in a body: a declared
/// attribute, the `count` extension, or the any-attribute fallback.
pub(crate) fn lookup_attr(
    schema: &BodySchema,
    name: &str,
    active_count: bool,
) -> Option<AttributeSchema> {
    if let Some(attr) = schema.attributes.get(name) {
        return Some(attr.clone());
    }
    if active_count && name == "count" {
        return Some(count_attribute_schema());
    }
    schema.any_attribute.as_deref().cloned()
}

/// The builtin `count` meta-attribute injected by the body extension.
pub(crate) fn count_attribute_schema() -> AttributeSchema {
    AttributeSchema {
        constraint: Constraint::LiteralType(ValueType::Number),
        optional: true,
        description: Some("Total number of instances of this block".to_string()),
        ..Default::default()
    }
}
