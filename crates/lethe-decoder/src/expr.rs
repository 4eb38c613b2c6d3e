//! The constraint dispatcher: per-constraint completion inside an
//! attribute's expression.
//!
//! One central match over [`Constraint`] handles every variant, so
//! exhaustiveness checks keep new variants honest. Positions split
//! into two regimes: a *fresh* value position (no expression, a
//! missing one, or a cursor before it) and positions *inside* an
//! existing expression, which recurse through collection syntax
//! toward the element constraint covering the cursor.

use lethe_schema::{
    AttributeSchema, Constraint, ObjectAttribute, ObjectConstraint, ReferenceConstraint,
};
use lethe_syntax::{ExprKind, Expression, ObjectItem, Pos, Range, ValueType};

use crate::candidates::{Candidate, CandidateKind, Candidates};
use crate::context::RequestContext;
use crate::error::Error;
use crate::walk::Walker;

/// Type names offered for a type-declaration position.
const TYPE_KEYWORDS: &[&str] = &[
    "any", "bool", "list", "map", "number", "object", "set", "string", "tuple",
];

impl Walker<'_> {
    /// Completion for an expression position governed by `constraint`.
    pub(crate) fn expr_candidates(
        &self,
        req: &RequestContext,
        constraint: &Constraint,
        expr: Option<&Expression>,
        pos: Pos,
    ) -> Result<Candidates, Error> {
        req.check()?;
        let Some(expr) = expr else {
            return self.fresh_value_candidates(req, constraint, pos);
        };
        if expr.is_missing() || !expr.range.contains_pos_inclusive(pos) {
            return self.fresh_value_candidates(req, constraint, pos);
        }
        self.candidates_inside_expr(req, constraint, expr, pos)
    }

    /// Candidates for starting a value from scratch (`name = ` with
    /// the cursor after the equals sign, or an empty collection slot).
    fn fresh_value_candidates(
        &self,
        req: &RequestContext,
        constraint: &Constraint,
        pos: Pos,
    ) -> Result<Candidates, Error> {
        let edit_range = self.prefix_edit_range(pos);
        match constraint {
            Constraint::LiteralValue(value) => Ok(Candidates::complete(vec![Candidate::spelled(
                &value.to_source(),
                value.value_type().friendly_name(),
                CandidateKind::Value,
                edit_range,
            )])),
            Constraint::Keyword { keyword, name } => {
                Ok(Candidates::complete(vec![keyword_candidate(
                    keyword, name, edit_range,
                )]))
            }
            Constraint::OneOf(cons) => {
                let mut list = Vec::new();
                for sub in cons {
                    list.extend(self.fresh_value_candidates(req, sub, pos)?.list);
                }
                Ok(Candidates::complete(list))
            }
            Constraint::Reference(reference) => {
                self.reference_target_candidates(req, Some(reference), None, edit_range)
            }
            Constraint::AnyExpression { of_type } => {
                self.reference_target_candidates(req, None, Some(of_type), edit_range)
            }
            Constraint::TypeDeclaration => {
                let list = TYPE_KEYWORDS
                    .iter()
                    .map(|kw| {
                        Candidate::spelled(
                            kw,
                            "type".to_string(),
                            CandidateKind::Keyword,
                            edit_range.clone(),
                        )
                    })
                    .collect();
                Ok(Candidates::complete(list))
            }
            // Literal scalars and collection openers: nothing useful
            // to offer beyond what the attribute snippet already
            // inserted.
            Constraint::LiteralType(_)
            | Constraint::List(_)
            | Constraint::Set(_)
            | Constraint::Tuple(_)
            | Constraint::Map(_)
            | Constraint::Object(_) => Ok(Candidates::complete(Vec::new())),
        }
    }

    /// Completion with the cursor inside an existing expression.
    fn candidates_inside_expr(
        &self,
        req: &RequestContext,
        constraint: &Constraint,
        expr: &Expression,
        pos: Pos,
    ) -> Result<Candidates, Error> {
        match constraint {
            Constraint::LiteralType(t) => self.candidates_in_literal_type(req, t, expr, pos),
            // Inside an already-written literal there is nothing to
            // complete; the list is empty but well-formed.
            Constraint::LiteralValue(_) => Ok(Candidates::complete(Vec::new())),
            Constraint::Keyword { keyword, name } => {
                if expr.as_keyword().is_some() {
                    // A partially-typed keyword: replace it wholesale.
                    Ok(Candidates::complete(vec![keyword_candidate(
                        keyword,
                        name,
                        expr.range.clone(),
                    )]))
                } else {
                    Ok(Candidates::complete(Vec::new()))
                }
            }
            Constraint::OneOf(cons) => {
                let mut list = Vec::new();
                let mut is_complete = true;
                for sub in cons {
                    let sub_candidates = self.expr_candidates(req, sub, Some(expr), pos)?;
                    is_complete &= sub_candidates.is_complete;
                    list.extend(sub_candidates.list);
                }
                let mut merged = Candidates::complete(list);
                merged.is_complete = is_complete;
                Ok(merged)
            }
            Constraint::Reference(reference) => {
                let edit_range = if expr.traversal().is_some() {
                    expr.range.clone()
                } else {
                    self.prefix_edit_range(pos)
                };
                self.reference_target_candidates(req, Some(reference), None, edit_range)
            }
            Constraint::AnyExpression { of_type } => {
                if expr.traversal().is_some() {
                    self.reference_target_candidates(req, None, Some(of_type), expr.range.clone())
                } else {
                    Ok(Candidates::complete(Vec::new()))
                }
            }
            Constraint::List(elem) | Constraint::Set(elem) => {
                self.candidates_in_tuple_expr(req, expr, pos, |_| Some((**elem).clone()))
            }
            Constraint::Tuple(elems) => {
                self.candidates_in_tuple_expr(req, expr, pos, |i| elems.get(i).cloned())
            }
            Constraint::Map(elem) => self.candidates_in_map_expr(req, elem, expr, pos),
            Constraint::Object(obj) => self.candidates_in_object_expr(req, obj, expr, pos),
            Constraint::TypeDeclaration => Ok(Candidates::complete(Vec::new())),
        }
    }

    /// Recurse through the syntax of a typed literal toward the
    /// element or field the cursor covers.
    fn candidates_in_literal_type(
        &self,
        req: &RequestContext,
        t: &ValueType,
        expr: &Expression,
        pos: Pos,
    ) -> Result<Candidates, Error> {
        match t {
            ValueType::List(elem) | ValueType::Set(elem) => self
                .candidates_in_tuple_expr(req, expr, pos, |_| {
                    Some(Constraint::LiteralType((**elem).clone()))
                }),
            ValueType::Tuple(elems) => self.candidates_in_tuple_expr(req, expr, pos, |i| {
                elems.get(i).cloned().map(Constraint::LiteralType)
            }),
            ValueType::Map(elem) => {
                let value_constraint = Constraint::LiteralType((**elem).clone());
                self.candidates_in_map_expr(req, &value_constraint, expr, pos)
            }
            ValueType::Object(fields) => {
                let obj = ObjectConstraint {
                    attributes: fields
                        .iter()
                        .map(|(name, field_type)| {
                            (
                                name.clone(),
                                ObjectAttribute {
                                    constraint: Constraint::LiteralType(field_type.clone()),
                                    required: true,
                                },
                            )
                        })
                        .collect(),
                    allow_interpolated: false,
                };
                self.candidates_in_object_expr(req, &obj, expr, pos)
            }
            // Inside a scalar literal: a zero-length complete list.
            ValueType::String
            | ValueType::Number
            | ValueType::Bool
            | ValueType::Dynamic => Ok(Candidates::complete(Vec::new())),
        }
    }

    /// Cursor inside `[ ... ]`: dispatch to the constraint of the
    /// element under the cursor, or to a fresh slot between elements.
    fn candidates_in_tuple_expr(
        &self,
        req: &RequestContext,
        expr: &Expression,
        pos: Pos,
        elem_at: impl Fn(usize) -> Option<Constraint>,
    ) -> Result<Candidates, Error> {
        let ExprKind::Tuple(items) = &expr.kind else {
            return Ok(Candidates::complete(Vec::new()));
        };
        for (i, item) in items.iter().enumerate() {
            if item.range.contains_pos_inclusive(pos) {
                let Some(elem) = elem_at(i) else {
                    return Ok(Candidates::complete(Vec::new()));
                };
                return self.expr_candidates(req, &elem, Some(item), pos);
            }
        }
        match elem_at(items.len()) {
            Some(elem) => self.fresh_value_candidates(req, &elem, pos),
            None => Ok(Candidates::complete(Vec::new())),
        }
    }

    /// Cursor inside a map literal: keys are free-form, values follow
    /// the element constraint.
    fn candidates_in_map_expr(
        &self,
        req: &RequestContext,
        value_constraint: &Constraint,
        expr: &Expression,
        pos: Pos,
    ) -> Result<Candidates, Error> {
        let ExprKind::Object(items) = &expr.kind else {
            return Ok(Candidates::complete(Vec::new()));
        };
        for item in items {
            if !item_covers(item, pos) {
                continue;
            }
            if item.key_range.contains_pos_inclusive(pos) {
                return Ok(Candidates::complete(Vec::new()));
            }
            return self.expr_candidates(req, value_constraint, item.value.as_ref(), pos);
        }
        Ok(Candidates::complete(Vec::new()))
    }

    /// Cursor inside an object literal with a fixed shape: complete
    /// missing field names, or recurse into the field under the cursor.
    fn candidates_in_object_expr(
        &self,
        req: &RequestContext,
        obj: &ObjectConstraint,
        expr: &Expression,
        pos: Pos,
    ) -> Result<Candidates, Error> {
        let ExprKind::Object(items) = &expr.kind else {
            return Ok(Candidates::complete(Vec::new()));
        };
        for item in items {
            if !item_covers(item, pos) {
                continue;
            }
            if item.key_range.contains_pos_inclusive(pos) {
                // Completing a field name: replace the typed key.
                return self.object_field_candidates(req, obj, items, item.key_range.clone());
            }
            let Some(field) = obj.attributes.get(&item.key) else {
                return Ok(Candidates::complete(Vec::new()));
            };
            return self.expr_candidates(req, &field.constraint, item.value.as_ref(), pos);
        }
        // Inside the braces but on no entry: offer the missing names.
        let edit_range = self.prefix_edit_range(pos);
        self.object_field_candidates(req, obj, items, edit_range)
    }

    fn object_field_candidates(
        &self,
        req: &RequestContext,
        obj: &ObjectConstraint,
        items: &[ObjectItem],
        edit_range: Range,
    ) -> Result<Candidates, Error> {
        let mut list = Vec::new();
        for (name, field) in &obj.attributes {
            req.check()?;
            if items.iter().any(|item| item.key == *name) {
                continue;
            }
            let field_schema = AttributeSchema {
                constraint: field.constraint.clone(),
                required: field.required,
                ..Default::default()
            };
            list.push(Candidate::attribute(
                name,
                &field_schema,
                edit_range.clone(),
                req.prefill_required_fields,
            ));
        }
        Ok(Candidates::complete(list))
    }

    /// Traversal candidates drawn from the reference-target index,
    /// filtered by a reference constraint or an expected type.
    pub(crate) fn reference_target_candidates(
        &self,
        req: &RequestContext,
        reference: Option<&ReferenceConstraint>,
        of_type: Option<&ValueType>,
        edit_range: Range,
    ) -> Result<Candidates, Error> {
        let mut list = Vec::new();
        for target in &self.path.reference_index.targets {
            req.check()?;
            let matched = match (reference, of_type) {
                (Some(rc), _) => target.matches_constraint(rc),
                (None, Some(t)) => target.assignable_to(t),
                (None, None) => true,
            };
            if !matched {
                continue;
            }
            let address = target.address.to_string();
            let detail = target
                .of_type
                .as_ref()
                .map(ValueType::friendly_name)
                .unwrap_or_else(|| "reference".to_string());
            list.push(Candidate::spelled(
                &address,
                detail,
                CandidateKind::Traversal,
                edit_range.clone(),
            ));
        }
        Ok(Candidates::complete(list))
    }
}

/// Whether an object item (or its missing value slot) covers `pos`.
fn item_covers(item: &ObjectItem, pos: Pos) -> bool {
    item.range.contains_pos_inclusive(pos)
}

fn keyword_candidate(keyword: &str, name: &Option<String>, edit_range: Range) -> Candidate {
    let detail = name.clone().unwrap_or_else(|| "keyword".to_string());
    Candidate::spelled(keyword, detail, CandidateKind::Keyword, edit_range)
}
