//! Reference origins and targets.
//!
//! An *origin* is a position in a file that refers to something (a
//! traversal expression under a reference-shaped constraint); a
//! *target* is something referable (an attribute or block whose schema
//! declares an address). The walkers here are best-effort: an
//! expression the engine cannot interpret is skipped, never fatal.

use lethe_schema::{
    Address, AddressStep, AddressTemplate, BodySchema, Constraint, ReferenceConstraint,
    TemplateStep,
};
use lethe_syntax::{Attribute, Block, Body, ExprKind, Expression, Range, TravStepKind, ValueType};

use crate::blocks::resolve_effective_body;
use crate::context::RequestContext;
use crate::error::Error;
use crate::walk::{lookup_attr, Walker};

/// A position in a file that refers to a target.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceOrigin {
    pub range: Range,
    pub address: Address,
    /// Scope the referenced target is expected to live in.
    pub of_scope_id: Option<String>,
    /// Type the referenced target is expected to produce.
    pub of_type: Option<ValueType>,
}

/// Something a reference can resolve to.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTarget {
    pub address: Address,
    pub scope_id: Option<String>,
    pub of_type: Option<ValueType>,
    /// Where the target is declared, when it lives in a local file.
    pub range: Option<Range>,
    pub name: Option<String>,
}

impl ReferenceTarget {
    /// Whether this target satisfies a reference constraint.
    pub fn matches_constraint(&self, reference: &ReferenceConstraint) -> bool {
        if let Some(scope) = &reference.of_scope_id
            && self.scope_id.as_ref() != Some(scope)
        {
            return false;
        }
        if let Some(expected) = &reference.of_type
            && !self.assignable_to(expected)
        {
            return false;
        }
        true
    }

    /// Whether this target produces a value usable where `expected` is
    /// wanted. Targets without a declared type only satisfy a dynamic
    /// expectation.
    pub fn assignable_to(&self, expected: &ValueType) -> bool {
        match &self.of_type {
            Some(t) => t.assignable_to(expected),
            None => matches!(expected, ValueType::Dynamic),
        }
    }
}

/// The pluggable per-path index of pre-built reference data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceIndex {
    pub targets: Vec<ReferenceTarget>,
    pub origins: Vec<ReferenceOrigin>,
}

impl ReferenceIndex {
    /// The target with exactly this address, if indexed.
    pub fn target_at(&self, address: &Address) -> Option<&ReferenceTarget> {
        self.targets.iter().find(|t| &t.address == address)
    }

    /// All indexed origins whose address equals the target's.
    pub fn origins_targeting(&self, target: &ReferenceTarget) -> Vec<&ReferenceOrigin> {
        self.origins
            .iter()
            .filter(|o| o.address == target.address)
            .collect()
    }
}

/// Fold a traversal expression into a concrete address. Returns `None`
/// for anything else, including traversals with incomplete steps or
/// computed indexes.
pub(crate) fn address_of_expr(expr: &Expression) -> Option<Address> {
    let steps = expr.traversal()?;
    let mut out = Vec::with_capacity(steps.len());
    for step in steps {
        match &step.kind {
            TravStepKind::Root(name) => out.push(AddressStep::Root(name.clone())),
            TravStepKind::Attr(name) if !name.is_empty() => {
                out.push(AddressStep::Attr(name.clone()))
            }
            // `root.` with the attribute still to come
            TravStepKind::Attr(_) => return None,
            TravStepKind::Index(index) => match &index.kind {
                ExprKind::Number(n) if n.fract() == 0.0 && *n >= 0.0 => {
                    out.push(AddressStep::IndexInt(*n as u64))
                }
                ExprKind::String {
                    value,
                    has_interpolation: false,
                } => out.push(AddressStep::IndexStr(value.clone())),
                _ => return None,
            },
        }
    }
    Some(Address(out))
}

/// Instantiate an attribute address template against a concrete
/// attribute declaration.
fn attribute_address(template: &AddressTemplate, attr: &Attribute) -> Option<Address> {
    template_address(template, |step| match step {
        TemplateStep::AttrName => Some(attr.name.clone()),
        _ => None,
    })
}

/// Instantiate a block address template against a concrete block.
fn block_address(template: &AddressTemplate, block: &Block) -> Option<Address> {
    template_address(template, |step| match step {
        TemplateStep::LabelIndex(i) => block.labels.get(*i).map(|l| l.value.clone()),
        _ => None,
    })
}

fn template_address(
    template: &AddressTemplate,
    resolve: impl Fn(&TemplateStep) -> Option<String>,
) -> Option<Address> {
    let mut out = Vec::with_capacity(template.steps.len());
    for step in &template.steps {
        let name = match step {
            TemplateStep::Static(name) => name.clone(),
            dynamic => resolve(dynamic)?,
        };
        if out.is_empty() {
            out.push(AddressStep::Root(name));
        } else {
            out.push(AddressStep::Attr(name));
        }
    }
    if out.is_empty() { None } else { Some(Address(out)) }
}

/// The type an attribute's constraint implies for its value, if any.
fn implied_type(constraint: &Constraint) -> Option<ValueType> {
    match constraint {
        Constraint::LiteralType(t) => Some(t.clone()),
        Constraint::LiteralValue(v) => Some(v.value_type()),
        Constraint::AnyExpression { of_type } => Some(of_type.clone()),
        Constraint::OneOf(cons) => cons.first().and_then(implied_type),
        _ => None,
    }
}

impl Walker<'_> {
    /// Collect reference origins across the whole file body.
    pub(crate) fn origins_in_body(
        &self,
        req: &RequestContext,
        body: &Body,
        schema: &BodySchema,
        allow_self_refs: bool,
        out: &mut Vec<ReferenceOrigin>,
    ) -> Result<(), Error> {
        req.check()?;
        let req = &req.scoped_to(schema.extensions);

        for attr in &body.attributes {
            let Some(attr_schema) = lookup_attr(schema, &attr.name, req.active_count) else {
                continue;
            };
            let Some(expr) = attr.expr.as_ref() else {
                continue;
            };
            let self_address = attr_schema
                .address
                .as_ref()
                .and_then(|template| attribute_address(template, attr));
            collect_expr_origins(&attr_schema.constraint, expr, |origin| {
                if !allow_self_refs && Some(&origin.address) == self_address.as_ref() {
                    return;
                }
                out.push(origin);
            });
        }

        for block in &body.blocks {
            let Some(block_schema) = schema.blocks.get(&block.block_type) else {
                continue;
            };
            if let Some(effective) = resolve_effective_body(block, block_schema) {
                self.origins_in_body(req, &block.body, &effective.schema, allow_self_refs, out)?;
            }
        }
        Ok(())
    }

    /// Collect reference targets across the whole file body.
    pub(crate) fn targets_in_body(
        &self,
        req: &RequestContext,
        body: &Body,
        schema: &BodySchema,
        out: &mut Vec<ReferenceTarget>,
    ) -> Result<(), Error> {
        req.check()?;
        let req = &req.scoped_to(schema.extensions);

        for attr in &body.attributes {
            let Some(attr_schema) = lookup_attr(schema, &attr.name, req.active_count) else {
                continue;
            };
            let Some(template) = attr_schema.address.as_ref() else {
                continue;
            };
            let Some(address) = attribute_address(template, attr) else {
                continue;
            };
            out.push(ReferenceTarget {
                address,
                scope_id: template.scope_id.clone(),
                of_type: implied_type(&attr_schema.constraint),
                range: Some(attr.range.clone()),
                name: Some(attr.name.clone()),
            });
        }

        for block in &body.blocks {
            let Some(block_schema) = schema.blocks.get(&block.block_type) else {
                continue;
            };
            if let Some(template) = block_schema.address.as_ref()
                && let Some(address) = block_address(template, block)
            {
                out.push(ReferenceTarget {
                    address,
                    scope_id: template.scope_id.clone(),
                    of_type: None,
                    range: Some(block.range.clone()),
                    name: Some(block.block_type.clone()),
                });
            }
            if let Some(effective) = resolve_effective_body(block, block_schema) {
                self.targets_in_body(req, &block.body, &effective.schema, out)?;
            }
        }
        Ok(())
    }
}

/// Walk an expression under its constraint and report every traversal
/// that reads as a reference.
fn collect_expr_origins(
    constraint: &Constraint,
    expr: &Expression,
    mut emit: impl FnMut(ReferenceOrigin),
) {
    collect_expr_origins_inner(constraint, expr, &mut emit);
}

fn collect_expr_origins_inner(
    constraint: &Constraint,
    expr: &Expression,
    emit: &mut impl FnMut(ReferenceOrigin),
) {
    match constraint {
        Constraint::Reference(reference) => {
            if let Some(address) = address_of_expr(expr) {
                emit(ReferenceOrigin {
                    range: expr.range.clone(),
                    address,
                    of_scope_id: reference.of_scope_id.clone(),
                    of_type: reference.of_type.clone(),
                });
            }
        }
        Constraint::AnyExpression { of_type } => {
            if let Some(address) = address_of_expr(expr) {
                emit(ReferenceOrigin {
                    range: expr.range.clone(),
                    address,
                    of_scope_id: None,
                    of_type: Some(of_type.clone()),
                });
            }
        }
        Constraint::OneOf(cons) => {
            // The first reference-shaped variant interprets the
            // expression; reporting under every variant would
            // duplicate origins.
            for sub in cons {
                if expr_matches_reference(sub, expr) {
                    collect_expr_origins_inner(sub, expr, emit);
                    break;
                }
            }
        }
        Constraint::List(elem) | Constraint::Set(elem) => {
            if let ExprKind::Tuple(items) = &expr.kind {
                for item in items {
                    collect_expr_origins_inner(elem, item, emit);
                }
            }
        }
        Constraint::Tuple(elems) => {
            if let ExprKind::Tuple(items) = &expr.kind {
                for (item, elem) in items.iter().zip(elems) {
                    collect_expr_origins_inner(elem, item, emit);
                }
            }
        }
        Constraint::Map(elem) => {
            if let ExprKind::Object(items) = &expr.kind {
                for item in items {
                    if let Some(value) = &item.value {
                        collect_expr_origins_inner(elem, value, emit);
                    }
                }
            }
        }
        Constraint::Object(obj) => {
            if let ExprKind::Object(items) = &expr.kind {
                for item in items {
                    if let (Some(field), Some(value)) =
                        (obj.attributes.get(&item.key), item.value.as_ref())
                    {
                        collect_expr_origins_inner(&field.constraint, value, emit);
                    }
                }
            }
        }
        Constraint::LiteralType(_)
        | Constraint::LiteralValue(_)
        | Constraint::Keyword { .. }
        | Constraint::TypeDeclaration => {}
    }
}

/// Whether a constraint could interpret this expression as a reference.
fn expr_matches_reference(constraint: &Constraint, expr: &Expression) -> bool {
    match constraint {
        Constraint::Reference(_) | Constraint::AnyExpression { .. } => {
            address_of_expr(expr).is_some()
        }
        Constraint::List(_)
        | Constraint::Set(_)
        | Constraint::Tuple(_)
        | Constraint::Map(_)
        | Constraint::Object(_) => matches!(
            &expr.kind,
            ExprKind::Tuple(_) | ExprKind::Object(_)
        ),
        _ => false,
    }
}
