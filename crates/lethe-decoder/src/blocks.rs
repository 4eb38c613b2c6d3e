//! Block resolution: selecting the contextually-active body of a block
//! and completing label values.
//!
//! A block schema can carry dependent bodies keyed on label values and
//! attribute values. The effective body of a concrete block is the
//! static body with the best-matching dependent body merged over it.

use std::collections::BTreeSet;

use lethe_schema::{BlockSchema, BodySchema, DependencyKeys, DependentValue};
use lethe_syntax::{Block, BlockLabel};

use crate::candidates::{Candidate, Candidates};
use crate::reference::address_of_expr;

/// The merged view of a block's static and dependent body schemas.
/// Immutable: resolving never mutates the schema it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveBody {
    pub schema: BodySchema,
    /// Attribute names contributed (or shadowed) by the dependent
    /// body, for the `dependent` semantic-token modifier.
    pub dependent_attrs: BTreeSet<String>,
}

/// Compute the effective body for `block`.
///
/// Returns `None` when the block has neither a static body nor a
/// matching dependent body; such a block accepts no attributes or
/// nested blocks at all.
pub fn resolve_effective_body(block: &Block, schema: &BlockSchema) -> Option<EffectiveBody> {
    let dependent = matching_dependent_body(block, schema);
    match (schema.body.as_ref(), dependent) {
        (None, None) => None,
        (Some(stat), None) => Some(EffectiveBody {
            schema: stat.clone(),
            dependent_attrs: BTreeSet::new(),
        }),
        (stat, Some(dep)) => {
            let mut merged = stat.cloned().unwrap_or_default();
            let mut dependent_attrs = BTreeSet::new();
            for (name, attr_schema) in &dep.attributes {
                // dependent wins over static on a name collision
                merged.attributes.insert(name.clone(), attr_schema.clone());
                dependent_attrs.insert(name.clone());
            }
            for (block_type, block_schema) in &dep.blocks {
                merged.blocks.insert(block_type.clone(), block_schema.clone());
            }
            if dep.any_attribute.is_some() {
                merged.any_attribute = dep.any_attribute.clone();
            }
            merged.extensions.count |= dep.extensions.count;
            Some(EffectiveBody {
                schema: merged,
                dependent_attrs,
            })
        }
    }
}

/// Pick the dependent body whose key matches `block`, preferring the
/// most specific key (highest condition count). Ties break on the
/// canonical key encoding, which the `BTreeMap` iteration order gives
/// us: the first key seen with the winning count is the
/// lexicographically smallest.
fn matching_dependent_body<'s>(block: &Block, schema: &'s BlockSchema) -> Option<&'s BodySchema> {
    let mut best: Option<(usize, &BodySchema)> = None;
    for (key, body) in &schema.dependent_body {
        // Keys that did not come from SchemaKey::new are skipped, not
        // failed: reference walking and completion should survive a
        // sloppy schema.
        let Some(keys) = key.decode() else {
            continue;
        };
        if !key_matches(block, &keys) {
            continue;
        }
        let count = keys.condition_count();
        if best.map_or(true, |(best_count, _)| count > best_count) {
            best = Some((count, body));
        }
    }
    best.map(|(_, body)| body)
}

/// Whether every condition of `keys` holds for `block`.
fn key_matches(block: &Block, keys: &DependencyKeys) -> bool {
    for label_dep in &keys.labels {
        match block.labels.get(label_dep.index) {
            Some(label) if label.value == label_dep.value => {}
            _ => return false,
        }
    }
    for attr_dep in &keys.attributes {
        // absence disqualifies
        let Some(attr) = block.body.attribute(&attr_dep.name) else {
            return false;
        };
        let Some(expr) = attr.expr.as_ref() else {
            return false;
        };
        let matched = match &attr_dep.value {
            DependentValue::Literal(value) => expr.as_literal_value().as_ref() == Some(value),
            DependentValue::Reference(address) => {
                address_of_expr(expr).as_ref() == Some(address)
            }
        };
        if !matched {
            return false;
        }
    }
    true
}

/// Candidates for a label position: the distinct dependency-key values
/// for that label index, with duplicates coalesced. Labels that are
/// not completable dependency keys get a well-formed empty list.
pub(crate) fn label_value_candidates(
    schema: &BlockSchema,
    label_index: usize,
    label: &BlockLabel,
) -> Candidates {
    let Some(label_schema) = schema.labels.get(label_index) else {
        return Candidates::none();
    };
    if !(label_schema.completable && label_schema.is_dep_key) {
        return Candidates::none();
    }

    let mut list = Vec::new();
    for key in schema.dependent_body.keys() {
        let Some(keys) = key.decode() else {
            continue;
        };
        for label_dep in keys.labels.iter().filter(|l| l.index == label_index) {
            list.push(Candidate::label_value(
                &label_dep.value,
                label.value_range.clone(),
            ));
        }
    }
    Candidates::complete(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use lethe_schema::{
        AttributeDependent, AttributeSchema, Constraint, DependencyKeys, SchemaKey,
    };
    use lethe_syntax::{parse, Value, ValueType};

    fn first_block(source: &str) -> Block {
        let (file, _) = parse("test.lth", source);
        file.native_body().unwrap().blocks[0].clone()
    }

    fn body_with_attr(name: &str) -> BodySchema {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            name.to_string(),
            AttributeSchema::new(Constraint::LiteralType(ValueType::String)),
        );
        BodySchema {
            attributes,
            ..Default::default()
        }
    }

    fn attr_condition(name: &str, value: Value) -> DependencyKeys {
        DependencyKeys {
            labels: Vec::new(),
            attributes: vec![AttributeDependent {
                name: name.to_string(),
                value: DependentValue::Literal(value),
            }],
        }
    }

    #[test]
    fn static_body_alone() {
        let block = first_block("service \"a\" {\n}\n");
        let schema = BlockSchema {
            body: Some(body_with_attr("region")),
            ..Default::default()
        };
        let effective = resolve_effective_body(&block, &schema).unwrap();
        assert!(effective.schema.attributes.contains_key("region"));
        assert!(effective.dependent_attrs.is_empty());
    }

    #[test]
    fn none_when_both_absent() {
        let block = first_block("service \"a\" {\n}\n");
        let schema = BlockSchema::default();
        assert!(resolve_effective_body(&block, &schema).is_none());
    }

    #[test]
    fn dependent_shadows_static() {
        let block = first_block("service \"db\" {\n}\n");
        let mut dependent = BTreeMap::new();
        let mut dep_body = body_with_attr("region");
        dep_body
            .attributes
            .get_mut("region")
            .unwrap()
            .constraint = Constraint::LiteralType(ValueType::Number);
        dependent.insert(SchemaKey::new(DependencyKeys::for_label(0, "db")), dep_body);
        let schema = BlockSchema {
            body: Some(body_with_attr("region")),
            dependent_body: dependent,
            ..Default::default()
        };
        let effective = resolve_effective_body(&block, &schema).unwrap();
        assert_eq!(
            effective.schema.attributes["region"].constraint,
            Constraint::LiteralType(ValueType::Number)
        );
        assert!(effective.dependent_attrs.contains("region"));
    }

    #[test]
    fn most_specific_key_wins() {
        let block = first_block("service \"db\" {\n  engine = \"postgres\"\n}\n");
        let mut dependent = BTreeMap::new();
        dependent.insert(
            SchemaKey::new(DependencyKeys::for_label(0, "db")),
            body_with_attr("generic"),
        );
        let specific = DependencyKeys {
            labels: DependencyKeys::for_label(0, "db").labels,
            attributes: vec![AttributeDependent {
                name: "engine".to_string(),
                value: DependentValue::Literal(Value::String("postgres".into())),
            }],
        };
        dependent.insert(SchemaKey::new(specific), body_with_attr("specific"));
        let schema = BlockSchema {
            dependent_body: dependent,
            ..Default::default()
        };
        let effective = resolve_effective_body(&block, &schema).unwrap();
        assert!(effective.schema.attributes.contains_key("specific"));
        assert!(!effective.schema.attributes.contains_key("generic"));
    }

    #[test]
    fn specificity_ties_break_on_encoded_key() {
        // One label condition vs one attribute condition, both
        // matching: equal specificity. The attribute-keyed encoding
        // sorts first, so it must win deterministically.
        let block = first_block("service \"db\" {\n  tier = 1\n}\n");
        let mut dependent = BTreeMap::new();
        dependent.insert(
            SchemaKey::new(DependencyKeys::for_label(0, "db")),
            body_with_attr("by_label"),
        );
        dependent.insert(
            SchemaKey::new(attr_condition("tier", Value::Number(1.0))),
            body_with_attr("by_attr"),
        );
        let schema = BlockSchema {
            dependent_body: dependent,
            ..Default::default()
        };
        let effective = resolve_effective_body(&block, &schema).unwrap();
        assert!(effective.schema.attributes.contains_key("by_attr"));
    }

    #[test]
    fn attribute_condition_absence_disqualifies() {
        let block = first_block("service \"db\" {\n}\n");
        let mut dependent = BTreeMap::new();
        dependent.insert(
            SchemaKey::new(attr_condition("tier", Value::Number(1.0))),
            body_with_attr("by_attr"),
        );
        let schema = BlockSchema {
            body: Some(body_with_attr("region")),
            dependent_body: dependent,
            ..Default::default()
        };
        let effective = resolve_effective_body(&block, &schema).unwrap();
        assert!(effective.schema.attributes.contains_key("region"));
        assert!(!effective.schema.attributes.contains_key("by_attr"));
    }

    #[test]
    fn missing_label_rejects_key() {
        let block = first_block("service {\n}\n");
        let mut dependent = BTreeMap::new();
        dependent.insert(
            SchemaKey::new(DependencyKeys::for_label(0, "db")),
            body_with_attr("by_label"),
        );
        let schema = BlockSchema {
            dependent_body: dependent,
            ..Default::default()
        };
        assert!(resolve_effective_body(&block, &schema).is_none());
    }
}
