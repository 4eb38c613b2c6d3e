//! Reference origin/target walking and index queries.

mod common;

use std::collections::BTreeMap;

use indoc::indoc;

use common::{decoder_for, decoder_with_index, pos, range};
use lethe_decoder::{
    CandidateKind, ErrorKind, ReferenceIndex, ReferenceOrigin, ReferenceTarget, RequestContext,
};
use lethe_schema::{
    Address, AddressTemplate, AttributeSchema, BlockSchema, BodySchema, Constraint, LabelSchema,
    ReferenceConstraint, TemplateStep,
};
use lethe_syntax::ValueType;

const FILENAME: &str = "main.lth";

const SERVICES: &str = indoc! {r#"
    service "db" {
      export = "x"
      endpoint = service.web
    }

    service "web" {
    }
"#};

fn req() -> RequestContext {
    RequestContext::new()
}

/// A `service` block whose blocks are addressable as `service.<name>`
/// and whose `export` attribute is addressable as `exports.export`.
fn referencing_schema() -> BodySchema {
    let mut attributes = BTreeMap::new();
    attributes.insert(
        "endpoint".to_string(),
        AttributeSchema::new(Constraint::Reference(ReferenceConstraint {
            of_scope_id: Some("service".to_string()),
            of_type: None,
            name: None,
        })),
    );
    attributes.insert("export".to_string(), {
        let mut schema = AttributeSchema::new(Constraint::LiteralType(ValueType::String));
        schema.address = Some(AddressTemplate {
            steps: vec![
                TemplateStep::Static("exports".to_string()),
                TemplateStep::AttrName,
            ],
            scope_id: Some("exports".to_string()),
        });
        schema
    });

    let mut blocks = BTreeMap::new();
    blocks.insert(
        "service".to_string(),
        BlockSchema {
            labels: vec![LabelSchema::new("name")],
            body: Some(BodySchema {
                attributes,
                ..Default::default()
            }),
            address: Some(AddressTemplate {
                steps: vec![
                    TemplateStep::Static("service".to_string()),
                    TemplateStep::LabelIndex(0),
                ],
                scope_id: Some("service".to_string()),
            }),
            ..Default::default()
        },
    );
    BodySchema {
        blocks,
        ..Default::default()
    }
}

#[test]
fn no_schema_error() {
    let decoder = decoder_for(None, &[(FILENAME, SERVICES)]);
    let err = decoder
        .reference_origins(&req(), FILENAME, false)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoSchema);
    let err = decoder.reference_targets(&req(), FILENAME).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoSchema);
}

#[test]
fn origins_from_reference_expressions() {
    let decoder = decoder_for(Some(referencing_schema()), &[(FILENAME, SERVICES)]);
    let origins = decoder.reference_origins(&req(), FILENAME, false).unwrap();
    assert_eq!(
        origins,
        vec![ReferenceOrigin {
            range: range(FILENAME, SERVICES, (3, 14), (3, 25)),
            address: Address::root("service").attr("web"),
            of_scope_id: Some("service".to_string()),
            of_type: None,
        }]
    );
}

#[test]
fn targets_from_address_templates() {
    let decoder = decoder_for(Some(referencing_schema()), &[(FILENAME, SERVICES)]);
    let targets = decoder.reference_targets(&req(), FILENAME).unwrap();
    let addresses: Vec<String> = targets.iter().map(|t| t.address.to_string()).collect();
    assert_eq!(
        addresses,
        vec!["exports.export", "service.db", "service.web"]
    );

    let export = &targets[0];
    assert_eq!(export.scope_id.as_deref(), Some("exports"));
    assert_eq!(export.of_type, Some(ValueType::String));
    assert_eq!(
        export.range,
        Some(range(FILENAME, SERVICES, (2, 3), (2, 15)))
    );

    let db = &targets[1];
    assert_eq!(db.scope_id.as_deref(), Some("service"));
    assert_eq!(db.name.as_deref(), Some("service"));
}

#[test]
fn reference_completion_uses_the_index() {
    let index = ReferenceIndex {
        targets: vec![
            ReferenceTarget {
                address: Address::root("service").attr("db"),
                scope_id: Some("service".to_string()),
                of_type: None,
                range: None,
                name: None,
            },
            ReferenceTarget {
                address: Address::root("service").attr("web"),
                scope_id: Some("service".to_string()),
                of_type: None,
                range: None,
                name: None,
            },
            ReferenceTarget {
                address: Address::root("other").attr("thing"),
                scope_id: Some("other".to_string()),
                of_type: None,
                range: None,
                name: None,
            },
        ],
        origins: Vec::new(),
    };
    let decoder = decoder_with_index(Some(referencing_schema()), &[(FILENAME, SERVICES)], index);

    // inside the existing traversal: replace it wholesale
    let candidates = decoder
        .completion_at(&req(), FILENAME, pos(SERVICES, 3, 16))
        .unwrap();
    let labels: Vec<&str> = candidates.list.iter().map(|c| c.label.as_str()).collect();
    // scope filtering drops other.thing
    assert_eq!(labels, vec!["service.db", "service.web"]);
    for candidate in &candidates.list {
        assert_eq!(candidate.kind, CandidateKind::Traversal);
        assert_eq!(
            candidate.text_edit.range,
            range(FILENAME, SERVICES, (3, 14), (3, 25))
        );
    }
}

#[test]
fn index_queries() {
    let db = ReferenceTarget {
        address: Address::root("service").attr("db"),
        scope_id: Some("service".to_string()),
        of_type: None,
        range: None,
        name: None,
    };
    let index = ReferenceIndex {
        targets: vec![db.clone()],
        origins: vec![
            ReferenceOrigin {
                range: range(FILENAME, SERVICES, (3, 14), (3, 25)),
                address: Address::root("service").attr("db"),
                of_scope_id: None,
                of_type: None,
            },
            ReferenceOrigin {
                range: range(FILENAME, SERVICES, (2, 3), (2, 15)),
                address: Address::root("service").attr("web"),
                of_scope_id: None,
                of_type: None,
            },
        ],
    };
    assert_eq!(
        index.target_at(&Address::root("service").attr("db")),
        Some(&db)
    );
    assert_eq!(index.target_at(&Address::root("service")), None);
    assert_eq!(index.origins_targeting(&db).len(), 1);
}

#[test]
fn self_references_are_filtered_by_default() {
    let source = "self_ref = config.self_ref\n";
    let mut attributes = BTreeMap::new();
    attributes.insert("self_ref".to_string(), {
        let mut schema = AttributeSchema::new(Constraint::AnyExpression {
            of_type: ValueType::Dynamic,
        });
        schema.address = Some(AddressTemplate {
            steps: vec![
                TemplateStep::Static("config".to_string()),
                TemplateStep::AttrName,
            ],
            scope_id: None,
        });
        schema
    });
    let schema = BodySchema {
        attributes,
        ..Default::default()
    };
    let decoder = decoder_for(Some(schema), &[(FILENAME, source)]);

    let origins = decoder.reference_origins(&req(), FILENAME, false).unwrap();
    assert!(origins.is_empty());

    let origins = decoder.reference_origins(&req(), FILENAME, true).unwrap();
    assert_eq!(origins.len(), 1);
    assert_eq!(
        origins[0].address,
        Address::root("config").attr("self_ref")
    );
}

#[test]
fn reference_walking_is_best_effort() {
    // An uninterpretable expression under a reference constraint is
    // skipped, not fatal.
    let source = "service \"db\" {\n  endpoint = 1 + 2\n  export = \"x\"\n}\n";
    let decoder = decoder_for(Some(referencing_schema()), &[(FILENAME, source)]);
    let origins = decoder.reference_origins(&req(), FILENAME, false).unwrap();
    assert!(origins.is_empty());
    // targets still come through
    let targets = decoder.reference_targets(&req(), FILENAME).unwrap();
    assert!(!targets.is_empty());
}

#[test]
fn never_panics_across_positions() {
    let decoder = decoder_for(Some(referencing_schema()), &[(FILENAME, SERVICES)]);
    for byte in 0..=SERVICES.len() as u32 {
        let position = lethe_syntax::pos_at_byte(SERVICES, byte);
        let _ = decoder.completion_at(&req(), FILENAME, position);
        let _ = decoder.hover_at(&req(), FILENAME, position);
    }
}
