//! Shared fixtures for decoder integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;

use lethe_decoder::{Decoder, PathContext, ReferenceIndex};
use lethe_schema::{
    AttributeSchema, BlockSchema, BodySchema, Constraint, DependencyKeys, LabelSchema, SchemaKey,
};
use lethe_syntax::{parse, File, FileBody, Pos, Range, ValueType};

/// Build a decoder over parsed files and an optional root schema.
pub fn decoder_for(schema: Option<BodySchema>, files: &[(&str, &str)]) -> Decoder {
    decoder_with_index(schema, files, ReferenceIndex::default())
}

pub fn decoder_with_index(
    schema: Option<BodySchema>,
    files: &[(&str, &str)],
    reference_index: ReferenceIndex,
) -> Decoder {
    let mut ctx = PathContext::new();
    ctx.root_schema = schema;
    ctx.reference_index = reference_index;
    for (filename, source) in files {
        let (file, _errors) = parse(filename, source);
        ctx.add_file(file);
    }
    Decoder::new(ctx)
}

/// A decoder holding one non-native file.
pub fn decoder_for_file_body(schema: Option<BodySchema>, filename: &str, body: FileBody) -> Decoder {
    let mut ctx = PathContext::new();
    ctx.root_schema = schema;
    ctx.files.insert(
        filename.to_string(),
        File {
            filename: filename.to_string(),
            source: String::new(),
            body,
        },
    );
    Decoder::new(ctx)
}

/// The position of (1-indexed) line/column in `source`.
pub fn pos(source: &str, line: u32, column: u32) -> Pos {
    let mut cur_line = 1;
    let mut cur_column = 1;
    let mut byte = 0u32;
    for c in source.chars() {
        if cur_line == line && cur_column == column {
            break;
        }
        byte += c.len_utf8() as u32;
        if c == '\n' {
            cur_line += 1;
            cur_column = 1;
        } else {
            cur_column += 1;
        }
    }
    assert!(
        cur_line == line && cur_column == column,
        "position {line}:{column} is past the end of the source"
    );
    Pos::new(line, column, byte)
}

/// A range between two (line, column) pairs in `source`.
pub fn range(filename: &str, source: &str, start: (u32, u32), end: (u32, u32)) -> Range {
    Range::new(
        filename,
        pos(source, start.0, start.1),
        pos(source, end.0, end.1),
    )
}

fn literal(t: ValueType) -> Constraint {
    Constraint::LiteralType(t)
}

fn attr(constraint: Constraint) -> AttributeSchema {
    AttributeSchema::new(constraint)
}

fn required(mut schema: AttributeSchema) -> AttributeSchema {
    schema.required = true;
    schema
}

fn optional(mut schema: AttributeSchema) -> AttributeSchema {
    schema.optional = true;
    schema
}

fn sensitive(mut schema: AttributeSchema) -> AttributeSchema {
    schema.sensitive = true;
    schema
}

fn attributes(
    entries: impl IntoIterator<Item = (&'static str, AttributeSchema)>,
) -> BTreeMap<String, AttributeSchema> {
    entries
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect()
}

/// The shared `service` fixture: a block with a completable dep-key
/// `kind` label, a static body with `replicas`, and three dependent
/// bodies keyed on the kind.
pub fn service_schema() -> BodySchema {
    let mut dependent_body = BTreeMap::new();
    dependent_body.insert(
        SchemaKey::new(DependencyKeys::for_label(0, "postgres_database")),
        BodySchema {
            attributes: attributes([
                ("one", required(attr(literal(ValueType::String)))),
                ("two", optional(attr(literal(ValueType::Number)))),
                ("three", optional(attr(literal(ValueType::Bool)))),
            ]),
            ..Default::default()
        },
    );
    dependent_body.insert(
        SchemaKey::new(DependencyKeys::for_label(0, "redis_cache")),
        BodySchema {
            attributes: attributes([
                ("four", attr(literal(ValueType::Number))),
                ("five", attr(literal(ValueType::Dynamic))),
            ]),
            ..Default::default()
        },
    );
    dependent_body.insert(
        SchemaKey::new(DependencyKeys::for_label(0, "secret_vault")),
        BodySchema {
            attributes: attributes([
                ("six", sensitive(attr(literal(ValueType::Number)))),
                (
                    "seven",
                    required(sensitive(attr(literal(ValueType::Number)))),
                ),
            ]),
            ..Default::default()
        },
    );

    let service = BlockSchema {
        labels: vec![LabelSchema::dep_key("kind"), LabelSchema::new("name")],
        body: Some(BodySchema {
            attributes: attributes([("replicas", attr(literal(ValueType::Number)))]),
            ..Default::default()
        }),
        dependent_body,
        ..Default::default()
    };

    let mut blocks = BTreeMap::new();
    blocks.insert("service".to_string(), service);
    BodySchema {
        blocks,
        ..Default::default()
    }
}

/// A `service` schema with plain (non-completable) labels and a
/// `replicas` attribute; the minimal block fixture.
pub fn plain_service_schema() -> BodySchema {
    let service = BlockSchema {
        labels: vec![LabelSchema::new("kind"), LabelSchema::new("name")],
        body: Some(BodySchema {
            attributes: attributes([
                ("replicas", optional(attr(literal(ValueType::Number)))),
                ("address", optional(attr(literal(ValueType::String)))),
            ]),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut blocks = BTreeMap::new();
    blocks.insert("service".to_string(), service);
    BodySchema {
        blocks,
        ..Default::default()
    }
}
