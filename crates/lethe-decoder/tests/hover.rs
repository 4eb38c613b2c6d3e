//! Hover scenarios against the decoder façade.

mod common;

use indoc::indoc;

use common::{decoder_for, pos, range, service_schema};
use lethe_decoder::{ErrorKind, HoverData, RequestContext};
use lethe_syntax::Pos;

const FILENAME: &str = "main.lth";

const SERVICES: &str = indoc! {r#"
    service "postgres_database" "primary" {
      one = "alpha"
      replicas = 3
    }
"#};

fn req() -> RequestContext {
    RequestContext::new()
}

#[test]
fn no_schema_error() {
    let decoder = decoder_for(None, &[(FILENAME, SERVICES)]);
    let err = decoder.hover_at(&req(), FILENAME, Pos::INITIAL).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoSchema);
}

#[test]
fn attribute_name_shows_detail() {
    let decoder = decoder_for(Some(service_schema()), &[(FILENAME, SERVICES)]);
    let hover = decoder
        .hover_at(&req(), FILENAME, pos(SERVICES, 2, 4))
        .unwrap()
        .expect("hover data");
    assert_eq!(
        hover,
        HoverData {
            content: "**one** _required, string_".to_string(),
            range: range(FILENAME, SERVICES, (2, 3), (2, 16)),
        }
    );
}

#[test]
fn expression_shows_constraint_type() {
    let decoder = decoder_for(Some(service_schema()), &[(FILENAME, SERVICES)]);
    // inside the string literal "alpha"
    let hover = decoder
        .hover_at(&req(), FILENAME, pos(SERVICES, 2, 10))
        .unwrap()
        .expect("hover data");
    assert_eq!(hover.content, "_string_");
    assert_eq!(hover.range, range(FILENAME, SERVICES, (2, 9), (2, 16)));
}

#[test]
fn block_type_shows_block_hover() {
    let decoder = decoder_for(Some(service_schema()), &[(FILENAME, SERVICES)]);
    let hover = decoder
        .hover_at(&req(), FILENAME, pos(SERVICES, 1, 3))
        .unwrap()
        .expect("hover data");
    assert_eq!(hover.content, "**service** _Block_");
    assert_eq!(hover.range, range(FILENAME, SERVICES, (1, 1), (1, 8)));
}

#[test]
fn label_shows_name_from_schema() {
    let decoder = decoder_for(Some(service_schema()), &[(FILENAME, SERVICES)]);
    let hover = decoder
        .hover_at(&req(), FILENAME, pos(SERVICES, 1, 12))
        .unwrap()
        .expect("hover data");
    assert_eq!(hover.content, "\"postgres_database\" (kind)");
    assert_eq!(hover.range, range(FILENAME, SERVICES, (1, 9), (1, 28)));
}

#[test]
fn braces_are_not_hoverable() {
    let decoder = decoder_for(Some(service_schema()), &[(FILENAME, SERVICES)]);
    // the opening brace at the end of the header line
    let err = decoder
        .hover_at(&req(), FILENAME, pos(SERVICES, 1, 39))
        .unwrap_err();
    match err.kind {
        ErrorKind::Positional { msg, .. } => {
            assert!(msg.contains("position outside of \"service\" body"));
        }
        other => panic!("expected positional error, got {other:?}"),
    }
}

#[test]
fn whitespace_has_no_hover() {
    let source = "service \"postgres_database\" \"primary\" {\n\n}\n";
    let decoder = decoder_for(Some(service_schema()), &[(FILENAME, source)]);
    let hover = decoder
        .hover_at(&req(), FILENAME, pos(source, 2, 1))
        .unwrap();
    assert_eq!(hover, None);
}

#[test]
fn unknown_block_type_error() {
    let source = "customblock \"x\" {\n\n}\n";
    let decoder = decoder_for(Some(service_schema()), &[(FILENAME, source)]);
    let err = decoder
        .hover_at(&req(), FILENAME, pos(source, 2, 1))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownBlockType { .. }));
}

#[test]
fn deprecated_attribute_mentions_it() {
    let mut schema = service_schema();
    {
        let service = schema.blocks.get_mut("service").unwrap();
        let body = service.body.as_mut().unwrap();
        let replicas = body.attributes.get_mut("replicas").unwrap();
        replicas.deprecated = true;
        replicas.description = Some("Use `instances` instead.".to_string());
    }
    let decoder = decoder_for(Some(schema), &[(FILENAME, SERVICES)]);
    let hover = decoder
        .hover_at(&req(), FILENAME, pos(SERVICES, 3, 4))
        .unwrap()
        .expect("hover data");
    assert_eq!(
        hover.content,
        "**replicas** _deprecated, number_\n\nUse `instances` instead."
    );
}
