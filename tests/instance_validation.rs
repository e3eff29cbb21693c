//! End-to-end instance validation over parsed documents

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;

use xmlschema_typed::documents::Document;
use xmlschema_typed::validators::{
    AttributeUse, ModelGroup, Occurs, Particle, SharedCollector,
};
use xmlschema_typed::{
    ComplexType, ElementDeclaration, Emulation, Error, Facet, InstanceValidator, Limits,
    NativeType, QName, SchemaBuilder, SchemaCache, ValidationOptions,
};

fn catalog() -> SchemaCache {
    let mut b = SchemaBuilder::new();
    let string = b.native(NativeType::String);
    let int = b.native(NativeType::Int);
    let date = b.native(NativeType::Date);

    let sizes = b.derive_list(Some(QName::local("sizes")), int).unwrap();
    let size_or_label = b
        .derive_union(Some(QName::local("sizeOrLabel")), vec![int, string])
        .unwrap();
    let isbn = b
        .derive_restriction(
            Some(QName::local("isbn")),
            string,
            vec![Facet::Pattern(vec!["[0-9]{13}".into()])],
        )
        .unwrap();

    let title = b
        .add_element(ElementDeclaration::local(QName::local("title"), string, None))
        .unwrap();
    let published = b
        .add_element(ElementDeclaration::local(QName::local("published"), date, None))
        .unwrap();
    let formats = b
        .add_element(ElementDeclaration::local(QName::local("formats"), sizes, None))
        .unwrap();
    let size = b
        .add_element(ElementDeclaration::local(QName::local("size"), size_or_label, None))
        .unwrap();
    let book_type = b
        .add_complex_type(
            ComplexType::builder(Some(QName::local("bookType")))
                .element_only(
                    ModelGroup::all(vec![
                        Particle::element(title, Occurs::once()),
                        Particle::element(published, Occurs::optional()),
                        Particle::element(formats, Occurs::optional()),
                        Particle::element(size, Occurs::optional()),
                    ])
                    .into_particle(),
                )
                .attribute(AttributeUse::required(QName::local("isbn"), isbn))
                .build(),
        )
        .unwrap();
    let book = b
        .add_element(ElementDeclaration::new(QName::local("book"), book_type))
        .unwrap();
    let catalog_type = b
        .add_complex_type(
            ComplexType::builder(Some(QName::local("catalogType")))
                .element_only(
                    ModelGroup::sequence(vec![Particle::element(book, Occurs::zero_or_more())])
                        .into_particle(),
                )
                .build(),
        )
        .unwrap();
    b.add_element(ElementDeclaration::new(QName::local("catalog"), catalog_type))
        .unwrap();
    b.lock().unwrap()
}

const VALID_BOOK: &str = r#"<book isbn="9780262510875">
    <published>1996-07-25</published>
    <title>Structure and Interpretation</title>
    <formats>1 2 3</formats>
    <size>large</size>
</book>"#;

#[test]
fn test_typed_tree_from_parsed_document() {
    let cache = catalog();
    let doc = Document::from_string(VALID_BOOK).unwrap();
    let root = doc.root_node().unwrap();
    let typed = InstanceValidator::new(&cache).validate_fail_fast(&root).unwrap();

    assert_eq!(typed.type_name, "bookType");
    assert_eq!(typed.children.len(), 4);

    let formats = typed.child("formats").unwrap();
    let items: Vec<Option<i64>> = formats.value.as_ref().unwrap().iter().map(|a| a.as_i64()).collect();
    assert_eq!(items, vec![Some(1), Some(2), Some(3)]);
    assert_eq!(formats.text(Emulation::C14N).as_deref(), Some("1 2 3"));

    let size = typed.child("size").unwrap();
    assert_eq!(size.value.as_ref().unwrap()[0].native_type(), NativeType::String);

    let published = typed.child("published").unwrap();
    assert_eq!(published.value.as_ref().unwrap()[0].native_type(), NativeType::Date);
}

#[test]
fn test_union_prefers_the_first_matching_member() {
    let cache = catalog();
    let doc = Document::from_string(r#"<book isbn="9780262510875"><title>t</title><size>12</size></book>"#).unwrap();
    let root = doc.root_node().unwrap();
    let typed = InstanceValidator::new(&cache).validate_fail_fast(&root).unwrap();
    let size = typed.child("size").unwrap().value.clone().unwrap();
    assert_eq!(size[0].native_type(), NativeType::Int);
    assert_eq!(size[0].as_i64(), Some(12));
}

#[test]
fn test_collected_diagnostics_in_document_order() {
    let cache = catalog();
    let xml = r#"<catalog>
        <book isbn="123"><title>a</title><published>yesterday</published></book>
        <book isbn="9780262510875"><formats>1 x</formats></book>
    </catalog>"#;
    let doc = Document::from_string(xml).unwrap();
    let root = doc.root_node().unwrap();
    let report = InstanceValidator::new(&cache).validate_collect(&root).unwrap();

    assert!(!report.is_valid());
    let sections: Vec<String> = report
        .diagnostics
        .iter()
        .map(|d| format!("{}.{}", d.section, d.part))
        .collect();
    assert_eq!(sections[0], "cvc-pattern-valid.1");
    assert!(report.violations[1].is_lexical(), "{:?}", report.violations[1]);
    assert!(
        sections.iter().any(|s| s.starts_with("cvc-complex-type.2.4")),
        "{:?}",
        sections
    );
}

#[test]
fn test_report_serializes_to_json() {
    let cache = catalog();
    let doc = Document::from_string(r#"<book><title>t</title></book>"#).unwrap();
    let root = doc.root_node().unwrap();
    let report = InstanceValidator::new(&cache).validate_collect(&root).unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["valid"], serde_json::json!(false));
    assert_eq!(json["truncated"], serde_json::json!(false));
    assert_eq!(json["diagnostics"].as_array().unwrap().len(), 1);
    assert_eq!(json["diagnostics"][0]["section"], "cvc-complex-type");
    assert_eq!(json["diagnostics"][0]["part"], "4");
    assert!(json.get("root").is_none());
}

#[test]
fn test_one_cache_serves_many_threads() {
    let cache = Arc::new(catalog());
    let documents = [
        (VALID_BOOK, true),
        (r#"<book isbn="1"><title>t</title></book>"#, false),
        (r#"<catalog><book isbn="9780262510875"><title>t</title></book></catalog>"#, true),
        (r#"<catalog><title>t</title></catalog>"#, false),
    ];

    let handles: Vec<_> = documents
        .iter()
        .map(|&(xml, expected)| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let doc = Document::from_string(xml).unwrap();
                let root = doc.root_node().unwrap();
                let valid = InstanceValidator::new(&cache).is_valid(&root).unwrap();
                (valid, expected)
            })
        })
        .collect();

    for handle in handles {
        let (valid, expected) = handle.join().unwrap();
        assert_eq!(valid, expected);
    }
}

#[test]
fn test_shared_collector_gathers_from_parallel_runs() {
    let cache = catalog();
    let collector = SharedCollector::new();
    let books = [
        r#"<book isbn="1"><title>a</title></book>"#,
        r#"<book isbn="2"><title>b</title></book>"#,
        VALID_BOOK,
    ];

    thread::scope(|scope| {
        for xml in books {
            let mut handler = collector.clone();
            let cache = &cache;
            scope.spawn(move || {
                let doc = Document::from_string(xml).unwrap();
                let root = doc.root_node().unwrap();
                InstanceValidator::new(cache).validate(&root, &mut handler).unwrap();
            });
        }
    });

    let violations = collector.violations();
    assert_eq!(violations.len(), 2);
    assert!(violations
        .iter()
        .all(|v| v.outcome().to_string() == "cvc-pattern-valid.1"));
}

#[test]
fn test_limits_from_json() {
    let limits = Limits::from_json(r#"{"max_errors": 1}"#).unwrap();
    assert_eq!(limits.max_errors, Some(1));
    assert_eq!(limits.max_depth, Limits::default().max_depth);

    let cache = catalog();
    let doc = Document::from_string(r#"<book isbn="1"><published>x</published></book>"#).unwrap();
    let root = doc.root_node().unwrap();
    let report = InstanceValidator::new(&cache)
        .with_options(ValidationOptions::new().with_limits(limits))
        .validate_collect(&root)
        .unwrap();
    assert!(report.truncated);
    assert_eq!(report.diagnostics.len(), 1);
}

#[test]
fn test_processing_instructions_and_comments_are_ignored() {
    let cache = catalog();
    let xml = r#"<?xml version="1.0"?>
<!-- a catalog -->
<catalog><!-- empty --><?pi data?></catalog>"#;
    let doc = Document::from_string(xml).unwrap();
    let root = doc.root_node().unwrap();
    assert!(InstanceValidator::new(&cache).is_valid(&root).unwrap());
}

#[test]
fn test_malformed_xml_is_an_error() {
    let err = Document::from_string("<catalog><book></catalog>").unwrap_err();
    assert!(matches!(err, Error::Xml(_)), "{:?}", err);
}
