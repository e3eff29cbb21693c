//! Content model matching through the public API

use pretty_assertions::assert_eq;

use xmlschema_typed::validators::{
    match_content, ContentMatch, ContentModelViolation, ContentTypeLabel, ElementId, ModelGroup,
    Occurs, Particle,
};
use xmlschema_typed::{ElementDeclaration, Limits, NativeType, QName, SchemaBuilder, SchemaCache};

struct Model {
    cache: SchemaCache,
    a: ElementId,
    b: ElementId,
}

fn model() -> Model {
    let mut builder = SchemaBuilder::new();
    let string = builder.native(NativeType::String);
    let a = builder
        .add_element(ElementDeclaration::local(QName::local("a"), string, None))
        .unwrap();
    let b = builder
        .add_element(ElementDeclaration::local(QName::local("b"), string, None))
        .unwrap();
    Model {
        cache: builder.lock().unwrap(),
        a,
        b,
    }
}

fn run(m: &Model, particle: &Particle, children: &[&str]) -> ContentMatch {
    let children: Vec<QName> = children.iter().map(|c| QName::local(*c)).collect();
    match_content(
        &m.cache,
        particle,
        &children,
        &QName::local("parent"),
        ContentTypeLabel::ElementOnly,
        &Limits::default(),
    )
    .unwrap()
}

#[test]
fn test_sequence_with_optional_repetition() {
    let m = model();
    let particle = ModelGroup::sequence(vec![
        Particle::element(m.a, Occurs::once()),
        Particle::element(m.b, Occurs::zero_or_more()),
    ])
    .into_particle();

    for accepted in [&["a"][..], &["a", "b"], &["a", "b", "b"]] {
        assert!(run(&m, &particle, accepted).is_accepted(), "{:?}", accepted);
    }

    for incomplete in [&["b"][..], &[]] {
        match run(&m, &particle, incomplete) {
            ContentMatch::Reject(ContentModelViolation::IncompleteContent { expected, .. }) => {
                assert_eq!(expected, vec!["a".to_string()])
            }
            other => panic!("{:?}: unexpected {:?}", incomplete, other),
        }
    }

    match run(&m, &particle, &["a", "c"]) {
        ContentMatch::Reject(ContentModelViolation::UnexpectedChild { child, .. }) => {
            assert_eq!(child, QName::local("c"))
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_all_group_ignores_order() {
    let m = model();
    let particle = ModelGroup::all(vec![
        Particle::element(m.a, Occurs::once()),
        Particle::element(m.b, Occurs::once()),
    ])
    .into_particle();

    assert!(run(&m, &particle, &["b", "a"]).is_accepted());
    match run(&m, &particle, &["a"]) {
        ContentMatch::Reject(ContentModelViolation::IncompleteContent { expected, found, .. }) => {
            assert_eq!(expected, vec!["b".to_string()]);
            assert_eq!(found, None);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_all_group_limits_are_checked_on_lock() {
    let mut builder = SchemaBuilder::new();
    let string = builder.native(NativeType::String);
    let a = builder
        .add_element(ElementDeclaration::local(QName::local("a"), string, None))
        .unwrap();
    let nested = ModelGroup::sequence(vec![ModelGroup::all(vec![Particle::element(a, Occurs::once())])
        .into_particle()])
    .into_particle();
    builder
        .add_complex_type(
            xmlschema_typed::ComplexType::builder(Some(QName::local("bad")))
                .element_only(nested)
                .build(),
        )
        .unwrap();
    let err = builder.lock().unwrap_err();
    assert!(err.to_string().contains("cos-all-limited"), "{}", err);
}
