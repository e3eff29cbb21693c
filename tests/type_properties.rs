//! Property tests over the native type lattice, the facet engine and atoms
//!
//! Covers integer range checks through the derivation chain, whitespace
//! normalization, list length units, and the foreign-atom overlay.

use once_cell::sync::Lazy;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use xmlschema_typed::validators::exceptions::FacetViolationKind;
use xmlschema_typed::validators::{Uom, WhiteSpace};
use xmlschema_typed::{Atom, ConstraintViolation, Facet, NativeType, QName, SchemaBuilder, SchemaCache};

static BUILTINS: Lazy<SchemaCache> = Lazy::new(|| SchemaBuilder::new().lock().unwrap());

/// Display name reported by a violation of a simple value
fn violated_type(violation: &ConstraintViolation) -> Option<&str> {
    match violation {
        ConstraintViolation::Facet(v) => Some(&v.type_name),
        ConstraintViolation::LexicalSpace(v) => Some(&v.type_name),
        _ => None,
    }
}

fn native_atom() -> impl Strategy<Value = Atom> {
    prop_oneof![
        any::<i64>().prop_map(Atom::integer),
        any::<i32>().prop_map(Atom::int),
        any::<u8>().prop_map(Atom::unsigned_byte),
        any::<bool>().prop_map(Atom::boolean),
        prop::num::f64::NORMAL.prop_map(Atom::double),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Atom::string),
        "[a-z]{0,8}".prop_map(Atom::untyped),
    ]
}

proptest! {
    #[test]
    fn unsigned_byte_accepts_its_range(v in 0i64..=255) {
        let ty = BUILTINS.native(NativeType::UnsignedByte);
        let atoms = BUILTINS.validate_lexical(&v.to_string(), ty).unwrap();
        prop_assert_eq!(atoms.len(), 1);
        prop_assert_eq!(atoms[0].as_i64(), Some(v));
        prop_assert_eq!(atoms[0].native_type(), NativeType::UnsignedByte);
    }

    #[test]
    fn unsigned_byte_rejects_outside_its_range(v in prop_oneof![i64::MIN..0i64, 256i64..=i64::MAX]) {
        let ty = BUILTINS.native(NativeType::UnsignedByte);
        let err = BUILTINS.validate_lexical(&v.to_string(), ty).unwrap_err();
        let violation = err.violation().expect("a violation");
        prop_assert_eq!(violated_type(violation), Some("xs:unsignedByte"));
    }

    #[test]
    fn collapse_is_idempotent(s in "[ \t\r\na-z]{0,40}") {
        let once = WhiteSpace::Collapse.normalize(&s);
        prop_assert_eq!(WhiteSpace::Collapse.normalize(&once), once.clone());
        prop_assert!(!once.starts_with(' ') && !once.ends_with(' '));
        prop_assert!(!once.contains("  "));
    }

    #[test]
    fn up_cast_strips_any_overlay(atom in native_atom(), local in "[a-z]{1,8}") {
        let foreign = Atom::make_foreign(QName::namespaced("urn:t", local), atom.clone());
        prop_assert!(foreign.is_foreign());
        prop_assert_eq!(foreign.native_type(), atom.native_type());
        prop_assert_eq!(foreign.up_cast(), atom);
    }
}

#[test]
fn test_unsigned_byte_boundaries() {
    let ty = BUILTINS.native(NativeType::UnsignedByte);
    for lexical in ["0", "255", "+7", " 12 "] {
        assert!(BUILTINS.validate_lexical(lexical, ty).is_ok(), "{}", lexical);
    }
    for lexical in ["256", "-1", "1.5", ""] {
        assert!(BUILTINS.validate_lexical(lexical, ty).is_err(), "{}", lexical);
    }
}

#[test]
fn test_list_min_length_counts_items() {
    let mut builder = SchemaBuilder::new();
    let int = builder.native(NativeType::Int);
    let list = builder.derive_list(None, int).unwrap();
    let at_least_three = builder
        .derive_restriction(Some(QName::local("atLeastThree")), list, vec![Facet::MinLength(3)])
        .unwrap();
    let cache = builder.lock().unwrap();

    // far more than three characters, but only two items
    let err = cache.validate_lexical("100000 200000", at_least_three).unwrap_err();
    match err.violation() {
        Some(ConstraintViolation::Facet(facet)) => {
            assert_eq!(
                facet.kind,
                FacetViolationKind::MinLength {
                    min: 3,
                    actual: 2,
                    uom: Uom::ListItems,
                }
            );
            assert_eq!(facet.type_name, "atLeastThree");
        }
        other => panic!("unexpected {:?}", other),
    }

    let atoms = cache.validate_lexical("1 2 3", at_least_three).unwrap();
    assert_eq!(atoms.iter().map(|a| a.as_i64()).collect::<Vec<_>>(), vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn test_collect_all_reports_each_facet() {
    let mut builder = SchemaBuilder::new();
    let string = builder.native(NativeType::String);
    let code = builder
        .derive_restriction(
            Some(QName::local("code")),
            string,
            vec![Facet::MaxLength(3), Facet::Pattern(vec!["[A-Z]+".into()])],
        )
        .unwrap();
    let cache = builder.lock().unwrap();

    let violations = cache.validate_lexical_all("abcd", code).unwrap().unwrap_err();
    let outcomes: Vec<String> = violations.iter().map(|v| v.outcome().to_string()).collect();
    assert_eq!(outcomes, vec!["cvc-maxLength-valid.1", "cvc-pattern-valid.1"]);

    let err = cache.validate_lexical("abcd", code).unwrap_err();
    assert_eq!(err.violation().unwrap().outcome().to_string(), "cvc-maxLength-valid.1");
}

#[test]
fn test_unknown_type_is_a_precondition() {
    let err = BUILTINS.require_type(&QName::local("missing")).unwrap_err();
    assert!(matches!(err, xmlschema_typed::Error::Precondition(_)));
}

#[test]
fn test_decimal_precision_is_unbounded() {
    let decimal = BUILTINS.native(NativeType::Decimal);
    let wide = "1234567890123456789012345678901.5";
    let atoms = BUILTINS.validate_lexical(wide, decimal).unwrap();
    assert_eq!(atoms[0].c14n_form(), wide);

    let mut builder = SchemaBuilder::new();
    let base = builder.native(NativeType::Decimal);
    let thirty = builder
        .derive_restriction(Some(QName::local("thirtyPlaces")), base, vec![Facet::FractionDigits(30)])
        .unwrap();
    let cache = builder.lock().unwrap();

    let long_fraction = "0.12345678901234567890123456789012345";
    let err = cache.validate_lexical(long_fraction, thirty).unwrap_err();
    match err.violation() {
        Some(ConstraintViolation::Facet(facet)) => {
            assert!(matches!(
                facet.kind,
                FacetViolationKind::Digits { limit: 30, actual: 35, .. }
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
    let kept = cache.validate_lexical("0.123456789012345678901234567890", thirty).unwrap();
    assert_eq!(kept[0].c14n_form(), "0.12345678901234567890123456789");
}
