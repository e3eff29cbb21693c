//! XSD validation outcomes
//!
//! Every failure found while validating is a [`ConstraintViolation`] value.
//! Each carries a [`ValidationOutcome`]: the section of the XML Schema
//! recommendation that was broken plus a part number. Diagnostics render as
//! `"<section>.<part>: <message>"`.

use serde::Serialize;
use std::fmt;

use crate::namespaces::QName;

use super::builtins::NativeType;
use super::complex_types::{ContentTypeLabel, DerivationMethod};
use super::facets::{FacetKind, Uom};

/// Constraint sections referenced by diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    /// cvc-datatype-valid
    CvcDatatypeValid,
    /// cvc-simple-type
    CvcSimpleType,
    /// cvc-length-valid
    CvcLengthValid,
    /// cvc-minLength-valid
    CvcMinLengthValid,
    /// cvc-maxLength-valid
    CvcMaxLengthValid,
    /// cvc-pattern-valid
    CvcPatternValid,
    /// cvc-enumeration-valid
    CvcEnumerationValid,
    /// cvc-minInclusive-valid
    CvcMinInclusiveValid,
    /// cvc-maxInclusive-valid
    CvcMaxInclusiveValid,
    /// cvc-minExclusive-valid
    CvcMinExclusiveValid,
    /// cvc-maxExclusive-valid
    CvcMaxExclusiveValid,
    /// cvc-totalDigits-valid
    CvcTotalDigitsValid,
    /// cvc-fractionDigits-valid
    CvcFractionDigitsValid,
    /// cvc-complex-type
    CvcComplexType,
    /// cvc-elt
    CvcElt,
    /// cvc-type
    CvcType,
    /// cvc-attribute
    CvcAttribute,
    /// cvc-au
    CvcAu,
    /// cvc-assess-elt
    CvcAssessElt,
    /// cos-equiv-derived-ok-rec
    CosEquivDerivedOkRec,
    /// Casting failures; the part is the XPath error code
    Cast,
    /// cos-all-limited
    SccAllGroupLimited,
    /// cos-st-restricts
    CosStRestricts,
    /// st-props-correct
    StPropsCorrect,
    /// ct-props-correct
    CtPropsCorrect,
    /// cos-applicable-facets
    CosApplicableFacets,
    /// src-resolve
    SrcResolve,
    /// sch-props-correct (duplicate global components)
    SchPropsCorrect,
    /// `<facet>-valid-restriction`
    ValidRestriction(FacetKind),
}

impl Section {
    /// Section identifier as it appears in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::CvcDatatypeValid => "cvc-datatype-valid",
            Section::CvcSimpleType => "cvc-simple-type",
            Section::CvcLengthValid => "cvc-length-valid",
            Section::CvcMinLengthValid => "cvc-minLength-valid",
            Section::CvcMaxLengthValid => "cvc-maxLength-valid",
            Section::CvcPatternValid => "cvc-pattern-valid",
            Section::CvcEnumerationValid => "cvc-enumeration-valid",
            Section::CvcMinInclusiveValid => "cvc-minInclusive-valid",
            Section::CvcMaxInclusiveValid => "cvc-maxInclusive-valid",
            Section::CvcMinExclusiveValid => "cvc-minExclusive-valid",
            Section::CvcMaxExclusiveValid => "cvc-maxExclusive-valid",
            Section::CvcTotalDigitsValid => "cvc-totalDigits-valid",
            Section::CvcFractionDigitsValid => "cvc-fractionDigits-valid",
            Section::CvcComplexType => "cvc-complex-type",
            Section::CvcElt => "cvc-elt",
            Section::CvcType => "cvc-type",
            Section::CvcAttribute => "cvc-attribute",
            Section::CvcAu => "cvc-au",
            Section::CvcAssessElt => "cvc-assess-elt",
            Section::CosEquivDerivedOkRec => "cos-equiv-derived-ok-rec",
            Section::Cast => "cast",
            Section::SccAllGroupLimited => "cos-all-limited",
            Section::CosStRestricts => "cos-st-restricts",
            Section::StPropsCorrect => "st-props-correct",
            Section::CtPropsCorrect => "ct-props-correct",
            Section::CosApplicableFacets => "cos-applicable-facets",
            Section::SrcResolve => "src-resolve",
            Section::SchPropsCorrect => "sch-props-correct",
            Section::ValidRestriction(kind) => match kind {
                FacetKind::Length => "length-valid-restriction",
                FacetKind::MinLength => "minLength-valid-restriction",
                FacetKind::MaxLength => "maxLength-valid-restriction",
                FacetKind::Pattern => "pattern-valid-restriction",
                FacetKind::Enumeration => "enumeration-valid-restriction",
                FacetKind::WhiteSpace => "whiteSpace-valid-restriction",
                FacetKind::MinInclusive => "minInclusive-valid-restriction",
                FacetKind::MaxInclusive => "maxInclusive-valid-restriction",
                FacetKind::MinExclusive => "minExclusive-valid-restriction",
                FacetKind::MaxExclusive => "maxExclusive-valid-restriction",
                FacetKind::TotalDigits => "totalDigits-valid-restriction",
                FacetKind::FractionDigits => "fractionDigits-valid-restriction",
            },
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Section {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A broken constraint: section plus part number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ValidationOutcome {
    /// Constraint section
    pub section: Section,
    /// Part number within the section (e.g. `2.4.a`)
    pub part: &'static str,
}

impl ValidationOutcome {
    /// Create an outcome
    pub const fn new(section: Section, part: &'static str) -> Self {
        Self { section, part }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.part)
    }
}

// =============================================================================
// Lexical space and facets
// =============================================================================

/// A lexical form that is not in the lexical space of its type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LexicalViolation {
    /// Display name of the simple type
    pub type_name: String,
    /// Native type the value was parsed as
    pub native: NativeType,
    /// Normalized lexical form
    pub lexical: String,
    /// Why parsing failed
    pub reason: String,
}

impl LexicalViolation {
    /// Create a lexical-space violation
    pub fn new(
        type_name: impl Into<String>,
        native: NativeType,
        lexical: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            native,
            lexical: lexical.into(),
            reason: reason.into(),
        }
    }

    /// Outcome code
    pub fn outcome(&self) -> ValidationOutcome {
        ValidationOutcome::new(Section::CvcDatatypeValid, "1.2.1")
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        format!(
            "The value '{}' is not valid for type '{}' ({}).",
            self.lexical, self.type_name, self.reason
        )
    }
}

/// Which facet rejected a value, with the observed and required quantities
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FacetViolationKind {
    /// length
    Length {
        /// Required length
        expected: usize,
        /// Observed length
        actual: usize,
        /// Unit
        uom: Uom,
    },
    /// minLength
    MinLength {
        /// Required minimum
        min: usize,
        /// Observed length
        actual: usize,
        /// Unit
        uom: Uom,
    },
    /// maxLength
    MaxLength {
        /// Allowed maximum
        max: usize,
        /// Observed length
        actual: usize,
        /// Unit
        uom: Uom,
    },
    /// pattern (one derivation step)
    Pattern {
        /// Alternatives of the failing step
        patterns: Vec<String>,
    },
    /// enumeration
    Enumeration {
        /// Permitted literals
        allowed: Vec<String>,
    },
    /// min/max inclusive/exclusive
    Range {
        /// The range facet
        facet: FacetKind,
        /// Canonical form of the bound
        bound: String,
    },
    /// totalDigits / fractionDigits
    Digits {
        /// The digit facet
        facet: FacetKind,
        /// Declared limit
        limit: u32,
        /// Observed count
        actual: u32,
    },
}

/// A value accepted into the value space but rejected by a facet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FacetViolation {
    /// What failed
    pub kind: FacetViolationKind,
    /// Display name of the simple type
    pub type_name: String,
    /// Normalized lexical form
    pub value: String,
}

impl FacetViolation {
    /// Create a facet violation
    pub fn new(kind: FacetViolationKind, type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    /// The facet that failed
    pub fn facet(&self) -> FacetKind {
        match self.kind {
            FacetViolationKind::Length { .. } => FacetKind::Length,
            FacetViolationKind::MinLength { .. } => FacetKind::MinLength,
            FacetViolationKind::MaxLength { .. } => FacetKind::MaxLength,
            FacetViolationKind::Pattern { .. } => FacetKind::Pattern,
            FacetViolationKind::Enumeration { .. } => FacetKind::Enumeration,
            FacetViolationKind::Range { facet, .. } | FacetViolationKind::Digits { facet, .. } => facet,
        }
    }

    /// Outcome code
    pub fn outcome(&self) -> ValidationOutcome {
        let section = match self.facet() {
            FacetKind::Length => Section::CvcLengthValid,
            FacetKind::MinLength => Section::CvcMinLengthValid,
            FacetKind::MaxLength => Section::CvcMaxLengthValid,
            FacetKind::Pattern => Section::CvcPatternValid,
            FacetKind::Enumeration | FacetKind::WhiteSpace => Section::CvcEnumerationValid,
            FacetKind::MinInclusive => Section::CvcMinInclusiveValid,
            FacetKind::MaxInclusive => Section::CvcMaxInclusiveValid,
            FacetKind::MinExclusive => Section::CvcMinExclusiveValid,
            FacetKind::MaxExclusive => Section::CvcMaxExclusiveValid,
            FacetKind::TotalDigits => Section::CvcTotalDigitsValid,
            FacetKind::FractionDigits => Section::CvcFractionDigitsValid,
        };
        ValidationOutcome::new(section, "1")
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        match &self.kind {
            FacetViolationKind::Length { expected, actual, uom } => format!(
                "The length of the value ({}), as measured in {}, must be equal to {}.",
                actual,
                uom.describe(),
                expected
            ),
            FacetViolationKind::MinLength { min, actual, uom } => format!(
                "The length of the value ({}), as measured in {}, must be greater than or equal to {}.",
                actual,
                uom.describe(),
                min
            ),
            FacetViolationKind::MaxLength { max, actual, uom } => format!(
                "The length of the value ({}), as measured in {}, must be less than or equal to {}.",
                actual,
                uom.describe(),
                max
            ),
            FacetViolationKind::Pattern { patterns } => format!(
                "The value '{}' does not match any of the patterns [{}] of type '{}'.",
                self.value,
                patterns.join(", "),
                self.type_name
            ),
            FacetViolationKind::Enumeration { allowed } => format!(
                "The value '{}' is not one of the enumerated values [{}] of type '{}'.",
                self.value,
                allowed.join(", "),
                self.type_name
            ),
            FacetViolationKind::Range { facet, bound } => {
                let relation = match facet {
                    FacetKind::MinInclusive => "greater than or equal to",
                    FacetKind::MaxInclusive => "less than or equal to",
                    FacetKind::MinExclusive => "greater than",
                    _ => "less than",
                };
                format!(
                    "The value '{}' must be {} {} ({} of type '{}').",
                    self.value, relation, bound, facet, self.type_name
                )
            }
            FacetViolationKind::Digits { facet, limit, actual } => format!(
                "The value '{}' has {} {} digits, more than the {} of {} allowed by type '{}'.",
                self.value,
                actual,
                if *facet == FacetKind::TotalDigits { "total" } else { "fraction" },
                facet,
                limit,
                self.type_name
            ),
        }
    }
}

/// No member of a union accepted the value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleTypeViolation {
    /// Union type name, `None` for an anonymous type
    pub type_name: Option<String>,
    /// Initial (unnormalized) value
    pub value: String,
}

impl SimpleTypeViolation {
    /// Create a simple type violation
    pub fn new(type_name: Option<String>, value: impl Into<String>) -> Self {
        Self {
            type_name,
            value: value.into(),
        }
    }

    /// Outcome code
    pub fn outcome(&self) -> ValidationOutcome {
        ValidationOutcome::new(Section::CvcSimpleType, "1")
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        format!(
            "The initial value '{}' is not valid with respect to the simple type definition '{}'.",
            self.value,
            self.type_name.as_deref().unwrap_or("{anonymous}")
        )
    }
}

// =============================================================================
// Structure
// =============================================================================

/// Child structure that does not satisfy a content type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentModelViolation {
    /// An element child appears where none is allowed
    UnexpectedChild {
        /// Element whose content is invalid
        parent: QName,
        /// Offending child
        child: QName,
        /// Content type of the parent
        content: ContentTypeLabel,
    },
    /// A required particle was not satisfied
    IncompleteContent {
        /// Element whose content is invalid
        parent: QName,
        /// Names (or wildcard descriptions) that would have been accepted
        expected: Vec<String>,
        /// The child found instead, `None` at the end of the content
        found: Option<QName>,
    },
    /// Character data where the content type does not permit it
    InvalidMixedContent {
        /// Element whose content is invalid
        parent: QName,
        /// Offending text, trimmed
        text: String,
        /// Content type of the parent
        content: ContentTypeLabel,
    },
}

impl ContentModelViolation {
    /// Element whose content is invalid
    pub fn parent(&self) -> &QName {
        match self {
            ContentModelViolation::UnexpectedChild { parent, .. }
            | ContentModelViolation::IncompleteContent { parent, .. }
            | ContentModelViolation::InvalidMixedContent { parent, .. } => parent,
        }
    }

    /// Outcome code
    pub fn outcome(&self) -> ValidationOutcome {
        let part = match self {
            ContentModelViolation::UnexpectedChild { content, .. } => match content {
                ContentTypeLabel::Empty => "2.1",
                ContentTypeLabel::Simple => "2.2",
                _ => "2.4.d",
            },
            ContentModelViolation::IncompleteContent { found: Some(_), .. } => "2.4.a",
            ContentModelViolation::IncompleteContent { found: None, .. } => "2.4.b",
            ContentModelViolation::InvalidMixedContent { content, .. } => match content {
                ContentTypeLabel::Empty => "2.1",
                _ => "2.3",
            },
        };
        ValidationOutcome::new(Section::CvcComplexType, part)
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        match self {
            ContentModelViolation::UnexpectedChild { parent, child, content } => format!(
                "Invalid content was found starting with element '{}'. No child element is expected at this point in '{}' ({} content).",
                child, parent, content
            ),
            ContentModelViolation::IncompleteContent { parent, expected, found } => {
                let expected = format!("{{{}}}", expected.join(", "));
                match found {
                    Some(child) => format!(
                        "Invalid content was found starting with element '{}'. One of '{}' is expected in '{}'.",
                        child, expected, parent
                    ),
                    None => format!(
                        "The content of element '{}' is not complete. One of '{}' is expected.",
                        parent, expected
                    ),
                }
            }
            ContentModelViolation::InvalidMixedContent { parent, text, content } => format!(
                "Element '{}' cannot have character [children] '{}' because its content type is {}.",
                parent, text, content
            ),
        }
    }
}

/// Abstract components or forbidden derivations used in an instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubstitutionViolation {
    /// An abstract element declaration was used directly
    AbstractElement {
        /// The element
        element: QName,
    },
    /// The governing type is abstract
    AbstractType {
        /// The element
        element: QName,
        /// The abstract type
        type_name: String,
    },
    /// `xsi:type` names a type that does not exist
    UnresolvedType {
        /// The element
        element: QName,
        /// The `xsi:type` value
        xsi_type: String,
    },
    /// `xsi:type` names a type not validly derived from the declared type
    NotDerived {
        /// The element
        element: QName,
        /// The `xsi:type` type
        type_name: String,
        /// The declared type
        declared: String,
    },
    /// The derivation is blocked by `block` or `final`
    BlockedDerivation {
        /// The element
        element: QName,
        /// The `xsi:type` type
        type_name: String,
        /// The declared type
        declared: String,
        /// Blocked method
        method: DerivationMethod,
    },
    /// A substitution group member may not replace its head
    BlockedSubstitution {
        /// The substituting element
        element: QName,
        /// The head it would replace
        head: QName,
    },
}

impl SubstitutionViolation {
    /// Outcome code
    pub fn outcome(&self) -> ValidationOutcome {
        match self {
            SubstitutionViolation::AbstractElement { .. } => ValidationOutcome::new(Section::CvcElt, "2"),
            SubstitutionViolation::AbstractType { .. } => ValidationOutcome::new(Section::CvcType, "2"),
            SubstitutionViolation::UnresolvedType { .. } => ValidationOutcome::new(Section::CvcElt, "4.2"),
            SubstitutionViolation::NotDerived { .. } | SubstitutionViolation::BlockedDerivation { .. } => {
                ValidationOutcome::new(Section::CvcElt, "4.3")
            }
            SubstitutionViolation::BlockedSubstitution { .. } => {
                ValidationOutcome::new(Section::CosEquivDerivedOkRec, "2")
            }
        }
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        match self {
            SubstitutionViolation::AbstractElement { element } => format!(
                "Element '{}' is abstract and cannot appear in an instance.",
                element
            ),
            SubstitutionViolation::AbstractType { element, type_name } => format!(
                "Type '{}' of element '{}' is abstract and cannot be used for validation.",
                type_name, element
            ),
            SubstitutionViolation::UnresolvedType { element, xsi_type } => format!(
                "Cannot resolve '{}' to a type definition for element '{}'.",
                xsi_type, element
            ),
            SubstitutionViolation::NotDerived { element, type_name, declared } => format!(
                "Type '{}' is not validly derived from the type definition '{}' of element '{}'.",
                type_name, declared, element
            ),
            SubstitutionViolation::BlockedDerivation { element, type_name, declared, method } => format!(
                "Type '{}' derives from '{}' by {}, which is blocked for element '{}'.",
                type_name, declared, method, element
            ),
            SubstitutionViolation::BlockedSubstitution { element, head } => format!(
                "Element '{}' may not substitute for the head element '{}'.",
                element, head
            ),
        }
    }
}

// =============================================================================
// Casting
// =============================================================================

/// XPath error codes raised by casts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CastCode {
    /// XPTY0004: the source type is not castable to the target type
    NotCastable,
    /// FORG0001: the value is invalid for the target type
    InvalidValue,
    /// FOCA0001: the value is too large for xs:decimal
    DecimalOverflow,
    /// FOCA0002: NaN or infinity has no exact target value
    InvalidLexical,
    /// FOCA0003: the value is too large for an unbounded integer target
    IntegerOverflow,
}

impl CastCode {
    /// XPath error code
    pub fn as_str(&self) -> &'static str {
        match self {
            CastCode::NotCastable => "XPTY0004",
            CastCode::InvalidValue => "FORG0001",
            CastCode::DecimalOverflow => "FOCA0001",
            CastCode::InvalidLexical => "FOCA0002",
            CastCode::IntegerOverflow => "FOCA0003",
        }
    }
}

/// The target type cannot represent the source value under the active policy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CastViolation {
    /// Error code
    pub code: CastCode,
    /// Source native type
    pub source: NativeType,
    /// Target native type
    pub target: NativeType,
    /// Source value in the active emulation form
    pub value: String,
    /// Detail
    pub reason: String,
}

impl CastViolation {
    /// Create a cast violation
    pub fn new(
        code: CastCode,
        source: NativeType,
        target: NativeType,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            code,
            source,
            target,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Outcome code
    pub fn outcome(&self) -> ValidationOutcome {
        ValidationOutcome::new(Section::Cast, self.code.as_str())
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        format!(
            "Cannot cast '{}' from {} to {}: {}.",
            self.value, self.source, self.target, self.reason
        )
    }
}

impl fmt::Display for CastViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.outcome(), self.message())
    }
}

impl std::error::Error for CastViolation {}

// =============================================================================
// Attributes and elements
// =============================================================================

/// Attribute-level failures
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeViolation {
    /// No attribute use or wildcard admits the attribute
    NotAllowed {
        /// Owner element
        element: QName,
        /// The attribute
        attribute: QName,
    },
    /// A required attribute is absent
    Missing {
        /// Owner element
        element: QName,
        /// The attribute
        attribute: QName,
    },
    /// A strict wildcard matched but no global declaration exists
    Undeclared {
        /// Owner element
        element: QName,
        /// The attribute
        attribute: QName,
    },
    /// The value differs from the fixed value constraint
    FixedMismatch {
        /// Owner element
        element: QName,
        /// The attribute
        attribute: QName,
        /// Fixed value
        expected: String,
        /// Actual value
        actual: String,
    },
}

impl AttributeViolation {
    /// Outcome code
    pub fn outcome(&self) -> ValidationOutcome {
        match self {
            AttributeViolation::NotAllowed { .. } => ValidationOutcome::new(Section::CvcComplexType, "3.2.2"),
            AttributeViolation::Missing { .. } => ValidationOutcome::new(Section::CvcComplexType, "4"),
            AttributeViolation::Undeclared { .. } => ValidationOutcome::new(Section::CvcAttribute, "1"),
            AttributeViolation::FixedMismatch { .. } => ValidationOutcome::new(Section::CvcAu, "1"),
        }
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        match self {
            AttributeViolation::NotAllowed { element, attribute } => format!(
                "Attribute '{}' is not allowed to appear in element '{}'.",
                attribute, element
            ),
            AttributeViolation::Missing { element, attribute } => format!(
                "Attribute '{}' must appear on element '{}'.",
                attribute, element
            ),
            AttributeViolation::Undeclared { element, attribute } => format!(
                "No declaration found for attribute '{}' matched by a strict wildcard on element '{}'.",
                attribute, element
            ),
            AttributeViolation::FixedMismatch { element, attribute, expected, actual } => format!(
                "The value '{}' of attribute '{}' on element '{}' does not match its fixed value '{}'.",
                actual, attribute, element, expected
            ),
        }
    }
}

/// Element-level failures
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementViolation {
    /// No declaration is available for an element that must be declared
    NoDeclaration {
        /// The element
        element: QName,
    },
    /// `xsi:nil` used on a non-nillable element
    NotNillable {
        /// The element
        element: QName,
    },
    /// A nilled element has content
    NilledWithContent {
        /// The element
        element: QName,
    },
    /// A nilled element has a fixed value constraint
    NilledFixed {
        /// The element
        element: QName,
    },
    /// Element content differs from the fixed value constraint
    FixedMismatch {
        /// The element
        element: QName,
        /// Fixed value
        expected: String,
        /// Actual value
        actual: String,
    },
    /// Element content with a fixed constraint contains element children
    FixedWithChildren {
        /// The element
        element: QName,
    },
}

impl ElementViolation {
    /// Outcome code
    pub fn outcome(&self) -> ValidationOutcome {
        match self {
            ElementViolation::NoDeclaration { .. } => ValidationOutcome::new(Section::CvcElt, "1"),
            ElementViolation::NotNillable { .. } => ValidationOutcome::new(Section::CvcElt, "3.1"),
            ElementViolation::NilledWithContent { .. } => ValidationOutcome::new(Section::CvcElt, "3.2.1"),
            ElementViolation::NilledFixed { .. } => ValidationOutcome::new(Section::CvcElt, "3.2.2"),
            ElementViolation::FixedMismatch { .. } => ValidationOutcome::new(Section::CvcElt, "5.2.2.2.2"),
            ElementViolation::FixedWithChildren { .. } => ValidationOutcome::new(Section::CvcElt, "5.2.2.1"),
        }
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        match self {
            ElementViolation::NoDeclaration { element } => {
                format!("Cannot find the declaration of element '{}'.", element)
            }
            ElementViolation::NotNillable { element } => format!(
                "Attribute 'xsi:nil' must not appear on element '{}', because it is not nillable.",
                element
            ),
            ElementViolation::NilledWithContent { element } => format!(
                "Element '{}' is nilled and must have no character or element content.",
                element
            ),
            ElementViolation::NilledFixed { element } => format!(
                "Element '{}' has a fixed value constraint and cannot be nilled.",
                element
            ),
            ElementViolation::FixedMismatch { element, expected, actual } => format!(
                "The value '{}' of element '{}' does not match its fixed value '{}'.",
                actual, element, expected
            ),
            ElementViolation::FixedWithChildren { element } => format!(
                "Element '{}' has a fixed value constraint and cannot have element children.",
                element
            ),
        }
    }
}

// =============================================================================
// The taxonomy
// =============================================================================

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstraintViolation {
    /// Value cannot be parsed into its native representation
    LexicalSpace(LexicalViolation),
    /// Value rejected by a facet
    Facet(FacetViolation),
    /// No union member accepted the value
    SimpleType(SimpleTypeViolation),
    /// Children do not satisfy the content type
    ContentModel(ContentModelViolation),
    /// Abstract component or blocked derivation
    Substitution(SubstitutionViolation),
    /// Cast failure while producing a typed value
    Cast(CastViolation),
    /// Attribute presence or value failure
    Attribute(AttributeViolation),
    /// Element declaration, nil or fixed-value failure
    Element(ElementViolation),
}

impl ConstraintViolation {
    /// Outcome code
    pub fn outcome(&self) -> ValidationOutcome {
        match self {
            ConstraintViolation::LexicalSpace(v) => v.outcome(),
            ConstraintViolation::Facet(v) => v.outcome(),
            ConstraintViolation::SimpleType(v) => v.outcome(),
            ConstraintViolation::ContentModel(v) => v.outcome(),
            ConstraintViolation::Substitution(v) => v.outcome(),
            ConstraintViolation::Cast(v) => v.outcome(),
            ConstraintViolation::Attribute(v) => v.outcome(),
            ConstraintViolation::Element(v) => v.outcome(),
        }
    }

    /// Message without the outcome prefix
    pub fn message(&self) -> String {
        match self {
            ConstraintViolation::LexicalSpace(v) => v.message(),
            ConstraintViolation::Facet(v) => v.message(),
            ConstraintViolation::SimpleType(v) => v.message(),
            ConstraintViolation::ContentModel(v) => v.message(),
            ConstraintViolation::Substitution(v) => v.message(),
            ConstraintViolation::Cast(v) => v.message(),
            ConstraintViolation::Attribute(v) => v.message(),
            ConstraintViolation::Element(v) => v.message(),
        }
    }

    /// Whether the value was malformed rather than out of range
    pub fn is_lexical(&self) -> bool {
        matches!(self, ConstraintViolation::LexicalSpace(_))
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.outcome(), self.message())
    }
}

impl std::error::Error for ConstraintViolation {}

macro_rules! impl_from_violation {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for ConstraintViolation {
                fn from(v: $ty) -> Self {
                    ConstraintViolation::$variant(v)
                }
            }
        )*
    };
}

impl_from_violation!(
    LexicalSpace(LexicalViolation),
    Facet(FacetViolation),
    SimpleType(SimpleTypeViolation),
    ContentModel(ContentModelViolation),
    Substitution(SubstitutionViolation),
    Cast(CastViolation),
    Attribute(AttributeViolation),
    Element(ElementViolation),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        let outcome = ValidationOutcome::new(Section::CvcComplexType, "2.4.b");
        assert_eq!(outcome.to_string(), "cvc-complex-type.2.4.b");
        assert_eq!(
            ValidationOutcome::new(Section::SccAllGroupLimited, "2").to_string(),
            "cos-all-limited.2"
        );
    }

    #[test]
    fn test_min_length_message() {
        let v: ConstraintViolation = FacetViolation::new(
            FacetViolationKind::MinLength {
                min: 3,
                actual: 2,
                uom: Uom::ListItems,
            },
            "intList",
            "1 2",
        )
        .into();
        assert_eq!(
            v.to_string(),
            "cvc-minLength-valid.1: The length of the value (2), as measured in list items, \
             must be greater than or equal to 3."
        );
    }

    #[test]
    fn test_union_message() {
        let named = SimpleTypeViolation::new(Some("{urn:t}sizes".into()), "huge");
        assert_eq!(
            named.message(),
            "The initial value 'huge' is not valid with respect to the simple type definition '{urn:t}sizes'."
        );
        let anonymous = SimpleTypeViolation::new(None, "x");
        assert!(anonymous.message().contains("'{anonymous}'"));
    }

    #[test]
    fn test_content_model_parts() {
        let incomplete = ContentModelViolation::IncompleteContent {
            parent: QName::local("root"),
            expected: vec!["a".into()],
            found: None,
        };
        assert_eq!(incomplete.outcome().part, "2.4.b");
        let unexpected = ContentModelViolation::UnexpectedChild {
            parent: QName::local("root"),
            child: QName::local("c"),
            content: ContentTypeLabel::ElementOnly,
        };
        assert_eq!(unexpected.outcome().part, "2.4.d");
        let in_empty = ContentModelViolation::UnexpectedChild {
            parent: QName::local("root"),
            child: QName::local("c"),
            content: ContentTypeLabel::Empty,
        };
        assert_eq!(in_empty.outcome().part, "2.1");
    }

    #[test]
    fn test_cast_outcome() {
        let v = CastViolation::new(
            CastCode::InvalidLexical,
            NativeType::Double,
            NativeType::Decimal,
            "INF",
            "infinity has no decimal value",
        );
        let v = ConstraintViolation::from(v);
        assert_eq!(v.outcome().to_string(), "cast.FOCA0002");
        assert!(!v.is_lexical());
    }

    #[test]
    fn test_violations_deduplicate() {
        use std::collections::HashSet;
        let a = ConstraintViolation::from(ElementViolation::NoDeclaration {
            element: QName::local("x"),
        });
        let set: HashSet<_> = [a.clone(), a].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
