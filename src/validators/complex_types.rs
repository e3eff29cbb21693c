//! XSD Complex Type Definitions
//!
//! A complex type has a content type (empty, simple, element-only or mixed)
//! and a set of attribute uses, optionally opened by an attribute wildcard.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Complex_Type_Definitions

use indexmap::IndexMap;

use crate::namespaces::QName;

use super::attributes::AttributeUse;
use super::globals::TypeId;
use super::particles::Particle;
use super::wildcards::Wildcard;

/// Derivation method linking a type to its base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DerivationMethod {
    /// Type derived by restriction
    #[default]
    Restriction,
    /// Type derived by extension
    Extension,
    /// Simple type derived by list
    List,
    /// Simple type derived by union
    Union,
}

impl std::fmt::Display for DerivationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Restriction => write!(f, "restriction"),
            Self::Extension => write!(f, "extension"),
            Self::List => write!(f, "list"),
            Self::Union => write!(f, "union"),
        }
    }
}

/// Content type label for complex types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentTypeLabel {
    /// No content (empty element)
    Empty,
    /// Simple content (text only)
    Simple,
    /// Mixed content (text and elements)
    Mixed,
    /// Element-only content
    ElementOnly,
}

impl std::fmt::Display for ContentTypeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Simple => write!(f, "simple"),
            Self::Mixed => write!(f, "mixed"),
            Self::ElementOnly => write!(f, "element-only"),
        }
    }
}

/// Block/final derivation flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DerivationFlags {
    /// Block/finalize restriction
    pub restriction: bool,
    /// Block/finalize extension
    pub extension: bool,
    /// Finalize list derivation (simple types)
    pub list: bool,
    /// Finalize union derivation (simple types)
    pub union: bool,
    /// Block substitution group membership (elements)
    pub substitution: bool,
}

impl DerivationFlags {
    /// All derivations blocked/finalized
    pub fn all() -> Self {
        Self {
            restriction: true,
            extension: true,
            list: true,
            union: true,
            substitution: true,
        }
    }

    /// Flags blocking exactly `methods`
    pub fn of(methods: &[DerivationMethod]) -> Self {
        methods.iter().fold(Self::default(), |mut flags, method| {
            match method {
                DerivationMethod::Restriction => flags.restriction = true,
                DerivationMethod::Extension => flags.extension = true,
                DerivationMethod::List => flags.list = true,
                DerivationMethod::Union => flags.union = true,
            }
            flags
        })
    }

    /// Check if a derivation method is blocked
    pub fn is_blocked(&self, method: DerivationMethod) -> bool {
        match method {
            DerivationMethod::Restriction => self.restriction,
            DerivationMethod::Extension => self.extension,
            DerivationMethod::List => self.list,
            DerivationMethod::Union => self.union,
        }
    }

    /// Combine two flag sets
    pub fn merge(self, other: DerivationFlags) -> DerivationFlags {
        DerivationFlags {
            restriction: self.restriction || other.restriction,
            extension: self.extension || other.extension,
            list: self.list || other.list,
            union: self.union || other.union,
            substitution: self.substitution || other.substitution,
        }
    }
}

/// The content type of a complex type
#[derive(Debug, Clone, PartialEq)]
pub enum ContentType {
    /// No element or character children
    Empty,
    /// Character content validated against a simple type
    Simple(TypeId),
    /// Element children only, whitespace allowed between them
    ElementOnly(Particle),
    /// Element children interleaved with character data
    Mixed(Particle),
}

impl ContentType {
    /// Label used in diagnostics
    pub fn label(&self) -> ContentTypeLabel {
        match self {
            ContentType::Empty => ContentTypeLabel::Empty,
            ContentType::Simple(_) => ContentTypeLabel::Simple,
            ContentType::ElementOnly(_) => ContentTypeLabel::ElementOnly,
            ContentType::Mixed(_) => ContentTypeLabel::Mixed,
        }
    }

    /// The particle of an element-only or mixed content type
    pub fn particle(&self) -> Option<&Particle> {
        match self {
            ContentType::ElementOnly(p) | ContentType::Mixed(p) => Some(p),
            _ => None,
        }
    }

    /// Whether character children are allowed between elements
    pub fn is_mixed(&self) -> bool {
        matches!(self, ContentType::Mixed(_))
    }
}

/// XSD Complex Type definition
#[derive(Debug, Clone)]
pub struct ComplexType {
    /// Type name (None for anonymous types)
    pub name: Option<QName>,
    /// Base type; `None` only for anyType
    pub base: Option<TypeId>,
    /// Derivation method from the base
    pub derivation: DerivationMethod,
    /// Content type
    pub content: ContentType,
    /// Attribute uses, keyed by attribute name
    pub attributes: IndexMap<QName, AttributeUse>,
    /// Attribute wildcard
    pub attribute_wildcard: Option<Wildcard>,
    /// Whether this type is abstract
    pub is_abstract: bool,
    /// Final derivation flags
    pub final_set: DerivationFlags,
    /// Block derivation flags
    pub block: DerivationFlags,
}

impl ComplexType {
    /// Start building a complex type
    pub fn builder(name: Option<QName>) -> ComplexTypeBuilder {
        ComplexTypeBuilder::new(name)
    }

    /// Get the content type label
    pub fn content_type_label(&self) -> ContentTypeLabel {
        self.content.label()
    }

    /// Check if content is empty
    pub fn is_empty(&self) -> bool {
        matches!(self.content, ContentType::Empty)
    }

    /// Check if this type has simple content
    pub fn has_simple_content(&self) -> bool {
        matches!(self.content, ContentType::Simple(_))
    }

    /// Check if this type has mixed content
    pub fn has_mixed_content(&self) -> bool {
        self.content.is_mixed()
    }

    /// Check if a derivation method is blocked
    pub fn is_derivation_blocked(&self, method: DerivationMethod) -> bool {
        self.block.is_blocked(method)
    }

    /// Check if a derivation method is finalized
    pub fn is_derivation_final(&self, method: DerivationMethod) -> bool {
        self.final_set.is_blocked(method)
    }

    /// Look up an attribute use by name
    pub fn attribute_use(&self, name: &QName) -> Option<&AttributeUse> {
        self.attributes.get(name)
    }

    /// Required attribute uses
    pub fn required_attributes(&self) -> impl Iterator<Item = &AttributeUse> {
        self.attributes.values().filter(|u| u.required)
    }
}

/// Builder for [`ComplexType`]
#[derive(Debug, Clone)]
pub struct ComplexTypeBuilder {
    ty: ComplexType,
}

impl ComplexTypeBuilder {
    /// Create a builder with empty content, restricting nothing yet
    pub fn new(name: Option<QName>) -> Self {
        Self {
            ty: ComplexType {
                name,
                base: None,
                derivation: DerivationMethod::Restriction,
                content: ContentType::Empty,
                attributes: IndexMap::new(),
                attribute_wildcard: None,
                is_abstract: false,
                final_set: DerivationFlags::default(),
                block: DerivationFlags::default(),
            },
        }
    }

    /// Set the base type and derivation method
    pub fn base(mut self, base: TypeId, method: DerivationMethod) -> Self {
        self.ty.base = Some(base);
        self.ty.derivation = method;
        self
    }

    /// Set the content type
    pub fn content(mut self, content: ContentType) -> Self {
        self.ty.content = content;
        self
    }

    /// Element-only content
    pub fn element_only(self, particle: Particle) -> Self {
        self.content(ContentType::ElementOnly(particle))
    }

    /// Mixed content
    pub fn mixed(self, particle: Particle) -> Self {
        self.content(ContentType::Mixed(particle))
    }

    /// Simple content of the given simple type
    pub fn simple_content(self, simple: TypeId) -> Self {
        self.content(ContentType::Simple(simple))
    }

    /// Add an attribute use
    pub fn attribute(mut self, attribute: AttributeUse) -> Self {
        self.ty.attributes.insert(attribute.name.clone(), attribute);
        self
    }

    /// Set the attribute wildcard
    pub fn attribute_wildcard(mut self, wildcard: Wildcard) -> Self {
        self.ty.attribute_wildcard = Some(wildcard);
        self
    }

    /// Mark as abstract
    pub fn abstract_type(mut self, is_abstract: bool) -> Self {
        self.ty.is_abstract = is_abstract;
        self
    }

    /// Set the final flags
    pub fn final_set(mut self, flags: DerivationFlags) -> Self {
        self.ty.final_set = flags;
        self
    }

    /// Set the block flags
    pub fn block(mut self, flags: DerivationFlags) -> Self {
        self.ty.block = flags;
        self
    }

    /// Finish
    pub fn build(self) -> ComplexType {
        self.ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::globals::ElementId;
    use crate::validators::particles::Occurs;

    #[test]
    fn test_derivation_flags() {
        let flags = DerivationFlags::of(&[DerivationMethod::Restriction, DerivationMethod::List]);
        assert!(flags.is_blocked(DerivationMethod::Restriction));
        assert!(flags.is_blocked(DerivationMethod::List));
        assert!(!flags.is_blocked(DerivationMethod::Extension));
        assert!(!flags.substitution);

        assert!(DerivationFlags::all().substitution);

        let merged = DerivationFlags::of(&[DerivationMethod::Extension]).merge(flags);
        assert!(merged.extension && merged.restriction);
    }

    #[test]
    fn test_derivation_method_display() {
        assert_eq!(DerivationMethod::List.to_string(), "list");
    }

    #[test]
    fn test_content_type_labels() {
        let particle = Particle::element(ElementId(0), Occurs::once());
        let ty = ComplexType::builder(Some(QName::local("t")))
            .mixed(particle.clone())
            .build();
        assert_eq!(ty.content_type_label(), ContentTypeLabel::Mixed);
        assert!(ty.has_mixed_content());
        assert_eq!(ty.content.particle(), Some(&particle));

        let empty = ComplexType::builder(None).build();
        assert!(empty.is_empty());
        assert_eq!(empty.content_type_label().to_string(), "empty");
        assert_eq!(ContentTypeLabel::ElementOnly.to_string(), "element-only");
    }
}
