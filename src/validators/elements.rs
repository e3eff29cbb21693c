//! XSD element declarations
//!
//! Element declarations bind a name to a type, and carry nillability,
//! abstractness, value constraints and substitution group affiliation.

use crate::namespaces::QName;

use super::attributes::ValueConstraint;
use super::complex_types::DerivationFlags;
use super::globals::{ElementId, Scope, TypeId};

/// XSD element declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDeclaration {
    /// Element name
    pub name: QName,
    /// Declared type
    pub type_id: TypeId,
    /// Global, or local to a complex type
    pub scope: Scope,
    /// Whether xsi:nil is allowed
    pub nillable: bool,
    /// Whether the element may only appear through substitution
    pub is_abstract: bool,
    /// Default/fixed value
    pub constraint: Option<ValueConstraint>,
    /// Head of the substitution group this element belongs to
    pub substitution_group: Option<ElementId>,
    /// Blocked substitutions (restriction, extension, substitution)
    pub block: DerivationFlags,
    /// Final set limiting substitution group membership
    pub final_set: DerivationFlags,
}

impl ElementDeclaration {
    /// Create a global element declaration
    pub fn new(name: QName, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            scope: Scope::Global,
            nillable: false,
            is_abstract: false,
            constraint: None,
            substitution_group: None,
            block: DerivationFlags::default(),
            final_set: DerivationFlags::default(),
        }
    }

    /// Create a local element declaration inside the given complex type
    pub fn local(name: QName, type_id: TypeId, parent: Option<TypeId>) -> Self {
        Self {
            scope: Scope::Local(parent),
            ..Self::new(name, type_id)
        }
    }

    /// Whether this is a global declaration
    pub fn is_global(&self) -> bool {
        self.scope == Scope::Global
    }

    /// The fixed value, if any
    pub fn fixed(&self) -> Option<&str> {
        self.constraint.as_ref().and_then(ValueConstraint::fixed)
    }

    /// Set nillable
    pub fn with_nillable(mut self, nillable: bool) -> Self {
        self.nillable = nillable;
        self
    }

    /// Set abstract
    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    /// Set a default value
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.constraint = Some(ValueConstraint::Default(value.into()));
        self
    }

    /// Set a fixed value
    pub fn with_fixed(mut self, value: impl Into<String>) -> Self {
        self.constraint = Some(ValueConstraint::Fixed(value.into()));
        self
    }

    /// Join the substitution group headed by `head`
    pub fn with_substitution_group(mut self, head: ElementId) -> Self {
        self.substitution_group = Some(head);
        self
    }

    /// Set the block flags
    pub fn with_block(mut self, block: DerivationFlags) -> Self {
        self.block = block;
        self
    }

    /// Set the final flags
    pub fn with_final(mut self, final_set: DerivationFlags) -> Self {
        self.final_set = final_set;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_declaration() {
        let decl = ElementDeclaration::new(QName::local("item"), TypeId(0))
            .with_nillable(true)
            .with_fixed("1");
        assert!(decl.is_global());
        assert!(decl.nillable);
        assert_eq!(decl.fixed(), Some("1"));

        let local = ElementDeclaration::local(QName::local("x"), TypeId(0), Some(TypeId(7)))
            .with_default("d");
        assert!(!local.is_global());
        assert_eq!(local.scope, Scope::Local(Some(TypeId(7))));
        assert_eq!(local.fixed(), None);
    }
}
