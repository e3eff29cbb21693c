//! XSD attribute declarations and attribute uses

use crate::namespaces::QName;

use super::globals::{Scope, TypeId};

/// Attribute use mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UseMode {
    /// Attribute is optional (default)
    #[default]
    Optional,
    /// Attribute is required
    Required,
    /// Attribute is prohibited
    Prohibited,
}

impl UseMode {
    /// Get the use as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            UseMode::Optional => "optional",
            UseMode::Required => "required",
            UseMode::Prohibited => "prohibited",
        }
    }
}

impl std::fmt::Display for UseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A default or fixed value constraint, kept in lexical form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueConstraint {
    /// Value supplied when the item is absent
    Default(String),
    /// Value the item must equal; also supplied when absent
    Fixed(String),
}

impl ValueConstraint {
    /// The lexical value
    pub fn lexical(&self) -> &str {
        match self {
            ValueConstraint::Default(v) | ValueConstraint::Fixed(v) => v,
        }
    }

    /// The fixed value, if this is a fixed constraint
    pub fn fixed(&self) -> Option<&str> {
        match self {
            ValueConstraint::Fixed(v) => Some(v),
            ValueConstraint::Default(_) => None,
        }
    }
}

/// XSD attribute declaration
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDeclaration {
    /// Attribute name
    pub name: QName,
    /// Simple type of the value
    pub type_id: TypeId,
    /// Global, or local to a complex type
    pub scope: Scope,
    /// Default/fixed value
    pub constraint: Option<ValueConstraint>,
}

impl AttributeDeclaration {
    /// Create a global attribute declaration
    pub fn new(name: QName, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            scope: Scope::Global,
            constraint: None,
        }
    }

    /// Set the value constraint
    pub fn with_constraint(mut self, constraint: ValueConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Set the scope
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}

/// An attribute use inside a complex type
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeUse {
    /// Attribute name
    pub name: QName,
    /// Simple type of the value
    pub type_id: TypeId,
    /// Whether the attribute must be present
    pub required: bool,
    /// Default/fixed value; overrides the declaration's
    pub constraint: Option<ValueConstraint>,
}

impl AttributeUse {
    /// Optional use of a local attribute
    pub fn optional(name: QName, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            required: false,
            constraint: None,
        }
    }

    /// Required use of a local attribute
    pub fn required(name: QName, type_id: TypeId) -> Self {
        Self {
            required: true,
            ..Self::optional(name, type_id)
        }
    }

    /// Use of a (global) declaration
    pub fn of_declaration(declaration: &AttributeDeclaration, mode: UseMode) -> Self {
        Self {
            name: declaration.name.clone(),
            type_id: declaration.type_id,
            required: mode == UseMode::Required,
            constraint: declaration.constraint.clone(),
        }
    }

    /// Set the value constraint
    pub fn with_constraint(mut self, constraint: ValueConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_mode_display() {
        assert_eq!(UseMode::default(), UseMode::Optional);
        assert_eq!(UseMode::Prohibited.to_string(), "prohibited");
    }

    #[test]
    fn test_value_constraint() {
        let fixed = ValueConstraint::Fixed("1".into());
        assert_eq!(fixed.lexical(), "1");
        assert_eq!(fixed.fixed(), Some("1"));
        assert_eq!(ValueConstraint::Default("x".into()).fixed(), None);
    }

    #[test]
    fn test_use_of_declaration() {
        let decl = AttributeDeclaration::new(QName::local("lang"), TypeId(3))
            .with_constraint(ValueConstraint::Default("en".into()));
        let use_ = AttributeUse::of_declaration(&decl, UseMode::Required);
        assert!(use_.required);
        assert_eq!(use_.name, QName::local("lang"));
        assert_eq!(use_.constraint, Some(ValueConstraint::Default("en".into())));
    }
}
