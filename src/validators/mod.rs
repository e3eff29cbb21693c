//! XML Schema validators
//!
//! The component model (types, declarations, particles), the facet engine,
//! the content model matcher and the instance validation engine.

// Values
pub mod builtins;
pub mod facets;
pub mod exceptions;

// Components
pub mod wildcards;
pub mod particles;
pub mod groups;
pub mod simple_types;
pub mod complex_types;
pub mod attributes;
pub mod elements;
pub mod globals;

// Validation
pub mod models;
pub mod handlers;
pub mod validation;

// Re-exports
pub use attributes::{AttributeDeclaration, AttributeUse, UseMode, ValueConstraint};
pub use builtins::NativeType;
pub use complex_types::{
    ComplexType, ComplexTypeBuilder, ContentType, ContentTypeLabel, DerivationFlags,
    DerivationMethod,
};
pub use elements::ElementDeclaration;
pub use exceptions::{
    AttributeViolation, CastViolation, ConstraintViolation, ContentModelViolation,
    ElementViolation, FacetViolation, LexicalViolation, Section, SimpleTypeViolation,
    SubstitutionViolation, ValidationOutcome,
};
pub use facets::{Facet, FacetKind, FacetSet, Uom, WhiteSpace};
pub use globals::{
    AttributeId, Components, ElementId, SchemaBuilder, SchemaCache, Scope, TypeDefinition,
    TypeId,
};
pub use groups::{ModelGroup, ModelType};
pub use handlers::{Collector, ErrorHandler, FailFast, SharedCollector};
pub use models::{match_content, Binding, ContentMatch};
pub use particles::{Occurs, Particle, Term};
pub use simple_types::{LexicalContext, SimpleType, Validated, Variety};
pub use validation::{Diagnostic, InstanceValidator, TypedElement, ValidationReport};
pub use wildcards::{NamespaceConstraint, ProcessContents, Wildcard};
