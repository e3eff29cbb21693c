//! # xmlschema-typed
//!
//! Schema-driven structural and type validation for XML trees.
//!
//! A schema is assembled with a [`SchemaBuilder`] and locked into an
//! immutable [`SchemaCache`]. An [`InstanceValidator`] then walks any tree
//! that implements [`XmlNode`], matches element content against the content
//! models, validates simple values through the facet engine, and returns a
//! tree of typed [`Atom`]s. Violations carry the number of the constraint
//! they break and go through an [`ErrorHandler`], so one engine serves both
//! fail-fast and collect-all callers.
//!
//! ## Features
//!
//! - The built-in type lattice with exact integer ranges and facet checks
//! - Simple type restriction, list and union derivation
//! - Sequence, choice and all content models with occurrence bounds
//! - Wildcards, substitution groups, `xsi:type` and `xsi:nil`
//! - Typed atoms with casting between native types
//!
//! ## Example
//!
//! ```rust
//! use xmlschema_typed::{
//!     documents::Document, ElementDeclaration, Facet, InstanceValidator, NativeType, QName,
//!     SchemaBuilder,
//! };
//!
//! let mut builder = SchemaBuilder::new();
//! let byte = builder.native(NativeType::UnsignedByte);
//! let percent = builder
//!     .derive_restriction(Some(QName::local("percent")), byte, vec![Facet::MaxInclusive("100".into())])
//!     .unwrap();
//! builder
//!     .add_element(ElementDeclaration::new(QName::local("level"), percent))
//!     .unwrap();
//! let cache = builder.lock().unwrap();
//!
//! let doc = Document::from_string("<level>42</level>").unwrap();
//! let root = doc.root_node().unwrap();
//! let typed = InstanceValidator::new(&cache).validate_fail_fast(&root).unwrap();
//! assert_eq!(typed.value.unwrap()[0].as_i64(), Some(42));
//!
//! let doc = Document::from_string("<level>420</level>").unwrap();
//! let root = doc.root_node().unwrap();
//! let report = InstanceValidator::new(&cache).validate_collect(&root).unwrap();
//! assert!(!report.is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and trees
pub mod namespaces;
pub mod documents;

// Values
pub mod atoms;

// Components and validation
pub mod validators;

// Re-exports for convenience
pub use atoms::{cast_as, Atom, AtomValue, CastingContext, Emulation, SpillagePolicy};
pub use documents::{NodeKind, XmlNode};
pub use error::{Abort, Error, Result, SchemaError};
pub use limits::{Limits, ValidationOptions};
pub use namespaces::{QName, XML_NAMESPACE, XMLNS_NAMESPACE, XSD_NAMESPACE, XSI_NAMESPACE};
pub use validators::{
    ComplexType, ConstraintViolation, ContentType, DerivationMethod, ElementDeclaration,
    ErrorHandler, Facet, InstanceValidator, NativeType, SchemaBuilder, SchemaCache, TypedElement,
    ValidationReport,
};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
