//! XSD Simple Type Definitions
//!
//! Simple types come in three varieties:
//! - Atomic types (built-in and derived by restriction)
//! - List types (whitespace-separated items of an item type)
//! - Union types (a value of the first member type that accepts it)
//!
//! Validation turns a lexical form into typed atoms: whitespace is
//! normalized, the value is parsed into the native value space, and the
//! effective facets are checked in order.
//!
//! See: https://www.w3.org/TR/xmlschema-2/

use crate::atoms::Atom;
use crate::error::{Error, Result};
use crate::namespaces::{QName, XSD_NAMESPACE};
use crate::validators::builtins::{parse_lexical, NativeType, PrefixResolver};
use crate::validators::complex_types::{DerivationFlags, DerivationMethod};
use crate::validators::exceptions::{ConstraintViolation, LexicalViolation, SimpleTypeViolation};
use crate::validators::facets::{FacetSet, FacetSubject, Uom, WhiteSpace};
use crate::validators::globals::{Components, TypeId};

/// Atoms on success, every violation found on failure
pub type Validated = std::result::Result<Vec<Atom>, Vec<ConstraintViolation>>;

// =============================================================================
// Simple Type Variety
// =============================================================================

/// Variety of a simple type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variety {
    /// Atomic type, valued in the given native type
    Atomic(NativeType),
    /// List of items of the given type
    List {
        /// Item type
        item: TypeId,
    },
    /// Union of member types, tried in order
    Union {
        /// Member types
        members: Vec<TypeId>,
    },
}

/// Per-call settings for lexical validation
#[derive(Clone, Copy)]
pub struct LexicalContext<'a> {
    /// Prefix resolution for QName/NOTATION values
    pub resolver: Option<PrefixResolver<'a>>,
    /// Collect every facet failure rather than stopping at the first one
    pub collect: bool,
    /// Maximum number of list items
    pub max_list_items: usize,
}

impl Default for LexicalContext<'_> {
    fn default() -> Self {
        Self {
            resolver: None,
            collect: false,
            max_list_items: usize::MAX,
        }
    }
}

impl std::fmt::Debug for LexicalContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexicalContext")
            .field("resolver", &self.resolver.is_some())
            .field("collect", &self.collect)
            .field("max_list_items", &self.max_list_items)
            .finish()
    }
}

// =============================================================================
// Simple Type
// =============================================================================

/// XSD simple type definition
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleType {
    /// Type name (None for anonymous types)
    pub name: Option<QName>,
    /// Base type (None only for anySimpleType's parent link)
    pub base: Option<TypeId>,
    /// How this type derives from its base
    pub derivation: DerivationMethod,
    /// Atomic, list or union
    pub variety: Variety,
    /// Effective facets (inherited and local)
    pub facets: FacetSet,
    /// Effective whitespace policy
    pub white_space: WhiteSpace,
    /// Final derivation flags
    pub final_set: DerivationFlags,
}

impl SimpleType {
    /// A built-in atomic type
    pub fn native(native: NativeType, base: Option<TypeId>) -> Self {
        Self {
            name: Some(native.qname()),
            base,
            derivation: DerivationMethod::Restriction,
            variety: Variety::Atomic(native),
            facets: FacetSet::new(),
            white_space: native.white_space(),
            final_set: DerivationFlags::default(),
        }
    }

    /// Name used in diagnostics: `xs:local` for built-ins, `{anonymous}` when unnamed
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if name.namespace.as_deref() == Some(XSD_NAMESPACE) => {
                format!("xs:{}", name.local_name)
            }
            Some(name) => name.to_string(),
            None => "{anonymous}".to_string(),
        }
    }

    /// Native type of an atomic type
    pub fn native_type(&self) -> Option<NativeType> {
        match self.variety {
            Variety::Atomic(native) => Some(native),
            _ => None,
        }
    }

    /// Whether this is an atomic type
    pub fn is_atomic(&self) -> bool {
        matches!(self.variety, Variety::Atomic(_))
    }

    /// Whether this is a list type
    pub fn is_list(&self) -> bool {
        matches!(self.variety, Variety::List { .. })
    }

    /// Whether this is a union type
    pub fn is_union(&self) -> bool {
        matches!(self.variety, Variety::Union { .. })
    }

    /// Whether this is one of the abstract special types
    pub fn is_abstract(&self) -> bool {
        match self.variety {
            Variety::Atomic(native) => {
                native.is_abstract() && self.name.as_ref() == Some(&native.qname())
            }
            _ => false,
        }
    }

    /// Validate a lexical form against this type
    pub fn validate(
        &self,
        types: &Components,
        lexical: &str,
        ctx: &LexicalContext<'_>,
    ) -> Result<Validated> {
        match &self.variety {
            Variety::Atomic(native) => Ok(self.validate_atomic(types, *native, lexical, ctx)),
            Variety::List { item } => self.validate_list(types, *item, lexical, ctx),
            Variety::Union { members } => self.validate_union(types, members, lexical, ctx),
        }
    }

    fn validate_atomic(
        &self,
        types: &Components,
        native: NativeType,
        lexical: &str,
        ctx: &LexicalContext<'_>,
    ) -> Validated {
        let normalized = self.white_space.normalize(lexical);
        let value = match parse_lexical(native, &normalized, ctx.resolver) {
            Ok(value) => value,
            Err(reason) => {
                let violation = LexicalViolation::new(self.display_name(), native, normalized, reason);
                return Err(vec![violation.into()]);
            }
        };
        let atom = Atom::new(native, value);

        let length = match native.primitive() {
            NativeType::QName | NativeType::Notation => None,
            NativeType::HexBinary | NativeType::Base64Binary => {
                atom.as_bytes().map(|b| (b.len(), Uom::Octets))
            }
            _ => Some((normalized.chars().count(), Uom::Characters)),
        };
        let atoms = [atom];
        let subject = FacetSubject {
            lexical: &normalized,
            value: &atoms,
            length,
        };
        self.check_facets(&subject, ctx)?;

        let [atom] = atoms;
        let atom = match types.overlay_name(self) {
            Some(name) => Atom::make_foreign(name, atom),
            None => atom,
        };
        Ok(vec![atom])
    }

    fn validate_list(
        &self,
        types: &Components,
        item: TypeId,
        lexical: &str,
        ctx: &LexicalContext<'_>,
    ) -> Result<Validated> {
        let item_type = types.require_simple(item)?;
        let normalized = WhiteSpace::Collapse.normalize(lexical);
        let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
        if tokens.len() > ctx.max_list_items {
            return Err(Error::LimitExceeded(format!(
                "list of {} items exceeds maximum {}",
                tokens.len(),
                ctx.max_list_items
            )));
        }

        let mut atoms = Vec::with_capacity(tokens.len());
        let mut violations = Vec::new();
        for token in &tokens {
            match item_type.validate(types, token, ctx)? {
                Ok(items) => atoms.extend(items),
                Err(errors) => {
                    violations.extend(errors);
                    if !ctx.collect {
                        return Ok(Err(violations));
                    }
                }
            }
        }
        if !violations.is_empty() {
            return Ok(Err(violations));
        }

        let subject = FacetSubject {
            lexical: &normalized,
            value: &atoms,
            length: Some((tokens.len(), Uom::ListItems)),
        };
        Ok(self.check_facets(&subject, ctx).map(|_| atoms))
    }

    fn validate_union(
        &self,
        types: &Components,
        members: &[TypeId],
        lexical: &str,
        ctx: &LexicalContext<'_>,
    ) -> Result<Validated> {
        let first_only = LexicalContext {
            collect: false,
            ..*ctx
        };
        let mut accepted = None;
        for member in members {
            if let Ok(atoms) = types.require_simple(*member)?.validate(types, lexical, &first_only)? {
                accepted = Some(atoms);
                break;
            }
        }
        let Some(atoms) = accepted else {
            let name = self.name.as_ref().map(|_| self.display_name());
            return Ok(Err(vec![SimpleTypeViolation::new(name, lexical).into()]));
        };

        let normalized = self.white_space.normalize(lexical);
        let subject = FacetSubject {
            lexical: &normalized,
            value: &atoms,
            length: None,
        };
        Ok(self.check_facets(&subject, ctx).map(|_| atoms))
    }

    fn check_facets(
        &self,
        subject: &FacetSubject<'_>,
        ctx: &LexicalContext<'_>,
    ) -> std::result::Result<(), Vec<ConstraintViolation>> {
        if self.facets.is_empty() {
            return Ok(());
        }
        let name = self.display_name();
        let violations: Vec<ConstraintViolation> = if ctx.collect {
            self.facets
                .check_all(subject, &name)
                .into_iter()
                .map(Into::into)
                .collect()
        } else {
            self.facets
                .check(subject, &name)
                .err()
                .into_iter()
                .map(Into::into)
                .collect()
        };
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
