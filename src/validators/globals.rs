//! Global XSD components management
//!
//! Components live in an arena addressed by stable ids ([`TypeId`],
//! [`ElementId`], [`AttributeId`]). A [`SchemaBuilder`] owns the arena while
//! the schema is assembled; [`SchemaBuilder::lock`] checks the graph and
//! turns it into an immutable [`SchemaCache`] that can be shared between
//! threads.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::atoms::Atom;
use crate::error::{Error, Result, SchemaError};
use crate::namespaces::{QName, XSD_NAMESPACE};

use super::attributes::AttributeDeclaration;
use super::builtins::NativeType;
use super::complex_types::{ComplexType, ContentType, DerivationFlags, DerivationMethod};
use super::elements::ElementDeclaration;
use super::exceptions::{Section, ValidationOutcome};
use super::facets::{Enumerated, Facet, FacetKind, FacetSet, PatternStep, WhiteSpace};
use super::groups::{ModelGroup, ModelType};
use super::particles::{Occurs, Particle, Term};
use super::simple_types::{LexicalContext, SimpleType, Validated, Variety};
use super::wildcards::Wildcard;

/// Identifier of a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

/// Identifier of an element declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// Identifier of an attribute declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId(pub usize);

/// Scope of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Top-level declaration
    Global,
    /// Declared inside a complex type (None if the type is not known)
    Local(Option<TypeId>),
}

const ANY_TYPE: TypeId = TypeId(0);

/// A slot of the type arena
#[derive(Debug, Clone)]
pub enum TypeDefinition {
    /// Simple type
    Simple(SimpleType),
    /// Complex type
    Complex(ComplexType),
    /// Forward reference not yet defined
    Reserved(QName),
}

impl TypeDefinition {
    /// Type name
    pub fn name(&self) -> Option<&QName> {
        match self {
            TypeDefinition::Simple(st) => st.name.as_ref(),
            TypeDefinition::Complex(ct) => ct.name.as_ref(),
            TypeDefinition::Reserved(name) => Some(name),
        }
    }

    /// Base type
    pub fn base(&self) -> Option<TypeId> {
        match self {
            TypeDefinition::Simple(st) => st.base,
            TypeDefinition::Complex(ct) => ct.base,
            TypeDefinition::Reserved(_) => None,
        }
    }

    /// Derivation method from the base
    pub fn derivation(&self) -> DerivationMethod {
        match self {
            TypeDefinition::Simple(st) => st.derivation,
            TypeDefinition::Complex(ct) => ct.derivation,
            TypeDefinition::Reserved(_) => DerivationMethod::Restriction,
        }
    }

    /// Final flags
    pub fn final_set(&self) -> DerivationFlags {
        match self {
            TypeDefinition::Simple(st) => st.final_set,
            TypeDefinition::Complex(ct) => ct.final_set,
            TypeDefinition::Reserved(_) => DerivationFlags::default(),
        }
    }

    /// Whether the type is abstract
    pub fn is_abstract(&self) -> bool {
        match self {
            TypeDefinition::Simple(st) => st.is_abstract(),
            TypeDefinition::Complex(ct) => ct.is_abstract,
            TypeDefinition::Reserved(_) => false,
        }
    }

    /// As a simple type
    pub fn as_simple(&self) -> Option<&SimpleType> {
        match self {
            TypeDefinition::Simple(st) => Some(st),
            _ => None,
        }
    }

    /// As a complex type
    pub fn as_complex(&self) -> Option<&ComplexType> {
        match self {
            TypeDefinition::Complex(ct) => Some(ct),
            _ => None,
        }
    }
}

// =============================================================================
// Arena
// =============================================================================

/// The component arena shared by the builder and the locked cache
#[derive(Debug, Clone, Default)]
pub struct Components {
    types: Vec<TypeDefinition>,
    elements: Vec<ElementDeclaration>,
    attributes: Vec<AttributeDeclaration>,
    type_names: IndexMap<QName, TypeId>,
    element_names: IndexMap<QName, ElementId>,
    attribute_names: IndexMap<QName, AttributeId>,
}

impl Components {
    /// The anyType definition
    pub fn any_type(&self) -> TypeId {
        ANY_TYPE
    }

    /// The built-in simple type for a native type
    pub fn native(&self, native: NativeType) -> TypeId {
        TypeId(1 + native as usize)
    }

    /// Type definition by id
    pub fn type_definition(&self, id: TypeId) -> Option<&TypeDefinition> {
        self.types.get(id.0)
    }

    /// Simple type by id
    pub fn simple_type(&self, id: TypeId) -> Option<&SimpleType> {
        self.type_definition(id).and_then(TypeDefinition::as_simple)
    }

    /// Complex type by id
    pub fn complex_type(&self, id: TypeId) -> Option<&ComplexType> {
        self.type_definition(id).and_then(TypeDefinition::as_complex)
    }

    /// Simple type by id, or a precondition error
    pub fn require_simple(&self, id: TypeId) -> Result<&SimpleType> {
        self.simple_type(id)
            .ok_or_else(|| Error::precondition(format!("type #{} is not a simple type", id.0)))
    }

    /// Element declaration by id
    pub fn element(&self, id: ElementId) -> Option<&ElementDeclaration> {
        self.elements.get(id.0)
    }

    /// Attribute declaration by id
    pub fn attribute(&self, id: AttributeId) -> Option<&AttributeDeclaration> {
        self.attributes.get(id.0)
    }

    /// Global type by name
    pub fn find_type(&self, name: &QName) -> Option<TypeId> {
        self.type_names.get(name).copied()
    }

    /// Global element by name
    pub fn find_element(&self, name: &QName) -> Option<ElementId> {
        self.element_names.get(name).copied()
    }

    /// Global attribute by name
    pub fn find_attribute(&self, name: &QName) -> Option<AttributeId> {
        self.attribute_names.get(name).copied()
    }

    /// Number of type definitions
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Name of a type for diagnostics
    pub fn type_name(&self, id: TypeId) -> String {
        match self.type_definition(id) {
            Some(TypeDefinition::Simple(st)) => st.display_name(),
            Some(def) => match def.name() {
                Some(name) if name.namespace.as_deref() == Some(XSD_NAMESPACE) => {
                    format!("xs:{}", name.local_name)
                }
                Some(name) => name.to_string(),
                None => "{anonymous}".to_string(),
            },
            None => format!("#{}", id.0),
        }
    }

    /// Ids along the base chain, starting at `id` itself
    pub fn ancestors(&self, id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        let limit = self.types.len();
        std::iter::successors(Some(id), move |current| {
            self.type_definition(*current).and_then(TypeDefinition::base)
        })
        .take(limit + 1)
    }

    /// Name carried by atoms of a simple type: the nearest named ancestor
    /// outside the XSD namespace
    pub fn overlay_name(&self, simple: &SimpleType) -> Option<QName> {
        let is_user = |name: &QName| name.namespace.as_deref() != Some(XSD_NAMESPACE);
        if let Some(name) = simple.name.as_ref().filter(|n| is_user(n)) {
            return Some(name.clone());
        }
        if simple.name.is_some() {
            return None;
        }
        simple.base.and_then(|base| {
            self.ancestors(base)
                .filter_map(|id| self.type_definition(id).and_then(TypeDefinition::name))
                .next()
                .filter(|name| is_user(name))
                .cloned()
        })
    }

    /// Derivation methods leading from `ty` up to `ancestor`, if it derives from it.
    ///
    /// A type also derives from a union that lists it (or one of its
    /// ancestors) as a member.
    pub fn derivation_path(&self, ty: TypeId, ancestor: TypeId) -> Option<Vec<DerivationMethod>> {
        let members = match self.simple_type(ancestor).map(|st| &st.variety) {
            Some(Variety::Union { members }) => members.as_slice(),
            _ => &[],
        };
        let mut methods = Vec::new();
        for id in self.ancestors(ty) {
            if id == ancestor || members.contains(&id) {
                return Some(methods);
            }
            let def = self.type_definition(id)?;
            methods.push(def.derivation());
        }
        None
    }

    fn push_type(&mut self, def: TypeDefinition) -> TypeId {
        let id = TypeId(self.types.len());
        if let Some(name) = def.name().cloned() {
            self.type_names.insert(name, id);
        }
        self.types.push(def);
        id
    }
}

fn schema_error(section: Section, part: &'static str, message: impl Into<String>) -> Error {
    SchemaError::new(ValidationOutcome::new(section, part), message).into()
}

// =============================================================================
// Builder
// =============================================================================

/// Mutable, single-owner construction of the component graph
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    components: Components,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    /// A builder with every built-in type registered
    pub fn new() -> Self {
        let mut components = Components::default();

        let any_type = ComplexType::builder(Some(QName::xsd("anyType")))
            .mixed(Particle::wildcard(Wildcard::lax_any(), Occurs::zero_or_more()))
            .attribute_wildcard(Wildcard::lax_any())
            .build();
        components.push_type(TypeDefinition::Complex(any_type));

        for native in NativeType::ALL {
            let base = native.base().map(|b| components.native(b)).unwrap_or(ANY_TYPE);
            components.push_type(TypeDefinition::Simple(SimpleType::native(native, Some(base))));
        }

        let lists = [
            ("NMTOKENS", NativeType::NmToken),
            ("IDREFS", NativeType::IdRef),
            ("ENTITIES", NativeType::Entity),
        ];
        for (name, item) in lists {
            let list = SimpleType {
                name: Some(QName::xsd(name)),
                base: Some(components.native(NativeType::AnySimpleType)),
                derivation: DerivationMethod::List,
                variety: Variety::List {
                    item: components.native(item),
                },
                facets: FacetSet {
                    min_length: Some(1),
                    ..FacetSet::default()
                },
                white_space: WhiteSpace::Collapse,
                final_set: DerivationFlags::default(),
            };
            components.push_type(TypeDefinition::Simple(list));
        }

        Self { components }
    }

    /// The arena being built
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// The anyType definition
    pub fn any_type(&self) -> TypeId {
        ANY_TYPE
    }

    /// The built-in simple type for a native type
    pub fn native(&self, native: NativeType) -> TypeId {
        self.components.native(native)
    }

    /// Reserve a named type slot for a forward reference
    pub fn reserve_type(&mut self, name: QName) -> TypeId {
        match self.components.find_type(&name) {
            Some(id) => id,
            None => self.components.push_type(TypeDefinition::Reserved(name)),
        }
    }

    fn install(&mut self, def: TypeDefinition) -> Result<TypeId> {
        if let Some(name) = def.name().cloned() {
            if let Some(id) = self.components.find_type(&name) {
                return match self.components.types.get_mut(id.0) {
                    Some(slot @ TypeDefinition::Reserved(_)) => {
                        *slot = def;
                        Ok(id)
                    }
                    _ => Err(schema_error(
                        Section::SchPropsCorrect,
                        "2",
                        format!("duplicate type definition '{}'", name),
                    )),
                };
            }
        }
        Ok(self.components.push_type(def))
    }

    fn defined(&self, id: TypeId) -> Result<&TypeDefinition> {
        match self.components.type_definition(id) {
            Some(TypeDefinition::Reserved(name)) => Err(Error::precondition(format!(
                "type '{}' must be defined before types derived from it",
                name
            ))),
            Some(def) => Ok(def),
            None => Err(Error::precondition(format!("unknown type #{}", id.0))),
        }
    }

    fn known(&self, id: TypeId) -> Result<()> {
        self.components
            .type_definition(id)
            .map(|_| ())
            .ok_or_else(|| Error::precondition(format!("unknown type #{}", id.0)))
    }

    /// Add a fully formed simple type
    pub fn add_simple_type(&mut self, simple: SimpleType) -> Result<TypeId> {
        if let Some(base) = simple.base {
            self.known(base)?;
        }
        self.install(TypeDefinition::Simple(simple))
    }

    /// Set the final flags of a type
    pub fn set_final(&mut self, id: TypeId, flags: DerivationFlags) -> Result<()> {
        match self.components.types.get_mut(id.0) {
            Some(TypeDefinition::Simple(st)) => st.final_set = flags,
            Some(TypeDefinition::Complex(ct)) => ct.final_set = flags,
            _ => return Err(Error::precondition(format!("type #{} is not defined", id.0))),
        }
        Ok(())
    }

    /// Derive a simple type by restriction.
    ///
    /// Facet literals are parsed against the base type and merged with the
    /// inherited facets; a facet that would loosen the base is an error.
    pub fn derive_restriction(
        &mut self,
        name: Option<QName>,
        base: TypeId,
        facets: Vec<Facet>,
    ) -> Result<TypeId> {
        let base_type = match self.defined(base)? {
            TypeDefinition::Simple(st) => st.clone(),
            _ => {
                return Err(Error::precondition(format!(
                    "restriction base '{}' is not a simple type",
                    self.components.type_name(base)
                )))
            }
        };
        if base_type.final_set.restriction {
            return Err(schema_error(
                Section::StPropsCorrect,
                "3",
                format!("type '{}' is final for restriction", base_type.display_name()),
            ));
        }

        let mut local = FacetSet::new();
        let mut white_space = base_type.white_space;
        for facet in facets {
            let kind = facet.kind();
            if !admits(&base_type, kind) {
                return Err(schema_error(
                    Section::CosApplicableFacets,
                    "1",
                    format!(
                        "facet '{}' is not applicable to type '{}'",
                        kind,
                        base_type.display_name()
                    ),
                ));
            }
            match facet {
                Facet::Length(n) => local.length = Some(n),
                Facet::MinLength(n) => local.min_length = Some(n),
                Facet::MaxLength(n) => local.max_length = Some(n),
                Facet::Pattern(sources) => local.patterns.push(PatternStep::compile(sources)?),
                Facet::Enumeration(literals) => {
                    let mut members = Vec::with_capacity(literals.len());
                    for lexical in literals {
                        let value = self.facet_value(&base_type, &lexical, kind)?;
                        members.push(Enumerated { lexical, value });
                    }
                    local.enumeration = Some(members);
                }
                Facet::WhiteSpace(ws) => {
                    if ws < base_type.white_space {
                        return Err(schema_error(
                            Section::ValidRestriction(FacetKind::WhiteSpace),
                            "1",
                            format!(
                                "whiteSpace '{}' is looser than the inherited '{}'",
                                ws.as_str(),
                                base_type.white_space.as_str()
                            ),
                        ));
                    }
                    white_space = ws;
                }
                Facet::MinInclusive(lexical) => {
                    local.min_inclusive = Some(self.facet_bound(&base_type, &lexical, kind)?)
                }
                Facet::MaxInclusive(lexical) => {
                    local.max_inclusive = Some(self.facet_bound(&base_type, &lexical, kind)?)
                }
                Facet::MinExclusive(lexical) => {
                    local.min_exclusive = Some(self.facet_bound(&base_type, &lexical, kind)?)
                }
                Facet::MaxExclusive(lexical) => {
                    local.max_exclusive = Some(self.facet_bound(&base_type, &lexical, kind)?)
                }
                Facet::TotalDigits(n) => local.total_digits = Some(n),
                Facet::FractionDigits(n) => local.fraction_digits = Some(n),
            }
        }

        let facets = base_type
            .facets
            .restrict(local)
            .map_err(|e| match name.as_ref() {
                Some(name) => e.with_component(name.to_string()),
                None => e,
            })?;
        self.install(TypeDefinition::Simple(SimpleType {
            name,
            base: Some(base),
            derivation: DerivationMethod::Restriction,
            variety: base_type.variety.clone(),
            facets,
            white_space,
            final_set: DerivationFlags::default(),
        }))
    }

    fn facet_value(&self, base: &SimpleType, lexical: &str, kind: FacetKind) -> Result<Vec<Atom>> {
        let checked: Validated = base.validate(&self.components, lexical, &LexicalContext::default())?;
        checked.map_err(|violations| {
            let reason = violations
                .first()
                .map(|v| v.message())
                .unwrap_or_default();
            schema_error(
                Section::ValidRestriction(kind),
                "1",
                format!("{} value '{}' is not valid for the base type: {}", kind, lexical, reason),
            )
        })
    }

    fn facet_bound(&self, base: &SimpleType, lexical: &str, kind: FacetKind) -> Result<Atom> {
        self.facet_value(base, lexical, kind)?
            .into_iter()
            .next()
            .map(|atom| atom.up_cast())
            .ok_or_else(|| Error::precondition(format!("{} value '{}' is empty", kind, lexical)))
    }

    /// Derive a list type of `item`
    pub fn derive_list(&mut self, name: Option<QName>, item: TypeId) -> Result<TypeId> {
        self.known(item)?;
        match self.components.type_definition(item) {
            Some(TypeDefinition::Complex(_)) => {
                return Err(Error::precondition("list item type must be a simple type"))
            }
            Some(TypeDefinition::Simple(st)) => {
                if st.is_list() {
                    return Err(schema_error(
                        Section::CosStRestricts,
                        "2.1",
                        format!("item type '{}' of a list cannot itself be a list", st.display_name()),
                    ));
                }
                if st.final_set.list {
                    return Err(schema_error(
                        Section::StPropsCorrect,
                        "3",
                        format!("type '{}' is final for list", st.display_name()),
                    ));
                }
            }
            _ => {}
        }
        let any_simple = self.native(NativeType::AnySimpleType);
        self.install(TypeDefinition::Simple(SimpleType {
            name,
            base: Some(any_simple),
            derivation: DerivationMethod::List,
            variety: Variety::List { item },
            facets: FacetSet::new(),
            white_space: WhiteSpace::Collapse,
            final_set: DerivationFlags::default(),
        }))
    }

    /// Derive a union of `members`, tried in the given order
    pub fn derive_union(&mut self, name: Option<QName>, members: Vec<TypeId>) -> Result<TypeId> {
        if members.is_empty() {
            return Err(Error::precondition("a union needs at least one member type"));
        }
        for member in &members {
            self.known(*member)?;
            match self.components.type_definition(*member) {
                Some(TypeDefinition::Complex(_)) => {
                    return Err(Error::precondition("union member types must be simple types"))
                }
                Some(TypeDefinition::Simple(st)) if st.final_set.union => {
                    return Err(schema_error(
                        Section::StPropsCorrect,
                        "3",
                        format!("type '{}' is final for union", st.display_name()),
                    ))
                }
                _ => {}
            }
        }
        let any_simple = self.native(NativeType::AnySimpleType);
        self.install(TypeDefinition::Simple(SimpleType {
            name,
            base: Some(any_simple),
            derivation: DerivationMethod::Union,
            variety: Variety::Union { members },
            facets: FacetSet::new(),
            white_space: WhiteSpace::Collapse,
            final_set: DerivationFlags::default(),
        }))
    }

    /// Add a complex type.
    ///
    /// A type without a base restricts anyType. Attribute uses of a complex
    /// base are inherited; extension also appends the local content to the
    /// base content and unions the attribute wildcards.
    pub fn add_complex_type(&mut self, complex: ComplexType) -> Result<TypeId> {
        let mut ty = complex;
        let Some(base) = ty.base else {
            ty.base = Some(ANY_TYPE);
            ty.derivation = DerivationMethod::Restriction;
            return self.install(TypeDefinition::Complex(ty));
        };

        match self.defined(base)? {
            TypeDefinition::Simple(st) => {
                if ty.derivation != DerivationMethod::Extension {
                    return Err(Error::precondition(format!(
                        "complex type can only extend simple type '{}'",
                        st.display_name()
                    )));
                }
                if st.final_set.extension {
                    return Err(schema_error(
                        Section::CtPropsCorrect,
                        "1",
                        format!("type '{}' is final for extension", st.display_name()),
                    ));
                }
                if ty.content == ContentType::Empty {
                    ty.content = ContentType::Simple(base);
                }
            }
            TypeDefinition::Complex(bt) => {
                if bt.final_set.is_blocked(ty.derivation) {
                    return Err(schema_error(
                        Section::CtPropsCorrect,
                        "1",
                        format!(
                            "type '{}' is final for {}",
                            self.components.type_name(base),
                            ty.derivation
                        ),
                    ));
                }
                let mut attributes = bt.attributes.clone();
                attributes.extend(std::mem::take(&mut ty.attributes));
                ty.attributes = attributes;

                if ty.derivation == DerivationMethod::Extension {
                    ty.attribute_wildcard = match (ty.attribute_wildcard.take(), &bt.attribute_wildcard) {
                        (Some(local), Some(inherited)) => Some(local.union(inherited)),
                        (local, inherited) => local.or_else(|| inherited.clone()),
                    };
                    ty.content = extend_content(&bt.content, ty.content);
                }
            }
            TypeDefinition::Reserved(_) => {}
        }
        self.install(TypeDefinition::Complex(ty))
    }

    /// Add an element declaration; global declarations are registered by name
    pub fn add_element(&mut self, element: ElementDeclaration) -> Result<ElementId> {
        self.known(element.type_id)?;
        if let Some(head) = element.substitution_group {
            if self.components.element(head).is_none() {
                return Err(Error::precondition(format!(
                    "unknown substitution group head #{}",
                    head.0
                )));
            }
        }
        let id = ElementId(self.components.elements.len());
        if element.is_global() {
            if self.components.element_names.contains_key(&element.name) {
                return Err(schema_error(
                    Section::SchPropsCorrect,
                    "2",
                    format!("duplicate element declaration '{}'", element.name),
                ));
            }
            self.components.element_names.insert(element.name.clone(), id);
        }
        self.components.elements.push(element);
        Ok(id)
    }

    /// Add an attribute declaration; global declarations are registered by name
    pub fn add_attribute(&mut self, attribute: AttributeDeclaration) -> Result<AttributeId> {
        self.known(attribute.type_id)?;
        if let Some(TypeDefinition::Complex(_)) = self.components.type_definition(attribute.type_id) {
            return Err(Error::precondition(format!(
                "attribute '{}' must have a simple type",
                attribute.name
            )));
        }
        let id = AttributeId(self.components.attributes.len());
        if attribute.scope == Scope::Global {
            if self.components.attribute_names.contains_key(&attribute.name) {
                return Err(schema_error(
                    Section::SchPropsCorrect,
                    "2",
                    format!("duplicate attribute declaration '{}'", attribute.name),
                ));
            }
            self.components.attribute_names.insert(attribute.name.clone(), id);
        }
        self.components.attributes.push(attribute);
        Ok(id)
    }

    /// Check the graph and freeze it
    pub fn lock(self) -> Result<SchemaCache> {
        let components = self.components;

        for (index, def) in components.types.iter().enumerate() {
            let id = TypeId(index);
            if let TypeDefinition::Reserved(name) = def {
                return Err(schema_error(
                    Section::SrcResolve,
                    "1",
                    format!("type '{}' is referenced but never defined", name),
                ));
            }

            let mut seen = HashSet::new();
            if components.ancestors(id).any(|ancestor| !seen.insert(ancestor)) {
                let (section, part) = match def {
                    TypeDefinition::Simple(_) => (Section::StPropsCorrect, "2"),
                    _ => (Section::CtPropsCorrect, "3"),
                };
                return Err(schema_error(
                    section,
                    part,
                    format!("circular derivation of type '{}'", components.type_name(id)),
                ));
            }

            match def {
                TypeDefinition::Simple(st) => check_variety(&components, st)?,
                TypeDefinition::Complex(ct) => {
                    if let Some(particle) = ct.content.particle() {
                        check_all_limited(particle, true).map_err(|e| match ct.name.as_ref() {
                            Some(name) => e.with_component(name.to_string()),
                            None => e,
                        })?;
                    }
                    if let ContentType::Simple(simple) = ct.content {
                        if components.simple_type(simple).is_none() {
                            return Err(Error::precondition(format!(
                                "simple content of '{}' is not a simple type",
                                components.type_name(id)
                            )));
                        }
                    }
                }
                TypeDefinition::Reserved(_) => {}
            }
        }

        for attribute in &components.attributes {
            if components.simple_type(attribute.type_id).is_none() {
                return Err(Error::precondition(format!(
                    "attribute '{}' must have a simple type",
                    attribute.name
                )));
            }
        }

        debug!(
            types = components.types.len(),
            elements = components.elements.len(),
            attributes = components.attributes.len(),
            "component graph locked"
        );
        Ok(SchemaCache { components })
    }
}

fn admits(base: &SimpleType, kind: FacetKind) -> bool {
    match base.variety {
        Variety::Atomic(native) => native.admits(kind),
        Variety::List { .. } => matches!(
            kind,
            FacetKind::Length
                | FacetKind::MinLength
                | FacetKind::MaxLength
                | FacetKind::Pattern
                | FacetKind::Enumeration
                | FacetKind::WhiteSpace
        ),
        Variety::Union { .. } => matches!(kind, FacetKind::Pattern | FacetKind::Enumeration),
    }
}

fn extend_content(base: &ContentType, local: ContentType) -> ContentType {
    match (base, local) {
        (_, ContentType::Empty) => base.clone(),
        (ContentType::ElementOnly(inherited), ContentType::ElementOnly(added)) => {
            ContentType::ElementOnly(ModelGroup::sequence(vec![inherited.clone(), added]).into_particle())
        }
        (
            ContentType::ElementOnly(inherited) | ContentType::Mixed(inherited),
            ContentType::ElementOnly(added) | ContentType::Mixed(added),
        ) => ContentType::Mixed(ModelGroup::sequence(vec![inherited.clone(), added]).into_particle()),
        (_, local) => local,
    }
}

fn check_variety(components: &Components, simple: &SimpleType) -> Result<()> {
    match &simple.variety {
        Variety::List { item } => match components.simple_type(*item) {
            Some(st) if !st.is_list() => Ok(()),
            _ => Err(schema_error(
                Section::CosStRestricts,
                "2.1",
                format!(
                    "item type of list '{}' must be a non-list simple type",
                    simple.display_name()
                ),
            )),
        },
        Variety::Union { members } => {
            if members.iter().all(|m| components.simple_type(*m).is_some()) {
                Ok(())
            } else {
                Err(schema_error(
                    Section::CosStRestricts,
                    "3.1",
                    format!("members of union '{}' must be simple types", simple.display_name()),
                ))
            }
        }
        Variety::Atomic(_) => Ok(()),
    }
}

// An all group must be the whole content model and each of its particles
// may occur at most once.
fn check_all_limited(particle: &Particle, top: bool) -> std::result::Result<(), SchemaError> {
    let limited = |part: &'static str, message: &str| {
        SchemaError::new(ValidationOutcome::new(Section::SccAllGroupLimited, part), message)
    };
    let Term::Group(group) = &particle.term else {
        return Ok(());
    };
    if group.compositor == ModelType::All {
        if !top || particle.occurs.max.map_or(true, |max| max > 1) {
            return Err(limited(
                "1",
                "an all model group must be the whole content model and occur at most once",
            ));
        }
        for child in &group.particles {
            if matches!(child.term, Term::Group(_)) {
                return Err(limited("2", "an all model group may only contain element particles"));
            }
            if child.occurs.max.map_or(true, |max| max > 1) {
                return Err(limited("2", "maxOccurs of an all-group particle must be 0 or 1"));
            }
        }
    }
    for child in &group.particles {
        check_all_limited(child, false)?;
    }
    Ok(())
}

// =============================================================================
// Locked cache
// =============================================================================

/// The immutable, locked component graph
#[derive(Debug, Clone)]
pub struct SchemaCache {
    components: Components,
}

impl SchemaCache {
    /// The underlying arena
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// The anyType definition
    pub fn any_type(&self) -> TypeId {
        ANY_TYPE
    }

    /// The built-in simple type for a native type
    pub fn native(&self, native: NativeType) -> TypeId {
        self.components.native(native)
    }

    /// Global type by name
    pub fn find_type(&self, name: &QName) -> Option<TypeId> {
        self.components.find_type(name)
    }

    /// Global element declaration by name
    pub fn find_element(&self, name: &QName) -> Option<ElementId> {
        self.components.find_element(name)
    }

    /// Global attribute declaration by name
    pub fn find_attribute(&self, name: &QName) -> Option<AttributeId> {
        self.components.find_attribute(name)
    }

    /// Global type by name, or a precondition error
    pub fn require_type(&self, name: &QName) -> Result<TypeId> {
        self.find_type(name)
            .ok_or_else(|| Error::precondition(format!("no type named '{}'", name)))
    }

    /// Global element by name, or a precondition error
    pub fn require_element(&self, name: &QName) -> Result<ElementId> {
        self.find_element(name)
            .ok_or_else(|| Error::precondition(format!("no element named '{}'", name)))
    }

    /// Type definition by id
    pub fn type_definition(&self, id: TypeId) -> Result<&TypeDefinition> {
        self.components
            .type_definition(id)
            .ok_or_else(|| Error::precondition(format!("unknown type #{}", id.0)))
    }

    /// Element declaration by id
    pub fn element(&self, id: ElementId) -> Result<&ElementDeclaration> {
        self.components
            .element(id)
            .ok_or_else(|| Error::precondition(format!("unknown element #{}", id.0)))
    }

    /// Attribute declaration by id
    pub fn attribute(&self, id: AttributeId) -> Result<&AttributeDeclaration> {
        self.components
            .attribute(id)
            .ok_or_else(|| Error::precondition(format!("unknown attribute #{}", id.0)))
    }

    /// Whether the derivation chain of `ty` reaches the type named
    /// `{namespace}name` using only the given methods (any method when empty)
    pub fn derived_from(
        &self,
        ty: TypeId,
        namespace: Option<&str>,
        name: &str,
        methods: &[DerivationMethod],
    ) -> bool {
        for id in self.components.ancestors(ty) {
            let Some(def) = self.components.type_definition(id) else {
                return false;
            };
            if def.name().is_some_and(|n| n.matches(namespace, name)) {
                return true;
            }
            if !methods.is_empty() && !methods.contains(&def.derivation()) {
                return false;
            }
        }
        false
    }

    /// Derivation methods leading from `ty` to `ancestor`
    pub fn derivation_path(&self, ty: TypeId, ancestor: TypeId) -> Option<Vec<DerivationMethod>> {
        self.components.derivation_path(ty, ancestor)
    }

    /// Whether a type is abstract
    pub fn is_abstract(&self, ty: TypeId) -> bool {
        self.components
            .type_definition(ty)
            .is_some_and(TypeDefinition::is_abstract)
    }

    /// Scope of an element declaration
    pub fn scope_extent(&self, element: ElementId) -> Option<Scope> {
        self.components.element(element).map(|e| e.scope)
    }

    /// Final flags of a type
    pub fn final_set(&self, ty: TypeId) -> DerivationFlags {
        self.components
            .type_definition(ty)
            .map(TypeDefinition::final_set)
            .unwrap_or_default()
    }

    /// The global element named `name` if it belongs, directly or
    /// transitively, to the substitution group headed by `head`
    pub fn substitutes_for(&self, name: &QName, head: ElementId) -> Option<ElementId> {
        let member = self.find_element(name)?;
        let mut current = self.components.element(member)?.substitution_group;
        let mut steps = 0;
        while let Some(next) = current {
            if next == head {
                return Some(member);
            }
            steps += 1;
            if steps > self.components.elements.len() {
                return None;
            }
            current = self.components.element(next)?.substitution_group;
        }
        None
    }

    /// Whether the head's block and final sets admit `member` as a substitute
    pub fn substitution_allowed(&self, member: ElementId, head: ElementId) -> bool {
        let (Some(member), Some(head)) = (self.components.element(member), self.components.element(head))
        else {
            return false;
        };
        if head.block.substitution {
            return false;
        }
        match self.derivation_path(member.type_id, head.type_id) {
            Some(methods) => !methods
                .iter()
                .any(|m| head.block.is_blocked(*m) || head.final_set.is_blocked(*m)),
            None => false,
        }
    }

    /// Validate a lexical form against a simple type, stopping at the first violation.
    ///
    /// A violation is returned as [`Error::Aborted`]; a type that is not a
    /// simple type of this cache is a precondition failure.
    pub fn validate_lexical(&self, lexical: &str, ty: TypeId) -> Result<Vec<Atom>> {
        let simple = self.components.require_simple(ty)?;
        match simple.validate(&self.components, lexical, &LexicalContext::default())? {
            Ok(atoms) => Ok(atoms),
            Err(violations) => match violations.into_iter().next() {
                Some(first) => Err(crate::error::Abort::new(first).into()),
                None => Err(Error::precondition("validation failed without a violation")),
            },
        }
    }

    /// Validate a lexical form against a simple type, collecting every violation
    pub fn validate_lexical_all(&self, lexical: &str, ty: TypeId) -> Result<Validated> {
        let ctx = LexicalContext {
            collect: true,
            ..LexicalContext::default()
        };
        self.components.require_simple(ty)?.validate(&self.components, lexical, &ctx)
    }
}
