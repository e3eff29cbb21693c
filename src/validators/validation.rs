//! Instance validation
//!
//! [`InstanceValidator`] walks an instance tree through [`XmlNode`], assesses
//! every element against its governing declaration and type, and builds a
//! parallel tree of [`TypedElement`]s carrying the typed values.
//!
//! Violations are handed to an [`ErrorHandler`]. When the handler lets
//! validation go on, the walk recovers as well as it can: a rejected value
//! is left untyped, a rejected content model still has its children
//! assessed against their global declarations.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#cvc-elt

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::atoms::{cast_as, Atom, Emulation};
use crate::documents::{is_xml_whitespace, NodeKind, XmlNode};
use crate::error::{Abort, Error, Result};
use crate::limits::ValidationOptions;
use crate::namespaces::{split_prefixed, QName, XSI_NAMESPACE};

use super::attributes::ValueConstraint;
use super::builtins::{NativeType, PrefixResolver};
use super::complex_types::{ComplexType, ContentType, ContentTypeLabel, DerivationFlags};
use super::elements::ElementDeclaration;
use super::exceptions::{
    AttributeViolation, ConstraintViolation, ContentModelViolation, ElementViolation,
    LexicalViolation, Section, SubstitutionViolation,
};
use super::globals::{ElementId, SchemaCache, TypeDefinition, TypeId};
use super::handlers::{Collector, ErrorHandler, FailFast};
use super::models::{match_content, Binding, ContentMatch};
use super::particles::{Particle, Term};
use super::simple_types::{LexicalContext, Validated};
use super::wildcards::ProcessContents;

// =============================================================================
// Typed tree
// =============================================================================

/// An assessed element with its typed values
#[derive(Debug, Clone, PartialEq)]
pub struct TypedElement {
    /// Element name
    pub name: QName,
    /// Name of the governing type
    pub type_name: String,
    /// Typed attribute values, defaults included
    pub attributes: IndexMap<QName, Vec<Atom>>,
    /// Typed simple content; `None` for complex content and rejected values
    pub value: Option<Vec<Atom>>,
    /// Whether the element was nilled with `xsi:nil`
    pub nilled: bool,
    /// Assessed children. Children matched by a skip wildcard are not
    /// assessed and do not appear.
    pub children: Vec<TypedElement>,
}

impl TypedElement {
    fn new(name: QName, type_name: String) -> Self {
        Self {
            name,
            type_name,
            attributes: IndexMap::new(),
            value: None,
            nilled: false,
            children: Vec::new(),
        }
    }

    /// Typed value of an attribute
    pub fn attribute(&self, name: &QName) -> Option<&[Atom]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    /// First child with the given local name
    pub fn child(&self, local_name: &str) -> Option<&TypedElement> {
        self.children.iter().find(|c| c.name.local_name == local_name)
    }

    /// The simple content rendered under an emulation, list items
    /// separated by a single space
    pub fn text(&self, emulation: Emulation) -> Option<String> {
        self.value.as_ref().map(|atoms| {
            atoms
                .iter()
                .map(|atom| atom.form(emulation))
                .collect::<Vec<_>>()
                .join(" ")
        })
    }
}

// =============================================================================
// Report
// =============================================================================

/// One violation in serializable form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Constraint section, e.g. `cvc-complex-type`
    pub section: Section,
    /// Part number within the section
    pub part: &'static str,
    /// Human-readable message
    pub message: String,
}

impl From<&ConstraintViolation> for Diagnostic {
    fn from(violation: &ConstraintViolation) -> Self {
        let outcome = violation.outcome();
        Self {
            section: outcome.section,
            part: outcome.part,
            message: violation.message(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.section, self.part, self.message)
    }
}

/// Result of a collect-all validation run
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Whether no violation was found
    pub valid: bool,
    /// Whether the error cap stopped validation early
    pub truncated: bool,
    /// Violations in document order
    pub diagnostics: Vec<Diagnostic>,
    /// The typed tree, absent when the root could not be assessed or the
    /// run was truncated
    #[serde(skip)]
    pub root: Option<TypedElement>,
    /// The violations as values
    #[serde(skip)]
    pub violations: Vec<ConstraintViolation>,
}

impl ValidationReport {
    /// Whether no violation was found
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Pretty-printed JSON of the report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Validates instance trees against a locked schema.
///
/// The validator only borrows the cache, so one cache can serve any number
/// of validators on any number of threads.
#[derive(Debug, Clone)]
pub struct InstanceValidator<'a> {
    cache: &'a SchemaCache,
    options: ValidationOptions,
}

impl<'a> InstanceValidator<'a> {
    /// Create a validator with default options
    pub fn new(cache: &'a SchemaCache) -> Self {
        Self {
            cache,
            options: ValidationOptions::new(),
        }
    }

    /// Replace the options
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate a document or element node, reporting every violation to
    /// `handler`.
    ///
    /// Returns `None` when the root element has no declaration (after
    /// reporting it). A handler abort surfaces as [`Error::Aborted`];
    /// exceeded limits and broken preconditions are errors of their own.
    pub fn validate<N: XmlNode>(
        &self,
        node: &N,
        handler: &mut dyn ErrorHandler,
    ) -> Result<Option<TypedElement>> {
        let root = match node.kind() {
            NodeKind::Element => node.clone(),
            NodeKind::Document => node
                .children()
                .into_iter()
                .find(|child| child.kind() == NodeKind::Element)
                .ok_or_else(|| Error::precondition("document has no root element"))?,
            other => {
                return Err(Error::precondition(format!("cannot validate a {} node", other)))
            }
        };
        let name = root
            .name()
            .ok_or_else(|| Error::precondition("root element has no name"))?;
        debug!(root = %name, "validation started");

        let mut session = Session {
            cache: self.cache,
            options: &self.options,
            handler,
            reported: 0,
        };
        let result = session.root(&root, name);
        debug!(
            violations = session.reported,
            aborted = matches!(result, Err(Error::Aborted(_))),
            "validation finished"
        );
        result
    }

    /// Validate and collect every violation, up to the configured error cap
    pub fn validate_collect<N: XmlNode>(&self, node: &N) -> Result<ValidationReport> {
        let mut collector = Collector::with_cap(self.options.limits.max_errors);
        let (root, truncated) = match self.validate(node, &mut collector) {
            Ok(root) => (root, false),
            Err(Error::Aborted(_)) if collector.is_full() => (None, true),
            Err(e) => return Err(e),
        };
        let violations = collector.into_violations();
        Ok(ValidationReport {
            valid: violations.is_empty(),
            truncated,
            diagnostics: violations.iter().map(Diagnostic::from).collect(),
            root,
            violations,
        })
    }

    /// Validate and stop at the first violation, returned as [`Error::Aborted`]
    pub fn validate_fail_fast<N: XmlNode>(&self, node: &N) -> Result<TypedElement> {
        self.validate(node, &mut FailFast)?
            .ok_or_else(|| Error::precondition("root element was not assessed"))
    }

    /// Whether the tree is valid
    pub fn is_valid<N: XmlNode>(&self, node: &N) -> Result<bool> {
        match self.validate_fail_fast(node) {
            Ok(_) => Ok(true),
            Err(Error::Aborted(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Cast the simple content of an assessed element to `target` under the
    /// configured casting policy. A failed cast is returned as
    /// [`Error::Aborted`] wrapping the cast violation.
    pub fn cast_value(&self, element: &TypedElement, target: NativeType) -> Result<Vec<Atom>> {
        let atoms = element.value.as_deref().ok_or_else(|| {
            Error::precondition(format!("element '{}' has no simple value", element.name))
        })?;
        atoms
            .iter()
            .map(|atom| {
                cast_as(atom, target, &self.options.casting)
                    .map_err(|violation| Error::from(Abort::new(violation.into())))
            })
            .collect()
    }
}

// =============================================================================
// Walk
// =============================================================================

/// Per-run traversal state
struct Session<'v, 'h> {
    cache: &'v SchemaCache,
    options: &'v ValidationOptions,
    handler: &'h mut dyn ErrorHandler,
    reported: usize,
}

/// Element children with their names, and the concatenated character data
struct Content<N> {
    elements: Vec<(QName, N)>,
    text: String,
}

impl<N: XmlNode> Content<N> {
    fn of(node: &N) -> Self {
        let mut elements = Vec::new();
        let mut text = String::new();
        for child in node.children() {
            match child.kind() {
                NodeKind::Element => {
                    if let Some(name) = child.name() {
                        elements.push((name, child));
                    }
                }
                NodeKind::Text => text.push_str(&child.string_value()),
                _ => {}
            }
        }
        Self { elements, text }
    }

    fn has_text(&self) -> bool {
        !is_xml_whitespace(&self.text)
    }
}

impl<'v> Session<'v, '_> {
    fn report(&mut self, violation: impl Into<ConstraintViolation>) -> Result<()> {
        let violation = violation.into();
        trace!(%violation, "violation");
        self.reported += 1;
        self.handler.error(violation)?;
        Ok(())
    }

    fn type_name(&self, ty: TypeId) -> String {
        self.cache.components().type_name(ty)
    }

    fn root<N: XmlNode>(&mut self, root: &N, name: QName) -> Result<Option<TypedElement>> {
        let cache = self.cache;
        match cache.find_element(&name) {
            Some(id) => self.element(root, name, Some(cache.element(id)?), 1).map(Some),
            None if root.attribute(&QName::xsi("type")).is_some() => {
                self.element(root, name, None, 1).map(Some)
            }
            None => {
                self.report(ElementViolation::NoDeclaration { element: name })?;
                Ok(None)
            }
        }
    }

    /// Assess an element against its declaration, or against anyType when
    /// there is none
    fn element<N: XmlNode>(
        &mut self,
        node: &N,
        name: QName,
        decl: Option<&'v ElementDeclaration>,
        depth: usize,
    ) -> Result<TypedElement> {
        self.options.limits.check_depth(depth)?;
        let cache = self.cache;
        let declared = decl.map_or(cache.any_type(), |d| d.type_id);

        if decl.is_some_and(|d| d.is_abstract) {
            self.report(SubstitutionViolation::AbstractElement {
                element: name.clone(),
            })?;
        }
        let ty = self.governing_type(node, &name, decl, declared)?;
        if cache.is_abstract(ty) {
            self.report(SubstitutionViolation::AbstractType {
                element: name.clone(),
                type_name: self.type_name(ty),
            })?;
        }
        trace!(element = %name, type_name = %self.type_name(ty), depth, "assessing element");

        let mut typed = TypedElement::new(name, self.type_name(ty));
        typed.nilled = self.nilled(node, &typed.name, decl)?;
        typed.attributes = self.attributes(node, &typed.name, ty)?;
        if typed.nilled {
            return Ok(typed);
        }

        match cache.type_definition(ty)? {
            TypeDefinition::Simple(_) => {
                typed.value = self.simple_content(node, &typed.name, decl, ty)?;
            }
            TypeDefinition::Complex(complex) => {
                self.complex_content(node, decl, complex, depth, &mut typed)?;
            }
            TypeDefinition::Reserved(reserved) => {
                return Err(Error::precondition(format!(
                    "type '{}' was reserved but never defined",
                    reserved
                )))
            }
        }
        Ok(typed)
    }

    /// The declared type, or the `xsi:type` override when it is admissible
    fn governing_type<N: XmlNode>(
        &mut self,
        node: &N,
        name: &QName,
        decl: Option<&ElementDeclaration>,
        declared: TypeId,
    ) -> Result<TypeId> {
        let Some(xsi_type) = node.attribute(&QName::xsi("type")) else {
            return Ok(declared);
        };
        let cache = self.cache;
        let Some(ty) = resolve_type_name(cache, node, &xsi_type) else {
            self.report(SubstitutionViolation::UnresolvedType {
                element: name.clone(),
                xsi_type,
            })?;
            return Ok(declared);
        };
        if ty == declared {
            return Ok(ty);
        }

        let Some(methods) = cache.derivation_path(ty, declared) else {
            self.report(SubstitutionViolation::NotDerived {
                element: name.clone(),
                type_name: self.type_name(ty),
                declared: self.type_name(declared),
            })?;
            return Ok(declared);
        };
        let blocking = decl
            .map(|d| d.block)
            .unwrap_or_default()
            .merge(cache.final_set(declared))
            .merge(
                cache
                    .type_definition(declared)?
                    .as_complex()
                    .map_or_else(DerivationFlags::default, |c| c.block),
            );
        if let Some(method) = methods.into_iter().find(|m| blocking.is_blocked(*m)) {
            self.report(SubstitutionViolation::BlockedDerivation {
                element: name.clone(),
                type_name: self.type_name(ty),
                declared: self.type_name(declared),
                method,
            })?;
            return Ok(declared);
        }
        trace!(element = %name, type_name = %self.type_name(ty), "xsi:type override");
        Ok(ty)
    }

    fn nilled<N: XmlNode>(
        &mut self,
        node: &N,
        name: &QName,
        decl: Option<&ElementDeclaration>,
    ) -> Result<bool> {
        let Some(raw) = node.attribute(&QName::xsi("nil")) else {
            return Ok(false);
        };
        let Some(decl) = decl else {
            return Ok(false);
        };
        if !decl.nillable {
            self.report(ElementViolation::NotNillable {
                element: name.clone(),
            })?;
            return Ok(false);
        }
        let nil = match raw.trim() {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                self.report(LexicalViolation::new(
                    "xs:boolean",
                    NativeType::Boolean,
                    other,
                    "not a boolean",
                ))?;
                false
            }
        };
        if !nil {
            return Ok(false);
        }

        let content = Content::of(node);
        if !content.elements.is_empty() || !content.text.is_empty() {
            self.report(ElementViolation::NilledWithContent {
                element: name.clone(),
            })?;
        }
        if decl.fixed().is_some() {
            self.report(ElementViolation::NilledFixed {
                element: name.clone(),
            })?;
        }
        Ok(true)
    }

    fn attributes<N: XmlNode>(
        &mut self,
        node: &N,
        element: &QName,
        ty: TypeId,
    ) -> Result<IndexMap<QName, Vec<Atom>>> {
        let cache = self.cache;
        let complex = cache.type_definition(ty)?.as_complex();
        let mut typed = IndexMap::new();

        for (name, value) in node.attributes() {
            if name.namespace.as_deref() == Some(XSI_NAMESPACE) {
                continue;
            }
            let Some(complex) = complex else {
                self.report(AttributeViolation::NotAllowed {
                    element: element.clone(),
                    attribute: name,
                })?;
                continue;
            };
            if let Some(attribute_use) = complex.attribute_use(&name) {
                let atoms = self.attribute_value(
                    node,
                    element,
                    &name,
                    &value,
                    attribute_use.type_id,
                    attribute_use.constraint.as_ref(),
                )?;
                if let Some(atoms) = atoms {
                    typed.insert(name, atoms);
                }
                continue;
            }

            let Some(wildcard) = complex.attribute_wildcard.as_ref().filter(|w| w.matches(&name)) else {
                self.report(AttributeViolation::NotAllowed {
                    element: element.clone(),
                    attribute: name,
                })?;
                continue;
            };
            let declaration = match cache.find_attribute(&name) {
                Some(id) => Some(cache.attribute(id)?),
                None => None,
            };
            match (wildcard.process_contents, declaration) {
                (ProcessContents::Skip, _) | (ProcessContents::Lax, None) => {}
                (_, Some(declaration)) => {
                    let atoms = self.attribute_value(
                        node,
                        element,
                        &name,
                        &value,
                        declaration.type_id,
                        declaration.constraint.as_ref(),
                    )?;
                    if let Some(atoms) = atoms {
                        typed.insert(name, atoms);
                    }
                }
                (ProcessContents::Strict, None) => {
                    self.report(AttributeViolation::Undeclared {
                        element: element.clone(),
                        attribute: name,
                    })?;
                }
            }
        }

        let Some(complex) = complex else {
            return Ok(typed);
        };
        for attribute_use in complex.required_attributes() {
            if node.attribute(&attribute_use.name).is_none() {
                self.report(AttributeViolation::Missing {
                    element: element.clone(),
                    attribute: attribute_use.name.clone(),
                })?;
            }
        }
        if self.options.apply_defaults {
            for attribute_use in complex.attributes.values() {
                let Some(constraint) = &attribute_use.constraint else {
                    continue;
                };
                if attribute_use.required || node.attribute(&attribute_use.name).is_some() {
                    continue;
                }
                if let Some(atoms) = self.lexical_value(node, constraint.lexical(), attribute_use.type_id)? {
                    typed.insert(attribute_use.name.clone(), atoms);
                }
            }
        }
        Ok(typed)
    }

    fn attribute_value<N: XmlNode>(
        &mut self,
        node: &N,
        element: &QName,
        name: &QName,
        value: &str,
        ty: TypeId,
        constraint: Option<&ValueConstraint>,
    ) -> Result<Option<Vec<Atom>>> {
        let atoms = self.lexical_value(node, value, ty)?;
        if let (Some(actual), Some(fixed)) = (&atoms, constraint.and_then(ValueConstraint::fixed)) {
            if !self.matches_fixed(node, actual, fixed, ty)? {
                self.report(AttributeViolation::FixedMismatch {
                    element: element.clone(),
                    attribute: name.clone(),
                    expected: fixed.to_string(),
                    actual: value.to_string(),
                })?;
            }
        }
        Ok(atoms)
    }

    fn check_lexical<N: XmlNode>(
        &self,
        node: &N,
        lexical: &str,
        ty: TypeId,
        collect: bool,
    ) -> Result<Validated> {
        let components = self.cache.components();
        let simple = components.require_simple(ty)?;
        let resolver: PrefixResolver<'_> = &|prefix| node.lookup_namespace(prefix);
        let ctx = LexicalContext {
            resolver: Some(resolver),
            collect,
            max_list_items: self.options.limits.max_list_items,
        };
        simple.validate(components, lexical, &ctx)
    }

    /// Typed value of a lexical form; violations are reported and leave
    /// the value untyped
    fn lexical_value<N: XmlNode>(
        &mut self,
        node: &N,
        lexical: &str,
        ty: TypeId,
    ) -> Result<Option<Vec<Atom>>> {
        match self.check_lexical(node, lexical, ty, true)? {
            Ok(atoms) => Ok(Some(atoms)),
            Err(violations) => {
                for violation in violations {
                    self.report(violation)?;
                }
                Ok(None)
            }
        }
    }

    /// Fixed values compare in the value space; a fixed literal outside the
    /// value space never matches
    fn matches_fixed<N: XmlNode>(
        &self,
        node: &N,
        actual: &[Atom],
        fixed: &str,
        ty: TypeId,
    ) -> Result<bool> {
        Ok(match self.check_lexical(node, fixed, ty, false)? {
            Ok(expected) => {
                expected.len() == actual.len()
                    && expected.iter().zip(actual).all(|(e, a)| e.value_eq(a))
            }
            Err(_) => false,
        })
    }

    fn simple_content<N: XmlNode>(
        &mut self,
        node: &N,
        name: &QName,
        decl: Option<&ElementDeclaration>,
        ty: TypeId,
    ) -> Result<Option<Vec<Atom>>> {
        let content = Content::of(node);
        if let Some((child, _)) = content.elements.first() {
            self.report(ContentModelViolation::UnexpectedChild {
                parent: name.clone(),
                child: child.clone(),
                content: ContentTypeLabel::Simple,
            })?;
        }

        match decl.and_then(|d| d.constraint.as_ref()) {
            Some(constraint) if content.text.is_empty() && content.elements.is_empty() => {
                self.lexical_value(node, constraint.lexical(), ty)
            }
            Some(ValueConstraint::Fixed(fixed)) => {
                let atoms = self.lexical_value(node, &content.text, ty)?;
                if let Some(actual) = &atoms {
                    if !self.matches_fixed(node, actual, fixed, ty)? {
                        self.report(ElementViolation::FixedMismatch {
                            element: name.clone(),
                            expected: fixed.clone(),
                            actual: content.text.clone(),
                        })?;
                    }
                }
                Ok(atoms)
            }
            _ => self.lexical_value(node, &content.text, ty),
        }
    }

    fn complex_content<N: XmlNode>(
        &mut self,
        node: &N,
        decl: Option<&ElementDeclaration>,
        complex: &'v ComplexType,
        depth: usize,
        typed: &mut TypedElement,
    ) -> Result<()> {
        let name = typed.name.clone();
        match &complex.content {
            ContentType::Simple(simple) => {
                typed.value = self.simple_content(node, &name, decl, *simple)?;
            }
            ContentType::Empty => {
                let content = Content::of(node);
                if let Some((child, _)) = content.elements.first() {
                    self.report(ContentModelViolation::UnexpectedChild {
                        parent: name.clone(),
                        child: child.clone(),
                        content: ContentTypeLabel::Empty,
                    })?;
                }
                if content.has_text() {
                    self.report(ContentModelViolation::InvalidMixedContent {
                        parent: name,
                        text: content.text.trim().to_string(),
                        content: ContentTypeLabel::Empty,
                    })?;
                }
            }
            ContentType::ElementOnly(particle) => {
                let content = Content::of(node);
                if content.has_text() {
                    self.report(ContentModelViolation::InvalidMixedContent {
                        parent: name.clone(),
                        text: content.text.trim().to_string(),
                        content: ContentTypeLabel::ElementOnly,
                    })?;
                }
                self.children(&name, particle, ContentTypeLabel::ElementOnly, content.elements, depth, typed)?;
            }
            ContentType::Mixed(particle) => {
                let content = Content::of(node);
                self.mixed_value(&name, decl, &content, typed)?;
                self.children(&name, particle, ContentTypeLabel::Mixed, content.elements, depth, typed)?;
            }
        }
        Ok(())
    }

    /// Value constraints on mixed content compare the character data as a string
    fn mixed_value<N: XmlNode>(
        &mut self,
        name: &QName,
        decl: Option<&ElementDeclaration>,
        content: &Content<N>,
        typed: &mut TypedElement,
    ) -> Result<()> {
        let Some(constraint) = decl.and_then(|d| d.constraint.as_ref()) else {
            return Ok(());
        };
        if content.elements.is_empty() && content.text.is_empty() {
            typed.value = Some(vec![Atom::untyped(constraint.lexical())]);
            return Ok(());
        }
        let Some(fixed) = constraint.fixed() else {
            return Ok(());
        };
        if !content.elements.is_empty() {
            self.report(ElementViolation::FixedWithChildren {
                element: name.clone(),
            })?;
        } else if content.text != fixed {
            self.report(ElementViolation::FixedMismatch {
                element: name.clone(),
                expected: fixed.to_string(),
                actual: content.text.clone(),
            })?;
        }
        Ok(())
    }

    fn children<N: XmlNode>(
        &mut self,
        parent: &QName,
        particle: &Particle,
        label: ContentTypeLabel,
        elements: Vec<(QName, N)>,
        depth: usize,
        typed: &mut TypedElement,
    ) -> Result<()> {
        let cache = self.cache;
        let names: Vec<QName> = elements.iter().map(|(name, _)| name.clone()).collect();
        match match_content(cache, particle, &names, parent, label, &self.options.limits)? {
            ContentMatch::Accept(bindings) => {
                for ((name, child), binding) in elements.into_iter().zip(bindings) {
                    if let Some(assessed) = self.bound_child(&child, name, binding, depth + 1)? {
                        typed.children.push(assessed);
                    }
                }
            }
            ContentMatch::Reject(violation) => {
                self.report(violation)?;
                for (name, child) in elements {
                    let declared = declaration_in(cache, particle, &name).or_else(|| cache.find_element(&name));
                    if let Some(id) = declared {
                        let assessed = self.element(&child, name, Some(cache.element(id)?), depth + 1)?;
                        typed.children.push(assessed);
                    }
                }
            }
        }
        Ok(())
    }

    fn bound_child<N: XmlNode>(
        &mut self,
        node: &N,
        name: QName,
        binding: Binding,
        depth: usize,
    ) -> Result<Option<TypedElement>> {
        let cache = self.cache;
        match binding {
            Binding::Element(id) => self.element(node, name, Some(cache.element(id)?), depth).map(Some),
            Binding::Substitute { member, head } => {
                if !cache.substitution_allowed(member, head) {
                    self.report(SubstitutionViolation::BlockedSubstitution {
                        element: name.clone(),
                        head: cache.element(head)?.name.clone(),
                    })?;
                }
                self.element(node, name, Some(cache.element(member)?), depth).map(Some)
            }
            Binding::Wildcard(wildcard) => {
                let declaration = match cache.find_element(&name) {
                    Some(id) => Some(cache.element(id)?),
                    None => None,
                };
                match (wildcard.process_contents, declaration) {
                    (ProcessContents::Skip, _) => {
                        trace!(element = %name, "skipped by wildcard");
                        Ok(None)
                    }
                    (_, Some(declaration)) => self.element(node, name, Some(declaration), depth).map(Some),
                    (ProcessContents::Lax, None) => self.element(node, name, None, depth).map(Some),
                    (ProcessContents::Strict, None) => {
                        if node.attribute(&QName::xsi("type")).is_some() {
                            return self.element(node, name, None, depth).map(Some);
                        }
                        self.report(ElementViolation::NoDeclaration { element: name })?;
                        Ok(None)
                    }
                }
            }
        }
    }
}

/// The element declaration for `name` anywhere in a content model
fn declaration_in(cache: &SchemaCache, particle: &Particle, name: &QName) -> Option<ElementId> {
    match &particle.term {
        Term::Element(id) => cache
            .components()
            .element(*id)
            .filter(|decl| decl.name == *name)
            .map(|_| *id),
        Term::Wildcard(_) => None,
        Term::Group(group) => group
            .particles
            .iter()
            .find_map(|p| declaration_in(cache, p, name)),
    }
}

/// Resolve an `xsi:type` value in the namespace scope of `node`
fn resolve_type_name<N: XmlNode>(cache: &SchemaCache, node: &N, lexical: &str) -> Option<TypeId> {
    let (prefix, local) = split_prefixed(lexical.trim());
    let namespace = node.lookup_namespace(prefix);
    if prefix.is_some() && namespace.is_none() {
        return None;
    }
    cache.find_type(&QName::new(namespace, local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use crate::limits::Limits;
    use crate::validators::attributes::AttributeUse;
    use crate::validators::complex_types::DerivationMethod;
    use crate::validators::facets::Facet;
    use crate::validators::globals::SchemaBuilder;
    use crate::validators::groups::ModelGroup;
    use crate::validators::particles::Occurs;
    use crate::validators::wildcards::{NamespaceConstraint, Wildcard};

    fn local(name: &str) -> QName {
        QName::local(name)
    }

    fn schema() -> SchemaCache {
        let mut b = SchemaBuilder::new();
        let string = b.native(NativeType::String);
        let decimal = b.native(NativeType::Decimal);
        let int = b.native(NativeType::Int);
        let positive = b.native(NativeType::PositiveInteger);
        let quantity = b
            .derive_restriction(Some(local("quantity")), positive, vec![Facet::MaxInclusive("100".into())])
            .unwrap();

        // order
        let name = b.add_element(ElementDeclaration::local(local("name"), string, None)).unwrap();
        let qty = b.add_element(ElementDeclaration::local(local("qty"), quantity, None)).unwrap();
        let item_type = b
            .add_complex_type(
                ComplexType::builder(Some(local("itemType")))
                    .element_only(
                        ModelGroup::sequence(vec![
                            Particle::element(name, Occurs::once()),
                            Particle::element(qty, Occurs::once()),
                        ])
                        .into_particle(),
                    )
                    .attribute(AttributeUse::required(local("sku"), string))
                    .attribute(
                        AttributeUse::optional(local("unit"), string)
                            .with_constraint(ValueConstraint::Fixed("pcs".into())),
                    )
                    .build(),
            )
            .unwrap();
        let item = b.add_element(ElementDeclaration::local(local("item"), item_type, None)).unwrap();
        let note = b.add_element(ElementDeclaration::local(local("note"), string, None)).unwrap();
        let order_type = b
            .add_complex_type(
                ComplexType::builder(Some(local("orderType")))
                    .element_only(
                        ModelGroup::sequence(vec![
                            Particle::element(item, Occurs::one_or_more()),
                            Particle::element(note, Occurs::optional()),
                        ])
                        .into_particle(),
                    )
                    .attribute(AttributeUse::required(local("id"), positive))
                    .attribute(
                        AttributeUse::optional(local("currency"), string)
                            .with_constraint(ValueConstraint::Default("EUR".into())),
                    )
                    .attribute_wildcard(Wildcard::new(
                        NamespaceConstraint::only([Some("urn:ext")]),
                        ProcessContents::Lax,
                    ))
                    .build(),
            )
            .unwrap();
        b.add_element(ElementDeclaration::new(local("order"), order_type)).unwrap();

        // simple elements
        b.add_element(ElementDeclaration::new(local("price"), decimal).with_nillable(true)).unwrap();
        b.add_element(ElementDeclaration::new(local("status"), string).with_fixed("open")).unwrap();
        b.add_element(ElementDeclaration::new(local("count"), int).with_default("5")).unwrap();

        // derivation and substitution
        let shape_type = b
            .add_complex_type(
                ComplexType::builder(Some(local("shapeType")))
                    .attribute(AttributeUse::optional(local("color"), string))
                    .build(),
            )
            .unwrap();
        let circle_type = b
            .add_complex_type(
                ComplexType::builder(Some(local("circleType")))
                    .base(shape_type, DerivationMethod::Extension)
                    .attribute(AttributeUse::required(local("radius"), decimal))
                    .build(),
            )
            .unwrap();
        let abstract_type = b
            .add_complex_type(ComplexType::builder(Some(local("abstractShape"))).abstract_type(true).build())
            .unwrap();
        let no_extension = DerivationFlags::of(&[DerivationMethod::Extension]);
        b.add_element(ElementDeclaration::new(local("figure"), shape_type)).unwrap();
        b.add_element(ElementDeclaration::new(local("sealed"), shape_type).with_block(no_extension))
            .unwrap();
        b.add_element(ElementDeclaration::new(local("ghost"), abstract_type)).unwrap();

        let vehicle = b
            .add_element(ElementDeclaration::new(local("vehicle"), shape_type).with_abstract(true))
            .unwrap();
        b.add_element(ElementDeclaration::new(local("car"), circle_type).with_substitution_group(vehicle))
            .unwrap();
        let no_substitution = DerivationFlags {
            substitution: true,
            ..DerivationFlags::default()
        };
        let part = b
            .add_element(ElementDeclaration::new(local("part"), string).with_block(no_substitution))
            .unwrap();
        b.add_element(ElementDeclaration::new(local("bolt"), string).with_substitution_group(part))
            .unwrap();
        let garage_type = b
            .add_complex_type(
                ComplexType::builder(Some(local("garageType")))
                    .element_only(
                        ModelGroup::sequence(vec![
                            Particle::element(vehicle, Occurs::zero_or_more()),
                            Particle::element(part, Occurs::zero_or_more()),
                        ])
                        .into_particle(),
                    )
                    .build(),
            )
            .unwrap();
        b.add_element(ElementDeclaration::new(local("garage"), garage_type)).unwrap();

        // wildcards and mixed content
        for (bag, process_contents) in [("strictBag", ProcessContents::Strict), ("skipBag", ProcessContents::Skip)] {
            let bag_type = b
                .add_complex_type(
                    ComplexType::builder(None)
                        .element_only(Particle::wildcard(
                            Wildcard::new(NamespaceConstraint::Any, process_contents),
                            Occurs::zero_or_more(),
                        ))
                        .build(),
                )
                .unwrap();
            b.add_element(ElementDeclaration::new(local(bag), bag_type)).unwrap();
        }
        let em = b.add_element(ElementDeclaration::local(local("em"), string, None)).unwrap();
        let para_type = b
            .add_complex_type(
                ComplexType::builder(Some(local("paraType")))
                    .mixed(Particle::element(em, Occurs::zero_or_more()))
                    .build(),
            )
            .unwrap();
        b.add_element(ElementDeclaration::new(local("para"), para_type)).unwrap();

        b.lock().unwrap()
    }

    fn parse(xml: &str) -> Document {
        Document::from_string(xml).unwrap()
    }

    fn collect(cache: &SchemaCache, xml: &str) -> ValidationReport {
        let doc = parse(xml);
        let root = doc.root_node().unwrap();
        InstanceValidator::new(cache).validate_collect(&root).unwrap()
    }

    fn outcomes(report: &ValidationReport) -> Vec<String> {
        report
            .violations
            .iter()
            .map(|v| v.outcome().to_string())
            .collect()
    }

    #[test]
    fn test_valid_order_is_typed() {
        let cache = schema();
        let doc = parse(
            r#"<order id="7" xmlns:e="urn:ext" e:tag="x"><item sku="A1"><name>Bolt</name><qty>3</qty></item><note>fast</note></order>"#,
        );
        let root = doc.root_node().unwrap();
        let typed = InstanceValidator::new(&cache).validate_fail_fast(&root).unwrap();

        assert_eq!(typed.type_name, "orderType");
        assert_eq!(typed.attribute(&local("id")).unwrap()[0].as_i64(), Some(7));
        assert_eq!(typed.attribute(&local("currency")).unwrap()[0].as_str(), Some("EUR"));
        assert!(typed.attribute(&QName::namespaced("urn:ext", "tag")).is_none());

        let item = typed.child("item").unwrap();
        assert_eq!(item.children.len(), 2);
        let qty = item.child("qty").unwrap();
        assert_eq!(qty.type_name, "quantity");
        assert_eq!(qty.value.as_ref().unwrap()[0].as_i64(), Some(3));
        assert_eq!(typed.child("note").unwrap().text(Emulation::C14N).as_deref(), Some("fast"));
    }

    #[test]
    fn test_defaults_not_applied_when_disabled() {
        let cache = schema();
        let doc = parse(r#"<order id="1"><item sku="A"><name>n</name><qty>1</qty></item></order>"#);
        let root = doc.root_node().unwrap();
        let validator = InstanceValidator::new(&cache).with_options(ValidationOptions::new().with_defaults(false));
        let typed = validator.validate_fail_fast(&root).unwrap();
        assert!(typed.attribute(&local("currency")).is_none());
    }

    #[test]
    fn test_collects_violations_across_the_tree() {
        let cache = schema();
        let report = collect(
            &cache,
            r#"<order id="1" color="red"><item unit="kg"><name>B</name><qty>300</qty></item><bogus/></order>"#,
        );
        assert!(!report.is_valid());
        assert!(!report.truncated);
        let outcomes = outcomes(&report);
        for expected in [
            "cvc-complex-type.3.2.2",
            "cvc-complex-type.4",
            "cvc-au.1",
            "cvc-maxInclusive-valid.1",
            "cvc-complex-type.2.4.d",
        ] {
            assert!(outcomes.iter().any(|o| o == expected), "{} missing from {:?}", expected, outcomes);
        }
        assert_eq!(report.diagnostics.len(), report.violations.len());
    }

    #[test]
    fn test_fail_fast_returns_first_violation() {
        let cache = schema();
        let doc = parse(r#"<order><item sku="A"><name>n</name><qty>1</qty></item></order>"#);
        let root = doc.root_node().unwrap();
        let err = InstanceValidator::new(&cache).validate_fail_fast(&root).unwrap_err();
        let violation = err.violation().unwrap();
        assert_eq!(violation.outcome().to_string(), "cvc-complex-type.4");
        assert!(!InstanceValidator::new(&cache).is_valid(&root).unwrap());
    }

    #[test]
    fn test_error_cap_truncates() {
        let cache = schema();
        let doc = parse(r#"<order><item><name>n</name><qty>0</qty></item><bogus/></order>"#);
        let root = doc.root_node().unwrap();
        let limits = Limits {
            max_errors: Some(2),
            ..Limits::default()
        };
        let report = InstanceValidator::new(&cache)
            .with_options(ValidationOptions::new().with_limits(limits))
            .validate_collect(&root)
            .unwrap();
        assert!(report.truncated);
        assert!(report.root.is_none());
        assert_eq!(report.violations.len(), 2);
    }

    #[test]
    fn test_undeclared_root() {
        let cache = schema();
        let report = collect(&cache, "<nothing/>");
        assert_eq!(outcomes(&report), vec!["cvc-elt.1".to_string()]);
        assert!(report.root.is_none());
    }

    #[test]
    fn test_nil() {
        let cache = schema();
        let xsi = format!(r#"xmlns:xsi="{}""#, XSI_NAMESPACE);

        let report = collect(&cache, &format!(r#"<price {} xsi:nil="true"/>"#, xsi));
        assert!(report.is_valid(), "{:?}", report.diagnostics);
        assert!(report.root.unwrap().nilled);

        let report = collect(&cache, &format!(r#"<price {} xsi:nil="true">1.5</price>"#, xsi));
        assert_eq!(outcomes(&report), vec!["cvc-elt.3.2.1".to_string()]);

        let report = collect(&cache, &format!(r#"<status {} xsi:nil="true"/>"#, xsi));
        assert_eq!(outcomes(&report), vec!["cvc-elt.3.1".to_string()]);
    }

    #[test]
    fn test_element_value_constraints() {
        let cache = schema();
        let report = collect(&cache, "<count/>");
        assert!(report.is_valid());
        assert_eq!(report.root.unwrap().value.unwrap()[0].as_i64(), Some(5));

        assert!(collect(&cache, "<status>open</status>").is_valid());
        assert!(collect(&cache, "<status/>").is_valid());
        let report = collect(&cache, "<status>closed</status>");
        assert_eq!(outcomes(&report), vec!["cvc-elt.5.2.2.2.2".to_string()]);

        let report = collect(&cache, "<price>abc</price>");
        assert!(report.violations[0].is_lexical());
    }

    #[test]
    fn test_xsi_type() {
        let cache = schema();
        let ns = format!(
            r#"xmlns:xsi="{}" xmlns:xs="http://www.w3.org/2001/XMLSchema""#,
            XSI_NAMESPACE
        );

        let report = collect(&cache, &format!(r#"<figure {} xsi:type="circleType" radius="2.5"/>"#, ns));
        assert!(report.is_valid(), "{:?}", report.diagnostics);
        let root = report.root.unwrap();
        assert_eq!(root.type_name, "circleType");
        assert!(root.attribute(&local("radius")).is_some());

        let report = collect(&cache, &format!(r#"<figure {} xsi:type="nope"/>"#, ns));
        assert_eq!(outcomes(&report), vec!["cvc-elt.4.2".to_string()]);

        let report = collect(&cache, &format!(r#"<figure {} xsi:type="xs:string"/>"#, ns));
        assert_eq!(outcomes(&report), vec!["cvc-elt.4.3".to_string()]);

        let report = collect(&cache, &format!(r#"<sealed {} xsi:type="circleType" radius="1"/>"#, ns));
        match &report.violations[..] {
            [ConstraintViolation::Substitution(SubstitutionViolation::BlockedDerivation { method, .. }), ..] => {
                assert_eq!(*method, DerivationMethod::Extension)
            }
            other => panic!("unexpected {:?}", other),
        }

        let report = collect(&cache, "<ghost/>");
        assert_eq!(outcomes(&report), vec!["cvc-type.2".to_string()]);
    }

    #[test]
    fn test_substitution_groups() {
        let cache = schema();
        let report = collect(&cache, r#"<garage><car radius="1"/><part>p</part></garage>"#);
        assert!(report.is_valid(), "{:?}", report.diagnostics);
        assert_eq!(report.root.unwrap().children[0].type_name, "circleType");

        let report = collect(&cache, "<garage><vehicle/></garage>");
        assert_eq!(outcomes(&report), vec!["cvc-elt.2".to_string()]);

        let report = collect(&cache, "<garage><bolt>b</bolt></garage>");
        assert_eq!(outcomes(&report), vec!["cos-equiv-derived-ok-rec.2".to_string()]);
    }

    #[test]
    fn test_wildcard_process_contents() {
        let cache = schema();
        let report = collect(&cache, "<strictBag><count>3</count><unknown/></strictBag>");
        assert_eq!(outcomes(&report), vec!["cvc-elt.1".to_string()]);
        assert_eq!(report.violations.len(), 1);

        let report = collect(&cache, "<skipBag><count>bad</count><unknown/></skipBag>");
        assert!(report.is_valid());
        assert!(report.root.unwrap().children.is_empty());
    }

    #[test]
    fn test_content_types() {
        let cache = schema();
        assert!(collect(&cache, "<para>some <em>mixed</em> text</para>").is_valid());

        let report = collect(&cache, "<figure>text</figure>");
        assert_eq!(outcomes(&report), vec!["cvc-complex-type.2.1".to_string()]);

        let report = collect(&cache, "<figure><em/></figure>");
        assert_eq!(outcomes(&report), vec!["cvc-complex-type.2.1".to_string()]);

        let report = collect(&cache, r#"<order id="1">stray<item sku="a"><name>n</name><qty>1</qty></item></order>"#);
        assert_eq!(outcomes(&report), vec!["cvc-complex-type.2.3".to_string()]);

        let report = collect(&cache, "<count><em/>1</count>");
        assert_eq!(outcomes(&report), vec!["cvc-complex-type.2.2".to_string()]);
    }

    #[test]
    fn test_depth_limit_is_an_error() {
        let cache = schema();
        let doc = parse(r#"<order id="1"><item sku="a"><name>n</name><qty>1</qty></item></order>"#);
        let root = doc.root_node().unwrap();
        let limits = Limits {
            max_depth: 2,
            ..Limits::default()
        };
        let err = InstanceValidator::new(&cache)
            .with_options(ValidationOptions::new().with_limits(limits))
            .validate_collect(&root)
            .unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
    }

    #[test]
    fn test_report_json() {
        let cache = schema();
        let report = collect(&cache, "<nothing/>");
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["valid"], serde_json::Value::Bool(false));
        assert_eq!(json["diagnostics"][0]["section"], "cvc-elt");
        assert_eq!(json["diagnostics"][0]["part"], "1");
        assert_eq!(
            report.diagnostics[0].to_string(),
            "cvc-elt.1: Cannot find the declaration of element 'nothing'."
        );
    }

    #[test]
    fn test_cast_value() {
        let cache = schema();
        let doc = parse("<count>42</count>");
        let root = doc.root_node().unwrap();
        let validator = InstanceValidator::new(&cache);
        let typed = validator.validate_fail_fast(&root).unwrap();
        let cast = validator.cast_value(&typed, NativeType::Double).unwrap();
        assert_eq!(cast[0].as_double(), Some(42.0));
        let err = validator.cast_value(&typed, NativeType::Date).unwrap_err();
        assert!(matches!(err.violation(), Some(ConstraintViolation::Cast(_))));
    }

    #[test]
    fn test_roxmltree_adapter() {
        let cache = schema();
        let xml = r#"<order id="3"><item sku="b"><name>x</name><qty>2</qty></item></order>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let report = InstanceValidator::new(&cache).validate_collect(&doc.root()).unwrap();
        assert!(report.is_valid(), "{:?}", report.diagnostics);
    }
}
