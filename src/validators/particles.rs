//! XSD Particle Schema Components
//!
//! A particle is one occurrence-bounded term of a content model: an element
//! declaration, a wildcard, or a nested model group.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#p

use super::globals::ElementId;
use super::groups::ModelGroup;
use super::wildcards::Wildcard;

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if this particle is prohibited (maxOccurs == 0)
    pub fn is_empty(&self) -> bool {
        self.max == Some(0)
    }

    /// Check if occurrence count is under the minimum
    pub fn is_missing(&self, count: u32) -> bool {
        count < self.min
    }

    /// Check if occurrence count is at or over the maximum
    pub fn is_over(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count >= max,
            None => false,
        }
    }

    /// Whether min <= max
    pub fn is_consistent(&self) -> bool {
        self.max.map_or(true, |max| self.min <= max)
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

/// What a particle matches
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// An element declaration (global or local)
    Element(ElementId),
    /// An element wildcard
    Wildcard(Wildcard),
    /// A nested model group
    Group(ModelGroup),
}

/// A term with occurrence bounds
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// The term
    pub term: Term,
    /// Occurrence bounds
    pub occurs: Occurs,
}

impl Particle {
    /// Create a particle
    pub fn new(term: Term, occurs: Occurs) -> Self {
        Self { term, occurs }
    }

    /// Element particle
    pub fn element(id: ElementId, occurs: Occurs) -> Self {
        Self::new(Term::Element(id), occurs)
    }

    /// Wildcard particle
    pub fn wildcard(wildcard: Wildcard, occurs: Occurs) -> Self {
        Self::new(Term::Wildcard(wildcard), occurs)
    }

    /// Model group particle
    pub fn group(group: ModelGroup, occurs: Occurs) -> Self {
        Self::new(Term::Group(group), occurs)
    }

    /// Whether the particle can match an empty child sequence
    pub fn is_emptiable(&self) -> bool {
        if self.occurs.is_emptiable() {
            return true;
        }
        match &self.term {
            Term::Group(group) => group.is_emptiable(),
            _ => false,
        }
    }

    /// Nesting depth of model groups below this particle
    pub fn depth(&self) -> usize {
        match &self.term {
            Term::Group(group) => 1 + group.particles.iter().map(Particle::depth).max().unwrap_or(0),
            _ => 0,
        }
    }
}
