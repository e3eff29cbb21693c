//! XSD Model Groups
//!
//! - xs:sequence - ordered content
//! - xs:choice - alternative content
//! - xs:all - unordered content; each particle occurs at most once
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Model_Groups

use std::fmt;

use super::particles::{Occurs, Particle, Term};

/// Model group compositor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelType {
    /// Ordered sequence of particles
    #[default]
    Sequence,
    /// One of multiple alternatives
    Choice,
    /// Unordered set of particles
    All,
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Choice => write!(f, "choice"),
            Self::All => write!(f, "all"),
        }
    }
}

/// A compositor with its ordered child particles
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGroup {
    /// Compositor
    pub compositor: ModelType,
    /// Child particles in declaration order
    pub particles: Vec<Particle>,
}

impl ModelGroup {
    /// Create a model group
    pub fn new(compositor: ModelType, particles: Vec<Particle>) -> Self {
        Self {
            compositor,
            particles,
        }
    }

    /// xs:sequence
    pub fn sequence(particles: Vec<Particle>) -> Self {
        Self::new(ModelType::Sequence, particles)
    }

    /// xs:choice
    pub fn choice(particles: Vec<Particle>) -> Self {
        Self::new(ModelType::Choice, particles)
    }

    /// xs:all
    pub fn all(particles: Vec<Particle>) -> Self {
        Self::new(ModelType::All, particles)
    }

    /// Wrap into a particle occurring exactly once
    pub fn into_particle(self) -> Particle {
        Particle::group(self, Occurs::once())
    }

    /// Check if group has no particles
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Check if group can produce empty content
    pub fn is_emptiable(&self) -> bool {
        if self.particles.is_empty() {
            return true;
        }

        match self.compositor {
            // Choice is emptiable if any branch is emptiable
            ModelType::Choice => self.particles.iter().any(|p| p.is_emptiable()),
            // Sequence/All is emptiable only if all particles are emptiable
            ModelType::Sequence | ModelType::All => {
                self.particles.iter().all(|p| p.is_emptiable())
            }
        }
    }

    /// Depth-first visit of every nested group, this one included
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a ModelGroup)) {
        visit(self);
        for particle in &self.particles {
            if let Term::Group(group) = &particle.term {
                group.walk(visit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::globals::ElementId;

    #[test]
    fn test_model_type_display() {
        assert_eq!(ModelType::Choice.to_string(), "choice");
    }

    #[test]
    fn test_emptiable() {
        assert!(ModelGroup::sequence(vec![]).is_emptiable());
        let all = ModelGroup::all(vec![
            Particle::element(ElementId(0), Occurs::optional()),
            Particle::element(ElementId(1), Occurs::optional()),
        ]);
        assert!(all.is_emptiable());
    }

    #[test]
    fn test_walk_visits_nested_groups() {
        let inner = ModelGroup::choice(vec![Particle::element(ElementId(0), Occurs::once())]);
        let outer = ModelGroup::sequence(vec![inner.into_particle()]);
        let mut seen = Vec::new();
        outer.walk(&mut |g| seen.push(g.compositor));
        assert_eq!(seen, vec![ModelType::Sequence, ModelType::Choice]);
    }
}
