//! XSD Content Model matching
//!
//! Matches the sequence of child element names of an element against the
//! particle of its content type. Matching is greedy and never backtracks
//! into a term that already consumed children: Unique Particle Attribution
//! guarantees at most one particle can claim the next child, so the first
//! match is the only one.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#coss-particle

use tracing::trace;

use crate::error::Result;
use crate::limits::Limits;
use crate::namespaces::QName;

use super::complex_types::ContentTypeLabel;
use super::exceptions::ContentModelViolation;
use super::globals::{ElementId, SchemaCache};
use super::groups::{ModelGroup, ModelType};
use super::particles::{Particle, Term};
use super::wildcards::Wildcard;

/// What a child element was matched by
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// The declared element
    Element(ElementId),
    /// A substitution group member standing in for the declared head
    Substitute {
        /// The member that appeared
        member: ElementId,
        /// The head named by the content model
        head: ElementId,
    },
    /// An element wildcard
    Wildcard(Wildcard),
}

/// Result of matching children against a content model
#[derive(Debug, Clone, PartialEq)]
pub enum ContentMatch {
    /// All children matched; one binding per child, in order
    Accept(Vec<Binding>),
    /// The children do not fit the model
    Reject(ContentModelViolation),
}

impl ContentMatch {
    /// Whether the children were accepted
    pub fn is_accepted(&self) -> bool {
        matches!(self, ContentMatch::Accept(_))
    }
}

/// Match `children` against `particle`.
///
/// `parent` and `content` only label the violation. Particle nesting deeper
/// than the model depth limit is an error, not a violation.
pub fn match_content(
    cache: &SchemaCache,
    particle: &Particle,
    children: &[QName],
    parent: &QName,
    content: ContentTypeLabel,
    limits: &Limits,
) -> Result<ContentMatch> {
    let mut matcher = Matcher {
        cache,
        children,
        limits,
        bindings: Vec::with_capacity(children.len()),
    };
    let outcome = matcher.particle(particle, 0, 0)?;
    trace!(parent = %parent, children = children.len(), matched = ?outcome.as_ref().map(|p| p.end).ok(), "content model");

    Ok(match outcome {
        Ok(progress) if progress.end == children.len() => ContentMatch::Accept(matcher.bindings),
        Ok(progress) => ContentMatch::Reject(ContentModelViolation::UnexpectedChild {
            parent: parent.clone(),
            child: children[progress.end].clone(),
            content,
        }),
        Err(miss) => {
            let mut expected = Vec::new();
            for name in miss.expected {
                if !expected.contains(&name) {
                    expected.push(name);
                }
            }
            ContentMatch::Reject(ContentModelViolation::IncompleteContent {
                parent: parent.clone(),
                expected,
                found: children.get(miss.at).cloned(),
            })
        }
    })
}

/// How far a term got, plus what could also have come next at that point
#[derive(Debug)]
struct Progress {
    end: usize,
    missed: Vec<String>,
}

/// A term that could not match at `at`
#[derive(Debug)]
struct Miss {
    at: usize,
    expected: Vec<String>,
}

type Step = std::result::Result<Progress, Miss>;

struct Matcher<'a> {
    cache: &'a SchemaCache,
    children: &'a [QName],
    limits: &'a Limits,
    bindings: Vec<Binding>,
}

impl Matcher<'_> {
    fn particle(&mut self, particle: &Particle, start: usize, depth: usize) -> Result<Step> {
        let occurs = particle.occurs;
        let mut pos = start;
        let mut count = 0u32;
        let mut missed = Vec::new();

        while !occurs.is_over(count) {
            let mark = self.bindings.len();
            match self.term(&particle.term, pos, depth)? {
                Ok(progress) if progress.end > pos => {
                    pos = progress.end;
                    count += 1;
                    missed = progress.missed;
                }
                Ok(progress) => {
                    // An empty match satisfies every remaining occurrence
                    missed.extend(progress.missed);
                    count = count.max(occurs.min);
                    break;
                }
                Err(miss) => {
                    self.bindings.truncate(mark);
                    if miss.at > pos || occurs.is_missing(count) {
                        return Ok(Err(miss));
                    }
                    missed.extend(miss.expected);
                    break;
                }
            }
        }
        if occurs.is_missing(count) {
            return Ok(Err(Miss {
                at: pos,
                expected: self.expected_names(particle),
            }));
        }
        Ok(Ok(Progress { end: pos, missed }))
    }

    fn term(&mut self, term: &Term, pos: usize, depth: usize) -> Result<Step> {
        match term {
            Term::Element(id) => self.element(*id, pos),
            Term::Wildcard(wildcard) => Ok(self.wildcard(wildcard, pos)),
            Term::Group(group) => {
                self.limits.check_model_depth(depth + 1)?;
                match group.compositor {
                    ModelType::Sequence => self.sequence(group, pos, depth + 1),
                    ModelType::Choice => self.choice(group, pos, depth + 1),
                    ModelType::All => self.all(group, pos, depth + 1),
                }
            }
        }
    }

    fn element(&mut self, id: ElementId, pos: usize) -> Result<Step> {
        let decl = self.cache.element(id)?;
        let miss = || Miss {
            at: pos,
            expected: vec![decl.name.to_string()],
        };
        let Some(child) = self.children.get(pos) else {
            return Ok(Err(miss()));
        };
        let bound = if *child == decl.name {
            Some(Binding::Element(id))
        } else if decl.is_global() {
            self.cache
                .substitutes_for(child, id)
                .map(|member| Binding::Substitute { member, head: id })
        } else {
            None
        };
        Ok(match bound {
            Some(binding) => {
                self.bindings.push(binding);
                Ok(Progress {
                    end: pos + 1,
                    missed: Vec::new(),
                })
            }
            None => Err(miss()),
        })
    }

    fn wildcard(&mut self, wildcard: &Wildcard, pos: usize) -> Step {
        match self.children.get(pos) {
            Some(child) if wildcard.matches(child) => {
                self.bindings.push(Binding::Wildcard(wildcard.clone()));
                Ok(Progress {
                    end: pos + 1,
                    missed: Vec::new(),
                })
            }
            _ => Err(Miss {
                at: pos,
                expected: vec![wildcard.to_string()],
            }),
        }
    }

    fn sequence(&mut self, group: &ModelGroup, start: usize, depth: usize) -> Result<Step> {
        let mut pos = start;
        // Names that optional particles skipped at the current position
        let mut pending: Vec<String> = Vec::new();
        for particle in &group.particles {
            match self.particle(particle, pos, depth)? {
                Ok(progress) => {
                    if progress.end > pos {
                        pending.clear();
                        pos = progress.end;
                    }
                    pending.extend(progress.missed);
                }
                Err(mut miss) => {
                    if miss.at == pos {
                        pending.append(&mut miss.expected);
                        miss.expected = pending;
                    }
                    return Ok(Err(miss));
                }
            }
        }
        Ok(Ok(Progress {
            end: pos,
            missed: pending,
        }))
    }

    fn choice(&mut self, group: &ModelGroup, start: usize, depth: usize) -> Result<Step> {
        let mut empty_match = false;
        let mut expected = Vec::new();
        for particle in &group.particles {
            let mark = self.bindings.len();
            match self.particle(particle, start, depth)? {
                Ok(progress) if progress.end > start => return Ok(Ok(progress)),
                Ok(progress) => {
                    self.bindings.truncate(mark);
                    empty_match = true;
                    expected.extend(progress.missed);
                }
                Err(miss) => {
                    self.bindings.truncate(mark);
                    if miss.at > start {
                        return Ok(Err(miss));
                    }
                    expected.extend(miss.expected);
                }
            }
        }
        if empty_match || group.particles.is_empty() {
            Ok(Ok(Progress {
                end: start,
                missed: expected,
            }))
        } else {
            Ok(Err(Miss { at: start, expected }))
        }
    }

    fn all(&mut self, group: &ModelGroup, start: usize, depth: usize) -> Result<Step> {
        let mut seen = vec![false; group.particles.len()];
        let mut pos = start;

        while pos < self.children.len() {
            let mut advanced = false;
            for (index, particle) in group.particles.iter().enumerate() {
                if seen[index] {
                    continue;
                }
                let mark = self.bindings.len();
                match self.particle(particle, pos, depth)? {
                    Ok(progress) if progress.end > pos => {
                        seen[index] = true;
                        pos = progress.end;
                        advanced = true;
                        break;
                    }
                    Err(miss) if miss.at > pos => return Ok(Err(miss)),
                    _ => self.bindings.truncate(mark),
                }
            }
            if !advanced {
                break;
            }
        }

        let mut missing = Vec::new();
        let mut optional = Vec::new();
        for (particle, seen) in group.particles.iter().zip(&seen) {
            if *seen {
                continue;
            }
            if particle.is_emptiable() {
                optional.extend(self.expected_names(particle));
            } else {
                missing.extend(self.expected_names(particle));
            }
        }
        if missing.is_empty() {
            Ok(Ok(Progress {
                end: pos,
                missed: optional,
            }))
        } else {
            Ok(Err(Miss {
                at: pos,
                expected: missing,
            }))
        }
    }

    /// Names that may start a match of `particle`
    fn expected_names(&self, particle: &Particle) -> Vec<String> {
        match &particle.term {
            Term::Element(id) => self
                .cache
                .element(*id)
                .map(|decl| vec![decl.name.to_string()])
                .unwrap_or_default(),
            Term::Wildcard(wildcard) => vec![wildcard.to_string()],
            Term::Group(group) => match group.compositor {
                ModelType::Sequence => {
                    let mut names = Vec::new();
                    for child in &group.particles {
                        names.extend(self.expected_names(child));
                        if !child.is_emptiable() {
                            break;
                        }
                    }
                    names
                }
                ModelType::Choice | ModelType::All => group
                    .particles
                    .iter()
                    .flat_map(|child| self.expected_names(child))
                    .collect(),
            },
        }
    }
}
