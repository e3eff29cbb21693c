//! XSD constraining facets
//!
//! This module implements the facets that constrain simple types and the
//! fixed order in which they are checked: length family, pattern,
//! enumeration, range family, digit family. Whitespace is applied by the
//! caller before anything here runs.

use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::atoms::Atom;
use crate::error::{Error, SchemaError};
use crate::validators::exceptions::{
    FacetViolation, FacetViolationKind, Section, ValidationOutcome,
};

/// White space handling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum WhiteSpace {
    /// Preserve all white space
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace and collapse multiple spaces
    Collapse,
}

impl FromStr for WhiteSpace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preserve" => Ok(WhiteSpace::Preserve),
            "replace" => Ok(WhiteSpace::Replace),
            "collapse" => Ok(WhiteSpace::Collapse),
            _ => Err(Error::Value(format!(
                "Invalid whiteSpace value: '{}'. Must be 'preserve', 'replace', or 'collapse'",
                s
            ))),
        }
    }
}

impl WhiteSpace {
    /// Normalize a string according to this white space mode
    pub fn normalize(&self, s: &str) -> String {
        match self {
            WhiteSpace::Preserve => s.to_string(),
            WhiteSpace::Replace => s.replace(['\t', '\n', '\r'], " "),
            WhiteSpace::Collapse => {
                let mut result = String::with_capacity(s.len());
                let mut prev_space = true; // trims leading spaces

                for c in s.chars() {
                    if matches!(c, ' ' | '\t' | '\n' | '\r') {
                        if !prev_space {
                            result.push(' ');
                            prev_space = true;
                        }
                    } else {
                        result.push(c);
                        prev_space = false;
                    }
                }

                if result.ends_with(' ') {
                    result.pop();
                }
                result
            }
        }
    }

    /// Keyword used in schema documents
    pub fn as_str(&self) -> &'static str {
        match self {
            WhiteSpace::Preserve => "preserve",
            WhiteSpace::Replace => "replace",
            WhiteSpace::Collapse => "collapse",
        }
    }
}

/// Facet kinds, in checking order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FacetKind {
    /// length
    Length,
    /// minLength
    MinLength,
    /// maxLength
    MaxLength,
    /// pattern
    Pattern,
    /// enumeration
    Enumeration,
    /// whiteSpace
    WhiteSpace,
    /// minInclusive
    MinInclusive,
    /// maxInclusive
    MaxInclusive,
    /// minExclusive
    MinExclusive,
    /// maxExclusive
    MaxExclusive,
    /// totalDigits
    TotalDigits,
    /// fractionDigits
    FractionDigits,
}

impl FacetKind {
    /// Facet element name
    pub fn as_str(&self) -> &'static str {
        match self {
            FacetKind::Length => "length",
            FacetKind::MinLength => "minLength",
            FacetKind::MaxLength => "maxLength",
            FacetKind::Pattern => "pattern",
            FacetKind::Enumeration => "enumeration",
            FacetKind::WhiteSpace => "whiteSpace",
            FacetKind::MinInclusive => "minInclusive",
            FacetKind::MaxInclusive => "maxInclusive",
            FacetKind::MinExclusive => "minExclusive",
            FacetKind::MaxExclusive => "maxExclusive",
            FacetKind::TotalDigits => "totalDigits",
            FacetKind::FractionDigits => "fractionDigits",
        }
    }
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit in which the length family measures a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Uom {
    /// Unicode characters of the normalized lexical form
    Characters,
    /// Octets of binary data
    Octets,
    /// Items of a list value
    ListItems,
}

impl Uom {
    /// Phrase used in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            Uom::Characters => "characters",
            Uom::Octets => "octets of the binary data",
            Uom::ListItems => "list items",
        }
    }
}

/// A facet as written in a restriction, before compilation against the base type
#[derive(Debug, Clone, PartialEq)]
pub enum Facet {
    /// length
    Length(usize),
    /// minLength
    MinLength(usize),
    /// maxLength
    MaxLength(usize),
    /// pattern alternatives declared in one restriction step
    Pattern(Vec<String>),
    /// enumeration literals
    Enumeration(Vec<String>),
    /// whiteSpace
    WhiteSpace(WhiteSpace),
    /// minInclusive literal
    MinInclusive(String),
    /// maxInclusive literal
    MaxInclusive(String),
    /// minExclusive literal
    MinExclusive(String),
    /// maxExclusive literal
    MaxExclusive(String),
    /// totalDigits
    TotalDigits(u32),
    /// fractionDigits
    FractionDigits(u32),
}

impl Facet {
    /// Kind of this facet
    pub fn kind(&self) -> FacetKind {
        match self {
            Facet::Length(_) => FacetKind::Length,
            Facet::MinLength(_) => FacetKind::MinLength,
            Facet::MaxLength(_) => FacetKind::MaxLength,
            Facet::Pattern(_) => FacetKind::Pattern,
            Facet::Enumeration(_) => FacetKind::Enumeration,
            Facet::WhiteSpace(_) => FacetKind::WhiteSpace,
            Facet::MinInclusive(_) => FacetKind::MinInclusive,
            Facet::MaxInclusive(_) => FacetKind::MaxInclusive,
            Facet::MinExclusive(_) => FacetKind::MinExclusive,
            Facet::MaxExclusive(_) => FacetKind::MaxExclusive,
            Facet::TotalDigits(_) => FacetKind::TotalDigits,
            Facet::FractionDigits(_) => FacetKind::FractionDigits,
        }
    }

    /// Single-alternative pattern
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Facet::Pattern(vec![pattern.into()])
    }

    /// Enumeration from string literals
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Facet::Enumeration(values.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Patterns
// =============================================================================

const NAME_START: &str = r"_:A-Za-z\x{C0}-\x{D6}\x{D8}-\x{F6}\x{F8}-\x{2FF}\x{370}-\x{37D}\x{37F}-\x{1FFF}\x{200C}-\x{200D}\x{2070}-\x{218F}\x{2C00}-\x{2FEF}\x{3001}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFFD}";
const NAME_EXTRA: &str = r"\-.0-9\x{B7}\x{300}-\x{36F}\x{203F}-\x{2040}";

/// Translate an XML Schema regular expression into an anchored `regex` pattern.
///
/// XSD patterns are implicitly anchored, treat `^` and `$` as literals, add
/// the `\i`/`\c` name classes and use `-[...]` for class subtraction.
pub fn translate_pattern(xsd: &str) -> String {
    let mut out = String::with_capacity(xsd.len() + 8);
    out.push_str("^(?:");
    let mut depth = 0usize;
    let mut chars = xsd.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('i') => out.push_str(&format!("[{}]", NAME_START)),
                Some('I') => out.push_str(&format!("[^{}]", NAME_START)),
                Some('c') => out.push_str(&format!("[{}{}]", NAME_START, NAME_EXTRA)),
                Some('C') => out.push_str(&format!("[^{}{}]", NAME_START, NAME_EXTRA)),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push_str(r"\\"),
            },
            '[' => {
                depth += 1;
                out.push('[');
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('^');
                }
            }
            ']' if depth > 0 => {
                depth -= 1;
                out.push(']');
            }
            '-' if depth > 0 && chars.peek() == Some(&'[') => out.push_str("--"),
            '.' if depth == 0 => out.push_str(r"[^\n\r]"),
            '^' | '$' if depth == 0 => {
                out.push('\\');
                out.push(c);
            }
            '&' | '~' if depth > 0 => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push_str(")$");
    out
}

/// The patterns declared by one derivation step; a value must match one of them
#[derive(Debug, Clone)]
pub struct PatternStep {
    /// Patterns as written in the schema
    pub sources: Vec<String>,
    regexes: Vec<Regex>,
}

impl PatternStep {
    /// Compile the alternatives of one step
    pub fn compile(sources: Vec<String>) -> Result<Self, SchemaError> {
        let regexes = sources
            .iter()
            .map(|p| {
                Regex::new(&translate_pattern(p)).map_err(|e| {
                    SchemaError::new(
                        ValidationOutcome::new(Section::CosApplicableFacets, "2"),
                        format!("Invalid pattern '{}': {}", p, e),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sources, regexes })
    }

    /// Whether the lexical form matches one of the alternatives
    pub fn is_match(&self, lexical: &str) -> bool {
        self.regexes.iter().any(|r| r.is_match(lexical))
    }
}

impl PartialEq for PatternStep {
    fn eq(&self, other: &Self) -> bool {
        self.sources == other.sources
    }
}

/// An enumeration member with its parsed value (one atom, or one per list item)
#[derive(Debug, Clone, PartialEq)]
pub struct Enumerated {
    /// Literal as written
    pub lexical: String,
    /// Parsed value
    pub value: Vec<Atom>,
}

impl Enumerated {
    fn matches(&self, value: &[Atom]) -> bool {
        self.value.len() == value.len()
            && self.value.iter().zip(value).all(|(a, b)| a.value_eq(b))
    }
}

/// A value handed to the facet checks
#[derive(Debug, Clone, Copy)]
pub struct FacetSubject<'a> {
    /// Whitespace-normalized lexical form
    pub lexical: &'a str,
    /// Parsed value (one atom, or one per list item)
    pub value: &'a [Atom],
    /// Measured length; `None` when length facets do not apply
    pub length: Option<(usize, Uom)>,
}

// =============================================================================
// Facet set
// =============================================================================

/// The effective facets of a simple type: inherited facets tightened by local ones
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetSet {
    /// length
    pub length: Option<usize>,
    /// minLength
    pub min_length: Option<usize>,
    /// maxLength
    pub max_length: Option<usize>,
    /// Pattern steps, ANDed
    pub patterns: Vec<PatternStep>,
    /// enumeration
    pub enumeration: Option<Vec<Enumerated>>,
    /// minInclusive
    pub min_inclusive: Option<Atom>,
    /// maxInclusive
    pub max_inclusive: Option<Atom>,
    /// minExclusive
    pub min_exclusive: Option<Atom>,
    /// maxExclusive
    pub max_exclusive: Option<Atom>,
    /// totalDigits
    pub total_digits: Option<u32>,
    /// fractionDigits
    pub fraction_digits: Option<u32>,
}

impl FacetSet {
    /// An empty facet set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no facet is declared
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether a length facet is declared
    pub fn has_length_facets(&self) -> bool {
        self.length.is_some() || self.min_length.is_some() || self.max_length.is_some()
    }

    /// Check a value and stop at the first failing facet
    pub fn check(&self, subject: &FacetSubject<'_>, type_name: &str) -> Result<(), FacetViolation> {
        let mut first = None;
        self.visit(subject, type_name, &mut |v| {
            first = Some(v);
            false
        });
        first.map_or(Ok(()), Err)
    }

    /// Check a value against every facet, collecting all failures
    pub fn check_all(&self, subject: &FacetSubject<'_>, type_name: &str) -> Vec<FacetViolation> {
        let mut all = Vec::new();
        self.visit(subject, type_name, &mut |v| {
            all.push(v);
            true
        });
        all
    }

    // Runs the checks in order; `sink` returns false to stop.
    fn visit(
        &self,
        subject: &FacetSubject<'_>,
        type_name: &str,
        sink: &mut dyn FnMut(FacetViolation) -> bool,
    ) {
        let violation = |kind: FacetViolationKind| {
            FacetViolation::new(kind, type_name, subject.lexical)
        };

        if let Some((actual, uom)) = subject.length {
            if let Some(expected) = self.length {
                if actual != expected && !sink(violation(FacetViolationKind::Length { expected, actual, uom })) {
                    return;
                }
            }
            if let Some(min) = self.min_length {
                if actual < min && !sink(violation(FacetViolationKind::MinLength { min, actual, uom })) {
                    return;
                }
            }
            if let Some(max) = self.max_length {
                if actual > max && !sink(violation(FacetViolationKind::MaxLength { max, actual, uom })) {
                    return;
                }
            }
        }

        for step in &self.patterns {
            if !step.is_match(subject.lexical)
                && !sink(violation(FacetViolationKind::Pattern {
                    patterns: step.sources.clone(),
                }))
            {
                return;
            }
        }

        if let Some(ref members) = self.enumeration {
            if !members.iter().any(|m| m.matches(subject.value))
                && !sink(violation(FacetViolationKind::Enumeration {
                    allowed: members.iter().map(|m| m.lexical.clone()).collect(),
                }))
            {
                return;
            }
        }

        if let [atom] = subject.value {
            let bounds = [
                (FacetKind::MinInclusive, &self.min_inclusive),
                (FacetKind::MaxInclusive, &self.max_inclusive),
                (FacetKind::MinExclusive, &self.min_exclusive),
                (FacetKind::MaxExclusive, &self.max_exclusive),
            ];
            for (facet, bound) in bounds {
                let Some(bound) = bound else { continue };
                let ok = match (facet, atom.value_cmp(bound)) {
                    (_, None) => false,
                    (FacetKind::MinInclusive, Some(o)) => o != Ordering::Less,
                    (FacetKind::MaxInclusive, Some(o)) => o != Ordering::Greater,
                    (FacetKind::MinExclusive, Some(o)) => o == Ordering::Greater,
                    (_, Some(o)) => o == Ordering::Less,
                };
                if !ok
                    && !sink(violation(FacetViolationKind::Range {
                        facet,
                        bound: bound.c14n_form(),
                    }))
                {
                    return;
                }
            }

            if self.total_digits.is_some() || self.fraction_digits.is_some() {
                if let Some((total, fraction)) = digit_counts(atom) {
                    if let Some(limit) = self.total_digits {
                        if total > limit
                            && !sink(violation(FacetViolationKind::Digits {
                                facet: FacetKind::TotalDigits,
                                limit,
                                actual: total,
                            }))
                        {
                            return;
                        }
                    }
                    if let Some(limit) = self.fraction_digits {
                        if fraction > limit {
                            sink(violation(FacetViolationKind::Digits {
                                facet: FacetKind::FractionDigits,
                                limit,
                                actual: fraction,
                            }));
                        }
                    }
                }
            }
        }
    }

    /// Tighten this (inherited) set with locally declared facets.
    ///
    /// Fails when a local facet would loosen an inherited one.
    pub fn restrict(&self, local: FacetSet) -> Result<FacetSet, SchemaError> {
        let loosened = |kind: FacetKind, message: String| {
            SchemaError::new(ValidationOutcome::new(Section::ValidRestriction(kind), "1"), message)
        };
        let mut merged = self.clone();

        if let Some(length) = local.length {
            if self.length.is_some_and(|base| base != length) {
                return Err(loosened(
                    FacetKind::Length,
                    format!("length {} differs from the inherited length", length),
                ));
            }
            merged.length = Some(length);
        }
        if let Some(min) = local.min_length {
            if self.min_length.is_some_and(|base| min < base) {
                return Err(loosened(
                    FacetKind::MinLength,
                    format!("minLength {} is less than the inherited minLength", min),
                ));
            }
            merged.min_length = Some(min);
        }
        if let Some(max) = local.max_length {
            if self.max_length.is_some_and(|base| max > base) {
                return Err(loosened(
                    FacetKind::MaxLength,
                    format!("maxLength {} is greater than the inherited maxLength", max),
                ));
            }
            merged.max_length = Some(max);
        }
        if let (Some(min), Some(max)) = (merged.min_length, merged.max_length) {
            if min > max {
                return Err(loosened(
                    FacetKind::MinLength,
                    format!("minLength {} is greater than maxLength {}", min, max),
                ));
            }
        }

        merged.patterns.extend(local.patterns);

        if let Some(members) = local.enumeration {
            if let Some(ref base) = self.enumeration {
                if let Some(stray) = members.iter().find(|m| !base.iter().any(|b| b.matches(&m.value))) {
                    return Err(loosened(
                        FacetKind::Enumeration,
                        format!("'{}' is not in the inherited enumeration", stray.lexical),
                    ));
                }
            }
            merged.enumeration = Some(members);
        }

        let lower = [
            (FacetKind::MinInclusive, local.min_inclusive),
            (FacetKind::MinExclusive, local.min_exclusive),
        ];
        for (kind, bound) in lower {
            let Some(bound) = bound else { continue };
            if !self.admits_bound(&bound) {
                return Err(loosened(
                    kind,
                    format!("{} {} is outside the inherited range", kind, bound.c14n_form()),
                ));
            }
            if kind == FacetKind::MinInclusive {
                merged.min_inclusive = Some(bound);
                merged.min_exclusive = None;
            } else {
                merged.min_exclusive = Some(bound);
                merged.min_inclusive = None;
            }
        }
        let upper = [
            (FacetKind::MaxInclusive, local.max_inclusive),
            (FacetKind::MaxExclusive, local.max_exclusive),
        ];
        for (kind, bound) in upper {
            let Some(bound) = bound else { continue };
            if !self.admits_bound(&bound) {
                return Err(loosened(
                    kind,
                    format!("{} {} is outside the inherited range", kind, bound.c14n_form()),
                ));
            }
            if kind == FacetKind::MaxInclusive {
                merged.max_inclusive = Some(bound);
                merged.max_exclusive = None;
            } else {
                merged.max_exclusive = Some(bound);
                merged.max_inclusive = None;
            }
        }

        if let Some(total) = local.total_digits {
            if self.total_digits.is_some_and(|base| total > base) {
                return Err(loosened(
                    FacetKind::TotalDigits,
                    format!("totalDigits {} is greater than the inherited totalDigits", total),
                ));
            }
            merged.total_digits = Some(total);
        }
        if let Some(fraction) = local.fraction_digits {
            if self.fraction_digits.is_some_and(|base| fraction > base) {
                return Err(loosened(
                    FacetKind::FractionDigits,
                    format!("fractionDigits {} is greater than the inherited fractionDigits", fraction),
                ));
            }
            merged.fraction_digits = Some(fraction);
        }
        if let (Some(total), Some(fraction)) = (merged.total_digits, merged.fraction_digits) {
            if fraction > total {
                return Err(loosened(
                    FacetKind::FractionDigits,
                    format!("fractionDigits {} is greater than totalDigits {}", fraction, total),
                ));
            }
        }

        Ok(merged)
    }

    // A new bound may sit anywhere inside the inherited closed/open interval.
    fn admits_bound(&self, bound: &Atom) -> bool {
        let cmp = |b: &Option<Atom>| b.as_ref().map(|b| bound.value_cmp(b));
        let inside = [
            cmp(&self.min_inclusive).map(|o| matches!(o, Some(Ordering::Greater | Ordering::Equal))),
            cmp(&self.max_inclusive).map(|o| matches!(o, Some(Ordering::Less | Ordering::Equal))),
            cmp(&self.min_exclusive).map(|o| matches!(o, Some(Ordering::Greater | Ordering::Equal))),
            cmp(&self.max_exclusive).map(|o| matches!(o, Some(Ordering::Less | Ordering::Equal))),
        ];
        inside.iter().all(|ok| ok.unwrap_or(true))
    }
}

/// Total and fraction digit counts of a decimal-family atom
fn digit_counts(atom: &Atom) -> Option<(u32, u32)> {
    if !atom.native_type().is_decimal() {
        return None;
    }
    let text = atom.c14n_form();
    let unsigned = text.trim_start_matches('-');
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let int_digits = int_part.trim_start_matches('0').len();
    let frac_digits = frac_part.trim_end_matches('0').len();
    let total = (int_digits + frac_digits).max(1);
    Some((total as u32, frac_digits as u32))
}
