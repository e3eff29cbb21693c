//! XSD Wildcards
//!
//! Element wildcards (`xs:any`) appear as particle terms; attribute
//! wildcards (`xs:anyAttribute`) hang off complex types. Both admit names by
//! namespace and say how much validation the matched item receives.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Wildcards

use std::collections::BTreeSet;
use std::fmt;

use crate::namespaces::QName;

/// Process contents mode for wildcards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProcessContents {
    /// Validate strictly - element/attribute must be declared
    #[default]
    Strict,
    /// Validate if declaration found, otherwise accept
    Lax,
    /// Skip validation entirely
    Skip,
}

impl fmt::Display for ProcessContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lax => write!(f, "lax"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Namespace constraint for wildcards; the empty string stands for "no namespace"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NamespaceConstraint {
    /// Any namespace is allowed (##any)
    #[default]
    Any,
    /// Any namespace except the target namespace and no namespace (##other)
    Other {
        /// The target namespace to exclude
        target_namespace: Option<String>,
    },
    /// Specific set of allowed namespaces
    Enumeration(BTreeSet<String>),
    /// Set of disallowed namespaces
    Not(BTreeSet<String>),
}

impl NamespaceConstraint {
    /// `##other` relative to `target_namespace`
    pub fn other(target_namespace: Option<&str>) -> Self {
        Self::Other {
            target_namespace: target_namespace.map(String::from),
        }
    }

    /// Enumerated namespaces; `None` stands for "no namespace"
    pub fn only<'a, I>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        Self::Enumeration(
            namespaces
                .into_iter()
                .map(|ns| ns.unwrap_or_default().to_string())
                .collect(),
        )
    }

    /// Check if a namespace is allowed by this constraint
    pub fn is_allowed(&self, namespace: Option<&str>) -> bool {
        let namespace = namespace.unwrap_or_default();
        match self {
            Self::Any => true,
            Self::Other { target_namespace } => {
                !namespace.is_empty() && Some(namespace) != target_namespace.as_deref()
            }
            Self::Enumeration(set) => set.contains(namespace),
            Self::Not(set) => !set.contains(namespace),
        }
    }

    /// Union of two constraints, used when an extension adds an attribute wildcard
    pub fn union(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Any, _) | (_, Self::Any) => Self::Any,

            (Self::Other { target_namespace: a }, Self::Other { target_namespace: b }) => {
                if a == b {
                    self.clone()
                } else {
                    Self::Any
                }
            }

            (Self::Enumeration(a), Self::Enumeration(b)) => {
                Self::Enumeration(a.union(b).cloned().collect())
            }

            (Self::Not(a), Self::Not(b)) => Self::Not(a.intersection(b).cloned().collect()),

            (Self::Not(not), Self::Enumeration(set)) | (Self::Enumeration(set), Self::Not(not)) => {
                Self::Not(not.difference(set).cloned().collect())
            }

            // Mixed ##other and enumerations widen to ##any
            _ => Self::Any,
        }
    }
}

impl fmt::Display for NamespaceConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |set: &BTreeSet<String>| {
            set.iter()
                .map(|ns| if ns.is_empty() { "##local" } else { ns.as_str() })
                .collect::<Vec<_>>()
                .join(" ")
        };
        match self {
            Self::Any => write!(f, "##any"),
            Self::Other { .. } => write!(f, "##other"),
            Self::Enumeration(set) => write!(f, "{}", list(set)),
            Self::Not(set) => write!(f, "not({})", list(set)),
        }
    }
}

/// An element or attribute wildcard
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Wildcard {
    /// Namespace constraint
    pub namespace: NamespaceConstraint,
    /// Process contents mode
    pub process_contents: ProcessContents,
}

impl Wildcard {
    /// Create a wildcard
    pub fn new(namespace: NamespaceConstraint, process_contents: ProcessContents) -> Self {
        Self {
            namespace,
            process_contents,
        }
    }

    /// `##any` with lax processing, as used by anyType
    pub fn lax_any() -> Self {
        Self::new(NamespaceConstraint::Any, ProcessContents::Lax)
    }

    /// Check if a name matches this wildcard
    pub fn matches(&self, name: &QName) -> bool {
        self.namespace.is_allowed(name.namespace.as_deref())
    }

    /// Union with another attribute wildcard; the first one's processContents wins
    pub fn union(&self, other: &Wildcard) -> Wildcard {
        Wildcard::new(self.namespace.union(&other.namespace), self.process_contents)
    }
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_constraint_any() {
        let nc = NamespaceConstraint::Any;
        assert!(nc.is_allowed(Some("http://example.com")));
        assert!(nc.is_allowed(None));
    }

    #[test]
    fn test_namespace_constraint_other() {
        let nc = NamespaceConstraint::other(Some("urn:tns"));
        assert!(nc.is_allowed(Some("urn:else")));
        assert!(!nc.is_allowed(Some("urn:tns")));
        assert!(!nc.is_allowed(None));
    }

    #[test]
    fn test_namespace_constraint_enumeration() {
        let nc = NamespaceConstraint::only([None, Some("urn:tns"), Some("urn:x")]);
        assert!(nc.is_allowed(None));
        assert!(nc.is_allowed(Some("urn:tns")));
        assert!(nc.is_allowed(Some("urn:x")));
        assert!(!nc.is_allowed(Some("urn:y")));
    }

    #[test]
    fn test_namespace_constraint_not() {
        let nc = NamespaceConstraint::Not(["urn:a".to_string()].into_iter().collect());
        assert!(!nc.is_allowed(Some("urn:a")));
        assert!(nc.is_allowed(Some("urn:b")));
    }

    #[test]
    fn test_namespace_constraint_union() {
        let a = NamespaceConstraint::only([Some("urn:a")]);
        let b = NamespaceConstraint::only([Some("urn:b"), None]);
        let u = a.union(&b);
        assert!(u.is_allowed(Some("urn:a")));
        assert!(u.is_allowed(Some("urn:b")));
        assert!(u.is_allowed(None));
        assert_eq!(a.union(&NamespaceConstraint::Any), NamespaceConstraint::Any);
    }

    #[test]
    fn test_wildcard_matching() {
        let wc = Wildcard::new(NamespaceConstraint::only([Some("urn:a")]), ProcessContents::Skip);
        assert!(wc.matches(&QName::namespaced("urn:a", "x")));
        assert!(!wc.matches(&QName::local("x")));
        assert_eq!(wc.to_string(), "urn:a");
        assert!(Wildcard::lax_any().matches(&QName::local("anything")));
    }
}
