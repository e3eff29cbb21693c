//! Qualified names and namespace scopes
//!
//! Every schema component and every instance node is identified by a
//! [`QName`]. A [`NamespaceScope`] holds the prefix bindings in force at one
//! element; it resolves element and attribute names while a document is
//! parsed, and the prefixed lexical forms of `xsi:type` and `xs:QName`.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// XSD namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XSI namespace (xsi:type, xsi:nil, ...)
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML namespace, bound to the `xml` prefix everywhere
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace of `xmlns` declarations
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// An expanded name: optional namespace URI plus local part.
///
/// Displays in Clark notation, `{uri}local`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QName {
    /// Namespace URI, `None` for names in no namespace
    pub namespace: Option<String>,
    /// Local part
    pub local_name: String,
}

impl QName {
    /// Build from an optional namespace
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        let namespace = namespace.map(Into::into);
        Self {
            namespace,
            local_name: local_name.into(),
        }
    }

    /// A name in no namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self::new(None::<String>, local_name)
    }

    /// A name in `namespace`
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self::new(Some(namespace), local_name)
    }

    /// A name in the XSD namespace
    pub fn xsd(local_name: impl Into<String>) -> Self {
        Self::namespaced(XSD_NAMESPACE, local_name)
    }

    /// A name in the XSI namespace
    pub fn xsi(local_name: impl Into<String>) -> Self {
        Self::namespaced(XSI_NAMESPACE, local_name)
    }

    /// Namespace URI, empty string for no namespace
    pub fn namespace_uri(&self) -> &str {
        self.namespace.as_deref().unwrap_or_default()
    }

    /// Whether the name is `{namespace}local_name`; `None` matches only
    /// names in no namespace
    pub fn matches(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local_name == local_name
    }

    /// Whether the name lives in `namespace`
    pub fn is_in(&self, namespace: &str) -> bool {
        self.namespace.as_deref() == Some(namespace)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{{{}}}", ns)?;
        }
        f.write_str(&self.local_name)
    }
}

/// Split a lexical `prefix:local` form. Unprefixed names give `None`.
pub fn split_prefixed(lexical: &str) -> (Option<&str>, &str) {
    match lexical.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, lexical),
    }
}

/// Prefix bindings in force at one element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceScope {
    bindings: HashMap<String, String>,
    // Some("") records an explicit xmlns="" undeclaration
    default: Option<String>,
}

impl NamespaceScope {
    /// An empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` to `uri`; `None` declares the default namespace and an
    /// empty `uri` undeclares it
    pub fn declare(&mut self, prefix: Option<&str>, uri: impl Into<String>) {
        let uri = uri.into();
        match prefix {
            Some(prefix) => {
                self.bindings.insert(prefix.to_string(), uri);
            }
            None => self.default = Some(uri),
        }
    }

    /// Namespace bound to `prefix`, or the default namespace for `None`
    pub fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some("xml") => Some(XML_NAMESPACE),
            Some(prefix) => self.bindings.get(prefix).map(String::as_str),
            None => self.default.as_deref().filter(|uri| !uri.is_empty()),
        }
    }

    /// Scope of a child element declaring `local`
    pub fn inherit(&self, local: &NamespaceScope) -> NamespaceScope {
        let mut bindings = self.bindings.clone();
        bindings.extend(local.bindings.iter().map(|(p, uri)| (p.clone(), uri.clone())));
        NamespaceScope {
            bindings,
            default: local.default.clone().or_else(|| self.default.clone()),
        }
    }

    /// Expand an element name; unprefixed names take the default namespace
    pub fn resolve(&self, lexical: &str) -> Result<QName> {
        let (prefix, local) = split_prefixed(lexical);
        match (prefix, self.lookup(prefix)) {
            (Some(prefix), None) => Err(Error::Namespace(format!("Unknown prefix: {}", prefix))),
            (_, namespace) => Ok(QName::new(namespace, local)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clark_notation() {
        assert_eq!(QName::namespaced("urn:a", "x").to_string(), "{urn:a}x");
        assert_eq!(QName::local("x").to_string(), "x");
        assert_eq!(QName::local("x").namespace_uri(), "");
        assert!(QName::xsi("nil").is_in(XSI_NAMESPACE));
        assert!(QName::xsd("int").matches(Some(XSD_NAMESPACE), "int"));
        assert!(!QName::xsd("int").matches(None, "int"));
        assert!(QName::local("int").matches(None, "int"));
    }

    #[test]
    fn test_split_prefixed() {
        assert_eq!(split_prefixed("xs:int"), (Some("xs"), "int"));
        assert_eq!(split_prefixed("int"), (None, "int"));
    }

    #[test]
    fn test_scope_lookup_and_resolve() {
        let mut scope = NamespaceScope::new();
        scope.declare(Some("xs"), XSD_NAMESPACE);
        scope.declare(None, "urn:default");

        assert_eq!(scope.lookup(Some("xml")), Some(XML_NAMESPACE));
        assert_eq!(scope.resolve("xs:element").unwrap(), QName::xsd("element"));
        assert_eq!(scope.resolve("item").unwrap(), QName::namespaced("urn:default", "item"));
        assert!(matches!(scope.resolve("nope:item"), Err(Error::Namespace(_))));
    }

    #[test]
    fn test_child_scope_overrides_and_undeclares() {
        let mut outer = NamespaceScope::new();
        outer.declare(Some("p"), "urn:outer");
        outer.declare(None, "urn:default");

        let mut inner = NamespaceScope::new();
        inner.declare(Some("p"), "urn:inner");
        let merged = outer.inherit(&inner);
        assert_eq!(merged.lookup(Some("p")), Some("urn:inner"));
        assert_eq!(merged.lookup(None), Some("urn:default"));

        let mut bare = NamespaceScope::new();
        bare.declare(None, "");
        let merged = outer.inherit(&bare);
        assert_eq!(merged.lookup(None), None);
        assert_eq!(merged.resolve("item").unwrap(), QName::local("item"));
    }
}
