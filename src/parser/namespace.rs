//! Namespace scoping for the parser.
//!
//! Every open element owns a [`NamespaceMap`]. A map is shared by reference with the
//! parent scope until the element declares `xmlns` or `xmlns:*`, at which point the
//! element gets its own copy with the new bindings installed. Ancestors and siblings
//! never observe the change.

use std::{collections::BTreeMap, rc::Rc};

use crate::{
    dom::{XHTML_NAMESPACE, XML_NS_NAMESPACE, XML_XML_NAMESPACE},
    parser::{qname::split_qname2, tokenizer::StartTag},
};

/// A copy-on-write map from prefix to namespace URI.
///
/// The empty prefix holds the default namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceMap(Rc<BTreeMap<Rc<str>, Rc<str>>>);

impl NamespaceMap {
    /// A map with only the `xml` prefix bound.
    pub fn new() -> Self {
        let mut map = BTreeMap::new();
        map.insert(Rc::from("xml"), Rc::from(XML_XML_NAMESPACE));
        Self(Rc::new(map))
    }

    /// The map documents parsed in HTML mode start with: `xml` and the XHTML
    /// namespace as the default namespace.
    pub fn html() -> Self {
        let mut map = Self::new();
        map.declare("", XHTML_NAMESPACE);
        map
    }

    /// The URI bound to `prefix`. `""` looks up the default namespace.
    pub fn get(&self, prefix: &str) -> Option<Rc<str>> {
        self.0.get(prefix).cloned()
    }

    /// A non-empty prefix bound to `uri`, if any.
    pub fn prefix_for(&self, uri: &str) -> Option<Rc<str>> {
        self.0
            .iter()
            .find(|(prefix, bound)| !prefix.is_empty() && ***bound == *uri)
            .map(|(prefix, _)| prefix.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(prefix, uri)| (prefix.as_ref(), uri.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if `self` and `other` are the same allocation, not merely equal.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Bind `prefix` to `uri`. An empty `uri` removes the binding.
    ///
    /// The storage is copied first if it is shared with another scope.
    pub fn declare(&mut self, prefix: &str, uri: &str) {
        let map = Rc::make_mut(&mut self.0);
        if uri.is_empty() {
            map.remove(prefix);
        } else {
            map.insert(Rc::from(prefix), Rc::from(uri));
        }
    }
}

impl Default for NamespaceMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Namespace information for one start tag.
#[derive(Debug, Clone)]
pub struct ResolvedTag {
    /// The namespace of the element itself.
    pub namespace_uri: Option<Rc<str>>,
    /// The namespace of each attribute, in the order of [`StartTag::attributes`].
    pub attributes: Vec<Option<Rc<str>>>,
    /// The scope of the element's content.
    pub namespaces: NamespaceMap,
    /// Prefixes used by the tag that no scope declares.
    pub undeclared: Vec<String>,
}

/// Resolve the element and attribute namespaces of `tag` opened inside `parent`.
///
/// Declarations on `tag` are installed before anything is resolved, so an element
/// may use a prefix it declares itself.
pub fn resolve(parent: &NamespaceMap, tag: &StartTag) -> ResolvedTag {
    let mut namespaces = parent.clone();
    for attr in &tag.attributes {
        if attr.qname == "xmlns" {
            namespaces.declare("", &attr.value);
        } else if let Some(prefix) = attr.qname.strip_prefix("xmlns:") {
            // `xml` and `xmlns` are fixed and cannot be rebound
            if prefix != "xml" && prefix != "xmlns" {
                namespaces.declare(prefix, &attr.value);
            }
        }
    }

    let mut undeclared = vec![];
    let mut lookup = |qname: &str, use_default: bool| match split_qname2(qname) {
        Some(("xml", _)) => Some(Rc::from(XML_XML_NAMESPACE)),
        Some(("xmlns", _)) => Some(Rc::from(XML_NS_NAMESPACE)),
        Some((prefix, _)) => {
            let uri = namespaces.get(prefix);
            if uri.is_none() && !undeclared.iter().any(|p| p == prefix) {
                undeclared.push(prefix.to_owned());
            }
            uri
        }
        None if qname == "xmlns" => Some(Rc::from(XML_NS_NAMESPACE)),
        None if use_default => namespaces.get(""),
        None => None,
    };

    let namespace_uri = lookup(&tag.name, true);
    let attributes = tag
        .attributes
        .iter()
        .map(|attr| lookup(&attr.qname, false))
        .collect();
    ResolvedTag {
        namespace_uri,
        attributes,
        namespaces,
        undeclared,
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::tokenizer::RawAttribute;

    use super::*;

    fn tag(name: &str, attrs: &[(&str, &str)]) -> StartTag {
        StartTag {
            name: name.to_owned(),
            attributes: attrs
                .iter()
                .map(|&(qname, value)| RawAttribute {
                    qname: qname.to_owned(),
                    value: value.to_owned(),
                    offset: 0,
                })
                .collect(),
            self_closing: false,
            end: 0,
            warnings: vec![],
        }
    }

    #[test]
    fn shared_until_declared() {
        let root = NamespaceMap::new();
        let plain = resolve(&root, &tag("a", &[("id", "1")]));
        assert!(plain.namespaces.shares_storage_with(&root));
        assert_eq!(plain.namespace_uri, None);

        let declaring = resolve(&root, &tag("p:a", &[("xmlns:p", "urn:p")]));
        assert!(!declaring.namespaces.shares_storage_with(&root));
        assert_eq!(declaring.namespace_uri.as_deref(), Some("urn:p"));
        // the parent scope is untouched
        assert!(root.get("p").is_none());
        assert_eq!(declaring.namespaces.prefix_for("urn:p").as_deref(), Some("p"));
    }

    #[test]
    fn attributes_and_reserved_prefixes() {
        let root = NamespaceMap::new();
        let res = resolve(
            &root,
            &tag(
                "a",
                &[
                    ("xmlns", "urn:default"),
                    ("xmlns:xml", "urn:bogus"),
                    ("plain", "x"),
                    ("xml:lang", "en"),
                    ("q:attr", "y"),
                ],
            ),
        );
        assert_eq!(res.namespace_uri.as_deref(), Some("urn:default"));
        assert_eq!(
            res.attributes,
            vec![
                Some(Rc::from(XML_NS_NAMESPACE)),
                Some(Rc::from(XML_NS_NAMESPACE)),
                None,
                Some(Rc::from(XML_XML_NAMESPACE)),
                None,
            ]
        );
        assert_eq!(res.undeclared, ["q"]);
        assert_eq!(res.namespaces.get("xml").as_deref(), Some(XML_XML_NAMESPACE));
    }

    #[test]
    fn empty_declaration_undeclares() {
        let html = NamespaceMap::html();
        assert_eq!(html.get("").as_deref(), Some(XHTML_NAMESPACE));
        let res = resolve(&html, &tag("svg", &[("xmlns", "")]));
        assert_eq!(res.namespace_uri, None);
        let inner = resolve(&res.namespaces, &tag("g", &[]));
        assert_eq!(inner.namespace_uri, None);
        assert!(inner.namespaces.shares_storage_with(&res.namespaces));
    }
}
