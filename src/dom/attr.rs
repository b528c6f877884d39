use std::{
    cell::RefCell,
    mem::replace,
    rc::{Rc, Weak},
};

use crate::{dom::DOMException, parser::qname::split_qname2};

use super::{
    NodeType,
    document::{DocumentRef, DocumentWeakRef},
    element::{ElementRef, ElementWeakRef},
    node::{Node, NodeConnection, NodeRef},
};

/// Implementation of [Attr](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-637646024)
/// interface on [1.4 Fundamental Interfaces: Core Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-BBACDC08)
///
/// The value is kept as a plain string rather than as a list of child nodes.
pub struct Attr {
    // Attr objects are not part of the document tree, so they have no parent
    // and no siblings.
    owner_document: DocumentWeakRef,

    /// Implementation of `name` attribute of `Attr`.
    /// as same as `nodeName` for `Node`.
    name: Rc<str>,
    /// Implementation of `ownerElement` attribute of `Attr`.
    owner_element: Option<ElementWeakRef>,
    /// Implementation of `namespaceURI` for `Node`.
    namespace_uri: Option<Rc<str>>,
    /// Implementation of `prefix` for `Node`.
    prefix: Option<Rc<str>>,
    /// Implementation of `localName` for `Node`.
    ///
    /// `None` for attributes created by the namespace-unaware factory.
    local_name: Option<Rc<str>>,
    /// Implementation of `value` attribute of `Attr`.
    value: String,
}

/// Wrapper of `Rc<RefCell<Attr>>`.
#[derive(Clone)]
pub struct AttrRef(pub(super) Rc<RefCell<Attr>>);

impl AttrRef {
    /// Create new namespace-unaware [`AttrRef`].
    pub(super) fn new(doc: DocumentWeakRef, name: Rc<str>) -> Self {
        Self(Rc::new(RefCell::new(Attr {
            owner_document: doc,
            name,
            owner_element: None,
            namespace_uri: None,
            prefix: None,
            local_name: None,
            value: String::new(),
        })))
    }

    /// Create new [`AttrRef`] whose qualified name is `qname` and namespace is `ns_uri`.
    pub(super) fn with_namespace(
        doc: DocumentWeakRef,
        qname: Rc<str>,
        ns_uri: Option<Rc<str>>,
    ) -> Self {
        let (prefix, local_name) = match split_qname2(&qname) {
            Some((prefix, local)) => (Some(prefix.into()), local.into()),
            None => (None, qname.clone()),
        };
        Self(Rc::new(RefCell::new(Attr {
            owner_document: doc,
            name: qname,
            owner_element: None,
            namespace_uri: ns_uri,
            prefix,
            local_name: Some(local_name),
            value: String::new(),
        })))
    }

    /// Implementation of `name` attribute.
    pub fn name(&self) -> Rc<str> {
        self.0.borrow().name.clone()
    }

    /// The local name, or the qualified name for namespace-unaware attributes.
    pub fn local_name_str(&self) -> Rc<str> {
        let attr = self.0.borrow();
        attr.local_name.clone().unwrap_or_else(|| attr.name.clone())
    }

    /// Implementation of `value` attribute.
    pub fn value(&self) -> String {
        self.0.borrow().value.clone()
    }

    /// Implementation of `value` attribute.
    ///
    /// The value is not parsed; markup in it is kept as literal text.
    pub fn set_value(&mut self, value: impl Into<String>) -> String {
        replace(&mut self.0.borrow_mut().value, value.into())
    }

    /// Implementation of `ownerElement` attribute.
    pub fn owner_element(&self) -> Option<ElementRef> {
        self.0
            .borrow()
            .owner_element
            .as_ref()
            .and_then(|elem| elem.upgrade())
    }

    /// Set new owner element.
    /// Return old owner element if exists.
    pub(super) fn set_owner_element(&mut self, elem: Option<ElementRef>) -> Option<ElementRef> {
        let new = elem.map(|elem| elem.downgrade());
        replace(&mut self.0.borrow_mut().owner_element, new).and_then(|old| old.upgrade())
    }

    /// Generate [`AttrWeakRef`] from `self`.
    pub fn downgrade(&self) -> AttrWeakRef {
        AttrWeakRef(Rc::downgrade(&self.0))
    }
}

impl Node for AttrRef {
    fn node_name(&self) -> Rc<str> {
        self.name()
    }

    fn node_value(&self) -> Option<Rc<str>> {
        Some(self.0.borrow().value.as_str().into())
    }

    fn set_node_value(&mut self, value: &str) -> Result<(), DOMException> {
        self.set_value(value);
        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::Attribute
    }

    fn owner_document(&self) -> Option<DocumentRef> {
        self.0.borrow().owner_document.upgrade()
    }

    /// # Specification
    /// ```text
    /// Cloning an Attr directly, as opposed to be cloned as part of an Element cloning
    /// operation, returns a specified attribute (specified is true).
    /// ```
    fn clone_node(&self, _deep: bool) -> NodeRef {
        let attr = self.0.borrow();
        let new = Self(Rc::new(RefCell::new(Attr {
            owner_document: attr.owner_document.clone(),
            name: attr.name.clone(),
            owner_element: None,
            namespace_uri: attr.namespace_uri.clone(),
            prefix: attr.prefix.clone(),
            local_name: attr.local_name.clone(),
            value: attr.value.clone(),
        })));
        new.into()
    }

    fn namespace_uri(&self) -> Option<Rc<str>> {
        self.0.borrow().namespace_uri.clone()
    }

    fn prefix(&self) -> Option<Rc<str>> {
        self.0.borrow().prefix.clone()
    }

    fn local_name(&self) -> Option<Rc<str>> {
        self.0.borrow().local_name.clone()
    }

    fn text_content(&self) -> Option<String> {
        Some(self.value())
    }

    fn set_text_content(&mut self, text: &str) -> Result<(), DOMException> {
        self.set_value(text);
        Ok(())
    }

    fn is_same_node(&self, other: &NodeRef) -> bool {
        matches!(other, NodeRef::Attribute(other) if Rc::ptr_eq(&self.0, &other.0))
    }

    fn lookup_prefix(&self, ns_uri: &str) -> Option<Rc<str>> {
        self.owner_element()?.lookup_prefix(ns_uri)
    }

    fn lookup_namespace_uri(&self, prefix: Option<&str>) -> Option<Rc<str>> {
        self.owner_element()?.lookup_namespace_uri(prefix)
    }
}

impl NodeConnection for AttrRef {
    fn set_parent_node(&mut self, _: Option<NodeRef>) -> Option<NodeRef> {
        None
    }

    fn set_first_child(&mut self, _: Option<NodeRef>) -> Option<NodeRef> {
        None
    }

    fn set_last_child(&mut self, _: Option<NodeRef>) -> Option<NodeRef> {
        None
    }

    fn set_previous_sibling(&mut self, _: Option<NodeRef>) -> Option<NodeRef> {
        None
    }

    fn set_next_sibling(&mut self, _: Option<NodeRef>) -> Option<NodeRef> {
        None
    }

    /// The owner element is kept; an element adopting its attributes stays their owner.
    fn adopted_to(&mut self, new_doc: DocumentRef) {
        self.0.borrow_mut().owner_document = new_doc.downgrade();
    }
}

/// Wrapper of `Weak<RefCell<Attr>>`.
#[derive(Clone)]
pub struct AttrWeakRef(Weak<RefCell<Attr>>);

impl AttrWeakRef {
    /// Generate [`AttrRef`] from `self`.
    /// Success conditions are the same as for [`std::rc::Weak::upgrade`].
    pub fn upgrade(&self) -> Option<AttrRef> {
        self.0.upgrade().map(AttrRef)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_names() {
        let doc = DocumentRef::new();
        let attr = doc
            .create_attribute_ns(Some("urn:x"), "p:local")
            .unwrap();
        assert_eq!(&*attr.name(), "p:local");
        assert_eq!(attr.prefix().as_deref(), Some("p"));
        assert_eq!(attr.local_name().as_deref(), Some("local"));
        assert_eq!(attr.namespace_uri().as_deref(), Some("urn:x"));

        let plain = doc.create_attribute("plain").unwrap();
        assert!(plain.local_name().is_none());
        assert_eq!(&*plain.local_name_str(), "plain");
    }

    #[test]
    fn value_and_clone() {
        let doc = DocumentRef::new();
        let mut elem = doc.create_element("e").unwrap();
        elem.set_attribute("a", "1 < 2").unwrap();
        let attr = elem.get_attribute_node("a").unwrap();
        assert_eq!(attr.value(), "1 < 2");
        assert_eq!(attr.text_content().as_deref(), Some("1 < 2"));
        assert!(attr.owner_element().is_some());

        let cloned = attr.clone_node(true).as_attribute().unwrap();
        assert!(cloned.owner_element().is_none());
        assert!(cloned.is_equal_node(&attr.into()));
    }
}
