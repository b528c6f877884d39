use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::parser::{namespace::NamespaceMap, qname::split_qname2, qname::validate_name};

use super::{
    DOMException, NodeType,
    attr::AttrRef,
    document::{DocumentRef, DocumentWeakRef},
    named_node_map::NamedNodeMap,
    node::{
        Node, NodeConnection, NodeRef, NodeWeakRef, adopt_children, clone_children,
        impl_child_links, impl_child_setters, impl_sibling_links, impl_sibling_setters,
    },
    node_list::LiveNodeList,
    notify_mutation, validate_and_extract,
};

/// Implementation of [Element](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-745549614)
/// interface on [1.4 Fundamental Interfaces: Core Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-BBACDC08)
pub struct Element {
    /// [1.1.1 The DOM Structure Model](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1590626202)
    /// - `Document`
    /// - `DocumentFragment`
    /// - `Element`
    parent_node: Option<NodeWeakRef>,
    /// [1.1.1 The DOM Structure Model](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1590626202)
    /// - `Element`
    /// - `Text`
    /// - `Comment`
    /// - `ProcessingInstruction`
    /// - `CDATASection`
    first_child: Option<NodeRef>,
    last_child: Option<NodeRef>,
    previous_sibling: Option<NodeWeakRef>,
    next_sibling: Option<NodeRef>,
    /// Implementation of `attributes` attribute.
    attributes: NamedNodeMap,
    owner_document: DocumentWeakRef,

    /// Implementation of `tagName` for `Element`.
    /// as same as `nodeName` for `Node`.
    tag_name: Rc<str>,
    /// Implementation of `namespaceURI` for `Node`.
    namespace_uri: Option<Rc<str>>,
    /// Implementation of `prefix` for `Node`.
    prefix: Option<Rc<str>>,
    /// Implementation of `localName` for `Node`.
    local_name: Rc<str>,
    /// Namespace bindings in scope when the parser finished this element's start tag.
    namespaces: Option<NamespaceMap>,
}

/// Wrapper of `Rc<RefCell<Element>>`.
#[derive(Clone)]
pub struct ElementRef(pub(super) Rc<RefCell<Element>>);

impl ElementRef {
    fn build(
        doc: DocumentWeakRef,
        tag_name: Rc<str>,
        namespace_uri: Option<Rc<str>>,
        prefix: Option<Rc<str>>,
        local_name: Rc<str>,
    ) -> Self {
        Self(Rc::new_cyclic(|weak| {
            RefCell::new(Element {
                parent_node: None,
                first_child: None,
                last_child: None,
                previous_sibling: None,
                next_sibling: None,
                attributes: NamedNodeMap::new(ElementWeakRef(weak.clone())),
                owner_document: doc,
                tag_name,
                namespace_uri,
                prefix,
                local_name,
                namespaces: None,
            })
        }))
    }

    /// Create new namespace-unaware [`ElementRef`].
    ///
    /// The local name is the same as `tag_name`.
    pub(super) fn new(doc: DocumentWeakRef, tag_name: Rc<str>) -> Self {
        Self::build(doc, tag_name.clone(), None, None, tag_name)
    }

    /// Create new [`ElementRef`] whose qualified name is `qname` and namespace is `ns_uri`.
    ///
    /// Names are not validated.
    pub(crate) fn with_namespace(
        doc: DocumentWeakRef,
        qname: Rc<str>,
        ns_uri: Option<Rc<str>>,
    ) -> Self {
        let (prefix, local_name) = match split_qname2(&qname) {
            Some((prefix, local)) => (Some(prefix.into()), local.into()),
            None => (None, qname.clone()),
        };
        Self::build(doc, qname, ns_uri, prefix, local_name)
    }

    /// Implementation of `tagName` attribute.
    pub fn tag_name(&self) -> Rc<str> {
        self.0.borrow().tag_name.clone()
    }

    /// The local name without the optional `Option` of [`Node::local_name`].
    pub fn local_name_str(&self) -> Rc<str> {
        self.0.borrow().local_name.clone()
    }

    /// Generate [`ElementWeakRef`] from `self`.
    pub fn downgrade(&self) -> ElementWeakRef {
        ElementWeakRef(Rc::downgrade(&self.0))
    }

    fn attribute_map(&self) -> NamedNodeMap {
        self.0.borrow().attributes.clone()
    }

    /// The namespace bindings recorded by the parser for this element, if any.
    pub fn namespaces(&self) -> Option<NamespaceMap> {
        self.0.borrow().namespaces.clone()
    }

    /// Record the namespace bindings in scope for this element.
    pub(crate) fn set_namespaces(&mut self, namespaces: NamespaceMap) {
        self.0.borrow_mut().namespaces = Some(namespaces);
    }

    /// Append an attribute read by the parser.
    ///
    /// Neither the name nor duplicates are checked, and no mutation is recorded.
    pub(crate) fn push_parsed_attribute(
        &mut self,
        qname: Rc<str>,
        ns_uri: Option<Rc<str>>,
        value: String,
    ) {
        let doc = self.0.borrow().owner_document.clone();
        let mut attr = AttrRef::with_namespace(doc, qname, ns_uri);
        attr.set_value(value);
        let owner = self.clone();
        self.attribute_map().push_unchecked(attr, &owner);
    }

    /// Implementation of [`getAttribute`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-666EE0F9) method.
    ///
    /// # Note
    /// As the DOM specification describes, this method returns an empty string if the attribute
    /// is not found. Therefore, the return value is not [`Option`].\
    /// You can use [`get_attribute_node`](crate::dom::element::ElementRef::get_attribute_node)
    /// to determine the existence of an attribute.
    pub fn get_attribute(&self, name: &str) -> String {
        self.get_attribute_node(name)
            .map(|attr| attr.value())
            .unwrap_or_default()
    }

    /// Implementation of [`setAttribute`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-F68F082) method.
    ///
    /// # Specification
    /// ```text
    /// Adds a new attribute. If an attribute with that name is already present in the
    /// element, its value is changed to be that of the value parameter. This value is
    /// a simple string; it is not parsed as it is being set. So any markup (such as
    /// syntax to be recognized as an entity reference) is treated as literal text, and
    /// needs to be appropriately escaped by the implementation when it is written out.
    ///
    /// Exceptions
    ///     DOMException
    ///     INVALID_CHARACTER_ERR:       Raised if the specified name is not an XML name
    ///                                  according to the XML version in use specified in
    ///                                  the Document.xmlVersion attribute.
    /// ```
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), DOMException> {
        if !validate_name(name) {
            return Err(DOMException::InvalidCharacterErr);
        }
        if let Some(mut attr) = self.get_attribute_node(name) {
            attr.set_value(value);
            notify_mutation(&self.clone().into());
            return Ok(());
        }
        let mut attr = AttrRef::new(self.0.borrow().owner_document.clone(), name.into());
        attr.set_value(value);
        self.attribute_map().set_named_item(attr)?;
        Ok(())
    }

    /// Implementation of [`removeAttribute`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-6D6AC0F9) method.
    ///
    /// If no attribute with this name is found, this method has no effect.
    pub fn remove_attribute(&mut self, name: &str) {
        self.attribute_map().remove_named_item(name).ok();
    }

    /// Implementation of [`getAttributeNode`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-217A91B8) method.
    pub fn get_attribute_node(&self, name: &str) -> Option<AttrRef> {
        self.attribute_map().get_named_item(name)
    }

    /// Implementation of [`setAttributeNode`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-887236154) method.
    ///
    /// # Specification
    /// ```text
    /// Adds a new attribute node. If an attribute with that name (nodeName) is already
    /// present in the element, it is replaced by the new one. Replacing an attribute
    /// node by itself has no effect.
    ///
    /// Exceptions
    ///     DOMException
    ///     INUSE_ATTRIBUTE_ERR:         Raised if newAttr is already an attribute of
    ///                                  another Element object. The DOM user must explicitly
    ///                                  clone Attr nodes to re-use them in other elements.
    /// ```
    ///
    /// An attribute created by another document is adopted instead of raising
    /// `WRONG_DOCUMENT_ERR`.
    pub fn set_attribute_node(&mut self, new_attr: AttrRef) -> Result<Option<AttrRef>, DOMException> {
        self.attribute_map().set_named_item(new_attr)
    }

    /// Implementation of [`setAttributeNodeNS`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-ElSetAtNodeNS) method.
    pub fn set_attribute_node_ns(
        &mut self,
        new_attr: AttrRef,
    ) -> Result<Option<AttrRef>, DOMException> {
        self.attribute_map().set_named_item_ns(new_attr)
    }

    /// Implementation of [`removeAttributeNode`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-D589198) method.
    ///
    /// # Errors
    /// - `NotFoundErr` if `old_attr` is not an attribute of this element.
    pub fn remove_attribute_node(&mut self, old_attr: AttrRef) -> Result<AttrRef, DOMException> {
        self.attribute_map().remove_node(&old_attr)
    }

    /// Implementation of [`getAttributeNS`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-ElGetAttrNS) method.
    ///
    /// Returns an empty string if the attribute is not found.
    pub fn get_attribute_ns(&self, namespace_uri: Option<&str>, local_name: &str) -> String {
        self.get_attribute_node_ns(namespace_uri, local_name)
            .map(|attr| attr.value())
            .unwrap_or_default()
    }

    /// Implementation of [`getAttributeNodeNS`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-ElGetAtNodeNS) method.
    pub fn get_attribute_node_ns(
        &self,
        namespace_uri: Option<&str>,
        local_name: &str,
    ) -> Option<AttrRef> {
        self.attribute_map()
            .get_named_item_ns(namespace_uri, local_name)
    }

    /// Implementation of [`setAttributeNS`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-ElSetAttrNS) method.
    ///
    /// # Specification
    /// ```text
    /// Adds a new attribute. If an attribute with the same local name and namespace
    /// URI is already present on the element, its prefix is changed to be the prefix
    /// part of the qualifiedName, and its value is changed to be the value parameter.
    ///
    /// Exceptions
    ///     DOMException
    ///     INVALID_CHARACTER_ERR:       Raised if the specified qualified name is not
    ///                                  an XML name according to the XML version in use
    ///                                  specified in the Document.xmlVersion attribute.
    ///     NAMESPACE_ERR:               Raised if the qualifiedName is malformed per the
    ///                                  Namespaces in XML specification, if the
    ///                                  qualifiedName has a prefix and the namespaceURI
    ///                                  is null, if the qualifiedName has a prefix that
    ///                                  is "xml" and the namespaceURI is different from
    ///                                  "http://www.w3.org/XML/1998/namespace", if the
    ///                                  qualifiedName or its prefix is "xmlns" and the
    ///                                  namespaceURI is different from
    ///                                  "http://www.w3.org/2000/xmlns/", or if the
    ///                                  namespaceURI is "http://www.w3.org/2000/xmlns/"
    ///                                  and neither the qualifiedName nor its prefix is
    ///                                  "xmlns".
    /// ```
    ///
    /// The replacement keeps the attribute's position; a changed prefix is applied by
    /// replacing the `Attr` node.
    pub fn set_attribute_ns(
        &mut self,
        namespace_uri: Option<&str>,
        qualified_name: &str,
        value: &str,
    ) -> Result<(), DOMException> {
        let namespace_uri = validate_and_extract(namespace_uri, qualified_name)?;
        let local_name = split_qname2(qualified_name).map_or(qualified_name, |(_, local)| local);
        if let Some(mut attr) = self.get_attribute_node_ns(namespace_uri, local_name) {
            if &*attr.name() == qualified_name {
                attr.set_value(value);
                notify_mutation(&self.clone().into());
                return Ok(());
            }
        }
        let mut attr = AttrRef::with_namespace(
            self.0.borrow().owner_document.clone(),
            qualified_name.into(),
            namespace_uri.map(Rc::from),
        );
        attr.set_value(value);
        self.attribute_map().set_named_item_ns(attr)?;
        Ok(())
    }

    /// Implementation of [`removeAttributeNS`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-ElRemAtNS) method.
    pub fn remove_attribute_ns(&mut self, namespace_uri: Option<&str>, local_name: &str) {
        self.attribute_map()
            .remove_named_item_ns(namespace_uri, local_name)
            .ok();
    }

    /// Implementation of [`hasAttribute`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-ElHasAttr) method.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute_node(name).is_some()
    }

    /// Implementation of [`hasAttributeNS`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-ElHasAttrNS) method.
    pub fn has_attribute_ns(&self, namespace_uri: Option<&str>, local_name: &str) -> bool {
        self.get_attribute_node_ns(namespace_uri, local_name)
            .is_some()
    }

    /// Implementation of [`getElementsByTagName`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1938918D) method.
    ///
    /// # Specification
    /// ```text
    /// Returns a NodeList of all descendant Elements with a given tag name, in document order.
    ///
    /// Parameters
    ///     name of type DOMString
    ///         The name of the tag to match on. The special value "*" matches all tags.
    /// ```
    pub fn get_elements_by_tag_name(&self, name: &str) -> LiveNodeList<ElementRef> {
        LiveNodeList::elements_by_tag_name(self.clone().into(), name)
    }

    /// Implementation of [`getElementsByTagNameNS`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-A6C90942) method.
    ///
    /// `"*"` matches any namespace or any local name.
    pub fn get_elements_by_tag_name_ns(
        &self,
        namespace_uri: Option<&str>,
        local_name: &str,
    ) -> LiveNodeList<ElementRef> {
        LiveNodeList::elements_by_tag_name_ns(self.clone().into(), namespace_uri, local_name)
    }

    /// Find the first descendant matching `selector` using the document's selector engine.
    pub fn query_selector(&self, selector: &str) -> Result<Option<ElementRef>, DOMException> {
        let doc = self.owner_document().ok_or(DOMException::InvalidStateErr)?;
        doc.selector_engine()?
            .query_selector(selector, &self.clone().into())
    }

    /// Find every descendant matching `selector` using the document's selector engine.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementRef>, DOMException> {
        let doc = self.owner_document().ok_or(DOMException::InvalidStateErr)?;
        doc.selector_engine()?
            .query_selector_all(selector, &self.clone().into())
    }

    /// The namespace URI declared for `prefix` by an `xmlns` attribute of this element.
    ///
    /// `Some("")` means the declaration undeclares the prefix.
    fn declared_namespace(&self, prefix: Option<&str>) -> Option<String> {
        let name = match prefix {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_owned(),
        };
        self.get_attribute_node(&name).map(|attr| attr.value())
    }
}

impl Node for ElementRef {
    fn node_name(&self) -> Rc<str> {
        self.tag_name()
    }

    fn node_value(&self) -> Option<Rc<str>> {
        None
    }

    fn node_type(&self) -> NodeType {
        NodeType::Element
    }

    impl_sibling_links!(Element);
    impl_child_links!();

    fn attributes(&self) -> Option<NamedNodeMap> {
        Some(self.attribute_map())
    }

    fn has_attributes(&self) -> bool {
        !self.attribute_map().is_empty()
    }

    /// # Specification
    /// ```text
    /// ELEMENT_NODE
    ///     Cloning an Element copies all attributes and their values, including those
    ///     generated by the XML processor to represent defaulted attributes, but this
    ///     method does not copy any children it contains unless it is a deep clone.
    /// ```
    fn clone_node(&self, deep: bool) -> NodeRef {
        let mut new = {
            let elem = self.0.borrow();
            let new = Self::build(
                elem.owner_document.clone(),
                elem.tag_name.clone(),
                elem.namespace_uri.clone(),
                elem.prefix.clone(),
                elem.local_name.clone(),
            );
            new.0.borrow_mut().namespaces = elem.namespaces.clone();
            new
        };
        let mut attrs = new.attribute_map();
        for attr in self.attribute_map().iter() {
            if let Some(attr) = attr.clone_node(true).as_attribute() {
                attrs.push_unchecked(attr, &new);
            }
        }
        if deep {
            clone_children(self, &mut new);
        }
        new.into()
    }

    fn namespace_uri(&self) -> Option<Rc<str>> {
        self.0.borrow().namespace_uri.clone()
    }

    fn prefix(&self) -> Option<Rc<str>> {
        self.0.borrow().prefix.clone()
    }

    fn local_name(&self) -> Option<Rc<str>> {
        Some(self.local_name_str())
    }

    /// Bindings are searched on this element first (its own name, then its `xmlns:*`
    /// attributes, then the bindings recorded by the parser) and then on its ancestors.
    fn lookup_prefix(&self, ns_uri: &str) -> Option<Rc<str>> {
        if ns_uri.is_empty() {
            return None;
        }
        {
            let elem = self.0.borrow();
            if elem.namespace_uri.as_deref() == Some(ns_uri) && elem.prefix.is_some() {
                return elem.prefix.clone();
            }
        }
        for attr in self.attribute_map().iter() {
            let name = attr.name();
            if let Some(prefix) = name.strip_prefix("xmlns:") {
                if attr.value() == ns_uri {
                    return Some(prefix.into());
                }
            }
        }
        if let Some(prefix) = self
            .namespaces()
            .and_then(|namespaces| namespaces.prefix_for(ns_uri))
        {
            return Some(prefix);
        }
        self.parent_element()?.lookup_prefix(ns_uri)
    }

    /// `None` as `prefix` looks up the default namespace.
    fn lookup_namespace_uri(&self, prefix: Option<&str>) -> Option<Rc<str>> {
        let prefix = prefix.filter(|prefix| !prefix.is_empty());
        {
            let elem = self.0.borrow();
            if elem.namespace_uri.is_some() && elem.prefix.as_deref() == prefix {
                return elem.namespace_uri.clone();
            }
        }
        if let Some(uri) = self.declared_namespace(prefix) {
            return (!uri.is_empty()).then(|| uri.into());
        }
        if let Some(namespaces) = self.namespaces() {
            if let Some(uri) = namespaces.get(prefix.unwrap_or("")) {
                return (!uri.is_empty()).then_some(uri);
            }
        }
        self.parent_element()?.lookup_namespace_uri(prefix)
    }
}

impl NodeConnection for ElementRef {
    impl_sibling_setters!();
    impl_child_setters!();

    /// # Specification
    /// ```text
    /// ELEMENT_NODE
    ///     Specified attribute nodes of the source element are adopted. Default attributes
    ///     are discarded, though if the document being adopted into defines default attributes
    ///     for this element name, those are assigned. The descendants of the source element
    ///     are recursively adopted.
    /// ```
    fn adopted_to(&mut self, new_doc: DocumentRef) {
        self.0.borrow_mut().owner_document = new_doc.downgrade();
        for mut attr in self.attribute_map().iter() {
            attr.adopted_to(new_doc.clone());
        }
        adopt_children(self, &new_doc);
    }
}

/// Wrapper of `Weak<RefCell<Element>>`.
#[derive(Clone)]
pub struct ElementWeakRef(Weak<RefCell<Element>>);

impl ElementWeakRef {
    /// Generate [`ElementRef`] from `self`.
    /// Success conditions are the same as for [`std::rc::Weak::upgrade`].
    pub fn upgrade(&self) -> Option<ElementRef> {
        self.0.upgrade().map(ElementRef)
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::{XML_NS_NAMESPACE, XML_XML_NAMESPACE, node_list::NodeList};

    use super::*;

    #[test]
    fn attribute_roundtrip() {
        let doc = DocumentRef::new();
        let mut elem = doc.create_element("e").unwrap();
        assert_eq!(elem.get_attribute("missing"), "");
        elem.set_attribute("a", "1").unwrap();
        elem.set_attribute("a", "2").unwrap();
        assert_eq!(elem.get_attribute("a"), "2");
        assert!(elem.has_attribute("a"));
        assert_eq!(
            elem.set_attribute("1bad", "x").unwrap_err(),
            DOMException::InvalidCharacterErr
        );
        elem.remove_attribute("a");
        elem.remove_attribute("a");
        assert!(!elem.has_attributes());
    }

    #[test]
    fn attributes_counted_as_mutations() {
        let doc = DocumentRef::new();
        let mut elem = doc.create_element("e").unwrap();
        let before = doc.mutation_count();
        elem.set_attribute("a", "1").unwrap();
        assert_eq!(doc.mutation_count(), before + 1);
        elem.remove_attribute("a");
        assert_eq!(doc.mutation_count(), before + 2);
    }

    #[test]
    fn namespaced_attributes() {
        let doc = DocumentRef::new();
        let mut elem = doc.create_element("e").unwrap();
        elem.set_attribute_ns(Some("urn:x"), "p:a", "1").unwrap();
        assert_eq!(elem.get_attribute_ns(Some("urn:x"), "a"), "1");
        assert!(elem.has_attribute_ns(Some("urn:x"), "a"));
        elem.set_attribute_ns(Some("urn:x"), "q:a", "2").unwrap();
        assert_eq!(elem.attributes().unwrap().len(), 1);
        assert_eq!(elem.get_attribute("q:a"), "2");
        assert_eq!(
            elem.set_attribute_ns(None, "p:b", "1").unwrap_err(),
            DOMException::NamespaceErr
        );
        elem.remove_attribute_ns(Some("urn:x"), "a");
        assert!(!elem.has_attributes());
    }

    #[test]
    fn remove_attribute_node_checks_owner() {
        let doc = DocumentRef::new();
        let mut e1 = doc.create_element("e1").unwrap();
        let mut e2 = doc.create_element("e2").unwrap();
        e1.set_attribute("a", "1").unwrap();
        let attr = e1.get_attribute_node("a").unwrap();
        assert_eq!(
            e2.remove_attribute_node(attr.clone()).unwrap_err(),
            DOMException::NotFoundErr
        );
        let removed = e1.remove_attribute_node(attr).unwrap();
        assert!(removed.owner_element().is_none());
        e2.set_attribute_node(removed).unwrap();
        assert_eq!(e2.get_attribute("a"), "1");
    }

    #[test]
    fn namespace_lookup_through_attributes() {
        let doc = DocumentRef::new();
        let mut root = doc.create_element("root").unwrap();
        root.set_attribute_ns(Some(XML_NS_NAMESPACE), "xmlns:p", "urn:p")
            .unwrap();
        root.set_attribute("xmlns", "urn:default").unwrap();
        let mut child = doc.create_element("child").unwrap();
        root.append_child(child.clone().into()).unwrap();
        let text = doc.create_text_node("t");
        child.append_child(text.clone().into()).unwrap();

        assert_eq!(child.lookup_namespace_uri(Some("p")).as_deref(), Some("urn:p"));
        assert_eq!(text.lookup_namespace_uri(None).as_deref(), Some("urn:default"));
        assert!(child.is_default_namespace("urn:default"));
        assert_eq!(child.lookup_prefix("urn:p").as_deref(), Some("p"));
        assert!(child.lookup_namespace_uri(Some("q")).is_none());

        let mut inner = doc
            .create_element_ns(Some(XML_XML_NAMESPACE), "xml:inner")
            .unwrap();
        child.append_child(inner.clone().into()).unwrap();
        assert_eq!(
            inner.lookup_namespace_uri(Some("xml")).as_deref(),
            Some(XML_XML_NAMESPACE)
        );
        inner.set_attribute("xmlns", "").unwrap();
        assert!(inner.lookup_namespace_uri(None).is_none());
    }

    #[test]
    fn deep_clone_copies_attributes_and_children() {
        let doc = DocumentRef::new();
        let mut root = doc.create_element("root").unwrap();
        root.set_attribute("a", "1").unwrap();
        root.append_child(doc.create_element("child").unwrap().into())
            .unwrap();
        let shallow = root.clone_node(false).as_element().unwrap();
        assert!(shallow.first_child().is_none());
        assert_eq!(shallow.get_attribute("a"), "1");
        let deep = root.clone_node(true).as_element().unwrap();
        assert!(deep.is_equal_node(&root.clone().into()));
        let attr = deep.get_attribute_node("a").unwrap();
        assert!(
            attr.owner_element()
                .unwrap()
                .is_same_node(&deep.clone().into())
        );
        assert!(deep.parent_node().is_none());
    }

    #[test]
    fn elements_by_tag_name_is_live() {
        let mut doc = DocumentRef::new();
        let mut root = doc.create_element("root").unwrap();
        doc.append_child(root.clone().into()).unwrap();
        let list = root.get_elements_by_tag_name("item");
        assert_eq!(list.length(), 0);
        let mut group = doc.create_element("group").unwrap();
        root.append_child(group.clone().into()).unwrap();
        group
            .append_child(doc.create_element("item").unwrap().into())
            .unwrap();
        assert_eq!(list.length(), 1);
        assert_eq!(root.get_elements_by_tag_name("*").length(), 2);
    }
}
