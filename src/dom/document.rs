use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use log::debug;

use crate::parser::qname::{validate_name, validate_qname};

use super::{
    DOMException, NodeType, XML_XML_NAMESPACE,
    attr::AttrRef,
    character_data::{CDATASectionRef, CommentRef, TextRef},
    document_fragment::DocumentFragmentRef,
    document_type::DocumentTypeRef,
    element::ElementRef,
    node::{Node, NodeConnection, NodeRef, clone_children, impl_child_links, impl_child_setters},
    node_list::LiveNodeList,
    notify_mutation,
    pi::ProcessingInstructionRef,
    selector::{SelectorEngine, SelectorEngineFactory},
    validate_and_extract,
};

/// Implementation of [Document](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-i-Document)
/// interface on [1.4 Fundamental Interfaces: Core Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-BBACDC08)
pub struct Document {
    /// [1.1.1 The DOM Structure Model](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1590626202)
    /// - `Element` (maximum of one)
    /// - `ProcessingInstruction`
    /// - `Comment`
    /// - `DocumentType` (maximum of one)
    first_child: Option<NodeRef>,
    last_child: Option<NodeRef>,
    /// Bumped once per structural mutation of any tree owned by this document.
    mutation_count: u64,
    /// Implementation of `xmlVersion` attribute.
    xml_version: Option<Rc<str>>,
    /// Implementation of `xmlEncoding` attribute.
    xml_encoding: Option<Rc<str>>,
    /// Implementation of `xmlStandalone` attribute.
    ///
    /// `None` if the XML declaration had no `standalone` pseudo-attribute.
    xml_standalone: Option<bool>,
    /// HTML document or not
    html: bool,
    selector_factory: Option<SelectorEngineFactory>,
    selector_engine: Option<Rc<dyn SelectorEngine>>,
}

/// Wrapper of `Rc<RefCell<Document>>`.
#[derive(Clone)]
pub struct DocumentRef(pub(super) Rc<RefCell<Document>>);

impl DocumentRef {
    fn with_mode(html: bool) -> Self {
        Self(Rc::new(RefCell::new(Document {
            first_child: None,
            last_child: None,
            mutation_count: 0,
            xml_version: None,
            xml_encoding: None,
            xml_standalone: None,
            html,
            selector_factory: None,
            selector_engine: None,
        })))
    }

    /// Create new empty XML document.
    pub fn new() -> Self {
        Self::with_mode(false)
    }

    /// Create new empty HTML document.
    pub fn new_html() -> Self {
        Self::with_mode(true)
    }

    /// HTML document or not
    pub fn is_html(&self) -> bool {
        self.0.borrow().html
    }

    /// The current value of the mutation counter.
    pub fn mutation_count(&self) -> u64 {
        self.0.borrow().mutation_count
    }

    pub(super) fn bump_mutation_count(&self) {
        let mut doc = self.0.borrow_mut();
        doc.mutation_count = doc.mutation_count.wrapping_add(1);
    }

    /// Implementation of `xmlVersion` attribute.
    pub fn xml_version(&self) -> Option<Rc<str>> {
        self.0.borrow().xml_version.clone()
    }

    /// Implementation of `xmlVersion` attribute.
    pub fn set_xml_version(&mut self, version: Option<&str>) {
        self.0.borrow_mut().xml_version = version.map(Rc::from);
    }

    /// Implementation of `xmlEncoding` attribute.
    pub fn xml_encoding(&self) -> Option<Rc<str>> {
        self.0.borrow().xml_encoding.clone()
    }

    /// Implementation of `xmlEncoding` attribute.
    pub fn set_xml_encoding(&mut self, encoding: Option<&str>) {
        self.0.borrow_mut().xml_encoding = encoding.map(Rc::from);
    }

    /// Implementation of `xmlStandalone` attribute.
    pub fn xml_standalone(&self) -> Option<bool> {
        self.0.borrow().xml_standalone
    }

    /// Implementation of `xmlStandalone` attribute.
    pub fn set_xml_standalone(&mut self, standalone: Option<bool>) {
        self.0.borrow_mut().xml_standalone = standalone;
    }

    /// Generate [`DocumentWeakRef`] from `self`.
    pub fn downgrade(&self) -> DocumentWeakRef {
        DocumentWeakRef(Rc::downgrade(&self.0))
    }

    /// Implementation of `documentElement` attribute.
    pub fn document_element(&self) -> Option<ElementRef> {
        let mut children = self.first_child();
        while let Some(child) = children {
            if let NodeRef::Element(elem) = child {
                return Some(elem);
            }
            children = child.next_sibling();
        }
        None
    }

    /// Implementation of `doctype` attribute.
    pub fn doctype(&self) -> Option<DocumentTypeRef> {
        let mut children = self.first_child();
        while let Some(child) = children {
            if let NodeRef::DocumentType(doctype) = child {
                return Some(doctype);
            }
            children = child.next_sibling();
        }
        None
    }

    /// Implementation of [`createElement`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-2141741547) method.
    ///
    /// # Specification
    /// ```text
    /// Creates an element of the type specified. Note that the instance returned
    /// implements the Element interface, so attributes can be specified directly
    /// on the returned object.
    ///
    /// Exceptions
    ///     DOMException
    ///     INVALID_CHARACTER_ERR: Raised if the specified name is not an XML name
    ///                            according to the XML version in use specified in the
    ///                            Document.xmlVersion attribute.
    /// ```
    pub fn create_element(&self, tag_name: &str) -> Result<ElementRef, DOMException> {
        if !validate_name(tag_name) {
            return Err(DOMException::InvalidCharacterErr);
        }
        Ok(ElementRef::new(self.downgrade(), tag_name.into()))
    }

    /// Implementation of [`createElementNS`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-DocCrElNS) method.
    ///
    /// # Specification
    /// ```text
    /// Creates an element of the given qualified name and namespace URI.
    /// Per [XML Namespaces], applications must use the value null as the namespaceURI
    /// parameter for methods if they wish to have no namespace.
    ///
    /// Exceptions
    ///     DOMException
    ///     INVALID_CHARACTER_ERR: Raised if the specified qualifiedName is not an XML name
    ///                            according to the XML version in use specified in the
    ///                            Document.xmlVersion attribute.
    ///     NAMESPACE_ERR:         Raised if the qualifiedName is a malformed qualified name,
    ///                            if the qualifiedName has a prefix and the namespaceURI
    ///                            is null, or if the qualifiedName has a prefix that is "xml"
    ///                            and the namespaceURI is different from
    ///                            "http://www.w3.org/XML/1998/namespace" [XML Namespaces],
    ///                            or if the qualifiedName or its prefix is "xmlns" and the
    ///                            namespaceURI is different from
    ///                            "http://www.w3.org/2000/xmlns/", or if the namespaceURI
    ///                            is "http://www.w3.org/2000/xmlns/" and neither
    ///                            the qualifiedName nor its prefix is "xmlns".
    /// ```
    pub fn create_element_ns(
        &self,
        namespace_uri: Option<&str>,
        qualified_name: &str,
    ) -> Result<ElementRef, DOMException> {
        let namespace_uri = validate_and_extract(namespace_uri, qualified_name)?;
        Ok(ElementRef::with_namespace(
            self.downgrade(),
            qualified_name.into(),
            namespace_uri.map(Rc::from),
        ))
    }

    /// Implementation of [`createDocumentFragment`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-35CB04B5) method.
    pub fn create_document_fragment(&self) -> DocumentFragmentRef {
        DocumentFragmentRef::new(self.downgrade())
    }

    /// Implementation of [`createTextNode`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1975348127) method.
    pub fn create_text_node(&self, data: impl Into<String>) -> TextRef {
        TextRef::new(self.downgrade(), data)
    }

    /// Implementation of [`createComment`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1334481328) method.
    pub fn create_comment(&self, data: impl Into<String>) -> CommentRef {
        CommentRef::new(self.downgrade(), data)
    }

    /// Implementation of [`createCDATASection`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-D26C0AF8) method.
    ///
    /// # Specification
    /// ```text
    /// Exceptions
    ///     DOMException
    ///     NOT_SUPPORTED_ERR: Raised if this document is an HTML document.
    /// ```
    pub fn create_cdata_section(
        &self,
        data: impl Into<String>,
    ) -> Result<CDATASectionRef, DOMException> {
        if self.is_html() {
            return Err(DOMException::NotSupportedErr);
        }
        Ok(CDATASectionRef::new(self.downgrade(), data))
    }

    /// Implementation of [`createProcessingInstruction`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-135944439) method.
    ///
    /// # Errors
    /// - `InvalidCharacterErr` if `target` is not a Name or `data` contains `?>`.
    pub fn create_processing_instruction(
        &self,
        target: &str,
        data: &str,
    ) -> Result<ProcessingInstructionRef, DOMException> {
        if !validate_name(target) || data.contains("?>") {
            return Err(DOMException::InvalidCharacterErr);
        }
        Ok(ProcessingInstructionRef::new(
            self.downgrade(),
            target.into(),
            data,
        ))
    }

    /// Implementation of [`createAttribute`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1084891198) method.
    ///
    /// The new attribute has an empty value and no namespace.
    pub fn create_attribute(&self, name: &str) -> Result<AttrRef, DOMException> {
        if !validate_name(name) {
            return Err(DOMException::InvalidCharacterErr);
        }
        Ok(AttrRef::new(self.downgrade(), name.into()))
    }

    /// Implementation of [`createAttributeNS`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-DocCrAttrNS) method.
    ///
    /// The checks are the same as [`create_element_ns`](DocumentRef::create_element_ns).
    pub fn create_attribute_ns(
        &self,
        namespace_uri: Option<&str>,
        qualified_name: &str,
    ) -> Result<AttrRef, DOMException> {
        let namespace_uri = validate_and_extract(namespace_uri, qualified_name)?;
        Ok(AttrRef::with_namespace(
            self.downgrade(),
            qualified_name.into(),
            namespace_uri.map(Rc::from),
        ))
    }

    /// Implementation of [`createDocumentType`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#Level-2-Core-DOM-createDocType) method
    /// of `DOMImplementation`, bound to this document.
    ///
    /// # Errors
    /// - `InvalidCharacterErr` if `name` is not a Name.
    /// - `NamespaceErr` if `name` is not a QName.
    pub fn create_document_type(
        &self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> Result<DocumentTypeRef, DOMException> {
        if !validate_name(name) {
            return Err(DOMException::InvalidCharacterErr);
        }
        if !validate_qname(name) {
            return Err(DOMException::NamespaceErr);
        }
        Ok(DocumentTypeRef::new(
            self.downgrade(),
            name.into(),
            public_id.map(Rc::from),
            system_id.map(Rc::from),
            internal_subset.map(Rc::from),
        ))
    }

    /// Implementation of [`importNode`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-Core-Document-importNode) method.
    ///
    /// # Specification
    /// ```text
    /// Imports a node from another document to this document, without altering or
    /// removing the source node from the original document; this method creates a
    /// new copy of the source node. The returned node has no parent; (parentNode is
    /// null).
    ///
    /// Exceptions
    ///     DOMException
    ///     NOT_SUPPORTED_ERR:     Raised if the type of node being imported is not supported.
    /// ```
    ///
    /// `Document` and `DocumentType` nodes cannot be imported.
    pub fn import_node(&self, imported_node: NodeRef, deep: bool) -> Result<NodeRef, DOMException> {
        if matches!(
            imported_node.node_type(),
            NodeType::Document | NodeType::DocumentType
        ) {
            return Err(DOMException::NotSupportedErr);
        }
        let mut new = imported_node.clone_node(deep);
        new.adopted_to(self.clone());
        Ok(new)
    }

    /// Implementation of [`adoptNode`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-Document3-adoptNode) method.
    ///
    /// # Specification
    /// ```text
    /// Attempts to adopt a node from another document to this document. If supported,
    /// it changes the ownerDocument of the source node, its children, as well as the
    /// attached attribute nodes if there are any. If the source node has a parent it
    /// is first removed from the child list of its parent.
    ///
    /// Exceptions
    ///     DOMException
    ///     NOT_SUPPORTED_ERR:           Raised if the source node is of type DOCUMENT,
    ///                                  DOCUMENT_TYPE.
    /// ```
    ///
    /// An `Attr` is removed from its owner element.
    pub fn adopt_node(&self, mut source: NodeRef) -> Result<NodeRef, DOMException> {
        if matches!(
            source.node_type(),
            NodeType::Document | NodeType::DocumentType
        ) {
            return Err(DOMException::NotSupportedErr);
        }

        if let NodeRef::Attribute(attr) = &source {
            if let Some(mut elem) = attr.owner_element() {
                elem.remove_attribute_node(attr.clone())?;
            }
        } else if let Some(mut parent) = source.parent_node() {
            parent.remove_child(source.clone())?;
        }

        if source
            .owner_document()
            .is_none_or(|doc| !self.is_same_node(&doc.into()))
        {
            source.adopted_to(self.clone());
            notify_mutation(&self.clone().into());
        }
        Ok(source)
    }

    /// Implementation of [`getElementById`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-getElBId) method.
    ///
    /// Without DTD information, the attributes named `id` and `xml:id` are treated
    /// as ID attributes. The first match in document order is returned.
    pub fn get_element_by_id(&self, element_id: &str) -> Option<ElementRef> {
        if element_id.is_empty() {
            return None;
        }
        LiveNodeList::descendants(self.clone().into(), |node| node.as_element())
            .iter()
            .find(|elem| {
                elem.get_attribute("id") == element_id
                    || elem.get_attribute_ns(Some(XML_XML_NAMESPACE), "id") == element_id
            })
    }

    /// Implementation of [`getElementsByTagName`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-A6C9094) method.
    ///
    /// The special value `"*"` matches all tags.
    pub fn get_elements_by_tag_name(&self, tag_name: &str) -> LiveNodeList<ElementRef> {
        LiveNodeList::elements_by_tag_name(self.clone().into(), tag_name)
    }

    /// Implementation of [`getElementsByTagNameNS`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-getElBTNNS) method.
    pub fn get_elements_by_tag_name_ns(
        &self,
        namespace_uri: Option<&str>,
        local_name: &str,
    ) -> LiveNodeList<ElementRef> {
        LiveNodeList::elements_by_tag_name_ns(self.clone().into(), namespace_uri, local_name)
    }

    /// Register the factory that creates this document's [`SelectorEngine`].
    ///
    /// An engine created by a previous factory is discarded.
    pub fn set_selector_engine_factory(&mut self, factory: SelectorEngineFactory) {
        let mut doc = self.0.borrow_mut();
        doc.selector_factory = Some(factory);
        doc.selector_engine = None;
    }

    /// The cached selector engine, created on first use.
    ///
    /// # Errors
    /// - `NotSupportedErr` if no factory is registered.
    pub(super) fn selector_engine(&self) -> Result<Rc<dyn SelectorEngine>, DOMException> {
        if let Some(engine) = self.0.borrow().selector_engine.clone() {
            return Ok(engine);
        }
        let factory = self
            .0
            .borrow()
            .selector_factory
            .clone()
            .ok_or(DOMException::NotSupportedErr)?;
        debug!("create selector engine");
        let engine = factory();
        self.0.borrow_mut().selector_engine = Some(engine.clone());
        Ok(engine)
    }

    /// Find the first element in the document matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<ElementRef>, DOMException> {
        self.selector_engine()?
            .query_selector(selector, &self.clone().into())
    }

    /// Find every element in the document matching `selector`.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementRef>, DOMException> {
        self.selector_engine()?
            .query_selector_all(selector, &self.clone().into())
    }
}

impl Default for DocumentRef {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for DocumentRef {
    fn node_name(&self) -> Rc<str> {
        "#document".into()
    }

    fn node_value(&self) -> Option<Rc<str>> {
        None
    }

    fn node_type(&self) -> NodeType {
        NodeType::Document
    }

    impl_child_links!();

    /// The XML declaration and the selector factory are copied.
    /// Children are copied into the new document only if `deep`.
    fn clone_node(&self, deep: bool) -> NodeRef {
        let mut doc = {
            let src = self.0.borrow();
            DocumentRef(Rc::new(RefCell::new(Document {
                first_child: None,
                last_child: None,
                mutation_count: 0,
                xml_version: src.xml_version.clone(),
                xml_encoding: src.xml_encoding.clone(),
                xml_standalone: src.xml_standalone,
                html: src.html,
                selector_factory: src.selector_factory.clone(),
                selector_engine: None,
            })))
        };
        if deep {
            clone_children(self, &mut doc);
            let mut children = doc.first_child();
            while let Some(mut child) = children {
                children = child.next_sibling();
                child.adopted_to(doc.clone());
            }
        }
        doc.into()
    }

    fn text_content(&self) -> Option<String> {
        None
    }

    fn set_text_content(&mut self, _text: &str) -> Result<(), DOMException> {
        Ok(())
    }

    fn is_same_node(&self, other: &NodeRef) -> bool {
        matches!(other, NodeRef::Document(other) if Rc::ptr_eq(&self.0, &other.0))
    }

    fn lookup_prefix(&self, ns_uri: &str) -> Option<Rc<str>> {
        self.document_element()?.lookup_prefix(ns_uri)
    }

    fn lookup_namespace_uri(&self, prefix: Option<&str>) -> Option<Rc<str>> {
        self.document_element()?.lookup_namespace_uri(prefix)
    }
}

impl NodeConnection for DocumentRef {
    fn set_parent_node(&mut self, _: Option<NodeRef>) -> Option<NodeRef> {
        None
    }

    impl_child_setters!();

    fn set_previous_sibling(&mut self, _: Option<NodeRef>) -> Option<NodeRef> {
        None
    }

    fn set_next_sibling(&mut self, _: Option<NodeRef>) -> Option<NodeRef> {
        None
    }

    fn adopted_to(&mut self, _new_doc: DocumentRef) {
        // `Document` cannot be adopted.
    }
}

/// Wrapper of `Weak<RefCell<Document>>`.
#[derive(Clone, Default)]
pub struct DocumentWeakRef(Weak<RefCell<Document>>);

impl DocumentWeakRef {
    /// Generate [`DocumentRef`] from `self`.
    /// Success conditions are the same as for [`std::rc::Weak::upgrade`].
    pub fn upgrade(&self) -> Option<DocumentRef> {
        self.0.upgrade().map(DocumentRef)
    }
}
