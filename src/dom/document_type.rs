use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use super::{
    NodeType,
    document::DocumentWeakRef,
    node::{Node, NodeRef, NodeWeakRef, impl_leaf_node_connection, impl_sibling_links},
};

/// Implementation of [DocumentType](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-412266927)
/// interface on [1.5 Extended Interfaces: XML Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-E067D597)
///
/// Declarations are not interpreted. The internal subset is kept verbatim so that
/// it can be written back.
pub struct DocumentType {
    parent_node: Option<NodeWeakRef>,
    previous_sibling: Option<NodeWeakRef>,
    next_sibling: Option<NodeRef>,
    owner_document: DocumentWeakRef,

    /// Implementation of `name` attribute.
    name: Rc<str>,
    /// Implementation of `publicId` attribute.
    public_id: Option<Rc<str>>,
    /// Implementation of `systemId` attribute.
    system_id: Option<Rc<str>>,
    /// Implementation of `internalSubset` attribute.
    internal_subset: Option<Rc<str>>,
}

/// Wrapper of `Rc<RefCell<DocumentType>>`.
#[derive(Clone)]
pub struct DocumentTypeRef(pub(super) Rc<RefCell<DocumentType>>);

impl DocumentTypeRef {
    pub(crate) fn new(
        doc: DocumentWeakRef,
        name: Rc<str>,
        public_id: Option<Rc<str>>,
        system_id: Option<Rc<str>>,
        internal_subset: Option<Rc<str>>,
    ) -> Self {
        Self(Rc::new(RefCell::new(DocumentType {
            parent_node: None,
            previous_sibling: None,
            next_sibling: None,
            owner_document: doc,
            name,
            public_id,
            system_id,
            internal_subset,
        })))
    }

    /// Implementation of `name` attribute.
    pub fn name(&self) -> Rc<str> {
        self.0.borrow().name.clone()
    }

    /// Implementation of `publicId` attribute.
    pub fn public_id(&self) -> Option<Rc<str>> {
        self.0.borrow().public_id.clone()
    }

    /// Implementation of `systemId` attribute.
    pub fn system_id(&self) -> Option<Rc<str>> {
        self.0.borrow().system_id.clone()
    }

    /// Implementation of `internalSubset` attribute.
    ///
    /// The text between `[` and `]`, without the brackets.
    pub fn internal_subset(&self) -> Option<Rc<str>> {
        self.0.borrow().internal_subset.clone()
    }

    /// Generate [`DocumentTypeWeakRef`] from `self`.
    pub fn downgrade(&self) -> DocumentTypeWeakRef {
        DocumentTypeWeakRef(Rc::downgrade(&self.0))
    }
}

impl Node for DocumentTypeRef {
    fn node_name(&self) -> Rc<str> {
        self.name()
    }

    fn node_value(&self) -> Option<Rc<str>> {
        None
    }

    fn node_type(&self) -> NodeType {
        NodeType::DocumentType
    }

    impl_sibling_links!(DocumentType);

    fn clone_node(&self, _deep: bool) -> NodeRef {
        let doctype = self.0.borrow();
        Self::new(
            doctype.owner_document.clone(),
            doctype.name.clone(),
            doctype.public_id.clone(),
            doctype.system_id.clone(),
            doctype.internal_subset.clone(),
        )
        .into()
    }

    fn text_content(&self) -> Option<String> {
        None
    }

    fn set_text_content(&mut self, _text: &str) -> Result<(), super::DOMException> {
        Ok(())
    }

    fn lookup_prefix(&self, _ns_uri: &str) -> Option<Rc<str>> {
        None
    }

    fn lookup_namespace_uri(&self, _prefix: Option<&str>) -> Option<Rc<str>> {
        None
    }
}

impl_leaf_node_connection!(DocumentTypeRef);

/// Wrapper of `Weak<RefCell<DocumentType>>`.
#[derive(Clone)]
pub struct DocumentTypeWeakRef(Weak<RefCell<DocumentType>>);

impl DocumentTypeWeakRef {
    /// Generate [`DocumentTypeRef`] from `self`.
    /// Success conditions are the same as for [`std::rc::Weak::upgrade`].
    pub fn upgrade(&self) -> Option<DocumentTypeRef> {
        self.0.upgrade().map(DocumentTypeRef)
    }
}
