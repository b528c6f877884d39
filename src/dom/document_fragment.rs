use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use super::{
    NodeType,
    document::{DocumentRef, DocumentWeakRef},
    node::{
        Node, NodeConnection, NodeRef, adopt_children, clone_children, impl_child_links,
        impl_child_setters,
    },
};

/// Implementation of [DocumentFragment](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-B63ED1A3)
/// interface on [1.4 Fundamental Interfaces: Core Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-BBACDC08)
///
/// A fragment never has a parent or siblings. Inserting it moves its children instead.
pub struct DocumentFragment {
    first_child: Option<NodeRef>,
    last_child: Option<NodeRef>,
    owner_document: DocumentWeakRef,
}

/// Wrapper of `Rc<RefCell<DocumentFragment>>`.
#[derive(Clone)]
pub struct DocumentFragmentRef(pub(super) Rc<RefCell<DocumentFragment>>);

impl DocumentFragmentRef {
    /// Create new [`DocumentFragmentRef`] whose ownerDocument is `doc`.
    pub(super) fn new(doc: DocumentWeakRef) -> Self {
        Self(Rc::new(RefCell::new(DocumentFragment {
            first_child: None,
            last_child: None,
            owner_document: doc,
        })))
    }

    /// Generate [`DocumentFragmentWeakRef`] from `self`.
    pub fn downgrade(&self) -> DocumentFragmentWeakRef {
        DocumentFragmentWeakRef(Rc::downgrade(&self.0))
    }
}

impl Node for DocumentFragmentRef {
    fn node_name(&self) -> Rc<str> {
        "#document-fragment".into()
    }

    fn node_value(&self) -> Option<Rc<str>> {
        None
    }

    fn node_type(&self) -> NodeType {
        NodeType::DocumentFragment
    }

    impl_child_links!();

    fn owner_document(&self) -> Option<DocumentRef> {
        self.0.borrow().owner_document.upgrade()
    }

    fn clone_node(&self, deep: bool) -> NodeRef {
        let mut new = Self::new(self.0.borrow().owner_document.clone());
        if deep {
            clone_children(self, &mut new);
        }
        new.into()
    }

    fn is_same_node(&self, other: &NodeRef) -> bool {
        matches!(other, NodeRef::DocumentFragment(other) if Rc::ptr_eq(&self.0, &other.0))
    }
}

impl NodeConnection for DocumentFragmentRef {
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

    fn adopted_to(&mut self, new_doc: DocumentRef) {
        self.0.borrow_mut().owner_document = new_doc.downgrade();
        adopt_children(self, &new_doc);
    }
}

/// Wrapper of `Weak<RefCell<DocumentFragment>>`.
#[derive(Clone)]
pub struct DocumentFragmentWeakRef(Weak<RefCell<DocumentFragment>>);

impl DocumentFragmentWeakRef {
    /// Generate [`DocumentFragmentRef`] from `self`.
    /// Success conditions are the same as for [`std::rc::Weak::upgrade`].
    pub fn upgrade(&self) -> Option<DocumentFragmentRef> {
        self.0.upgrade().map(DocumentFragmentRef)
    }
}
