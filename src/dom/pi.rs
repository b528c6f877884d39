use std::{
    cell::RefCell,
    mem::replace,
    rc::{Rc, Weak},
};

use super::{
    DOMException, NodeType,
    document::DocumentWeakRef,
    node::{Node, NodeRef, NodeWeakRef, impl_leaf_node_connection, impl_sibling_links},
};

/// Implementation of [ProcessingInstruction](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1004215813)
/// interface on [1.5 Extended Interfaces: XML Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-E067D597)
pub struct ProcessingInstruction {
    parent_node: Option<NodeWeakRef>,
    previous_sibling: Option<NodeWeakRef>,
    next_sibling: Option<NodeRef>,
    owner_document: DocumentWeakRef,
    /// Implementation of `target` attribute for `ProcessingInstruction`.
    /// as same as `nodeName` for `Node`.
    target: Rc<str>,
    /// Implementation of `data` attribute for `ProcessingInstruction`.
    data: String,
}

/// Wrapper of `Rc<RefCell<ProcessingInstruction>>`.
#[derive(Clone)]
pub struct ProcessingInstructionRef(pub(super) Rc<RefCell<ProcessingInstruction>>);

impl ProcessingInstructionRef {
    /// Create new [`ProcessingInstructionRef`] whose ownerDocument is `doc`.
    ///
    /// This method does not validate `target`.
    pub(super) fn new(doc: DocumentWeakRef, target: Rc<str>, data: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(ProcessingInstruction {
            parent_node: None,
            previous_sibling: None,
            next_sibling: None,
            owner_document: doc,
            target,
            data: data.into(),
        })))
    }

    /// Implementation of `target` attribute.
    pub fn target(&self) -> Rc<str> {
        self.0.borrow().target.clone()
    }

    /// Implementation of `data` attribute.
    pub fn data(&self) -> String {
        self.0.borrow().data.clone()
    }

    /// Implementation of `data` attribute.
    pub fn set_data(&mut self, data: impl Into<String>) -> String {
        replace(&mut self.0.borrow_mut().data, data.into())
    }

    /// Generate [`ProcessingInstructionWeakRef`] from `self`.
    pub fn downgrade(&self) -> ProcessingInstructionWeakRef {
        ProcessingInstructionWeakRef(Rc::downgrade(&self.0))
    }
}

impl Node for ProcessingInstructionRef {
    fn node_name(&self) -> Rc<str> {
        self.target()
    }

    fn node_value(&self) -> Option<Rc<str>> {
        Some(self.0.borrow().data.as_str().into())
    }

    fn set_node_value(&mut self, value: &str) -> Result<(), DOMException> {
        self.set_data(value);
        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::ProcessingInstruction
    }

    impl_sibling_links!(ProcessingInstruction);

    fn clone_node(&self, _deep: bool) -> NodeRef {
        let pi = self.0.borrow();
        Self::new(pi.owner_document.clone(), pi.target.clone(), pi.data.clone()).into()
    }

    fn text_content(&self) -> Option<String> {
        Some(self.data())
    }

    fn set_text_content(&mut self, text: &str) -> Result<(), DOMException> {
        self.set_data(text);
        Ok(())
    }
}

impl_leaf_node_connection!(ProcessingInstructionRef);

/// Wrapper of `Weak<RefCell<ProcessingInstruction>>`.
#[derive(Clone)]
pub struct ProcessingInstructionWeakRef(Weak<RefCell<ProcessingInstruction>>);

impl ProcessingInstructionWeakRef {
    /// Generate [`ProcessingInstructionRef`] from `self`.
    /// Success conditions are the same as for [`std::rc::Weak::upgrade`].
    pub fn upgrade(&self) -> Option<ProcessingInstructionRef> {
        self.0.upgrade().map(ProcessingInstructionRef)
    }
}
