use std::{
    cell::RefCell,
    mem::replace,
    rc::{Rc, Weak},
};

use super::{
    DOMException, NodeType,
    document::DocumentWeakRef,
    node::{
        Node, NodeRef, NodeWeakRef, impl_leaf_node_connection, impl_sibling_links,
    },
};

/// Implementation of [CharacterData](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-FF21A306)
/// interface on [1.4 Fundamental Interfaces: Core Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-BBACDC08)
///
/// Strings are encoded in UTF-8. Unlike the specification, offsets and counts are
/// byte offsets and must fall on UTF-8 character boundaries; otherwise
/// `INDEX_SIZE_ERR` is returned.
pub trait CharacterData: Node {
    /// Implementation of `data` attribute.
    fn data(&self) -> String;
    /// Implementation of `data` attribute.
    fn set_data(&mut self, data: impl Into<String>) -> Result<(), DOMException>;

    /// Implementation of `length` attribute.
    ///
    /// # Note
    /// Unlike the specification,
    /// this implementation returns **the number of bytes in a UTF-8 string**.
    fn length(&self) -> usize {
        self.data().len()
    }

    /// Implementation of [`substringData`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-6531BCCF).
    ///
    /// If the sum of `offset` and `count` exceeds the length, all data to the end
    /// is returned.
    fn substring_data(&self, offset: usize, count: usize) -> Result<String, DOMException> {
        let data = self.data();
        let end = data.len().min(offset.saturating_add(count));
        if offset > data.len() || !data.is_char_boundary(offset) || !data.is_char_boundary(end) {
            return Err(DOMException::IndexSizeErr);
        }
        Ok(data[offset..end].to_owned())
    }

    /// Implementation of [`appendData`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-32791A2F) method.
    fn append_data(&mut self, arg: &str) -> Result<(), DOMException> {
        let mut data = self.data();
        data.push_str(arg);
        self.set_data(data)
    }

    /// Implementation of [`insertData`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-3EDB695F) method.
    fn insert_data(&mut self, offset: usize, arg: &str) -> Result<(), DOMException> {
        let mut data = self.data();
        if offset > data.len() || !data.is_char_boundary(offset) {
            return Err(DOMException::IndexSizeErr);
        }
        data.insert_str(offset, arg);
        self.set_data(data)
    }

    /// Implementation of [`deleteData`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-7C603781) method.
    fn delete_data(&mut self, offset: usize, count: usize) -> Result<(), DOMException> {
        let mut data = self.data();
        let end = data.len().min(offset.saturating_add(count));
        if offset > data.len() || !data.is_char_boundary(offset) || !data.is_char_boundary(end) {
            return Err(DOMException::IndexSizeErr);
        }
        data.drain(offset..end);
        self.set_data(data)
    }

    /// Implementation of [`replaceData`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-E5CBA7FB) method.
    fn replace_data(&mut self, offset: usize, count: usize, arg: &str) -> Result<(), DOMException> {
        let mut data = self.data();
        let end = data.len().min(offset.saturating_add(count));
        if offset > data.len() || !data.is_char_boundary(offset) || !data.is_char_boundary(end) {
            return Err(DOMException::IndexSizeErr);
        }
        data.replace_range(offset..end, arg);
        self.set_data(data)
    }
}

/// Storage shared by `Text`, `CDATASection` and `Comment`.
pub struct CharacterNode {
    parent_node: Option<NodeWeakRef>,
    previous_sibling: Option<NodeWeakRef>,
    next_sibling: Option<NodeRef>,
    owner_document: DocumentWeakRef,
    data: String,
}

impl CharacterNode {
    fn new(doc: DocumentWeakRef, data: String) -> Self {
        Self {
            parent_node: None,
            previous_sibling: None,
            next_sibling: None,
            owner_document: doc,
            data,
        }
    }
}

macro_rules! impl_character_data_node {
    ( $(#[$meta:meta])* $t:ident, $weak:ident, $var:ident, $name:literal ) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $t(pub(super) Rc<RefCell<CharacterNode>>);

        impl $t {
            pub(super) fn new(doc: DocumentWeakRef, data: impl Into<String>) -> Self {
                Self(Rc::new(RefCell::new(CharacterNode::new(doc, data.into()))))
            }

            /// Generate a weak reference from `self`.
            pub fn downgrade(&self) -> $weak {
                $weak(Rc::downgrade(&self.0))
            }
        }

        impl Node for $t {
            fn node_name(&self) -> Rc<str> {
                $name.into()
            }

            fn node_value(&self) -> Option<Rc<str>> {
                Some(self.0.borrow().data.as_str().into())
            }

            fn set_node_value(&mut self, value: &str) -> Result<(), DOMException> {
                self.set_data(value)
            }

            fn node_type(&self) -> NodeType {
                NodeType::$var
            }

            impl_sibling_links!($var);

            fn clone_node(&self, _deep: bool) -> NodeRef {
                let node = self.0.borrow();
                Self(Rc::new(RefCell::new(CharacterNode::new(
                    node.owner_document.clone(),
                    node.data.clone(),
                ))))
                .into()
            }

            fn text_content(&self) -> Option<String> {
                Some(self.data())
            }

            fn set_text_content(&mut self, text: &str) -> Result<(), DOMException> {
                self.set_data(text)
            }
        }

        impl CharacterData for $t {
            fn data(&self) -> String {
                self.0.borrow().data.clone()
            }

            fn set_data(&mut self, data: impl Into<String>) -> Result<(), DOMException> {
                let _ = replace(&mut self.0.borrow_mut().data, data.into());
                Ok(())
            }
        }

        impl_leaf_node_connection!($t);

        /// Weak counterpart of the node handle.
        #[derive(Clone)]
        pub struct $weak(Weak<RefCell<CharacterNode>>);

        impl $weak {
            /// Success conditions are the same as for [`std::rc::Weak::upgrade`].
            pub fn upgrade(&self) -> Option<$t> {
                self.0.upgrade().map($t)
            }
        }
    };
}

impl_character_data_node!(
    /// Implementation of [Text](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1312295772)
    /// interface.
    TextRef,
    TextWeakRef,
    Text,
    "#text"
);

impl_character_data_node!(
    /// Implementation of [CDATASection](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-667469212)
    /// interface.
    CDATASectionRef,
    CDATASectionWeakRef,
    CDATASection,
    "#cdata-section"
);

impl_character_data_node!(
    /// Implementation of [Comment](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1728279322)
    /// interface.
    CommentRef,
    CommentWeakRef,
    Comment,
    "#comment"
);

impl TextRef {
    /// Implementation of [`splitText`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-38853C1D) method.
    ///
    /// # Specification
    /// ```text
    /// Breaks this node into two nodes at the specified offset, keeping both in the tree
    /// as siblings. After being split, this node will contain all the content up to the
    /// offset point. A new node of the same type, which contains all the content at and
    /// after the offset point, is returned. If the original node had a parent node, the
    /// new node is inserted as the next sibling of the original node.
    /// ```
    pub fn split_text(&mut self, offset: usize) -> Result<TextRef, DOMException> {
        let back = {
            let mut node = self.0.borrow_mut();
            if offset > node.data.len() || !node.data.is_char_boundary(offset) {
                return Err(DOMException::IndexSizeErr);
            }
            node.data.split_off(offset)
        };
        let doc = self.0.borrow().owner_document.clone();
        let res = Self::new(doc, back);
        if let Some(mut parent) = self.parent_node() {
            parent.insert_before(res.clone().into(), self.next_sibling())?;
        }
        Ok(res)
    }

    /// Whether the data consists only of XML whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.0
            .borrow()
            .data
            .bytes()
            .all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
    }
}
