use std::{fmt, rc::Rc};

use super::{
    DOMException, NodeType, adopt_for,
    attr::{AttrRef, AttrWeakRef},
    character_data::{
        CDATASectionRef, CDATASectionWeakRef, CharacterData, CommentRef, CommentWeakRef, TextRef,
        TextWeakRef,
    },
    check_vertical_hierarchy,
    document::{DocumentRef, DocumentWeakRef},
    document_fragment::{DocumentFragmentRef, DocumentFragmentWeakRef},
    document_type::{DocumentTypeRef, DocumentTypeWeakRef},
    element::{ElementRef, ElementWeakRef},
    named_node_map::NamedNodeMap,
    node_list::LiveNodeList,
    notify_mutation,
    pi::{ProcessingInstructionRef, ProcessingInstructionWeakRef},
    tracking_document,
};

/// Implementation of [Node](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1950641247)
/// interface on [1.4 Fundamental Interfaces: Core Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-BBACDC08)
///
/// Actual node representations are implemented as `NodeRef` and `NodeWeakRef`.
#[allow(private_bounds)]
pub trait Node: NodeConnection {
    /// Implementation of `nodeName` attribute.
    fn node_name(&self) -> Rc<str>;
    /// Implementation of `nodeValue` attribute.
    fn node_value(&self) -> Option<Rc<str>>;
    /// Implementation of `nodeValue` attribute.
    ///
    /// Setting has no effect on nodes whose `nodeValue` is defined to be null.
    fn set_node_value(&mut self, value: &str) -> Result<(), DOMException> {
        let _ = value;
        Ok(())
    }

    /// Implementation of `nodeType` attribute.
    fn node_type(&self) -> NodeType;
    /// Implementation of `parentNode` attribute.
    fn parent_node(&self) -> Option<NodeRef> {
        None
    }
    /// Implementation of `childNodes` attribute.
    ///
    /// The returned list is live.
    fn child_nodes(&self) -> LiveNodeList {
        LiveNodeList::children(self.clone().into())
    }
    /// Implementation of `firstChild` attribute.
    fn first_child(&self) -> Option<NodeRef> {
        None
    }
    /// Implementation of `lastChild` attribute.
    fn last_child(&self) -> Option<NodeRef> {
        None
    }
    /// Implementation of `previousSibling` attribute.
    fn previous_sibling(&self) -> Option<NodeRef> {
        None
    }
    /// Implementation of `nextSibling` attribute.
    fn next_sibling(&self) -> Option<NodeRef> {
        None
    }
    /// Implementation of `attributes` attribute.
    fn attributes(&self) -> Option<NamedNodeMap> {
        None
    }
    /// Implementation of `ownerDocument` attribute.
    ///
    /// Returns `None` for a `Document` and for nodes whose document has been dropped.
    fn owner_document(&self) -> Option<DocumentRef> {
        None
    }

    /// Implementation of [`insertBefore`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-952280727) method.
    ///
    /// `new_child` is detached from its current parent first and goes to the end when
    /// `ref_child` is `None`. A fragment contributes its children instead of itself.
    /// Inserting a node before itself is a no-op.
    ///
    /// A `new_child` owned by another document is adopted into this node's document
    /// instead of raising `WRONG_DOCUMENT_ERR`; that document's counter moves too.
    fn insert_before(
        &mut self,
        new_child: NodeRef,
        ref_child: Option<NodeRef>,
    ) -> Result<NodeRef, DOMException> {
        if ref_child
            .as_ref()
            .is_some_and(|ref_child| new_child.is_same_node(ref_child))
        {
            return Ok(new_child);
        }

        let nodes = incoming_nodes(&new_child);
        check_insertion(self, &new_child, &nodes, None)?;
        // NOT_FOUND_ERR: Raised if refChild is not a child of this node.
        if ref_child.as_ref().is_some_and(|ref_child| {
            ref_child
                .parent_node()
                .is_none_or(|par| !self.is_same_node(&par))
        }) {
            return Err(DOMException::NotFoundErr);
        }

        let this: NodeRef = self.clone().into();
        for mut node in nodes {
            detach_for_move(&this, &mut node);
            adopt_for(&this, &mut node);
            if let Some(ref_child) = ref_child.clone() {
                node.connect_as_previous_sibling(ref_child);
            } else {
                self.append_connected(node);
            }
        }
        notify_mutation(&this);
        Ok(new_child)
    }

    /// Implementation of [`replaceChild`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-785887307) method.
    ///
    /// Returns the detached `old_child`. Counts as a single mutation even when a
    /// fragment puts several nodes in its place.
    fn replace_child(
        &mut self,
        new_child: NodeRef,
        mut old_child: NodeRef,
    ) -> Result<NodeRef, DOMException> {
        // NOT_FOUND_ERR: Raised if oldChild is not a child of this node.
        if old_child
            .parent_node()
            .is_none_or(|par| !self.is_same_node(&par))
        {
            return Err(DOMException::NotFoundErr);
        }
        if new_child.is_same_node(&old_child) {
            return Ok(old_child);
        }

        let nodes = incoming_nodes(&new_child);
        check_insertion(self, &new_child, &nodes, Some(&old_child))?;

        let this: NodeRef = self.clone().into();
        let mut moved = Vec::with_capacity(nodes.len());
        for mut node in nodes {
            detach_for_move(&this, &mut node);
            adopt_for(&this, &mut node);
            moved.push(node);
        }
        // Computed after the incoming nodes are detached so that it is never one of them.
        let anchor = old_child.next_sibling();
        old_child.disconnect_parent_and_sibling();
        for mut node in moved {
            if let Some(anchor) = anchor.clone() {
                node.connect_as_previous_sibling(anchor);
            } else {
                self.append_connected(node);
            }
        }
        notify_mutation(&this);
        Ok(old_child)
    }

    /// Implementation of [`removeChild`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1734834066) method.
    fn remove_child(&mut self, mut old_child: NodeRef) -> Result<NodeRef, DOMException> {
        // NOT_FOUND_ERR: Raised if oldChild is not a child of this node.
        if old_child
            .parent_node()
            .is_none_or(|par| !self.is_same_node(&par))
        {
            return Err(DOMException::NotFoundErr);
        }

        old_child.disconnect_parent_and_sibling();
        notify_mutation(&self.clone().into());
        Ok(old_child)
    }

    /// Implementation of [`appendChild`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-184E7107) method.
    fn append_child(&mut self, new_child: NodeRef) -> Result<NodeRef, DOMException> {
        self.insert_before(new_child, None)
    }

    /// Implementation of `hasChildNodes` method.
    fn has_child_nodes(&self) -> bool {
        self.first_child().is_some()
    }

    /// Implementation of [`cloneNode`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-3A0ED0A4) method.
    ///
    /// The duplicate has no parent and belongs to the same document as `self`.
    /// Cloning an element copies its attributes; children are copied only if `deep`.
    fn clone_node(&self, deep: bool) -> NodeRef;

    /// Implementation of [`normalize`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-normalize) method.
    ///
    /// Adjacent `Text` nodes in the subtree are merged and empty ones are removed.
    fn normalize(&mut self) {
        let mut children = self.first_child();
        while let Some(child) = children {
            match child {
                NodeRef::Text(mut text) => {
                    while let Some(NodeRef::Text(next)) = text.next_sibling() {
                        let data = next.data();
                        text.append_data(&data).ok();
                        self.remove_child(next.into()).ok();
                    }
                    children = text.next_sibling();
                    if text.data().is_empty() {
                        self.remove_child(text.into()).ok();
                    }
                }
                NodeRef::Element(mut elem) => {
                    elem.normalize();
                    children = elem.next_sibling();
                }
                other => children = other.next_sibling(),
            }
        }
    }

    /// Implementation of `namespaceURI` attribute.
    fn namespace_uri(&self) -> Option<Rc<str>> {
        None
    }
    /// Implementation of `prefix` attribute.
    fn prefix(&self) -> Option<Rc<str>> {
        None
    }
    /// Implementation of `localName` attribute.
    fn local_name(&self) -> Option<Rc<str>> {
        None
    }
    /// Implementation of `hasAttributes` method.
    fn has_attributes(&self) -> bool {
        false
    }

    /// Implementation of [`textContent`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-Node3-textContent) attribute.
    ///
    /// For containers this is the concatenation of the text content of every child,
    /// excluding comments and processing instructions.
    fn text_content(&self) -> Option<String> {
        let mut children = self.first_child();
        let mut res = String::new();
        while let Some(child) = children {
            children = child.next_sibling();
            match child {
                NodeRef::Comment(_) | NodeRef::ProcessingInstruction(_) => {}
                child => {
                    if let Some(value) = child.text_content() {
                        res.push_str(&value);
                    }
                }
            }
        }
        Some(res)
    }

    /// Implementation of [`textContent`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-Node3-textContent) attribute.
    ///
    /// For containers, every child is removed and, if `text` is not empty,
    /// replaced by a single `Text` node.
    fn set_text_content(&mut self, text: &str) -> Result<(), DOMException> {
        while let Some(child) = self.first_child() {
            self.remove_child(child)?;
        }
        if !text.is_empty() {
            let doc = self.owner_document().ok_or(DOMException::InvalidStateErr)?;
            let text = doc.create_text_node(text);
            self.append_child(text.into())?;
        }
        Ok(())
    }

    /// Implementation of [`isSameNode`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-Node3-isSameNode) method.
    fn is_same_node(&self, other: &NodeRef) -> bool;

    /// Implementation of [`lookupPrefix`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-Node3-lookupNamespacePrefix) method.
    ///
    /// Nodes other than elements delegate to their nearest ancestor element.
    fn lookup_prefix(&self, ns_uri: &str) -> Option<Rc<str>> {
        self.parent_element()?.lookup_prefix(ns_uri)
    }

    /// Implementation of [`isDefaultNamespace`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-Node3-isDefaultNamespace) method.
    fn is_default_namespace(&self, ns_uri: &str) -> bool {
        self.lookup_namespace_uri(None).as_deref() == Some(ns_uri)
    }

    /// Implementation of [`lookupNamespaceURI`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-Node3-lookupNamespaceURI) method.
    ///
    /// `None` as `prefix` looks up the default namespace.
    fn lookup_namespace_uri(&self, prefix: Option<&str>) -> Option<Rc<str>> {
        self.parent_element()?.lookup_namespace_uri(prefix)
    }

    /// The nearest ancestor that is an element.
    fn parent_element(&self) -> Option<ElementRef> {
        let mut ancestor = self.parent_node();
        while let Some(par) = ancestor {
            if let NodeRef::Element(elem) = par {
                return Some(elem);
            }
            ancestor = par.parent_node();
        }
        None
    }

    /// Implementation of [`isEqualNode`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-Node3-isEqualNode) method.
    ///
    /// # Note
    /// Normalization can affect equality, but this method does not normalize nodes.
    /// Attribute order is not significant.
    fn is_equal_node(&self, arg: &NodeRef) -> bool {
        if self.node_type() != arg.node_type()
            || self.node_name() != arg.node_name()
            || self.local_name() != arg.local_name()
            || self.namespace_uri() != arg.namespace_uri()
            || self.prefix() != arg.prefix()
            || self.node_value() != arg.node_value()
        {
            return false;
        }

        match (self.attributes(), arg.attributes()) {
            (Some(l), Some(r)) => {
                if l.len() != r.len() {
                    return false;
                }
                for attr in l.iter() {
                    let other = if attr.namespace_uri().is_some() {
                        r.get_named_item_ns(attr.namespace_uri().as_deref(), &attr.local_name_str())
                    } else {
                        r.get_named_item(&attr.name())
                    };
                    if other.is_none_or(|other| !attr.is_equal_node(&other.into())) {
                        return false;
                    }
                }
            }
            (None, None) => {}
            _ => return false,
        }

        let this: NodeRef = self.clone().into();
        if let (Some(l), Some(r)) = (this.as_document_type(), arg.as_document_type()) {
            if l.public_id() != r.public_id()
                || l.system_id() != r.system_id()
                || l.internal_subset() != r.internal_subset()
            {
                return false;
            }
        }

        let mut l = self.first_child();
        let mut r = arg.first_child();
        loop {
            match (l, r) {
                (Some(a), Some(b)) => {
                    if !a.is_equal_node(&b) {
                        return false;
                    }
                    l = a.next_sibling();
                    r = b.next_sibling();
                }
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

/// The nodes that an insertion of `new_child` actually moves.
fn incoming_nodes(new_child: &NodeRef) -> Vec<NodeRef> {
    match new_child {
        NodeRef::DocumentFragment(frag) => {
            let mut res = vec![];
            let mut children = frag.first_child();
            while let Some(child) = children {
                children = child.next_sibling();
                res.push(child);
            }
            res
        }
        other => vec![other.clone()],
    }
}

/// Common `HIERARCHY_REQUEST_ERR` checks for `insertBefore` and `replaceChild`.
///
/// `replaced` is the child that is going away, if any.
fn check_insertion<N: Node>(
    parent: &N,
    new_child: &NodeRef,
    nodes: &[NodeRef],
    replaced: Option<&NodeRef>,
) -> Result<(), DOMException> {
    // HIERARCHY_REQUEST_ERR: Raised if this node is of a type that does not allow children
    // of the type of the newChild node (..snip)
    if new_child.node_type() != NodeType::DocumentFragment
        && !check_vertical_hierarchy(parent.node_type(), new_child.node_type())
    {
        return Err(DOMException::HierarchyRequestErr);
    }
    if nodes
        .iter()
        .any(|node| !check_vertical_hierarchy(parent.node_type(), node.node_type()))
    {
        return Err(DOMException::HierarchyRequestErr);
    }

    // HIERARCHY_REQUEST_ERR: Raised if (..snip..) the node to insert is
    // one of this node's ancestors or this node itself, (..snip..)
    if parent.is_same_node(new_child) {
        return Err(DOMException::HierarchyRequestErr);
    }
    let mut par = parent.parent_node();
    while let Some(cur) = par {
        par = cur.parent_node();
        if new_child.is_same_node(&cur) {
            return Err(DOMException::HierarchyRequestErr);
        }
    }

    // HIERARCHY_REQUEST_ERR: Raised if (..snip..) this node is of type Document
    // and the DOM application attempts to insert a second DocumentType or Element node.
    if parent.node_type() == NodeType::Document {
        for kind in [NodeType::Element, NodeType::DocumentType] {
            let incoming = nodes.iter().filter(|node| node.node_type() == kind).count();
            if incoming == 0 {
                continue;
            }
            if incoming > 1 {
                return Err(DOMException::HierarchyRequestErr);
            }
            let mut children = parent.first_child();
            while let Some(child) = children {
                children = child.next_sibling();
                if child.node_type() == kind
                    && replaced.is_none_or(|replaced| !child.is_same_node(replaced))
                    && !nodes.iter().any(|node| child.is_same_node(node))
                {
                    return Err(DOMException::HierarchyRequestErr);
                }
            }
        }
    }
    Ok(())
}

/// Append deep copies of the children of `src` to `dst`.
///
/// The copies are linked directly; no hierarchy check is made and no counter is bumped.
pub(super) fn clone_children(src: &impl Node, dst: &mut impl Node) {
    let mut children = src.first_child();
    while let Some(child) = children {
        children = child.next_sibling();
        dst.append_connected(child.clone_node(true));
    }
}

/// Adopt every child of `parent` into `new_doc`.
pub(super) fn adopt_children(parent: &impl Node, new_doc: &DocumentRef) {
    let mut children = parent.first_child();
    while let Some(mut child) = children {
        children = child.next_sibling();
        child.adopted_to(new_doc.clone());
    }
}

/// Detach `node` from wherever it currently is before moving it under `target`.
///
/// If `node` leaves a tree tracked by a different document, that document is told
/// about the removal too.
fn detach_for_move(target: &NodeRef, node: &mut NodeRef) {
    let Some(old_parent) = node.disconnect_parent_and_sibling() else {
        return;
    };
    let old_doc = tracking_document(&old_parent);
    let new_doc = tracking_document(target);
    if let Some(old_doc) = old_doc {
        if new_doc.is_none_or(|new_doc| !new_doc.is_same_node(&old_doc.clone().into())) {
            old_doc.bump_mutation_count();
        }
    }
}

/// A set of operations that change the adjacency of nodes.
///
/// None of these methods are exposed to the user
/// because they may cause inconsistencies in the tree constraints.
///
/// These method does not check the tree constraints.
/// It is the responsibility of the caller to maintain tree constraints.
pub(super) trait NodeConnection: Clone + Into<NodeRef> {
    // The setter method (set_xxx) simply sets the given node
    // and is not required to check the node's type constraints.

    /// Set new parent node.
    /// Return old parent node if exists.
    fn set_parent_node(&mut self, new_parent: Option<NodeRef>) -> Option<NodeRef>;
    /// Set new first child node.
    /// Return old first child node if exists.
    fn set_first_child(&mut self, new_child: Option<NodeRef>) -> Option<NodeRef>;
    /// Set new last child node.
    /// Return old last child node if exists.
    fn set_last_child(&mut self, new_child: Option<NodeRef>) -> Option<NodeRef>;
    /// Set new previous sibling node.
    /// Return old previous sibling node if exists.
    fn set_previous_sibling(&mut self, new_sibling: Option<NodeRef>) -> Option<NodeRef>;
    /// Set new next sibling node.
    /// Return old next sibling node if exists.
    fn set_next_sibling(&mut self, new_sibling: Option<NodeRef>) -> Option<NodeRef>;

    /// Replace ownerDocument of self and all nodes of the subtree, attributes included.
    ///
    /// The ownerDocument of siblings and ancestors must not be changed.
    fn adopted_to(&mut self, new_doc: DocumentRef);

    /// Connect the detached `child` as the last child of `self`.
    fn append_connected(&mut self, mut child: NodeRef) {
        child.set_parent_node(Some(self.clone().into()));
        if let Some(mut last) = self.set_last_child(Some(child.clone())) {
            last.set_next_sibling(Some(child.clone()));
            child.set_previous_sibling(Some(last));
        } else {
            self.set_first_child(Some(child));
        }
    }

    /// Connect the detached `self` to the front of `next`.
    ///
    /// If `next` has a previous sibling, it is connected to the front of `self`.
    /// Otherwise, `self` is set as a first child of the parent of `next`.
    fn connect_as_previous_sibling(&mut self, mut next: NodeRef) {
        let slf: NodeRef = self.clone().into();
        let par = next.parent_node();
        let prev = next.set_previous_sibling(Some(slf.clone()));
        self.set_parent_node(par.clone());
        self.set_next_sibling(Some(next));
        if let Some(mut prev) = prev {
            // prev <-> self
            prev.set_next_sibling(Some(slf));
            self.set_previous_sibling(Some(prev));
        } else if let Some(mut par) = par {
            // If a previous sibling does not exists,
            // `self` becomes the first child of its parent.
            par.set_first_child(Some(slf));
        }
    }

    /// Disconnect the parent node of `self`.
    /// If `self` has siblings, it is also disconnected from its siblings,
    /// and the siblings before and after it establish adjacency.
    ///
    /// As a result, `self` is the root node of the detached subtree.
    ///
    /// Return old parent node if exists.
    fn disconnect_parent_and_sibling(&mut self) -> Option<NodeRef> {
        let mut par = self.set_parent_node(None);
        let prev = self.set_previous_sibling(None);
        let next = self.set_next_sibling(None);
        match (prev, next) {
            (Some(mut prev), Some(mut next)) => {
                prev.set_next_sibling(Some(next.clone()));
                next.set_previous_sibling(Some(prev));
            }
            (Some(mut prev), None) => {
                prev.set_next_sibling(None);
                if let Some(par) = par.as_mut() {
                    par.set_last_child(Some(prev));
                }
            }
            (None, Some(mut next)) => {
                next.set_previous_sibling(None);
                if let Some(par) = par.as_mut() {
                    par.set_first_child(Some(next));
                }
            }
            (None, None) => {
                if let Some(par) = par.as_mut() {
                    par.set_first_child(None);
                    par.set_last_child(None);
                }
            }
        }
        par
    }
}

/// Implementation of [Node](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1950641247)
/// interface on [1.4 Fundamental Interfaces: Core Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-BBACDC08)
#[derive(Clone)]
pub enum NodeRef {
    Element(ElementRef),
    Attribute(AttrRef),
    Text(TextRef),
    CDATASection(CDATASectionRef),
    ProcessingInstruction(ProcessingInstructionRef),
    Comment(CommentRef),
    Document(DocumentRef),
    DocumentType(DocumentTypeRef),
    DocumentFragment(DocumentFragmentRef),
}

impl NodeRef {
    /// Generate [`NodeWeakRef`] from `self`.
    pub fn downgrade(&self) -> NodeWeakRef {
        use NodeRef::*;
        match self {
            Element(node) => NodeWeakRef::Element(node.downgrade()),
            Attribute(node) => NodeWeakRef::Attribute(node.downgrade()),
            Text(node) => NodeWeakRef::Text(node.downgrade()),
            CDATASection(node) => NodeWeakRef::CDATASection(node.downgrade()),
            ProcessingInstruction(node) => NodeWeakRef::ProcessingInstruction(node.downgrade()),
            Comment(node) => NodeWeakRef::Comment(node.downgrade()),
            Document(node) => NodeWeakRef::Document(node.downgrade()),
            DocumentType(node) => NodeWeakRef::DocumentType(node.downgrade()),
            DocumentFragment(node) => NodeWeakRef::DocumentFragment(node.downgrade()),
        }
    }
}

macro_rules! impl_node_trait_to_noderef {
    (
        $(
            fn $( ($mut:tt) )? $fn:ident($( $arg_name:ident : $arg_type:ty ),*) -> $ret:ty
        ),*
    ) => {
        impl Node for NodeRef {
            $(
                fn $fn(& $( $mut )? self, $( $arg_name: $arg_type),* ) -> $ret {
                    match self {
                        NodeRef::Element(elem) => <ElementRef as Node>::$fn(elem, $( $arg_name ),* ),
                        NodeRef::Attribute(attr) => attr.$fn( $( $arg_name ),* ),
                        NodeRef::Text(text) => text.$fn( $( $arg_name ),* ),
                        NodeRef::CDATASection(cdata) => cdata.$fn( $( $arg_name ),* ),
                        NodeRef::ProcessingInstruction(pi) => pi.$fn( $( $arg_name ),* ),
                        NodeRef::Comment(comment) => comment.$fn( $( $arg_name ),* ),
                        NodeRef::Document(doc) => <DocumentRef as Node>::$fn(doc, $( $arg_name ),* ),
                        NodeRef::DocumentType(doctype) => doctype.$fn( $( $arg_name ),* ),
                        NodeRef::DocumentFragment(frag) => frag.$fn( $( $arg_name ),* ),
                    }
                }
            )*
        }
    };
}

impl_node_trait_to_noderef! {
    fn node_name() -> Rc<str>,
    fn node_value() -> Option<Rc<str>>,
    fn(mut) set_node_value(value: &str) -> Result<(), DOMException>,
    fn node_type() -> NodeType,
    fn parent_node() -> Option<NodeRef>,
    fn first_child() -> Option<NodeRef>,
    fn last_child() -> Option<NodeRef>,
    fn previous_sibling() -> Option<NodeRef>,
    fn next_sibling() -> Option<NodeRef>,
    fn attributes() -> Option<NamedNodeMap>,
    fn owner_document() -> Option<DocumentRef>,
    fn(mut) insert_before(new_child: NodeRef, ref_child: Option<NodeRef>) -> Result<NodeRef, DOMException>,
    fn(mut) replace_child(new_child: NodeRef, old_child: NodeRef) -> Result<NodeRef, DOMException>,
    fn(mut) remove_child(old_child: NodeRef) -> Result<NodeRef, DOMException>,
    fn(mut) append_child(new_child: NodeRef) -> Result<NodeRef, DOMException>,
    fn clone_node(deep: bool) -> NodeRef,
    fn(mut) normalize() -> (),
    fn namespace_uri() -> Option<Rc<str>>,
    fn prefix() -> Option<Rc<str>>,
    fn local_name() -> Option<Rc<str>>,
    fn has_attributes() -> bool,
    fn text_content() -> Option<String>,
    fn(mut) set_text_content(text: &str) -> Result<(), DOMException>,
    fn is_same_node(other: &NodeRef) -> bool,
    fn lookup_prefix(ns_uri: &str) -> Option<Rc<str>>,
    fn lookup_namespace_uri(prefix: Option<&str>) -> Option<Rc<str>>
}

macro_rules! impl_node_connection_to_noderef {
    (
        $(
            $fn:ident($( $arg_name:ident : $arg_type:ty ),*) -> $ret:ty
        ),*
    ) => {
        impl NodeConnection for NodeRef {
            $(
                fn $fn(&mut self, $( $arg_name: $arg_type),* ) -> $ret {
                    match self {
                        NodeRef::Element(elem) => elem.$fn( $( $arg_name ),* ),
                        NodeRef::Attribute(attr) => attr.$fn( $( $arg_name ),* ),
                        NodeRef::Text(text) => text.$fn( $( $arg_name ),* ),
                        NodeRef::CDATASection(cdata) => cdata.$fn( $( $arg_name ),* ),
                        NodeRef::ProcessingInstruction(pi) => pi.$fn( $( $arg_name ),* ),
                        NodeRef::Comment(comment) => comment.$fn( $( $arg_name ),* ),
                        NodeRef::Document(doc) => doc.$fn( $( $arg_name ),* ),
                        NodeRef::DocumentType(doctype) => doctype.$fn( $( $arg_name ),* ),
                        NodeRef::DocumentFragment(frag) => frag.$fn( $( $arg_name ),* ),
                    }
                }
            )*
        }
    };
}

impl_node_connection_to_noderef! {
    set_parent_node(new_parent: Option<NodeRef>) -> Option<NodeRef>,
    set_first_child(new_child: Option<NodeRef>) -> Option<NodeRef>,
    set_last_child(new_child: Option<NodeRef>) -> Option<NodeRef>,
    set_previous_sibling(new_sibling: Option<NodeRef>) -> Option<NodeRef>,
    set_next_sibling(new_sibling: Option<NodeRef>) -> Option<NodeRef>,
    adopted_to(new_doc: DocumentRef) -> ()
}

macro_rules! impl_node_conversion {
    ( $( ( $fn:ident, $var:ident, $t:ty ) ),* ) => {
        impl NodeRef {
            $(
                pub fn $fn (&self) -> Option<$t> {
                    match self {
                        NodeRef:: $var (node) => Some(node.clone()),
                        _ => None
                    }
                }
            )*
        }

        $(
            impl From<$t> for NodeRef {
                fn from(value: $t) -> Self {
                    NodeRef:: $var (value)
                }
            }
        )*
    };
}

impl_node_conversion! {
    ( as_element, Element, ElementRef ),
    ( as_attribute, Attribute, AttrRef ),
    ( as_text_node, Text, TextRef ),
    ( as_cdata_section, CDATASection, CDATASectionRef ),
    ( as_processing_instruction, ProcessingInstruction, ProcessingInstructionRef ),
    ( as_comment, Comment, CommentRef ),
    ( as_document, Document, DocumentRef ),
    ( as_document_type, DocumentType, DocumentTypeRef ),
    ( as_document_fragment, DocumentFragment, DocumentFragmentRef )
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.node_type(), self.node_name())
    }
}

macro_rules! impl_debug_by_node_name {
    ( $( $t:ty ),* ) => {
        $(
            impl fmt::Debug for $t {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{:?}({})", self.node_type(), self.node_name())
                }
            }
        )*
    };
}

impl_debug_by_node_name!(
    ElementRef,
    AttrRef,
    TextRef,
    CDATASectionRef,
    ProcessingInstructionRef,
    CommentRef,
    DocumentRef,
    DocumentTypeRef,
    DocumentFragmentRef
);

/// Implementation of [Node](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1950641247)
/// interface on [1.4 Fundamental Interfaces: Core Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-BBACDC08)
#[derive(Clone)]
pub enum NodeWeakRef {
    Element(ElementWeakRef),
    Attribute(AttrWeakRef),
    Text(TextWeakRef),
    CDATASection(CDATASectionWeakRef),
    ProcessingInstruction(ProcessingInstructionWeakRef),
    Comment(CommentWeakRef),
    Document(DocumentWeakRef),
    DocumentType(DocumentTypeWeakRef),
    DocumentFragment(DocumentFragmentWeakRef),
}

impl NodeWeakRef {
    /// Generate [`NodeRef`] from `self`.
    /// Success conditions are the same as for [`std::rc::Weak::upgrade`].
    pub fn upgrade(&self) -> Option<NodeRef> {
        match self {
            NodeWeakRef::Element(node) => node.upgrade().map(NodeRef::Element),
            NodeWeakRef::Attribute(node) => node.upgrade().map(NodeRef::Attribute),
            NodeWeakRef::Text(node) => node.upgrade().map(NodeRef::Text),
            NodeWeakRef::CDATASection(node) => node.upgrade().map(NodeRef::CDATASection),
            NodeWeakRef::ProcessingInstruction(node) => {
                node.upgrade().map(NodeRef::ProcessingInstruction)
            }
            NodeWeakRef::Comment(node) => node.upgrade().map(NodeRef::Comment),
            NodeWeakRef::Document(node) => node.upgrade().map(NodeRef::Document),
            NodeWeakRef::DocumentType(node) => node.upgrade().map(NodeRef::DocumentType),
            NodeWeakRef::DocumentFragment(node) => node.upgrade().map(NodeRef::DocumentFragment),
        }
    }
}

/// Generates the getters of [`Node`] shared by every node type that keeps its links in
/// `parent_node`, `previous_sibling`, `next_sibling` and `owner_document` fields.
///
/// `$var` is the [`NodeRef`] variant of the type.
macro_rules! impl_sibling_links {
    ( $var:ident ) => {
        fn parent_node(&self) -> Option<$crate::dom::node::NodeRef> {
            self.0.borrow().parent_node.as_ref()?.upgrade()
        }

        fn previous_sibling(&self) -> Option<$crate::dom::node::NodeRef> {
            self.0.borrow().previous_sibling.as_ref()?.upgrade()
        }

        fn next_sibling(&self) -> Option<$crate::dom::node::NodeRef> {
            self.0.borrow().next_sibling.clone()
        }

        fn owner_document(&self) -> Option<$crate::dom::document::DocumentRef> {
            self.0.borrow().owner_document.upgrade()
        }

        fn is_same_node(&self, other: &$crate::dom::node::NodeRef) -> bool {
            matches!(other, $crate::dom::node::NodeRef::$var(other) if std::rc::Rc::ptr_eq(&self.0, &other.0))
        }
    };
}
pub(super) use impl_sibling_links;

/// Generates the `firstChild` and `lastChild` getters of [`Node`].
macro_rules! impl_child_links {
    () => {
        fn first_child(&self) -> Option<$crate::dom::node::NodeRef> {
            self.0.borrow().first_child.clone()
        }

        fn last_child(&self) -> Option<$crate::dom::node::NodeRef> {
            self.0.borrow().last_child.clone()
        }
    };
}
pub(super) use impl_child_links;

/// Generates the parent and sibling setters of [`NodeConnection`].
macro_rules! impl_sibling_setters {
    () => {
        fn set_parent_node(
            &mut self,
            new_parent: Option<$crate::dom::node::NodeRef>,
        ) -> Option<$crate::dom::node::NodeRef> {
            let new = new_parent.map(|par| par.downgrade());
            std::mem::replace(&mut self.0.borrow_mut().parent_node, new)
                .and_then(|old| old.upgrade())
        }

        fn set_previous_sibling(
            &mut self,
            new_sibling: Option<$crate::dom::node::NodeRef>,
        ) -> Option<$crate::dom::node::NodeRef> {
            let new = new_sibling.map(|sib| sib.downgrade());
            std::mem::replace(&mut self.0.borrow_mut().previous_sibling, new)
                .and_then(|old| old.upgrade())
        }

        fn set_next_sibling(
            &mut self,
            new_sibling: Option<$crate::dom::node::NodeRef>,
        ) -> Option<$crate::dom::node::NodeRef> {
            std::mem::replace(&mut self.0.borrow_mut().next_sibling, new_sibling)
        }
    };
}
pub(super) use impl_sibling_setters;

/// Generates the `firstChild` and `lastChild` setters of [`NodeConnection`].
macro_rules! impl_child_setters {
    () => {
        fn set_first_child(
            &mut self,
            new_child: Option<$crate::dom::node::NodeRef>,
        ) -> Option<$crate::dom::node::NodeRef> {
            std::mem::replace(&mut self.0.borrow_mut().first_child, new_child)
        }

        fn set_last_child(
            &mut self,
            new_child: Option<$crate::dom::node::NodeRef>,
        ) -> Option<$crate::dom::node::NodeRef> {
            std::mem::replace(&mut self.0.borrow_mut().last_child, new_child)
        }
    };
}
pub(super) use impl_child_setters;

/// Generates the whole [`NodeConnection`] of a node type that never has children.
macro_rules! impl_leaf_node_connection {
    ( $t:ty ) => {
        impl $crate::dom::node::NodeConnection for $t {
            $crate::dom::node::impl_sibling_setters!();

            fn set_first_child(
                &mut self,
                _: Option<$crate::dom::node::NodeRef>,
            ) -> Option<$crate::dom::node::NodeRef> {
                None
            }

            fn set_last_child(
                &mut self,
                _: Option<$crate::dom::node::NodeRef>,
            ) -> Option<$crate::dom::node::NodeRef> {
                None
            }

            fn adopted_to(&mut self, new_doc: $crate::dom::document::DocumentRef) {
                self.0.borrow_mut().owner_document = new_doc.downgrade();
            }
        }
    };
}
pub(super) use impl_leaf_node_connection;
