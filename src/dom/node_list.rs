use std::{cell::RefCell, rc::Rc};

use crate::dom::{
    element::ElementRef,
    node::{Node, NodeRef},
    tracking_document,
};

/// Implementation of [NodeList](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-536297177)
/// interface on [1.4 Fundamental Interfaces: Core Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-BBACDC08)
///
/// # Specification
/// ```text
/// The NodeList interface provides the abstraction of an ordered collection of nodes,
/// without defining or constraining how this collection is implemented. NodeList objects
/// in the DOM are live.
///
/// The items in the NodeList are accessible via an integral index, starting from 0.
/// ```
pub trait NodeList {
    type Output: Node;

    /// Implementation of [item](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-844377136) method.
    ///
    /// # Specification
    /// ```text
    /// Returns the indexth item in the collection. If index is greater than or equal to the
    /// number of nodes in the list, this returns null.
    /// ```
    fn item(&self, index: usize) -> Option<Self::Output>;
    /// Implementation of [length](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-203510337) attribute.
    fn length(&self) -> usize;
}

#[derive(Clone, Copy)]
enum Scope {
    Children,
    Descendants,
}

/// A live [`NodeList`] over the children or the descendants of a root node.
///
/// The matching nodes are materialized on first access and cached together with
/// the mutation counter of the root's document. The cache is rebuilt when the
/// counter has moved. A root whose document has been dropped is never cached.
pub struct LiveNodeList<N = NodeRef> {
    root: NodeRef,
    scope: Scope,
    select: Rc<dyn Fn(&NodeRef) -> Option<N>>,
    cache: RefCell<Option<(u64, Rc<[N]>)>>,
}

impl<N> Clone for LiveNodeList<N> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            scope: self.scope,
            select: self.select.clone(),
            cache: RefCell::new(self.cache.borrow().clone()),
        }
    }
}

impl LiveNodeList<NodeRef> {
    /// Every child of `root`, as returned by [`Node::child_nodes`].
    pub(super) fn children(root: NodeRef) -> Self {
        Self {
            root,
            scope: Scope::Children,
            select: Rc::new(|node| Some(node.clone())),
            cache: RefCell::new(None),
        }
    }
}

impl LiveNodeList<ElementRef> {
    /// Descendant elements whose `nodeName` is `name`. `"*"` matches every element.
    pub(super) fn elements_by_tag_name(root: NodeRef, name: &str) -> Self {
        let name = name.to_owned();
        Self::descendants(root, move |node| {
            node.as_element()
                .filter(|elem| name == "*" || *elem.tag_name() == *name)
        })
    }

    /// Descendant elements matched by namespace URI and local name.
    /// `"*"` matches any value of either.
    pub(super) fn elements_by_tag_name_ns(
        root: NodeRef,
        namespace_uri: Option<&str>,
        local_name: &str,
    ) -> Self {
        let namespace_uri = namespace_uri
            .filter(|ns| !ns.is_empty())
            .map(str::to_owned);
        let local_name = local_name.to_owned();
        Self::descendants(root, move |node| {
            node.as_element().filter(|elem| {
                (namespace_uri.as_deref() == Some("*")
                    || elem.namespace_uri().as_deref() == namespace_uri.as_deref())
                    && (local_name == "*" || *elem.local_name_str() == *local_name)
            })
        })
    }
}

impl<N: Clone> LiveNodeList<N> {
    /// Descendants of `root` in document order, excluding `root` itself,
    /// for which `select` returns `Some`.
    pub(super) fn descendants(
        root: NodeRef,
        select: impl Fn(&NodeRef) -> Option<N> + 'static,
    ) -> Self {
        Self {
            root,
            scope: Scope::Descendants,
            select: Rc::new(select),
            cache: RefCell::new(None),
        }
    }

    fn collect(&self) -> Rc<[N]> {
        let mut res = vec![];
        let mut next = self.root.first_child();
        while let Some(node) = next {
            if let Some(item) = (self.select)(&node) {
                res.push(item);
            }
            next = match self.scope {
                Scope::Children => node.next_sibling(),
                Scope::Descendants => self.following_in_subtree(node),
            };
        }
        res.into()
    }

    /// The node after `node` in a pre-order walk of the subtree under the root.
    fn following_in_subtree(&self, node: NodeRef) -> Option<NodeRef> {
        if let Some(child) = node.first_child() {
            return Some(child);
        }
        let mut now = node;
        loop {
            if let Some(sibling) = now.next_sibling() {
                return Some(sibling);
            }
            now = now.parent_node()?;
            if now.is_same_node(&self.root) {
                return None;
            }
        }
    }

    /// The current contents of the list.
    pub fn snapshot(&self) -> Rc<[N]> {
        let stamp = tracking_document(&self.root).map(|doc| doc.mutation_count());
        if let (Some(stamp), Some((cached, items))) = (stamp, self.cache.borrow().as_ref()) {
            if *cached == stamp {
                return items.clone();
            }
        }
        let items = self.collect();
        *self.cache.borrow_mut() = stamp.map(|stamp| (stamp, items.clone()));
        items
    }

    /// Iterate over the current contents of the list.
    pub fn iter(&self) -> impl Iterator<Item = N> + use<N> {
        let items = self.snapshot();
        (0..items.len()).map(move |i| items[i].clone())
    }

    /// Check if the list is currently empty.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

impl<N: Node> NodeList for LiveNodeList<N> {
    type Output = N;

    fn item(&self, index: usize) -> Option<Self::Output> {
        self.snapshot().get(index).cloned()
    }

    fn length(&self) -> usize {
        self.snapshot().len()
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::document::DocumentRef;

    use super::*;

    #[test]
    fn child_nodes_reflect_mutations() {
        let doc = DocumentRef::new();
        let mut root = doc.create_element("root").unwrap();
        let list = root.child_nodes();
        assert_eq!(list.length(), 0);
        root.append_child(doc.create_text_node("a").into()).unwrap();
        assert_eq!(list.length(), 1);
        let elem = doc.create_element("b").unwrap();
        root.insert_before(elem.clone().into(), root.first_child())
            .unwrap();
        assert!(list.item(0).unwrap().is_same_node(&elem.clone().into()));
        root.remove_child(elem.into()).unwrap();
        assert_eq!(list.length(), 1);
        assert!(list.item(1).is_none());
    }

    #[test]
    fn cached_until_counter_moves() {
        let doc = DocumentRef::new();
        let mut root = doc.create_element("root").unwrap();
        root.append_child(doc.create_element("a").unwrap().into())
            .unwrap();
        let list = root.get_elements_by_tag_name("a");
        let first = list.snapshot();
        let second = list.snapshot();
        assert!(Rc::ptr_eq(&first, &second));
        root.append_child(doc.create_element("a").unwrap().into())
            .unwrap();
        let third = list.snapshot();
        assert!(!Rc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 2);
    }

    #[test]
    fn descendants_in_document_order() {
        let doc = DocumentRef::new();
        let mut root = doc.create_element("root").unwrap();
        let mut a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        let c = doc.create_element("c").unwrap();
        root.append_child(a.clone().into()).unwrap();
        a.append_child(b.into()).unwrap();
        root.append_child(c.into()).unwrap();
        let names = root
            .get_elements_by_tag_name("*")
            .iter()
            .map(|elem| elem.tag_name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a", "b", "c"]);
        // the walk stays inside the subtree
        assert_eq!(a.get_elements_by_tag_name("*").length(), 1);
    }

    #[test]
    fn namespace_wildcards() {
        let doc = DocumentRef::new();
        let mut root = doc.create_element("root").unwrap();
        root.append_child(doc.create_element_ns(Some("urn:a"), "p:x").unwrap().into())
            .unwrap();
        root.append_child(doc.create_element_ns(Some("urn:b"), "q:x").unwrap().into())
            .unwrap();
        root.append_child(doc.create_element("x").unwrap().into())
            .unwrap();
        assert_eq!(root.get_elements_by_tag_name_ns(Some("*"), "x").length(), 3);
        assert_eq!(root.get_elements_by_tag_name_ns(Some("urn:a"), "*").length(), 1);
        assert_eq!(root.get_elements_by_tag_name_ns(None, "x").length(), 1);
    }
}
