use std::{cell::RefCell, rc::Rc};

use super::{
    DOMException,
    attr::AttrRef,
    element::{ElementRef, ElementWeakRef},
    node::{Node, NodeConnection},
    notify_mutation,
};

/// Implementation of [NamedNodeMap](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1780488922)
/// interface on [1.4 Fundamental Interfaces: Core Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-BBACDC08)
/// for the attributes of an element.
///
/// Attributes are kept in insertion order, which is also the order the serializer
/// writes them in. Setting an attribute whose key is already present replaces it in place.
///
/// Since the data is shared by [`Rc`], [`clone`](NamedNodeMap::clone) means shallow copy,
/// not deep copy.\
/// Thus, for example, if you add an attribute to a [`NamedNodeMap`] retrieved from an
/// [`Element`](crate::dom::element::Element), it will be reflected in the original element.
#[derive(Clone)]
pub struct NamedNodeMap {
    owner_element: ElementWeakRef,
    data: Rc<RefCell<Vec<AttrRef>>>,
}

/// Normalize an empty namespace URI to "no namespace".
fn normalize_ns(ns_uri: Option<&str>) -> Option<&str> {
    ns_uri.filter(|ns| !ns.is_empty())
}

impl NamedNodeMap {
    /// Create new empty [`NamedNodeMap`]
    pub(super) fn new(owner_element: ElementWeakRef) -> Self {
        Self {
            owner_element,
            data: Rc::new(RefCell::new(vec![])),
        }
    }

    /// Implementation of `length` attribute.
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// Check if this map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Implementation of `item` method.
    pub fn item(&self, index: usize) -> Option<AttrRef> {
        self.data.borrow().get(index).cloned()
    }

    /// Iterate over a snapshot of the attributes in order.
    pub fn iter(&self) -> std::vec::IntoIter<AttrRef> {
        self.data.borrow().clone().into_iter()
    }

    fn position(&self, f: impl Fn(&AttrRef) -> bool) -> Option<usize> {
        self.data.borrow().iter().position(f)
    }

    fn position_ns(&self, ns_uri: Option<&str>, local_name: &str) -> Option<usize> {
        let ns_uri = normalize_ns(ns_uri);
        self.position(|attr| {
            attr.namespace_uri().as_deref() == ns_uri && &*attr.local_name_str() == local_name
        })
    }

    /// Implementation of `getNamedItem` method.
    pub fn get_named_item(&self, name: &str) -> Option<AttrRef> {
        let index = self.position(|attr| &*attr.name() == name)?;
        self.item(index)
    }

    /// Implementation of `getNamedItemNS` method.
    pub fn get_named_item_ns(&self, ns_uri: Option<&str>, local_name: &str) -> Option<AttrRef> {
        let index = self.position_ns(ns_uri, local_name)?;
        self.item(index)
    }

    /// Implementation of `setNamedItem` method.
    ///
    /// # Errors
    /// - If `attr` is already an attribute of another element,
    ///   return `DOMException::InuseAttributeErr`.
    ///
    /// An attribute owned by another document is adopted.
    pub fn set_named_item(&mut self, attr: AttrRef) -> Result<Option<AttrRef>, DOMException> {
        let name = attr.name();
        let index = self.position(|cur| cur.name() == name);
        self.set_at(attr, index)
    }

    /// Implementation of `setNamedItemNS` method.
    ///
    /// The key is the pair of namespace URI and local name.
    pub fn set_named_item_ns(&mut self, attr: AttrRef) -> Result<Option<AttrRef>, DOMException> {
        let index = self.position_ns(attr.namespace_uri().as_deref(), &attr.local_name_str());
        self.set_at(attr, index)
    }

    fn set_at(
        &mut self,
        mut attr: AttrRef,
        index: Option<usize>,
    ) -> Result<Option<AttrRef>, DOMException> {
        let elem = self.owner_element.upgrade();
        if let Some(owner) = attr.owner_element() {
            if elem
                .as_ref()
                .is_none_or(|elem| !elem.is_same_node(&owner.into()))
            {
                return Err(DOMException::InuseAttributeErr);
            }
            if self.position(|cur| cur.is_same_node(&attr.clone().into())).is_some() {
                // already set on this element
                return Ok(None);
            }
        }

        if let Some(doc) = elem.as_ref().and_then(|elem| elem.owner_document()) {
            if attr
                .owner_document()
                .is_none_or(|cur| !cur.is_same_node(&doc.clone().into()))
            {
                attr.adopted_to(doc);
            }
        }
        attr.set_owner_element(elem.clone());

        let old = match index {
            Some(index) => {
                let mut old = std::mem::replace(&mut self.data.borrow_mut()[index], attr);
                old.set_owner_element(None);
                Some(old)
            }
            None => {
                self.data.borrow_mut().push(attr);
                None
            }
        };
        if let Some(elem) = elem {
            notify_mutation(&elem.into());
        }
        Ok(old)
    }

    /// Implementation of `removeNamedItem` method.
    ///
    /// # Errors
    /// - If there is no attribute named `name`, return `DOMException::NotFoundErr`.
    pub fn remove_named_item(&mut self, name: &str) -> Result<AttrRef, DOMException> {
        let index = self
            .position(|attr| &*attr.name() == name)
            .ok_or(DOMException::NotFoundErr)?;
        Ok(self.remove_at(index))
    }

    /// Implementation of `removeNamedItemNS` method.
    pub fn remove_named_item_ns(
        &mut self,
        ns_uri: Option<&str>,
        local_name: &str,
    ) -> Result<AttrRef, DOMException> {
        let index = self
            .position_ns(ns_uri, local_name)
            .ok_or(DOMException::NotFoundErr)?;
        Ok(self.remove_at(index))
    }

    /// Remove `attr` itself, matched by identity.
    pub(super) fn remove_node(&mut self, attr: &AttrRef) -> Result<AttrRef, DOMException> {
        let index = self
            .position(|cur| cur.is_same_node(&attr.clone().into()))
            .ok_or(DOMException::NotFoundErr)?;
        Ok(self.remove_at(index))
    }

    fn remove_at(&mut self, index: usize) -> AttrRef {
        let mut attr = self.data.borrow_mut().remove(index);
        attr.set_owner_element(None);
        if let Some(elem) = self.owner_element.upgrade() {
            notify_mutation(&elem.into());
        }
        attr
    }

    /// Append `attr` without any check and without bumping the mutation counter.
    ///
    /// Used while building copies of elements.
    pub(super) fn push_unchecked(&mut self, mut attr: AttrRef, owner: &ElementRef) {
        attr.set_owner_element(Some(owner.clone()));
        self.data.borrow_mut().push(attr);
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::document::DocumentRef;

    use super::*;

    #[test]
    fn set_replace_remove() {
        let doc = DocumentRef::new();
        let elem = doc.create_element("e").unwrap();
        let mut map = elem.attributes().unwrap();
        let mut a = doc.create_attribute("a").unwrap();
        a.set_value("1");
        assert!(map.set_named_item(a.clone()).unwrap().is_none());
        let mut a2 = doc.create_attribute("a").unwrap();
        a2.set_value("2");
        let old = map.set_named_item(a2).unwrap().unwrap();
        assert!(old.is_same_node(&a.clone().into()));
        assert!(old.owner_element().is_none());
        assert_eq!(map.len(), 1);
        assert_eq!(elem.get_attribute("a"), "2");

        assert_eq!(
            map.remove_named_item("missing").unwrap_err(),
            DOMException::NotFoundErr
        );
        map.remove_named_item("a").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn inuse_attribute() {
        let doc = DocumentRef::new();
        let mut e1 = doc.create_element("e1").unwrap();
        let mut e2 = doc.create_element("e2").unwrap();
        let attr = doc.create_attribute("a").unwrap();
        e1.set_attribute_node(attr.clone()).unwrap();
        assert_eq!(
            e2.set_attribute_node(attr).unwrap_err(),
            DOMException::InuseAttributeErr
        );
    }

    #[test]
    fn namespaced_lookup() {
        let doc = DocumentRef::new();
        let mut elem = doc.create_element("e").unwrap();
        elem.set_attribute_ns(Some("urn:a"), "a:x", "1").unwrap();
        elem.set_attribute_ns(Some("urn:b"), "b:x", "2").unwrap();
        let map = elem.attributes().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get_named_item_ns(Some("urn:b"), "x").unwrap().value(),
            "2"
        );
        assert!(map.get_named_item_ns(None, "x").is_none());
        assert_eq!(map.get_named_item("a:x").unwrap().value(), "1");
    }
}
