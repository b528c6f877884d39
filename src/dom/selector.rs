//! The seam between the DOM and a CSS selector implementation.
//!
//! This crate does not compile or match selectors. An application that needs
//! `querySelector` registers a factory on the document with
//! [`DocumentRef::set_selector_engine_factory`](crate::dom::document::DocumentRef::set_selector_engine_factory).
//! The factory is called once, on the first query, and the engine it returns is
//! kept by the document for every later query.

use std::rc::Rc;

use super::{DOMException, element::ElementRef, node::NodeRef};

/// A selector matcher usable by [`DocumentRef`](crate::dom::document::DocumentRef)
/// and [`ElementRef`].
pub trait SelectorEngine {
    /// The first element under `context`, in document order, that matches `selector`.
    fn query_selector(
        &self,
        selector: &str,
        context: &NodeRef,
    ) -> Result<Option<ElementRef>, DOMException>;

    /// Every element under `context`, in document order, that matches `selector`.
    fn query_selector_all(
        &self,
        selector: &str,
        context: &NodeRef,
    ) -> Result<Vec<ElementRef>, DOMException>;
}

/// Creates the [`SelectorEngine`] of a document on first use.
pub type SelectorEngineFactory = Rc<dyn Fn() -> Rc<dyn SelectorEngine>>;

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use crate::dom::{
        document::DocumentRef,
        node::Node,
        node_list::{LiveNodeList, NodeList},
    };

    use super::*;

    /// Matches bare tag names only.
    struct TagNameEngine;

    impl SelectorEngine for TagNameEngine {
        fn query_selector(
            &self,
            selector: &str,
            context: &NodeRef,
        ) -> Result<Option<ElementRef>, DOMException> {
            Ok(self.query_selector_all(selector, context)?.into_iter().next())
        }

        fn query_selector_all(
            &self,
            selector: &str,
            context: &NodeRef,
        ) -> Result<Vec<ElementRef>, DOMException> {
            if selector.is_empty() || selector.contains(|c: char| !c.is_ascii_alphanumeric()) {
                return Err(DOMException::SyntaxErr);
            }
            let list = LiveNodeList::elements_by_tag_name(context.clone(), selector);
            Ok((0..list.length()).filter_map(|i| list.item(i)).collect())
        }
    }

    #[test]
    fn engine_is_created_lazily_once() {
        let mut doc = DocumentRef::new();
        let mut root = doc.create_element("root").unwrap();
        doc.append_child(root.clone().into()).unwrap();
        root.append_child(doc.create_element("a").unwrap().into())
            .unwrap();
        root.append_child(doc.create_element("a").unwrap().into())
            .unwrap();

        assert_eq!(
            doc.query_selector("a").unwrap_err(),
            DOMException::NotSupportedErr
        );

        let created = Rc::new(Cell::new(0));
        let counter = created.clone();
        doc.set_selector_engine_factory(Rc::new(move || {
            counter.set(counter.get() + 1);
            Rc::new(TagNameEngine)
        }));
        assert_eq!(created.get(), 0);

        assert!(doc.query_selector("a").unwrap().is_some());
        assert_eq!(root.query_selector_all("a").unwrap().len(), 2);
        assert!(root.query_selector("b").unwrap().is_none());
        assert_eq!(
            doc.query_selector_all("a > b").unwrap_err(),
            DOMException::SyntaxErr
        );
        assert_eq!(created.get(), 1);
    }
}
