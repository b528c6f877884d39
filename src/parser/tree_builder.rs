//! Turning parse events into a DOM tree.

use std::rc::Rc;

use log::debug;

use crate::{
    dom::{
        DOMException,
        document::DocumentRef,
        document_type::DocumentTypeRef,
        element::ElementRef,
        node::{Node, NodeRef},
    },
    parser::{namespace::ResolvedTag, tokenizer::StartTag},
};

/// Receiver of the events produced by the parse loop, in document order.
///
/// The parse loop guarantees that `start_element` and `end_element` are balanced and
/// that `characters` is never called outside the document element.
pub trait ContentHandler {
    fn start_document(&mut self) {}

    /// `<?xml version=... encoding=... standalone=...?>` at the start of the input.
    fn xml_declaration(
        &mut self,
        _version: &str,
        _encoding: Option<&str>,
        _standalone: Option<bool>,
    ) {
    }

    fn doctype(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> Result<(), DOMException>;

    fn start_element(&mut self, tag: &StartTag, resolved: &ResolvedTag)
    -> Result<(), DOMException>;

    fn end_element(&mut self, name: &str) -> Result<(), DOMException>;

    /// The innermost open element `name` never got an end tag and is treated as if
    /// it had been written `<name/>`. Content read so far belongs after it.
    fn close_in_place(&mut self, name: &str) -> Result<(), DOMException> {
        self.end_element(name)
    }

    fn characters(&mut self, text: &str) -> Result<(), DOMException>;

    fn cdata(&mut self, text: &str) -> Result<(), DOMException>;

    fn comment(&mut self, text: &str) -> Result<(), DOMException>;

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), DOMException>;

    fn end_document(&mut self) {}
}

/// Builds a [`DocumentRef`] from parse events.
///
/// Every node is appended through the ordinary DOM methods, so each event that
/// changes the tree bumps the document's mutation counter once.
pub struct TreeBuilder {
    document: DocumentRef,
    open: Vec<ElementRef>,
}

impl TreeBuilder {
    pub fn new(document: DocumentRef) -> Self {
        Self {
            document,
            open: vec![],
        }
    }

    pub fn document(&self) -> &DocumentRef {
        &self.document
    }

    pub fn into_document(self) -> DocumentRef {
        self.document
    }

    fn append(&mut self, node: NodeRef) -> Result<(), DOMException> {
        match self.open.last_mut() {
            Some(parent) => parent.append_child(node)?,
            None => self.document.append_child(node)?,
        };
        Ok(())
    }
}

impl ContentHandler for TreeBuilder {
    fn xml_declaration(&mut self, version: &str, encoding: Option<&str>, standalone: Option<bool>) {
        self.document.set_xml_version(Some(version));
        self.document.set_xml_encoding(encoding);
        self.document.set_xml_standalone(standalone);
    }

    fn doctype(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> Result<(), DOMException> {
        let doctype = DocumentTypeRef::new(
            self.document.downgrade(),
            name.into(),
            public_id.map(Rc::from),
            system_id.map(Rc::from),
            internal_subset.map(Rc::from),
        );
        self.append(doctype.into())
    }

    fn start_element(
        &mut self,
        tag: &StartTag,
        resolved: &ResolvedTag,
    ) -> Result<(), DOMException> {
        let mut elem = ElementRef::with_namespace(
            self.document.downgrade(),
            tag.name.as_str().into(),
            resolved.namespace_uri.clone(),
        );
        for (attr, ns_uri) in tag.attributes.iter().zip(&resolved.attributes) {
            elem.push_parsed_attribute(attr.qname.as_str().into(), ns_uri.clone(), attr.value.clone());
        }
        elem.set_namespaces(resolved.namespaces.clone());
        self.append(elem.clone().into())?;
        self.open.push(elem);
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> Result<(), DOMException> {
        match self.open.pop() {
            Some(elem) if *elem.tag_name() == *name => Ok(()),
            _ => Err(DOMException::InvalidStateErr),
        }
    }

    fn close_in_place(&mut self, name: &str) -> Result<(), DOMException> {
        let mut elem = match self.open.pop() {
            Some(elem) if *elem.tag_name() == *name => elem,
            _ => return Err(DOMException::InvalidStateErr),
        };
        let Some(mut parent) = elem.parent_node() else {
            return Ok(());
        };
        let next = elem.next_sibling();
        while let Some(child) = elem.first_child() {
            let child = elem.remove_child(child)?;
            parent.insert_before(child, next.clone())?;
        }
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<(), DOMException> {
        let text = self.document.create_text_node(text);
        self.append(text.into())
    }

    fn cdata(&mut self, text: &str) -> Result<(), DOMException> {
        // HTML documents have no CDATA sections
        if self.document.is_html() {
            return self.characters(text);
        }
        let cdata = self.document.create_cdata_section(text)?;
        self.append(cdata.into())
    }

    fn comment(&mut self, text: &str) -> Result<(), DOMException> {
        let comment = self.document.create_comment(text);
        self.append(comment.into())
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), DOMException> {
        let pi = self
            .document
            .create_processing_instruction(target, data)?;
        self.append(pi.into())
    }

    fn end_document(&mut self) {
        debug!(
            "document built after {} mutations",
            self.document.mutation_count()
        );
    }
}
