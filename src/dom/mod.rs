//! A mutable tree modelled on [Document Object Model (DOM) Level 3 Core](https://www.w3.org/TR/DOM-Level-3-Core/).
//!
//! Every node interface is a cheap, cloneable handle (`XxxRef`) over `Rc<RefCell<Xxx>>`.
//! Children and next siblings are held strongly; parents, previous siblings and the
//! owner document are held weakly, so dropping a [`DocumentRef`](document::DocumentRef)
//! and every handle into its tree frees the whole tree.
//!
//! Handles are `!Send`. A tree belongs to the thread that built it.
//!
//! # Note
//! - Inserting a node that belongs to another document adopts it instead of failing
//!   with `WRONG_DOCUMENT_ERR`.
//! - Every structural change (child insertion, removal or replacement and attribute
//!   set or removal) bumps the owner document's mutation counter once.
//!   [`LiveNodeList`](node_list::LiveNodeList) compares against that counter to
//!   decide whether its cached snapshot is stale.

use std::fmt;

use node::{NodeConnection, NodeRef};

use crate::{
    dom::node::Node,
    parser::qname::{split_qname2, validate_name, validate_qname},
};

pub mod attr;
pub mod character_data;
pub mod document;
pub mod document_fragment;
pub mod document_type;
pub mod element;
pub mod named_node_map;
pub mod node;
pub mod node_list;
pub mod pi;
pub mod selector;
pub mod style;

/// This is the namespace for the special xml: prefix predefined in the
/// XML Namespace specification.
pub const XML_XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// The namespace bound to `xmlns` and `xmlns:*` attributes.
pub const XML_NS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
/// The default namespace of documents parsed in HTML mode.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Implementation of [DOMException](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-17189187)
/// interface on [1.4 Fundamental Interfaces: Core Module](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-BBACDC08)
///
/// Although named “Exception”,
/// it merely inherits its name from the specification and is in fact just an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DOMException {
    /// If index or size is negative, or greater than the allowed value.
    IndexSizeErr = 1,
    /// If the specified range of text does not fit into a DOMString.
    DOMStringSizeErr = 2,
    /// If any Node is inserted somewhere it doesn't belong.
    HierarchyRequestErr = 3,
    /// If a Node is used in a different document than the one that created it
    /// (that doesn't support it).
    WrongDocumentErr = 4,
    /// If an invalid or illegal character is specified, such as in an XML name.
    InvalidCharacterErr = 5,
    /// If data is specified for a Node which does not support data.
    NoDataAllowedErr = 6,
    /// If an attempt is made to modify an object where modifications are not allowed.
    NoModificationAllowedErr = 7,
    /// If an attempt is made to reference a Node in a context where it does not exist.
    NotFoundErr = 8,
    /// If the implementation does not support the requested type of object or operation.
    NotSupportedErr = 9,
    /// If an attempt is made to add an attribute that is already in use elsewhere.
    InuseAttributeErr = 10,
    /// If an attempt is made to use an object that is not, or is no longer, usable.
    InvalidStateErr = 11,
    /// If an invalid or illegal string is specified.
    SyntaxErr = 12,
    /// If an attempt is made to modify the type of the underlying object.
    InvalidModificationErr = 13,
    /// If an attempt is made to create or change an object in a way which is incorrect with
    /// regard to namespaces.
    NamespaceErr = 14,
    /// If a parameter or an operation is not supported by the underlying object.
    InvalidAccessErr = 15,
    /// If a call to a method such as insertBefore or removeChild would make the Node invalid
    /// with respect to "partial validity".
    ValidationErr = 16,
    /// If the type of an object is incompatible with the expected type of the parameter
    /// associated to the object.
    TypeMismatchErr = 17,
}

impl fmt::Display for DOMException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use DOMException::*;
        let name = match self {
            IndexSizeErr => "INDEX_SIZE_ERR",
            DOMStringSizeErr => "DOMSTRING_SIZE_ERR",
            HierarchyRequestErr => "HIERARCHY_REQUEST_ERR",
            WrongDocumentErr => "WRONG_DOCUMENT_ERR",
            InvalidCharacterErr => "INVALID_CHARACTER_ERR",
            NoDataAllowedErr => "NO_DATA_ALLOWED_ERR",
            NoModificationAllowedErr => "NO_MODIFICATION_ALLOWED_ERR",
            NotFoundErr => "NOT_FOUND_ERR",
            NotSupportedErr => "NOT_SUPPORTED_ERR",
            InuseAttributeErr => "INUSE_ATTRIBUTE_ERR",
            InvalidStateErr => "INVALID_STATE_ERR",
            SyntaxErr => "SYNTAX_ERR",
            InvalidModificationErr => "INVALID_MODIFICATION_ERR",
            NamespaceErr => "NAMESPACE_ERR",
            InvalidAccessErr => "INVALID_ACCESS_ERR",
            ValidationErr => "VALIDATION_ERR",
            TypeMismatchErr => "TYPE_MISMATCH_ERR",
        };
        write!(f, "{name} ({})", *self as u16)
    }
}

impl std::error::Error for DOMException {}

/// Constants `NodeType` in [Interface Node](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1950641247).
///
/// Entity, EntityReference and Notation nodes are never produced, so their codes are
/// not represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CDATASection = 4,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
}

/// Return `true` if `parent` and `child` are allowed to be parent and child.
/// Otherwise, return `false`.
///
/// [1.1.1 The DOM Structure Model](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-1590626202)
///
/// | NodeType              | Description                                                                               |
/// | :-------------------- | :---------------------------------------------------------------------------------------- |
/// | Document              | Element (maximum of one), ProcessingInstruction, Comment, DocumentType (maximum of one)   |
/// | DocumentFragment      | Element, ProcessingInstruction, Comment, Text, CDATASection                               |
/// | Element               | Element, ProcessingInstruction, Comment, Text, CDATASection                               |
/// | others                | no children                                                                               |
fn check_vertical_hierarchy(parent: NodeType, child: NodeType) -> bool {
    use NodeType::*;
    match parent {
        Element | DocumentFragment => matches!(
            child,
            Element | Text | Comment | ProcessingInstruction | CDATASection
        ),
        Document => matches!(
            child,
            Element | ProcessingInstruction | Comment | DocumentType
        ),
        _ => false,
    }
}

/// The document whose mutation counter tracks `node`.
fn tracking_document(node: &NodeRef) -> Option<document::DocumentRef> {
    match node {
        NodeRef::Document(doc) => Some(doc.clone()),
        other => other.owner_document(),
    }
}

/// Bump the mutation counter of the document that tracks `node`, if it is still alive.
fn notify_mutation(node: &NodeRef) {
    if let Some(doc) = tracking_document(node) {
        doc.bump_mutation_count();
    }
}

/// Adopt `node` and its subtree into the document that tracks `target`
/// unless it already belongs there.
fn adopt_for(target: &NodeRef, node: &mut NodeRef) {
    let Some(doc) = tracking_document(target) else {
        return;
    };
    if node
        .owner_document()
        .is_none_or(|cur| !cur.is_same_node(&doc.clone().into()))
    {
        node.adopted_to(doc);
    }
}

/// Check `qname` and `ns_uri` for the namespace-aware factories.
///
/// Returns the normalized namespace URI (an empty URI means no namespace).
///
/// # Errors
/// - `InvalidCharacterErr` if `qname` is not a Name.
/// - `NamespaceErr` if `qname` is malformed, if it has a prefix but no namespace,
///   or if the `xml` / `xmlns` reservations are violated.
fn validate_and_extract<'a>(
    ns_uri: Option<&'a str>,
    qname: &str,
) -> Result<Option<&'a str>, DOMException> {
    if !validate_name(qname) {
        return Err(DOMException::InvalidCharacterErr);
    }
    if !validate_qname(qname) {
        return Err(DOMException::NamespaceErr);
    }
    let ns_uri = ns_uri.filter(|ns| !ns.is_empty());
    let prefix = split_qname2(qname).map(|(prefix, _)| prefix);
    if prefix.is_some() && ns_uri.is_none() {
        return Err(DOMException::NamespaceErr);
    }
    if prefix == Some("xml") && ns_uri != Some(XML_XML_NAMESPACE) {
        return Err(DOMException::NamespaceErr);
    }
    if (qname == "xmlns" || prefix == Some("xmlns")) != (ns_uri == Some(XML_NS_NAMESPACE)) {
        return Err(DOMException::NamespaceErr);
    }
    Ok(ns_uri)
}
