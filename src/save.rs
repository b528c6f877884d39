//! Serializing DOM trees back into markup.
//!
//! The output of [`XmlSerializer::serialize_to_string`] parses back into a
//! structurally equal tree: the same qualified names, resolved namespaces, attribute
//! values and text. Namespace declarations missing from the tree are added where the
//! first element or attribute needs them.

use std::rc::Rc;

use crate::{
    dom::{
        XHTML_NAMESPACE, XML_NS_NAMESPACE, XML_XML_NAMESPACE,
        attr::AttrRef,
        character_data::CharacterData,
        document::DocumentRef,
        document_type::DocumentTypeRef,
        element::ElementRef,
        node::{Node, NodeRef},
    },
    parser::HTML_VOID_ELEMENTS,
};

/// The set of save options that can be passed to [`XmlSerializer::with_options`].
#[doc(alias = "xmlSaveOption")]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlSaveOption {
    /// Drop the XML declaration of documents.
    XmlSaveNoDecl = 1 << 1,
    /// Never write `<x/>`, except for HTML void elements.
    XmlSaveNoEmpty = 1 << 2,
    /// Use the XML rules for XHTML elements too.
    XmlSaveAsXml = 1 << 5,
    /// Use the HTML rules for every element.
    XmlSaveAsHtml = 1 << 6,
}

/// `(prefix, URI)` bindings declared by the ancestors written so far.
/// The empty prefix is the default namespace and an empty URI undeclares it.
type VisibleNamespaces = Vec<(Rc<str>, Rc<str>)>;

fn bound_uri<'a>(visible: &'a [(Rc<str>, Rc<str>)], prefix: &str) -> Option<&'a str> {
    visible
        .iter()
        .rev()
        .find(|(bound, _)| **bound == *prefix)
        .map(|(_, uri)| uri.as_ref())
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// Whitespace other than spaces is written as character references, otherwise the
/// parser would read it back as spaces.
fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
}

fn write_attribute(name: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_attribute(value, out);
    out.push('"');
}

/// Writes nodes as XML, or as HTML-compatible XML for XHTML elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSerializer {
    options: i32,
}

impl XmlSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the options with `options`, a combination of [`XmlSaveOption`] flags.
    pub fn with_options(mut self, options: i32) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> i32 {
        self.options
    }

    fn has_option(&self, option: XmlSaveOption) -> bool {
        self.options & option as i32 != 0
    }

    /// Serialize `node` and its subtree.
    ///
    /// Declarations made above `node` are not assumed, so the result stands on its own.
    pub fn serialize_to_string(&self, node: &NodeRef) -> String {
        let mut out = String::new();
        self.write_node(node, &mut vec![], &mut out);
        out
    }

    fn write_node(&self, node: &NodeRef, visible: &mut VisibleNamespaces, out: &mut String) {
        match node {
            NodeRef::Document(doc) => self.write_document(doc, visible, out),
            NodeRef::DocumentFragment(frag) => {
                self.write_children(frag.first_child(), visible, false, out)
            }
            NodeRef::Element(elem) => self.write_element(elem, visible, out),
            NodeRef::Attribute(attr) => {
                write_attribute(&attr.name(), &attr.value(), out);
            }
            NodeRef::Text(text) => escape_text(&text.data(), out),
            NodeRef::CDATASection(cdata) => {
                // `]]>` cannot appear inside a section, so split it across two
                out.push_str("<![CDATA[");
                out.push_str(&cdata.data().replace("]]>", "]]]]><![CDATA[>"));
                out.push_str("]]>");
            }
            NodeRef::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(&comment.data());
                out.push_str("-->");
            }
            NodeRef::ProcessingInstruction(pi) => {
                out.push_str("<?");
                out.push_str(&pi.target());
                let data = pi.data();
                if !data.is_empty() {
                    out.push(' ');
                    out.push_str(&data);
                }
                out.push_str("?>");
            }
            NodeRef::DocumentType(doctype) => write_doctype(doctype, out),
        }
    }

    fn write_document(&self, doc: &DocumentRef, visible: &mut VisibleNamespaces, out: &mut String) {
        if let Some(version) = doc
            .xml_version()
            .filter(|_| !self.has_option(XmlSaveOption::XmlSaveNoDecl))
        {
            out.push_str("<?xml version=\"");
            out.push_str(&version);
            out.push('"');
            if let Some(encoding) = doc.xml_encoding() {
                out.push_str(" encoding=\"");
                out.push_str(&encoding);
                out.push('"');
            }
            if let Some(standalone) = doc.xml_standalone() {
                out.push_str(if standalone {
                    " standalone=\"yes\""
                } else {
                    " standalone=\"no\""
                });
            }
            out.push_str("?>\n");
        }
        let mut cur = doc.first_child();
        while let Some(child) = cur {
            self.write_node(&child, visible, out);
            if matches!(child, NodeRef::DocumentType(_)) {
                out.push('\n');
            }
            cur = child.next_sibling();
        }
    }

    fn is_html(&self, elem: &ElementRef) -> bool {
        self.has_option(XmlSaveOption::XmlSaveAsHtml)
            || (!self.has_option(XmlSaveOption::XmlSaveAsXml)
                && elem.namespace_uri().as_deref() == Some(XHTML_NAMESPACE))
    }

    fn write_element(&self, elem: &ElementRef, visible: &mut VisibleNamespaces, out: &mut String) {
        let depth = visible.len();
        let attrs = elem
            .attributes()
            .map(|map| map.iter().collect::<Vec<_>>())
            .unwrap_or_default();

        // declarations written on the element apply to the element itself
        for attr in &attrs {
            let name = attr.name();
            if &*name == "xmlns" {
                visible.push((Rc::from(""), Rc::from(attr.value())));
            } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                visible.push((Rc::from(prefix), Rc::from(attr.value())));
            }
        }

        let tag_name = elem.tag_name();
        out.push('<');
        out.push_str(&tag_name);
        match (elem.prefix(), elem.namespace_uri()) {
            (prefix, Some(uri)) => {
                declare(prefix.as_deref().unwrap_or(""), &uri, visible, out);
            }
            (None, None) => {
                // an element without namespace must not pick up a default namespace
                if bound_uri(visible, "").is_some_and(|uri| !uri.is_empty()) {
                    declare("", "", visible, out);
                }
            }
            (Some(_), None) => {}
        }
        for attr in &attrs {
            self.write_element_attribute(attr, depth, visible, out);
        }

        let html = self.is_html(elem);
        let local = elem.local_name_str();
        let void = html && HTML_VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(&local));
        let first = elem.first_child();
        if first.is_none() && (void || !(html || self.has_option(XmlSaveOption::XmlSaveNoEmpty))) {
            out.push_str("/>");
        } else {
            out.push('>');
            let raw = html
                && (local.eq_ignore_ascii_case("script") || local.eq_ignore_ascii_case("style"));
            self.write_children(first, visible, raw, out);
            out.push_str("</");
            out.push_str(&tag_name);
            out.push('>');
        }
        visible.truncate(depth);
    }

    /// Write `attr`, declaring its namespace if needed.
    ///
    /// Bindings in `visible[depth..]` belong to the element being written. An
    /// attribute whose prefix is already bound there to another URI, or a
    /// namespaced attribute without prefix, is written with a prefix that maps to
    /// its URI. Such a prefix is reused from the scope or generated.
    fn write_element_attribute(
        &self,
        attr: &AttrRef,
        depth: usize,
        visible: &mut VisibleNamespaces,
        out: &mut String,
    ) {
        let Some(uri) = attr.namespace_uri() else {
            write_attribute(&attr.name(), &attr.value(), out);
            return;
        };
        let prefix = attr.prefix();
        if &*uri == XML_NS_NAMESPACE || prefix.as_deref() == Some("xmlns") {
            write_attribute(&attr.name(), &attr.value(), out);
            return;
        }
        let local = attr.local_name().unwrap_or_else(|| attr.name());
        if &*uri == XML_XML_NAMESPACE {
            write_attribute(&format!("xml:{local}"), &attr.value(), out);
            return;
        }
        let prefix = match prefix {
            Some(prefix)
                if bound_uri(&visible[depth..], &prefix).is_none_or(|bound| bound == &*uri) =>
            {
                prefix
            }
            _ => attribute_prefix(&uri, visible),
        };
        declare(&prefix, &uri, visible, out);
        write_attribute(&format!("{prefix}:{local}"), &attr.value(), out);
    }

    /// Write `first` and its following siblings. With `raw`, text is written
    /// without escaping.
    fn write_children(
        &self,
        first: Option<NodeRef>,
        visible: &mut VisibleNamespaces,
        raw: bool,
        out: &mut String,
    ) {
        let mut cur = first;
        while let Some(child) = cur {
            match &child {
                NodeRef::Text(text) if raw => out.push_str(&text.data()),
                _ => self.write_node(&child, visible, out),
            }
            cur = child.next_sibling();
        }
    }
}

/// A non-empty prefix that can be bound to `uri` on the current element.
///
/// A prefix in scope that still maps to `uri` is reused. Otherwise the first of
/// `ns1`, `ns2`, ... that is bound nowhere in `visible` is taken.
fn attribute_prefix(uri: &str, visible: &VisibleNamespaces) -> Rc<str> {
    let in_scope = visible.iter().rev().find(|(prefix, bound)| {
        !prefix.is_empty() && &**bound == uri && bound_uri(visible, prefix) == Some(uri)
    });
    if let Some((prefix, _)) = in_scope {
        return prefix.clone();
    }
    (1..)
        .map(|n| format!("ns{n}"))
        .find(|prefix| bound_uri(visible, prefix).is_none())
        .map(Rc::from)
        .unwrap_or_else(|| Rc::from("ns"))
}

/// Write `xmlns[:prefix]="uri"` unless that binding is already in scope.
fn declare(prefix: &str, uri: &str, visible: &mut VisibleNamespaces, out: &mut String) {
    if uri == XML_XML_NAMESPACE || uri == XML_NS_NAMESPACE {
        return;
    }
    if bound_uri(visible, prefix) == Some(uri) {
        return;
    }
    if prefix.is_empty() {
        write_attribute("xmlns", uri, out);
    } else {
        write_attribute(&format!("xmlns:{prefix}"), uri, out);
    }
    visible.push((Rc::from(prefix), Rc::from(uri)));
}

fn write_doctype(doctype: &DocumentTypeRef, out: &mut String) {
    out.push_str("<!DOCTYPE ");
    out.push_str(&doctype.name());
    match (doctype.public_id(), doctype.system_id()) {
        (Some(public_id), system_id) => {
            out.push_str(" PUBLIC \"");
            out.push_str(&public_id);
            out.push('"');
            if let Some(system_id) = system_id {
                out.push_str(" \"");
                out.push_str(&system_id);
                out.push('"');
            }
        }
        (None, Some(system_id)) => {
            out.push_str(" SYSTEM \"");
            out.push_str(&system_id);
            out.push('"');
        }
        (None, None) => {}
    }
    if let Some(subset) = doctype.internal_subset() {
        out.push_str(" [");
        out.push_str(&subset);
        out.push(']');
    }
    out.push('>');
}

/// Serialize `node` with the default options.
pub fn serialize(node: &NodeRef) -> String {
    XmlSerializer::new().serialize_to_string(node)
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse_html, parse_xml};

    use super::*;

    #[test]
    fn declares_missing_namespaces_once() {
        let doc = DocumentRef::new();
        let mut root = doc.create_element_ns(Some("urn:a"), "a:root").unwrap();
        let child = doc.create_element_ns(Some("urn:a"), "a:child").unwrap();
        let mut other = doc.create_element_ns(Some("urn:b"), "item").unwrap();
        other
            .set_attribute_ns(Some("urn:c"), "c:flag", "1")
            .unwrap();
        other
            .set_attribute_ns(Some(XML_XML_NAMESPACE), "xml:lang", "en")
            .unwrap();
        root.append_child(child.into()).unwrap();
        root.append_child(other.into()).unwrap();
        assert_eq!(
            serialize(&root.into()),
            r#"<a:root xmlns:a="urn:a"><a:child/><item xmlns="urn:b" xmlns:c="urn:c" c:flag="1" xml:lang="en"/></a:root>"#
        );
    }

    #[test]
    fn undeclares_the_default_namespace() {
        let doc = parse_xml(r#"<r xmlns="urn:d"><x/></r>"#).unwrap();
        let mut root = doc.document_element().unwrap();
        let plain = doc.create_element("plain").unwrap();
        root.append_child(plain.into()).unwrap();
        assert_eq!(
            serialize(&root.into()),
            r#"<r xmlns="urn:d"><x/><plain xmlns=""/></r>"#
        );
    }

    #[test]
    fn subtree_does_not_rely_on_ancestors() {
        let doc = parse_xml(r#"<p:r xmlns:p="urn:p"><p:c>t</p:c></p:r>"#).unwrap();
        let child = doc.document_element().unwrap().first_child().unwrap();
        assert_eq!(serialize(&child), r#"<p:c xmlns:p="urn:p">t</p:c>"#);
    }

    #[test]
    fn escaping() {
        let doc = DocumentRef::new();
        let mut elem = doc.create_element("e").unwrap();
        elem.set_attribute("a", "<\"&'>\t\n").unwrap();
        elem.append_child(doc.create_text_node("a < b & c > d \"q\"").into())
            .unwrap();
        assert_eq!(
            serialize(&elem.into()),
            "<e a=\"&lt;&quot;&amp;'&gt;&#9;&#10;\">a &lt; b &amp; c &gt; d \"q\"</e>"
        );
    }

    #[test]
    fn literal_nodes() {
        let src = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<!DOCTYPE r SYSTEM "r.dtd" [<!ENTITY e "x">]>"#,
            "\n",
            "<r><!-- c --><?pi data?><![CDATA[<raw>]]></r>"
        );
        let doc = parse_xml(src).unwrap();
        assert_eq!(serialize(&doc.clone().into()), src);
        let out = XmlSerializer::new()
            .with_options(XmlSaveOption::XmlSaveNoDecl as i32)
            .serialize_to_string(&doc.into());
        assert!(out.starts_with("<!DOCTYPE r"));
    }

    #[test]
    fn cdata_terminator_is_split() {
        let doc = DocumentRef::new();
        let cdata = doc.create_cdata_section("a]]>b").unwrap();
        let out = serialize(&cdata.into());
        assert_eq!(out, "<![CDATA[a]]]]><![CDATA[>b]]>");
        let reparsed = parse_xml(&format!("<r>{out}</r>")).unwrap();
        assert_eq!(
            reparsed.document_element().unwrap().text_content().as_deref(),
            Some("a]]>b")
        );
    }

    #[test]
    fn html_rules() {
        let doc = parse_html(
            "<div><br><p></p><script>if (a < b && c) {}</script><img src=x.png></div>",
        )
        .unwrap();
        let root = doc.document_element().unwrap();
        assert_eq!(
            serialize(&root.clone().into()),
            concat!(
                r#"<div xmlns="http://www.w3.org/1999/xhtml"><br/><p></p>"#,
                "<script>if (a < b && c) {}</script>",
                r#"<img src="x.png"/></div>"#
            )
        );
        let as_xml = XmlSerializer::new()
            .with_options(XmlSaveOption::XmlSaveAsXml as i32)
            .serialize_to_string(&root.into());
        assert!(as_xml.contains("<p/>"));
        assert!(as_xml.contains("a &lt; b &amp;&amp; c"));
    }

    #[test]
    fn no_empty_tags() {
        let doc = parse_xml("<r><e/></r>").unwrap();
        let out = XmlSerializer::new()
            .with_options(XmlSaveOption::XmlSaveNoEmpty as i32)
            .serialize_to_string(&doc.document_element().unwrap().into());
        assert_eq!(out, "<r><e></e></r>");
    }
}
