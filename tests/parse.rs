use std::{cell::RefCell, rc::Rc};

use xmldom::{
    dom::{
        NodeType, XHTML_NAMESPACE, XML_XML_NAMESPACE, character_data::CharacterData,
        document::DocumentRef, node::Node, node_list::NodeList,
    },
    error::{DOMError, DOMErrorSeverity, ParseError, XmlParserErrors},
    parser::{DOMParser, ParserMode, XmlParserOption},
};

fn parse_with(mode: ParserMode, options: i32, src: &str) -> (DocumentRef, Vec<DOMError>) {
    let seen = Rc::new(RefCell::new(vec![]));
    let sink = seen.clone();
    let doc = DOMParser::new(mode)
        .with_options(options)
        .with_error_handler(move |err: DOMError| {
            sink.borrow_mut().push(err);
            true
        })
        .parse_from_string(src)
        .unwrap();
    let errors = seen.borrow().clone();
    (doc, errors)
}

fn codes(errors: &[DOMError]) -> Vec<(DOMErrorSeverity, XmlParserErrors)> {
    errors.iter().map(|e| (e.severity(), e.code())).collect()
}

#[test]
fn namespace_scoping() {
    let (doc, errors) = parse_with(
        ParserMode::Xml,
        0,
        r#"<a:root xmlns:a="urn:x"><a:child/></a:root>"#,
    );
    assert!(errors.is_empty());
    let root = doc.document_element().unwrap();
    assert_eq!(&*root.tag_name(), "a:root");
    assert_eq!(root.namespace_uri().as_deref(), Some("urn:x"));
    assert_eq!(root.prefix().as_deref(), Some("a"));
    assert_eq!(root.local_name().as_deref(), Some("root"));
    assert_eq!(root.child_nodes().length(), 1);
    let child = root.first_child().unwrap();
    assert_eq!(&*child.node_name(), "a:child");
    assert_eq!(child.namespace_uri().as_deref(), Some("urn:x"));
}

#[test]
fn declarations_do_not_leak_to_siblings() {
    let (doc, errors) = parse_with(
        ParserMode::Xml,
        0,
        r#"<r xmlns="urn:d"><a xmlns:p="urn:p"><p:x/></a><p:y/><b xmlns=""><c/></b></r>"#,
    );
    let root = doc.document_element().unwrap();
    let a = root.first_child().unwrap();
    assert_eq!(a.namespace_uri().as_deref(), Some("urn:d"));
    assert_eq!(
        a.first_child().unwrap().namespace_uri().as_deref(),
        Some("urn:p")
    );
    // `p` is only declared on `a`
    let y = a.next_sibling().unwrap();
    assert_eq!(y.namespace_uri(), None);
    assert_eq!(
        codes(&errors),
        [(
            DOMErrorSeverity::SeverityWarning,
            XmlParserErrors::XmlNsErrUndefinedNamespace
        )]
    );
    let b = y.next_sibling().unwrap();
    assert_eq!(b.namespace_uri(), None);
    assert_eq!(b.first_child().unwrap().namespace_uri(), None);
    assert_eq!(
        root.lookup_namespace_uri(Some("xml")).as_deref(),
        Some(XML_XML_NAMESPACE)
    );
}

#[test]
fn entity_decoding() {
    let (doc, errors) = parse_with(ParserMode::Xml, 0, "<p>A &amp; B &#65;</p>");
    assert!(errors.is_empty());
    let p = doc.document_element().unwrap();
    assert_eq!(p.child_nodes().length(), 1);
    let text = p.first_child().unwrap();
    assert_eq!(text.node_type(), NodeType::Text);
    assert_eq!(text.as_text_node().unwrap().data(), "A & B A");
}

#[test]
fn unknown_entities_are_kept() {
    let (doc, errors) = parse_with(ParserMode::Xml, 0, "<p>&nbsp;&#0;</p>");
    let p = doc.document_element().unwrap();
    assert_eq!(p.text_content().as_deref(), Some("&nbsp;&#0;"));
    assert_eq!(
        codes(&errors),
        [
            (
                DOMErrorSeverity::SeverityWarning,
                XmlParserErrors::XmlErrUndeclaredEntity
            ),
            (
                DOMErrorSeverity::SeverityWarning,
                XmlParserErrors::XmlErrInvalidCharRef
            ),
        ]
    );

    let (doc, errors) = parse_with(ParserMode::Html, 0, "<p>&nbsp;&copy;&eacute;</p>");
    assert!(errors.is_empty());
    let p = doc.document_element().unwrap();
    assert_eq!(p.text_content().as_deref(), Some("\u{a0}\u{a9}\u{e9}"));
}

#[test]
fn html5_named_references() {
    let (doc, errors) = parse_with(
        ParserMode::Html,
        0,
        "<p title='&NotEqualTilde;'>&apos;|&check;|&NewLine;|&NotEqualTilde;|&hellip;</p>",
    );
    assert!(errors.is_empty(), "{errors:?}");
    let p = doc.document_element().unwrap();
    assert_eq!(
        p.text_content().as_deref(),
        Some("'|\u{2713}|\n|\u{2242}\u{338}|\u{2026}")
    );
    assert_eq!(p.get_attribute("title"), "\u{2242}\u{338}");
}

#[test]
fn unquoted_attribute_in_html() {
    let (doc, errors) = parse_with(ParserMode::Html, 0, "<input type=text>");
    let input = doc.document_element().unwrap();
    assert_eq!(&*input.tag_name(), "input");
    assert_eq!(input.get_attribute("type"), "text");
    assert_eq!(input.namespace_uri().as_deref(), Some(XHTML_NAMESPACE));
    assert_eq!(
        codes(&errors),
        [(
            DOMErrorSeverity::SeverityWarning,
            XmlParserErrors::XmlErrAttributeNotQuoted
        )]
    );
}

#[test]
fn unquoted_attribute_in_xml() {
    let (doc, errors) = parse_with(ParserMode::Xml, 0, "<r><input type=text/></r>");
    assert_eq!(
        codes(&errors)[0],
        (
            DOMErrorSeverity::SeverityError,
            XmlParserErrors::XmlErrAttributeNotQuoted
        )
    );
    // the tag is kept as text
    let root = doc.document_element().unwrap();
    assert_eq!(root.text_content().as_deref(), Some("<input type=text/>"));

    let (doc, errors) = parse_with(
        ParserMode::Xml,
        XmlParserOption::XmlParseRecover as i32,
        "<r><input type=text/></r>",
    );
    assert_eq!(
        codes(&errors),
        [(
            DOMErrorSeverity::SeverityWarning,
            XmlParserErrors::XmlErrAttributeNotQuoted
        )]
    );
    let input = doc.document_element().unwrap().first_child().unwrap();
    assert_eq!(input.as_element().unwrap().get_attribute("type"), "text");
}

#[test]
fn mismatched_end_tag() {
    let (doc, errors) = parse_with(ParserMode::Xml, 0, "<div><span></div><!--after-->");
    assert_eq!(
        codes(&errors),
        [(
            DOMErrorSeverity::SeverityFatalError,
            XmlParserErrors::XmlErrTagNameMismatch
        )]
    );
    let div = doc.document_element().unwrap();
    assert_eq!(div.child_nodes().length(), 1);
    let span = div.first_child().unwrap();
    assert_eq!(&*span.node_name(), "span");
    assert!(!span.has_child_nodes());
    // parsing went on after `</div>`
    let comment = div.next_sibling().unwrap();
    assert_eq!(comment.node_type(), NodeType::Comment);
}

#[test]
fn end_tag_matching_rules() {
    let (_, errors) = parse_with(ParserMode::Xml, 0, "<a></A>");
    assert_eq!(
        codes(&errors),
        [(
            DOMErrorSeverity::SeverityFatalError,
            XmlParserErrors::XmlErrTagNameMismatch
        )]
    );

    let (doc, errors) = parse_with(ParserMode::Xml, 0, "<a></b>text</a>");
    assert_eq!(
        codes(&errors),
        [(
            DOMErrorSeverity::SeverityError,
            XmlParserErrors::XmlErrEndTagNotOpened
        )]
    );
    let a = doc.document_element().unwrap();
    assert_eq!(a.text_content().as_deref(), Some("text"));

    let (doc, errors) = parse_with(ParserMode::Xml, 0, "<a><b><c></a>");
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| e.code() == XmlParserErrors::XmlErrTagNameMismatch)
    );
    let a = doc.document_element().unwrap();
    assert_eq!(doc.get_elements_by_tag_name("*").length(), 3);
    assert!(a.next_sibling().is_none());
}

#[test]
fn doctype() {
    let (doc, errors) = parse_with(ParserMode::Html, 0, "<!DOCTYPE html><html></html>");
    assert!(errors.is_empty());
    let doctype = doc.doctype().unwrap();
    assert_eq!(&*doctype.name(), "html");
    assert_eq!(doctype.public_id(), None);
    assert_eq!(doctype.system_id(), None);
    assert_eq!(doctype.internal_subset(), None);
    assert!(doc.first_child().unwrap().as_document_type().is_some());

    let (doc, _) = parse_with(
        ParserMode::Xml,
        0,
        r#"<!DOCTYPE note SYSTEM "note.dtd" [<!ELEMENT note (#PCDATA)>]><note/>"#,
    );
    let doctype = doc.doctype().unwrap();
    assert_eq!(doctype.system_id().as_deref(), Some("note.dtd"));
    assert_eq!(
        doctype.internal_subset().as_deref(),
        Some("<!ELEMENT note (#PCDATA)>")
    );

    let (_, errors) = parse_with(ParserMode::Xml, 0, "<a/><!DOCTYPE a>");
    assert_eq!(
        codes(&errors),
        [(
            DOMErrorSeverity::SeverityError,
            XmlParserErrors::XmlErrExtraContent
        )]
    );
}

#[test]
fn xml_declaration() {
    let (doc, errors) = parse_with(
        ParserMode::Xml,
        0,
        "<?xml version=\"1.1\" encoding=\"UTF-8\" standalone='yes'?>\n<r/>",
    );
    assert!(errors.is_empty());
    assert_eq!(doc.xml_version().as_deref(), Some("1.1"));
    assert_eq!(doc.xml_encoding().as_deref(), Some("UTF-8"));
    assert_eq!(doc.xml_standalone(), Some(true));
    // the declaration is not a node
    assert_eq!(doc.child_nodes().length(), 1);

    let (_, errors) = parse_with(ParserMode::Xml, 0, "<r/><?xml version=\"1.0\"?>");
    assert_eq!(errors[0].code(), XmlParserErrors::XmlErrMisplacedXmlDecl);
}

#[test]
fn hard_failures_make_progress() {
    let (doc, errors) = parse_with(ParserMode::Xml, 0, "<a><b c=\"x></a>");
    assert_eq!(
        codes(&errors),
        [(
            DOMErrorSeverity::SeverityError,
            XmlParserErrors::XmlErrAttributeUnterminated
        )]
    );
    let a = doc.document_element().unwrap();
    assert_eq!(a.text_content().as_deref(), Some("<b c=\"x>"));

    for src in ["<", "<a><", "<a>< b></a>", "<a><=></a>", "<a><!x></a>", "<a></"] {
        let (_, errors) = parse_with(ParserMode::Xml, 0, src);
        assert!(!errors.is_empty(), "{src}");
    }
}

#[test]
fn truncated_start_tag() {
    let (doc, errors) = parse_with(ParserMode::Xml, 0, "<r><item x=\"1\"");
    assert_eq!(errors[0].code(), XmlParserErrors::XmlErrTagNotFinished);
    let item = doc.document_element().unwrap().first_child().unwrap();
    assert_eq!(&*item.node_name(), "item");
}

#[test]
fn self_closing_repair() {
    let (doc, errors) = parse_with(ParserMode::Xml, 0, "<root><a>text");
    assert_eq!(
        codes(&errors),
        [
            (
                DOMErrorSeverity::SeverityWarning,
                XmlParserErrors::XmlWarSelfClosingRepair
            ),
            (
                DOMErrorSeverity::SeverityError,
                XmlParserErrors::XmlErrElementNotClosed
            ),
        ]
    );
    let root = doc.document_element().unwrap();
    assert_eq!(root.child_nodes().length(), 2);
    let a = root.first_child().unwrap();
    assert!(!a.has_child_nodes());
    assert_eq!(
        a.next_sibling().unwrap().text_content().as_deref(),
        Some("text")
    );

    let (doc, errors) = parse_with(
        ParserMode::Xml,
        XmlParserOption::XmlParseNoRepair as i32,
        "<root><a>text",
    );
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| e.code() == XmlParserErrors::XmlErrElementNotClosed)
    );
    let a = doc.document_element().unwrap().first_child().unwrap();
    assert_eq!(a.text_content().as_deref(), Some("text"));
}

#[test]
fn html_content_models() {
    let (doc, errors) = parse_with(
        ParserMode::Html,
        0,
        concat!(
            "<html><head><title>A &amp; B</title>",
            "<script>if (a<b && c) { x = '</p>'; }</script></head>",
            "<body><p>one<br>two<img src=a.png></p>",
            "<textarea><b>bold</b></textarea></body></html>"
        ),
    );
    assert_eq!(
        codes(&errors),
        [(
            DOMErrorSeverity::SeverityWarning,
            XmlParserErrors::XmlErrAttributeNotQuoted
        )]
    );
    let title = doc.get_elements_by_tag_name("title").item(0).unwrap();
    assert_eq!(title.text_content().as_deref(), Some("A & B"));
    let script = doc.get_elements_by_tag_name("script").item(0).unwrap();
    assert_eq!(
        script.text_content().as_deref(),
        Some("if (a<b && c) { x = '</p>'; }")
    );
    let p = doc.get_elements_by_tag_name("p").item(0).unwrap();
    assert_eq!(p.child_nodes().length(), 4);
    assert!(!p.get_elements_by_tag_name("br").item(0).unwrap().has_child_nodes());
    let textarea = doc.get_elements_by_tag_name("textarea").item(0).unwrap();
    assert_eq!(textarea.child_nodes().length(), 1);
    assert_eq!(textarea.text_content().as_deref(), Some("<b>bold</b>"));
}

#[test]
fn raw_text_ends_only_at_its_own_end_tag() {
    let (doc, errors) = parse_with(
        ParserMode::Html,
        0,
        r#"<html><body><script>var s="</scripts>";</script ><p>after</p></body></html>"#,
    );
    assert!(errors.is_empty(), "{errors:?}");
    let script = doc.get_elements_by_tag_name("script").item(0).unwrap();
    assert_eq!(
        script.text_content().as_deref(),
        Some(r#"var s="</scripts>";"#)
    );
    let p = script.next_sibling().unwrap();
    assert_eq!(&*p.node_name(), "p");
}

#[test]
fn void_like_element_in_a_closed_document_is_not_repaired() {
    // Repair is decided at the end of the input. A `br` that is never closed
    // in XML mode keeps the following siblings, and the root end tag that
    // reaches past it is reported.
    let (doc, errors) = parse_with(ParserMode::Xml, 0, "<root><br><p>x</p></root>");
    assert_eq!(
        codes(&errors),
        [(
            DOMErrorSeverity::SeverityFatalError,
            XmlParserErrors::XmlErrTagNameMismatch
        )]
    );
    let root = doc.document_element().unwrap();
    let br = root.first_child().unwrap();
    assert_eq!(&*br.node_name(), "br");
    assert_eq!(&*br.first_child().unwrap().node_name(), "p");
    assert!(br.next_sibling().is_none());

    // the same markup in HTML mode closes `br` as a void element
    let (doc, errors) = parse_with(ParserMode::Html, 0, "<root><br><p>x</p></root>");
    assert!(errors.is_empty(), "{errors:?}");
    let br = doc.document_element().unwrap().first_child().unwrap();
    assert!(!br.has_child_nodes());
    assert_eq!(&*br.next_sibling().unwrap().node_name(), "p");
}

#[test]
fn text_outside_the_document_element() {
    let (doc, errors) = parse_with(ParserMode::Xml, 0, " x <a/> \n y");
    assert_eq!(
        codes(&errors),
        [
            (
                DOMErrorSeverity::SeverityError,
                XmlParserErrors::XmlErrTextOutsideRoot
            ),
            (
                DOMErrorSeverity::SeverityError,
                XmlParserErrors::XmlErrTextOutsideRoot
            ),
        ]
    );
    assert_eq!(doc.child_nodes().length(), 1);

    let (doc, errors) = parse_with(ParserMode::Xml, 0, "<a/><b/>");
    assert_eq!(errors[0].code(), XmlParserErrors::XmlErrExtraContent);
    assert_eq!(doc.child_nodes().length(), 1);

    let (_, errors) = parse_with(ParserMode::Xml, 0, "<!-- only a comment -->");
    assert_eq!(errors[0].code(), XmlParserErrors::XmlErrExtraContent);
}

#[test]
fn error_locations() {
    let (_, errors) = parse_with(ParserMode::Xml, 0, "<r>\n  <é>\r\n  </x></r>");
    let err = &errors[0];
    assert_eq!(err.code(), XmlParserErrors::XmlErrEndTagNotOpened);
    assert_eq!((err.line(), err.column()), (3, 3));
    assert!(err.to_string().contains("</x>"));
}

#[test]
fn abort_stops_the_parse() {
    let res = DOMParser::default()
        .with_error_handler(|err: DOMError| err.severity() == DOMErrorSeverity::SeverityWarning)
        .parse_from_string("<a><b x=1/></a>");
    match res {
        Err(ParseError::Aborted(err)) => {
            assert_eq!(err.code(), XmlParserErrors::XmlErrAttributeNotQuoted)
        }
        Ok(_) => panic!("an error must abort the parse"),
    }
}

#[test]
fn parser_is_reusable() {
    let parser = DOMParser::new(ParserMode::Xml);
    let first = parser.parse_from_string("<a/>").unwrap();
    let second = parser.parse_from_string("<b/>").unwrap();
    assert_eq!(&*first.document_element().unwrap().tag_name(), "a");
    assert_eq!(&*second.document_element().unwrap().tag_name(), "b");
}
