use xmldom::{
    dom::{document::DocumentRef, node::Node},
    parser::{parse_html, parse_xml},
    save::{XmlSaveOption, XmlSerializer, serialize},
};

#[test]
fn prefix_is_declared_on_the_root_only() {
    let doc = parse_xml(r#"<a:root xmlns:a="urn:x"><a:child/></a:root>"#).unwrap();
    let out = serialize(&doc.into());
    assert_eq!(out, r#"<a:root xmlns:a="urn:x"><a:child/></a:root>"#);
    assert_eq!(out.matches(r#"xmlns:a="urn:x""#).count(), 1);
}

#[test]
fn redeclared_prefix_is_written_where_it_changes() {
    let src = r#"<p:a xmlns:p="urn:1"><p:b xmlns:p="urn:2"><p:c/></p:b><p:d/></p:a>"#;
    let doc = parse_xml(src).unwrap();
    assert_eq!(serialize(&doc.into()), src);
}

#[test]
fn built_tree_gets_declarations() {
    let doc = DocumentRef::new();
    let mut root = doc.create_element_ns(Some("urn:x"), "x:list").unwrap();
    for i in 0..3 {
        let mut item = doc.create_element_ns(Some("urn:x"), "x:item").unwrap();
        item.set_attribute("n", &i.to_string()).unwrap();
        root.append_child(item.into()).unwrap();
    }
    let out = serialize(&root.into());
    assert_eq!(out.matches("xmlns:x").count(), 1);
    assert!(out.starts_with(r#"<x:list xmlns:x="urn:x"><x:item n="0"/>"#));

    // the result parses back without namespace errors
    let reparsed = parse_xml(&out).unwrap();
    let list = reparsed.document_element().unwrap();
    assert_eq!(list.namespace_uri().as_deref(), Some("urn:x"));
    assert_eq!(
        list.last_child().unwrap().namespace_uri().as_deref(),
        Some("urn:x")
    );
}

#[test]
fn entities_are_escaped_again() {
    let doc = parse_xml(r#"<r a="&lt;&amp;&quot;">x &gt; y &#38; z</r>"#).unwrap();
    assert_eq!(
        serialize(&doc.into()),
        r#"<r a="&lt;&amp;&quot;">x &gt; y &amp; z</r>"#
    );
}

#[test]
fn html_document() {
    let doc = parse_html("<!DOCTYPE html><html><head><meta charset=utf-8></head><body><p>a<br>b</p></body></html>")
        .unwrap();
    let out = XmlSerializer::new().serialize_to_string(&doc.clone().into());
    assert_eq!(
        out,
        concat!(
            "<!DOCTYPE html>\n",
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><head><meta charset="utf-8"/></head>"#,
            "<body><p>a<br/>b</p></body></html>"
        )
    );

    let as_html = XmlSerializer::new()
        .with_options(XmlSaveOption::XmlSaveAsHtml as i32)
        .serialize_to_string(&parse_xml("<r><e/><br/></r>").unwrap().into());
    assert_eq!(as_html, "<r><e></e><br/></r>");
}

#[test]
fn declaration_options() {
    let doc = parse_xml(r#"<?xml version="1.0" standalone="yes"?><r/>"#).unwrap();
    assert_eq!(
        serialize(&doc.clone().into()),
        "<?xml version=\"1.0\" standalone=\"yes\"?>\n<r/>"
    );
    let out = XmlSerializer::new()
        .with_options(XmlSaveOption::XmlSaveNoDecl as i32 | XmlSaveOption::XmlSaveNoEmpty as i32)
        .serialize_to_string(&doc.into());
    assert_eq!(out, "<r></r>");
}

#[test]
fn attribute_prefix_taken_by_the_element() {
    let doc = DocumentRef::new();
    let mut e = doc.create_element_ns(Some("urn:1"), "p:e").unwrap();
    e.set_attribute_ns(Some("urn:2"), "p:a", "v").unwrap();
    e.set_attribute_ns(Some("urn:3"), "p:b", "w").unwrap();
    let out = serialize(&e.into());
    assert_eq!(
        out,
        r#"<p:e xmlns:p="urn:1" xmlns:ns1="urn:2" ns1:a="v" xmlns:ns2="urn:3" ns2:b="w"/>"#
    );

    let reparsed = parse_xml(&out).unwrap().document_element().unwrap();
    assert_eq!(reparsed.namespace_uri().as_deref(), Some("urn:1"));
    assert_eq!(reparsed.get_attribute_ns(Some("urn:2"), "a"), "v");
    assert_eq!(reparsed.get_attribute_ns(Some("urn:3"), "b"), "w");
}

#[test]
fn unprefixed_namespaced_attribute() {
    let doc = DocumentRef::new();
    let mut e = doc.create_element("e").unwrap();
    e.set_attribute_ns(Some("urn:2"), "a", "v").unwrap();
    let mut root = doc.create_element_ns(Some("urn:2"), "q:root").unwrap();
    root.append_child(e.clone().into()).unwrap();

    assert_eq!(
        serialize(&e.into()),
        r#"<e xmlns:ns1="urn:2" ns1:a="v"/>"#
    );
    // a prefix in scope for the same URI is reused
    let out = serialize(&root.into());
    assert_eq!(out, r#"<q:root xmlns:q="urn:2"><e q:a="v"/></q:root>"#);

    let reparsed = parse_xml(&out).unwrap();
    let e = reparsed.document_element().unwrap().first_child().unwrap();
    assert_eq!(e.namespace_uri(), None);
    assert_eq!(
        e.as_element().unwrap().get_attribute_ns(Some("urn:2"), "a"),
        "v"
    );
}
