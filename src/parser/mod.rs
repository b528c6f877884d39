//! Parsing XML and HTML-like markup into a [`DocumentRef`].
//!
//! The parser is tolerant: malformed input is reported through a
//! [`DOMErrorHandler`] and parsing continues. Only the error handler can stop a
//! parse, by returning `false`.
//!
//! ```
//! use xmldom::{dom::node::Node, parser::{DOMParser, ParserMode}};
//!
//! let parser = DOMParser::new(ParserMode::Html);
//! let doc = parser.parse_from_string("<p class=intro>Hello &amp; welcome").unwrap();
//! let p = doc.document_element().unwrap();
//! assert_eq!(p.get_attribute("class"), "intro");
//! assert_eq!(p.text_content().as_deref(), Some("Hello & welcome"));
//! ```

pub mod entities;
pub mod namespace;
mod parse;
pub mod qname;
pub mod tokenizer;
pub mod tree_builder;

use std::rc::Rc;

use log::debug;

use crate::{
    dom::document::DocumentRef,
    error::{DOMErrorHandler, DefaultErrorHandler, ParseError},
};

use namespace::NamespaceMap;
use parse::{ParserContext, normalize_line_endings};
use tree_builder::TreeBuilder;

pub(crate) use parse::HTML_VOID_ELEMENTS;

/// The set of parser options that can be passed to [`DOMParser::with_options`].
///
/// Options are combined as bit flags:
/// `XmlParserOption::XmlParseRecover as i32 | XmlParserOption::XmlParseNoBlanks as i32`.
#[doc(alias = "xmlParserOption")]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlParserOption {
    /// Accept unquoted values, bare attribute names and missing whitespace between
    /// attributes in XML mode. Always enabled in HTML mode.
    XmlParseRecover = 1 << 0,
    /// Suppress warnings.
    XmlParseNoWarning = 1 << 6,
    /// Drop text nodes that contain only whitespace.
    XmlParseNoBlanks = 1 << 8,
    /// Merge CDATA sections into the surrounding text.
    XmlParseNoCDATA = 1 << 14,
    /// Never close a start tag in place because no end tag for it follows.
    XmlParseNoRepair = 1 << 24,
}

/// The kind of markup being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserMode {
    /// The five predefined entities, no default namespace, strict attributes.
    #[default]
    Xml,
    /// HTML entities, the XHTML namespace as default namespace, tolerant
    /// attributes and raw text content for `script`, `style`, `textarea` and `title`.
    Html,
}

impl TryFrom<&str> for ParserMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "xml" | "application/xml" | "text/xml" | "application/xhtml+xml" => Ok(Self::Xml),
            "html" | "text/html" => Ok(Self::Html),
            _ => Err(anyhow::anyhow!(
                "Invalid convert from value '{value}' to {}",
                std::any::type_name::<Self>()
            )),
        }
    }
}

/// Parses strings into documents.
///
/// A `DOMParser` only holds configuration. Every call to
/// [`parse_from_string`](DOMParser::parse_from_string) creates its own parse state,
/// so one parser can be reused for any number of documents.
#[derive(Clone)]
pub struct DOMParser {
    mode: ParserMode,
    options: i32,
    error_handler: Rc<dyn DOMErrorHandler>,
    default_namespace: Option<String>,
}

impl DOMParser {
    pub fn new(mode: ParserMode) -> Self {
        Self {
            mode,
            options: 0,
            error_handler: Rc::new(DefaultErrorHandler),
            default_namespace: None,
        }
    }

    /// Replace the options with `options`, a combination of [`XmlParserOption`] flags.
    pub fn with_options(mut self, options: i32) -> Self {
        self.options = options;
        self
    }

    /// Deliver diagnostics to `handler` instead of the `log` facade.
    pub fn with_error_handler(mut self, handler: impl DOMErrorHandler + 'static) -> Self {
        self.error_handler = Rc::new(handler);
        self
    }

    /// Bind the empty prefix to `uri` for the whole document.
    ///
    /// In HTML mode this replaces the XHTML namespace.
    pub fn with_default_namespace(mut self, uri: impl Into<String>) -> Self {
        self.default_namespace = Some(uri.into());
        self
    }

    pub fn mode(&self) -> ParserMode {
        self.mode
    }

    pub fn options(&self) -> i32 {
        self.options
    }

    /// Parse `source` into a new document.
    ///
    /// # Errors
    /// [`ParseError::Aborted`] if the error handler returned `false`.
    pub fn parse_from_string(&self, source: &str) -> Result<DocumentRef, ParseError> {
        let source = normalize_line_endings(source);
        let html = self.mode == ParserMode::Html;
        let (document, mut namespaces) = if html {
            (DocumentRef::new_html(), NamespaceMap::html())
        } else {
            (DocumentRef::new(), NamespaceMap::new())
        };
        if let Some(uri) = self.default_namespace.as_deref() {
            namespaces.declare("", uri);
        }
        debug!(
            "parse {} bytes as {:?} with options {:#x}",
            source.len(),
            self.mode,
            self.options
        );
        let mut builder = TreeBuilder::new(document);
        ParserContext::new(
            &source,
            html,
            self.options,
            namespaces,
            &mut builder,
            &*self.error_handler,
        )
        .run()?;
        Ok(builder.into_document())
    }
}

impl Default for DOMParser {
    fn default() -> Self {
        Self::new(ParserMode::Xml)
    }
}

/// Parse `source` as XML, logging diagnostics.
pub fn parse_xml(source: &str) -> Result<DocumentRef, ParseError> {
    DOMParser::new(ParserMode::Xml).parse_from_string(source)
}

/// Parse `source` as HTML, logging diagnostics.
pub fn parse_html(source: &str) -> Result<DocumentRef, ParseError> {
    DOMParser::new(ParserMode::Html).parse_from_string(source)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use crate::{
        dom::{XHTML_NAMESPACE, node::Node, node_list::NodeList},
        error::{DOMError, DOMErrorSeverity, XmlParserErrors},
    };

    use super::*;

    fn collect(mode: ParserMode, options: i32, src: &str) -> (DocumentRef, Vec<DOMError>) {
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

    #[test]
    fn mode_from_str() {
        assert_eq!(ParserMode::try_from("xml").unwrap(), ParserMode::Xml);
        assert_eq!(ParserMode::try_from("text/html").unwrap(), ParserMode::Html);
        assert_eq!(
            ParserMode::try_from("application/xhtml+xml").unwrap(),
            ParserMode::Xml
        );
        assert!(ParserMode::try_from("image/svg").is_err());
    }

    #[test]
    fn abort_from_handler() {
        let res = DOMParser::default()
            .with_error_handler(|err: DOMError| err.severity() != DOMErrorSeverity::SeverityFatalError)
            .parse_from_string("<div><span></div>");
        let Err(ParseError::Aborted(err)) = res else {
            panic!("the parse must stop at the mismatch");
        };
        assert_eq!(err.code(), XmlParserErrors::XmlErrTagNameMismatch);
        assert_eq!((err.line(), err.column()), (1, 12));
    }

    #[test]
    fn options() {
        let src = "<a> <b><![CDATA[x]]>y</b> </a>";
        let (doc, _) = collect(ParserMode::Xml, 0, src);
        let root = doc.document_element().unwrap();
        assert_eq!(root.child_nodes().length(), 3);

        let (doc, _) = collect(
            ParserMode::Xml,
            XmlParserOption::XmlParseNoBlanks as i32 | XmlParserOption::XmlParseNoCDATA as i32,
            src,
        );
        let root = doc.document_element().unwrap();
        assert_eq!(root.child_nodes().length(), 1);
        let b = root.first_child().unwrap();
        assert_eq!(b.child_nodes().length(), 1);
        assert_eq!(b.text_content().as_deref(), Some("xy"));

        let (_, errors) = collect(ParserMode::Xml, 0, "<a><b x=1></b></a>");
        assert_eq!(errors[0].code(), XmlParserErrors::XmlErrAttributeNotQuoted);
        assert_eq!(errors[0].severity(), DOMErrorSeverity::SeverityError);
        let (doc, errors) = collect(
            ParserMode::Xml,
            XmlParserOption::XmlParseRecover as i32 | XmlParserOption::XmlParseNoWarning as i32,
            "<a><b x=1></b></a>",
        );
        assert!(errors.is_empty());
        let b = doc.document_element().unwrap().first_child().unwrap();
        assert_eq!(b.as_element().unwrap().get_attribute("x"), "1");
    }

    #[test]
    fn default_namespace() {
        let (doc, _) = collect(ParserMode::Html, 0, "<p>x</p>");
        let p = doc.document_element().unwrap();
        assert_eq!(p.namespace_uri().as_deref(), Some(XHTML_NAMESPACE));

        let doc = DOMParser::default()
            .with_default_namespace("urn:d")
            .parse_from_string("<p/>")
            .unwrap();
        let p = doc.document_element().unwrap();
        assert_eq!(p.namespace_uri().as_deref(), Some("urn:d"));
        assert_eq!(p.lookup_namespace_uri(None).as_deref(), Some("urn:d"));
    }
}
