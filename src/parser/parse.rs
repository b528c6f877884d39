//! The parse loop.
//!
//! The input is scanned once from left to right. Text between markup is decoded and
//! buffered until the next event, start tags go through the [`Tokenizer`] and the
//! namespace resolver, and everything else is recognized here. Malformed markup
//! never stops the scan: the problem is reported to the error handler and the `<`
//! that started it is kept as text.

use std::{borrow::Cow, collections::HashMap};

use log::debug;
use memchr::{memchr, memchr_iter, memmem};

use crate::{
    chvalid::XmlCharValid,
    dom::{DOMException, XHTML_NAMESPACE},
    error::{DOMError, DOMErrorHandler, DOMErrorSeverity, ParseError, XmlParserErrors},
    parser::{
        XmlParserOption,
        entities::EntityTable,
        namespace::{NamespaceMap, ResolvedTag, resolve},
        qname::{split_qname2, validate_name},
        tokenizer::{StartTag, TagError, TagWarning, Tokenizer},
        tree_builder::ContentHandler,
    },
};

/// HTML elements that never have content.
pub(crate) const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// How the content of an HTML element is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawText {
    /// `script` and `style`: no markup, no references.
    Raw,
    /// `textarea` and `title`: no markup, references are decoded.
    Escapable,
}

struct OpenElement {
    name: String,
    /// Byte offset of the `>` ending the start tag.
    tag_end: usize,
    namespaces: NamespaceMap,
    raw_text: Option<RawText>,
}

fn local_part(qname: &str) -> &str {
    split_qname2(qname).map_or(qname, |(_, local)| local)
}

/// Replace `\r\n` and lone `\r` with `\n`.
pub(crate) fn normalize_line_endings(source: &str) -> Cow<'_, str> {
    if memchr(b'\r', source.as_bytes()).is_none() {
        return Cow::Borrowed(source);
    }
    Cow::Owned(source.replace("\r\n", "\n").replace('\r', "\n"))
}

/// A position in a text with a few helpers for reading declarations.
struct Cursor<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// Skip whitespace and tell whether there was any.
    fn skip_blanks(&mut self) -> bool {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(|c: char| c.is_xml_blank_char());
        self.pos += rest.len() - trimmed.len();
        rest.len() != trimmed.len()
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.rest().get(..keyword.len()) {
            Some(head) if head.eq_ignore_ascii_case(keyword) => {
                self.pos += keyword.len();
                true
            }
            _ => false,
        }
    }

    fn name(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !c.is_xml_name_char())
            .unwrap_or(rest.len());
        let name = &rest[..len];
        if !validate_name(name) {
            return None;
        }
        self.pos += len;
        Some(name)
    }

    fn quoted(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let quote = rest.chars().next().filter(|c| matches!(c, '"' | '\''))?;
        let len = rest[1..].find(quote)?;
        self.pos += len + 2;
        Some(&rest[1..1 + len])
    }

    /// The position of the `]` closing an internal subset that starts at the cursor.
    fn internal_subset_end(&self) -> Option<usize> {
        let bytes = self.source.as_bytes();
        let mut pos = self.pos;
        while pos < bytes.len() {
            match bytes[pos] {
                b']' => return Some(pos),
                quote @ (b'"' | b'\'') => {
                    pos += 1 + memchr(quote, &bytes[pos + 1..])?;
                }
                b'<' if bytes[pos..].starts_with(b"<!--") => {
                    pos += 4 + memmem::find(&bytes[pos + 4..], b"-->")? + 2;
                }
                _ => {}
            }
            pos += 1;
        }
        None
    }
}

struct DoctypeDecl<'a> {
    name: &'a str,
    public_id: Option<&'a str>,
    system_id: Option<&'a str>,
    internal_subset: Option<&'a str>,
    /// Byte offset right after the closing `>`.
    end: usize,
}

/// Read a DOCTYPE declaration from right after the `<!DOCTYPE` keyword.
fn read_doctype(source: &str, start: usize) -> Option<DoctypeDecl<'_>> {
    let mut cur = Cursor { source, pos: start };
    if !cur.skip_blanks() {
        return None;
    }
    let name = cur.name()?;
    cur.skip_blanks();
    let (mut public_id, mut system_id) = (None, None);
    if cur.eat_keyword("PUBLIC") {
        cur.skip_blanks();
        public_id = Some(cur.quoted()?);
        cur.skip_blanks();
        system_id = cur.quoted();
        cur.skip_blanks();
    } else if cur.eat_keyword("SYSTEM") {
        cur.skip_blanks();
        system_id = Some(cur.quoted()?);
        cur.skip_blanks();
    }
    let mut internal_subset = None;
    if cur.eat("[") {
        let end = cur.internal_subset_end()?;
        internal_subset = Some(&source[cur.pos..end]);
        cur.pos = end + 1;
        cur.skip_blanks();
    }
    if !cur.eat(">") {
        return None;
    }
    Some(DoctypeDecl {
        name,
        public_id,
        system_id,
        internal_subset,
        end: cur.pos,
    })
}

/// The state of one parse. Created per call and dropped afterwards.
pub(crate) struct ParserContext<'a, H: ContentHandler> {
    source: &'a str,
    /// ASCII-lowercased copy of `source` for case-insensitive searches in HTML mode.
    folded: Option<String>,
    pos: usize,
    html: bool,
    options: i32,
    entities: EntityTable,
    tokenizer: Tokenizer<'a>,
    handler: &'a mut H,
    errors: &'a dyn DOMErrorHandler,
    root_namespaces: NamespaceMap,
    open: Vec<OpenElement>,
    text: String,
    /// Byte offset of the first character buffered in `text`.
    text_start: usize,
    seen_root: bool,
    seen_doctype: bool,
    /// Per tag name, the position of its last end tag in the input, for the
    /// self-closing repair.
    closing_positions: HashMap<String, Option<usize>>,
    line_starts: Vec<usize>,
}

impl<'a, H: ContentHandler> ParserContext<'a, H> {
    pub(crate) fn new(
        source: &'a str,
        html: bool,
        options: i32,
        root_namespaces: NamespaceMap,
        handler: &'a mut H,
        errors: &'a dyn DOMErrorHandler,
    ) -> Self {
        #[cfg(feature = "html")]
        let entities = if html {
            EntityTable::Html
        } else {
            EntityTable::Xml
        };
        #[cfg(not(feature = "html"))]
        let entities = EntityTable::Xml;
        let recover = html || options & XmlParserOption::XmlParseRecover as i32 != 0;
        let line_starts = std::iter::once(0)
            .chain(memchr_iter(b'\n', source.as_bytes()).map(|i| i + 1))
            .collect();
        Self {
            source,
            folded: html.then(|| source.to_ascii_lowercase()),
            pos: 0,
            html,
            options,
            entities,
            tokenizer: Tokenizer::new(source, entities, recover, html),
            handler,
            errors,
            root_namespaces,
            open: vec![],
            text: String::new(),
            text_start: 0,
            seen_root: false,
            seen_doctype: false,
            closing_positions: HashMap::new(),
            line_starts,
        }
    }

    fn has_option(&self, option: XmlParserOption) -> bool {
        self.options & option as i32 != 0
    }

    /// 1-based line and column (in characters) of the byte offset `offset`.
    fn location(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line.saturating_sub(1)];
        let column = self.source[line_start..offset].chars().count();
        (line, column + 1)
    }

    fn report(
        &self,
        severity: DOMErrorSeverity,
        code: XmlParserErrors,
        offset: usize,
        message: impl Into<Cow<'static, str>>,
    ) -> Result<(), ParseError> {
        if severity == DOMErrorSeverity::SeverityWarning
            && self.has_option(XmlParserOption::XmlParseNoWarning)
        {
            return Ok(());
        }
        let (line, column) = self.location(offset);
        let err = DOMError::new(severity, code, message, line, column);
        if self.errors.handle_error(err.clone()) {
            Ok(())
        } else {
            Err(ParseError::Aborted(err))
        }
    }

    fn warning(
        &self,
        code: XmlParserErrors,
        offset: usize,
        message: impl Into<Cow<'static, str>>,
    ) -> Result<(), ParseError> {
        self.report(DOMErrorSeverity::SeverityWarning, code, offset, message)
    }

    fn error(
        &self,
        code: XmlParserErrors,
        offset: usize,
        message: impl Into<Cow<'static, str>>,
    ) -> Result<(), ParseError> {
        self.report(DOMErrorSeverity::SeverityError, code, offset, message)
    }

    fn fatal(
        &self,
        code: XmlParserErrors,
        offset: usize,
        message: impl Into<Cow<'static, str>>,
    ) -> Result<(), ParseError> {
        self.report(DOMErrorSeverity::SeverityFatalError, code, offset, message)
    }

    /// Report a node the content handler refused. The node is lost, parsing goes on.
    fn handled(&self, offset: usize, res: Result<(), DOMException>) -> Result<(), ParseError> {
        match res {
            Ok(()) => Ok(()),
            Err(err) => self.error(
                XmlParserErrors::XmlErrInternalError,
                offset,
                format!("the document rejected a node: {err}"),
            ),
        }
    }

    pub(crate) fn run(mut self) -> Result<(), ParseError> {
        self.handler.start_document();
        if self.source.starts_with('\u{FEFF}') {
            self.pos = '\u{FEFF}'.len_utf8();
        }
        self.xml_declaration()?;

        while self.pos < self.source.len() {
            if let Some(kind) = self.open.last().and_then(|elem| elem.raw_text) {
                self.raw_text(kind)?;
                continue;
            }
            match memchr(b'<', &self.source.as_bytes()[self.pos..]) {
                Some(0) => self.markup()?,
                Some(len) => self.text_run(self.pos + len)?,
                None => self.text_run(self.source.len())?,
            }
        }

        self.flush_text()?;
        let end = self.source.len();
        while let Some(elem) = self.open.pop() {
            if self.repairable(&elem) {
                debug!("no end tag follows <{}>, closing it in place", elem.name);
                self.warning(
                    XmlParserErrors::XmlWarSelfClosingRepair,
                    elem.tag_end,
                    format!("element '{}' has no end tag and is closed in place", elem.name),
                )?;
                let res = self.handler.close_in_place(&elem.name);
                self.handled(end, res)?;
                continue;
            }
            self.error(
                XmlParserErrors::XmlErrElementNotClosed,
                end,
                format!("element '{}' is not closed", elem.name),
            )?;
            let res = self.handler.end_element(&elem.name);
            self.handled(end, res)?;
        }
        if !self.seen_root {
            self.error(
                XmlParserErrors::XmlErrExtraContent,
                end,
                "the document has no document element",
            )?;
        }
        self.handler.end_document();
        Ok(())
    }

    fn push_text(&mut self, offset: usize, text: &str) {
        if self.text.is_empty() {
            self.text_start = offset;
        }
        self.text.push_str(text);
    }

    /// Hand the buffered text to the content handler.
    fn flush_text(&mut self) -> Result<(), ParseError> {
        if self.text.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.text);
        let blank = text.chars().all(|c| c.is_xml_blank_char());
        if self.open.is_empty() {
            if !blank {
                self.error(
                    XmlParserErrors::XmlErrTextOutsideRoot,
                    self.text_start,
                    "text outside the document element is dropped",
                )?;
            }
            return Ok(());
        }
        if blank && self.has_option(XmlParserOption::XmlParseNoBlanks) {
            return Ok(());
        }
        let res = self.handler.characters(&text);
        self.handled(self.text_start, res)
    }

    /// Decode and buffer the text in `self.pos..end`.
    fn text_run(&mut self, end: usize) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let mut issues = vec![];
        let decoded = self
            .entities
            .decode(&source[start..end], |offset, issue| {
                issues.push((start + offset, issue))
            });
        self.push_text(start, &decoded);
        self.pos = end;
        for (offset, issue) in issues {
            let warning = TagWarning::Entity(issue);
            self.warning(warning.code(), offset, warning.to_string())?;
        }
        Ok(())
    }

    /// Keep the `<` at the current position as text after reporting why it
    /// does not start markup.
    fn stray(
        &mut self,
        code: XmlParserErrors,
        message: impl Into<Cow<'static, str>>,
    ) -> Result<(), ParseError> {
        self.error(code, self.pos, message)?;
        self.push_text(self.pos, "<");
        self.pos += 1;
        Ok(())
    }

    fn markup(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let rest = &source[self.pos..];
        if rest.starts_with("</") {
            self.end_tag()
        } else if rest.starts_with("<?") {
            self.processing_instruction()
        } else if rest.starts_with("<!--") {
            self.comment()
        } else if rest.starts_with("<![CDATA[") {
            self.cdata()
        } else if rest
            .get(..9)
            .is_some_and(|head| head.eq_ignore_ascii_case("<!DOCTYPE"))
        {
            self.doctype()
        } else if rest.starts_with("<!") {
            self.stray(
                XmlParserErrors::XmlErrInvalidName,
                "unknown markup declaration",
            )
        } else {
            self.start_tag()
        }
    }

    /// Read the `<?xml ...?>` declaration if the input starts with one.
    fn xml_declaration(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let rest = &source[start..];
        let is_decl = rest
            .strip_prefix("<?xml")
            .is_some_and(|tail| tail.starts_with(|c: char| c.is_xml_blank_char() || c == '?'));
        if !is_decl {
            return Ok(());
        }
        // an unterminated declaration is reported by the processing instruction branch
        let Some(len) = memmem::find(rest.as_bytes(), b"?>") else {
            return Ok(());
        };
        self.pos = start + len + 2;

        let mut cur = Cursor {
            source: &rest[..len],
            pos: 5,
        };
        let (mut version, mut encoding, mut standalone) = (None, None, None);
        let mut problem = None;
        while problem.is_none() {
            let separated = cur.skip_blanks();
            if cur.rest().is_empty() {
                break;
            }
            let Some(name) = cur.name().filter(|_| separated) else {
                problem = Some("malformed XML declaration".to_owned());
                break;
            };
            cur.skip_blanks();
            let eq = cur.eat("=");
            cur.skip_blanks();
            let Some(value) = cur.quoted().filter(|_| eq) else {
                problem = Some(format!("'{name}' in the XML declaration has no quoted value"));
                break;
            };
            match name {
                "version" => version = Some(value),
                "encoding" => encoding = Some(value),
                "standalone" => match value {
                    "yes" => standalone = Some(true),
                    "no" => standalone = Some(false),
                    _ => problem = Some(format!("standalone accepts 'yes' or 'no', not '{value}'")),
                },
                _ => problem = Some(format!("unknown '{name}' in the XML declaration")),
            }
        }
        if let Some(problem) = problem {
            self.error(XmlParserErrors::XmlErrXMLDeclNotFinished, start, problem)?;
        }
        self.handler
            .xml_declaration(version.unwrap_or("1.0"), encoding, standalone);
        Ok(())
    }

    fn start_tag(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let (tag, next) = match self.tokenizer.start_tag(start + 1) {
            Ok(tag) => {
                let next = tag.end + 1;
                (tag, next)
            }
            Err(TagError::UnexpectedEof {
                partial: Some(name),
            }) => {
                self.error(
                    XmlParserErrors::XmlErrTagNotFinished,
                    start,
                    format!("input ends inside start tag '{name}'"),
                )?;
                let end = self.source.len();
                let tag = StartTag {
                    name,
                    attributes: vec![],
                    self_closing: true,
                    end,
                    warnings: vec![],
                };
                (tag, end)
            }
            Err(err) => return self.stray(err.code(), err.to_string()),
        };
        for (offset, warning) in &tag.warnings {
            self.warning(warning.code(), *offset, warning.to_string())?;
        }
        if self.open.is_empty() && self.seen_root {
            self.pos = next;
            return self.error(
                XmlParserErrors::XmlErrExtraContent,
                start,
                format!("element '{}' after the document element is dropped", tag.name),
            );
        }

        self.flush_text()?;
        let parent = self
            .open
            .last()
            .map_or(&self.root_namespaces, |elem| &elem.namespaces);
        let resolved = resolve(parent, &tag);
        for prefix in &resolved.undeclared {
            self.warning(
                XmlParserErrors::XmlNsErrUndefinedNamespace,
                start,
                format!("namespace prefix '{prefix}' is not declared"),
            )?;
        }
        let self_closing = tag.self_closing || self.is_void(&tag.name, &resolved);
        self.pos = next;
        let res = self.handler.start_element(&tag, &resolved);
        if res.is_err() {
            return self.handled(start, res);
        }
        self.seen_root = true;
        if self_closing {
            let res = self.handler.end_element(&tag.name);
            return self.handled(start, res);
        }
        let raw_text = self.raw_text_kind(&tag.name, &resolved);
        self.open.push(OpenElement {
            name: tag.name,
            tag_end: tag.end,
            namespaces: resolved.namespaces,
            raw_text,
        });
        Ok(())
    }

    fn raw_text_kind(&self, name: &str, resolved: &ResolvedTag) -> Option<RawText> {
        if !self.html || resolved.namespace_uri.as_deref() != Some(XHTML_NAMESPACE) {
            return None;
        }
        match local_part(name).to_ascii_lowercase().as_str() {
            "script" | "style" => Some(RawText::Raw),
            "textarea" | "title" => Some(RawText::Escapable),
            _ => None,
        }
    }

    /// HTML void elements never have content, whether or not they end with `/>`.
    fn is_void(&self, name: &str, resolved: &ResolvedTag) -> bool {
        let local = local_part(name);
        self.html
            && resolved.namespace_uri.as_deref() == Some(XHTML_NAMESPACE)
            && HTML_VOID_ELEMENTS
                .iter()
                .any(|void| void.eq_ignore_ascii_case(local))
    }

    /// Check if the unclosed `elem` can be closed in place at the end of the input.
    ///
    /// That is the case when no end tag for its name follows its start tag anywhere
    /// in the input. The document element is never repaired.
    fn repairable(&mut self, elem: &OpenElement) -> bool {
        !self.open.is_empty()
            && !self.has_option(XmlParserOption::XmlParseNoRepair)
            && !self
                .closing_position(&elem.name)
                .is_some_and(|pos| pos > elem.tag_end)
    }

    /// The offset of the last `</name>` (or `</name` if there is none) in the input.
    fn closing_position(&mut self, name: &str) -> Option<usize> {
        if let Some(&pos) = self.closing_positions.get(name) {
            return pos;
        }
        let (haystack, needle) = match &self.folded {
            Some(folded) => (folded.as_str(), format!("</{}", name.to_ascii_lowercase())),
            None => (self.source, format!("</{name}")),
        };
        let pos = haystack
            .rfind(&format!("{needle}>"))
            .or_else(|| haystack.rfind(&needle));
        self.closing_positions.insert(name.to_owned(), pos);
        pos
    }

    /// Read the content of an HTML raw text element up to its end tag.
    fn raw_text(&mut self, kind: RawText) -> Result<(), ParseError> {
        let start = self.pos;
        let Some(elem) = self.open.last() else {
            return Ok(());
        };
        let needle = format!("</{}", local_part(&elem.name).to_ascii_lowercase());
        let haystack = self.folded.as_deref().unwrap_or(self.source);
        // `</scripts>` does not close `script`
        let close = memmem::find_iter(&haystack.as_bytes()[start..], needle.as_bytes())
            .map(|len| start + len)
            .find(|&pos| {
                matches!(
                    haystack.as_bytes().get(pos + needle.len()),
                    Some(b'>' | b' ' | b'\t' | b'\n' | b'\r')
                )
            });
        let end = close.unwrap_or(self.source.len());
        match kind {
            RawText::Raw => {
                let source = self.source;
                self.push_text(start, &source[start..end]);
                self.pos = end;
            }
            RawText::Escapable => self.text_run(end)?,
        }
        match close {
            Some(_) => self.end_tag(),
            None => Ok(()),
        }
    }

    fn end_tag(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let Some(len) = memchr(b'>', &source.as_bytes()[start + 2..]) else {
            return self.stray(
                XmlParserErrors::XmlErrTagNotFinished,
                "end tag is not terminated",
            );
        };
        let end = start + 2 + len;
        let name = source[start + 2..end].trim_end_matches(|c: char| c.is_xml_blank_char());
        if !validate_name(name) {
            return self.stray(
                XmlParserErrors::XmlErrInvalidName,
                format!("invalid end tag '{}'", &source[start..=end]),
            );
        }
        self.flush_text()?;
        self.pos = end + 1;

        let matches = |elem: &OpenElement| elem.name == name || elem.name.eq_ignore_ascii_case(name);
        let depth = match self.open.last() {
            Some(top) if matches(top) => self.open.len() - 1,
            _ => match self.open.iter().rposition(matches) {
                Some(depth) => depth,
                None => {
                    return self.error(
                        XmlParserErrors::XmlErrEndTagNotOpened,
                        start,
                        format!("end tag '</{name}>' has no open element"),
                    );
                }
            },
        };
        while self.open.len() > depth + 1 {
            let Some(elem) = self.open.pop() else {
                break;
            };
            self.fatal(
                XmlParserErrors::XmlErrTagNameMismatch,
                start,
                format!("element '{}' is closed by '</{name}>'", elem.name),
            )?;
            let res = self.handler.end_element(&elem.name);
            self.handled(start, res)?;
        }
        let Some(elem) = self.open.pop() else {
            return Ok(());
        };
        if elem.name != name {
            self.fatal(
                XmlParserErrors::XmlErrTagNameMismatch,
                start,
                format!("end tag '</{name}>' does not match '<{}>'", elem.name),
            )?;
        }
        let res = self.handler.end_element(&elem.name);
        self.handled(start, res)
    }

    fn processing_instruction(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let Some(len) = memmem::find(&source.as_bytes()[start + 2..], b"?>") else {
            return self.stray(
                XmlParserErrors::XmlErrPINotFinished,
                "processing instruction is not terminated",
            );
        };
        let end = start + 2 + len;
        let body = &source[start + 2..end];
        let (target, data) = match body.find(|c: char| c.is_xml_blank_char()) {
            Some(i) => (
                &body[..i],
                body[i..].trim_start_matches(|c: char| c.is_xml_blank_char()),
            ),
            None => (body, ""),
        };
        self.pos = end + 2;
        if target.eq_ignore_ascii_case("xml") {
            return self.error(
                XmlParserErrors::XmlErrMisplacedXmlDecl,
                start,
                "the XML declaration is only allowed at the start of the document",
            );
        }
        if !validate_name(target) {
            return self.error(
                XmlParserErrors::XmlErrInvalidName,
                start,
                format!("invalid processing instruction target '{target}'"),
            );
        }
        self.flush_text()?;
        let res = self.handler.processing_instruction(target, data);
        self.handled(start, res)
    }

    fn comment(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let Some(len) = memmem::find(&source.as_bytes()[start + 4..], b"-->") else {
            return self.stray(
                XmlParserErrors::XmlErrCommentNotFinished,
                "comment is not terminated",
            );
        };
        let end = start + 4 + len;
        self.pos = end + 3;
        self.flush_text()?;
        let res = self.handler.comment(&source[start + 4..end]);
        self.handled(start, res)
    }

    fn cdata(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let Some(len) = memmem::find(&source.as_bytes()[start + 9..], b"]]>") else {
            return self.stray(
                XmlParserErrors::XmlErrCDATANotFinished,
                "CDATA section is not terminated",
            );
        };
        let end = start + 9 + len;
        let content = &source[start + 9..end];
        self.pos = end + 3;
        // outside the document element the content is reported as stray text
        if self.open.is_empty() || self.has_option(XmlParserOption::XmlParseNoCDATA) {
            self.push_text(start + 9, content);
            return Ok(());
        }
        self.flush_text()?;
        let res = self.handler.cdata(content);
        self.handled(start, res)
    }

    fn doctype(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let Some(decl) = read_doctype(source, start + 9) else {
            self.pos = memchr(b'>', &source.as_bytes()[start..])
                .map_or(source.len(), |len| start + len + 1);
            return self.error(
                XmlParserErrors::XmlErrDoctypeNotFinished,
                start,
                "malformed DOCTYPE declaration",
            );
        };
        self.pos = decl.end;
        if self.seen_root || self.seen_doctype || !self.open.is_empty() {
            return self.error(
                XmlParserErrors::XmlErrExtraContent,
                start,
                "a DOCTYPE declaration is only allowed once, before the document element",
            );
        }
        self.seen_doctype = true;
        self.flush_text()?;
        let res = self.handler.doctype(
            decl.name,
            decl.public_id,
            decl.system_id,
            decl.internal_subset,
        );
        self.handled(start, res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_endings() {
        assert!(matches!(normalize_line_endings("a\nb"), Cow::Borrowed(_)));
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn doctype_declarations() {
        let src = "<!DOCTYPE html>";
        let decl = read_doctype(src, 9).unwrap();
        assert_eq!(decl.name, "html");
        assert!(decl.public_id.is_none() && decl.system_id.is_none());
        assert_eq!(decl.end, src.len());

        let src = r#"<!doctype svg PUBLIC "-//W3C//DTD SVG 1.1//EN" 'svg11.dtd' [ <!ENTITY a "]"> <!-- ] --> ]>"#;
        let decl = read_doctype(src, 9).unwrap();
        assert_eq!(decl.public_id, Some("-//W3C//DTD SVG 1.1//EN"));
        assert_eq!(decl.system_id, Some("svg11.dtd"));
        assert_eq!(
            decl.internal_subset,
            Some(r#" <!ENTITY a "]"> <!-- ] --> "#)
        );

        assert!(read_doctype("<!DOCTYPEhtml>", 9).is_none());
        assert!(read_doctype("<!DOCTYPE html SYSTEM>", 9).is_none());
        assert!(read_doctype("<!DOCTYPE html", 9).is_none());
    }
}
