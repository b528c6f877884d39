//! The start-tag tokenizer.
//!
//! [`Tokenizer::start_tag`] reads `name attr="value" ... >` from the position right
//! after `<` and stops at the closing `>`. It is a state machine over character
//! classes; every other kind of markup is recognized by the parse loop before the
//! tokenizer is called.

use std::fmt;

use memchr::memchr;

use crate::{
    chvalid::XmlCharValid,
    error::XmlParserErrors,
    parser::entities::{EntityIssue, EntityTable},
};

/// One attribute as written in the source, with its value normalized and decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    pub qname: String,
    pub value: String,
    /// Byte offset of the attribute name.
    pub offset: usize,
}

/// A fully read start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<RawAttribute>,
    /// The tag ended with `/>`.
    pub self_closing: bool,
    /// Byte offset of the closing `>`.
    pub end: usize,
    /// Recoveries applied while reading the tag, with their byte offsets.
    pub warnings: Vec<(usize, TagWarning)>,
}

/// Malformed input the tokenizer accepted anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagWarning {
    /// `name=value`
    UnquotedValue(String),
    /// `name` alone, read as `name="name"`.
    BareAttribute(String),
    /// `name=` directly followed by `>`, read as `name=""`.
    MissingValue(String),
    /// `a="1"b="2"`
    MissingSpace,
    /// A second attribute with the same name. The first one is kept.
    Redefined(String),
    /// A reference in an attribute value that could not be decoded.
    Entity(EntityIssue),
}

impl TagWarning {
    pub fn code(&self) -> XmlParserErrors {
        match self {
            Self::UnquotedValue(_) => XmlParserErrors::XmlErrAttributeNotQuoted,
            Self::BareAttribute(_) | Self::MissingValue(_) => {
                XmlParserErrors::XmlErrAttributeWithoutValue
            }
            Self::MissingSpace => XmlParserErrors::XmlErrSpaceRequired,
            Self::Redefined(_) => XmlParserErrors::XmlErrAttributeRedefined,
            Self::Entity(EntityIssue::Undeclared(_)) => XmlParserErrors::XmlErrUndeclaredEntity,
            Self::Entity(EntityIssue::InvalidCharRef(_)) => XmlParserErrors::XmlErrInvalidCharRef,
        }
    }
}

impl fmt::Display for TagWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnquotedValue(name) => write!(f, "value of attribute '{name}' is not quoted"),
            Self::BareAttribute(name) => write!(f, "attribute '{name}' has no value"),
            Self::MissingValue(name) => write!(f, "attribute '{name}' has an empty value"),
            Self::MissingSpace => write!(f, "attributes are not separated by whitespace"),
            Self::Redefined(name) => write!(f, "attribute '{name}' is redefined"),
            Self::Entity(EntityIssue::Undeclared(name)) => {
                write!(f, "entity '{name}' is not defined")
            }
            Self::Entity(EntityIssue::InvalidCharRef(body)) => {
                write!(f, "'&{body};' is not a valid character reference")
            }
        }
    }
}

/// Start tags the tokenizer cannot read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// A quoted attribute value runs to the end of the input.
    UnterminatedQuote,
    /// A tag or attribute name is missing or contains a character not allowed in names.
    InvalidName,
    /// `=` outside of an attribute.
    MisplacedEquals,
    /// `/` not followed by `>`.
    MisplacedSlash,
    /// `name=` directly followed by `>`.
    MissingValue,
    /// `name=value` without quotes.
    UnquotedValue,
    /// An attribute without `=value`.
    BareAttribute,
    /// An attribute directly follows a quoted value.
    MissingSpace,
    /// The input ends inside the tag. `partial` is the tag name, if one was read.
    UnexpectedEof { partial: Option<String> },
}

impl TagError {
    pub fn code(&self) -> XmlParserErrors {
        match self {
            Self::UnterminatedQuote => XmlParserErrors::XmlErrAttributeUnterminated,
            Self::InvalidName => XmlParserErrors::XmlErrInvalidName,
            Self::MisplacedEquals => XmlParserErrors::XmlErrMisplacedEquals,
            Self::MisplacedSlash => XmlParserErrors::XmlErrMisplacedSlash,
            Self::MissingValue | Self::BareAttribute => {
                XmlParserErrors::XmlErrAttributeWithoutValue
            }
            Self::UnquotedValue => XmlParserErrors::XmlErrAttributeNotQuoted,
            Self::MissingSpace => XmlParserErrors::XmlErrSpaceRequired,
            Self::UnexpectedEof { .. } => XmlParserErrors::XmlErrTagNotFinished,
        }
    }
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedQuote => write!(f, "attribute value is not terminated"),
            Self::InvalidName => write!(f, "invalid tag or attribute name"),
            Self::MisplacedEquals => write!(f, "unexpected '=' in tag"),
            Self::MisplacedSlash => write!(f, "'/' must be followed by '>'"),
            Self::MissingValue => write!(f, "attribute value is missing"),
            Self::UnquotedValue => write!(f, "attribute value must be quoted"),
            Self::BareAttribute => write!(f, "attribute has no value"),
            Self::MissingSpace => write!(f, "whitespace is required between attributes"),
            Self::UnexpectedEof { partial: Some(name) } => {
                write!(f, "input ends inside start tag '{name}'")
            }
            Self::UnexpectedEof { partial: None } => write!(f, "input ends inside a start tag"),
        }
    }
}

impl std::error::Error for TagError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    TagName,
    AttrName,
    AttrNameTrailingSpace,
    Equals,
    UnquotedValue,
    QuotedValueEnd,
    TagTrailingSpace,
    SelfClosing,
}

/// Reads start tags out of one source text.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer<'a> {
    source: &'a str,
    entities: EntityTable,
    recover: bool,
    html: bool,
}

impl<'a> Tokenizer<'a> {
    /// `recover` enables the recovery rules for unquoted values, bare attributes and
    /// missing whitespace. `html` additionally accepts the boolean attributes
    /// `disabled`, `checked` and `selected` without a warning.
    pub fn new(source: &'a str, entities: EntityTable, recover: bool, html: bool) -> Self {
        Self {
            source,
            entities,
            recover,
            html,
        }
    }

    /// Read the start tag whose name begins at `start`.
    pub fn start_tag(&self, start: usize) -> Result<StartTag, TagError> {
        let src = self.source;
        let mut tag = StartTag {
            name: String::new(),
            attributes: vec![],
            self_closing: false,
            end: start,
            warnings: vec![],
        };
        let mut state = State::TagName;
        let mut pos = start;
        // byte range of the attribute name being read
        let mut attr_start = start;
        let mut attr_end = start;
        let mut value_start = start;

        while let Some(c) = src[pos..].chars().next() {
            let next = pos + c.len_utf8();
            match state {
                State::TagName => {
                    if c.is_xml_name_char() && (pos > start || c.is_xml_name_start_char()) {
                        pos = next;
                        continue;
                    }
                    if pos == start {
                        return Err(TagError::InvalidName);
                    }
                    tag.name = src[start..pos].to_owned();
                    match c {
                        '>' => return Ok(finish(tag, pos)),
                        '/' => state = State::SelfClosing,
                        '=' => return Err(TagError::MisplacedEquals),
                        c if c.is_xml_blank_char() => state = State::TagTrailingSpace,
                        _ => return Err(TagError::InvalidName),
                    }
                }
                State::TagTrailingSpace => match c {
                    '>' => return Ok(finish(tag, pos)),
                    '/' => state = State::SelfClosing,
                    '=' => return Err(TagError::MisplacedEquals),
                    c if c.is_xml_blank_char() => {}
                    c if c.is_xml_name_start_char() => {
                        attr_start = pos;
                        state = State::AttrName;
                    }
                    _ => return Err(TagError::InvalidName),
                },
                State::AttrName => match c {
                    c if c.is_xml_name_char() => {}
                    '=' => {
                        attr_end = pos;
                        state = State::Equals;
                    }
                    '>' => {
                        self.bare_attribute(&mut tag, attr_start, pos)?;
                        return Ok(finish(tag, pos));
                    }
                    '/' => {
                        self.bare_attribute(&mut tag, attr_start, pos)?;
                        state = State::SelfClosing;
                    }
                    c if c.is_xml_blank_char() => {
                        attr_end = pos;
                        state = State::AttrNameTrailingSpace;
                    }
                    _ => return Err(TagError::InvalidName),
                },
                State::AttrNameTrailingSpace => match c {
                    '=' => state = State::Equals,
                    '>' => {
                        self.bare_attribute(&mut tag, attr_start, attr_end)?;
                        return Ok(finish(tag, pos));
                    }
                    '/' => {
                        self.bare_attribute(&mut tag, attr_start, attr_end)?;
                        state = State::SelfClosing;
                    }
                    c if c.is_xml_blank_char() => {}
                    c if c.is_xml_name_start_char() => {
                        self.bare_attribute(&mut tag, attr_start, attr_end)?;
                        attr_start = pos;
                        state = State::AttrName;
                    }
                    _ => return Err(TagError::InvalidName),
                },
                State::Equals => match c {
                    '"' | '\'' => {
                        let Some(len) = memchr(c as u8, &src.as_bytes()[next..]) else {
                            return Err(TagError::UnterminatedQuote);
                        };
                        self.push_attribute(&mut tag, attr_start, attr_end, next, next + len);
                        pos = next + len + 1;
                        state = State::QuotedValueEnd;
                        continue;
                    }
                    '>' => {
                        if !self.recover {
                            return Err(TagError::MissingValue);
                        }
                        let name = src[attr_start..attr_end].to_owned();
                        tag.warnings
                            .push((attr_start, TagWarning::MissingValue(name)));
                        self.push_attribute(&mut tag, attr_start, attr_end, pos, pos);
                        return Ok(finish(tag, pos));
                    }
                    c if c.is_xml_blank_char() => {}
                    _ => {
                        if !self.recover {
                            return Err(TagError::UnquotedValue);
                        }
                        value_start = pos;
                        state = State::UnquotedValue;
                    }
                },
                State::UnquotedValue => match c {
                    '>' => {
                        self.unquoted_value(&mut tag, attr_start, attr_end, value_start, pos);
                        return Ok(finish(tag, pos));
                    }
                    '/' if src[next..].starts_with('>') => {
                        self.unquoted_value(&mut tag, attr_start, attr_end, value_start, pos);
                        state = State::SelfClosing;
                    }
                    c if c.is_xml_blank_char() => {
                        self.unquoted_value(&mut tag, attr_start, attr_end, value_start, pos);
                        state = State::TagTrailingSpace;
                    }
                    _ => {}
                },
                State::QuotedValueEnd => match c {
                    '>' => return Ok(finish(tag, pos)),
                    '/' => state = State::SelfClosing,
                    '=' => return Err(TagError::MisplacedEquals),
                    c if c.is_xml_blank_char() => state = State::TagTrailingSpace,
                    c if c.is_xml_name_start_char() => {
                        if !self.recover {
                            return Err(TagError::MissingSpace);
                        }
                        tag.warnings.push((pos, TagWarning::MissingSpace));
                        attr_start = pos;
                        state = State::AttrName;
                    }
                    _ => return Err(TagError::InvalidName),
                },
                State::SelfClosing => {
                    if c != '>' {
                        return Err(TagError::MisplacedSlash);
                    }
                    tag.self_closing = true;
                    return Ok(finish(tag, pos));
                }
            }
            pos = next;
        }

        let partial = match state {
            State::TagName if pos > start => Some(src[start..pos].to_owned()),
            State::TagName => None,
            _ => Some(tag.name),
        };
        Err(TagError::UnexpectedEof { partial })
    }

    fn bare_attribute(&self, tag: &mut StartTag, start: usize, end: usize) -> Result<(), TagError> {
        let name = &self.source[start..end];
        let boolean = self.html && matches!(name, "disabled" | "checked" | "selected");
        if !boolean {
            if !self.recover {
                return Err(TagError::BareAttribute);
            }
            tag.warnings
                .push((start, TagWarning::BareAttribute(name.to_owned())));
        }
        self.add(tag, start, end, name.to_owned());
        Ok(())
    }

    fn unquoted_value(
        &self,
        tag: &mut StartTag,
        name_start: usize,
        name_end: usize,
        value_start: usize,
        value_end: usize,
    ) {
        let name = self.source[name_start..name_end].to_owned();
        tag.warnings
            .push((name_start, TagWarning::UnquotedValue(name)));
        self.push_attribute(tag, name_start, name_end, value_start, value_end);
    }

    /// Normalize and decode the value in `value_start..value_end`, then add the attribute.
    fn push_attribute(
        &self,
        tag: &mut StartTag,
        name_start: usize,
        name_end: usize,
        value_start: usize,
        value_end: usize,
    ) {
        let raw = &self.source[value_start..value_end];
        // each replaced byte is replaced by one byte, so offsets into `normalized`
        // are offsets into `raw`
        let normalized = if raw.contains(['\t', '\n', '\r']) {
            raw.replace(['\t', '\n', '\r'], " ")
        } else {
            raw.to_owned()
        };
        let value = self
            .entities
            .decode(&normalized, |offset, issue| {
                tag.warnings
                    .push((value_start + offset, TagWarning::Entity(issue)));
            })
            .into_owned();
        self.add(tag, name_start, name_end, value);
    }

    fn add(&self, tag: &mut StartTag, name_start: usize, name_end: usize, value: String) {
        let qname = &self.source[name_start..name_end];
        if tag.attributes.iter().any(|attr| attr.qname == qname) {
            tag.warnings
                .push((name_start, TagWarning::Redefined(qname.to_owned())));
            return;
        }
        tag.attributes.push(RawAttribute {
            qname: qname.to_owned(),
            value,
            offset: name_start,
        });
    }
}

fn finish(mut tag: StartTag, end: usize) -> StartTag {
    tag.end = end;
    tag
}
