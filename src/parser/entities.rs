//! Character and entity reference decoding.
//!
//! Two named-entity sets exist: the five predefined XML entities and, with the
//! `html` feature, the full HTML5 named character reference set. Numeric
//! references are decoded in both. References that cannot be decoded are left in the text as written.

use std::borrow::Cow;
#[cfg(feature = "html")]
use std::{collections::HashMap, sync::LazyLock};

use memchr::memchr;

/// The named entities recognized while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityTable {
    /// `lt`, `gt`, `amp`, `quot` and `apos`.
    #[default]
    Xml,
    /// The HTML5 named character references, a superset of the XML entities.
    #[cfg(feature = "html")]
    Html,
}

/// A reference that was left undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityIssue {
    /// `&name;` is not in the table.
    Undeclared(String),
    /// `&#...;` does not denote a character allowed in XML.
    InvalidCharRef(String),
}

const XML_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("apos", "'"),
    ("gt", ">"),
    ("lt", "<"),
    ("quot", "\""),
];

/// The WHATWG named character references, keyed by the name between `&` and `;`.
///
/// Legacy forms without the trailing `;` are not included.
#[cfg(feature = "html")]
static HTML_ENTITIES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    entities::ENTITIES
        .iter()
        .filter_map(|entity| {
            let name = entity.entity.strip_prefix('&')?.strip_suffix(';')?;
            Some((name, entity.characters))
        })
        .collect()
});

impl EntityTable {
    /// The replacement text of the named entity `name`.
    ///
    /// Some HTML entities expand to two code points, so the result is a string.
    pub fn lookup(&self, name: &str) -> Option<&'static str> {
        match self {
            Self::Xml => XML_ENTITIES
                .binary_search_by_key(&name, |&(name, _)| name)
                .ok()
                .map(|index| XML_ENTITIES[index].1),
            #[cfg(feature = "html")]
            Self::Html => HTML_ENTITIES.get(name).copied(),
        }
    }

    /// Replace the references in `text`.
    ///
    /// `on_issue` receives the byte offset in `text` of every reference that is kept
    /// as written. Returns `Cow::Borrowed` when `text` contains no `&`.
    pub fn decode<'a>(
        &self,
        text: &'a str,
        mut on_issue: impl FnMut(usize, EntityIssue),
    ) -> Cow<'a, str> {
        let Some(first) = memchr(b'&', text.as_bytes()) else {
            return Cow::Borrowed(text);
        };
        let mut res = String::with_capacity(text.len());
        res.push_str(&text[..first]);
        let mut pos = first;
        while pos < text.len() {
            let rest = &text[pos..];
            if !rest.starts_with('&') {
                let next = memchr(b'&', rest.as_bytes()).unwrap_or(rest.len());
                res.push_str(&rest[..next]);
                pos += next;
                continue;
            }
            let reference = memchr(b';', rest.as_bytes())
                .map(|semi| &rest[1..semi])
                .filter(|body| !body.is_empty() && !body.contains(['&', '<']) && !body.contains(char::is_whitespace));
            let Some(body) = reference else {
                res.push('&');
                pos += 1;
                continue;
            };
            let decoded = match body.strip_prefix('#') {
                Some(num) => decode_char_ref(num)
                    .map(Expansion::Char)
                    .ok_or(EntityIssue::InvalidCharRef(body.to_owned())),
                None => self
                    .lookup(body)
                    .map(Expansion::Text)
                    .ok_or(EntityIssue::Undeclared(body.to_owned())),
            };
            match decoded {
                Ok(Expansion::Char(c)) => {
                    res.push(c);
                    pos += body.len() + 2;
                }
                Ok(Expansion::Text(text)) => {
                    res.push_str(text);
                    pos += body.len() + 2;
                }
                Err(issue) => {
                    on_issue(pos, issue);
                    res.push('&');
                    pos += 1;
                }
            }
        }
        Cow::Owned(res)
    }
}

enum Expansion {
    Char(char),
    Text(&'static str),
}

/// Decode the digits of `&#...;` (without `&#` and `;`).
fn decode_char_ref(num: &str) -> Option<char> {
    let value = match num.strip_prefix(['x', 'X']) {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        None if !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit()) => num.parse().ok()?,
        _ => return None,
    };
    // Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
    match value {
        0x9 | 0xA | 0xD | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF => {
            char::from_u32(value)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(table: EntityTable, text: &str) -> (String, Vec<(usize, EntityIssue)>) {
        let mut issues = vec![];
        let res = table.decode(text, |pos, issue| issues.push((pos, issue)));
        (res.into_owned(), issues)
    }

    #[test]
    fn predefined_and_numeric() {
        let (text, issues) = decode_all(EntityTable::Xml, "A &amp; B &#65;&#x42;&#X43;");
        assert_eq!(text, "A & B ABC");
        assert!(issues.is_empty());
        assert!(matches!(
            EntityTable::Xml.decode("no references", |_, _| {}),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn broken_references_are_kept() {
        let (text, issues) = decode_all(EntityTable::Xml, "a & b &nbsp; &#0; &#xZZ; &;");
        assert_eq!(text, "a & b &nbsp; &#0; &#xZZ; &;");
        assert_eq!(
            issues,
            vec![
                (6, EntityIssue::Undeclared("nbsp".to_owned())),
                (13, EntityIssue::InvalidCharRef("#0".to_owned())),
                (18, EntityIssue::InvalidCharRef("#xZZ".to_owned())),
            ]
        );
    }

    #[cfg(feature = "html")]
    #[test]
    fn html_entities() {
        let (text, issues) = decode_all(EntityTable::Html, "&copy;&nbsp;&eacute;&amp;&bogus;");
        assert_eq!(text, "\u{a9}\u{a0}\u{e9}&&bogus;");
        assert_eq!(issues.len(), 1);
    }

    #[cfg(feature = "html")]
    #[test]
    fn html5_entities() {
        let (text, issues) = decode_all(
            EntityTable::Html,
            "&apos;|&check;|&NewLine;|&NotEqualTilde;|&hellip;|&fjlig;",
        );
        assert_eq!(text, "'|\u{2713}|\n|\u{2242}\u{338}|\u{2026}|fj");
        assert!(issues.is_empty());
        // legacy references without `;` are not recognized
        assert_eq!(EntityTable::Html.lookup("amp"), Some("&"));
        assert_eq!(EntityTable::Html.lookup("amp;"), None);
        assert_eq!(EntityTable::Xml.lookup("check"), None);
        assert!(HTML_ENTITIES.len() > 1500);
    }
}
