//! Qualified name helpers shared by the parser and the DOM factories.

use std::borrow::Cow;

use crate::chvalid::XmlCharValid;

/// Parse an XML qualified name string
///
/// ```text
/// [NS 5] QName ::= (Prefix ':')? LocalPart
///
/// [NS 6] Prefix ::= NCName
///
/// [NS 7] LocalPart ::= NCName
/// ```
///
/// Returns `None` if the name doesn't have a prefix.
/// Otherwise, returns `Some((Prefix, LocalPart))`.
///
/// # Note
/// This function does not perform validation.
#[doc(alias = "xmlSplitQName2")]
pub fn split_qname2(name: &str) -> Option<(&str, &str)> {
    // nasty but valid
    if name.starts_with(':') {
        return None;
    }
    name.split_once(':')
        .filter(|(_, local)| !local.is_empty())
}

/// Builds the QName `"prefix:ncname"`.
///
/// If `prefix` is `Some` and not empty, return `Cow::Owned(QName)`.
/// Otherwise, return `Cow::Borrowed(ncname)`.
#[doc(alias = "xmlBuildQName")]
pub fn build_qname<'a>(ncname: &'a str, prefix: Option<&str>) -> Cow<'a, str> {
    let Some(prefix) = prefix.filter(|p| !p.is_empty()) else {
        return Cow::Borrowed(ncname);
    };
    Cow::Owned(format!("{prefix}:{ncname}"))
}

/// Check that a value conforms to the lexical space of Name.
///
/// ```text
/// [5] Name ::= NameStartChar (NameChar)*
/// ```
#[doc(alias = "xmlValidateName")]
pub fn validate_name(value: &str) -> bool {
    let mut chars = value.chars();
    chars.next().is_some_and(|c| c.is_xml_name_start_char())
        && chars.all(|c| c.is_xml_name_char())
}

/// Check that a value conforms to the lexical space of NCName.
#[doc(alias = "xmlValidateNCName")]
pub fn validate_ncname(value: &str) -> bool {
    !value.contains(':') && validate_name(value)
}

/// Check that a value conforms to the lexical space of QName.
#[doc(alias = "xmlValidateQName")]
pub fn validate_qname(value: &str) -> bool {
    match value.split_once(':') {
        Some((prefix, local)) => validate_ncname(prefix) && validate_ncname(local),
        None => validate_ncname(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split() {
        assert_eq!(split_qname2("a:b"), Some(("a", "b")));
        assert_eq!(split_qname2("ab"), None);
        assert_eq!(split_qname2(":ab"), None);
        assert_eq!(split_qname2("a:"), None);
        assert_eq!(build_qname("b", Some("a")), "a:b");
        assert_eq!(build_qname("b", Some("")), "b");
    }

    #[test]
    fn validation() {
        assert!(validate_name("a:b-c.d"));
        assert!(!validate_name("1abc"));
        assert!(!validate_name(""));
        assert!(validate_ncname("élément"));
        assert!(!validate_ncname("a:b"));
        assert!(validate_qname("a:b"));
        assert!(!validate_qname("a:b:c"));
        assert!(!validate_qname(":b"));
    }
}
