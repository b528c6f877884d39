//! Character classes used by the tokenizer and by the name validators.
//!
//! The name classes follow the XML 1.0 (Fifth Edition) productions `NameStartChar`
//! and `NameChar`. The colon is included in both; callers working with NCNames
//! exclude it themselves.

pub trait XmlCharValid {
    /// `S ::= (#x20 | #x9 | #xD | #xA)+`
    fn is_xml_blank_char(&self) -> bool;
    /// `NameStartChar`
    fn is_xml_name_start_char(&self) -> bool;
    /// `NameChar`
    fn is_xml_name_char(&self) -> bool;
}

impl XmlCharValid for char {
    fn is_xml_blank_char(&self) -> bool {
        matches!(self, ' ' | '\t' | '\n' | '\r')
    }

    fn is_xml_name_start_char(&self) -> bool {
        matches!(*self,
            ':' | 'A'..='Z' | '_' | 'a'..='z'
            | '\u{C0}'..='\u{D6}'
            | '\u{D8}'..='\u{F6}'
            | '\u{F8}'..='\u{2FF}'
            | '\u{370}'..='\u{37D}'
            | '\u{37F}'..='\u{1FFF}'
            | '\u{200C}'..='\u{200D}'
            | '\u{2070}'..='\u{218F}'
            | '\u{2C00}'..='\u{2FEF}'
            | '\u{3001}'..='\u{D7FF}'
            | '\u{F900}'..='\u{FDCF}'
            | '\u{FDF0}'..='\u{FFFD}'
            | '\u{10000}'..='\u{EFFFF}'
        )
    }

    fn is_xml_name_char(&self) -> bool {
        self.is_xml_name_start_char()
            || matches!(*self,
                '-' | '.' | '0'..='9' | '\u{B7}'
                | '\u{300}'..='\u{36F}'
                | '\u{203F}'..='\u{2040}'
            )
    }
}

impl XmlCharValid for u8 {
    fn is_xml_blank_char(&self) -> bool {
        matches!(self, b' ' | b'\t' | b'\n' | b'\r')
    }

    // Any byte of a multi-byte UTF-8 sequence is accepted here; the decoded
    // character must be checked through the `char` implementation.
    fn is_xml_name_start_char(&self) -> bool {
        *self >= 0x80 || matches!(self, b':' | b'A'..=b'Z' | b'_' | b'a'..=b'z')
    }

    fn is_xml_name_char(&self) -> bool {
        self.is_xml_name_start_char() || matches!(self, b'-' | b'.' | b'0'..=b'9')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_classes() {
        assert!('a'.is_xml_name_start_char());
        assert!(':'.is_xml_name_start_char());
        assert!('\u{3042}'.is_xml_name_start_char());
        assert!(!'1'.is_xml_name_start_char());
        assert!(!'-'.is_xml_name_start_char());
        assert!('1'.is_xml_name_char());
        assert!('-'.is_xml_name_char());
        assert!(!' '.is_xml_name_char());
        assert!(!'='.is_xml_name_char());
    }

    #[test]
    fn blanks() {
        for c in [' ', '\t', '\r', '\n'] {
            assert!(c.is_xml_blank_char());
        }
        assert!(!'\u{A0}'.is_xml_blank_char());
        assert!(b'\t'.is_xml_blank_char());
    }
}
