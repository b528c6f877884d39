//! Diagnostics reported while parsing.
//!
//! The parser never aborts on its own. Every problem is described by a [`DOMError`]
//! and delivered to a [`DOMErrorHandler`]; returning `false` from the handler stops
//! the parse with [`ParseError::Aborted`].

use std::{borrow::Cow, fmt};

macro_rules! impl_xml_parser_errors {
    ( $( $variant:ident $( = $default:literal )? ),* ) => {
        #[repr(C)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum XmlParserErrors {
            $(
                $variant $( = $default )?
            ),*
        }

        impl TryFrom<i32> for XmlParserErrors {
            type Error = anyhow::Error;
            fn try_from(value: i32) -> Result<Self, Self::Error> {
                $(
                    if value == Self:: $variant as i32 {
                        return Ok(Self:: $variant);
                    }
                )*
                Err(anyhow::anyhow!("Invalid convert from value '{value}' to {}", std::any::type_name::<Self>()))
            }
        }

        impl Default for XmlParserErrors {
            fn default() -> Self {
                Self::XmlErrOK
            }
        }
    };
}
impl_xml_parser_errors!(
    XmlErrOK = 0,
    XmlErrInternalError,        /* 1 */
    XmlErrInvalidCharRef,       /* 2 */
    XmlErrUndeclaredEntity,     /* 3 */
    XmlErrInvalidName,          /* 4 */
    XmlErrAttributeNotStarted,  /* 5 */
    XmlErrAttributeNotQuoted,   /* 6 */
    XmlErrAttributeWithoutValue, /* 7 */
    XmlErrAttributeUnterminated, /* 8 */
    XmlErrAttributeRedefined,   /* 9 */
    XmlErrSpaceRequired,        /* 10 */
    XmlErrMisplacedEquals,      /* 11 */
    XmlErrMisplacedSlash,       /* 12 */
    XmlErrTagNotFinished,       /* 13 */
    XmlErrTagNameMismatch,      /* 14 */
    XmlErrEndTagNotOpened,      /* 15 */
    XmlErrElementNotClosed,     /* 16 */
    XmlErrCommentNotFinished,   /* 17 */
    XmlErrCDATANotFinished,     /* 18 */
    XmlErrPINotFinished,        /* 19 */
    XmlErrDoctypeNotFinished,   /* 20 */
    XmlErrMisplacedXmlDecl,     /* 21 */
    XmlErrTextOutsideRoot,      /* 22 */
    XmlErrExtraContent,         /* 23 */
    XmlNsErrUndefinedNamespace, /* 24 */
    XmlWarSelfClosingRepair,    /* 25 */
    XmlErrXMLDeclNotFinished    /* 26 */
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DOMErrorSeverity {
    SeverityWarning = 1,
    SeverityError = 2,
    SeverityFatalError = 3,
}

impl fmt::Display for DOMErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeverityWarning => write!(f, "warning"),
            Self::SeverityError => write!(f, "error"),
            Self::SeverityFatalError => write!(f, "fatal error"),
        }
    }
}

/// Implementation of [`Interface DOMError`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ERROR-Interfaces-DOMError),
/// extended with the parser's error code and the location in the source.
///
/// `line` and `column` are 1-based; `column` counts characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DOMError {
    severity: DOMErrorSeverity,
    code: XmlParserErrors,
    message: Cow<'static, str>,
    line: usize,
    column: usize,
}

impl DOMError {
    pub fn new(
        severity: DOMErrorSeverity,
        code: XmlParserErrors,
        message: impl Into<Cow<'static, str>>,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            line,
            column,
        }
    }

    pub fn severity(&self) -> DOMErrorSeverity {
        self.severity
    }

    pub fn code(&self) -> XmlParserErrors {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

impl fmt::Display for DOMError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.line, self.column, self.severity, self.message
        )
    }
}

impl std::error::Error for DOMError {}

/// Implementation of [`Interface DOMErrorHandler`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ERROR-Interfaces-DOMErrorHandler).
///
/// # Specification
/// ```text
/// Interface DOMErrorHandler (introduced in DOM Level 3)
///     DOMErrorHandler is a callback interface that the DOM implementation can call
///     when reporting errors that happens while processing XML data, or when doing
///     some other processing (e.g. validating a document).
/// ```
pub trait DOMErrorHandler {
    /// Implementation of [`handleError`](https://www.w3.org/TR/2004/REC-DOM-Level-3-Core-20040407/DOM3-Core.html#core-ID-ERRORS-DOMErrorHandler-handleError) method.
    ///
    /// # Specification
    /// ```text
    /// Return Value
    ///     boolean If the handleError method returns false, the DOM implementation should
    ///             stop the current processing when possible. If the method returns true,
    ///             the processing may continue depending on DOMError.severity.
    /// ```
    fn handle_error(&self, error: DOMError) -> bool;
}

impl<F: Fn(DOMError) -> bool> DOMErrorHandler for F {
    fn handle_error(&self, error: DOMError) -> bool {
        self(error)
    }
}

/// Forwards every diagnostic to the `log` facade and never stops the parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl DOMErrorHandler for DefaultErrorHandler {
    fn handle_error(&self, error: DOMError) -> bool {
        match error.severity() {
            DOMErrorSeverity::SeverityWarning => log::warn!("{error}"),
            _ => log::error!("{error}"),
        }
        true
    }
}

/// The reason a parse did not produce a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The error handler returned `false` for this diagnostic.
    Aborted(DOMError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted(err) => write!(f, "parse aborted at {err}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Aborted(err) => Some(err),
        }
    }
}
