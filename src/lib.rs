//! A tolerant XML (and HTML-like) parser that builds a mutable DOM with namespace
//! resolution, and a serializer that writes the tree back as markup.
//!
//! ```
//! use xmldom::{dom::node::Node, parser::parse_xml, save::serialize};
//!
//! let doc = parse_xml(r#"<a:root xmlns:a="urn:x"><a:child/></a:root>"#).unwrap();
//! let root = doc.document_element().unwrap();
//! assert_eq!(root.namespace_uri().as_deref(), Some("urn:x"));
//! assert_eq!(
//!     serialize(&root.into()),
//!     r#"<a:root xmlns:a="urn:x"><a:child/></a:root>"#
//! );
//! ```
#![warn(unused_mut)]
#![warn(unused_imports)]
#![warn(unused_variables)]

pub mod chvalid;
pub mod dom;
pub mod error;
pub mod parser;
pub mod save;

use const_format::concatcp;

/// The version of this crate, e.g. `0.1.0`.
pub const PARSER_VERSION: &str = concatcp!(
    env!("CARGO_PKG_VERSION_MAJOR"),
    ".",
    env!("CARGO_PKG_VERSION_MINOR"),
    ".",
    env!("CARGO_PKG_VERSION_PATCH")
);
