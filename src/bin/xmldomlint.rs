//! Parse XML or HTML files and print the serialized result.
//!
//! Diagnostics go through the `log` facade; set `RUST_LOG=debug` to also see the
//! parser's recovery decisions.

use std::{
    cell::Cell,
    fs,
    io::{Read, Write, stdin, stdout},
    process::exit,
    rc::Rc,
    time::Instant,
};

use anyhow::{Context, anyhow};
use clap::Parser;
use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};
use memchr::memmem;
use xmldom::{
    error::{DOMError, DOMErrorHandler, DOMErrorSeverity, DefaultErrorHandler},
    parser::{DOMParser, ParserMode, XmlParserOption},
    save::{XmlSaveOption, XmlSerializer},
};

// Error codes.
// These are the subset of xmllint's return codes this tool can produce.
const RETURN_OK: i32 = 0; // No error
const ERR_UNCLASS: i32 = 1; // Unclassified
const ERR_RDFILE: i32 = 4; // Reading the input failed
const ERR_OUT: i32 = 6; // Error writing output

#[derive(clap::Parser, Debug)]
#[command(
    version,
    name = "xmldomlint",
    about = "Parse the XML or HTML files and output the result of the parsing.",
    arg_required_else_help = true
)]
struct CmdArgs {
    /// files to parse, `-` reads the standard input
    #[clap(required = true)]
    files: Vec<String>,
    /// use the HTML parser
    #[arg(long)]
    html: bool,
    /// accept unquoted and bare attributes in XML mode
    #[arg(long)]
    recover: bool,
    /// remove whitespace-only text nodes
    #[arg(long)]
    noblanks: bool,
    /// replace cdata section with text nodes
    #[arg(long)]
    nocdata: bool,
    /// never close unterminated elements in place
    #[arg(long)]
    norepair: bool,
    /// do not emit warnings from the parser
    #[arg(long)]
    nowarning: bool,
    /// don't output the result tree
    #[arg(long)]
    noout: bool,
    /// drop the XML declaration from the output
    #[arg(long)]
    nodecl: bool,
    /// force to use the XML serializer when using --html
    #[arg(long)]
    xmlout: bool,
    /// print some timings
    #[arg(long)]
    timing: bool,
    /// the input encoding, overriding the document's declaration
    #[arg(long, value_name = "label")]
    encoding: Option<String>,
}

impl CmdArgs {
    fn parser_options(&self) -> i32 {
        let mut options = 0;
        for (set, option) in [
            (self.recover, XmlParserOption::XmlParseRecover),
            (self.noblanks, XmlParserOption::XmlParseNoBlanks),
            (self.nocdata, XmlParserOption::XmlParseNoCDATA),
            (self.norepair, XmlParserOption::XmlParseNoRepair),
            (self.nowarning, XmlParserOption::XmlParseNoWarning),
        ] {
            if set {
                options |= option as i32;
            }
        }
        options
    }

    fn save_options(&self) -> i32 {
        let mut options = 0;
        if self.nodecl {
            options |= XmlSaveOption::XmlSaveNoDecl as i32;
        }
        if self.xmlout {
            options |= XmlSaveOption::XmlSaveAsXml as i32;
        }
        options
    }
}

/// The `encoding` pseudo-attribute of an XML declaration at the start of `bytes`.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = bytes.strip_prefix(b"<?xml")?;
    let decl = &head[..memmem::find(head, b"?>")?];
    let start = memmem::find(decl, b"encoding")? + b"encoding".len();
    let rest = decl[start..].trim_ascii_start().strip_prefix(b"=")?.trim_ascii_start();
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = rest.iter().position(|&b| b == quote)?;
    Encoding::for_label(&rest[..end])
}

/// Read `file` and decode it to UTF-8.
///
/// A byte order mark wins over everything else, then `--encoding`, then the XML
/// declaration. UTF-8 is assumed otherwise.
fn read_input(file: &str, label: Option<&str>) -> anyhow::Result<String> {
    let mut bytes = vec![];
    if file == "-" {
        stdin()
            .read_to_end(&mut bytes)
            .context("failed to read the standard input")?;
    } else {
        bytes = fs::read(file).with_context(|| format!("failed to load \"{file}\""))?;
    }
    let encoding = match label {
        Some(label) => Encoding::for_label(label.as_bytes())
            .ok_or_else(|| anyhow!("unknown encoding '{label}'"))?,
        None => declared_encoding(&bytes).unwrap_or(UTF_8),
    };
    let (text, used, had_errors) = encoding.decode(&bytes);
    debug!("{file}: decoded {} bytes as {}", bytes.len(), used.name());
    if had_errors {
        warn!("{file}: input is not valid {}, malformed sequences were replaced", used.name());
    }
    Ok(text.into_owned())
}

/// Process one file and return its exit code.
fn parse_and_print_file(args: &CmdArgs, file: &str) -> anyhow::Result<i32> {
    let source = read_input(file, args.encoding.as_deref())?;

    let errors = Rc::new(Cell::new(0usize));
    let counter = errors.clone();
    let mode = if args.html {
        ParserMode::Html
    } else {
        ParserMode::Xml
    };
    let parser = DOMParser::new(mode)
        .with_options(args.parser_options())
        .with_error_handler(move |err: DOMError| {
            if err.severity() != DOMErrorSeverity::SeverityWarning {
                counter.set(counter.get() + 1);
            }
            DefaultErrorHandler.handle_error(err)
        });

    let start = Instant::now();
    let doc = parser.parse_from_string(&source)?;
    if args.timing {
        eprintln!("Parsing took {} ms", start.elapsed().as_millis());
    }

    if !args.noout {
        let start = Instant::now();
        let out = XmlSerializer::new()
            .with_options(args.save_options())
            .serialize_to_string(&doc.into());
        let mut stdout = stdout().lock();
        if writeln!(stdout, "{out}").and_then(|()| stdout.flush()).is_err() {
            eprintln!("failed to write the result of \"{file}\"");
            return Ok(ERR_OUT);
        }
        if args.timing {
            eprintln!("Saving took {} ms", start.elapsed().as_millis());
        }
    }

    match errors.get() {
        0 => Ok(RETURN_OK),
        n => {
            debug!("{file}: {n} errors");
            Ok(ERR_UNCLASS)
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = CmdArgs::parse();

    let mut result = RETURN_OK;
    for file in &args.files {
        let code = match parse_and_print_file(&args, file) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("{err:#}");
                ERR_RDFILE
            }
        };
        if result == RETURN_OK {
            result = code;
        }
    }
    exit(result);
}
