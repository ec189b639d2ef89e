//! core::jsonfmt
//!
//! JSON formatting detection and source-faithful serialization.
//!
//! # Overview
//!
//! Raw control trees arrive either compact or indented, and indented ones
//! carry either CRLF or LF newlines depending on where the bundle was
//! authored. Round-trip verification must reserialize in exactly the source
//! shape, so the shape is detected from the source bytes and reproduced by a
//! custom formatter: two-space indent, `": "` key separators, and the
//! detected newline.
//!
//! Files this tool writes itself (data files, catalogs, pretty diagnostic
//! twins) always use [`Newline::Lf`], keeping output byte-identical across
//! runs and platforms.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;

/// Newline flavor of an indented document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    Lf,
    CrLf,
}

impl Newline {
    /// The newline as a string slice.
    pub fn as_str(self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
        }
    }
}

/// Serialization shape of a JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFormat {
    /// Single line, no whitespace.
    Compact,
    /// Two-space indent with the given newline.
    Indented(Newline),
}

impl JsonFormat {
    /// The newline separating lines of this format, if any.
    pub fn newline(self) -> Option<Newline> {
        match self {
            JsonFormat::Compact => None,
            JsonFormat::Indented(newline) => Some(newline),
        }
    }
}

/// Detect the serialization shape of a document from its leading bytes.
///
/// An indented document opens its root container and breaks the line
/// immediately, so the byte right after the opening brace is the newline
/// marker (`\r\n` or `\n`). Anything else is compact.
///
/// # Example
///
/// ```
/// use canvaswork::core::jsonfmt::{detect, JsonFormat, Newline};
///
/// assert_eq!(detect("{\r\n  \"a\": 1\r\n}"), JsonFormat::Indented(Newline::CrLf));
/// assert_eq!(detect("{\n  \"a\": 1\n}"), JsonFormat::Indented(Newline::Lf));
/// assert_eq!(detect("{\"a\":1}"), JsonFormat::Compact);
/// ```
pub fn detect(source: &str) -> JsonFormat {
    let bytes = source.as_bytes();
    if bytes.len() > 2 && bytes[1] == b'\r' && bytes[2] == b'\n' {
        JsonFormat::Indented(Newline::CrLf)
    } else if bytes.len() > 1 && bytes[1] == b'\n' {
        JsonFormat::Indented(Newline::Lf)
    } else {
        JsonFormat::Compact
    }
}

/// Serialize a value in the given shape.
pub fn to_text(value: &Value, format: JsonFormat) -> serde_json::Result<String> {
    match format {
        JsonFormat::Compact => serde_json::to_string(value),
        JsonFormat::Indented(newline) => {
            let mut out = Vec::with_capacity(128);
            let mut ser =
                serde_json::Serializer::with_formatter(&mut out, IndentedFormatter::new(newline));
            value.serialize(&mut ser)?;
            // The formatter only ever writes valid UTF-8.
            Ok(String::from_utf8(out).expect("serializer output is UTF-8"))
        }
    }
}

/// Serialize a value indented with LF newlines.
///
/// The shape for everything this tool writes itself.
pub fn pretty(value: &Value) -> serde_json::Result<String> {
    to_text(value, JsonFormat::Indented(Newline::Lf))
}

/// Marker line prefixed to the pretty twin of a single-line JSON document.
pub const UNFORMATTED_MARKER: &str = "//// Unformatted: ";

/// Annotate a single-line JSON document with a reviewable pretty twin.
///
/// Returns `None` when the text already spans multiple lines. The original
/// line is preserved verbatim after the marker as the record of truth; the
/// indented rendition follows for human diffs.
pub fn annotate_single_line(text: &str) -> serde_json::Result<Option<String>> {
    let line = text.trim_end_matches(['\r', '\n']);
    if line.contains('\n') {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(line)?;
    Ok(Some(format!(
        "{}{}\n{}",
        UNFORMATTED_MARKER,
        line,
        pretty(&value)?
    )))
}

/// Two-space indented formatter with a configurable newline.
///
/// Emits the upstream serializer's indented shape: each container value on
/// its own line, `": "` after keys, empty containers closed inline.
struct IndentedFormatter {
    newline: &'static str,
    current_indent: usize,
    has_value: bool,
}

impl IndentedFormatter {
    fn new(newline: Newline) -> Self {
        Self {
            newline: newline.as_str(),
            current_indent: 0,
            has_value: false,
        }
    }

    fn write_indent<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        for _ in 0..self.current_indent {
            writer.write_all(b"  ")?;
        }
        Ok(())
    }
}

impl Formatter for IndentedFormatter {
    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.current_indent += 1;
        self.has_value = false;
        writer.write_all(b"[")
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(self.newline.as_bytes())?;
            self.write_indent(writer)?;
        }
        writer.write_all(b"]")
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if !first {
            writer.write_all(b",")?;
        }
        writer.write_all(self.newline.as_bytes())?;
        self.write_indent(writer)
    }

    fn end_array_value<W>(&mut self, _writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.current_indent += 1;
        self.has_value = false;
        writer.write_all(b"{")
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(self.newline.as_bytes())?;
            self.write_indent(writer)?;
        }
        writer.write_all(b"}")
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if !first {
            writer.write_all(b",")?;
        }
        writer.write_all(self.newline.as_bytes())?;
        self.write_indent(writer)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn end_object_value<W>(&mut self, _writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.has_value = true;
        Ok(())
    }
}
