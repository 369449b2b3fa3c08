//! Line sinks for the tree printer.
//!
//! A sink receives one call per printed node, in pre-order, and turns it into
//! a line of output. Two formats are provided:
//!
//! - **Text** via [`TextSink`]: `<depth spaces><Label> <render>`, with the
//!   label optionally colored green
//! - **JSON** via [`JsonSink`]: one object per line,
//!   `{"depth":0,"kind":"VectorSelector","text":"up"}`
//!
//! # Examples
//!
//! ```
//! use promtree::ast::NodeKind;
//! use promtree::output::{TextSink, TreeSink};
//!
//! let mut sink = TextSink::new(Vec::new(), false);
//! sink.write_node(0, NodeKind::BinaryExpr, "1 + 2").unwrap();
//! sink.write_node(1, NodeKind::NumberLiteral, "1").unwrap();
//!
//! let text = String::from_utf8(sink.into_inner()).unwrap();
//! assert_eq!(text, "BinaryExpr 1 + 2\n NumberLiteral 1\n");
//! ```

use std::io::{self, Write};

use crate::ast::NodeKind;

const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Receives printed nodes one line at a time.
pub trait TreeSink {
    fn write_node(&mut self, depth: usize, kind: NodeKind, text: &str) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub struct TextSink<W: Write> {
    writer: W,
    color: bool,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W, color: bool) -> Self {
        TextSink { writer, color }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TreeSink for TextSink<W> {
    fn write_node(&mut self, depth: usize, kind: NodeKind, text: &str) -> io::Result<()> {
        let indent = " ".repeat(depth);
        if self.color {
            writeln!(self.writer, "{indent}{GREEN}{kind}{RESET} {text}")
        } else {
            writeln!(self.writer, "{indent}{kind} {text}")
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        JsonSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TreeSink for JsonSink<W> {
    fn write_node(&mut self, depth: usize, kind: NodeKind, text: &str) -> io::Result<()> {
        let line = serde_json::json!({
            "depth": depth,
            "kind": kind.label(),
            "text": text,
        });
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl<S: TreeSink + ?Sized> TreeSink for &mut S {
    fn write_node(&mut self, depth: usize, kind: NodeKind, text: &str) -> io::Result<()> {
        (**self).write_node(depth, kind, text)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}
