//! Parse a query and print its syntax tree

use std::io::{BufRead, Write};

use tracing::debug;

use super::CliError;
use crate::ast::Expr;
use crate::output::{JsonSink, OutputFormat, TextSink, TreeSink};
use crate::parser::QueryParser;
use crate::preprocess::wrap_step_invariant;
use crate::printer::TreePrinter;

/// Options for the inspect command
#[derive(Debug, Clone, Default)]
pub struct InspectOptions {
    /// The PromQL query to print
    pub query: String,
    pub format: OutputFormat,
    /// Color node labels (text format only)
    pub color: bool,
    /// Wrap step-invariant subtrees before printing
    pub step_invariant: bool,
}

/// Parses `options.query` with `parser` and prints the tree to `out`.
///
/// Nothing is written when parsing fails. When printing fails the lines
/// already written are flushed before the error is returned.
pub fn execute_inspect<P, W>(options: &InspectOptions, parser: &P, out: W) -> Result<(), CliError>
where
    P: QueryParser + ?Sized,
    W: Write,
{
    let mut expr = parser.parse(&options.query)?;
    if options.step_invariant {
        expr = wrap_step_invariant(expr);
    }
    debug!(format = ?options.format, nodes = expr.node_count(), "printing tree");

    match options.format {
        OutputFormat::Text => print_to(&expr, TextSink::new(out, options.color)),
        OutputFormat::Json => print_to(&expr, JsonSink::new(out)),
    }
}

fn print_to<S: TreeSink>(expr: &Expr, sink: S) -> Result<(), CliError> {
    let mut printer = TreePrinter::new(sink);
    let result = printer.print(expr, 0);
    printer.flush()?;
    Ok(result?)
}

/// Reads the first line of `reader`, without its line terminator.
pub fn read_query_line<R: BufRead>(mut reader: R) -> Result<String, CliError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(CliError::NoInput);
    }
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
