//! CLI support for promtree
//!
//! Provides programmatic access to the `promtree` command so other tools can
//! embed it with their own parser or output stream.

mod inspect;

pub use inspect::{InspectOptions, execute_inspect, read_query_line};

use std::io;

use thiserror::Error;

use crate::parser::ParseError;
use crate::printer::PrintError;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Print(#[from] PrintError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Pass a query argument or pipe it to stdin.")]
    NoInput,
}
