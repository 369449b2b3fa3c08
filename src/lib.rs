pub mod ast;
pub mod cli;
pub mod functions;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod preprocess;
pub mod printer;

pub use ast::{Expr, NodeKind, Token};
pub use lexer::{LexError, Lexer, Position};
pub use output::{JsonSink, OutputFormat, TextSink, TreeSink};
pub use parser::{ParseError, Parser, ParserOptions, PromQl, QueryParser, parse};
pub use preprocess::wrap_step_invariant;
pub use printer::{PrintError, TreePrinter, print_tree};
