use clap::{ArgAction, Parser as ClapParser, ValueEnum};
use promtree::cli::{self, CliError, InspectOptions};
use promtree::output::OutputFormat;
use promtree::parser::{ParserOptions, PromQl};
use std::io::{self, BufWriter};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "promtree")]
#[command(about = "Print a PromQL expression as an indented syntax tree")]
#[command(version)]
struct Cli {
    /// The PromQL query (reads the first line of stdin if not provided)
    query: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Color node labels
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,

    /// Wrap step-invariant subtrees in StepInvariantExpr nodes
    #[arg(long)]
    step_invariant: bool,

    /// Accept experimental functions and aggregations
    #[arg(long)]
    experimental: bool,

    /// Log to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let query = match cli.query {
        Some(q) => q,
        None if !atty::is(atty::Stream::Stdin) => cli::read_query_line(io::stdin().lock())?,
        None => return Err(CliError::NoInput),
    };

    let options = InspectOptions {
        query,
        format: match cli.format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        },
        color: match cli.color {
            ColorMode::Auto => atty::is(atty::Stream::Stdout),
            ColorMode::Always => true,
            ColorMode::Never => false,
        },
        step_invariant: cli.step_invariant,
    };
    let parser = PromQl::new(ParserOptions {
        experimental_functions: cli.experimental,
    });

    cli::execute_inspect(&options, &parser, BufWriter::new(io::stdout().lock()))
}
