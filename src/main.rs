//! Branch Layout CLI
//!
//! Usage:
//!   branch-layout [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>  Layout configuration overrides (TOML format)
//!   --check              Lint the input layout instead of resolving it
//!   --compact            Print single-line JSON
//!   -v, --verbose        Raise log level (repeat for more)
//!   -h, --help           Print help

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use branch_layout::layout::lint;
use branch_layout::{layout_document, BranchEngine, GraphDocument, GraphError, LayoutConfig};

#[derive(Parser)]
#[command(name = "branch-layout")]
#[command(about = "Overlap-free layout for branching flow graphs")]
struct Cli {
    /// Graph document in JSON (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Layout configuration overrides (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lint the input layout and exit with status 1 if defects remain
    #[arg(long)]
    check: bool,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,

    /// Raise log level: -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => match LayoutConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => LayoutConfig::default(),
    };

    let (source, filename) = match read_input(cli.input.as_ref()) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let doc = match GraphDocument::from_json(&source) {
        Ok(doc) => doc,
        Err(e) => {
            eprint!("{}", e.format(&source, &filename));
            return ExitCode::FAILURE;
        }
    };
    debug!(nodes = doc.nodes.len(), edges = doc.edges.len(), "graph loaded");

    if cli.check {
        let warnings = lint::check(&doc.nodes, &doc.edges, &BranchEngine::new(config));
        for warning in &warnings {
            println!("{}", warning);
        }
        return if warnings.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let report = layout_document(&doc, &config);
    info!(
        iterations = report.iterations,
        converged = report.converged,
        shifts = report.shifts.len(),
        "layout resolved"
    );

    match doc.with_nodes(report.nodes).to_json(cli.compact) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn read_input(path: Option<&PathBuf>) -> Result<(String, String), GraphError> {
    match path {
        Some(path) => Ok((fs::read_to_string(path)?, path.display().to_string())),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok((buffer, "<stdin>".to_string()))
        }
    }
}
