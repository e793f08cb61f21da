//! mdsplice CLI - Markdown to HTML with attribute lists, table extensions
//! and header ids.
//!
//! Provides commands for:
//! - `convert`: Convert markdown to postprocessed HTML
//! - `baseline`: Print the plain renderer output, without postprocessing

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BaselineArgs, ConvertArgs};
use output::Output;

/// mdsplice - Markdown to HTML with attribute lists.
#[derive(Parser)]
#[command(name = "mdsplice", version, about)]
struct Cli {
    /// Enable verbose output (stage timings and unmatched attributes).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert markdown to HTML.
    Convert(ConvertArgs),
    /// Print the renderer output without postprocessing.
    Baseline(BaselineArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // Initialize tracing with appropriate log level
    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Convert(args) => args.execute(cli.verbose),
        Commands::Baseline(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
