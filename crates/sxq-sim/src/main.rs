use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    analyze::{self, AnalyzeArgs},
    codes::{self, CodesArgs},
    demo::{self, DemoArgs},
    summary::{self, SummaryArgs},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "sxq-sim", about = "Anti-S reconstruction efficiency and V0 fit diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze events from a JSON or JSON-lines file.
    Analyze(AnalyzeArgs),
    /// Generate synthetic anti-S events and analyze them.
    Demo(DemoArgs),
    /// Print and verify a run summary written by `analyze`.
    Summary(SummaryArgs),
    /// List the V0 diagnostic codes.
    Codes(CodesArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => analyze::run(&args),
        Command::Demo(args) => demo::run(&args),
        Command::Summary(args) => summary::run(&args),
        Command::Codes(args) => codes::run(&args),
    }
}
