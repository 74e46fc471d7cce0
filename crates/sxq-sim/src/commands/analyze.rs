use std::error::Error;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use sxq_core::serde::to_canonical_json_string;
use sxq_core::{ErrorInfo, SxqError};
use sxq_eval::{Analyzer, AnalyzerConfig, EventInput, RunAggregator, RunSummary};
use tracing::info;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Event file: a JSON array of events or one event per line.
    #[arg(long)]
    pub events: PathBuf,
    /// YAML analyzer configuration. Defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output directory for `records.jsonl` and `summary.json`.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &AnalyzeArgs) -> Result<(), Box<dyn Error>> {
    let cfg = match &args.config {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::default(),
    };
    let events = read_events(&args.events)?;
    let summary = analyze_events(&Analyzer::new(cfg)?, &events, &args.out)?;
    println!("{}", to_canonical_json_string(&summary)?);
    Ok(())
}

/// Analyzes `events` and writes the records and summary under `out`.
pub fn analyze_events(
    analyzer: &Analyzer,
    events: &[EventInput],
    out: &Path,
) -> Result<RunSummary, Box<dyn Error>> {
    fs::create_dir_all(out)?;
    let mut records = BufWriter::new(fs::File::create(out.join("records.jsonl"))?);
    let mut aggregator = RunAggregator::new();
    for event in events {
        let report = analyzer.analyze_event(event, &mut aggregator);
        for record in &report.records {
            writeln!(records, "{}", to_canonical_json_string(record)?)?;
        }
    }
    records.flush()?;

    let summary = aggregator.summary().with_hash()?;
    fs::write(out.join("summary.json"), serde_json::to_string_pretty(&summary)?)?;
    info!(
        events = summary.events,
        unique = summary.unique_anti_s,
        reconstructed = summary.reconstructed,
        "run finished"
    );
    Ok(summary)
}

/// Reads a JSON array of events, or JSON lines with one event each.
pub fn read_events(path: &Path) -> Result<Vec<EventInput>, SxqError> {
    let text = fs::read_to_string(path).map_err(|err| {
        SxqError::Input(
            ErrorInfo::new("events-read", err.to_string()).with_context("path", path.display().to_string()),
        )
    })?;
    let parse_error = |line: usize, err: serde_json::Error| {
        SxqError::Input(
            ErrorInfo::new("events-parse", err.to_string())
                .with_context("path", path.display().to_string())
                .with_context("line", line.to_string()),
        )
    };
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(&text).map_err(|err| parse_error(err.line(), err));
    }
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| serde_json::from_str(line).map_err(|err| parse_error(idx + 1, err)))
        .collect()
}
