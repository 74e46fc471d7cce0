use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use sxq_eval::RunSummary;
use sxq_v0::DiagnosticCode;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// `summary.json` produced by `analyze`.
    #[arg(long)]
    pub input: PathBuf,
}

pub fn run(args: &SummaryArgs) -> Result<(), Box<dyn Error>> {
    let summary: RunSummary = serde_json::from_str(&fs::read_to_string(&args.input)?)?;
    let recomputed = summary.clone().with_hash()?;
    if summary.hash.is_some() && summary.hash != recomputed.hash {
        return Err(format!("summary hash mismatch in {}", args.input.display()).into());
    }

    println!("events                   {}", summary.events);
    println!("unique anti-S            {}", summary.unique_anti_s);
    println!("with all granddaughters  {}", summary.with_granddaughters);
    println!("reconstructed            {}", summary.reconstructed);
    println!("reconstructed (weighted) {:.4}", summary.reconstructed_weighted);
    if let Some(eff) = summary.efficiency() {
        println!("efficiency               {eff:.4}");
    }
    for (label, codes) in [
        ("K-short", &summary.kshort_codes),
        ("anti-Lambda", &summary.anti_lambda_codes),
    ] {
        println!("{label} pair codes:");
        for (code, count) in codes {
            match DiagnosticCode::from_code(*code) {
                Some(diag) => println!("  {count:>8}  {diag}"),
                None => println!("  {count:>8}  {code} unknown"),
            }
        }
    }
    Ok(())
}
