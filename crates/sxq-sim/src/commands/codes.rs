use std::error::Error;

use clap::Args;
use sxq_v0::{stage_names, DiagnosticCode, Rejection};

#[derive(Args, Debug)]
pub struct CodesArgs {
    /// Also list the cascade stages in evaluation order.
    #[arg(long)]
    pub stages: bool,
}

pub fn run(args: &CodesArgs) -> Result<(), Box<dyn Error>> {
    for code in all_codes() {
        println!("{code}");
    }
    if args.stages {
        println!();
        for (idx, name) in stage_names().enumerate() {
            println!("{:>2} {name}", idx + 1);
        }
    }
    Ok(())
}

fn all_codes() -> impl Iterator<Item = DiagnosticCode> {
    std::iter::once(DiagnosticCode::Accepted)
        .chain(Rejection::ALL.into_iter().map(DiagnosticCode::Rejected))
        .chain([
            DiagnosticCode::BothTracksFailedSelection,
            DiagnosticCode::FirstTrackFailedSelection,
            DiagnosticCode::SecondTrackFailedSelection,
        ])
}
