// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, converts them into application
// configs and prints the final one-line outcome. No conversion
// logic lives here.
//
// Commands:
//   1. `convert` - artifacts → JSONL
//   2. `inspect` - validate artifacts, print one line each

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ConvertArgs, InspectArgs};

#[derive(Parser, Debug)]
#[command(
    name = "tasktracker-jsonl",
    version,
    about = "Convert saved activation tensors into delta JSONL records for probe training."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Convert(args) => run_convert(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_convert(args: ConvertArgs) -> Result<()> {
    use crate::application::convert_use_case::ConvertUseCase;

    tracing::info!("Converting {} artifacts in '{}'", args.split, args.input_dir.display());

    let output  = args.output.clone();
    let summary = ConvertUseCase::new(args.into()).execute()?;

    println!(
        "Wrote {} rows from {} artifacts to {}{}",
        summary.rows_written,
        summary.artifacts_seen,
        output.display(),
        if summary.truncated { " (max_rows reached)" } else { "" },
    );
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let reports = InspectUseCase::new(args.into()).execute()?;

    let mut total = 0;
    for r in &reports {
        let label = r.label.map_or_else(|| "-".to_string(), |y| y.to_string());
        println!(
            "{} B={} L={} D={} label={} rows={}",
            r.file, r.dims.batch, r.dims.layers, r.dims.dim, label, r.rows
        );
        total += r.rows;
    }
    println!("{} artifacts ok, {} rows", reports.len(), total);
    Ok(())
}
