use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::align::{ExternalAligner, DEFAULT_ALIGNER};
use crate::cli::OutputFormat;
use crate::matching::distance::{avg_dist, construct_id_dm, DistanceMatrix};

#[derive(Args)]
pub struct DistanceArgs {
    /// Unaligned FASTA file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Alignment program reading FASTA on stdin and writing the alignment to stdout
    #[arg(long, default_value = DEFAULT_ALIGNER)]
    pub aligner: PathBuf,

    /// Extra argument passed to the aligner (repeatable)
    #[arg(long = "aligner-arg", allow_hyphen_values = true)]
    pub aligner_args: Vec<String>,

    /// Keep the alignment at this path instead of a temporary file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute distance subcommand
///
/// # Errors
///
/// Returns an error if alignment fails or the alignment cannot be read.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: DistanceArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let aligner = ExternalAligner::new(&args.aligner).with_args(args.aligner_args.iter().cloned());

    let scratch = tempfile::TempDir::new()?;
    let aligned = args
        .output
        .clone()
        .unwrap_or_else(|| scratch.path().join("aligned.fasta"));

    let (dm, _) = construct_id_dm(&args.input, &aligned, &aligner)
        .with_context(|| format!("Failed to align {}", args.input.display()))?;
    let means = avg_dist(dm.ids(), &dm)?;

    if verbose {
        eprintln!("Aligned {} records with {}", dm.len(), aligner.program().display());
        if args.output.is_some() {
            eprintln!("Alignment written to {}", aligned.display());
        }
    }

    match format {
        OutputFormat::Text => print_text_results(&dm, &means),
        OutputFormat::Json => {
            let mean: Vec<serde_json::Value> = dm
                .ids()
                .iter()
                .map(|id| {
                    serde_json::json!({
                        "record_id": id,
                        "mean_dist": means.get(id).copied().flatten(),
                    })
                })
                .collect();
            let output = serde_json::json!({ "matrix": dm, "mean": mean });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => print!("{}", dm.to_tsv_string()),
    }

    Ok(())
}

fn print_text_results(dm: &DistanceMatrix, means: &HashMap<String, Option<f64>>) {
    let width = dm.ids().iter().map(String::len).max().unwrap_or(0).max(9);
    print!("{:<width$}", "");
    for i in 0..dm.len() {
        print!(" {:>8}", i + 1);
    }
    println!(" {:>9}", "mean");

    for id in dm.ids() {
        print!("{id:<width$}");
        for other in dm.ids() {
            print!(" {:>8.4}", dm.get(id, other).unwrap_or(f64::NAN));
        }
        match means.get(id).copied().flatten() {
            Some(m) => println!(" {m:>9.4}"),
            None => println!(" {:>9}", "-"),
        }
    }
}
