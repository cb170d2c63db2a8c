use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::core::table::RecordTable;
use crate::parsing::fasta::load_ncbi_records;

#[derive(Args)]
pub struct RecordsArgs {
    /// NCBI FASTA file (plain or gzipped)
    #[arg(required = true)]
    pub input: PathBuf,

    /// NCBI taxonomy ID of the species in the file
    #[arg(long, required = true)]
    pub taxid: String,

    /// Scientific name of that species, as written in the descriptions
    #[arg(long, required = true)]
    pub tax_name: String,

    /// Include sequences in text output
    #[arg(long)]
    pub show_seq: bool,
}

/// Execute records subcommand
///
/// # Errors
///
/// Returns an error if the FASTA cannot be read or a description names an
/// organism other than `--tax-name`.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: RecordsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let taxid_map = HashMap::from([(args.tax_name.clone(), args.taxid.clone())]);
    let table = load_ncbi_records(&args.input, &taxid_map)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    if verbose {
        eprintln!("Loaded {} records from {}", table.len(), args.input.display());
    }

    match format {
        OutputFormat::Text => print_text_results(&table, args.show_seq),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
        OutputFormat::Tsv => print!("{}", table.to_tsv_string()),
    }

    Ok(())
}

fn print_text_results(table: &RecordTable, show_seq: bool) {
    println!("{} records", table.len());
    println!();
    for record in table.iter() {
        println!(
            "{:<20} {:>6} aa  {}",
            record.record_id,
            record.length,
            record.description.as_deref().unwrap_or("(no description)")
        );
        if show_seq {
            println!("    {}", record.seq);
        }
    }
}
