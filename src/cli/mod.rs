//! Command-line interface for ortho-select.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **select**: Build the combined OrthoDB + NCBI dataset for gene symbols
//! - **records**: Show an NCBI FASTA as a record table
//! - **distance**: Align a FASTA and show its identity distance matrix
//!
//! ## Usage
//!
//! ```text
//! # Select records for two genes
//! ortho-select select ATP5MC1 CALM1 --run-dir cDNAscreen_041020 \
//!     --ncbi-taxid 9999 --ncbi-tax-name "Urocitellus parryii" \
//!     --odb-test-taxid 43179_0 --tax-subset 10090_0,43179_0,9606_0
//!
//! # Symbols from a file, JSON summary
//! ortho-select select --symbols-file genes.txt ... --format json
//!
//! # Inspect NCBI candidates
//! ortho-select records ATP5MC1.fasta --taxid 9999 --tax-name "Urocitellus parryii"
//!
//! # Distance matrix of a gene set
//! ortho-select distance ATP5MC1.fasta --aligner kalign
//! ```

use clap::{Parser, Subcommand};

pub mod distance;
pub mod records;
pub mod select;

#[derive(Parser)]
#[command(name = "ortho-select")]
#[command(version)]
#[command(about = "Select one ortholog record per species from OrthoDB and NCBI")]
#[command(
    long_about = "ortho-select builds a per-gene set of ortholog sequences.\n\n\
        For each gene symbol it keeps one OrthoDB record per species, chosen by symbol or \
        alias match and, when ambiguous, by identity distance to well-annotated species. \
        It then adds the NCBI record of the target species closest to a comparison species, \
        aligns the final set, and writes the records table with per-record distances."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Select OrthoDB and NCBI records for gene symbols
    Select(select::SelectArgs),

    /// Show the records of an NCBI FASTA
    Records(records::RecordsArgs),

    /// Align a FASTA and show its identity distance matrix
    Distance(distance::DistanceArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
