//! # ortho-select
//!
//! A library for assembling per-gene ortholog sequence sets from OrthoDB and NCBI.
//!
//! OrthoDB orthologous groups often hold several records per species: paralogs,
//! isoforms, and unrelated genes sharing the group. NCBI searches for a species
//! return every isoform of a gene. `ortho-select` narrows both down to one record
//! per species, so the final set can go straight into downstream alignment and
//! evolutionary analysis.
//!
//! ## Features
//!
//! - **Alias matching**: Keeps OrthoDB records whose gene ID or description
//!   matches the gene symbol or a known alias, preferring exact symbol matches
//! - **Minimum-distance selection**: Resolves ambiguous species by mean
//!   identity distance to well-annotated species over an external alignment
//! - **Manual overrides**: Honours hand-picked records per gene
//! - **Error log**: Records genes with missing or malformed input so re-runs skip them
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use ortho_select::config::RunConfig;
//! use ortho_select::filter::ncbi::final_combined_input;
//!
//! let config = RunConfig {
//!     run_dir: PathBuf::from("cDNAscreen_041020"),
//!     ncbi_taxid: "9999".to_string(),
//!     ncbi_tax_name: "Urocitellus parryii".to_string(),
//!     odb_test_taxid: "43179_0".to_string(),
//!     tax_subset: vec!["10090_0".into(), "43179_0".into(), "9606_0".into()],
//!     known_species: Vec::new(),
//!     aligner: PathBuf::from("kalign"),
//!     aligner_args: Vec::new(),
//! };
//!
//! let dataset = final_combined_input(&config, "ATP5MC1", &config.aligner()).unwrap();
//! for record in dataset.table.iter() {
//!     println!("{}\t{:?}", record.record_id, record.dist);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`align`]: External multiple sequence alignment
//! - [`config`]: Run configuration and run directory layout
//! - [`core`]: Record and table types
//! - [`filter`]: OrthoDB filtering and NCBI selection pipeline
//! - [`matching`]: Identity distances and minimum-distance selection
//! - [`parsing`]: FASTA, OrthoDB table, and manual selection readers
//! - [`cli`]: Command-line interface implementation

pub mod align;
pub mod cli;
pub mod config;
pub mod core;
pub mod filter;
pub mod matching;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::record::SequenceRecord;
pub use core::table::RecordTable;
pub use core::types::*;
pub use filter::ncbi::{final_combined_input, FinalDataset};
pub use filter::PipelineError;
pub use matching::distance::DistanceMatrix;
