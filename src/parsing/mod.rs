//! Parsers for the per-gene input files.
//!
//! This module provides readers and writers for:
//!
//! - **FASTA files**: OrthoDB and NCBI sequence sets, plain or gzip compressed
//! - **OrthoDB TSV tables**: Record metadata keyed by `int_prot_id`
//! - **Manual selections**: Hand-picked records keyed by gene symbol
//!
//! ## Example
//!
//! ```rust,no_run
//! use ortho_select::parsing::fasta::load_ncbi_records;
//! use std::collections::HashMap;
//! use std::path::Path;
//!
//! let taxids = HashMap::from([("Urocitellus parryii".to_string(), "9999".to_string())]);
//! let table = load_ncbi_records(Path::new("ATP5MC1.fasta"), &taxids).unwrap();
//! println!("{} NCBI records", table.len());
//! ```
//!
//! ## NCBI descriptions
//!
//! NCBI FASTA headers follow the form
//! `XP_026242723.1 ATP synthase F(0) complex subunit C1 [Urocitellus parryii]`;
//! the bracketed organism name is mapped to a taxonomy ID.

use thiserror::Error;

use crate::core::types::SequenceDataError;

pub mod fasta;
pub mod manual;
pub mod tsv;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Too many records: {0} exceeds maximum allowed (100000)")]
    TooManyRecords(usize),

    #[error(transparent)]
    SequenceData(#[from] SequenceDataError),
}
