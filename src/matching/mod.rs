//! Distance-based record selection.
//!
//! This module provides the core selection functionality:
//!
//! - [`DistanceMatrix`](distance::DistanceMatrix): Pairwise identity distances over an alignment
//! - [`min_dist_record`](selection::min_dist_record): Arg-min candidate against a comparison set
//! - [`avg_dist`](distance::avg_dist): Mean internal distance of each record in a final dataset
//!
//! ## Selection Algorithm
//!
//! 1. **Align**: Candidates and comparison records are written to one FASTA
//!    and aligned by an external tool
//! 2. **Distance**: Identity distance `1 - identical_columns / columns` for every pair
//! 3. **Score**: Each candidate's mean distance to the comparison records
//! 4. **Select**: Minimum mean wins; ties go to the longer sequence, then input order
//!
//! A single candidate short-circuits the selection.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ortho_select::align::ExternalAligner;
//! use ortho_select::matching::distance::construct_id_dm;
//! use std::path::Path;
//!
//! let aligner = ExternalAligner::default();
//! let (dm, _aligned) = construct_id_dm(
//!     Path::new("ATP5MC1.fasta"),
//!     Path::new("ATP5MC1_msa.fasta"),
//!     &aligner,
//! )
//! .unwrap();
//! println!("{}", dm.to_tsv_string());
//! ```

use thiserror::Error;

use crate::align::AlignError;
use crate::core::types::SequenceDataError;
use crate::parsing::ParseError;

pub mod distance;
pub mod selection;

#[derive(Error, Debug)]
pub enum MatchingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Align(#[from] AlignError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    SequenceData(#[from] SequenceDataError),
}
