//! Per-gene record filtering and the combined OrthoDB + NCBI dataset.
//!
//! - [`odb`]: Alias matching and one-record-per-species OrthoDB selection
//! - [`ncbi`]: Minimum-distance NCBI record selection, annotation, and output
//!
//! ## Example
//!
//! ```rust,no_run
//! use ortho_select::config::RunConfig;
//! use ortho_select::filter::ncbi::final_combined_input;
//!
//! # fn run(config: &RunConfig) -> Result<(), ortho_select::filter::PipelineError> {
//! let aligner = config.aligner();
//! let dataset = final_combined_input(config, "ATP5MC1", &aligner)?;
//! println!("{} records written", dataset.table.len());
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

use crate::align::AlignError;
use crate::core::types::SequenceDataError;
use crate::matching::MatchingError;
use crate::parsing::ParseError;
use crate::utils::validation::ValidationError;

pub mod ncbi;
pub mod odb;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(ParseError),

    #[error(transparent)]
    Align(#[from] AlignError),

    #[error(transparent)]
    SequenceData(#[from] SequenceDataError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<ParseError> for PipelineError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::SequenceData(d) => Self::SequenceData(d),
            other => Self::Parse(other),
        }
    }
}

impl From<MatchingError> for PipelineError {
    fn from(e: MatchingError) -> Self {
        match e {
            MatchingError::Io(e) => Self::Io(e),
            MatchingError::Align(e) => Self::Align(e),
            MatchingError::Parse(e) => e.into(),
            MatchingError::SequenceData(e) => Self::SequenceData(e),
        }
    }
}

impl PipelineError {
    /// Name written to the `error_type` column of the error log
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Io(_) => "IOError",
            Self::Parse(_) => "ParseError",
            Self::Align(_) => "AlignError",
            Self::SequenceData(_) => "SequenceDataError",
            Self::Validation(_) => "ValidationError",
        }
    }

    /// Whether the error concerns one symbol's input data, so the run can
    /// log it and continue with the next symbol
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::SequenceData(_) | Self::Parse(_) | Self::Validation(_)
        )
    }
}
