use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Database a record in the final dataset was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbSource {
    #[serde(rename = "OrthoDB")]
    OrthoDb,
    #[serde(rename = "NCBI")]
    Ncbi,
}

impl std::fmt::Display for DbSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrthoDb => write!(f, "OrthoDB"),
            Self::Ncbi => write!(f, "NCBI"),
        }
    }
}

/// How a record ended up in the final dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionType {
    /// Only NCBI record available for the symbol
    NcbiSingleRecord,
    /// Minimum distance NCBI record against the comparison species
    NcbiMinDist,
    /// Only record for its species matching the gene symbol exactly
    SymbolMatchSingleRecord,
    /// Chosen by distance among several exact symbol matches
    SymbolMatchMinDist,
    /// Only record for its species matching a gene alias
    AliasMatchSingleRecord,
    /// Chosen by distance among several alias matches
    AliasMatchMinDist,
    /// Chosen by hand, read from the manual selections table
    ManualSelection,
}

impl SelectionType {
    /// Label written to the records table
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::NcbiSingleRecord => "NCBI single record",
            Self::NcbiMinDist => "NCBI min dist",
            Self::SymbolMatchSingleRecord => "symbol match single record",
            Self::SymbolMatchMinDist => "symbol match min dist",
            Self::AliasMatchSingleRecord => "alias match single record",
            Self::AliasMatchMinDist => "alias match min dist",
            Self::ManualSelection => "manual selection",
        }
    }
}

impl std::fmt::Display for SelectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Malformed or missing sequence data for a gene symbol.
///
/// These are expected per-symbol failures: the caller logs them to the
/// error table and moves on to the next symbol.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SequenceDataError {
    #[error("No sequence records found in {0}")]
    NoRecords(String),

    #[error("Unrecognized organism '{organism}' for record {record_id}")]
    UnknownOrganism { record_id: String, organism: String },

    #[error("Malformed description for record {record_id}: '{description}'")]
    MalformedDescription {
        record_id: String,
        description: String,
    },

    #[error("Aligned sequences differ in length: {record_id} has {length}, expected {expected}")]
    RaggedAlignment {
        record_id: String,
        length: usize,
        expected: usize,
    },

    #[error("Record {0} not present in distance matrix")]
    MissingFromMatrix(String),

    #[error("No candidate records to select from")]
    NoCandidates,

    #[error("No comparison records to measure distance against")]
    NoComparisonRecords,

    #[error("No OrthoDB records matched symbol or aliases of {0}")]
    NoAliasMatches(String),
}
