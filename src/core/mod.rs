//! Core data types for per-gene record selection.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`SequenceRecord`](record::SequenceRecord): One OrthoDB or NCBI sequence with its metadata
//! - [`RecordTable`](table::RecordTable): An ordered, ID-keyed table of records with a
//!   column layout
//! - [`DbSource`](types::DbSource), [`SelectionType`](types::SelectionType): Final dataset
//!   annotations
//! - [`SequenceDataError`](types::SequenceDataError): Per-symbol data problems
//!
//! ## Record IDs
//!
//! The two databases use different identifier schemes:
//!
//! | Source  | Example ID        | Taxonomy ID |
//! |---------|-------------------|-------------|
//! | OrthoDB | `9606_0:00415a`   | `9606_0`    |
//! | NCBI    | `XP_026242723.1`  | `9999`      |
//!
//! Record IDs are unique within a gene's combined table.

pub mod record;
pub mod table;
pub mod types;
