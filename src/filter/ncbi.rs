//! NCBI record selection and final dataset assembly.
//!
//! For each gene symbol, the NCBI FASTA holds every candidate record of the
//! target species. When there is more than one, all candidates are aligned with
//! the accepted OrthoDB records and the candidate closest (by mean identity
//! distance) to the comparison species is kept. The final dataset is then
//! aligned once more, annotated, and written to the symbol's output directory.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::align::Aligner;
use crate::config::RunConfig;
use crate::core::table::RecordTable;
use crate::core::types::{DbSource, SelectionType};
use crate::filter::odb::{process_odb_input, OdbInput};
use crate::filter::PipelineError;
use crate::matching::distance::{avg_dist, construct_id_dm};
use crate::matching::selection::min_dist_record;
use crate::parsing::fasta::{combined_records, load_ncbi_records, read_records, write_fasta};
use crate::parsing::manual::ManualSelections;
use crate::utils::validation::validate_symbol;

/// OrthoDB columns dropped from the final records table
pub const DEFAULT_DROP_COLUMNS: &[&str] = &["pub_og_id", "level_taxid"];

/// Columns moved to the end of the final records table, in this order
pub const TRAILING_COLUMNS: &[&str] = &["db_source", "selection_type", "length", "dist", "seq"];

/// Output of [`final_combined_input`] for one symbol
#[derive(Debug, Clone, Serialize)]
pub struct FinalDataset {
    pub symbol: String,
    pub table: RecordTable,
    pub unaligned_fasta: PathBuf,
    pub aligned_fasta: PathBuf,
    pub records_tsv: PathBuf,
}

/// Where the records of the final dataset come from
#[derive(Debug, Clone)]
pub struct CombinedSources<'a> {
    pub odb_fasta: &'a Path,
    pub ncbi_fasta: &'a Path,
    pub out_unaln_fasta: &'a Path,
    pub out_aln_fasta: &'a Path,
    pub out_tsv: &'a Path,
}

/// Append the best NCBI record to the accepted OrthoDB records.
///
/// With several NCBI records, all of them are aligned together with
/// `odb_final` and the one with the smallest mean distance to the OrthoDB
/// records of `compare_taxids` is kept, with its distance in `dist`. A single
/// NCBI record is appended as is.
///
/// # Errors
///
/// Returns `SequenceDataError::NoRecords` if the NCBI FASTA is empty, any
/// error from loading the NCBI records, or any alignment or selection error.
pub fn select_ncbi_record<S: std::hash::BuildHasher>(
    odb_fasta: &Path,
    ncbi_fasta: &Path,
    taxid_map: &HashMap<String, String, S>,
    odb_final: &RecordTable,
    compare_taxids: &[String],
    aligner: &dyn Aligner,
) -> Result<RecordTable, PipelineError> {
    let ncbi = load_ncbi_records(ncbi_fasta, taxid_map)?;
    let mut final_combined = odb_final.clone();

    if ncbi.len() == 1 {
        debug!("Single NCBI record in {}", ncbi_fasta.display());
        final_combined.append(ncbi);
        return Ok(final_combined);
    }

    // Align all unfiltered NCBI records against the accepted OrthoDB records
    let odb_ids: Vec<String> = odb_final.ids().map(str::to_string).collect();
    let entries = combined_records(odb_fasta, ncbi_fasta, &odb_ids, None, false)?;
    let scratch = tempfile::TempDir::new()?;
    let unaln = scratch.path().join("ODB_NCBI_unaln.fasta");
    let aln = scratch.path().join("ODB_NCBI_aln.fasta");
    write_fasta(&unaln, &entries)?;
    let (dm, _) = construct_id_dm(&unaln, &aln, aligner)?;

    let mut combined = odb_final.clone();
    combined.append(ncbi.clone());

    let candidate_ids: Vec<String> = ncbi.ids().map(str::to_string).collect();
    let mut compare_ids: Vec<String> = odb_final
        .iter()
        .filter(|r| {
            r.organism_taxid
                .as_ref()
                .is_some_and(|t| compare_taxids.contains(t))
        })
        .map(|r| r.record_id.clone())
        .collect();
    if compare_ids.is_empty() {
        warn!(
            "No OrthoDB records for comparison taxids {compare_taxids:?}; \
             comparing against all {} OrthoDB records",
            odb_ids.len()
        );
        compare_ids = odb_ids;
    }

    let selection = min_dist_record(&dm, &candidate_ids, &compare_ids, &combined)?;
    info!(
        "Selected NCBI record {} from {} candidates",
        selection.record.record_id,
        candidate_ids.len()
    );

    let mut md_row = RecordTable::with_columns(ncbi.columns().iter().cloned());
    md_row.ensure_column("dist");
    md_row.push(selection.record);
    final_combined.append(md_row);
    Ok(final_combined)
}

/// Fill in `db_source` and `selection_type`, drop redundant OrthoDB columns,
/// and move the trailing columns so `seq` is last.
///
/// `ncbi_candidate_count` is the number of records in the unfiltered NCBI FASTA.
/// A manual selection for `symbol` that names a record in the table overrides
/// that record's selection type.
#[must_use]
pub fn annotate_source_and_filter(
    symbol: &str,
    combined: &RecordTable,
    alias_matches: &RecordTable,
    exact_matches: &RecordTable,
    ncbi_candidate_count: usize,
    manual: &ManualSelections,
    drop_columns: &[&str],
) -> RecordTable {
    let mut annotated = combined.clone();
    annotated.ensure_column("db_source");
    annotated.ensure_column("selection_type");

    let ncbi_type = if ncbi_candidate_count > 1 {
        SelectionType::NcbiMinDist
    } else {
        SelectionType::NcbiSingleRecord
    };

    for record in annotated.iter_mut() {
        if !alias_matches.contains(&record.record_id) {
            record.db_source = Some(DbSource::Ncbi);
            record.selection_type = Some(ncbi_type);
            continue;
        }

        record.db_source = Some(DbSource::OrthoDb);
        let taxid = record.organism_taxid.as_deref().unwrap_or_default();
        let em_count = exact_matches.for_taxid(taxid).len();
        let am_count = alias_matches.for_taxid(taxid).len();
        record.selection_type = Some(match (em_count, am_count) {
            (0, 1) => SelectionType::AliasMatchSingleRecord,
            (0, _) => SelectionType::AliasMatchMinDist,
            (1, _) => SelectionType::SymbolMatchSingleRecord,
            _ => SelectionType::SymbolMatchMinDist,
        });
    }

    if let Some(record_id) = manual.get(symbol) {
        match annotated.get_mut(record_id) {
            Some(record) => record.selection_type = Some(SelectionType::ManualSelection),
            None => warn!("{symbol}: manual selection {record_id} is not in the final record set"),
        }
    }

    if !drop_columns.is_empty() {
        annotated.drop_columns(drop_columns);
    }
    annotated.move_to_end(TRAILING_COLUMNS);
    annotated
}

/// Write the final dataset and its records table.
///
/// Writes 1) the unaligned FASTA (OrthoDB then NCBI records, in table order),
/// 2) its alignment, and 3) the annotated records table, with each record's
/// mean distance to the rest of the dataset in `dist`.
///
/// # Errors
///
/// Returns any I/O, parse, alignment, or distance error.
pub fn combined_records_processing(
    symbol: &str,
    odb: &OdbInput,
    combined: &RecordTable,
    sources: &CombinedSources<'_>,
    ncbi_candidate_count: usize,
    manual: &ManualSelections,
    aligner: &dyn Aligner,
) -> Result<RecordTable, PipelineError> {
    if let Some(dir) = sources.out_tsv.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let (odb_ids, ncbi_ids): (Vec<String>, Vec<String>) = combined
        .ids()
        .map(str::to_string)
        .partition(|id| odb.alias_matches.contains(id));
    let entries = combined_records(
        sources.odb_fasta,
        sources.ncbi_fasta,
        &odb_ids,
        Some(ncbi_ids.as_slice()),
        true,
    )?;
    write_fasta(sources.out_unaln_fasta, &entries)?;

    let (dm, _) = construct_id_dm(sources.out_unaln_fasta, sources.out_aln_fasta, aligner)?;
    let ids: Vec<String> = combined.ids().map(str::to_string).collect();
    let dists = avg_dist(&ids, &dm)?;

    let mut processed = combined.clone();
    processed.ensure_column("dist");
    for record in processed.iter_mut() {
        record.dist = dists.get(&record.record_id).copied().flatten();
    }

    let processed = annotate_source_and_filter(
        symbol,
        &processed,
        &odb.alias_matches,
        &odb.exact_matches,
        ncbi_candidate_count,
        manual,
        DEFAULT_DROP_COLUMNS,
    );
    processed.write_tsv(sources.out_tsv)?;
    info!(
        "{symbol}: wrote {} records to {}",
        processed.len(),
        sources.out_tsv.display()
    );
    Ok(processed)
}

/// Build the final OrthoDB + NCBI dataset for `symbol` and write it under
/// `<run>/output/<symbol>/`.
///
/// # Errors
///
/// Returns `PipelineError::Validation` for an unusable symbol,
/// `PipelineError::SequenceData` for missing or malformed sequence data, or
/// any I/O, parse, or alignment error.
pub fn final_combined_input(
    config: &RunConfig,
    symbol: &str,
    aligner: &dyn Aligner,
) -> Result<FinalDataset, PipelineError> {
    let symbol = validate_symbol(symbol)?;
    let paths = config.paths();
    let manual = ManualSelections::load(&paths.manual_selections())?;

    let odb_fasta = paths.odb_fasta(symbol);
    let ncbi_fasta = paths.ncbi_fasta(symbol);

    let odb = process_odb_input(symbol, config, &manual, aligner)?;
    let combined = select_ncbi_record(
        &odb_fasta,
        &ncbi_fasta,
        &config.taxid_map(),
        &odb.final_table,
        &config.compare_taxids(),
        aligner,
    )?;
    let ncbi_candidate_count = read_records(&ncbi_fasta)?.len();

    let unaligned_fasta = paths.out_unaln_fasta(symbol);
    let aligned_fasta = paths.out_aln_fasta(symbol);
    let records_tsv = paths.out_records_tsv(symbol);
    let sources = CombinedSources {
        odb_fasta: &odb_fasta,
        ncbi_fasta: &ncbi_fasta,
        out_unaln_fasta: &unaligned_fasta,
        out_aln_fasta: &aligned_fasta,
        out_tsv: &records_tsv,
    };
    let table = combined_records_processing(
        symbol,
        &odb,
        &combined,
        &sources,
        ncbi_candidate_count,
        &manual,
        aligner,
    )?;

    Ok(FinalDataset {
        symbol: symbol.to_string(),
        table,
        unaligned_fasta,
        aligned_fasta,
        records_tsv,
    })
}
