//! OrthoDB record filtering.
//!
//! Raw OrthoDB tables for a gene hold every record of the orthologous group,
//! including paralogs and unrelated genes sharing the group. Filtering keeps
//! records whose gene ID or description matches the symbol or one of its
//! aliases, then picks one record per species:
//!
//! 1. Exact symbol matches are preferred over alias matches
//! 2. A species with a single candidate keeps it
//! 3. A manual selection for the symbol wins when it is among the candidates
//! 4. Known species with several candidates are resolved by distance to the
//!    unambiguous known-species records
//! 5. Remaining species are resolved by distance to the known-species selections

use std::collections::{HashMap, HashSet};
use std::path::Path;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::align::Aligner;
use crate::config::RunConfig;
use crate::core::table::RecordTable;
use crate::core::types::SequenceDataError;
use crate::filter::PipelineError;
use crate::matching::distance::{align_entries, DistanceMatrix};
use crate::matching::selection::min_dist_record;
use crate::parsing::fasta::FastaEntry;
use crate::parsing::manual::ManualSelections;
use crate::parsing::tsv::{attach_sequences, load_odb_table};
use crate::parsing::ParseError;

/// OrthoDB records accepted for a symbol
#[derive(Debug, Clone)]
pub struct OdbInput {
    /// One record per species
    pub final_table: RecordTable,
    /// Records matching the symbol or an alias
    pub alias_matches: RecordTable,
    /// Records whose gene ID is exactly the symbol or an alias
    pub exact_matches: RecordTable,
}

/// Result of alias matching against an OrthoDB table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMatches {
    /// Matching record IDs, in table order
    pub record_ids: Vec<String>,
    /// Gene IDs from the table that equal the symbol or an alias
    pub exact_names: Vec<String>,
}

/// Normalize free text for alias comparison: lowercase, with every run of
/// non-alphanumeric characters collapsed to a single space.
#[must_use]
pub fn format_odb_field(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

/// Word-bounded pattern for a formatted alias
#[must_use]
pub fn odb_field_to_re(formatted: &str) -> String {
    format!(r"\b{}\b", regex::escape(formatted))
}

/// Combined alias pattern; `None` when no alias survives formatting
fn aliases_regex(aliases: &[String]) -> Option<Regex> {
    let patterns: Vec<String> = aliases
        .iter()
        .map(|a| format_odb_field(a))
        .filter(|a| !a.is_empty())
        .map(|a| odb_field_to_re(&a))
        .collect();
    if patterns.is_empty() {
        return None;
    }
    Regex::new(&format!("({})", patterns.join("|"))).ok()
}

/// Split an OrthoDB `pub_gene_id` such as `ATP5G1;ATP5MC1` into its parts
fn gene_id_parts(pub_gene_id: &str) -> impl Iterator<Item = &str> {
    pub_gene_id.split(';').map(str::trim).filter(|s| !s.is_empty())
}

/// Read aliases for a symbol, one per line. The symbol itself is always
/// included, so a missing file still matches on the symbol.
///
/// # Errors
///
/// Returns `ParseError::Io` if an existing file cannot be read.
pub fn load_aliases(path: &Path, symbol: &str) -> Result<Vec<String>, ParseError> {
    let mut aliases = vec![symbol.to_string()];
    if path.exists() {
        for line in std::fs::read_to_string(path)?.lines() {
            let alias = line.trim();
            if !alias.is_empty() && !aliases.iter().any(|a| a == alias) {
                aliases.push(alias.to_string());
            }
        }
    } else {
        debug!("No alias file at {}; matching on {symbol} only", path.display());
    }
    Ok(aliases)
}

/// Find records whose `pub_gene_id` or `description` matches an alias.
#[must_use]
pub fn find_alias_matches(table: &RecordTable, aliases: &[String]) -> AliasMatches {
    let Some(re) = aliases_regex(aliases) else {
        return AliasMatches::default();
    };
    let alias_set: HashSet<String> = aliases.iter().map(|a| a.to_uppercase()).collect();

    let mut matches = AliasMatches::default();
    for record in table.iter() {
        let gene_id = record.extra.get("pub_gene_id").map_or("", String::as_str);
        let description = record.description.as_deref().unwrap_or("");

        let matched = gene_id_parts(gene_id).any(|g| re.is_match(&format_odb_field(g)))
            || re.is_match(&format_odb_field(description));
        if !matched {
            continue;
        }
        matches.record_ids.push(record.record_id.clone());

        for part in gene_id_parts(gene_id) {
            if alias_set.contains(&part.to_uppercase())
                && !matches.exact_names.iter().any(|n| n == part)
            {
                matches.exact_names.push(part.to_string());
            }
        }
    }
    matches
}

/// Rows whose `pub_gene_id` contains one of `names`
#[must_use]
pub fn exact_match(table: &RecordTable, names: &[String]) -> RecordTable {
    table.filter(|r| {
        r.extra
            .get("pub_gene_id")
            .is_some_and(|g| gene_id_parts(g).any(|p| names.iter().any(|n| n == p)))
    })
}

/// Candidate records per species: exact matches if the species has any,
/// alias matches otherwise. Species are listed in `taxids` order.
fn candidates_by_taxid(
    taxids: &[String],
    alias_matches: &RecordTable,
    exact_matches: &RecordTable,
) -> Vec<(String, Vec<String>)> {
    taxids
        .iter()
        .filter_map(|taxid| {
            let em = exact_matches.for_taxid(taxid);
            let pool = if em.is_empty() {
                alias_matches.for_taxid(taxid)
            } else {
                em
            };
            let ids: Vec<String> = pool.ids().map(str::to_string).collect();
            (!ids.is_empty()).then(|| (taxid.clone(), ids))
        })
        .collect()
}

/// Compare set used to resolve a species with several candidates.
///
/// Falls back from `preferred` to `fallback`, and finally to the candidates
/// themselves, which picks the record closest to the others of its species.
fn compare_set(preferred: &[String], fallback: &[String], own: &[String]) -> Vec<String> {
    if !preferred.is_empty() {
        preferred.to_vec()
    } else if !fallback.is_empty() {
        fallback.to_vec()
    } else {
        own.to_vec()
    }
}

/// Select one OrthoDB record per species for `symbol`
///
/// # Errors
///
/// Returns `SequenceDataError::NoRecords` if the OrthoDB table has no usable
/// records, `SequenceDataError::NoAliasMatches` if nothing matches the symbol
/// or its aliases, or any I/O, parse, or alignment error.
pub fn process_odb_input(
    symbol: &str,
    config: &RunConfig,
    manual: &ManualSelections,
    aligner: &dyn Aligner,
) -> Result<OdbInput, PipelineError> {
    let paths = config.paths();
    let odb_tsv = paths.odb_tsv(symbol);
    let odb_fasta = paths.odb_fasta(symbol);

    let mut table = load_odb_table(&odb_tsv, Some(config.tax_subset.as_slice()))?;
    let missing = attach_sequences(&mut table, &odb_fasta)?;
    if !missing.is_empty() {
        warn!(
            "{symbol}: {} OrthoDB records have no sequence in {} and were dropped",
            missing.len(),
            odb_fasta.display()
        );
        table = table.filter(|r| r.has_seq());
    }
    if table.is_empty() {
        return Err(SequenceDataError::NoRecords(odb_tsv.display().to_string()).into());
    }

    let aliases = load_aliases(&paths.aliases(symbol), symbol)?;
    let matches = find_alias_matches(&table, &aliases);
    if matches.record_ids.is_empty() {
        return Err(SequenceDataError::NoAliasMatches(symbol.to_string()).into());
    }
    let alias_matches = table.subset(&matches.record_ids);
    let exact_matches = exact_match(&alias_matches, &matches.exact_names);
    debug!(
        "{symbol}: {} alias matches, {} exact matches ({:?})",
        alias_matches.len(),
        exact_matches.len(),
        matches.exact_names
    );

    let candidates = candidates_by_taxid(&config.tax_subset, &alias_matches, &exact_matches);
    let known: HashSet<&str> = config
        .known_species_or_subset()
        .iter()
        .map(String::as_str)
        .collect();

    let manual_pick = manual.get(symbol);
    let mut chosen: HashMap<String, String> = HashMap::new();
    let mut ambiguous: Vec<(String, Vec<String>)> = Vec::new();
    for (taxid, ids) in &candidates {
        if ids.len() == 1 {
            chosen.insert(taxid.clone(), ids[0].clone());
        } else if let Some(pick) = manual_pick.filter(|p| ids.iter().any(|id| id.as_str() == *p)) {
            info!("{symbol}: using manual selection {pick} for {taxid}");
            chosen.insert(taxid.clone(), pick.to_string());
        } else {
            ambiguous.push((taxid.clone(), ids.clone()));
        }
    }

    let mut dists: HashMap<String, f64> = HashMap::new();
    if !ambiguous.is_empty() {
        let entries: Vec<FastaEntry> = candidates
            .iter()
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|id| alias_matches.get(id))
            .map(FastaEntry::from)
            .collect();
        let scratch = tempfile::TempDir::new()?;
        let (dm, _) = align_entries(
            &entries,
            &scratch.path().join("odb_unaln.fasta"),
            &scratch.path().join("odb_aln.fasta"),
            aligner,
        )?;

        // Known species first, against the unambiguous known-species records
        let (known_ambiguous, outgroup): (Vec<_>, Vec<_>) = ambiguous
            .into_iter()
            .partition(|(taxid, _)| known.contains(taxid.as_str()));

        let settled_known: Vec<String> = chosen
            .iter()
            .filter(|(taxid, _)| known.contains(taxid.as_str()))
            .map(|(_, id)| id.clone())
            .collect();
        for (taxid, ids) in &known_ambiguous {
            let other_known: Vec<String> = candidates
                .iter()
                .filter(|(t, _)| t != taxid && known.contains(t.as_str()))
                .flat_map(|(_, ids)| ids.iter().cloned())
                .collect();
            let compare = compare_set(&settled_known, &other_known, ids);
            resolve(symbol, taxid, ids, &compare, &dm, &alias_matches, &mut chosen, &mut dists)?;
        }

        // Then everything else, against the known-species selections
        let known_selected: Vec<String> = chosen
            .iter()
            .filter(|(taxid, _)| known.contains(taxid.as_str()))
            .map(|(_, id)| id.clone())
            .collect();
        for (taxid, ids) in &outgroup {
            let all_chosen: Vec<String> = chosen.values().cloned().collect();
            let compare = compare_set(&known_selected, &all_chosen, ids);
            resolve(symbol, taxid, ids, &compare, &dm, &alias_matches, &mut chosen, &mut dists)?;
        }
    }

    let selected_ids: Vec<String> = candidates
        .iter()
        .filter_map(|(taxid, _)| chosen.get(taxid).cloned())
        .collect();
    let mut final_table = alias_matches.subset(&selected_ids);
    for record in final_table.iter_mut() {
        record.dist = dists.get(&record.record_id).copied();
    }

    let missing_known: Vec<&str> = known
        .iter()
        .filter(|t| !chosen.contains_key(**t))
        .copied()
        .collect();
    if !missing_known.is_empty() {
        warn!("{symbol}: no OrthoDB record for known species {missing_known:?}");
    }
    info!(
        "{symbol}: selected {} OrthoDB records across {} species",
        final_table.len(),
        candidates.len()
    );

    Ok(OdbInput {
        final_table,
        alias_matches,
        exact_matches,
    })
}

#[allow(clippy::too_many_arguments)]
fn resolve(
    symbol: &str,
    taxid: &str,
    ids: &[String],
    compare: &[String],
    dm: &DistanceMatrix,
    records: &RecordTable,
    chosen: &mut HashMap<String, String>,
    dists: &mut HashMap<String, f64>,
) -> Result<(), SequenceDataError> {
    let selection = min_dist_record(dm, ids, compare, records)?;
    debug!(
        "{symbol}: {taxid} resolved to {} out of {} candidates",
        selection.record.record_id,
        ids.len()
    );
    if let Some(d) = selection.dist {
        dists.insert(selection.record.record_id.clone(), d);
    }
    chosen.insert(taxid.to_string(), selection.record.record_id);
    Ok(())
}
