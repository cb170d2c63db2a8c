//! FASTA reading and writing using noodles.
//!
//! Reads OrthoDB and NCBI sequence sets and writes the combined per-gene
//! FASTA files handed to the aligner. Supports both uncompressed and
//! gzip/bgzip compressed input.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.faa` (uncompressed)
//! - `.fa.gz`, `.fasta.gz`, `.faa.gz`, `.bgz` (compressed)

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use noodles::fasta;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::record::SequenceRecord;
use crate::core::table::RecordTable;
use crate::core::types::SequenceDataError;
use crate::parsing::ParseError;
use crate::utils::validation::check_record_limit;

/// Column layout of a freshly loaded NCBI table
pub const NCBI_COLUMNS: &[&str] = &[
    "organism_taxid",
    "organism_name",
    "description",
    "length",
    "seq",
];

/// One FASTA record as read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaEntry {
    pub id: String,
    pub description: Option<String>,
    pub seq: String,
}

impl FastaEntry {
    pub fn new(id: impl Into<String>, seq: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            seq: seq.into(),
        }
    }
}

impl From<&SequenceRecord> for FastaEntry {
    fn from(record: &SequenceRecord) -> Self {
        Self {
            id: record.record_id.clone(),
            description: record.description.clone(),
            seq: record.seq.clone(),
        }
    }
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

fn open(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = std::fs::File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read every record of a FASTA file.
///
/// An empty file yields an empty list; callers decide whether that is an error.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, or `ParseError::TooManyRecords` if the limit is exceeded.
pub fn read_records(path: &Path) -> Result<Vec<FastaEntry>, ParseError> {
    let mut reader = fasta::io::Reader::new(open(path)?);
    read_from(&mut reader)
}

/// Parse from a noodles FASTA reader
fn read_from<R: BufRead>(reader: &mut fasta::io::Reader<R>) -> Result<Vec<FastaEntry>, ParseError> {
    let mut entries = Vec::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        if check_record_limit(entries.len()).is_some() {
            return Err(ParseError::TooManyRecords(entries.len()));
        }

        let id = String::from_utf8_lossy(record.name()).to_string();
        let description = record
            .description()
            .map(|d| String::from_utf8_lossy(d).trim().to_string())
            .filter(|d| !d.is_empty());
        let seq = String::from_utf8_lossy(record.sequence().as_ref()).to_string();

        entries.push(FastaEntry {
            id,
            description,
            seq,
        });
    }

    Ok(entries)
}

/// Trailing `[Genus species]` or `[Genus species subspecies]`
static ORGANISM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\w+\s\w+(?:\s\w+)?)\]$").expect("organism pattern is valid"));

/// Extract the organism name from a standard NCBI description.
///
/// Matches a trailing `[Genus species]` or `[Genus species subspecies]`.
#[must_use]
pub fn parse_organism(description: &str) -> Option<String> {
    ORGANISM_RE
        .captures(description.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Load an NCBI FASTA into a record table.
///
/// Records with a standard description get `organism_name`, `organism_taxid`
/// (looked up in `taxid_map`) and `description` filled in. Records without a
/// description carry only their sequence and length.
///
/// # Errors
///
/// Returns `SequenceDataError::NoRecords` for an empty file,
/// `SequenceDataError::MalformedDescription` when no organism can be parsed
/// from a description, `SequenceDataError::UnknownOrganism` when the organism
/// is not in `taxid_map`, or any error from [`read_records`].
pub fn load_ncbi_records<S: std::hash::BuildHasher>(
    path: &Path,
    taxid_map: &HashMap<String, String, S>,
) -> Result<RecordTable, ParseError> {
    let entries = read_records(path)?;
    if entries.is_empty() {
        return Err(SequenceDataError::NoRecords(path.display().to_string()).into());
    }

    let mut table = RecordTable::with_columns(NCBI_COLUMNS.iter().copied());
    for entry in entries {
        let mut record = SequenceRecord::new(&entry.id).with_seq(entry.seq);

        if let Some(description) = entry.description {
            let organism = parse_organism(&description).ok_or_else(|| {
                SequenceDataError::MalformedDescription {
                    record_id: entry.id.clone(),
                    description: description.clone(),
                }
            })?;
            let taxid = taxid_map.get(&organism).ok_or_else(|| {
                SequenceDataError::UnknownOrganism {
                    record_id: entry.id.clone(),
                    organism: organism.clone(),
                }
            })?;
            record.organism_taxid = Some(taxid.clone());
            record.organism_name = Some(organism);
            record.description = Some(description);
        }

        table.push(record);
    }

    debug!("Loaded {} NCBI records from {}", table.len(), path.display());
    Ok(table)
}

/// Write records as FASTA to any writer
///
/// # Errors
///
/// Returns an I/O error if writing fails.
pub fn write_fasta_to<W: Write>(out: W, entries: &[FastaEntry]) -> std::io::Result<()> {
    let mut writer = fasta::io::Writer::new(out);
    for entry in entries {
        let definition = fasta::record::Definition::new(
            entry.id.as_bytes().to_vec(),
            entry.description.as_ref().map(|d| d.as_bytes().to_vec().into()),
        );
        let sequence = fasta::record::Sequence::from(entry.seq.as_bytes().to_vec());
        writer.write_record(&fasta::Record::new(definition, sequence))?;
    }
    Ok(())
}

/// Write records as FASTA to `path`
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created or written.
pub fn write_fasta(path: &Path, entries: &[FastaEntry]) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);
    write_fasta_to(&mut out, entries)?;
    out.flush()
}

/// Keep the entries whose ID is in `subset`.
///
/// With `ordered`, the result follows the order of `subset`; otherwise it
/// follows file order.
fn restrict(entries: Vec<FastaEntry>, subset: &[String], ordered: bool) -> Vec<FastaEntry> {
    if ordered {
        let mut by_id: HashMap<String, FastaEntry> =
            entries.into_iter().map(|e| (e.id.clone(), e)).collect();
        subset.iter().filter_map(|id| by_id.remove(id)).collect()
    } else {
        entries
            .into_iter()
            .filter(|e| subset.contains(&e.id))
            .collect()
    }
}

/// Combined OrthoDB + NCBI record stream used for alignment input.
///
/// OrthoDB records restricted to `odb_subset` come first, followed by NCBI
/// records (all of them, or only `ncbi_subset` when given).
///
/// # Errors
///
/// Returns any error from [`read_records`].
pub fn combined_records(
    odb_fasta: &Path,
    ncbi_fasta: &Path,
    odb_subset: &[String],
    ncbi_subset: Option<&[String]>,
    ordered: bool,
) -> Result<Vec<FastaEntry>, ParseError> {
    let mut combined = restrict(read_records(odb_fasta)?, odb_subset, ordered);
    let ncbi = read_records(ncbi_fasta)?;
    match ncbi_subset {
        Some(subset) => combined.extend(restrict(ncbi, subset, ordered)),
        None => combined.extend(ncbi),
    }
    Ok(combined)
}

/// Map of record ID to sequence length, optionally restricted to `subset`
///
/// # Errors
///
/// Returns any error from [`read_records`].
pub fn length_map(
    path: &Path,
    subset: Option<&[String]>,
) -> Result<HashMap<String, usize>, ParseError> {
    Ok(read_records(path)?
        .into_iter()
        .filter(|e| subset.map_or(true, |s| s.contains(&e.id)))
        .map(|e| (e.id, e.seq.len()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const NCBI_FASTA: &[u8] = b"\
        >XP_026242723.1 ATP synthase F(0) complex subunit C1, mitochondrial [Urocitellus parryii]\n\
        MQTAGALFISPALIRCCTRGLIRPVSASFLNSPVNSSKQPSYSNFPLQVARREFQTSVVS\n\
        RDIDTAAKFIGAGAAT\n\
        >XP_026242724.1 ATP synthase F(0) complex subunit C1, mitochondrial isoform X2 \
        [Urocitellus parryii]\n\
        MQTAGALFISPALIRCCTRGLIRPVSASFLNSRDIDTAAKFIGAGAAT\n\
    ";

    fn temp_fasta(content: &[u8]) -> NamedTempFile {
        let mut temp = NamedTempFile::with_suffix(".fasta").unwrap();
        temp.write_all(content).unwrap();
        temp.flush().unwrap();
        temp
    }

    fn taxids() -> HashMap<String, String> {
        HashMap::from([("Urocitellus parryii".to_string(), "9999".to_string())])
    }

    #[test]
    fn test_read_records() {
        let temp = temp_fasta(b">a desc one\nMKV\nLA\n>b\nMK\n");
        let entries = read_records(temp.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "a");
        assert_eq!(entries[0].description.as_deref(), Some("desc one"));
        assert_eq!(entries[0].seq, "MKVLA");
        assert_eq!(entries[1].description, None);
    }

    #[test]
    fn test_read_empty_fasta() {
        let temp = temp_fasta(b"");
        assert!(read_records(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_organism() {
        assert_eq!(
            parse_organism("ATP synthase subunit C1 [Urocitellus parryii]").as_deref(),
            Some("Urocitellus parryii")
        );
        assert_eq!(
            parse_organism("hypothetical protein [Canis lupus familiaris]").as_deref(),
            Some("Canis lupus familiaris")
        );
        assert_eq!(parse_organism("no organism here"), None);
        assert_eq!(parse_organism("[Homo] trailing text"), None);
    }

    #[test]
    fn test_load_ncbi_records() {
        let temp = temp_fasta(NCBI_FASTA);
        let table = load_ncbi_records(temp.path(), &taxids()).unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.contains("XP_026242723.1"));
        let record = table.get("XP_026242723.1").unwrap();
        assert_eq!(record.organism_taxid.as_deref(), Some("9999"));
        assert_eq!(record.organism_name.as_deref(), Some("Urocitellus parryii"));
        assert_eq!(record.length, 76);
        assert_eq!(table.columns(), NCBI_COLUMNS);
    }

    #[test]
    fn test_load_ncbi_unknown_organism() {
        let temp = temp_fasta(b">XP_1.1 some protein [Mus musculus]\nMK\n");
        let err = load_ncbi_records(temp.path(), &taxids()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::SequenceData(SequenceDataError::UnknownOrganism { .. })
        ));
    }

    #[test]
    fn test_load_ncbi_empty_is_data_error() {
        let temp = temp_fasta(b"");
        let err = load_ncbi_records(temp.path(), &taxids()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::SequenceData(SequenceDataError::NoRecords(_))
        ));
    }

    #[test]
    fn test_load_ncbi_without_description() {
        let temp = temp_fasta(b">XP_1.1\nMKV\n");
        let table = load_ncbi_records(temp.path(), &taxids()).unwrap();
        let record = table.get("XP_1.1").unwrap();
        assert_eq!(record.organism_taxid, None);
        assert_eq!(record.length, 3);
    }

    #[test]
    fn test_write_then_read() {
        let temp = NamedTempFile::with_suffix(".fasta").unwrap();
        let entries = vec![
            FastaEntry {
                id: "a".to_string(),
                description: Some("first [Homo sapiens]".to_string()),
                seq: "MKV".to_string(),
            },
            FastaEntry::new("b", "MK-V"),
        ];
        write_fasta(temp.path(), &entries).unwrap();
        assert_eq!(read_records(temp.path()).unwrap(), entries);
    }

    #[test]
    fn test_combined_records_ordering() {
        let odb = temp_fasta(b">o1\nMA\n>o2\nMB\n>o3\nMC\n");
        let ncbi = temp_fasta(b">n1\nMD\n>n2\nME\n");
        let odb_subset = vec!["o3".to_string(), "o1".to_string()];

        let unordered =
            combined_records(odb.path(), ncbi.path(), &odb_subset, None, false).unwrap();
        let ids: Vec<_> = unordered.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["o1", "o3", "n1", "n2"]);

        let ncbi_subset = vec!["n2".to_string()];
        let ordered = combined_records(
            odb.path(),
            ncbi.path(),
            &odb_subset,
            Some(ncbi_subset.as_slice()),
            true,
        )
        .unwrap();
        let ids: Vec<_> = ordered.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["o3", "o1", "n2"]);
    }

    #[test]
    fn test_length_map() {
        let temp = temp_fasta(b">a\nMKVL\n>b\nMK\n>c\nMKV\n");
        let all = length_map(temp.path(), None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all["a"], 4);

        let subset = vec!["b".to_string()];
        let some = length_map(temp.path(), Some(subset.as_slice())).unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some["b"], 2);
    }
}
