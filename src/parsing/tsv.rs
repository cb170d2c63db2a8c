use std::path::Path;

use crate::core::record::SequenceRecord;
use crate::core::table::RecordTable;
use crate::parsing::fasta::read_records;
use crate::parsing::ParseError;
use crate::utils::validation::check_record_limit;

/// Index column of OrthoDB tables
pub const ODB_INDEX_COLUMN: &str = "int_prot_id";

/// Parse an OrthoDB TSV file keyed by `int_prot_id`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn load_odb_table(
    path: &Path,
    tax_subset: Option<&[String]>,
) -> Result<RecordTable, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_odb_text(&content, tax_subset)
}

/// Parse OrthoDB TSV text. The first non-comment line must be the header.
///
/// Known columns (`organism_taxid`, `organism_name`, `description`) fill the
/// typed record fields; every other column is kept as an extra column.
/// With `tax_subset`, only rows whose `organism_taxid` is listed are kept.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if the header lacks `int_prot_id`,
/// a row has more fields than the header, or no header is found, or
/// `ParseError::TooManyRecords` if the limit is exceeded.
pub fn parse_odb_text(
    text: &str,
    tax_subset: Option<&[String]>,
) -> Result<RecordTable, ParseError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty() && !l.starts_with('#'));

    let (_, header_line) = lines
        .next()
        .ok_or_else(|| ParseError::InvalidFormat("No header found in OrthoDB table".to_string()))?;
    let header: Vec<&str> = header_line.split('\t').map(str::trim).collect();
    let index_col = header
        .iter()
        .position(|c| *c == ODB_INDEX_COLUMN)
        .ok_or_else(|| ParseError::InvalidFormat(format!("Missing {ODB_INDEX_COLUMN} column")))?;

    let mut table = RecordTable::with_columns(
        header
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index_col)
            .map(|(_, c)| *c),
    );

    for (i, line) in lines {
        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() > header.len() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has {} fields, header has {}",
                fields.len(),
                header.len()
            )));
        }
        let record_id = fields.get(index_col).map(|s| s.trim()).unwrap_or_default();
        if record_id.is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has no {ODB_INDEX_COLUMN}"
            )));
        }

        let mut record = SequenceRecord::new(record_id);
        for (column, value) in header.iter().zip(fields.iter()) {
            let value = value.trim();
            if value.is_empty() || *column == ODB_INDEX_COLUMN {
                continue;
            }
            match *column {
                "organism_taxid" => record.organism_taxid = Some(value.to_string()),
                "organism_name" => record.organism_name = Some(value.to_string()),
                "description" => record.description = Some(value.to_string()),
                other => {
                    record.extra.insert(other.to_string(), value.to_string());
                }
            }
        }

        if let Some(subset) = tax_subset {
            let keep = record
                .organism_taxid
                .as_ref()
                .is_some_and(|t| subset.contains(t));
            if !keep {
                continue;
            }
        }

        if check_record_limit(table.len()).is_some() {
            return Err(ParseError::TooManyRecords(table.len()));
        }
        table.push(record);
    }

    Ok(table)
}

/// Fill `seq` and `length` for every table row found in `fasta`.
///
/// Returns the IDs of rows with no sequence in the FASTA.
///
/// # Errors
///
/// Returns any error from reading the FASTA.
pub fn attach_sequences(table: &mut RecordTable, fasta: &Path) -> Result<Vec<String>, ParseError> {
    table.ensure_column("length");
    table.ensure_column("seq");
    for entry in read_records(fasta)? {
        if let Some(record) = table.get_mut(&entry.id) {
            record.set_seq(entry.seq);
        }
    }
    Ok(table
        .iter()
        .filter(|r| !r.has_seq())
        .map(|r| r.record_id.clone())
        .collect())
}
