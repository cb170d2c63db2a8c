use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use crate::core::record::SequenceRecord;
use crate::utils::validation::sanitize_tsv_field;

/// Name of the index column in written tables
pub const INDEX_COLUMN: &str = "record_id";

/// An ordered table of sequence records keyed by record ID.
///
/// Rows keep insertion order. Inserting a record whose ID is already present
/// replaces that row in place. The column list controls which fields are
/// written and in what order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordTable {
    columns: Vec<String>,
    records: Vec<SequenceRecord>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl RecordTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with the given column order
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for column in columns {
            table.ensure_column(column);
        }
        table
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Append a column if it is not already present
    pub fn ensure_column(&mut self, column: impl Into<String>) {
        let column = column.into();
        if !self.has_column(&column) {
            self.columns.push(column);
        }
    }

    #[must_use]
    pub fn contains(&self, record_id: &str) -> bool {
        self.index.contains_key(record_id)
    }

    #[must_use]
    pub fn get(&self, record_id: &str) -> Option<&SequenceRecord> {
        self.index.get(record_id).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, record_id: &str) -> Option<&mut SequenceRecord> {
        self.index.get(record_id).map(|&i| &mut self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SequenceRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SequenceRecord> {
        self.records.iter_mut()
    }

    /// Record IDs in table order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.record_id.as_str())
    }

    /// Insert a record, replacing any existing row with the same ID
    pub fn push(&mut self, record: SequenceRecord) {
        for key in record.extra.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }
        if let Some(&i) = self.index.get(&record.record_id) {
            self.records[i] = record;
        } else {
            self.index.insert(record.record_id.clone(), self.records.len());
            self.records.push(record);
        }
    }

    /// Append all rows of `other`. Columns only `other` has are added after
    /// this table's columns.
    pub fn append(&mut self, other: RecordTable) {
        for column in other.columns {
            self.ensure_column(column);
        }
        for record in other.records {
            self.push(record);
        }
    }

    /// New table holding the given IDs, in the order given. Unknown IDs are skipped.
    #[must_use]
    pub fn subset<S: AsRef<str>>(&self, ids: &[S]) -> Self {
        let mut out = Self {
            columns: self.columns.clone(),
            ..Self::default()
        };
        for id in ids {
            if let Some(record) = self.get(id.as_ref()) {
                out.push(record.clone());
            }
        }
        out
    }

    /// New table holding the rows matching `predicate`, in table order
    #[must_use]
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&SequenceRecord) -> bool,
    {
        let mut out = Self {
            columns: self.columns.clone(),
            ..Self::default()
        };
        for record in self.records.iter().filter(|r| predicate(r)) {
            out.push(record.clone());
        }
        out
    }

    /// Rows whose `organism_taxid` equals `taxid`
    #[must_use]
    pub fn for_taxid(&self, taxid: &str) -> Self {
        self.filter(|r| r.organism_taxid.as_deref() == Some(taxid))
    }

    /// Drop columns from the layout and clear their values on every row
    pub fn drop_columns(&mut self, columns: &[&str]) {
        self.columns.retain(|c| !columns.contains(&c.as_str()));
        for record in &mut self.records {
            for column in columns {
                record.clear_cell(column);
            }
        }
    }

    /// Move the given columns to the end of the layout, in the order given.
    /// Columns not yet present are added.
    pub fn move_to_end(&mut self, columns: &[&str]) {
        for column in columns {
            self.columns.retain(|c| c != column);
            self.columns.push((*column).to_string());
        }
    }

    /// Render the table as TSV, with `record_id` as the first column.
    /// Tabs and line breaks inside cells are replaced by spaces.
    #[must_use]
    pub fn to_tsv_string(&self) -> String {
        let mut out = String::new();
        out.push_str(INDEX_COLUMN);
        for column in &self.columns {
            out.push('\t');
            out.push_str(column);
        }
        out.push('\n');

        for record in &self.records {
            out.push_str(&sanitize_tsv_field(&record.record_id));
            for column in &self.columns {
                out.push('\t');
                if let Some(value) = record.cell(column) {
                    out.push_str(&sanitize_tsv_field(&value));
                }
            }
            out.push('\n');
        }
        out
    }

    /// Write the table as TSV to `path`
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn write_tsv(&self, path: &Path) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        file.write_all(self.to_tsv_string().as_bytes())?;
        file.flush()
    }
}
