use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::types::{DbSource, SelectionType};

/// A single sequence record from OrthoDB or NCBI, plus its per-gene annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRecord {
    /// OrthoDB `int_prot_id` or NCBI accession
    pub record_id: String,

    /// Taxonomy ID, e.g. `9606_0` for OrthoDB or `9999` for NCBI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organism_taxid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organism_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Sequence length in residues
    pub length: usize,

    pub seq: String,

    /// Mean identity distance, filled in during selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_source: Option<DbSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_type: Option<SelectionType>,

    /// Remaining OrthoDB table columns (`pub_og_id`, `pub_gene_id`, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

impl SequenceRecord {
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            organism_taxid: None,
            organism_name: None,
            description: None,
            length: 0,
            seq: String::new(),
            dist: None,
            db_source: None,
            selection_type: None,
            extra: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_taxid(mut self, taxid: impl Into<String>) -> Self {
        self.organism_taxid = Some(taxid.into());
        self
    }

    /// Set the sequence, keeping `length` in step with it
    #[must_use]
    pub fn with_seq(mut self, seq: impl Into<String>) -> Self {
        self.set_seq(seq);
        self
    }

    pub fn set_seq(&mut self, seq: impl Into<String>) {
        self.seq = seq.into();
        self.length = self.seq.len();
    }

    #[must_use]
    pub fn has_seq(&self) -> bool {
        !self.seq.is_empty()
    }

    /// Look up a column value as its table cell text.
    ///
    /// Returns `None` for columns this record has no value for, which the
    /// TSV writer renders as an empty cell.
    #[must_use]
    pub fn cell(&self, column: &str) -> Option<String> {
        match column {
            "organism_taxid" => self.organism_taxid.clone(),
            "organism_name" => self.organism_name.clone(),
            "description" => self.description.clone(),
            "length" => Some(self.length.to_string()),
            "seq" => Some(self.seq.clone()),
            "dist" => self.dist.map(|d| d.to_string()),
            "db_source" => self.db_source.map(|s| s.to_string()),
            "selection_type" => self.selection_type.map(|s| s.to_string()),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Clear a column value. Typed columns are reset, extra columns removed.
    pub fn clear_cell(&mut self, column: &str) {
        match column {
            "organism_taxid" => self.organism_taxid = None,
            "organism_name" => self.organism_name = None,
            "description" => self.description = None,
            "dist" => self.dist = None,
            "db_source" => self.db_source = None,
            "selection_type" => self.selection_type = None,
            "length" | "seq" => {}
            other => {
                self.extra.remove(other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_seq_sets_length() {
        let record = SequenceRecord::new("XP_1.1").with_seq("MKVLA");
        assert_eq!(record.length, 5);
        assert!(record.has_seq());
    }

    #[test]
    fn test_cell_lookup() {
        let mut record = SequenceRecord::new("9606_0:00415a")
            .with_taxid("9606_0")
            .with_seq("MQT");
        record
            .extra
            .insert("pub_gene_id".to_string(), "ATP5MC1".to_string());
        record.db_source = Some(DbSource::OrthoDb);
        record.selection_type = Some(SelectionType::SymbolMatchSingleRecord);

        assert_eq!(record.cell("organism_taxid").as_deref(), Some("9606_0"));
        assert_eq!(record.cell("length").as_deref(), Some("3"));
        assert_eq!(record.cell("pub_gene_id").as_deref(), Some("ATP5MC1"));
        assert_eq!(record.cell("db_source").as_deref(), Some("OrthoDB"));
        assert_eq!(
            record.cell("selection_type").as_deref(),
            Some("symbol match single record")
        );
        assert_eq!(record.cell("dist"), None);
        assert_eq!(record.cell("level_taxid"), None);
    }

    #[test]
    fn test_clear_cell_removes_extra() {
        let mut record = SequenceRecord::new("a");
        record.extra.insert("pub_og_id".to_string(), "1at1".to_string());
        record.clear_cell("pub_og_id");
        assert!(record.extra.is_empty());
    }
}
