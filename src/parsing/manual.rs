//! Reader for the manual record selection table.
//!
//! The table is a TSV with a `gene_symbol` and a `record_id` column, one
//! hand-picked record per symbol. It lives at the run root as
//! `manual_record_selections.tsv`; a missing file means no manual selections.

use std::collections::HashMap;
use std::path::Path;

use crate::parsing::ParseError;

/// Hand-picked record per gene symbol
#[derive(Debug, Clone, Default)]
pub struct ManualSelections {
    by_symbol: HashMap<String, String>,
}

impl ManualSelections {
    /// Load selections from `path`; a missing file yields no selections
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if an existing file cannot be read, or
    /// `ParseError::InvalidFormat` if the header lacks a required column.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse selections from TSV text
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` if the header lacks `gene_symbol`
    /// or `record_id`.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let Some(header) = lines.next() else {
            return Ok(Self::default());
        };

        let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
        let find = |name: &str| {
            columns
                .iter()
                .position(|c| *c == name)
                .ok_or_else(|| ParseError::InvalidFormat(format!("Missing {name} column")))
        };
        let symbol_idx = find("gene_symbol")?;
        let record_idx = find("record_id")?;

        let mut by_symbol = HashMap::new();
        for line in lines {
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            let (symbol, record_id) = (fields.get(symbol_idx), fields.get(record_idx));
            if let (Some(symbol), Some(record_id)) = (symbol, record_id) {
                if !symbol.is_empty() && !record_id.is_empty() {
                    // Later rows win, matching a re-selection appended to the file
                    by_symbol.insert((*symbol).to_string(), (*record_id).to_string());
                }
            }
        }
        Ok(Self { by_symbol })
    }

    /// Manually selected record for `symbol`, if any
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.by_symbol.get(symbol).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selections() {
        let text = "gene_symbol\trecord_id\nCALM1\t9606_0:001c7b\nATP5MC1\t10090_0:0034c4\n";
        let selections = ManualSelections::parse(text).unwrap();
        assert_eq!(selections.len(), 2);
        assert_eq!(selections.get("CALM1"), Some("9606_0:001c7b"));
        assert_eq!(selections.get("CD151"), None);
    }

    #[test]
    fn test_parse_extra_columns_and_order() {
        let text = "record_id\tnote\tgene_symbol\nXP_1.1\tpicked\tISPD\nXP_2.1\tre-picked\tISPD\n";
        let selections = ManualSelections::parse(text).unwrap();
        assert_eq!(selections.get("ISPD"), Some("XP_2.1"));
    }

    #[test]
    fn test_missing_column() {
        assert!(ManualSelections::parse("gene_symbol\tid\nCALM1\tx\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        let selections =
            ManualSelections::load(Path::new("/nonexistent/manual_record_selections.tsv")).unwrap();
        assert!(selections.is_empty());
    }
}
