//! Per-run error table.
//!
//! Symbols whose inputs are malformed are not fatal to a run: the error is
//! appended to `summary/errors.tsv` and the next symbol is processed. On a
//! later run the table is read back so already-failed symbols can be skipped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::parsing::ParseError;
use crate::utils::validation::sanitize_tsv_field;

const HEADER: &str = "gene_symbol\terror_type\tmessage\tlogged_at";

/// One logged failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub gene_symbol: String,
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_at: Option<DateTime<Utc>>,
}

/// Error table backed by a TSV file
#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    entries: Vec<ErrorEntry>,
}

impl ErrorLog {
    /// Load the error table at `path`. A missing file is an empty log.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if an existing file cannot be read, or
    /// `ParseError::InvalidFormat` if a row has fewer than 3 fields.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let mut log = Self {
            path: path.to_path_buf(),
            entries: Vec::new(),
        };
        if !path.exists() {
            return Ok(log);
        }

        let content = std::fs::read_to_string(path)?;
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with("gene_symbol\t") {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 {
                return Err(ParseError::InvalidFormat(format!(
                    "Error log line {} has fewer than 3 fields",
                    i + 1
                )));
            }
            let logged_at = fields.get(3).and_then(|s| match DateTime::parse_from_rfc3339(s) {
                Ok(t) => Some(t.with_timezone(&Utc)),
                Err(e) => {
                    warn!("Unreadable timestamp '{s}' in {}: {e}", path.display());
                    None
                }
            });
            log.entries.push(ErrorEntry {
                gene_symbol: fields[0].to_string(),
                error_type: fields[1].to_string(),
                message: fields[2].to_string(),
                logged_at,
            });
        }
        Ok(log)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    /// Whether `symbol` has at least one logged error
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.iter().any(|e| e.gene_symbol == symbol)
    }

    /// Append an error for `symbol`. Identical entries are only written once.
    ///
    /// Returns whether a new row was written.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the table cannot be created or appended to.
    pub fn record(
        &mut self,
        symbol: &str,
        error_type: &str,
        message: &str,
    ) -> std::io::Result<bool> {
        let message = sanitize_tsv_field(message);
        let duplicate = self.entries.iter().any(|e| {
            e.gene_symbol == symbol && e.error_type == error_type && e.message == message
        });
        if duplicate {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let write_header = !self.path.exists();
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if write_header {
            writeln!(file, "{HEADER}")?;
        }

        let now = Utc::now();
        writeln!(
            file,
            "{symbol}\t{error_type}\t{message}\t{}",
            now.to_rfc3339()
        )?;

        self.entries.push(ErrorEntry {
            gene_symbol: symbol.to_string(),
            error_type: error_type.to_string(),
            message,
            logged_at: Some(now),
        });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = ErrorLog::load(&dir.path().join("errors.tsv")).unwrap();
        assert!(log.entries().is_empty());
        assert!(!log.contains("CALM1"));
    }

    #[test]
    fn test_record_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary").join("errors.tsv");

        let mut log = ErrorLog::load(&path).unwrap();
        assert!(log
            .record("CD151", "SequenceDataError", "No OrthoDB records\tmatched")
            .unwrap());
        assert!(!log
            .record("CD151", "SequenceDataError", "No OrthoDB records\tmatched")
            .unwrap());
        assert!(log.record("ISPD", "AlignError", "kalign failed").unwrap());

        let reloaded = ErrorLog::load(&path).unwrap();
        assert_eq!(reloaded.entries().len(), 2);
        assert_eq!(reloaded.entries()[0].message, "No OrthoDB records matched");
        assert!(reloaded.entries()[0].logged_at.is_some());
        assert!(reloaded.contains("ISPD"));
        assert!(!reloaded.contains("CALM1"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(HEADER));
    }

    #[test]
    fn test_malformed_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("errors.tsv");
        std::fs::write(&path, "gene_symbol\terror_type\tmessage\nCALM1\n").unwrap();
        assert!(ErrorLog::load(&path).is_err());
    }
}
