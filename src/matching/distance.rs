use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::align::Aligner;
use crate::core::types::SequenceDataError;
use crate::matching::MatchingError;
use crate::parsing::fasta::{read_records, write_fasta, FastaEntry};

/// Safely convert usize to f64 for ratio calculations
#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Identity distance between two aligned sequences.
///
/// Every alignment column counts toward the length, and a column is identical
/// when both residues are equal (case-insensitive), gap/gap columns included:
/// `1 - identical / columns`. Two empty sequences are at distance 0.
///
/// Returns `None` if the sequences are not the same length.
#[must_use]
pub fn identity_distance(a: &[u8], b: &[u8]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    if a.is_empty() {
        return Some(0.0);
    }
    let identical = a
        .iter()
        .zip(b)
        .filter(|(x, y)| x.eq_ignore_ascii_case(y))
        .count();
    Some(1.0 - count_to_f64(identical) / count_to_f64(a.len()))
}

/// Symmetric pairwise identity distance matrix, in alignment order
#[derive(Debug, Clone, Serialize)]
pub struct DistanceMatrix {
    ids: Vec<String>,
    rows: Vec<Vec<f64>>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl DistanceMatrix {
    /// Build the matrix from aligned records
    ///
    /// # Errors
    ///
    /// Returns `SequenceDataError::RaggedAlignment` if the aligned sequences
    /// are not all the same length.
    pub fn from_alignment(entries: &[FastaEntry]) -> Result<Self, SequenceDataError> {
        let expected = entries.first().map_or(0, |e| e.seq.len());
        if let Some(bad) = entries.iter().find(|e| e.seq.len() != expected) {
            return Err(SequenceDataError::RaggedAlignment {
                record_id: bad.id.clone(),
                length: bad.seq.len(),
                expected,
            });
        }

        let n = entries.len();
        let mut rows = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = identity_distance(entries[i].seq.as_bytes(), entries[j].seq.as_bytes())
                    .unwrap_or(1.0);
                rows[i][j] = d;
                rows[j][i] = d;
            }
        }

        let ids: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();
        let index = ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
        Ok(Self { ids, rows, index })
    }

    /// Record IDs in matrix order
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Distance between two records, if both are present
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = *self.index.get(a)?;
        let j = *self.index.get(b)?;
        Some(self.rows[i][j])
    }

    /// Mean distance from `id` to each of `others`, skipping `id` itself.
    ///
    /// Returns `Ok(None)` when `others` holds nothing but `id`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceDataError::MissingFromMatrix` if any ID is absent.
    pub fn mean_distance<S: AsRef<str>>(
        &self,
        id: &str,
        others: &[S],
    ) -> Result<Option<f64>, SequenceDataError> {
        let row = *self
            .index
            .get(id)
            .ok_or_else(|| SequenceDataError::MissingFromMatrix(id.to_string()))?;

        let mut total = 0.0;
        let mut count = 0usize;
        for other in others.iter().map(AsRef::as_ref).filter(|o| *o != id) {
            let col = *self
                .index
                .get(other)
                .ok_or_else(|| SequenceDataError::MissingFromMatrix(other.to_string()))?;
            total += self.rows[row][col];
            count += 1;
        }

        Ok((count > 0).then(|| total / count_to_f64(count)))
    }

    /// Render as a square TSV with record IDs as row and column labels
    #[must_use]
    pub fn to_tsv_string(&self) -> String {
        let mut out = String::from("record_id");
        for id in &self.ids {
            out.push('\t');
            out.push_str(id);
        }
        out.push('\n');
        for (id, row) in self.ids.iter().zip(&self.rows) {
            out.push_str(id);
            for d in row {
                out.push_str(&format!("\t{d:.4}"));
            }
            out.push('\n');
        }
        out
    }
}

/// Align `unaligned_fasta` into `aligned_out` and build its distance matrix.
///
/// Returns the matrix together with the aligned records, both in alignment order.
///
/// # Errors
///
/// Returns `MatchingError::Align` if the aligner fails, `MatchingError::Parse`
/// if the alignment cannot be read back, or `MatchingError::SequenceData` if
/// it is empty or ragged.
pub fn construct_id_dm(
    unaligned_fasta: &Path,
    aligned_out: &Path,
    aligner: &dyn Aligner,
) -> Result<(DistanceMatrix, Vec<FastaEntry>), MatchingError> {
    aligner.align(unaligned_fasta, aligned_out)?;
    let aligned = read_records(aligned_out)?;
    if aligned.is_empty() {
        return Err(SequenceDataError::NoRecords(aligned_out.display().to_string()).into());
    }
    let dm = DistanceMatrix::from_alignment(&aligned)?;
    Ok((dm, aligned))
}

/// Write `entries` to `unaligned_fasta`, then align and build the distance matrix
///
/// # Errors
///
/// Returns `MatchingError::Io` if the FASTA cannot be written, or any error
/// from [`construct_id_dm`].
pub fn align_entries(
    entries: &[FastaEntry],
    unaligned_fasta: &Path,
    aligned_out: &Path,
    aligner: &dyn Aligner,
) -> Result<(DistanceMatrix, Vec<FastaEntry>), MatchingError> {
    write_fasta(unaligned_fasta, entries)?;
    construct_id_dm(unaligned_fasta, aligned_out, aligner)
}

/// Per-record mean distance to every other record in `ids`.
///
/// A lone record has no distance and maps to `None`.
///
/// # Errors
///
/// Returns `SequenceDataError::MissingFromMatrix` if any ID is absent.
pub fn avg_dist<S: AsRef<str>>(
    ids: &[S],
    dm: &DistanceMatrix,
) -> Result<HashMap<String, Option<f64>>, SequenceDataError> {
    ids.iter()
        .map(|id| {
            let id = id.as_ref();
            Ok((id.to_string(), dm.mean_distance(id, ids)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aligned(records: &[(&str, &str)]) -> Vec<FastaEntry> {
        records
            .iter()
            .map(|(id, seq)| FastaEntry::new(*id, *seq))
            .collect()
    }

    #[test]
    fn test_identity_distance() {
        assert_eq!(identity_distance(b"MKVL", b"MKVL"), Some(0.0));
        assert_eq!(identity_distance(b"MKVL", b"mkvl"), Some(0.0));
        assert_eq!(identity_distance(b"MKVL", b"MKAA"), Some(0.5));
        assert_eq!(identity_distance(b"MK--", b"MK--"), Some(0.0));
        assert_eq!(identity_distance(b"MK-L", b"MKV-"), Some(0.5));
        assert_eq!(identity_distance(b"", b""), Some(0.0));
        assert_eq!(identity_distance(b"MK", b"MKV"), None);
    }

    #[test]
    fn test_matrix_is_symmetric() {
        let dm = DistanceMatrix::from_alignment(&aligned(&[
            ("a", "MKVL"),
            ("b", "MKVA"),
            ("c", "AAAA"),
        ]))
        .unwrap();

        assert_eq!(dm.len(), 3);
        assert_eq!(dm.get("a", "a"), Some(0.0));
        assert_eq!(dm.get("a", "b"), Some(0.25));
        assert_eq!(dm.get("b", "a"), Some(0.25));
        assert_eq!(dm.get("a", "c"), Some(1.0));
        assert_eq!(dm.get("a", "zzz"), None);
    }

    #[test]
    fn test_ragged_alignment() {
        let err =
            DistanceMatrix::from_alignment(&aligned(&[("a", "MKVL"), ("b", "MKV")])).unwrap_err();
        assert!(matches!(err, SequenceDataError::RaggedAlignment { .. }));
    }

    #[test]
    fn test_mean_distance_skips_self() {
        let dm = DistanceMatrix::from_alignment(&aligned(&[
            ("a", "MKVL"),
            ("b", "MKVA"),
            ("c", "MKAA"),
        ]))
        .unwrap();

        let mean = dm.mean_distance("a", &["a", "b", "c"]).unwrap().unwrap();
        assert!((mean - 0.375).abs() < 1e-12);
        assert_eq!(dm.mean_distance("a", &["a"]).unwrap(), None);
        assert!(matches!(
            dm.mean_distance("a", &["x"]),
            Err(SequenceDataError::MissingFromMatrix(_))
        ));
    }

    #[test]
    fn test_avg_dist() {
        let dm = DistanceMatrix::from_alignment(&aligned(&[("a", "MK"), ("b", "MA")])).unwrap();
        let avg = avg_dist(&["a", "b"], &dm).unwrap();
        assert_eq!(avg["a"], Some(0.5));
        assert_eq!(avg["b"], Some(0.5));

        let single = avg_dist(&["a"], &dm).unwrap();
        assert_eq!(single["a"], None);
    }

    #[test]
    fn test_to_tsv_string() {
        let dm = DistanceMatrix::from_alignment(&aligned(&[("a", "MK"), ("b", "MA")])).unwrap();
        let tsv = dm.to_tsv_string();
        assert_eq!(tsv, "record_id\ta\tb\na\t0.0000\t0.5000\nb\t0.5000\t0.0000\n");
    }
}
