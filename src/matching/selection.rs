use tracing::debug;

use crate::core::record::SequenceRecord;
use crate::core::table::RecordTable;
use crate::core::types::SequenceDataError;
use crate::matching::distance::DistanceMatrix;

/// Mean distances closer than this are treated as tied
pub const TIE_EPSILON: f64 = 1e-9;

/// The record chosen by [`min_dist_record`]
#[derive(Debug, Clone)]
pub struct Selection {
    /// Selected row, with `dist` set to its mean distance to the comparison set
    pub record: SequenceRecord,
    /// Mean distance to the comparison set; `None` for a lone candidate with
    /// nothing to compare against
    pub dist: Option<f64>,
    /// Mean distance of every candidate, in candidate order
    pub candidate_dists: Vec<(String, f64)>,
}

/// Pick the candidate with the smallest mean distance to `compare_ids`.
///
/// - A single candidate is returned without comparison; its distance is still
///   reported against whichever comparison records are in `dm`, and is `None`
///   when there are none.
/// - Ties (within [`TIE_EPSILON`]) go to the longer sequence, then to the
///   earlier candidate.
///
/// # Errors
///
/// Returns `SequenceDataError::NoCandidates` if `candidate_ids` is empty,
/// `SequenceDataError::NoComparisonRecords` if several candidates have nothing
/// to compare against, or `SequenceDataError::MissingFromMatrix` if a
/// candidate is absent from `records`, or from `dm` when there are several.
pub fn min_dist_record<S: AsRef<str>, T: AsRef<str>>(
    dm: &DistanceMatrix,
    candidate_ids: &[S],
    compare_ids: &[T],
    records: &RecordTable,
) -> Result<Selection, SequenceDataError> {
    let lookup = |id: &str| {
        records
            .get(id)
            .ok_or_else(|| SequenceDataError::MissingFromMatrix(id.to_string()))
    };

    match candidate_ids {
        [] => Err(SequenceDataError::NoCandidates),
        [only] => {
            let only = only.as_ref();
            let present: Vec<&str> = compare_ids
                .iter()
                .map(AsRef::as_ref)
                .filter(|id| dm.contains(id))
                .collect();
            if present.len() < compare_ids.len() {
                debug!(
                    "{} of {} comparison records for {only} are not in the distance matrix",
                    compare_ids.len() - present.len(),
                    compare_ids.len()
                );
            }
            let dist = if present.is_empty() || !dm.contains(only) {
                None
            } else {
                dm.mean_distance(only, present.as_slice())?
            };
            let mut record = lookup(only)?.clone();
            record.dist = dist;
            Ok(Selection {
                record,
                dist,
                candidate_dists: dist.map(|d| (only.to_string(), d)).into_iter().collect(),
            })
        }
        _ => {
            let mut candidate_dists = Vec::with_capacity(candidate_ids.len());
            for id in candidate_ids.iter().map(AsRef::as_ref) {
                let d = dm
                    .mean_distance(id, compare_ids)?
                    .ok_or(SequenceDataError::NoComparisonRecords)?;
                candidate_dists.push((id.to_string(), d));
            }

            let mut best: Option<(&str, f64, usize)> = None;
            for (id, d) in &candidate_dists {
                let length = lookup(id)?.length;
                let better = match best {
                    None => true,
                    Some((_, best_d, best_len)) => {
                        *d < best_d - TIE_EPSILON
                            || ((*d - best_d).abs() <= TIE_EPSILON && length > best_len)
                    }
                };
                if better {
                    best = Some((id.as_str(), *d, length));
                }
            }

            let (best_id, best_d, _) = best.ok_or(SequenceDataError::NoCandidates)?;
            debug!(
                "Selected {best_id} (mean distance {best_d:.4}) from {} candidates",
                candidate_dists.len()
            );
            let mut record = lookup(best_id)?.clone();
            record.dist = Some(best_d);
            Ok(Selection {
                record,
                dist: Some(best_d),
                candidate_dists,
            })
        }
    }
}
