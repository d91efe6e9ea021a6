use crate::domain::model::{MasterUnsupportedSet, SnapshotSeries, StepReport};
use crate::utils::error::{EtlError, Result};
use std::collections::BTreeSet;

/// Baseline-relative discontinuation accumulation.
///
/// Every snapshot is diffed against the *last* snapshot of the series (the
/// most recent release), never against its neighbour: the question answered
/// is "unsupported today", so a model that disappeared in an intermediate
/// release but is back in the baseline is not discontinued, and a model
/// missing from the baseline is discontinued no matter where it was last
/// seen. The per-release differences are folded into one deduplicated master
/// set.
///
/// Pure function of the series: no I/O, no shared state, identical output for
/// identical input. Independent vendors can be computed concurrently without
/// synchronization.
pub struct DiscontinuationEngine;

impl DiscontinuationEngine {
    pub fn compute(series: &SnapshotSeries) -> Result<(MasterUnsupportedSet, Vec<StepReport>)> {
        // SnapshotSeries::new already guarantees both of these; re-checked
        // here so a future constructor cannot silently merge bad input.
        let baseline = series.snapshots().last().ok_or_else(|| {
            EtlError::InvalidInputError {
                message: format!(
                    "{} snapshot series is empty, no baseline release to compare against",
                    series.vendor()
                ),
            }
        })?;
        for snapshot in series.snapshots() {
            if snapshot.vendor() != series.vendor() {
                return Err(EtlError::InvalidInputError {
                    message: format!(
                        "snapshot '{}' is a {} snapshot in a {} series",
                        snapshot.release_label(),
                        snapshot.vendor(),
                        series.vendor()
                    ),
                });
            }
        }

        let mut master: BTreeSet<String> = BTreeSet::new();
        let mut reports = Vec::with_capacity(series.snapshots().len());

        for snapshot in series.snapshots() {
            // Models this release supported that the baseline no longer does.
            // For the baseline itself this is trivially empty.
            let step_unsupported: Vec<&str> = snapshot
                .model_keys()
                .filter(|&key| !baseline.contains(key))
                .collect();

            let size_before = master.len();
            for key in &step_unsupported {
                master.insert((*key).to_string());
            }

            reports.push(StepReport {
                release_label: snapshot.release_label().to_string(),
                total_supported: snapshot.len(),
                unsupported_this_step: step_unsupported.len(),
                master_size_after_step: master.len(),
                added_this_step: master.len() - size_before,
            });
        }

        Ok((MasterUnsupportedSet::new(series.vendor(), master), reports))
    }
}
