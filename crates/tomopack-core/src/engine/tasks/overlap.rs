//! One estimation pass over all candidate pairs.
//!
//! Estimation runs per pair (in parallel when enabled); accumulation into the
//! displacement field is sequential and follows ascending pair order, so a
//! pass over identical inputs always produces identical output.

use crate::engine::cache::GeometryCache;
use crate::engine::config::{RelaxMethod, RelaxationConfig};
use crate::engine::error::EngineError;
use crate::engine::estimators::{OverlapEstimator, PairEstimate};
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Vector3;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Extra weight given to the mobile side of a mobile/frozen pair, standing in
/// for the frozen partner's share of the separation.
const FROZEN_PARTNER_WEIGHT: f64 = 2.0;

/// The aggregate correction of one pass.
pub struct OverlapField {
    /// One displacement per cache entry, in entry order.
    pub displacements: Vec<Vector3<f64>>,
    /// Sum of pair magnitudes; the workflow's convergence metric.
    pub metric: f64,
}

#[instrument(skip_all, name = "overlap_pass")]
pub fn run(
    cache: &GeometryCache,
    pairs: &[(usize, usize)],
    estimator: &dyn OverlapEstimator,
    config: &RelaxationConfig,
    reporter: &ProgressReporter,
) -> Result<OverlapField, EngineError> {
    let entries = cache.entries();

    reporter.report(Progress::TaskStart {
        total_steps: pairs.len() as u64,
    });

    let estimate_pair = |&(i, j): &(usize, usize)| {
        let estimate = estimator.estimate(&entries[i], &entries[j]);
        reporter.report(Progress::TaskIncrement);
        estimate
    };

    #[cfg(not(feature = "parallel"))]
    let estimates: Vec<Option<PairEstimate>> = pairs.iter().map(estimate_pair).collect();

    #[cfg(feature = "parallel")]
    let estimates: Vec<Option<PairEstimate>> = pairs.par_iter().map(estimate_pair).collect();

    reporter.report(Progress::TaskFinish);

    let mut displacements = vec![Vector3::zeros(); entries.len()];
    let mut overlap_counts = vec![0u32; entries.len()];
    let mut metric = 0.0;

    for (&(i, j), estimate) in pairs.iter().zip(&estimates) {
        let Some(PairEstimate {
            magnitude,
            direction,
        }) = estimate
        else {
            continue;
        };
        metric += magnitude;
        let step = direction.into_inner() * *magnitude;

        match (entries[i].frozen, entries[j].frozen) {
            (false, false) => {
                displacements[i] += step;
                displacements[j] -= step;
                overlap_counts[i] += 1;
                overlap_counts[j] += 1;
            }
            (false, true) => {
                displacements[i] += step * FROZEN_PARTNER_WEIGHT;
                overlap_counts[i] += 1;
            }
            (true, false) => {
                displacements[j] -= step * FROZEN_PARTNER_WEIGHT;
                overlap_counts[j] += 1;
            }
            (true, true) => {
                return Err(EngineError::Internal(
                    "frozen pair survived the broad phase".to_string(),
                ));
            }
        }
    }

    match config.method {
        // Each particle takes the average of the pushes acting on it.
        RelaxMethod::Distance => {
            for (displacement, &count) in displacements.iter_mut().zip(&overlap_counts) {
                if count > 1 {
                    *displacement /= count as f64;
                }
            }
        }
        // Volume steps are scaled down so repeated passes home in on the
        // contact surface instead of oscillating across it.
        RelaxMethod::Volume => {
            for displacement in &mut displacements {
                *displacement *= config.precision;
            }
        }
    }

    debug!(pairs = pairs.len(), metric, "Overlap pass complete.");

    Ok(OverlapField {
        displacements,
        metric,
    })
}
