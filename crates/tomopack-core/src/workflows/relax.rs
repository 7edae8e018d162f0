use crate::core::models::ids::{ListId, ParticleId};
use crate::core::models::mesh::MeshLibrary;
use crate::core::models::model::ModelLibrary;
use crate::core::models::system::ParticleSystem;
use crate::engine::cache::GeometryCache;
use crate::engine::config::RelaxationConfig;
use crate::engine::constraints::ConstraintSet;
use crate::engine::error::EngineError;
use crate::engine::estimators;
use crate::engine::index::candidate_pairs;
use crate::engine::progress::{CancelToken, Progress, ProgressReporter};
use crate::engine::tasks;
use tracing::{info, instrument, warn};

/// Fraction of `precision` below which the total overlap counts as resolved.
const CONVERGENCE_SCALE: f64 = 1e-3;
/// Smallest relative per-iteration improvement still counted as progress.
const MIN_RELATIVE_IMPROVEMENT: f64 = 1e-3;

/// Why a relaxation run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    /// The overlap metric dropped below the threshold or stopped improving.
    Converged,
    /// The iteration cap was reached with overlap remaining.
    IterationLimitReached,
    /// The cancel token was triggered between iterations.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelaxationReport {
    pub state: TerminalState,
    /// Fully committed iterations.
    pub iterations: u32,
    /// Overlap metric of the last committed iteration; infinite when the run
    /// was cancelled before the first one.
    pub final_overlap: f64,
}

/// Iteratively removes overlap between the particles of the given lists.
///
/// Each iteration snapshots world geometry, estimates pairwise corrections,
/// filters them through the constraint set, and commits every particle update
/// at once. Scene structure is never modified; only positions and
/// orientations change.
#[instrument(skip_all, name = "relaxation_workflow")]
pub fn run(
    system: &mut ParticleSystem,
    lists: &[ListId],
    meshes: &MeshLibrary,
    models: &ModelLibrary,
    constraints: &ConstraintSet,
    config: &RelaxationConfig,
    reporter: &ProgressReporter,
    cancel: &CancelToken,
) -> Result<RelaxationReport, EngineError> {
    config.validate()?;
    for &list in lists {
        if system.list(list).is_none() {
            return Err(EngineError::ListNotFound { list });
        }
    }
    constraints.validate(lists, models)?;
    let resolved = constraints.resolve(models, config.align_to_normal, config.max_search_distance)?;
    resolved.check_start_positions(system)?;

    let order: Vec<ParticleId> = lists
        .iter()
        .flat_map(|&list| system.particles_of(list).map(|(id, _)| id))
        .collect();
    let estimator = estimators::for_config(config);

    info!(
        particles = order.len(),
        method = ?config.method,
        max_iterations = config.max_iterations,
        "Starting overlap relaxation."
    );
    reporter.report(Progress::PhaseStart {
        name: "Relaxation",
    });

    let mut previous_overlap = f64::INFINITY;
    let mut state = None;
    let mut iterations = 0;
    for iteration in 0..config.max_iterations {
        if cancel.is_cancelled() {
            info!(iteration, "Relaxation cancelled.");
            state = Some(TerminalState::Cancelled);
            break;
        }
        reporter.report(Progress::Message(format!(
            "Iteration {}/{}",
            iteration + 1,
            config.max_iterations
        )));

        let cache = GeometryCache::build(system, &order, meshes, resolved.frozen_lists())?;
        let pairs = candidate_pairs(&cache);
        let field = tasks::overlap::run(&cache, &pairs, estimator.as_ref(), config, reporter)?;

        let updates: Vec<_> = cache
            .entries()
            .iter()
            .zip(&field.displacements)
            .map(|(entry, &displacement)| (entry.id, resolved.apply(entry, displacement)))
            .collect();
        for (id, outcome) in updates {
            let particle = system
                .particle_mut(id)
                .ok_or_else(|| EngineError::Internal(format!("stale particle id {id:?}")))?;
            particle.position += outcome.displacement;
            if let Some(rotation) = outcome.rotation {
                particle.rotation = rotation;
            }
        }

        iterations = iteration + 1;
        let overlap = field.metric;
        if overlap <= config.precision * CONVERGENCE_SCALE {
            info!(iterations, overlap, "Relaxation converged.");
            state = Some(TerminalState::Converged);
            previous_overlap = overlap;
            break;
        }
        if previous_overlap.is_finite()
            && previous_overlap - overlap <= MIN_RELATIVE_IMPROVEMENT * previous_overlap
        {
            info!(
                iterations,
                overlap, "Overlap stopped improving; treating as converged."
            );
            state = Some(TerminalState::Converged);
            previous_overlap = overlap;
            break;
        }
        previous_overlap = overlap;
    }
    reporter.report(Progress::PhaseFinish);

    let state = state.unwrap_or_else(|| {
        warn!(
            iterations,
            overlap = previous_overlap,
            "Iteration limit reached with overlap remaining."
        );
        TerminalState::IterationLimitReached
    });
    Ok(RelaxationReport {
        state,
        iterations,
        final_overlap: previous_overlap,
    })
}
