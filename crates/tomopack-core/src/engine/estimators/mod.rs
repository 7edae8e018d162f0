//! Narrow-phase overlap estimation strategies.
//!
//! An estimator inspects one candidate pair of world-space particles and, when
//! they genuinely overlap, produces the push that would separate them. The two
//! implementations trade accuracy against cost:
//!
//! - [`distance::DistanceEstimator`] fits a separating plane through the
//!   contact point cloud and measures penetration depth along its normal.
//! - [`volume::VolumeEstimator`] samples the intersection volume on a grid and
//!   steps along the line of centers.

pub mod distance;
pub mod volume;

use super::cache::ParticleGeometry;
use super::config::{RelaxMethod, RelaxationConfig};
use nalgebra::{Unit, Vector3};

/// A corrective push for one overlapping pair, expressed for the first
/// particle of the pair. The second particle moves the opposite way.
#[derive(Debug, Clone, Copy)]
pub struct PairEstimate {
    /// Separation distance in frame units, always positive.
    pub magnitude: f64,
    /// Unit direction moving the first particle out of the overlap.
    pub direction: Unit<Vector3<f64>>,
}

pub trait OverlapEstimator: Sync {
    /// Estimates the overlap between two particles, or `None` when they do
    /// not overlap (or the overlap cannot be resolved this iteration).
    fn estimate(&self, a: &ParticleGeometry, b: &ParticleGeometry) -> Option<PairEstimate>;
}

pub fn for_config(config: &RelaxationConfig) -> Box<dyn OverlapEstimator> {
    match config.method {
        RelaxMethod::Distance => Box::new(distance::DistanceEstimator::default()),
        RelaxMethod::Volume => Box::new(volume::VolumeEstimator::new(config.thoroughness)),
    }
}
