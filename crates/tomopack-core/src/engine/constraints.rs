//! Motion constraints applied between estimation and commit.
//!
//! A [`ConstraintSet`] attaches at most one role to each participating list:
//! frozen lists never move, manifold lists are re-projected onto a host
//! surface after every step, and boundary lists have their steps clipped so
//! their surfaces stay inside a host volume.

use super::cache::ParticleGeometry;
use super::error::EngineError;
use crate::core::models::ids::{ListId, ModelId};
use crate::core::models::model::{ModelGeometry, ModelLibrary};
use crate::core::models::system::ParticleSystem;
use nalgebra::{Rotation3, Unit, Vector3};
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use tracing::warn;

/// Greatest distance a manifold particle may start from its surface, in frame
/// units. Larger offsets indicate a mis-assigned constraint rather than
/// numerical drift.
const SURFACE_START_TOLERANCE: f64 = 1.0;

/// Probe offset used to orient a boundary normal out of the contained volume.
const NORMAL_PROBE_OFFSET: f64 = 1e-6;

/// Bisection steps when clipping a boundary-violating displacement.
const CLIP_BISECTION_STEPS: u32 = 8;

/// Declarative constraint assignment, validated against the participating
/// lists and the model library before a run starts.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    frozen: Vec<ListId>,
    manifold: Vec<(ListId, ModelId)>,
    boundary: Vec<(ListId, ModelId)>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frozen(mut self, list: ListId) -> Self {
        self.frozen.push(list);
        self
    }

    pub fn with_manifold(mut self, list: ListId, surface: ModelId) -> Self {
        self.manifold.push((list, surface));
        self
    }

    pub fn with_boundary(mut self, list: ListId, volume: ModelId) -> Self {
        self.boundary.push((list, volume));
        self
    }

    pub fn frozen(&self) -> &[ListId] {
        &self.frozen
    }

    pub fn manifold(&self) -> &[(ListId, ModelId)] {
        &self.manifold
    }

    pub fn boundary(&self) -> &[(ListId, ModelId)] {
        &self.boundary
    }

    /// Checks role exclusivity, list participation, and model existence.
    pub fn validate(
        &self,
        participants: &[ListId],
        models: &ModelLibrary,
    ) -> Result<(), EngineError> {
        let participant_set: HashSet<ListId> = participants.iter().copied().collect();
        let mut assigned = HashSet::new();

        let roles = self
            .frozen
            .iter()
            .copied()
            .chain(self.manifold.iter().map(|&(list, _)| list))
            .chain(self.boundary.iter().map(|&(list, _)| list));
        for list in roles {
            if !participant_set.contains(&list) {
                return Err(EngineError::ListNotFound { list });
            }
            if !assigned.insert(list) {
                return Err(EngineError::ConstraintConflict { list });
            }
        }

        for &(_, model) in self.manifold.iter().chain(self.boundary.iter()) {
            if models.get(model).is_none() {
                return Err(EngineError::ModelNotFound { model });
            }
        }
        Ok(())
    }

    /// Resolves model handles to geometry references for the run.
    pub fn resolve<'a>(
        &self,
        models: &'a ModelLibrary,
        align_to_normal: bool,
        max_search_distance: f64,
    ) -> Result<ResolvedConstraints<'a>, EngineError> {
        let resolve_role = |pairs: &[(ListId, ModelId)]| {
            pairs
                .iter()
                .map(|&(list, model)| {
                    models
                        .get(model)
                        .map(|geometry| (list, geometry))
                        .ok_or(EngineError::ModelNotFound { model })
                })
                .collect::<Result<HashMap<_, _>, _>>()
        };
        Ok(ResolvedConstraints {
            frozen: self.frozen.iter().copied().collect(),
            manifold: resolve_role(&self.manifold)?,
            boundary: resolve_role(&self.boundary)?,
            align_to_normal,
            max_search_distance,
        })
    }
}

/// The per-particle result of constraint application.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintOutcome {
    pub displacement: Vector3<f64>,
    pub rotation: Option<Rotation3<f64>>,
}

impl ConstraintOutcome {
    fn still(displacement: Vector3<f64>) -> Self {
        Self {
            displacement,
            rotation: None,
        }
    }
}

pub struct ResolvedConstraints<'a> {
    frozen: HashSet<ListId>,
    manifold: HashMap<ListId, &'a dyn ModelGeometry>,
    boundary: HashMap<ListId, &'a dyn ModelGeometry>,
    align_to_normal: bool,
    max_search_distance: f64,
}

impl ResolvedConstraints<'_> {
    pub fn frozen_lists(&self) -> &HashSet<ListId> {
        &self.frozen
    }

    /// Rejects manifold particles that do not start on their surface.
    pub fn check_start_positions(
        &self,
        system: &ParticleSystem,
    ) -> Result<(), EngineError> {
        for (&list, surface) in &self.manifold {
            for (id, particle) in system.particles_of(list) {
                let distance = surface
                    .nearest_point(&particle.position)
                    .map_or(f64::INFINITY, |sp| (sp.position - particle.position).norm());
                if distance > SURFACE_START_TOLERANCE {
                    return Err(EngineError::ManifoldOffSurface {
                        list,
                        particle: id,
                        distance,
                    });
                }
            }
        }
        Ok(())
    }

    /// Turns a raw corrective displacement into the constrained displacement
    /// (and, for manifold particles, the re-aligned orientation).
    pub(crate) fn apply(
        &self,
        geometry: &ParticleGeometry,
        displacement: Vector3<f64>,
    ) -> ConstraintOutcome {
        if self.frozen.contains(&geometry.list) {
            return ConstraintOutcome::still(Vector3::zeros());
        }
        if let Some(surface) = self.manifold.get(&geometry.list) {
            return self.apply_manifold(*surface, geometry, displacement);
        }
        if let Some(volume) = self.boundary.get(&geometry.list) {
            return self.apply_boundary(*volume, geometry, displacement);
        }
        ConstraintOutcome::still(displacement)
    }

    fn apply_manifold(
        &self,
        surface: &dyn ModelGeometry,
        geometry: &ParticleGeometry,
        displacement: Vector3<f64>,
    ) -> ConstraintOutcome {
        // Untouched particles stay exactly where they are, including their
        // orientation.
        if displacement.norm_squared() == 0.0 {
            return ConstraintOutcome::still(displacement);
        }
        let target = geometry.center + displacement;
        let Some(sp) = surface.nearest_point(&target) else {
            warn!(
                particle = ?geometry.id,
                "Manifold surface has no nearest point for the moved particle; \
                 holding it in place."
            );
            return ConstraintOutcome::still(Vector3::zeros());
        };
        let rotation = self.align_to_normal.then(|| {
            Rotation3::rotation_between(&Vector3::z(), &sp.normal)
                .unwrap_or_else(|| Rotation3::from_axis_angle(&Vector3::x_axis(), PI))
        });
        ConstraintOutcome {
            displacement: sp.position - geometry.center,
            rotation,
        }
    }

    fn apply_boundary(
        &self,
        volume: &dyn ModelGeometry,
        geometry: &ParticleGeometry,
        displacement: Vector3<f64>,
    ) -> ConstraintOutcome {
        if displacement.norm_squared() == 0.0 {
            return ConstraintOutcome::still(displacement);
        }
        if surface_stays_inside(volume, geometry, &displacement) {
            return ConstraintOutcome::still(displacement);
        }

        let moved_center = geometry.center + displacement;
        let reach = geometry.radius.min(self.max_search_distance);
        let wall = volume
            .nearest_point(&moved_center)
            .filter(|sp| (sp.position - moved_center).norm() <= reach);
        let Some(wall) = wall else {
            return ConstraintOutcome::still(displacement);
        };

        // The stored normal follows the model's own convention; probe which
        // side is outside the contained volume.
        let outward = if volume.contains(&(wall.position + wall.normal.into_inner() * NORMAL_PROBE_OFFSET)) {
            Unit::new_unchecked(-wall.normal.into_inner())
        } else {
            wall.normal
        };

        // Drop the component pushing through the wall, keeping tangential
        // motion.
        let mut clipped = displacement;
        let through = clipped.dot(&outward);
        if through > 0.0 {
            clipped -= outward.into_inner() * through;
        }
        if surface_stays_inside(volume, geometry, &clipped) {
            return ConstraintOutcome::still(clipped);
        }

        // Tangential motion can still graze a curved wall; back off to the
        // largest admissible fraction.
        let mut admissible = 0.0;
        let mut blocked = 1.0;
        for _ in 0..CLIP_BISECTION_STEPS {
            let mid = (admissible + blocked) / 2.0;
            if surface_stays_inside(volume, geometry, &(clipped * mid)) {
                admissible = mid;
            } else {
                blocked = mid;
            }
        }
        ConstraintOutcome::still(clipped * admissible)
    }
}

fn surface_stays_inside(
    volume: &dyn ModelGeometry,
    geometry: &ParticleGeometry,
    displacement: &Vector3<f64>,
) -> bool {
    geometry
        .world_vertices
        .iter()
        .all(|v| volume.contains(&(v + displacement)))
}
