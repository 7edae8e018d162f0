//! Sampled-volume overlap estimation.
//!
//! The overlap box of the two bounding boxes is covered with a cell-centered
//! regular grid; the fraction of grid points inside both closed surfaces
//! scales the box volume into an intersection volume. The corrective step is
//! the cube root of that volume, taken along the line of centers.

use super::{OverlapEstimator, PairEstimate};
use crate::core::utils::geometry::point_in_mesh;
use crate::engine::cache::ParticleGeometry;
use itertools::iproduct;
use nalgebra::{Point3, Unit};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct VolumeEstimator {
    thoroughness: u32,
}

impl VolumeEstimator {
    pub fn new(thoroughness: u32) -> Self {
        Self { thoroughness }
    }

    /// Grid resolution per axis for the configured sample count.
    fn per_axis(&self) -> usize {
        ((self.thoroughness as f64).cbrt().round() as usize).max(2)
    }
}

impl OverlapEstimator for VolumeEstimator {
    fn estimate(&self, a: &ParticleGeometry, b: &ParticleGeometry) -> Option<PairEstimate> {
        let overlap_box = a.bounds.intersection(&b.bounds)?;

        let Some(direction) = Unit::try_new(a.center - b.center, 1e-9) else {
            warn!(
                first = ?a.id,
                second = ?b.id,
                "Coincident particle centers leave no line to separate along; \
                 leaving pair unresolved."
            );
            return None;
        };

        let n = self.per_axis();
        let size = overlap_box.size();
        let mut inside = 0usize;
        for (i, j, k) in iproduct!(0..n, 0..n, 0..n) {
            let point = Point3::new(
                overlap_box.min.x + size.x * ((i as f64 + 0.5) / n as f64),
                overlap_box.min.y + size.y * ((j as f64 + 0.5) / n as f64),
                overlap_box.min.z + size.z * ((k as f64 + 0.5) / n as f64),
            );
            if point_in_mesh(&a.world_vertices, a.triangles, &a.bounds, &point)
                && point_in_mesh(&b.world_vertices, b.triangles, &b.bounds, &point)
            {
                inside += 1;
            }
        }
        if inside == 0 {
            return None;
        }

        let fraction = inside as f64 / (n * n * n) as f64;
        let volume = overlap_box.volume() * fraction;
        Some(PairEstimate {
            magnitude: volume.cbrt(),
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::mesh::MeshLibrary;
    use crate::core::models::particle::Particle;
    use crate::core::models::system::ParticleSystem;
    use crate::engine::cache::GeometryCache;
    use crate::testing::cube_mesh;
    use nalgebra::Point3;
    use std::collections::HashSet;

    fn cached_cubes(offset: f64) -> (ParticleSystem, MeshLibrary, Vec<crate::core::models::ids::ParticleId>) {
        let mut meshes = MeshLibrary::new();
        let mesh = meshes.insert(cube_mesh(Point3::new(0.0, 0.0, 0.0), 1.0));
        let mut system = ParticleSystem::new();
        let list = system.new_list("cubes");
        let a = system
            .add_particle(
                list,
                Particle::new(list, Point3::new(0.0, 0.0, 0.0)).with_mesh(mesh),
            )
            .unwrap();
        let b = system
            .add_particle(
                list,
                Particle::new(list, Point3::new(offset, 0.0, 0.0)).with_mesh(mesh),
            )
            .unwrap();
        (system, meshes, vec![a, b])
    }

    #[test]
    fn cube_overlap_volume_is_recovered_exactly() {
        // Overlap region is [0, 1] x [-1, 1] x [-1, 1]: volume 4. Every
        // cell-centered sample of the overlap box lies inside both cubes, so
        // the sampled fraction is exactly 1.
        let (system, meshes, ids) = cached_cubes(1.0);
        let cache = GeometryCache::build(&system, &ids, &meshes, &HashSet::new()).unwrap();
        let estimate = VolumeEstimator::new(1000)
            .estimate(&cache.entries()[0], &cache.entries()[1])
            .unwrap();
        assert!((estimate.magnitude - 4.0_f64.cbrt()).abs() < 1e-9);
        assert!((estimate.direction.x + 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_bounds_short_circuit() {
        let (system, meshes, ids) = cached_cubes(10.0);
        let cache = GeometryCache::build(&system, &ids, &meshes, &HashSet::new()).unwrap();
        assert!(
            VolumeEstimator::new(1000)
                .estimate(&cache.entries()[0], &cache.entries()[1])
                .is_none()
        );
    }

    #[test]
    fn per_axis_resolution_never_drops_below_two() {
        assert_eq!(VolumeEstimator::new(1).per_axis(), 2);
        assert_eq!(VolumeEstimator::new(1000).per_axis(), 10);
        assert_eq!(VolumeEstimator::new(100).per_axis(), 5);
    }
}
