//! Separating-plane overlap estimation.
//!
//! Vertices of the two surfaces that lie within a small contact distance of
//! each other form the contact cloud. A least-squares plane through that cloud
//! approximates the contact interface; the deepest vertex of each particle
//! beyond the plane measures how far the surfaces interpenetrate. When the
//! cloud spreads evenly in more than one direction the fit is unreliable, and
//! the pair separates along the line through the particle centers instead.

use super::{OverlapEstimator, PairEstimate};
use crate::core::utils::geometry::{PlaneFit, fit_plane, max_depth_beyond_plane};
use crate::engine::cache::ParticleGeometry;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Point3, Unit};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Vertices closer than this are considered in contact, in frame units.
const CONTACT_DISTANCE: f64 = 1.0;
/// Plane fits with a singular-value tie above this ratio carry no usable
/// direction; the pair then separates along the line through the centers.
const DIRECTION_AMBIGUITY_LIMIT: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct DistanceEstimator {
    contact_distance: f64,
}

impl Default for DistanceEstimator {
    fn default() -> Self {
        Self {
            contact_distance: CONTACT_DISTANCE,
        }
    }
}

impl OverlapEstimator for DistanceEstimator {
    fn estimate(&self, a: &ParticleGeometry, b: &ParticleGeometry) -> Option<PairEstimate> {
        let b_coords: Vec<[f64; 3]> = b
            .world_vertices
            .iter()
            .map(|v| [v.x, v.y, v.z])
            .collect();
        let tree: KdTree<f64, 3> = (&b_coords).into();
        let radius_sq = self.contact_distance * self.contact_distance;

        let mut cloud: Vec<Point3<f64>> = Vec::new();
        let mut close_b: BTreeSet<usize> = BTreeSet::new();
        for vertex in &a.world_vertices {
            let neighbours =
                tree.within_unsorted::<SquaredEuclidean>(&[vertex.x, vertex.y, vertex.z], radius_sq);
            if neighbours.is_empty() {
                continue;
            }
            cloud.push(*vertex);
            for neighbour in neighbours {
                close_b.insert(neighbour.item as usize);
            }
        }
        if cloud.is_empty() {
            return None;
        }
        cloud.extend(close_b.iter().map(|&i| b.world_vertices[i]));

        let (origin, normal) = match fit_plane(&cloud) {
            Some(PlaneFit {
                centroid,
                mut normal,
                ambiguity,
            }) if ambiguity < DIRECTION_AMBIGUITY_LIMIT => {
                // Point the normal from the first particle toward the contact
                // zone.
                if normal.dot(&(centroid - a.center)) < 0.0 {
                    normal = Unit::new_unchecked(-normal.into_inner());
                }
                (centroid, normal)
            }
            // Deep or symmetric interpenetration leaves the contact cloud with
            // no preferred direction; separate along the center line instead.
            _ => {
                let Some(normal) = Unit::try_new(b.center - a.center, 1e-9) else {
                    warn!(
                        first = ?a.id,
                        second = ?b.id,
                        "Coincident centers and no contact plane; leaving pair unresolved."
                    );
                    return None;
                };
                debug!(
                    first = ?a.id,
                    second = ?b.id,
                    "Ambiguous contact plane; separating along the center line."
                );
                let midpoint = Point3::from((a.center.coords + b.center.coords) / 2.0);
                (midpoint, normal)
            }
        };

        let depth_a = max_depth_beyond_plane(&a.world_vertices, &origin, &normal);
        let flipped = Unit::new_unchecked(-normal.into_inner());
        let depth_b = max_depth_beyond_plane(&b.world_vertices, &origin, &flipped);

        let magnitude = (depth_a + depth_b) / 2.0;
        if magnitude <= 0.0 {
            return None;
        }
        Some(PairEstimate {
            magnitude,
            direction: flipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::mesh::{MeshLibrary, TriMesh};
    use crate::core::models::particle::Particle;
    use crate::core::models::system::ParticleSystem;
    use crate::engine::cache::GeometryCache;
    use crate::testing::{cube_mesh, uv_sphere_mesh};
    use nalgebra::Point3;
    use std::collections::HashSet;

    fn cached_pair(
        mesh: TriMesh,
        offset: f64,
    ) -> (ParticleSystem, MeshLibrary, Vec<crate::core::models::ids::ParticleId>) {
        let mut meshes = MeshLibrary::new();
        let mesh = meshes.insert(mesh);
        let mut system = ParticleSystem::new();
        let list = system.new_list("pair");
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

    fn cached_cubes(
        offset: f64,
    ) -> (ParticleSystem, MeshLibrary, Vec<crate::core::models::ids::ParticleId>) {
        cached_pair(cube_mesh(Point3::new(0.0, 0.0, 0.0), 1.0), offset)
    }

    #[test]
    fn interpenetrating_cubes_yield_the_mean_depth() {
        // Faces at x = 1.0 and x = 0.5 overlap by 0.5; contact vertices sit on
        // those two planes, so the fitted plane is x = 0.75 and each side digs
        // 0.25 beyond it.
        let (system, meshes, ids) = cached_cubes(1.5);
        let cache = GeometryCache::build(&system, &ids, &meshes, &HashSet::new()).unwrap();
        let estimate = DistanceEstimator::default()
            .estimate(&cache.entries()[0], &cache.entries()[1])
            .unwrap();
        assert!((estimate.magnitude - 0.25).abs() < 1e-9);
        assert!((estimate.direction.x + 1.0).abs() < 1e-9);
        assert!(estimate.direction.y.abs() < 1e-9);
        assert!(estimate.direction.z.abs() < 1e-9);
    }

    #[test]
    fn deeply_overlapped_spheres_separate_along_the_center_line() {
        // With identical spheres one unit apart, nearly every vertex sits
        // within the contact cutoff of its translated twin and the cloud has
        // no preferred direction. The estimate must follow the center line,
        // measuring depth from the plane through the midpoint: each sphere
        // reaches 1.5 past it.
        let (system, meshes, ids) =
            cached_pair(uv_sphere_mesh(Point3::new(0.0, 0.0, 0.0), 2.0, 8, 12), 1.0);
        let cache = GeometryCache::build(&system, &ids, &meshes, &HashSet::new()).unwrap();
        let estimate = DistanceEstimator::default()
            .estimate(&cache.entries()[0], &cache.entries()[1])
            .unwrap();
        assert!((estimate.magnitude - 1.5).abs() < 1e-9);
        assert!((estimate.direction.x + 1.0).abs() < 1e-9);
        assert!(estimate.direction.y.abs() < 1e-9);
        assert!(estimate.direction.z.abs() < 1e-9);
    }

    #[test]
    fn separated_cubes_produce_no_estimate() {
        let (system, meshes, ids) = cached_cubes(5.0);
        let cache = GeometryCache::build(&system, &ids, &meshes, &HashSet::new()).unwrap();
        assert!(
            DistanceEstimator::default()
                .estimate(&cache.entries()[0], &cache.entries()[1])
                .is_none()
        );
    }
}
