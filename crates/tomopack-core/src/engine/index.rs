//! Broad-phase candidate search over particle centers.
//!
//! A k-d tree over the cached world centers turns the all-pairs scan into a
//! radius query per particle. The radius is conservative (own bounding radius
//! plus the scene-wide maximum), so narrow-phase estimators never miss a
//! touching pair.

use super::cache::GeometryCache;
use kiddo::{KdTree, SquaredEuclidean};

/// Index pairs into the cache entry slice, always with the smaller index
/// first, sorted ascending. Frozen-frozen pairs are skipped since neither
/// side can move.
pub fn candidate_pairs(cache: &GeometryCache) -> Vec<(usize, usize)> {
    let entries = cache.entries();
    if entries.len() < 2 {
        return Vec::new();
    }

    let centers: Vec<[f64; 3]> = entries
        .iter()
        .map(|e| [e.center.x, e.center.y, e.center.z])
        .collect();
    let tree: KdTree<f64, 3> = (&centers).into();
    let max_radius = entries.iter().map(|e| e.radius).fold(0.0, f64::max);

    let mut pairs = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let reach = entry.radius + max_radius;
        for neighbour in
            tree.within_unsorted::<SquaredEuclidean>(&centers[i], reach * reach)
        {
            let j = neighbour.item as usize;
            if j <= i {
                continue;
            }
            let other = &entries[j];
            if entry.frozen && other.frozen {
                continue;
            }
            if entry.bounds.intersects(&other.bounds) {
                pairs.push((i, j));
            }
        }
    }
    pairs.sort_unstable();
    pairs
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

    fn scene_with_cubes(
        positions: &[Point3<f64>],
    ) -> (ParticleSystem, MeshLibrary, Vec<crate::core::models::ids::ParticleId>) {
        let mut meshes = MeshLibrary::new();
        let mesh = meshes.insert(cube_mesh(Point3::new(0.0, 0.0, 0.0), 1.0));
        let mut system = ParticleSystem::new();
        let list = system.new_list("cubes");
        let ids = positions
            .iter()
            .map(|&p| {
                system
                    .add_particle(list, Particle::new(list, p).with_mesh(mesh))
                    .unwrap()
            })
            .collect();
        (system, meshes, ids)
    }

    #[test]
    fn finds_overlapping_pairs_and_skips_distant_ones() {
        let (system, meshes, ids) = scene_with_cubes(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
        ]);
        let cache = GeometryCache::build(&system, &ids, &meshes, &HashSet::new()).unwrap();
        assert_eq!(candidate_pairs(&cache), vec![(0, 1)]);
    }

    #[test]
    fn pairs_are_reported_once_in_ascending_order() {
        let (system, meshes, ids) = scene_with_cubes(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ]);
        let cache = GeometryCache::build(&system, &ids, &meshes, &HashSet::new()).unwrap();
        assert_eq!(candidate_pairs(&cache), vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn frozen_pairs_with_no_mobile_side_are_dropped() {
        let mut meshes = MeshLibrary::new();
        let mesh = meshes.insert(cube_mesh(Point3::new(0.0, 0.0, 0.0), 1.0));
        let mut system = ParticleSystem::new();
        let fixed = system.new_list("fixed");
        let mobile = system.new_list("mobile");
        let a = system
            .add_particle(
                fixed,
                Particle::new(fixed, Point3::new(0.0, 0.0, 0.0)).with_mesh(mesh),
            )
            .unwrap();
        let b = system
            .add_particle(
                fixed,
                Particle::new(fixed, Point3::new(1.0, 0.0, 0.0)).with_mesh(mesh),
            )
            .unwrap();
        let c = system
            .add_particle(
                mobile,
                Particle::new(mobile, Point3::new(0.5, 1.0, 0.0)).with_mesh(mesh),
            )
            .unwrap();

        let frozen = HashSet::from([fixed]);
        let cache = GeometryCache::build(&system, &[a, b, c], &meshes, &frozen).unwrap();
        assert_eq!(candidate_pairs(&cache), vec![(0, 2), (1, 2)]);
    }
}
