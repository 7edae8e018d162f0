//! Per-iteration snapshot of world-space particle geometry.
//!
//! Mesh vertices are transformed into the tomogram frame once per iteration;
//! estimators and the spatial index then work on plain slices without touching
//! the particle system again.

use super::error::EngineError;
use crate::core::models::ids::{ListId, MeshId, ParticleId};
use crate::core::models::mesh::MeshLibrary;
use crate::core::models::system::ParticleSystem;
use crate::core::utils::geometry::Aabb;
use nalgebra::Point3;
use std::collections::HashSet;

/// World-space geometry of one participating particle.
#[derive(Debug)]
pub struct ParticleGeometry<'a> {
    pub id: ParticleId,
    pub list: ListId,
    pub frozen: bool,
    pub center: Point3<f64>,
    pub radius: f64,
    pub world_vertices: Vec<Point3<f64>>,
    pub triangles: &'a [[u32; 3]],
    pub bounds: Aabb,
}

#[derive(Debug)]
pub struct GeometryCache<'a> {
    entries: Vec<ParticleGeometry<'a>>,
}

impl<'a> GeometryCache<'a> {
    /// Transforms every participating particle's mesh to world space, in the
    /// given deterministic order.
    pub fn build(
        system: &ParticleSystem,
        order: &[ParticleId],
        meshes: &'a MeshLibrary,
        frozen_lists: &HashSet<ListId>,
    ) -> Result<Self, EngineError> {
        let mut entries = Vec::with_capacity(order.len());
        for &id in order {
            let particle = system
                .particle(id)
                .ok_or_else(|| EngineError::Internal(format!("stale particle id {id:?}")))?;
            let mesh_id: MeshId = particle
                .mesh
                .ok_or(EngineError::MeshUnavailable { particle: id })?;
            let mesh = meshes.get(mesh_id).ok_or(EngineError::MeshNotFound {
                particle: id,
                mesh: mesh_id,
            })?;

            let world_vertices: Vec<Point3<f64>> = mesh
                .vertices()
                .iter()
                .map(|v| particle.position + particle.rotation * v.coords)
                .collect();
            let bounds = Aabb::from_points(&world_vertices)
                .expect("validated mesh is never empty");

            entries.push(ParticleGeometry {
                id,
                list: particle.list,
                frozen: frozen_lists.contains(&particle.list),
                center: particle.position,
                radius: mesh.bounding_radius(),
                world_vertices,
                triangles: mesh.triangles(),
                bounds,
            });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ParticleGeometry<'a>] {
        &self.entries
    }
}
