use super::ids::MeshId;
use crate::core::utils::geometry::Aabb;
use nalgebra::Point3;
use slotmap::SlotMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("triangle {triangle} references vertex {vertex}, but the mesh has only {vertex_count} vertices")]
    IndexOutOfBounds {
        triangle: usize,
        vertex: u32,
        vertex_count: usize,
    },
    #[error("a mesh requires at least one vertex and one triangle")]
    Empty,
}

/// An immutable triangle surface in the particle's local frame.
///
/// Vertex and face buffers are owned by whoever materialized the mesh (host
/// application, importer, or test fixture); particles reference meshes only
/// through [`MeshId`] handles into a [`MeshLibrary`].
#[derive(Debug, Clone, PartialEq)]
pub struct TriMesh {
    vertices: Vec<Point3<f64>>,
    triangles: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new(vertices: Vec<Point3<f64>>, triangles: Vec<[u32; 3]>) -> Result<Self, MeshError> {
        if vertices.is_empty() || triangles.is_empty() {
            return Err(MeshError::Empty);
        }
        for (index, tri) in triangles.iter().enumerate() {
            for &vertex in tri {
                if vertex as usize >= vertices.len() {
                    return Err(MeshError::IndexOutOfBounds {
                        triangle: index,
                        vertex,
                        vertex_count: vertices.len(),
                    });
                }
            }
        }
        Ok(Self {
            vertices,
            triangles,
        })
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn triangle_vertices(&self, index: usize) -> [&Point3<f64>; 3] {
        let tri = &self.triangles[index];
        [
            &self.vertices[tri[0] as usize],
            &self.vertices[tri[1] as usize],
            &self.vertices[tri[2] as usize],
        ]
    }

    /// Bounds of the untransformed vertex buffer.
    pub fn local_bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices).expect("validated mesh is never empty")
    }

    /// Greatest vertex distance from the local origin, which is the particle's
    /// rotation center. Bounds every world-space extent of the mesh.
    pub fn bounding_radius(&self) -> f64 {
        self.vertices
            .iter()
            .map(|v| v.coords.norm())
            .fold(0.0, f64::max)
    }
}

/// Host-owned storage for mesh buffers, addressed by stable handles.
#[derive(Debug, Default)]
pub struct MeshLibrary {
    meshes: SlotMap<MeshId, TriMesh>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mesh: TriMesh) -> MeshId {
        self.meshes.insert(mesh)
    }

    pub fn get(&self, id: MeshId) -> Option<&TriMesh> {
        self.meshes.get(id)
    }

    pub fn remove(&mut self, id: MeshId) -> Option<TriMesh> {
        self.meshes.remove(id)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
