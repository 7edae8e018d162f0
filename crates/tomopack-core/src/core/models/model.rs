use super::ids::ModelId;
use super::mesh::TriMesh;
use crate::core::utils::geometry::{self, point_in_mesh};
use nalgebra::{Point3, Unit, Vector3};
use slotmap::SlotMap;

/// A point on a model surface, with the surface normal at that point.
///
/// For closed models the normal points out of the enclosed volume; triangle
/// meshes derive it from their winding order, which must be
/// counter-clockwise-outward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Point3<f64>,
    pub normal: Unit<Vector3<f64>>,
}

/// The narrow interface through which the engine queries host geometric
/// models, the attachment targets of manifold and boundary constraints.
///
/// Ownership of the underlying geometry stays with the host; the engine only
/// ever holds a [`ModelId`] into a [`ModelLibrary`].
pub trait ModelGeometry: Send + Sync {
    /// Nearest point of the model surface to `point`. `None` when no nearest
    /// point is defined (for example, the exact center of a sphere).
    fn nearest_point(&self, point: &Point3<f64>) -> Option<SurfacePoint>;

    /// Whether `point` lies inside the model's enclosed volume. Always false
    /// for open surfaces.
    fn contains(&self, point: &Point3<f64>) -> bool;

    /// Estimate of the surface patch scale around the point nearest to
    /// `point`, used to bound local searches.
    fn local_radius(&self, point: &Point3<f64>) -> f64;
}

impl ModelGeometry for TriMesh {
    fn nearest_point(&self, point: &Point3<f64>) -> Option<SurfacePoint> {
        let mut best: Option<(f64, SurfacePoint)> = None;
        for index in 0..self.triangles().len() {
            let [a, b, c] = self.triangle_vertices(index);
            let Some(normal) = geometry::triangle_normal(a, b, c) else {
                continue;
            };
            let candidate = geometry::closest_point_on_triangle(point, a, b, c);
            let distance = (candidate - point).norm_squared();
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((
                    distance,
                    SurfacePoint {
                        position: candidate,
                        normal,
                    },
                ));
            }
        }
        best.map(|(_, sp)| sp)
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        point_in_mesh(
            self.vertices(),
            self.triangles(),
            &self.local_bounds(),
            point,
        )
    }

    fn local_radius(&self, point: &Point3<f64>) -> f64 {
        // Mean edge length of the nearest triangle.
        let mut best: Option<(f64, usize)> = None;
        for index in 0..self.triangles().len() {
            let [a, b, c] = self.triangle_vertices(index);
            let candidate = geometry::closest_point_on_triangle(point, a, b, c);
            let distance = (candidate - point).norm_squared();
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, index));
            }
        }
        match best {
            Some((_, index)) => {
                let [a, b, c] = self.triangle_vertices(index);
                ((b - a).norm() + (c - b).norm() + (a - c).norm()) / 3.0
            }
            None => 0.0,
        }
    }
}

/// An analytic sphere, usable as either a manifold surface or a boundary
/// volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereModel {
    pub center: Point3<f64>,
    pub radius: f64,
}

impl SphereModel {
    pub fn new(center: Point3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl ModelGeometry for SphereModel {
    fn nearest_point(&self, point: &Point3<f64>) -> Option<SurfacePoint> {
        let radial = Unit::try_new(point - self.center, 1e-12)?;
        Some(SurfacePoint {
            position: self.center + radial.into_inner() * self.radius,
            normal: radial,
        })
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        (point - self.center).norm() <= self.radius
    }

    fn local_radius(&self, _point: &Point3<f64>) -> f64 {
        self.radius
    }
}

/// Host-owned registry of geometric models, addressed by stable handles.
#[derive(Default)]
pub struct ModelLibrary {
    models: SlotMap<ModelId, Box<dyn ModelGeometry>>,
}

impl ModelLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<M: ModelGeometry + 'static>(&mut self, model: M) -> ModelId {
        self.models.insert(Box::new(model))
    }

    pub fn get(&self, id: ModelId) -> Option<&dyn ModelGeometry> {
        self.models.get(id).map(|m| m.as_ref())
    }

    pub fn remove(&mut self, id: ModelId) -> Option<Box<dyn ModelGeometry>> {
        self.models.remove(id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
