use super::ids::{ListId, MeshId};
use crate::core::utils::euler;
use nalgebra::{Point3, Rotation3};
use std::collections::HashMap;

/// A single value from a particle's open attribute mapping.
///
/// Exchange formats attach differing per-particle metadata; rather than
/// per-format subtypes, every particle carries an open name-to-value map.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

/// A positioned, oriented record representing one detected macromolecular
/// instance.
///
/// The orientation is stored canonically as a rotation matrix; the
/// `(rot, tilt, psi)` triple is a derived view through the orientation codec.
/// The invariant that the rotation stays orthonormal with determinant +1 is
/// maintained by only ever assigning `Rotation3` values.
#[derive(Debug, Clone)]
pub struct Particle {
    /// The list this particle belongs to. Exactly one per particle.
    pub list: ListId,
    /// Position in the shared reference frame.
    pub position: Point3<f64>,
    /// Orientation, rotating mesh-local coordinates into the shared frame.
    pub rotation: Rotation3<f64>,
    /// Handle of the attached surface mesh, if any.
    pub mesh: Option<MeshId>,
    /// Format-specific metadata.
    pub attributes: HashMap<String, AttributeValue>,
}

impl Particle {
    pub fn new(list: ListId, position: Point3<f64>) -> Self {
        Self {
            list,
            position,
            rotation: Rotation3::identity(),
            mesh: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation3<f64>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_mesh(mut self, mesh: MeshId) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// The `(rot, tilt, psi)` view of the orientation, in the unit selected
    /// by `scale` ([`euler::RADIANS`] or [`euler::DEGREES`]).
    pub fn euler_angles(&self, scale: f64) -> [f64; 3] {
        euler::matrix_to_angles(self.rotation.matrix(), scale)
    }

    /// Replaces the orientation from a `(rot, tilt, psi)` triple.
    pub fn set_euler_angles(&mut self, rot: f64, tilt: f64, psi: f64, scale: f64) {
        self.rotation = euler::angles_to_matrix(rot, tilt, psi, scale);
    }

    /// Maps a mesh-local point into the shared frame.
    pub fn to_world(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(name.into(), value);
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn number_attribute(&self, name: &str) -> Option<f64> {
        match self.attributes.get(name) {
            Some(AttributeValue::Number(value)) => Some(*value),
            _ => None,
        }
    }
}
