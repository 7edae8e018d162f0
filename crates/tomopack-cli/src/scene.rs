//! TOML scene descriptions.
//!
//! A scene file names mesh recipes, analytic models, particle lists, and
//! constraint attachments; building it materializes the libraries and the
//! particle system the core operates on. Mesh generation is deliberately a
//! host concern: the core only ever sees finished vertex and face buffers.

use crate::error::{CliError, Result};
use nalgebra::Point3;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::path::Path;
use tomopack::core::models::ids::ListId;
use tomopack::core::models::mesh::{MeshLibrary, TriMesh};
use tomopack::core::models::model::{ModelLibrary, SphereModel};
use tomopack::core::models::particle::Particle;
use tomopack::core::models::system::ParticleSystem;
use tomopack::core::utils::euler::DEGREES;
use tomopack::engine::config::RelaxationConfig;
use tomopack::engine::constraints::ConstraintSet;
use tracing::debug;

fn default_rings() -> u32 {
    16
}

fn default_segments() -> u32 {
    24
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SceneFile {
    /// Engine configuration, deserialized straight into the core type.
    #[serde(default)]
    pub relax: RelaxationConfig,
    /// Named mesh recipes particles can attach to.
    #[serde(default)]
    pub meshes: BTreeMap<String, MeshRecipe>,
    /// Named analytic models constraints can attach to.
    #[serde(default)]
    pub models: BTreeMap<String, ModelRecipe>,
    /// Particle lists, in file order.
    #[serde(default)]
    pub lists: Vec<ListEntry>,
    #[serde(default)]
    pub constraints: ConstraintEntries,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", deny_unknown_fields)]
pub enum MeshRecipe {
    /// A UV sphere triangulation.
    Sphere {
        radius: f64,
        #[serde(default = "default_rings")]
        rings: u32,
        #[serde(default = "default_segments")]
        segments: u32,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", deny_unknown_fields)]
pub enum ModelRecipe {
    /// An analytic sphere, usable as manifold surface or boundary volume.
    Sphere { center: [f64; 3], radius: f64 },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListEntry {
    pub name: String,
    /// Name of the mesh recipe attached to every particle of this list.
    pub mesh: Option<String>,
    #[serde(default)]
    pub particles: Vec<ParticleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticleEntry {
    pub position: [f64; 3],
    /// `(rot, tilt, psi)` in degrees.
    #[serde(default)]
    pub angles: [f64; 3],
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConstraintEntries {
    #[serde(default)]
    pub frozen: Vec<String>,
    #[serde(default)]
    pub manifold: Vec<Attachment>,
    #[serde(default)]
    pub boundary: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attachment {
    pub list: String,
    pub model: String,
}

/// Everything the relaxation workflow needs, materialized from a scene file.
pub struct BuiltScene {
    pub system: ParticleSystem,
    pub meshes: MeshLibrary,
    pub models: ModelLibrary,
    /// `(name, id)` pairs in file order; every list participates in the run.
    pub lists: Vec<(String, ListId)>,
    pub constraints: ConstraintSet,
    pub config: RelaxationConfig,
}

impl SceneFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn build(&self) -> Result<BuiltScene> {
        let mut meshes = MeshLibrary::new();
        let mut mesh_ids = BTreeMap::new();
        for (name, recipe) in &self.meshes {
            let mesh = recipe.generate()?;
            debug!(
                mesh = name.as_str(),
                vertices = mesh.vertices().len(),
                triangles = mesh.triangles().len(),
                "Generated mesh."
            );
            mesh_ids.insert(name.as_str(), meshes.insert(mesh));
        }

        let mut models = ModelLibrary::new();
        let mut model_ids = BTreeMap::new();
        for (name, recipe) in &self.models {
            let id = match *recipe {
                ModelRecipe::Sphere { center, radius } => models.insert(SphereModel::new(
                    Point3::new(center[0], center[1], center[2]),
                    radius,
                )),
            };
            model_ids.insert(name.as_str(), id);
        }

        let mut system = ParticleSystem::new();
        let mut lists = Vec::with_capacity(self.lists.len());
        let mut list_ids = BTreeMap::new();
        for entry in &self.lists {
            if list_ids.contains_key(entry.name.as_str()) {
                return Err(CliError::Scene(format!(
                    "duplicate particle list '{}'",
                    entry.name
                )));
            }
            let mesh = entry
                .mesh
                .as_deref()
                .map(|name| {
                    mesh_ids.get(name).copied().ok_or_else(|| {
                        CliError::Scene(format!(
                            "list '{}' references unknown mesh '{}'",
                            entry.name, name
                        ))
                    })
                })
                .transpose()?;

            let list = system.new_list(&entry.name);
            for record in &entry.particles {
                let mut particle = Particle::new(
                    list,
                    Point3::new(record.position[0], record.position[1], record.position[2]),
                );
                particle.set_euler_angles(
                    record.angles[0],
                    record.angles[1],
                    record.angles[2],
                    DEGREES,
                );
                if let Some(mesh) = mesh {
                    particle = particle.with_mesh(mesh);
                }
                system.add_particle(list, particle);
            }
            list_ids.insert(entry.name.as_str(), list);
            lists.push((entry.name.clone(), list));
        }

        let find_list = |name: &str| {
            list_ids.get(name).copied().ok_or_else(|| {
                CliError::Scene(format!("constraint references unknown list '{}'", name))
            })
        };
        let find_model = |name: &str| {
            model_ids.get(name).copied().ok_or_else(|| {
                CliError::Scene(format!("constraint references unknown model '{}'", name))
            })
        };

        let mut constraints = ConstraintSet::new();
        for name in &self.constraints.frozen {
            constraints = constraints.with_frozen(find_list(name)?);
        }
        for attachment in &self.constraints.manifold {
            constraints =
                constraints.with_manifold(find_list(&attachment.list)?, find_model(&attachment.model)?);
        }
        for attachment in &self.constraints.boundary {
            constraints =
                constraints.with_boundary(find_list(&attachment.list)?, find_model(&attachment.model)?);
        }

        Ok(BuiltScene {
            system,
            meshes,
            models,
            lists,
            constraints,
            config: self.relax.clone(),
        })
    }
}

impl MeshRecipe {
    fn generate(&self) -> Result<TriMesh> {
        match *self {
            MeshRecipe::Sphere {
                radius,
                rings,
                segments,
            } => uv_sphere(radius, rings, segments),
        }
    }
}

/// Triangulates a UV sphere around the local origin, counter-clockwise seen
/// from outside.
fn uv_sphere(radius: f64, rings: u32, segments: u32) -> Result<TriMesh> {
    if radius <= 0.0 {
        return Err(CliError::Scene(format!(
            "sphere mesh radius must be positive, got {radius}"
        )));
    }
    if rings < 2 || segments < 3 {
        return Err(CliError::Scene(format!(
            "sphere mesh needs at least 2 rings and 3 segments, got {rings} and {segments}"
        )));
    }

    let mut vertices = vec![Point3::new(0.0, 0.0, radius)];
    for ring in 1..rings {
        let theta = PI * ring as f64 / rings as f64;
        for segment in 0..segments {
            let phi = 2.0 * PI * segment as f64 / segments as f64;
            vertices.push(Point3::new(
                radius * theta.sin() * phi.cos(),
                radius * theta.sin() * phi.sin(),
                radius * theta.cos(),
            ));
        }
    }
    let bottom = vertices.len() as u32;
    vertices.push(Point3::new(0.0, 0.0, -radius));

    let index = |ring: u32, segment: u32| 1 + (ring - 1) * segments + segment % segments;

    let mut triangles = Vec::new();
    for segment in 0..segments {
        triangles.push([0, index(1, segment), index(1, segment + 1)]);
    }
    for ring in 1..rings - 1 {
        for segment in 0..segments {
            let a = index(ring, segment);
            let b = index(ring, segment + 1);
            let c = index(ring + 1, segment + 1);
            let d = index(ring + 1, segment);
            triangles.push([a, d, c]);
            triangles.push([a, c, b]);
        }
    }
    for segment in 0..segments {
        triangles.push([bottom, index(rings - 1, segment + 1), index(rings - 1, segment)]);
    }

    TriMesh::new(vertices, triangles)
        .map_err(|e| CliError::Scene(format!("generated sphere mesh is invalid: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tomopack::engine::config::RelaxMethod;

    const SCENE: &str = r#"
        [relax]
        method = "volume"
        max_iterations = 40
        precision = 0.25

        [meshes.capsid]
        kind = "sphere"
        radius = 2.0
        rings = 8
        segments = 12

        [models.cell]
        kind = "sphere"
        center = [0.0, 0.0, 0.0]
        radius = 100.0

        [[lists]]
        name = "ribosomes"
        mesh = "capsid"

        [[lists.particles]]
        position = [1.0, 2.0, 3.0]
        angles = [20.0, 60.0, -45.0]

        [[lists.particles]]
        position = [4.0, 2.0, 3.0]

        [[lists]]
        name = "fiducials"
        mesh = "capsid"

        [[lists.particles]]
        position = [50.0, 0.0, 0.0]

        [constraints]
        frozen = ["fiducials"]

        [[constraints.boundary]]
        list = "ribosomes"
        model = "cell"
    "#;

    #[test]
    fn a_full_scene_parses_and_builds() {
        let scene: SceneFile = toml::from_str(SCENE).unwrap();
        assert_eq!(scene.relax.method, RelaxMethod::Volume);
        assert_eq!(scene.relax.max_iterations, 40);

        let built = scene.build().unwrap();
        assert_eq!(built.lists.len(), 2);
        assert_eq!(built.system.particle_count(), 3);
        assert_eq!(built.meshes.len(), 1);
        assert_eq!(built.models.len(), 1);
        assert_eq!(built.constraints.frozen().len(), 1);
        assert_eq!(built.constraints.boundary().len(), 1);
        assert!(built.constraints.manifold().is_empty());
    }

    #[test]
    fn particle_angles_round_trip_through_the_codec() {
        let scene: SceneFile = toml::from_str(SCENE).unwrap();
        let built = scene.build().unwrap();

        let ribosomes = built.lists[0].1;
        let (_, first) = built.system.particles_of(ribosomes).next().unwrap();
        let [rot, tilt, psi] = first.euler_angles(DEGREES);
        assert!((rot - 20.0).abs() < 1e-9);
        assert!((tilt - 60.0).abs() < 1e-9);
        assert!((psi + 45.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_mesh_references_are_rejected() {
        let scene: SceneFile = toml::from_str(
            r#"
            [[lists]]
            name = "orphans"
            mesh = "missing"
            "#,
        )
        .unwrap();
        let err = scene.build().err().unwrap();
        assert!(matches!(err, CliError::Scene(message) if message.contains("missing")));
    }

    #[test]
    fn unknown_constraint_names_are_rejected() {
        let scene: SceneFile = toml::from_str(
            r#"
            [constraints]
            frozen = ["ghosts"]
            "#,
        )
        .unwrap();
        let err = scene.build().err().unwrap();
        assert!(matches!(err, CliError::Scene(message) if message.contains("ghosts")));
    }

    #[test]
    fn degenerate_sphere_recipes_are_rejected() {
        assert!(uv_sphere(0.0, 8, 12).is_err());
        assert!(uv_sphere(1.0, 1, 12).is_err());
        assert!(uv_sphere(1.0, 8, 2).is_err());
    }

    #[test]
    fn generated_spheres_are_closed() {
        let mesh = uv_sphere(2.0, 8, 12).unwrap();
        // Poles plus (rings - 1) bands of `segments` vertices.
        assert_eq!(mesh.vertices().len(), 2 + 7 * 12);
        // Two fans plus quads split in two.
        assert_eq!(mesh.triangles().len(), 12 * 2 + 6 * 12 * 2);
        assert!((mesh.bounding_radius() - 2.0).abs() < 1e-12);
    }
}
