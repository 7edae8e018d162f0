//! # Tomopack Core Library
//!
//! A library for managing spatially located, oriented particles, as produced by
//! cryo-electron-tomography subtomogram analysis, and for resolving geometric
//! conflicts between their attached surface meshes through iterative constrained
//! relaxation.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`ParticleSystem`,
//!   `TriMesh`, the `ModelGeometry` trait) and pure numerical utilities: the
//!   RELION-convention orientation codec (`matrix_to_angles`, `angles_to_matrix`,
//!   `axis_rotation`) and the mesh-geometry primitives shared by the engine.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates a relaxation
//!   run. It includes the per-iteration spatial index, the interchangeable overlap
//!   estimation strategies (distance-based and volume-based), the constraint set
//!   (freeze, manifold projection, boundary containment), and the parallel
//!   per-pair estimation task.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing
//!   layer. It ties the `engine` and `core` together into the single relaxation
//!   entry point [`workflows::relax::run`], which mutates particle positions and
//!   orientations in place and reports the terminal state reached.

pub mod core;
pub mod engine;
pub mod workflows;

#[cfg(test)]
pub(crate) mod testing;
