//! # Core Models Module
//!
//! This module contains the data structures used to represent a particle scene,
//! providing the foundation for all relaxation operations.
//!
//! ## Key Components
//!
//! - [`particle`] - Individual particle records: position, orientation, open
//!   attribute mapping, and attached mesh handle
//! - [`list`] - Ordered particle lists sharing one coordinate frame and source
//!   format
//! - [`system`] - The slot-map-backed container owning lists and particles
//! - [`mesh`] - Triangle mesh buffers and the externally owned mesh library
//! - [`model`] - The narrow `ModelGeometry` interface to host geometric models
//!   (manifold surfaces and boundary volumes), plus built-in implementations
//! - [`ids`] - Unique identifier types for particles, lists, meshes, and models
//!
//! Particles and lists are created by format importers or editing commands
//! outside this crate; the relaxation engine only rewrites particle positions
//! and orientations in place.

pub mod ids;
pub mod list;
pub mod mesh;
pub mod model;
pub mod particle;
pub mod system;
