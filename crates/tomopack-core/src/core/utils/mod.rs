//! Numerical utilities shared across the crate: the orientation codec used by
//! particle-list exchange formats and the mesh-geometry primitives used by the
//! overlap estimators and constraints.

pub mod euler;
pub mod geometry;
