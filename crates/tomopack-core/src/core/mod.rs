//! # Core Module
//!
//! This module provides the fundamental building blocks for particle scene
//! representation and the pure numerical routines the relaxation engine is
//! built on.
//!
//! ## Overview
//!
//! The core module implements the essential data structures and utilities
//! required to describe a subtomogram particle scene: positioned and oriented
//! particle records grouped into lists, the triangle meshes attached to them,
//! and the geometric models (surfaces and volumes) that constraints refer to.
//!
//! ## Architecture
//!
//! The module is organized into specialized submodules:
//!
//! - **Scene Representation** ([`models`]) - Particles, particle lists, meshes,
//!   geometric models, and the slot-map-backed `ParticleSystem` container
//! - **Numerical Utilities** ([`utils`]) - The RELION-convention orientation
//!   codec and the mesh-geometry primitives (intersection, containment, plane
//!   fitting) shared by the overlap estimators and constraints

pub mod models;
pub mod utils;
