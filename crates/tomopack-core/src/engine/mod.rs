//! # Engine Module
//!
//! This module implements the relaxation engine: the stateful machinery that
//! turns a particle scene plus a constraint set into per-iteration corrective
//! displacements.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Method selection, iteration cap,
//!   convergence and sampling parameters
//! - **Error Handling** ([`error`]) - Contract-violation and run-level errors
//! - **Progress & Cancellation** ([`progress`]) - Callback-based reporting and
//!   the iteration-boundary cancel token
//! - **Spatial Index** ([`index`]) - Per-iteration broad phase over particle
//!   surfaces
//! - **Overlap Estimation** ([`estimators`]) - The interchangeable
//!   distance-based and volume-based strategies
//! - **Constraints** ([`constraints`]) - Freeze, manifold projection, and
//!   boundary containment
//!
//! The per-iteration estimation pass lives in the crate-private [`tasks`]
//! submodule; the public entry point tying everything together is
//! [`crate::workflows::relax::run`].

pub(crate) mod cache;
pub mod config;
pub mod constraints;
pub mod error;
pub(crate) mod estimators;
pub(crate) mod index;
pub mod progress;
pub(crate) mod tasks;
