//! # Workflows Module
//!
//! This module provides the high-level entry points that orchestrate complete
//! engine runs over a particle scene.
//!
//! ## Overview
//!
//! Workflows are the top-level API for users of the library. They validate the
//! configuration and constraint assignment up front, drive the engine through
//! its iterations, report progress, and summarize the run in a result value.
//! Partial state never leaks: a workflow either finishes an iteration and
//! commits it, or leaves the scene untouched.
//!
//! ## Architecture
//!
//! - **Relaxation Workflow** ([`relax`]) - Iterative overlap removal under
//!   freeze, manifold, and boundary constraints.

pub mod relax;
