//! Engine tasks: the per-iteration units of work the relaxation workflow
//! composes.

pub mod overlap;
