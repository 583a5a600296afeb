//! # Data Models
//!
//! Stateless data structures shared across the engine and workflow layers.
//!
//! - [`structure`] - Atomic structures: sites, optional lattices, uniform volume
//!   scaling for equation-of-state sampling.
//! - [`types`] - The enumerated option types of the common relaxation interface.
//! - [`results`] - Normalized relaxation outputs and completed-relaxation records.

pub mod results;
pub mod structure;
pub mod types;
