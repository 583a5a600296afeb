//! # Common Workflows Core Library
//!
//! A uniform interface for driving structure relaxations, and the equation-of-state
//! workflow built on top of it, across heterogeneous quantum chemistry engines.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`Structure`, the
//!   enumerated relaxation/spin/electronic types, normalized relaxation results) and
//!   structure file I/O.
//!
//! - **[`engine`]: The Logic Core.** This layer owns the per-engine machinery: protocol
//!   registries translating named precision presets into numerical parameters, input
//!   generators producing engine-specific submission specifications, the engine
//!   registry, and the relax driver abstraction that executes a submission.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing layer.
//!   It ties the `engine` and `core` together to execute complete scientific
//!   procedures: a single common relaxation, or a full equation-of-state series with
//!   reference-linked, mutually comparable energies.

pub mod core;
pub mod engine;
pub mod workflows;
