//! # Engine Module
//!
//! This module implements the per-engine machinery of the common relaxation
//! interface: translating a structure plus a named precision protocol into an
//! engine-specific submission, and executing that submission through a driver.
//!
//! ## Overview
//!
//! Every supported quantum engine contributes an input generator that advertises its
//! capabilities (supported relaxation, spin, and electronic types along with its
//! protocol table) and performs the pure, side-effect-free translation of common
//! inputs into a [`generator::SubmissionSpec`]. Execution is separated behind the
//! [`driver::RelaxDriver`] trait; generators never trigger work themselves.
//!
//! ## Architecture
//!
//! - **Errors** ([`error`]) - The error taxonomy shared by generators, drivers, and
//!   workflows.
//! - **Protocols** ([`protocol`]) - Named precision/cost presets and their registry.
//! - **Generators** ([`generator`]) - Common inputs, validation, and submission specs.
//! - **Engines** ([`engines`]) - The built-in engine implementations.
//! - **Registry** ([`registry`]) - Name-based lookup of generators and drivers.
//! - **Drivers** ([`driver`]) - Execution of a submission into a completed relaxation.
//! - **Progress** ([`progress`]) - Callback-based progress reporting.
//! - **Cancellation** ([`cancel`]) - Cooperative cancellation of pending submissions.

pub mod cancel;
pub mod driver;
pub mod engines;
pub mod error;
pub mod generator;
pub mod progress;
pub mod protocol;
pub mod registry;
