//! # Core Module
//!
//! This module provides the fundamental building blocks shared by every engine and
//! workflow in the library: data structures for atomic structures and relaxation
//! results, the enumerated option types of the common interface, and structure file
//! I/O.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Atomic structures with optional lattices, the
//!   relaxation/spin/electronic type enumerations, and normalized relaxation results.
//! - **File I/O** ([`io`]) - Reading and writing structures in XYZ and POSCAR formats.

pub mod io;
pub mod models;
