//! # Workflows Module
//!
//! High-level entry points tying the engine layer together into complete
//! procedures.
//!
//! - **Common Relaxation** ([`relax`]) - One relaxation through any engine, with
//!   outputs normalized to the common result record.
//! - **Equation of State** ([`eos`]) - A series of fixed-volume relaxations over
//!   scaled copies of a structure, reference-linked through an anchor run so the
//!   resulting energies are mutually comparable.

pub mod eos;
pub mod relax;
