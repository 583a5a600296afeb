//! # Built-in Engines
//!
//! One module per supported engine. [`quantum_espresso`] and [`castep`] generate
//! submission specifications for their external codes; [`lennard_jones`] is a fully
//! executable toy engine that relaxes structures in-process, giving the library a
//! runnable path without any external software.

pub mod castep;
pub mod lennard_jones;
pub mod quantum_espresso;
