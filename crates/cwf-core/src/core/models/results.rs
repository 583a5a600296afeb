use super::structure::Structure;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// The numerical parameters that must be kept constant between runs for their total
/// energies to be directly subtractable.
///
/// When a generator is handed a reference run, it reproduces these settings verbatim
/// instead of re-deriving them (for example the k-point mesh, which would otherwise
/// change with the cell volume).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericalSettings {
    /// Monkhorst-Pack mesh dimensions; `None` for non-periodic (Γ-only) runs.
    pub kpoint_mesh: Option<[u32; 3]>,
    /// Plane-wave cutoff in eV, where the engine uses one.
    pub cutoff_ev: Option<f64>,
    /// Smearing width in eV, where the engine uses one.
    pub smearing_ev: Option<f64>,
}

/// The normalized outputs of a relaxation, common to every engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaxOutputs {
    /// The relaxed structure in Ångstrom. Absent for single-point runs.
    pub relaxed_structure: Option<Structure>,
    /// Total energy in eV.
    pub total_energy: f64,
    /// Final forces on all atoms in eV/Å.
    pub forces: Option<Vec<Vector3<f64>>>,
    /// Final stress tensor in eV/Å³.
    pub stress: Option<Matrix3<f64>>,
    /// Total magnetization in Bohr magnetons; present only for spin-polarized runs.
    pub total_magnetization: Option<f64>,
    /// Whether the engine reported convergence; `None` when it does not report one.
    pub converged: Option<bool>,
}

/// A completed relaxation: which engine produced it, the numerical settings it
/// actually used, and its normalized outputs.
///
/// A `RelaxNode` doubles as the reference handed to later runs: energies of two
/// relaxations are comparable only when they share the settings of a common
/// reference, and the reference itself carries no reference of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaxNode {
    pub engine: String,
    pub settings: NumericalSettings,
    pub outputs: RelaxOutputs,
}
