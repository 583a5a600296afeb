//! An in-process Lennard-Jones engine.
//!
//! This is a deliberately small engine that runs entirely inside the library: a
//! 12-6 Lennard-Jones potential with argon-like parameters applied to every species,
//! truncated at a per-protocol cutoff, and a steepest-descent position relaxation.
//! It exists so that workflows can be exercised end-to-end (and produce real
//! equation-of-state curves) without any external quantum chemistry code.

use crate::core::models::results::{NumericalSettings, RelaxNode, RelaxOutputs};
use crate::core::models::structure::{Lattice, Site, Structure};
use crate::core::models::types::{ElectronicType, RelaxType, SpinType};
use crate::engine::driver::RelaxDriver;
use crate::engine::error::EngineError;
use crate::engine::generator::{InputGenerator, RelaxInputs, ResolvedInputs, SubmissionSpec};
use crate::engine::protocol::ProtocolRegistry;
use nalgebra::Vector3;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use toml::Value;

/// Well depth in eV (argon).
const EPSILON_EV: f64 = 0.0103;
/// Collision diameter in Å (argon).
const SIGMA: f64 = 3.405;

static PROTOCOLS: LazyLock<ProtocolRegistry> = LazyLock::new(|| {
    ProtocolRegistry::from_toml(include_str!("protocols/lennard_jones.toml"))
        .expect("built-in lennard_jones protocol table is valid")
});

const RELAX_TYPES: &[RelaxType] = &[RelaxType::None, RelaxType::Positions];
const SPIN_TYPES: &[SpinType] = &[SpinType::None];
const ELECTRONIC_TYPES: &[ElectronicType] = &[ElectronicType::Metal, ElectronicType::Insulator];

#[derive(Debug, Default)]
pub struct LennardJonesGenerator;

impl InputGenerator for LennardJonesGenerator {
    fn engine_name(&self) -> &'static str {
        "lennard_jones"
    }

    fn protocols(&self) -> &ProtocolRegistry {
        &PROTOCOLS
    }

    fn relax_types(&self) -> &[RelaxType] {
        RELAX_TYPES
    }

    fn spin_types(&self) -> &[SpinType] {
        SPIN_TYPES
    }

    fn electronic_types(&self) -> &[ElectronicType] {
        ELECTRONIC_TYPES
    }

    fn construct(
        &self,
        inputs: &RelaxInputs,
        resolved: &ResolvedInputs,
    ) -> Result<SubmissionSpec, EngineError> {
        let (cutoff_sigmas, max_steps) = match resolved.protocol_name.as_str() {
            "fast" => (2.5, 200),
            "precise" => (6.0, 2000),
            _ => (4.0, 500), // moderate
        };

        let mut table: BTreeMap<String, Value> = BTreeMap::new();
        table.insert("epsilon_ev".into(), Value::Float(EPSILON_EV));
        table.insert("sigma".into(), Value::Float(SIGMA));
        table.insert("cutoff_radius".into(), Value::Float(cutoff_sigmas * SIGMA));
        table.insert("max_steps".into(), Value::Integer(max_steps));
        table.insert("step_size".into(), Value::Float(0.1));

        Ok(SubmissionSpec {
            engine: self.engine_name().to_string(),
            code: inputs.engines.code.clone(),
            structure: inputs.structure.clone(),
            protocol: resolved.protocol_name.clone(),
            relax_type: inputs.relax_type,
            spin_type: inputs.spin_type,
            electronic_type: inputs.electronic_type,
            settings: NumericalSettings::default(),
            threshold_forces: resolved.parameters.threshold_forces,
            threshold_stress: resolved.parameters.threshold_stress,
            magnetization_per_site: inputs.magnetization_per_site.clone(),
            resources: inputs.engines.resources.clone(),
            parameters: table,
        })
    }
}

/// Executes Lennard-Jones submissions in-process.
#[derive(Debug, Default)]
pub struct LennardJonesDriver;

impl RelaxDriver for LennardJonesDriver {
    fn engine_name(&self) -> &'static str {
        "lennard_jones"
    }

    fn generator(&self) -> Box<dyn InputGenerator> {
        Box::new(LennardJonesGenerator)
    }

    fn run(&self, spec: &SubmissionSpec) -> Result<RelaxNode, EngineError> {
        if spec.engine != self.engine_name() {
            return Err(EngineError::Execution(format!(
                "submission spec was generated for engine `{}`",
                spec.engine
            )));
        }
        let cutoff = require_float(spec, "cutoff_radius")?;
        let step_size = require_float(spec, "step_size")?;
        let max_steps = require_integer(spec, "max_steps")? as usize;

        let lattice = spec.structure.lattice().cloned();
        let mut positions: Vec<Vector3<f64>> = spec
            .structure
            .sites()
            .iter()
            .map(|site| site.position.coords)
            .collect();

        let (total_energy, forces, converged) = match spec.relax_type {
            RelaxType::Positions => {
                let mut converged = false;
                let mut state = energy_and_forces(&positions, lattice.as_ref(), cutoff);
                for _ in 0..max_steps {
                    let max_force = state.1.iter().map(|f| f.norm()).fold(0.0, f64::max);
                    if max_force < spec.threshold_forces {
                        converged = true;
                        break;
                    }
                    for (position, force) in positions.iter_mut().zip(&state.1) {
                        *position += force * step_size;
                    }
                    state = energy_and_forces(&positions, lattice.as_ref(), cutoff);
                }
                (state.0, state.1, Some(converged))
            }
            // Generators reject everything beyond `none` and `positions`.
            _ => {
                let (energy, forces) = energy_and_forces(&positions, lattice.as_ref(), cutoff);
                (energy, forces, None)
            }
        };

        let relaxed_structure = match spec.relax_type {
            RelaxType::None => None,
            _ => {
                let sites = spec
                    .structure
                    .sites()
                    .iter()
                    .zip(&positions)
                    .map(|(site, position)| {
                        Site::new(site.symbol.clone(), [position.x, position.y, position.z])
                    })
                    .collect();
                Some(match &lattice {
                    Some(lattice) => Structure::crystal(lattice.clone(), sites)?,
                    None => Structure::molecule(sites)?,
                })
            }
        };

        Ok(RelaxNode {
            engine: self.engine_name().to_string(),
            settings: spec.settings.clone(),
            outputs: RelaxOutputs {
                relaxed_structure,
                total_energy,
                forces: Some(forces),
                stress: None,
                total_magnetization: None,
                converged,
            },
        })
    }
}

fn require_float(spec: &SubmissionSpec, key: &str) -> Result<f64, EngineError> {
    spec.parameters
        .get(key)
        .and_then(Value::as_float)
        .ok_or_else(|| EngineError::Execution(format!("submission spec is missing `{key}`")))
}

fn require_integer(spec: &SubmissionSpec, key: &str) -> Result<i64, EngineError> {
    spec.parameters
        .get(key)
        .and_then(Value::as_integer)
        .ok_or_else(|| EngineError::Execution(format!("submission spec is missing `{key}`")))
}

/// Lattice translations whose images can lie within `cutoff` of the home cell,
/// bounded per axis by the perpendicular cell widths.
fn image_translations(lattice: &Lattice, cutoff: f64) -> Vec<Vector3<f64>> {
    let volume = lattice.volume();
    let repeats: Vec<i64> = (0..3)
        .map(|i| {
            let cross = lattice.vector((i + 1) % 3).cross(&lattice.vector((i + 2) % 3));
            let width = volume / cross.norm();
            (cutoff / width).ceil() as i64
        })
        .collect();

    let mut translations = Vec::new();
    for na in -repeats[0]..=repeats[0] {
        for nb in -repeats[1]..=repeats[1] {
            for nc in -repeats[2]..=repeats[2] {
                translations.push(
                    lattice.vector(0) * na as f64
                        + lattice.vector(1) * nb as f64
                        + lattice.vector(2) * nc as f64,
                );
            }
        }
    }
    translations
}

/// Total 12-6 Lennard-Jones energy (eV) and per-site forces (eV/Å), truncated at
/// `cutoff`. Periodic sums run over every ordered pair and image translation, with
/// the double-counted energy halved.
fn energy_and_forces(
    positions: &[Vector3<f64>],
    lattice: Option<&Lattice>,
    cutoff: f64,
) -> (f64, Vec<Vector3<f64>>) {
    let translations = match lattice {
        Some(lattice) => image_translations(lattice, cutoff),
        None => vec![Vector3::zeros()],
    };
    let cutoff_squared = cutoff * cutoff;

    let mut energy = 0.0;
    let mut forces = vec![Vector3::zeros(); positions.len()];
    for (i, ri) in positions.iter().enumerate() {
        for (j, rj) in positions.iter().enumerate() {
            for translation in &translations {
                if i == j && translation.norm_squared() == 0.0 {
                    continue;
                }
                let separation = ri - rj + translation;
                let r2 = separation.norm_squared();
                if r2 > cutoff_squared {
                    continue;
                }
                let sr2 = (SIGMA * SIGMA) / r2;
                let sr6 = sr2 * sr2 * sr2;
                let sr12 = sr6 * sr6;
                energy += 0.5 * 4.0 * EPSILON_EV * (sr12 - sr6);
                let force_scalar = 24.0 * EPSILON_EV * (2.0 * sr12 - sr6) / r2;
                forces[i] += separation * force_scalar;
            }
        }
    }
    (energy, forces)
}
