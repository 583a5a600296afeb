//! Input generator for Quantum ESPRESSO's `pw.x` relaxations.

use crate::core::models::results::NumericalSettings;
use crate::core::models::types::{ElectronicType, RelaxType, SpinType};
use crate::engine::error::EngineError;
use crate::engine::generator::{
    InputGenerator, RelaxInputs, ResolvedInputs, SubmissionSpec, mesh_from_spacing,
};
use crate::engine::protocol::ProtocolRegistry;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use toml::Value;

const RYDBERG_EV: f64 = 13.605693;
// 1 Ry/bohr in eV/Å.
const RYDBERG_PER_BOHR_EV_PER_ANGSTROM: f64 = 25.710265;

static PROTOCOLS: LazyLock<ProtocolRegistry> = LazyLock::new(|| {
    ProtocolRegistry::from_toml(include_str!("protocols/quantum_espresso.toml"))
        .expect("built-in quantum_espresso protocol table is valid")
});

// Volume-only relaxations are not expressible with pw.x cell dynamics.
const RELAX_TYPES: &[RelaxType] = &[
    RelaxType::None,
    RelaxType::Positions,
    RelaxType::Shape,
    RelaxType::Cell,
    RelaxType::PositionsCell,
    RelaxType::PositionsShape,
];
const SPIN_TYPES: &[SpinType] = &[SpinType::None, SpinType::Collinear];
const ELECTRONIC_TYPES: &[ElectronicType] = &[ElectronicType::Metal, ElectronicType::Insulator];

#[derive(Debug, Default)]
pub struct QuantumEspressoGenerator;

impl InputGenerator for QuantumEspressoGenerator {
    fn engine_name(&self) -> &'static str {
        "quantum_espresso"
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
        let params = &resolved.parameters;
        let mut table: BTreeMap<String, Value> = BTreeMap::new();

        let calculation = match inputs.relax_type {
            RelaxType::None => "scf",
            RelaxType::Positions => "relax",
            _ => "vc-relax",
        };
        table.insert("calculation".into(), Value::String(calculation.into()));

        match inputs.relax_type {
            RelaxType::Shape | RelaxType::PositionsShape => {
                table.insert("cell_dofree".into(), Value::String("shape".into()));
            }
            RelaxType::Cell | RelaxType::PositionsCell => {
                table.insert("cell_dofree".into(), Value::String("all".into()));
            }
            _ => {}
        }
        if matches!(inputs.relax_type, RelaxType::Shape | RelaxType::Cell) {
            table.insert("fixed_ions".into(), Value::Boolean(true));
        }

        table.insert(
            "ecutwfc".into(),
            Value::Float(params.cutoff_ev / RYDBERG_EV),
        );
        table.insert(
            "forc_conv_thr".into(),
            Value::Float(params.threshold_forces / RYDBERG_PER_BOHR_EV_PER_ANGSTROM),
        );

        match inputs.electronic_type {
            ElectronicType::Metal => {
                table.insert("occupations".into(), Value::String("smearing".into()));
                table.insert("smearing".into(), Value::String("cold".into()));
                table.insert("degauss".into(), Value::Float(params.smearing_ev / RYDBERG_EV));
            }
            _ => {
                table.insert("occupations".into(), Value::String("fixed".into()));
            }
        }

        if inputs.spin_type == SpinType::Collinear {
            table.insert("nspin".into(), Value::Integer(2));
            if let Some(magnetization) = &inputs.magnetization_per_site {
                table.insert(
                    "starting_magnetization".into(),
                    Value::Array(magnetization.iter().map(|m| Value::Float(*m)).collect()),
                );
            }
        }

        // A reference run fixes the mesh; otherwise derive it from the protocol's
        // spacing on this structure's cell. Molecules run Γ-only.
        let kpoint_mesh = match resolved.reference_mesh {
            Some(mesh) => Some(mesh),
            None => inputs
                .structure
                .lattice()
                .map(|lattice| mesh_from_spacing(lattice, params.kpoint_spacing)),
        };

        Ok(SubmissionSpec {
            engine: self.engine_name().to_string(),
            code: inputs.engines.code.clone(),
            structure: inputs.structure.clone(),
            protocol: resolved.protocol_name.clone(),
            relax_type: inputs.relax_type,
            spin_type: inputs.spin_type,
            electronic_type: inputs.electronic_type,
            settings: NumericalSettings {
                kpoint_mesh,
                cutoff_ev: Some(params.cutoff_ev),
                smearing_ev: Some(params.smearing_ev),
            },
            threshold_forces: params.threshold_forces,
            threshold_stress: params.threshold_stress,
            magnetization_per_site: inputs.magnetization_per_site.clone(),
            resources: inputs.engines.resources.clone(),
            parameters: table,
        })
    }
}
