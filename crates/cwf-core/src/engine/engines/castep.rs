//! Input generator for CASTEP geometry optimizations.

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

static PROTOCOLS: LazyLock<ProtocolRegistry> = LazyLock::new(|| {
    ProtocolRegistry::from_toml(include_str!("protocols/castep.toml"))
        .expect("built-in castep protocol table is valid")
});

const SPIN_TYPES: &[SpinType] = &[SpinType::None, SpinType::Collinear, SpinType::NonCollinear];
const ELECTRONIC_TYPES: &[ElectronicType] = &[ElectronicType::Metal, ElectronicType::Insulator];

/// CASTEP expresses every combination of frozen cell degrees of freedom through its
/// `fix_*` keywords, so the full relax type enumeration is supported.
#[derive(Debug, Default)]
pub struct CastepGenerator;

impl InputGenerator for CastepGenerator {
    fn engine_name(&self) -> &'static str {
        "castep"
    }

    fn protocols(&self) -> &ProtocolRegistry {
        &PROTOCOLS
    }

    fn relax_types(&self) -> &[RelaxType] {
        RelaxType::ALL
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

        let task = match inputs.relax_type {
            RelaxType::None => "singlepoint",
            _ => "geometryoptimisation",
        };
        table.insert("task".into(), Value::String(task.into()));

        match inputs.relax_type {
            RelaxType::None => {}
            RelaxType::Positions => {
                table.insert("fix_all_cell".into(), Value::Boolean(true));
            }
            RelaxType::PositionsCell => {}
            RelaxType::PositionsVolume => {
                table.insert("fix_cell_angles".into(), Value::Boolean(true));
            }
            RelaxType::PositionsShape => {
                table.insert("fix_vol".into(), Value::Boolean(true));
            }
            RelaxType::Cell => {
                table.insert("fix_all_ions".into(), Value::Boolean(true));
            }
            RelaxType::Shape => {
                table.insert("fix_all_ions".into(), Value::Boolean(true));
                table.insert("fix_vol".into(), Value::Boolean(true));
            }
            RelaxType::Volume => {
                table.insert("fix_all_ions".into(), Value::Boolean(true));
                table.insert("fix_cell_angles".into(), Value::Boolean(true));
            }
        }

        table.insert("cut_off_energy".into(), Value::Float(params.cutoff_ev));
        table.insert("smearing_width".into(), Value::Float(params.smearing_ev));
        table.insert(
            "geom_force_tol".into(),
            Value::Float(params.threshold_forces),
        );
        table.insert(
            "geom_stress_tol".into(),
            Value::Float(params.threshold_stress),
        );
        if inputs.electronic_type == ElectronicType::Insulator {
            table.insert("fix_occupancy".into(), Value::Boolean(true));
        }

        match inputs.spin_type {
            SpinType::None => {}
            SpinType::NonCollinear => {
                table.insert("spin_treatment".into(), Value::String("noncollinear".into()));
            }
            _ => {
                table.insert("spin_polarized".into(), Value::Boolean(true));
            }
        }
        if let Some(magnetization) = &inputs.magnetization_per_site {
            table.insert(
                "initial_spins".into(),
                Value::Array(magnetization.iter().map(|m| Value::Float(*m)).collect()),
            );
        }

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
