use super::error::EngineError;
use super::protocol::{ProtocolParameters, ProtocolRegistry};
use crate::core::models::results::{NumericalSettings, RelaxNode};
use crate::core::models::structure::{Lattice, Structure};
use crate::core::models::types::{ElectronicType, RelaxType, SpinType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Scheduler resources requested for a relaxation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceOptions {
    pub num_machines: u32,
    pub procs_per_machine: u32,
    pub walltime_seconds: u64,
    pub queue: Option<String>,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            num_machines: 1,
            procs_per_machine: 1,
            walltime_seconds: 3600,
            queue: None,
        }
    }
}

/// The engine entry of the common inputs: which code executable to run and with
/// which resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Label of the code executable, e.g. `pw-7.2@cluster`.
    pub code: String,
    pub resources: ResourceOptions,
}

impl EngineOptions {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            resources: ResourceOptions::default(),
        }
    }
}

/// The validated common inputs accepted by every input generator.
///
/// Constructed through [`RelaxInputsBuilder`]; immutable afterwards.
#[derive(Debug, Clone)]
pub struct RelaxInputs {
    pub structure: Structure,
    pub engines: EngineOptions,
    /// `None` selects the generator's default protocol.
    pub protocol: Option<String>,
    pub relax_type: RelaxType,
    pub spin_type: SpinType,
    pub electronic_type: ElectronicType,
    pub magnetization_per_site: Option<Vec<f64>>,
    pub threshold_forces: Option<f64>,
    pub threshold_stress: Option<f64>,
    /// A previously completed relaxation whose numerical settings should be
    /// reproduced so that total energies become subtractable.
    pub reference: Option<Arc<RelaxNode>>,
}

impl RelaxInputs {
    pub fn builder() -> RelaxInputsBuilder {
        RelaxInputsBuilder::default()
    }

    /// A copy with a different structure and reference, everything else unchanged.
    /// This is how the equation-of-state workflow derives its per-volume inputs.
    pub(crate) fn for_structure(
        &self,
        structure: Structure,
        reference: Option<Arc<RelaxNode>>,
    ) -> Self {
        Self {
            structure,
            reference,
            ..self.clone()
        }
    }
}

#[derive(Default)]
pub struct RelaxInputsBuilder {
    structure: Option<Structure>,
    engines: Option<EngineOptions>,
    protocol: Option<String>,
    relax_type: Option<RelaxType>,
    spin_type: Option<SpinType>,
    electronic_type: Option<ElectronicType>,
    magnetization_per_site: Option<Vec<f64>>,
    threshold_forces: Option<f64>,
    threshold_stress: Option<f64>,
    reference: Option<Arc<RelaxNode>>,
}

impl RelaxInputsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structure(mut self, structure: Structure) -> Self {
        self.structure = Some(structure);
        self
    }
    pub fn engines(mut self, engines: EngineOptions) -> Self {
        self.engines = Some(engines);
        self
    }
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }
    pub fn relax_type(mut self, relax_type: RelaxType) -> Self {
        self.relax_type = Some(relax_type);
        self
    }
    pub fn spin_type(mut self, spin_type: SpinType) -> Self {
        self.spin_type = Some(spin_type);
        self
    }
    pub fn electronic_type(mut self, electronic_type: ElectronicType) -> Self {
        self.electronic_type = Some(electronic_type);
        self
    }
    pub fn magnetization_per_site(mut self, magnetization: Vec<f64>) -> Self {
        self.magnetization_per_site = Some(magnetization);
        self
    }
    pub fn threshold_forces(mut self, threshold: f64) -> Self {
        self.threshold_forces = Some(threshold);
        self
    }
    pub fn threshold_stress(mut self, threshold: f64) -> Self {
        self.threshold_stress = Some(threshold);
        self
    }
    pub fn reference(mut self, reference: Arc<RelaxNode>) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn build(self) -> Result<RelaxInputs, EngineError> {
        Ok(RelaxInputs {
            structure: self
                .structure
                .ok_or_else(|| EngineError::Configuration("missing required input `structure`".into()))?,
            engines: self
                .engines
                .ok_or_else(|| EngineError::Configuration("missing required input `engines`".into()))?,
            protocol: self.protocol,
            relax_type: self.relax_type.unwrap_or(RelaxType::Positions),
            spin_type: self.spin_type.unwrap_or(SpinType::None),
            electronic_type: self.electronic_type.unwrap_or(ElectronicType::Metal),
            magnetization_per_site: self.magnetization_per_site,
            threshold_forces: self.threshold_forces,
            threshold_stress: self.threshold_stress,
            reference: self.reference,
        })
    }
}

/// The inputs after validation against a generator's protocol table and
/// capability sets, ready for engine-specific assembly.
#[derive(Debug, Clone)]
pub struct ResolvedInputs {
    pub protocol_name: String,
    /// Protocol parameters with any caller-supplied threshold overrides applied.
    pub parameters: ProtocolParameters,
    /// The k-point mesh inherited from the reference run, if one was supplied.
    pub reference_mesh: Option<[u32; 3]>,
}

/// An engine-neutral description of one relaxation job, ready for submission.
///
/// Producing a spec has no side effects; nothing is executed until a
/// [`super::driver::RelaxDriver`] consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionSpec {
    pub engine: String,
    pub code: String,
    pub structure: Structure,
    pub protocol: String,
    pub relax_type: RelaxType,
    pub spin_type: SpinType,
    pub electronic_type: ElectronicType,
    pub settings: NumericalSettings,
    pub threshold_forces: f64,
    pub threshold_stress: f64,
    pub magnetization_per_site: Option<Vec<f64>>,
    pub resources: ResourceOptions,
    /// Engine-specific keyword table, in the engine's own vocabulary.
    pub parameters: BTreeMap<String, toml::Value>,
}

/// Per-engine translation of common inputs into a [`SubmissionSpec`].
///
/// `get_builder` performs the shared validation (protocol membership, capability
/// sets, numeric sanity, reference compatibility) and then delegates the
/// engine-specific assembly to `construct`. The call is a pure translation: no
/// execution is triggered.
pub trait InputGenerator: Send + Sync {
    fn engine_name(&self) -> &'static str;

    fn protocols(&self) -> &ProtocolRegistry;

    /// The relaxation types this engine supports. Every engine supports at least
    /// `none` and `positions`.
    fn relax_types(&self) -> &[RelaxType];

    fn spin_types(&self) -> &[SpinType];

    fn electronic_types(&self) -> &[ElectronicType];

    /// Engine-specific assembly, called with validated and resolved inputs.
    fn construct(
        &self,
        inputs: &RelaxInputs,
        resolved: &ResolvedInputs,
    ) -> Result<SubmissionSpec, EngineError>;

    fn get_builder(&self, inputs: &RelaxInputs) -> Result<SubmissionSpec, EngineError> {
        let resolved = self.validate(inputs)?;
        self.construct(inputs, &resolved)
    }

    fn validate(&self, inputs: &RelaxInputs) -> Result<ResolvedInputs, EngineError> {
        let registry = self.protocols();
        let protocol_name = inputs
            .protocol
            .clone()
            .unwrap_or_else(|| registry.get_default_protocol_name().to_string());
        if !registry.is_valid_protocol(&protocol_name) {
            return Err(EngineError::Configuration(format!(
                "unknown protocol `{protocol_name}`; choose one of {:?}",
                registry.get_protocol_names()
            )));
        }

        if !self.relax_types().contains(&inputs.relax_type) {
            return Err(self.unsupported(format!("relax type `{}`", inputs.relax_type)));
        }
        if !self.spin_types().contains(&inputs.spin_type) {
            return Err(self.unsupported(format!("spin type `{}`", inputs.spin_type)));
        }
        if !self.electronic_types().contains(&inputs.electronic_type) {
            return Err(self.unsupported(format!("electronic type `{}`", inputs.electronic_type)));
        }

        for (name, value) in [
            ("threshold_forces", inputs.threshold_forces),
            ("threshold_stress", inputs.threshold_stress),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value <= 0.0 {
                    return Err(EngineError::Validation(format!(
                        "`{name}` must be a positive real, got {value}"
                    )));
                }
            }
        }

        if let Some(magnetization) = &inputs.magnetization_per_site {
            if inputs.spin_type == SpinType::None {
                return Err(EngineError::Validation(
                    "`magnetization_per_site` requires a spin-polarized `spin_type`".into(),
                ));
            }
            if magnetization.len() != inputs.structure.num_sites() {
                return Err(EngineError::Validation(format!(
                    "`magnetization_per_site` has {} entries for {} sites",
                    magnetization.len(),
                    inputs.structure.num_sites()
                )));
            }
            if magnetization.iter().any(|m| !m.is_finite()) {
                return Err(EngineError::Validation(
                    "`magnetization_per_site` contains a non-finite entry".into(),
                ));
            }
        }

        let reference_mesh = match &inputs.reference {
            Some(reference) => {
                if reference.engine != self.engine_name() {
                    return Err(EngineError::Incompatibility(format!(
                        "reference was produced by engine `{}`, not `{}`",
                        reference.engine,
                        self.engine_name()
                    )));
                }
                reference.settings.kpoint_mesh
            }
            None => None,
        };

        let mut parameters = registry.get_protocol(&protocol_name)?.parameters.clone();
        if let Some(threshold) = inputs.threshold_forces {
            parameters.threshold_forces = threshold;
        }
        if let Some(threshold) = inputs.threshold_stress {
            parameters.threshold_stress = threshold;
        }

        Ok(ResolvedInputs {
            protocol_name,
            parameters,
            reference_mesh,
        })
    }

    #[doc(hidden)]
    fn unsupported(&self, option: String) -> EngineError {
        EngineError::UnsupportedOption {
            engine: self.engine_name().to_string(),
            option,
        }
    }
}

/// Derives a Monkhorst-Pack mesh from a target k-point spacing, one subdivision per
/// reciprocal vector, never below Γ-only.
pub fn mesh_from_spacing(lattice: &Lattice, spacing: f64) -> [u32; 3] {
    match lattice.reciprocal_norms() {
        Some(norms) => norms.map(|norm| ((norm / spacing).ceil() as u32).max(1)),
        None => [1, 1, 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::Site;

    fn cubic_structure() -> Structure {
        Structure::crystal(Lattice::cubic(4.0), vec![Site::new("Fe", [0.0, 0.0, 0.0])]).unwrap()
    }

    #[test]
    fn builder_requires_structure_and_engines() {
        let err = RelaxInputs::builder().build().unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));

        let err = RelaxInputs::builder()
            .structure(cubic_structure())
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn builder_defaults() {
        let inputs = RelaxInputs::builder()
            .structure(cubic_structure())
            .engines(EngineOptions::new("pw@localhost"))
            .build()
            .unwrap();
        assert_eq!(inputs.relax_type, RelaxType::Positions);
        assert_eq!(inputs.spin_type, SpinType::None);
        assert_eq!(inputs.electronic_type, ElectronicType::Metal);
        assert!(inputs.protocol.is_none());
        assert!(inputs.reference.is_none());
    }

    #[test]
    fn mesh_from_spacing_on_a_cubic_cell() {
        let lattice = Lattice::cubic(4.0);
        // |b| = 2π/4 ≈ 1.5708; spacing 0.2 → ceil(7.85) = 8 subdivisions.
        assert_eq!(mesh_from_spacing(&lattice, 0.2), [8, 8, 8]);
        // A very coarse spacing still yields at least a Γ-only mesh.
        assert_eq!(mesh_from_spacing(&lattice, 100.0), [1, 1, 1]);
    }
}
