//! Equation-of-state workflow: relaxes scaled copies of a structure at a series
//! of fixed volumes and collects the resulting energies into one comparable set.
//!
//! The run at the volume factor closest to 1.0 is the anchor. It runs first and
//! alone; every other run receives it as reference so the numerical settings
//! (most importantly the k-point mesh) are shared across the whole series. The
//! remaining runs are independent of each other and fan out over the rayon pool.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::core::models::results::RelaxNode;
use crate::core::models::structure::Structure;
use crate::core::models::types::RelaxType;
use crate::engine::cancel::CancelToken;
use crate::engine::driver::{ConvergencePolicy, RelaxDriver};
use crate::engine::error::EngineError;
use crate::engine::generator::{RelaxInputs, RelaxInputsBuilder};
use crate::engine::progress::{Progress, ProgressReporter};

/// Default number of volumes in a generated series.
pub const DEFAULT_SCALE_COUNT: u32 = 7;
/// Default spacing between consecutive volume factors.
pub const DEFAULT_SCALE_INCREMENT: f64 = 0.02;

/// The volume factors for a generated series: `count` values spaced by
/// `increment` and centered on 1.0.
pub fn scale_factors(count: u32, increment: f64) -> Vec<f64> {
    let half_span = f64::from(count - 1) * increment / 2.0;
    (0..count)
        .map(|i| 1.0 + f64::from(i) * increment - half_span)
        .collect()
}

/// The validated configuration of one equation-of-state series.
///
/// Constructed through [`EosConfigBuilder`]; immutable afterwards.
#[derive(Debug, Clone)]
pub struct EosConfig {
    base_inputs: RelaxInputs,
    scale_factors: Vec<f64>,
    anchor_index: usize,
    policy: ConvergencePolicy,
}

impl EosConfig {
    pub fn builder() -> EosConfigBuilder {
        EosConfigBuilder::default()
    }

    pub fn scale_factors(&self) -> &[f64] {
        &self.scale_factors
    }

    /// Index of the volume factor closest to 1.0.
    pub fn anchor_index(&self) -> usize {
        self.anchor_index
    }

    pub fn base_inputs(&self) -> &RelaxInputs {
        &self.base_inputs
    }
}

/// Builder for [`EosConfig`].
///
/// Either an explicit factor list or a (count, increment) pair may be given; the
/// default is a generated series of [`DEFAULT_SCALE_COUNT`] factors spaced by
/// [`DEFAULT_SCALE_INCREMENT`]. The relaxation inputs are forwarded to
/// [`RelaxInputsBuilder`] unchanged, except that the relax type defaults to
/// [`RelaxType::Positions`] and must preserve the cell volume.
#[derive(Default)]
pub struct EosConfigBuilder {
    inputs: RelaxInputsBuilder,
    relax_type: Option<RelaxType>,
    scale_factors: Option<Vec<f64>>,
    scale_count: Option<u32>,
    scale_increment: Option<f64>,
    policy: Option<ConvergencePolicy>,
}

impl EosConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structure(mut self, structure: Structure) -> Self {
        self.inputs = self.inputs.structure(structure);
        self
    }
    pub fn engines(mut self, engines: crate::engine::generator::EngineOptions) -> Self {
        self.inputs = self.inputs.engines(engines);
        self
    }
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.inputs = self.inputs.protocol(protocol);
        self
    }
    pub fn relax_type(mut self, relax_type: RelaxType) -> Self {
        self.relax_type = Some(relax_type);
        self
    }
    pub fn spin_type(mut self, spin_type: crate::core::models::types::SpinType) -> Self {
        self.inputs = self.inputs.spin_type(spin_type);
        self
    }
    pub fn electronic_type(
        mut self,
        electronic_type: crate::core::models::types::ElectronicType,
    ) -> Self {
        self.inputs = self.inputs.electronic_type(electronic_type);
        self
    }
    pub fn magnetization_per_site(mut self, magnetization: Vec<f64>) -> Self {
        self.inputs = self.inputs.magnetization_per_site(magnetization);
        self
    }
    pub fn threshold_forces(mut self, threshold: f64) -> Self {
        self.inputs = self.inputs.threshold_forces(threshold);
        self
    }
    pub fn threshold_stress(mut self, threshold: f64) -> Self {
        self.inputs = self.inputs.threshold_stress(threshold);
        self
    }
    pub fn scale_factors(mut self, factors: Vec<f64>) -> Self {
        self.scale_factors = Some(factors);
        self
    }
    pub fn scale_count(mut self, count: u32) -> Self {
        self.scale_count = Some(count);
        self
    }
    pub fn scale_increment(mut self, increment: f64) -> Self {
        self.scale_increment = Some(increment);
        self
    }
    pub fn convergence_policy(mut self, policy: ConvergencePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn build(self) -> Result<EosConfig, EngineError> {
        let relax_type = self.relax_type.unwrap_or(RelaxType::Positions);
        if !relax_type.is_fixed_volume() {
            return Err(EngineError::Configuration(format!(
                "relax type `{relax_type}` would change the cell volume; an \
                 equation of state needs each run pinned to its scaled volume"
            )));
        }

        let factors = match self.scale_factors {
            Some(factors) => {
                if self.scale_count.is_some() || self.scale_increment.is_some() {
                    return Err(EngineError::Configuration(
                        "give either an explicit factor list or a (count, increment) pair, not both"
                            .into(),
                    ));
                }
                if factors.len() < 3 {
                    return Err(EngineError::Validation(format!(
                        "an equation of state needs at least 3 volume factors, got {}",
                        factors.len()
                    )));
                }
                if let Some(bad) = factors.iter().find(|f| !f.is_finite() || **f <= 0.0) {
                    return Err(EngineError::Validation(format!(
                        "volume factors must be positive and finite, got {bad}"
                    )));
                }
                factors
            }
            None => {
                let count = self.scale_count.unwrap_or(DEFAULT_SCALE_COUNT);
                let increment = self.scale_increment.unwrap_or(DEFAULT_SCALE_INCREMENT);
                if count < 3 {
                    return Err(EngineError::Validation(format!(
                        "an equation of state needs at least 3 volumes, got scale_count = {count}"
                    )));
                }
                if !increment.is_finite() || increment <= 0.0 || increment >= 1.0 {
                    return Err(EngineError::Validation(format!(
                        "scale_increment must lie strictly between 0 and 1, got {increment}"
                    )));
                }
                scale_factors(count, increment)
            }
        };

        // Lowest index wins ties.
        let anchor_index = factors
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (*a - 1.0)
                    .abs()
                    .partial_cmp(&(*b - 1.0).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);

        let base_inputs = self.inputs.relax_type(relax_type).build()?;
        Ok(EosConfig {
            base_inputs,
            scale_factors: factors,
            anchor_index,
            policy: self.policy.unwrap_or_default(),
        })
    }
}

/// One completed member of the series.
#[derive(Debug, Clone)]
pub struct EosPoint {
    pub scale_factor: f64,
    /// The relaxed structure, or the scaled input when the run produced none.
    pub structure: Structure,
    /// Total energy in eV.
    pub total_energy: f64,
    pub total_magnetization: Option<f64>,
    pub node: Arc<RelaxNode>,
}

/// The outcome slot for one volume factor.
#[derive(Debug, Clone)]
pub enum EosSlot {
    /// Never submitted: the anchor failed first, or the run was cancelled.
    Unset,
    Completed(EosPoint),
    Failed(String),
}

impl EosSlot {
    pub fn completed(&self) -> Option<&EosPoint> {
        match self {
            Self::Completed(point) => Some(point),
            _ => None,
        }
    }
}

/// The collected results of an equation-of-state run, indexed by factor order.
///
/// A series is returned even when members failed; the accessors expose the
/// completed subset keyed by each member's index in [`EosSeries::scale_factors`],
/// so surviving points line up across the energy, volume and structure maps.
#[derive(Debug, Clone)]
pub struct EosSeries {
    scale_factors: Vec<f64>,
    anchor_index: usize,
    slots: Vec<EosSlot>,
}

impl EosSeries {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn scale_factors(&self) -> &[f64] {
        &self.scale_factors
    }

    pub fn anchor_index(&self) -> usize {
        self.anchor_index
    }

    pub fn slot(&self, index: usize) -> &EosSlot {
        &self.slots[index]
    }

    pub fn slots(&self) -> &[EosSlot] {
        &self.slots
    }

    /// Whether every member completed.
    pub fn is_complete(&self) -> bool {
        self.slots
            .iter()
            .all(|slot| matches!(slot, EosSlot::Completed(_)))
    }

    fn completed(&self) -> impl Iterator<Item = (usize, &EosPoint)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.completed().map(|point| (i, point)))
    }

    /// Structures of the completed members, keyed by series index.
    pub fn structures(&self) -> std::collections::BTreeMap<usize, &Structure> {
        self.completed().map(|(i, p)| (i, &p.structure)).collect()
    }

    /// Total energies in eV of the completed members, keyed by series index.
    pub fn total_energies(&self) -> std::collections::BTreeMap<usize, f64> {
        self.completed().map(|(i, p)| (i, p.total_energy)).collect()
    }

    /// Cell volumes in Å³ of the completed members, keyed by series index.
    /// Molecular series have no volumes and yield an empty map.
    pub fn volumes(&self) -> std::collections::BTreeMap<usize, f64> {
        self.completed()
            .filter_map(|(i, p)| p.structure.volume().map(|v| (i, v)))
            .collect()
    }

    /// Total magnetizations of the completed members, keyed by series index.
    ///
    /// `Some` only when at least one member completed and every completed member
    /// reported a magnetization; a partially magnetized series would not be
    /// meaningfully comparable, so it is withheld entirely.
    pub fn total_magnetizations(&self) -> Option<std::collections::BTreeMap<usize, f64>> {
        let mut map = std::collections::BTreeMap::new();
        for (i, point) in self.completed() {
            map.insert(i, point.total_magnetization?);
        }
        if map.is_empty() { None } else { Some(map) }
    }
}

/// Runs the equation-of-state series through the given driver.
///
/// All structures are scaled up front, so a bad factor fails the run before
/// anything is submitted, as do invalid relaxation inputs. After that point
/// per-member failures are recorded in the returned series instead of aborting
/// it, with one exception: when the anchor itself fails there is no reference
/// for the others to share, so they are left [`EosSlot::Unset`] and never
/// submitted.
#[instrument(skip_all, name = "eos_workflow")]
pub fn run(
    config: &EosConfig,
    driver: &dyn RelaxDriver,
    reporter: &ProgressReporter,
    cancel: &CancelToken,
) -> Result<EosSeries, EngineError> {
    let count = config.scale_factors.len();
    let anchor_index = config.anchor_index;
    let generator = driver.generator();

    reporter.report(Progress::PhaseStart {
        name: "Scaling structures",
    });
    let scaled: Vec<Structure> = config
        .scale_factors
        .iter()
        .map(|factor| config.base_inputs.structure.scaled(*factor))
        .collect::<Result<_, _>>()?;
    reporter.report(Progress::PhaseFinish);

    let mut slots = vec![EosSlot::Unset; count];
    let series = |slots| EosSeries {
        scale_factors: config.scale_factors.clone(),
        anchor_index,
        slots,
    };

    if cancel.is_cancelled() {
        warn!("cancelled before the anchor submission");
        return Ok(series(slots));
    }

    reporter.report(Progress::PhaseStart { name: "Relaxing" });
    reporter.report(Progress::TaskStart {
        total_steps: count as u64,
    });

    // The anchor carries no reference; its validated spec also vets the shared
    // inputs, so a configuration mistake surfaces before anything runs.
    let anchor_factor = config.scale_factors[anchor_index];
    let anchor_inputs = config
        .base_inputs
        .for_structure(scaled[anchor_index].clone(), None);
    let anchor_spec = generator.get_builder(&anchor_inputs)?;

    info!(
        engine = %anchor_spec.engine,
        factor = anchor_factor,
        "submitting anchor relaxation"
    );
    reporter.report(Progress::RelaxSubmitted {
        index: anchor_index,
        scale_factor: anchor_factor,
    });
    let anchor = match driver
        .run(&anchor_spec)
        .and_then(|node| settle(node, config.policy))
    {
        Ok(node) => Arc::new(node),
        Err(err) => {
            warn!(error = %err, "anchor relaxation failed; skipping the rest of the series");
            slots[anchor_index] = EosSlot::Failed(err.to_string());
            reporter.report(Progress::TaskFinish);
            reporter.report(Progress::PhaseFinish);
            return Ok(series(slots));
        }
    };
    reporter.report(Progress::RelaxCompleted {
        index: anchor_index,
        total_energy: anchor.outputs.total_energy,
    });
    reporter.report(Progress::TaskIncrement);
    slots[anchor_index] = EosSlot::Completed(point(
        anchor_factor,
        &scaled[anchor_index],
        Arc::clone(&anchor),
    ));

    let remaining: Vec<usize> = (0..count).filter(|i| *i != anchor_index).collect();
    let outcomes: Vec<(usize, EosSlot)> = remaining
        .par_iter()
        .map(|&index| {
            if cancel.is_cancelled() {
                return (index, EosSlot::Unset);
            }
            let factor = config.scale_factors[index];
            let inputs = config
                .base_inputs
                .for_structure(scaled[index].clone(), Some(Arc::clone(&anchor)));
            reporter.report(Progress::RelaxSubmitted {
                index,
                scale_factor: factor,
            });
            let slot = match generator
                .get_builder(&inputs)
                .and_then(|spec| driver.run(&spec))
                .and_then(|node| settle(node, config.policy))
            {
                Ok(node) => {
                    reporter.report(Progress::RelaxCompleted {
                        index,
                        total_energy: node.outputs.total_energy,
                    });
                    EosSlot::Completed(point(factor, &scaled[index], Arc::new(node)))
                }
                Err(err) => {
                    warn!(index, factor, error = %err, "series member failed");
                    EosSlot::Failed(err.to_string())
                }
            };
            reporter.report(Progress::TaskIncrement);
            (index, slot)
        })
        .collect();
    for (index, slot) in outcomes {
        slots[index] = slot;
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let completed = slots
        .iter()
        .filter(|slot| matches!(slot, EosSlot::Completed(_)))
        .count();
    info!(completed, total = count, "equation-of-state series finished");
    Ok(series(slots))
}

fn settle(node: RelaxNode, policy: ConvergencePolicy) -> Result<RelaxNode, EngineError> {
    if policy == ConvergencePolicy::RejectUnconverged && node.outputs.converged == Some(false) {
        return Err(EngineError::Unconverged);
    }
    Ok(node)
}

fn point(scale_factor: f64, scaled_input: &Structure, node: Arc<RelaxNode>) -> EosPoint {
    let structure = node
        .outputs
        .relaxed_structure
        .clone()
        .unwrap_or_else(|| scaled_input.clone());
    EosPoint {
        scale_factor,
        structure,
        total_energy: node.outputs.total_energy,
        total_magnetization: node.outputs.total_magnetization,
        node,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::results::RelaxOutputs;
    use crate::core::models::structure::{Lattice, Site};
    use crate::engine::engines::lennard_jones::LennardJonesDriver;
    use crate::engine::engines::quantum_espresso::QuantumEspressoGenerator;
    use crate::engine::generator::{EngineOptions, InputGenerator, SubmissionSpec};
    use approx::assert_relative_eq;
    use std::sync::Mutex;

    fn iron() -> Structure {
        Structure::crystal(Lattice::cubic(2.87), vec![Site::new("Fe", [0.0, 0.0, 0.0])]).unwrap()
    }

    fn argon_dimer() -> Structure {
        // Equilibrium separation 2^(1/6) sigma, so the energy minimum of a
        // volume scan sits exactly at factor 1.0.
        let r0 = 2.0_f64.powf(1.0 / 6.0) * 3.405;
        Structure::crystal(
            Lattice::cubic(40.0),
            vec![
                Site::new("Ar", [0.0, 0.0, 0.0]),
                Site::new("Ar", [0.0, 0.0, r0]),
            ],
        )
        .unwrap()
    }

    /// Fabricates results without running anything, recording the volume of each
    /// submitted structure so tests can assert on submission order.
    struct StubDriver {
        volumes: Mutex<Vec<f64>>,
        fail_volume: Option<f64>,
        magnetize: bool,
    }

    impl StubDriver {
        fn new() -> Self {
            Self {
                volumes: Mutex::new(Vec::new()),
                fail_volume: None,
                magnetize: true,
            }
        }

        fn failing_at(volume: f64) -> Self {
            Self {
                fail_volume: Some(volume),
                ..Self::new()
            }
        }
    }

    impl RelaxDriver for StubDriver {
        fn engine_name(&self) -> &'static str {
            "quantum_espresso"
        }

        fn generator(&self) -> Box<dyn InputGenerator> {
            Box::new(QuantumEspressoGenerator)
        }

        fn run(&self, spec: &SubmissionSpec) -> Result<RelaxNode, EngineError> {
            let volume = spec.structure.volume().unwrap();
            self.volumes.lock().unwrap().push(volume);
            if let Some(fail) = self.fail_volume
                && (volume - fail).abs() < 1e-6
            {
                return Err(EngineError::Execution("engine crashed".into()));
            }
            Ok(RelaxNode {
                engine: spec.engine.clone(),
                settings: spec.settings.clone(),
                outputs: RelaxOutputs {
                    relaxed_structure: Some(spec.structure.clone()),
                    total_energy: (volume - 24.0).powi(2),
                    forces: None,
                    stress: None,
                    total_magnetization: self.magnetize.then_some(2.2),
                    converged: Some(true),
                },
            })
        }
    }

    fn stub_config(factors: Vec<f64>) -> EosConfig {
        EosConfig::builder()
            .structure(iron())
            .engines(EngineOptions::new("pw-7.2@cluster"))
            .scale_factors(factors)
            .build()
            .unwrap()
    }

    #[test]
    fn generated_factors_are_centered_on_unity() {
        let factors = scale_factors(DEFAULT_SCALE_COUNT, DEFAULT_SCALE_INCREMENT);
        let expected = [0.94, 0.96, 0.98, 1.00, 1.02, 1.04, 1.06];
        assert_eq!(factors.len(), expected.len());
        for (factor, expected) in factors.iter().zip(expected) {
            assert_relative_eq!(*factor, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn default_config_uses_seven_generated_factors() {
        let config = EosConfig::builder()
            .structure(iron())
            .engines(EngineOptions::new("pw-7.2@cluster"))
            .build()
            .unwrap();
        assert_eq!(config.scale_factors().len(), 7);
        assert_eq!(config.anchor_index(), 3);
    }

    #[test]
    fn volume_relax_types_are_rejected_at_build_time() {
        let err = EosConfig::builder()
            .structure(iron())
            .engines(EngineOptions::new("pw-7.2@cluster"))
            .relax_type(RelaxType::PositionsCell)
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn malformed_series_parameters_are_rejected() {
        let base = || {
            EosConfig::builder()
                .structure(iron())
                .engines(EngineOptions::new("pw-7.2@cluster"))
        };
        assert!(matches!(
            base().scale_factors(vec![0.98, 1.02]).build().unwrap_err(),
            EngineError::Validation(_)
        ));
        assert!(matches!(
            base()
                .scale_factors(vec![0.98, -1.0, 1.02])
                .build()
                .unwrap_err(),
            EngineError::Validation(_)
        ));
        assert!(matches!(
            base().scale_count(2).build().unwrap_err(),
            EngineError::Validation(_)
        ));
        assert!(matches!(
            base().scale_increment(1.0).build().unwrap_err(),
            EngineError::Validation(_)
        ));
    }

    #[test]
    fn anchor_runs_first_and_dependents_inherit_its_mesh() {
        let config = stub_config(vec![0.9, 1.0, 1.1]);
        assert_eq!(config.anchor_index(), 1);

        let driver = StubDriver::new();
        let series = run(
            &config,
            &driver,
            &ProgressReporter::new(),
            &CancelToken::new(),
        )
        .unwrap();

        assert!(series.is_complete());
        let unscaled_volume = iron().volume().unwrap();
        let volumes = driver.volumes.lock().unwrap();
        assert_eq!(volumes.len(), 3);
        assert_relative_eq!(volumes[0], unscaled_volume, epsilon = 1e-9);

        // Every member carries the anchor's mesh even though its cell differs.
        let anchor_mesh = series.slot(1).completed().unwrap().node.settings.kpoint_mesh;
        assert!(anchor_mesh.is_some());
        for index in [0, 2] {
            let point = series.slot(index).completed().unwrap();
            assert_eq!(point.node.settings.kpoint_mesh, anchor_mesh);
        }
    }

    #[test]
    fn anchor_failure_short_circuits_the_series() {
        let unscaled_volume = iron().volume().unwrap();
        let driver = StubDriver::failing_at(unscaled_volume);
        let config = stub_config(vec![0.9, 1.0, 1.1]);
        let series = run(
            &config,
            &driver,
            &ProgressReporter::new(),
            &CancelToken::new(),
        )
        .unwrap();

        assert!(matches!(series.slot(1), EosSlot::Failed(_)));
        assert!(matches!(series.slot(0), EosSlot::Unset));
        assert!(matches!(series.slot(2), EosSlot::Unset));
        assert_eq!(driver.volumes.lock().unwrap().len(), 1);
        assert!(series.total_energies().is_empty());
    }

    #[test]
    fn member_failure_leaves_only_its_slot_failed() {
        let failing_volume = iron().scaled(1.1).unwrap().volume().unwrap();
        let driver = StubDriver::failing_at(failing_volume);
        let config = stub_config(vec![0.9, 1.0, 1.1]);
        let series = run(
            &config,
            &driver,
            &ProgressReporter::new(),
            &CancelToken::new(),
        )
        .unwrap();

        assert!(!series.is_complete());
        assert!(matches!(series.slot(2), EosSlot::Failed(_)));
        let energies = series.total_energies();
        assert_eq!(
            energies.keys().copied().collect::<Vec<_>>(),
            vec![0usize, 1]
        );
        assert_eq!(series.structures().len(), 2);
        assert_eq!(series.volumes().len(), 2);
    }

    #[test]
    fn magnetizations_are_all_or_nothing() {
        let config = stub_config(vec![0.9, 1.0, 1.1]);

        let magnetized = StubDriver::new();
        let series = run(
            &config,
            &magnetized,
            &ProgressReporter::new(),
            &CancelToken::new(),
        )
        .unwrap();
        let magnetizations = series.total_magnetizations().unwrap();
        assert_eq!(magnetizations.len(), 3);

        let unmagnetized = StubDriver {
            magnetize: false,
            ..StubDriver::new()
        };
        let series = run(
            &config,
            &unmagnetized,
            &ProgressReporter::new(),
            &CancelToken::new(),
        )
        .unwrap();
        assert!(series.total_magnetizations().is_none());
    }

    #[test]
    fn cancellation_before_the_anchor_submits_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let driver = StubDriver::new();
        let series = run(&stub_config(vec![0.9, 1.0, 1.1]), &driver, &ProgressReporter::new(), &cancel).unwrap();
        assert!(driver.volumes.lock().unwrap().is_empty());
        assert!(series.slots().iter().all(|s| matches!(s, EosSlot::Unset)));
    }

    #[test]
    fn submission_events_cover_every_member() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let submitted = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::RelaxSubmitted { .. } => {
                submitted.fetch_add(1, Ordering::SeqCst);
            }
            Progress::RelaxCompleted { .. } => {
                completed.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }));
        let driver = StubDriver::new();
        run(
            &stub_config(vec![0.9, 1.0, 1.1]),
            &driver,
            &reporter,
            &CancelToken::new(),
        )
        .unwrap();
        drop(reporter);
        assert_eq!(submitted.load(Ordering::SeqCst), 3);
        assert_eq!(completed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn lennard_jones_dimer_scan_has_its_minimum_at_unity() {
        let config = EosConfig::builder()
            .structure(argon_dimer())
            .engines(EngineOptions::new("builtin"))
            .relax_type(RelaxType::None)
            .build()
            .unwrap();
        let series = run(
            &config,
            &LennardJonesDriver,
            &ProgressReporter::new(),
            &CancelToken::new(),
        )
        .unwrap();

        assert!(series.is_complete());
        let energies = series.total_energies();
        let anchor_energy = energies[&series.anchor_index()];
        for (index, energy) in &energies {
            if *index != series.anchor_index() {
                assert!(*energy > anchor_energy);
            }
        }
        assert_relative_eq!(anchor_energy, -0.0103, epsilon = 1e-4);
    }
}
