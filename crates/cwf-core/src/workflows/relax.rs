use crate::core::models::results::RelaxNode;
use crate::core::models::types::RelaxType;
use crate::engine::driver::{ConvergencePolicy, RelaxDriver};
use crate::engine::error::EngineError;
use crate::engine::generator::RelaxInputs;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// Runs one common relaxation through the given driver.
///
/// The driver's input generator validates the inputs and produces the submission
/// spec; the driver executes it; the outputs are normalized afterwards: single-point
/// runs carry no relaxed structure, and the convergence policy decides the fate of
/// an unconverged result.
#[instrument(skip_all, name = "relax_workflow")]
pub fn run(
    inputs: &RelaxInputs,
    driver: &dyn RelaxDriver,
    policy: ConvergencePolicy,
    reporter: &ProgressReporter,
) -> Result<RelaxNode, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Generating inputs",
    });
    let generator = driver.generator();
    let spec = generator.get_builder(inputs)?;
    info!(
        engine = %spec.engine,
        protocol = %spec.protocol,
        relax_type = %spec.relax_type,
        "submitting relaxation"
    );
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Relaxing" });
    let mut node = driver.run(&spec)?;
    reporter.report(Progress::PhaseFinish);

    if spec.relax_type == RelaxType::None {
        node.outputs.relaxed_structure = None;
    }
    if policy == ConvergencePolicy::RejectUnconverged && node.outputs.converged == Some(false) {
        return Err(EngineError::Unconverged);
    }

    info!(
        total_energy = node.outputs.total_energy,
        converged = ?node.outputs.converged,
        "relaxation finished"
    );
    Ok(node)
}
