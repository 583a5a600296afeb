pub mod eos;
pub mod relax;

use crate::cli::CommonArgs;
use crate::error::{CliError, Result};
use commonwf::core::io::read_structure;
use commonwf::core::models::structure::Structure;
use commonwf::engine::generator::{
    EngineOptions, RelaxInputs, RelaxInputsBuilder, ResourceOptions,
};
use std::path::Path;
use tracing::info;

pub(crate) fn load_structure(path: &Path) -> Result<Structure> {
    info!("Loading input structure from {:?}", path);
    let structure = read_structure(path).map_err(|source| CliError::FileParsing {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        formula = %structure.formula(),
        periodic = structure.lattice().is_some(),
        "structure loaded"
    );
    Ok(structure)
}

/// Assembles the common relaxation inputs from the shared CLI arguments.
pub(crate) fn relax_inputs(args: &CommonArgs, structure: Structure) -> Result<RelaxInputs> {
    let engines = EngineOptions {
        code: args.code.clone(),
        resources: ResourceOptions {
            num_machines: args.machines,
            procs_per_machine: args.procs,
            walltime_seconds: args.walltime,
            queue: args.queue.clone(),
        },
    };

    let mut builder = RelaxInputsBuilder::new().structure(structure).engines(engines);
    if let Some(protocol) = &args.protocol {
        builder = builder.protocol(protocol.clone());
    }
    if let Some(relax_type) = args.relax_type {
        builder = builder.relax_type(relax_type);
    }
    if let Some(spin_type) = args.spin_type {
        builder = builder.spin_type(spin_type);
    }
    if let Some(electronic_type) = args.electronic_type {
        builder = builder.electronic_type(electronic_type);
    }
    if !args.magnetization_per_site.is_empty() {
        builder = builder.magnetization_per_site(args.magnetization_per_site.clone());
    }
    if let Some(threshold) = args.threshold_forces {
        builder = builder.threshold_forces(threshold);
    }
    if let Some(threshold) = args.threshold_stress {
        builder = builder.threshold_stress(threshold);
    }
    Ok(builder.build()?)
}
