use crate::cli::EosArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use commonwf::core::models::structure::Structure;
use commonwf::engine::cancel::CancelToken;
use commonwf::engine::error::EngineError;
use commonwf::engine::progress::ProgressReporter;
use commonwf::engine::registry::EngineRegistry;
use commonwf::workflows::eos::{EosConfig, EosSlot};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn run(args: EosArgs) -> Result<()> {
    let registry = EngineRegistry::with_builtin();
    let structure = super::load_structure(&args.common.structure)?;
    let config = eos_config(&args, structure)?;

    if let Some(path) = &args.common.dry_run {
        return write_submissions(&registry, &args, &config, path);
    }

    let driver = registry.driver(&args.common.engine)?.ok_or_else(|| {
        CliError::Argument(format!(
            "engine `{}` has no in-process driver; use --dry-run to write its submissions",
            args.common.engine
        ))
    })?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let cancel = CancelToken::new();

    println!(
        "Starting equation of state over {} volumes...",
        config.scale_factors().len()
    );
    let series = commonwf::workflows::eos::run(&config, driver.as_ref(), &reporter, &cancel)?;

    println!(
        "{:>10} {:>14} {:>16}  {}",
        "factor", "volume (Å³)", "energy (eV)", "status"
    );
    for (index, slot) in series.slots().iter().enumerate() {
        let factor = series.scale_factors()[index];
        match slot {
            EosSlot::Completed(point) => {
                let volume = point
                    .structure
                    .volume()
                    .map_or_else(|| format!("{:>14}", "-"), |v| format!("{:>14.4}", v));
                let status = if index == series.anchor_index() {
                    "anchor"
                } else {
                    "ok"
                };
                println!(
                    "{:>10.4} {} {:>16.6}  {}",
                    factor, volume, point.total_energy, status
                );
            }
            EosSlot::Failed(message) => {
                println!("{:>10.4} {:>14} {:>16}  failed: {}", factor, "-", "-", message);
            }
            EosSlot::Unset => {
                println!("{:>10.4} {:>14} {:>16}  not submitted", factor, "-", "-");
            }
        }
    }

    if let Some(magnetizations) = series.total_magnetizations() {
        println!("Total magnetizations (μB):");
        for (index, magnetization) in magnetizations {
            println!(
                "{:>10.4} {:>14.4}",
                series.scale_factors()[index], magnetization
            );
        }
    }

    let completed = series.total_energies().len();
    if completed == 0 {
        return Err(CliError::Engine(EngineError::Execution(
            "no series member completed".into(),
        )));
    }
    if !series.is_complete() {
        warn!(
            completed,
            total = series.len(),
            "series finished with missing members"
        );
        println!(
            "Warning: only {}/{} series members completed.",
            completed,
            series.len()
        );
    }

    Ok(())
}

fn eos_config(args: &EosArgs, structure: Structure) -> Result<EosConfig> {
    let common = &args.common;
    let mut builder = EosConfig::builder()
        .structure(structure)
        .engines(commonwf::engine::generator::EngineOptions {
            code: common.code.clone(),
            resources: commonwf::engine::generator::ResourceOptions {
                num_machines: common.machines,
                procs_per_machine: common.procs,
                walltime_seconds: common.walltime,
                queue: common.queue.clone(),
            },
        });
    if let Some(protocol) = &common.protocol {
        builder = builder.protocol(protocol.clone());
    }
    if let Some(relax_type) = common.relax_type {
        builder = builder.relax_type(relax_type);
    }
    if let Some(spin_type) = common.spin_type {
        builder = builder.spin_type(spin_type);
    }
    if let Some(electronic_type) = common.electronic_type {
        builder = builder.electronic_type(electronic_type);
    }
    if !common.magnetization_per_site.is_empty() {
        builder = builder.magnetization_per_site(common.magnetization_per_site.clone());
    }
    if let Some(threshold) = common.threshold_forces {
        builder = builder.threshold_forces(threshold);
    }
    if let Some(threshold) = common.threshold_stress {
        builder = builder.threshold_stress(threshold);
    }
    if !args.scale_factors.is_empty() {
        builder = builder.scale_factors(args.scale_factors.clone());
    }
    if let Some(count) = args.scale_count {
        builder = builder.scale_count(count);
    }
    if let Some(increment) = args.scale_increment {
        builder = builder.scale_increment(increment);
    }
    if args.reject_unconverged {
        builder = builder.convergence_policy(
            commonwf::engine::driver::ConvergencePolicy::RejectUnconverged,
        );
    }
    Ok(builder.build()?)
}

/// Writes one submission file per volume factor, numbered after `base`.
///
/// Dry-run submissions carry no reference; the shared k-point mesh only exists
/// once the anchor has actually run.
fn write_submissions(
    registry: &EngineRegistry,
    args: &EosArgs,
    config: &EosConfig,
    base: &Path,
) -> Result<()> {
    let generator = registry.generator(&args.common.engine)?;
    for (index, factor) in config.scale_factors().iter().enumerate() {
        let scaled = config
            .base_inputs()
            .structure
            .scaled(*factor)
            .map_err(EngineError::from)?;
        let mut member = config.base_inputs().clone();
        member.structure = scaled;
        let spec = generator.get_builder(&member)?;
        let text = toml::to_string_pretty(&spec).map_err(|e| CliError::Other(e.into()))?;
        let path = indexed_path(base, index + 1);
        std::fs::write(&path, text)?;
        info!(factor, "submission written to {:?}", path);
        println!("✓ Submission for factor {:.4} written to: {}", factor, path.display());
    }
    Ok(())
}

fn indexed_path(base: &Path, index: usize) -> PathBuf {
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("eos");
    let extension = base.extension().and_then(|s| s.to_str()).unwrap_or("toml");
    base.with_file_name(format!("{stem}-{index}.{extension}"))
}
