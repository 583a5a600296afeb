use crate::cli::RelaxArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use commonwf::core::io::write_structure;
use commonwf::core::models::results::RelaxNode;
use commonwf::engine::driver::ConvergencePolicy;
use std::sync::Arc;
use commonwf::engine::progress::ProgressReporter;
use commonwf::engine::registry::EngineRegistry;
use commonwf::workflows;
use tracing::{info, warn};

pub fn run(args: RelaxArgs) -> Result<()> {
    let registry = EngineRegistry::with_builtin();
    let structure = super::load_structure(&args.common.structure)?;
    let mut inputs = super::relax_inputs(&args.common, structure)?;
    if let Some(path) = &args.reference {
        let text = std::fs::read_to_string(path)?;
        let node: RelaxNode = toml::from_str(&text).map_err(|e| {
            CliError::Argument(format!(
                "reference file '{}' is not a valid result record: {e}",
                path.display()
            ))
        })?;
        info!(engine = %node.engine, "reference result loaded");
        inputs.reference = Some(Arc::new(node));
    }

    if let Some(path) = &args.common.dry_run {
        let generator = registry.generator(&args.common.engine)?;
        let spec = generator.get_builder(&inputs)?;
        let text = toml::to_string_pretty(&spec).map_err(|e| CliError::Other(e.into()))?;
        std::fs::write(path, text)?;
        println!("✓ Submission written to: {}", path.display());
        return Ok(());
    }

    let driver = registry.driver(&args.common.engine)?.ok_or_else(|| {
        CliError::Argument(format!(
            "engine `{}` has no in-process driver; use --dry-run to write its submission",
            args.common.engine
        ))
    })?;

    let policy = if args.reject_unconverged {
        ConvergencePolicy::RejectUnconverged
    } else {
        ConvergencePolicy::AcceptUnconverged
    };
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting relaxation...");
    let node = workflows::relax::run(&inputs, driver.as_ref(), policy, &reporter)?;

    println!("✓ Total energy: {:.6} eV", node.outputs.total_energy);
    if let Some(converged) = node.outputs.converged {
        println!("  Converged: {}", converged);
    }
    if let Some(magnetization) = node.outputs.total_magnetization {
        println!("  Total magnetization: {:.4} μB", magnetization);
    }

    if let Some(path) = &args.save_node {
        let text = toml::to_string_pretty(&node).map_err(|e| CliError::Other(e.into()))?;
        std::fs::write(path, text)?;
        println!("✓ Result record written to: {}", path.display());
    }

    match (&args.output, &node.outputs.relaxed_structure) {
        (Some(path), Some(relaxed)) => {
            write_structure(relaxed, path).map_err(|source| CliError::FileParsing {
                path: path.clone(),
                source,
            })?;
            info!("Relaxed structure written to {:?}", path);
            println!("✓ Relaxed structure written to: {}", path.display());
        }
        (Some(_), None) => {
            warn!("Single-point run produced no relaxed structure; nothing to write.");
            println!("Warning: single-point run produced no relaxed structure.");
        }
        (None, _) => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use std::path::Path;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: crate::cli::RelaxArgs,
    }

    fn dimer_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("dimer.xyz");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "2\nargon dimer\nAr 0.0 0.0 0.0\nAr 0.0 0.0 3.6").unwrap();
        path
    }

    #[test]
    fn saved_node_round_trips_as_a_reference() {
        let dir = tempfile::tempdir().unwrap();
        let structure_path = dimer_file(dir.path());
        let node_path = dir.path().join("anchor.toml");
        let output_path = dir.path().join("relaxed.xyz");

        let first = Harness::parse_from([
            "harness",
            "lennard_jones",
            "-S",
            structure_path.to_str().unwrap(),
            "-o",
            output_path.to_str().unwrap(),
            "--save-node",
            node_path.to_str().unwrap(),
        ]);
        run(first.args).unwrap();
        assert!(output_path.exists());
        assert!(node_path.exists());

        let second = Harness::parse_from([
            "harness",
            "lennard_jones",
            "-S",
            structure_path.to_str().unwrap(),
            "-P",
            node_path.to_str().unwrap(),
            "-r",
            "none",
        ]);
        run(second.args).unwrap();
    }

    #[test]
    fn dry_run_writes_the_submission() {
        let dir = tempfile::tempdir().unwrap();
        let structure_path = dimer_file(dir.path());
        let spec_path = dir.path().join("submission.toml");

        let harness = Harness::parse_from([
            "harness",
            "castep",
            "-S",
            structure_path.to_str().unwrap(),
            "--dry-run",
            spec_path.to_str().unwrap(),
        ]);
        run(harness.args).unwrap();
        let text = std::fs::read_to_string(spec_path).unwrap();
        assert!(text.contains("engine = \"castep\""));
    }

    #[test]
    fn garbage_reference_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let structure_path = dimer_file(dir.path());
        let node_path = dir.path().join("anchor.toml");
        std::fs::write(&node_path, "not a record").unwrap();

        let harness = Harness::parse_from([
            "harness",
            "lennard_jones",
            "-S",
            structure_path.to_str().unwrap(),
            "-P",
            node_path.to_str().unwrap(),
        ]);
        assert!(matches!(
            run(harness.args).unwrap_err(),
            CliError::Argument(_)
        ));
    }
}
