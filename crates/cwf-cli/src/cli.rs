use clap::{Args, Parser, Subcommand};
use commonwf::core::models::types::{ElectronicType, RelaxType, SpinType};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The commonwf developers",
    version,
    about = "cwf - a uniform command-line interface for relaxing crystal structures and molecules across quantum engines.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch one of the common workflows through a registered engine.
    Launch {
        #[command(subcommand)]
        workflow: LaunchCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum LaunchCommands {
    /// Relax a structure once and report its total energy.
    Relax(RelaxArgs),
    /// Compute an equation of state over a series of scaled volumes.
    Eos(EosArgs),
}

/// The inputs shared by every workflow: which engine, which structure, and the
/// common relaxation options.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Engine identifier (quantum_espresso, castep, lennard_jones).
    #[arg(value_name = "ENGINE")]
    pub engine: String,

    /// Path to the input structure file (.xyz for molecules, POSCAR for crystals).
    #[arg(short = 'S', long, required = true, value_name = "PATH")]
    pub structure: PathBuf,

    /// Label of the code executable, e.g. 'pw-7.2@cluster'.
    #[arg(short = 'X', long, default_value = "builtin", value_name = "LABEL")]
    pub code: String,

    /// Protocol controlling the accuracy of the calculation.
    /// Defaults to the engine's own default protocol.
    #[arg(short = 'p', long, value_name = "NAME")]
    pub protocol: Option<String>,

    /// Degrees of freedom to relax (none, positions, shape, cell, ...).
    #[arg(short = 'r', long, value_name = "NAME")]
    pub relax_type: Option<RelaxType>,

    /// Spin polarization treatment (none, collinear, non_collinear).
    #[arg(short = 's', long, value_name = "NAME")]
    pub spin_type: Option<SpinType>,

    /// Electronic character of the system (metal, insulator).
    #[arg(long, value_name = "NAME")]
    pub electronic_type: Option<ElectronicType>,

    /// Initial magnetization per site in Bohr magnetons, one value per atom.
    #[arg(long, value_name = "FLOAT", num_args(1..))]
    pub magnetization_per_site: Vec<f64>,

    /// Override the protocol's force convergence threshold, in eV/Å.
    #[arg(long, value_name = "FLOAT")]
    pub threshold_forces: Option<f64>,

    /// Override the protocol's stress convergence threshold, in eV/Å³.
    #[arg(long, value_name = "FLOAT")]
    pub threshold_stress: Option<f64>,

    /// Number of machines to request from the scheduler.
    #[arg(short = 'm', long, default_value_t = 1, value_name = "INT")]
    pub machines: u32,

    /// Number of processes per machine.
    #[arg(short = 'n', long, default_value_t = 1, value_name = "INT")]
    pub procs: u32,

    /// Maximum wallclock time in seconds.
    #[arg(short = 'w', long, default_value_t = 3600, value_name = "SECONDS")]
    pub walltime: u64,

    /// Scheduler queue to submit to.
    #[arg(long, value_name = "NAME")]
    pub queue: Option<String>,

    /// Write the generated submission as TOML to this path instead of running.
    /// This is the only mode available for engines without an in-process driver.
    #[arg(long, value_name = "PATH")]
    pub dry_run: Option<PathBuf>,
}

/// Arguments for the `launch relax` subcommand.
#[derive(Args, Debug)]
pub struct RelaxArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Path for the relaxed output structure.
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Result record of a previous run (written with --save-node) whose numerical
    /// settings should be reused, making the two total energies subtractable.
    #[arg(short = 'P', long, value_name = "PATH")]
    pub reference: Option<PathBuf>,

    /// Write the full result record as TOML to this path after the run.
    #[arg(long, value_name = "PATH")]
    pub save_node: Option<PathBuf>,

    /// Fail the run when the engine reports non-convergence.
    #[arg(long)]
    pub reject_unconverged: bool,
}

/// Arguments for the `launch eos` subcommand.
#[derive(Args, Debug)]
pub struct EosArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Number of volumes to sample, centered on the input volume.
    #[arg(long, value_name = "INT", conflicts_with = "scale_factors")]
    pub scale_count: Option<u32>,

    /// Spacing between consecutive volume factors.
    #[arg(long, value_name = "FLOAT", conflicts_with = "scale_factors")]
    pub scale_increment: Option<f64>,

    /// Explicit list of volume factors to sample instead of a generated series.
    #[arg(long, value_name = "FLOAT", num_args(3..))]
    pub scale_factors: Vec<f64>,

    /// Fail a series member when the engine reports non-convergence.
    #[arg(long)]
    pub reject_unconverged: bool,
}
