use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tomopack::engine::config::RelaxMethod;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "tomopack CLI - A command-line driver for resolving geometric overlap between oriented, meshed particles in cryo-ET subtomogram scenes.",
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
    /// Iteratively remove overlap between the particles of a scene.
    Relax(RelaxArgs),
}

/// Arguments for the `relax` subcommand.
#[derive(Args, Debug)]
pub struct RelaxArgs {
    /// Path to the scene description file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub scene: PathBuf,

    /// Path for the relaxed particle table in CSV format.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    // --- Relaxation Overrides ---
    /// Override the estimation method from the scene file.
    #[arg(short, long, value_enum, value_name = "METHOD")]
    pub method: Option<CliRelaxMethod>,

    /// Override the maximum number of relaxation iterations.
    #[arg(long, value_name = "INT")]
    pub max_iterations: Option<u32>,

    /// Override the precision (step scale and convergence base), in frame units.
    #[arg(long, value_name = "FLOAT")]
    pub precision: Option<f64>,

    /// Override the target sample count per pair for volume estimation.
    #[arg(long, value_name = "INT")]
    pub thoroughness: Option<u32>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum CliRelaxMethod {
    /// Separating-plane estimation from the contact point cloud.
    Distance,
    /// Sampled intersection-volume estimation.
    Volume,
}

impl From<CliRelaxMethod> for RelaxMethod {
    fn from(method: CliRelaxMethod) -> Self {
        match method {
            CliRelaxMethod::Distance => RelaxMethod::Distance,
            CliRelaxMethod::Volume => RelaxMethod::Volume,
        }
    }
}
