use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Christopher D Williams",
    version,
    about = "CSD-MD CLI - Run molecular dynamics simulations of CSD entries and validate the CSD-MD installation.",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one MD simulation described by a YAML parameter file.
    Run(RunArgs),
    /// Check the scientific environment and run the example simulations.
    Validate(ValidateArgs),
    /// List the example simulations the validator would run.
    Scenarios(ScenariosArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the YAML file with the simulation parameters.
    #[arg(long = "md_params", alias = "md-params", required = true, value_name = "PATH")]
    pub md_params: PathBuf,

    /// Keep the generated input directory after the run.
    #[arg(long)]
    pub keep_inputs: bool,
}

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Path to a harness configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory the scenario logs are written to. Defaults to the current directory.
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Directory holding the scenario configurations.
    /// Defaults to `examples` next to the working directory.
    #[arg(long, value_name = "DIR")]
    pub examples_dir: Option<PathBuf>,

    /// Run only the named scenario. Can be used multiple times.
    #[arg(short, long = "scenario", value_name = "NAME", conflicts_with = "builtin")]
    pub scenarios: Vec<String>,

    /// Run the eleven built-in scenarios instead of discovering them.
    #[arg(long)]
    pub builtin: bool,

    /// Maximum number of scenarios running at the same time.
    #[arg(short, long, value_name = "NUM")]
    pub jobs: Option<usize>,

    /// Kill a scenario that runs longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Also require a successful exit status for a scenario to pass.
    #[arg(long)]
    pub strict: bool,

    /// Interpreter hosting the scientific packages.
    #[arg(long, value_name = "PATH")]
    pub interpreter: Option<PathBuf>,

    /// Write one CSV row per scenario to this file.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Skip the interpreter version and package checks.
    #[arg(long, conflicts_with = "skip_scenarios")]
    pub skip_environment: bool,

    /// Skip the example simulations.
    #[arg(long)]
    pub skip_scenarios: bool,
}

/// Arguments for the `scenarios` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ScenariosArgs {
    /// Directory holding the scenario configurations.
    #[arg(long, value_name = "DIR")]
    pub examples_dir: Option<PathBuf>,

    /// List the built-in scenarios instead of discovering them.
    #[arg(long)]
    pub builtin: bool,
}
