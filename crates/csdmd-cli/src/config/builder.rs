use super::defaults::{DefaultsConfig, RUN_SUBCOMMAND};
use super::file::FileConfig;
use crate::cli::ValidateArgs;
use crate::error::{CliError, Result};
use csdmd::core::requirements::PackageRequirement;
use csdmd::core::scenario::{HarnessLayout, ScenarioName};
use csdmd::core::version::RuntimeVersion;
use csdmd::engine::config::{
    CompletionOracle, EntryPoint, HarnessConfig, HarnessConfigBuilder, ScenarioSelection,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Merges built-in defaults, the optional TOML file and the command line, in
/// increasing order of precedence.
pub fn build_harness_config(args: &ValidateArgs) -> Result<HarnessConfig> {
    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let cwd = std::env::current_dir()?;
    merge(args, file_config, &cwd, default_entry_point)
}

fn merge(
    args: &ValidateArgs,
    file: FileConfig,
    cwd: &Path,
    default_entry_point: impl FnOnce() -> Result<EntryPoint>,
) -> Result<HarnessConfig> {
    let defaults = DefaultsConfig::default();

    let interpreter = args
        .interpreter
        .clone()
        .or(file.interpreter)
        .unwrap_or(defaults.interpreter);

    let layout = resolve_layout(
        args.work_dir.clone().or(file.work_dir),
        args.examples_dir.clone().or(file.examples_dir),
        cwd,
    );

    let selection = if !args.scenarios.is_empty() {
        ScenarioSelection::Explicit(parse_scenario_names(&args.scenarios)?)
    } else if args.builtin {
        ScenarioSelection::Builtin
    } else if let Some(names) = &file.scenarios {
        ScenarioSelection::Explicit(parse_scenario_names(names)?)
    } else {
        ScenarioSelection::Discover
    };

    let strict = args.strict || file.strict.unwrap_or(defaults.strict);
    let oracle = if strict {
        CompletionOracle::MarkerAndExitCode
    } else {
        CompletionOracle::Marker
    };

    let entry_point = match file.entry_point {
        Some(entry) => EntryPoint::new(entry.program).with_args(entry.args),
        None => default_entry_point()?,
    };

    let mut builder = HarnessConfigBuilder::new()
        .interpreter(interpreter)
        .layout(layout)
        .entry_point(entry_point)
        .selection(selection)
        .oracle(oracle)
        .jobs(args.jobs.or(file.jobs).unwrap_or(defaults.jobs))
        .timeout(args.timeout.or(file.timeout_secs).map(Duration::from_secs));

    if let Some((major, minor)) = file.minimum_runtime {
        builder = builder.minimum_runtime(RuntimeVersion::new(major, minor));
    }
    if let Some(packages) = file.packages {
        builder = builder.requirements(
            packages
                .into_iter()
                .map(|(package, module)| PackageRequirement::new(package, module))
                .collect(),
        );
    }

    Ok(builder.build()?)
}

/// Work dir defaults to `cwd`; examples dir defaults to `examples` beside the work dir.
pub fn resolve_layout(
    work_dir: Option<PathBuf>,
    examples_dir: Option<PathBuf>,
    cwd: &Path,
) -> HarnessLayout {
    let absolute = |p: PathBuf| if p.is_absolute() { p } else { cwd.join(p) };
    let work_dir = work_dir.map(absolute).unwrap_or_else(|| cwd.to_path_buf());
    match examples_dir {
        Some(dir) => HarnessLayout::new(work_dir, absolute(dir)),
        None => HarnessLayout::from_working_dir(work_dir),
    }
}

fn parse_scenario_names(names: &[String]) -> Result<Vec<ScenarioName>> {
    names
        .iter()
        .map(|n| n.parse::<ScenarioName>().map_err(|e| CliError::Argument(e.to_string())))
        .collect()
}

/// This binary's own `run` subcommand.
fn default_entry_point() -> Result<EntryPoint> {
    let exe = std::env::current_exe()?;
    Ok(EntryPoint::new(exe).with_args([RUN_SUBCOMMAND]))
}
