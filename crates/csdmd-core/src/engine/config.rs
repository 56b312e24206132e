use crate::core::requirements::PackageRequirement;
use crate::core::scenario::{HarnessLayout, ScenarioName};
use crate::core::version::{MINIMUM_RUNTIME, RuntimeVersion};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Flag the run flow reads its parameter file from.
pub const MD_PARAMS_FLAG: &str = "--md_params";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{0}': {1}")]
    InvalidValue(&'static str, String),
}

/// The command launched once per scenario, before `--md_params <file>` is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl EntryPoint {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// How a finished scenario is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionOracle {
    /// The log mentions the completion marker. Exit status is ignored.
    #[default]
    Marker,
    /// The log mentions the completion marker and the process exited successfully.
    MarkerAndExitCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioSelection {
    /// Every `*.yaml` found in the examples directory.
    Discover,
    /// The eleven scenarios shipped with the workflow.
    Builtin,
    Explicit(Vec<ScenarioName>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    pub interpreter: PathBuf,
    pub minimum_runtime: RuntimeVersion,
    pub requirements: Vec<PackageRequirement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    pub layout: HarnessLayout,
    pub entry_point: EntryPoint,
    pub selection: ScenarioSelection,
    pub oracle: CompletionOracle,
    pub jobs: usize,
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub environment: EnvironmentConfig,
    pub scenarios: ScenarioConfig,
}

#[derive(Default)]
pub struct HarnessConfigBuilder {
    interpreter: Option<PathBuf>,
    minimum_runtime: Option<RuntimeVersion>,
    requirements: Option<Vec<PackageRequirement>>,
    layout: Option<HarnessLayout>,
    entry_point: Option<EntryPoint>,
    selection: Option<ScenarioSelection>,
    oracle: Option<CompletionOracle>,
    jobs: Option<usize>,
    timeout: Option<Duration>,
    poll_interval: Option<Duration>,
}

impl HarnessConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interpreter(mut self, path: PathBuf) -> Self {
        self.interpreter = Some(path);
        self
    }
    pub fn minimum_runtime(mut self, version: RuntimeVersion) -> Self {
        self.minimum_runtime = Some(version);
        self
    }
    pub fn requirements(mut self, requirements: Vec<PackageRequirement>) -> Self {
        self.requirements = Some(requirements);
        self
    }
    pub fn layout(mut self, layout: HarnessLayout) -> Self {
        self.layout = Some(layout);
        self
    }
    pub fn entry_point(mut self, entry_point: EntryPoint) -> Self {
        self.entry_point = Some(entry_point);
        self
    }
    pub fn selection(mut self, selection: ScenarioSelection) -> Self {
        self.selection = Some(selection);
        self
    }
    pub fn oracle(mut self, oracle: CompletionOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<HarnessConfig, ConfigError> {
        let jobs = self.jobs.unwrap_or(1);
        if jobs == 0 {
            return Err(ConfigError::InvalidValue(
                "jobs",
                "must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::InvalidValue(
                "timeout",
                "must be greater than zero".to_string(),
            ));
        }

        let environment = EnvironmentConfig {
            interpreter: self
                .interpreter
                .ok_or(ConfigError::MissingParameter("interpreter"))?,
            minimum_runtime: self.minimum_runtime.unwrap_or(MINIMUM_RUNTIME),
            requirements: self
                .requirements
                .unwrap_or_else(PackageRequirement::builtin),
        };
        let scenarios = ScenarioConfig {
            layout: self.layout.ok_or(ConfigError::MissingParameter("layout"))?,
            entry_point: self
                .entry_point
                .ok_or(ConfigError::MissingParameter("entry_point"))?,
            selection: self.selection.unwrap_or(ScenarioSelection::Discover),
            oracle: self.oracle.unwrap_or_default(),
            jobs,
            timeout: self.timeout,
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
        };
        Ok(HarnessConfig {
            environment,
            scenarios,
        })
    }
}
