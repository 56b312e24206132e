use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Example simulations shipped with the workflow, one physical scenario each.
pub const BUILTIN_SCENARIOS: [&str; 11] = [
    "asp-gas-MM",
    "asp-solution-MM",
    "asp-gas-MM-enhanced",
    "asp-gas-ML",
    "asp-solution-ML",
    "ibu-gas-ML",
    "ibu-solution-MM-enhanced",
    "4ph9-protein-MM",
    "asp-4ph9-MM",
    "asp-4ph9-ML",
    "ibu-4ph9-MM",
];

const CONFIG_EXTENSION: &str = "yaml";
const LOG_EXTENSION: &str = "log";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioNameError {
    #[error("Scenario name cannot be empty")]
    Empty,
    #[error("Scenario name '{0}' must not contain path separators")]
    PathSeparator(String),
}

/// Identifier of one example simulation. Always a plain file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScenarioName(String);

impl ScenarioName {
    pub fn new(name: impl Into<String>) -> Result<Self, ScenarioNameError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ScenarioNameError::Empty);
        }
        if name.contains(['/', '\\']) {
            return Err(ScenarioNameError::PathSeparator(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn builtin() -> Vec<ScenarioName> {
        BUILTIN_SCENARIOS
            .iter()
            .map(|name| ScenarioName(name.to_string()))
            .collect()
    }
}

impl FromStr for ScenarioName {
    type Err = ScenarioNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ScenarioName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where scenario configurations are read from and where their logs land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessLayout {
    pub work_dir: PathBuf,
    pub examples_dir: PathBuf,
}

impl HarnessLayout {
    pub fn new(work_dir: impl Into<PathBuf>, examples_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            examples_dir: examples_dir.into(),
        }
    }

    /// Logs go to `work_dir`; configurations come from `<work_dir>/../examples`.
    pub fn from_working_dir(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let examples_dir = work_dir
            .parent()
            .unwrap_or(work_dir.as_path())
            .join("examples");
        Self {
            work_dir,
            examples_dir,
        }
    }

    pub fn config_path(&self, name: &ScenarioName) -> PathBuf {
        self.examples_dir
            .join(format!("{}.{}", name.as_str(), CONFIG_EXTENSION))
    }

    pub fn log_path(&self, name: &ScenarioName) -> PathBuf {
        self.work_dir.join(format!("{}.{}", name.as_str(), LOG_EXTENSION))
    }

    /// Lists every `*.yaml` in the examples directory, sorted by name.
    pub fn discover(&self) -> io::Result<Vec<ScenarioName>> {
        discover_scenarios(&self.examples_dir)
    }
}

pub fn discover_scenarios(examples_dir: &Path) -> io::Result<Vec<ScenarioName>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(examples_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(CONFIG_EXTENSION) {
            continue;
        }
        if let Some(name) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| ScenarioName::new(s).ok())
        {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
