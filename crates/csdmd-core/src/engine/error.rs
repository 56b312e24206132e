use crate::core::params::ParamsError;
use crate::core::version::{RuntimeVersion, VersionParseError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Failed to run interpreter '{interpreter}': {source}", interpreter = interpreter.display())]
    Probe {
        interpreter: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    VersionParse(#[from] VersionParseError),

    #[error("Unsupported runtime version {found}; at least {minimum} is required")]
    UnsupportedRuntime {
        found: RuntimeVersion,
        minimum: RuntimeVersion,
    },

    #[error("Missing packages: {}", .0.join(", "))]
    MissingPackages(Vec<String>),
}

/// Why a single module could not be imported.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Cannot import '{module}': {reason}")]
pub struct ImportFailure {
    pub module: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to launch '{program}': {source}", program = program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Log file error for '{path}': {source}", path = path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to discover scenarios in '{path}': {source}", path = path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed tests: {}", .0.join(", "))]
    Failures(Vec<String>),
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error("Failed to prepare input directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("Structure acquisition stage '{stage}' failed: {reason}")]
    StructureAcquisition { stage: &'static str, reason: String },

    #[error("Simulation stage '{stage}' failed: {reason}")]
    Simulation { stage: &'static str, reason: String },
}
