//! Contract with the external chemistry/MD engine.
//!
//! The workflow never touches structures or trajectories itself. It hands each
//! stage to a [`StructureProvider`] or [`MdEngine`], and [`ExternalBackend`]
//! implements both by launching one engine process per stage.

use crate::core::params::{EngineCommand, MdParams};
use crate::engine::config::MD_PARAMS_FLAG;
use crate::engine::error::WorkflowError;
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Everything a stage needs to locate its inputs and outputs.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub params: &'a MdParams,
    pub params_path: &'a Path,
    /// Directory transient inputs are written to and read from.
    pub input_dir: &'a Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchProtein,
    RepairProtein,
    FetchLigand,
    Dock,
    Setup,
    Simulate,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::FetchProtein => "fetch-protein",
            Stage::RepairProtein => "repair-protein",
            Stage::FetchLigand => "fetch-ligand",
            Stage::Dock => "dock",
            Stage::Setup => "setup",
            Stage::Simulate => "simulate",
        }
    }

    pub fn failure(&self, reason: impl Into<String>) -> WorkflowError {
        let reason = reason.into();
        match self {
            Stage::Setup | Stage::Simulate => WorkflowError::Simulation {
                stage: self.name(),
                reason,
            },
            _ => WorkflowError::StructureAcquisition {
                stage: self.name(),
                reason,
            },
        }
    }
}

pub trait StructureProvider {
    fn fetch_protein(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError>;
    fn repair_protein(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError>;
    /// Retrieves the ligand and returns its SMILES notation when the provider knows it.
    fn fetch_ligand(&self, ctx: &RunContext<'_>) -> Result<Option<String>, WorkflowError>;
    fn dock(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError>;
}

pub trait MdEngine {
    fn setup(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError>;
    fn simulate(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError>;
}

/// Runs `<program> <args...> <stage> --md_params <file> --workdir <dir>` per stage.
///
/// Output is inherited, so engine progress lands wherever the workflow's own
/// output goes. A non-zero exit fails the stage.
#[derive(Debug, Clone)]
pub struct ExternalBackend {
    command: EngineCommand,
}

impl ExternalBackend {
    pub fn new(command: EngineCommand) -> Self {
        Self { command }
    }

    fn run_stage(&self, stage: Stage, ctx: &RunContext<'_>) -> Result<(), WorkflowError> {
        debug!(
            "Running engine stage '{}' via {:?}",
            stage.name(),
            self.command.program
        );
        let status = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(stage.name())
            .arg(MD_PARAMS_FLAG)
            .arg(ctx.params_path)
            .arg("--workdir")
            .arg(ctx.input_dir)
            .status()
            .map_err(|e| {
                stage.failure(format!(
                    "could not launch {}: {}",
                    self.command.program.display(),
                    e
                ))
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(stage.failure(format!("engine exited with {}", status)))
        }
    }
}

impl StructureProvider for ExternalBackend {
    fn fetch_protein(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError> {
        self.run_stage(Stage::FetchProtein, ctx)
    }

    fn repair_protein(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError> {
        self.run_stage(Stage::RepairProtein, ctx)
    }

    fn fetch_ligand(&self, ctx: &RunContext<'_>) -> Result<Option<String>, WorkflowError> {
        self.run_stage(Stage::FetchLigand, ctx)?;
        let Some(refcode) = ctx.params.structure.csd.as_deref() else {
            return Ok(None);
        };
        let smiles_path = ctx.input_dir.join(format!("{}.smi", refcode));
        match std::fs::read_to_string(&smiles_path) {
            Ok(content) => Ok(content.split_whitespace().next().map(str::to_string)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("Engine did not write {:?}; SMILES unknown.", smiles_path);
                Ok(None)
            }
            Err(e) => Err(Stage::FetchLigand.failure(format!(
                "could not read {}: {}",
                smiles_path.display(),
                e
            ))),
        }
    }

    fn dock(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError> {
        self.run_stage(Stage::Dock, ctx)
    }
}

impl MdEngine for ExternalBackend {
    fn setup(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError> {
        self.run_stage(Stage::Setup, ctx)
    }

    fn simulate(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError> {
        self.run_stage(Stage::Simulate, ctx)
    }
}
