//! Run parameters for a single MD workflow invocation.
//!
//! Parameters are read from a YAML file with kebab-case keys. Unknown keys are
//! rejected so that typos fail before any structure is fetched.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Value of `structure.csd` meaning "use the pre-supplied input files".
pub const FROM_GRO: &str = "from_gro";

const DEFAULT_ENGINE_PROGRAM: &str = "python";
const DEFAULT_ENGINE_MODULE: &str = "csdmd_engine";

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Failed to read parameter file '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse parameter file '{path}': {source}", path = path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid parameter '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Potential {
    Mm,
    Ml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensemble {
    Nve,
    Nvt,
    Npt,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StructureParams {
    /// CSD refcode of the ligand, or [`FROM_GRO`].
    pub csd: Option<String>,
    /// PDB identifier of the protein.
    pub pdb: Option<String>,
    #[serde(default)]
    pub ligand: bool,
    #[serde(default)]
    pub protein: bool,
    /// Pre-supplied coordinate/topology files used with [`FROM_GRO`].
    #[serde(default)]
    pub input_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SimulationParams {
    #[serde(default)]
    pub solvate: bool,
    pub potential: Potential,
    pub force_field: Option<String>,
    #[serde(default)]
    pub enhanced_sampling: bool,
    pub ensemble: Ensemble,
    /// Kelvin.
    pub temperature: f64,
    /// Femtoseconds.
    pub timestep: f64,
    /// Nanoseconds.
    pub duration: f64,
    /// Steps between reporter frames.
    pub report_interval: u64,
}

/// Command line of the external structure/MD engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineCommand {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for EngineCommand {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_ENGINE_PROGRAM),
            args: vec!["-m".to_string(), DEFAULT_ENGINE_MODULE.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MdParams {
    pub structure: StructureParams,
    pub simulation: SimulationParams,
    #[serde(default)]
    pub engine: EngineCommand,
}

impl MdParams {
    pub fn from_file(path: &Path) -> Result<Self, ParamsError> {
        let content = std::fs::read_to_string(path).map_err(|source| ParamsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let params: Self =
            serde_yaml::from_str(&content).map_err(|source| ParamsError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        params.validate()?;
        Ok(params)
    }

    /// Whether the structures are pre-supplied rather than fetched.
    pub fn is_from_gro(&self) -> bool {
        self.structure.csd.as_deref() == Some(FROM_GRO)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        let s = &self.structure;

        if self.is_from_gro() {
            if s.input_files.is_empty() {
                return invalid("structure.input-files", "required when csd is 'from_gro'");
            }
        } else {
            if !s.ligand && !s.protein {
                return invalid(
                    "structure",
                    "at least one of 'ligand' or 'protein' must be enabled",
                );
            }
            if s.ligand && s.csd.as_deref().is_none_or(|c| c.trim().is_empty()) {
                return invalid("structure.csd", "a CSD refcode is required when 'ligand' is set");
            }
            if s.protein && s.pdb.as_deref().is_none_or(|p| p.trim().is_empty()) {
                return invalid("structure.pdb", "a PDB identifier is required when 'protein' is set");
            }
            if !s.input_files.is_empty() {
                return invalid("structure.input-files", "only allowed when csd is 'from_gro'");
            }
        }

        let sim = &self.simulation;
        positive("simulation.temperature", sim.temperature)?;
        positive("simulation.timestep", sim.timestep)?;
        positive("simulation.duration", sim.duration)?;
        if sim.report_interval == 0 {
            return invalid("simulation.report-interval", "must be greater than zero");
        }
        Ok(())
    }

    /// Number of integration steps implied by `duration` and `timestep`.
    pub fn total_steps(&self) -> u64 {
        let fs_total = self.simulation.duration * 1.0e6;
        (fs_total / self.simulation.timestep).round() as u64
    }
}

fn invalid(field: &'static str, reason: &str) -> Result<(), ParamsError> {
    Err(ParamsError::Invalid {
        field,
        reason: reason.to_string(),
    })
}

fn positive(field: &'static str, value: f64) -> Result<(), ParamsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        invalid(field, &format!("must be a positive number, got {}", value))
    }
}
