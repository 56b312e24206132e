use crate::core::log_scan::COMPLETION_LINE;
use crate::core::params::MdParams;
use crate::engine::backend::{MdEngine, RunContext, Stage, StructureProvider};
use crate::engine::error::WorkflowError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scratch::ScratchDir;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Directory the per-run input directory is created in.
    pub work_dir: PathBuf,
    /// Keep the input directory after the run instead of removing it.
    pub keep_inputs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub completed_stages: Vec<Stage>,
    pub smiles: Option<String>,
    /// Only set when the input directory outlives the run.
    pub input_dir: Option<PathBuf>,
}

/// Reads and validates the run parameters before any work starts.
pub fn load_params(path: &Path, reporter: &ProgressReporter) -> Result<MdParams, WorkflowError> {
    reporter.message("Reading input parameters...");
    let params = MdParams::from_file(path)?;
    info!("Loaded run parameters from {:?}", path);
    Ok(params)
}

/// Executes the run flow: structure acquisition, setup and simulation, in that order.
///
/// Any stage failure aborts the run. The transient input directory is removed on
/// every exit path unless `options.keep_inputs` is set and the run succeeds.
#[instrument(skip_all, name = "md_workflow")]
pub fn run(
    params: &MdParams,
    params_path: &Path,
    structures: &dyn StructureProvider,
    engine: &dyn MdEngine,
    options: &RunOptions,
    reporter: &ProgressReporter,
) -> Result<RunSummary, WorkflowError> {
    let scratch = prepare_input_dir(params, options)?;
    let ctx = RunContext {
        params,
        params_path,
        input_dir: scratch.path(),
    };
    let mut completed_stages = Vec::new();
    let mut smiles = None;

    if !params.is_from_gro() {
        reporter.report(Progress::PhaseStart {
            name: "Structure acquisition",
        });
        smiles = acquire_structures(params, &ctx, structures, reporter, &mut completed_stages)?;
        reporter.report(Progress::PhaseFinish);
    }

    reporter.message("Setting up MD simulation...");
    reporter.report(Progress::PhaseStart { name: "Setup" });
    engine.setup(&ctx)?;
    completed_stages.push(Stage::Setup);
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Simulation" });
    info!(
        "Running {} steps of {:?} dynamics.",
        params.total_steps(),
        params.simulation.ensemble
    );
    engine.simulate(&ctx)?;
    completed_stages.push(Stage::Simulate);
    reporter.report(Progress::PhaseFinish);

    reporter.message(COMPLETION_LINE);

    let input_dir = options.keep_inputs.then(|| scratch.persist());
    Ok(RunSummary {
        completed_stages,
        smiles,
        input_dir,
    })
}

fn prepare_input_dir(params: &MdParams, options: &RunOptions) -> Result<ScratchDir, WorkflowError> {
    if params.is_from_gro() {
        let dir = params
            .structure
            .input_files
            .first()
            .and_then(|f| f.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| options.work_dir.clone());
        return Ok(ScratchDir::existing(dir));
    }
    ScratchDir::create_in(&options.work_dir).map_err(WorkflowError::Scratch)
}

fn acquire_structures(
    params: &MdParams,
    ctx: &RunContext<'_>,
    structures: &dyn StructureProvider,
    reporter: &ProgressReporter,
    completed: &mut Vec<Stage>,
) -> Result<Option<String>, WorkflowError> {
    let s = &params.structure;

    if s.protein {
        reporter.message("Retrieving PDB...");
        structures.fetch_protein(ctx)?;
        completed.push(Stage::FetchProtein);

        reporter.message("Fixing PDB...");
        structures.repair_protein(ctx)?;
        completed.push(Stage::RepairProtein);
    }

    let mut smiles = None;
    if s.ligand {
        let refcode = s.csd.as_deref().unwrap_or_default();
        reporter.message(format!("Retrieving CSD entry for {}...", refcode));
        smiles = structures.fetch_ligand(ctx)?;
        completed.push(Stage::FetchLigand);
        if let Some(smiles) = &smiles {
            reporter.message(format!("SMILES notation: {} ", smiles));
        }

        if s.protein {
            reporter.message("Docking ligand...");
            structures.dock(ctx)?;
            completed.push(Stage::Dock);
        }
    }
    Ok(smiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::{
        EngineCommand, Ensemble, FROM_GRO, Potential, SimulationParams, StructureParams,
    };
    use std::cell::RefCell;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingBackend {
        calls: RefCell<Vec<Stage>>,
        input_dirs: RefCell<Vec<PathBuf>>,
        fail_at: Option<Stage>,
    }

    impl RecordingBackend {
        fn failing_at(stage: Stage) -> Self {
            Self {
                fail_at: Some(stage),
                ..Self::default()
            }
        }

        fn record(&self, stage: Stage, ctx: &RunContext<'_>) -> Result<(), WorkflowError> {
            self.calls.borrow_mut().push(stage);
            self.input_dirs.borrow_mut().push(ctx.input_dir.to_path_buf());
            if self.fail_at == Some(stage) {
                Err(stage.failure("injected"))
            } else {
                Ok(())
            }
        }
    }

    impl StructureProvider for RecordingBackend {
        fn fetch_protein(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError> {
            self.record(Stage::FetchProtein, ctx)
        }
        fn repair_protein(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError> {
            self.record(Stage::RepairProtein, ctx)
        }
        fn fetch_ligand(&self, ctx: &RunContext<'_>) -> Result<Option<String>, WorkflowError> {
            self.record(Stage::FetchLigand, ctx)?;
            Ok(Some("CC(=O)Oc1ccccc1C(=O)O".to_string()))
        }
        fn dock(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError> {
            self.record(Stage::Dock, ctx)
        }
    }

    impl MdEngine for RecordingBackend {
        fn setup(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError> {
            self.record(Stage::Setup, ctx)
        }
        fn simulate(&self, ctx: &RunContext<'_>) -> Result<(), WorkflowError> {
            self.record(Stage::Simulate, ctx)
        }
    }

    fn params(ligand: bool, protein: bool) -> MdParams {
        MdParams {
            structure: StructureParams {
                csd: ligand.then(|| "ACSALA".to_string()),
                pdb: protein.then(|| "4PH9".to_string()),
                ligand,
                protein,
                input_files: Vec::new(),
            },
            simulation: SimulationParams {
                solvate: true,
                potential: Potential::Mm,
                force_field: Some("amber14".to_string()),
                enhanced_sampling: false,
                ensemble: Ensemble::Npt,
                temperature: 300.0,
                timestep: 2.0,
                duration: 0.01,
                report_interval: 500,
            },
            engine: EngineCommand::default(),
        }
    }

    fn collect_messages<F>(f: F) -> Vec<String>
    where
        F: FnOnce(&ProgressReporter),
    {
        let lines = Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|p| {
                if let Progress::Message(m) = p {
                    lines.lock().unwrap().push(m);
                }
            }));
            f(&reporter);
        }
        lines.into_inner().unwrap()
    }

    #[test]
    fn ligand_in_protein_runs_every_stage_in_order() {
        let work = tempdir().unwrap();
        let backend = RecordingBackend::default();
        let options = RunOptions {
            work_dir: work.path().to_path_buf(),
            keep_inputs: false,
        };
        let params = params(true, true);

        let mut summary = None;
        let lines = collect_messages(|reporter| {
            summary = Some(
                run(
                    &params,
                    Path::new("asp-4ph9-MM.yaml"),
                    &backend,
                    &backend,
                    &options,
                    reporter,
                )
                .unwrap(),
            );
        });
        let summary = summary.unwrap();

        let expected = [
            Stage::FetchProtein,
            Stage::RepairProtein,
            Stage::FetchLigand,
            Stage::Dock,
            Stage::Setup,
            Stage::Simulate,
        ];
        assert_eq!(*backend.calls.borrow(), expected);
        assert_eq!(summary.completed_stages, expected);
        assert_eq!(summary.smiles.as_deref(), Some("CC(=O)Oc1ccccc1C(=O)O"));
        assert_eq!(
            lines,
            [
                "Retrieving PDB...",
                "Fixing PDB...",
                "Retrieving CSD entry for ACSALA...",
                "SMILES notation: CC(=O)Oc1ccccc1C(=O)O ",
                "Docking ligand...",
                "Setting up MD simulation...",
                COMPLETION_LINE,
            ]
        );
    }

    #[test]
    fn protein_only_run_skips_ligand_stages() {
        let work = tempdir().unwrap();
        let backend = RecordingBackend::default();
        let options = RunOptions {
            work_dir: work.path().to_path_buf(),
            keep_inputs: false,
        };

        run(
            &params(false, true),
            Path::new("4ph9-protein-MM.yaml"),
            &backend,
            &backend,
            &options,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(
            *backend.calls.borrow(),
            [
                Stage::FetchProtein,
                Stage::RepairProtein,
                Stage::Setup,
                Stage::Simulate
            ]
        );
    }

    #[test]
    fn failure_aborts_the_run_and_removes_inputs() {
        let work = tempdir().unwrap();
        let backend = RecordingBackend::failing_at(Stage::FetchLigand);
        let options = RunOptions {
            work_dir: work.path().to_path_buf(),
            keep_inputs: false,
        };

        let lines = collect_messages(|reporter| {
            let err = run(
                &params(true, false),
                Path::new("asp-gas-MM.yaml"),
                &backend,
                &backend,
                &options,
                reporter,
            )
            .unwrap_err();
            assert!(matches!(
                err,
                WorkflowError::StructureAcquisition { stage: "fetch-ligand", .. }
            ));
        });

        assert_eq!(*backend.calls.borrow(), [Stage::FetchLigand]);
        assert!(!lines.iter().any(|l| l == COMPLETION_LINE));
        let input_dir = &backend.input_dirs.borrow()[0];
        assert!(input_dir.starts_with(work.path()));
        assert!(!input_dir.exists());
    }

    #[test]
    fn simulation_failure_is_reported_as_such() {
        let work = tempdir().unwrap();
        let backend = RecordingBackend::failing_at(Stage::Simulate);
        let options = RunOptions {
            work_dir: work.path().to_path_buf(),
            keep_inputs: false,
        };

        let err = run(
            &params(true, false),
            Path::new("asp-gas-ML.yaml"),
            &backend,
            &backend,
            &options,
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert!(matches!(err, WorkflowError::Simulation { stage: "simulate", .. }));
    }

    #[test]
    fn kept_inputs_survive_the_run() {
        let work = tempdir().unwrap();
        let backend = RecordingBackend::default();
        let options = RunOptions {
            work_dir: work.path().to_path_buf(),
            keep_inputs: true,
        };

        let summary = run(
            &params(true, false),
            Path::new("asp-gas-MM.yaml"),
            &backend,
            &backend,
            &options,
            &ProgressReporter::new(),
        )
        .unwrap();

        let kept = summary.input_dir.unwrap();
        assert!(kept.is_dir());
        assert_eq!(backend.input_dirs.borrow()[0], kept);
    }

    #[test]
    fn from_gro_uses_the_supplied_files_directly() {
        let work = tempdir().unwrap();
        let supplied = tempdir().unwrap();
        let backend = RecordingBackend::default();
        let mut params = params(false, false);
        params.structure.csd = Some(FROM_GRO.to_string());
        params.structure.input_files = vec![supplied.path().join("system.gro")];
        let options = RunOptions {
            work_dir: work.path().to_path_buf(),
            keep_inputs: false,
        };

        run(
            &params,
            Path::new("from-gro.yaml"),
            &backend,
            &backend,
            &options,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(*backend.calls.borrow(), [Stage::Setup, Stage::Simulate]);
        assert_eq!(backend.input_dirs.borrow()[0], supplied.path());
        assert!(supplied.path().is_dir());
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[test]
    fn invalid_parameters_fail_before_any_stage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "structure:\n  ligand: true\n").unwrap();

        let lines = collect_messages(|reporter| {
            assert!(matches!(
                load_params(&path, reporter),
                Err(WorkflowError::Params(_))
            ));
        });
        assert_eq!(lines, ["Reading input parameters..."]);
    }
}
