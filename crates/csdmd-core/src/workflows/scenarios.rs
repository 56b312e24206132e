use crate::core::log_scan::{COMPLETION_MARKER, scan_file};
use crate::core::scenario::{HarnessLayout, ScenarioName};
use crate::engine::config::{CompletionOracle, MD_PARAMS_FLAG, ScenarioConfig, ScenarioSelection};
use crate::engine::error::ScenarioError;
use crate::engine::process::{ChildExit, run_with_log, wait_for_file};
use crate::engine::progress::{Progress, ProgressReporter};
use futures_util::StreamExt;
use futures_util::stream;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

const SUMMARY_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioResult {
    Pass,
    Fail,
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioResult::Pass => f.write_str("PASS"),
            ScenarioResult::Fail => f.write_str("FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOutcome {
    pub name: ScenarioName,
    pub result: ScenarioResult,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub elapsed: Duration,
    pub log_path: PathBuf,
    /// Set when the scenario could not be run at all.
    pub error: Option<String>,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.result == ScenarioResult::Pass
    }

    /// The per-scenario verdict line, dot-padded so verdicts line up.
    pub fn summary_line(&self) -> String {
        let name = self.name.as_str();
        let dots = ".".repeat(SUMMARY_WIDTH.saturating_sub(name.len() + 1));
        match self.result {
            ScenarioResult::Pass => format!(" => Test example {} {} PASS", name, dots),
            ScenarioResult::Fail => format!(" => Test example {} {}.. FAIL <=", name, dots),
        }
    }

    fn unrunnable(name: ScenarioName, log_path: PathBuf, err: &ScenarioError) -> Self {
        Self {
            name,
            result: ScenarioResult::Fail,
            exit_code: None,
            timed_out: false,
            elapsed: Duration::ZERO,
            log_path,
            error: Some(err.to_string()),
        }
    }
}

/// Outcomes of a suite run, in the order the scenarios were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    pub fn failed(&self) -> BTreeSet<ScenarioName> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed())
            .map(|o| o.name.clone())
            .collect()
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// Collapses the report into one aggregate error naming every failing scenario.
    pub fn into_result(self) -> Result<(), ScenarioError> {
        let failed: Vec<String> = self
            .outcomes
            .iter()
            .filter(|o| !o.passed())
            .map(|o| o.name.to_string())
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(ScenarioError::Failures(failed))
        }
    }
}

/// Judges a finished scenario from its log and exit status.
pub(crate) fn classify(
    log_path: &Path,
    exit: Option<&ChildExit>,
    oracle: CompletionOracle,
) -> std::io::Result<ScenarioResult> {
    if exit.is_some_and(|e| e.timed_out) {
        return Ok(ScenarioResult::Fail);
    }
    let marker_found = scan_file(log_path, COMPLETION_MARKER)?;
    let exit_ok = match oracle {
        CompletionOracle::Marker => true,
        CompletionOracle::MarkerAndExitCode => exit.is_some_and(|e| e.success),
    };
    Ok(if marker_found && exit_ok {
        ScenarioResult::Pass
    } else {
        ScenarioResult::Fail
    })
}

/// Classifies a log file on its own, as the legacy marker-only oracle does.
pub fn classify_log(log_path: &Path) -> std::io::Result<ScenarioResult> {
    classify(log_path, None, CompletionOracle::Marker)
}

pub struct ScenarioRunner {
    config: ScenarioConfig,
}

impl ScenarioRunner {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }

    pub fn layout(&self) -> &HarnessLayout {
        &self.config.layout
    }

    /// Turns the configured selection into concrete scenario names.
    pub fn resolve_selection(&self) -> Result<Vec<ScenarioName>, ScenarioError> {
        match &self.config.selection {
            ScenarioSelection::Builtin => Ok(ScenarioName::builtin()),
            ScenarioSelection::Explicit(names) => Ok(names.clone()),
            ScenarioSelection::Discover => {
                self.config
                    .layout
                    .discover()
                    .map_err(|source| ScenarioError::Discovery {
                        path: self.config.layout.examples_dir.clone(),
                        source,
                    })
            }
        }
    }

    /// Runs one scenario out-of-process and classifies it from its log.
    #[instrument(skip_all, fields(scenario = %name))]
    pub async fn run_scenario(
        &self,
        name: &ScenarioName,
    ) -> Result<ScenarioOutcome, ScenarioError> {
        let layout = &self.config.layout;
        let config_path = layout.config_path(name);
        let log_path = layout.log_path(name);

        let entry = &self.config.entry_point;
        let mut args: Vec<OsString> = entry.args.iter().map(OsString::from).collect();
        args.push(MD_PARAMS_FLAG.into());
        args.push(config_path.into_os_string());

        let exit = run_with_log(&entry.program, args, &log_path, self.config.timeout).await?;

        let log_exists =
            wait_for_file(&log_path, self.config.poll_interval, self.config.timeout).await;
        let result = if log_exists {
            classify(&log_path, Some(&exit), self.config.oracle).map_err(|source| {
                ScenarioError::LogFile {
                    path: log_path.clone(),
                    source,
                }
            })?
        } else {
            warn!("Log file {:?} never appeared.", log_path);
            ScenarioResult::Fail
        };

        info!(
            "Scenario '{}' finished with {} (exit code {:?}, {:.1}s).",
            name,
            result,
            exit.code,
            exit.elapsed.as_secs_f64()
        );
        Ok(ScenarioOutcome {
            name: name.clone(),
            result,
            exit_code: exit.code,
            timed_out: exit.timed_out,
            elapsed: exit.elapsed,
            log_path,
            error: None,
        })
    }

    /// Runs every scenario, at most `jobs` at a time, and collects their outcomes.
    ///
    /// A scenario that cannot even be launched is recorded as a failure; the
    /// remaining scenarios still run.
    #[instrument(skip_all, name = "scenario_suite")]
    pub async fn run_all_scenarios(
        &self,
        names: &[ScenarioName],
        reporter: &ProgressReporter<'_>,
    ) -> SuiteReport {
        reporter.report(Progress::TaskStart {
            total_steps: names.len() as u64,
        });
        info!(
            "Running {} scenario(s) with up to {} at a time.",
            names.len(),
            self.config.jobs
        );

        let outcomes: Vec<ScenarioOutcome> = stream::iter(names)
            .map(|name| async move {
                reporter.report(Progress::StatusUpdate {
                    text: name.to_string(),
                });
                let outcome = match self.run_scenario(name).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("Scenario '{}' could not be run: {}", name, e);
                        ScenarioOutcome::unrunnable(name.clone(), self.layout().log_path(name), &e)
                    }
                };
                reporter.message(outcome.summary_line());
                reporter.report(Progress::TaskIncrement);
                outcome
            })
            .buffered(self.config.jobs)
            .collect()
            .await;

        reporter.report(Progress::TaskFinish);
        SuiteReport { outcomes }
    }
}
