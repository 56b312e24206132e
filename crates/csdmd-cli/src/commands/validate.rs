use crate::cli::ValidateArgs;
use crate::config::build_harness_config;
use crate::error::{CliError, Result};
use crate::utils::{progress::CliProgressHandler, report::write_report};
use csdmd::{
    engine::{
        config::{EnvironmentConfig, ScenarioConfig},
        progress::{Progress, ProgressReporter},
    },
    workflows::{
        environment::{self, Importer, PythonImporter},
        scenarios::ScenarioRunner,
    },
};
use std::path::Path;
use tracing::{error, info, warn};

/// Runs every enabled check category and reports all failures together.
pub async fn run(args: ValidateArgs) -> Result<()> {
    let config = build_harness_config(&args)?;
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let mut failures = Vec::new();

    if args.skip_environment {
        info!("Skipping environment checks.");
    } else {
        let importer = PythonImporter::new(&config.environment.interpreter);
        let env_failures = tokio::task::block_in_place(|| {
            check_environment(&config.environment, &importer, &reporter)
        });
        failures.extend(env_failures);
    }

    if args.skip_scenarios {
        info!("Skipping example simulations.");
    } else {
        failures.extend(
            run_scenarios(config.scenarios, args.report.as_deref(), &reporter).await?,
        );
    }

    if failures.is_empty() {
        println!("All checks passed.");
        Ok(())
    } else {
        Err(CliError::Validation(failures))
    }
}

fn check_environment(
    env: &EnvironmentConfig,
    importer: &dyn Importer,
    reporter: &ProgressReporter,
) -> Vec<String> {
    let mut failures = Vec::new();

    let version_check = environment::probe_runtime_version(&env.interpreter).and_then(|found| {
        reporter.message(format!(" => Test interpreter version {}", found));
        environment::check_runtime_version(found, env.minimum_runtime)
    });
    if let Err(e) = version_check {
        error!("Interpreter check failed: {}", e);
        failures.push(e.to_string());
    }

    reporter.report(Progress::PhaseStart {
        name: "Checking packages",
    });
    let package_check =
        environment::ensure_required_packages(importer, &env.requirements, reporter);
    reporter.report(Progress::PhaseFinish);
    if let Err(e) = package_check {
        error!("Package check failed: {}", e);
        failures.push(e.to_string());
    }

    failures
}

async fn run_scenarios(
    config: ScenarioConfig,
    report_path: Option<&Path>,
    reporter: &ProgressReporter<'_>,
) -> Result<Vec<String>> {
    let runner = ScenarioRunner::new(config);
    let names = runner.resolve_selection()?;
    if names.is_empty() {
        warn!(
            "No scenarios found in {:?}.",
            runner.layout().examples_dir
        );
        return Ok(vec![format!(
            "No scenarios found in {}",
            runner.layout().examples_dir.display()
        )]);
    }

    reporter.report(Progress::PhaseStart {
        name: "Running example simulations",
    });
    let report = runner.run_all_scenarios(&names, reporter).await;
    reporter.report(Progress::PhaseFinish);

    if let Some(path) = report_path {
        write_report(path, &report)?;
    }
    println!(
        "{} of {} scenario(s) passed.",
        report.passed_count(),
        report.outcomes.len()
    );

    Ok(report
        .into_result()
        .err()
        .map(|e| e.to_string())
        .into_iter()
        .collect())
}
