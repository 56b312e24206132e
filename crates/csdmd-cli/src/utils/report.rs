use crate::error::{CliError, Result};
use csdmd::workflows::scenarios::{ScenarioOutcome, SuiteReport};
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    scenario: &'a str,
    result: String,
    exit_code: Option<i32>,
    timed_out: bool,
    elapsed_secs: f64,
    log: String,
    error: Option<&'a str>,
}

impl<'a> From<&'a ScenarioOutcome> for ReportRow<'a> {
    fn from(o: &'a ScenarioOutcome) -> Self {
        Self {
            scenario: o.name.as_str(),
            result: o.result.to_string(),
            exit_code: o.exit_code,
            timed_out: o.timed_out,
            elapsed_secs: o.elapsed.as_secs_f64(),
            log: o.log_path.display().to_string(),
            error: o.error.as_deref(),
        }
    }
}

/// Writes one row per scenario, in suite order, with a header line.
pub fn write_report(path: &Path, report: &SuiteReport) -> Result<()> {
    let csv_error = |e: csv::Error| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for outcome in &report.outcomes {
        writer.serialize(ReportRow::from(outcome)).map_err(csv_error)?;
    }
    writer.flush()?;
    info!(
        "Wrote {} scenario result(s) to {:?}",
        report.outcomes.len(),
        path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use csdmd::workflows::scenarios::ScenarioResult;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::tempdir;

    fn outcome(name: &str, result: ScenarioResult, error: Option<&str>) -> ScenarioOutcome {
        ScenarioOutcome {
            name: name.parse().unwrap(),
            result,
            exit_code: error.is_none().then_some(0),
            timed_out: false,
            elapsed: Duration::from_millis(1500),
            log_path: PathBuf::from(format!("tests/{}.log", name)),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn report_has_a_header_and_one_row_per_scenario() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let report = SuiteReport {
            outcomes: vec![
                outcome("asp-gas-MM", ScenarioResult::Pass, None),
                outcome("ibu-4ph9-MM", ScenarioResult::Fail, Some("no such file")),
            ],
        };

        write_report(&path, &report).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines[0],
            "scenario,result,exit_code,timed_out,elapsed_secs,log,error"
        );
        assert_eq!(lines[1], "asp-gas-MM,PASS,0,false,1.5,tests/asp-gas-MM.log,");
        assert_eq!(
            lines[2],
            "ibu-4ph9-MM,FAIL,,false,1.5,tests/ibu-4ph9-MM.log,no such file"
        );
    }

    #[test]
    fn unwritable_report_path_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("results.csv");
        let result = write_report(&path, &SuiteReport::default());
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
