use crate::core::requirements::PackageRequirement;
use crate::core::version::RuntimeVersion;
use crate::engine::error::{EnvironmentError, ImportFailure};
use crate::engine::progress::{Progress, ProgressReporter};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, instrument, warn};

/// Anything able to tell whether a module imports in the target environment.
pub trait Importer {
    fn try_import(&self, module: &str) -> Result<(), ImportFailure>;
}

/// Imports each module in a fresh interpreter process.
///
/// Running every import in its own process keeps the side effects some
/// scientific packages have at import time from leaking between checks.
#[derive(Debug, Clone)]
pub struct PythonImporter {
    interpreter: PathBuf,
}

impl PythonImporter {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Importer for PythonImporter {
    fn try_import(&self, module: &str) -> Result<(), ImportFailure> {
        let failure = |reason: String| ImportFailure {
            module: module.to_string(),
            reason,
        };
        let output = Command::new(&self.interpreter)
            .arg("-c")
            .arg(format!("import {}", module))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| failure(format!("could not run {}: {}", self.interpreter.display(), e)))?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("import failed")
            .trim()
            .to_string();
        Err(failure(reason))
    }
}

/// Fails if `found` is older than `minimum`.
pub fn check_runtime_version(
    found: RuntimeVersion,
    minimum: RuntimeVersion,
) -> Result<(), EnvironmentError> {
    if found.satisfies(&minimum) {
        Ok(())
    } else {
        Err(EnvironmentError::UnsupportedRuntime { found, minimum })
    }
}

/// Asks `interpreter --version` which version it is.
///
/// Older interpreters print the banner on stderr, newer ones on stdout; both are read.
pub fn probe_runtime_version(interpreter: &Path) -> Result<RuntimeVersion, EnvironmentError> {
    let output = Command::new(interpreter)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map_err(|source| EnvironmentError::Probe {
            interpreter: interpreter.to_path_buf(),
            source,
        })?;
    let version = parse_banner(
        &String::from_utf8_lossy(&output.stdout),
        &String::from_utf8_lossy(&output.stderr),
    )?;
    debug!("{:?} reports runtime version {}", interpreter, version);
    Ok(version)
}

fn parse_banner(stdout: &str, stderr: &str) -> Result<RuntimeVersion, EnvironmentError> {
    let banner = if stdout.trim().is_empty() {
        stderr
    } else {
        stdout
    };
    Ok(banner.parse::<RuntimeVersion>()?)
}

/// Tries every requirement and returns the ones that failed, in input order.
///
/// A failure never stops the loop; the caller sees the complete missing set.
#[instrument(skip_all, name = "package_check")]
pub fn check_required_packages(
    importer: &dyn Importer,
    requirements: &[PackageRequirement],
    reporter: &ProgressReporter,
) -> Vec<PackageRequirement> {
    reporter.report(Progress::TaskStart {
        total_steps: requirements.len() as u64,
    });

    let mut missing = Vec::new();
    for requirement in requirements {
        reporter.message(format!(" => Test package {}", requirement.package));
        match importer.try_import(&requirement.module) {
            Ok(()) => debug!("Package '{}' imports.", requirement.package),
            Err(failure) => {
                warn!("Package '{}' is missing: {}", requirement.package, failure);
                missing.push(requirement.clone());
            }
        }
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    info!(
        "{} of {} required packages are importable.",
        requirements.len() - missing.len(),
        requirements.len()
    );
    missing
}

/// Like [`check_required_packages`], but turns a non-empty missing set into an error.
pub fn ensure_required_packages(
    importer: &dyn Importer,
    requirements: &[PackageRequirement],
    reporter: &ProgressReporter,
) -> Result<(), EnvironmentError> {
    let missing = check_required_packages(importer, requirements, reporter);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(EnvironmentError::MissingPackages(
            missing.into_iter().map(|r| r.package).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    struct FakeImporter {
        broken: HashSet<&'static str>,
        attempts: RefCell<Vec<String>>,
    }

    impl FakeImporter {
        fn with_broken(broken: &[&'static str]) -> Self {
            Self {
                broken: broken.iter().copied().collect(),
                attempts: RefCell::new(Vec::new()),
            }
        }
    }

    impl Importer for FakeImporter {
        fn try_import(&self, module: &str) -> Result<(), ImportFailure> {
            self.attempts.borrow_mut().push(module.to_string());
            if self.broken.contains(module) {
                Err(ImportFailure {
                    module: module.to_string(),
                    reason: format!("No module named '{}'", module),
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn runtime_version_boundaries() {
        let minimum = RuntimeVersion::new(3, 9);
        assert!(check_runtime_version(RuntimeVersion::new(2, 7), minimum).is_err());
        assert!(check_runtime_version(RuntimeVersion::new(3, 9), minimum).is_ok());
        assert!(check_runtime_version(RuntimeVersion::new(3, 11), minimum).is_ok());
    }

    #[test]
    fn newer_major_with_lower_minor_is_rejected() {
        let minimum = RuntimeVersion::new(3, 9);
        for found in [RuntimeVersion::new(4, 0), RuntimeVersion::new(4, 2)] {
            assert!(matches!(
                check_runtime_version(found, minimum),
                Err(EnvironmentError::UnsupportedRuntime { found: f, .. }) if f == found
            ));
        }
    }

    #[test]
    fn all_importable_yields_empty_missing_set() {
        let importer = FakeImporter::with_broken(&[]);
        let requirements = PackageRequirement::builtin();

        let missing = check_required_packages(&importer, &requirements, &ProgressReporter::new());

        assert!(missing.is_empty());
        assert_eq!(importer.attempts.borrow().len(), requirements.len());
    }

    #[test]
    fn missing_set_is_exactly_the_failing_subset() {
        let importer = FakeImporter::with_broken(&["pytraj", "tensorflow"]);
        let requirements = PackageRequirement::builtin();

        let missing = check_required_packages(&importer, &requirements, &ProgressReporter::new());

        let names: Vec<_> = missing.iter().map(|r| r.package.as_str()).collect();
        assert_eq!(names, ["ambertools", "tensorflow"]);
        assert_eq!(importer.attempts.borrow().len(), requirements.len());
    }

    #[test]
    fn every_requirement_is_attempted_after_a_failure() {
        let importer = FakeImporter::with_broken(&["openmm"]);
        let requirements = vec![
            PackageRequirement::new("openmm", "openmm"),
            PackageRequirement::new("pyyaml", "yaml"),
        ];

        check_required_packages(&importer, &requirements, &ProgressReporter::new());

        assert_eq!(*importer.attempts.borrow(), ["openmm", "yaml"]);
    }

    #[test]
    fn ensure_reports_missing_package_names() {
        let importer = FakeImporter::with_broken(&["yaml", "pdbfixer"]);
        let err = ensure_required_packages(
            &importer,
            &PackageRequirement::builtin(),
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "Missing packages: pyyaml, pdbfixer");
    }

    #[test]
    fn each_package_is_announced() {
        let lines = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|p| {
            if let Progress::Message(m) = p {
                lines.lock().unwrap().push(m);
            }
        }));
        let requirements = vec![PackageRequirement::new("openmm", "openmm")];

        check_required_packages(&FakeImporter::with_broken(&[]), &requirements, &reporter);
        drop(reporter);

        assert_eq!(lines.into_inner().unwrap(), [" => Test package openmm"]);
    }

    #[test]
    fn banner_is_read_from_either_stream() {
        let modern = parse_banner("Python 3.11.4\n", "").unwrap();
        assert_eq!((modern.major, modern.minor), (3, 11));

        let legacy = parse_banner("", "Python 2.7.18\n").unwrap();
        assert_eq!((legacy.major, legacy.minor), (2, 7));

        assert!(matches!(
            parse_banner("", ""),
            Err(EnvironmentError::VersionParse(_))
        ));
    }

    #[test]
    fn probing_a_missing_interpreter_fails() {
        let result = probe_runtime_version(Path::new("/nonexistent/python"));
        assert!(matches!(result, Err(EnvironmentError::Probe { .. })));
    }
}
