use crate::error::{CliError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileEntryPoint {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Harness settings as written in a TOML file. Every key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub interpreter: Option<PathBuf>,
    pub minimum_runtime: Option<(u32, u32)>,
    pub work_dir: Option<PathBuf>,
    pub examples_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub strict: Option<bool>,
    pub scenarios: Option<Vec<String>>,
    /// Package name to import name. Replaces the built-in requirement list.
    pub packages: Option<BTreeMap<String, String>>,
    pub entry_point: Option<FileEntryPoint>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading harness configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn full_file_is_parsed() {
        let config = FileConfig::from_toml(
            r#"
            interpreter = "/opt/conda/envs/csd-md/bin/python"
            minimum-runtime = [3, 10]
            work-dir = "tests"
            jobs = 4
            timeout-secs = 3600
            strict = true
            scenarios = ["asp-gas-MM", "ibu-gas-ML"]

            [packages]
            openmm = "openmm"
            ambertools = "pytraj"

            [entry-point]
            program = "python"
            args = ["CSD-MD.py"]
            "#,
        )
        .unwrap();

        assert_eq!(config.minimum_runtime, Some((3, 10)));
        assert_eq!(config.jobs, Some(4));
        assert_eq!(config.timeout_secs, Some(3600));
        assert_eq!(config.strict, Some(true));
        assert_eq!(config.scenarios.unwrap().len(), 2);
        assert_eq!(
            config.packages.unwrap().get("ambertools").map(String::as_str),
            Some("pytraj")
        );
        let entry = config.entry_point.unwrap();
        assert_eq!(entry.program, PathBuf::from("python"));
        assert_eq!(entry.args, ["CSD-MD.py"]);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(FileConfig::from_toml("").unwrap(), FileConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::from_toml("threads = 8").is_err());
        assert!(FileConfig::from_toml("[entry-point]\nprogram = \"x\"\nshell = true").is_err());
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("harness.toml");
        fs::write(&path, "jobs = \"many\"").unwrap();

        let err = FileConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
        assert!(err.to_string().contains("harness.toml"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = FileConfig::from_file(Path::new("/nonexistent/harness.toml"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
