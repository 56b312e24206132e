use std::path::PathBuf;

/// Subcommand the harness appends to this binary when no entry point is configured.
pub const RUN_SUBCOMMAND: &str = "run";

pub struct DefaultsConfig {
    pub interpreter: PathBuf,
    pub jobs: usize,
    pub strict: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("python"),
            jobs: 1,
            strict: false,
        }
    }
}
