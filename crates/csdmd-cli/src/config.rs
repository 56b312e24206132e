mod builder;
mod defaults;
mod file;

pub use builder::{build_harness_config, resolve_layout};
