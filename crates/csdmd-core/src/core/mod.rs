//! Stateless building blocks shared by the run flow and the installation harness.

pub mod log_scan;
pub mod params;
pub mod requirements;
pub mod scenario;
pub mod version;
