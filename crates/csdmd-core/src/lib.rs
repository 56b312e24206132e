//! # CSD-MD Core Library
//!
//! Orchestration for molecular dynamics runs seeded from the Cambridge Structural
//! Database, plus the installation harness that validates a scientific environment
//! and exercises the bundled example simulations.
//!
//! ## Architectural Philosophy
//!
//! No physics lives in this crate. Structure retrieval, docking, protein repair and
//! the MD integration itself belong to an external engine. What remains is arranged
//! in three layers:
//!
//! - **[`core`]: The Foundation.** Stateless models: YAML run parameters, scenario
//!   names and their file layout, package requirements, runtime versions, and the
//!   log scanning used to detect completion.
//!
//! - **[`engine`]: The Machinery.** Errors, progress reporting, the harness
//!   configuration builder, child-process launching, the external backend and
//!   per-run scratch directories.
//!
//! - **[`workflows`]: The Public API.** The run flow ([`workflows::simulate`]),
//!   the environment validator ([`workflows::environment`]) and the scenario
//!   runner ([`workflows::scenarios`]).

pub mod core;
pub mod engine;
pub mod workflows;
