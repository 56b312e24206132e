//! # Workflows Module
//!
//! Top-level entry points.
//!
//! - **Run flow** ([`simulate`]) - Parameters, structure acquisition, setup and
//!   simulation, ending with the completion marker.
//! - **Environment validation** ([`environment`]) - Interpreter version and
//!   package import checks.
//! - **Scenario runner** ([`scenarios`]) - Out-of-process execution of example
//!   simulations classified by their logs.

pub mod environment;
pub mod scenarios;
pub mod simulate;
