//! # Engine Module
//!
//! Stateful machinery behind the workflows: configuration assembly, progress
//! reporting, launching child processes, talking to the external MD engine, and
//! managing the scratch area each run writes its transient inputs to.
//!
//! - **Configuration** ([`config`]) - Harness settings and their builder
//! - **Backend** ([`backend`]) - Contract with the external structure/MD engine
//! - **Processes** ([`process`]) - Spawning, timeouts and log redirection
//! - **Progress Monitoring** ([`progress`]) - Callbacks for user feedback
//! - **Error Handling** ([`error`]) - Error types for every layer

pub mod backend;
pub mod config;
pub mod error;
pub(crate) mod process;
pub mod progress;
pub mod scratch;
