//! Foundation utilities shared by every wizardpro crate.
//!
//! Nothing in here knows about phases or generation calls; it only provides
//! the error taxonomy, exit codes, run identifier handling, atomic file
//! writes and tracing setup the higher layers build on.

pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod run_id;
pub mod types;
