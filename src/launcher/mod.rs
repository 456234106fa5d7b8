//! Everything that touches the `spark-submit` binary.
//!
//! - [`args`]: pure functions building argument lists for submit/kill/status
//! - [`executor`]: [`Launcher`] spawns the binary and reports how it exited
//!
//! The argument builders never fail; presets are validated when the registry
//! is loaded.

pub mod args;
pub mod executor;

pub use args::{control_args, submit_args, ControlVerb};
pub use executor::{ExecutionResult, Launcher, OutputMode};
