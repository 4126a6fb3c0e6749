//! Bootstrap orchestrator for the self-hosted M compiler.
//!
//! The crate drives a fixed sequence of external tools: the host build tool
//! packages the bytecode-hosted compiler, which compiles the self-hosted
//! compiler once; from then on the self-hosted compiler rebuilds itself, publishes
//! the standard library, regenerates its own entry source and rebuilds itself
//! again. Every step is an opaque child process whose exit code decides whether
//! the run continues.
//!
//! The main entry point is [`Dispatcher`], which maps a [`Command`] onto the
//! [`Pipeline`] using an injected [`ProcessRunner`] and [`Confirm`] gate.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod external;
pub mod io_adapters;
pub mod pipeline;
pub mod prompt;
pub mod stage;

#[cfg(test)]
mod testing;

pub use command::{CommandLine, Confirmation, ExitCode};
pub use config::Config;
pub use dispatch::{Command, Dispatcher};
pub use error::BootstrapError;
pub use external::{ProcessRunner, SystemRunner};
pub use pipeline::Pipeline;
pub use prompt::{Confirm, ConfirmationGate};
pub use stage::{PipelineOutcome, Stage};
