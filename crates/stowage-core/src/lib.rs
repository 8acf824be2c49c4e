//! Shared plumbing for the stowage vendoring tool.
//!
//! The only resident here is the [`Warnings`] collector: a process-wide,
//! thread-safe accumulator of non-fatal findings. Components receive a
//! handle explicitly instead of reaching for global state, and the CLI
//! inspects the collected list at shutdown to implement strict mode.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod diagnostics;

pub use diagnostics::Warnings;
