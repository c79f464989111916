//! Option-configured, deadline-bounded test runs against a process cluster.
//!
//! A test is a body taking a [`CtlCtx`]. The context carries the cluster
//! shape and client settings chosen through [`CtlOption`]s, builds the
//! command prefix for the client binary in flag or environment form, and
//! exposes the running cluster. [`CtlTest`] starts the cluster, runs the
//! body under a deadline and always tears the cluster down.

mod commands;
mod context;
mod engine;
mod env;
mod invocation;
mod members;
mod options;

pub use context::*;
pub use engine::*;
pub use env::*;
pub use invocation::*;
pub use members::*;
pub use options::*;

#[cfg(test)]
mod invocation_test;
