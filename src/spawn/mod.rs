//! Spawning the target binary and matching its output.

mod args;
mod expect;
pub use args::*;
pub use expect::*;
