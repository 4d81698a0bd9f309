//! The `lithium` command-line interface.
//!
//! Commands operate on one project directory at a time. The search cache and
//! the local repository are not locked, so two invocations against the same
//! project must not run concurrently.

pub mod cli;
pub mod commands;

pub use cli::Cli;
