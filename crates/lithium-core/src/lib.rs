//! Core abstractions for lithium.
//!
//! Shared by the Maven resolver, the classpath tooling and the CLI:
//! the common error type, project configuration, and the scheme-keyed
//! fetcher registry used to pull artifacts from remote mirrors.

pub mod config;
pub mod error;
pub mod fetch;

pub use config::{CONFIG_FILE, DEFAULT_MIRROR, LithiumConfig};
pub use error::{LithiumError, Result};
pub use fetch::{FileFetcher, Fetcher, FetcherRegistry, HttpFetcher};
