//! pom.xml dependency resolution for lithium.
//!
//! Loads a project descriptor together with its parent chain, mediates the
//! merged dependency graph, and locates every surviving artifact in the local
//! repository, fetching from a mirror on a miss.
//!
//! The local repository is written without locking. One invocation per
//! project tree at a time.

pub mod error;
pub mod graph;
pub mod loader;
pub mod locator;
pub mod mediator;
pub mod parser;
pub mod property;
pub mod resolve;
pub mod types;

pub use error::{MavenError, Result};
pub use graph::DependencyGraph;
pub use loader::{DescriptorNode, PomLoader};
pub use locator::ArtifactLocator;
pub use mediator::{MediatedDependency, Mediation, MediationOptions, mediate};
pub use parser::{ParentRef, PomDocument, RawDependency, parse_pom, read_pom};
pub use property::{PropertyTable, Substitution, leftover_placeholder, substitute};
pub use resolve::{MissingArtifact, Resolution, ResolveOptions, Resolver};
pub use types::{
    ArtifactKey, Coordinate, Declaration, MavenScope, Origin, ResolutionWarning, ResolvedArtifact,
    VersionSpec,
};
